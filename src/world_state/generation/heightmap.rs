//! # Heightmap Generation
//!
//! Procedural terrain: a seeded 2D fractal noise function sampled once per
//! `(x, z)` column gives each column a height; every voxel below that height
//! is stone, everything above is air.
//!
//! The noise parameters are fixed per world and shared by every worker, so
//! generating the same coordinate twice - on any worker, before or after a
//! save/load cycle - produces a byte-identical chunk.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::GenerateChunk;
use crate::world_state::coords::{ChunkCoord, ChunkSize};
use crate::world_state::voxels::block::block_type::BlockType;
use crate::world_state::voxels::block::Block;
use crate::world_state::voxels::chunk::Chunk;

/// Number of octaves in the terrain noise.
pub const HEIGHTMAP_OCTAVES: usize = 6;

/// Seeded heightmap terrain generator.
///
/// Columns are sampled in world space: a chunk's local `(x, z)` is translated
/// by the chunk's world origin before sampling, so terrain is continuous
/// across chunk borders. The vertical chunk coordinate does not shift the
/// sample - every chunk in a vertical stack sees the same column heights.
pub struct HeightmapGenerator {
    noise: Fbm<Perlin>,
    size: ChunkSize,
    amplitude: f64,
    scale: f64,
}

impl HeightmapGenerator {
    /// Creates a generator with the world's fixed noise parameters.
    pub fn new(seed: u32, size: ChunkSize, amplitude: f64, scale: f64) -> Self {
        HeightmapGenerator {
            noise: Fbm::<Perlin>::new(seed).set_octaves(HEIGHTMAP_OCTAVES),
            size,
            amplitude,
            scale,
        }
    }

    /// Terrain height of one world-space column, clamped to at least 1 so
    /// every column keeps a solid floor.
    fn column_height(&self, world_x: i32, world_z: i32) -> i32 {
        let sample = self
            .noise
            .get([world_x as f64 * self.scale, world_z as f64 * self.scale]);
        let height = sample * self.amplitude + self.amplitude / 2.0;
        (height.floor() as i32).max(1)
    }
}

impl GenerateChunk for HeightmapGenerator {
    fn generate(&self, coord: ChunkCoord) -> Chunk {
        let size = self.size;
        let (sx, sy, sz) = (size.x() as i32, size.y() as i32, size.z() as i32);
        let origin = coord.world_origin(size);

        let mut heights = vec![0i32; (sx * sz) as usize];
        for z in 0..sz {
            for x in 0..sx {
                heights[(z * sx + x) as usize] =
                    self.column_height(origin.x + x, origin.z + z);
            }
        }

        let mut blocks = Vec::with_capacity(size.block_count());
        for y in 0..sy {
            for z in 0..sz {
                for x in 0..sx {
                    let kind = if y < heights[(z * sx + x) as usize] {
                        BlockType::Stone
                    } else {
                        BlockType::Air
                    };
                    blocks.push(Block::new(x as u8, y as u8, z as u8, kind));
                }
            }
        }

        Chunk::from_raw_parts(coord, size, blocks)
    }
}
