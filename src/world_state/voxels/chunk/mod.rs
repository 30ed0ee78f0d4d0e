//! # Chunk Module
//!
//! A chunk is the atomic unit of generation, storage, and streaming: a dense
//! 3D grid of exactly `size.x * size.y * size.z` blocks, one slot per local
//! coordinate with no sparsity and no holes.
//!
//! ## Storage
//!
//! Blocks are stored flat in row-major order so index arithmetic is O(1) and
//! branch-free (see [`crate::world_state::coords::ChunkSize::index_of`]).
//! Air blocks occupy real slots; the sparse encoding in [`codec`] exists only
//! to avoid shipping air to the rendering boundary, not to change the
//! in-memory representation.

use std::hash::{Hash, Hasher};

use super::block::block_type::BlockType;
use super::block::Block;
use crate::world_state::coords::{ChunkCoord, ChunkSize};

pub mod codec;

/// A fixed-size dense grid of blocks at one chunk coordinate.
///
/// A chunk's identity is its `chunk_position`: two chunks at the same
/// coordinate are the same chunk, and the hash is derived solely from the
/// position. Equality still compares contents, which is consistent because
/// equal contents implies equal positions.
///
/// Chunks are immutable once built; the store shares them as `Arc<Chunk>`
/// snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    chunk_position: ChunkCoord,
    size: ChunkSize,
    blocks: Vec<Block>,
}

impl Chunk {
    /// Builds a chunk from an already-dense block array.
    ///
    /// Callers (the generators and the decoder) are responsible for supplying
    /// exactly `size.block_count()` blocks in index order.
    pub(crate) fn from_raw_parts(
        chunk_position: ChunkCoord,
        size: ChunkSize,
        blocks: Vec<Block>,
    ) -> Self {
        debug_assert_eq!(blocks.len(), size.block_count());
        Chunk {
            chunk_position,
            size,
            blocks,
        }
    }

    /// Builds a chunk with every slot set to `block_type`.
    pub fn filled(chunk_position: ChunkCoord, size: ChunkSize, block_type: BlockType) -> Self {
        let mut blocks = Vec::with_capacity(size.block_count());
        for y in 0..size.y() {
            for z in 0..size.z() {
                for x in 0..size.x() {
                    blocks.push(Block::new(x as u8, y as u8, z as u8, block_type));
                }
            }
        }
        Chunk::from_raw_parts(chunk_position, size, blocks)
    }

    /// The chunk-space coordinate this chunk occupies.
    pub fn position(&self) -> ChunkCoord {
        self.chunk_position
    }

    /// The per-world grid dimensions this chunk was built with.
    pub fn size(&self) -> ChunkSize {
        self.size
    }

    /// The dense block array, in index order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The block at a local coordinate, clamping out-of-range input to the
    /// nearest boundary block.
    ///
    /// Clamping is a documented boundary policy, not error recovery; use
    /// [`Chunk::try_block_at`] to detect out-of-range access instead.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Block {
        self.blocks[self.size.index_of(x, y, z)]
    }

    /// Strict accessor: `None` if the local coordinate is out of range.
    pub fn try_block_at(&self, x: i32, y: i32, z: i32) -> Option<Block> {
        self.size.try_index_of(x, y, z).map(|index| self.blocks[index])
    }

    /// Counts the non-air blocks in the chunk (full scan; the store caches
    /// this per resident entry).
    pub fn non_air_blocks(&self) -> usize {
        self.blocks.iter().filter(|block| !block.is_air()).count()
    }

    /// A copy of the blocks sorted descending by type ordinal, so every
    /// non-air block precedes every air block.
    ///
    /// This is the shape [`codec::count_non_air`] and
    /// [`codec::encode_sparse`] require.
    pub fn sorted_blocks(&self) -> Vec<Block> {
        let mut sorted = self.blocks.clone();
        sorted.sort_by(|a, b| b.block_type.cmp(&a.block_type));
        sorted
    }

    /// The chunk's full dense binary encoding, for persistence.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Packs the non-air prefix of a pre-sorted block sequence into the
    /// instanced-rendering payload, returning the bytes and the block count.
    ///
    /// This is one of the two entry points the rendering layer calls.
    /// **Precondition**: `sorted` is descending by type ordinal (see
    /// [`Chunk::sorted_blocks`]) and `non_air_count` is correct for it;
    /// the codec performs no sorting or validation, and violating the
    /// precondition silently truncates live blocks.
    pub fn to_buffer_bytes(&self, non_air_count: usize, sorted: &[Block]) -> (Vec<u8>, usize) {
        (codec::encode_sparse(sorted, non_air_count), non_air_count)
    }
}

impl Hash for Chunk {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chunk_position.hash(state);
    }
}
