//! # Coordinate Types
//!
//! Chunk-space and world-space coordinates are deliberately distinct types.
//! Chunk-space indexes whole chunks; world-space indexes individual voxels;
//! `world = chunk * chunk_size + local`. Keeping them apart removes the class
//! of bugs where one is passed where the other is expected, so every
//! conversion between the two spaces is an explicit method call.

use std::fmt;
use std::str::FromStr;

use cgmath::Point3;

/// The fixed per-world dimensions of a chunk, in blocks.
///
/// All chunks in a world share one `ChunkSize`; it is fixed when the world is
/// constructed and there is no way to mutate it afterwards (a previously
/// persisted world is only compatible with the size recorded in its header).
///
/// Each dimension must fit in one byte because the binary codec encodes local
/// coordinates as `u8`, and the base must be square (`x == z`) for the
/// row-major index formula to map every local coordinate to exactly one slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkSize {
    x: u32,
    y: u32,
    z: u32,
}

/// Error returned when a [`ChunkSize`] fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidChunkSize {
    /// A dimension was zero or larger than 255.
    DimensionOutOfRange {
        /// Axis name (`"x"`, `"y"`, or `"z"`).
        axis: &'static str,
        /// The rejected value.
        value: u32,
    },
    /// The horizontal base was not square (`x != z`).
    AsymmetricBase {
        /// The x dimension.
        x: u32,
        /// The z dimension.
        z: u32,
    },
}

impl fmt::Display for InvalidChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidChunkSize::DimensionOutOfRange { axis, value } => {
                write!(f, "chunk {axis} dimension {value} is outside 1..=255")
            }
            InvalidChunkSize::AsymmetricBase { x, z } => {
                write!(f, "chunk base must be square, got x={x} z={z}")
            }
        }
    }
}

impl std::error::Error for InvalidChunkSize {}

/// Number of bytes one block occupies in the binary encoding.
pub const BLOCK_ENCODED_SIZE: usize = 4;

impl ChunkSize {
    /// The default world chunk size, 16 blocks square and 32 tall.
    pub const DEFAULT: ChunkSize = ChunkSize { x: 16, y: 32, z: 16 };

    /// Creates a validated chunk size.
    ///
    /// Each dimension must be in `1..=255` and `x` must equal `z`.
    pub fn new(x: u32, y: u32, z: u32) -> Result<Self, InvalidChunkSize> {
        for (axis, value) in [("x", x), ("y", y), ("z", z)] {
            if value == 0 || value > 255 {
                return Err(InvalidChunkSize::DimensionOutOfRange { axis, value });
            }
        }
        if x != z {
            return Err(InvalidChunkSize::AsymmetricBase { x, z });
        }
        Ok(ChunkSize { x, y, z })
    }

    /// Width of a chunk along the x axis, in blocks.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Height of a chunk along the y axis, in blocks.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Depth of a chunk along the z axis, in blocks.
    pub fn z(&self) -> u32 {
        self.z
    }

    /// Total number of blocks in a chunk (`x * y * z`).
    pub fn block_count(&self) -> usize {
        (self.x * self.y * self.z) as usize
    }

    /// Size in bytes of a chunk's full dense binary encoding.
    pub fn byte_size(&self) -> usize {
        self.block_count() * BLOCK_ENCODED_SIZE
    }

    /// Maps a local coordinate to its slot in the dense block array.
    ///
    /// The mapping is row-major: `z*x*y_coord + z*z_coord + x_coord`. Each
    /// input is clamped into range first, so out-of-range callers get the
    /// nearest boundary slot. That clamping is a deliberate boundary policy;
    /// callers that need to detect out-of-range access should use
    /// [`ChunkSize::try_index_of`] instead.
    pub fn index_of(&self, x: i32, y: i32, z: i32) -> usize {
        let x = x.clamp(0, self.x as i32 - 1) as usize;
        let y = y.clamp(0, self.y as i32 - 1) as usize;
        let z = z.clamp(0, self.z as i32 - 1) as usize;
        let (sx, sz) = (self.x as usize, self.z as usize);
        sz * sx * y + sz * z + x
    }

    /// Strict variant of [`ChunkSize::index_of`]: `None` for out-of-range input.
    pub fn try_index_of(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let in_range = (0..self.x as i32).contains(&x)
            && (0..self.y as i32).contains(&y)
            && (0..self.z as i32).contains(&z);
        in_range.then(|| self.index_of(x, y, z))
    }

    /// Inverse of [`ChunkSize::index_of`] for valid indices.
    ///
    /// `index_of(coord_of(i)) == i` holds exactly for every
    /// `i < block_count()`.
    pub fn coord_of(&self, index: usize) -> (i32, i32, i32) {
        let (sx, sz) = (self.x as usize, self.z as usize);
        let plane = sx * sz;
        let y = index / plane;
        let rest = index - y * plane;
        let z = rest / sz;
        let x = rest % sz;
        (x as i32, y as i32, z as i32)
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        ChunkSize::DEFAULT
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// A chunk-space coordinate: indexes a whole chunk, not a voxel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Chunk index along the x axis.
    pub x: i32,
    /// Chunk index along the y axis.
    pub y: i32,
    /// Chunk index along the z axis.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a chunk coordinate.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        ChunkCoord { x, y, z }
    }

    /// World-space position of this chunk's `(0,0,0)` block.
    ///
    /// This is one of the two entry points the rendering layer calls; the
    /// returned point is in voxel units.
    pub fn world_origin(&self, size: ChunkSize) -> Point3<i32> {
        Point3::new(
            self.x * size.x() as i32,
            self.y * size.y() as i32,
            self.z * size.z() as i32,
        )
    }

    /// Like [`ChunkCoord::world_origin`] but as `f32`, for instance offsets.
    pub fn world_origin_f32(&self, size: ChunkSize) -> Point3<f32> {
        let origin = self.world_origin(size);
        Point3::new(origin.x as f32, origin.y as f32, origin.z as f32)
    }
}

/// Formats as `x.y.z`, the form used for persisted chunk file names.
impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.x, self.y, self.z)
    }
}

/// Error returned when parsing a `x.y.z` chunk coordinate string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseChunkCoordError {
    text: String,
}

impl fmt::Display for ParseChunkCoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a x.y.z chunk coordinate", self.text)
    }
}

impl std::error::Error for ParseChunkCoordError {}

impl FromStr for ChunkCoord {
    type Err = ParseChunkCoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseChunkCoordError { text: s.to_owned() };
        let mut parts = s.split('.');
        let mut next = || -> Result<i32, ParseChunkCoordError> {
            parts.next().ok_or_else(err)?.parse().map_err(|_| err())
        };
        let coord = ChunkCoord::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(coord)
    }
}

/// A world-space coordinate: indexes a single voxel anywhere in the world.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct WorldCoord {
    /// Voxel index along the x axis.
    pub x: i32,
    /// Voxel index along the y axis.
    pub y: i32,
    /// Voxel index along the z axis.
    pub z: i32,
}

impl WorldCoord {
    /// Creates a world coordinate.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        WorldCoord { x, y, z }
    }

    /// Splits a world coordinate into its owning chunk and the local offset
    /// within that chunk.
    ///
    /// Uses Euclidean division so negative coordinates land in the correct
    /// chunk: voxel `-1` belongs to chunk `-1` at local offset `size - 1`,
    /// not to chunk `0`.
    pub fn to_chunk_local(&self, size: ChunkSize) -> (ChunkCoord, (i32, i32, i32)) {
        let (sx, sy, sz) = (size.x() as i32, size.y() as i32, size.z() as i32);
        let chunk = ChunkCoord::new(
            self.x.div_euclid(sx),
            self.y.div_euclid(sy),
            self.z.div_euclid(sz),
        );
        let local = (
            self.x.rem_euclid(sx),
            self.y.rem_euclid(sy),
            self.z.rem_euclid(sz),
        );
        (chunk, local)
    }
}
