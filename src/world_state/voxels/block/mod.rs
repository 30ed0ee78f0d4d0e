//! # Block Module
//!
//! The smallest unit of voxel data: a local position plus a type, four bytes
//! in total. Blocks are chunk-local; their coordinates are offsets from the
//! owning chunk's origin, never world positions.

use block_type::BlockType;

pub mod block_type;

/// The underlying integer type used to represent block types in memory.
/// This is also the type's on-disk width.
pub type BlockTypeSize = u8;

/// A single voxel, relative to its owning chunk's origin.
///
/// # Memory Layout
/// `#[repr(C)]` with four `u8` fields makes the in-memory layout identical to
/// the wire encoding (`x, y, z, type`), so packing a chunk is a plain
/// `bytemuck` slice cast with no per-block work.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Block {
    /// Local x offset within the chunk.
    pub x: u8,
    /// Local y offset within the chunk.
    pub y: u8,
    /// Local z offset within the chunk.
    pub z: u8,
    /// The block's type, encoded as a [`BlockTypeSize`].
    pub block_type: BlockTypeSize,
}

impl Block {
    /// Creates a block at the given local offset.
    pub fn new(x: u8, y: u8, z: u8, block_type: BlockType) -> Self {
        Block {
            x,
            y,
            z,
            block_type: block_type as BlockTypeSize,
        }
    }

    /// The block's type, if the stored byte names one.
    ///
    /// Blocks built through [`Block::new`] or the chunk decoder always carry
    /// a valid byte; `None` only appears for bytes forged by hand.
    pub fn kind(&self) -> Option<BlockType> {
        BlockType::from_repr(self.block_type)
    }

    /// Whether this block is empty space.
    pub fn is_air(&self) -> bool {
        self.block_type == BlockType::Air as BlockTypeSize
    }
}

/// An air block at the chunk origin.
impl Default for Block {
    fn default() -> Self {
        Block::new(0, 0, 0, BlockType::Air)
    }
}
