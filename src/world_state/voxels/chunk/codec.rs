//! # Chunk Codec
//!
//! The fixed-width binary encoding for chunk block data: four unsigned bytes
//! per block (`x, y, z, type`), in array order. The full encoding is a dense
//! snapshot used for persistence; the sparse variant truncates to the non-air
//! prefix of a pre-sorted sequence and feeds the rendering boundary.
//!
//! Because [`Block`] is `#[repr(C)]` with the same four-byte layout, both
//! directions are `bytemuck` slice casts plus validation.

use std::fmt;

use super::Chunk;
use crate::world_state::coords::{ChunkCoord, ChunkSize};
use crate::world_state::voxels::block::block_type::BlockType;
use crate::world_state::voxels::block::Block;

/// Error produced when decoding a persisted chunk body fails.
#[derive(Debug)]
pub enum CodecError {
    /// The byte buffer does not match the chunk size's expected length.
    LengthMismatch {
        /// Expected number of bytes (`size.byte_size()`).
        expected: usize,
        /// Number of bytes actually supplied.
        actual: usize,
    },
    /// A block's type byte does not name a [`BlockType`] variant.
    UnknownBlockType {
        /// Index of the offending block in the array.
        block_index: usize,
        /// The unrecognized raw byte.
        raw: u8,
    },
    /// A block's local coordinates fall outside the chunk dimensions.
    BlockOutOfBounds {
        /// Index of the offending block in the array.
        block_index: usize,
        /// The out-of-range local coordinates.
        position: (u8, u8, u8),
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::LengthMismatch { expected, actual } => {
                write!(f, "chunk body is {actual} bytes, expected {expected}")
            }
            CodecError::UnknownBlockType { block_index, raw } => {
                write!(f, "block {block_index} has unknown type byte {raw}")
            }
            CodecError::BlockOutOfBounds {
                block_index,
                position,
            } => write!(
                f,
                "block {block_index} at {:?} lies outside the chunk",
                position
            ),
        }
    }
}

impl std::error::Error for CodecError {}

/// Packs every block of the chunk, four bytes each, in array order.
///
/// The result is always exactly `chunk.size().byte_size()` bytes.
pub fn encode(chunk: &Chunk) -> Vec<u8> {
    bytemuck::cast_slice(chunk.blocks()).to_vec()
}

/// Decodes a full dense chunk body back into a [`Chunk`].
///
/// Validates the byte length against `size`, every type byte, and every
/// block's local coordinates; `decode(position, size, &encode(c)) == c` for
/// any chunk `c` built with the same `size`.
pub fn decode(position: ChunkCoord, size: ChunkSize, bytes: &[u8]) -> Result<Chunk, CodecError> {
    if bytes.len() != size.byte_size() {
        return Err(CodecError::LengthMismatch {
            expected: size.byte_size(),
            actual: bytes.len(),
        });
    }

    let blocks: &[Block] = bytemuck::cast_slice(bytes);
    for (block_index, block) in blocks.iter().enumerate() {
        if BlockType::from_repr(block.block_type).is_none() {
            return Err(CodecError::UnknownBlockType {
                block_index,
                raw: block.block_type,
            });
        }
        let in_range = (block.x as u32) < size.x()
            && (block.y as u32) < size.y()
            && (block.z as u32) < size.z();
        if !in_range {
            return Err(CodecError::BlockOutOfBounds {
                block_index,
                position: (block.x, block.y, block.z),
            });
        }
    }

    Ok(Chunk::from_raw_parts(position, size, blocks.to_vec()))
}

/// Scans a descending-by-type-sorted sequence and returns the index of the
/// first air block, or the full length if none.
///
/// Undefined (wrong, not unsafe) if the input is not sorted.
pub fn count_non_air(sorted: &[Block]) -> usize {
    sorted
        .iter()
        .position(|block| block.is_air())
        .unwrap_or(sorted.len())
}

/// Truncates the packed encoding of a pre-sorted block sequence to the first
/// `non_air_count` blocks' worth of bytes.
///
/// **Precondition**: the caller sorted `sorted` descending by type ordinal
/// and supplied the correct `non_air_count` (see [`count_non_air`]). No
/// sorting or validation happens here; a wrong count silently truncates live
/// blocks. This is an explicit contract boundary, not a convenience.
pub fn encode_sparse(sorted: &[Block], non_air_count: usize) -> Vec<u8> {
    let take = non_air_count.min(sorted.len());
    bytemuck::cast_slice(&sorted[..take]).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world_state::coords::{ChunkCoord, ChunkSize};

    fn random_chunk(position: ChunkCoord, size: ChunkSize) -> Chunk {
        let mut blocks = Vec::with_capacity(size.block_count());
        for y in 0..size.y() {
            for z in 0..size.z() {
                for x in 0..size.x() {
                    let kind = if fastrand::bool() {
                        BlockType::Stone
                    } else {
                        BlockType::Air
                    };
                    blocks.push(Block::new(x as u8, y as u8, z as u8, kind));
                }
            }
        }
        Chunk::from_raw_parts(position, size, blocks)
    }

    #[test]
    fn encode_produces_the_fixed_dense_layout() {
        let size = ChunkSize::DEFAULT;
        let chunk = Chunk::filled(ChunkCoord::new(0, 0, 0), size, BlockType::Stone);
        let bytes = encode(&chunk);
        assert_eq!(bytes.len(), 32768);
        // First block: (0,0,0,Stone).
        assert_eq!(&bytes[..4], &[0, 0, 0, 1]);
    }

    #[test]
    fn decode_inverts_encode() {
        fastrand::seed(7);
        let size = ChunkSize::DEFAULT;
        let chunk = random_chunk(ChunkCoord::new(-2, 1, 5), size);
        let decoded = decode(chunk.position(), size, &encode(&chunk)).unwrap();
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let size = ChunkSize::DEFAULT;
        let result = decode(ChunkCoord::new(0, 0, 0), size, &[0u8; 16]);
        assert!(matches!(
            result,
            Err(CodecError::LengthMismatch {
                expected: 32768,
                actual: 16
            })
        ));
    }

    #[test]
    fn decode_rejects_unknown_type_bytes() {
        let size = ChunkSize::DEFAULT;
        let chunk = Chunk::filled(ChunkCoord::new(0, 0, 0), size, BlockType::Air);
        let mut bytes = encode(&chunk);
        bytes[7] = 9; // second block's type byte
        assert!(matches!(
            decode(chunk.position(), size, &bytes),
            Err(CodecError::UnknownBlockType { block_index: 1, raw: 9 })
        ));
    }

    #[test]
    fn decode_rejects_out_of_bounds_blocks() {
        let size = ChunkSize::DEFAULT;
        let chunk = Chunk::filled(ChunkCoord::new(0, 0, 0), size, BlockType::Air);
        let mut bytes = encode(&chunk);
        bytes[0] = 16; // first block's x, one past the edge
        assert!(matches!(
            decode(chunk.position(), size, &bytes),
            Err(CodecError::BlockOutOfBounds { block_index: 0, .. })
        ));
    }

    #[test]
    fn sparse_encode_takes_exactly_the_declared_prefix() {
        let size = ChunkSize::DEFAULT;
        // Three stone blocks followed by air everywhere else.
        let mut chunk = Chunk::filled(ChunkCoord::new(0, 0, 0), size, BlockType::Air);
        let mut blocks = chunk.blocks().to_vec();
        for (x, slot) in blocks.iter_mut().take(3).enumerate() {
            *slot = Block::new(x as u8, 0, 0, BlockType::Stone);
        }
        chunk = Chunk::from_raw_parts(chunk.position(), size, blocks);

        let sorted = chunk.sorted_blocks();
        let non_air = count_non_air(&sorted);
        assert_eq!(non_air, 3);

        let bytes = encode_sparse(&sorted, non_air);
        assert_eq!(bytes.len(), 12);
        let prefix: &[Block] = bytemuck::cast_slice(&bytes);
        assert!(prefix.iter().all(|block| !block.is_air()));
    }

    #[test]
    fn count_non_air_handles_all_solid_and_all_air() {
        let size = ChunkSize::new(4, 4, 4).unwrap();
        let solid = Chunk::filled(ChunkCoord::new(0, 0, 0), size, BlockType::Stone);
        assert_eq!(count_non_air(&solid.sorted_blocks()), size.block_count());

        let air = Chunk::filled(ChunkCoord::new(0, 0, 0), size, BlockType::Air);
        assert_eq!(count_non_air(&air.sorted_blocks()), 0);
    }
}
