//! # Block Type Module
//!
//! Defines the kinds of voxel a block can be and the conversion from the
//! compact byte representation used on the wire.

use num_derive::FromPrimitive;

use super::BlockTypeSize;

/// Enumerates the voxel kinds in the world.
///
/// The discriminants are the on-disk byte values and their ordering matters:
/// `Air` is the numerically lowest variant, so sorting blocks descending by
/// type moves every non-air block in front of every air block. The sparse
/// render-payload codec relies on that ordering.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive)]
pub enum BlockType {
    /// Empty space. Non-solid, never sent to the rendering boundary.
    Air = 0,

    /// Solid terrain produced by the heightmap generator.
    Stone = 1,

    /// Sentinel marking "outside the loaded range"; never generated, only
    /// used by consumers that tag boundary voxels.
    Edge = 3,
}

impl BlockType {
    /// Converts a raw byte back to a `BlockType`.
    ///
    /// Returns `None` for bytes that do not name a variant; the chunk decoder
    /// turns that into a per-chunk error rather than trusting the byte.
    pub fn from_repr(raw: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u8(raw)
    }

    /// Whether this is the empty-space variant.
    pub fn is_air(self) -> bool {
        self == BlockType::Air
    }
}

impl Default for BlockType {
    fn default() -> Self {
        BlockType::Air
    }
}

#[cfg(test)]
mod tests {
    use super::BlockType;

    #[test]
    fn repr_round_trips_and_rejects_unknown_bytes() {
        for kind in [BlockType::Air, BlockType::Stone, BlockType::Edge] {
            assert_eq!(BlockType::from_repr(kind as u8), Some(kind));
        }
        assert_eq!(BlockType::from_repr(2), None);
        assert_eq!(BlockType::from_repr(255), None);
    }

    #[test]
    fn air_sorts_below_every_other_type() {
        assert!(BlockType::Air < BlockType::Stone);
        assert!(BlockType::Stone < BlockType::Edge);
    }
}
