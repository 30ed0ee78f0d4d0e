//! # Streaming Queries
//!
//! Pure spatial queries over chunk coordinates, used by a consumer to keep a
//! bounded working set resident as its viewpoint moves: enumerate the
//! coordinates that should be loaded around a center, then diff that desired
//! set against what is already resident.
//!
//! Nothing here holds state; the world store remains the single point of
//! truth and these functions only compute over its key space.

use std::collections::HashSet;

use crate::world_state::coords::ChunkCoord;

/// The distance function used by [`positions_in_radius`].
///
/// The crate's documented default is [`DistanceMetric::Euclidean`]; the
/// metric is an explicit parameter so a caller that wants the diamond-shaped
/// Manhattan neighborhood opts into it visibly instead of inheriting a
/// silent behavioral drift.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Straight-line distance: `dx*dx + dz*dz <= r*r`.
    Euclidean,
    /// Taxicab distance: `|dx| + |dz| <= r`.
    Manhattan,
}

impl DistanceMetric {
    fn contains(self, dx: i32, dz: i32, radius: i32) -> bool {
        match self {
            DistanceMetric::Euclidean => {
                let (dx, dz, radius) = (dx as i64, dz as i64, radius as i64);
                dx * dx + dz * dz <= radius * radius
            }
            DistanceMetric::Manhattan => dx.abs() + dz.abs() <= radius,
        }
    }
}

/// Enumerates the chunk coordinates within `radius` of `center` in the
/// horizontal plane (`y` is held at `center.y`).
///
/// Always includes `center` itself; a non-positive radius yields exactly the
/// center. Coordinates come out in row-major scan order, deterministic for a
/// given input.
pub fn positions_in_radius(
    center: ChunkCoord,
    radius: i32,
    metric: DistanceMetric,
) -> Vec<ChunkCoord> {
    let radius = radius.max(0);
    let mut out = Vec::new();
    for dz in -radius..=radius {
        for dx in -radius..=radius {
            if metric.contains(dx, dz, radius) {
                out.push(ChunkCoord::new(center.x + dx, center.y, center.z + dz));
            }
        }
    }
    out
}

/// The work a consumer must do to move from one resident set to another.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamDiff {
    /// Desired coordinates that are not resident yet, in desired order.
    pub to_load: Vec<ChunkCoord>,
    /// Resident coordinates no longer desired, sorted for determinism.
    pub to_evict: Vec<ChunkCoord>,
}

/// Diffs the desired set against the resident set.
///
/// `to_load = desired - resident` and `to_evict = resident - desired`;
/// computed each time the viewpoint crosses a chunk boundary.
pub fn stream_diff(desired: &[ChunkCoord], resident: &HashSet<ChunkCoord>) -> StreamDiff {
    let desired_set: HashSet<ChunkCoord> = desired.iter().copied().collect();

    let to_load = desired
        .iter()
        .copied()
        .filter(|coord| !resident.contains(coord))
        .collect();

    let mut to_evict: Vec<ChunkCoord> = resident
        .iter()
        .copied()
        .filter(|coord| !desired_set.contains(coord))
        .collect();
    to_evict.sort();

    StreamDiff { to_load, to_evict }
}
