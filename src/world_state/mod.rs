//! # World State Module
//!
//! The domain layer of the crate: voxel data, chunk generation, streaming
//! queries, and persistence.
//!
//! ## Key Components
//!
//! * `coords` - Chunk-space and world-space coordinate types and conversions
//! * `voxels` - Blocks, chunks, the binary chunk codec, and the world store
//! * `generation` - The heightmap generator and the worker pool that runs it
//! * `streaming` - Radius queries and resident-set diffing for a moving viewpoint
//! * `persistence` - Directory-based save/load of worlds
//!
//! ## Architecture
//!
//! The [`voxels::world::World`] store is the single point of truth for which
//! chunks exist. Generation workers share it through
//! [`crate::core::MtResource`] and write exactly one entry each (their
//! assigned coordinate); all other modules are pure functions or codecs over
//! the store's contents.

pub mod coords;
pub mod generation;
pub mod persistence;
pub mod streaming;
pub mod voxels;
