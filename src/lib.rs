#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A chunked, procedurally generated voxel world store.
//!
//! This crate owns the data model for blocks and chunks, a concurrent
//! generation worker pool, spatial queries for streaming, and directory-based
//! persistence. It deliberately stops at the rendering boundary: consumers
//! receive packed block buffers and chunk origins, never GPU resources.
//!
//! ## Key Modules
//!
//! * `core` - Shared concurrency primitives (`MtResource`, `WorkTracker`)
//! * `world_state` - The domain layer: voxel data, generation, streaming,
//!   and persistence
//!
//! ## Data Flow
//!
//! 1. A consumer asks the [`World`] for a chunk at a coordinate
//! 2. Resident chunks are returned immediately; misses atomically insert a
//!    `Pending` placeholder and enqueue the coordinate to the worker pool
//! 3. A worker generates the chunk from the seeded heightmap and publishes it
//!    back into the store, waking anyone blocked in [`World::wait_until_idle`]
//! 4. The streaming layer tells the consumer which coordinates should be
//!    resident as the viewpoint moves; the store evicts least-recently-used
//!    chunks beyond its configured bound
//!
//! ## Example
//!
//! ```
//! use voxel_world::{ChunkCoord, GenerationMode, World, WorldSettings};
//!
//! let mut settings = WorldSettings::default();
//! settings.mode = GenerationMode::FlatAir;
//! settings.worker_count = 2;
//!
//! let world = World::new(settings);
//! world.request_generation(ChunkCoord::new(0, 0, 0));
//! world.wait_until_idle();
//! assert_eq!(world.resident_count(), 1);
//! ```

pub mod core;
pub mod world_state;

pub use world_state::coords::{ChunkCoord, ChunkSize, InvalidChunkSize, WorldCoord};
pub use world_state::generation::{
    FlatAirGenerator, GenerateChunk, GenerationMode, HeightmapGenerator,
};
pub use world_state::persistence::{LoadReport, PersistError, SaveReport, WorldHeader};
pub use world_state::streaming::{positions_in_radius, stream_diff, DistanceMetric, StreamDiff};
pub use world_state::voxels::block::block_type::BlockType;
pub use world_state::voxels::block::Block;
pub use world_state::voxels::chunk::Chunk;
pub use world_state::voxels::world::{ChunkEntry, World, WorldError, WorldSettings};
