//! # Chunk Generation
//!
//! Asynchronous chunk generation: a fixed pool of worker threads consuming
//! coordinates and publishing finished chunks into the shared world store.
//!
//! ## Worker Lifecycle
//!
//! Workers are started together when the world starts and stopped wholesale
//! when the pool is dropped (closing each worker's channel ends its loop).
//! Each unit of work is supervised: a panicking generator marks its
//! coordinate failed and retryable instead of killing the worker, so a bad
//! coordinate cannot silently drain the pool.
//!
//! ## Scheduling
//!
//! Each worker owns one channel and blocks on it when idle; the pool submits
//! coordinates round-robin. Admission control is upstream in the store: a
//! coordinate is enqueued at most once while it is unresident, so the
//! unbounded channels never accumulate duplicate work.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::core::{MtResource, WorkTracker};
use crate::world_state::coords::{ChunkCoord, ChunkSize};
use crate::world_state::voxels::block::block_type::BlockType;
use crate::world_state::voxels::chunk::Chunk;
use crate::world_state::voxels::world::ChunkMap;

pub mod heightmap;

pub use heightmap::HeightmapGenerator;

/// Default number of generation workers.
pub const DEFAULT_WORKER_COUNT: usize = 8;

/// How newly requested chunks are produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GenerationMode {
    /// Procedural terrain from the seeded heightmap.
    Heightmap,
    /// Every chunk is all air. Intended for tests and tooling that need a
    /// world without terrain.
    FlatAir,
}

/// The seam between the worker pool and a terrain algorithm.
///
/// Implementations must be deterministic: generating the same coordinate
/// twice (or on different workers) must produce byte-identical chunks,
/// because a regenerated chunk overwrites whatever was there before.
pub trait GenerateChunk: Send + Sync {
    /// Produces the full dense chunk for `coord`.
    fn generate(&self, coord: ChunkCoord) -> Chunk;
}

/// Generator for the all-air test mode.
pub struct FlatAirGenerator {
    size: ChunkSize,
}

impl FlatAirGenerator {
    /// Creates an all-air generator for the given chunk size.
    pub fn new(size: ChunkSize) -> Self {
        FlatAirGenerator { size }
    }
}

impl GenerateChunk for FlatAirGenerator {
    fn generate(&self, coord: ChunkCoord) -> Chunk {
        Chunk::filled(coord, self.size, BlockType::Air)
    }
}

/// A fixed-size pool of generation worker threads.
///
/// Owned by the world store; not part of the public API. Workers hold clones
/// of the shared chunk map and the work tracker, write exactly one entry per
/// job (their assigned coordinate), and decrement the tracker when done.
pub(crate) struct GenerationPool {
    senders: Vec<Sender<ChunkCoord>>,
    workers: Vec<JoinHandle<()>>,
    next_worker: AtomicUsize,
}

impl GenerationPool {
    /// Starts `worker_count` workers (at least one).
    ///
    /// # Panics
    /// Panics if the underlying thread creation fails.
    pub(crate) fn start(
        worker_count: usize,
        generator: Arc<dyn GenerateChunk>,
        map: MtResource<ChunkMap>,
        tracker: Arc<WorkTracker>,
    ) -> Self {
        let worker_count = worker_count.max(1);
        let mut senders = Vec::with_capacity(worker_count);
        let mut workers = Vec::with_capacity(worker_count);

        for worker_index in 0..worker_count {
            let (job_tx, job_rx) = channel::<ChunkCoord>();
            let generator = generator.clone();
            let map = map.clone();
            let tracker = tracker.clone();

            let worker = thread::Builder::new()
                .name(format!("chunk-gen-{worker_index}"))
                .spawn(move || {
                    log::debug!("generation worker {worker_index} started");
                    while let Ok(coord) = job_rx.recv() {
                        run_job(&*generator, &map, coord);
                        tracker.finish();
                    }
                    log::debug!("generation worker {worker_index} stopped");
                })
                .expect("failed to spawn generation worker thread");

            senders.push(job_tx);
            workers.push(worker);
        }

        log::info!("started {worker_count} chunk generation workers");
        GenerationPool {
            senders,
            workers,
            next_worker: AtomicUsize::new(0),
        }
    }

    /// Hands a coordinate to the next worker, round-robin.
    ///
    /// Returns `false` if no worker could accept it (its thread is gone);
    /// the store then marks the coordinate failed so the work counter stays
    /// balanced.
    pub(crate) fn submit(&self, coord: ChunkCoord) -> bool {
        if self.senders.is_empty() {
            return false;
        }
        let index = self.next_worker.fetch_add(1, Ordering::Relaxed) % self.senders.len();
        self.senders[index].send(coord).is_ok()
    }

    /// Number of workers in the pool.
    pub(crate) fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for GenerationPool {
    fn drop(&mut self) {
        // Closing the channels ends each worker's recv loop.
        self.senders.clear();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("a generation worker terminated abnormally");
            }
        }
    }
}

/// One supervised unit of work: generate `coord` and publish the outcome.
fn run_job(generator: &dyn GenerateChunk, map: &MtResource<ChunkMap>, coord: ChunkCoord) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| generator.generate(coord)));
    match outcome {
        Ok(chunk) => map.get_mut().publish(coord, chunk),
        Err(_) => {
            log::error!("chunk generation panicked at {coord}; marking it failed and retryable");
            map.get_mut().mark_failed(coord);
        }
    }
}
