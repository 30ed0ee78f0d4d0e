//! # World Module
//!
//! The `World` struct manages the collection of chunks: it is the single
//! point of truth for which chunks exist, in what state, and it owns the
//! generation pool that fills misses.
//!
//! ## Architecture
//!
//! The store is a sparse coordinate-to-entry map guarded by one lock; every
//! public operation acquires it once, so check-then-insert is a single atomic
//! step and no coordinate can be enqueued for generation twice while it is
//! unresident. Workers hold clones of the same map and write exactly one
//! entry per job.
//!
//! ## Entry Lifecycle
//!
//! A coordinate moves `absent -> Pending -> Resident` and never backwards on
//! the success path. A supervised generation failure parks it at `Failed`,
//! which the next request treats like absent (retry). Eviction removes a
//! resident entry entirely - the least-recently-accessed chunks go first once
//! the store exceeds its configured bound, and pending entries are never
//! evicted.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use lru::LruCache;

use crate::core::{MtResource, WorkTracker};
use crate::world_state::coords::{ChunkCoord, ChunkSize, WorldCoord};
use crate::world_state::generation::{
    FlatAirGenerator, GenerateChunk, GenerationMode, GenerationPool, HeightmapGenerator,
    DEFAULT_WORKER_COUNT,
};
use crate::world_state::persistence::{self, LoadReport, PersistError, SaveReport, WorldHeader};
use crate::world_state::voxels::block::Block;
use crate::world_state::voxels::chunk::Chunk;

/// Configuration a world is constructed with.
///
/// The seed, amplitude, scale, and chunk size are fixed for the lifetime of
/// the world (and recorded in its persisted header); mutating them mid-run
/// would corrupt the codec and the determinism guarantee, so there is no way
/// to do it.
#[derive(Clone, Debug)]
pub struct WorldSettings {
    /// Noise seed shared by every generation worker.
    pub seed: u32,
    /// Vertical amplitude of the terrain heightmap, in blocks.
    pub amplitude: f64,
    /// Horizontal scale applied to world coordinates before noise sampling.
    pub generation_scale: f64,
    /// Dimensions of every chunk in the world.
    pub chunk_size: ChunkSize,
    /// Number of generation worker threads.
    pub worker_count: usize,
    /// Upper bound on resident chunks before least-recently-used eviction.
    pub max_resident_chunks: usize,
    /// How missing chunks are produced.
    pub mode: GenerationMode,
}

impl Default for WorldSettings {
    fn default() -> Self {
        WorldSettings {
            seed: 0,
            amplitude: 16.0,
            generation_scale: 0.05,
            chunk_size: ChunkSize::DEFAULT,
            worker_count: DEFAULT_WORKER_COUNT,
            max_resident_chunks: 4096,
            mode: GenerationMode::Heightmap,
        }
    }
}

/// The state of one coordinate in the store.
#[derive(Clone, Debug)]
pub enum ChunkEntry {
    /// Generation has been requested but has not completed. Block data must
    /// never be read through this entry.
    Pending,
    /// Generation failed; the next request for this coordinate retries.
    Failed,
    /// A completed chunk, with its non-air block count precomputed at
    /// publish time for the rendering boundary.
    Resident {
        /// The finished, immutable chunk.
        chunk: Arc<Chunk>,
        /// Number of non-air blocks in the chunk.
        non_air_blocks: usize,
    },
}

impl ChunkEntry {
    /// Whether generation is still outstanding for this coordinate.
    pub fn is_pending(&self) -> bool {
        matches!(self, ChunkEntry::Pending)
    }

    /// Whether a completed chunk is available.
    pub fn is_resident(&self) -> bool {
        matches!(self, ChunkEntry::Resident { .. })
    }

    /// The completed chunk, if resident.
    pub fn chunk(&self) -> Option<&Arc<Chunk>> {
        match self {
            ChunkEntry::Resident { chunk, .. } => Some(chunk),
            _ => None,
        }
    }

    /// The precomputed non-air block count, if resident.
    pub fn non_air_blocks(&self) -> Option<usize> {
        match self {
            ChunkEntry::Resident { non_air_blocks, .. } => Some(*non_air_blocks),
            _ => None,
        }
    }
}

/// Errors surfaced by world-level block access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldError {
    /// The owning chunk exists only as a placeholder; its block data is not
    /// available yet. Callers poll again after generation completes rather
    /// than treating this as fatal.
    ChunkNotGenerated {
        /// The chunk that has not finished generating.
        coord: ChunkCoord,
    },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::ChunkNotGenerated { coord } => {
                write!(f, "chunk {coord} has not been generated yet")
            }
        }
    }
}

impl std::error::Error for WorldError {}

/// The coordinate-to-entry map plus its eviction bookkeeping.
///
/// Always accessed through `MtResource`, one lock acquisition per operation.
/// The recency list tracks resident coordinates only, so pending entries can
/// never be chosen as eviction victims.
pub(crate) struct ChunkMap {
    entries: HashMap<ChunkCoord, ChunkEntry>,
    recency: LruCache<ChunkCoord, ()>,
    max_resident: usize,
}

impl ChunkMap {
    fn new(max_resident: usize) -> Self {
        ChunkMap {
            entries: HashMap::new(),
            recency: LruCache::unbounded(),
            max_resident: max_resident.max(1),
        }
    }

    /// Returns the entry at `coord`, refreshing its recency if resident.
    fn lookup_touch(&mut self, coord: ChunkCoord) -> Option<ChunkEntry> {
        let entry = self.entries.get(&coord)?.clone();
        if entry.is_resident() {
            self.recency.get(&coord);
        }
        Some(entry)
    }

    fn insert_pending(&mut self, coord: ChunkCoord) {
        self.entries.insert(coord, ChunkEntry::Pending);
    }

    /// Installs a finished chunk, evicting least-recently-used residents if
    /// the store has grown past its bound.
    pub(crate) fn publish(&mut self, coord: ChunkCoord, chunk: Chunk) {
        let non_air_blocks = chunk.non_air_blocks();
        self.entries.insert(
            coord,
            ChunkEntry::Resident {
                chunk: Arc::new(chunk),
                non_air_blocks,
            },
        );
        self.recency.put(coord, ());

        while self.recency.len() > self.max_resident {
            match self.recency.pop_lru() {
                Some((victim, ())) => {
                    self.entries.remove(&victim);
                    log::debug!("evicted least-recently-used chunk {victim}");
                }
                None => break,
            }
        }
    }

    /// Parks a coordinate at `Failed` after a supervised generation failure.
    pub(crate) fn mark_failed(&mut self, coord: ChunkCoord) {
        self.entries.insert(coord, ChunkEntry::Failed);
    }

    fn peek(&self, coord: ChunkCoord) -> Option<ChunkEntry> {
        self.entries.get(&coord).cloned()
    }

    fn resident_count(&self) -> usize {
        self.recency.len()
    }

    fn resident_chunks(&self) -> Vec<(ChunkCoord, Arc<Chunk>)> {
        self.entries
            .iter()
            .filter_map(|(coord, entry)| entry.chunk().map(|chunk| (*coord, chunk.clone())))
            .collect()
    }

    fn resident_coords(&self) -> Vec<ChunkCoord> {
        self.entries
            .iter()
            .filter_map(|(coord, entry)| entry.is_resident().then_some(*coord))
            .collect()
    }
}

/// A procedurally generated, chunked voxel world.
///
/// Chunks are created lazily on first request: a miss inserts a `Pending`
/// placeholder, hands the coordinate to the worker pool, and returns
/// immediately. [`World::wait_until_idle`] drains all queued generation
/// before a bulk snapshot.
pub struct World {
    settings: WorldSettings,
    map: MtResource<ChunkMap>,
    tracker: Arc<WorkTracker>,
    generator: Arc<dyn GenerateChunk>,
    pool: GenerationPool,
}

impl World {
    /// Creates a world and starts its generation workers.
    pub fn new(settings: WorldSettings) -> Self {
        let generator: Arc<dyn GenerateChunk> = match settings.mode {
            GenerationMode::Heightmap => Arc::new(HeightmapGenerator::new(
                settings.seed,
                settings.chunk_size,
                settings.amplitude,
                settings.generation_scale,
            )),
            GenerationMode::FlatAir => Arc::new(FlatAirGenerator::new(settings.chunk_size)),
        };
        World::with_generator(settings, generator)
    }

    /// Creates a world that generates chunks through a caller-supplied
    /// generator instead of one of the built-in modes.
    ///
    /// The generator must honor the determinism contract documented on
    /// [`GenerateChunk`].
    pub fn with_generator(settings: WorldSettings, generator: Arc<dyn GenerateChunk>) -> Self {
        let map = MtResource::new(ChunkMap::new(settings.max_resident_chunks));
        let tracker = Arc::new(WorkTracker::new());
        let pool = GenerationPool::start(
            settings.worker_count,
            generator.clone(),
            map.clone(),
            tracker.clone(),
        );
        log::info!(
            "world ready: seed {}, chunk size {}, {} workers",
            settings.seed,
            settings.chunk_size,
            pool.worker_count()
        );
        World {
            settings,
            map,
            tracker,
            generator,
            pool,
        }
    }

    /// The configuration this world was constructed with.
    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// The fixed chunk dimensions shared by every chunk in this world.
    pub fn chunk_size(&self) -> ChunkSize {
        self.settings.chunk_size
    }

    /// Returns the entry at `coord`, requesting generation on a miss.
    ///
    /// Never blocks: if the chunk is not resident, a `Pending` placeholder is
    /// installed atomically, the coordinate is enqueued, and the placeholder
    /// is returned. A previously failed coordinate is retried the same way.
    pub fn get_chunk(&self, coord: ChunkCoord) -> ChunkEntry {
        {
            let mut map = self.map.get_mut();
            match map.lookup_touch(coord) {
                Some(ChunkEntry::Failed) | None => {
                    map.insert_pending(coord);
                    self.tracker.add(1);
                }
                Some(entry) => return entry,
            }
        }
        self.dispatch(coord);
        ChunkEntry::Pending
    }

    /// Requests generation of `coord` if it is neither resident nor already
    /// in flight.
    ///
    /// Returns `true` only when this call enqueued the work; repeated or
    /// concurrent calls for the same unresident coordinate enqueue exactly
    /// once. Regeneration would clobber data, so this idempotence is a
    /// correctness property, not an optimization.
    pub fn request_generation(&self, coord: ChunkCoord) -> bool {
        {
            let mut map = self.map.get_mut();
            match map.peek(coord) {
                Some(ChunkEntry::Failed) | None => {
                    map.insert_pending(coord);
                    self.tracker.add(1);
                }
                Some(_) => return false,
            }
        }
        self.dispatch(coord);
        true
    }

    /// Hands an already-pending coordinate to the pool, rebalancing the
    /// books if no worker can take it.
    fn dispatch(&self, coord: ChunkCoord) {
        if !self.pool.submit(coord) {
            log::error!("no generation worker accepted {coord}; marking it failed");
            self.map.get_mut().mark_failed(coord);
            self.tracker.finish();
        }
    }

    /// Observes the entry at `coord` without touching recency or enqueueing
    /// generation.
    pub fn peek_chunk(&self, coord: ChunkCoord) -> Option<ChunkEntry> {
        self.map.get().peek(coord)
    }

    /// Blocks until every enqueued generation has been published.
    ///
    /// This is the only blocking operation the world exposes; it wakes
    /// promptly once the outstanding-work counter reaches zero.
    pub fn wait_until_idle(&self) {
        self.tracker.wait_until_idle();
    }

    /// Number of generation requests still queued or running.
    pub fn outstanding_generation(&self) -> usize {
        self.tracker.outstanding()
    }

    /// Number of resident (fully generated) chunks.
    pub fn resident_count(&self) -> usize {
        self.map.get().resident_count()
    }

    /// Snapshot of the coordinates that currently hold resident chunks.
    pub fn resident_coords(&self) -> Vec<ChunkCoord> {
        self.map.get().resident_coords()
    }

    /// Looks up the block at a world-space position.
    ///
    /// The position is split into its owning chunk and local offset (floor
    /// semantics, so negative coordinates resolve correctly) and the chunk is
    /// requested as by [`World::get_chunk`]. If the chunk is not resident yet
    /// the error names it; callers poll again once generation completes.
    pub fn inspect_block(&self, position: WorldCoord) -> Result<Block, WorldError> {
        let (chunk_coord, (x, y, z)) = position.to_chunk_local(self.settings.chunk_size);
        match self.get_chunk(chunk_coord) {
            ChunkEntry::Resident { chunk, .. } => Ok(chunk.block_at(x, y, z)),
            ChunkEntry::Pending | ChunkEntry::Failed => {
                Err(WorldError::ChunkNotGenerated { coord: chunk_coord })
            }
        }
    }

    /// Replaces the worker pool wholesale.
    ///
    /// Drains outstanding generation first so no queued coordinate is lost,
    /// then stops every worker and starts a fresh pool with the same
    /// generator.
    pub fn restart_workers(&mut self) {
        self.tracker.wait_until_idle();
        log::info!("restarting generation workers");
        self.pool = GenerationPool::start(
            self.settings.worker_count,
            self.generator.clone(),
            self.map.clone(),
            self.tracker.clone(),
        );
    }

    /// Persists the world to `directory`: a `<name>.config` header plus one
    /// binary `<x>.<y>.<z>.chunk` file per resident chunk.
    ///
    /// Pending coordinates are not persisted; callers that need a complete
    /// snapshot call [`World::wait_until_idle`] first.
    pub fn save_world(&self, directory: &Path) -> Result<SaveReport, PersistError> {
        let header = WorldHeader {
            chunk_size: self.settings.chunk_size,
            seed: self.settings.seed,
            amplitude: self.settings.amplitude,
        };
        let chunks = self.map.get().resident_chunks();
        persistence::save_world_to(directory, &header, &chunks)
    }

    /// Loads a world from `directory`.
    ///
    /// The persisted header's chunk size, seed, and amplitude override the
    /// corresponding fields of `settings` (worker count, eviction bound, and
    /// mode are taken from `settings`). Every readable chunk file becomes a
    /// resident entry; files that fail to parse or decode are skipped,
    /// logged, and reported in the [`LoadReport`].
    pub fn load_world(
        directory: &Path,
        mut settings: WorldSettings,
    ) -> Result<(World, LoadReport), PersistError> {
        let header = persistence::read_header(directory)?;
        settings.chunk_size = header.chunk_size;
        settings.seed = header.seed;
        settings.amplitude = header.amplitude;

        let world = World::new(settings);
        let (chunks, report) = persistence::load_chunks(directory, header.chunk_size)?;
        {
            let mut map = world.map.get_mut();
            for (coord, chunk) in chunks {
                map.publish(coord, chunk);
            }
            if map.resident_count() < report.chunks_loaded {
                log::warn!(
                    "save holds {} chunks but the resident bound is {}; oldest were evicted",
                    report.chunks_loaded,
                    world.settings.max_resident_chunks
                );
            }
        }
        Ok((world, report))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::{ChunkEntry, World, WorldError, WorldSettings};
    use crate::world_state::coords::{ChunkCoord, WorldCoord};
    use crate::world_state::generation::{FlatAirGenerator, GenerateChunk, GenerationMode};
    use crate::world_state::voxels::chunk::Chunk;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn flat_settings() -> WorldSettings {
        let mut settings = WorldSettings::default();
        settings.mode = GenerationMode::FlatAir;
        settings.worker_count = 4;
        settings
    }

    /// Delegates to the flat generator after a delay, so tests can observe
    /// the pending window deterministically.
    struct SlowGenerator {
        inner: FlatAirGenerator,
        delay: Duration,
    }

    impl GenerateChunk for SlowGenerator {
        fn generate(&self, coord: ChunkCoord) -> Chunk {
            thread::sleep(self.delay);
            self.inner.generate(coord)
        }
    }

    /// Panics the first time it sees its poisoned coordinate, then behaves.
    struct FaultyGenerator {
        inner: FlatAirGenerator,
        poisoned: ChunkCoord,
        tripped: AtomicBool,
    }

    impl GenerateChunk for FaultyGenerator {
        fn generate(&self, coord: ChunkCoord) -> Chunk {
            if coord == self.poisoned && !self.tripped.swap(true, Ordering::SeqCst) {
                panic!("injected generation failure");
            }
            self.inner.generate(coord)
        }
    }

    #[test]
    fn miss_returns_pending_and_resolves_to_resident() {
        init_logging();
        let settings = flat_settings();
        let world = World::with_generator(
            settings.clone(),
            Arc::new(SlowGenerator {
                inner: FlatAirGenerator::new(settings.chunk_size),
                delay: Duration::from_millis(50),
            }),
        );

        let coord = ChunkCoord::new(0, 0, 0);
        assert!(world.get_chunk(coord).is_pending());

        world.wait_until_idle();
        let entry = world.get_chunk(coord);
        assert!(entry.is_resident());
        assert_eq!(entry.non_air_blocks(), Some(0));
    }

    #[test]
    fn request_generation_is_idempotent() {
        init_logging();
        let world = World::new(flat_settings());
        let coord = ChunkCoord::new(2, 0, -3);

        assert!(world.request_generation(coord));
        assert!(!world.request_generation(coord));

        world.wait_until_idle();
        assert!(!world.request_generation(coord));
        assert_eq!(world.resident_count(), 1);
    }

    #[test]
    fn concurrent_requests_enqueue_exactly_once() {
        init_logging();
        let world = Arc::new(World::new(flat_settings()));
        let coord = ChunkCoord::new(5, 0, 5);

        let mut accepted = 0;
        thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let world = world.clone();
                    scope.spawn(move || world.request_generation(coord))
                })
                .collect();
            accepted = handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|&enqueued| enqueued)
                .count();
        });

        assert_eq!(accepted, 1);
        world.wait_until_idle();
        assert_eq!(world.resident_count(), 1);
    }

    #[test]
    fn idle_wait_drains_sixty_four_coordinates() {
        init_logging();
        let mut settings = WorldSettings::default();
        settings.worker_count = 8;
        let world = World::new(settings);

        for x in 0..8 {
            for z in 0..8 {
                assert!(world.request_generation(ChunkCoord::new(x, 0, z)));
            }
        }

        world.wait_until_idle();
        assert_eq!(world.outstanding_generation(), 0);
        assert_eq!(world.resident_count(), 64);
        for x in 0..8 {
            for z in 0..8 {
                assert!(world.get_chunk(ChunkCoord::new(x, 0, z)).is_resident());
            }
        }
    }

    #[test]
    fn inspect_block_reports_pending_chunks() {
        init_logging();
        let settings = flat_settings();
        let world = World::with_generator(
            settings.clone(),
            Arc::new(SlowGenerator {
                inner: FlatAirGenerator::new(settings.chunk_size),
                delay: Duration::from_millis(100),
            }),
        );

        let position = WorldCoord::new(40, 5, -1);
        let err = world.inspect_block(position).unwrap_err();
        assert_eq!(
            err,
            WorldError::ChunkNotGenerated {
                coord: ChunkCoord::new(2, 0, -1)
            }
        );

        world.wait_until_idle();
        let block = world.inspect_block(position).unwrap();
        assert!(block.is_air());
        assert_eq!((block.x, block.y, block.z), (8, 5, 15));
    }

    #[test]
    fn inspect_block_reads_generated_terrain() {
        init_logging();
        let mut settings = WorldSettings::default();
        settings.worker_count = 2;
        let world = World::new(settings);

        // Ground level is always stone (column heights clamp to >= 1).
        let position = WorldCoord::new(-7, 0, 13);
        assert!(world.inspect_block(position).is_err());
        world.wait_until_idle();
        assert!(!world.inspect_block(position).unwrap().is_air());
    }

    #[test]
    fn panicking_generator_marks_the_coordinate_failed_and_retryable() {
        init_logging();
        let settings = flat_settings();
        let poisoned = ChunkCoord::new(1, 0, 1);
        let world = World::with_generator(
            settings.clone(),
            Arc::new(FaultyGenerator {
                inner: FlatAirGenerator::new(settings.chunk_size),
                poisoned,
                tripped: AtomicBool::new(false),
            }),
        );

        assert!(world.request_generation(poisoned));
        world.wait_until_idle();
        assert!(matches!(
            world.peek_chunk(poisoned),
            Some(ChunkEntry::Failed)
        ));

        // The worker survived: other coordinates still generate...
        assert!(world.request_generation(ChunkCoord::new(0, 0, 0)));
        world.wait_until_idle();
        assert!(world.get_chunk(ChunkCoord::new(0, 0, 0)).is_resident());

        // ...and the failed coordinate is retryable.
        assert!(world.request_generation(poisoned));
        world.wait_until_idle();
        assert!(world.get_chunk(poisoned).is_resident());
    }

    #[test]
    fn eviction_keeps_the_resident_set_bounded() {
        init_logging();
        let mut settings = flat_settings();
        settings.worker_count = 1;
        settings.max_resident_chunks = 4;
        let world = World::new(settings);

        for x in 0..10 {
            world.request_generation(ChunkCoord::new(x, 0, 0));
            world.wait_until_idle();
        }

        assert_eq!(world.resident_count(), 4);
        // The oldest chunks were evicted; the newest four survive.
        for x in 6..10 {
            assert!(world.peek_chunk(ChunkCoord::new(x, 0, 0)).is_some());
        }
        assert!(world.peek_chunk(ChunkCoord::new(0, 0, 0)).is_none());
    }

    #[test]
    fn eviction_prefers_least_recently_accessed_chunks() {
        init_logging();
        let mut settings = flat_settings();
        settings.worker_count = 1;
        settings.max_resident_chunks = 2;
        let world = World::new(settings);

        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(1, 0, 0);
        let c = ChunkCoord::new(2, 0, 0);

        world.request_generation(a);
        world.wait_until_idle();
        world.request_generation(b);
        world.wait_until_idle();

        // Touch `a`, making `b` the eviction candidate.
        assert!(world.get_chunk(a).is_resident());

        world.request_generation(c);
        world.wait_until_idle();

        assert!(world.peek_chunk(a).is_some());
        assert!(world.peek_chunk(b).is_none());
        assert!(world.peek_chunk(c).is_some());
    }

    #[test]
    fn pending_entries_are_never_evicted() {
        init_logging();
        let mut map = super::ChunkMap::new(1);
        let waiting = ChunkCoord::new(9, 9, 9);
        map.insert_pending(waiting);

        let settings = flat_settings();
        let generator = FlatAirGenerator::new(settings.chunk_size);
        for x in 0..3 {
            let coord = ChunkCoord::new(x, 0, 0);
            map.publish(coord, generator.generate(coord));
        }

        assert_eq!(map.resident_count(), 1);
        assert!(matches!(map.peek(waiting), Some(ChunkEntry::Pending)));
    }

    #[test]
    fn restart_workers_keeps_serving_requests() {
        init_logging();
        let mut world = World::new(flat_settings());
        world.request_generation(ChunkCoord::new(0, 0, 0));
        world.restart_workers();

        world.request_generation(ChunkCoord::new(1, 0, 0));
        world.wait_until_idle();
        assert_eq!(world.resident_count(), 2);
    }
}
