//! # Persistence
//!
//! Directory-based save and load of worlds.
//!
//! ## On-Disk Layout
//!
//! A world named `alpha` persists as:
//!
//! ```text
//! alpha/
//!   alpha.config      plain text: chunk-size line, seed line, amplitude line
//!   0.0.0.chunk       dense binary encoding, exactly byte_size bytes
//!   1.0.-3.chunk
//!   ...
//! ```
//!
//! Header lines starting with `#` are comments and ignored. Each chunk file
//! is named by its chunk coordinate and holds the full fixed-width encoding
//! from [`crate::world_state::voxels::chunk::codec`].
//!
//! ## Failure Policy
//!
//! A malformed header is fatal for the load. A malformed chunk file (bad
//! name, wrong size, unknown type byte) is fatal only for that chunk: it is
//! logged, recorded in the [`LoadReport`], and the rest of the world loads.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::world_state::coords::{ChunkCoord, ChunkSize, InvalidChunkSize};
use crate::world_state::voxels::chunk::codec::{self, CodecError};
use crate::world_state::voxels::chunk::Chunk;

/// File extension of the world header.
pub const CONFIG_EXTENSION: &str = "config";
/// File extension of persisted chunk files.
pub const CHUNK_EXTENSION: &str = "chunk";

/// Errors produced while saving or loading a world.
#[derive(Debug)]
pub enum PersistError {
    /// An underlying filesystem operation failed.
    Io(io::Error),
    /// The world directory path has no usable final component to derive the
    /// world name from.
    InvalidWorldDirectory {
        /// The offending path.
        path: PathBuf,
    },
    /// The header ended before a required field.
    MissingHeaderField {
        /// Name of the missing field.
        field: &'static str,
    },
    /// A header field failed to parse.
    MalformedHeaderValue {
        /// Name of the field.
        field: &'static str,
        /// The unparsable text.
        value: String,
    },
    /// The header's chunk size failed validation.
    InvalidChunkSize(InvalidChunkSize),
    /// A chunk file's name is not a `x.y.z` coordinate.
    BadChunkFileName {
        /// The offending file name.
        name: String,
    },
    /// A chunk file's body failed to decode.
    ChunkDecode(CodecError),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io(err) => write!(f, "i/o error: {err}"),
            PersistError::InvalidWorldDirectory { path } => {
                write!(f, "cannot derive a world name from {}", path.display())
            }
            PersistError::MissingHeaderField { field } => {
                write!(f, "world header is missing the {field} line")
            }
            PersistError::MalformedHeaderValue { field, value } => {
                write!(f, "world header {field} line '{value}' failed to parse")
            }
            PersistError::InvalidChunkSize(err) => write!(f, "world header: {err}"),
            PersistError::BadChunkFileName { name } => {
                write!(f, "'{name}' is not a x.y.z.chunk file name")
            }
            PersistError::ChunkDecode(err) => write!(f, "chunk body: {err}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(err) => Some(err),
            PersistError::InvalidChunkSize(err) => Some(err),
            PersistError::ChunkDecode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PersistError {
    fn from(err: io::Error) -> Self {
        PersistError::Io(err)
    }
}

impl From<InvalidChunkSize> for PersistError {
    fn from(err: InvalidChunkSize) -> Self {
        PersistError::InvalidChunkSize(err)
    }
}

impl From<CodecError> for PersistError {
    fn from(err: CodecError) -> Self {
        PersistError::ChunkDecode(err)
    }
}

/// The world parameters recorded in the `<name>.config` header.
///
/// These are the values that must match for a persisted world to reload
/// bit-identically: the chunk dimensions (the codec's layout) and the noise
/// seed and amplitude (the generator's determinism inputs).
#[derive(Clone, Debug, PartialEq)]
pub struct WorldHeader {
    /// Dimensions of every chunk in the world.
    pub chunk_size: ChunkSize,
    /// Noise seed.
    pub seed: u32,
    /// Heightmap amplitude, in blocks.
    pub amplitude: f64,
}

impl WorldHeader {
    /// Renders the header in its persisted plain-text form.
    pub fn to_config_string(&self) -> String {
        format!(
            "# Chunk size:\n{}, {}, {}\n# World seed:\n{}\n# World generation amplitude:\n{}\n",
            self.chunk_size.x(),
            self.chunk_size.y(),
            self.chunk_size.z(),
            self.seed,
            self.amplitude,
        )
    }

    /// Parses a header from its persisted plain-text form.
    ///
    /// Lines starting with `#` and blank lines are ignored; the first three
    /// remaining lines are the chunk size, the seed, and the amplitude.
    pub fn parse(text: &str) -> Result<Self, PersistError> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));
        let mut next_line = |field: &'static str| {
            lines
                .next()
                .ok_or(PersistError::MissingHeaderField { field })
        };

        let size_line = next_line("chunk size")?;
        let mut dims = [0u32; 3];
        let mut parts = size_line.split(',');
        for slot in dims.iter_mut() {
            *slot = parts
                .next()
                .and_then(|part| part.trim().parse().ok())
                .ok_or_else(|| PersistError::MalformedHeaderValue {
                    field: "chunk size",
                    value: size_line.to_owned(),
                })?;
        }
        let chunk_size = ChunkSize::new(dims[0], dims[1], dims[2])?;

        let seed_line = next_line("seed")?;
        let seed = seed_line
            .parse()
            .map_err(|_| PersistError::MalformedHeaderValue {
                field: "seed",
                value: seed_line.to_owned(),
            })?;

        let amplitude_line = next_line("amplitude")?;
        let amplitude = amplitude_line
            .parse()
            .map_err(|_| PersistError::MalformedHeaderValue {
                field: "amplitude",
                value: amplitude_line.to_owned(),
            })?;

        Ok(WorldHeader {
            chunk_size,
            seed,
            amplitude,
        })
    }
}

/// Summary of a completed save.
#[derive(Debug)]
pub struct SaveReport {
    /// The world directory that was written.
    pub directory: PathBuf,
    /// Number of chunk files written.
    pub chunks_written: usize,
}

/// Summary of a completed load.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Number of chunks decoded and made resident.
    pub chunks_loaded: usize,
    /// Chunk files that failed to parse or decode, with the reason each was
    /// skipped.
    pub skipped: Vec<(PathBuf, PersistError)>,
}

/// Derives the world name from its directory's final path component.
fn world_name(directory: &Path) -> Result<&str, PersistError> {
    directory
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PersistError::InvalidWorldDirectory {
            path: directory.to_owned(),
        })
}

/// Writes the header and every supplied chunk under `directory`, creating it
/// if needed.
pub(crate) fn save_world_to(
    directory: &Path,
    header: &WorldHeader,
    chunks: &[(ChunkCoord, Arc<Chunk>)],
) -> Result<SaveReport, PersistError> {
    let name = world_name(directory)?.to_owned();
    fs::create_dir_all(directory)?;

    let config_path = directory.join(format!("{name}.{CONFIG_EXTENSION}"));
    fs::write(&config_path, header.to_config_string())?;

    for (coord, chunk) in chunks {
        let chunk_path = directory.join(format!("{coord}.{CHUNK_EXTENSION}"));
        fs::write(&chunk_path, codec::encode(chunk))?;
    }

    log::info!(
        "saved world '{name}' ({} chunks) to {}",
        chunks.len(),
        directory.display()
    );
    Ok(SaveReport {
        directory: directory.to_owned(),
        chunks_written: chunks.len(),
    })
}

/// Reads and parses the `<name>.config` header of a world directory.
pub(crate) fn read_header(directory: &Path) -> Result<WorldHeader, PersistError> {
    let name = world_name(directory)?;
    let config_path = directory.join(format!("{name}.{CONFIG_EXTENSION}"));
    let text = fs::read_to_string(&config_path)?;
    let header = WorldHeader::parse(&text)?;
    log::info!(
        "loading world '{name}' from {} (seed {}, chunk size {})",
        directory.display(),
        header.seed,
        header.chunk_size
    );
    Ok(header)
}

/// Decodes every `*.chunk` file in the directory.
///
/// Files that fail to parse or decode are logged and collected into the
/// report's `skipped` list; only directory enumeration itself can fail the
/// whole call.
pub(crate) fn load_chunks(
    directory: &Path,
    size: ChunkSize,
) -> Result<(Vec<(ChunkCoord, Chunk)>, LoadReport), PersistError> {
    let mut chunks = Vec::new();
    let mut report = LoadReport::default();

    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(CHUNK_EXTENSION)
        {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let coord = match ChunkCoord::from_str(stem) {
            Ok(coord) => coord,
            Err(_) => {
                log::warn!("skipping chunk file with unparsable name: {}", path.display());
                report.skipped.push((
                    path.clone(),
                    PersistError::BadChunkFileName {
                        name: stem.to_owned(),
                    },
                ));
                continue;
            }
        };

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("skipping unreadable chunk file {}: {err}", path.display());
                report.skipped.push((path.clone(), PersistError::Io(err)));
                continue;
            }
        };

        match codec::decode(coord, size, &bytes) {
            Ok(chunk) => chunks.push((coord, chunk)),
            Err(err) => {
                log::warn!("skipping undecodable chunk file {}: {err}", path.display());
                report
                    .skipped
                    .push((path.clone(), PersistError::ChunkDecode(err)));
            }
        }
    }

    report.chunks_loaded = chunks.len();
    log::info!(
        "loaded {} chunks ({} skipped) from {}",
        report.chunks_loaded,
        report.skipped.len(),
        directory.display()
    );
    Ok((chunks, report))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::{PersistError, WorldHeader};
    use crate::world_state::coords::{ChunkCoord, ChunkSize};
    use crate::world_state::generation::GenerationMode;
    use crate::world_state::voxels::world::{World, WorldSettings};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// A unique, initially-absent directory under the system temp dir.
    fn scratch_world_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "voxel-world-{tag}-{}",
            std::process::id()
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        dir
    }

    fn header() -> WorldHeader {
        WorldHeader {
            chunk_size: ChunkSize::DEFAULT,
            seed: 42,
            amplitude: 16.0,
        }
    }

    #[test]
    fn header_round_trips_through_its_text_form() {
        let parsed = WorldHeader::parse(&header().to_config_string()).unwrap();
        assert_eq!(parsed, header());
    }

    #[test]
    fn header_parse_ignores_comments_and_blank_lines() {
        let text = "# a comment\n\n  16, 32, 16\n# another\n7\n\n8.5\n";
        let parsed = WorldHeader::parse(text).unwrap();
        assert_eq!(parsed.chunk_size, ChunkSize::DEFAULT);
        assert_eq!(parsed.seed, 7);
        assert_eq!(parsed.amplitude, 8.5);
    }

    #[test]
    fn header_parse_reports_missing_and_malformed_fields() {
        assert!(matches!(
            WorldHeader::parse("16, 32, 16\n"),
            Err(PersistError::MissingHeaderField { field: "seed" })
        ));
        assert!(matches!(
            WorldHeader::parse("16, 32\n0\n16\n"),
            Err(PersistError::MalformedHeaderValue {
                field: "chunk size",
                ..
            })
        ));
        assert!(matches!(
            WorldHeader::parse("16, 32, 16\nnot-a-seed\n16\n"),
            Err(PersistError::MalformedHeaderValue { field: "seed", .. })
        ));
        assert!(matches!(
            WorldHeader::parse("16, 16, 8\n0\n16\n"),
            Err(PersistError::InvalidChunkSize(_))
        ));
    }

    #[test]
    fn save_and_load_round_trip_preserves_every_chunk() {
        init_logging();
        let dir = scratch_world_dir("round-trip");

        let mut settings = WorldSettings::default();
        settings.seed = 42;
        settings.worker_count = 4;
        let world = World::new(settings);

        let coords = [
            ChunkCoord::new(0, 0, 0),
            ChunkCoord::new(1, 0, 0),
            ChunkCoord::new(-1, 0, 2),
            ChunkCoord::new(3, 0, -4),
        ];
        for coord in coords {
            world.request_generation(coord);
        }
        world.wait_until_idle();

        let save = world.save_world(&dir).unwrap();
        assert_eq!(save.chunks_written, 4);

        let (loaded, report) = World::load_world(&dir, WorldSettings::default()).unwrap();
        assert_eq!(report.chunks_loaded, 4);
        assert!(report.skipped.is_empty());

        let mut expected = world.resident_coords();
        let mut found = loaded.resident_coords();
        expected.sort();
        found.sort();
        assert_eq!(found, expected);

        for coord in coords {
            let original = world.get_chunk(coord);
            let reloaded = loaded.get_chunk(coord);
            assert_eq!(
                original.chunk().unwrap().to_bytes(),
                reloaded.chunk().unwrap().to_bytes()
            );
            assert_eq!(original.non_air_blocks(), reloaded.non_air_blocks());
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn loaded_world_regenerates_identically_to_the_original() {
        init_logging();
        let dir = scratch_world_dir("header-override");

        let mut settings = WorldSettings::default();
        settings.seed = 1234;
        settings.amplitude = 8.0;
        settings.worker_count = 2;
        let original = World::new(settings);
        original.request_generation(ChunkCoord::new(0, 0, 0));
        original.wait_until_idle();
        original.save_world(&dir).unwrap();

        // Load with mismatching settings; the header must win.
        let mut stale = WorldSettings::default();
        stale.seed = 9;
        stale.amplitude = 2.0;
        stale.worker_count = 2;
        let (loaded, _) = World::load_world(&dir, stale).unwrap();
        assert_eq!(loaded.settings().seed, 1234);
        assert_eq!(loaded.settings().amplitude, 8.0);

        // A chunk generated only after the reload matches what the original
        // world would produce for the same coordinate.
        let fresh = ChunkCoord::new(6, 0, -6);
        original.request_generation(fresh);
        loaded.request_generation(fresh);
        original.wait_until_idle();
        loaded.wait_until_idle();
        assert_eq!(
            original.get_chunk(fresh).chunk().unwrap().to_bytes(),
            loaded.get_chunk(fresh).chunk().unwrap().to_bytes()
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_chunk_files_are_skipped_not_fatal() {
        init_logging();
        let dir = scratch_world_dir("bad-chunks");

        let mut settings = WorldSettings::default();
        settings.mode = GenerationMode::FlatAir;
        settings.worker_count = 2;
        let world = World::new(settings);
        world.request_generation(ChunkCoord::new(0, 0, 0));
        world.request_generation(ChunkCoord::new(1, 0, 0));
        world.wait_until_idle();
        world.save_world(&dir).unwrap();

        // A truncated body and an unparsable name.
        fs::write(dir.join("2.0.0.chunk"), [0u8; 12]).unwrap();
        fs::write(dir.join("somewhere.chunk"), [0u8; 4]).unwrap();

        let (loaded, report) = World::load_world(&dir, WorldSettings::default()).unwrap();
        assert_eq!(report.chunks_loaded, 2);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(loaded.resident_count(), 2);
        assert!(loaded.peek_chunk(ChunkCoord::new(2, 0, 0)).is_none());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_header_fails_the_load() {
        init_logging();
        let dir = scratch_world_dir("no-header");
        fs::create_dir_all(&dir).unwrap();

        let result = World::load_world(&dir, WorldSettings::default());
        assert!(matches!(result, Err(PersistError::Io(_))));

        fs::remove_dir_all(&dir).unwrap();
    }
}
