//! Saving and loading arenas as flat record files.
//!
//! A store is a count line followed by one [`Record`] per line:
//!
//! ```text
//! 2
//! 1 grub 10 20
//! 3 old\selm 7 8
//! ```
//!
//! Loading is forgiving. A record that does not parse is skipped and
//! reported; the rest of the file still loads. A store that cannot be opened
//! yields an empty arena plus the failure. Nothing here panics on bad input.
//!
//! # Example
//!
//! ```
//! use skirmish_core::arena::Arena;
//! use skirmish_core::entity::{Entity, EntityKind};
//! use skirmish_core::storage;
//!
//! let mut arena = Arena::new();
//! arena.insert(Entity::new(EntityKind::Ork, "grub", 10, 20).into_ref());
//!
//! let mut buffer = Vec::new();
//! storage::write_arena(&arena, &mut buffer).unwrap();
//! assert_eq!(String::from_utf8(buffer.clone()).unwrap(), "1\n1 grub 10 20\n");
//!
//! let loaded = storage::read_arena(buffer.as_slice(), &[]);
//! assert!(loaded.is_clean());
//! assert_eq!(loaded.arena.len(), 1);
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::arena::Arena;
use crate::error::{RecordError, StorageError};
use crate::factory;
use crate::observers::Observers;
use crate::record::Record;

/// Outcome of a load: whatever could be read, plus what went wrong.
#[derive(Debug, Default)]
pub struct Loaded {
    /// Entities that loaded, in file order.
    pub arena: Arena,
    /// Records that were skipped, with their 1-based line numbers.
    pub skipped: Vec<(usize, RecordError)>,
    /// Set when the store as a whole could not be read.
    pub failure: Option<StorageError>,
}

impl Loaded {
    /// Returns `true` if every record loaded and the store was readable.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failure.is_none()
    }
}

// =============================================================================
// Save
// =============================================================================

/// Writes every entity in the arena, dead ones included, to `out`.
///
/// # Errors
///
/// Propagates write failures from `out`.
pub fn write_arena<W: Write>(arena: &Arena, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", arena.len())?;
    for entity in arena {
        writeln!(out, "{}", Record::of(entity))?;
    }
    out.flush()
}

/// Saves the arena to `path`, replacing any existing file.
///
/// # Errors
///
/// [`StorageError::Open`] if the file cannot be created,
/// [`StorageError::Write`] if writing fails part way.
pub fn save(arena: &Arena, path: impl AsRef<Path>) -> Result<(), StorageError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| StorageError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    write_arena(arena, &mut BufWriter::new(file)).map_err(|source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), entities = arena.len(), "arena saved");
    Ok(())
}

// =============================================================================
// Load
// =============================================================================

/// Reads a record stream, creating each entity with `observers` attached.
///
/// Reading stops after the number of records announced by the count line,
/// or at end of input if fewer are present. Blank lines are not records.
pub fn read_arena<R: BufRead>(input: R, observers: &Observers) -> Loaded {
    let mut loaded = Loaded::default();
    let mut lines = input.lines().enumerate();

    let expected = match lines.next() {
        Some((_, Ok(line))) => match line.trim().parse::<usize>() {
            Ok(count) => count,
            Err(_) => {
                warn!(line = %line, "invalid record count");
                loaded.failure = Some(StorageError::BadCount(line));
                return loaded;
            }
        },
        Some((_, Err(err))) => {
            loaded.failure = Some(StorageError::Read(err));
            return loaded;
        }
        None => {
            loaded.failure = Some(StorageError::BadCount(String::new()));
            return loaded;
        }
    };

    let mut seen = 0;
    for (index, line) in lines {
        if seen == expected {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "record stream truncated");
                loaded.failure = Some(StorageError::Read(err));
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        seen += 1;

        match factory::create_from_record(&line, observers) {
            Ok(entity) => {
                loaded.arena.insert(entity);
            }
            Err(err) => {
                let line_no = index + 1;
                warn!(line = line_no, error = %err, "skipping record");
                loaded.skipped.push((line_no, err));
            }
        }
    }

    if seen < expected {
        warn!(expected, found = seen, "record stream shorter than its count");
    }
    loaded
}

/// Loads an arena from `path`.
///
/// A missing or unreadable file is not fatal: the result holds an empty
/// arena and the [`StorageError`] in [`Loaded::failure`].
pub fn load(path: impl AsRef<Path>, observers: &Observers) -> Loaded {
    let path = path.as_ref();
    match File::open(path) {
        Ok(file) => {
            let loaded = read_arena(BufReader::new(file), observers);
            debug!(
                path = %path.display(),
                entities = loaded.arena.len(),
                skipped = loaded.skipped.len(),
                "arena loaded"
            );
            loaded
        }
        Err(source) => {
            warn!(path = %path.display(), error = %source, "cannot open arena store");
            Loaded {
                failure: Some(StorageError::Open {
                    path: path.to_path_buf(),
                    source,
                }),
                ..Loaded::default()
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
