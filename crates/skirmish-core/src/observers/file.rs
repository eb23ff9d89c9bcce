//! Kill log sink backed by any writer, normally a file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::entity::EntityRef;
use crate::error::StorageError;

use super::FightObserver;

/// Writes one `Kill: <attacker> -> <defender>` line per kill and flushes it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use skirmish_core::entity::{Entity, EntityKind};
/// use skirmish_core::observers::{FileObserver, FightObserver};
///
/// let sink = FileObserver::from_writer(Vec::new());
/// let ork = Entity::new(EntityKind::Ork, "grub", 1, 2).into_ref();
/// let druid = Entity::new(EntityKind::Druid, "elm", 3, 4).into_ref();
///
/// sink.on_fight(&ork, &druid, true);
/// sink.on_fight(&ork, &druid, false);
///
/// let text = String::from_utf8(sink.into_inner()).unwrap();
/// assert_eq!(text, "Kill: Ork grub {1, 2} -> Druid elm {3, 4}\n");
/// ```
#[derive(Debug)]
pub struct FileObserver<W: Write + Send = BufWriter<File>> {
    out: Mutex<W>,
}

impl FileObserver {
    /// Creates (truncating) the kill log at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| StorageError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write + Send> FileObserver<W> {
    /// Wraps an arbitrary writer.
    #[must_use]
    pub fn from_writer(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> FightObserver for FileObserver<W> {
    fn on_fight(&self, attacker: &EntityRef, defender: &EntityRef, won: bool) {
        if !won {
            return;
        }
        // Format before locking so the sink lock covers only the write.
        let line = format!("Kill: {attacker} -> {defender}\n");
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = out.write_all(line.as_bytes()).and_then(|()| out.flush()) {
            warn!(%error, "failed to append to kill log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityKind};

    #[test]
    fn appends_one_line_per_kill() {
        let sink = FileObserver::from_writer(Vec::new());
        let druid = Entity::new(EntityKind::Druid, "d", 0, 0).into_ref();
        let first = Entity::new(EntityKind::Squirrel, "s1", 1, 1).into_ref();
        let second = Entity::new(EntityKind::Squirrel, "s2", 2, 2).into_ref();

        sink.on_fight(&druid, &first, true);
        sink.on_fight(&druid, &second, true);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Kill: Druid d {0, 0} -> Squirrel s1 {1, 1}",
                "Kill: Druid d {0, 0} -> Squirrel s2 {2, 2}",
            ]
        );
    }

    #[test]
    fn create_fails_for_missing_directory() {
        let result = FileObserver::create("/nonexistent-skirmish-dir/log.txt");
        assert!(matches!(result, Err(StorageError::Open { .. })));
    }
}
