//! Text reporting: entity listings, the ASCII map and reporter sinks.
//!
//! Everything in this module is read-only with respect to the arena. Console
//! output from several threads (the reporter drawing maps, observers printing
//! kills) is serialized through one process-wide lock, [`console_lock`].
//!
//! # Map layout
//!
//! The map is split into `grid_size x grid_size` cells. A living entity at
//! `(x, y)` lands in column `x / (width / grid_size)` and row
//! `y / (height / grid_size)`, clamped into the grid. Each cell prints as
//! `[O]`, `[S]`, `[D]` or `[ ]`; when several entities share a cell, the last
//! one in roster order wins. A rule of `=` closes every frame.
//!
//! ```
//! use skirmish_core::arena::Arena;
//! use skirmish_core::entity::{Entity, EntityKind};
//! use skirmish_core::report::MapRenderer;
//! use skirmish_core::world_view::WorldView;
//!
//! let mut arena = Arena::new();
//! arena.insert(Entity::new(EntityKind::Ork, "grub", 0, 0).into_ref());
//! arena.insert(Entity::new(EntityKind::Druid, "elm", 99, 99).into_ref());
//!
//! let map = MapRenderer::new(100, 100, 2).render(&WorldView::capture(&arena, 0));
//! assert_eq!(map, "[O][ ]\n[ ][D]\n======\n");
//! ```

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::arena::Arena;
use crate::config::MapConfig;
use crate::world_view::WorldView;

static CONSOLE: Mutex<()> = Mutex::new(());

/// Takes the process-wide console lock.
///
/// Hold the guard for the whole of a multi-line write so that frames and
/// kill reports never interleave.
pub fn console_lock() -> MutexGuard<'static, ()> {
    CONSOLE.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Listings
// =============================================================================

/// Writes one line per entity, dead ones included, or `No entities`.
///
/// # Errors
///
/// Propagates write failures from `out`.
pub fn print_all<W: Write>(arena: &Arena, out: &mut W) -> io::Result<()> {
    if arena.is_empty() {
        return writeln!(out, "No entities");
    }
    for entity in arena {
        writeln!(out, "{entity}")?;
    }
    Ok(())
}

/// Writes a `Survivors:` header and one line per living entity.
///
/// # Errors
///
/// Propagates write failures from `out`.
pub fn print_survivors<W: Write>(arena: &Arena, out: &mut W) -> io::Result<()> {
    writeln!(out, "Survivors:")?;
    for entity in arena.living() {
        writeln!(out, "{entity}")?;
    }
    Ok(())
}

// =============================================================================
// MapRenderer
// =============================================================================

/// Draws a [`WorldView`] as an ASCII grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRenderer {
    width: i32,
    height: i32,
    grid_size: usize,
}

impl MapRenderer {
    /// Creates a renderer for a `width x height` map drawn on a square grid.
    #[must_use]
    pub fn new(width: i32, height: i32, grid_size: usize) -> Self {
        Self {
            width,
            height,
            grid_size,
        }
    }

    /// Creates a renderer matching a map configuration.
    #[must_use]
    pub fn from_config(map: &MapConfig) -> Self {
        Self::new(map.width, map.height, map.grid_size)
    }

    /// Grid cells per axis.
    #[must_use]
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Renders one frame, rule included, as a string.
    #[must_use]
    pub fn render(&self, view: &WorldView) -> String {
        let grid = self.grid_size;
        let mut cells = vec![None; grid * grid];

        if grid > 0 {
            let cells_per_axis = i64::try_from(grid).unwrap_or(i64::MAX);
            let cell_w = (i64::from(self.width) / cells_per_axis).max(1);
            let cell_h = (i64::from(self.height) / cells_per_axis).max(1);
            let cell_of = |coord: i32, span: i64| {
                let cell = (i64::from(coord) / span).clamp(0, cells_per_axis - 1);
                usize::try_from(cell).unwrap_or(0)
            };

            for snapshot in view.living() {
                let col = cell_of(snapshot.position.x, cell_w);
                let row = cell_of(snapshot.position.y, cell_h);
                cells[row * grid + col] = Some(snapshot.kind.marker());
            }
        }

        let mut frame = String::with_capacity((grid * 3 + 1) * (grid + 1));
        for row in cells.chunks(grid.max(1)).take(grid) {
            for cell in row {
                match cell {
                    Some(marker) => {
                        let _ = write!(frame, "[{marker}]");
                    }
                    None => frame.push_str("[ ]"),
                }
            }
            frame.push('\n');
        }
        frame.push_str(&"=".repeat(grid * 3));
        frame.push('\n');
        frame
    }
}

// =============================================================================
// Reporters
// =============================================================================

/// Sink for the reporter task's periodic snapshots.
///
/// Any `FnMut(&WorldView)` closure is a reporter, which keeps tests simple.
pub trait Reporter: Send {
    /// Receives one snapshot. Must not block for long; the scheduler's
    /// reporting cadence depends on it.
    fn report(&mut self, view: &WorldView);
}

impl<F> Reporter for F
where
    F: FnMut(&WorldView) + Send,
{
    fn report(&mut self, view: &WorldView) {
        self(view);
    }
}

/// Prints every snapshot to stdout as an ASCII map.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    renderer: MapRenderer,
}

impl ConsoleReporter {
    /// Creates a console reporter drawing with `renderer`.
    #[must_use]
    pub fn new(renderer: MapRenderer) -> Self {
        Self { renderer }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, view: &WorldView) {
        let frame = self.renderer.render(view);
        let _console = console_lock();
        let mut out = io::stdout().lock();
        let _ = out.write_all(frame.as_bytes());
        let _ = out.flush();
    }
}

// =============================================================================
// Tests
// =============================================================================
