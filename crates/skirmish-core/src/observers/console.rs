//! Console sink for kills.

use std::io::{self, Write};

use crate::entity::EntityRef;
use crate::report::console_lock;

use super::FightObserver;

/// Prints every kill to stdout.
///
/// Output is serialized through [`console_lock`] so kill reports never
/// interleave with a map being drawn by the reporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleObserver;

impl ConsoleObserver {
    /// Creates a console observer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FightObserver for ConsoleObserver {
    fn on_fight(&self, attacker: &EntityRef, defender: &EntityRef, won: bool) {
        if !won {
            return;
        }
        let _console = console_lock();
        let mut out = io::stdout().lock();
        // A closed stdout is not worth failing a fight over.
        let _ = writeln!(out, "\nMurder --------\n{attacker}\n{defender}");
    }
}
