//! Random sources for dice contests.
//!
//! Randomness is an explicit handle, never a global: each task owns its own
//! [`DiceSource`], seeded independently, and tests can substitute
//! [`ScriptedDice`] for a fixed sequence of rolls.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of faces on a contest die.
pub const DIE_FACES: u8 = 6;

/// A source of die rolls in `1..=DIE_FACES`.
pub trait DiceSource {
    /// Rolls one die.
    fn roll(&mut self) -> u8;
}

impl<D: DiceSource + ?Sized> DiceSource for &mut D {
    fn roll(&mut self) -> u8 {
        (**self).roll()
    }
}

impl<D: DiceSource + ?Sized> DiceSource for Box<D> {
    fn roll(&mut self) -> u8 {
        (**self).roll()
    }
}

/// Uniform six-sided die backed by a ChaCha8 stream.
///
/// # Example
///
/// ```
/// use skirmish_core::resolver::{Dice, DiceSource};
///
/// let mut a = Dice::seeded(7);
/// let mut b = Dice::seeded(7);
/// let rolls_a: Vec<u8> = (0..8).map(|_| a.roll()).collect();
/// let rolls_b: Vec<u8> = (0..8).map(|_| b.roll()).collect();
/// assert_eq!(rolls_a, rolls_b);
/// assert!(rolls_a.iter().all(|r| (1..=6).contains(r)));
/// ```
#[derive(Debug, Clone)]
pub struct Dice {
    rng: ChaCha8Rng,
}

impl Dice {
    /// Creates a die with a fixed seed, for reproducible streams.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a die seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl DiceSource for Dice {
    fn roll(&mut self) -> u8 {
        self.rng.gen_range(1..=DIE_FACES)
    }
}

/// Replays a fixed sequence of rolls, cycling when it runs out.
///
/// Values outside `1..=DIE_FACES` are clamped into range; an empty script
/// rolls `1` forever.
///
/// # Example
///
/// ```
/// use skirmish_core::resolver::{DiceSource, ScriptedDice};
///
/// let mut dice = ScriptedDice::attacker_always_wins();
/// assert_eq!((dice.roll(), dice.roll(), dice.roll()), (6, 1, 6));
/// assert_eq!(dice.draws(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    rolls: Vec<u8>,
    cursor: usize,
    draws: usize,
}

impl ScriptedDice {
    /// Creates a script from explicit rolls.
    #[must_use]
    pub fn new(rolls: impl Into<Vec<u8>>) -> Self {
        let mut rolls: Vec<u8> = rolls.into();
        if rolls.is_empty() {
            rolls.push(1);
        }
        for roll in &mut rolls {
            *roll = (*roll).clamp(1, DIE_FACES);
        }
        Self {
            rolls,
            cursor: 0,
            draws: 0,
        }
    }

    /// Attack roll 6, defense roll 1, forever.
    #[must_use]
    pub fn attacker_always_wins() -> Self {
        Self::new([DIE_FACES, 1])
    }

    /// Attack roll 1, defense roll 6, forever.
    #[must_use]
    pub fn defender_always_holds() -> Self {
        Self::new([1, DIE_FACES])
    }

    /// Total number of rolls drawn so far.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl DiceSource for ScriptedDice {
    fn roll(&mut self) -> u8 {
        let roll = self.rolls[self.cursor];
        self.cursor = (self.cursor + 1) % self.rolls.len();
        self.draws += 1;
        roll
    }
}

/// Derives the seed of task `index` from a master seed.
///
/// Tasks seeded this way draw independent streams, and the whole set is
/// reproducible from the one master seed.
#[must_use]
pub const fn task_seed(master: u64, index: u64) -> u64 {
    master.wrapping_add(index.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
