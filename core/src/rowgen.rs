//! Row value derivation.
//!
//! A generator maps a row's position to the value stored in the table's
//! value column. It must be a pure function of the index so a load can be
//! reproduced without a database. Primary keys are assigned by storage, not
//! here.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RowGenerator: Send + Sync {
    fn value_for(&self, row_index: u64) -> i64;
}

impl<F> RowGenerator for F
where
    F: Fn(u64) -> i64 + Send + Sync,
{
    fn value_for(&self, row_index: u64) -> i64 {
        self(row_index)
    }
}

/// 1-based numbering: row `i` stores `i + 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl RowGenerator for Sequential {
    fn value_for(&self, row_index: u64) -> i64 {
        row_index as i64 + 1
    }
}

/// Pseudo-random values in `1..=upper`, reseeded per row so each value
/// depends on `(seed, row_index)` only.
#[derive(Debug, Clone, Copy)]
pub struct Scrambled {
    seed: u64,
    upper: i64,
}

impl Scrambled {
    pub fn new(seed: u64, upper: i64) -> Self {
        Self {
            seed,
            upper: upper.max(1),
        }
    }
}

impl Default for Scrambled {
    fn default() -> Self {
        Self::new(0xDEAD_BEEF_CAFE_1337, i32::MAX as i64)
    }
}

impl RowGenerator for Scrambled {
    fn value_for(&self, row_index: u64) -> i64 {
        let mut rng = StdRng::seed_from_u64(self.seed ^ row_index);
        rng.gen_range(1..=self.upper)
    }
}
