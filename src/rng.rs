//! Randomness behind a small trait so tests can substitute a deterministic source.

use rand::Rng;

/// Everything in the engine that needs randomness — token minting, loot
/// placement, random spawn points — goes through this seam instead of
/// calling `rand::thread_rng()` directly.
pub trait RandomSource: Send + Sync {
    fn next_u64(&self) -> u64;
    /// Inclusive range `[min, max]`.
    fn gen_range_inclusive(&self, min: i32, max: i32) -> i32;
}

#[derive(Default)]
pub struct ThreadRandomSource;

impl RandomSource for ThreadRandomSource {
    fn next_u64(&self) -> u64 {
        rand::thread_rng().gen()
    }

    fn gen_range_inclusive(&self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}
