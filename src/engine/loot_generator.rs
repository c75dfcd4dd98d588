//! Time-accumulator loot scheduler: how many new loot items should appear
//! this tick, given how many dogs are looting and how much loot already
//! sits on the map.

use crate::rng::RandomSource;
use std::time::Duration;

pub struct LootGenerator {
    period: Duration,
    probability: f64,
    accumulated: Duration,
}

impl LootGenerator {
    pub fn new(period: Duration, probability: f64) -> Self {
        Self {
            period,
            probability,
            accumulated: Duration::ZERO,
        }
    }

    /// Returns how many loot items to create this tick. `current_loot` and
    /// `current_looters` are the session's live loot count and dog count.
    pub fn generate(
        &mut self,
        elapsed: Duration,
        current_loot: usize,
        current_looters: usize,
        rng: &dyn RandomSource,
    ) -> u32 {
        self.accumulated += elapsed;

        let needed = current_looters.saturating_sub(current_loot);
        if needed == 0 || self.period.is_zero() {
            // Still drain the accumulator so a later tick with demand
            // doesn't see a huge backlog of elapsed periods.
            if needed == 0 {
                self.accumulated = Duration::ZERO;
            }
            return 0;
        }

        let mut generated = 0u32;
        while self.accumulated >= self.period && (generated as usize) < needed {
            self.accumulated -= self.period;
            let roll = rng.gen_range_inclusive(0, 1_000_000) as f64 / 1_000_000.0;
            if roll < self.probability {
                generated += 1;
            }
        }
        generated
    }
}
