use dashmap::DashMap;
use rand::Rng;
use std::time::{Duration, Instant};

/// Chambers in the revolver; one of them is loaded.
pub const CHAMBERS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// The user pulled too recently; `remaining` until the next try.
    Cooldown { remaining: Duration },
    Click,
    Bang,
}

/// Per-user cooldowns for the roulette minigame.
pub struct RouletteService {
    last_pull: DashMap<u64, Instant>,
    cooldown: Duration,
}

impl RouletteService {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_pull: DashMap::new(),
            cooldown,
        }
    }

    pub fn pull(&self, user_id: u64) -> Pull {
        self.pull_with(user_id, Instant::now(), &mut rand::thread_rng())
    }

    pub fn pull_with(&self, user_id: u64, now: Instant, rng: &mut impl Rng) -> Pull {
        // Forget users whose cooldown ran out so the map stays small
        self.last_pull
            .retain(|_, at| now.saturating_duration_since(*at) < self.cooldown);

        if let Some(at) = self.last_pull.get(&user_id) {
            let elapsed = now.saturating_duration_since(*at);
            return Pull::Cooldown {
                remaining: self.cooldown.saturating_sub(elapsed),
            };
        }

        self.last_pull.insert(user_id, now);
        if rng.gen_ratio(1, CHAMBERS) {
            Pull::Bang
        } else {
            Pull::Click
        }
    }
}
