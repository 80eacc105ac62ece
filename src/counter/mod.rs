//! Per-client hit counters.
//!
//! Each hop contributes one counter keyed by its own identity to the
//! aggregated response. The store is a trait so the random placeholder the
//! demo ships can later be replaced by a durable backend without touching
//! relay logic.

use std::sync::Mutex;

use dashmap::DashMap;

/// Increment-and-read keyed by client identity. No ordering guarantee is
/// required across distinct clients.
pub trait CounterStore: Send + Sync {
    fn increment(&self, client_id: &str) -> u64;
}

/// Placeholder store: a fresh pseudo-random count per request, nothing
/// persisted. Matches the demo behavior a durable store would replace.
pub struct RandomCounterStore {
    rng: Mutex<fastrand::Rng>,
    bound: u64,
}

impl RandomCounterStore {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
            bound: 1000,
        }
    }
}

impl Default for RandomCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterStore for RandomCounterStore {
    fn increment(&self, _client_id: &str) -> u64 {
        let mut rng = self.rng.lock().expect("counter rng lock poisoned");
        rng.u64(0..self.bound)
    }
}

/// Real in-memory increments; drop-in replacement used by tests and
/// single-process runs.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counts: DashMap<String, u64>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounterStore {
    fn increment(&self, client_id: &str) -> u64 {
        let mut entry = self.counts.entry(client_id.to_owned()).or_insert(0);
        *entry += 1;
        *entry
    }
}
