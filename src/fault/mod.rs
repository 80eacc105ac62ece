//! Probabilistic delay and failure decisions.
//!
//! Every hop draws a synthetic work delay and an independent failure
//! decision per request. The random source is seedable so resilience tests
//! can force either outcome deterministically.

use std::sync::Mutex;

/// Fixed, non-sensitive message surfaced when a hop decides to fail.
pub const FAULT_MESSAGE: &str = "This is an expected, though random, error.";

/// Outcome of one fault-injection draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultDecision {
    /// How long the caller must suspend before branching on `should_fail`.
    pub delay_ms: u64,
    pub should_fail: bool,
}

/// Seedable source of per-request delay/failure decisions.
pub struct FaultInjector {
    rng: Mutex<fastrand::Rng>,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Deterministic injector for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }

    /// Draw a delay uniformly from `[0, delay_bound_ms)` and, independently,
    /// a failure with probability `1 / failure_denominator`.
    ///
    /// A bound of 0 always yields no delay; a denominator of 0 disables
    /// failures entirely and a denominator of 1 fails every request.
    pub fn decide(&self, delay_bound_ms: u64, failure_denominator: u64) -> FaultDecision {
        let mut rng = self.rng.lock().expect("fault rng lock poisoned");
        let delay_ms = if delay_bound_ms == 0 {
            0
        } else {
            rng.u64(0..delay_bound_ms)
        };
        let should_fail = failure_denominator != 0 && rng.u64(0..failure_denominator) == 0;
        FaultDecision {
            delay_ms,
            should_fail,
        }
    }

    /// Informational delay drawn for the `delay` query parameter forwarded to
    /// the next hop. Observability metadata only; it never gates the
    /// receiving hop's own fault injection.
    pub fn delay_hint(&self, bound_ms: u64) -> u64 {
        if bound_ms == 0 {
            return 0;
        }
        let mut rng = self.rng.lock().expect("fault rng lock poisoned");
        rng.u64(0..bound_ms)
    }
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denominator_one_always_fails() {
        let injector = FaultInjector::new();
        for _ in 0..100 {
            assert!(injector.decide(50, 1).should_fail);
        }
    }

    #[test]
    fn test_denominator_zero_never_fails() {
        let injector = FaultInjector::new();
        for _ in 0..100 {
            assert!(!injector.decide(50, 0).should_fail);
        }
    }

    #[test]
    fn test_zero_bound_means_zero_delay() {
        let injector = FaultInjector::new();
        for _ in 0..100 {
            assert_eq!(injector.decide(0, 20).delay_ms, 0);
        }
        assert_eq!(injector.delay_hint(0), 0);
    }

    #[test]
    fn test_delay_stays_within_bound() {
        let injector = FaultInjector::new();
        for _ in 0..1000 {
            assert!(injector.decide(10, 0).delay_ms < 10);
            assert!(injector.delay_hint(10) < 10);
        }
    }

    #[test]
    fn test_seeded_injectors_agree() {
        let a = FaultInjector::with_seed(42);
        let b = FaultInjector::with_seed(42);
        for _ in 0..100 {
            assert_eq!(a.decide(2000, 20), b.decide(2000, 20));
            assert_eq!(a.delay_hint(3000), b.delay_hint(3000));
        }
    }
}
