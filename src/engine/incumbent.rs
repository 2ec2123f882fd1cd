//! Best valuation shared between search workers.
//!
//! The objective of the incumbent is mirrored in an atomic so workers can
//! tighten their bound without locking; the valuation itself sits behind a
//! mutex and is the source of truth.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Incumbent valuation and its objective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incumbent {
    /// Objective value.
    pub objective: i64,
    /// One value per variable.
    pub values: Vec<bool>,
}

/// Concurrent holder of the best valuation found so far (minimization).
///
/// `upper_bound` is `i64::MAX` until the first install.
#[derive(Debug)]
pub struct SharedIncumbent {
    upper_bound: AtomicI64,
    best: Mutex<Option<Incumbent>>,
}

impl Default for SharedIncumbent {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedIncumbent {
    /// Creates an empty incumbent.
    pub fn new() -> Self {
        Self {
            upper_bound: AtomicI64::new(i64::MAX),
            best: Mutex::new(None),
        }
    }

    /// Objective of the incumbent, or `i64::MAX` if none.
    #[inline]
    pub fn upper_bound(&self) -> i64 {
        self.upper_bound.load(Ordering::Relaxed)
    }

    /// Installs `values` if `objective` is strictly better than the incumbent.
    pub fn try_install(&self, objective: i64, values: &[bool]) -> bool {
        if objective >= self.upper_bound() {
            return false;
        }
        let mut guard = self.best.lock().unwrap_or_else(PoisonError::into_inner);
        // Re-check under the lock; the atomic is only a hint.
        if let Some(current) = guard.as_ref() {
            if objective >= current.objective {
                return false;
            }
        }
        *guard = Some(Incumbent {
            objective,
            values: values.to_vec(),
        });
        self.upper_bound.store(objective, Ordering::Relaxed);
        true
    }

    /// Clone of the incumbent, if any.
    pub fn snapshot(&self) -> Option<Incumbent> {
        self.best
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Moves the incumbent out.
    pub fn into_inner(self) -> Option<Incumbent> {
        self.best
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_initial_state() {
        let inc = SharedIncumbent::new();
        assert_eq!(inc.upper_bound(), i64::MAX);
        assert!(inc.snapshot().is_none());
    }

    #[test]
    fn test_only_strict_improvements_install() {
        let inc = SharedIncumbent::new();
        assert!(inc.try_install(10, &[true]));
        assert!(!inc.try_install(10, &[false]));
        assert!(!inc.try_install(11, &[false]));
        assert!(inc.try_install(9, &[false]));
        let best = inc.snapshot().unwrap();
        assert_eq!(best.objective, 9);
        assert_eq!(best.values, vec![false]);
    }

    #[test]
    fn test_concurrent_installs_keep_minimum() {
        let inc = Arc::new(SharedIncumbent::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let inc = Arc::clone(&inc);
                thread::spawn(move || {
                    for k in 0..100 {
                        inc.try_install(1000 - (t * 100 + k), &[true]);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(inc.upper_bound(), 1000 - 799);
        assert_eq!(inc.snapshot().unwrap().objective, 201);
    }
}
