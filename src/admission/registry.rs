//! Fixed-window request counters, one per client identity.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Counter state for one client identity within the current window.
#[derive(Debug, Clone, Copy)]
pub struct ClientWindowRecord {
    /// Requests admitted in the current window.
    pub count: u32,
    /// When the current window expires.
    pub window_reset_at: Instant,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Request admitted; `remaining` is the allowance left in this window.
    Admitted { remaining: u32 },
    /// Request rejected; the window must expire before further admissions.
    Rejected,
}

/// Process-wide registry of per-identity window records.
///
/// Each identity has at most one record. The check-then-act sequence for
/// an identity runs under the map's shard write lock, which makes the
/// lookup-compare-mutate an atomic unit. Two concurrent requests for the
/// same identity can therefore never both observe `count < ceiling` and
/// increment past it.
pub struct WindowRegistry {
    records: DashMap<String, ClientWindowRecord>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Run the admission check for `identity`.
    ///
    /// Creates or replaces the record with `count = 1` when the identity
    /// is unseen or its window has expired, increments while below the
    /// ceiling, and rejects otherwise. Rejections leave the count
    /// untouched.
    pub fn check(&self, identity: &str, ceiling: u32, window: Duration) -> Decision {
        let now = Instant::now();

        match self.records.entry(identity.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(ClientWindowRecord {
                    count: 1,
                    window_reset_at: now + window,
                });
                Decision::Admitted {
                    remaining: ceiling.saturating_sub(1),
                }
            }
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                if now >= record.window_reset_at {
                    // Window rolled over; previous state is discarded.
                    record.count = 1;
                    record.window_reset_at = now + window;
                    Decision::Admitted {
                        remaining: ceiling.saturating_sub(1),
                    }
                } else if record.count < ceiling {
                    record.count += 1;
                    Decision::Admitted {
                        remaining: ceiling - record.count,
                    }
                } else {
                    Decision::Rejected
                }
            }
        }
    }

    /// Remove every record whose window has expired.
    ///
    /// Returns the number of records removed. Identities are unbounded,
    /// so this is what keeps registry memory proportional to the set of
    /// clients active within the last window.
    pub fn sweep(&self) -> usize {
        let before = self.records.len();
        let now = Instant::now();
        self.records.retain(|_, record| now < record.window_reset_at);
        before.saturating_sub(self.records.len())
    }

    /// Number of identities currently tracked.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(50);

    #[test]
    fn admits_up_to_ceiling_then_rejects() {
        let registry = WindowRegistry::new();

        assert_eq!(
            registry.check("a", 3, WINDOW),
            Decision::Admitted { remaining: 2 }
        );
        assert_eq!(
            registry.check("a", 3, WINDOW),
            Decision::Admitted { remaining: 1 }
        );
        assert_eq!(
            registry.check("a", 3, WINDOW),
            Decision::Admitted { remaining: 0 }
        );
        assert_eq!(registry.check("a", 3, WINDOW), Decision::Rejected);
        assert_eq!(registry.check("a", 3, WINDOW), Decision::Rejected);
    }

    #[test]
    fn identities_are_counted_separately() {
        let registry = WindowRegistry::new();

        assert_eq!(
            registry.check("a", 1, WINDOW),
            Decision::Admitted { remaining: 0 }
        );
        assert_eq!(registry.check("a", 1, WINDOW), Decision::Rejected);
        assert_eq!(
            registry.check("b", 1, WINDOW),
            Decision::Admitted { remaining: 0 }
        );
    }

    #[test]
    fn window_expiry_resets_counter_to_one() {
        let registry = WindowRegistry::new();

        assert_eq!(
            registry.check("a", 2, WINDOW),
            Decision::Admitted { remaining: 1 }
        );
        assert_eq!(
            registry.check("a", 2, WINDOW),
            Decision::Admitted { remaining: 0 }
        );
        assert_eq!(registry.check("a", 2, WINDOW), Decision::Rejected);

        std::thread::sleep(WINDOW + Duration::from_millis(20));

        // Fresh window: admitted with the counter back at 1.
        assert_eq!(
            registry.check("a", 2, WINDOW),
            Decision::Admitted { remaining: 1 }
        );
    }

    #[test]
    fn rejections_do_not_consume_quota() {
        let registry = WindowRegistry::new();

        assert_eq!(
            registry.check("a", 1, WINDOW),
            Decision::Admitted { remaining: 0 }
        );
        for _ in 0..10 {
            assert_eq!(registry.check("a", 1, WINDOW), Decision::Rejected);
        }

        std::thread::sleep(WINDOW + Duration::from_millis(20));

        assert_eq!(
            registry.check("a", 1, WINDOW),
            Decision::Admitted { remaining: 0 }
        );
    }

    #[test]
    fn sweep_removes_only_expired_records() {
        let registry = WindowRegistry::new();

        registry.check("stale", 10, WINDOW);
        std::thread::sleep(WINDOW + Duration::from_millis(20));
        registry.check("fresh", 10, Duration::from_secs(60));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.sweep(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_checks_never_admit_past_ceiling() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let registry = Arc::new(WindowRegistry::new());
        let admitted = Arc::new(AtomicU32::new(0));
        let ceiling = 50;
        let window = Duration::from_secs(60);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let admitted = admitted.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        if let Decision::Admitted { .. } = registry.check("a", ceiling, window) {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), ceiling);
    }
}
