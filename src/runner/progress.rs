//! Rate-limited progress delivery.
//!
//! The engine reports fine-grained progress while units run; a raw observer
//! would be flooded with updates. [`ProgressThrottle`] caps delivery at one
//! update per 100 ms, while milestone events (unit finished, run complete)
//! bypass the limit with `force`.

use std::time::{Duration, Instant};

/// Observer for overall pipeline progress.
///
/// Arguments: overall percent in `[0.0, 1.0]`, a status message, and
/// optional verbose operation detail. Delivery happens synchronously on the
/// execution call stack; a blocking observer stalls the pipeline.
pub type ProgressObserver<'a> = dyn FnMut(f64, &str, Option<&str>) + 'a;

/// Minimum interval between non-forced deliveries (max 10 updates/second).
pub const MIN_DELIVERY_INTERVAL: Duration = Duration::from_millis(100);

/// Wraps a progress observer with rate limiting.
///
/// Owns its last-delivery timestamp; the first update is always delivered.
pub struct ProgressThrottle<'o, 'f> {
    observer: &'o mut ProgressObserver<'f>,
    min_interval: Duration,
    last_delivery: Option<Instant>,
}

impl<'o, 'f> ProgressThrottle<'o, 'f> {
    /// Wrap an observer with the default 100 ms minimum interval.
    pub fn new(observer: &'o mut ProgressObserver<'f>) -> Self {
        Self::with_interval(observer, MIN_DELIVERY_INTERVAL)
    }

    /// Wrap an observer with a custom minimum interval.
    pub fn with_interval(observer: &'o mut ProgressObserver<'f>, min_interval: Duration) -> Self {
        Self {
            observer,
            min_interval,
            last_delivery: None,
        }
    }

    /// Deliver the update unless it arrives too soon after the previous one.
    ///
    /// Forced updates are always delivered and also reset the timestamp.
    /// Dropped updates leave no trace; the next eligible update carries the
    /// current percent.
    pub fn maybe_deliver(&mut self, percent: f64, message: &str, detail: Option<&str>, force: bool) {
        let now = Instant::now();
        let due = match self.last_delivery {
            None => true,
            Some(last) => now.duration_since(last) >= self.min_interval,
        };

        if force || due {
            (self.observer)(percent, message, detail);
            self.last_delivery = Some(now);
        }
    }
}

/// Map a unit's local progress into its slice of the overall pipeline.
///
/// `base` is the fraction of units already completed; each unit owns an
/// equal `1/total` slice. The result is clamped to 1.0.
pub fn scale_unit_progress(local_percent: f64, completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    let base = completed as f64 / total as f64;
    let slice = 1.0 / total as f64;
    (base + local_percent * slice).min(1.0)
}
