use serde::{Deserialize, Serialize};

/// Monotonic host time in milliseconds.
///
/// The viewport never reads a wall clock itself; the host passes `Millis` into
/// every timed operation so transitions can be replayed deterministically.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub fn after(self, delay_ms: u64) -> Self {
        Millis(self.0.saturating_add(delay_ms))
    }

    /// Milliseconds elapsed since `earlier` (zero if `earlier` is in the future).
    pub fn since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: Millis,
    pub end: Millis,
}

impl TimeSpan {
    pub fn starting_at(start: Millis, duration_ms: u64) -> Self {
        Self {
            start,
            end: start.after(duration_ms),
        }
    }

    pub fn duration(&self) -> u64 {
        self.end.since(self.start)
    }

    /// Normalized progress in `[0, 1]`. Zero-length spans are complete immediately.
    pub fn progress(&self, now: Millis) -> f64 {
        let duration = self.duration();
        if duration == 0 {
            return 1.0;
        }
        (now.since(self.start) as f64 / duration as f64).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, now: Millis) -> bool {
        now >= self.end
    }
}
