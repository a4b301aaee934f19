use foundation::time::Millis;
use tracing::trace;

/// Delays for one step of a [`DelayedCounter`].
///
/// Step `k` sits between stage `k` and stage `k + 1`: `enter_ms` is waited before
/// advancing `k → k + 1`, `exit_ms` before retreating `k + 1 → k`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StepDuration {
    pub enter_ms: u64,
    pub exit_ms: u64,
}

impl StepDuration {
    pub const fn new(enter_ms: u64, exit_ms: u64) -> Self {
        Self { enter_ms, exit_ms }
    }
}

/// A stage change applied by [`DelayedCounter::poll`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StageStep {
    pub from: usize,
    pub to: usize,
    /// Time the step was due; later steps are scheduled relative to it.
    pub at: Millis,
}

impl StageStep {
    pub fn is_forward(&self) -> bool {
        self.to > self.from
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct PendingStep {
    to: usize,
    due: Millis,
}

/// Counts one stage at a time toward a target, waiting a fixed delay per step.
///
/// At most one step is pending. Changing the target cancels the pending step
/// and schedules the first step toward the new target from the current value,
/// so sequences are serialized rather than interleaved.
///
/// Ordering contract:
/// - `poll` applies at most one step per call, in due-time order.
/// - Chained steps are scheduled from the previous step's due time, so a host
///   that polls late still observes the same stage timeline.
#[derive(Debug, Clone)]
pub struct DelayedCounter {
    durations: Vec<StepDuration>,
    value: usize,
    prev: usize,
    target: usize,
    pending: Option<PendingStep>,
}

impl DelayedCounter {
    pub fn new(durations: Vec<StepDuration>) -> Self {
        Self {
            durations,
            value: 0,
            prev: 0,
            target: 0,
            pending: None,
        }
    }

    /// Highest reachable stage.
    pub fn max(&self) -> usize {
        self.durations.len()
    }

    pub fn value(&self) -> usize {
        self.value
    }

    pub fn prev(&self) -> usize {
        self.prev
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.pending.is_none()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.pending.map(|p| p.due)
    }

    /// Stage the pending step will move to, if any.
    pub fn pending_to(&self) -> Option<usize> {
        self.pending.map(|p| p.to)
    }

    /// Re-targets the counter. Returns `false` if the target did not change, in
    /// which case any pending step is left untouched.
    pub fn set_target(&mut self, target: usize, now: Millis) -> bool {
        let target = target.min(self.max());
        if target == self.target {
            return false;
        }
        self.target = target;
        if let Some(p) = self.pending.take() {
            trace!(to = p.to, due = p.due.0, "pending step cancelled");
        }
        self.schedule_next(now);
        true
    }

    /// Pushes the pending step back so it fires no earlier than `at`.
    pub fn defer_until(&mut self, at: Millis) {
        if let Some(p) = &mut self.pending {
            p.due = p.due.max(at);
        }
    }

    /// Applies the pending step if it is due.
    pub fn poll(&mut self, now: Millis) -> Option<StageStep> {
        let pending = self.pending?;
        if now < pending.due {
            return None;
        }
        let step = StageStep {
            from: self.value,
            to: pending.to,
            at: pending.due,
        };
        self.prev = self.value;
        self.value = pending.to;
        self.pending = None;
        self.schedule_next(pending.due);
        Some(step)
    }

    /// Drops any pending step without changing the current value.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.target = self.value;
    }

    fn schedule_next(&mut self, from: Millis) {
        if self.value == self.target {
            return;
        }
        let (to, delay) = if self.target > self.value {
            (self.value + 1, self.durations[self.value].enter_ms)
        } else {
            (self.value - 1, self.durations[self.value - 1].exit_ms)
        };
        self.pending = Some(PendingStep {
            to,
            due: from.after(delay),
        });
    }
}
