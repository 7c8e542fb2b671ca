use crate::model::tick::Tick;

/// One-shot, per-minute evaluation latch.
///
/// The last evaluated minute only moves forward, so a minute is handed out
/// for evaluation at most once, and a reordered tick for an older minute
/// never fires.
#[derive(Debug, Clone)]
pub struct EvaluationGuard {
    trigger_second: u64,
    last_evaluated: Option<u64>,
}

impl EvaluationGuard {
    pub fn new(trigger_second: u64) -> Self {
        Self {
            trigger_second,
            last_evaluated: None,
        }
    }

    /// Check a tick that has just been ingested. Returns the minute index to
    /// evaluate if this tick fires the trigger, and latches the guard.
    pub fn check(&mut self, tick: &Tick) -> Option<u64> {
        if tick.second_of_minute() < self.trigger_second {
            return None;
        }
        let minute = tick.minute_index();
        if self.last_evaluated.is_some_and(|last| minute <= last) {
            return None;
        }
        self.last_evaluated = Some(minute);
        Some(minute)
    }

    /// Forget the last evaluated minute. Used when the minute windows restart
    /// from a new reference minute.
    pub fn reset(&mut self) {
        self.last_evaluated = None;
    }

    pub fn last_evaluated(&self) -> Option<u64> {
        self.last_evaluated
    }
}
