use std::collections::BTreeMap;

use crate::model::tick::Tick;

/// Prices received during one minute, per symbol, in arrival order.
///
/// Symbols are kept in an ordered map so that iteration, and therefore
/// tie-breaking in the scorer, is lexicographic by symbol.
#[derive(Debug, Clone, Default)]
pub struct MinuteWindow {
    series: BTreeMap<String, Vec<f64>>,
}

impl MinuteWindow {
    pub fn push(&mut self, symbol: &str, price: f64) {
        match self.series.get_mut(symbol) {
            Some(prices) => prices.push(price),
            None => {
                self.series.insert(symbol.to_string(), vec![price]);
            }
        }
    }

    pub fn prices(&self, symbol: &str) -> Option<&[f64]> {
        self.series.get(symbol).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.series
            .iter()
            .map(|(symbol, prices)| (symbol.as_str(), prices.as_slice()))
    }

    pub fn symbol_count(&self) -> usize {
        self.series.len()
    }

    pub fn tick_count(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Result of handing a tick to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Appended to its minute bucket.
    Appended,
    /// Outside the accepted range; held back until enough ticks agree on a
    /// new reference minute.
    Deferred,
    /// Enough out-of-range ticks agreed: the store was cleared and restarted
    /// from them. `replayed` counts the ticks appended, including this one.
    Rebased { replayed: usize },
}

/// Bounds applied when accepting ticks.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    /// Newest minutes kept, relative to the reference minute.
    pub retention_minutes: u64,
    /// Largest forward step accepted from a single tick.
    pub max_future_minutes: u64,
    /// Consecutive, mutually consistent out-of-range ticks needed to move the
    /// reference minute.
    pub rebase_after_ticks: usize,
}

/// Append-only minute buckets with a bounded retention horizon.
///
/// Only the newest `retention_minutes` minutes relative to the reference
/// minute are kept. A tick more than `max_future_minutes` ahead of the
/// reference, or behind the horizon, is deferred: a single outlier can
/// neither advance the reference nor be stored. When `rebase_after_ticks`
/// such ticks arrive back to back and agree with each other, the feed clock
/// is taken to have really moved and the store restarts from them.
#[derive(Debug)]
pub struct MinuteWindowStore {
    policy: RetentionPolicy,
    windows: BTreeMap<u64, MinuteWindow>,
    newest_minute: Option<u64>,
    deferred: Vec<Tick>,
}

impl MinuteWindowStore {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy: RetentionPolicy {
                retention_minutes: policy.retention_minutes.max(1),
                max_future_minutes: policy.max_future_minutes.max(1),
                rebase_after_ticks: policy.rebase_after_ticks.max(1),
            },
            windows: BTreeMap::new(),
            newest_minute: None,
            deferred: Vec::new(),
        }
    }

    /// Append the tick's price to its minute bucket, unless the tick lies
    /// outside the accepted range.
    pub fn ingest(&mut self, tick: &Tick) -> IngestOutcome {
        let minute = tick.minute_index();
        if self.in_range(minute) {
            self.deferred.clear();
            self.append(tick);
            return IngestOutcome::Appended;
        }

        let consistent = self.deferred.last().map_or(true, |prev| {
            prev.minute_index().abs_diff(minute) <= self.policy.max_future_minutes
        });
        if !consistent {
            self.deferred.clear();
        }
        self.deferred.push(tick.clone());
        if self.deferred.len() < self.policy.rebase_after_ticks {
            tracing::debug!(
                symbol = %tick.symbol,
                minute,
                newest = ?self.newest_minute,
                pending = self.deferred.len(),
                "Deferring out-of-range tick"
            );
            return IngestOutcome::Deferred;
        }

        let replay = std::mem::take(&mut self.deferred);
        tracing::warn!(
            from = ?self.newest_minute,
            to = minute,
            ticks = replay.len(),
            "Feed clock moved, restarting minute windows"
        );
        self.windows.clear();
        self.newest_minute = None;
        for t in &replay {
            self.append(t);
        }
        IngestOutcome::Rebased {
            replayed: replay.len(),
        }
    }

    pub fn window(&self, minute: u64) -> Option<&MinuteWindow> {
        self.windows.get(&minute)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn newest_minute(&self) -> Option<u64> {
        self.newest_minute
    }

    pub fn minutes(&self) -> impl Iterator<Item = u64> + '_ {
        self.windows.keys().copied()
    }

    fn in_range(&self, minute: u64) -> bool {
        let Some(newest) = self.newest_minute else {
            return true;
        };
        let oldest = newest.saturating_sub(self.policy.retention_minutes - 1);
        minute >= oldest && minute <= newest.saturating_add(self.policy.max_future_minutes)
    }

    fn append(&mut self, tick: &Tick) {
        let minute = tick.minute_index();
        self.windows
            .entry(minute)
            .or_default()
            .push(&tick.symbol, tick.price);

        if self.newest_minute.map_or(true, |newest| minute > newest) {
            self.newest_minute = Some(minute);
            self.evict();
        }
    }

    fn evict(&mut self) {
        let Some(newest) = self.newest_minute else {
            return;
        };
        let oldest = newest.saturating_sub(self.policy.retention_minutes - 1);
        let kept = self.windows.split_off(&oldest);
        let evicted = std::mem::replace(&mut self.windows, kept);
        for minute in evicted.keys() {
            tracing::trace!(minute, "Evicted minute window");
        }
    }
}
