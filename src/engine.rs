use tokio::sync::{mpsc, watch};

use crate::config::SignalConfig;
use crate::model::signal::Signal;
use crate::model::tick::Tick;
use crate::presenter::SignalSink;
use crate::scorer::SignalScorer;
use crate::window::{EvaluationGuard, IngestOutcome, MinuteWindowStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub ticks_ingested: u64,
    pub ticks_deferred: u64,
    pub rebases: u64,
    pub evaluations: u64,
    pub signals_emitted: u64,
}

/// Owns the minute windows, the evaluation guard and the scorer.
///
/// All state is mutated from `on_tick` only, so one engine must be driven by
/// a single consumer. Independent engines share nothing.
#[derive(Debug)]
pub struct SignalEngine {
    store: MinuteWindowStore,
    guard: EvaluationGuard,
    scorer: SignalScorer,
    stats: EngineStats,
}

impl SignalEngine {
    pub fn new(config: SignalConfig) -> Self {
        Self {
            store: MinuteWindowStore::new(config.retention_policy()),
            guard: EvaluationGuard::new(config.trigger_second),
            scorer: SignalScorer::new(config),
            stats: EngineStats::default(),
        }
    }

    /// Ingest one tick, then evaluate its minute if the tick fires the trigger.
    pub fn on_tick(&mut self, tick: &Tick) -> Option<Signal> {
        match self.store.ingest(tick) {
            IngestOutcome::Appended => self.stats.ticks_ingested += 1,
            IngestOutcome::Deferred => {
                self.stats.ticks_deferred += 1;
                return None;
            }
            IngestOutcome::Rebased { replayed } => {
                self.stats.ticks_ingested += replayed as u64;
                self.stats.rebases += 1;
                self.guard.reset();
            }
        }

        let minute = self.guard.check(tick)?;
        self.stats.evaluations += 1;
        let window = self.store.window(minute);
        tracing::debug!(
            minute,
            symbols = window.map_or(0, |w| w.symbol_count()),
            ticks = window.map_or(0, |w| w.tick_count()),
            trigger_symbol = %tick.symbol,
            second = tick.second_of_minute(),
            "Evaluating minute"
        );

        let signal = self.scorer.evaluate(minute, window)?;
        self.stats.signals_emitted += 1;
        tracing::info!(
            minute = signal.minute_index,
            symbol = %signal.symbol,
            direction = %signal.direction,
            score = signal.score,
            "Signal emitted"
        );
        Some(signal)
    }

    /// Consume ticks until the channel closes or shutdown is requested,
    /// handing every emitted signal to `sink`.
    pub async fn run<S: SignalSink>(
        &mut self,
        mut tick_rx: mpsc::Receiver<Tick>,
        sink: &mut S,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                tick = tick_rx.recv() => {
                    let Some(tick) = tick else {
                        tracing::info!("Tick channel closed");
                        break;
                    };
                    if let Some(signal) = self.on_tick(&tick) {
                        sink.present(&signal);
                    }
                }
                _ = shutdown.changed() => {
                    break;
                }
            }
        }
        tracing::info!(
            ticks = self.stats.ticks_ingested,
            evaluations = self.stats.evaluations,
            signals = self.stats.signals_emitted,
            "Signal engine stopped"
        );
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn store(&self) -> &MinuteWindowStore {
        &self.store
    }

    pub fn last_evaluated_minute(&self) -> Option<u64> {
        self.guard.last_evaluated()
    }
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::new(SignalConfig::default())
    }
}
