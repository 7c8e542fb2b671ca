use crate::config::SignalConfig;
use crate::model::signal::{Direction, Signal};
use crate::window::MinuteWindow;

/// Momentum of one symbol over one minute.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub symbol: &'a str,
    pub samples: usize,
    pub price_move: f64,
    pub norm_score: f64,
}

/// Picks the strongest normalized first-to-last move of a minute.
#[derive(Debug, Clone)]
pub struct SignalScorer {
    config: SignalConfig,
}

impl SignalScorer {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    /// Score one symbol's prices. `None` if there are fewer than `min_samples`.
    pub fn score<'a>(&self, symbol: &'a str, prices: &[f64]) -> Option<Candidate<'a>> {
        if prices.len() < self.config.min_samples {
            return None;
        }
        let first = *prices.first()?;
        let last = *prices.last()?;
        let price_move = last - first;
        let norm_score = price_move.abs() / self.config.normalization_factor(symbol);
        Some(Candidate {
            symbol,
            samples: prices.len(),
            price_move,
            norm_score,
        })
    }

    /// Best qualifying candidate of the window. Ties go to the symbol that
    /// sorts first, since windows iterate symbols lexicographically.
    pub fn best_candidate<'a>(&self, window: &'a MinuteWindow) -> Option<Candidate<'a>> {
        let mut best: Option<Candidate<'a>> = None;
        for (symbol, prices) in window.iter() {
            let Some(candidate) = self.score(symbol, prices) else {
                continue;
            };
            if best
                .as_ref()
                .map_or(true, |b| candidate.norm_score > b.norm_score)
            {
                best = Some(candidate);
            }
        }
        best
    }

    /// Evaluate a minute window. Produces no signal if the window is missing,
    /// no symbol has enough samples, or the best score is below threshold.
    pub fn evaluate(&self, minute_index: u64, window: Option<&MinuteWindow>) -> Option<Signal> {
        let window = window?;
        let Some(best) = self.best_candidate(window) else {
            tracing::debug!(minute_index, "No symbol has enough samples");
            return None;
        };
        if best.norm_score < self.config.score_threshold {
            tracing::debug!(
                minute_index,
                symbol = best.symbol,
                score = best.norm_score,
                threshold = self.config.score_threshold,
                "Best score below threshold"
            );
            return None;
        }
        Some(Signal {
            minute_index,
            symbol: best.symbol.to_string(),
            direction: Direction::from_move(best.price_move),
            score: best.norm_score,
        })
    }
}

impl Default for SignalScorer {
    fn default() -> Self {
        Self::new(SignalConfig::default())
    }
}
