use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::event::AppEvent;
use crate::model::signal::{Signal, SignalKey};

/// Receives every signal the engine emits.
pub trait SignalSink {
    fn present(&mut self, signal: &Signal);
}

impl SignalSink for Vec<Signal> {
    fn present(&mut self, signal: &Signal) {
        self.push(signal.clone());
    }
}

impl SignalSink for mpsc::Sender<AppEvent> {
    fn present(&mut self, signal: &Signal) {
        if self.try_send(AppEvent::SignalEmitted(signal.clone())).is_err() {
            tracing::warn!(minute = signal.minute_index, "Event channel full, dropping signal");
        }
    }
}

/// Keeps the most recent signal and writes it to the log.
#[derive(Debug, Default)]
pub struct LogPresenter {
    latest: Option<Signal>,
}

impl LogPresenter {
    pub fn latest(&self) -> Option<&Signal> {
        self.latest.as_ref()
    }
}

impl SignalSink for LogPresenter {
    fn present(&mut self, signal: &Signal) {
        let minute_start = signal
            .minute_start()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        tracing::info!(
            minute = %minute_start,
            symbol = %signal.symbol,
            direction = %signal.direction,
            score = signal.score,
            "Strongest signal"
        );
        self.latest = Some(signal.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub sentiment: Sentiment,
    pub note: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackSummary {
    pub positive: usize,
    pub negative: usize,
}

impl FeedbackSummary {
    pub fn total(&self) -> usize {
        self.positive + self.negative
    }
}

/// User feedback per signal. Recording twice for the same signal replaces
/// the earlier entry.
#[derive(Debug, Default)]
pub struct FeedbackLog {
    entries: HashMap<SignalKey, Feedback>,
}

impl FeedbackLog {
    pub fn record(&mut self, key: SignalKey, sentiment: Sentiment, note: impl Into<String>) {
        let note = note.into();
        tracing::info!(
            minute = key.minute_index,
            symbol = %key.symbol,
            direction = %key.direction,
            ?sentiment,
            "Feedback recorded"
        );
        self.entries.insert(
            key,
            Feedback {
                sentiment,
                note: note.trim().to_string(),
                recorded_at: Utc::now(),
            },
        );
    }

    pub fn get(&self, key: &SignalKey) -> Option<&Feedback> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> FeedbackSummary {
        let mut summary = FeedbackSummary::default();
        for feedback in self.entries.values() {
            match feedback.sentiment {
                Sentiment::Positive => summary.positive += 1,
                Sentiment::Negative => summary.negative += 1,
            }
        }
        summary
    }
}
