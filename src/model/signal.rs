use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::tick::SECONDS_PER_MINUTE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Direction of a signed move. Zero maps to `Down`; a flat window never clears
    /// the score threshold so it is never emitted.
    pub fn from_move(mv: f64) -> Self {
        if mv > 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("UP"),
            Self::Down => f.write_str("DOWN"),
        }
    }
}

/// The strongest directional move of one evaluated minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub minute_index: u64,
    pub symbol: String,
    pub direction: Direction,
    pub score: f64,
}

impl Signal {
    pub fn key(&self) -> SignalKey {
        SignalKey {
            minute_index: self.minute_index,
            symbol: self.symbol.clone(),
            direction: self.direction,
        }
    }

    /// Wall-clock start of the evaluated minute.
    pub fn minute_start(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.minute_index.checked_mul(SECONDS_PER_MINUTE)?).ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

/// Identity of an emitted signal, used to key user feedback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalKey {
    pub minute_index: u64,
    pub symbol: String,
    pub direction: Direction,
}
