use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::error::AppError;
use crate::window::RetentionPolicy;

pub const DEFAULT_SYMBOLS: [&str; 5] = ["R_10", "R_25", "R_50", "R_75", "R_100"];
pub const DEFAULT_NORMALIZATION: [(&str, f64); 5] = [
    ("R_10", 1.0),
    ("R_25", 2.5),
    ("R_50", 5.0),
    ("R_75", 7.5),
    ("R_100", 10.0),
];
pub const DEFAULT_TRIGGER_SECOND: u64 = 45;
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.015;
pub const DEFAULT_MIN_SAMPLES: usize = 5;
pub const DEFAULT_RETENTION_MINUTES: u64 = 10;
pub const DEFAULT_MAX_FUTURE_MINUTES: u64 = 5;
pub const DEFAULT_REBASE_AFTER_TICKS: usize = 3;
pub const DEFAULT_WS_URL: &str = "wss://ws.derivws.com/websockets/v3";
pub const DEFAULT_APP_ID: u32 = 1089;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub signal: SignalConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub ws_url: String,
    pub app_id: u32,
    pub symbols: Vec<String>,
    pub channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            app_id: DEFAULT_APP_ID,
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            channel_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub trigger_second: u64,
    pub score_threshold: f64,
    pub min_samples: usize,
    pub retention_minutes: u64,
    pub max_future_minutes: u64,
    pub rebase_after_ticks: usize,
    pub normalization: HashMap<String, f64>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            trigger_second: DEFAULT_TRIGGER_SECOND,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            min_samples: DEFAULT_MIN_SAMPLES,
            retention_minutes: DEFAULT_RETENTION_MINUTES,
            max_future_minutes: DEFAULT_MAX_FUTURE_MINUTES,
            rebase_after_ticks: DEFAULT_REBASE_AFTER_TICKS,
            normalization: DEFAULT_NORMALIZATION
                .iter()
                .map(|(s, f)| (s.to_string(), *f))
                .collect(),
        }
    }
}

impl SignalConfig {
    /// Per-symbol volatility scale; symbols without an entry use 1.
    pub fn normalization_factor(&self, symbol: &str) -> f64 {
        self.normalization.get(symbol).copied().unwrap_or(1.0)
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            retention_minutes: self.retention_minutes,
            max_future_minutes: self.max_future_minutes,
            rebase_after_ticks: self.rebase_after_ticks,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl FeedConfig {
    /// Configured symbols, trimmed, upper-cased and deduplicated in order.
    pub fn subscribed_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for sym in &self.symbols {
            let s = sym.trim().to_ascii_uppercase();
            if !s.is_empty() && !out.iter().any(|v| v == &s) {
                out.push(s);
            }
        }
        out
    }

    /// Full endpoint including the `app_id` query parameter.
    pub fn endpoint(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.ws_url)
            .with_context(|| format!("invalid feed.ws_url '{}'", self.ws_url))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            bail!("feed.ws_url must use ws:// or wss://, got '{}'", self.ws_url);
        }
        url.query_pairs_mut()
            .append_pair("app_id", &self.app_id.to_string());
        Ok(url)
    }
}

fn config_path() -> PathBuf {
    std::env::var("SYNTH_SIGNAL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

impl Config {
    /// Load from `SYNTH_SIGNAL_CONFIG` or `config/default.toml`, falling back to
    /// built-in defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from_path(&config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let config_str = std::fs::read_to_string(path)
                .map_err(AppError::from)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&config_str)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let invalid = |msg: String| Err(AppError::Config(msg));
        if self.feed.subscribed_symbols().is_empty() {
            return invalid("feed.symbols must contain at least one symbol".to_string());
        }
        if self.feed.channel_capacity == 0 {
            return invalid("feed.channel_capacity must be > 0".to_string());
        }
        if let Err(e) = self.feed.endpoint() {
            return invalid(format!("{:#}", e));
        }

        let s = &self.signal;
        if s.trigger_second >= 60 {
            return invalid(format!(
                "signal.trigger_second must be < 60, got {}",
                s.trigger_second
            ));
        }
        if !s.score_threshold.is_finite() || s.score_threshold <= 0.0 {
            return invalid("signal.score_threshold must be a positive number".to_string());
        }
        if s.min_samples == 0 {
            return invalid("signal.min_samples must be > 0".to_string());
        }
        if s.retention_minutes == 0 {
            return invalid("signal.retention_minutes must be > 0".to_string());
        }
        if s.max_future_minutes == 0 {
            return invalid("signal.max_future_minutes must be > 0".to_string());
        }
        if s.rebase_after_ticks == 0 {
            return invalid("signal.rebase_after_ticks must be > 0".to_string());
        }
        for (symbol, factor) in &s.normalization {
            if !factor.is_finite() || *factor <= 0.0 {
                return invalid(format!(
                    "signal.normalization.{} must be a positive number, got {}",
                    symbol, factor
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.signal.trigger_second, 45);
        assert_eq!(config.signal.min_samples, 5);
        assert!((config.signal.normalization_factor("R_75") - 7.5).abs() < f64::EPSILON);
        assert!((config.signal.normalization_factor("UNKNOWN") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn endpoint_carries_app_id() {
        let feed = FeedConfig::default();
        let url = feed.endpoint().unwrap();
        assert_eq!(url.query(), Some("app_id=1089"));
    }

    #[test]
    fn subscribed_symbols_dedup() {
        let feed = FeedConfig {
            symbols: vec![
                "r_10".to_string(),
                "R_10".to_string(),
                "  ".to_string(),
                "R_50".to_string(),
            ],
            ..FeedConfig::default()
        };
        assert_eq!(
            feed.subscribed_symbols(),
            vec!["R_10".to_string(), "R_50".to_string()]
        );
    }
}
