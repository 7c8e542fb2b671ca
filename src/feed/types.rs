use serde::{Deserialize, Serialize};

/// Accept a JSON number or a numeric string as f64.
pub fn string_or_number_to_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::String(s) => s.parse::<f64>().map_err(serde::de::Error::custom),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("invalid number")),
        _ => Err(serde::de::Error::custom("invalid numeric value")),
    }
}

/// Tick stream subscription request, one per symbol.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TicksSubscribeRequest {
    pub ticks: String,
    pub subscribe: u8,
}

impl TicksSubscribeRequest {
    pub fn new(symbol: &str) -> Self {
        Self {
            ticks: symbol.to_string(),
            subscribe: 1,
        }
    }
}

/// Any frame received from the feed. Only `tick` frames carry a payload we use.
#[derive(Debug, Deserialize)]
pub struct FeedMessage {
    #[serde(default)]
    pub msg_type: Option<String>,
    #[serde(default)]
    pub tick: Option<TickPayload>,
    #[serde(default)]
    pub error: Option<FeedError>,
}

#[derive(Debug, Deserialize)]
pub struct TickPayload {
    pub symbol: String,
    #[serde(deserialize_with = "string_or_number_to_f64")]
    pub epoch: f64,
    #[serde(deserialize_with = "string_or_number_to_f64")]
    pub quote: f64,
}

#[derive(Debug, Deserialize)]
pub struct FeedError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
