use super::types::{FeedMessage, TickPayload};
use crate::model::tick::Tick;

/// 9999-12-31T23:59:59Z. Larger epochs cannot come from a live feed.
pub const MAX_EPOCH_SECS: f64 = 253_402_300_799.0;

/// Turn a raw feed frame into a tick. Frames without a tick payload, or with
/// an unusable one, yield `None`.
pub fn parse_tick_message(text: &str) -> Option<Tick> {
    let message = match serde_json::from_str::<FeedMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse feed message");
            return None;
        }
    };
    if let Some(err) = &message.error {
        tracing::warn!(code = %err.code, message = %err.message, "Feed returned an error");
    }
    match message.tick {
        Some(payload) => normalize(payload),
        None => {
            tracing::trace!(msg_type = ?message.msg_type, "Ignoring non-tick message");
            None
        }
    }
}

/// Floor the epoch to whole seconds and reject values that cannot be bucketed.
pub fn normalize(payload: TickPayload) -> Option<Tick> {
    if !payload.epoch.is_finite()
        || payload.epoch < 0.0
        || payload.epoch > MAX_EPOCH_SECS
        || !payload.quote.is_finite()
    {
        tracing::debug!(
            symbol = %payload.symbol,
            epoch = payload.epoch,
            quote = payload.quote,
            "Dropping tick with invalid epoch or quote"
        );
        return None;
    }
    if payload.symbol.is_empty() {
        return None;
    }
    Some(Tick {
        symbol: payload.symbol,
        epoch_secs: payload.epoch.floor() as u64,
        price: payload.quote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tick_frame() {
        let text = r#"{
            "echo_req": {"ticks": "R_10", "subscribe": 1},
            "msg_type": "tick",
            "subscription": {"id": "abc"},
            "tick": {"ask": 100.31, "bid": 100.29, "epoch": 60046, "id": "abc",
                     "pip_size": 2, "quote": 100.3, "symbol": "R_10"}
        }"#;
        let tick = parse_tick_message(text).unwrap();
        assert_eq!(tick, Tick::new("R_10", 60_046, 100.3));
    }

    #[test]
    fn floors_fractional_epoch_and_accepts_string_numbers() {
        let text = r#"{"msg_type":"tick","tick":{"symbol":"R_25","epoch":"60059.9","quote":"12.5"}}"#;
        let tick = parse_tick_message(text).unwrap();
        assert_eq!(tick.epoch_secs, 60_059);
        assert_eq!(tick.minute_index(), 1000);
        assert!((tick.price - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn ignores_other_shapes() {
        assert!(parse_tick_message(r#"{"msg_type":"ping","ping":"pong"}"#).is_none());
        assert!(parse_tick_message("not json").is_none());
        assert!(parse_tick_message(
            r#"{"msg_type":"tick","error":{"code":"InvalidSymbol","message":"bad"}}"#
        )
        .is_none());
        assert!(
            parse_tick_message(r#"{"tick":{"symbol":"R_10","epoch":-5,"quote":1.0}}"#).is_none()
        );
    }

    #[test]
    fn rejects_epochs_beyond_calendar_range() {
        assert!(
            parse_tick_message(r#"{"tick":{"symbol":"R_10","epoch":1e30,"quote":1.0}}"#).is_none()
        );
        assert!(parse_tick_message(
            r#"{"tick":{"symbol":"R_10","epoch":253402300799,"quote":1.0}}"#
        )
        .is_some());
    }
}
