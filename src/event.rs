use crate::model::signal::Signal;

#[derive(Debug, Clone, PartialEq)]
pub enum WsConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting { attempt: u32, delay_ms: u64 },
}

/// Status traffic from the feed task and results from the processing loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    WsStatus(WsConnectionStatus),
    SignalEmitted(Signal),
    TickDropped,
}
