use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite;

use super::ingest::parse_tick_message;
use super::types::TicksSubscribeRequest;
use crate::error::AppError;
use crate::event::{AppEvent, WsConnectionStatus};
use crate::model::tick::Tick;

/// Exponential backoff for reconnection.
#[derive(Debug)]
pub struct ExponentialBackoff {
    current: Duration,
    initial: Duration,
    max: Duration,
    factor: f64,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            current: initial,
            initial,
            max,
            factor,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = Duration::from_secs_f64(
            (self.current.as_secs_f64() * self.factor).min(self.max.as_secs_f64()),
        );
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

pub struct TickFeedClient {
    url: url::Url,
    symbols: Vec<String>,
}

impl TickFeedClient {
    pub fn new(url: url::Url, symbols: Vec<String>) -> Self {
        Self { url, symbols }
    }

    /// Subscription frames sent right after each (re)connect.
    pub fn subscribe_frames(&self) -> Result<Vec<String>, AppError> {
        self.symbols
            .iter()
            .map(|symbol| {
                serde_json::to_string(&TicksSubscribeRequest::new(symbol)).map_err(AppError::from)
            })
            .collect()
    }

    /// Connect and run the WebSocket loop with automatic reconnection.
    /// Sends status events through `status_tx` and ticks through `tick_tx`.
    pub async fn connect_and_run(
        &self,
        tick_tx: mpsc::Sender<Tick>,
        status_tx: mpsc::Sender<AppEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), 2.0);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self
                .connect_once(&tick_tx, &status_tx, &mut shutdown, &mut backoff, &mut attempt)
                .await
            {
                Ok(()) => {
                    let _ = status_tx
                        .send(AppEvent::WsStatus(WsConnectionStatus::Disconnected))
                        .await;
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "Feed connection lost");
                    let _ = status_tx
                        .send(AppEvent::WsStatus(WsConnectionStatus::Disconnected))
                        .await;

                    let delay = backoff.next_delay();
                    let _ = status_tx
                        .send(AppEvent::WsStatus(WsConnectionStatus::Reconnecting {
                            attempt,
                            delay_ms: delay.as_millis() as u64,
                        }))
                        .await;

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => continue,
                        _ = shutdown.changed() => {
                            tracing::info!("Shutdown during reconnect");
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn connect_once(
        &self,
        tick_tx: &mpsc::Sender<Tick>,
        status_tx: &mpsc::Sender<AppEvent>,
        shutdown: &mut watch::Receiver<bool>,
        backoff: &mut ExponentialBackoff,
        attempt: &mut u32,
    ) -> Result<()> {
        tracing::info!(url = %self.url, "Connecting to tick feed");

        let (ws_stream, _resp) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .context("WebSocket connect failed")?;

        let (mut write, mut read) = ws_stream.split();
        for frame in self.subscribe_frames()? {
            write
                .send(tungstenite::Message::Text(frame))
                .await
                .map_err(|e| AppError::WebSocket(e.to_string()))
                .context("failed to send subscribe request")?;
        }

        backoff.reset();
        *attempt = 0;
        let _ = status_tx
            .send(AppEvent::WsStatus(WsConnectionStatus::Connected))
            .await;
        tracing::info!(symbols = ?self.symbols, "Subscribed to tick streams");

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            let Some(tick) = parse_tick_message(&text) else {
                                continue;
                            };
                            if tick_tx.try_send(tick).is_err() {
                                tracing::warn!("Tick channel full, dropping tick");
                                let _ = status_tx.try_send(AppEvent::TickDropped);
                            }
                        }
                        Some(Ok(tungstenite::Message::Ping(_))) => {
                            // tokio-tungstenite handles pong automatically
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            return Err(AppError::WebSocket(e.to_string()).into());
                        }
                        None => {
                            return Err(AppError::WebSocket("stream ended".to_string()).into());
                        }
                    }
                }
                _ = shutdown.changed() => {
                    let _ = write.close().await;
                    return Ok(());
                }
            }
        }
    }
}
