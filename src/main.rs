use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};

use synth_signal::config::Config;
use synth_signal::engine::SignalEngine;
use synth_signal::event::{AppEvent, WsConnectionStatus};
use synth_signal::feed::TickFeedClient;
use synth_signal::model::signal::Signal;
use synth_signal::model::tick::Tick;
use synth_signal::presenter::{LogPresenter, SignalSink};

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        config
            .logging
            .level
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Forwards engine output to the presenter and the event channel.
struct Fanout {
    presenter: LogPresenter,
    app_tx: mpsc::Sender<AppEvent>,
}

impl SignalSink for Fanout {
    fn present(&mut self, signal: &Signal) {
        self.presenter.present(signal);
        self.app_tx.present(signal);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (required by rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let endpoint = config.feed.endpoint().context("feed endpoint")?;
    let symbols = config.feed.subscribed_symbols();
    tracing::info!(
        url = %endpoint,
        symbols = ?symbols,
        trigger_second = config.signal.trigger_second,
        threshold = config.signal.score_threshold,
        "Starting synth-signal"
    );

    let (app_tx, mut app_rx) = mpsc::channel::<AppEvent>(256);
    let (tick_tx, tick_rx) = mpsc::channel::<Tick>(config.feed.channel_capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let feed = TickFeedClient::new(endpoint, symbols);
    let feed_status_tx = app_tx.clone();
    let feed_shutdown = shutdown_rx.clone();
    let feed_task = tokio::spawn(async move {
        if let Err(e) = feed
            .connect_and_run(tick_tx, feed_status_tx, feed_shutdown)
            .await
        {
            tracing::error!(error = %e, "Tick feed stopped");
        }
    });

    let engine_shutdown = shutdown_rx.clone();
    let mut engine = SignalEngine::new(config.signal.clone());
    let mut sink = Fanout {
        presenter: LogPresenter::default(),
        app_tx: app_tx.clone(),
    };
    let engine_task = tokio::spawn(async move {
        engine.run(tick_rx, &mut sink, engine_shutdown).await;
        engine.stats()
    });
    drop(app_tx);

    let ctrl_c_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, shutting down");
            let _ = ctrl_c_shutdown.send(true);
        }
    });

    let mut dropped_ticks: u64 = 0;
    let mut status_shutdown = shutdown_rx.clone();
    loop {
        tokio::select! {
            event = app_rx.recv() => {
                let Some(event) = event else { break };
                match event {
                    AppEvent::WsStatus(WsConnectionStatus::Connected) => {
                        tracing::info!("Feed connected");
                    }
                    AppEvent::WsStatus(WsConnectionStatus::Disconnected) => {
                        tracing::warn!("Feed disconnected");
                    }
                    AppEvent::WsStatus(WsConnectionStatus::Reconnecting { attempt, delay_ms }) => {
                        tracing::warn!(attempt, delay_ms, "Feed reconnecting");
                    }
                    AppEvent::SignalEmitted(signal) => {
                        tracing::debug!(key = ?signal.key(), "Signal delivered");
                    }
                    AppEvent::TickDropped => {
                        dropped_ticks += 1;
                    }
                }
            }
            _ = status_shutdown.changed() => break,
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = feed_task.await;
    match engine_task.await {
        Ok(stats) => tracing::info!(
            ticks = stats.ticks_ingested,
            deferred = stats.ticks_deferred,
            rebases = stats.rebases,
            evaluations = stats.evaluations,
            signals = stats.signals_emitted,
            dropped = dropped_ticks,
            "Shutdown complete"
        ),
        Err(e) => tracing::warn!(error = %e, "Engine task failed"),
    }
    Ok(())
}
