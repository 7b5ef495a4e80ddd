use crate::config::{AppConfig, NotifyMode};
use crate::ingest::{self, IngestPool, IngestStats, ReplayStats};
use crate::listener::ProductListener;
use anyhow::{Context, Result};
use burstwatch_alert::{AlertSink, BurstDetector};
use burstwatch_notify::channels::console::ConsoleChannel;
use burstwatch_notify::dispatcher::AlertDispatcher;
use burstwatch_notify::sink::LogSink;
use burstwatch_notify::NotificationChannel;
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

/// How the input side of a run ended.
#[derive(Debug)]
pub enum InputOutcome {
    /// The reader hit EOF.
    Exhausted(ReplayStats),
    /// The shutdown future fired first.
    Interrupted,
    /// Reading failed; everything submitted before the failure was still
    /// drained and dispatched.
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct RunSummary {
    pub input: InputOutcome,
    pub ingest: IngestStats,
    pub tracked_keys: usize,
    /// Alerts the dispatcher delivered; `None` in inline mode.
    pub dispatched: Option<u64>,
}

/// Wires detector, listener, workers and notification for one run.
pub struct App {
    config: AppConfig,
    channels: Option<Vec<Box<dyn NotificationChannel>>>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            channels: None,
        }
    }

    /// Channels for queued mode, in place of the console channel.
    pub fn with_channels(mut self, channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Replays `lines` until they end or `shutdown` resolves, then drains
    /// the workers and the alert queue in that order.
    ///
    /// Input failures do not skip the drain; they are reported through
    /// [`RunSummary::input`]. The error path is only for setup and for a
    /// dispatcher task that panicked.
    pub async fn run<F>(
        self,
        lines: mpsc::Receiver<io::Result<Vec<u8>>>,
        shutdown: F,
    ) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let config = self.config;
        let ids = config.alert_ids.build()?;

        let (sink, dispatcher) = match config.notify.mode {
            NotifyMode::Inline => (Arc::new(LogSink) as Arc<dyn AlertSink>, None),
            NotifyMode::Queued => {
                let channels = self.channels.unwrap_or_else(|| {
                    let console = if config.logging.json {
                        ConsoleChannel::json()
                    } else {
                        ConsoleChannel::text()
                    };
                    vec![Box::new(console) as Box<dyn NotificationChannel>]
                });
                let (sink, dispatcher) = AlertDispatcher::new(channels);
                tracing::info!(channels = ?dispatcher.channel_names(), "Alert dispatcher started");
                (
                    Arc::new(sink) as Arc<dyn AlertSink>,
                    Some(tokio::spawn(dispatcher.run())),
                )
            }
        };

        let detector = Arc::new(BurstDetector::new(sink).with_ids(ids));
        let listener = Arc::new(ProductListener::new(detector.clone(), config.detector));
        let pool = IngestPool::spawn(listener, &config.ingest);

        let input = tokio::select! {
            result = ingest::replay_lines(lines, &pool) => match result {
                Ok(replay) => {
                    tracing::info!(
                        submitted = replay.submitted,
                        malformed = replay.malformed,
                        "Input exhausted"
                    );
                    InputOutcome::Exhausted(replay)
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        cause = %e.root_cause(),
                        "Input failed; draining queued events"
                    );
                    InputOutcome::Failed(e)
                }
            },
            _ = shutdown => {
                tracing::info!("Shutdown requested; draining queued events");
                InputOutcome::Interrupted
            }
        };

        let ingest = pool.shutdown().await;
        let tracked_keys = detector.tracked_keys();
        tracing::info!(
            processed = ingest.processed,
            alerts = ingest.alerts,
            skipped = ingest.skipped,
            tracked_keys,
            "Ingest stopped"
        );

        // last detector handle; dropping it closes the alert queue
        drop(detector);
        let dispatched = match dispatcher {
            Some(handle) => Some(handle.await.context("alert dispatcher task failed")?),
            None => None,
        };

        Ok(RunSummary {
            input,
            ingest,
            tracked_keys,
            dispatched,
        })
    }
}
