use burstwatch_alert::AlertSink;
use burstwatch_common::types::BurstAlert;
use tokio::sync::mpsc;

/// Emits alerts inline as error-level log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn notify(&self, alert: &BurstAlert) {
        tracing::error!(
            alert_id = %alert.id,
            key = %alert.key,
            count = alert.count,
            threshold = alert.threshold,
            window_secs = alert.window_secs,
            "{}",
            alert.message()
        );
    }
}

/// Pushes alerts onto an unbounded queue and returns immediately.
///
/// Created together with its consumer by
/// [`AlertDispatcher::new`](crate::dispatcher::AlertDispatcher::new).
#[derive(Debug, Clone)]
pub struct QueuedSink {
    tx: mpsc::UnboundedSender<BurstAlert>,
}

impl QueuedSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<BurstAlert>) -> Self {
        Self { tx }
    }

    /// `true` once the dispatcher side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl AlertSink for QueuedSink {
    fn notify(&self, alert: &BurstAlert) {
        if let Err(mpsc::error::SendError(alert)) = self.tx.send(alert.clone()) {
            tracing::warn!(key = %alert.key, "Alert queue closed; logging alert inline");
            LogSink.notify(&alert);
        }
    }
}
