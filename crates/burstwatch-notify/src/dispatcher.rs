use crate::sink::QueuedSink;
use crate::NotificationChannel;
use burstwatch_common::types::BurstAlert;
use tokio::sync::mpsc;

/// Drains the alert queue fed by a [`QueuedSink`] and delivers each alert
/// to every registered channel.
pub struct AlertDispatcher {
    channels: Vec<Box<dyn NotificationChannel>>,
    rx: mpsc::UnboundedReceiver<BurstAlert>,
}

impl AlertDispatcher {
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>) -> (QueuedSink, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (QueuedSink::new(tx), Self { channels, rx })
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.channel_name()).collect()
    }

    /// Runs until every [`QueuedSink`] clone has been dropped and the queue
    /// is empty. Returns the number of alerts dispatched.
    pub async fn run(mut self) -> u64 {
        let mut dispatched = 0u64;
        while let Some(alert) = self.rx.recv().await {
            self.dispatch(&alert).await;
            dispatched += 1;
        }
        tracing::info!(dispatched, "Alert dispatcher stopped");
        dispatched
    }

    async fn dispatch(&self, alert: &BurstAlert) {
        for channel in &self.channels {
            if let Err(e) = channel.send(alert).await {
                tracing::error!(
                    channel = channel.channel_name(),
                    alert_id = %alert.id,
                    error = %e,
                    "Failed to send notification"
                );
            }
        }
    }
}
