use crate::error::Result;
use crate::NotificationChannel;
use async_trait::async_trait;
use burstwatch_common::types::BurstAlert;

/// Writes each alert through `tracing` at error level.
pub struct ConsoleChannel {
    json: bool,
}

impl ConsoleChannel {
    /// Human-readable alert message.
    pub fn text() -> Self {
        Self { json: false }
    }

    /// The full alert serialized as a JSON payload field.
    pub fn json() -> Self {
        Self { json: true }
    }
}

#[async_trait]
impl NotificationChannel for ConsoleChannel {
    async fn send(&self, alert: &BurstAlert) -> Result<()> {
        if self.json {
            let payload = serde_json::to_string(alert)?;
            tracing::error!(alert_id = %alert.id, payload = %payload, "Burst alert");
        } else {
            tracing::error!(alert_id = %alert.id, "{}", alert.message());
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "console"
    }
}
