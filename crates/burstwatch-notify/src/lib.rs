//! Alert delivery for the burst detector.
//!
//! The detector only knows the synchronous [`AlertSink`] trait. This crate
//! provides two sinks: [`sink::LogSink`] writes the alert inline, and
//! [`sink::QueuedSink`] hands it to a queue drained by an
//! [`dispatcher::AlertDispatcher`], which fans out to async
//! [`NotificationChannel`]s off the detector's path.

pub mod channels;
pub mod dispatcher;
pub mod error;
pub mod sink;


use async_trait::async_trait;
use burstwatch_common::types::BurstAlert;

pub use burstwatch_alert::AlertSink;

/// An async destination for burst alerts (log, webhook, pager, ...).
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Delivers one alert.
    ///
    /// # Errors
    ///
    /// Returns an error if the alert could not be delivered. The
    /// dispatcher logs it and carries on with the next channel.
    async fn send(&self, alert: &BurstAlert) -> error::Result<()>;

    /// Returns the channel type name (e.g., `"console"`).
    fn channel_name(&self) -> &str;
}
