//! Per-key burst detection for product lifecycle events.
//!
//! [`store::CounterStore`] keeps one [`store::Tracker`] per entity key in a
//! sharded concurrent map. [`detector::BurstDetector`] updates the tracker
//! for every observed event, compares the gap since the key's previous
//! event against the configured window, and hands alerts to an injected
//! [`AlertSink`].

pub mod clock;
pub mod detector;
pub mod error;
pub mod store;


use burstwatch_common::types::BurstAlert;

pub use detector::{AlertDecision, BurstConfig, BurstDetector};
pub use error::{DetectorError, Result};

/// Receiver for alerts raised by the [`detector::BurstDetector`].
///
/// `notify` is called from inside `observe`, possibly from several worker
/// threads at once. Implementations must not block: queue the alert or
/// emit it cheaply (a log line, a metric) and return.
pub trait AlertSink: Send + Sync {
    fn notify(&self, alert: &BurstAlert);
}
