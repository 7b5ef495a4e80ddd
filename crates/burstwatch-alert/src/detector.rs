use crate::clock::{Clock, SystemClock};
use crate::error::{DetectorError, Result};
use crate::store::{CounterStore, Recorded, Tracker};
use crate::AlertSink;
use burstwatch_common::id::AlertIds;
use burstwatch_common::types::BurstAlert;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Threshold/window policy applied on every observation.
///
/// # Examples
///
/// ```
/// use burstwatch_alert::BurstConfig;
///
/// let config = BurstConfig::new(3, 5).unwrap();
/// assert_eq!(config.threshold, 3);
/// assert!(BurstConfig::new(0, 5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstConfig {
    /// Alerts fire once a key's count is strictly greater than this.
    pub threshold: i64,
    /// Maximum gap, in whole seconds, between a key's previous event and
    /// the current one for the current one to count as part of a burst.
    #[serde(alias = "alert_time_window")]
    pub window_secs: i64,
}

impl BurstConfig {
    pub fn new(threshold: i64, window_secs: i64) -> Result<Self> {
        let config = Self {
            threshold,
            window_secs,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold <= 0 {
            return Err(DetectorError::InvalidArgument(format!(
                "threshold must be positive, got {}",
                self.threshold
            )));
        }
        if self.window_secs <= 0 {
            return Err(DetectorError::InvalidArgument(format!(
                "window_secs must be positive, got {}",
                self.window_secs
            )));
        }
        Ok(())
    }
}

/// What [`BurstDetector::observe`] decided for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDecision {
    pub key: String,
    pub alert: bool,
    /// Count for the key after this event.
    pub count: u64,
    pub threshold: i64,
    pub window_secs: i64,
    /// Whole seconds since the key's previous event; `None` on the first.
    pub elapsed_secs: Option<i64>,
}

pub struct BurstDetector {
    store: CounterStore,
    sink: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
    ids: AlertIds,
}

impl BurstDetector {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self {
            store: CounterStore::new(),
            sink,
            clock: Arc::new(SystemClock),
            ids: AlertIds::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the default worker-1 id generator.
    pub fn with_ids(mut self, ids: AlertIds) -> Self {
        self.ids = ids;
        self
    }

    /// Observe one event for `key` at the detector clock's current time.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::InvalidArgument`] for an empty key or a
    /// non-positive threshold or window. The store is left untouched.
    pub fn observe(&self, key: &str, config: &BurstConfig) -> Result<AlertDecision> {
        self.observe_at(key, config, self.clock.now())
    }

    /// Same as [`observe`](Self::observe) with an explicit event time.
    pub fn observe_at(
        &self,
        key: &str,
        config: &BurstConfig,
        now: DateTime<Utc>,
    ) -> Result<AlertDecision> {
        if key.is_empty() {
            return Err(DetectorError::InvalidArgument(
                "key must not be empty".to_string(),
            ));
        }
        config.validate()?;

        let decision = match self.store.record(key, now) {
            Recorded::Created(tracker) => {
                tracing::debug!(key, "Tracking new key");
                AlertDecision {
                    key: key.to_string(),
                    alert: false,
                    count: tracker.count(),
                    threshold: config.threshold,
                    window_secs: config.window_secs,
                    elapsed_secs: None,
                }
            }
            Recorded::Incremented(update) => {
                // compare against the previous event, not the one just stamped
                let elapsed = (now - update.previous_event_time).num_seconds();
                let alert =
                    elapsed <= config.window_secs && update.count > config.threshold as u64;
                AlertDecision {
                    key: key.to_string(),
                    alert,
                    count: update.count,
                    threshold: config.threshold,
                    window_secs: config.window_secs,
                    elapsed_secs: Some(elapsed),
                }
            }
        };

        if decision.alert {
            tracing::debug!(
                key,
                count = decision.count,
                threshold = config.threshold,
                elapsed_secs = ?decision.elapsed_secs,
                "Burst threshold exceeded"
            );
            self.sink.notify(&BurstAlert {
                id: self.ids.next_id(),
                key: decision.key.clone(),
                count: decision.count,
                threshold: decision.threshold,
                window_secs: decision.window_secs,
                triggered_at: now,
            });
        }

        Ok(decision)
    }

    /// Snapshot of the tracker for `key`.
    pub fn tracker(&self, key: &str) -> Option<Tracker> {
        self.store.get(key)
    }

    pub fn store(&self) -> &CounterStore {
        &self.store
    }

    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}
