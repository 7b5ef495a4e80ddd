use burstwatch_alert::{AlertDecision, BurstConfig, BurstDetector};
use burstwatch_common::types::ProductMessage;
use std::sync::Arc;

/// Feeds product lifecycle messages into the burst detector.
///
/// Every message with a product name counts toward that name's burst,
/// whatever its action.
pub struct ProductListener {
    detector: Arc<BurstDetector>,
    config: BurstConfig,
}

impl ProductListener {
    pub fn new(detector: Arc<BurstDetector>, config: BurstConfig) -> Self {
        Self { detector, config }
    }

    pub fn detector(&self) -> &Arc<BurstDetector> {
        &self.detector
    }

    /// Returns `Ok(None)` for messages that carry no product name.
    pub fn handle(
        &self,
        message: &ProductMessage,
    ) -> burstwatch_alert::Result<Option<AlertDecision>> {
        tracing::info!(
            product_id = %message.product.id,
            action = %message.action,
            "Received product event"
        );

        let Some(key) = message.entity_key() else {
            tracing::warn!(
                product_id = %message.product.id,
                action = %message.action,
                "Product event has no name; skipping"
            );
            return Ok(None);
        };

        self.detector.observe(key, &self.config).map(Some)
    }
}
