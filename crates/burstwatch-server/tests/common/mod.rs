#![allow(dead_code)]

use burstwatch_alert::clock::ManualClock;
use burstwatch_alert::{AlertSink, BurstConfig, BurstDetector};
use burstwatch_common::types::{BurstAlert, Product, ProductAction, ProductMessage};
use burstwatch_notify::error::Result as NotifyResult;
use burstwatch_notify::NotificationChannel;
use burstwatch_server::listener::ProductListener;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct RecordingSink {
    alerts: Mutex<Vec<BurstAlert>>,
}

impl RecordingSink {
    pub fn alerts(&self) -> Vec<BurstAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl AlertSink for RecordingSink {
    fn notify(&self, alert: &BurstAlert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }
}

/// Queued-mode channel that keeps the key of every alert it is handed.
#[derive(Clone, Default)]
pub struct CollectingChannel {
    keys: Arc<Mutex<Vec<String>>>,
}

impl CollectingChannel {
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NotificationChannel for CollectingChannel {
    async fn send(&self, alert: &BurstAlert) -> NotifyResult<()> {
        self.keys.lock().unwrap().push(alert.key.clone());
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "collecting"
    }
}

pub struct TestContext {
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
    pub detector: Arc<BurstDetector>,
    pub listener: Arc<ProductListener>,
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

pub fn build_test_context(threshold: i64, window_secs: i64) -> TestContext {
    let sink = Arc::new(RecordingSink::default());
    let clock = Arc::new(ManualClock::new(start_time()));
    let detector = Arc::new(BurstDetector::new(sink.clone()).with_clock(clock.clone()));
    let config = BurstConfig::new(threshold, window_secs).expect("test config should be valid");
    let listener = Arc::new(ProductListener::new(detector.clone(), config));

    TestContext {
        sink,
        clock,
        detector,
        listener,
    }
}

pub fn add(id: &str, name: &str) -> ProductMessage {
    ProductMessage::new(
        Product {
            id: id.to_string(),
            name: Some(name.to_string()),
            price: Some(9.99),
        },
        ProductAction::Add,
    )
}

pub fn delete(id: &str) -> ProductMessage {
    ProductMessage::new(Product::with_id(id), ProductAction::Delete)
}

/// One JSON line, newline included, as the ingest reader would deliver it.
pub fn json_line(message: &ProductMessage) -> Vec<u8> {
    let mut line = serde_json::to_vec(message).unwrap();
    line.push(b'\n');
    line
}
