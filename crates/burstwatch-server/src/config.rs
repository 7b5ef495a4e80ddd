use burstwatch_alert::{BurstConfig, DetectorError};
use burstwatch_common::id::{self, AlertIds, IdError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config: failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config: failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config: invalid [detector] table: {0}")]
    Detector(#[from] DetectorError),

    #[error("Config: invalid [alert_ids] table: {0}")]
    AlertIds(#[from] IdError),

    #[error("Config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_detector")]
    pub detector: BurstConfig,
    #[serde(default)]
    pub alert_ids: AlertIdConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            detector: default_detector(),
            alert_ids: AlertIdConfig::default(),
            ingest: IngestConfig::default(),
            notify: NotifyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Snowflake worker identity stamped into every alert id.
///
/// Give each process watching the same stream its own pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertIdConfig {
    #[serde(default = "default_worker_id")]
    pub machine_id: i32,
    #[serde(default = "default_worker_id")]
    pub node_id: i32,
}

impl Default for AlertIdConfig {
    fn default() -> Self {
        Self {
            machine_id: default_worker_id(),
            node_id: default_worker_id(),
        }
    }
}

impl AlertIdConfig {
    pub fn build(&self) -> Result<AlertIds, IdError> {
        AlertIds::new(self.machine_id, self.node_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Worker tasks; events for one key always land on the same worker.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Bounded queue depth per worker.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    /// Log the alert on the worker that observed the event.
    Inline,
    /// Queue the alert for the background dispatcher.
    #[default]
    Queued,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub mode: NotifyMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_detector() -> BurstConfig {
    BurstConfig {
        threshold: 3,
        window_secs: 5,
    }
}

fn default_worker_id() -> i32 {
    1
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_log_filter() -> String {
    "burstwatch=info".to_string()
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        id::check_worker_ids(self.alert_ids.machine_id, self.alert_ids.node_id)?;
        if self.ingest.workers == 0 {
            return Err(ConfigError::Invalid(
                "ingest.workers must be at least 1".to_string(),
            ));
        }
        if self.ingest.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "ingest.queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: AppConfig = "".parse().unwrap();
        assert_eq!(config.detector, default_detector());
        assert_eq!(config.ingest.workers, 4);
        assert_eq!(config.alert_ids, AlertIdConfig::default());
        assert_eq!(config.notify.mode, NotifyMode::Queued);
        assert_eq!(config.logging.filter, "burstwatch=info");
        assert!(!config.logging.json);
    }

    #[test]
    fn full_file_round_trips_every_table() {
        let config: AppConfig = r#"
            [detector]
            threshold = 10
            alert_time_window = 60

            [alert_ids]
            machine_id = 7
            node_id = 30

            [ingest]
            workers = 2
            queue_capacity = 16

            [notify]
            mode = "inline"

            [logging]
            filter = "burstwatch=debug"
            json = true
        "#
        .parse()
        .unwrap();

        assert_eq!(config.detector.threshold, 10);
        assert_eq!(config.detector.window_secs, 60);
        assert_eq!(
            config.alert_ids,
            AlertIdConfig {
                machine_id: 7,
                node_id: 30
            }
        );
        assert_eq!(config.ingest.workers, 2);
        assert_eq!(config.ingest.queue_capacity, 16);
        assert_eq!(config.notify.mode, NotifyMode::Inline);
        assert!(config.logging.json);
    }

    #[test]
    fn non_positive_threshold_is_rejected() {
        let err = "[detector]\nthreshold = 0\nwindow_secs = 5\n"
            .parse::<AppConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Detector(_)), "{err}");
    }

    #[test]
    fn out_of_range_alert_worker_id_is_rejected() {
        let err = "[alert_ids]\nmachine_id = 40\n"
            .parse::<AppConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::AlertIds(_)), "{err}");
        assert!(err.to_string().contains("machine_id"));
    }

    #[test]
    fn alert_id_table_builds_its_generator() {
        let ids = AlertIdConfig {
            machine_id: 5,
            node_id: 6,
        }
        .build()
        .unwrap();
        assert_eq!((ids.machine_id(), ids.node_id()), (5, 6));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = "[ingest]\nworkers = 0\n".parse::<AppConfig>().unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn unknown_notify_mode_is_a_parse_error() {
        let err = "[notify]\nmode = \"pager\"\n"
            .parse::<AppConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppConfig::load("/nonexistent/burstwatch.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/burstwatch.toml"));
    }
}
