/// Errors that can occur while delivering alerts.
///
/// # Examples
///
/// ```rust
/// use burstwatch_notify::error::NotifyError;
///
/// let err = NotifyError::Delivery {
///     channel: "log".to_string(),
///     reason: "writer closed".to_string(),
/// };
/// assert!(err.to_string().contains("writer closed"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// A channel failed to deliver an alert.
    #[error("Notify: delivery via {channel} failed: {reason}")]
    Delivery { channel: String, reason: String },

    /// Serializing the alert payload failed.
    #[error("Notify: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
