/// Errors returned by the burst detector.
///
/// # Examples
///
/// ```rust
/// use burstwatch_alert::error::DetectorError;
///
/// let err = DetectorError::InvalidArgument("threshold must be positive, got 0".to_string());
/// assert!(err.to_string().contains("threshold"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectorError {
    /// Empty key or a non-positive threshold/window. No state was touched.
    #[error("Detector: invalid argument: {0}")]
    InvalidArgument(String),

    /// The counter store could not be reached. Never produced by the
    /// in-memory [`crate::store::CounterStore`].
    #[error("Detector: counter store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Convenience `Result` alias for detector operations.
pub type Result<T> = std::result::Result<T, DetectorError>;
