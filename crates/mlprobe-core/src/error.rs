//! Error types shared by mlprobe crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, InstrumentError>;

/// Errors raised while setting up instrumentation.
///
/// All of these happen at construction or decorator-factory time, before any
/// traffic is served.
#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("the instrumentation does not support the app of type: {0}")]
    UnsupportedApp(String),
    #[error("invalid buckets for {metric}: {reason}")]
    InvalidBuckets { metric: String, reason: String },
    #[error("metric registration failed: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("metric exposition failed: {0}")]
    Exposition(String),
    #[error("invalid config: {0}")]
    Config(String),
}

/// A failure while recording one observation for one call.
///
/// Never returned to the handler's caller; the decorator logs it and bumps
/// `mlprobe_recording_failures_total`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("field `{field}` is not numeric")]
    NotNumeric { field: String },
}
