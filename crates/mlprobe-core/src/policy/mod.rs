//! Recording policies.
//!
//! A policy owns the metrics one decorator created and knows which view it
//! reads and how values drive updates. Policies are built once by the
//! [`Instrumentation`](crate::Instrumentation) factory methods and then only
//! touched through the backend's own atomic `inc`/`set`/`observe`.
//!
//! Lookup misses are not errors: a policy that cannot find its field simply
//! records nothing for that call.

mod feature;
mod feedback;
mod output;

use serde_json::Value;

use crate::error::RecordError;
use crate::search::{numeric, search};

pub use feature::{FeatureCount, FeatureGauge, FeatureHistogram};
pub use feedback::FeedbackBinary;
pub use output::{OutputBinary, OutputGauge, OutputHistogram, OutputMulticlass};

/// Which side of the call a policy reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Request,
    Response,
}

/// Per-call update logic of a decorator.
pub trait Policy: Send + Sync {
    fn side(&self) -> Side;

    /// Apply updates from one view. Multi-metric policies keep going past a
    /// bad field and report the first failure.
    fn record(&self, view: &Value) -> Result<(), RecordError>;
}

/// Cutoff between positive and negative outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    Fixed(f64),
    /// Looked up in the view on every call.
    Lookup(String),
}

impl Threshold {
    pub const DEFAULT: f64 = 0.5;

    pub fn from_key(key: Option<&str>) -> Self {
        match key {
            Some(k) => Threshold::Lookup(k.to_string()),
            None => Threshold::Fixed(Self::DEFAULT),
        }
    }

    /// `Ok(None)` when the lookup key is absent from the view.
    pub fn resolve(&self, view: &Value) -> Result<Option<f64>, RecordError> {
        match self {
            Threshold::Fixed(t) => Ok(Some(*t)),
            Threshold::Lookup(key) => search(key, view).map(|v| number(key, v)).transpose(),
        }
    }
}

/// Numeric value of `field` or a `NotNumeric` failure.
pub(crate) fn number(field: &str, v: &Value) -> Result<f64, RecordError> {
    numeric(v).ok_or_else(|| RecordError::NotNumeric { field: field.to_string() })
}

/// Keep the first error while letting every update run.
pub(crate) fn keep_first(first: &mut Option<RecordError>, result: Result<(), RecordError>) {
    if let Err(e) = result {
        first.get_or_insert(e);
    }
}

pub(crate) fn finish(first: Option<RecordError>) -> Result<(), RecordError> {
    first.map_or(Ok(()), Err)
}
