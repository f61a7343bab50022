//! Metric registry backed by the `prometheus` crate.
//!
//! Every metric a decorator creates is registered here under a name derived
//! from the caller-supplied id. Names are unique per registry: registering the
//! same name twice fails, which surfaces id collisions between decorators at
//! startup instead of silently sharing a series.

use prometheus::proto::MetricType;
use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

use crate::error::{InstrumentError, Result};

/// Identity and help text of one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    pub name: String,
    pub help: String,
}

impl MetricSpec {
    /// `{id}_{role}` with the given help text.
    pub fn new(id: &str, role: &str, help: impl Into<String>) -> Self {
        Self {
            name: format!("{id}_{}", sanitize(role)),
            help: help.into(),
        }
    }
}

/// Replace characters outside the metric-name alphabet with `_`.
pub fn sanitize(fragment: &str) -> String {
    fragment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
        .collect()
}

/// Histogram bucket boundaries: non-empty, finite, strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct Buckets(Vec<f64>);

impl Buckets {
    pub fn new(metric: &str, bounds: &[f64]) -> Result<Self> {
        let invalid = |reason: &str| InstrumentError::InvalidBuckets {
            metric: metric.to_string(),
            reason: reason.to_string(),
        };
        if bounds.is_empty() {
            return Err(invalid("at least one bucket is required"));
        }
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(invalid("bucket bounds must be finite"));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid("bucket bounds must be strictly increasing"));
        }
        Ok(Self(bounds.to_vec()))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Series a histogram `x` exposes besides `x` itself.
const HISTOGRAM_SUFFIXES: [&str; 3] = ["_bucket", "_count", "_sum"];

/// Process-local metric registry; clones share the same metrics.
///
/// Besides exact duplicates, a histogram `x` and a counter or gauge named
/// `x_count`, `x_sum` or `x_bucket` are rejected, since their series would
/// collide in the exposition text.
#[derive(Clone, Default)]
pub struct MetricRegistry {
    inner: Registry,
    namespace: Option<String>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose metric names are all prefixed with `{namespace}_`.
    pub fn with_namespace(namespace: &str) -> Result<Self> {
        let inner = Registry::new_custom(Some(namespace.to_string()), None)?;
        Ok(Self {
            inner,
            namespace: Some(namespace.to_string()),
        })
    }

    pub fn counter(&self, spec: &MetricSpec) -> Result<IntCounter> {
        self.check_series(&spec.name, false)?;
        let counter = IntCounter::new(spec.name.clone(), spec.help.clone())?;
        self.inner.register(Box::new(counter.clone()))?;
        Ok(counter)
    }

    pub fn gauge(&self, spec: &MetricSpec) -> Result<Gauge> {
        self.check_series(&spec.name, false)?;
        let gauge = Gauge::new(spec.name.clone(), spec.help.clone())?;
        self.inner.register(Box::new(gauge.clone()))?;
        Ok(gauge)
    }

    pub fn histogram(&self, spec: &MetricSpec, buckets: &Buckets) -> Result<Histogram> {
        self.check_series(&spec.name, true)?;
        let opts = HistogramOpts::new(spec.name.clone(), spec.help.clone())
            .buckets(buckets.as_slice().to_vec());
        let histogram = Histogram::with_opts(opts)?;
        self.inner.register(Box::new(histogram.clone()))?;
        Ok(histogram)
    }

    /// Reject `name` if its exposition series overlap a registered histogram's.
    fn check_series(&self, name: &str, histogram: bool) -> Result<()> {
        let name = match &self.namespace {
            Some(ns) => format!("{ns}_{name}"),
            None => name.to_string(),
        };
        for family in self.inner.gather() {
            let existing = family.get_name();
            let reserved = |base: &str, other: &str| {
                other.strip_prefix(base).is_some_and(|rest| HISTOGRAM_SUFFIXES.contains(&rest))
            };
            let clash = (family.get_field_type() == MetricType::HISTOGRAM && reserved(existing, &name))
                || (histogram && reserved(&name, existing));
            if clash {
                return Err(InstrumentError::Registration(prometheus::Error::Msg(format!(
                    "metric `{name}` collides with the series of `{existing}`"
                ))));
            }
        }
        Ok(())
    }

    /// Render all registered metrics in Prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.inner.gather(), &mut buf)
            .map_err(|e| InstrumentError::Exposition(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| InstrumentError::Exposition(e.to_string()))
    }

    /// Content type of [`MetricRegistry::render`] output.
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}
