//! Request-side feature policies.
//!
//! Feature fields are read from the top level of the request view; nested
//! lookups are reserved for response documents.

use prometheus::{Gauge, Histogram, IntCounter};
use serde_json::Value;

use super::{finish, keep_first, number, Policy, Side};
use crate::error::{RecordError, Result};
use crate::registry::{Buckets, MetricRegistry, MetricSpec};
use crate::search::{loosely_equal, scalar_text};

/// One counter per enumerated value of a single feature.
pub struct FeatureCount {
    feature: String,
    counters: Vec<(Value, IntCounter)>,
}

impl FeatureCount {
    pub fn new(registry: &MetricRegistry, id: &str, feature: &str, values: &[Value]) -> Result<Self> {
        let mut counters = Vec::with_capacity(values.len());
        for value in values {
            let label = format!("{feature}_{}", scalar_text(value).unwrap_or_else(|| value.to_string()));
            let spec = MetricSpec::new(id, &label, format!("Counter for feature and value:{label}"));
            counters.push((value.clone(), registry.counter(&spec)?));
        }
        Ok(Self {
            feature: feature.to_string(),
            counters,
        })
    }
}

impl Policy for FeatureCount {
    fn side(&self) -> Side {
        Side::Request
    }

    fn record(&self, view: &Value) -> std::result::Result<(), RecordError> {
        let Some(actual) = view.get(&self.feature) else {
            return Ok(());
        };
        if let Some((_, counter)) = self.counters.iter().find(|(v, _)| loosely_equal(v, actual)) {
            counter.inc();
        }
        Ok(())
    }
}

/// Latest value of each feature.
pub struct FeatureGauge {
    gauges: Vec<(String, Gauge)>,
}

impl FeatureGauge {
    pub fn new(registry: &MetricRegistry, id: &str, feature_keys: &[&str]) -> Result<Self> {
        let gauges = feature_keys
            .iter()
            .map(|key| {
                let spec = MetricSpec::new(id, key, format!("Gauge metric for feature:{key}"));
                Ok((key.to_string(), registry.gauge(&spec)?))
            })
            .collect::<Result<_>>()?;
        Ok(Self { gauges })
    }
}

impl Policy for FeatureGauge {
    fn side(&self) -> Side {
        Side::Request
    }

    fn record(&self, view: &Value) -> std::result::Result<(), RecordError> {
        let mut first = None;
        for (key, gauge) in &self.gauges {
            if let Some(v) = view.get(key).filter(|v| !v.is_null()) {
                keep_first(&mut first, number(key, v).map(|n| gauge.set(n)));
            }
        }
        finish(first)
    }
}

/// Distribution of each feature over a shared bucket set.
pub struct FeatureHistogram {
    histograms: Vec<(String, Histogram)>,
}

impl FeatureHistogram {
    pub fn new(registry: &MetricRegistry, id: &str, buckets: &[f64], feature_keys: &[&str]) -> Result<Self> {
        let buckets = Buckets::new(id, buckets)?;
        let histograms = feature_keys
            .iter()
            .map(|key| {
                let spec = MetricSpec::new(id, key, format!("Histogram for feature:{key}"));
                Ok((key.to_string(), registry.histogram(&spec, &buckets)?))
            })
            .collect::<Result<_>>()?;
        Ok(Self { histograms })
    }
}

impl Policy for FeatureHistogram {
    fn side(&self) -> Side {
        Side::Request
    }

    fn record(&self, view: &Value) -> std::result::Result<(), RecordError> {
        let mut first = None;
        for (key, histogram) in &self.histograms {
            if let Some(v) = view.get(key).filter(|v| !v.is_null()) {
                keep_first(&mut first, number(key, v).map(|n| histogram.observe(n)));
            }
        }
        finish(first)
    }
}
