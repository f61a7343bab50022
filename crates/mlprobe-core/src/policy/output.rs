//! Response-side output policies.
//!
//! Outputs are found with [`search`] anywhere in the response document, so a
//! score nested under `{"result": {"score": ..}}` is picked up by key alone.

use prometheus::{Gauge, Histogram, IntCounter};
use serde_json::Value;

use super::{finish, keep_first, number, Policy, Side, Threshold};
use crate::error::{RecordError, Result};
use crate::registry::{Buckets, MetricRegistry, MetricSpec};
use crate::search::search;

/// Positive / negative class counters of a binary prediction.
pub struct OutputBinary {
    result_key: String,
    threshold: Threshold,
    positive: IntCounter,
    negative: IntCounter,
}

impl OutputBinary {
    pub fn new(
        registry: &MetricRegistry,
        id: &str,
        result_key: &str,
        threshold_key: Option<&str>,
    ) -> Result<Self> {
        let positive = registry.counter(&MetricSpec::new(
            id,
            "pos",
            format!("Counter metric for the positive class of:{id}"),
        ))?;
        let negative = registry.counter(&MetricSpec::new(
            id,
            "neg",
            format!("Counter metric for the negative class of:{id}"),
        ))?;
        Ok(Self {
            result_key: result_key.to_string(),
            threshold: Threshold::from_key(threshold_key),
            positive,
            negative,
        })
    }
}

impl Policy for OutputBinary {
    fn side(&self) -> Side {
        Side::Response
    }

    fn record(&self, view: &Value) -> std::result::Result<(), RecordError> {
        let Some(value) = search(&self.result_key, view) else {
            tracing::trace!(key = %self.result_key, "result absent");
            return Ok(());
        };
        let value = number(&self.result_key, value)?;
        let Some(threshold) = self.threshold.resolve(view)? else {
            return Ok(());
        };
        if value > threshold {
            self.positive.inc();
        } else {
            self.negative.inc();
        }
        Ok(())
    }
}

/// One counter per class of a multi-class prediction.
///
/// Classes are independent: every class whose score exceeds the threshold is
/// counted, so several may fire for one response.
pub struct OutputMulticlass {
    threshold: Threshold,
    classes: Vec<(String, IntCounter)>,
}

impl OutputMulticlass {
    /// `class_keys` pairs each class name with the response key holding its score.
    pub fn new(
        registry: &MetricRegistry,
        id: &str,
        threshold_key: Option<&str>,
        class_keys: &[(&str, &str)],
    ) -> Result<Self> {
        let classes = class_keys
            .iter()
            .map(|(class, key)| {
                let spec = MetricSpec::new(id, class, format!("Counter metric for the class:{class}"));
                Ok((key.to_string(), registry.counter(&spec)?))
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            threshold: Threshold::from_key(threshold_key),
            classes,
        })
    }
}

impl Policy for OutputMulticlass {
    fn side(&self) -> Side {
        Side::Response
    }

    fn record(&self, view: &Value) -> std::result::Result<(), RecordError> {
        let Some(threshold) = self.threshold.resolve(view)? else {
            return Ok(());
        };
        let mut first = None;
        for (key, counter) in &self.classes {
            if let Some(v) = search(key, view) {
                let fired = number(key, v).map(|score| {
                    if score > threshold {
                        counter.inc();
                    }
                });
                keep_first(&mut first, fired);
            }
        }
        finish(first)
    }
}

/// Latest value of each output.
pub struct OutputGauge {
    gauges: Vec<(String, Gauge)>,
}

impl OutputGauge {
    pub fn new(registry: &MetricRegistry, id: &str, value_keys: &[&str]) -> Result<Self> {
        let gauges = value_keys
            .iter()
            .map(|key| {
                let spec = MetricSpec::new(id, key, format!("Gauge metric for:{key}"));
                Ok((key.to_string(), registry.gauge(&spec)?))
            })
            .collect::<Result<_>>()?;
        Ok(Self { gauges })
    }
}

impl Policy for OutputGauge {
    fn side(&self) -> Side {
        Side::Response
    }

    fn record(&self, view: &Value) -> std::result::Result<(), RecordError> {
        let mut first = None;
        for (key, gauge) in &self.gauges {
            if let Some(v) = search(key, view) {
                keep_first(&mut first, number(key, v).map(|n| gauge.set(n)));
            }
        }
        finish(first)
    }
}

/// Distribution of each output, with shared or per-output buckets.
pub struct OutputHistogram {
    histograms: Vec<(String, Histogram)>,
}

impl OutputHistogram {
    pub fn shared(registry: &MetricRegistry, id: &str, buckets: &[f64], value_keys: &[&str]) -> Result<Self> {
        let buckets = Buckets::new(id, buckets)?;
        let histograms = value_keys
            .iter()
            .map(|key| {
                let spec = MetricSpec::new(id, key, format!("Histogram for:{key}"));
                Ok((key.to_string(), registry.histogram(&spec, &buckets)?))
            })
            .collect::<Result<_>>()?;
        Ok(Self { histograms })
    }

    pub fn per_key(registry: &MetricRegistry, id: &str, buckets: &[(&str, &[f64])]) -> Result<Self> {
        let histograms = buckets
            .iter()
            .map(|(key, bounds)| {
                let spec = MetricSpec::new(id, key, format!("Histogram for:{key}"));
                let bounds = Buckets::new(&spec.name, bounds)?;
                Ok((key.to_string(), registry.histogram(&spec, &bounds)?))
            })
            .collect::<Result<_>>()?;
        Ok(Self { histograms })
    }
}

impl Policy for OutputHistogram {
    fn side(&self) -> Side {
        Side::Response
    }

    fn record(&self, view: &Value) -> std::result::Result<(), RecordError> {
        let mut first = None;
        for (key, histogram) in &self.histograms {
            if let Some(v) = search(key, view) {
                keep_first(&mut first, number(key, v).map(|n| histogram.observe(n)));
            }
        }
        finish(first)
    }
}
