//! Instrumentation facade.
//!
//! Construction picks the view adapters for the host's [`RequestStyle`],
//! creates the metric registry and mounts the scrape endpoint on the host.
//! After that, each factory method creates its metrics once and returns a
//! [`Decorator`] to wrap handlers with.

use std::str::FromStr;
use std::sync::Arc;

use prometheus::IntCounter;
use serde_json::Value;

use crate::decorator::Decorator;
use crate::error::Result;
use crate::policy::{
    FeatureCount, FeatureGauge, FeatureHistogram, FeedbackBinary, OutputBinary, OutputGauge, OutputHistogram,
    OutputMulticlass, Policy,
};
use crate::registry::{MetricRegistry, MetricSpec};
use crate::view::RequestStyle;

/// Default scrape path.
pub const METRICS_PATH: &str = "/metrics";

/// Name of the counter tracking swallowed recording failures.
pub const RECORDING_FAILURES: &str = "mlprobe_recording_failures_total";

/// Hosting-framework capability: mount a `GET` scrape route.
pub trait ScrapeHost {
    fn register_scrape(&mut self, path: &str, registry: MetricRegistry) -> Result<()>;
}

/// Construction options.
#[derive(Debug, Clone)]
pub struct Settings {
    pub style: RequestStyle,
    pub metrics_path: String,
    /// Prefix applied to every metric name.
    pub namespace: Option<String>,
}

impl Settings {
    pub fn new(style: RequestStyle) -> Self {
        Self {
            style,
            metrics_path: METRICS_PATH.to_string(),
            namespace: None,
        }
    }
}

pub struct Instrumentation {
    style: RequestStyle,
    registry: MetricRegistry,
    failures: IntCounter,
}

impl Instrumentation {
    pub fn new<H: ScrapeHost + ?Sized>(host: &mut H, style: RequestStyle) -> Result<Self> {
        Self::from_settings(host, Settings::new(style))
    }

    /// Build from a host kind name (`query_form`, `typed_args`, ...).
    /// Unsupported kinds fail before anything is mounted on the host.
    pub fn for_app<H: ScrapeHost + ?Sized>(host: &mut H, kind: &str) -> Result<Self> {
        let style = RequestStyle::from_str(kind)?;
        Self::new(host, style)
    }

    pub fn from_settings<H: ScrapeHost + ?Sized>(host: &mut H, settings: Settings) -> Result<Self> {
        let registry = match &settings.namespace {
            Some(ns) => MetricRegistry::with_namespace(ns)?,
            None => MetricRegistry::new(),
        };
        let failures = registry.counter(&MetricSpec {
            name: RECORDING_FAILURES.to_string(),
            help: "Metric updates skipped because a request or response field could not be recorded".to_string(),
        })?;
        host.register_scrape(&settings.metrics_path, registry.clone())?;
        tracing::info!(
            style = settings.style.as_str(),
            path = %settings.metrics_path,
            "instrumentation ready"
        );
        Ok(Self {
            style: settings.style,
            registry,
            failures,
        })
    }

    pub fn style(&self) -> RequestStyle {
        self.style
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Current exposition text of all metrics.
    pub fn render(&self) -> Result<String> {
        self.registry.render()
    }

    /// Wrap a custom policy with the same engine the built-in factories use.
    pub fn decorator(&self, id: &str, policy: Arc<dyn Policy>) -> Decorator {
        Decorator::new(id, self.style, policy, self.failures.clone())
    }

    // Feedback metrics

    /// False-positive (`{id}_fp`) and false-negative (`{id}_fn`) counters driven
    /// by a feedback object in the request.
    pub fn count_false_binary_feedback(
        &self,
        id: &str,
        feedback_key: &str,
        threshold_key: Option<&str>,
    ) -> Result<Decorator> {
        let policy = FeedbackBinary::new(&self.registry, id, feedback_key, threshold_key)?;
        Ok(self.decorator(id, Arc::new(policy)))
    }

    // Feature metrics

    /// One counter per enumerated value of `feature`.
    pub fn count_feature(&self, id: &str, feature: &str, values: &[Value]) -> Result<Decorator> {
        let policy = FeatureCount::new(&self.registry, id, feature, values)?;
        Ok(self.decorator(id, Arc::new(policy)))
    }

    pub fn gauge_feature(&self, id: &str, feature_keys: &[&str]) -> Result<Decorator> {
        let policy = FeatureGauge::new(&self.registry, id, feature_keys)?;
        Ok(self.decorator(id, Arc::new(policy)))
    }

    pub fn hist_feature(&self, id: &str, buckets: &[f64], feature_keys: &[&str]) -> Result<Decorator> {
        let policy = FeatureHistogram::new(&self.registry, id, buckets, feature_keys)?;
        Ok(self.decorator(id, Arc::new(policy)))
    }

    // Output metrics

    /// Positive (`{id}_pos`) and negative (`{id}_neg`) class counters.
    pub fn count_binary(&self, id: &str, result_key: &str, threshold_key: Option<&str>) -> Result<Decorator> {
        let policy = OutputBinary::new(&self.registry, id, result_key, threshold_key)?;
        Ok(self.decorator(id, Arc::new(policy)))
    }

    /// One counter per `(class name, response key)` pair.
    pub fn count_classes(
        &self,
        id: &str,
        threshold_key: Option<&str>,
        class_keys: &[(&str, &str)],
    ) -> Result<Decorator> {
        let policy = OutputMulticlass::new(&self.registry, id, threshold_key, class_keys)?;
        Ok(self.decorator(id, Arc::new(policy)))
    }

    pub fn gauge_output(&self, id: &str, value_keys: &[&str]) -> Result<Decorator> {
        let policy = OutputGauge::new(&self.registry, id, value_keys)?;
        Ok(self.decorator(id, Arc::new(policy)))
    }

    pub fn hist_output(&self, id: &str, buckets: &[f64], value_keys: &[&str]) -> Result<Decorator> {
        let policy = OutputHistogram::shared(&self.registry, id, buckets, value_keys)?;
        Ok(self.decorator(id, Arc::new(policy)))
    }

    /// Histograms with their own bucket set per output key.
    pub fn hist_output_specific(&self, id: &str, buckets: &[(&str, &[f64])]) -> Result<Decorator> {
        let policy = OutputHistogram::per_key(&self.registry, id, buckets)?;
        Ok(self.decorator(id, Arc::new(policy)))
    }
}
