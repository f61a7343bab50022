use serde::Deserialize;

use mlprobe_core::error::{InstrumentError, Result};
use mlprobe_core::{RequestStyle, Settings, METRICS_PATH};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub instrumentation: InstrumentationSection,
}

impl ProbeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(InstrumentError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.instrumentation.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstrumentationSection {
    /// `query_form` or `typed_args`.
    #[serde(default = "default_request_style")]
    pub request_style: String,

    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Prefix for every metric name.
    #[serde(default)]
    pub namespace: Option<String>,
}

impl Default for InstrumentationSection {
    fn default() -> Self {
        Self {
            request_style: default_request_style(),
            metrics_path: default_metrics_path(),
            namespace: None,
        }
    }
}

impl InstrumentationSection {
    pub fn validate(&self) -> Result<()> {
        self.request_style.parse::<RequestStyle>()?;
        if !self.metrics_path.starts_with('/') {
            return Err(InstrumentError::Config(
                "instrumentation.metrics_path must start with '/'".into(),
            ));
        }
        if let Some(ns) = &self.namespace {
            let valid = ns.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && ns.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(InstrumentError::Config(format!(
                    "instrumentation.namespace `{ns}` is not a valid metric name prefix"
                )));
            }
        }
        Ok(())
    }

    pub fn settings(&self) -> Result<Settings> {
        Ok(Settings {
            style: self.request_style.parse()?,
            metrics_path: self.metrics_path.clone(),
            namespace: self.namespace.clone(),
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_request_style() -> String {
    RequestStyle::TypedArgs.as_str().into()
}
fn default_metrics_path() -> String {
    METRICS_PATH.into()
}
