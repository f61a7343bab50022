//! axum as a scrape host.

use axum::{routing::get, Router};

use mlprobe_core::error::{InstrumentError, Result};
use mlprobe_core::{MetricRegistry, ScrapeHost};

use crate::ops;

/// Router under construction that instrumentation can mount its scrape route on.
pub struct AxumHost<S = ()> {
    router: Router<S>,
}

impl<S> AxumHost<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(router: Router<S>) -> Self {
        Self { router }
    }

    pub fn into_router(self) -> Router<S> {
        self.router
    }
}

impl Default for AxumHost<()> {
    fn default() -> Self {
        Self::new(Router::new())
    }
}

impl<S> ScrapeHost for AxumHost<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn register_scrape(&mut self, path: &str, registry: MetricRegistry) -> Result<()> {
        if !path.starts_with('/') {
            return Err(InstrumentError::Config(format!("scrape path `{path}` must start with '/'")));
        }
        let scrape: Router<S> = Router::new().route(path, get(ops::metrics)).with_state(registry);
        self.router = std::mem::take(&mut self.router).merge(scrape);
        tracing::debug!(%path, "scrape route mounted");
        Ok(())
    }
}
