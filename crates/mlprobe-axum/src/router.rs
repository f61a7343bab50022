//! Axum router wiring.
//!
//! Mounts the scrape route from the config's instrumentation section, then the
//! instrumented scoring routes.

use axum::Router;

use mlprobe_core::error::Result;
use mlprobe_core::Instrumentation;

use crate::{config::ProbeConfig, host::AxumHost, services};

pub fn build_router(cfg: &ProbeConfig) -> Result<Router> {
    let mut host = AxumHost::default();
    let inst = Instrumentation::from_settings(&mut host, cfg.instrumentation.settings()?)?;
    let scoring = services::scoring::routes(&inst)?;
    Ok(host.into_router().merge(scoring))
}
