//! mlprobe axum integration.
//!
//! Wires the core decorator engine into an axum application: the scrape route
//! host, request extractors that expose handler parameters as views, the JSON
//! reply wrapper, strict YAML config, and a small scoring service used by the
//! binary and integration tests.

pub mod config;
pub mod extract;
pub mod host;
pub mod ops;
pub mod router;
pub mod services;

pub use extract::{JsonArgs, JsonReply, ParamsRequest};
pub use host::AxumHost;
