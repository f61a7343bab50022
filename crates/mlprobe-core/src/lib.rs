//! mlprobe core: framework-agnostic metric decorators for request handlers.
//!
//! A decorator wraps a handler, lets it run untouched, then reads values out of
//! the request parameters or the response body and feeds them into Prometheus
//! counters, gauges and histograms. This crate carries no HTTP framework
//! dependency; hosts plug in through [`ScrapeHost`], [`RequestSource`] and
//! [`ResponseSource`].
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed payloads
//! surface as missed lookups, and recording failures are logged and counted
//! instead of reaching the caller.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod decorator;
pub mod error;
pub mod instrument;
pub mod policy;
pub mod registry;
pub mod search;
pub mod view;

pub use decorator::Decorator;
pub use error::{InstrumentError, RecordError, Result};
pub use instrument::{Instrumentation, ScrapeHost, Settings, METRICS_PATH};
pub use registry::{Buckets, MetricRegistry, MetricSpec};
pub use search::search;
pub use view::{FieldView, Payload, RequestSource, RequestStyle, ResponseSource, TransportRequest};
