//! Built-in demo services.

pub mod scoring;

pub use scoring::{FeedbackRequest, ScoreRequest, ScoreResponse};
