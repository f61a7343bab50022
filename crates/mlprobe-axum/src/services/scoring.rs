//! Deterministic fraud scoring service.
//!
//! Stands in for a model server so the binary and the integration tests have
//! a realistic handler to instrument:
//! - `POST /v1/score`: scores a transaction. Instrumented with the amount
//!   gauge, the channel counters, the score histogram and the binary
//!   outcome counters.
//! - `POST /v1/feedback`: accepts a correction for an earlier score and feeds
//!   the false positive / false negative counters.

use axum::{http::StatusCode, routing::post, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use mlprobe_core::error::Result;
use mlprobe_core::Instrumentation;

use crate::extract::{JsonArgs, JsonReply};

pub const MODEL: &str = "fraud-rules-v1";

/// Channels with a dedicated counter.
pub const CHANNELS: [&str; 3] = ["web", "app", "pos"];

const SCORE_BUCKETS: [f64; 5] = [0.1, 0.25, 0.5, 0.75, 0.9];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub transaction_id: String,
    pub amount: f64,
    pub channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub transaction_id: String,
    pub model: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    /// Negative when the earlier score was wrong.
    pub correctness: f64,
    pub corrected_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub transaction_id: String,
    pub feedback: Feedback,
}

type Rejected = (StatusCode, String);

/// Score in `[0, 1]`: a per-channel base rate plus a saturating amount term.
pub fn fraud_score(amount: f64, channel: &str) -> f64 {
    let base = match channel {
        "pos" => 0.05,
        "app" => 0.1,
        "web" => 0.2,
        _ => 0.3,
    };
    let amount = amount.max(0.0);
    (base + 0.7 * amount / (amount + 1000.0)).clamp(0.0, 1.0)
}

async fn score(JsonArgs(req): JsonArgs<ScoreRequest>) -> std::result::Result<JsonReply<ScoreResponse>, Rejected> {
    if !req.amount.is_finite() || req.amount < 0.0 {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "amount must be a non-negative number".into()));
    }
    let score = fraud_score(req.amount, &req.channel);
    tracing::debug!(tx = %req.transaction_id, score, "transaction scored");
    Ok(JsonReply(ScoreResponse {
        transaction_id: req.transaction_id,
        model: MODEL.to_string(),
        score,
    }))
}

async fn feedback(JsonArgs(req): JsonArgs<FeedbackRequest>) -> JsonReply<Value> {
    tracing::debug!(tx = %req.transaction_id, correctness = req.feedback.correctness, "feedback received");
    JsonReply(json!({ "transaction_id": req.transaction_id, "accepted": true }))
}

/// Scoring routes with their decorators. Metric names are fixed, so this can
/// be called once per [`Instrumentation`].
pub fn routes(inst: &Instrumentation) -> Result<Router> {
    let channels: Vec<Value> = CHANNELS.iter().map(|c| Value::from(*c)).collect();

    let outcome = inst.count_binary("fraud", "score", None)?;
    let distribution = inst.hist_output("fraud_score", &SCORE_BUCKETS, &["score"])?;
    let by_channel = inst.count_feature("fraud", "channel", &channels)?;
    let amount = inst.gauge_feature("fraud_input", &["amount"])?;
    let scored = amount.wrap_async(by_channel.wrap_async(distribution.wrap_async(outcome.wrap_async(score))));

    let corrections = inst.count_false_binary_feedback("fraud_feedback", "feedback", None)?;
    let corrected = corrections.wrap_async(feedback);

    Ok(Router::new()
        .route("/v1/score", post(scored))
        .route("/v1/feedback", post(corrected)))
}
