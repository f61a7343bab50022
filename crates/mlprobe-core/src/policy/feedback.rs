use std::borrow::Cow;

use prometheus::IntCounter;
use serde_json::Value;

use super::{number, Policy, Side, Threshold};
use crate::error::{RecordError, Result};
use crate::registry::{MetricRegistry, MetricSpec};
use crate::search::search;

/// False-positive / false-negative counters fed by user feedback.
///
/// The feedback object carries `correctness` (negative when the prediction
/// was wrong) and `corrected_value` (the value the prediction should have
/// had). A wrong prediction whose corrected value is above the threshold was
/// a false negative, otherwise a false positive.
pub struct FeedbackBinary {
    feedback_key: String,
    threshold: Threshold,
    false_positive: IntCounter,
    false_negative: IntCounter,
}

impl FeedbackBinary {
    pub fn new(
        registry: &MetricRegistry,
        id: &str,
        feedback_key: &str,
        threshold_key: Option<&str>,
    ) -> Result<Self> {
        let false_positive =
            registry.counter(&MetricSpec::new(id, "fp", format!("Counter for false positive:{id}")))?;
        let false_negative =
            registry.counter(&MetricSpec::new(id, "fn", format!("Counter for false negative:{id}")))?;
        Ok(Self {
            feedback_key: feedback_key.to_string(),
            threshold: Threshold::from_key(threshold_key),
            false_positive,
            false_negative,
        })
    }
}

impl Policy for FeedbackBinary {
    fn side(&self) -> Side {
        Side::Request
    }

    fn record(&self, view: &Value) -> std::result::Result<(), RecordError> {
        let Some(feedback) = search(&self.feedback_key, view) else {
            tracing::trace!(key = %self.feedback_key, "feedback absent");
            return Ok(());
        };
        // Form-style hosts deliver the feedback object as JSON text.
        let feedback = match feedback {
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(parsed) => Cow::Owned(parsed),
                Err(_) => return Ok(()),
            },
            other => Cow::Borrowed(other),
        };
        let (Some(correctness), Some(corrected)) =
            (feedback.get("correctness"), feedback.get("corrected_value"))
        else {
            return Ok(());
        };
        let Some(threshold) = self.threshold.resolve(view)? else {
            return Ok(());
        };

        if number("correctness", correctness)? < 0.0 {
            if number("corrected_value", corrected)? > threshold {
                self.false_negative.inc();
            } else {
                self.false_positive.inc();
            }
        }
        Ok(())
    }
}
