//! Decorator engine: call the handler, then observe.
//!
//! Every decorator follows the same flow:
//! 1. build the request view (only when the policy reads the request), since
//!    the handler consumes its argument;
//! 2. call the handler and keep its result;
//! 3. if the handler succeeded, build the response view when needed and run
//!    the policy;
//! 4. hand back the handler's result untouched.
//!
//! Panics and `Err` results from the handler pass straight through and record
//! nothing. Recording failures are logged and counted, never returned.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use prometheus::IntCounter;
use serde_json::Value;

use crate::policy::{Policy, Side};
use crate::view::{FieldView, RequestSource, RequestStyle, ResponseSource};

/// A configured decorator. Cheap to clone; clones share metrics.
#[derive(Clone)]
pub struct Decorator {
    inner: Arc<DecoratorInner>,
}

struct DecoratorInner {
    id: String,
    style: RequestStyle,
    policy: Arc<dyn Policy>,
    failures: IntCounter,
}

impl Decorator {
    pub fn new(id: &str, style: RequestStyle, policy: Arc<dyn Policy>, failures: IntCounter) -> Self {
        Self {
            inner: Arc::new(DecoratorInner {
                id: id.to_string(),
                style,
                policy,
                failures,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Request view for this call, if the policy needs one.
    pub fn request_view<A: RequestSource + ?Sized>(&self, args: &A) -> Option<FieldView> {
        (self.inner.policy.side() == Side::Request).then(|| self.inner.style.request_view(args))
    }

    /// Run the policy against a finished call.
    pub fn record<R: ResponseSource + ?Sized>(&self, request_view: Option<FieldView>, outcome: &R) {
        let Some(payload) = outcome.payload() else {
            tracing::trace!(decorator = %self.inner.id, "handler failed, nothing recorded");
            return;
        };
        let view = match (self.inner.policy.side(), request_view) {
            (Side::Request, Some(fields)) => Value::Object(fields),
            (Side::Request, None) => return,
            (Side::Response, _) => self.inner.style.response_view(payload),
        };
        if let Err(e) = self.inner.policy.record(&view) {
            self.inner.failures.inc();
            tracing::warn!(decorator = %self.inner.id, error = %e, "metric recording failed");
        }
    }

    /// Wrap a synchronous handler.
    pub fn wrap<A, R, F>(&self, handler: F) -> impl Fn(A) -> R + Clone
    where
        A: RequestSource,
        R: ResponseSource,
        F: Fn(A) -> R + Clone,
    {
        let this = self.clone();
        move |args: A| {
            let request_view = this.request_view(&args);
            let outcome = handler(args);
            this.record(request_view, &outcome);
            outcome
        }
    }

    /// Wrap an async handler. The result is itself a valid handler, so
    /// decorators stack and the wrapper can be mounted on an axum route.
    pub fn wrap_async<A, R, F, Fut>(&self, handler: F) -> impl Fn(A) -> BoxFuture<'static, R> + Clone + Send + Sync + 'static
    where
        A: RequestSource + Send + 'static,
        R: ResponseSource + Send + 'static,
        F: Fn(A) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let this = self.clone();
        move |args: A| {
            let this = this.clone();
            let request_view = this.request_view(&args);
            let pending = handler(args);
            async move {
                let outcome = pending.await;
                this.record(request_view, &outcome);
                outcome
            }
            .boxed()
        }
    }
}
