//! Extractors and replies that expose handler data to mlprobe views.
//!
//! axum handlers receive typed extractors instead of a process-wide request
//! handle, so the view sources travel with the handler's argument:
//! - [`ParamsRequest`]: method, query string, urlencoded form body and path
//!   parameters, for form-style handlers.
//! - [`JsonArgs`]: a JSON body deserialized into typed call arguments.
//! - [`JsonReply`]: a JSON response the response view can read without
//!   re-parsing.

use std::borrow::Cow;
use std::collections::HashMap;
use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Form, FromRequest, FromRequestParts, Path, Query, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use mlprobe_core::{FieldView, Payload, RequestSource, ResponseSource, TransportRequest};

/// Raw request parameters. Never rejects: malformed parts come out empty.
#[derive(Debug, Clone, Default)]
pub struct ParamsRequest {
    /// Path parameters, delivered as call arguments.
    pub path: HashMap<String, String>,
    pub transport: TransportRequest,
}

impl ParamsRequest {
    /// First value of a query or form parameter, following the view rules.
    pub fn param(&self, name: &str) -> Option<String> {
        let params = self.transport.params();
        match params.get(name)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for ParamsRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        let path = Path::<HashMap<String, String>>::from_request_parts(&mut parts, state)
            .await
            .map(|Path(p)| p)
            .unwrap_or_default();
        let query = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "unparseable query string");
                Vec::new()
            });
        let mut transport = TransportRequest {
            method: parts.method.as_str().to_string(),
            query,
            form: Vec::new(),
        };

        if transport.is_write() {
            let req = Request::from_parts(parts, body);
            match Form::<Vec<(String, String)>>::from_request(req, state).await {
                Ok(Form(form)) => transport.form = form,
                Err(e) => tracing::debug!(error = %e, "no form body"),
            }
        }

        Ok(Self { path, transport })
    }
}

impl RequestSource for ParamsRequest {
    fn call_args(&self) -> FieldView {
        self.path
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }

    fn transport(&self) -> Option<Cow<'_, TransportRequest>> {
        Some(Cow::Borrowed(&self.transport))
    }
}

/// JSON body as typed call arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArgs<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonArgs<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = JsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl<T: Serialize> RequestSource for JsonArgs<T> {
    fn call_args(&self) -> FieldView {
        match serde_json::to_value(&self.0) {
            Ok(Value::Object(map)) => map,
            Ok(_) => FieldView::new(),
            Err(e) => {
                tracing::debug!(error = %e, "call arguments are not serializable");
                FieldView::new()
            }
        }
    }
}

/// JSON response readable by response-side decorators.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReply<T>(pub T);

impl<T: Serialize> IntoResponse for JsonReply<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

impl<T: Serialize> ResponseSource for JsonReply<T> {
    fn payload(&self) -> Option<Payload<'_>> {
        Some(match serde_json::to_value(&self.0) {
            Ok(Value::Object(map)) => Payload::Mapping(Cow::Owned(map)),
            Ok(other) => Payload::Body(Cow::Owned(other.to_string().into_bytes())),
            Err(e) => {
                tracing::debug!(error = %e, "reply is not serializable");
                Payload::Body(Cow::Owned(Vec::new()))
            }
        })
    }
}
