//! Request/response views.
//!
//! A view is the uniform key-value shape decorators read from. Requests become
//! a flat [`FieldView`]; responses become a JSON document. Which adapter pair
//! is used depends on the [`RequestStyle`] picked when the instrumentation is
//! built.

use std::borrow::Cow;
use std::str::FromStr;

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::InstrumentError;

/// Flat field name → value mapping for a single call.
pub type FieldView = Map<String, Value>;

/// How the hosting framework hands parameters to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStyle {
    /// Handlers read query/form parameters from the transport request.
    QueryForm,
    /// Handlers receive already-typed arguments.
    TypedArgs,
}

impl RequestStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStyle::QueryForm => "query_form",
            RequestStyle::TypedArgs => "typed_args",
        }
    }

    /// Build the request-side view.
    pub fn request_view<A: RequestSource + ?Sized>(self, args: &A) -> FieldView {
        match self {
            RequestStyle::QueryForm => {
                let call_args = args.call_args();
                if !call_args.is_empty() {
                    return call_args;
                }
                args.transport().map(|t| t.params()).unwrap_or_default()
            }
            RequestStyle::TypedArgs => args.call_args(),
        }
    }

    /// Build the response-side view. Unparseable bodies become `null`.
    pub fn response_view(self, payload: Payload<'_>) -> Value {
        match (self, payload) {
            (RequestStyle::TypedArgs, Payload::Mapping(map)) => Value::Object(map.into_owned()),
            (RequestStyle::TypedArgs, Payload::Body(body)) => parse_body(&body),
            (RequestStyle::QueryForm, payload) => match std::str::from_utf8(&payload.into_body()) {
                Ok(text) => parse_text(text),
                Err(e) => {
                    tracing::debug!(error = %e, "response body is not utf-8");
                    Value::Null
                }
            },
        }
    }
}

impl FromStr for RequestStyle {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query_form" | "flask" => Ok(RequestStyle::QueryForm),
            "typed_args" | "fastapi" => Ok(RequestStyle::TypedArgs),
            other => Err(InstrumentError::UnsupportedApp(other.to_string())),
        }
    }
}

fn parse_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "response body is not json");
        Value::Null
    })
}

fn parse_text(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "response body is not json");
        Value::Null
    })
}

/// Transport-level view of an inbound request.
#[derive(Debug, Clone, Default)]
pub struct TransportRequest {
    /// Upper-case method verb.
    pub method: String,
    /// Query string pairs, in order.
    pub query: Vec<(String, String)>,
    /// Form body pairs, in order.
    pub form: Vec<(String, String)>,
}

impl TransportRequest {
    /// Whether the verb carries a body (`POST`, `PUT`, `PATCH`).
    pub fn is_write(&self) -> bool {
        matches!(self.method.to_ascii_uppercase().as_str(), "POST" | "PUT" | "PATCH")
    }

    /// Flatten parameters; the first value per name wins, query before body.
    pub fn params(&self) -> FieldView {
        let body: &[(String, String)] = if self.is_write() { &self.form } else { &[] };
        let mut out = FieldView::new();
        for (k, v) in self.query.iter().chain(body) {
            if !out.contains_key(k) {
                out.insert(k.clone(), Value::String(v.clone()));
            }
        }
        out
    }
}

/// Anything a wrapped handler takes as its argument.
pub trait RequestSource {
    /// Named arguments delivered to the handler.
    fn call_args(&self) -> FieldView;

    /// The raw transport request, when the host exposes one.
    fn transport(&self) -> Option<Cow<'_, TransportRequest>> {
        None
    }
}

impl RequestSource for () {
    fn call_args(&self) -> FieldView {
        FieldView::new()
    }
}

impl RequestSource for FieldView {
    fn call_args(&self) -> FieldView {
        self.clone()
    }
}

impl RequestSource for Value {
    fn call_args(&self) -> FieldView {
        match self {
            Value::Object(map) => map.clone(),
            _ => FieldView::new(),
        }
    }
}

impl RequestSource for TransportRequest {
    fn call_args(&self) -> FieldView {
        FieldView::new()
    }

    fn transport(&self) -> Option<Cow<'_, TransportRequest>> {
        Some(Cow::Borrowed(self))
    }
}

impl<A: RequestSource, B: RequestSource> RequestSource for (A, B) {
    fn call_args(&self) -> FieldView {
        let mut out = self.0.call_args();
        for (k, v) in self.1.call_args() {
            out.entry(k).or_insert(v);
        }
        out
    }

    fn transport(&self) -> Option<Cow<'_, TransportRequest>> {
        self.0.transport().or_else(|| self.1.transport())
    }
}

/// What a handler result offers to the response view.
#[derive(Debug, Clone)]
pub enum Payload<'a> {
    /// An already-structured key-value result.
    Mapping(Cow<'a, FieldView>),
    /// A serialized body.
    Body(Cow<'a, [u8]>),
}

impl<'a> Payload<'a> {
    /// Serialized form of the payload.
    pub fn into_body(self) -> Cow<'a, [u8]> {
        match self {
            Payload::Body(b) => b,
            Payload::Mapping(map) => Cow::Owned(Value::Object(map.into_owned()).to_string().into_bytes()),
        }
    }
}

/// Anything a wrapped handler returns.
pub trait ResponseSource {
    /// `None` when the handler failed; nothing is recorded for that call.
    fn payload(&self) -> Option<Payload<'_>>;
}

impl ResponseSource for FieldView {
    fn payload(&self) -> Option<Payload<'_>> {
        Some(Payload::Mapping(Cow::Borrowed(self)))
    }
}

impl ResponseSource for Value {
    fn payload(&self) -> Option<Payload<'_>> {
        Some(match self {
            Value::Object(map) => Payload::Mapping(Cow::Borrowed(map)),
            other => Payload::Body(Cow::Owned(other.to_string().into_bytes())),
        })
    }
}

impl ResponseSource for String {
    fn payload(&self) -> Option<Payload<'_>> {
        Some(Payload::Body(Cow::Borrowed(self.as_bytes())))
    }
}

impl ResponseSource for &'static str {
    fn payload(&self) -> Option<Payload<'_>> {
        Some(Payload::Body(Cow::Borrowed(self.as_bytes())))
    }
}

impl ResponseSource for Vec<u8> {
    fn payload(&self) -> Option<Payload<'_>> {
        Some(Payload::Body(Cow::Borrowed(self.as_slice())))
    }
}

impl ResponseSource for Bytes {
    fn payload(&self) -> Option<Payload<'_>> {
        Some(Payload::Body(Cow::Borrowed(&self[..])))
    }
}

impl<T: ResponseSource, E> ResponseSource for Result<T, E> {
    fn payload(&self) -> Option<Payload<'_>> {
        self.as_ref().ok().and_then(|body| body.payload())
    }
}
