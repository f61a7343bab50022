#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use mlprobe_axum::{AxumHost, JsonReply, ParamsRequest};
use mlprobe_core::{Instrumentation, RequestStyle};

async fn predict(req: ParamsRequest) -> JsonReply<Value> {
    let size = req.param("size").unwrap_or_default();
    let proba = if size == "3" { 0.9 } else { 0.1 };
    JsonReply(json!({ "size": size, "result": { "proba": proba } }))
}

async fn by_user(req: ParamsRequest) -> JsonReply<Value> {
    JsonReply(json!({ "user": req.path.get("user") }))
}

fn app() -> (Router, Instrumentation) {
    let mut host = AxumHost::default();
    let inst = Instrumentation::new(&mut host, RequestStyle::QueryForm).unwrap();
    let sizes = [json!(1), json!(2), json!(3)];
    let counted = inst
        .count_feature("shirt", "size", &sizes)
        .unwrap()
        .wrap_async(inst.count_binary("shirt", "proba", None).unwrap().wrap_async(predict));
    let users = inst
        .count_feature("visits", "user", &[json!("ada")])
        .unwrap()
        .wrap_async(by_user);
    let router = host
        .into_router()
        .route("/predict", get(counted.clone()).post(counted))
        .route("/users/:user", get(users));
    (router, inst)
}

fn sample(inst: &Instrumentation, name: &str) -> Option<f64> {
    inst.render()
        .unwrap()
        .lines()
        .filter(|l| !l.starts_with('#'))
        .find_map(|l| l.strip_prefix(name)?.strip_prefix(' ')?.parse().ok())
}

async fn call(app: &Router, req: Request<Body>) -> Value {
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn query_string_feeds_request_view() {
    let (app, inst) = app();
    let out = call(&app, Request::get("/predict?size=3&size=1").body(Body::empty()).unwrap()).await;
    assert_eq!(out["size"], "3");
    assert_eq!(sample(&inst, "shirt_size_3"), Some(1.0));
    assert_eq!(sample(&inst, "shirt_size_1"), Some(0.0));
    assert_eq!(sample(&inst, "shirt_pos"), Some(1.0));
}

#[tokio::test]
async fn form_body_feeds_request_view_on_post() {
    let (app, inst) = app();
    let req = Request::post("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("size=2"))
        .unwrap();
    call(&app, req).await;
    assert_eq!(sample(&inst, "shirt_size_2"), Some(1.0));
    assert_eq!(sample(&inst, "shirt_neg"), Some(1.0));
}

#[tokio::test]
async fn query_wins_over_form_body() {
    let (app, inst) = app();
    let req = Request::post("/predict?size=1")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("size=3"))
        .unwrap();
    let out = call(&app, req).await;
    assert_eq!(out["size"], "1");
    assert_eq!(sample(&inst, "shirt_size_1"), Some(1.0));
    assert_eq!(sample(&inst, "shirt_size_3"), Some(0.0));
}

#[tokio::test]
async fn missing_parameters_record_nothing() {
    let (app, inst) = app();
    call(&app, Request::get("/predict").body(Body::empty()).unwrap()).await;
    for name in ["shirt_size_1", "shirt_size_2", "shirt_size_3"] {
        assert_eq!(sample(&inst, name), Some(0.0), "{name}");
    }
    // The handler still answers, so the output side records.
    assert_eq!(sample(&inst, "shirt_neg"), Some(1.0));
}

#[tokio::test]
async fn path_parameters_take_precedence() {
    let (app, inst) = app();
    let out = call(&app, Request::get("/users/ada?user=bob").body(Body::empty()).unwrap()).await;
    assert_eq!(out["user"], "ada");
    assert_eq!(sample(&inst, "visits_user_ada"), Some(1.0));
}
