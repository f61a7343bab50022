#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use mlprobe_axum::{config, router};

fn app(yaml: &str) -> Router {
    let cfg = config::load_from_str(yaml).unwrap();
    router::build_router(&cfg).unwrap()
}

async fn scrape(app: &Router, path: &str) -> String {
    let res = app
        .clone()
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"), "{content_type}");
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

async fn post_json(app: &Router, path: &str, body: &str) -> StatusCode {
    let req = Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(req).await.unwrap().status()
}

fn sample(text: &str, name: &str) -> Option<f64> {
    text.lines()
        .filter(|l| !l.starts_with('#'))
        .find_map(|l| l.strip_prefix(name)?.strip_prefix(' ')?.parse().ok())
}

#[tokio::test]
async fn metrics_route_serves_exposition_text() {
    let app = app("version: 1\n");
    let text = scrape(&app, "/metrics").await;
    assert_eq!(sample(&text, "fraud_pos"), Some(0.0));
    assert_eq!(sample(&text, "mlprobe_recording_failures_total"), Some(0.0));
}

#[tokio::test]
async fn scoring_calls_update_metrics() {
    let app = app("version: 1\n");

    let status = post_json(
        &app,
        "/v1/score",
        r#"{"transaction_id": "t1", "amount": 9000.0, "channel": "web"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let status = post_json(
        &app,
        "/v1/score",
        r#"{"transaction_id": "t2", "amount": 12.0, "channel": "pos"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let text = scrape(&app, "/metrics").await;
    assert_eq!(sample(&text, "fraud_pos"), Some(1.0));
    assert_eq!(sample(&text, "fraud_neg"), Some(1.0));
    assert_eq!(sample(&text, "fraud_channel_web"), Some(1.0));
    assert_eq!(sample(&text, "fraud_channel_pos"), Some(1.0));
    assert_eq!(sample(&text, "fraud_channel_app"), Some(0.0));
    assert_eq!(sample(&text, "fraud_input_amount"), Some(12.0));
    assert_eq!(sample(&text, "fraud_score_score_count"), Some(2.0));
}

#[tokio::test]
async fn rejected_calls_record_nothing() {
    let app = app("version: 1\n");

    let status = post_json(
        &app,
        "/v1/score",
        r#"{"transaction_id": "t1", "amount": -1.0, "channel": "web"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let text = scrape(&app, "/metrics").await;
    assert_eq!(sample(&text, "fraud_pos"), Some(0.0));
    assert_eq!(sample(&text, "fraud_neg"), Some(0.0));
    assert_eq!(sample(&text, "fraud_score_score_count"), Some(0.0));
}

#[tokio::test]
async fn feedback_drives_error_counters() {
    let app = app("version: 1\n");

    for (correctness, corrected) in [(-1, 0.95), (-1, 0.05), (1, 0.9)] {
        let body = format!(
            r#"{{"transaction_id": "t", "feedback": {{"correctness": {correctness}, "corrected_value": {corrected}}}}}"#
        );
        assert_eq!(post_json(&app, "/v1/feedback", &body).await, StatusCode::OK);
    }

    let text = scrape(&app, "/metrics").await;
    assert_eq!(sample(&text, "fraud_feedback_fn"), Some(1.0));
    assert_eq!(sample(&text, "fraud_feedback_fp"), Some(1.0));
}

#[tokio::test]
async fn configured_path_and_namespace() {
    let app = app(
        r#"
version: 1
instrumentation:
  metrics_path: /internal/prometheus
  namespace: shop
"#,
    );

    let text = scrape(&app, "/internal/prometheus").await;
    assert_eq!(sample(&text, "shop_fraud_pos"), Some(0.0));

    let res = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
