#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use mlprobe_axum::config;
use mlprobe_core::{InstrumentError, RequestStyle};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
instrumentation:
  request_style: typed_args
  metric_path: /stats # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(matches!(err, InstrumentError::Config(_)));
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.server.listen, "0.0.0.0:8080");
    let settings = cfg.instrumentation.settings().unwrap();
    assert_eq!(settings.style, RequestStyle::TypedArgs);
    assert_eq!(settings.metrics_path, "/metrics");
    assert_eq!(settings.namespace, None);
}

#[test]
fn framework_aliases_are_accepted() {
    let cfg = config::load_from_str(
        r#"
version: 1
instrumentation:
  request_style: flask
  namespace: shop
"#,
    )
    .expect("must parse");
    let settings = cfg.instrumentation.settings().unwrap();
    assert_eq!(settings.style, RequestStyle::QueryForm);
    assert_eq!(settings.namespace.as_deref(), Some("shop"));
}

#[test]
fn unsupported_request_style_is_rejected() {
    let err = config::load_from_str(
        r#"
version: 1
instrumentation:
  request_style: django
"#,
    )
    .expect_err("must fail");
    assert!(matches!(err, InstrumentError::UnsupportedApp(kind) if kind == "django"));
}

#[test]
fn relative_metrics_path_is_rejected() {
    let err = config::load_from_str(
        r#"
version: 1
instrumentation:
  metrics_path: metrics
"#,
    )
    .expect_err("must fail");
    assert!(matches!(err, InstrumentError::Config(_)));
}

#[test]
fn bad_namespace_and_version_are_rejected() {
    let ns = config::load_from_str(
        r#"
version: 1
instrumentation:
  namespace: "9-lives"
"#,
    );
    assert!(matches!(ns, Err(InstrumentError::Config(_))));

    let version = config::load_from_str("version: 2\n");
    assert!(matches!(version, Err(InstrumentError::Config(_))));
}

#[test]
fn file_errors_name_the_file() {
    let missing = std::env::temp_dir().join("mlprobe-no-such-config.yaml");
    let err = config::load_from_file(&missing).expect_err("must fail");
    assert!(err.to_string().contains("mlprobe-no-such-config.yaml"), "{err}");

    let path = std::env::temp_dir().join(format!("mlprobe-config-{}.yaml", std::process::id()));
    std::fs::write(&path, "version: 3\n").unwrap();
    let err = config::load_from_file(&path).expect_err("must fail");
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(&err, InstrumentError::Config(msg) if msg.contains("unsupported config version 3")));
    assert!(err.to_string().contains(&path.display().to_string()), "{err}");
}

#[test]
fn file_round_trips_through_settings() {
    let path = std::env::temp_dir().join(format!("mlprobe-ok-{}.yaml", std::process::id()));
    std::fs::write(&path, "version: 1\ninstrumentation:\n  request_style: query_form\n").unwrap();
    let cfg = config::load_from_file(&path).expect("must load");
    std::fs::remove_file(&path).unwrap();
    assert_eq!(cfg.instrumentation.settings().unwrap().style, RequestStyle::QueryForm);
}
