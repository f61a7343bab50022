//! Structured search vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use mlprobe_core::search;

use vector_loader::SearchVector;

fn load(name: &str) -> SearchVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

#[test]
fn search_vectors() {
    let files = [
        "search_top_level.json",
        "search_nested_first.json",
        "search_array.json",
        "search_missing.json",
        "search_scalar_root.json",
        "search_null_hit.json",
        "search_object_value.json",
    ];

    for f in files {
        let v = load(f);
        let found = search(&v.key, &v.doc);
        if v.expect.is_null() {
            assert!(found.is_none(), "vector={} found={:?}", v.description, found);
        } else {
            assert_eq!(found, Some(&v.expect), "vector={}", v.description);
        }
    }
}

#[test]
fn malformed_bodies_never_match() {
    for raw in ["", "{", "[1, 2", "\u{0}", "{\"score\": }"] {
        let doc = serde_json::from_str::<serde_json::Value>(raw).unwrap_or(serde_json::Value::Null);
        assert!(search("score", &doc).is_none(), "raw={raw:?}");
    }
}
