use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use csp_collector::{app, handler, sink::MemorySink};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

fn app_with(config: handler::HandlerConfig) -> (Router, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let handler = handler::ViolationReportHandler::new(config, sink.clone());
    (app::build_router(handler, "/_healthcheck", 64 * 1024), sink)
}

fn app() -> (Router, Arc<MemorySink>) {
    app_with(handler::HandlerConfig::default())
}

fn report(document_uri: &str, blocked_uri: &str) -> String {
    json!({
        "csp-report": {
            "document-uri": document_uri,
            "blocked-uri": blocked_uri,
        }
    })
    .to_string()
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/csp-report")
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn disallowed_methods_return_405_without_logging() {
    for method in ["GET", "DELETE", "PUT", "TRACE", "PATCH"] {
        for uri in ["/", "/blah"] {
            let (app, sink) = app();
            let resp = app
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
            assert!(sink.lines().is_empty());
        }
    }
}

#[tokio::test]
async fn first_metadata_parameter_is_logged() {
    for repeats in [1, 2] {
        let (app, sink) = app();
        let mut uri = "/?".to_string();
        for i in 0..repeats {
            uri.push_str(&format!("metadata=value{i}&"));
        }

        let resp = app
            .oneshot(post(&uri, report("http://example.com", "http://example.com")))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let log = sink.contents();
        assert!(log.contains("metadata=value0"), "{log}");
        assert!(!log.contains("metadata=value1"), "{log}");
    }
}

#[tokio::test]
async fn metadata_object_logs_every_parameter() {
    let (app, sink) = app_with(handler::HandlerConfig {
        metadata_object: true,
        ..Default::default()
    });

    let resp = app
        .oneshot(post(
            "/path?c=d&a=b",
            report("http://example.com", "http://example.com"),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let log = sink.contents();
    assert!(log.contains("a=b"), "{log}");
    assert!(log.contains("c=d"), "{log}");
    assert!(log.contains("metadata=\"{a=b, c=d}\""), "{log}");
}

#[tokio::test]
async fn path_is_logged_without_query() {
    let (app, sink) = app();

    let resp = app
        .oneshot(post(
            "/deep/link?tag=x&path=/other",
            report("http://example.com", "http://example.com"),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let log = sink.contents();
    assert!(log.contains("path=/deep/link "), "{log}");
}

#[tokio::test]
async fn status_code_accepts_string_and_number() {
    for status_code in [json!("200"), json!(200)] {
        let (app, sink) = app();
        let body = json!({
            "csp-report": {
                "document-uri": "https://example.com",
                "status-code": status_code,
            }
        })
        .to_string();

        let resp = app.oneshot(post("/", body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(sink.contents().contains("status_code=200"));
    }
}

#[tokio::test]
async fn malformed_body_returns_400_and_server_keeps_serving() {
    let (app, sink) = app();

    for body in ["", "{\"csp-report\": {", "[]", "{\"other\": {}}"] {
        let resp = app.clone().oneshot(post("/", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body:?}");
    }

    let resp = app
        .oneshot(post("/", report("https://example.com", "https://cdn.example/a.js")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(1, sink.lines().len());
}

#[tokio::test]
async fn noise_and_bad_document_uri_are_accepted_but_not_logged() {
    let (app, sink) = app();

    for body in [
        report("https://example.com", "chrome-extension://abc/content.js"),
        report("https://example.com", "about:blank"),
        report("about", "https://cdn.example/a.js"),
    ] {
        let resp = app.clone().oneshot(post("/", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn truncation_applies_to_logged_uris() {
    let (app, sink) = app_with(handler::HandlerConfig {
        truncate_query_string_fragment: true,
        ..Default::default()
    });

    let resp = app
        .oneshot(post(
            "/",
            report("https://example.com/page?session=1", "https://cdn.example/a.js?v=2#x"),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let log = sink.contents();
    assert!(log.contains("document_uri=https://example.com/page "), "{log}");
    assert!(log.contains("blocked_uri=https://cdn.example/a.js "), "{log}");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let sink = Arc::new(MemorySink::new());
    let handler = handler::ViolationReportHandler::new(Default::default(), sink.clone());
    let app = app::build_router(handler, "/_healthcheck", 16);

    let resp = app
        .oneshot(post("/", report("https://example.com", "https://cdn.example/a.js")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn health_check_returns_ok() {
    let (app, sink) = app();

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/_healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = http_body_util::BodyExt::collect(resp.into_body())
        .await
        .unwrap();
    assert_eq!(&body.to_bytes()[..], b"ok");
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn null_report_fields_are_accepted() {
    let (app, sink) = app();
    let body = json!({
        "csp-report": {
            "document-uri": "https://example.com",
            "referrer": null,
            "blocked-uri": "https://cdn.example/a.js",
        }
    })
    .to_string();

    let resp = app.oneshot(post("/", body)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let lines = sink.lines();
    assert_eq!(1, lines.len());
    assert!(lines[0].contains("referrer= "), "{}", lines[0]);
}

#[tokio::test]
async fn health_check_path_passes_reports_to_handler() {
    let (app, sink) = app();

    let resp = app
        .clone()
        .oneshot(post(
            "/_healthcheck",
            report("https://example.com", "https://cdn.example/a.js"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(sink.contents().contains("path=/_healthcheck "));

    let resp = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/_healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(1, sink.lines().len());
}
