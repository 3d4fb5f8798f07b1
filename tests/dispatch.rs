//! End-to-end tests for the three responders and the logging pipeline.

use std::time::Duration;

use axum::http::StatusCode;
use httpmole::config::MoleConfig;

mod common;

#[tokio::test]
async fn test_static_response() {
    let mut config = MoleConfig::default();
    config.response.status = 300;
    config.response.headers = vec!["key:value".into()];
    let mole = common::start_mole(config).await;

    let res = common::client()
        .post(mole.url("/anything"))
        .body(r#"{"a":1}"#)
        .send()
        .await
        .expect("mole unreachable");

    assert_eq!(res.status(), StatusCode::MULTIPLE_CHOICES);
    assert_eq!(res.headers()["key"], "value");
    assert_eq!(res.text().await.unwrap(), "");

    mole.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_file_response_follows_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("response.json");
    std::fs::write(
        &path,
        r#"{"status_code": 201, "headers": {"x-version": "1"}, "body": {"id": "abc123"}}"#,
    )
    .unwrap();

    let mut config = MoleConfig::default();
    config.response.file = Some(path.clone());
    let mole = common::start_mole(config).await;
    let client = common::client();

    let res = client.get(mole.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["x-version"], "1");
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.text().await.unwrap(), r#"{"id": "abc123"}"#);

    std::fs::write(&path, r#"{"status_code": 403, "body": "denied"}"#).unwrap();

    let url = mole.url("/");
    let reloaded = common::eventually(Duration::from_secs(10), || {
        let client = client.clone();
        let url = url.clone();
        async move {
            match client.get(&url).send().await {
                Ok(res) if res.status() == StatusCode::FORBIDDEN => {
                    res.text().await.map(|body| body == "denied").unwrap_or(false)
                }
                _ => false,
            }
        }
    })
    .await;
    assert!(reloaded, "response file change was not picked up");

    mole.stop().await;
}

#[tokio::test]
async fn test_invalid_response_file_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("response.json");
    std::fs::write(&path, r#"{"status_code": 42}"#).unwrap();

    let mut config = MoleConfig::default();
    config.response.file = Some(path);
    let mole = common::start_mole(config).await;

    let res = common::client().get(mole.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    mole.stop().await;
}

#[tokio::test]
async fn test_forward_response() {
    let backend = common::start_echo_backend().await;

    let mut config = MoleConfig::default();
    config.response.from = Some(backend.to_string());
    let mole = common::start_mole(config).await;

    let res = common::client()
        .get(mole.url("/users/7?expand=true"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-backend"], "echo");
    assert_eq!(res.text().await.unwrap(), "/users/7?expand=true");

    mole.stop().await;
}

#[tokio::test]
async fn test_unreachable_forward_target_is_bad_gateway() {
    let mut config = MoleConfig::default();
    // Nothing listens on port 1.
    config.response.from = Some("127.0.0.1:1".into());
    let mole = common::start_mole(config).await;

    let res = common::client().get(mole.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    mole.stop().await;
}

#[tokio::test]
async fn test_traffic_log_records_request_and_response() {
    let mut config = MoleConfig::default();
    config.response.status = 202;
    config.response.headers = vec!["x-mole:yes".into()];
    config.logging.log_response = true;
    let mole = common::start_mole(config).await;

    let res = common::client()
        .put(mole.url("/orders/1?dry_run=1"))
        .header("content-type", "application/json")
        .body(r#"{ "qty" : 2 }"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let logged = mole.traffic().await;
    assert!(logged.contains(" PUT /orders/1?dry_run=1\n"), "{}", logged);
    assert!(logged.contains(" > content-type: application/json\n"), "{}", logged);
    assert!(logged.contains("\n\n{ \"qty\" : 2 }\n\n"), "{}", logged);
    assert!(logged.ends_with("202 Accepted\n > x-mole: yes\n\n"), "{}", logged);

    mole.stop().await;
}

#[tokio::test]
async fn test_long_bodies_are_only_cut_in_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("response.json");
    std::fs::write(&path, r#"{"status_code": 200, "body": "a response body longer than sixteen bytes"}"#)
        .unwrap();

    let mut config = MoleConfig::default();
    config.response.file = Some(path);
    config.dispatch.max_body_bytes = 16;
    config.logging.log_response = true;
    let mole = common::start_mole(config).await;
    let client = common::client();

    let res = client.get(mole.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "a response body longer than sixteen bytes");

    let res = client
        .post(mole.url("/upload"))
        .body("0123456789abcdef0123456789abcdef")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let logged = mole.traffic().await;
    assert!(logged.contains("\n\n0123456789abcdef\n[16 more bytes not shown]\n\n"), "{}", logged);
    assert!(logged.contains("more bytes not shown]\n\n200 OK\n"), "{}", logged);

    mole.stop().await;
}

#[tokio::test]
async fn test_log_filter_skips_unselected_requests() {
    let mut config = MoleConfig::default();
    config.logging.filter_path = Some("^/api/".into());
    let mole = common::start_mole(config).await;
    let client = common::client();

    client.get(mole.url("/health")).send().await.unwrap();
    client.get(mole.url("/api/items")).send().await.unwrap();

    let logged = mole.traffic().await;
    assert!(!logged.contains("/health"), "{}", logged);
    assert!(logged.contains(" GET /api/items\n"), "{}", logged);

    mole.stop().await;
}

#[tokio::test]
async fn test_delay_applies_to_each_request() {
    let mut config = MoleConfig::default();
    config.dispatch.delay_ms = 200;
    let mole = common::start_mole(config).await;

    let start = std::time::Instant::now();
    let res = common::client().get(mole.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(start.elapsed() >= Duration::from_millis(200));

    mole.stop().await;
}
