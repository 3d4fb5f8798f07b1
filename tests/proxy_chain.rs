//! `/proxy/<hostport>/...` hops across chained instances.

use std::time::Duration;

use axum::http::StatusCode;
use httpmole::config::MoleConfig;
use httpmole::http::HOP_ELAPSED_HEADER;

mod common;

#[tokio::test]
async fn test_single_hop_keeps_query() {
    let backend = common::start_echo_backend().await;
    let mole = common::start_mole(MoleConfig::default()).await;

    let res = common::client()
        .get(mole.url(&format!("/proxy/{}/search?q=mole&page=2", backend)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(HOP_ELAPSED_HEADER.as_str()).is_none());
    assert_eq!(res.text().await.unwrap(), "/search?q=mole&page=2");

    mole.stop().await;
}

#[tokio::test]
async fn test_chain_of_two_instances() {
    let backend = common::start_echo_backend().await;

    // The last instance would answer 418 on its own; it must hop instead.
    let mut tail_config = MoleConfig::default();
    tail_config.response.status = 418;
    let tail = common::start_mole(tail_config).await;

    let mut head_config = MoleConfig::default();
    head_config.response.status = 418;
    let head = common::start_mole(head_config).await;

    let path = format!("/proxy/{}/proxy/{}/deep/path", tail.addr, backend);
    let res = common::client().get(head.url(&path)).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-backend"], "echo");
    assert_eq!(res.text().await.unwrap(), "/deep/path");

    assert!(head.traffic().await.contains(&format!(" GET {}\n", path)));
    assert!(tail
        .traffic()
        .await
        .contains(&format!(" GET /proxy/{}/deep/path\n", backend)));

    head.stop().await;
    tail.stop().await;
}

#[tokio::test]
async fn test_hop_timing_header_with_delay() {
    let backend = common::start_echo_backend().await;
    let mut config = MoleConfig::default();
    config.dispatch.delay_ms = 20;
    let mole = common::start_mole(config).await;
    let client = common::client();

    let res = client
        .get(mole.url(&format!("/proxy/{}/timed", backend)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let elapsed = res.headers()[HOP_ELAPSED_HEADER.as_str()]
        .to_str()
        .unwrap()
        .parse::<u64>()
        .unwrap();
    assert!(elapsed < Duration::from_secs(5).as_millis() as u64);

    // Direct requests never carry the header.
    let res = client.get(mole.url("/timed")).send().await.unwrap();
    assert!(res.headers().get(HOP_ELAPSED_HEADER.as_str()).is_none());

    mole.stop().await;
}

#[tokio::test]
async fn test_empty_hop_target_falls_through() {
    let mut config = MoleConfig::default();
    config.response.status = 204;
    let mole = common::start_mole(config).await;
    let client = common::client();

    for path in ["/proxy", "/proxy/"] {
        let res = client.get(mole.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT, "{}", path);
    }

    mole.stop().await;
}

#[tokio::test]
async fn test_unreachable_hop_is_bad_gateway() {
    let mole = common::start_mole(MoleConfig::default()).await;

    let res = common::client()
        .get(mole.url("/proxy/127.0.0.1:1/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    mole.stop().await;
}
