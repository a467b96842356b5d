//! Failure injection: unreachable and unresponsive backends.

use std::time::{Duration, Instant};

use reqwest::StatusCode;

mod common;

#[tokio::test]
async fn test_unreachable_backend_returns_bad_gateway() {
    let backend = common::closed_port().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for_backend(backend)).await;

    let res = common::client()
        .get(format!("http://{}/predict", proxy))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .expect("Proxy should answer even when the backend is down");

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.text().await.unwrap(), "Upstream request failed");

    shutdown.trigger();
}

#[tokio::test]
async fn test_server_keeps_serving_after_backend_failure() {
    let backend = common::closed_port().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for_backend(backend)).await;
    let client = common::client();

    for _ in 0..3 {
        let res = client
            .post(format!("http://{}/predict_clipboard", proxy))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_silent_backend_returns_gateway_timeout() {
    let backend = common::start_silent_backend().await;
    let mut config = common::config_for_backend(backend);
    config.timeouts.request_secs = 1;
    let (proxy, shutdown) = common::start_proxy(config).await;

    let start = Instant::now();
    let res = common::client()
        .get(format!("http://{}/statistics", proxy))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .expect("Proxy should answer before the client timeout");

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(start.elapsed() < Duration::from_secs(5));

    shutdown.trigger();
}
