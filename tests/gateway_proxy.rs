//! End-to-end tests: dashboard request → gateway → mock diagnostics API.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

mod common;

use common::{
    client, config_for, start_gateway, start_mock_backend, start_programmable_backend, MockReply,
};

#[tokio::test]
async fn test_dns_lookup_is_forwarded_with_api_key() {
    let (backend, mut seen) =
        start_mock_backend(MockReply::json(200, r#"{"hostname":"example.com","ip":"93.184.216.34"}"#)).await;
    let gateway = start_gateway(config_for(backend)).await;

    let res = client()
        .get(gateway.url("/api-proxy.php?endpoint=dns&pathParam=example.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert!(res.headers().contains_key("x-request-id"));

    let captured = seen.recv().await.unwrap();
    assert_eq!(captured.method, "GET");
    assert_eq!(captured.target, "/api/dns/example.com");
    assert_eq!(captured.header("x-api-key"), Some("test-key"));
    assert_eq!(captured.header("content-type"), Some("application/json"));
    assert_eq!(
        captured.header("x-request-id"),
        res.headers()["x-request-id"].to_str().ok()
    );

    assert_eq!(
        res.text().await.unwrap(),
        r#"{"hostname":"example.com","ip":"93.184.216.34"}"#
    );
}

#[tokio::test]
async fn test_body_and_status_pass_through_unchanged() {
    let (backend, _seen) = start_mock_backend(MockReply::json(200, r#"{"status":"OK"}"#)).await;
    let gateway = start_gateway(config_for(backend)).await;

    let res = client()
        .get(gateway.url("/api-proxy.php?endpoint=healthcheck"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(&res.bytes().await.unwrap()[..], br#"{"status":"OK"}"#);
}

#[tokio::test]
async fn test_endpoint_defaults_and_api_prefix_is_not_duplicated() {
    let (backend, mut seen) = start_mock_backend(MockReply::json(200, "{}")).await;
    let gateway = start_gateway(config_for(backend)).await;
    let client = client();

    for query in ["", "?endpoint=healthcheck", "?endpoint=%2Fapi%2Fhealthcheck"] {
        let res = client
            .get(gateway.url(&format!("/api-proxy{}", query)))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "query {:?}", query);
        assert_eq!(seen.recv().await.unwrap().target, "/api/healthcheck");
    }
}

#[tokio::test]
async fn test_remaining_query_parameters_are_forwarded() {
    let (backend, mut seen) = start_mock_backend(MockReply::json(200, "{}")).await;
    let gateway = start_gateway(config_for(backend)).await;

    let res = client()
        .get(gateway.url("/api-proxy.php"))
        .query(&[
            ("endpoint", "curl"),
            ("url", "https://example.com/a b?x=1&y=2"),
            ("trace", "on"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let captured = seen.recv().await.unwrap();
    assert_eq!(captured.path(), "/api/curl");

    let forwarded: BTreeMap<String, String> =
        url::form_urlencoded::parse(captured.query().unwrap().as_bytes())
            .into_owned()
            .collect();
    let expected: BTreeMap<String, String> = [
        ("url".to_string(), "https://example.com/a b?x=1&y=2".to_string()),
        ("trace".to_string(), "on".to_string()),
    ]
    .into();
    assert_eq!(forwarded, expected);
}

#[tokio::test]
async fn test_path_param_is_encoded_and_removed_from_query() {
    let (backend, mut seen) = start_mock_backend(MockReply::json(200, "{}")).await;
    let gateway = start_gateway(config_for(backend)).await;

    client()
        .get(gateway.url("/api-proxy.php"))
        .query(&[("endpoint", "/api/dns"), ("pathParam", "bad host/x")])
        .send()
        .await
        .unwrap();

    let captured = seen.recv().await.unwrap();
    assert_eq!(captured.target, "/api/dns/bad%20host%2Fx");
    assert_eq!(captured.query(), None);
}

#[tokio::test]
async fn test_backend_error_is_passed_through() {
    let body = r#"{"detail":"Database connection failed"}"#;
    let (backend, _seen) = start_mock_backend(MockReply::json(500, body)).await;
    let gateway = start_gateway(config_for(backend)).await;

    let res = client()
        .get(gateway.url("/api-proxy.php?endpoint=sqlversion"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), body);
}

#[tokio::test]
async fn test_unreachable_backend_returns_502_json() {
    let gateway = start_gateway(config_for(common::closed_port().await)).await;

    let res = client()
        .get(gateway.url("/api-proxy.php?endpoint=ip"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.headers()["content-type"], "application/json");
    let json: Value = res.json().await.unwrap();
    let message = json["error"].as_str().unwrap();
    assert!(message.starts_with("Upstream request failed"), "{}", message);

    // the gateway keeps serving after a transport failure
    let again = client()
        .get(gateway.url("/api-proxy.php?endpoint=ip"))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_slow_backend_times_out_with_504() {
    let (backend, _seen) = start_mock_backend(MockReply {
        delay: Duration::from_secs(3),
        ..MockReply::json(200, "{}")
    })
    .await;
    let mut config = config_for(backend);
    config.timeouts.request_secs = 1;
    let gateway = start_gateway(config).await;

    let res = client()
        .get(gateway.url("/api-proxy.php?endpoint=pi&digits=100000"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["error"], "Upstream request timed out after 1s");
}

#[tokio::test]
async fn test_unknown_endpoint_is_rejected_without_outbound_call() {
    let (backend, mut seen) = start_mock_backend(MockReply::json(200, "{}")).await;
    let gateway = start_gateway(config_for(backend)).await;

    let res = client()
        .get(gateway.url("/api-proxy.php?endpoint=..%2F..%2Finternal"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["error"], "Unknown endpoint: ../../internal");
    assert!(seen.try_recv().is_err());
}

#[tokio::test]
async fn test_lenient_mode_reaches_unlisted_endpoints() {
    let (backend, mut seen) = start_mock_backend(MockReply::json(200, "{}")).await;
    let mut config = config_for(backend);
    config.endpoints.strict = false;
    let gateway = start_gateway(config).await;

    let res = client()
        .get(gateway.url("/api-proxy.php?endpoint=debug%2Fvars&pathParam=a+b"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(seen.recv().await.unwrap().target, "/api/debug/vars/a+b");
}

#[tokio::test]
async fn test_prefix_mount_relays_backend_headers() {
    let (backend, mut seen) = start_mock_backend(MockReply {
        content_type: "text/plain; charset=utf-8",
        ..MockReply::json(200, "10.0.0.1 -> host.internal")
    })
    .await;
    let gateway = start_gateway(config_for(backend)).await;

    let res = client()
        .get(gateway.url("/api/reversedns/10.0.0.1?verbose=1"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert_eq!(res.text().await.unwrap(), "10.0.0.1 -> host.internal");

    let captured = seen.recv().await.unwrap();
    assert_eq!(captured.target, "/api/reversedns/10.0.0.1?verbose=1");
    assert_eq!(captured.header("x-api-key"), Some("test-key"));
    assert_eq!(captured.header("content-type"), None);
}

#[tokio::test]
async fn test_unmatched_path_returns_not_found_json() {
    let (backend, mut seen) = start_mock_backend(MockReply::json(200, "{}")).await;
    let gateway = start_gateway(config_for(backend)).await;

    let res = client().get(gateway.url("/index.php")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json, serde_json::json!({"error": "Not Found"}));
    assert!(seen.try_recv().is_err());
}

#[tokio::test]
async fn test_reload_changes_injected_api_key() {
    let (backend, mut seen) = start_mock_backend(MockReply::json(200, "{}")).await;
    let config = config_for(backend);
    let gateway = start_gateway(config.clone()).await;
    let client = client();
    let url = gateway.url("/api-proxy.php?endpoint=printenv");

    client.get(&url).send().await.unwrap();
    assert_eq!(seen.recv().await.unwrap().header("x-api-key"), Some("test-key"));

    let mut rotated = config;
    rotated.backend.api_key = "rotated-key".into();
    gateway.updates.send(rotated).unwrap();

    let mut last_key = None;
    for _ in 0..40 {
        client.get(&url).send().await.unwrap();
        last_key = seen.recv().await.unwrap().header("x-api-key").map(str::to_string);
        if last_key.as_deref() == Some("rotated-key") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(last_key.as_deref(), Some("rotated-key"));
}

#[tokio::test]
async fn test_one_outbound_call_per_inbound_call() {
    let (backend, mut seen) = start_mock_backend(MockReply::json(200, "{}")).await;
    let gateway = start_gateway(config_for(backend)).await;
    let client = client();

    let concurrency = 20;
    let mut tasks = Vec::new();
    for i in 0..concurrency {
        let client = client.clone();
        let url = gateway.url(&format!("/api-proxy.php?endpoint=pi&digits={}", i));
        tasks.push(tokio::spawn(async move { client.get(&url).send().await }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap().status(), StatusCode::OK);
    }

    let mut digits = Vec::new();
    while let Ok(captured) = seen.try_recv() {
        digits.push(captured.query().unwrap().to_string());
    }
    digits.sort();
    digits.dedup();
    assert_eq!(digits.len(), concurrency);
}

#[tokio::test]
async fn test_reloaded_timeout_covers_slow_backend() {
    let (backend, mut seen) = start_programmable_backend(|req| async move {
        let delay = if req.target.contains("slow") {
            Duration::from_secs(7)
        } else {
            Duration::ZERO
        };
        MockReply {
            delay,
            ..MockReply::json(200, r#"{"status":"OK"}"#)
        }
    })
    .await;
    let mut config = config_for(backend);
    config.timeouts.request_secs = 1;
    let gateway = start_gateway(config.clone()).await;
    let client = client();

    let mut raised = config;
    raised.timeouts.request_secs = 10;
    raised.backend.api_key = "reloaded-key".into();
    gateway.updates.send(raised).unwrap();

    // wait until the new revision is serving
    let fast = gateway.url("/api-proxy.php?endpoint=healthcheck");
    let mut applied = false;
    for _ in 0..40 {
        client.get(&fast).send().await.unwrap();
        if seen.recv().await.unwrap().header("x-api-key") == Some("reloaded-key") {
            applied = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(applied);

    let res = client
        .get(gateway.url("/api-proxy.php?endpoint=pi&digits=slow"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), r#"{"status":"OK"}"#);
}
