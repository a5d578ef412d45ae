//! HTTP surface of a live host, exercised over real sockets.

use metricer::{BoxError, Host};
use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn metrics_follow_accept_header() {
    let host = Host::new(Some(common::test_config(false)));
    let requests = host.new_counter("requests", "Requests served");
    requests.inc(3);
    let version = host.new_label("version", "Build version");
    version.update("1.2.3");
    let url = common::start_host(&host).await;
    let client = common::client();

    let res = client
        .get(format!("{}/metrics/values", url))
        .header("Accept", "text/html")
        .header("Accept", "application/json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["version"], "1.2.3");
    assert_eq!(body["_os"], std::env::consts::OS);
    assert_eq!(body["metrics"]["requests"], 3);
    assert_eq!(body["metrics"]["_failed_healthchecks"], 0);
    assert!(body["uptime"].as_u64().unwrap() > 0);

    let text = client
        .get(format!("{}/metrics/values", url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(text.contains("# TYPE requests counter\n"));
    assert!(text.contains("version=\"1.2.3\""));
    assert!(text.contains("# TYPE uptime gauge\n"));

    host.stop().await;
}

#[tokio::test]
async fn failing_check_returns_503_and_counts() {
    let host = Host::new(Some(common::test_config(false)));
    host.new_health_check("db", "Database reachable", || {
        Err(BoxError::from("connection refused"))
    });
    let url = common::start_host(&host).await;
    let client = common::client();

    let res = client
        .get(format!("{}/health/check", url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({"status": "failed", "metric": "db", "message": "connection refused"})
    );

    let metrics: Value = client
        .get(format!("{}/metrics/values", url))
        .header("Accept", "application/json")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(metrics["metrics"]["_failed_healthchecks"], 1);

    host.stop().await;
}

#[tokio::test]
async fn unknown_paths_and_methods() {
    let host = Host::new(Some(common::test_config(false)));
    let url = common::start_host(&host).await;
    let client = common::client();

    let res = client.get(format!("{}/nope", url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"error": {"code": 404, "message": "Not Found"}}));

    let res = client
        .post(format!("{}/metrics/values", url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({"error": {"code": 405, "message": "Method not allowed"}})
    );

    // debug routes are not mounted without the debug flag
    let res = client
        .get(format!("{}/debug/logger/levels", url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    host.stop().await;
}

#[tokio::test]
async fn logger_levels_round_trip() {
    let host = Host::new(Some(common::test_config(true)));
    let url = common::start_host(&host).await;
    let client = common::client();
    let levels_url = format!("{}/debug/logger/levels", url);

    let levels: Value = client
        .get(&levels_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(levels["DEFAULT"], "info");
    assert_eq!(levels["metricer"], "info");

    let res = client
        .patch(&levels_url)
        .json(&json!({"metricer": "error"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .patch(&levels_url)
        .json(&json!({"metricer": "loud"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let levels: Value = client
        .get(&levels_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(levels["metricer"], "error");

    host.stop().await;
}
