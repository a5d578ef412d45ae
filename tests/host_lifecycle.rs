//! Start/stop behavior of a live host.

use std::net::TcpStream;
use std::time::{Duration, Instant};

use metricer::{Host, HostConfig, HostError};
use serde_json::Value;

mod common;

#[tokio::test]
async fn serves_on_base_port_then_stops() {
    let config = common::test_config(false);
    let base = config.port;
    let host = Host::new(Some(config));

    let url = common::start_host(&host).await;
    assert_eq!(host.local_addr().unwrap().port(), base);

    let res = common::client()
        .get(format!("{}/health/check", url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let addr = host.local_addr().unwrap();
    host.stop().await;

    assert!(host.local_addr().is_none());
    assert!(TcpStream::connect_timeout(&addr, Duration::from_millis(200)).is_err());
}

#[tokio::test]
async fn skips_busy_ports() {
    let (base, mut held) = common::occupy_port_range();
    // free the last port of the range only
    let last = held.pop().unwrap();
    let expected = last.local_addr().unwrap().port();
    drop(last);

    let host = Host::new(Some(HostConfig {
        port: base,
        ..HostConfig::default()
    }));
    host.start().await.unwrap();

    assert_eq!(host.local_addr().map(|a| a.port()), Some(expected));
    host.stop().await;
}

#[tokio::test]
async fn exhausted_range_still_starts() {
    let (base, _held) = common::occupy_port_range();

    let host = Host::new(Some(HostConfig {
        port: base,
        ..HostConfig::default()
    }));

    tokio::time::timeout(Duration::from_secs(5), host.start())
        .await
        .expect("start must not hang")
        .unwrap();
    assert!(host.local_addr().is_none());

    host.stop().await;
}

#[tokio::test]
async fn second_start_is_rejected() {
    let host = Host::new(Some(common::test_config(false)));
    let url = common::start_host(&host).await;
    let addr = host.local_addr();

    let err = host.start().await.unwrap_err();
    assert!(matches!(err, HostError::AlreadyStarted));
    assert_eq!(err.to_string(), "Metricer start function is called more than once");

    // the first listener is untouched
    assert_eq!(host.local_addr(), addr);
    let res = common::client()
        .get(format!("{}/metrics/values", url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    host.stop().await;
    assert!(matches!(host.start().await, Err(HostError::AlreadyStarted)));
}

#[tokio::test]
async fn stop_before_start_is_harmless() {
    let host = Host::new(Some(common::test_config(false)));
    host.stop().await;
    host.stop().await;

    let _url = common::start_host(&host).await;
    host.stop().await;
}

#[tokio::test]
async fn missing_config_falls_back_to_defaults() {
    let host = Host::new(None);
    assert_eq!(host.config(), &HostConfig::default());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_waits_for_running_health_check() {
    let host = Host::new(Some(common::test_config(false)));
    host.new_health_check("slow", "Sleeps before answering", || {
        std::thread::sleep(Duration::from_millis(500));
        Ok(())
    });
    let url = common::start_host(&host).await;

    let request = tokio::spawn(async move {
        common::client()
            .get(format!("{}/health/check", url))
            .send()
            .await
            .map(|res| res.status().as_u16())
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    while host.in_flight() == 0 {
        assert!(Instant::now() < deadline, "health check never started");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    host.stop().await;
    assert_eq!(host.in_flight(), 0);

    let status = request.await.unwrap().unwrap();
    assert_eq!(status, 200);
}
