//! Shared utilities for integration testing.

use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use metricer::lifecycle::BIND_ATTEMPTS;
use metricer::{Host, HostConfig};

/// Bind every port of a full retry range on loopback.
///
/// The listeners stay bound until dropped.
pub fn occupy_port_range() -> (u16, Vec<TcpListener>) {
    for _ in 0..50 {
        let first = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = first.local_addr().unwrap().port();
        if base.checked_add(BIND_ATTEMPTS).is_none() {
            continue;
        }

        let mut held = vec![first];
        for offset in 1..BIND_ATTEMPTS {
            match TcpListener::bind(("127.0.0.1", base + offset)) {
                Ok(listener) => held.push(listener),
                Err(_) => break,
            }
        }
        if held.len() == BIND_ATTEMPTS as usize {
            return (base, held);
        }
    }
    panic!("no free range of {} consecutive ports", BIND_ATTEMPTS);
}

/// A base port whose whole retry range was free a moment ago.
pub fn free_base_port() -> u16 {
    let (base, held) = occupy_port_range();
    drop(held);
    base
}

/// Config bound to loopback on a free range.
#[allow(dead_code)]
pub fn test_config(debug: bool) -> HostConfig {
    HostConfig {
        port: free_base_port(),
        allow_external: false,
        enable_debug: debug,
    }
}

/// Start a host and return its base URL.
#[allow(dead_code)]
pub async fn start_host(host: &Host) -> String {
    host.start().await.unwrap();
    let addr: SocketAddr = host.local_addr().expect("host should be listening");
    format!("http://{}", addr)
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}
