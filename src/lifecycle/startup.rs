//! Listener startup with port retry.
//!
//! # Responsibilities
//! - Derive the candidate bind addresses from the config
//! - Bind the first free port of the range and serve on it
//! - Move on to the next port when binding or serving fails
//! - Report readiness to the caller of `Host::start` exactly once
//!
//! # Design Decisions
//! - Start-up failures are logged, never returned: the host keeps running without a listener
//! - A serve error after a successful bind is handled like a bind failure
//! - The bound address is published for `Host::local_addr`

use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::Router;
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use crate::config::HostConfig;
use crate::lifecycle::shutdown::Shutdown;

/// Number of consecutive ports tried, starting at the configured one.
pub const BIND_ATTEMPTS: u16 = 24;

/// Address range the listener may bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindPlan {
    ip: IpAddr,
    base_port: u16,
}

impl BindPlan {
    pub fn from_config(config: &HostConfig) -> Self {
        let ip = if config.allow_external {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };
        Self {
            ip,
            base_port: config.port,
        }
    }

    /// Candidate addresses in order. `None` marks a port past 65535.
    pub fn candidates(&self) -> impl Iterator<Item = Option<SocketAddr>> + '_ {
        (0..BIND_ATTEMPTS).map(move |offset| {
            self.base_port
                .checked_add(offset)
                .map(|port| SocketAddr::new(self.ip, port))
        })
    }
}

/// Source of connections on one bound port.
pub(crate) trait Acceptor: Send + 'static {
    fn accept(&mut self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl Acceptor for TcpListener {
    async fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }
}

/// Errors scoped to a single connection; the listener itself is still usable.
fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

/// Listener handed to `axum::serve`.
///
/// A fatal accept error is stored and `failed` is triggered, which ends
/// serving through the graceful shutdown future. The accept call then never
/// resolves.
struct ServeListener<A> {
    inner: A,
    failure: Arc<Mutex<Option<io::Error>>>,
    failed: Shutdown,
}

impl<A: Acceptor> axum::serve::Listener for ServeListener<A> {
    type Io = TcpStream;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (TcpStream, SocketAddr) {
        loop {
            match self.inner.accept().await {
                Ok(conn) => return conn,
                Err(e) if is_connection_error(&e) => {
                    tracing::debug!(error = %e, "Connection accept error");
                }
                Err(e) => {
                    *self.failure.lock() = Some(e);
                    self.failed.trigger();
                    return std::future::pending().await;
                }
            }
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

/// Everything the listener task needs, moved into it by `Host::start`.
pub(crate) struct ServeTask {
    pub plan: BindPlan,
    pub router: Router,
    pub shutdown: Shutdown,
    pub bound: Arc<ArcSwapOption<SocketAddr>>,
    pub debug: bool,
}

impl ServeTask {
    /// Bind-with-retry loop on TCP sockets.
    pub async fn run(self, ready: oneshot::Sender<()>) {
        self.run_with(ready, |addr| TcpListener::bind(addr)).await
    }

    /// Bind-with-retry loop. Fires `ready` on the first successful bind, or
    /// once every candidate has been exhausted.
    pub async fn run_with<F, Fut, A>(self, ready: oneshot::Sender<()>, mut bind: F)
    where
        F: FnMut(SocketAddr) -> Fut + Send,
        Fut: Future<Output = io::Result<A>> + Send,
        A: Acceptor,
    {
        let mut ready = Some(ready);

        for candidate in self.plan.candidates() {
            if self.shutdown.is_triggered() {
                break;
            }

            let Some(addr) = candidate else {
                tracing::debug!("Moving to next try: port out of range");
                continue;
            };

            let acceptor = match bind(addr).await {
                Ok(acceptor) => acceptor,
                Err(e) => {
                    tracing::debug!(address = %addr, error = %e, "Moving to next try after bind error");
                    continue;
                }
            };

            let local_addr = acceptor.local_addr().unwrap_or(addr);
            self.bound.store(Some(Arc::new(local_addr)));

            if let Some(tx) = ready.take() {
                let _ = tx.send(());
            }

            tracing::info!(address = %local_addr, "Metricer interface should be available");
            if self.debug {
                tracing::debug!("HTTP interface for debugging is active");
            }

            let failure = Arc::new(Mutex::new(None));
            let failed = Shutdown::new();
            let listener = ServeListener {
                inner: acceptor,
                failure: Arc::clone(&failure),
                failed: failed.clone(),
            };

            let stop = self.shutdown.subscribe();
            let fault = failed.subscribe();
            let signal = async move {
                tokio::select! {
                    _ = stop.recv() => {}
                    _ = fault.recv() => {}
                }
            };

            let app = self
                .router
                .clone()
                .into_make_service_with_connect_info::<SocketAddr>();
            // no-op tap: lets axum's generic `Connected` impl supply `ConnectInfo<SocketAddr>`
            let listener = axum::serve::ListenerExt::tap_io(listener, |_: &mut TcpStream| {});
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(signal)
                .await;

            self.bound.store(None);

            let accept_error = failure.lock().take();
            match (result, accept_error) {
                (Err(e), _) => {
                    tracing::warn!(address = %local_addr, error = %e, "Serving failed, moving to next port");
                }
                (Ok(()), Some(e)) => {
                    tracing::warn!(address = %local_addr, error = %e, "Serving failed, moving to next port");
                }
                (Ok(()), None) if self.shutdown.is_triggered() => break,
                (Ok(()), None) => {
                    tracing::warn!(address = %local_addr, "Serving ended unexpectedly, moving to next port");
                }
            }
        }

        // every candidate failed: never leave the caller waiting
        if let Some(tx) = ready.take() {
            tracing::warn!(
                base_port = self.plan.base_port,
                attempts = BIND_ATTEMPTS,
                "No port could be bound"
            );
            let _ = tx.send(());
        }

        tracing::debug!("Metricer interface is not available");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::{Duration, Instant};

    /// Replays scripted accept errors, then waits forever.
    struct ScriptedAcceptor {
        addr: SocketAddr,
        errors: VecDeque<io::ErrorKind>,
    }

    impl ScriptedAcceptor {
        fn idle(addr: SocketAddr) -> Self {
            Self::failing(addr, &[])
        }

        fn failing(addr: SocketAddr, errors: &[io::ErrorKind]) -> Self {
            Self {
                addr,
                errors: errors.iter().copied().collect(),
            }
        }
    }

    impl Acceptor for ScriptedAcceptor {
        async fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
            match self.errors.pop_front() {
                Some(kind) => Err(io::Error::new(kind, "scripted accept error")),
                None => std::future::pending().await,
            }
        }

        fn local_addr(&self) -> io::Result<SocketAddr> {
            Ok(self.addr)
        }
    }

    fn task(base_port: u16) -> (ServeTask, Shutdown, Arc<ArcSwapOption<SocketAddr>>) {
        let shutdown = Shutdown::new();
        let bound = Arc::new(ArcSwapOption::empty());
        let task = ServeTask {
            plan: BindPlan::from_config(&HostConfig {
                port: base_port,
                ..HostConfig::default()
            }),
            router: Router::new(),
            shutdown: shutdown.clone(),
            bound: Arc::clone(&bound),
            debug: false,
        };
        (task, shutdown, bound)
    }

    async fn wait_for_port(bound: &ArcSwapOption<SocketAddr>, port: u16) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while bound.load_full().map(|addr| addr.port()) != Some(port) {
            assert!(Instant::now() < deadline, "listener never moved to port {}", port);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn fatal_accept_error_moves_to_next_port() {
        let (task, shutdown, bound) = task(20000);
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&attempts);

        let (ready_tx, ready_rx) = oneshot::channel();
        let handle = tokio::spawn(task.run_with(ready_tx, move |addr: SocketAddr| {
            let first = {
                let mut seen = seen.lock();
                seen.push(addr.port());
                seen.len() == 1
            };
            async move {
                if first {
                    Ok(ScriptedAcceptor::failing(addr, &[io::ErrorKind::Other]))
                } else {
                    Ok(ScriptedAcceptor::idle(addr))
                }
            }
        }));

        ready_rx.await.unwrap();
        wait_for_port(&bound, 20001).await;
        assert_eq!(*attempts.lock(), vec![20000, 20001]);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("serve task should end after shutdown")
            .unwrap();
        assert!(bound.load_full().is_none());
        assert_eq!(attempts.lock().len(), 2);
    }

    #[tokio::test]
    async fn connection_errors_keep_serving() {
        let (task, shutdown, bound) = task(20100);
        let attempts = Arc::new(Mutex::new(0usize));
        let seen = Arc::clone(&attempts);

        let (ready_tx, ready_rx) = oneshot::channel();
        let handle = tokio::spawn(task.run_with(ready_tx, move |addr: SocketAddr| {
            *seen.lock() += 1;
            async move {
                Ok(ScriptedAcceptor::failing(
                    addr,
                    &[
                        io::ErrorKind::ConnectionAborted,
                        io::ErrorKind::ConnectionReset,
                    ],
                ))
            }
        }));

        ready_rx.await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(bound.load_full().map(|addr| addr.port()), Some(20100));
        assert_eq!(*attempts.lock(), 1);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("serve task should end after shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn bind_errors_are_skipped() {
        let (task, shutdown, bound) = task(20200);

        let (ready_tx, ready_rx) = oneshot::channel();
        let handle = tokio::spawn(task.run_with(ready_tx, |addr: SocketAddr| async move {
            if addr.port() < 20203 {
                Err(io::Error::new(io::ErrorKind::AddrInUse, "busy"))
            } else {
                Ok(ScriptedAcceptor::idle(addr))
            }
        }));

        ready_rx.await.unwrap();
        assert_eq!(bound.load_full().map(|addr| addr.port()), Some(20203));

        shutdown.trigger();
        handle.await.unwrap();
    }

    #[test]
    fn loopback_unless_external() {
        let local = BindPlan::from_config(&HostConfig::default());
        let first = local.candidates().next().unwrap().unwrap();
        assert_eq!(first, "127.0.0.1:9110".parse().unwrap());

        let external = BindPlan::from_config(&HostConfig {
            allow_external: true,
            ..HostConfig::default()
        });
        let first = external.candidates().next().unwrap().unwrap();
        assert_eq!(first, "0.0.0.0:9110".parse().unwrap());
    }

    #[test]
    fn tries_twenty_four_consecutive_ports() {
        let plan = BindPlan::from_config(&HostConfig {
            port: 20000,
            ..HostConfig::default()
        });
        let ports: Vec<u16> = plan.candidates().map(|a| a.unwrap().port()).collect();
        assert_eq!(ports.len(), 24);
        assert_eq!(ports[0], 20000);
        assert_eq!(ports[23], 20023);
    }

    #[test]
    fn ports_past_the_end_are_skipped() {
        let plan = BindPlan::from_config(&HostConfig {
            port: 65530,
            ..HostConfig::default()
        });
        let candidates: Vec<_> = plan.candidates().collect();
        assert_eq!(candidates.len(), 24);
        assert_eq!(candidates.iter().filter(|c| c.is_some()).count(), 6);
        assert!(candidates[6].is_none());
    }
}
