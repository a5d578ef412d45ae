//! Metrics host.
//!
//! # Data Flow
//! ```text
//! Application code
//!     → Host::new_counter / new_gauge / new_label / new_health_check
//!     → registry.rs (append under write lock)
//!
//! HTTP handlers
//!     → registry.rs (clone handle list under read lock)
//!     → render / run checks without holding the lock
//!
//! Host::start / Host::stop
//!     → lifecycle (bind-with-retry task, graceful shutdown, in-flight wait)
//! ```
//!
//! # Design Decisions
//! - `Host` is a cheap clone around shared state
//! - Registration is allowed at any time, before or after `start`
//! - Built-in runtime metrics are registered first, in a fixed order

pub mod registry;
pub mod runtime;

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use axum::Router;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::{validate_config, HostConfig};
use crate::health::{BoxError, HealthCheck};
use crate::http;
use crate::lifecycle::startup::ServeTask;
use crate::lifecycle::{BindPlan, InFlight, Shutdown};
use crate::metrics::{Counter, Gauge, Label};
use crate::observability::Logbook;

pub use registry::Registry;
pub use runtime::{ProcessStats, RuntimeReading, RuntimeStats};

/// Logger name the host registers in the logbook (its tracing target prefix).
pub const LOGGER_NAME: &str = env!("CARGO_CRATE_NAME");

/// Deadline for the graceful part of `Host::stop`.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) const METRIC_OS: &str = "_os";
pub(crate) const METRIC_OS_HELP: &str = "Application platform [internal]";
pub(crate) const METRIC_NUM_CPU: &str = "_num_cpu";
pub(crate) const METRIC_NUM_CPU_HELP: &str = "Number of CPU [internal]";
pub(crate) const METRIC_THREADS: &str = "_threads";
pub(crate) const METRIC_THREADS_HELP: &str = "Number of threads running by app [internal]";
pub(crate) const METRIC_MEM_ALLOC: &str = "_mem_alloc";
pub(crate) const METRIC_MEM_ALLOC_HELP: &str =
    "Number of allocated memory for whole app in bytes [internal]";
pub(crate) const METRIC_FAILED_HEALTH_CHECKS: &str = "_failed_healthchecks";
pub(crate) const METRIC_FAILED_HEALTH_CHECKS_HELP: &str = "Number of failed health checks [internal]";

/// Error type for host lifecycle operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("Metricer start function is called more than once")]
    AlreadyStarted,
}

/// State shared between the host handle and the HTTP handlers.
pub(crate) struct HostInner {
    pub started: Instant,
    pub config: HostConfig,
    pub logbook: Arc<Logbook>,
    pub stats: Arc<dyn RuntimeStats>,
    pub registry: Registry,
    pub inflight: InFlight,
    pub bound: Arc<ArcSwapOption<SocketAddr>>,
    pub threads: Arc<Gauge>,
    pub mem_alloc: Arc<Gauge>,
    pub failed_health_checks: Arc<Counter>,
}

impl HostInner {
    pub fn new_counter(&self, name: impl Into<String>, help: impl Into<String>) -> Arc<Counter> {
        let metric = Arc::new(Counter::new(name, help));
        self.registry.register_metric(Arc::clone(&metric));
        metric
    }

    pub fn new_gauge(&self, name: impl Into<String>, help: impl Into<String>) -> Arc<Gauge> {
        let metric = Arc::new(Gauge::new(name, help));
        self.registry.register_metric(Arc::clone(&metric));
        metric
    }

    pub fn new_label(&self, name: impl Into<String>, help: impl Into<String>) -> Arc<Label> {
        let metric = Arc::new(Label::new(name, help));
        self.registry.register_metric(Arc::clone(&metric));
        metric
    }

    /// Time since the host was built.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Pull fresh readings into the runtime gauges.
    pub fn refresh_runtime_metrics(&self) {
        let reading = self.stats.read();
        self.mem_alloc.update(reading.allocated_bytes);
        self.threads.update(reading.workers);
    }
}

enum ServerState {
    Idle,
    Running(ServerHandle),
    Stopped,
}

struct ServerHandle {
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

/// Builder for a `Host` with custom collaborators.
#[derive(Default)]
pub struct HostBuilder {
    config: Option<HostConfig>,
    logbook: Option<Arc<Logbook>>,
    stats: Option<Arc<dyn RuntimeStats>>,
}

impl HostBuilder {
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Logbook exposed through the debug endpoint. A private one is created otherwise.
    pub fn logbook(mut self, logbook: Arc<Logbook>) -> Self {
        self.logbook = Some(logbook);
        self
    }

    /// Source of the `_mem_alloc` and `_threads` readings. Defaults to `ProcessStats`.
    pub fn runtime_stats(mut self, stats: Arc<dyn RuntimeStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn build(self) -> Host {
        let logbook = self.logbook.unwrap_or_default();
        logbook.join(LOGGER_NAME);

        let config = match validate_config(self.config) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Config validation problem, using defaults");
                HostConfig::default()
            }
        };

        let registry = Registry::new();

        let os = Arc::new(Label::new(METRIC_OS, METRIC_OS_HELP));
        os.update(std::env::consts::OS);
        registry.register_metric(os);

        let num_cpu = Arc::new(Gauge::new(METRIC_NUM_CPU, METRIC_NUM_CPU_HELP));
        num_cpu.update(num_cpus::get() as i64);
        registry.register_metric(num_cpu);

        let threads = Arc::new(Gauge::new(METRIC_THREADS, METRIC_THREADS_HELP));
        registry.register_metric(Arc::clone(&threads));
        let mem_alloc = Arc::new(Gauge::new(METRIC_MEM_ALLOC, METRIC_MEM_ALLOC_HELP));
        registry.register_metric(Arc::clone(&mem_alloc));
        let failed_health_checks = Arc::new(Counter::new(
            METRIC_FAILED_HEALTH_CHECKS,
            METRIC_FAILED_HEALTH_CHECKS_HELP,
        ));
        registry.register_metric(Arc::clone(&failed_health_checks));

        let inner = HostInner {
            started: Instant::now(),
            config,
            logbook,
            stats: self.stats.unwrap_or_else(|| Arc::new(ProcessStats)),
            registry,
            inflight: InFlight::new(),
            bound: Arc::new(ArcSwapOption::empty()),
            threads,
            mem_alloc,
            failed_health_checks,
        };

        Host {
            inner: Arc::new(inner),
            server: Arc::new(Mutex::new(ServerState::Idle)),
        }
    }
}

/// In-process telemetry host.
///
/// Register metrics and health checks, then `start` to expose them over HTTP.
#[derive(Clone)]
pub struct Host {
    inner: Arc<HostInner>,
    server: Arc<Mutex<ServerState>>,
}

impl Host {
    /// Create a host. A missing config is logged and replaced by defaults.
    pub fn new(config: Option<HostConfig>) -> Self {
        let builder = Self::builder();
        match config {
            Some(config) => builder.config(config).build(),
            None => builder.build(),
        }
    }

    pub fn builder() -> HostBuilder {
        HostBuilder::default()
    }

    /// Register a new counter.
    pub fn new_counter(&self, name: impl Into<String>, help: impl Into<String>) -> Arc<Counter> {
        self.inner.new_counter(name, help)
    }

    /// Register a new gauge.
    pub fn new_gauge(&self, name: impl Into<String>, help: impl Into<String>) -> Arc<Gauge> {
        self.inner.new_gauge(name, help)
    }

    /// Register a new label.
    pub fn new_label(&self, name: impl Into<String>, help: impl Into<String>) -> Arc<Label> {
        self.inner.new_label(name, help)
    }

    /// Register a health check backed by `checker`.
    pub fn new_health_check<F>(&self, name: impl Into<String>, help: impl Into<String>, checker: F)
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let check = HealthCheck::new(name, help).with_checker(checker);
        self.inner.registry.register_health_check(Arc::new(check));
    }

    /// Register an already built health check.
    pub fn register_health_check(&self, check: HealthCheck) {
        self.inner.registry.register_health_check(Arc::new(check));
    }

    /// Start serving HTTP.
    ///
    /// Returns once a port is bound, or once every port of the range has
    /// failed; the latter is not an error, see `local_addr`.
    pub async fn start(&self) -> Result<(), HostError> {
        let ready = {
            let mut state = self.server.lock();
            if !matches!(*state, ServerState::Idle) {
                tracing::warn!("Metricer start function is called more than once");
                return Err(HostError::AlreadyStarted);
            }

            tracing::info!("Starting Metricer...");

            let shutdown = Shutdown::new();
            let (ready_tx, ready_rx) = oneshot::channel();
            let task = ServeTask {
                plan: BindPlan::from_config(&self.inner.config),
                router: self.router(),
                shutdown: shutdown.clone(),
                bound: Arc::clone(&self.inner.bound),
                debug: self.inner.config.enable_debug,
            };
            let task = tokio::spawn(task.run(ready_tx));

            *state = ServerState::Running(ServerHandle { shutdown, task });
            ready_rx
        };

        if ready.await.is_err() {
            tracing::error!("Listener task ended without reporting readiness");
        }

        Ok(())
    }

    /// Stop serving and wait for in-flight handlers.
    ///
    /// Safe to call on a host that was never started, and more than once.
    pub async fn stop(&self) {
        tracing::info!("Stopping Metricer...");

        let handle = {
            let mut state = self.server.lock();
            match std::mem::replace(&mut *state, ServerState::Stopped) {
                ServerState::Running(handle) => Some(handle),
                ServerState::Idle => {
                    *state = ServerState::Idle;
                    None
                }
                ServerState::Stopped => None,
            }
        };

        if let Some(ServerHandle { shutdown, mut task }) = handle {
            shutdown.trigger();

            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "Listener task failed"),
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
                        "Graceful shutdown timed out, closing remaining connections"
                    );
                    task.abort();
                    let _ = task.await;
                }
            }
        }

        self.inner.inflight.wait_idle().await;

        tracing::info!("Metricer has been stopped");
    }

    /// Address the listener is currently bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.bound.load_full().map(|addr| *addr)
    }

    /// The HTTP router serving this host, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        http::build_router(Arc::clone(&self.inner))
    }

    pub fn logbook(&self) -> Arc<Logbook> {
        Arc::clone(&self.inner.logbook)
    }

    pub fn config(&self) -> &HostConfig {
        &self.inner.config
    }

    /// Number of handler invocations currently executing.
    pub fn in_flight(&self) -> u64 {
        self.inner.inflight.active()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("config", &self.inner.config)
            .field("local_addr", &self.local_addr())
            .finish()
    }
}
