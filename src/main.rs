//! Metricer demo host.
//!
//! Registers a dummy health check, a counter and a gauge, updates them every
//! second and serves them until Ctrl+C.
//!
//! ```text
//! metricer --debug --port 9110
//! curl http://127.0.0.1:9110/metrics/values
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use metricer::config::{load_config, HostConfig};
use metricer::lifecycle::shutdown_signal;
use metricer::observability::{init_logging, Level};
use metricer::Host;

#[derive(Parser)]
#[command(name = "metricer")]
#[command(about = "Demo application exposing metrics over HTTP", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First port to try
    #[arg(short, long)]
    port: Option<u16>,

    /// Listen on all interfaces
    #[arg(long)]
    external: bool,

    /// Enable debug endpoints
    #[arg(long)]
    debug: bool,

    /// Initial DEFAULT logger level
    #[arg(long, default_value = "verbose")]
    level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let logbook = init_logging(cli.level)?;

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HostConfig::default(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.allow_external |= cli.external;
    config.enable_debug |= cli.debug;

    tracing::info!(
        port = config.port,
        external = config.allow_external,
        debug = config.enable_debug,
        "Configuration loaded"
    );

    let host = Host::builder().config(config).logbook(logbook).build();

    host.new_health_check("dummy", "Just dummy health check", || {
        tracing::debug!("Dummy health check called");
        Ok(())
    });

    let counter = host.new_counter("counter", "Basic demo counter");
    let gauge = host.new_gauge("gauge", "Basic demo gauge");

    host.start().await?;
    match host.local_addr() {
        Some(addr) => tracing::info!(address = %addr, "Demo host started"),
        None => tracing::warn!("Demo host started without a listener"),
    }

    let ticker = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        let mut step: i64 = 0;
        loop {
            interval.tick().await;
            step += 1;
            counter.inc(step % 20);
            gauge.update((step * 37) % 100);
        }
    });

    shutdown_signal().await;

    ticker.abort();
    host.stop().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
