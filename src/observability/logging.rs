//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Hand the filter reload handle to a `Logbook` so levels change at runtime
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` is not consulted: the logbook is the single source of levels

use std::sync::Arc;

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use super::logbook::{Level, Logbook};

/// Install a global fmt subscriber whose filter is driven by the returned logbook.
pub fn init_logging(default_level: Level) -> Result<Arc<Logbook>, TryInitError> {
    let logbook = Logbook::with_default_level(default_level);
    let filter = EnvFilter::new(logbook.directives());
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(Arc::new(logbook.with_filter_handle(handle)))
}
