//! autolink library - expose the command handlers for the binary and tests

pub mod commands;
pub mod common;

pub use autolink_logger as logger;
pub use common::{GlobalOpts, ProjectOpts, ProjectRootOpts};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Route library `tracing` events to stderr.
///
/// `RUST_LOG` takes precedence over the `-v` derived filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| logger::verbosity_to_filter().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
