//! stree core
//!
//! Parsing Ruby into a concrete syntax tree and formatting it back out.
//! The [`driver`] module holds the entry points most callers want;
//! [`cst`] exposes the stages individually.

pub mod config;
pub mod cst;
pub mod discovery;
pub mod driver;
pub mod error;
pub mod result;

// Re-export commonly used types
pub use config::{ConfigLoader, FilesConfiguration, FormatterConfiguration, StreeConfig};
pub use cst::{FormatOptions, Location, Node, NodeKind, NodeTag};
pub use discovery::{DefaultFileDiscovery, FileDiscovery};
pub use error::{ErrorKind, ParseError, StreeError};
pub use result::{Result, ResultExt};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    init_tracing_with("stree=info");
}

/// Initialize tracing with a fallback filter used when `RUST_LOG` is unset
pub fn init_tracing_with(default_filter: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
