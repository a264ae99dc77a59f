pub mod build_info;
pub mod paths;

use std::env;

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "warn,crc_bank=info,bank_core=info";

/// Installs the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` replaces the default filter when set.
pub fn init_tracing() {
    let filter = if env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(DEFAULT_FILTER)
    };

    // A subscriber installed elsewhere (tests, embedding) wins.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
