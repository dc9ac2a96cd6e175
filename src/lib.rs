//! Client-side monthly cost estimation for managed AI agent infrastructure.
//!
//! Usage comes in as untrusted text or JSON, is validated and sanitized into a
//! [`usage::UsageRecord`], and priced against a [`rates::RateTable`] by the
//! [`engine`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod engine;
pub mod format;
pub mod rates;
pub mod scenarios;
pub mod usage;
pub mod validation;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `verbosity`.
///
/// Logs go to stderr so JSON reports on stdout stay parseable.
#[cfg(not(tarpaulin_include))]
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}
