//! Log output for the `flurry` binary.
//!
//! Events go to stderr so stdout carries nothing but IDs. Verbosity follows
//! `RUST_LOG` and defaults to `info`; set `RUST_LOG=flurry=trace` to watch the
//! engine worker itself.

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_names(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339()),
        )
        .try_init()
        .context("failed to install tracing subscriber")
}
