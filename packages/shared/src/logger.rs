//! Logger setup shared by every binary in the workspace.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence. Otherwise the binary's own crate and `tower_http`
/// log at `default_level`.
///
/// # Arguments
///
/// * `bin_name` - Binary name (e.g. `env!("CARGO_BIN_NAME")`); dashes are mapped to
///   underscores to match the crate's tracing target
/// * `default_level` - Level used when `RUST_LOG` is not set (e.g. `"info"`)
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let crate_target = bin_name.replace('-', "_");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{crate_target}={default_level},tower_http={default_level}"
        ))
    });

    // A subscriber may already be installed (e.g. in tests); keep the first one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}
