use anyhow::{anyhow, Result};
use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "meal_planner=info";
const VERBOSE_FILTER: &str = "meal_planner=debug";

/// Install the global subscriber. Log lines go to stderr so stdout only ever
/// carries the plan JSON.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks between info and debug.
pub fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
