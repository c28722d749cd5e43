// Purpose: process-wide tracing setup

use std::str::FromStr;
use tracing::Level;

/// Parse a configured level name, falling back to `info`
pub fn parse_level(level: &str) -> (Level, bool) {
    match Level::from_str(level.trim()) {
        Ok(level) => (level, true),
        Err(_) => (Level::INFO, false),
    }
}

/// Install the fmt subscriber. Safe to call more than once; later calls are no-ops.
pub fn init_tracing(level: &str) {
    let (parsed, recognized) = parse_level(level);
    let installed = tracing_subscriber::fmt()
        .with_max_level(parsed)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed && !recognized {
        tracing::warn!("Unknown log level '{}', using info", level);
    }
}
