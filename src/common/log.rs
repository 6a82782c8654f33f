//! Logging utilities
//!
//! This module wires the `log` facade to `env_logger`.
//!
//! The logger is installed before the configuration is loaded, so loading
//! and validation messages are visible. The level from the loaded
//! configuration is applied afterwards with [`set_log_level`].

use std::env;

use log::LevelFilter;

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence; `level` is used when it is not set.
///
/// # Parameters
///
/// * `level` - Fallback log level (error, warn, info, debug, trace)
pub fn init_logger(level: &str) {
    if env::var_os("RUST_LOG").is_some() {
        // A logger may already be installed (tests, embedding applications)
        let _ = env_logger::Builder::from_env(env_logger::Env::default()).try_init();
        return;
    }

    // The builder lets everything through; the global max level filters, so
    // it can be changed once the configuration is known
    if env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .try_init()
        .is_ok()
    {
        log::set_max_level(parse_level(level));
    }
}

/// Change the log level after [`init_logger`]
///
/// Has no effect when `RUST_LOG` is set.
pub fn set_log_level(level: &str) {
    if env::var_os("RUST_LOG").is_none() {
        log::set_max_level(parse_level(level));
    }
}

/// Parse a level name, falling back to `info`
fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Info)
}
