//! Log initialisation for the command line tool.
//!
//! The level comes only from the `-v` count; `RUST_LOG` is not consulted.

use log::{LevelFilter, SetLoggerError};

/// Maps the number of `-v` flags to a level filter.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs `env_logger` writing to stderr.
///
/// # Errors
///
/// Fails if a logger is already installed for this process.
pub fn init_logger(verbosity: u8) -> Result<(), SetLoggerError> {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level_for(verbosity))
        .filter_module("openssl", LevelFilter::Warn)
        .format_timestamp_millis()
        .format_target(verbosity > 1);
    builder.try_init()
}
