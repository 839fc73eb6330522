//! Command host for the media delivery core.
//!
//! Input lines become [`Command`]s on an mpsc queue; one [`Dispatcher`] drains
//! the queue and drives the orchestrator, writing a JSON reply per command.

pub mod commands;
pub mod dispatcher;
pub mod error;

pub use commands::{Command, read_commands};
pub use dispatcher::{Dispatcher, Reply};
pub use error::{HostError, HostResult};

/// Depth of the command queue between the input reader and the dispatcher.
pub const COMMAND_QUEUE_DEPTH: usize = 16;

/// Directives appended to the user's filter to keep HTTP internals quiet.
pub const QUIET_TARGETS: &str = "reqwest=warn,hyper=warn,hyper_util=warn";

/// Log filter from `MEDIA_FERRY_LOG_LEVEL`, then `RUST_LOG`, then `info`.
pub fn log_filter_from<F>(mut get: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    get("MEDIA_FERRY_LOG_LEVEL")
        .or_else(|| get("RUST_LOG"))
        .unwrap_or_else(|| "info".to_string())
}

/// Build the subscriber filter, falling back to the default when a directive is invalid.
pub fn env_filter(log_env: &str) -> tracing_subscriber::EnvFilter {
    let combined_filter = format!("{},{}", log_env, QUIET_TARGETS);
    tracing_subscriber::EnvFilter::try_new(combined_filter).unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("info,{}", QUIET_TARGETS))
    })
}
