/*!
 * Logging and tracing initialization
 */

use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::Config;
use crate::error::{Error, Result};

/// Crates whose events the default filter lets through
const LOG_TARGETS: &[&str] = &["gatt_governor", "gatt_governor_core"];

/// Initialize structured logging based on configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &Config) -> Result<()> {
    let env_filter = build_filter(config)?;

    if let Some(ref log_path) = config.log_file {
        init_file_logging(log_path, env_filter)
    } else {
        init_stdout_logging(env_filter)
    }
}

/// Effective level after applying `verbose`
pub fn effective_level(config: &Config) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.log_level.to_tracing_level()
    }
}

fn default_directives(level: Level) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

fn build_filter(config: &Config) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(effective_level(config))))
        .map_err(|e| Error::Logging(format!("Failed to create log filter: {}", e)))
}

/// Human-readable events on stderr, colored only when attached to a terminal
fn init_stdout_logging(env_filter: EnvFilter) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .compact();

    install(env_filter, fmt_layer)
}

/// One JSON object per event, appended so restarts keep earlier history
fn init_file_logging(log_path: &Path, env_filter: EnvFilter) -> Result<()> {
    let file = open_log_file(log_path)?;

    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false);

    install(env_filter, fmt_layer)
}

fn open_log_file(log_path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| {
            Error::Logging(format!(
                "Failed to open log file {}: {}",
                log_path.display(),
                e
            ))
        })
}

fn install<L>(env_filter: EnvFilter, layer: L) -> Result<()>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

/// Route events to the test harness's captured output
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(Level::DEBUG)));

        let fmt_layer = fmt::layer().with_test_writer().without_time().compact();

        // another test binary component may already own the global subscriber
        let _ = install(env_filter, fmt_layer);
    });
}
