//! Structured logging for the globe engine.
//!
//! Provides structured, span-based, filterable logging via the `tracing`
//! ecosystem: console output with timestamps and module paths, plus JSON
//! file logging in debug builds for post-mortem analysis.

use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Sets up:
/// - Console output with timestamps, module paths, and severity levels
/// - JSON file logging in debug builds (optional)
/// - Environment-based filtering (respects RUST_LOG)
/// - An optional filter override, e.g. from a host's debug settings
///
/// # Arguments
///
/// * `log_dir` - Optional directory for JSON log files (debug builds only)
/// * `debug_build` - Whether this is a debug build (enables file logging)
/// * `filter_override` - Optional filter string taking precedence over the
///   built-in default (but not over RUST_LOG)
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, filter_override: Option<&str>) {
    let filter_str = match filter_override {
        Some(filter) if !filter.is_empty() => filter.to_string(),
        _ => default_filter().to_string(),
    };

    // Info by default, overridable via the RUST_LOG env var.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true) // raster-load workers are named
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    // In debug builds, also log to a file for post-mortem analysis.
    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join("orbis.log"))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// The default filter string: `info` everywhere, with the image decoder
/// quieted down.
pub fn default_filter() -> &'static str {
    "info,image=warn"
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(default_filter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_contents() {
        let filter = default_env_filter();
        let filter_str = format!("{}", filter);
        assert!(filter_str.contains("info"));
        assert!(filter_str.contains("image=warn"));
    }

    #[test]
    fn test_crate_level_filter_parses() {
        let filter = EnvFilter::new("info,orbis_assets=debug");
        let filter_str = format!("{}", filter);
        assert!(filter_str.contains("orbis_assets=debug"));
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,orbis_globe=trace",
            "warn,orbis_layers=debug,orbis_mesh=trace",
            "error",
        ];
        for filter_str in &valid_filters {
            let result = EnvFilter::try_from(*filter_str);
            assert!(result.is_ok(), "failed to parse filter: {}", filter_str);
        }
    }

    #[test]
    fn test_log_file_path_shape() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_file_path = temp_dir.path().join("orbis.log");
        assert_eq!(log_file_path.file_name().unwrap(), "orbis.log");
    }
}
