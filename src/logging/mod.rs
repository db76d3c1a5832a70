//! Logging infrastructure - structured tracing for conversions
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable log level
//! - Zero-cost when disabled
//! - Per-conversion events with `event = "..."` fields
//! - Console or file output, plain or JSON

use crate::errors::ConversionError;
use once_cell::sync::OnceCell;
use std::io;
use std::path::Path;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub use tracing::{debug, error, info, trace, warn, Level};

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Log file path (stderr when unset)
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // BUFBRIDGE_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level_str) = std::env::var("BUFBRIDGE_LOG_LEVEL") {
            config.level = parse_level(&level_str);
        }

        // BUFBRIDGE_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("BUFBRIDGE_LOG_FILE") {
            config.log_path = Some(path);
        }

        config.json_format = std::env::var("BUFBRIDGE_LOG_JSON").is_ok();
        config.show_spans = std::env::var("BUFBRIDGE_LOG_SPANS").is_ok();

        config
    }

    /// Create high-performance config (minimal logging)
    pub fn performance() -> Self {
        Self {
            level: Level::ERROR,
            ..Self::default()
        }
    }

    /// Create debug config (verbose logging)
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            log_path: None,
            json_format: false,
            show_spans: true,
        }
    }
}

/// Parse a level name, falling back to INFO
pub fn parse_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration
///
/// Only the first call installs a subscriber; later calls are no-ops.
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("bufbridge={}", config.level.as_str().to_lowercase()))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let writer = make_writer(config.log_path.as_deref());
        let (json_layer, text_layer) = if config.json_format {
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_span_events(span_events);
            (Some(layer), None)
        } else {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_span_events(span_events)
                .with_target(true)
                .with_line_number(cfg!(debug_assertions));
            (None, Some(layer))
        };

        // Another subscriber may already be installed by the embedding program
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .with(text_layer)
            .try_init();
    });
}

fn make_writer(log_path: Option<&str>) -> BoxMakeWriter {
    match log_path {
        Some(path) => {
            let path = Path::new(path);
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|name| name.to_os_string())
                .unwrap_or_else(|| "bufbridge.log".into());
            BoxMakeWriter::new(tracing_appender::rolling::never(directory, file_name))
        }
        None => BoxMakeWriter::new(io::stderr),
    }
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

// ============================================================================
// Conversion events
// ============================================================================

/// Log storage drawn from the heap for an owning sequence
#[inline]
pub fn log_allocation(size: usize, ptr: *const u8) {
    trace!(
        event = "allocation",
        size_bytes = size,
        address = ?ptr,
        "Memory allocated"
    );
}

/// Log owning storage returned to the heap
#[inline]
pub fn log_deallocation(ptr: *const u8) {
    trace!(event = "deallocation", address = ?ptr, "Memory deallocated");
}

/// Log a successful engine -> native decode
#[inline]
pub fn log_decode(type_name: &str, elements: usize, address: *const u8) {
    trace!(
        event = "decode",
        type_name,
        elements,
        address = ?address,
        "Engine buffer bridged"
    );
}

/// Log a native -> engine encode
#[inline]
pub fn log_encode(type_name: &str, byte_len: usize) {
    trace!(event = "encode", type_name, byte_len, "Engine buffer allocated");
}

/// Log release of a temporary engine handle
#[inline]
pub fn log_release() {
    trace!(event = "release_temp", "Temporary engine handle released");
}

/// Log a structural probe made by a resolver
#[inline]
pub fn log_probe(type_name: &str, matched: bool) {
    trace!(event = "probe", type_name, matched, "Resolver candidate probed");
}

/// Log the alternative a resolver settled on
pub fn log_resolution(type_name: &str, index: usize) {
    debug!(
        event = "resolved",
        type_name,
        index,
        "Resolver matched candidate"
    );
}

/// Log a conversion failure before it is surfaced to the engine
pub fn log_conversion_error(type_name: &str, error: &ConversionError) {
    debug!(
        event = "conversion_error",
        type_name,
        kind = error.tag(),
        error = %error,
        "Conversion failed"
    );
}

/// Performance tracking utilities
pub mod perf {
    use std::time::Instant;
    use tracing::debug;

    /// Track operation duration (returns guard that logs on drop)
    #[must_use]
    pub fn track(operation: &'static str) -> PerformanceGuard {
        PerformanceGuard {
            operation,
            start: Instant::now(),
        }
    }

    pub struct PerformanceGuard {
        operation: &'static str,
        start: Instant,
    }

    impl Drop for PerformanceGuard {
        fn drop(&mut self) {
            let elapsed = self.start.elapsed();
            debug!(
                operation = self.operation,
                duration_us = elapsed.as_micros() as u64,
                "operation completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(config.log_path.is_none());

        let perf_config = LogConfig::performance();
        assert_eq!(perf_config.level, Level::ERROR);

        let debug_config = LogConfig::debug();
        assert_eq!(debug_config.level, Level::TRACE);
        assert!(debug_config.show_spans);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level(" warn "), Level::WARN);
        assert_eq!(parse_level("nonsense"), Level::INFO);
    }

    #[test]
    fn test_init_idempotent() {
        init_with_config(LogConfig::performance());
        init_with_config(LogConfig::debug()); // Should not panic
        assert!(is_initialized());
    }
}
