//! Structured logging setup for esgpulse
//!
//! Wraps `tracing-subscriber` so the binary, the HTTP server and the tests all
//! initialize the same subscriber exactly once. Output is either pretty
//! console text or newline-delimited JSON.
//!
//! Environment:
//! - `ESGPULSE_LOG_LEVEL` - trace, debug, info, warn, error
//! - `ESGPULSE_LOG_JSON` - `true` for JSON output
//! - `RUST_LOG` - standard directives, layered on top
//!
//! ```no_run
//! use esgpulse::util::logging;
//!
//! logging::init_from_env();
//! tracing::info!(symbol = "AAPL", "analysis requested");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Noisy transport crates capped at WARN unless RUST_LOG says otherwise
const QUIET_TARGETS: [&str; 4] = ["h2", "hyper", "reqwest", "genai"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for this crate's targets
    pub level: Level,

    pub use_json: bool,

    /// Include the module target (e.g. esgpulse::pipeline) in each line
    pub include_target: bool,

    /// Include file and line number
    pub include_location: bool,

    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with full metadata, for running the API server behind a
    /// log collector.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            ..Default::default()
        }
    }

    /// Reads `ESGPULSE_LOG_LEVEL` and `ESGPULSE_LOG_JSON`, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let level = env::var("ESGPULSE_LOG_LEVEL")
            .map(|v| parse_level(&v))
            .unwrap_or(Level::INFO);

        let use_json = env::var("ESGPULSE_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level,
            use_json,
            ..Default::default()
        }
    }

    /// Builds the filter: RUST_LOG first, then this crate at `level`, then the
    /// transport crates at WARN when RUST_LOG is absent.
    pub fn env_filter(&self) -> EnvFilter {
        let crate_directive = format!("esgpulse={}", self.level)
            .parse::<Directive>()
            .unwrap_or_else(|_| LevelFilter::from_level(self.level).into());

        let mut filter = EnvFilter::from_default_env().add_directive(crate_directive);

        if env::var("RUST_LOG").is_err() {
            for target in QUIET_TARGETS {
                if let Ok(directive) = format!("{}=warn", target).parse::<Directive>() {
                    filter = filter.add_directive(directive);
                }
            }
        }

        filter
    }
}

/// Parses a level name, case-insensitively. Unknown names fall back to INFO
/// with a note on stderr, since the subscriber is not installed yet.
pub fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        other => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                other
            );
            Level::INFO
        }
    }
}

/// Installs the global subscriber on stderr, leaving stdout to command
/// output. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.env_filter();
        let registry = tracing_subscriber::registry().with(filter);

        let layer = fmt::layer()
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_thread_ids(config.include_thread_ids)
            .with_thread_names(config.include_thread_ids)
            .with_writer(std::io::stderr);

        let result = if config.use_json {
            registry.with(layer.json()).try_init()
        } else {
            registry.with(layer).try_init()
        };

        if let Err(e) = result {
            eprintln!("Logging already initialized elsewhere: {}", e);
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

pub fn init_from_env() {
    init_logging(LoggingConfig::from_env());
}

/// Shorthand for `init_logging(LoggingConfig::with_level(parse_level(..)))`
pub fn with_level(level_str: &str) {
    init_logging(LoggingConfig::with_level(parse_level(level_str)));
}
