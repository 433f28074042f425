//! Tracing setup for tests.
//!
//! Configures `tracing-subscriber` from the `[general]` section of
//! `TestkitConfig`. Output goes through the test writer so the harness
//! captures it per test.

use rollup_core::config::{GeneralConfig, TestkitConfig};
use rollup_core::error::{ConfigError, TestkitError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.log_level` when set.
///
/// # Formats
///
/// * `"compact"` - One line per event (default)
/// * `"pretty"` - Multi-line, human-readable output
/// * `"json"` - Machine-parseable JSON lines
///
/// # Errors
///
/// Fails when the format is unknown or a global subscriber is already set.
pub fn init_tracing(config: &GeneralConfig) -> Result<(), TestkitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.log_format.as_str() {
        "compact" => registry
            .with(tracing_subscriber::fmt::layer().compact().with_test_writer())
            .try_init()
            .map_err(|e| {
                TestkitError::Logging(format!(
                    "failed to initialize compact tracing subscriber: {e}"
                ))
            })?,
        "pretty" => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_test_writer())
            .try_init()
            .map_err(|e| {
                TestkitError::Logging(format!(
                    "failed to initialize pretty tracing subscriber: {e}"
                ))
            })?,
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_test_writer())
            .try_init()
            .map_err(|e| {
                TestkitError::Logging(format!("failed to initialize JSON tracing subscriber: {e}"))
            })?,
        other => {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("unknown log format '{other}', expected compact, pretty or json"),
            }
            .into());
        }
    }

    Ok(())
}

/// Install tracing for the current test binary, once.
///
/// Reads `ROLLUP_TESTKIT_GENERAL_*` from the environment and falls back to
/// defaults when they are invalid. Later calls are no-ops.
pub fn init_test_tracing() {
    let general = TestkitConfig::from_env()
        .map(|config| config.general)
        .unwrap_or_default();
    // A subscriber from an earlier test in this binary is fine.
    let _ = init_tracing(&general);
}
