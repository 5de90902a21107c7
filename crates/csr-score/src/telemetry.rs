use crate::config::TelemetryConfig;
use crate::scoring::ScoreMode;
use std::path::Path;
use thiserror::Error;
use tracing::{info_span, Span};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Crates whose events follow `APP_LOG_LEVEL`; everything else stays at `warn`.
const CSR_TARGETS: [&str; 2] = ["csr_score", "csr_score_api"];

const BARE_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("telemetry error: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Expand a bare level such as `debug` into per-crate directives. Full filter
/// expressions pass through untouched.
pub fn filter_directives(log_level: &str) -> String {
    let level = log_level.trim().to_ascii_lowercase();
    if !BARE_LEVELS.contains(&level.as_str()) {
        return log_level.trim().to_string();
    }

    let mut directives = vec!["warn".to_string()];
    directives.extend(CSR_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directives = filter_directives(&config.log_level);
            EnvFilter::try_new(&directives).map_err(|source| TelemetryError::EnvFilter {
                value: directives,
                source,
            })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// Span wrapping one load or reload of the CSR table, so importer and scoring
/// events carry the source and mode.
pub fn dataset_span(source: &Path, mode: ScoreMode) -> Span {
    info_span!("csr_dataset", source = %source.display(), mode = ?mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_is_scoped_to_csr_crates() {
        assert_eq!(
            filter_directives("Debug"),
            "warn,csr_score=debug,csr_score_api=debug"
        );
    }

    #[test]
    fn full_directives_pass_through() {
        assert_eq!(
            filter_directives(" csr_score::ingest=trace,info "),
            "csr_score::ingest=trace,info"
        );
    }

    #[test]
    fn rejects_malformed_filter() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = TelemetryConfig {
            log_level: "csr_score=verbose".to_string(),
        };
        match init(&config) {
            Err(TelemetryError::EnvFilter { value, .. }) => assert_eq!(value, "csr_score=verbose"),
            other => panic!("expected filter error, got {other:?}"),
        }
    }
}
