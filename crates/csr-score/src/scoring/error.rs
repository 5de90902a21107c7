use super::catalog::Pillar;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Structural failures that abort the operation touching the missing structure.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("CSR source table unavailable at {path}: {source}")]
    MissingSource {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("required column '{column}' is absent from the source table")]
    SchemaMismatch { column: String },
    #[error("pillar {} has no indicator values for '{entity}'", .pillar.label())]
    InsufficientData { entity: String, pillar: Pillar },
    #[error("invalid CSR CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: column '{column}' has invalid value '{value}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("invalid pillar weights: {0}")]
    InvalidWeights(String),
    #[error("unknown indicator '{0}'")]
    UnknownIndicator(String),
    #[error("a score distribution needs at least one bin")]
    EmptyBinning,
}

impl ScoringError {
    pub(crate) fn schema_mismatch(column: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            column: column.into(),
        }
    }

    /// Per-item diagnostic equivalent, for errors that degrade instead of aborting.
    pub fn as_diagnostic(&self) -> Option<Diagnostic> {
        match self {
            ScoringError::InsufficientData { entity, pillar } => {
                Some(Diagnostic::InsufficientData {
                    entity: entity.clone(),
                    pillar: *pillar,
                })
            }
            _ => None,
        }
    }
}

/// Data-sparsity conditions surfaced next to a still-usable partial result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    InsufficientData { entity: String, pillar: Pillar },
    UnresolvedEntity { entity: String },
    Unmapped { country: String },
    /// A published score outside `[0, 100]`; the record is left out.
    OutOfRange {
        entity: String,
        column: String,
        value: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::InsufficientData { entity, pillar } => write!(
                f,
                "'{}' excluded: no {} indicator values",
                entity,
                pillar.label()
            ),
            Diagnostic::UnresolvedEntity { entity } => {
                write!(f, "'{}' is not present in the current dataset", entity)
            }
            Diagnostic::Unmapped { country } => {
                write!(f, "'{}' has no ISO-3 country code", country)
            }
            Diagnostic::OutOfRange {
                entity,
                column,
                value,
            } => write!(
                f,
                "'{}' excluded: {} = {} is outside [0, 100]",
                entity, column, value
            ),
        }
    }
}
