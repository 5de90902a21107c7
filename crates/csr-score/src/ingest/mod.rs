mod normalizer;
mod parser;

use crate::scoring::{
    Dataset, IndicatorCatalog, PillarWeights, ScoreMode, ScoringError, ScoringOutcome,
    SourceTable,
};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub use parser::{COMPANY_COLUMN, COUNTRY_COLUMN, SECTOR_COLUMN, SIZE_COLUMN};

/// Reads the CSR indicator table exported by the data team.
pub struct CsrTableImporter;

impl CsrTableImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        catalog: &IndicatorCatalog,
    ) -> Result<SourceTable, ScoringError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ScoringError::MissingSource {
            path: path.display().to_string(),
            source,
        })?;

        let table = Self::from_reader(file, catalog)?;
        info!(path = %path.display(), records = table.len(), "CSR source table loaded");
        Ok(table)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        catalog: &IndicatorCatalog,
    ) -> Result<SourceTable, ScoringError> {
        let table = parser::parse_table(reader, catalog)?;
        if !table.schema.missing_columns.is_empty() {
            warn!(
                missing = ?table.schema.missing_columns,
                "source table lacks optional columns; dependent queries will fail"
            );
        }
        Ok(table)
    }

    /// Load and score in one step.
    pub fn load<P: AsRef<Path>>(
        path: P,
        catalog: Arc<IndicatorCatalog>,
        mode: ScoreMode,
        weights: PillarWeights,
    ) -> Result<ScoringOutcome, ScoringError> {
        let table = Self::from_path(path, &catalog)?;
        match mode {
            ScoreMode::Recompute => Ok(Dataset::score(table, catalog, weights)),
            ScoreMode::Published => Dataset::from_published(table, catalog),
        }
    }
}
