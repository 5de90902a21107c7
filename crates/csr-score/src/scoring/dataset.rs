use super::aggregator::{global_score, score_record, PillarWeights};
use super::catalog::{IndicatorCatalog, Pillar};
use super::error::{Diagnostic, ScoringError};
use super::normalizer::IndicatorBounds;
use super::record::{NormalizedRecord, PillarScores, ScoredRecord, SourceSchema, SourceTable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether scores are recomputed from raw values or read from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    #[default]
    Recompute,
    Published,
}

impl ScoreMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "recompute" | "computed" => Some(Self::Recompute),
            "published" | "precomputed" | "passthrough" => Some(Self::Published),
            _ => None,
        }
    }
}

/// Immutable scored population. Reloads build a new instance.
#[derive(Debug, Clone)]
pub struct Dataset {
    catalog: Arc<IndicatorCatalog>,
    records: Vec<ScoredRecord>,
    bounds: IndicatorBounds,
    schema: SourceSchema,
    weights: PillarWeights,
}

#[derive(Debug)]
pub struct ScoringOutcome {
    pub dataset: Dataset,
    pub diagnostics: Vec<Diagnostic>,
}

impl Dataset {
    /// Normalize against full-table bounds and aggregate every record.
    pub fn score(
        table: SourceTable,
        catalog: Arc<IndicatorCatalog>,
        weights: PillarWeights,
    ) -> ScoringOutcome {
        let SourceTable {
            records: raw_records,
            schema,
            ..
        } = table;
        let bounds = IndicatorBounds::from_records(&catalog, &raw_records);

        let mut records = Vec::with_capacity(raw_records.len());
        let mut diagnostics = Vec::new();
        for raw in raw_records {
            let normalized = bounds.normalize_record(&catalog, &raw);
            match score_record(&catalog, &weights, raw, normalized) {
                Ok(scored) => records.push(scored),
                Err(err) => {
                    debug!(error = %err, "record excluded from scored dataset");
                    diagnostics.extend(err.as_diagnostic());
                }
            }
        }

        if !diagnostics.is_empty() {
            warn!(
                excluded = diagnostics.len(),
                "records lacking pillar data were excluded"
            );
        }
        info!(records = records.len(), "CSR dataset scored");

        ScoringOutcome {
            dataset: Self {
                catalog,
                records,
                bounds,
                schema,
                weights,
            },
            diagnostics,
        }
    }

    /// Read the precomputed pillar, global and normalized columns as-is.
    pub fn from_published(
        table: SourceTable,
        catalog: Arc<IndicatorCatalog>,
    ) -> Result<ScoringOutcome, ScoringError> {
        for pillar in Pillar::ordered() {
            table.schema.require(pillar.score_column())?;
        }
        table.schema.require(GLOBAL_SCORE_COLUMN)?;

        let SourceTable {
            records: raw_records,
            published,
            schema,
        } = table;
        let bounds = IndicatorBounds::from_records(&catalog, &raw_records);

        let mut records = Vec::with_capacity(raw_records.len());
        let mut diagnostics = Vec::new();
        for (raw, scores) in raw_records.into_iter().zip(published) {
            let pillar_values = [scores.environment, scores.social, scores.governance];
            let missing = Pillar::ordered()
                .into_iter()
                .find(|pillar| pillar_values[pillar.index()].is_none());
            if let Some(pillar) = missing {
                diagnostics.push(Diagnostic::InsufficientData {
                    entity: raw.company.clone(),
                    pillar,
                });
                continue;
            }

            let out_of_range = Pillar::ordered()
                .into_iter()
                .map(|pillar| (pillar.score_column(), pillar_values[pillar.index()]))
                .chain(std::iter::once((GLOBAL_SCORE_COLUMN, scores.global)))
                .find_map(|(column, value)| {
                    value
                        .filter(|v| !(0.0..=100.0).contains(v))
                        .map(|v| (column, v))
                });
            if let Some((column, value)) = out_of_range {
                diagnostics.push(Diagnostic::OutOfRange {
                    entity: raw.company.clone(),
                    column: column.to_string(),
                    value: value.to_string(),
                });
                continue;
            }

            let pillars = PillarScores::from_ordered(pillar_values.map(Option::unwrap_or_default));
            let global = scores
                .global
                .unwrap_or_else(|| global_score(&pillars, &PillarWeights::default()));
            records.push(ScoredRecord {
                raw,
                normalized: NormalizedRecord {
                    scores: scores.normalized,
                },
                pillars,
                global,
            });
        }

        if !diagnostics.is_empty() {
            warn!(
                excluded = diagnostics.len(),
                "published rows with missing or out-of-range scores were excluded"
            );
        }
        info!(records = records.len(), "CSR dataset loaded from published scores");

        Ok(ScoringOutcome {
            dataset: Self {
                catalog,
                records,
                bounds,
                schema,
                weights: PillarWeights::default(),
            },
            diagnostics,
        })
    }

    pub fn catalog(&self) -> &IndicatorCatalog {
        &self.catalog
    }

    pub fn records(&self) -> &[ScoredRecord] {
        &self.records
    }

    pub fn bounds(&self) -> &IndicatorBounds {
        &self.bounds
    }

    pub fn schema(&self) -> &SourceSchema {
        &self.schema
    }

    pub fn weights(&self) -> &PillarWeights {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read-only view over every record.
    pub fn view(&self) -> DatasetView<'_> {
        DatasetView {
            dataset: self,
            records: self.records.iter().collect(),
        }
    }
}

/// Column carrying the precomputed global score.
pub const GLOBAL_SCORE_COLUMN: &str = "Score CSR Global";

/// Borrowed, order-preserving subset of a [`Dataset`]. Shares the parent's bounds.
#[derive(Debug, Clone)]
pub struct DatasetView<'a> {
    pub(crate) dataset: &'a Dataset,
    pub(crate) records: Vec<&'a ScoredRecord>,
}

impl<'a> DatasetView<'a> {
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn records(&self) -> &[&'a ScoredRecord] {
        &self.records
    }

    pub fn bounds(&self) -> &'a IndicatorBounds {
        &self.dataset.bounds
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, company: &str) -> Option<&'a ScoredRecord> {
        let wanted = company.trim();
        self.records
            .iter()
            .copied()
            .find(|record| record.raw.company == wanted)
    }
}
