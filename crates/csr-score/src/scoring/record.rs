use super::catalog::{IndicatorCatalog, IndicatorId, Pillar};
use super::error::ScoringError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Company headcount band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Size {
    Small,
    Medium,
    Large,
}

impl Size {
    pub const fn ordered() -> [Self; 3] {
        [Self::Small, Self::Medium, Self::Large]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Small => "Petite",
            Self::Medium => "Moyenne",
            Self::Large => "Grande",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "petite" | "small" | "pme" => Some(Self::Small),
            "moyenne" | "medium" | "eti" => Some(Self::Medium),
            "grande" | "large" | "ge" => Some(Self::Large),
            _ => None,
        }
    }
}

/// One company's raw indicator values plus its categorical attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub company: String,
    pub sector: String,
    pub size: Size,
    pub country: Option<String>,
    /// Indexed by [`IndicatorId`]; `None` marks a missing measurement.
    pub values: Vec<Option<f64>>,
}

impl RawRecord {
    pub fn value(&self, id: IndicatorId) -> Option<f64> {
        self.values.get(id.index()).copied().flatten()
    }
}

/// Normalized indicator scores in [0, 100], aligned with the catalog.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRecord {
    pub scores: Vec<Option<f64>>,
}

impl NormalizedRecord {
    pub fn score(&self, id: IndicatorId) -> Option<f64> {
        self.scores.get(id.index()).copied().flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PillarScores {
    pub environment: f64,
    pub social: f64,
    pub governance: f64,
}

impl PillarScores {
    pub fn get(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Environment => self.environment,
            Pillar::Social => self.social,
            Pillar::Governance => self.governance,
        }
    }

    pub(crate) fn from_ordered(values: [f64; 3]) -> Self {
        Self {
            environment: values[Pillar::Environment.index()],
            social: values[Pillar::Social.index()],
            governance: values[Pillar::Governance.index()],
        }
    }
}

/// A fully scored company. Every pillar score is present by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub raw: RawRecord,
    pub normalized: NormalizedRecord,
    pub pillars: PillarScores,
    pub global: f64,
}

impl ScoredRecord {
    pub fn company(&self) -> &str {
        &self.raw.company
    }

    pub fn to_view(&self) -> CompanyScoreView {
        CompanyScoreView {
            company: self.raw.company.clone(),
            sector: self.raw.sector.clone(),
            size: self.raw.size,
            size_label: self.raw.size.label(),
            country: self.raw.country.clone(),
            environment: self.pillars.environment,
            social: self.pillars.social,
            governance: self.pillars.governance,
            global: self.global,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyScoreView {
    pub company: String,
    pub sector: String,
    pub size: Size,
    pub size_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub environment: f64,
    pub social: f64,
    pub governance: f64,
    pub global: f64,
}

/// Scores shipped alongside the raw values in the source table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PublishedScores {
    pub environment: Option<f64>,
    pub social: Option<f64>,
    pub governance: Option<f64>,
    pub global: Option<f64>,
    pub normalized: Vec<Option<f64>>,
}

/// Which optional columns the source table actually carried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSchema {
    pub missing_columns: BTreeSet<String>,
}

impl SourceSchema {
    pub fn has_column(&self, column: &str) -> bool {
        !self.missing_columns.contains(column)
    }

    pub fn require(&self, column: &str) -> Result<(), ScoringError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(ScoringError::schema_mismatch(column))
        }
    }

    pub fn require_indicator(
        &self,
        catalog: &IndicatorCatalog,
        id: IndicatorId,
    ) -> Result<(), ScoringError> {
        self.require(catalog.get(id).name)
    }
}

/// Loaded table prior to scoring.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub records: Vec<RawRecord>,
    pub published: Vec<PublishedScores>,
    pub schema: SourceSchema,
}

impl SourceTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
