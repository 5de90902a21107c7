use super::catalog::{IndicatorCatalog, Pillar};
use super::error::ScoringError;
use super::record::{NormalizedRecord, PillarScores, RawRecord, ScoredRecord};
use serde::{Deserialize, Serialize};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Relative contribution of each pillar to the global score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillarWeights {
    environment: f64,
    social: f64,
    governance: f64,
}

impl PillarWeights {
    pub fn new(environment: f64, social: f64, governance: f64) -> Result<Self, ScoringError> {
        let weights = [environment, social, governance];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ScoringError::InvalidWeights(format!(
                "weights must be finite and non-negative, got {environment}, {social}, {governance}"
            )));
        }

        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ScoringError::InvalidWeights(format!(
                "weights must sum to 1, got {total}"
            )));
        }

        Ok(Self {
            environment,
            social,
            governance,
        })
    }

    pub fn uniform() -> Self {
        Self {
            environment: 1.0 / 3.0,
            social: 1.0 / 3.0,
            governance: 1.0 / 3.0,
        }
    }

    /// Parse a `wE,wS,wG` triple.
    pub fn parse(raw: &str) -> Result<Self, ScoringError> {
        let parts = raw
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ScoringError::InvalidWeights(format!("'{raw}': {err}")))?;

        match parts.as_slice() {
            [e, s, g] => Self::new(*e, *s, *g),
            _ => Err(ScoringError::InvalidWeights(format!(
                "expected three comma-separated weights, got '{raw}'"
            ))),
        }
    }

    pub fn get(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Environment => self.environment,
            Pillar::Social => self.social,
            Pillar::Governance => self.governance,
        }
    }

    fn is_uniform(&self) -> bool {
        self.environment == self.social && self.social == self.governance
    }
}

impl Default for PillarWeights {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Mean of the normalized scores of `pillar`'s indicators present on the record.
pub fn pillar_score(
    catalog: &IndicatorCatalog,
    record: &RawRecord,
    normalized: &NormalizedRecord,
    pillar: Pillar,
) -> Result<f64, ScoringError> {
    let (sum, count) = catalog
        .for_pillar(pillar)
        .filter_map(|(id, _)| normalized.score(id))
        .fold((0.0, 0usize), |(sum, count), score| (sum + score, count + 1));

    if count == 0 {
        return Err(ScoringError::InsufficientData {
            entity: record.company.clone(),
            pillar,
        });
    }

    Ok(sum / count as f64)
}

pub fn global_score(pillars: &PillarScores, weights: &PillarWeights) -> f64 {
    if weights.is_uniform() {
        return (pillars.environment + pillars.social + pillars.governance) / 3.0;
    }

    Pillar::ordered()
        .into_iter()
        .map(|pillar| pillars.get(pillar) * weights.get(pillar))
        .sum()
}

/// Combine a normalized record into pillar and global scores.
pub fn score_record(
    catalog: &IndicatorCatalog,
    weights: &PillarWeights,
    raw: RawRecord,
    normalized: NormalizedRecord,
) -> Result<ScoredRecord, ScoringError> {
    let mut ordered = [0.0; 3];
    for pillar in Pillar::ordered() {
        ordered[pillar.index()] = pillar_score(catalog, &raw, &normalized, pillar)?;
    }

    let pillars = PillarScores::from_ordered(ordered);
    let global = global_score(&pillars, weights);

    Ok(ScoredRecord {
        raw,
        normalized,
        pillars,
        global,
    })
}
