use super::catalog::{Direction, Indicator, IndicatorCatalog, IndicatorId};
use super::record::{NormalizedRecord, RawRecord};
use serde::Serialize;

/// Score assigned to every record when an indicator shows no variance.
pub const ZERO_VARIANCE_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    fn include(self, value: f64) -> Self {
        Self {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }
}

/// Rescale a raw value to [0, 100] so that a higher score always reads as better.
pub fn normalize(indicator: &Indicator, raw: f64, bounds: Bounds) -> f64 {
    let span = bounds.max - bounds.min;
    if span == 0.0 {
        return ZERO_VARIANCE_SCORE;
    }

    let score = match indicator.direction {
        Direction::HigherBetter => 100.0 * (raw - bounds.min) / span,
        Direction::LowerBetter => 100.0 * (bounds.max - raw) / span,
    };
    score.clamp(0.0, 100.0)
}

/// Per-indicator min/max taken over the full, unfiltered table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorBounds {
    bounds: Vec<Option<Bounds>>,
}

impl IndicatorBounds {
    pub fn from_records(catalog: &IndicatorCatalog, records: &[RawRecord]) -> Self {
        let mut bounds: Vec<Option<Bounds>> = vec![None; catalog.len()];
        for record in records {
            for (id, _) in catalog.iter() {
                let Some(value) = record.value(id) else {
                    continue;
                };
                let slot = &mut bounds[id.index()];
                *slot = Some(match *slot {
                    Some(current) => current.include(value),
                    None => Bounds {
                        min: value,
                        max: value,
                    },
                });
            }
        }
        Self { bounds }
    }

    pub fn get(&self, id: IndicatorId) -> Option<Bounds> {
        self.bounds.get(id.index()).copied().flatten()
    }

    pub fn normalize_record(
        &self,
        catalog: &IndicatorCatalog,
        record: &RawRecord,
    ) -> NormalizedRecord {
        let scores = catalog
            .iter()
            .map(|(id, indicator)| {
                let raw = record.value(id)?;
                let bounds = self.get(id)?;
                Some(normalize(indicator, raw, bounds))
            })
            .collect();
        NormalizedRecord { scores }
    }
}
