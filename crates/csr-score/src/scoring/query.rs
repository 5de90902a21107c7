use super::catalog::{Direction, IndicatorId, Pillar};
use super::dataset::DatasetView;
use super::error::ScoringError;
use super::record::{ScoredRecord, Size};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Filter values that lift a constraint instead of matching literally.
pub const ANY_TOKENS: &[&str] = &["tous", "toutes", "any", "all", "*"];

pub fn is_any(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || ANY_TOKENS
            .iter()
            .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Categorical attribute a view can be filtered or grouped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Sector,
    Size,
    Country,
}

impl Attribute {
    pub const fn column(self) -> &'static str {
        match self {
            Self::Sector => "Secteur",
            Self::Size => "Taille",
            Self::Country => "Pays",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sector => "sector",
            Self::Size => "size",
            Self::Country => "country",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "sector" | "secteur" => Some(Self::Sector),
            "size" | "taille" => Some(Self::Size),
            "country" | "pays" => Some(Self::Country),
            _ => None,
        }
    }

    fn key_of<'r>(self, record: &'r ScoredRecord) -> Option<&'r str> {
        match self {
            Self::Sector => Some(record.raw.sector.as_str()),
            Self::Size => Some(record.raw.size.label()),
            Self::Country => record.raw.country.as_deref(),
        }
    }
}

/// Equality constraints, ANDed together. `None` or an "any" token lifts a constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl FilterSet {
    pub fn sector(mut self, value: impl Into<String>) -> Self {
        self.sector = Some(value.into());
        self
    }

    pub fn size(mut self, value: impl Into<String>) -> Self {
        self.size = Some(value.into());
        self
    }

    pub fn country(mut self, value: impl Into<String>) -> Self {
        self.country = Some(value.into());
        self
    }

    fn active(&self) -> impl Iterator<Item = (Attribute, &str)> {
        [
            (Attribute::Sector, self.sector.as_deref()),
            (Attribute::Size, self.size.as_deref()),
            (Attribute::Country, self.country.as_deref()),
        ]
        .into_iter()
        .filter_map(|(attribute, value)| {
            value
                .filter(|v| !is_any(v))
                .map(|v| (attribute, v.trim()))
        })
    }
}

enum Predicate<'f> {
    Text(Attribute, &'f str),
    /// `None` for a size label outside the known bands; it matches no record.
    Size(Option<Size>),
}

impl Predicate<'_> {
    fn matches(&self, record: &ScoredRecord) -> bool {
        match self {
            Predicate::Text(attribute, wanted) => attribute.key_of(record) == Some(*wanted),
            Predicate::Size(size) => *size == Some(record.raw.size),
        }
    }
}

/// Ordering key for rankings and distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKey {
    #[default]
    Global,
    Environment,
    Social,
    Governance,
}

impl ScoreKey {
    pub fn value_of(self, record: &ScoredRecord) -> f64 {
        match self {
            Self::Global => record.global,
            Self::Environment => record.pillars.environment,
            Self::Social => record.pillars.social,
            Self::Governance => record.pillars.governance,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Global => "Score CSR Global",
            Self::Environment => "Score Environnement",
            Self::Social => "Score Social",
            Self::Governance => "Score Gouvernance",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "global" | "csr" => Some(Self::Global),
            other => Pillar::parse(other).map(Self::from),
        }
    }
}

impl From<Pillar> for ScoreKey {
    fn from(pillar: Pillar) -> Self {
        match pillar {
            Pillar::Environment => Self::Environment,
            Pillar::Social => Self::Social,
            Pillar::Governance => Self::Governance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group_key: String,
    pub mean_environment: f64,
    pub mean_social: f64,
    pub mean_governance: f64,
    pub mean_global: f64,
    pub count: usize,
}

impl GroupSummary {
    pub fn pillar_mean(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Environment => self.mean_environment,
            Pillar::Social => self.mean_social,
            Pillar::Governance => self.mean_governance,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ScoreTotals {
    environment: f64,
    social: f64,
    governance: f64,
    global: f64,
    count: usize,
}

impl ScoreTotals {
    fn add(&mut self, record: &ScoredRecord) {
        self.environment += record.pillars.environment;
        self.social += record.pillars.social;
        self.governance += record.pillars.governance;
        self.global += record.global;
        self.count += 1;
    }

    fn mean(&self, total: f64) -> Option<f64> {
        (self.count > 0).then(|| total / self.count as f64)
    }

    fn into_summary(self, group_key: String) -> GroupSummary {
        let count = self.count.max(1) as f64;
        GroupSummary {
            group_key,
            mean_environment: self.environment / count,
            mean_social: self.social / count,
            mean_governance: self.governance / count,
            mean_global: self.global / count,
            count: self.count,
        }
    }
}

/// Headline metrics for a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub count: usize,
    pub mean_global: Option<f64>,
    pub mean_environment: Option<f64>,
    pub mean_social: Option<f64>,
    pub mean_governance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorMean {
    pub indicator: &'static str,
    pub pillar: Pillar,
    pub direction: Direction,
    pub mean: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupIndicatorMean {
    pub group_key: String,
    pub mean: f64,
    pub count: usize,
}

/// Equal-width histogram bucket over [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl<'a> DatasetView<'a> {
    /// Keep the records matching every active constraint, preserving order.
    ///
    /// Size values accept the French labels and their aliases (`PME`, `small`, ...). A value
    /// matching no sector, size or country yields an empty view.
    pub fn filter(&self, filters: &FilterSet) -> Result<DatasetView<'a>, ScoringError> {
        let mut predicates = Vec::new();
        for (attribute, value) in filters.active() {
            self.dataset.schema().require(attribute.column())?;
            let predicate = match attribute {
                Attribute::Size => Predicate::Size(Size::parse(value)),
                _ => Predicate::Text(attribute, value),
            };
            predicates.push(predicate);
        }

        let records = self
            .records
            .iter()
            .copied()
            .filter(|record| predicates.iter().all(|p| p.matches(record)))
            .collect();

        Ok(DatasetView {
            dataset: self.dataset,
            records,
        })
    }

    /// Per-group means, ascending by group key.
    ///
    /// Records without a value for the attribute (an empty country cell) join no group.
    pub fn group_by(&self, attribute: Attribute) -> Result<Vec<GroupSummary>, ScoringError> {
        self.dataset.schema().require(attribute.column())?;

        let mut groups: BTreeMap<&str, ScoreTotals> = BTreeMap::new();
        for record in &self.records {
            if let Some(key) = attribute.key_of(record) {
                groups.entry(key).or_default().add(record);
            }
        }

        Ok(groups
            .into_iter()
            .map(|(key, totals)| totals.into_summary(key.to_string()))
            .collect())
    }

    /// Best `n` records by `key`; ties resolve by ascending company name.
    pub fn top_n(&self, n: usize, key: ScoreKey, order: SortOrder) -> Vec<&'a ScoredRecord> {
        let mut ranked = self.records.clone();
        ranked.sort_by(|a, b| {
            let by_score = key.value_of(a).total_cmp(&key.value_of(b));
            let by_score = match order {
                SortOrder::Ascending => by_score,
                SortOrder::Descending => by_score.reverse(),
            };
            by_score.then_with(|| a.raw.company.cmp(&b.raw.company))
        });
        ranked.truncate(n);
        ranked
    }

    pub fn overview(&self) -> Overview {
        let mut totals = ScoreTotals::default();
        for record in &self.records {
            totals.add(record);
        }

        Overview {
            count: totals.count,
            mean_global: totals.mean(totals.global),
            mean_environment: totals.mean(totals.environment),
            mean_social: totals.mean(totals.social),
            mean_governance: totals.mean(totals.governance),
        }
    }

    /// Mean normalized score of each indicator of `pillar`, in catalog order.
    pub fn indicator_means(&self, pillar: Pillar) -> Vec<IndicatorMean> {
        self.dataset
            .catalog()
            .for_pillar(pillar)
            .map(|(id, indicator)| {
                let (sum, count) = self.indicator_totals(id, self.records.iter().copied());
                IndicatorMean {
                    indicator: indicator.name,
                    pillar: indicator.pillar,
                    direction: indicator.direction,
                    mean: (count > 0).then(|| sum / count as f64),
                    count,
                }
            })
            .collect()
    }

    /// Mean normalized value of one indicator per group, best group first.
    pub fn indicator_by_group(
        &self,
        indicator: IndicatorId,
        attribute: Attribute,
    ) -> Result<Vec<GroupIndicatorMean>, ScoringError> {
        let schema = self.dataset.schema();
        schema.require_indicator(self.dataset.catalog(), indicator)?;
        schema.require(attribute.column())?;

        let mut groups: BTreeMap<&str, Vec<&ScoredRecord>> = BTreeMap::new();
        for record in &self.records {
            if let Some(key) = attribute.key_of(record) {
                groups.entry(key).or_default().push(*record);
            }
        }

        let mut means: Vec<GroupIndicatorMean> = groups
            .into_iter()
            .filter_map(|(key, members)| {
                let (sum, count) = self.indicator_totals(indicator, members.into_iter());
                (count > 0).then(|| GroupIndicatorMean {
                    group_key: key.to_string(),
                    mean: sum / count as f64,
                    count,
                })
            })
            .collect();

        means.sort_by(|a, b| {
            b.mean
                .total_cmp(&a.mean)
                .then_with(|| a.group_key.cmp(&b.group_key))
        });
        Ok(means)
    }

    /// Histogram of `key` over `bins` equal-width buckets spanning [0, 100].
    pub fn distribution(&self, key: ScoreKey, bins: usize) -> Result<Vec<Bucket>, ScoringError> {
        if bins == 0 {
            return Err(ScoringError::EmptyBinning);
        }

        let width = 100.0 / bins as f64;
        let mut buckets: Vec<Bucket> = (0..bins)
            .map(|idx| Bucket {
                lower: idx as f64 * width,
                upper: (idx + 1) as f64 * width,
                count: 0,
            })
            .collect();

        for record in &self.records {
            let value = key.value_of(record).clamp(0.0, 100.0);
            let idx = ((value / width) as usize).min(bins - 1);
            buckets[idx].count += 1;
        }

        Ok(buckets)
    }

    fn indicator_totals<'r>(
        &self,
        id: IndicatorId,
        records: impl Iterator<Item = &'r ScoredRecord>,
    ) -> (f64, usize) {
        records
            .filter_map(|record| record.normalized.score(id))
            .fold((0.0, 0), |(sum, count), score| (sum + score, count + 1))
    }
}
