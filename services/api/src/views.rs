use chrono::{DateTime, Utc};
use csr_score::scoring::geo::CountryCount;
use csr_score::scoring::query::{Bucket, GroupIndicatorMean, IndicatorMean, Overview};
use csr_score::scoring::{
    Attribute, CompanyScoreView, Comparison, CountryAggregate, Dataset, Diagnostic, FilterSet,
    GroupSummary, Indicator, IndicatorCatalog, IndicatorId, Pillar, ScoreKey, ScoredRecord,
    ScoringError, SortOrder,
};
use serde::{Deserialize, Serialize};

const DEFAULT_BINS: usize = 10;
const DEFAULT_TOP: usize = 5;
const DEFAULT_LIMIT: usize = 10;

fn default_bins() -> usize {
    DEFAULT_BINS
}

fn default_top() -> usize {
    DEFAULT_TOP
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_breakdown() -> Attribute {
    Attribute::Sector
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OverviewRequest {
    #[serde(default)]
    pub(crate) filters: FilterSet,
    #[serde(default = "default_bins")]
    pub(crate) bins: usize,
    #[serde(default = "default_top")]
    pub(crate) top: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct OverviewReport {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) filters: FilterSet,
    pub(crate) overview: Overview,
    pub(crate) distribution: Vec<Bucket>,
    pub(crate) top: Vec<CompanyScoreView>,
}

pub(crate) fn overview_report(
    dataset: &Dataset,
    request: &OverviewRequest,
) -> Result<OverviewReport, ScoringError> {
    let view = dataset.view().filter(&request.filters)?;
    Ok(OverviewReport {
        generated_at: Utc::now(),
        filters: request.filters.clone(),
        overview: view.overview(),
        distribution: view.distribution(ScoreKey::Global, request.bins)?,
        top: company_views(view.top_n(request.top, ScoreKey::Global, SortOrder::Descending)),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RankingRequest {
    #[serde(default)]
    pub(crate) filters: FilterSet,
    #[serde(default)]
    pub(crate) key: ScoreKey,
    #[serde(default)]
    pub(crate) order: SortOrder,
    #[serde(default = "default_limit")]
    pub(crate) limit: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct RankedCompany {
    pub(crate) rank: usize,
    pub(crate) score: f64,
    #[serde(flatten)]
    pub(crate) company: CompanyScoreView,
}

#[derive(Debug, Serialize)]
pub(crate) struct RankingReport {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) filters: FilterSet,
    pub(crate) key: ScoreKey,
    pub(crate) order: SortOrder,
    pub(crate) total: usize,
    pub(crate) entries: Vec<RankedCompany>,
}

pub(crate) fn ranking_report(
    dataset: &Dataset,
    request: &RankingRequest,
) -> Result<RankingReport, ScoringError> {
    let view = dataset.view().filter(&request.filters)?;
    let entries = view
        .top_n(request.limit, request.key, request.order)
        .into_iter()
        .enumerate()
        .map(|(idx, record)| RankedCompany {
            rank: idx + 1,
            score: request.key.value_of(record),
            company: record.to_view(),
        })
        .collect();

    Ok(RankingReport {
        generated_at: Utc::now(),
        filters: request.filters.clone(),
        key: request.key,
        order: request.order,
        total: view.len(),
        entries,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GroupsRequest {
    #[serde(default)]
    pub(crate) filters: FilterSet,
    pub(crate) attribute: Attribute,
}

#[derive(Debug, Serialize)]
pub(crate) struct GroupsReport {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) filters: FilterSet,
    pub(crate) attribute: Attribute,
    pub(crate) groups: Vec<GroupSummary>,
}

pub(crate) fn groups_report(
    dataset: &Dataset,
    request: &GroupsRequest,
) -> Result<GroupsReport, ScoringError> {
    let view = dataset.view().filter(&request.filters)?;
    Ok(GroupsReport {
        generated_at: Utc::now(),
        filters: request.filters.clone(),
        attribute: request.attribute,
        groups: view.group_by(request.attribute)?,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PillarRequest {
    #[serde(default)]
    pub(crate) filters: FilterSet,
    pub(crate) pillar: Pillar,
    /// Indicator of `pillar` to break down per group.
    #[serde(default)]
    pub(crate) indicator: Option<String>,
    #[serde(default = "default_breakdown")]
    pub(crate) group_by: Attribute,
    #[serde(default = "default_top")]
    pub(crate) top: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct IndicatorBreakdown {
    pub(crate) indicator: &'static str,
    pub(crate) attribute: Attribute,
    pub(crate) groups: Vec<GroupIndicatorMean>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PillarReport {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) filters: FilterSet,
    pub(crate) pillar: Pillar,
    pub(crate) label: &'static str,
    pub(crate) mean: Option<f64>,
    pub(crate) indicators: Vec<IndicatorMean>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) breakdown: Option<IndicatorBreakdown>,
    pub(crate) leaders: Vec<CompanyScoreView>,
}

pub(crate) fn pillar_report(
    dataset: &Dataset,
    request: &PillarRequest,
) -> Result<PillarReport, ScoringError> {
    let view = dataset.view().filter(&request.filters)?;
    let overview = view.overview();
    let mean = match request.pillar {
        Pillar::Environment => overview.mean_environment,
        Pillar::Social => overview.mean_social,
        Pillar::Governance => overview.mean_governance,
    };

    let breakdown = match request.indicator.as_deref() {
        Some(name) => {
            let (id, indicator) = resolve_indicator(dataset.catalog(), request.pillar, name)?;
            Some(IndicatorBreakdown {
                indicator: indicator.name,
                attribute: request.group_by,
                groups: view.indicator_by_group(id, request.group_by)?,
            })
        }
        None => None,
    };

    Ok(PillarReport {
        generated_at: Utc::now(),
        filters: request.filters.clone(),
        pillar: request.pillar,
        label: request.pillar.label(),
        mean,
        indicators: view.indicator_means(request.pillar),
        breakdown,
        leaders: company_views(view.top_n(
            request.top,
            ScoreKey::from(request.pillar),
            SortOrder::Descending,
        )),
    })
}

fn resolve_indicator<'c>(
    catalog: &'c IndicatorCatalog,
    pillar: Pillar,
    name: &str,
) -> Result<(IndicatorId, &'c Indicator), ScoringError> {
    let unknown = || ScoringError::UnknownIndicator(name.to_string());
    let id = catalog.lookup(name).ok_or_else(unknown)?;
    catalog
        .for_pillar(pillar)
        .find(|(candidate, _)| *candidate == id)
        .ok_or_else(unknown)
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CompanyComparisonRequest {
    #[serde(default)]
    pub(crate) filters: FilterSet,
    pub(crate) companies: Vec<String>,
    #[serde(default)]
    pub(crate) axes: Vec<Pillar>,
}

pub(crate) fn company_comparison(
    dataset: &Dataset,
    request: &CompanyComparisonRequest,
) -> Result<Comparison<CompanyScoreView>, ScoringError> {
    let view = dataset.view().filter(&request.filters)?;
    Ok(view.compare_companies(request.companies.as_slice(), &request.axes))
}

/// Country selections are matched against summaries of the whole table, so the request
/// carries no filters.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CountryComparisonRequest {
    pub(crate) countries: Vec<String>,
    #[serde(default)]
    pub(crate) axes: Vec<Pillar>,
}

pub(crate) fn country_comparison(
    dataset: &Dataset,
    request: &CountryComparisonRequest,
) -> Result<Comparison<GroupSummary>, ScoringError> {
    dataset.compare_countries(request.countries.as_slice(), &request.axes)
}

#[derive(Debug, Serialize)]
pub(crate) struct GeoResponse {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) aggregates: Vec<CountryAggregate>,
    pub(crate) counts: Vec<CountryCount>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

pub(crate) fn geo_report(dataset: &Dataset) -> Result<GeoResponse, ScoringError> {
    let report = dataset.country_aggregates()?;
    Ok(GeoResponse {
        generated_at: Utc::now(),
        aggregates: report.aggregates,
        counts: dataset.country_counts()?,
        diagnostics: report.diagnostics,
    })
}

fn company_views(records: Vec<&ScoredRecord>) -> Vec<CompanyScoreView> {
    records.into_iter().map(ScoredRecord::to_view).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::sample_dataset_for_tests;

    #[test]
    fn pillar_report_rejects_indicator_from_other_pillar() {
        let dataset = sample_dataset_for_tests();
        let request = PillarRequest {
            filters: FilterSet::default(),
            pillar: Pillar::Social,
            indicator: Some("Émissions GES (tonnes CO2e)".to_string()),
            group_by: Attribute::Sector,
            top: 3,
        };
        let err = pillar_report(&dataset, &request).expect_err("emissions is environmental");
        assert!(matches!(err, ScoringError::UnknownIndicator(_)));
    }

    #[test]
    fn pillar_report_breaks_down_indicator() {
        let dataset = sample_dataset_for_tests();
        let request = PillarRequest {
            filters: FilterSet::default(),
            pillar: Pillar::Social,
            indicator: Some("Part de femmes (%) (normalisé)".to_string()),
            group_by: Attribute::Country,
            top: 2,
        };
        let report = pillar_report(&dataset, &request).expect("report builds");
        let breakdown = report.breakdown.expect("breakdown requested");
        assert_eq!(breakdown.indicator, "Part de femmes (%)");
        assert_eq!(breakdown.groups.len(), 2);
        assert_eq!(report.leaders.len(), 2);
        assert_eq!(report.label, "Social");
        assert!(report.mean.is_some());
    }

    #[test]
    fn ranking_report_numbers_entries() {
        let dataset = sample_dataset_for_tests();
        let request = RankingRequest {
            filters: FilterSet::default().sector("Industrie"),
            key: ScoreKey::Global,
            order: SortOrder::Descending,
            limit: 10,
        };
        let report = ranking_report(&dataset, &request).expect("report builds");
        assert_eq!(report.total, 3);
        let ranks: Vec<usize> = report.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert!(report.entries[0].score >= report.entries[2].score);
    }
}
