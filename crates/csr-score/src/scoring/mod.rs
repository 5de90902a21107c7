pub mod aggregator;
pub mod catalog;
pub mod comparison;
mod dataset;
pub mod error;
pub mod geo;
pub mod normalizer;
pub mod query;
pub mod record;

pub use aggregator::PillarWeights;
pub use catalog::{Direction, Indicator, IndicatorCatalog, IndicatorId, Pillar};
pub use comparison::{Comparison, ComparisonSeries, ComparisonView};
pub use dataset::{Dataset, DatasetView, ScoreMode, ScoringOutcome, GLOBAL_SCORE_COLUMN};
pub use error::{Diagnostic, ScoringError};
pub use geo::{CountryAggregate, GeoCode, GeoReport};
pub use query::{Attribute, FilterSet, GroupSummary, ScoreKey, SortOrder};
pub use record::{CompanyScoreView, RawRecord, ScoredRecord, Size, SourceTable};
