use chrono::{DateTime, Utc};
use csr_score::config::DataConfig;
use csr_score::ingest::CsrTableImporter;
use csr_score::scoring::{Dataset, Diagnostic, IndicatorCatalog, ScoringError, ScoringOutcome};
use csr_score::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Load and score the configured CSR table.
pub(crate) fn load_dataset(config: &DataConfig) -> Result<ScoringOutcome, ScoringError> {
    let _span = telemetry::dataset_span(&config.source_path, config.score_mode).entered();
    let catalog = Arc::new(IndicatorCatalog::standard());
    let outcome = CsrTableImporter::load(
        &config.source_path,
        catalog,
        config.score_mode,
        config.weights,
    )?;

    for diagnostic in &outcome.diagnostics {
        warn!(%diagnostic, "record excluded from dataset");
    }
    Ok(outcome)
}

/// Shared scored dataset. Readers clone the inner `Arc` and keep a stable snapshot
/// while a reload swaps in a new one.
#[derive(Clone)]
pub(crate) struct DatasetStore {
    current: Arc<RwLock<Arc<Dataset>>>,
    source: Arc<DataConfig>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReloadSummary {
    pub(crate) source: String,
    pub(crate) records: usize,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) reloaded_at: DateTime<Utc>,
}

impl DatasetStore {
    pub(crate) fn new(dataset: Dataset, source: DataConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(dataset))),
            source: Arc::new(source),
        }
    }

    pub(crate) fn current(&self) -> Arc<Dataset> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub(crate) fn replace(&self, dataset: Dataset) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(dataset);
    }

    /// Re-read the source table. On failure the previous dataset stays in place.
    pub(crate) fn reload(&self) -> Result<ReloadSummary, ScoringError> {
        let ScoringOutcome {
            dataset,
            diagnostics,
        } = load_dataset(&self.source)?;
        let records = dataset.len();
        self.replace(dataset);

        let source = self.source.source_path.display().to_string();
        info!(%source, records, excluded = diagnostics.len(), "CSR dataset swapped");
        Ok(ReloadSummary {
            source,
            records,
            diagnostics,
            reloaded_at: Utc::now(),
        })
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_CSV_FOR_TESTS: &str = "Entreprise,Secteur,Taille,Pays,Émissions GES (tonnes CO2e),Part de femmes (%),\"Comité éthique (1=oui, 0=non)\"\n\
Alpha,Industrie,Grande,France,10,40,1\n\
Beta,Services,Petite,France,50,55,0\n\
Gamma,Industrie,Moyenne,Allemagne,90,70,1\n\
Delta,Services,Grande,Allemagne,30,35,0\n\
Epsilon,Industrie,Petite,Allemagne,70,60,1\n";

#[cfg(test)]
pub(crate) fn sample_dataset_for_tests() -> Dataset {
    let catalog = Arc::new(IndicatorCatalog::standard());
    let table = CsrTableImporter::from_reader(std::io::Cursor::new(SAMPLE_CSV_FOR_TESTS), &catalog)
        .expect("sample table parses");
    Dataset::score(table, catalog, Default::default()).dataset
}

#[cfg(test)]
pub(crate) fn sample_store_for_tests() -> DatasetStore {
    let source = DataConfig {
        source_path: "./missing-csr-table.csv".into(),
        ..DataConfig::default()
    };
    DatasetStore::new(sample_dataset_for_tests(), source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_failure_keeps_previous_dataset() {
        let store = sample_store_for_tests();
        let before = store.current();

        let err = store.reload().expect_err("source file is missing");
        assert!(matches!(err, ScoringError::MissingSource { .. }));
        assert!(Arc::ptr_eq(&before, &store.current()));
    }

    #[test]
    fn replace_swaps_snapshot_without_touching_readers() {
        let store = sample_store_for_tests();
        let snapshot = store.current();

        let catalog = Arc::new(IndicatorCatalog::standard());
        let csv = "Entreprise,Secteur,Taille,Pays,Émissions GES (tonnes CO2e),Part de femmes (%),\"Comité éthique (1=oui, 0=non)\"\n\
Solo,Industrie,Grande,France,10,40,1\n";
        let table = CsrTableImporter::from_reader(std::io::Cursor::new(csv), &catalog)
            .expect("table parses");
        store.replace(Dataset::score(table, catalog, Default::default()).dataset);

        assert_eq!(snapshot.len(), 5);
        assert_eq!(store.current().len(), 1);
    }
}
