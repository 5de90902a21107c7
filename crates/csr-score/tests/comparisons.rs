use csr_score::ingest::CsrTableImporter;
use csr_score::scoring::geo::to_iso;
use csr_score::scoring::{
    Attribute, Dataset, Diagnostic, FilterSet, GeoCode, IndicatorCatalog, Pillar, PillarWeights,
    ScoreKey, ScoringError, SortOrder,
};
use std::io::Cursor;
use std::sync::Arc;

const PUBLISHED_HEADER: &str =
    "Entreprise,Secteur,Taille,Pays,Score Environnement,Score Social,Score Gouvernance,Score CSR Global\n";

fn published(rows: &str) -> Dataset {
    let catalog = Arc::new(IndicatorCatalog::standard());
    let csv = format!("{PUBLISHED_HEADER}{rows}");
    let table = CsrTableImporter::from_reader(Cursor::new(csv), &catalog).expect("table parses");
    Dataset::from_published(table, catalog)
        .expect("score columns present")
        .dataset
}

fn european_panel() -> Dataset {
    published(
        "Alpha,Industrie,Grande,France,60,70,80,70\n\
Beta,Services,Petite,France,40,50,60,50\n\
Gamma,Industrie,Moyenne,Allemagne,90,30,60,60\n\
Delta,Services,Grande,Allemagne,30,90,30,50\n\
Epsilon,Industrie,Petite,Atlantide,50,50,50,50\n",
    )
}

#[test]
fn published_scores_are_read_verbatim() {
    let dataset = published(
        "C,Industrie,Grande,France,80,80,83,81.0\n\
A,Industrie,Grande,France,70,70,77,72.3\n\
B,Industrie,Grande,France,81,81,81,81.0\n",
    );
    assert_eq!(dataset.len(), 3);
    let a = dataset.view().find("A").expect("A present");
    assert_eq!(a.global, 72.3);
    assert_eq!(a.pillars.get(Pillar::Governance), 77.0);

    let top = dataset.view().top_n(2, ScoreKey::Global, SortOrder::Descending);
    let names: Vec<&str> = top.iter().map(|r| r.company()).collect();
    assert_eq!(names, vec!["B", "C"]);
}

#[test]
fn published_scores_outside_range_are_excluded() {
    let catalog = Arc::new(IndicatorCatalog::standard());
    let csv = format!(
        "{PUBLISHED_HEADER}Alpha,Industrie,Grande,France,60,70,80,70\n\
Beta,Services,Petite,France,150,50,60,86.7\n\
Gamma,Services,Petite,France,40,50,60,-1\n"
    );
    let table = CsrTableImporter::from_reader(Cursor::new(csv), &catalog).expect("table parses");
    let outcome = Dataset::from_published(table, catalog).expect("score columns present");

    assert_eq!(outcome.dataset.len(), 1);
    assert_eq!(
        outcome.diagnostics,
        vec![
            Diagnostic::OutOfRange {
                entity: "Beta".to_string(),
                column: "Score Environnement".to_string(),
                value: "150".to_string(),
            },
            Diagnostic::OutOfRange {
                entity: "Gamma".to_string(),
                column: "Score CSR Global".to_string(),
                value: "-1".to_string(),
            },
        ]
    );
}

#[test]
fn published_mode_requires_score_columns() {
    let catalog = Arc::new(IndicatorCatalog::standard());
    let csv = "Entreprise,Secteur,Taille,Pays\nAlpha,Industrie,Grande,France\n";
    let table = CsrTableImporter::from_reader(Cursor::new(csv), &catalog).expect("table parses");
    let err = Dataset::from_published(table, catalog).expect_err("no score columns");
    match err {
        ScoringError::SchemaMismatch { column } => assert_eq!(column, "Score Environnement"),
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}

#[test]
fn company_comparison_closes_every_polygon() {
    let dataset = european_panel();
    let comparison = dataset
        .view()
        .compare_companies(&["Gamma", "Alpha"], &Pillar::ordered());

    assert_eq!(
        comparison.view.axes,
        vec!["Environnement", "Social", "Gouvernance", "Environnement"]
    );
    let entities: Vec<&str> = comparison
        .view
        .series
        .iter()
        .map(|s| s.entity.as_str())
        .collect();
    assert_eq!(entities, vec!["Gamma", "Alpha"]);
    for series in &comparison.view.series {
        assert_eq!(series.values.len(), 4);
        assert_eq!(series.values.first(), series.values.last());
    }
    assert_eq!(comparison.view.series[0].values, vec![90.0, 30.0, 60.0, 90.0]);
    assert_eq!(comparison.rows[1].company, "Alpha");
    assert!(comparison.diagnostics.is_empty());
}

#[test]
fn unknown_and_repeated_companies_are_handled() {
    let dataset = european_panel();
    let comparison = dataset
        .view()
        .compare_companies(&["Alpha", "Zeta", "Alpha"], &[]);

    assert_eq!(comparison.view.series.len(), 1);
    assert_eq!(comparison.view.axes.len(), 4);
    assert_eq!(
        comparison.diagnostics,
        vec![Diagnostic::UnresolvedEntity {
            entity: "Zeta".to_string()
        }]
    );
}

#[test]
fn country_comparison_uses_group_means() {
    let dataset = european_panel();
    let comparison = dataset
        .compare_countries(&["France", "Allemagne"], &[Pillar::Social, Pillar::Governance])
        .expect("country column present");

    assert_eq!(comparison.view.axes, vec!["Social", "Gouvernance", "Social"]);
    assert_eq!(comparison.view.series[0].entity, "France");
    assert_eq!(comparison.view.series[0].values, vec![60.0, 70.0, 60.0]);
    assert_eq!(comparison.view.series[1].values, vec![60.0, 45.0, 60.0]);
    assert_eq!(comparison.rows[1].count, 2);
}

#[test]
fn country_series_summarize_whole_table() {
    let dataset = published(
        "France A,Industrie,Grande,France,90,90,90,90\n\
France B,Services,Grande,France,10,10,10,10\n",
    );
    let comparison = dataset
        .compare_countries(&["France"], &[])
        .expect("country column present");
    assert_eq!(comparison.view.series[0].values, vec![50.0, 50.0, 50.0, 50.0]);
    assert_eq!(comparison.rows[0].count, 2);

    let industry = dataset
        .view()
        .filter(&FilterSet::default().sector("Industrie"))
        .expect("valid filter");
    let filtered_groups = industry.group_by(Attribute::Country).expect("grouped");
    assert_eq!(filtered_groups[0].mean_global, 90.0);

    let counts = dataset.country_counts().expect("country column present");
    assert_eq!(counts[0].count, 2);
}

#[test]
fn geo_aggregates_flag_unmapped_countries() {
    let dataset = european_panel();
    let report = dataset.country_aggregates().expect("country column present");

    let codes: Vec<GeoCode> = report.aggregates.iter().map(|a| a.geo).collect();
    assert_eq!(
        codes,
        vec![GeoCode::Iso3("DEU"), GeoCode::Unmapped, GeoCode::Iso3("FRA")]
    );
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::Unmapped {
            country: "Atlantide".to_string()
        }]
    );
    assert_eq!(to_iso("  germany "), GeoCode::Iso3("DEU"));
}

#[test]
fn country_counts_sorted_by_size() {
    let dataset = european_panel();
    let counts = dataset.country_counts().expect("country column present");
    let pairs: Vec<(&str, usize)> = counts
        .iter()
        .map(|c| (c.country.as_str(), c.count))
        .collect();
    assert_eq!(pairs, vec![("Allemagne", 2), ("France", 2), ("Atlantide", 1)]);

    let sizes = dataset.view().group_by(Attribute::Size).expect("grouped");
    assert_eq!(sizes.iter().map(|g| g.count).sum::<usize>(), dataset.len());
}

#[test]
fn recompute_without_indicator_values_excludes_records() {
    let catalog = Arc::new(IndicatorCatalog::standard());
    let csv = format!("{PUBLISHED_HEADER}Alpha,Industrie,Grande,France,60,70,80,70\n");
    let table = CsrTableImporter::from_reader(Cursor::new(csv), &catalog).expect("table parses");
    let outcome = Dataset::score(table, catalog, PillarWeights::default());
    assert!(outcome.dataset.is_empty());
    assert_eq!(outcome.diagnostics.len(), 1);
}
