use csr_score::ingest::CsrTableImporter;
use csr_score::scoring::{
    normalizer::ZERO_VARIANCE_SCORE, Attribute, Dataset, Diagnostic, FilterSet, IndicatorCatalog,
    Pillar, PillarWeights, ScoreKey, ScoringError, Size, SortOrder,
};
use std::io::Cursor;
use std::sync::Arc;

const EMISSIONS: &str = "Émissions GES (tonnes CO2e)";
const WOMEN: &str = "Part de femmes (%)";
const ETHICS: &str = "Comité éthique (1=oui, 0=non)";

fn header() -> String {
    format!("Entreprise,Secteur,Taille,Pays,{EMISSIONS},{WOMEN},\"{ETHICS}\"\n")
}

fn score(csv: &str) -> (Dataset, Vec<Diagnostic>) {
    let catalog = Arc::new(IndicatorCatalog::standard());
    let table = CsrTableImporter::from_reader(Cursor::new(csv.to_string()), &catalog)
        .expect("table parses");
    let outcome = Dataset::score(table, catalog, PillarWeights::default());
    (outcome.dataset, outcome.diagnostics)
}

fn sample() -> (Dataset, Vec<Diagnostic>) {
    let csv = header()
        + "Alpha,Industrie,Grande,France,10,40,1\n\
Beta,Services,Petite,France,50,55,0\n\
Gamma,Industrie,Moyenne,Allemagne,90,70,1\n\
Delta,Services,Grande,Allemagne,30,35,0\n\
Epsilon,Industrie,Petite,Allemagne,70,60,1\n";
    score(&csv)
}

#[test]
fn lower_better_indicator_inverts_raw_values() {
    let csv = header()
        + "A,Industrie,Grande,France,10,40,1\n\
B,Industrie,Grande,France,50,40,1\n\
C,Industrie,Grande,France,90,40,1\n";
    let (dataset, diagnostics) = score(&csv);
    assert!(diagnostics.is_empty());

    let emissions = dataset.catalog().lookup(EMISSIONS).expect("catalog entry");
    let scores: Vec<f64> = dataset
        .records()
        .iter()
        .map(|record| record.normalized.score(emissions).expect("present"))
        .collect();
    assert_eq!(scores, vec![100.0, 50.0, 0.0]);

    let women = dataset.catalog().lookup(WOMEN).expect("catalog entry");
    assert!(dataset
        .records()
        .iter()
        .all(|record| record.normalized.score(women) == Some(ZERO_VARIANCE_SCORE)));
}

#[test]
fn every_score_stays_in_range_and_global_matches_pillars() {
    let (dataset, _) = sample();
    for record in dataset.records() {
        for score in record.normalized.scores.iter().flatten() {
            assert!((0.0..=100.0).contains(score), "normalized {score} out of range");
        }
        for pillar in Pillar::ordered() {
            let value = record.pillars.get(pillar);
            assert!((0.0..=100.0).contains(&value));
        }
        let mean =
            (record.pillars.environment + record.pillars.social + record.pillars.governance) / 3.0;
        assert!((record.global - mean).abs() < 1e-9);
    }
}

#[test]
fn higher_better_maximum_scores_hundred() {
    let (dataset, _) = sample();
    let women = dataset.catalog().lookup(WOMEN).expect("catalog entry");
    let best = dataset
        .records()
        .iter()
        .find(|record| record.raw.company == "Gamma")
        .expect("Gamma present");
    assert_eq!(best.normalized.score(women), Some(100.0));
}

#[test]
fn filtering_keeps_bounds_and_order() {
    let (dataset, _) = sample();
    let before = dataset.bounds().clone();
    let full = dataset.view();

    let industrie = full
        .filter(&FilterSet::default().sector("Industrie"))
        .expect("sector filter");
    let names: Vec<&str> = industrie.records().iter().map(|r| r.company()).collect();
    assert_eq!(names, vec!["Alpha", "Gamma", "Epsilon"]);
    assert_eq!(industrie.bounds(), &before);

    let narrowed = industrie
        .filter(&FilterSet::default().size("Petite").country("Allemagne"))
        .expect("chained filter");
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed.records()[0].company(), "Epsilon");

    let alpha_full = full.find("Alpha").expect("alpha");
    let alpha_filtered = industrie.find("Alpha").expect("alpha");
    assert_eq!(alpha_full.normalized, alpha_filtered.normalized);
    assert_eq!(dataset.len(), 5);
}

#[test]
fn any_token_lifts_constraints() {
    let (dataset, _) = sample();
    let view = dataset
        .view()
        .filter(&FilterSet::default().sector("Tous").size("Toutes").country("any"))
        .expect("filters parse");
    assert_eq!(view.len(), dataset.len());
}

#[test]
fn unknown_size_filter_matches_nothing() {
    let (dataset, _) = sample();
    let view = dataset
        .view()
        .filter(&FilterSet::default().size("Huge"))
        .expect("filter applies");
    assert!(view.is_empty());

    let alias = dataset
        .view()
        .filter(&FilterSet::default().size("pme"))
        .expect("filter applies");
    assert_eq!(alias.len(), 2);
    assert!(alias.records().iter().all(|r| r.raw.size == Size::Small));
}

#[test]
fn group_by_sector_counts_cover_dataset() {
    let (dataset, _) = sample();
    let groups = dataset.view().group_by(Attribute::Sector).expect("grouped");
    let keys: Vec<&str> = groups.iter().map(|g| g.group_key.as_str()).collect();
    assert_eq!(keys, vec!["Industrie", "Services"]);
    assert_eq!(groups.iter().map(|g| g.count).sum::<usize>(), dataset.len());

    let services = &groups[1];
    let members: Vec<_> = dataset
        .records()
        .iter()
        .filter(|r| r.raw.sector == "Services")
        .collect();
    let expected = members.iter().map(|r| r.global).sum::<f64>() / members.len() as f64;
    assert!((services.mean_global - expected).abs() < 1e-9);
}

#[test]
fn group_by_country_returns_one_summary_per_country() {
    let (dataset, _) = sample();
    let groups = dataset.view().group_by(Attribute::Country).expect("grouped");
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].group_key, "Allemagne");
    assert_eq!(groups[0].count, 3);
    assert_eq!(groups[1].group_key, "France");
    assert_eq!(groups[1].count, 2);
}

#[test]
fn group_by_size_uses_labels() {
    let (dataset, _) = sample();
    let groups = dataset.view().group_by(Attribute::Size).expect("grouped");
    let keys: Vec<&str> = groups.iter().map(|g| g.group_key.as_str()).collect();
    assert_eq!(keys, vec!["Grande", "Moyenne", "Petite"]);
}

#[test]
fn records_without_pillar_data_are_excluded_and_reported() {
    let csv = header()
        + "Alpha,Industrie,Grande,France,10,40,1\n\
Hollow,Industrie,Grande,France,20,45,\n";
    let (dataset, diagnostics) = score(&csv);
    assert_eq!(dataset.len(), 1);
    assert_eq!(
        diagnostics,
        vec![Diagnostic::InsufficientData {
            entity: "Hollow".to_string(),
            pillar: Pillar::Governance,
        }]
    );
    let groups = dataset.view().group_by(Attribute::Sector).expect("grouped");
    assert_eq!(groups[0].count, 1);
}

#[test]
fn country_queries_fail_without_country_column() {
    let csv = format!("Entreprise,Secteur,Taille,{EMISSIONS},{WOMEN},\"{ETHICS}\"\n")
        + "Alpha,Industrie,Grande,10,40,1\n";
    let (dataset, _) = score(&csv);
    let view = dataset.view();

    assert!(view.group_by(Attribute::Sector).is_ok());
    for result in [
        view.group_by(Attribute::Country).map(|_| ()),
        view.filter(&FilterSet::default().country("France")).map(|_| ()),
        dataset.country_counts().map(|_| ()),
        dataset.country_aggregates().map(|_| ()),
    ] {
        match result {
            Err(ScoringError::SchemaMismatch { column }) => assert_eq!(column, "Pays"),
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }
}

#[test]
fn indicator_by_group_requires_indicator_column() {
    let (dataset, _) = sample();
    let view = dataset.view();
    let catalog = dataset.catalog();

    let women = catalog.lookup(WOMEN).expect("catalog entry");
    let by_country = view
        .indicator_by_group(women, Attribute::Country)
        .expect("column present");
    assert_eq!(by_country.len(), 2);
    assert!(by_country[0].mean >= by_country[1].mean);

    let budget = catalog.lookup("Budget RSE (€)").expect("catalog entry");
    let err = view
        .indicator_by_group(budget, Attribute::Country)
        .expect_err("budget column absent");
    assert!(matches!(err, ScoringError::SchemaMismatch { .. }));
}

#[test]
fn indicator_means_follow_catalog_order() {
    let (dataset, _) = sample();
    let means = dataset.view().indicator_means(Pillar::Environment);
    assert_eq!(means.len(), 6);
    assert_eq!(means[0].indicator, EMISSIONS);
    assert_eq!(means[0].count, 5);
    assert!(means[0].mean.is_some());
    assert!(means[1..].iter().all(|m| m.mean.is_none() && m.count == 0));
}

#[test]
fn overview_and_distribution_cover_the_view() {
    let (dataset, _) = sample();
    let view = dataset.view();
    let overview = view.overview();
    assert_eq!(overview.count, 5);
    assert!(overview.mean_global.is_some());

    let buckets = view.distribution(ScoreKey::Global, 20).expect("bins");
    assert_eq!(buckets.len(), 20);
    assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 5);
    assert!(matches!(
        view.distribution(ScoreKey::Global, 0),
        Err(ScoringError::EmptyBinning)
    ));

    let empty = view
        .filter(&FilterSet::default().sector("Banque"))
        .expect("filter");
    assert_eq!(empty.overview().mean_global, None);
}

#[test]
fn top_n_breaks_ties_by_name() {
    let (dataset, _) = sample();
    let ranked = dataset.view().top_n(3, ScoreKey::Global, SortOrder::Descending);
    assert_eq!(ranked.len(), 3);
    for pair in ranked.windows(2) {
        assert!(pair[0].global >= pair[1].global);
    }

    let ascending = dataset
        .view()
        .top_n(10, ScoreKey::Environment, SortOrder::Ascending);
    assert_eq!(ascending.len(), 5);
    assert_eq!(ascending[0].company(), "Gamma");
}
