use crate::infra::load_dataset;
use crate::views::{
    company_comparison, country_comparison, geo_report, groups_report, overview_report,
    pillar_report, ranking_report, CompanyComparisonRequest, CountryComparisonRequest,
    GeoResponse, GroupsReport, GroupsRequest, OverviewReport, OverviewRequest, PillarReport,
    PillarRequest, RankingReport, RankingRequest,
};
use clap::{Args, Subcommand, ValueEnum};
use csr_score::config::AppConfig;
use csr_score::error::AppError;
use csr_score::scoring::{
    Attribute, Comparison, ComparisonView, Dataset, Diagnostic, FilterSet, GroupSummary, Pillar,
    ScoreKey, ScoreMode, SortOrder,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ReportCommand {
    /// Headline means, score distribution and best companies
    Overview(OverviewArgs),
    /// Companies ranked by the global or a pillar score
    Ranking(RankingArgs),
    /// Mean scores per sector, size or country
    Groups(GroupsArgs),
    /// Radar comparison of selected companies
    Compare(CompareArgs),
    /// Per-country aggregates with ISO codes over the whole table, optionally comparing
    /// countries
    Countries(CountriesArgs),
    /// Indicator detail for one pillar
    Pillar(PillarArgs),
}

#[derive(Args, Debug)]
pub(crate) struct SourceArgs {
    /// CSR table to score (defaults to CSR_DATA_PATH)
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
    /// `recompute` scores from raw values or use the `published` score columns
    #[arg(long, value_parser = parse_score_mode)]
    pub(crate) mode: Option<ScoreMode>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
}

#[derive(Args, Debug)]
pub(crate) struct FilterArgs {
    /// Restrict to one sector ("Tous" lifts the filter)
    #[arg(long)]
    pub(crate) sector: Option<String>,
    /// Restrict to one size band (Petite, Moyenne, Grande)
    #[arg(long)]
    pub(crate) size: Option<String>,
    /// Restrict to one country
    #[arg(long)]
    pub(crate) country: Option<String>,
}

impl FilterArgs {
    fn to_filter_set(&self) -> FilterSet {
        FilterSet {
            sector: self.sector.clone(),
            size: self.size.clone(),
            country: self.country.clone(),
        }
    }
}

impl SourceArgs {
    fn load(&self) -> Result<Dataset, AppError> {
        let mut data = AppConfig::load()?.data;
        if let Some(path) = &self.data {
            data.source_path = path.clone();
        }
        if let Some(mode) = self.mode {
            data.score_mode = mode;
        }

        let outcome = load_dataset(&data)?;
        if !outcome.diagnostics.is_empty() {
            eprintln!(
                "{} record(s) excluded for missing or out-of-range scores",
                outcome.diagnostics.len()
            );
        }
        Ok(outcome.dataset)
    }
}

#[derive(Args, Debug)]
pub(crate) struct OverviewArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    filters: FilterArgs,
    /// Number of buckets in the global score histogram
    #[arg(long, default_value_t = 10)]
    bins: usize,
    /// Number of leading companies to list
    #[arg(long, default_value_t = 5)]
    top: usize,
}

#[derive(Args, Debug)]
pub(crate) struct RankingArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    filters: FilterArgs,
    /// Score to rank by: global, environment, social or governance
    #[arg(long, value_parser = parse_score_key, default_value = "global")]
    by: ScoreKey,
    /// Lowest scores first
    #[arg(long)]
    ascending: bool,
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

#[derive(Args, Debug)]
pub(crate) struct GroupsArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    filters: FilterArgs,
    /// Grouping attribute: sector, size or country
    #[arg(long, value_parser = parse_attribute, default_value = "sector")]
    by: Attribute,
}

#[derive(Args, Debug)]
pub(crate) struct CompareArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    filters: FilterArgs,
    /// Companies to compare, in display order
    #[arg(required = true)]
    companies: Vec<String>,
    /// Comma-separated pillars to use as radar axes
    #[arg(long, value_delimiter = ',', value_parser = parse_pillar)]
    axes: Vec<Pillar>,
}

#[derive(Args, Debug)]
pub(crate) struct CountriesArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Countries to compare on a radar
    countries: Vec<String>,
    #[arg(long, value_delimiter = ',', value_parser = parse_pillar)]
    axes: Vec<Pillar>,
}

#[derive(Args, Debug)]
pub(crate) struct PillarArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    filters: FilterArgs,
    /// environment, social or governance
    #[arg(value_parser = parse_pillar)]
    pillar: Pillar,
    /// Indicator of the pillar to break down per group
    #[arg(long)]
    indicator: Option<String>,
    #[arg(long, value_parser = parse_attribute, default_value = "sector")]
    by: Attribute,
    #[arg(long, default_value_t = 5)]
    top: usize,
}

#[derive(Debug, Serialize)]
struct CountriesOutput {
    geo: GeoResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<Comparison<GroupSummary>>,
}

pub(crate) fn run_report(command: ReportCommand) -> Result<(), AppError> {
    match command {
        ReportCommand::Overview(args) => {
            let dataset = args.source.load()?;
            let request = OverviewRequest {
                filters: args.filters.to_filter_set(),
                bins: args.bins,
                top: args.top,
            };
            emit(
                args.source.format,
                &overview_report(&dataset, &request)?,
                render_overview,
            )
        }
        ReportCommand::Ranking(args) => {
            let dataset = args.source.load()?;
            let request = RankingRequest {
                filters: args.filters.to_filter_set(),
                key: args.by,
                order: if args.ascending {
                    SortOrder::Ascending
                } else {
                    SortOrder::Descending
                },
                limit: args.limit,
            };
            emit(
                args.source.format,
                &ranking_report(&dataset, &request)?,
                render_ranking,
            )
        }
        ReportCommand::Groups(args) => {
            let dataset = args.source.load()?;
            let request = GroupsRequest {
                filters: args.filters.to_filter_set(),
                attribute: args.by,
            };
            emit(
                args.source.format,
                &groups_report(&dataset, &request)?,
                render_groups,
            )
        }
        ReportCommand::Compare(args) => {
            let dataset = args.source.load()?;
            let request = CompanyComparisonRequest {
                filters: args.filters.to_filter_set(),
                companies: args.companies,
                axes: args.axes,
            };
            let comparison = company_comparison(&dataset, &request)?;
            emit(args.source.format, &comparison, |comparison| {
                println!("Company comparison");
                render_comparison(&comparison.view, &comparison.diagnostics);
            })
        }
        ReportCommand::Countries(args) => {
            let dataset = args.source.load()?;
            let geo = geo_report(&dataset)?;
            let comparison = if args.countries.is_empty() {
                None
            } else {
                let request = CountryComparisonRequest {
                    countries: args.countries,
                    axes: args.axes,
                };
                Some(country_comparison(&dataset, &request)?)
            };
            emit(
                args.source.format,
                &CountriesOutput { geo, comparison },
                render_countries,
            )
        }
        ReportCommand::Pillar(args) => {
            let dataset = args.source.load()?;
            let request = PillarRequest {
                filters: args.filters.to_filter_set(),
                pillar: args.pillar,
                indicator: args.indicator,
                group_by: args.by,
                top: args.top,
            };
            emit(
                args.source.format,
                &pillar_report(&dataset, &request)?,
                render_pillar,
            )
        }
    }
}

fn emit<T: Serialize>(
    format: OutputFormat,
    report: &T,
    render: impl FnOnce(&T),
) -> Result<(), AppError> {
    match format {
        OutputFormat::Text => render(report),
        OutputFormat::Json => {
            let body = serde_json::to_string_pretty(report).map_err(std::io::Error::from)?;
            println!("{body}");
        }
    }
    Ok(())
}

fn render_overview(report: &OverviewReport) {
    let overview = &report.overview;
    println!("CSR overview ({} companies)", overview.count);
    println!(
        "- Global {} | Environnement {} | Social {} | Gouvernance {}",
        score_or_na(overview.mean_global),
        score_or_na(overview.mean_environment),
        score_or_na(overview.mean_social),
        score_or_na(overview.mean_governance)
    );

    println!("\nGlobal score distribution:");
    for bucket in &report.distribution {
        println!(
            "  {:>5.1} - {:>5.1} | {:>3} {}",
            bucket.lower,
            bucket.upper,
            bucket.count,
            "#".repeat(bucket.count)
        );
    }

    println!("\nLeading companies:");
    for (idx, company) in report.top.iter().enumerate() {
        println!(
            "  {}. {} ({}, {}) {:.1}",
            idx + 1,
            company.company,
            company.sector,
            company.size_label,
            company.global
        );
    }
}

fn render_ranking(report: &RankingReport) {
    println!(
        "Ranking by {} ({} of {} companies)",
        report.key.label(),
        report.entries.len(),
        report.total
    );
    for entry in &report.entries {
        let company = &entry.company;
        println!(
            "  {:>3}. {:<32} {:>6.1}  {} | {} | {}",
            entry.rank,
            company.company,
            entry.score,
            company.sector,
            company.size_label,
            company.country.as_deref().unwrap_or("-")
        );
    }
}

fn render_groups(report: &GroupsReport) {
    println!("Mean scores by {}", report.attribute.label());
    for group in &report.groups {
        println!(
            "- {} ({} companies): E {:.1} | S {:.1} | G {:.1} | Global {:.1}",
            group.group_key,
            group.count,
            group.mean_environment,
            group.mean_social,
            group.mean_governance,
            group.mean_global
        );
    }
}

fn render_comparison(view: &ComparisonView, diagnostics: &[Diagnostic]) {
    println!("Axes: {}", view.axes.join(" / "));
    for series in &view.series {
        let values: Vec<String> = series.values.iter().map(|v| format!("{v:.1}")).collect();
        println!("- {}: {}", series.entity, values.join(" / "));
    }
    render_diagnostics(diagnostics);
}

fn render_countries(output: &CountriesOutput) {
    println!("Country aggregates");
    for aggregate in &output.geo.aggregates {
        let summary = &aggregate.summary;
        println!(
            "- {} [{}] {} companies | Global {:.1}",
            summary.group_key,
            aggregate.geo.iso3().unwrap_or("unmapped"),
            summary.count,
            summary.mean_global
        );
    }
    render_diagnostics(&output.geo.diagnostics);

    if let Some(comparison) = &output.comparison {
        println!("\nCountry comparison");
        render_comparison(&comparison.view, &comparison.diagnostics);
    }
}

fn render_pillar(report: &PillarReport) {
    println!(
        "{} pillar (mean {})",
        report.label,
        score_or_na(report.mean)
    );
    for indicator in &report.indicators {
        println!(
            "- {:<48} {:>6} ({}, {} values)",
            indicator.indicator,
            score_or_na(indicator.mean),
            indicator.direction.label(),
            indicator.count
        );
    }

    if let Some(breakdown) = &report.breakdown {
        println!(
            "\n{} by {}",
            breakdown.indicator,
            breakdown.attribute.label()
        );
        for group in &breakdown.groups {
            println!(
                "  - {}: {:.1} ({} values)",
                group.group_key, group.mean, group.count
            );
        }
    }

    println!("\nLeaders:");
    for (idx, company) in report.leaders.iter().enumerate() {
        println!(
            "  {}. {} {:.1}",
            idx + 1,
            company.company,
            match report.pillar {
                Pillar::Environment => company.environment,
                Pillar::Social => company.social,
                Pillar::Governance => company.governance,
            }
        );
    }
}

fn render_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        println!("  ! {diagnostic}");
    }
}

fn score_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}"))
}

fn parse_score_mode(raw: &str) -> Result<ScoreMode, String> {
    ScoreMode::parse(raw).ok_or_else(|| format!("unknown score mode '{raw}'"))
}

fn parse_score_key(raw: &str) -> Result<ScoreKey, String> {
    ScoreKey::parse(raw).ok_or_else(|| format!("unknown score '{raw}'"))
}

fn parse_attribute(raw: &str) -> Result<Attribute, String> {
    Attribute::parse(raw).ok_or_else(|| format!("unknown attribute '{raw}'"))
}

fn parse_pillar(raw: &str) -> Result<Pillar, String> {
    Pillar::parse(raw).ok_or_else(|| format!("unknown pillar '{raw}'"))
}
