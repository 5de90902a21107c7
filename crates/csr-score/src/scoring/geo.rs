use super::dataset::Dataset;
use super::error::{Diagnostic, ScoringError};
use super::query::{Attribute, GroupSummary};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

static COUNTRY_CODES: OnceLock<HashMap<String, &'static str>> = OnceLock::new();

/// ISO 3166-1 alpha-3 lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoCode {
    Iso3(&'static str),
    Unmapped,
}

impl GeoCode {
    pub fn iso3(self) -> Option<&'static str> {
        match self {
            Self::Iso3(code) => Some(code),
            Self::Unmapped => None,
        }
    }
}

pub fn to_iso(country: &str) -> GeoCode {
    country_codes()
        .get(&normalize_country(country))
        .map_or(GeoCode::Unmapped, |code| GeoCode::Iso3(*code))
}

fn normalize_country(value: &str) -> String {
    value.trim().to_lowercase()
}

fn country_codes() -> &'static HashMap<String, &'static str> {
    COUNTRY_CODES.get_or_init(|| {
        const NAME_TO_ISO: &[(&str, &str)] = &[
            ("France", "FRA"),
            ("Allemagne", "DEU"),
            ("Germany", "DEU"),
            ("Italie", "ITA"),
            ("Italy", "ITA"),
            ("Espagne", "ESP"),
            ("Spain", "ESP"),
            ("Royaume-Uni", "GBR"),
            ("United Kingdom", "GBR"),
            ("Belgique", "BEL"),
            ("Belgium", "BEL"),
            ("Pays-Bas", "NLD"),
            ("Netherlands", "NLD"),
            ("Suisse", "CHE"),
            ("Switzerland", "CHE"),
            ("Portugal", "PRT"),
            ("Suède", "SWE"),
            ("Sweden", "SWE"),
        ];

        NAME_TO_ISO
            .iter()
            .map(|(name, code)| (normalize_country(name), *code))
            .collect()
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryAggregate {
    pub geo: GeoCode,
    #[serde(flatten)]
    pub summary: GroupSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeoReport {
    pub aggregates: Vec<CountryAggregate>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
}

impl Dataset {
    /// Per-country means over every record, tagged with their ISO code. Unmapped
    /// countries stay in the result and are flagged.
    pub fn country_aggregates(&self) -> Result<GeoReport, ScoringError> {
        let summaries = self.view().group_by(Attribute::Country)?;
        let mut diagnostics = Vec::new();

        let aggregates = summaries
            .into_iter()
            .map(|summary| {
                let geo = to_iso(&summary.group_key);
                if geo == GeoCode::Unmapped {
                    diagnostics.push(Diagnostic::Unmapped {
                        country: summary.group_key.clone(),
                    });
                }
                CountryAggregate { geo, summary }
            })
            .collect();

        Ok(GeoReport {
            aggregates,
            diagnostics,
        })
    }

    /// Number of companies per country, largest first.
    pub fn country_counts(&self) -> Result<Vec<CountryCount>, ScoringError> {
        self.schema().require(Attribute::Country.column())?;

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in self.records() {
            if let Some(country) = record.raw.country.as_deref() {
                *counts.entry(country).or_default() += 1;
            }
        }

        let mut counts: Vec<CountryCount> = counts
            .into_iter()
            .map(|(country, count)| CountryCount {
                country: country.to_string(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.country.cmp(&b.country)));
        Ok(counts)
    }
}
