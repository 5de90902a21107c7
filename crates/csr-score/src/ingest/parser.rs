use super::normalizer::clean_header;
use crate::scoring::catalog::{IndicatorCatalog, Pillar};
use crate::scoring::record::{PublishedScores, RawRecord, Size, SourceSchema, SourceTable};
use crate::scoring::{ScoringError, GLOBAL_SCORE_COLUMN};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::io::Read;

pub const COMPANY_COLUMN: &str = "Entreprise";
pub const SECTOR_COLUMN: &str = "Secteur";
pub const SIZE_COLUMN: &str = "Taille";
pub const COUNTRY_COLUMN: &str = "Pays";

const REQUIRED_COLUMNS: [&str; 3] = [COMPANY_COLUMN, SECTOR_COLUMN, SIZE_COLUMN];

#[derive(Debug, Deserialize)]
struct CompanyRow {
    #[serde(rename = "Entreprise")]
    company: String,
    #[serde(rename = "Secteur")]
    sector: String,
    #[serde(rename = "Taille")]
    size: String,
    #[serde(rename = "Pays", default, deserialize_with = "empty_string_as_none")]
    country: Option<String>,
}

/// Column positions resolved once against the header row.
struct ColumnLayout {
    indicators: Vec<Option<usize>>,
    normalized: Vec<Option<usize>>,
    pillar_scores: [Option<usize>; 3],
    global_score: Option<usize>,
}

impl ColumnLayout {
    fn resolve(headers: &csv::StringRecord, catalog: &IndicatorCatalog) -> Self {
        let positions: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name, idx))
            .collect();

        let indicators = catalog
            .iter()
            .map(|(_, indicator)| positions.get(indicator.name).copied())
            .collect();
        let normalized = catalog
            .iter()
            .map(|(_, indicator)| {
                positions
                    .get(indicator.normalized_column().as_str())
                    .copied()
            })
            .collect();
        let pillar_scores =
            Pillar::ordered().map(|pillar| positions.get(pillar.score_column()).copied());

        Self {
            indicators,
            normalized,
            pillar_scores,
            global_score: positions.get(GLOBAL_SCORE_COLUMN).copied(),
        }
    }

    fn missing_columns(
        &self,
        headers: &csv::StringRecord,
        catalog: &IndicatorCatalog,
    ) -> SourceSchema {
        let mut schema = SourceSchema::default();
        if !headers.iter().any(|h| h == COUNTRY_COLUMN) {
            schema.missing_columns.insert(COUNTRY_COLUMN.to_string());
        }
        for ((_, indicator), position) in catalog.iter().zip(&self.indicators) {
            if position.is_none() {
                schema.missing_columns.insert(indicator.name.to_string());
            }
        }
        for (pillar, position) in Pillar::ordered().iter().zip(&self.pillar_scores) {
            if position.is_none() {
                schema
                    .missing_columns
                    .insert(pillar.score_column().to_string());
            }
        }
        if self.global_score.is_none() {
            schema.missing_columns.insert(GLOBAL_SCORE_COLUMN.to_string());
        }
        schema
    }
}

pub(crate) fn parse_table<R: Read>(
    reader: R,
    catalog: &IndicatorCatalog,
) -> Result<SourceTable, ScoringError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: csv::StringRecord = csv_reader.headers()?.iter().map(clean_header).collect();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ScoringError::SchemaMismatch {
                column: column.to_string(),
            });
        }
    }

    let layout = ColumnLayout::resolve(&headers, catalog);
    let schema = layout.missing_columns(&headers, catalog);

    let mut records = Vec::new();
    let mut published = Vec::new();
    for (idx, result) in csv_reader.records().enumerate() {
        let row = result?;
        let line = row
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(idx + 2);
        let company: CompanyRow = row.deserialize(Some(&headers))?;

        if company.company.trim().is_empty() {
            return Err(invalid(line, COMPANY_COLUMN, &company.company));
        }
        let size = Size::parse(&company.size)
            .ok_or_else(|| invalid(line, SIZE_COLUMN, &company.size))?;

        let values = read_cells(&row, &headers, &layout.indicators, line)?;
        let normalized = read_cells(&row, &headers, &layout.normalized, line)?;
        let [environment, social, governance] = layout
            .pillar_scores
            .map(|position| read_cell(&row, &headers, position, line));

        published.push(PublishedScores {
            environment: environment?,
            social: social?,
            governance: governance?,
            global: read_cell(&row, &headers, layout.global_score, line)?,
            normalized,
        });
        records.push(RawRecord {
            company: company.company,
            sector: company.sector,
            size,
            country: company.country,
            values,
        });
    }

    Ok(SourceTable {
        records,
        published,
        schema,
    })
}

fn read_cells(
    row: &csv::StringRecord,
    headers: &csv::StringRecord,
    positions: &[Option<usize>],
    line: usize,
) -> Result<Vec<Option<f64>>, ScoringError> {
    positions
        .iter()
        .map(|position| read_cell(row, headers, *position, line))
        .collect()
}

fn read_cell(
    row: &csv::StringRecord,
    headers: &csv::StringRecord,
    position: Option<usize>,
    line: usize,
) -> Result<Option<f64>, ScoringError> {
    let Some(position) = position else {
        return Ok(None);
    };
    let raw = row.get(position).unwrap_or_default();
    parse_number(raw)
        .ok_or_else(|| invalid(line, headers.get(position).unwrap_or_default(), raw))
}

/// `Some(None)` for blank or non-finite cells, `None` when the text is not a number.
fn parse_number(raw: &str) -> Option<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("nan")
    {
        return Some(None);
    }

    let value = trimmed
        .parse::<f64>()
        .or_else(|_| trimmed.replace(',', ".").parse::<f64>())
        .ok()?;
    Some(value.is_finite().then_some(value))
}

fn invalid(line: usize, column: &str, value: &str) -> ScoringError {
    ScoringError::InvalidValue {
        row: line,
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
pub(crate) fn parse_number_for_tests(raw: &str) -> Option<Option<f64>> {
    parse_number(raw)
}
