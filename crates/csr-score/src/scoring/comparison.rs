use super::catalog::Pillar;
use super::dataset::{Dataset, DatasetView};
use super::error::{Diagnostic, ScoringError};
use super::query::{Attribute, GroupSummary};
use super::record::{CompanyScoreView, ScoredRecord};
use serde::Serialize;
use std::collections::HashSet;

pub const DEFAULT_AXES: [Pillar; 3] = Pillar::ordered();

/// Anything exposing one score per pillar can be placed on a radar.
pub trait PillarScored {
    fn entity_label(&self) -> &str;
    fn pillar_value(&self, pillar: Pillar) -> f64;
}

impl PillarScored for ScoredRecord {
    fn entity_label(&self) -> &str {
        &self.raw.company
    }

    fn pillar_value(&self, pillar: Pillar) -> f64 {
        self.pillars.get(pillar)
    }
}

impl<T: PillarScored + ?Sized> PillarScored for &T {
    fn entity_label(&self) -> &str {
        (**self).entity_label()
    }

    fn pillar_value(&self, pillar: Pillar) -> f64 {
        (**self).pillar_value(pillar)
    }
}

impl PillarScored for GroupSummary {
    fn entity_label(&self) -> &str {
        &self.group_key
    }

    fn pillar_value(&self, pillar: Pillar) -> f64 {
        self.pillar_mean(pillar)
    }
}

/// One closed polygon: the first axis value is repeated as the last entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSeries {
    pub entity: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonView {
    /// Axis labels, closed the same way as each series.
    pub axes: Vec<&'static str>,
    pub series: Vec<ComparisonSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison<T> {
    pub view: ComparisonView,
    pub rows: Vec<T>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Assemble closed polygons for `entities` in selection order.
///
/// Unknown entities are skipped and reported as [`Diagnostic::UnresolvedEntity`]; repeated
/// selections keep their first position.
pub fn build_comparison<T, S, F>(entities: &[S], axes: &[Pillar], resolve: F) -> Comparison<T>
where
    T: PillarScored,
    S: AsRef<str>,
    F: Fn(&str) -> Option<T>,
{
    let axes = if axes.is_empty() { &DEFAULT_AXES[..] } else { axes };

    let mut axis_labels: Vec<&'static str> = axes.iter().map(|pillar| pillar.label()).collect();
    axis_labels.push(axes[0].label());

    let mut seen = HashSet::new();
    let mut series = Vec::new();
    let mut rows = Vec::new();
    let mut diagnostics = Vec::new();

    for entity in entities {
        let name = entity.as_ref().trim();
        if !seen.insert(name.to_string()) {
            continue;
        }

        let Some(resolved) = resolve(name) else {
            diagnostics.push(Diagnostic::UnresolvedEntity {
                entity: name.to_string(),
            });
            continue;
        };

        let mut values: Vec<f64> = axes
            .iter()
            .map(|pillar| resolved.pillar_value(*pillar))
            .collect();
        values.push(values[0]);

        series.push(ComparisonSeries {
            entity: resolved.entity_label().to_string(),
            values,
        });
        rows.push(resolved);
    }

    Comparison {
        view: ComparisonView {
            axes: axis_labels,
            series,
        },
        rows,
        diagnostics,
    }
}

impl<'a> DatasetView<'a> {
    /// Radar comparison of companies found in this view.
    pub fn compare_companies<S: AsRef<str>>(
        &self,
        companies: &[S],
        axes: &[Pillar],
    ) -> Comparison<CompanyScoreView> {
        let comparison = build_comparison(companies, axes, |name| self.find(name));
        Comparison {
            view: comparison.view,
            rows: comparison.rows.iter().map(|r| r.to_view()).collect(),
            diagnostics: comparison.diagnostics,
        }
    }
}

impl Dataset {
    /// Radar comparison of per-country means. Countries are always summarized over
    /// every record, whatever filter the caller applies elsewhere.
    pub fn compare_countries<S: AsRef<str>>(
        &self,
        countries: &[S],
        axes: &[Pillar],
    ) -> Result<Comparison<GroupSummary>, ScoringError> {
        let summaries = self.view().group_by(Attribute::Country)?;
        Ok(build_comparison(countries, axes, |name| {
            summaries
                .iter()
                .find(|summary| summary.group_key == name)
                .cloned()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(key: &str, environment: f64, social: f64, governance: f64) -> GroupSummary {
        GroupSummary {
            group_key: key.to_string(),
            mean_environment: environment,
            mean_social: social,
            mean_governance: governance,
            mean_global: (environment + social + governance) / 3.0,
            count: 1,
        }
    }

    #[test]
    fn empty_axes_fall_back_to_all_pillars() {
        let groups = [summary("France", 10.0, 20.0, 30.0)];
        let comparison = build_comparison(&["France"], &[], |name| {
            groups.iter().find(|g| g.group_key == name)
        });

        assert_eq!(
            comparison.view.axes,
            vec!["Environnement", "Social", "Gouvernance", "Environnement"]
        );
        assert_eq!(comparison.view.series[0].values, vec![10.0, 20.0, 30.0, 10.0]);
    }

    #[test]
    fn single_axis_polygon_still_closes() {
        let groups = [summary("France", 10.0, 20.0, 30.0)];
        let comparison = build_comparison(&[" France ", "France"], &[Pillar::Social], |name| {
            groups.iter().find(|g| g.group_key == name)
        });

        assert_eq!(comparison.view.axes, vec!["Social", "Social"]);
        assert_eq!(comparison.view.series.len(), 1);
        assert_eq!(comparison.view.series[0].values, vec![20.0, 20.0]);
    }
}
