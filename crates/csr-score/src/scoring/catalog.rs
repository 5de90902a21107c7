use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The three top-level CSR dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Environment,
    Social,
    Governance,
}

impl Pillar {
    pub const fn ordered() -> [Self; 3] {
        [Self::Environment, Self::Social, Self::Governance]
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Environment => 0,
            Self::Social => 1,
            Self::Governance => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Environment => "Environnement",
            Self::Social => "Social",
            Self::Governance => "Gouvernance",
        }
    }

    /// Column carrying the precomputed pillar score in the source table.
    pub const fn score_column(self) -> &'static str {
        match self {
            Self::Environment => "Score Environnement",
            Self::Social => "Score Social",
            Self::Governance => "Score Gouvernance",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "environment" | "environnement" | "e" => Some(Self::Environment),
            "social" | "s" => Some(Self::Social),
            "governance" | "gouvernance" | "g" => Some(Self::Governance),
            _ => None,
        }
    }
}

/// Whether a larger raw value reads as a better outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherBetter,
    LowerBetter,
}

impl Direction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::HigherBetter => "higher is better",
            Self::LowerBetter => "lower is better",
        }
    }
}

/// Stable handle into an [`IndicatorCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IndicatorId(pub(crate) usize);

impl IndicatorId {
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicator {
    pub name: &'static str,
    pub pillar: Pillar,
    pub direction: Direction,
}

impl Indicator {
    const fn new(name: &'static str, pillar: Pillar, direction: Direction) -> Self {
        Self {
            name,
            pillar,
            direction,
        }
    }

    /// Name of the sibling column holding the published normalized value.
    pub fn normalized_column(&self) -> String {
        format!("{} (normalisé)", self.name)
    }
}

use Direction::{HigherBetter, LowerBetter};
use Pillar::{Environment, Governance, Social};

const STANDARD_INDICATORS: &[Indicator] = &[
    Indicator::new("Émissions GES (tonnes CO2e)", Environment, LowerBetter),
    Indicator::new("Consommation d'énergie renouvelable (%)", Environment, HigherBetter),
    Indicator::new("Déchets produits (tonnes)", Environment, LowerBetter),
    Indicator::new("Déchets recyclés (%)", Environment, HigherBetter),
    Indicator::new("Consommation d'eau (m³)", Environment, LowerBetter),
    Indicator::new("Production locale (%)", Environment, HigherBetter),
    Indicator::new("Nombre total de salariés", Social, HigherBetter),
    Indicator::new("Part de CDI (%)", Social, HigherBetter),
    Indicator::new("Part de femmes (%)", Social, HigherBetter),
    Indicator::new("Satisfaction employés (%)", Social, HigherBetter),
    Indicator::new("Femmes dans postes de direction (%)", Social, HigherBetter),
    Indicator::new("Salariés formés (%)", Social, HigherBetter),
    Indicator::new("Index Egapro (0-100)", Social, HigherBetter),
    Indicator::new("Embauches annuelles", Social, HigherBetter),
    Indicator::new("Licenciements annuels", Social, LowerBetter),
    Indicator::new("Taux d'absentéisme (%)", Social, LowerBetter),
    Indicator::new("Réunions partenaires sociaux", Social, HigherBetter),
    Indicator::new("Jours télétravaillés/salarié", Social, HigherBetter),
    Indicator::new("Ancienneté >5 ans (%)", Social, HigherBetter),
    Indicator::new("Écart salaires dirigeants/employés (ratio)", Governance, LowerBetter),
    Indicator::new("Comité éthique (1=oui, 0=non)", Governance, HigherBetter),
    Indicator::new("Fournisseurs audités RSE (%)", Governance, HigherBetter),
    Indicator::new("Formations anti-corruption", Governance, HigherBetter),
    Indicator::new("Niveaux hiérarchiques", Governance, LowerBetter),
    Indicator::new("Budget RSE (€)", Governance, HigherBetter),
    Indicator::new("Taille équipe RSE", Governance, HigherBetter),
];

/// Static description of every scored indicator, enumerated once at startup.
#[derive(Debug, Clone)]
pub struct IndicatorCatalog {
    indicators: Vec<Indicator>,
    by_name: HashMap<&'static str, IndicatorId>,
}

impl IndicatorCatalog {
    /// The 26-indicator catalog used by the published CSR table.
    pub fn standard() -> Self {
        Self::from_indicators(STANDARD_INDICATORS.to_vec())
    }

    pub fn from_indicators(indicators: Vec<Indicator>) -> Self {
        let by_name = indicators
            .iter()
            .enumerate()
            .map(|(idx, indicator)| (indicator.name, IndicatorId(idx)))
            .collect();
        Self {
            indicators,
            by_name,
        }
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn get(&self, id: IndicatorId) -> &Indicator {
        &self.indicators[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<IndicatorId> {
        let trimmed = name.trim();
        let trimmed = trimmed.strip_suffix("(normalisé)").unwrap_or(trimmed).trim_end();
        self.by_name.get(trimmed).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndicatorId, &Indicator)> {
        self.indicators
            .iter()
            .enumerate()
            .map(|(idx, indicator)| (IndicatorId(idx), indicator))
    }

    pub fn for_pillar(&self, pillar: Pillar) -> impl Iterator<Item = (IndicatorId, &Indicator)> {
        self.iter()
            .filter(move |(_, indicator)| indicator.pillar == pillar)
    }
}

impl Default for IndicatorCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_covers_all_pillars() {
        let catalog = IndicatorCatalog::standard();
        assert_eq!(catalog.len(), 26);
        assert_eq!(catalog.for_pillar(Pillar::Environment).count(), 6);
        assert_eq!(catalog.for_pillar(Pillar::Social).count(), 13);
        assert_eq!(catalog.for_pillar(Pillar::Governance).count(), 7);
    }

    #[test]
    fn lookup_accepts_normalized_column_names() {
        let catalog = IndicatorCatalog::standard();
        let id = catalog
            .lookup("Émissions GES (tonnes CO2e) (normalisé)")
            .expect("indicator known");
        let indicator = catalog.get(id);
        assert_eq!(indicator.pillar, Pillar::Environment);
        assert_eq!(indicator.direction, Direction::LowerBetter);
        assert!(catalog.lookup("Unknown metric").is_none());
    }

    #[test]
    fn pillar_parse_accepts_french_and_english() {
        assert_eq!(Pillar::parse("Gouvernance"), Some(Pillar::Governance));
        assert_eq!(Pillar::parse(" environment "), Some(Pillar::Environment));
        assert_eq!(Pillar::parse("economy"), None);
    }
}
