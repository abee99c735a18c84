use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::config::PipelineConfig;
use super::domain::{DisclosureCategory, PropertyRecord};
use super::georisk::{FloodRiskLevel, GeoRiskResult, Hazard};
use super::scoring::ChecklistField;

/// Per-category outcome of cross-checking resolver output against the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisclosureStatus {
    NotApplicable,
    Disclosed,
    UndisclosedKnown,
    Unknown,
}

impl DisclosureStatus {
    pub fn is_blocking(self) -> bool {
        matches!(self, DisclosureStatus::UndisclosedKnown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "field")]
pub enum ViolationCategory {
    UndisclosedRisk(DisclosureCategory),
    MissingField(ChecklistField),
    PriceOutsideSegments,
}

/// Data quality problem accumulated on an invalid result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub category: ViolationCategory,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureReport {
    pub statuses: BTreeMap<DisclosureCategory, DisclosureStatus>,
    pub violations: Vec<Violation>,
}

impl DisclosureReport {
    pub fn is_valid(&self) -> bool {
        !self.statuses.values().any(|status| status.is_blocking())
    }

    pub fn status(&self, category: DisclosureCategory) -> Option<DisclosureStatus> {
        self.statuses.get(&category).copied()
    }
}

/// What the resolver knows about one category before looking at the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RiskState {
    Present,
    Absent,
    Unknown,
}

impl From<Hazard> for RiskState {
    fn from(hazard: Hazard) -> Self {
        match hazard {
            Hazard::Present => RiskState::Present,
            Hazard::Absent => RiskState::Absent,
            Hazard::Unknown => RiskState::Unknown,
        }
    }
}

impl From<FloodRiskLevel> for RiskState {
    fn from(level: FloodRiskLevel) -> Self {
        match level {
            FloodRiskLevel::Absent => RiskState::Absent,
            FloodRiskLevel::Unknown => RiskState::Unknown,
            FloodRiskLevel::LowSeasonal | FloodRiskLevel::Moderate | FloodRiskLevel::High => {
                RiskState::Present
            }
        }
    }
}

/// Blocks records that stay silent about a risk the resolver reports.
#[derive(Debug, Clone)]
pub struct DisclosureEnforcer {
    categories: Vec<DisclosureCategory>,
    noise_radius_m: u32,
}

impl DisclosureEnforcer {
    pub fn new(categories: Vec<DisclosureCategory>, noise_radius_m: u32) -> Self {
        let mut categories = categories;
        categories.sort();
        categories.dedup();
        Self {
            categories,
            noise_radius_m,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.disclosure.categories.clone(),
            config.disclosure.noise_radius_m,
        )
    }

    pub fn enforce(&self, record: &PropertyRecord, geo: &GeoRiskResult) -> DisclosureReport {
        let mut statuses = BTreeMap::new();
        let mut violations = Vec::new();

        for category in &self.categories {
            let disclosed = record
                .environmental_factors
                .disclosure(*category)
                .is_some_and(|disclosure| !disclosure.text.trim().is_empty());

            let status = match (self.risk_state(*category, geo), disclosed) {
                (RiskState::Unknown, _) => DisclosureStatus::Unknown,
                (RiskState::Absent, _) => DisclosureStatus::NotApplicable,
                (RiskState::Present, true) => DisclosureStatus::Disclosed,
                (RiskState::Present, false) => DisclosureStatus::UndisclosedKnown,
            };

            if status.is_blocking() {
                violations.push(Violation {
                    category: ViolationCategory::UndisclosedRisk(*category),
                    reason: self.undisclosed_reason(*category, record, geo),
                });
            }
            statuses.insert(*category, status);
        }

        DisclosureReport {
            statuses,
            violations,
        }
    }

    fn risk_state(&self, category: DisclosureCategory, geo: &GeoRiskResult) -> RiskState {
        match category {
            DisclosureCategory::Flood => geo.flood_risk.into(),
            DisclosureCategory::IndustrialProximity => geo.industrial_proximity.into(),
            DisclosureCategory::PowerLine => geo.power_line.into(),
            DisclosureCategory::Noise if geo.is_degraded() => RiskState::Unknown,
            DisclosureCategory::Noise => {
                if geo.transit_within(self.noise_radius_m).is_some() {
                    RiskState::Present
                } else {
                    RiskState::Absent
                }
            }
        }
    }

    fn undisclosed_reason(
        &self,
        category: DisclosureCategory,
        record: &PropertyRecord,
        geo: &GeoRiskResult,
    ) -> String {
        if record.environmental_factors.denies(category) {
            return match category {
                DisclosureCategory::Flood => format!(
                    "listing denies known flood risk ({})",
                    geo.flood_risk.label()
                ),
                DisclosureCategory::IndustrialProximity => {
                    "listing denies known industrial proximity".to_string()
                }
                DisclosureCategory::PowerLine => {
                    "listing denies visible high-voltage lines".to_string()
                }
                DisclosureCategory::Noise => "listing denies known noise factors".to_string(),
            };
        }

        match category {
            DisclosureCategory::Flood => format!(
                "flood risk is {} but the listing does not disclose it",
                geo.flood_risk.label()
            ),
            DisclosureCategory::IndustrialProximity => {
                "listing is near an industrial zone but does not disclose it".to_string()
            }
            DisclosureCategory::PowerLine => {
                "high-voltage lines are visible but the listing does not disclose them".to_string()
            }
            DisclosureCategory::Noise => match geo.transit_within(self.noise_radius_m) {
                Some(transit) => format!(
                    "{} is {} m away but no noise factors are disclosed",
                    transit.line, transit.distance_m
                ),
                None => "noise factors are not disclosed".to_string(),
            },
        }
    }
}
