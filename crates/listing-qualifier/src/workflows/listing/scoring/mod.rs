mod config;
mod rules;

pub use config::{ChecklistField, ChecklistWeights, ScoringConfig, ScoringWeights, TargetSegment};
pub(crate) use rules::is_populated;

use serde::{Deserialize, Serialize};

use super::disclosure::DisclosureReport;
use super::domain::{ExtractedSignal, PropertyRecord};

/// Stateless scorer applying the configured rubric to a normalized record.
#[derive(Debug, Clone)]
pub struct LeadScorer {
    config: ScoringConfig,
}

impl LeadScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(
        &self,
        signals: &[ExtractedSignal],
        record: &PropertyRecord,
        disclosure: &DisclosureReport,
    ) -> ScoreReport {
        let owner_probability = rules::owner_probability(signals);
        let contact_confidence = rules::contact_confidence(signals);
        let price_fit = rules::price_fit(record, &self.config);
        let data_completeness = rules::data_completeness(record, disclosure, &self.config.checklist);

        let weights = &self.config.weights;
        let weighted = [
            (weights.owner_probability, owner_probability.value),
            (weights.contact_confidence, contact_confidence.value),
            (weights.price_fit, price_fit.value),
            (weights.data_completeness, data_completeness.value),
        ];
        let total_weight: f32 = weighted.iter().map(|(weight, _)| weight).sum();
        let sum: f32 = weighted.iter().map(|(weight, value)| weight * value).sum();
        let overall = if total_weight > 0.0 {
            (100.0 * sum / total_weight).round()
        } else {
            0.0
        };

        ScoreReport {
            owner_probability,
            contact_confidence,
            price_fit,
            data_completeness,
            overall_score: overall.clamp(0.0, 100.0) as u8,
            target_segment: self.config.target_segment.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreFactor {
    OwnerProbability,
    ContactConfidence,
    PriceFit,
    DataCompleteness,
}

/// One sub-score with the notes and evidence that justify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub value: f32,
    pub notes: String,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub owner_probability: ScoreComponent,
    pub contact_confidence: ScoreComponent,
    pub price_fit: ScoreComponent,
    pub data_completeness: ScoreComponent,
    /// 0..=100.
    pub overall_score: u8,
    pub target_segment: String,
}
