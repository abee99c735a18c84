use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::super::config::PipelineConfigError;

/// Rubric configuration: segments, sub-score weights and the completeness checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub segments: Vec<TargetSegment>,
    pub target_segment: String,
    pub weights: ScoringWeights,
    pub checklist: ChecklistWeights,
}

impl ScoringConfig {
    pub fn target(&self) -> Option<&TargetSegment> {
        self.segments
            .iter()
            .find(|segment| segment.name == self.target_segment)
    }

    pub(crate) fn validate(&self) -> Result<(), PipelineConfigError> {
        if self.segments.is_empty() {
            return Err(PipelineConfigError::NoSegments);
        }

        let mut seen = BTreeSet::new();
        for segment in &self.segments {
            if segment.min_price > segment.max_price {
                return Err(PipelineConfigError::InvertedSegment(segment.name.clone()));
            }
            if !seen.insert(segment.name.as_str()) {
                return Err(PipelineConfigError::DuplicateSegment(segment.name.clone()));
            }
        }

        if self.target().is_none() {
            return Err(PipelineConfigError::UnknownTargetSegment(
                self.target_segment.clone(),
            ));
        }

        check_weights(
            "weights",
            &[
                ("owner_probability", self.weights.owner_probability),
                ("contact_confidence", self.weights.contact_confidence),
                ("price_fit", self.weights.price_fit),
                ("data_completeness", self.weights.data_completeness),
            ],
        )?;
        check_weights(
            "checklist",
            &ChecklistField::ALL.map(|field| (field.label(), self.checklist.weight(field))),
        )
    }
}

fn check_weights(group: &'static str, weights: &[(&'static str, f32)]) -> Result<(), PipelineConfigError> {
    for &(name, value) in weights {
        if !value.is_finite() || value < 0.0 {
            return Err(PipelineConfigError::InvalidWeight { name, value });
        }
    }

    if weights.iter().map(|(_, value)| value).sum::<f32>() <= 0.0 {
        return Err(PipelineConfigError::ZeroWeights { group });
    }

    Ok(())
}

/// Named price band used for lead qualification (e.g. affordable 2–3M THB).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSegment {
    pub name: String,
    pub min_price: u64,
    pub max_price: u64,
    /// Distance outside the bounds over which the fit decays linearly to zero.
    pub tolerance: u64,
}

impl TargetSegment {
    pub fn contains(&self, price: u64) -> bool {
        (self.min_price..=self.max_price).contains(&price)
    }

    pub fn fit(&self, price: u64) -> f32 {
        if self.contains(price) {
            return 1.0;
        }
        if self.tolerance == 0 {
            return 0.0;
        }

        let distance = if price < self.min_price {
            self.min_price - price
        } else {
            price - self.max_price
        };
        (1.0 - distance as f64 / self.tolerance as f64).max(0.0) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub owner_probability: f32,
    pub contact_confidence: f32,
    pub price_fit: f32,
    pub data_completeness: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistWeights {
    pub price: f32,
    pub location: f32,
    pub property_type: f32,
    pub floor_size: f32,
    pub room_counts: f32,
    pub environmental_disclosure: f32,
}

impl ChecklistWeights {
    pub fn weight(&self, field: ChecklistField) -> f32 {
        match field {
            ChecklistField::Price => self.price,
            ChecklistField::Location => self.location,
            ChecklistField::PropertyType => self.property_type,
            ChecklistField::FloorSize => self.floor_size,
            ChecklistField::RoomCounts => self.room_counts,
            ChecklistField::EnvironmentalDisclosure => self.environmental_disclosure,
        }
    }

    pub fn total(&self) -> f32 {
        ChecklistField::ALL
            .iter()
            .map(|field| self.weight(*field))
            .sum()
    }
}

/// Field on the completeness checklist; also used to name required fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChecklistField {
    Price,
    Location,
    PropertyType,
    FloorSize,
    RoomCounts,
    /// Populated when no category is `undisclosed-known`. Only valid records are scored,
    /// so its weight is a constant credit in every score and never tells two leads apart.
    EnvironmentalDisclosure,
}

impl ChecklistField {
    pub const ALL: [ChecklistField; 6] = [
        ChecklistField::Price,
        ChecklistField::Location,
        ChecklistField::PropertyType,
        ChecklistField::FloorSize,
        ChecklistField::RoomCounts,
        ChecklistField::EnvironmentalDisclosure,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ChecklistField::Price => "price",
            ChecklistField::Location => "location",
            ChecklistField::PropertyType => "propertyType",
            ChecklistField::FloorSize => "floorSize",
            ChecklistField::RoomCounts => "roomCounts",
            ChecklistField::EnvironmentalDisclosure => "environmentalDisclosure",
        }
    }
}
