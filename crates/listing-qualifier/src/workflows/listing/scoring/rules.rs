use super::super::disclosure::DisclosureReport;
use super::super::domain::{ExtractedSignal, PropertyRecord, SignalCategory};
use super::config::{ChecklistField, ChecklistWeights, ScoringConfig};
use super::{ScoreComponent, ScoreFactor};

pub(crate) fn owner_probability(signals: &[ExtractedSignal]) -> ScoreComponent {
    let Some(owner) = strongest(signals, SignalCategory::OwnerDirect) else {
        return ScoreComponent {
            factor: ScoreFactor::OwnerProbability,
            value: 0.0,
            notes: "no owner or agent phrases found".to_string(),
            evidence: Vec::new(),
        };
    };

    let evidence = signals
        .iter()
        .filter(|signal| {
            matches!(
                signal.category,
                SignalCategory::FsboPhrase | SignalCategory::AgentPhrase
            )
        })
        .map(|signal| signal.evidence.excerpt.clone())
        .collect();

    ScoreComponent {
        factor: ScoreFactor::OwnerProbability,
        value: owner.confidence.clamp(0.0, 1.0),
        notes: owner
            .value
            .as_text()
            .unwrap_or("owner-direct evidence")
            .to_string(),
        evidence,
    }
}

pub(crate) fn contact_confidence(signals: &[ExtractedSignal]) -> ScoreComponent {
    match strongest(signals, SignalCategory::Contact) {
        Some(contact) => ScoreComponent {
            factor: ScoreFactor::ContactConfidence,
            value: contact.confidence,
            notes: if contact.confidence >= 1.0 {
                "phone number corroborated by listing text".to_string()
            } else {
                "phone number found in one place only".to_string()
            },
            evidence: vec![contact.evidence.excerpt.clone()],
        },
        None => ScoreComponent {
            factor: ScoreFactor::ContactConfidence,
            value: 0.0,
            notes: "no phone number found".to_string(),
            evidence: Vec::new(),
        },
    }
}

pub(crate) fn price_fit(record: &PropertyRecord, config: &ScoringConfig) -> ScoreComponent {
    let (Some(price), Some(target)) = (record.offers.price, config.target()) else {
        return ScoreComponent {
            factor: ScoreFactor::PriceFit,
            value: 0.0,
            notes: "no price stated".to_string(),
            evidence: Vec::new(),
        };
    };

    let value = target.fit(price);
    let notes = if target.contains(price) {
        format!(
            "price {price} within {} ({}..={})",
            target.name, target.min_price, target.max_price
        )
    } else if value > 0.0 {
        format!("price {price} outside {} within tolerance", target.name)
    } else {
        format!("price {price} outside {}", target.name)
    };

    ScoreComponent {
        factor: ScoreFactor::PriceFit,
        value,
        notes,
        evidence: vec![price.to_string()],
    }
}

pub(crate) fn data_completeness(
    record: &PropertyRecord,
    disclosure: &DisclosureReport,
    checklist: &ChecklistWeights,
) -> ScoreComponent {
    let total = checklist.total();
    let mut populated_weight = 0.0_f32;
    let mut populated = Vec::new();
    let mut missing = Vec::new();

    for field in ChecklistField::ALL {
        if is_populated(field, record, disclosure) {
            populated_weight += checklist.weight(field);
            populated.push(field.label().to_string());
        } else {
            missing.push(field.label());
        }
    }

    let value = if total > 0.0 {
        (populated_weight / total).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let notes = if missing.is_empty() {
        "all checklist fields populated".to_string()
    } else {
        format!("missing: {}", missing.join(", "))
    };

    ScoreComponent {
        factor: ScoreFactor::DataCompleteness,
        value,
        notes,
        evidence: populated,
    }
}

pub(crate) fn is_populated(
    field: ChecklistField,
    record: &PropertyRecord,
    disclosure: &DisclosureReport,
) -> bool {
    match field {
        ChecklistField::Price => record.offers.price.is_some(),
        ChecklistField::Location => record.address.locality.is_some() || record.geo.is_some(),
        ChecklistField::PropertyType => record.market_attributes.property_type.is_some(),
        ChecklistField::FloorSize => record.physical.floor_size_sqm.is_some(),
        ChecklistField::RoomCounts => record.physical.has_room_counts(),
        ChecklistField::EnvironmentalDisclosure => disclosure.is_valid(),
    }
}

fn strongest(signals: &[ExtractedSignal], category: SignalCategory) -> Option<&ExtractedSignal> {
    signals
        .iter()
        .filter(|signal| signal.category == category)
        .fold(None, |chosen: Option<&ExtractedSignal>, signal| match chosen {
            Some(current) if current.confidence >= signal.confidence => Some(current),
            _ => Some(signal),
        })
}
