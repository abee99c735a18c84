use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::georisk::{FloodRiskLevel, Hazard, TransitProximity};

/// Scraped listing handed over by the harvesting front end. Never mutated by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawListing {
    pub url: Option<String>,
    pub text: String,
    pub contact: Option<String>,
    pub hints: ListingHints,
}

impl RawListing {
    /// Decode a listing payload received from a scraper or queue.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// True when the listing carries nothing the pipeline could work with.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
            && self
                .contact
                .as_deref()
                .map(|contact| contact.trim().is_empty())
                .unwrap_or(true)
            && self.hints.is_empty()
    }
}

/// Structured fields supplied alongside the free text. Authoritative over extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListingHints {
    pub price: Option<u64>,
    pub currency: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub property_type: Option<String>,
    pub floor_size_sqm: Option<f32>,
    pub bedrooms: Option<u8>,
    pub bathrooms: Option<u8>,
    pub available_from: Option<NaiveDate>,
    pub disclosures: BTreeMap<DisclosureCategory, String>,
}

impl ListingHints {
    pub fn is_empty(&self) -> bool {
        self == &ListingHints::default()
    }

    pub fn locality(&self) -> Option<&str> {
        self.locality
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Environmental or risk dimension subject to mandatory surfacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DisclosureCategory {
    #[serde(rename = "floodRisk")]
    Flood,
    #[serde(rename = "industrialProximity")]
    IndustrialProximity,
    #[serde(rename = "powerLineVisibility")]
    PowerLine,
    #[serde(rename = "noiseFactors")]
    Noise,
}

impl DisclosureCategory {
    pub const ALL: [DisclosureCategory; 4] = [
        DisclosureCategory::Flood,
        DisclosureCategory::IndustrialProximity,
        DisclosureCategory::PowerLine,
        DisclosureCategory::Noise,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            DisclosureCategory::Flood => "floodRisk",
            DisclosureCategory::IndustrialProximity => "industrialProximity",
            DisclosureCategory::PowerLine => "powerLineVisibility",
            DisclosureCategory::Noise => "noiseFactors",
        }
    }
}

impl fmt::Display for DisclosureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of domain evidence an extractor found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    FsboPhrase,
    AgentPhrase,
    OwnerDirect,
    Contact,
    Price,
    PriceAmbiguity,
    PropertyType,
    ListingType,
    Npa,
    Condition,
    Availability,
    FloorSize,
    Bedrooms,
    Bathrooms,
    Disclosure(DisclosureCategory),
    /// Disclosure or noise phrase preceded or followed by a negation cue.
    Denial(DisclosureCategory),
    NoiseFactor,
}

/// Payload carried by a signal so downstream stages consume structured data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalValue {
    Text(String),
    Amount(u64),
    Count(u32),
    Area(f32),
}

impl SignalValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SignalValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<u64> {
        match self {
            SignalValue::Amount(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u32> {
        match self {
            SignalValue::Count(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_area(&self) -> Option<f32> {
        match self {
            SignalValue::Area(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    Text,
    Contact,
    /// Aggregate over other signals; the span covers the first to last contributing match.
    Derived,
}

/// Where a signal was found, in the scan form of its source string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSpan {
    pub source: EvidenceSource,
    pub start: usize,
    pub end: usize,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSignal {
    pub category: SignalCategory,
    pub value: SignalValue,
    pub confidence: f32,
    pub evidence: EvidenceSpan,
}

impl ExtractedSignal {
    pub(crate) fn new(
        category: SignalCategory,
        value: SignalValue,
        confidence: f32,
        evidence: EvidenceSpan,
    ) -> Self {
        Self {
            category,
            value,
            confidence: confidence.clamp(0.0, 1.0),
            evidence,
        }
    }
}

/// Canonical, schema-conformant listing record consumed by formatters and the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Coordinates>,
    pub offers: Offer,
    pub physical: PhysicalAttributes,
    pub market_attributes: MarketAttributes,
    pub environmental_factors: EnvironmentalFactors,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_source: Option<FieldSource>,
    /// Set when the price came from ambiguous text and needs a human look.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Availability {
    Immediate,
    From(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldSource {
    Hint,
    Extracted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_size_sqm: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u8>,
}

impl PhysicalAttributes {
    pub fn has_room_counts(&self) -> bool {
        self.bedrooms.is_some() || self.bathrooms.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListingType {
    Sale,
    Rent,
}

impl ListingType {
    pub(crate) fn from_label(label: &str) -> Option<Self> {
        match label {
            "sale" => Some(ListingType::Sale),
            "rent" => Some(ListingType::Rent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NpaStatus {
    BankAsset,
    NotIndicated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_segment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,
    pub npa_status: NpaStatus,
    pub fsbo_signals: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalFactors {
    pub flood_risk: FloodRiskLevel,
    pub industrial_proximity: Hazard,
    pub power_line_visibility: Hazard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit: Option<TransitProximity>,
    /// Extraction order, resolver-derived entries first. Not ranked.
    pub noise_factors: Vec<String>,
    pub disclosures: BTreeMap<DisclosureCategory, Disclosure>,
    /// Categories the listing text explicitly denies ("never flooded").
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub denials: BTreeSet<DisclosureCategory>,
}

impl EnvironmentalFactors {
    pub fn disclosure(&self, category: DisclosureCategory) -> Option<&Disclosure> {
        self.disclosures.get(&category)
    }

    pub fn denies(&self, category: DisclosureCategory) -> bool {
        self.denials.contains(&category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosure {
    pub text: String,
    pub source: DisclosureSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisclosureSource {
    Hint,
    ListingText,
}
