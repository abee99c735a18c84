use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::listing::config::{DisclosureConfig, PipelineConfig};
use crate::workflows::listing::domain::{DisclosureCategory, ListingHints, RawListing};
use crate::workflows::listing::extraction::{
    CompiledDictionary, ListingTypePhrases, PhraseDictionary, WeightedPhrase,
};
use crate::workflows::listing::georisk::{
    FloodRiskLevel, GeoQuery, GeoRiskResolver, GeoRiskResult, GeoRiskSource, Hazard,
    ResolverError, TransitProximity,
};
use crate::workflows::listing::pipeline::ListingPipeline;
use crate::workflows::listing::scoring::{
    ChecklistWeights, ScoringConfig, ScoringWeights, TargetSegment,
};

pub(super) const SCENARIO_TEXT: &str =
    "เจ้าของขายเอง บ้านเดี่ยว ดอนเมือง 2.2 ล้าน โทร 081-234-5678";
pub(super) const FLOOD_SENTENCE: &str = "ช่วงหน้าฝนอาจมีน้ำท่วมขังถนนหน้าบ้านเล็กน้อย";

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn owner(phrase: &str, weight: f32) -> WeightedPhrase {
    WeightedPhrase {
        phrase: phrase.to_string(),
        weight,
    }
}

pub(super) fn dictionary() -> PhraseDictionary {
    let mut property_types = BTreeMap::new();
    property_types.insert("house".to_string(), strings(&["บ้านเดี่ยว", "detached house"]));
    property_types.insert("condo".to_string(), strings(&["คอนโด", "condo"]));
    property_types.insert("townhouse".to_string(), strings(&["ทาวน์เฮาส์", "townhouse"]));

    let mut conditions = BTreeMap::new();
    conditions.insert("renovated".to_string(), strings(&["รีโนเวท", "renovated"]));
    conditions.insert("new".to_string(), strings(&["บ้านใหม่", "brand new"]));

    let mut disclosure_phrases = BTreeMap::new();
    disclosure_phrases.insert(DisclosureCategory::Flood, strings(&["น้ำท่วม", "flood"]));
    disclosure_phrases.insert(
        DisclosureCategory::IndustrialProximity,
        strings(&["นิคมอุตสาหกรรม", "industrial estate"]),
    );
    disclosure_phrases.insert(
        DisclosureCategory::PowerLine,
        strings(&["เสาไฟฟ้าแรงสูง", "power line"]),
    );

    PhraseDictionary {
        owner_phrases: vec![
            owner("เจ้าของขายเอง", 0.6),
            owner("ขายเอง", 0.3),
            owner("owner selling", 0.6),
            owner("no agents", 0.3),
        ],
        agent_phrases: strings(&["นายหน้า", "co-agent", "agent welcome"]),
        no_agent_bonus: 0.15,
        agent_penalty: 0.3,
        property_types,
        listing_types: ListingTypePhrases {
            sale: strings(&["ขาย", "for sale"]),
            rent: strings(&["ให้เช่า", "for rent"]),
        },
        npa_phrases: strings(&["ทรัพย์ธนาคาร", "npa"]),
        conditions,
        availability_phrases: strings(&["พร้อมอยู่", "ready to move in"]),
        disclosure_phrases,
        noise_phrases: strings(&["เสียงรถไฟ", "เสียงเครื่องบิน", "train noise", "aircraft noise"]),
        negation_phrases: strings(&["ไม่เคย", "ไม่มี", "never", "no", "not"]),
        negation_suffixes: strings(&["-free", "free"]),
    }
}

pub(super) fn compiled_dictionary() -> CompiledDictionary {
    CompiledDictionary::compile(&dictionary()).expect("fixture dictionary compiles")
}

pub(super) fn segment(name: &str, min_price: u64, max_price: u64, tolerance: u64) -> TargetSegment {
    TargetSegment {
        name: name.to_string(),
        min_price,
        max_price,
        tolerance,
    }
}

pub(super) fn scoring_config() -> ScoringConfig {
    ScoringConfig {
        segments: vec![
            segment("affordable", 2_000_000, 3_000_000, 1_000_000),
            segment("mid", 3_000_001, 7_000_000, 1_500_000),
            segment("luxury", 7_000_001, 30_000_000, 3_000_000),
        ],
        target_segment: "affordable".to_string(),
        weights: ScoringWeights {
            owner_probability: 0.35,
            contact_confidence: 0.2,
            price_fit: 0.25,
            data_completeness: 0.2,
        },
        checklist: ChecklistWeights {
            price: 0.25,
            location: 0.2,
            property_type: 0.15,
            floor_size: 0.15,
            room_counts: 0.1,
            environmental_disclosure: 0.15,
        },
    }
}

pub(super) fn pipeline_config() -> PipelineConfig {
    PipelineConfig {
        dictionary: dictionary(),
        scoring: scoring_config(),
        disclosure: DisclosureConfig {
            categories: DisclosureCategory::ALL.to_vec(),
            noise_radius_m: 500,
        },
        fsbo_threshold: 0.3,
        required_fields: Vec::new(),
        reject_unfit_price: false,
        resolver_timeout_ms: 50,
        batch_concurrency: 4,
    }
}

pub(super) fn listing(text: &str, locality: Option<&str>) -> RawListing {
    RawListing {
        url: Some("https://example.test/listings/1".to_string()),
        text: text.to_string(),
        contact: Some("081-234-5678".to_string()),
        hints: ListingHints {
            locality: locality.map(str::to_string),
            ..ListingHints::default()
        },
    }
}

pub(super) fn scenario_listing() -> RawListing {
    listing(SCENARIO_TEXT, Some("Don Mueang"))
}

pub(super) fn disclosed_listing() -> RawListing {
    listing(&format!("{SCENARIO_TEXT} {FLOOD_SENTENCE}"), Some("Don Mueang"))
}

/// Don Mueang: seasonal flooding, rail line beyond the noise radius.
pub(super) fn don_mueang_geo() -> GeoRiskResult {
    GeoRiskResult {
        flood_risk: FloodRiskLevel::LowSeasonal,
        transit: Some(TransitProximity {
            line: "SRT Dark Red Line".to_string(),
            station: "Don Mueang".to_string(),
            distance_m: 1200,
        }),
        industrial_proximity: Hazard::Absent,
        power_line: Hazard::Absent,
        source: GeoRiskSource::Resolved,
    }
}

pub(super) fn clear_geo() -> GeoRiskResult {
    GeoRiskResult {
        flood_risk: FloodRiskLevel::Absent,
        transit: None,
        industrial_proximity: Hazard::Absent,
        power_line: Hazard::Absent,
        source: GeoRiskSource::Resolved,
    }
}

pub(super) struct FixedResolver {
    result: GeoRiskResult,
    calls: AtomicUsize,
}

impl FixedResolver {
    pub(super) fn new(result: GeoRiskResult) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoRiskResolver for FixedResolver {
    async fn resolve(&self, _query: &GeoQuery) -> Result<GeoRiskResult, ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

/// Never answers; exercises the resolver timeout.
pub(super) struct PendingResolver;

#[async_trait]
impl GeoRiskResolver for PendingResolver {
    async fn resolve(&self, _query: &GeoQuery) -> Result<GeoRiskResult, ResolverError> {
        futures::future::pending().await
    }
}

pub(super) struct NoMatchResolver;

#[async_trait]
impl GeoRiskResolver for NoMatchResolver {
    async fn resolve(&self, query: &GeoQuery) -> Result<GeoRiskResult, ResolverError> {
        Err(ResolverError::NoMatch(query.describe()))
    }
}

pub(super) struct UnreachableResolver;

#[async_trait]
impl GeoRiskResolver for UnreachableResolver {
    async fn resolve(&self, _query: &GeoQuery) -> Result<GeoRiskResult, ResolverError> {
        Err(ResolverError::Unreachable("connection refused".to_string()))
    }
}

pub(super) fn pipeline_with<G>(resolver: G) -> ListingPipeline<G>
where
    G: GeoRiskResolver + 'static,
{
    ListingPipeline::new(Arc::new(resolver), pipeline_config()).expect("fixture config is valid")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
