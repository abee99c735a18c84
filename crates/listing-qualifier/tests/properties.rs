use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use listing_qualifier::workflows::listing::{
    Coordinates, DisclosureCategory, FloodRiskLevel, GeoQuery, GeoRiskResolver, GeoRiskResult,
    GeoRiskSource, Hazard, ListingHints, ListingPipeline, PipelineConfig, RawListing,
    ResolverError, ViolationCategory,
};

fn sample_config() -> PipelineConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/pipeline.json");
    PipelineConfig::from_path(path).expect("sample pipeline config loads")
}

struct FloodOnly(FloodRiskLevel);

#[async_trait]
impl GeoRiskResolver for FloodOnly {
    async fn resolve(&self, _query: &GeoQuery) -> Result<GeoRiskResult, ResolverError> {
        Ok(GeoRiskResult {
            flood_risk: self.0,
            transit: None,
            industrial_proximity: Hazard::Absent,
            power_line: Hazard::Absent,
            source: GeoRiskSource::Resolved,
        })
    }
}

fn pipeline(level: FloodRiskLevel) -> ListingPipeline<FloodOnly> {
    ListingPipeline::new(Arc::new(FloodOnly(level)), sample_config()).expect("valid config")
}

fn listing(text: &str) -> RawListing {
    RawListing {
        url: None,
        text: text.to_string(),
        contact: Some("0812345678".to_string()),
        hints: ListingHints {
            locality: Some("Bang Na".to_string()),
            ..ListingHints::default()
        },
    }
}

const SILENT_TEXTS: [&str; 4] = [
    "เจ้าของขายเอง บ้านเดี่ยว 2.2 ล้าน",
    "Townhouse for sale 3.5M, 3 bedrooms, ready to move in",
    "คอนโด ให้เช่า 15k บาท/เดือน 35 ตร.ม.",
    "ทรัพย์ธนาคาร ที่ดินเปล่า ราคาถูก",
];

#[tokio::test]
async fn identical_input_gives_identical_output() {
    let pipeline = pipeline(FloodRiskLevel::Moderate);
    for text in SILENT_TEXTS {
        let listing = listing(&format!("{text} บริเวณนี้น้ำท่วมปี 2554"));
        let first = pipeline.run(&listing).await.expect("run completes");
        let second = pipeline.run(&listing).await.expect("run completes");
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).expect("serializes"),
            serde_json::to_vec(&second).expect("serializes")
        );
    }
}

#[tokio::test]
async fn known_flood_risk_without_disclosure_is_always_invalid() {
    for level in [
        FloodRiskLevel::LowSeasonal,
        FloodRiskLevel::Moderate,
        FloodRiskLevel::High,
    ] {
        let pipeline = pipeline(level);
        for text in SILENT_TEXTS {
            let result = pipeline.run(&listing(text)).await.expect("run completes");
            assert!(!result.is_valid(), "{level:?} / {text}");
            assert!(result
                .violations()
                .iter()
                .any(|violation| violation.category
                    == ViolationCategory::UndisclosedRisk(DisclosureCategory::Flood)));
        }
    }
}

#[tokio::test]
async fn absent_or_unknown_flood_never_blocks() {
    for level in [FloodRiskLevel::Absent, FloodRiskLevel::Unknown] {
        let pipeline = pipeline(level);
        for text in SILENT_TEXTS {
            let result = pipeline.run(&listing(text)).await.expect("run completes");
            assert!(result.is_valid(), "{level:?} / {text}");
        }
    }
}

#[tokio::test]
async fn adding_fields_never_lowers_completeness() {
    let pipeline = pipeline(FloodRiskLevel::Absent);
    let sparse = RawListing {
        url: None,
        text: "เจ้าของขายเอง".to_string(),
        contact: None,
        hints: ListingHints {
            locality: Some("Chatuchak".to_string()),
            ..ListingHints::default()
        },
    };

    let mut steps = vec![sparse.clone()];
    let mut current = sparse;
    current.hints.price = Some(2_500_000);
    steps.push(current.clone());
    current.hints.property_type = Some("condo".to_string());
    steps.push(current.clone());
    current.hints.floor_size_sqm = Some(42.0);
    steps.push(current.clone());
    current.hints.bedrooms = Some(1);
    steps.push(current.clone());
    current.hints.coordinates = Some(Coordinates {
        latitude: 13.8021,
        longitude: 100.5537,
    });
    steps.push(current);

    let mut previous = 0.0_f32;
    for step in &steps {
        let result = pipeline.run(step).await.expect("run completes");
        let completeness = result.scores().expect("scores").data_completeness.value;
        assert!(completeness >= previous, "{completeness} < {previous}");
        previous = completeness;
    }
    assert!((previous - 1.0).abs() < 1e-6);
}

#[test]
fn price_fit_boundaries_follow_target_segment() {
    let config = sample_config();
    let target = config.scoring.target().expect("target segment configured");

    assert_eq!(target.fit(2_000_000), 1.0);
    assert_eq!(target.fit(3_000_000), 1.0);
    assert!(target.fit(1_000_000) < target.fit(1_800_000));
    assert_eq!(target.fit(50_000_000), 0.0);
}
