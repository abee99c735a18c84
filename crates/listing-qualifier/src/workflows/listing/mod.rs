//! Listing qualification: signal extraction, geo-risk resolution, schema normalization,
//! disclosure enforcement and lead scoring for Thai/English property listings.

pub mod config;
pub mod disclosure;
pub mod domain;
pub mod extraction;
pub mod georisk;
pub mod normalizer;
pub mod pipeline;
pub mod router;
pub mod scoring;
pub(crate) mod text;

#[cfg(test)]
mod tests;

pub use config::{DisclosureConfig, PipelineConfig, PipelineConfigError};
pub use disclosure::{
    DisclosureEnforcer, DisclosureReport, DisclosureStatus, Violation, ViolationCategory,
};
pub use domain::{
    Address, Availability, Coordinates, Disclosure, DisclosureCategory, DisclosureSource,
    EnvironmentalFactors, EvidenceSource, EvidenceSpan, ExtractedSignal, FieldSource,
    ListingHints, ListingType, MarketAttributes, NpaStatus, Offer, PhysicalAttributes,
    PropertyRecord, RawListing, SignalCategory, SignalValue,
};
pub use extraction::{
    extract, CompiledDictionary, DictionaryError, ListingTypePhrases, PhraseDictionary,
    WeightedPhrase,
};
pub use georisk::{
    DegradedReason, FloodRiskLevel, GeoQuery, GeoRiskResolver, GeoRiskResult, GeoRiskSource,
    GeoTableError, Hazard, ResolverError, StaticGeoRiskTable, TransitProximity,
};
pub use normalizer::SchemaNormalizer;
pub use pipeline::{
    BatchEntry, BatchOutcome, CancellationFlag, ListingPipeline, PipelineError, ValidationResult,
};
pub use router::{listing_router, BatchRequest, BatchResponse};
pub use scoring::{
    ChecklistField, ChecklistWeights, LeadScorer, ScoreComponent, ScoreFactor, ScoreReport,
    ScoringConfig, ScoringWeights, TargetSegment,
};
