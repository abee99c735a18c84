use std::collections::{BTreeMap, BTreeSet};

use super::config::PipelineConfig;
use super::domain::{
    Address, Availability, Disclosure, DisclosureCategory, DisclosureSource, EnvironmentalFactors,
    ExtractedSignal, FieldSource, ListingType, MarketAttributes, NpaStatus, Offer,
    PhysicalAttributes, PropertyRecord, RawListing, SignalCategory,
};
use super::georisk::GeoRiskResult;
use super::scoring::TargetSegment;

const DEFAULT_CURRENCY: &str = "THB";
const DEFAULT_COUNTRY: &str = "TH";

/// Merges supplied hints, extracted signals and resolver output into the canonical record.
#[derive(Debug, Clone)]
pub struct SchemaNormalizer {
    fsbo_threshold: f32,
    segments: Vec<TargetSegment>,
    noise_radius_m: u32,
}

impl SchemaNormalizer {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            fsbo_threshold: config.fsbo_threshold,
            segments: config.scoring.segments.clone(),
            noise_radius_m: config.disclosure.noise_radius_m,
        }
    }

    pub fn normalize(
        &self,
        listing: &RawListing,
        signals: &[ExtractedSignal],
        geo: &GeoRiskResult,
    ) -> PropertyRecord {
        let hints = &listing.hints;

        let offers = self.offer(listing, signals);
        let price_segment = offers.price.and_then(|price| {
            self.segments
                .iter()
                .find(|segment| segment.contains(price))
                .map(|segment| segment.name.clone())
        });

        let physical = PhysicalAttributes {
            floor_size_sqm: hints.floor_size_sqm.or_else(|| {
                best(signals, SignalCategory::FloorSize).and_then(|signal| signal.value.as_area())
            }),
            bedrooms: hints.bedrooms.or_else(|| count(signals, SignalCategory::Bedrooms)),
            bathrooms: hints.bathrooms.or_else(|| count(signals, SignalCategory::Bathrooms)),
        };

        let market_attributes = MarketAttributes {
            property_type: non_blank(hints.property_type.as_deref())
                .or_else(|| label(signals, SignalCategory::PropertyType)),
            price_segment,
            listing_type: label(signals, SignalCategory::ListingType)
                .as_deref()
                .and_then(ListingType::from_label),
            npa_status: if signals
                .iter()
                .any(|signal| signal.category == SignalCategory::Npa)
            {
                NpaStatus::BankAsset
            } else {
                NpaStatus::NotIndicated
            },
            fsbo_signals: self.fsbo_signals(signals),
            condition: label(signals, SignalCategory::Condition),
        };

        PropertyRecord {
            source_url: non_blank(listing.url.as_deref()),
            address: Address {
                locality: hints.locality().map(str::to_string),
                region: non_blank(hints.region.as_deref()),
                country: DEFAULT_COUNTRY.to_string(),
            },
            geo: hints.coordinates,
            offers,
            physical,
            market_attributes,
            environmental_factors: self.environment(listing, signals, geo),
        }
    }

    fn offer(&self, listing: &RawListing, signals: &[ExtractedSignal]) -> Offer {
        let hints = &listing.hints;
        let extracted = signals
            .iter()
            .filter(|signal| signal.category == SignalCategory::Price)
            .filter_map(|signal| signal.value.as_amount())
            .min();

        let (price, price_source) = match (hints.price, extracted) {
            (Some(price), _) => (Some(price), Some(FieldSource::Hint)),
            (None, Some(price)) => (Some(price), Some(FieldSource::Extracted)),
            (None, None) => (None, None),
        };

        let review_note = match price_source {
            Some(FieldSource::Extracted) => signals
                .iter()
                .find(|signal| signal.category == SignalCategory::PriceAmbiguity)
                .and_then(|signal| signal.value.as_text())
                .map(|reason| format!("{reason}; lowest bound taken")),
            _ => None,
        };

        let availability = hints.available_from.map(Availability::From).or_else(|| {
            signals
                .iter()
                .any(|signal| signal.category == SignalCategory::Availability)
                .then_some(Availability::Immediate)
        });

        Offer {
            price,
            currency: non_blank(hints.currency.as_deref())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            availability,
            price_source,
            review_note,
        }
    }

    fn fsbo_signals(&self, signals: &[ExtractedSignal]) -> BTreeSet<String> {
        signals
            .iter()
            .filter(|signal| {
                signal.category == SignalCategory::FsboPhrase
                    && signal.confidence > self.fsbo_threshold
            })
            .filter_map(|signal| signal.value.as_text())
            .map(str::to_string)
            .collect()
    }

    fn environment(
        &self,
        listing: &RawListing,
        signals: &[ExtractedSignal],
        geo: &GeoRiskResult,
    ) -> EnvironmentalFactors {
        let mut noise_factors = Vec::new();
        if let Some(transit) = geo.transit_within(self.noise_radius_m) {
            noise_factors.push(format!(
                "{} ({}) {} m",
                transit.line, transit.station, transit.distance_m
            ));
        }

        let mut text_noise = Vec::new();
        for signal in signals
            .iter()
            .filter(|signal| signal.category == SignalCategory::NoiseFactor)
        {
            let Some(phrase) = signal.value.as_text() else {
                continue;
            };
            if !text_noise.iter().any(|known: &String| known == phrase) {
                text_noise.push(phrase.to_string());
            }
        }

        let mut disclosures = BTreeMap::new();
        for signal in signals {
            let SignalCategory::Disclosure(category) = signal.category else {
                continue;
            };
            let Some(text) = signal.value.as_text() else {
                continue;
            };
            disclosures.entry(category).or_insert_with(|| Disclosure {
                text: text.to_string(),
                source: DisclosureSource::ListingText,
            });
        }

        if !text_noise.is_empty() {
            disclosures
                .entry(DisclosureCategory::Noise)
                .or_insert_with(|| Disclosure {
                    text: text_noise.join(", "),
                    source: DisclosureSource::ListingText,
                });
        }

        for (category, text) in &listing.hints.disclosures {
            if let Some(text) = non_blank(Some(text)) {
                disclosures.insert(
                    *category,
                    Disclosure {
                        text,
                        source: DisclosureSource::Hint,
                    },
                );
            }
        }

        noise_factors.extend(text_noise);

        let denials = signals
            .iter()
            .filter_map(|signal| match signal.category {
                SignalCategory::Denial(category) => Some(category),
                _ => None,
            })
            .collect();

        EnvironmentalFactors {
            flood_risk: geo.flood_risk,
            industrial_proximity: geo.industrial_proximity,
            power_line_visibility: geo.power_line,
            transit: geo.transit.clone(),
            noise_factors,
            disclosures,
            denials,
        }
    }
}

/// Highest-confidence signal of a category; the earliest wins ties.
fn best(signals: &[ExtractedSignal], category: SignalCategory) -> Option<&ExtractedSignal> {
    signals
        .iter()
        .filter(|signal| signal.category == category)
        .fold(None, |chosen: Option<&ExtractedSignal>, signal| match chosen {
            Some(current) if current.confidence >= signal.confidence => Some(current),
            _ => Some(signal),
        })
}

fn label(signals: &[ExtractedSignal], category: SignalCategory) -> Option<String> {
    best(signals, category)
        .and_then(|signal| signal.value.as_text())
        .map(str::to_string)
}

fn count(signals: &[ExtractedSignal], category: SignalCategory) -> Option<u8> {
    best(signals, category)
        .and_then(|signal| signal.value.as_count())
        .and_then(|value| u8::try_from(value).ok())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
