use std::sync::LazyLock;

use regex::Regex;

use super::super::domain::{DisclosureCategory, ExtractedSignal, SignalCategory, SignalValue};
use super::super::text::{enclosing_sentence, sentence_bounds};
use super::dictionary::{CompiledDictionary, PhraseMatcher};
use super::text_span;

static FLOOR_AREA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<value>\d+(?:\.\d+)?)\s*(?:ตร\.?\s?ม\.?|ตารางเมตร|sq\.?\s?m\b|sqm\b|m2\b|m²)",
    )
    .expect("floor area pattern compiles")
});

static BEDROOM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:(?P<lead>\d{1,2})\s*(?:ห้องนอน|bedrooms?\b|beds?\b)|ห้องนอน\s*(?P<trail>\d{1,2}))")
        .expect("bedroom pattern compiles")
});

static BATHROOM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:(?P<lead>\d{1,2})\s*(?:ห้องน้ำ|bathrooms?\b|baths?\b)|ห้องน้ำ\s*(?P<trail>\d{1,2}))")
        .expect("bathroom pattern compiles")
});

const KEYWORD_CONFIDENCE: f32 = 0.8;
const MEASUREMENT_CONFIDENCE: f32 = 0.8;
/// How far before a phrase a negation cue may sit, in characters.
const NEGATION_WINDOW_CHARS: usize = 16;

/// Property type, listing type, NPA, condition and availability keywords.
pub(super) fn extract_market_signals(
    text: &str,
    dictionary: &CompiledDictionary,
    signals: &mut Vec<ExtractedSignal>,
) {
    push_labelled(text, &dictionary.property_types, SignalCategory::PropertyType, signals);
    push_labelled(text, &dictionary.listing_types, SignalCategory::ListingType, signals);
    push_labelled(text, &dictionary.npa, SignalCategory::Npa, signals);
    push_labelled(text, &dictionary.conditions, SignalCategory::Condition, signals);
    push_labelled(text, &dictionary.availability, SignalCategory::Availability, signals);
}

fn push_labelled(
    text: &str,
    matcher: &PhraseMatcher,
    category: SignalCategory,
    signals: &mut Vec<ExtractedSignal>,
) {
    for hit in matcher.find_iter(text) {
        signals.push(ExtractedSignal::new(
            category,
            SignalValue::Text(hit.label.to_string()),
            KEYWORD_CONFIDENCE,
            text_span(hit.start, hit.end, hit.excerpt),
        ));
    }
}

/// Floor area and room counts from fixed Thai/English measurement grammar.
pub(super) fn extract_physical_signals(text: &str, signals: &mut Vec<ExtractedSignal>) {
    for caps in FLOOR_AREA_PATTERN.captures_iter(text) {
        let (Some(whole), Some(value)) = (caps.get(0), caps.name("value")) else {
            continue;
        };
        let Ok(area) = value.as_str().parse::<f32>() else {
            continue;
        };
        if area <= 0.0 {
            continue;
        }
        signals.push(ExtractedSignal::new(
            SignalCategory::FloorSize,
            SignalValue::Area(area),
            MEASUREMENT_CONFIDENCE,
            text_span(whole.start(), whole.end(), whole.as_str()),
        ));
    }

    push_counts(text, &BEDROOM_PATTERN, SignalCategory::Bedrooms, signals);
    push_counts(text, &BATHROOM_PATTERN, SignalCategory::Bathrooms, signals);
}

fn push_counts(
    text: &str,
    pattern: &Regex,
    category: SignalCategory,
    signals: &mut Vec<ExtractedSignal>,
) {
    for caps in pattern.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Some(count) = caps
            .name("lead")
            .or_else(|| caps.name("trail"))
            .and_then(|raw| raw.as_str().parse::<u32>().ok())
        else {
            continue;
        };
        signals.push(ExtractedSignal::new(
            category,
            SignalValue::Count(count),
            MEASUREMENT_CONFIDENCE,
            text_span(whole.start(), whole.end(), whole.as_str()),
        ));
    }
}

/// Environmental disclosures (value is the enclosing sentence) and noise mentions.
///
/// A phrase carrying a negation cue ("ไม่เคยน้ำท่วม", "never flooded", "flood-free")
/// is a denial, not a disclosure.
pub(super) fn extract_environment_signals(
    text: &str,
    dictionary: &CompiledDictionary,
    signals: &mut Vec<ExtractedSignal>,
) {
    for (category, matcher) in &dictionary.disclosures {
        for hit in matcher.find_iter(text) {
            let sentence = enclosing_sentence(text, hit.start, hit.end);
            let signal_category = if is_denied(text, hit.start, hit.end, dictionary) {
                SignalCategory::Denial(*category)
            } else {
                SignalCategory::Disclosure(*category)
            };
            signals.push(ExtractedSignal::new(
                signal_category,
                SignalValue::Text(sentence.to_string()),
                KEYWORD_CONFIDENCE,
                text_span(hit.start, hit.end, hit.excerpt),
            ));
        }
    }

    for hit in dictionary.noise.find_iter(text) {
        let signal_category = if is_denied(text, hit.start, hit.end, dictionary) {
            SignalCategory::Denial(DisclosureCategory::Noise)
        } else {
            SignalCategory::NoiseFactor
        };
        signals.push(ExtractedSignal::new(
            signal_category,
            SignalValue::Text(hit.phrase.to_string()),
            KEYWORD_CONFIDENCE,
            text_span(hit.start, hit.end, hit.excerpt),
        ));
    }
}

fn is_denied(text: &str, start: usize, end: usize, dictionary: &CompiledDictionary) -> bool {
    let (sentence_start, sentence_end) = sentence_bounds(text, start, end);

    let window_start = text[sentence_start..start]
        .char_indices()
        .rev()
        .take(NEGATION_WINDOW_CHARS)
        .last()
        .map_or(start, |(idx, _)| sentence_start + idx);
    let before = &text[window_start..start];
    let preceded = dictionary.negations.find_iter(before).any(|cue| {
        let (cue_start, cue_end) = (window_start + cue.start, window_start + cue.end);
        stands_alone(text, cue_start, cue_end) && same_clause(&text[cue_end..start])
    });

    let after = &text[end..sentence_end];
    let followed = dictionary
        .negation_suffixes
        .find_iter(after)
        .next()
        .is_some_and(|cue| after[..cue.start].trim().is_empty());

    preceded || followed
}

/// At most two words and no clause break between a cue and the phrase it denies.
fn same_clause(between: &str) -> bool {
    !between.contains([',', ';', ':', '(', ')']) && between.split_whitespace().count() <= 2
}

/// Latin cues must be whole words so "no" does not fire inside "casino".
fn stands_alone(text: &str, start: usize, end: usize) -> bool {
    if !text[start..end].is_ascii() {
        return true;
    }
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}
