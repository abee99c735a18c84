use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::super::domain::{EvidenceSpan, ExtractedSignal, SignalCategory, SignalValue};
use super::{derived_span, text_span};

static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?P<prefix>฿|thb)?\s*",
        r"(?P<low>\d{1,3}(?:,\d{2,3})+|\d+(?:\.\d+)?)",
        r"(?:\s*(?:-|–|~|to|ถึง)\s*(?P<high>\d{1,3}(?:,\d{2,3})+|\d+(?:\.\d+)?))?",
        r"(?:\s*(?P<unit>ล้าน|แสน|หมื่น|พัน|million|mil|lakhs|lakh|m\b|k\b))?",
        r"(?:\s*(?P<suffix>บาท|฿|thb|baht))?",
    ))
    .expect("price pattern compiles")
});

// Words that turn a bare `300m` into a distance rather than a price.
static DISTANCE_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:to|from|away|walk|walking|bts|mrt|arl|srt|station)\b|จาก|ถึง|ไป|สถานี|รถไฟฟ้า)",
    )
    .expect("distance context pattern compiles")
});

const CLEAR_CONFIDENCE: f32 = 0.9;
const AMBIGUOUS_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
struct PriceMention {
    low: u64,
    high: Option<u64>,
    span: EvidenceSpan,
}

impl PriceMention {
    fn lowest(&self) -> u64 {
        self.high.map_or(self.low, |high| high.min(self.low))
    }
}

/// Price mentions normalized to whole baht.
///
/// Only numbers carrying a currency token or a magnitude word count as prices, so floor
/// areas, room counts and phone numbers never leak in. Ranges or conflicting values lower
/// the confidence of every mention and add a `PriceAmbiguity` signal for manual review.
pub(super) fn extract_price_signals(text: &str, signals: &mut Vec<ExtractedSignal>) {
    let mentions: Vec<PriceMention> = PRICE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| parse_mention(text, &caps))
        .collect();

    if mentions.is_empty() {
        return;
    }

    let distinct: BTreeSet<u64> = mentions
        .iter()
        .flat_map(|mention| std::iter::once(mention.low).chain(mention.high))
        .collect();
    let has_range = mentions.iter().any(|mention| mention.high.is_some());
    let ambiguous = has_range || distinct.len() > 1;
    let confidence = if ambiguous {
        AMBIGUOUS_CONFIDENCE
    } else {
        CLEAR_CONFIDENCE
    };

    for mention in &mentions {
        signals.push(ExtractedSignal::new(
            SignalCategory::Price,
            SignalValue::Amount(mention.lowest()),
            confidence,
            mention.span.clone(),
        ));
    }

    if ambiguous {
        let reason = if has_range {
            "price stated as a range"
        } else {
            "conflicting price mentions"
        };
        let spans: Vec<EvidenceSpan> = mentions.iter().map(|mention| mention.span.clone()).collect();
        signals.push(ExtractedSignal::new(
            SignalCategory::PriceAmbiguity,
            SignalValue::Text(reason.to_string()),
            AMBIGUOUS_CONFIDENCE,
            derived_span(&spans),
        ));
    }
}

fn parse_mention(text: &str, caps: &Captures<'_>) -> Option<PriceMention> {
    let whole = caps.get(0)?;
    let unit = caps.name("unit").map(|m| m.as_str().to_lowercase());
    let has_currency = caps.name("prefix").is_some() || caps.name("suffix").is_some();
    if unit.is_none() && !has_currency {
        return None;
    }
    // `m` and `k` double as metres and kilometres; without a currency token a
    // following destination marks the mention as a distance.
    let single_letter = matches!(unit.as_deref(), Some("m" | "k"));
    if single_letter && !has_currency && DISTANCE_CONTEXT.is_match(&text[whole.end()..]) {
        return None;
    }

    let multiplier = unit.as_deref().map_or(1.0, unit_multiplier);
    let low = scale(caps.name("low")?.as_str(), multiplier)?;
    let high = match caps.name("high") {
        Some(raw) => Some(scale(raw.as_str(), multiplier)?),
        None => None,
    };

    let excerpt = whole.as_str().trim();
    let offset = whole.as_str().len() - whole.as_str().trim_start().len();
    let start = whole.start() + offset;

    Some(PriceMention {
        low,
        high,
        span: text_span(start, start + excerpt.len(), excerpt),
    })
}

fn unit_multiplier(unit: &str) -> f64 {
    match unit {
        "ล้าน" | "million" | "mil" | "m" => 1_000_000.0,
        "แสน" | "lakh" | "lakhs" => 100_000.0,
        "หมื่น" => 10_000.0,
        "พัน" | "k" => 1_000.0,
        _ => 1.0,
    }
}

fn scale(raw: &str, multiplier: f64) -> Option<u64> {
    let cleaned = raw.replace(',', "");
    let value: f64 = cleaned.parse().ok()?;
    let amount = (value * multiplier).round();
    (amount >= 1.0 && amount < u64::MAX as f64).then_some(amount as u64)
}
