//! Stateless signal extractors.
//!
//! Every extractor scans the same prepared text and appends to one ordered signal list,
//! so the output is a pure function of `(text, contact, dictionary)`.

mod attributes;
mod contact;
pub mod dictionary;
mod owner;
mod price;

pub use dictionary::{
    CompiledDictionary, DictionaryError, ListingTypePhrases, PhraseDictionary, WeightedPhrase,
};

use super::domain::{EvidenceSource, EvidenceSpan, ExtractedSignal};
use super::text::scan_text;

/// Run every extractor over a listing's text and contact string.
pub fn extract(
    text: &str,
    contact: Option<&str>,
    dictionary: &CompiledDictionary,
) -> Vec<ExtractedSignal> {
    let scan = scan_text(text);
    let contact = contact.map(scan_text);
    let mut signals = Vec::new();

    owner::extract_owner_signals(&scan, dictionary, &mut signals);
    contact::extract_contact_signal(&scan, contact.as_deref(), &mut signals);
    price::extract_price_signals(&scan, &mut signals);
    attributes::extract_market_signals(&scan, dictionary, &mut signals);
    attributes::extract_physical_signals(&scan, &mut signals);
    attributes::extract_environment_signals(&scan, dictionary, &mut signals);

    signals
}

pub(crate) fn text_span(start: usize, end: usize, excerpt: &str) -> EvidenceSpan {
    EvidenceSpan {
        source: EvidenceSource::Text,
        start,
        end,
        excerpt: excerpt.to_string(),
    }
}

/// Span covering several contributing spans, excerpts joined for the audit trail.
pub(crate) fn derived_span(parts: &[EvidenceSpan]) -> EvidenceSpan {
    let start = parts.iter().map(|span| span.start).min().unwrap_or(0);
    let end = parts.iter().map(|span| span.end).max().unwrap_or(0);
    let excerpt = parts
        .iter()
        .map(|span| span.excerpt.as_str())
        .collect::<Vec<_>>()
        .join(" | ");

    EvidenceSpan {
        source: EvidenceSource::Derived,
        start,
        end,
        excerpt,
    }
}
