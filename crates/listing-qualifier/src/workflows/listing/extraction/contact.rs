use std::sync::LazyLock;

use regex::Regex;

use super::super::domain::{
    EvidenceSource, EvidenceSpan, ExtractedSignal, SignalCategory, SignalValue,
};

// Thai mobile and landline numbers, local `0` or international `+66` prefix.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+66|0)[\s-]?\d{1,2}[\s-]?\d{3}[\s-]?\d{4}").expect("phone pattern compiles")
});

const CORROBORATED: f32 = 1.0;
const SINGLE_SOURCE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub(super) struct PhoneHit {
    pub(super) number: String,
    pub(super) span: EvidenceSpan,
}

/// Phone numbers in `text`, normalized to local digits (`0812345678`).
pub(super) fn find_phones(text: &str, source: EvidenceSource) -> Vec<PhoneHit> {
    PHONE_PATTERN
        .find_iter(text)
        .filter(|found| {
            let before = text[..found.start()].chars().next_back();
            let after = text[found.end()..].chars().next();
            !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
        })
        .filter_map(|found| {
            let number = normalize_phone(found.as_str())?;
            Some(PhoneHit {
                number,
                span: EvidenceSpan {
                    source,
                    start: found.start(),
                    end: found.end(),
                    excerpt: found.as_str().to_string(),
                },
            })
        })
        .collect()
}

fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let local = if raw.starts_with("+66") {
        format!("0{}", &digits[2..])
    } else {
        digits
    };

    matches!(local.len(), 9 | 10).then_some(local)
}

/// Contact confidence: corroborated across field and text, single source, or absent (no signal).
pub(super) fn extract_contact_signal(
    text: &str,
    contact: Option<&str>,
    signals: &mut Vec<ExtractedSignal>,
) {
    let in_text = find_phones(text, EvidenceSource::Text);
    let in_field = contact
        .map(|value| find_phones(value, EvidenceSource::Contact))
        .unwrap_or_default();

    let corroborated = in_text
        .iter()
        .find(|hit| in_field.iter().any(|field| field.number == hit.number));

    let (hit, confidence) = match corroborated {
        Some(hit) => (hit, CORROBORATED),
        None => match in_field.first().or_else(|| in_text.first()) {
            Some(hit) => (hit, SINGLE_SOURCE),
            None => return,
        },
    };

    signals.push(ExtractedSignal::new(
        SignalCategory::Contact,
        SignalValue::Text(hit.number.clone()),
        confidence,
        hit.span.clone(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_confidence(text: &str, contact: Option<&str>) -> Option<f32> {
        let mut signals = Vec::new();
        extract_contact_signal(text, contact, &mut signals);
        signals.first().map(|signal| signal.confidence)
    }

    #[test]
    fn finds_mobile_and_international_formats() {
        let hits = find_phones("โทร 081-234-5678 หรือ +66 89 111 2222", EvidenceSource::Text);
        let numbers: Vec<_> = hits.iter().map(|hit| hit.number.as_str()).collect();
        assert_eq!(numbers, vec!["0812345678", "0891112222"]);
    }

    #[test]
    fn finds_bangkok_landline() {
        let hits = find_phones("office 02 123 4567", EvidenceSource::Text);
        assert_eq!(hits[0].number, "021234567");
    }

    #[test]
    fn ignores_digits_embedded_in_longer_numbers() {
        assert!(find_phones("ref 908123456789", EvidenceSource::Text).is_empty());
        assert!(find_phones("ราคา 2,200,000 บาท", EvidenceSource::Text).is_empty());
    }

    #[test]
    fn corroborated_phone_scores_full_confidence() {
        assert_eq!(
            contact_confidence("โทร 081-234-5678", Some("081 234 5678")),
            Some(1.0)
        );
    }

    #[test]
    fn single_source_phone_scores_half() {
        assert_eq!(contact_confidence("call 081-234-5678", None), Some(0.5));
        assert_eq!(contact_confidence("no number here", Some("0812345678")), Some(0.5));
        assert_eq!(
            contact_confidence("call 089-999-0000", Some("081-234-5678")),
            Some(0.5)
        );
    }

    #[test]
    fn absent_phone_emits_no_signal() {
        assert_eq!(contact_confidence("line id only", Some("@owner_line")), None);
    }
}
