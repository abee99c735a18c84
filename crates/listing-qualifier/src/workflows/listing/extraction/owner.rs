use super::super::domain::{ExtractedSignal, SignalCategory, SignalValue};
use super::dictionary::CompiledDictionary;
use super::{derived_span, text_span};

/// Owner-direct evidence: one signal per FSBO or agent phrase plus the aggregate confidence.
pub(super) fn extract_owner_signals(
    text: &str,
    dictionary: &CompiledDictionary,
    signals: &mut Vec<ExtractedSignal>,
) {
    let mut contributing = Vec::new();
    let mut confidence = 0.0_f32;

    for hit in dictionary.owner.find_iter(text) {
        let span = text_span(hit.start, hit.end, hit.excerpt);
        confidence += hit.weight;
        contributing.push(span.clone());
        signals.push(ExtractedSignal::new(
            SignalCategory::FsboPhrase,
            SignalValue::Text(hit.phrase.to_string()),
            hit.weight,
            span,
        ));
    }

    let mut agent_hits = 0_u32;
    for hit in dictionary.agent.find_iter(text) {
        let span = text_span(hit.start, hit.end, hit.excerpt);
        agent_hits += 1;
        contributing.push(span.clone());
        signals.push(ExtractedSignal::new(
            SignalCategory::AgentPhrase,
            SignalValue::Text(hit.phrase.to_string()),
            1.0,
            span,
        ));
    }

    if contributing.is_empty() {
        return;
    }

    if agent_hits == 0 {
        confidence += dictionary.no_agent_bonus;
    } else {
        confidence -= dictionary.agent_penalty * agent_hits as f32;
    }

    let confidence = confidence.clamp(0.0, 1.0);
    signals.push(ExtractedSignal::new(
        SignalCategory::OwnerDirect,
        SignalValue::Text(format!(
            "{} owner phrase(s), {} agent phrase(s)",
            contributing.len() as u32 - agent_hits,
            agent_hits
        )),
        confidence,
        derived_span(&contributing),
    ));
}
