use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::super::domain::DisclosureCategory;
use super::super::text::normalize_key;

/// Curated phrase lists supplied by configuration so they can be localized without a redeploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseDictionary {
    pub owner_phrases: Vec<WeightedPhrase>,
    #[serde(default)]
    pub agent_phrases: Vec<String>,
    /// Added to the owner-direct confidence when no agent phrasing was found.
    pub no_agent_bonus: f32,
    /// Subtracted from the owner-direct confidence per agent phrase found.
    pub agent_penalty: f32,
    #[serde(default)]
    pub property_types: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub listing_types: ListingTypePhrases,
    #[serde(default)]
    pub npa_phrases: Vec<String>,
    #[serde(default)]
    pub conditions: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub availability_phrases: Vec<String>,
    #[serde(default)]
    pub disclosure_phrases: BTreeMap<DisclosureCategory, Vec<String>>,
    #[serde(default)]
    pub noise_phrases: Vec<String>,
    /// Cues just before a disclosure or noise phrase that deny it ("ไม่เคย", "never").
    #[serde(default)]
    pub negation_phrases: Vec<String>,
    /// Cues right after a disclosure phrase that deny it ("-free").
    #[serde(default)]
    pub negation_suffixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPhrase {
    pub phrase: String,
    pub weight: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingTypePhrases {
    #[serde(default)]
    pub sale: Vec<String>,
    #[serde(default)]
    pub rent: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("{set} contains an empty phrase")]
    EmptyPhrase { set: &'static str },
    #[error("phrase '{phrase}' in {set} maps to both '{first}' and '{second}'")]
    ConflictingPhrase {
        set: &'static str,
        phrase: String,
        first: String,
        second: String,
    },
    #[error("weight {weight} for '{phrase}' must be within 0..=1")]
    InvalidWeight { phrase: String, weight: f32 },
    #[error("{name} must be within 0..=1 (found {value})")]
    InvalidAdjustment { name: &'static str, value: f32 },
    #[error("phrase set {set} failed to compile: {source}")]
    Regex {
        set: &'static str,
        source: regex::Error,
    },
}

/// A dictionary hit in scan text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PhraseMatch<'a> {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) excerpt: &'a str,
    pub(crate) phrase: &'a str,
    pub(crate) label: &'a str,
    pub(crate) weight: f32,
}

#[derive(Debug, Clone)]
struct PhraseEntry {
    phrase: String,
    label: String,
    weight: f32,
}

/// Case-insensitive alternation over a phrase set. Longer phrases win at the same position.
#[derive(Debug, Clone)]
pub(crate) struct PhraseMatcher {
    regex: Option<Regex>,
    entries: HashMap<String, PhraseEntry>,
}

impl PhraseMatcher {
    pub(crate) fn build<I>(set: &'static str, phrases: I) -> Result<Self, DictionaryError>
    where
        I: IntoIterator<Item = (String, String, f32)>,
    {
        let mut entries: HashMap<String, PhraseEntry> = HashMap::new();

        for (phrase, label, weight) in phrases {
            let key = normalize_key(&phrase);
            if key.is_empty() {
                return Err(DictionaryError::EmptyPhrase { set });
            }

            if let Some(existing) = entries.get(&key) {
                if existing.label != label {
                    return Err(DictionaryError::ConflictingPhrase {
                        set,
                        phrase: key,
                        first: existing.label.clone(),
                        second: label,
                    });
                }
                continue;
            }

            entries.insert(
                key,
                PhraseEntry {
                    phrase: phrase.trim().to_string(),
                    label,
                    weight,
                },
            );
        }

        if entries.is_empty() {
            return Ok(Self {
                regex: None,
                entries,
            });
        }

        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        let alternation = keys
            .iter()
            .map(|key| regex::escape(key))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!("(?i)(?:{alternation})"))
            .map_err(|source| DictionaryError::Regex { set, source })?;

        Ok(Self {
            regex: Some(regex),
            entries,
        })
    }

    pub(crate) fn find_iter<'a>(&'a self, text: &'a str) -> impl Iterator<Item = PhraseMatch<'a>> + 'a {
        self.regex
            .iter()
            .flat_map(move |regex| regex.find_iter(text))
            .filter_map(move |found| {
                let entry = self.entries.get(&found.as_str().to_lowercase())?;
                Some(PhraseMatch {
                    start: found.start(),
                    end: found.end(),
                    excerpt: found.as_str(),
                    phrase: &entry.phrase,
                    label: &entry.label,
                    weight: entry.weight,
                })
            })
    }
}

/// Dictionary compiled once per pipeline configuration and shared read-only across runs.
#[derive(Debug, Clone)]
pub struct CompiledDictionary {
    pub(crate) owner: PhraseMatcher,
    pub(crate) agent: PhraseMatcher,
    pub(crate) no_agent_bonus: f32,
    pub(crate) agent_penalty: f32,
    pub(crate) property_types: PhraseMatcher,
    pub(crate) listing_types: PhraseMatcher,
    pub(crate) npa: PhraseMatcher,
    pub(crate) conditions: PhraseMatcher,
    pub(crate) availability: PhraseMatcher,
    pub(crate) disclosures: BTreeMap<DisclosureCategory, PhraseMatcher>,
    pub(crate) noise: PhraseMatcher,
    pub(crate) negations: PhraseMatcher,
    pub(crate) negation_suffixes: PhraseMatcher,
}

impl CompiledDictionary {
    pub fn compile(dictionary: &PhraseDictionary) -> Result<Self, DictionaryError> {
        for entry in &dictionary.owner_phrases {
            if !(0.0..=1.0).contains(&entry.weight) {
                return Err(DictionaryError::InvalidWeight {
                    phrase: entry.phrase.clone(),
                    weight: entry.weight,
                });
            }
        }
        check_adjustment("no_agent_bonus", dictionary.no_agent_bonus)?;
        check_adjustment("agent_penalty", dictionary.agent_penalty)?;

        let owner = PhraseMatcher::build(
            "owner_phrases",
            dictionary
                .owner_phrases
                .iter()
                .map(|entry| (entry.phrase.clone(), "owner".to_string(), entry.weight)),
        )?;
        let agent = PhraseMatcher::build("agent_phrases", plain(&dictionary.agent_phrases, "agent"))?;
        let property_types = PhraseMatcher::build(
            "property_types",
            labelled(&dictionary.property_types),
        )?;
        let listing_types = PhraseMatcher::build(
            "listing_types",
            plain(&dictionary.listing_types.sale, "sale")
                .chain(plain(&dictionary.listing_types.rent, "rent")),
        )?;
        let npa = PhraseMatcher::build("npa_phrases", plain(&dictionary.npa_phrases, "npa"))?;
        let conditions = PhraseMatcher::build("conditions", labelled(&dictionary.conditions))?;
        let availability = PhraseMatcher::build(
            "availability_phrases",
            plain(&dictionary.availability_phrases, "immediate"),
        )?;
        let noise = PhraseMatcher::build("noise_phrases", plain(&dictionary.noise_phrases, "noise"))?;
        let negations = PhraseMatcher::build(
            "negation_phrases",
            plain(&dictionary.negation_phrases, "negation"),
        )?;
        let negation_suffixes = PhraseMatcher::build(
            "negation_suffixes",
            plain(&dictionary.negation_suffixes, "negation"),
        )?;

        let mut disclosures = BTreeMap::new();
        for (category, phrases) in &dictionary.disclosure_phrases {
            let matcher =
                PhraseMatcher::build("disclosure_phrases", plain(phrases, category.label()))?;
            disclosures.insert(*category, matcher);
        }

        Ok(Self {
            owner,
            agent,
            no_agent_bonus: dictionary.no_agent_bonus,
            agent_penalty: dictionary.agent_penalty,
            property_types,
            listing_types,
            npa,
            conditions,
            availability,
            disclosures,
            noise,
            negations,
            negation_suffixes,
        })
    }
}

fn check_adjustment(name: &'static str, value: f32) -> Result<(), DictionaryError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DictionaryError::InvalidAdjustment { name, value })
    }
}

fn plain<'a>(
    phrases: &'a [String],
    label: &'a str,
) -> impl Iterator<Item = (String, String, f32)> + 'a {
    phrases
        .iter()
        .map(move |phrase| (phrase.clone(), label.to_string(), 1.0))
}

fn labelled(
    groups: &BTreeMap<String, Vec<String>>,
) -> impl Iterator<Item = (String, String, f32)> + '_ {
    groups.iter().flat_map(|(label, phrases)| {
        phrases
            .iter()
            .map(move |phrase| (phrase.clone(), label.clone(), 1.0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(phrases: &[(&str, &str)]) -> PhraseMatcher {
        PhraseMatcher::build(
            "test",
            phrases
                .iter()
                .map(|(phrase, label)| (phrase.to_string(), label.to_string(), 1.0)),
        )
        .expect("matcher builds")
    }

    #[test]
    fn longer_phrase_wins_over_contained_phrase() {
        let matcher = matcher(&[("house", "house"), ("townhouse", "townhouse")]);
        let labels: Vec<_> = matcher
            .find_iter("Corner Townhouse near a house")
            .map(|hit| hit.label)
            .collect();
        assert_eq!(labels, vec!["townhouse", "house"]);
    }

    #[test]
    fn matching_is_case_insensitive_and_reports_excerpt() {
        let matcher = matcher(&[("no agent", "owner")]);
        let hit = matcher
            .find_iter("Direct sale, NO AGENT please")
            .next()
            .expect("hit");
        assert_eq!(hit.excerpt, "NO AGENT");
        assert_eq!(hit.phrase, "no agent");
        assert_eq!(&"Direct sale, NO AGENT please"[hit.start..hit.end], "NO AGENT");
    }

    #[test]
    fn conflicting_labels_are_rejected() {
        let result = PhraseMatcher::build(
            "property_types",
            vec![
                ("condo".to_string(), "condo".to_string(), 1.0),
                ("Condo".to_string(), "apartment".to_string(), 1.0),
            ],
        );
        match result {
            Err(DictionaryError::ConflictingPhrase { first, second, .. }) => {
                assert_eq!(first, "condo");
                assert_eq!(second, "apartment");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn empty_phrases_are_rejected() {
        let result = PhraseMatcher::build(
            "npa_phrases",
            vec![("  ".to_string(), "npa".to_string(), 1.0)],
        );
        assert!(matches!(result, Err(DictionaryError::EmptyPhrase { .. })));
    }

    #[test]
    fn empty_matcher_finds_nothing() {
        let matcher = PhraseMatcher::build("empty", Vec::new()).expect("builds");
        assert!(matcher.regex.is_none());
        assert_eq!(matcher.find_iter("anything").count(), 0);
    }
}
