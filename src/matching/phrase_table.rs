use crate::settings::PhraseRule;
use crate::text_toolkit::{normalize, similarity};
use log::warn;

/// Outcome of matching one normalized utterance against the phrase table.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// Input equals the rule's normalized phrase.
    ExactPhrase { cue_name: String, phrase: String },
    /// Similarity reached the rule's own threshold.
    FuzzyPhrase {
        cue_name: String,
        phrase: String,
        similarity: f32,
    },
    NoMatch,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        !matches!(self, MatchResult::NoMatch)
    }

    pub fn cue_name(&self) -> Option<&str> {
        match self {
            MatchResult::ExactPhrase { cue_name, .. }
            | MatchResult::FuzzyPhrase { cue_name, .. } => Some(cue_name),
            MatchResult::NoMatch => None,
        }
    }
}

struct CompiledRule {
    /// Original phrase as configured, reported back in match results.
    phrase: String,
    normalized_phrase: String,
    cue_name: String,
    threshold: f32,
}

/// Ordered phrase rules. Matching is a linear scan in declaration order:
/// the first rule satisfying its own threshold wins, with no cross-rule
/// comparison of similarity scores.
pub struct PhraseTable {
    rules: Vec<CompiledRule>,
}

impl PhraseTable {
    /// Compiles rules once at startup. Rules whose phrase normalizes to
    /// empty can never match and are dropped with a warning.
    pub fn new(rules: &[PhraseRule]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| {
                let normalized_phrase = normalize(&rule.phrase);
                if normalized_phrase.is_empty() {
                    warn!(
                        "Dropping phrase rule for cue '{}': phrase '{}' is empty after normalization",
                        rule.cue_name, rule.phrase
                    );
                    return None;
                }
                Some(CompiledRule {
                    phrase: rule.phrase.clone(),
                    normalized_phrase,
                    cue_name: rule.cue_name.clone(),
                    threshold: rule.threshold,
                })
            })
            .collect();

        Self { rules }
    }

    pub fn find_match(&self, normalized_input: &str) -> MatchResult {
        for rule in &self.rules {
            // Try exact match first
            if normalized_input == rule.normalized_phrase {
                return MatchResult::ExactPhrase {
                    cue_name: rule.cue_name.clone(),
                    phrase: rule.phrase.clone(),
                };
            }

            let score = similarity(normalized_input, &rule.normalized_phrase);
            if score >= rule.threshold {
                return MatchResult::FuzzyPhrase {
                    cue_name: rule.cue_name.clone(),
                    phrase: rule.phrase.clone(),
                    similarity: score,
                };
            }
        }

        MatchResult::NoMatch
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
