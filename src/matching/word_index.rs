use crate::text_toolkit::normalize;
use std::collections::HashMap;

/// Normalized word → cue name, built once from a reference vocabulary string.
///
/// The cue name is the word itself. Lookup is exact key match only; fuzzy
/// matching never applies at word level.
pub struct WordCueIndex {
    cues: HashMap<String, String>,
}

impl WordCueIndex {
    pub fn from_vocabulary(vocabulary: &str) -> Self {
        let mut cues = HashMap::new();

        let cleaned = normalize(vocabulary);
        for word in cleaned.split(' ') {
            if word.is_empty() {
                continue;
            }
            // First occurrence wins, duplicates ignored
            cues.entry(word.to_string()).or_insert_with(|| word.to_string());
        }

        Self { cues }
    }

    pub fn lookup(&self, word: &str) -> Option<&str> {
        self.cues.get(word).map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.cues.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}
