use crate::host::{AnimationHost, CueDurationTable};
use crate::matching::phrase_table::{MatchResult, PhraseTable};
use crate::matching::word_index::WordCueIndex;
use crate::sequencer::{build_sequence, SequenceHandle, SequenceTiming};
use crate::settings::{EngineSettings, NoMatchBehavior};
use crate::text_toolkit::normalize;
use log::{debug, info};
use std::sync::{Arc, Mutex};

/// Where the engine currently is in handling an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Matching,
    /// A phrase rule matched and its cue was fired.
    Resolved,
    /// A decomposition sequence is in flight.
    Decomposing,
}

/// Entry point of the matching core.
///
/// Holds the compiled phrase table, the word cue index and the single
/// active-sequence handle. `handle_utterance` must be called from within a
/// tokio runtime, since decomposition spawns a timed sequencing task.
pub struct MatchEngine {
    settings: EngineSettings,
    phrase_table: PhraseTable,
    word_index: WordCueIndex,
    durations: CueDurationTable,
    host: Arc<dyn AnimationHost>,
    state: Arc<Mutex<EngineState>>,
    /// At most one sequence is in flight; replaced (never mutated in place)
    /// on each new utterance.
    active_sequence: Mutex<Option<SequenceHandle>>,
}

impl MatchEngine {
    pub fn new(settings: EngineSettings, host: Arc<dyn AnimationHost>) -> Self {
        let phrase_table = PhraseTable::new(&settings.phrase_rules);
        let word_index = WordCueIndex::from_vocabulary(&settings.vocabulary);
        let durations = CueDurationTable::from_host(host.as_ref());

        info!(
            "Match engine ready: {} phrase rules, {} word cues, {} known cue durations",
            phrase_table.len(),
            word_index.len(),
            durations.len()
        );

        Self {
            settings,
            phrase_table,
            word_index,
            durations,
            host,
            state: Arc::new(Mutex::new(EngineState::Idle)),
            active_sequence: Mutex::new(None),
        }
    }

    /// Handles one finalized utterance of recognized speech.
    ///
    /// A phrase hit fires its cue immediately (cancelling any in-flight
    /// sequence first). A miss either starts a decomposition sequence or just
    /// logs, per `no_match_behavior`. Blank input is a no-op.
    pub fn handle_utterance(&self, raw_text: &str) -> MatchResult {
        if raw_text.trim().is_empty() {
            return MatchResult::NoMatch;
        }

        *self.state.lock().unwrap() = EngineState::Matching;

        let cleaned = normalize(raw_text);
        let result = self.phrase_table.find_match(&cleaned);

        match &result {
            MatchResult::ExactPhrase { cue_name, phrase } => {
                debug!("Exact phrase match '{}' -> cue '{}'", phrase, cue_name);
                self.resolve_with_cue(cue_name);
            }
            MatchResult::FuzzyPhrase {
                cue_name,
                phrase,
                similarity,
            } => {
                debug!(
                    "Fuzzy phrase match '{}' (similarity {:.2}) -> cue '{}'",
                    phrase, similarity, cue_name
                );
                self.resolve_with_cue(cue_name);
            }
            MatchResult::NoMatch => {
                debug!("No matching phrase found for: {}", raw_text);
                match self.settings.no_match_behavior {
                    NoMatchBehavior::Decompose => self.start_decomposition(&cleaned),
                    NoMatchBehavior::LogOnly => {
                        *self.state.lock().unwrap() = EngineState::Idle;
                    }
                }
            }
        }

        result
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock().unwrap()
    }

    pub fn is_sequencing(&self) -> bool {
        self.state() == EngineState::Decomposing
    }

    /// Stops any in-flight decomposition sequence and returns to idle.
    pub fn cancel(&self) {
        if let Some(handle) = self.active_sequence.lock().unwrap().take() {
            debug!("Cancelling in-flight cue sequence");
            handle.cancel();
        }
        *self.state.lock().unwrap() = EngineState::Idle;
    }

    fn resolve_with_cue(&self, cue_name: &str) {
        // A cue from a prior unmatched utterance must not keep playing over
        // the phrase cue.
        if let Some(handle) = self.active_sequence.lock().unwrap().take() {
            handle.cancel();
        }

        *self.state.lock().unwrap() = EngineState::Resolved;
        self.host.trigger_cue(cue_name);
        *self.state.lock().unwrap() = EngineState::Idle;
    }

    fn start_decomposition(&self, cleaned: &str) {
        let words: Vec<&str> = cleaned.split(' ').collect();
        let steps = build_sequence(&words, &self.word_index);
        info!(
            "Decomposing utterance into {} cue steps ({} words)",
            steps.len(),
            words.len()
        );

        let timing = SequenceTiming {
            mode: self.settings.step_timing,
            fixed_delay: self.settings.step_delay(),
        };

        // Swap under the handle lock so the old sequence is stopped before
        // the new one can fire its first step.
        let mut active = self.active_sequence.lock().unwrap();
        if let Some(previous) = active.take() {
            debug!("Replacing in-flight cue sequence");
            previous.cancel();
        }

        *self.state.lock().unwrap() = EngineState::Decomposing;

        let state = Arc::clone(&self.state);
        *active = Some(SequenceHandle::spawn(
            steps,
            Arc::clone(&self.host),
            self.durations.clone(),
            timing,
            self.settings.idle_cue.clone(),
            move || {
                *state.lock().unwrap() = EngineState::Idle;
            },
        ));
    }
}
