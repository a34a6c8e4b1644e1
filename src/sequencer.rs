//! Timed cue sequencing for decomposed utterances.
//!
//! When no phrase rule matches, the engine hands the utterance's words here.
//! Known words play their word cue; unknown words fall back to one letter cue
//! per character. Steps fire on a spawned task with a hold between each, and
//! the whole sequence can be cancelled before its next step fires.

use crate::host::{AnimationHost, CueDurationTable};
use crate::matching::word_index::WordCueIndex;
use crate::settings::StepTiming;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// One cue trigger in a decomposition sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueStep {
    Word { cue_name: String },
    Letter { letter: char, cue_name: String },
}

impl CueStep {
    pub fn cue_name(&self) -> &str {
        match self {
            CueStep::Word { cue_name } | CueStep::Letter { cue_name, .. } => cue_name,
        }
    }
}

/// Expands normalized words into cue steps.
///
/// Words present in the index keep their word cue; anything else breaks into
/// letter cues named after the upper-cased character. Empty entries (from
/// repeated spaces in the normalized text) are skipped.
pub fn build_sequence(words: &[&str], index: &WordCueIndex) -> Vec<CueStep> {
    let mut steps = Vec::new();

    for word in words {
        if word.is_empty() {
            continue;
        }

        if let Some(cue_name) = index.lookup(word) {
            steps.push(CueStep::Word {
                cue_name: cue_name.to_string(),
            });
        } else {
            debug!("No word cue found for '{}', breaking into letters", word);
            for letter in word.chars() {
                let upper = letter.to_uppercase().next().unwrap_or(letter);
                steps.push(CueStep::Letter {
                    letter: upper,
                    cue_name: upper.to_string(),
                });
            }
        }
    }

    steps
}

/// Per-step hold policy, resolved when the sequence starts.
#[derive(Debug, Clone, Copy)]
pub struct SequenceTiming {
    pub mode: StepTiming,
    pub fixed_delay: Duration,
}

impl SequenceTiming {
    fn hold_for(&self, cue_name: &str, durations: &CueDurationTable) -> Duration {
        match self.mode {
            StepTiming::FixedDelay => self.fixed_delay,
            StepTiming::CueDuration => durations
                .get(cue_name)
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f32)
                .unwrap_or(self.fixed_delay),
        }
    }
}

/// Handle to one in-flight cue sequence.
///
/// Exactly one sequence may be active at a time; the engine swaps the handle
/// out and cancels the old one whenever a new utterance arrives. Dropping the
/// handle does not stop the task; cancellation is explicit.
pub struct SequenceHandle {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SequenceHandle {
    /// Spawns the sequence onto the current tokio runtime.
    ///
    /// Each step checks the cancellation flag, triggers its cue, then holds.
    /// After the last step the idle cue fires and `on_complete` runs;
    /// a cancelled sequence reaches neither.
    pub fn spawn(
        steps: Vec<CueStep>,
        host: Arc<dyn AnimationHost>,
        durations: CueDurationTable,
        timing: SequenceTiming,
        idle_cue: String,
        on_complete: impl FnOnce() + Send + 'static,
    ) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let task = tokio::spawn(async move {
            for step in &steps {
                if flag.load(Ordering::SeqCst) {
                    return;
                }

                match step {
                    CueStep::Word { cue_name } => {
                        debug!("Playing word cue '{}'", cue_name);
                    }
                    CueStep::Letter { letter, cue_name } => {
                        debug!("Playing letter cue '{}' for '{}'", cue_name, letter);
                    }
                }
                host.trigger_cue(step.cue_name());

                tokio::time::sleep(timing.hold_for(step.cue_name(), &durations)).await;
            }

            if flag.load(Ordering::SeqCst) {
                return;
            }
            host.trigger_cue(&idle_cue);
            on_complete();
        });

        Self { cancelled, task }
    }

    /// Stops the sequence before its next step fires. Silent: cancelled
    /// sequences report nothing.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHost {
        triggered: Mutex<Vec<String>>,
    }

    impl RecordingHost {
        fn triggered(&self) -> Vec<String> {
            self.triggered.lock().unwrap().clone()
        }
    }

    impl AnimationHost for RecordingHost {
        fn trigger_cue(&self, cue_name: &str) {
            self.triggered.lock().unwrap().push(cue_name.to_string());
        }

        fn cue_duration(&self, _cue_name: &str) -> Option<f32> {
            None
        }

        fn available_cues(&self) -> Vec<(String, f32)> {
            Vec::new()
        }
    }

    fn word_step(cue: &str) -> CueStep {
        CueStep::Word {
            cue_name: cue.to_string(),
        }
    }

    #[test]
    fn known_words_become_word_steps_and_unknown_break_into_letters() {
        let index = WordCueIndex::from_vocabulary("we support this");
        let steps = build_sequence(&["we", "fully", "support", "this"], &index);

        let cue_names: Vec<&str> = steps.iter().map(|s| s.cue_name()).collect();
        assert_eq!(
            cue_names,
            vec!["we", "F", "U", "L", "L", "Y", "support", "this"]
        );
        assert!(matches!(steps[0], CueStep::Word { .. }));
        assert!(matches!(steps[1], CueStep::Letter { letter: 'F', .. }));
    }

    #[test]
    fn empty_words_are_skipped() {
        let index = WordCueIndex::from_vocabulary("");
        assert!(build_sequence(&["", ""], &index).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn plays_all_steps_then_idle() {
        let host = Arc::new(RecordingHost::default());
        let timing = SequenceTiming {
            mode: StepTiming::FixedDelay,
            fixed_delay: Duration::from_secs(3),
        };

        let handle = SequenceHandle::spawn(
            vec![word_step("we"), word_step("support")],
            Arc::clone(&host) as Arc<dyn AnimationHost>,
            CueDurationTable::default(),
            timing,
            "idle".to_string(),
            || {},
        );

        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(host.triggered(), vec!["we", "support", "idle"]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_sequence_still_plays_idle() {
        let host = Arc::new(RecordingHost::default());
        let timing = SequenceTiming {
            mode: StepTiming::FixedDelay,
            fixed_delay: Duration::from_secs(3),
        };

        let handle = SequenceHandle::spawn(
            Vec::new(),
            Arc::clone(&host) as Arc<dyn AnimationHost>,
            CueDurationTable::default(),
            timing,
            "idle".to_string(),
            || {},
        );

        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(host.triggered(), vec!["idle"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_pending_steps_and_skips_idle() {
        let host = Arc::new(RecordingHost::default());
        let timing = SequenceTiming {
            mode: StepTiming::FixedDelay,
            fixed_delay: Duration::from_secs(3),
        };

        let handle = SequenceHandle::spawn(
            vec![word_step("we"), word_step("support"), word_step("this")],
            Arc::clone(&host) as Arc<dyn AnimationHost>,
            CueDurationTable::default(),
            timing,
            "idle".to_string(),
            || {},
        );

        // Let the first step fire, then cancel mid-hold.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(host.triggered(), vec!["we"]);
        handle.cancel();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(host.triggered(), vec!["we"]);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_callback_runs_only_on_full_playthrough() {
        let host = Arc::new(RecordingHost::default());
        let completed = Arc::new(AtomicBool::new(false));
        let completed_flag = Arc::clone(&completed);
        let timing = SequenceTiming {
            mode: StepTiming::FixedDelay,
            fixed_delay: Duration::from_millis(100),
        };

        let handle = SequenceHandle::spawn(
            vec![word_step("we")],
            Arc::clone(&host) as Arc<dyn AnimationHost>,
            CueDurationTable::default(),
            timing,
            "idle".to_string(),
            move || completed_flag.store(true, Ordering::SeqCst),
        );

        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(completed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cue_duration_timing_uses_host_lengths_with_fixed_fallback() {
        struct InventoryHost {
            inner: RecordingHost,
        }

        impl AnimationHost for InventoryHost {
            fn trigger_cue(&self, cue_name: &str) {
                self.inner.trigger_cue(cue_name);
            }

            fn cue_duration(&self, cue_name: &str) -> Option<f32> {
                (cue_name == "wave").then_some(1.5)
            }

            fn available_cues(&self) -> Vec<(String, f32)> {
                vec![("wave".to_string(), 1.5)]
            }
        }

        let host = Arc::new(InventoryHost {
            inner: RecordingHost::default(),
        });
        let durations = CueDurationTable::from_host(host.as_ref());
        let timing = SequenceTiming {
            mode: StepTiming::CueDuration,
            fixed_delay: Duration::from_secs(3),
        };

        let started = tokio::time::Instant::now();
        let handle = SequenceHandle::spawn(
            vec![word_step("wave"), word_step("unknown")],
            Arc::clone(&host) as Arc<dyn AnimationHost>,
            durations,
            timing,
            "idle".to_string(),
            || {},
        );

        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(host.inner.triggered(), vec!["wave", "unknown", "idle"]);
        // 1.5s for the known cue, fixed 3s fallback for the unknown one
        assert!(started.elapsed() >= Duration::from_millis(4500));
    }
}
