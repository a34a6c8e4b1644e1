use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Maps a target phrase to the cue played when an utterance matches it.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PhraseRule {
    pub phrase: String,
    pub cue_name: String,
    /// Minimum similarity for a fuzzy hit, in [0, 1].
    #[serde(default = "default_match_threshold")]
    pub threshold: f32,
}

fn default_match_threshold() -> f32 {
    0.8
}

impl PhraseRule {
    pub fn new(phrase: &str, cue_name: &str) -> Self {
        Self {
            phrase: phrase.to_string(),
            cue_name: cue_name.to_string(),
            threshold: default_match_threshold(),
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }
}

/// What the engine does when no phrase rule matches an utterance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchBehavior {
    /// Break the utterance into word and letter cues (default).
    Decompose,
    /// Log the miss and stop.
    LogOnly,
}

impl Default for NoMatchBehavior {
    fn default() -> Self {
        NoMatchBehavior::Decompose
    }
}

/// How long the sequencer holds each cue before advancing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepTiming {
    /// Constant hold per step, `step_delay_ms` (default).
    FixedDelay,
    /// Hold for the cue's known playback duration, falling back to
    /// `step_delay_ms` for cues the host did not report.
    CueDuration,
}

impl Default for StepTiming {
    fn default() -> Self {
        StepTiming::FixedDelay
    }
}

/// Immutable engine configuration, loaded once at initialization.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EngineSettings {
    /// Phrase rules, matched in declaration order.
    #[serde(default)]
    pub phrase_rules: Vec<PhraseRule>,
    /// Reference vocabulary; every word in it becomes a word cue of the
    /// same name.
    #[serde(default)]
    pub vocabulary: String,
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    /// Terminal cue fired after a sequence finishes.
    #[serde(default = "default_idle_cue")]
    pub idle_cue: String,
    #[serde(default)]
    pub no_match_behavior: NoMatchBehavior,
    #[serde(default)]
    pub step_timing: StepTiming,
}

fn default_step_delay_ms() -> u64 {
    3000
}

fn default_idle_cue() -> String {
    "idle".to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            phrase_rules: Vec::new(),
            vocabulary: String::new(),
            step_delay_ms: default_step_delay_ms(),
            idle_cue: default_idle_cue(),
            no_match_behavior: NoMatchBehavior::default(),
            step_timing: StepTiming::default(),
        }
    }
}

impl EngineSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse engine settings JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}
