use std::collections::HashMap;

/// Boundary to the animation playback host.
///
/// The engine fires cues by name and never validates that the host knows a
/// cue; unrecognized names are the host's concern. Implementations must be
/// `Send + Sync`: cue triggers arrive both from `handle_utterance` callers
/// and from in-flight sequencer tasks.
pub trait AnimationHost: Send + Sync {
    /// Fire-and-forget cue trigger. The host owns actual playback.
    fn trigger_cue(&self, cue_name: &str);

    /// Playback length in seconds for a cue, if the host knows it.
    fn cue_duration(&self, cue_name: &str) -> Option<f32>;

    /// Every cue the host can play, with its playback length in seconds.
    /// Queried once at engine startup to build the [`CueDurationTable`].
    fn available_cues(&self) -> Vec<(String, f32)>;
}

/// Known playback durations keyed by lower-cased cue name.
///
/// Built once from the host's cue inventory. The sequencer only consults it
/// under duration-driven timing; fixed-delay mode keeps it informational.
#[derive(Debug, Clone, Default)]
pub struct CueDurationTable {
    durations: HashMap<String, f32>,
}

impl CueDurationTable {
    pub fn from_host(host: &dyn AnimationHost) -> Self {
        let mut durations = HashMap::new();
        for (name, length) in host.available_cues() {
            // First entry wins when the host reports duplicate names
            durations.entry(name.to_lowercase()).or_insert(length);
        }
        Self { durations }
    }

    /// Case-insensitive duration lookup in seconds.
    pub fn get(&self, cue_name: &str) -> Option<f32> {
        self.durations.get(&cue_name.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}
