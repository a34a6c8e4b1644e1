// Re-export all matching components
pub mod engine;
pub mod phrase_table;
pub mod word_index;

pub use engine::{EngineState, MatchEngine};
pub use phrase_table::{MatchResult, PhraseTable};
pub use word_index::WordCueIndex;
