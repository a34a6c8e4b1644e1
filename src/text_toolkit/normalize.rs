use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("static pattern"));

/// Canonicalizes recognized speech text for comparison.
///
/// Lower-cases, strips every character that is not a word character or
/// whitespace, and trims the result. All phrase and word comparisons in the
/// engine run on this form.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lowered = text.to_lowercase();
    NON_WORD.replace_all(lowered.trim(), "").trim().to_string()
}
