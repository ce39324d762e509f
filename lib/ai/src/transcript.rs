//! Cleanup of speech-to-text output.
//!
//! Voice notes come back from transcription with filler words and stray
//! noise tokens. Cleanup here is conservative: it never invents text, keeps
//! comma-separated item lists intact, and falls back to the original when it
//! would remove too much.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::warn;

static LEADING_FILLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(eh+|ah+|mm+|este|bueno|o sea)\s+").expect("valid regex"));

static TRAILING_FILLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(eh+|ah+|mm+|este|bueno|o sea)$").expect("valid regex"));

static NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(uhm|umm|hmm|mhm)\b").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*,\s*").expect("valid regex"));

/// Cleans a raw transcription.
///
/// Returns the trimmed original if cleanup leaves fewer than 3 characters
/// or removes more than half of the text.
#[must_use]
pub fn clean_transcription(text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    let cleaned = LEADING_FILLER.replace(text, "");
    let cleaned = TRAILING_FILLER.replace(&cleaned, "");
    let cleaned = remove_noise(&cleaned);
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    let cleaned = COMMA.replace_all(&cleaned, ", ");
    let cleaned = cleaned.trim();

    let cleaned_len = cleaned.chars().count();
    if cleaned_len < 3 {
        warn!(original = text, cleaned, "cleanup left too little text, keeping original");
        return text.trim().to_string();
    }
    if cleaned_len * 2 < text.chars().count() {
        warn!(original = text, cleaned, "cleanup removed too much text, keeping original");
        return text.trim().to_string();
    }

    cleaned.to_string()
}

/// Drops noise tokens unless they sit right before a comma or "y", where
/// they are more likely part of a spoken list.
fn remove_noise(text: &str) -> String {
    NOISE
        .replace_all(text, |caps: &Captures<'_>| {
            let Some(token) = caps.get(0) else {
                return String::new();
            };
            let rest = text[token.end()..].trim_start();
            let in_list = rest.starts_with(',') || rest.starts_with(['y', 'Y']);
            if in_list {
                token.as_str().to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}
