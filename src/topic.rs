//! Topic normalization.
//!
//! Two normalizations exist on purpose:
//!
//! - [`normalize_topic_key`] produces the canonical cache key. It lower-cases the
//!   input and keeps only ASCII letters and digits, so `"Space"`, `"  Sp@ce!!"`
//!   and `"SPACE"` all share one cache entry.
//! - [`humanize_topic`] produces the topic as it appears inside the generation
//!   prompt. Case is preserved and punctuation runs become single spaces, so
//!   the prompt stays readable.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHANUMERIC_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("static regex is valid"));

/// Maps a raw topic to its canonical cache key.
///
/// The output contains only `[a-z0-9]` and the function is idempotent.
pub fn normalize_topic_key(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Maps a raw topic to the human-readable form used in prompts.
pub fn humanize_topic(raw: &str) -> String {
    NON_ALPHANUMERIC_RUN
        .replace_all(raw, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_strips_case_and_punctuation() {
        assert_eq!(normalize_topic_key("Space"), "space");
        assert_eq!(normalize_topic_key("  Sp@ce!!"), "space");
        assert_eq!(normalize_topic_key("World War 2"), "worldwar2");
        assert_eq!(normalize_topic_key("C++ & Rust"), "crust");
    }

    #[test]
    fn test_key_drops_non_ascii_letters() {
        assert_eq!(normalize_topic_key("Café Ölberg"), "caflberg");
        assert_eq!(normalize_topic_key("日本"), "");
    }

    #[test]
    fn test_key_is_idempotent() {
        let once = normalize_topic_key("The Beatles (1960s)");
        assert_eq!(normalize_topic_key(&once), once);
    }

    #[test]
    fn test_humanize_collapses_runs_and_keeps_case() {
        assert_eq!(humanize_topic("  Sp@ce!!"), "Sp ce");
        assert_eq!(humanize_topic("The   Beatles -- 1960s"), "The Beatles 1960s");
        assert_eq!(humanize_topic("Ancient\tÉgypt\n"), "Ancient Égypt");
        assert_eq!(humanize_topic("!!!"), "");
    }
}
