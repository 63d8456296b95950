// src/feed/canonical.rs
//! Canonical-URL handling for duplicate detection.
//!
//! The upstream scraper emits per-language URL variants that differ only by
//! a locale path prefix (`/ko/...`, `/fil/...`, `/so/...`). Stripping the
//! prefix yields the canonical key used to group translations of the same
//! story.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// First path segment that looks like a locale code: 2-3 lowercase letters.
static RE_LOCALE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2,3}$").expect("locale segment regex"));

/// Canonical grouping key for one raw URL, plus whether a locale prefix was
/// stripped to produce it (the tie-break in dedup prefers prefix-free URLs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalKey {
    pub key: String,
    pub had_locale_prefix: bool,
}

/// Compute the canonical key for `raw`.
///
/// A URL that fails to parse is its own key: no two malformed URLs collapse
/// together unless byte-identical, and a malformed URL never counts as
/// having a locale prefix. This function never errors.
pub fn canonical_key(raw: &str) -> CanonicalKey {
    let parsed = match Url::parse(raw) {
        Ok(u) => u,
        Err(_) => {
            return CanonicalKey {
                key: raw.to_string(),
                had_locale_prefix: false,
            }
        }
    };

    let origin = parsed.origin().ascii_serialization();
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    match segments.first() {
        Some(first) if RE_LOCALE_SEGMENT.is_match(first) => CanonicalKey {
            key: format!("{}/{}", origin, segments[1..].join("/")),
            had_locale_prefix: true,
        },
        _ => CanonicalKey {
            key: format!("{}{}", origin, parsed.path()),
            had_locale_prefix: false,
        },
    }
}

/// First path segment of `raw`, lowercased, when it looks like a locale code.
pub fn locale_prefix(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let first = parsed
        .path_segments()
        .and_then(|mut s| s.find(|p| !p.is_empty()))?;
    RE_LOCALE_SEGMENT
        .is_match(first)
        .then(|| first.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_two_letter_locale_prefix() {
        let k = canonical_key("https://src.com/ko/markets/btc-ath");
        assert_eq!(k.key, "https://src.com/markets/btc-ath");
        assert!(k.had_locale_prefix);
    }

    #[test]
    fn strips_three_letter_locale_prefix() {
        let k = canonical_key("https://src.com/fil/a");
        assert_eq!(k.key, "https://src.com/a");
        assert!(k.had_locale_prefix);
    }

    #[test]
    fn base_url_is_untouched() {
        let k = canonical_key("https://src.com/markets/btc-ath");
        assert_eq!(k.key, "https://src.com/markets/btc-ath");
        assert!(!k.had_locale_prefix);
    }

    #[test]
    fn long_first_segment_is_not_a_locale() {
        let k = canonical_key("https://src.com/news/a");
        assert_eq!(k.key, "https://src.com/news/a");
        assert!(!k.had_locale_prefix);
    }

    #[test]
    fn prefixed_and_base_variants_share_a_key() {
        let a = canonical_key("https://src.com/en/a");
        let b = canonical_key("https://src.com/a");
        assert_eq!(a.key, b.key);
        assert!(a.had_locale_prefix);
        assert!(!b.had_locale_prefix);
    }

    #[test]
    fn malformed_url_is_its_own_key() {
        let k = canonical_key("not a url at all");
        assert_eq!(k.key, "not a url at all");
        assert!(!k.had_locale_prefix);
        // Two different malformed URLs never collapse.
        assert_ne!(canonical_key("::x").key, canonical_key("::y").key);
    }

    #[test]
    fn locale_prefix_extraction() {
        assert_eq!(locale_prefix("https://src.com/ko/a"), Some("ko".into()));
        assert_eq!(locale_prefix("https://src.com/fil/a"), Some("fil".into()));
        assert_eq!(locale_prefix("https://src.com/news/a"), None);
        assert_eq!(locale_prefix("garbage"), None);
    }
}
