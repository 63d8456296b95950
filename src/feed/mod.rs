// src/feed/mod.rs
//! Feed normalization: turn the raw scraper output into a clean,
//! deduplicated, time-ordered list suitable for display. Pure functions,
//! no network I/O.

pub mod canonical;
pub mod language;
pub mod types;

use std::collections::HashMap;

use metrics::{counter, histogram};

use crate::feed::canonical::{canonical_key, locale_prefix};
use crate::feed::language::LanguageProfile;
use crate::feed::types::WireItem;

/// Markers that indicate the scraper picked up a legal/boilerplate page
/// instead of a story. Matched against the concatenated item text.
const BOILERPLATE_MARKERS: &[&str] = &[
    "privacy policy",
    "terms of service",
    "terms of use",
    "cookie policy",
    "siyaasadda sirta",
    "shuruudaha adeegga",
    "kukiyada",
];

/// Locale path prefixes that are always wrong for this portal.
const DISALLOWED_LOCALES: &[&str] = &["ko", "fil"];

/// Upstream branding artifacts rewritten in titles. Applied after dedup so
/// rewrites never change item identity.
const TITLE_REWRITES: &[(&str, &str)] = &[
    ("BREAKING:", "DEG DEG:"),
    ("Press Release:", "War Saxaafadeed:"),
    (" - CoinDesk", ""),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    /// Strict gate: drop items scoring below the Somali threshold. Risky
    /// when the upstream mix is thin; only the RSS feed opts in.
    pub only_somali: bool,
}

/// Full normalization pipeline. Step order matters: reject, dedup by
/// canonical URL, sanitize titles, sort by publish time, optional strict
/// language gate. Idempotent; never errors on malformed input.
pub fn clean_wire_items(
    items: Vec<WireItem>,
    profile: &LanguageProfile,
    opts: NormalizeOptions,
) -> Vec<WireItem> {
    let t0 = std::time::Instant::now();
    let total_in = items.len();

    // Steps 1-3: structural, boilerplate, script, and locale rejection.
    let mut dropped = 0usize;
    let mut candidates = Vec::with_capacity(items.len());
    for it in items {
        if it.url.is_empty() || it.title.is_empty() {
            dropped += 1;
            continue;
        }
        if is_boilerplate(&it) || has_broken_script(&it.title) || has_disallowed_locale(&it.url) {
            dropped += 1;
            continue;
        }
        candidates.push(it);
    }

    // Step 4: canonicalize and keep the best item per key.
    struct Kept {
        item: WireItem,
        score: i32,
        had_prefix: bool,
    }
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<Kept> = Vec::with_capacity(candidates.len());
    let mut dedup_out = 0usize;

    for it in candidates {
        let ck = canonical_key(&it.url);
        let score = profile.confidence(&it.title, &it.summary, &it.reading_time);
        let entry = Kept {
            item: it,
            score,
            had_prefix: ck.had_locale_prefix,
        };
        match by_key.get(&ck.key) {
            None => {
                by_key.insert(ck.key, kept.len());
                kept.push(entry);
            }
            Some(&idx) => {
                dedup_out += 1;
                let current = &kept[idx];
                let replace = entry.score > current.score
                    || (entry.score == current.score && current.had_prefix && !entry.had_prefix);
                if replace {
                    kept[idx] = entry;
                }
            }
        }
    }

    // Step 5: sanitize titles (identity already resolved above).
    let mut out: Vec<WireItem> = kept
        .into_iter()
        .map(|k| {
            let mut it = k.item;
            it.title = sanitize_title(&it.title);
            it
        })
        .collect();

    // Step 6: newest first; unparseable timestamps sort as epoch 0.
    out.sort_by(|a, b| published_ts(b).cmp(&published_ts(a)));

    // Step 7: optional strict language gate.
    if opts.only_somali {
        out.retain(|it| profile.is_somali(&it.title, &it.summary, &it.reading_time));
    }

    counter!("feed_items_total").increment(total_in as u64);
    counter!("feed_dropped_total").increment(dropped as u64);
    counter!("feed_dedup_total").increment(dedup_out as u64);
    histogram!("feed_normalize_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    out
}

/// Unix seconds parsed from the ISO-8601 `published_at`; 0 when unparseable.
pub fn published_ts(it: &WireItem) -> i64 {
    chrono::DateTime::parse_from_rfc3339(&it.published_at)
        .map(|dt| dt.timestamp())
        .unwrap_or(0)
}

fn is_boilerplate(it: &WireItem) -> bool {
    let haystack = format!(
        "{} {} {} {} {} {}",
        it.url,
        it.title,
        it.summary,
        it.content,
        it.section,
        it.tags.join(" ")
    )
    .to_lowercase();
    BOILERPLATE_MARKERS.iter().any(|m| haystack.contains(m))
}

/// Code points from scripts that render as mojibake in the Somali UI:
/// CJK ideographs, Hangul, Hiragana/Katakana, Cyrillic.
fn has_broken_script(title: &str) -> bool {
    title.chars().any(|c| {
        matches!(c,
            '\u{4E00}'..='\u{9FFF}'   // CJK unified ideographs
            | '\u{AC00}'..='\u{D7AF}' // Hangul syllables
            | '\u{1100}'..='\u{11FF}' // Hangul jamo
            | '\u{3040}'..='\u{309F}' // Hiragana
            | '\u{30A0}'..='\u{30FF}' // Katakana
            | '\u{0400}'..='\u{04FF}' // Cyrillic
        )
    })
}

fn has_disallowed_locale(url: &str) -> bool {
    locale_prefix(url)
        .map(|p| DISALLOWED_LOCALES.contains(&p.as_str()))
        .unwrap_or(false)
}

/// Decode scraped HTML entities, then apply the fixed branding rewrites.
pub fn sanitize_title(title: &str) -> String {
    let mut out = html_escape::decode_html_entities(title).to_string();
    for (from, to) in TITLE_REWRITES {
        out = out.replace(from, to);
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: &str, title: &str) -> WireItem {
        WireItem {
            url: url.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_url_or_title_is_dropped() {
        let p = LanguageProfile::embedded();
        let items = vec![item("", "t"), item("https://s.com/a", "")];
        assert!(clean_wire_items(items, p, NormalizeOptions::default()).is_empty());
    }

    #[test]
    fn boilerplate_markers_drop_items() {
        let p = LanguageProfile::embedded();
        let mut it = item("https://s.com/legal", "About the site");
        it.content = "Our Privacy Policy explains cookies".into();
        assert!(clean_wire_items(vec![it], p, NormalizeOptions::default()).is_empty());
    }

    #[test]
    fn hangul_title_is_dropped() {
        let p = LanguageProfile::embedded();
        let items = vec![item("https://s.com/a", "암호화폐 뉴스")];
        assert!(clean_wire_items(items, p, NormalizeOptions::default()).is_empty());
    }

    #[test]
    fn disallowed_locale_paths_are_dropped() {
        let p = LanguageProfile::embedded();
        let items = vec![
            item("https://s.com/ko/a", "Bitcoin"),
            item("https://s.com/fil/a", "Bitcoin"),
        ];
        assert!(clean_wire_items(items, p, NormalizeOptions::default()).is_empty());
    }

    #[test]
    fn title_rewrites_apply() {
        assert_eq!(
            sanitize_title("BREAKING: Bitcoin warbixin - CoinDesk"),
            "DEG DEG: Bitcoin warbixin"
        );
        assert_eq!(sanitize_title("A &amp; B"), "A & B");
    }

    #[test]
    fn unparseable_dates_sort_last() {
        let p = LanguageProfile::embedded();
        let mut a = item("https://s.com/a", "A");
        a.published_at = "2026-08-20T10:00:00Z".into();
        let mut b = item("https://s.com/b", "B");
        b.published_at = "last tuesday".into();
        let mut c = item("https://s.com/c", "C");
        c.published_at = "2026-08-25T10:00:00Z".into();

        let out = clean_wire_items(vec![a, b, c], p, NormalizeOptions::default());
        let titles: Vec<&str> = out.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
    }
}
