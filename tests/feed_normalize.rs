// tests/feed_normalize.rs
//
// Pipeline-level tests for the feed normalizer: rejection steps, ordering,
// idempotence, and the strict Somali gate.

use war_crypto_portal::{clean_wire_items, LanguageProfile, NormalizeOptions, WireItem};

fn item(url: &str, title: &str) -> WireItem {
    WireItem {
        url: url.into(),
        title: title.into(),
        ..Default::default()
    }
}

fn dated(url: &str, title: &str, published_at: &str) -> WireItem {
    WireItem {
        published_at: published_at.into(),
        ..item(url, title)
    }
}

fn clean(items: Vec<WireItem>) -> Vec<WireItem> {
    clean_wire_items(items, LanguageProfile::embedded(), NormalizeOptions::default())
}

#[test]
fn normalization_is_idempotent() {
    let items = vec![
        dated("https://src.com/a", "Bitcoin ayaa kor u kacay", "2026-08-25T08:00:00Z"),
        dated("https://src.com/en/a", "Bitcoin ayaa kor u kacay", "2026-08-25T08:00:00Z"),
        dated("https://src.com/b", "Suuqa maanta", "2026-08-26T08:00:00Z"),
        item("https://src.com/ko/c", "dropped"),
    ];
    let once = clean(items);
    let twice = clean(once.clone());
    assert_eq!(once, twice);
}

#[test]
fn output_is_sorted_newest_first() {
    let items = vec![
        dated("https://src.com/old", "old", "2026-08-01T00:00:00Z"),
        dated("https://src.com/new", "new", "2026-08-26T00:00:00Z"),
        dated("https://src.com/mid", "mid", "2026-08-10T00:00:00Z"),
    ];
    let titles: Vec<String> = clean(items).into_iter().map(|i| i.title).collect();
    assert_eq!(titles, vec!["new", "mid", "old"]);
}

#[test]
fn unparseable_dates_sort_after_all_valid_dates() {
    let items = vec![
        dated("https://src.com/x", "undated", "not-a-date"),
        dated("https://src.com/y", "ancient", "1999-01-01T00:00:00Z"),
    ];
    let titles: Vec<String> = clean(items).into_iter().map(|i| i.title).collect();
    assert_eq!(titles, vec!["ancient", "undated"]);
}

#[test]
fn hangul_title_is_always_dropped() {
    let out = clean(vec![item("https://src.com/a", "암호화폐 뉴스")]);
    assert!(out.is_empty());
}

#[test]
fn cyrillic_and_kana_titles_are_dropped() {
    let out = clean(vec![
        item("https://src.com/a", "Новости криптовалют"),
        item("https://src.com/b", "ビットコインニュース"),
    ]);
    assert!(out.is_empty());
}

#[test]
fn wrong_locale_paths_are_always_dropped() {
    let out = clean(vec![
        item("https://src.com/ko/markets/a", "Bitcoin news"),
        item("https://src.com/fil/markets/b", "Bitcoin news"),
    ]);
    assert!(out.is_empty());
}

#[test]
fn other_locale_prefixes_survive_rejection() {
    // Only the denylisted locales are rejected outright; an /en/ variant is
    // a dedup candidate, not an automatic drop.
    let out = clean(vec![item("https://src.com/en/markets/a", "Bitcoin news")]);
    assert_eq!(out.len(), 1);
}

#[test]
fn boilerplate_pages_are_dropped_in_both_languages() {
    let mut legal_en = item("https://src.com/legal", "Read this");
    legal_en.summary = "Terms of Service for the site".into();
    let mut legal_so = item("https://src.com/sharci", "Akhri tan");
    legal_so.tags = vec!["shuruudaha adeegga".into()];

    assert!(clean(vec![legal_en, legal_so]).is_empty());
}

#[test]
fn strict_gate_keeps_only_somali_items() {
    let somali = dated(
        "https://src.com/so-story",
        "Bitcoin ayaa maanta kor u dhaqaaqay suuqa",
        "2026-08-26T00:00:00Z",
    );
    let english = dated(
        "https://src.com/en-story",
        "Bitcoin rises as the market rallies after the ETF news",
        "2026-08-26T00:00:00Z",
    );

    let all = clean_wire_items(
        vec![somali.clone(), english.clone()],
        LanguageProfile::embedded(),
        NormalizeOptions::default(),
    );
    assert_eq!(all.len(), 2, "default options keep both");

    let gated = clean_wire_items(
        vec![somali, english],
        LanguageProfile::embedded(),
        NormalizeOptions { only_somali: true },
    );
    let urls: Vec<String> = gated.into_iter().map(|i| i.url).collect();
    assert_eq!(urls, vec!["https://src.com/so-story"]);
}

#[test]
fn branding_rewrites_do_not_change_identity() {
    // Same canonical URL with and without the branding prefix: one survives
    // and its title is rewritten.
    let a = dated("https://src.com/a", "BREAKING: Bitcoin warbixin", "2026-08-26T00:00:00Z");
    let out = clean(vec![a]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].title, "DEG DEG: Bitcoin warbixin");
}
