// src/syndication.rs
//! Feed outputs: RSS 2.0 and a Google-News-flavored XML sitemap.
//!
//! Both are derived from already-normalized items and built by plain string
//! assembly with XML escaping on every text field. Callers pass items
//! through the feed normalizer first (the RSS route with the strict Somali
//! gate).

use chrono::{DateTime, Duration, Utc};
use quick_xml::escape::escape;

use crate::feed::published_ts;
use crate::feed::types::WireItem;
use crate::story_id;

pub const RSS_MAX_ITEMS: usize = 50;
pub const SITEMAP_MAX_URLS: usize = 1000;
/// Google News only indexes recent stories; older ones waste the crawl.
pub const SITEMAP_WINDOW_DAYS: i64 = 2;

const CHANNEL_TITLE: &str = "War Crypto — Wararka Lacagaha Crypto";
const CHANNEL_DESCRIPTION: &str =
    "Wararka ugu dambeeyay ee suuqa lacagaha crypto, af Soomaali.";

/// Story detail URL on this portal for one wire item.
pub fn story_url(site_base_url: &str, item: &WireItem) -> String {
    format!("{}/news/{}", site_base_url, story_id::encode(&item.url))
}

/// RSS 2.0 document over at most [`RSS_MAX_ITEMS`] items.
pub fn rss_feed(items: &[WireItem], site_base_url: &str) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push_str("\n<rss version=\"2.0\"><channel>");
    push_tag(&mut out, "title", CHANNEL_TITLE);
    push_tag(&mut out, "link", site_base_url);
    push_tag(&mut out, "description", CHANNEL_DESCRIPTION);
    push_tag(&mut out, "language", "so");

    for item in items.iter().take(RSS_MAX_ITEMS) {
        out.push_str("<item>");
        push_tag(&mut out, "title", &item.title);
        push_tag(&mut out, "link", &story_url(site_base_url, item));
        push_tag(&mut out, "guid", &item.url);
        if !item.summary.is_empty() {
            push_tag(&mut out, "description", &item.summary);
        }
        if let Some(date) = rfc2822(item) {
            push_tag(&mut out, "pubDate", &date);
        }
        if !item.source.is_empty() {
            push_tag(&mut out, "source", &item.source);
        }
        for tag in &item.tags {
            push_tag(&mut out, "category", tag);
        }
        out.push_str("</item>");
    }

    out.push_str("</channel></rss>");
    out
}

/// Google-News sitemap: stories published within the last
/// [`SITEMAP_WINDOW_DAYS`] of `now`, capped at [`SITEMAP_MAX_URLS`].
pub fn news_sitemap(items: &[WireItem], site_base_url: &str, now: DateTime<Utc>) -> String {
    let cutoff = (now - Duration::days(SITEMAP_WINDOW_DAYS)).timestamp();

    let mut out = String::with_capacity(4096);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push_str(
        "\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\" \
         xmlns:news=\"http://www.google.com/schemas/sitemap-news/0.9\">",
    );

    let recent = items
        .iter()
        .filter(|it| published_ts(it) >= cutoff)
        .take(SITEMAP_MAX_URLS);
    for item in recent {
        out.push_str("<url>");
        push_tag(&mut out, "loc", &story_url(site_base_url, item));
        out.push_str("<news:news><news:publication>");
        push_tag(&mut out, "news:name", CHANNEL_TITLE);
        push_tag(&mut out, "news:language", "so");
        out.push_str("</news:publication>");
        push_tag(&mut out, "news:publication_date", &item.published_at);
        push_tag(&mut out, "news:title", &item.title);
        out.push_str("</news:news></url>");
    }

    out.push_str("</urlset>");
    out
}

fn push_tag(out: &mut String, tag: &str, text: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&escape(text));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn rfc2822(item: &WireItem) -> Option<String> {
    chrono::DateTime::parse_from_rfc3339(&item.published_at)
        .ok()
        .map(|dt| dt.to_rfc2822())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: &str, title: &str, published_at: &str) -> WireItem {
        WireItem {
            url: url.into(),
            title: title.into(),
            published_at: published_at.into(),
            ..Default::default()
        }
    }

    #[test]
    fn rss_escapes_text_fields() {
        let mut it = item("https://s.com/a?x=1&y=2", "Bitcoin <& Ethereum>", "");
        it.summary = "qiimaha > 100k & sii kordhaya".into();
        let xml = rss_feed(&[it], "https://warcrypto.app");
        assert!(xml.contains("Bitcoin &lt;&amp; Ethereum&gt;"));
        assert!(xml.contains("qiimaha &gt; 100k &amp; sii kordhaya"));
        assert!(!xml.contains("<& "));
    }

    #[test]
    fn rss_caps_at_fifty_items() {
        let items: Vec<WireItem> = (0..80)
            .map(|i| item(&format!("https://s.com/{i}"), &format!("t{i}"), ""))
            .collect();
        let xml = rss_feed(&items, "https://warcrypto.app");
        assert_eq!(xml.matches("<item>").count(), RSS_MAX_ITEMS);
    }

    #[test]
    fn rss_links_use_story_id_routes() {
        let it = item("https://s.com/a", "t", "");
        let xml = rss_feed(&[it.clone()], "https://warcrypto.app");
        let expected = format!(
            "<link>https://warcrypto.app/news/{}</link>",
            crate::story_id::encode(&it.url)
        );
        assert!(xml.contains(&expected));
    }

    #[test]
    fn sitemap_restricts_to_two_day_window() {
        let now = DateTime::parse_from_rfc3339("2026-08-27T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let fresh = item("https://s.com/fresh", "fresh", "2026-08-26T12:00:00Z");
        let stale = item("https://s.com/stale", "stale", "2026-08-20T12:00:00Z");
        let undated = item("https://s.com/undated", "undated", "");

        let xml = news_sitemap(&[fresh, stale, undated], "https://warcrypto.app", now);
        assert!(xml.contains("fresh"));
        assert!(!xml.contains("stale"));
        assert!(!xml.contains("undated"));
    }

    #[test]
    fn sitemap_caps_at_one_thousand_urls() {
        let now = Utc::now();
        let items: Vec<WireItem> = (0..1100)
            .map(|i| {
                item(
                    &format!("https://s.com/{i}"),
                    &format!("t{i}"),
                    &now.to_rfc3339(),
                )
            })
            .collect();
        let xml = news_sitemap(&items, "https://warcrypto.app", now);
        assert_eq!(xml.matches("<url>").count(), SITEMAP_MAX_URLS);
    }
}
