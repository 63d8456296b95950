// src/feed/language.rs
//! Somali language-confidence scoring.
//!
//! A bag-of-words heuristic used for duplicate tie-breaking and the strict
//! RSS-only language gate. It is intentionally crude: weighted whole-word
//! hits for Somali function words and a few idioms, minus weighted hits for
//! common English stop-words, plus a flat bonus when the reading-time field
//! uses Somali time units. Deterministic and side-effect free.
//!
//! The word/weight tables live in `config/language.toml` (embedded default,
//! overridable via `LANGUAGE_CONFIG_PATH`), mirroring how the scorer is
//! meant to be tuned without code changes.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

pub const DEFAULT_LANGUAGE_CONFIG: &str = include_str!("../../config/language.toml");
pub const ENV_LANGUAGE_CONFIG_PATH: &str = "LANGUAGE_CONFIG_PATH";

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
struct ProfileRoot {
    language: LanguageSection,
    somali_words: HashMap<String, i32>,
    #[serde(default)]
    somali_phrases: HashMap<String, i32>,
    english_stopwords: HashMap<String, i32>,
}

#[derive(Debug, Clone, Deserialize)]
struct LanguageSection {
    threshold: i32,
    time_unit_bonus: i32,
    time_units: Vec<String>,
}

/* ----------------------------
Compiled profile
---------------------------- */

/// Compiled scorer: word tables plus phrase regexes built once at load.
#[derive(Debug)]
pub struct LanguageProfile {
    threshold: i32,
    time_unit_bonus: i32,
    time_units: Vec<String>,
    words: HashMap<String, i32>,
    stopwords: HashMap<String, i32>,
    phrases: Vec<(Regex, i32)>,
}

static EMBEDDED_DEFAULT: Lazy<LanguageProfile> = Lazy::new(|| {
    LanguageProfile::from_toml_str(DEFAULT_LANGUAGE_CONFIG).expect("embedded language profile")
});

impl LanguageProfile {
    /// Load from `$LANGUAGE_CONFIG_PATH` when set, else the embedded default.
    pub fn from_toml() -> anyhow::Result<Self> {
        if let Ok(p) = std::env::var(ENV_LANGUAGE_CONFIG_PATH) {
            let path = PathBuf::from(p);
            let content = fs::read_to_string(&path).map_err(|e| {
                anyhow::anyhow!("failed to read language config at {}: {}", path.display(), e)
            })?;
            return Self::from_toml_str(&content);
        }
        Self::from_toml_str(DEFAULT_LANGUAGE_CONFIG)
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: ProfileRoot = toml::from_str(toml_str)?;

        let phrases = cfg
            .somali_phrases
            .iter()
            .map(|(phrase, w)| {
                let pat = format!(r"(?u)\b{}\b", regex::escape(phrase));
                let re = Regex::new(&pat)
                    .map_err(|e| anyhow::anyhow!("phrase `{}` regex error: {}", phrase, e))?;
                Ok((re, *w))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            threshold: cfg.language.threshold,
            time_unit_bonus: cfg.language.time_unit_bonus,
            time_units: cfg.language.time_units,
            words: lowercase_keys(cfg.somali_words),
            stopwords: lowercase_keys(cfg.english_stopwords),
            phrases,
        })
    }

    /// Shared profile built from the embedded default table.
    pub fn embedded() -> &'static LanguageProfile {
        &EMBEDDED_DEFAULT
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    /// Raw bag-of-words score for one text fragment.
    pub fn score_text(&self, text: &str) -> i32 {
        let lowered = text.to_lowercase();
        let mut score = 0i32;

        for tok in tokenize(&lowered) {
            if let Some(w) = self.words.get(tok) {
                score += w;
            }
            if let Some(w) = self.stopwords.get(tok) {
                score -= w;
            }
        }
        for (re, w) in &self.phrases {
            score += re.find_iter(&lowered).count() as i32 * w;
        }
        score
    }

    /// Confidence that a `(title, summary, reading_time)` triple is Somali.
    /// Title contributes 3x; summary 1x; Somali time units add a flat bonus.
    pub fn confidence(&self, title: &str, summary: &str, reading_time: &str) -> i32 {
        let rt = reading_time.to_lowercase();
        let bonus = if self.time_units.iter().any(|u| rt.contains(u.as_str())) {
            self.time_unit_bonus
        } else {
            0
        };
        3 * self.score_text(title) + self.score_text(summary) + bonus
    }

    /// Strict gate used by the RSS feed: score at or above the threshold.
    pub fn is_somali(&self, title: &str, summary: &str, reading_time: &str) -> bool {
        self.confidence(title, summary, reading_time) >= self.threshold
    }
}

fn lowercase_keys(map: HashMap<String, i32>) -> HashMap<String, i32> {
    map.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect()
}

/// Alphanumeric tokens, assumes already-lowercased input.
fn tokenize(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty())
}
