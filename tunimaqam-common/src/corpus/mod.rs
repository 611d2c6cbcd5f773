//! Typed maqam corpus
//!
//! A `CorpusEntry` is the read-only view of one stored maqam. Stored rows keep
//! ajnas, regions, periods and weights as JSON text; those columns are decoded
//! exactly once when the row is loaded (see [`parse`]) and malformed data
//! degrades to empty defaults instead of failing the whole scan.

pub mod parse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rarity tags that mark an entry as heritage-relevant
pub const HERITAGE_RARITIES: [&str; 2] = ["at_risk", "locally_rare"];

/// Display pair in English and Arabic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bilingual {
    pub en: Option<String>,
    pub ar: Option<String>,
}

impl Bilingual {
    pub fn new(en: Option<String>, ar: Option<String>) -> Self {
        Self { en, ar }
    }

    /// English value, falling back to Arabic
    pub fn preferred(&self) -> Option<&str> {
        self.en.as_deref().or(self.ar.as_deref())
    }
}

/// Notes of a jins, either keyed by language or as a flat list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JinsNotes {
    ByLanguage(BTreeMap<String, Vec<String>>),
    Flat(Vec<String>),
}

impl Default for JinsNotes {
    fn default() -> Self {
        JinsNotes::Flat(Vec::new())
    }
}

impl JinsNotes {
    /// Notes used for matching: the `en` list, or the flat list
    pub fn pattern(&self) -> &[String] {
        match self {
            JinsNotes::ByLanguage(by_lang) => by_lang.get("en").map(Vec::as_slice).unwrap_or(&[]),
            JinsNotes::Flat(notes) => notes,
        }
    }
}

/// One jins (tetrachord/pentachord) of a maqam
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Jins {
    pub name: Bilingual,
    pub notes: JinsNotes,
}

/// A maqam as seen by the scoring core
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusEntry {
    pub id: i64,
    pub name_en: String,
    pub name_ar: String,

    pub emotion: Option<String>,
    pub emotion_ar: Option<String>,
    /// `Some` whenever the stored weights were a valid JSON object, even an empty one
    pub emotion_weights: Option<BTreeMap<String, f64>>,

    /// Comma-separated tag list as stored
    pub usage: Option<String>,
    pub usage_ar: Option<String>,

    pub regions: Vec<String>,
    pub regions_ar: Vec<String>,
    pub historical_periods: Vec<String>,
    pub historical_periods_ar: Vec<String>,
    pub seasonal_usage: Vec<String>,
    pub seasonal_usage_ar: Vec<String>,

    pub rarity_level: Option<String>,
    pub rarity_level_ar: Option<String>,
    pub difficulty_index: Option<f64>,
    pub difficulty_label: Option<String>,
    pub difficulty_label_ar: Option<String>,

    /// Ordered ajnas; the first one identifies the maqam for matching
    pub ajnas: Vec<Jins>,

    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub related: Vec<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl CorpusEntry {
    /// The identifying jins, if any
    pub fn first_jins(&self) -> Option<&Jins> {
        self.ajnas.first()
    }

    /// Usage tags split on commas, trimmed, empties dropped
    pub fn usage_tags(&self) -> Vec<&str> {
        split_tags(self.usage.as_deref())
    }

    /// Arabic usage tags split the same way
    pub fn usage_tags_ar(&self) -> Vec<&str> {
        split_tags(self.usage_ar.as_deref())
    }

    /// True for `at_risk` and `locally_rare` entries
    pub fn is_heritage(&self) -> bool {
        is_heritage_rarity(self.rarity_level.as_deref())
    }
}

pub fn is_heritage_rarity(rarity: Option<&str>) -> bool {
    rarity.is_some_and(|r| HERITAGE_RARITIES.contains(&r))
}

fn split_tags(raw: Option<&str>) -> Vec<&str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .collect()
}
