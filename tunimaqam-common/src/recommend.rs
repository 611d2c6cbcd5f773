//! Context-driven maqam recommendations
//!
//! Every corpus entry accumulates a score from independent signals (mood,
//! event, region, historical period, season, heritage and difficulty flags).
//! Each signal that fires leaves an [`Evidence`] tag. Entries without
//! evidence or with a non-positive score are dropped, the rest are ranked and
//! the top three unique names are returned. When heritage preservation is
//! requested, the best at-risk or locally rare entry is guaranteed a place.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::corpus::{is_heritage_rarity, CorpusEntry};
use crate::scoring::{finalize_confidence, sort_by_confidence, Evidence};

/// Maximum number of recommendations returned
pub const MAX_RECOMMENDATIONS: usize = 3;

const EMOTION_MATCH_SCORE: f64 = 0.3;
const USAGE_MATCH_SCORE: f64 = 0.25;
const REGION_MATCH_SCORE: f64 = 0.2;
const TIME_PERIOD_MATCH_SCORE: f64 = 0.1;
const SEASON_MATCH_SCORE: f64 = 0.1;
const HERITAGE_BOOST: f64 = 0.2;
const BEGINNER_BOOST: f64 = 0.15;
const NON_BEGINNER_PENALTY: f64 = 0.05;
const ADVANCED_OK_BOOST: f64 = 0.05;

const FALLBACK_REASON: &str = "general fit for the requested context";

/// Request context; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecommendationContext {
    pub mood: Option<String>,
    pub event: Option<String>,
    pub region: Option<String>,
    pub time_period: Option<String>,
    pub season: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub preserve_heritage: bool,
    #[serde(deserialize_with = "truthy")]
    pub simple_for_beginners: bool,
}

/// Accept any JSON value for a flag and read it the way a loose client means it
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

/// Context with trimmed, lower-cased text fields (empty when absent)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedContext {
    pub mood: String,
    pub event: String,
    pub region: String,
    pub time_period: String,
    pub season: String,
    pub preserve_heritage: bool,
    pub simple_for_beginners: bool,
}

impl RecommendationContext {
    pub fn normalized(&self) -> NormalizedContext {
        fn clean(field: &Option<String>) -> String {
            field.as_deref().unwrap_or_default().trim().to_lowercase()
        }

        NormalizedContext {
            mood: clean(&self.mood),
            event: clean(&self.event),
            region: clean(&self.region),
            time_period: clean(&self.time_period),
            season: clean(&self.season),
            preserve_heritage: self.preserve_heritage,
            simple_for_beginners: self.simple_for_beginners,
        }
    }
}

impl NormalizedContext {
    /// False when no field carries a signal
    pub fn has_signal(&self) -> bool {
        !self.mood.is_empty()
            || !self.event.is_empty()
            || !self.region.is_empty()
            || !self.time_period.is_empty()
            || !self.season.is_empty()
            || self.preserve_heritage
            || self.simple_for_beginners
    }
}

/// One recommended maqam
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub maqam: String,
    pub maqam_ar: String,
    pub emotion: Option<String>,
    pub emotion_ar: Option<String>,
    pub usage: Option<String>,
    pub usage_ar: Option<String>,
    pub regions: Vec<String>,
    pub regions_ar: Vec<String>,
    pub confidence: f64,
    pub reason: String,
    pub rarity_level: Option<String>,
    pub difficulty_label: Option<String>,
    pub evidence: Vec<Evidence>,
}

impl Recommendation {
    pub fn is_heritage(&self) -> bool {
        is_heritage_rarity(self.rarity_level.as_deref())
    }
}

/// Recommend up to [`MAX_RECOMMENDATIONS`] maqamet for `context`
pub fn recommend(entries: &[CorpusEntry], context: &RecommendationContext) -> Vec<Recommendation> {
    let ctx = context.normalized();
    if !ctx.has_signal() {
        return Vec::new();
    }

    let ranked = rank_candidates(entries, &ctx);
    debug!("Recommendation: {} scored candidates", ranked.len());

    rerank_heritage(&ranked, ctx.preserve_heritage)
}

/// Score every entry and sort the survivors by descending confidence
pub fn rank_candidates(entries: &[CorpusEntry], ctx: &NormalizedContext) -> Vec<Recommendation> {
    let mut candidates: Vec<Recommendation> = entries
        .iter()
        .filter_map(|entry| score_entry(entry, ctx))
        .collect();
    sort_by_confidence(&mut candidates, |c| c.confidence);
    candidates
}

/// Final top three from the full ranking
///
/// With `preserve_heritage`, the best heritage candidate from anywhere in the
/// ranking is placed first and the rest of the ranking follows. Names are
/// de-duplicated keeping the first occurrence.
pub fn rerank_heritage(ranked: &[Recommendation], preserve_heritage: bool) -> Vec<Recommendation> {
    let best_heritage = if preserve_heritage {
        ranked.iter().find(|c| c.is_heritage())
    } else {
        None
    };

    take_unique(best_heritage.into_iter().chain(ranked), MAX_RECOMMENDATIONS)
}

fn take_unique<'a>(
    candidates: impl Iterator<Item = &'a Recommendation>,
    limit: usize,
) -> Vec<Recommendation> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(limit);
    for candidate in candidates {
        if unique.len() == limit {
            break;
        }
        if seen.insert(candidate.maqam.as_str()) {
            unique.push(candidate.clone());
        }
    }
    unique
}

/// Running total for one entry
#[derive(Default)]
struct Accumulator {
    score: f64,
    evidence: Vec<Evidence>,
    reasons: Vec<&'static str>,
}

impl Accumulator {
    fn add(&mut self, amount: f64, evidence: Evidence, reason: Option<&'static str>) {
        self.score += amount;
        self.evidence.push(evidence);
        if let Some(reason) = reason {
            self.reasons.push(reason);
        }
    }
}

fn score_entry(entry: &CorpusEntry, ctx: &NormalizedContext) -> Option<Recommendation> {
    let mut acc = Accumulator::default();

    if !ctx.mood.is_empty() {
        if let Some(weights) = &entry.emotion_weights {
            let weight = weights.get(&ctx.mood).copied().unwrap_or(0.0);
            acc.add(weight.min(1.0), Evidence::EmotionWeight, Some("emotion alignment"));
        } else if lower_contains(entry.emotion.as_deref(), &ctx.mood) {
            acc.add(EMOTION_MATCH_SCORE, Evidence::EmotionMatch, Some("emotion alignment"));
        }
    }

    if !ctx.event.is_empty()
        && entry
            .usage_tags()
            .iter()
            .any(|tag| tag.to_lowercase().contains(&ctx.event))
    {
        acc.add(USAGE_MATCH_SCORE, Evidence::UsageMatch, Some("usage match"));
    }

    if any_tag_equals(&entry.regions, &ctx.region) {
        acc.add(REGION_MATCH_SCORE, Evidence::RegionMatch, Some("region match"));
    }

    if any_tag_equals(&entry.historical_periods, &ctx.time_period) {
        acc.add(TIME_PERIOD_MATCH_SCORE, Evidence::TimePeriodMatch, Some("period match"));
    }

    if any_tag_equals(&entry.seasonal_usage, &ctx.season) {
        acc.add(SEASON_MATCH_SCORE, Evidence::SeasonMatch, Some("season match"));
    }

    if ctx.preserve_heritage && entry.is_heritage() {
        acc.add(HERITAGE_BOOST, Evidence::HeritageBoost, Some("heritage boost"));
    }

    let difficulty = entry.difficulty_label.as_deref().map(str::to_lowercase);
    if ctx.simple_for_beginners {
        if difficulty.as_deref() == Some("beginner") {
            acc.add(BEGINNER_BOOST, Evidence::BeginnerPath, Some("beginner-friendly"));
        } else {
            acc.score -= NON_BEGINNER_PENALTY;
        }
    } else if matches!(difficulty.as_deref(), Some("intermediate" | "advanced")) {
        acc.add(ADVANCED_OK_BOOST, Evidence::AdvancedOk, None);
    }

    let score = acc.score.clamp(0.0, 1.0);
    if score <= 0.0 || acc.evidence.is_empty() {
        return None;
    }

    let reason = if acc.reasons.is_empty() {
        FALLBACK_REASON.to_string()
    } else {
        acc.reasons.join("; ")
    };

    Some(Recommendation {
        maqam: entry.name_en.clone(),
        maqam_ar: entry.name_ar.clone(),
        emotion: entry.emotion.clone(),
        emotion_ar: entry.emotion_ar.clone(),
        usage: entry.usage.clone(),
        usage_ar: entry.usage_ar.clone(),
        regions: entry.regions.clone(),
        regions_ar: entry.regions_ar.clone(),
        confidence: finalize_confidence(score),
        reason,
        rarity_level: entry.rarity_level.clone(),
        difficulty_label: entry.difficulty_label.clone(),
        evidence: acc.evidence,
    })
}

fn lower_contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

/// Exact case-insensitive tag match; an empty wanted value never matches
fn any_tag_equals(tags: &[String], wanted: &str) -> bool {
    !wanted.is_empty() && tags.iter().any(|tag| tag.to_lowercase() == wanted)
}
