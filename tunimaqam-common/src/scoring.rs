//! Pieces shared by the note matcher and the recommendation scorer

use serde::{Deserialize, Serialize};

/// Tag naming a scoring rule that fired for a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    NotePatternMatch,
    EmotionAlignment,
    EmotionWeight,
    EmotionMatch,
    UsageMatch,
    RegionMatch,
    TimePeriodMatch,
    SeasonMatch,
    HeritageBoost,
    BeginnerPath,
    AdvancedOk,
}

impl Evidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Evidence::NotePatternMatch => "note_pattern_match",
            Evidence::EmotionAlignment => "emotion_alignment",
            Evidence::EmotionWeight => "emotion_weight",
            Evidence::EmotionMatch => "emotion_match",
            Evidence::UsageMatch => "usage_match",
            Evidence::RegionMatch => "region_match",
            Evidence::TimePeriodMatch => "time_period_match",
            Evidence::SeasonMatch => "season_match",
            Evidence::HeritageBoost => "heritage_boost",
            Evidence::BeginnerPath => "beginner_path",
            Evidence::AdvancedOk => "advanced_ok",
        }
    }
}

impl std::fmt::Display for Evidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp to [0, 1] and round to two decimals
pub fn finalize_confidence(score: f64) -> f64 {
    round_hundredths(score.clamp(0.0, 1.0))
}

/// Round to two decimals, ties to even, judged on the exact binary value
///
/// `0.125` is exactly representable and rounds down to `0.12`, while `0.285`
/// is stored just below the half and also rounds down.
pub fn round_hundredths(x: f64) -> f64 {
    let lower = (x * 100.0).floor();
    // Single rounding, so the sign of x*100 - (lower + 0.5) is exact
    let offset = x.mul_add(100.0, -(lower + 0.5));
    let hundredths = if offset > 0.0 {
        lower + 1.0
    } else if offset < 0.0 || lower % 2.0 == 0.0 {
        lower
    } else {
        lower + 1.0
    };
    hundredths / 100.0
}

/// Stable sort by descending confidence; ties keep corpus order
pub(crate) fn sort_by_confidence<T>(candidates: &mut [T], confidence: impl Fn(&T) -> f64) {
    candidates.sort_by(|a, b| confidence(b).total_cmp(&confidence(a)));
}
