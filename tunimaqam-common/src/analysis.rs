//! First-jins note pattern matching
//!
//! Input notes are compared against the first jins of every maqam only. The
//! first jins carries the tonic (qarar) and the characteristic intervals, so
//! it is the maqam's identity; later ajnas are for display.
//!
//! # Scoring
//!
//! ```text
//! precision  = matched / input notes
//! coverage   = matched / pattern notes
//! base       = 0.7 * precision + 0.3 * coverage
//! confidence = base * multiplier(matched)   (+0.08 on emotion alignment)
//! ```

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::corpus::CorpusEntry;
use crate::notes::normalize_note;
use crate::scoring::{finalize_confidence, sort_by_confidence, Evidence};

/// Maximum number of candidates returned
pub const MAX_NOTE_CANDIDATES: usize = 5;

const PRECISION_WEIGHT: f64 = 0.7;
const COVERAGE_WEIGHT: f64 = 0.3;
const EMOTION_ALIGNMENT_BONUS: f64 = 0.08;

/// Match-count multiplier: thin evidence from few matched notes is penalized
pub fn match_multiplier(matched: usize) -> f64 {
    match matched {
        0 | 1 => 0.5,
        2 => 0.7,
        3 => 0.85,
        4 => 0.95,
        _ => 1.0,
    }
}

/// One maqam suggested for a set of notes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteCandidate {
    pub maqam: String,
    pub maqam_ar: String,
    pub confidence: f64,
    pub reason: String,
    pub evidence: Vec<Evidence>,
    pub matched_notes: Vec<String>,
}

/// Rank corpus entries by how well their first jins matches `notes`
///
/// Empty tokens are dropped before normalization; if nothing remains the
/// result is empty. At most [`MAX_NOTE_CANDIDATES`] are returned, sorted by
/// descending confidence with ties in corpus order.
pub fn analyze_notes<S: AsRef<str>>(
    entries: &[CorpusEntry],
    notes: &[S],
    mood: Option<&str>,
) -> Vec<NoteCandidate> {
    let input: BTreeSet<String> = notes
        .iter()
        .map(AsRef::as_ref)
        .filter(|n| !n.is_empty())
        .map(normalize_note)
        .collect();
    if input.is_empty() {
        return Vec::new();
    }

    let mood = mood.filter(|m| !m.is_empty()).map(str::to_lowercase);

    let mut candidates: Vec<NoteCandidate> = entries
        .iter()
        .filter_map(|entry| score_entry(entry, &input, mood.as_deref()))
        .collect();

    debug!(
        "Note analysis: {} input notes, {} candidates",
        input.len(),
        candidates.len()
    );

    sort_by_confidence(&mut candidates, |c| c.confidence);
    candidates.truncate(MAX_NOTE_CANDIDATES);
    candidates
}

fn score_entry(
    entry: &CorpusEntry,
    input: &BTreeSet<String>,
    mood: Option<&str>,
) -> Option<NoteCandidate> {
    let pattern: BTreeSet<String> = entry
        .first_jins()?
        .notes
        .pattern()
        .iter()
        .map(|n| normalize_note(n))
        .collect();
    if pattern.is_empty() {
        return None;
    }

    let common: Vec<String> = input.intersection(&pattern).cloned().collect();
    if common.is_empty() {
        return None;
    }

    let matched = common.len();
    let precision = matched as f64 / input.len() as f64;
    let coverage = matched as f64 / pattern.len() as f64;
    let base = PRECISION_WEIGHT * precision + COVERAGE_WEIGHT * coverage;
    let mut confidence = base * match_multiplier(matched);

    let mut evidence = vec![Evidence::NotePatternMatch];
    if let (Some(mood), Some(emotion)) = (mood, entry.emotion.as_deref()) {
        if emotion.to_lowercase().contains(mood) {
            confidence = (confidence + EMOTION_ALIGNMENT_BONUS).min(1.0);
            evidence.push(Evidence::EmotionAlignment);
        }
    }

    Some(NoteCandidate {
        maqam: entry.name_en.clone(),
        maqam_ar: entry.name_ar.clone(),
        confidence: finalize_confidence(confidence),
        reason: format!(
            "Matched {}/{} input notes; {}/{} maqam notes covered",
            matched,
            input.len(),
            matched,
            pattern.len()
        ),
        evidence,
        matched_notes: common,
    })
}
