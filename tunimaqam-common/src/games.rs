//! Practice games built from the corpus
//!
//! Games are self-checking: every payload carries its own solution and no
//! state is kept between requests, unlike the graded quizzes in
//! [`crate::learning`].

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::str::FromStr;

use crate::corpus::CorpusEntry;
use crate::learning::{build_mcq_choices, jins_names, MCQ_DISTRACTORS};
use crate::{Error, Result};

/// Questions in one speed MCQ round
pub const SPEED_QUIZ_LENGTH: usize = 7;

/// Maqamet sampled for one matching board
pub const MATCHING_PAIRS: usize = 7;

/// Choices shown in an odd-one-out puzzle; all but one share a value
pub const ODD_ONE_OUT_CHOICES: usize = 4;

/// Placeholder for a maqam without a value on the matching board
pub const UNKNOWN_VALUE: &str = "Unknown";

/// Fact a game asks about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameTopic {
    #[default]
    Emotion,
    Region,
    Usage,
}

impl GameTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameTopic::Emotion => "emotion",
            GameTopic::Region => "region",
            GameTopic::Usage => "usage",
        }
    }

    /// Primary emotion, first region or first usage tag
    pub fn value_of<'a>(&self, entry: &'a CorpusEntry) -> Option<&'a str> {
        match self {
            GameTopic::Emotion => entry.emotion.as_deref().filter(|e| !e.is_empty()),
            GameTopic::Region => entry
                .regions
                .first()
                .map(String::as_str)
                .filter(|r| !r.is_empty()),
            GameTopic::Usage => entry.usage_tags().first().copied(),
        }
    }
}

impl FromStr for GameTopic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "emotion" => Ok(GameTopic::Emotion),
            "region" => Ok(GameTopic::Region),
            "usage" => Ok(GameTopic::Usage),
            _ => Err(Error::InvalidInput("invalid topic".to_string())),
        }
    }
}

/// Maqam shown by id and English name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaqamChoice {
    pub id: i64,
    pub name: String,
}

impl From<&CorpusEntry> for MaqamChoice {
    fn from(entry: &CorpusEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name_en.clone(),
        }
    }
}

fn no_maqamet() -> Error {
    Error::InvalidInput("no maqamet".to_string())
}

// ========================================
// Speed MCQ
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedQuestion {
    pub maqam_id: i64,
    pub question: String,
    pub choices: Vec<String>,
    pub answer: String,
}

/// Up to [`SPEED_QUIZ_LENGTH`] MCQs on `topic`, maqamet in random order
///
/// A maqam is skipped when it has no value for the topic or when the corpus
/// offers no distractor for it.
pub fn speed_quiz<R: Rng + ?Sized>(
    entries: &[CorpusEntry],
    topic: GameTopic,
    rng: &mut R,
) -> Vec<SpeedQuestion> {
    let mut order: Vec<&CorpusEntry> = entries.iter().collect();
    order.shuffle(rng);

    let mut questions = Vec::new();
    for entry in order {
        if questions.len() == SPEED_QUIZ_LENGTH {
            break;
        }
        let Some(correct) = topic.value_of(entry) else {
            continue;
        };

        let pool: Vec<&str> = match topic {
            GameTopic::Emotion => entries
                .iter()
                .filter(|other| other.id != entry.id)
                .filter_map(|other| topic.value_of(other))
                .collect(),
            GameTopic::Region => entries
                .iter()
                .flat_map(|other| other.regions.iter().map(String::as_str))
                .collect(),
            GameTopic::Usage => entries.iter().flat_map(|other| other.usage_tags()).collect(),
        };

        let choices = build_mcq_choices(correct, &pool, MCQ_DISTRACTORS, rng);
        if choices.len() < 2 {
            continue;
        }

        questions.push(SpeedQuestion {
            maqam_id: entry.id,
            question: format!("What is the {} of {}?", topic.as_str(), entry.name_en),
            choices,
            answer: correct.to_string(),
        });
    }
    questions
}

// ========================================
// Matching
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchingPair {
    pub maqam_id: i64,
    pub value: String,
}

/// Names on the left, shuffled values on the right
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchingGame {
    pub topic: GameTopic,
    pub left: Vec<MaqamChoice>,
    pub right: Vec<String>,
    pub solution: Vec<MatchingPair>,
}

pub fn matching_game<R: Rng + ?Sized>(
    entries: &[CorpusEntry],
    topic: GameTopic,
    rng: &mut R,
) -> MatchingGame {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut solution = Vec::new();

    for entry in entries.choose_multiple(rng, MATCHING_PAIRS) {
        let value = topic.value_of(entry).unwrap_or(UNKNOWN_VALUE).to_string();
        left.push(MaqamChoice::from(entry));
        right.push(value.clone());
        solution.push(MatchingPair {
            maqam_id: entry.id,
            value,
        });
    }
    right.shuffle(rng);

    MatchingGame {
        topic,
        left,
        right,
        solution,
    }
}

// ========================================
// Clue game
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CluePuzzle {
    pub clues: Vec<String>,
    pub answer: String,
    pub maqam_id: i64,
}

/// Shuffled descriptive clues for one maqam
pub fn clue_puzzle<R: Rng + ?Sized>(entry: &CorpusEntry, rng: &mut R) -> CluePuzzle {
    let present = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

    let mut clues = Vec::new();
    if let Some(emotion) = present(&entry.emotion) {
        clues.push(format!("Emotion: {}", emotion));
    }
    if let Some(usage) = present(&entry.usage) {
        clues.push(format!("Usage: {}", usage));
    }
    if let Some(level) = present(&entry.difficulty_label) {
        clues.push(format!("Level: {}", level));
    }
    if !entry.regions.is_empty() {
        clues.push(format!("Region(s): {}", entry.regions.join(", ")));
    }
    let ajnas = jins_names(entry);
    if !ajnas.is_empty() {
        clues.push(format!("Ajnas: {}", ajnas.join(", ")));
    }
    clues.shuffle(rng);

    CluePuzzle {
        clues,
        answer: entry.name_en.clone(),
        maqam_id: entry.id,
    }
}

/// Puzzle for one random maqam
pub fn clue_game<R: Rng + ?Sized>(entries: &[CorpusEntry], rng: &mut R) -> Result<CluePuzzle> {
    let entry = entries.choose(rng).ok_or_else(no_maqamet)?;
    Ok(clue_puzzle(entry, rng))
}

/// One puzzle per maqam, in random order
pub fn clue_game_all<R: Rng + ?Sized>(
    entries: &[CorpusEntry],
    rng: &mut R,
) -> Result<Vec<CluePuzzle>> {
    if entries.is_empty() {
        return Err(no_maqamet());
    }
    let mut order: Vec<&CorpusEntry> = entries.iter().collect();
    order.shuffle(rng);
    Ok(order.into_iter().map(|entry| clue_puzzle(entry, rng)).collect())
}

// ========================================
// Note ordering
// ========================================

/// Scrambled notes of a maqam; `solution` is the scale order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotesPuzzle {
    pub maqam_id: i64,
    pub name: String,
    pub notes: Vec<String>,
    pub solution: Vec<String>,
}

/// Notes of every jins in order, or `None` when the maqam has none
pub fn notes_puzzle<R: Rng + ?Sized>(entry: &CorpusEntry, rng: &mut R) -> Option<NotesPuzzle> {
    let solution: Vec<String> = entry
        .ajnas
        .iter()
        .flat_map(|jins| jins.notes.pattern())
        .filter(|note| !note.is_empty())
        .cloned()
        .collect();
    if solution.is_empty() {
        return None;
    }

    let mut notes = solution.clone();
    notes.shuffle(rng);

    Some(NotesPuzzle {
        maqam_id: entry.id,
        name: entry.name_en.clone(),
        notes,
        solution,
    })
}

/// Puzzle for one random maqam
pub fn order_notes_game<R: Rng + ?Sized>(
    entries: &[CorpusEntry],
    rng: &mut R,
) -> Result<NotesPuzzle> {
    let entry = entries.choose(rng).ok_or_else(no_maqamet)?;
    notes_puzzle(entry, rng).ok_or_else(|| Error::InvalidInput("no notes".to_string()))
}

/// One puzzle per maqam that has notes, in random order
pub fn order_notes_all<R: Rng + ?Sized>(
    entries: &[CorpusEntry],
    rng: &mut R,
) -> Result<Vec<NotesPuzzle>> {
    if entries.is_empty() {
        return Err(no_maqamet());
    }
    let mut order: Vec<&CorpusEntry> = entries.iter().collect();
    order.shuffle(rng);
    Ok(order
        .into_iter()
        .filter_map(|entry| notes_puzzle(entry, rng))
        .collect())
}

// ========================================
// Odd one out
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddOneOut {
    pub topic: GameTopic,
    pub choices: Vec<MaqamChoice>,
    pub odd_one_id: i64,
}

/// Three maqamet sharing a value for `topic` plus one that differs
///
/// Base maqamet are tried in random order until one has enough company.
/// Maqamet without a value for the topic are never picked.
pub fn odd_one_out<R: Rng + ?Sized>(
    entries: &[CorpusEntry],
    topic: GameTopic,
    rng: &mut R,
) -> Result<OddOneOut> {
    if entries.len() < ODD_ONE_OUT_CHOICES {
        return Err(Error::InvalidInput("not enough maqamet".to_string()));
    }

    let mut bases: Vec<&CorpusEntry> = entries.iter().collect();
    bases.shuffle(rng);

    for base in bases {
        let Some(shared) = topic.value_of(base) else {
            continue;
        };

        let group: Vec<&CorpusEntry> = entries
            .iter()
            .filter(|e| topic.value_of(e) == Some(shared))
            .collect();
        let others: Vec<&CorpusEntry> = entries
            .iter()
            .filter(|e| topic.value_of(e).is_some_and(|v| v != shared))
            .collect();
        if group.len() < ODD_ONE_OUT_CHOICES - 1 {
            continue;
        }
        let Some(odd) = others.choose(rng).copied() else {
            continue;
        };

        let mut picks: Vec<&CorpusEntry> = group
            .choose_multiple(rng, ODD_ONE_OUT_CHOICES - 1)
            .copied()
            .collect();
        picks.push(odd);
        picks.shuffle(rng);

        return Ok(OddOneOut {
            topic,
            choices: picks.into_iter().map(MaqamChoice::from).collect(),
            odd_one_id: odd.id,
        });
    }

    Err(Error::InvalidInput(format!(
        "no {} is shared by {} maqamet",
        topic.as_str(),
        ODD_ONE_OUT_CHOICES - 1
    )))
}
