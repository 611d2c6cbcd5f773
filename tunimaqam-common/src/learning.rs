//! Learning content built from the corpus: study plan, question bank, quizzes
//!
//! Practice games live in [`crate::games`].
//!
//! Quizzes live in an injected [`QuizStore`] keyed by UUID rather than in
//! process-wide state, so every service instance (and every test) owns its own.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::corpus::CorpusEntry;
use crate::{Error, Result};

/// Questions kept per quiz
pub const QUIZ_LENGTH: usize = 20;

/// Distractors offered next to the correct MCQ choice
pub const MCQ_DISTRACTORS: usize = 3;

/// Quizzes kept in memory before the oldest is evicted
pub const MAX_STORED_QUIZZES: usize = 1000;

/// Activities a study plan points at; each one has a learning endpoint
pub const SUGGESTED_ACTIVITIES: [&str; 8] = [
    "flashcards_emotion",
    "flashcards_region",
    "quiz",
    "mcq",
    "matching",
    "clue_game",
    "order_notes",
    "odd_one_out",
];

pub const DIFFICULTY_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];

/// Position of a difficulty label in the study order; unknown labels go last
pub fn difficulty_rank(label: Option<&str>) -> usize {
    label
        .and_then(|l| DIFFICULTY_LEVELS.iter().position(|level| *level == l))
        .unwrap_or(DIFFICULTY_LEVELS.len() - 1)
}

// ========================================
// Study plan
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanItem {
    pub maqam_id: i64,
    pub name_en: String,
    pub difficulty_label: Option<String>,
    pub suggested_activities: Vec<&'static str>,
}

/// Entries ordered beginner → advanced
///
/// When `level` is a known label and some entries carry it, only those are kept.
pub fn learning_plan(entries: &[CorpusEntry], level: &str) -> Vec<PlanItem> {
    let mut ordered: Vec<&CorpusEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| difficulty_rank(e.difficulty_label.as_deref()));

    if DIFFICULTY_LEVELS.contains(&level) {
        let filtered: Vec<&CorpusEntry> = ordered
            .iter()
            .copied()
            .filter(|e| e.difficulty_label.as_deref() == Some(level))
            .collect();
        if !filtered.is_empty() {
            ordered = filtered;
        }
    }

    ordered
        .into_iter()
        .map(|e| PlanItem {
            maqam_id: e.id,
            name_en: e.name_en.clone(),
            difficulty_label: e.difficulty_label.clone(),
            suggested_activities: SUGGESTED_ACTIVITIES.to_vec(),
        })
        .collect()
}

// ========================================
// Flashcards
// ========================================

/// Flashcard subject; unknown topics are rejected by `FromStr`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashcardTopic {
    #[default]
    Emotion,
    Region,
    Usage,
    Ajnas,
}

impl FlashcardTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashcardTopic::Emotion => "emotion",
            FlashcardTopic::Region => "region",
            FlashcardTopic::Usage => "usage",
            FlashcardTopic::Ajnas => "ajnas",
        }
    }
}

impl FromStr for FlashcardTopic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "emotion" => Ok(FlashcardTopic::Emotion),
            "region" => Ok(FlashcardTopic::Region),
            "usage" => Ok(FlashcardTopic::Usage),
            "ajnas" => Ok(FlashcardTopic::Ajnas),
            _ => Err(Error::InvalidInput("invalid topic".to_string())),
        }
    }
}

/// One flashcard; `back` holds what the learner should recall
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Flashcard {
    Emotion {
        name_en: String,
        name_ar: String,
        emotion_en: Option<String>,
        emotion_ar: Option<String>,
        regions_en: Vec<String>,
        regions_ar: Vec<String>,
        back: Vec<String>,
        level: Option<String>,
    },
    Region {
        name_en: String,
        name_ar: String,
        emotion_en: Option<String>,
        emotion_ar: Option<String>,
        usage_en: Option<String>,
        usage_ar: Option<String>,
        regions_en: Vec<String>,
        regions_ar: Vec<String>,
        back: Vec<String>,
        level: Option<String>,
    },
    Usage {
        name_en: String,
        name_ar: String,
        emotion_en: Option<String>,
        emotion_ar: Option<String>,
        usage_en: String,
        usage_ar_list: Vec<String>,
        regions_en: Vec<String>,
        regions_ar: Vec<String>,
        back: Vec<String>,
        level: Option<String>,
    },
    Ajnas {
        name_en: String,
        name_ar: String,
        first_jins_en: String,
        first_jins_ar: String,
        second_jins_en: String,
        second_jins_ar: String,
        back: String,
        level: Option<String>,
    },
}

/// One card per corpus entry for `topic`
pub fn flashcards(entries: &[CorpusEntry], topic: FlashcardTopic) -> Vec<Flashcard> {
    entries.iter().map(|e| flashcard(e, topic)).collect()
}

fn flashcard(entry: &CorpusEntry, topic: FlashcardTopic) -> Flashcard {
    let name_en = entry.name_en.clone();
    let name_ar = entry.name_ar.clone();
    let level = entry.difficulty_label.clone();

    match topic {
        FlashcardTopic::Emotion => Flashcard::Emotion {
            name_en,
            name_ar,
            emotion_en: entry.emotion.clone(),
            emotion_ar: entry.emotion_ar.clone(),
            regions_en: entry.regions.clone(),
            regions_ar: entry.regions_ar.clone(),
            back: entry.emotion.iter().filter(|e| !e.is_empty()).cloned().collect(),
            level,
        },
        FlashcardTopic::Region => Flashcard::Region {
            name_en,
            name_ar,
            emotion_en: entry.emotion.clone(),
            emotion_ar: entry.emotion_ar.clone(),
            usage_en: entry.usage.clone(),
            usage_ar: entry.usage_ar.clone(),
            regions_en: entry.regions.clone(),
            regions_ar: entry.regions_ar.clone(),
            back: entry.regions.clone(),
            level,
        },
        FlashcardTopic::Usage => {
            let usages: Vec<String> = entry.usage_tags().into_iter().map(str::to_string).collect();
            Flashcard::Usage {
                name_en,
                name_ar,
                emotion_en: entry.emotion.clone(),
                emotion_ar: entry.emotion_ar.clone(),
                usage_en: usages.join(", "),
                usage_ar_list: entry
                    .usage_ar
                    .as_deref()
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(str::to_string)
                    .into_iter()
                    .collect(),
                regions_en: entry.regions.clone(),
                regions_ar: entry.regions_ar.clone(),
                back: usages,
                level,
            }
        }
        FlashcardTopic::Ajnas => {
            let jins_name = |idx: usize| {
                entry
                    .ajnas
                    .get(idx)
                    .map(|j| {
                        (
                            j.name.en.clone().unwrap_or_default(),
                            j.name.ar.clone().unwrap_or_default(),
                        )
                    })
                    .unwrap_or_default()
            };
            let (first_jins_en, first_jins_ar) = jins_name(0);
            let (second_jins_en, second_jins_ar) = jins_name(1);
            let back = if second_jins_en.is_empty() {
                first_jins_en.clone()
            } else {
                format!("{} / {}", first_jins_en, second_jins_en)
            };
            Flashcard::Ajnas {
                name_en,
                name_ar,
                first_jins_en,
                first_jins_ar,
                second_jins_en,
                second_jins_ar,
                back,
                level,
            }
        }
    }
}

// ========================================
// Question bank
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Open,
    Mcq,
}

/// Maqam facts shown with a graded answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub maqam_en: String,
    pub emotion_en: Option<String>,
    pub regions: Vec<String>,
    pub usage: Option<String>,
}

impl From<&CorpusEntry> for Explanation {
    fn from(entry: &CorpusEntry) -> Self {
        Self {
            maqam_en: entry.name_en.clone(),
            emotion_en: entry.emotion.clone(),
            regions: entry.regions.clone(),
            usage: entry.usage.clone(),
        }
    }
}

/// One quiz question; the answer and explanation stay server-side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(skip_serializing)]
    pub answer: String,
    #[serde(skip_serializing)]
    pub explanation: Explanation,
    pub maqam_id: i64,
    pub index: usize,
}

/// Correct answer plus up to `k` distinct distractors from `pool`, shuffled
pub fn build_mcq_choices<R: Rng + ?Sized>(
    correct: &str,
    pool: &[&str],
    k: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut candidates: Vec<&str> = Vec::new();
    for item in pool {
        if !item.is_empty() && *item != correct && !candidates.contains(item) {
            candidates.push(*item);
        }
    }

    let mut choices: Vec<String> = vec![correct.to_string()];
    choices.extend(
        candidates
            .choose_multiple(rng, k.min(candidates.len()))
            .map(|s| s.to_string()),
    );
    choices.shuffle(rng);
    choices
}

/// Mixed question bank over the whole corpus, shuffled
///
/// Per maqam: an open question on its emotion, and MCQs on its first region,
/// first usage tag and first jins name.
pub fn make_question_bank<R: Rng + ?Sized>(entries: &[CorpusEntry], rng: &mut R) -> Vec<Question> {
    let region_pool: Vec<&str> = entries
        .iter()
        .flat_map(|e| e.regions.iter().map(String::as_str))
        .collect();
    let usage_pool: Vec<&str> = entries.iter().flat_map(|e| e.usage_tags()).collect();
    let jins_pool: Vec<&str> = entries.iter().flat_map(jins_names).collect();

    let mut questions = Vec::new();
    for entry in entries {
        let question = |kind, prompt: String, choices, answer: &str| Question {
            kind,
            prompt,
            choices,
            answer: answer.to_string(),
            explanation: Explanation::from(entry),
            maqam_id: entry.id,
            index: 0,
        };

        if let Some(emotion) = entry.emotion.as_deref().filter(|e| !e.is_empty()) {
            questions.push(question(
                QuestionKind::Open,
                format!("What is the main emotion of {}?", entry.name_en),
                None,
                emotion,
            ));
        }

        if let Some(region) = entry.regions.first() {
            let choices = build_mcq_choices(region, &region_pool, MCQ_DISTRACTORS, rng);
            questions.push(question(
                QuestionKind::Mcq,
                format!("In which region is {} mainly used?", entry.name_en),
                Some(choices),
                region.as_str(),
            ));
        }

        if let Some(usage) = entry.usage_tags().first() {
            let choices = build_mcq_choices(usage, &usage_pool, MCQ_DISTRACTORS, rng);
            questions.push(question(
                QuestionKind::Mcq,
                format!("Select a typical usage of {}.", entry.name_en),
                Some(choices),
                *usage,
            ));
        }

        if let Some(jins) = jins_names(entry).first() {
            let choices = build_mcq_choices(jins, &jins_pool, MCQ_DISTRACTORS, rng);
            questions.push(question(
                QuestionKind::Mcq,
                format!("Which jins (ajnas) is part of {}?", entry.name_en),
                Some(choices),
                *jins,
            ));
        }
    }

    questions.shuffle(rng);
    questions
}

/// Display names of a maqam's ajnas, English first
pub(crate) fn jins_names(entry: &CorpusEntry) -> Vec<&str> {
    entry.ajnas.iter().filter_map(|j| j.name.preferred()).collect()
}

// ========================================
// Quizzes
// ========================================

#[derive(Debug, Clone)]
pub struct Quiz {
    pub id: Uuid,
    pub lang: String,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerDetail {
    pub question: String,
    pub question_type: QuestionKind,
    pub choices: Option<Vec<String>>,
    pub user_answer: Value,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: Explanation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizResult {
    pub quiz_id: Uuid,
    pub score: f64,
    pub correct: usize,
    pub total: usize,
    pub details: Vec<AnswerDetail>,
}

impl Quiz {
    /// Keep the first [`QUIZ_LENGTH`] questions of `bank` and number them
    pub fn new(lang: impl Into<String>, mut bank: Vec<Question>) -> Self {
        bank.truncate(QUIZ_LENGTH);
        for (idx, question) in bank.iter_mut().enumerate() {
            question.index = idx;
        }

        Self {
            id: Uuid::new_v4(),
            lang: lang.into(),
            questions: bank,
            created_at: Utc::now(),
        }
    }

    /// Grade answers given in question order; missing answers count as wrong
    ///
    /// Open answers compare trimmed and case-insensitive, MCQ answers exactly.
    pub fn grade(&self, answers: &[Value]) -> QuizResult {
        let details: Vec<AnswerDetail> = self
            .questions
            .iter()
            .enumerate()
            .map(|(idx, q)| {
                let user_answer = answers.get(idx).cloned().unwrap_or(Value::Null);
                let is_correct = match q.kind {
                    QuestionKind::Open => {
                        answer_text(&user_answer).trim().to_lowercase()
                            == q.answer.trim().to_lowercase()
                    }
                    QuestionKind::Mcq => user_answer.as_str() == Some(q.answer.as_str()),
                };
                AnswerDetail {
                    question: q.prompt.clone(),
                    question_type: q.kind,
                    choices: q.choices.clone(),
                    user_answer,
                    correct_answer: q.answer.clone(),
                    is_correct,
                    explanation: q.explanation.clone(),
                }
            })
            .collect();

        let total = details.len();
        let correct = details.iter().filter(|d| d.is_correct).count();
        let score = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        };

        QuizResult {
            quiz_id: self.id,
            score,
            correct,
            total,
            details,
        }
    }
}

/// Text of a free-form answer; falsy values read as empty
fn answer_text(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        other => other.to_string(),
    }
}

/// In-memory quiz storage shared by request handlers
#[derive(Debug, Clone, Default)]
pub struct QuizStore {
    quizzes: Arc<RwLock<HashMap<Uuid, Quiz>>>,
}

impl QuizStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a quiz, evicting the oldest one when full
    pub async fn insert(&self, quiz: Quiz) -> Uuid {
        let id = quiz.id;
        let mut quizzes = self.quizzes.write().await;
        if quizzes.len() >= MAX_STORED_QUIZZES {
            if let Some(oldest) = quizzes
                .values()
                .min_by_key(|q| q.created_at)
                .map(|q| q.id)
            {
                quizzes.remove(&oldest);
            }
        }
        quizzes.insert(id, quiz);
        id
    }

    pub async fn get(&self, id: &Uuid) -> Option<Quiz> {
        self.quizzes.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.quizzes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.quizzes.read().await.is_empty()
    }
}
