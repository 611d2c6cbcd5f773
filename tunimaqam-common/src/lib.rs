//! # TuniMaqam Common Library
//!
//! Shared code for the TuniMaqam service:
//! - Typed maqam corpus and defensive parsing of stored records
//! - Note normalization and first-jins pattern matching
//! - Context-driven recommendation scoring with heritage re-ranking
//! - Learning content (question bank, quiz grading, study plan) and practice games
//! - Role-gated token authorization primitives
//! - Database access and configuration loading

pub mod analysis;
pub mod auth;
pub mod config;
pub mod corpus;
pub mod db;
pub mod error;
pub mod games;
pub mod learning;
pub mod notes;
pub mod recommend;
pub mod scoring;

pub use corpus::{Bilingual, CorpusEntry, Jins, JinsNotes};
pub use error::{Error, Result};
pub use scoring::Evidence;
