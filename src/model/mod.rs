//! Quiz domain types
//!
//! This module provides:
//! - Quiz content (quizzes, questions, answer options)
//! - Participant state and leaderboard projections
//! - Answer submissions and their results

pub mod leaderboard;
pub mod quiz;

pub use leaderboard::{AnswerResult, AnswerSubmission, Leaderboard, LeaderboardEntry, Participant};
pub use quiz::{AnswerOption, Question, Quiz};
