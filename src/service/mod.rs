//! Quiz service
//!
//! The orchestration layer between a transport and the core: every
//! connection-level action maps onto one [`QuizService`] call.

pub mod quiz;
pub mod scoring;

pub use quiz::{AnswerOutcome, QuizService};
pub use scoring::{score_submission, Score};
