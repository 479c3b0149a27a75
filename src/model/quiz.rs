//! Quiz content types
//!
//! Content is immutable once loaded; the cache hands it out as `Arc<Quiz>`.

use serde::{Deserialize, Serialize};

/// A possible answer to a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

impl AnswerOption {
    pub fn new(id: impl Into<String>, text: impl Into<String>, correct: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            correct,
        }
    }
}

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    /// Points for a correct answer; 0 awards a single point
    #[serde(default)]
    pub points: u32,
}

impl Question {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, points: u32) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            options: Vec::new(),
            points,
        }
    }

    /// Append an option
    pub fn option(mut self, id: impl Into<String>, text: impl Into<String>, correct: bool) -> Self {
        self.options.push(AnswerOption::new(id, text, correct));
        self
    }

    /// Points actually awarded for a correct answer
    pub fn effective_points(&self) -> u32 {
        if self.points == 0 {
            1
        } else {
            self.points
        }
    }

    /// Find an option by ID (first match wins)
    pub fn find_option(&self, option_id: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// A quiz: an ordered collection of questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            questions: Vec::new(),
        }
    }

    /// Append a question
    pub fn question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    /// Find a question by ID (first match wins)
    pub fn find_question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}
