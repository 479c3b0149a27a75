//! Quiz content loaders
//!
//! A [`QuizLoader`] fetches quiz content from the backing store. The cache
//! wraps any implementation; [`StaticQuizLoader`] serves a fixed set of
//! quizzes from memory.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::QuizError;
use crate::model::Quiz;

/// Backing store for quiz content
pub trait QuizLoader: Send + Sync {
    /// Load a quiz, failing with [`QuizError::QuizNotFound`] when it does not exist
    fn load_quiz(&self, quiz_id: &str) -> impl Future<Output = Result<Quiz, QuizError>> + Send;
}

impl<L: QuizLoader> QuizLoader for Arc<L> {
    fn load_quiz(&self, quiz_id: &str) -> impl Future<Output = Result<Quiz, QuizError>> + Send {
        (**self).load_quiz(quiz_id)
    }
}

/// Loader backed by an in-memory map
#[derive(Debug, Clone, Default)]
pub struct StaticQuizLoader {
    quizzes: HashMap<String, Quiz>,
}

impl StaticQuizLoader {
    pub fn new(quizzes: impl IntoIterator<Item = Quiz>) -> Self {
        Self {
            quizzes: quizzes.into_iter().map(|q| (q.id.clone(), q)).collect(),
        }
    }

    /// Add or replace a quiz
    pub fn insert(&mut self, quiz: Quiz) {
        self.quizzes.insert(quiz.id.clone(), quiz);
    }

    pub fn len(&self) -> usize {
        self.quizzes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quizzes.is_empty()
    }
}

impl QuizLoader for StaticQuizLoader {
    async fn load_quiz(&self, quiz_id: &str) -> Result<Quiz, QuizError> {
        self.quizzes
            .get(quiz_id)
            .cloned()
            .ok_or_else(|| QuizError::QuizNotFound(quiz_id.to_string()))
    }
}
