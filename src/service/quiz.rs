//! Quiz use cases
//!
//! [`QuizService`] composes the session store, the quiz content source and
//! the scoring function into join, submit-answer, subscribe and leave.

use crate::cache::QuizSource;
use crate::error::QuizError;
use crate::model::{AnswerResult, AnswerSubmission, Leaderboard};
use crate::registry::SessionStore;
use crate::session::{LeaderboardReceiver, Subscription};

use super::scoring::score_submission;

/// Outcome of a submitted answer
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    /// Leaderboard after the answer was applied
    pub leaderboard: Leaderboard,
    /// The participant's new total
    pub total: u64,
    /// Points earned by this answer
    pub awarded: u32,
    /// Whether the answer was correct
    pub correct: bool,
}

impl AnswerOutcome {
    /// Result message for the participant who answered
    pub fn result(&self, question_id: &str) -> AnswerResult {
        AnswerResult {
            question_id: question_id.to_string(),
            correct: self.correct,
            awarded: self.awarded,
            total_score: self.total,
        }
    }
}

/// Core quiz use cases
pub struct QuizService<S, Q> {
    sessions: S,
    quizzes: Q,
}

impl<S: SessionStore, Q: QuizSource> QuizService<S, Q> {
    pub fn new(sessions: S, quizzes: Q) -> Self {
        Self { sessions, quizzes }
    }

    /// Session store
    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Quiz content source
    pub fn quizzes(&self) -> &Q {
        &self.quizzes
    }

    /// Register or refresh a participant
    ///
    /// The quiz is loaded first, so an unknown quiz never creates a session.
    pub async fn join(
        &self,
        quiz_id: &str,
        user_id: &str,
        display_name: &str,
    ) -> Result<Leaderboard, QuizError> {
        self.quizzes.get_quiz(quiz_id).await?;

        loop {
            let session = self.sessions.get_or_create(quiz_id).await;
            if let Some(leaderboard) = session.try_join(user_id, display_name).await {
                return Ok(leaderboard);
            }
            // Drained and removed between lookup and join
            tracing::debug!(quiz = quiz_id, user = user_id, "Session retired during join, retrying");
        }
    }

    /// Score an answer and apply it to the participant
    pub async fn submit_answer(
        &self,
        quiz_id: &str,
        user_id: &str,
        submission: &AnswerSubmission,
    ) -> Result<AnswerOutcome, QuizError> {
        let session = self
            .sessions
            .get(quiz_id)
            .await
            .ok_or_else(|| QuizError::SessionNotFound(quiz_id.to_string()))?;

        let quiz = self.quizzes.get_quiz(quiz_id).await?;
        let score = score_submission(&quiz, submission)?;

        let (leaderboard, total) = session
            .apply_score(user_id, score.correct, score.points)
            .await?;

        Ok(AnswerOutcome {
            leaderboard,
            total,
            awarded: score.awarded(),
            correct: score.correct,
        })
    }

    /// Subscribe to leaderboard updates for a live session
    ///
    /// The caller must cancel the returned subscription when done.
    pub async fn subscribe(
        &self,
        quiz_id: &str,
    ) -> Result<(LeaderboardReceiver, Subscription), QuizError> {
        let session = self
            .sessions
            .get(quiz_id)
            .await
            .ok_or_else(|| QuizError::SessionNotFound(quiz_id.to_string()))?;

        Ok(session.subscribe().await)
    }

    /// Remove a participant, dropping the session if it becomes empty
    pub async fn leave(&self, quiz_id: &str, user_id: &str) {
        let Some(session) = self.sessions.get(quiz_id).await else {
            return;
        };

        session.leave(user_id).await;
        if session.is_empty().await {
            self.sessions.delete_if_empty(quiz_id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::cache::{CacheConfig, QuizCache, StaticQuizLoader};
    use crate::model::{Question, Quiz};
    use crate::registry::SessionRegistry;

    type TestService = QuizService<Arc<SessionRegistry>, QuizCache<StaticQuizLoader>>;

    fn service() -> TestService {
        let loader = StaticQuizLoader::new([Quiz::new("quiz-1").question(
            Question::new("q1", "Select the right option", 1)
                .option("o1", "Wrong", false)
                .option("o2", "Right", true),
        )]);
        let cache = QuizCache::with_config(loader, CacheConfig::default().ttl(Duration::from_secs(300)));
        QuizService::new(Arc::new(SessionRegistry::new()), cache)
    }

    fn answer(question: &str, option: &str) -> AnswerSubmission {
        AnswerSubmission::new(question, option)
    }

    #[tokio::test]
    async fn test_join_and_scoring() {
        let service = service();
        service.join("quiz-1", "u1", "Alice").await.unwrap();
        service.join("quiz-1", "u2", "Bob").await.unwrap();

        let outcome = service
            .submit_answer("quiz-1", "u2", &answer("q1", "o2"))
            .await
            .unwrap();

        assert!(outcome.correct);
        assert_eq!(outcome.awarded, 1);
        assert_eq!(outcome.total, 1);
        let lb = &outcome.leaderboard;
        assert_eq!(lb.entries.len(), 2);
        assert_eq!((lb.entries[0].user_id.as_str(), lb.entries[0].score), ("u2", 1));
        assert_eq!((lb.entries[1].user_id.as_str(), lb.entries[1].score), ("u1", 0));
    }

    #[tokio::test]
    async fn test_wrong_answer() {
        let service = service();
        service.join("quiz-1", "u1", "Alice").await.unwrap();

        let outcome = service
            .submit_answer("quiz-1", "u1", &answer("q1", "o1"))
            .await
            .unwrap();

        assert!(!outcome.correct);
        assert_eq!(outcome.awarded, 0);
        assert_eq!(outcome.total, 0);
        assert_eq!(
            outcome.result("q1"),
            AnswerResult {
                question_id: "q1".into(),
                correct: false,
                awarded: 0,
                total_score: 0
            }
        );
    }

    #[tokio::test]
    async fn test_join_unknown_quiz_creates_nothing() {
        let service = service();

        let err = service.join("nope", "u1", "Alice").await.unwrap_err();

        assert!(matches!(err, QuizError::QuizNotFound(_)));
        assert!(service.sessions().get("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_submit_requires_session() {
        let service = service();

        let err = service
            .submit_answer("quiz-unknown", "u1", &answer("q1", "o1"))
            .await
            .unwrap_err();

        assert!(matches!(err, QuizError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_submit_requires_participant() {
        let service = service();
        service.join("quiz-1", "u1", "Alice").await.unwrap();

        let err = service
            .submit_answer("quiz-1", "u2", &answer("q1", "o2"))
            .await
            .unwrap_err();

        assert!(matches!(err, QuizError::ParticipantNotFound(_)));
    }

    #[tokio::test]
    async fn test_submit_invalid_ids() {
        let service = service();
        service.join("quiz-1", "u1", "Alice").await.unwrap();

        let err = service
            .submit_answer("quiz-1", "u1", &answer("q9", "o2"))
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::QuestionNotFound(_)));

        let err = service
            .submit_answer("quiz-1", "u1", &answer("q1", "o9"))
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::OptionNotFound(_)));
    }

    #[tokio::test]
    async fn test_subscribe_receives_updates() {
        let service = service();
        service.join("quiz-1", "u1", "Alice").await.unwrap();
        let (mut rx, sub) = service.subscribe("quiz-1").await.unwrap();

        rx.recv().await.unwrap(); // initial snapshot

        service
            .submit_answer("quiz-1", "u1", &answer("q1", "o2"))
            .await
            .unwrap();

        let update = rx.recv().await.unwrap();
        assert_eq!(update.entries.len(), 1);
        assert_eq!(update.entries[0].score, 1);
        sub.cancel().await;
    }

    #[tokio::test]
    async fn test_subscribe_requires_session() {
        let service = service();

        assert!(matches!(
            service.subscribe("quiz-1").await,
            Err(QuizError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_leave_drops_empty_session() {
        let service = service();
        service.join("quiz-1", "u1", "Alice").await.unwrap();
        service.join("quiz-1", "u2", "Bob").await.unwrap();

        service.leave("quiz-1", "u1").await;
        assert!(service.sessions().get("quiz-1").await.is_some());

        service.leave("quiz-1", "u2").await;
        assert!(service.sessions().get("quiz-1").await.is_none());

        // Unknown session is a no-op
        service.leave("quiz-1", "u2").await;
    }

    #[tokio::test]
    async fn test_scores_reset_after_drain() {
        let service = service();
        service.join("quiz-1", "u1", "Alice").await.unwrap();
        service
            .submit_answer("quiz-1", "u1", &answer("q1", "o2"))
            .await
            .unwrap();
        service.leave("quiz-1", "u1").await;

        let lb = service.join("quiz-1", "u1", "Alice").await.unwrap();
        assert_eq!(lb.entries[0].score, 0);
    }

    #[tokio::test]
    async fn test_join_retries_on_retired_session() {
        let service = service();
        let stale = service.sessions().get_or_create("quiz-1").await;
        service.sessions().delete_if_empty("quiz-1").await;

        let lb = service.join("quiz-1", "u1", "Alice").await.unwrap();

        assert_eq!(lb.entries.len(), 1);
        assert!(stale.is_empty().await);
        let live = service.sessions().get("quiz-1").await.unwrap();
        assert!(!Arc::ptr_eq(&stale, &live));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_join_leave_never_loses_joins() {
        let service = Arc::new(service());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let churn = format!("churn-{}", i);
                    service.join("quiz-1", &churn, "Churn").await.unwrap();
                    service.leave("quiz-1", &churn).await;

                    let keeper = format!("keeper-{}", i);
                    service.join("quiz-1", &keeper, "Keeper").await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let session = service.sessions().get("quiz-1").await.unwrap();
        let lb = session.snapshot().await;
        assert_eq!(lb.entries.len(), 32);
        assert!(lb.entries.iter().all(|e| e.user_id.starts_with("keeper-")));
    }
}
