//! Answer scoring
//!
//! Pure: looks the submission up in the quiz content and reports whether the
//! chosen option is correct and what a correct answer is worth.

use crate::error::QuizError;
use crate::model::{AnswerSubmission, Quiz};

/// Result of checking one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    /// The chosen option is flagged correct
    pub correct: bool,
    /// Points a correct answer to this question is worth (never 0)
    pub points: u32,
}

impl Score {
    /// Points actually earned by this submission
    pub fn awarded(&self) -> u32 {
        if self.correct {
            self.points
        } else {
            0
        }
    }
}

/// Check a submission against quiz content
///
/// Fails with `QuestionNotFound` or `OptionNotFound` when the submitted IDs
/// do not exist. Correctness comes from the option's flag only.
pub fn score_submission(quiz: &Quiz, submission: &AnswerSubmission) -> Result<Score, QuizError> {
    let question = quiz
        .find_question(&submission.question_id)
        .ok_or_else(|| QuizError::QuestionNotFound(submission.question_id.clone()))?;

    let option = question
        .find_option(&submission.option_id)
        .ok_or_else(|| QuizError::OptionNotFound(submission.option_id.clone()))?;

    Ok(Score {
        correct: option.correct,
        points: question.effective_points(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;

    fn quiz() -> Quiz {
        Quiz::new("quiz-1")
            .question(
                Question::new("q1", "What is 2 + 2?", 1)
                    .option("o1", "3", false)
                    .option("o2", "4", true),
            )
            .question(
                Question::new("q2", "Capital of France?", 0)
                    .option("a", "Paris", true)
                    .option("b", "Lyon", false),
            )
            .question(Question::new("q3", "Pick the last", 5).option("x", "no", false).option("y", "yes", true))
    }

    #[test]
    fn test_correct_answer() {
        let score = score_submission(&quiz(), &AnswerSubmission::new("q1", "o2")).unwrap();

        assert_eq!(score, Score { correct: true, points: 1 });
        assert_eq!(score.awarded(), 1);
    }

    #[test]
    fn test_wrong_answer_awards_nothing() {
        let score = score_submission(&quiz(), &AnswerSubmission::new("q3", "x")).unwrap();

        assert!(!score.correct);
        assert_eq!(score.points, 5);
        assert_eq!(score.awarded(), 0);
    }

    #[test]
    fn test_zero_points_worth_one() {
        let score = score_submission(&quiz(), &AnswerSubmission::new("q2", "a")).unwrap();

        assert_eq!(score.awarded(), 1);
    }

    #[test]
    fn test_correctness_not_positional() {
        // The correct option of q3 is the second one
        let score = score_submission(&quiz(), &AnswerSubmission::new("q3", "y")).unwrap();

        assert_eq!(score.awarded(), 5);
    }

    #[test]
    fn test_unknown_question() {
        let err = score_submission(&quiz(), &AnswerSubmission::new("q9", "o1")).unwrap_err();

        assert!(matches!(err, QuizError::QuestionNotFound(id) if id == "q9"));
    }

    #[test]
    fn test_unknown_option() {
        let err = score_submission(&quiz(), &AnswerSubmission::new("q1", "o9")).unwrap_err();

        assert!(matches!(err, QuizError::OptionNotFound(id) if id == "o9"));
    }

    #[test]
    fn test_option_ids_scoped_to_question() {
        // "a" belongs to q2, not q1
        let err = score_submission(&quiz(), &AnswerSubmission::new("q1", "a")).unwrap_err();

        assert!(matches!(err, QuizError::OptionNotFound(_)));
    }
}
