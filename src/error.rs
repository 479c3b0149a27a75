//! Error types
//!
//! `QuizError` is the domain taxonomy surfaced by the quiz service. `Error`
//! wraps it together with the transport-level failures that end a connection.

use std::fmt;
use std::sync::Arc;

/// Errors produced by the quiz core
///
/// Cloneable so a single coalesced cache load can hand the same failure to
/// every waiting caller.
#[derive(Debug, Clone)]
pub enum QuizError {
    /// No live session exists for the quiz
    SessionNotFound(String),
    /// The user has not joined the session
    ParticipantNotFound(String),
    /// The backing store has no content for the quiz
    QuizNotFound(String),
    /// The submitted question ID does not exist in the quiz
    QuestionNotFound(String),
    /// The submitted option ID does not exist in the question
    OptionNotFound(String),
    /// Passthrough failure from a backing store
    Backend {
        /// Where the failure came from (e.g. "load quiz")
        context: String,
        /// Underlying error
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl QuizError {
    /// Wrap a backing-store failure with a short source annotation
    pub fn backend<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        QuizError::Backend {
            context: context.into(),
            source: Arc::new(source),
        }
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            QuizError::SessionNotFound(_) => "session_not_found",
            QuizError::ParticipantNotFound(_) => "participant_not_found",
            QuizError::QuizNotFound(_) => "quiz_not_found",
            QuizError::QuestionNotFound(_) => "question_not_found",
            QuizError::OptionNotFound(_) => "option_not_found",
            QuizError::Backend { .. } => "backend",
        }
    }
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizError::SessionNotFound(id) => write!(f, "quiz session not found: {}", id),
            QuizError::ParticipantNotFound(id) => {
                write!(f, "participant not found in quiz: {}", id)
            }
            QuizError::QuizNotFound(id) => write!(f, "quiz not found: {}", id),
            QuizError::QuestionNotFound(id) => write!(f, "question not found: {}", id),
            QuizError::OptionNotFound(id) => write!(f, "option not found: {}", id),
            QuizError::Backend { context, source } => write!(f, "{}: {}", context, source),
        }
    }
}

impl std::error::Error for QuizError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QuizError::Backend { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Line framing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Frame exceeded the configured maximum length
    TooLarge { len: usize, max: usize },
    /// Frame was not valid UTF-8
    InvalidUtf8,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::TooLarge { len, max } => {
                write!(f, "frame of {} bytes exceeds limit of {}", len, max)
            }
            FrameError::InvalidUtf8 => write!(f, "frame is not valid UTF-8"),
        }
    }
}

impl std::error::Error for FrameError {}

/// Crate-level error
#[derive(Debug)]
pub enum Error {
    /// Socket I/O failure
    Io(std::io::Error),
    /// Domain failure
    Quiz(QuizError),
    /// Malformed wire frame
    Frame(FrameError),
    /// JSON encoding failure
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Quiz(e) => write!(f, "{}", e),
            Error::Frame(e) => write!(f, "framing error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Quiz(e) => Some(e),
            Error::Frame(e) => Some(e),
            Error::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<QuizError> for Error {
    fn from(e: QuizError) -> Self {
        Error::Quiz(e)
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Error::Frame(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

/// Result alias for transport-level operations
pub type Result<T> = std::result::Result<T, Error>;
