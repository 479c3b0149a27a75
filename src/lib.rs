//! Live multi-participant quiz sessions
//!
//! Participants join a quiz session, submit answers that are scored against
//! cached quiz content, and receive a ranked leaderboard every time the
//! session changes.
//!
//! # Layers
//!
//! - [`model`]: quizzes, participants, leaderboards
//! - [`session`]: per-quiz live state and snapshot fan-out
//! - [`registry`]: quiz ID to session map with drain-and-remove
//! - [`cache`]: read-through quiz cache with TTL jitter and coalesced loads
//! - [`service`]: join, submit-answer, subscribe and leave
//! - [`server`]: line-delimited JSON over TCP
//!
//! # Example
//!
//! ```no_run
//! use quiz_rs::cache::StaticQuizLoader;
//! use quiz_rs::model::{Question, Quiz};
//! use quiz_rs::{QuizServer, ServerConfig};
//!
//! # async fn run() -> quiz_rs::Result<()> {
//! let loader = StaticQuizLoader::new([Quiz::new("demo").question(
//!     Question::new("q1", "2 + 2?", 10)
//!         .option("a", "3", false)
//!         .option("b", "4", true),
//! )]);
//!
//! let server = QuizServer::new(ServerConfig::default(), loader);
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod model;
pub mod registry;
pub mod server;
pub mod service;
pub mod session;
pub mod stats;

pub use cache::{CacheConfig, QuizCache, QuizLoader, QuizSource};
pub use error::{Error, FrameError, QuizError, Result};
pub use registry::{RegistryConfig, SessionRegistry, SessionStore};
pub use server::{QuizServer, ServerConfig};
pub use service::QuizService;
