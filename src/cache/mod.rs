//! Quiz content cache
//!
//! Sits in front of a slow [`QuizLoader`] and keeps quiz content in memory
//! with a jittered TTL.
//!
//! ```text
//!   get_quiz(id) ──► fresh entry? ──yes──► Arc<Quiz>
//!                        │ no
//!                        ▼
//!              single-flight group[id] ──► loader.load_quiz(id)   (one call)
//!                  ▲     ▲                       │
//!       waiters ───┘     └── same result ◄───────┘
//! ```
//!
//! Expiry is `now + ttl + U[0, ttl/10]`; a zero TTL keeps entries forever.
//! Failed loads are never cached and leave any existing entry in place.

pub mod config;
pub mod flight;
pub mod loader;
pub mod store;

pub use config::CacheConfig;
pub use flight::Group;
pub use loader::{QuizLoader, StaticQuizLoader};
pub use store::{ttl_with_jitter, QuizCache, QuizSource};
