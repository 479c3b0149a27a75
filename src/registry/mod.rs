//! Session registry
//!
//! The registry maps quiz IDs to live sessions. Sessions are created on the
//! first join and removed the moment they become empty; a later join starts
//! a fresh score table.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<SessionRegistry>
//!                   ┌──────────────────────────┐
//!                   │ sessions: HashMap<QuizId,│
//!                   │   Arc<Session> {         │
//!                   │     participants,        │
//!                   │     subscribers,         │
//!                   │   }                      │
//!                   │ >                        │
//!                   └────────────┬─────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!        ▼                       ▼                       ▼
//!   [Connection]            [Connection]            [Connection]
//!   join/answer/leave       rx.recv()               rx.recv()
//!        │                       │                       │
//!        └──► session.apply_score()──► broadcast ──► TCP
//! ```
//!
//! # Removal
//!
//! `delete_if_empty` holds the registry write lock while checking emptiness
//! under the session lock, and marks a removed session retired. A task that
//! fetched the session just before removal cannot join it afterwards; it
//! retries against a fresh session instead.

pub mod config;
pub mod mirror;
pub mod store;

pub use config::RegistryConfig;
pub use mirror::{liveness_key, LivenessMarker, MirroredSessionStore};
pub use store::{SessionRegistry, SessionStore};
