//! Live quiz sessions
//!
//! A [`Session`] holds one quiz's participants and pushes a fresh
//! [`Leaderboard`](crate::model::Leaderboard) to every subscriber after each
//! mutation. Subscribers read through a [`LeaderboardReceiver`] backed by a
//! small ring buffer: a slow reader skips intermediate snapshots instead of
//! stalling the session.

pub mod state;
pub mod subscriber;

pub use state::{Clock, Session, Subscription};
pub use subscriber::{LeaderboardReceiver, TryRecvError, DEFAULT_SUBSCRIBER_CAPACITY};
