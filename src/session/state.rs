//! Live quiz session
//!
//! A session owns one quiz's participant table and its subscriber queues.
//! Every mutation, the broadcast it triggers, and subscriber registration
//! run under the same write lock, so each subscriber sees snapshots in
//! mutation order and a new subscriber's initial snapshot is never torn.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::QuizError;
use crate::model::{Leaderboard, Participant};
use crate::registry::RegistryConfig;
use crate::stats::SessionStats;

use super::subscriber::{self, LeaderboardReceiver, SnapshotSender, DEFAULT_SUBSCRIBER_CAPACITY};

/// Source of timestamps for participant updates and snapshots
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Mutable session state, guarded by the session lock
struct SessionInner {
    participants: HashMap<String, Participant>,
    subscribers: HashMap<u64, SnapshotSender>,
    /// Set once the registry has dropped this session
    retired: bool,
}

/// In-memory state for one live quiz
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    clock: Clock,
    subscriber_capacity: usize,
    next_subscriber_id: AtomicU64,
    broadcasts: AtomicU64,
    dropped_snapshots: AtomicU64,
    inner: RwLock<SessionInner>,
}

impl Session {
    /// Create a session using the wall clock and default subscriber capacity
    pub fn new(id: impl Into<String>) -> Self {
        Self::build(id.into(), Arc::new(Utc::now), DEFAULT_SUBSCRIBER_CAPACITY)
    }

    /// Create a session with registry settings
    pub fn with_config(id: impl Into<String>, config: &RegistryConfig) -> Self {
        Self::build(id.into(), Arc::new(Utc::now), config.subscriber_capacity)
    }

    /// Create a session with a custom clock (deterministic timestamps in tests)
    pub fn with_clock(id: impl Into<String>, clock: Clock) -> Self {
        Self::build(id.into(), clock, DEFAULT_SUBSCRIBER_CAPACITY)
    }

    fn build(id: String, clock: Clock, subscriber_capacity: usize) -> Self {
        let created_at = clock();
        Self {
            id,
            created_at,
            clock,
            subscriber_capacity: subscriber_capacity.max(1),
            next_subscriber_id: AtomicU64::new(1),
            broadcasts: AtomicU64::new(0),
            dropped_snapshots: AtomicU64::new(0),
            inner: RwLock::new(SessionInner {
                participants: HashMap::new(),
                subscribers: HashMap::new(),
                retired: false,
            }),
        }
    }

    /// Quiz ID this session belongs to
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When the session was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Add a participant, or refresh the name and timestamp of an existing one
    ///
    /// Rejoining keeps the accumulated score.
    pub async fn join(&self, user_id: &str, display_name: &str) -> Leaderboard {
        let mut inner = self.inner.write().await;
        self.join_locked(&mut inner, user_id, display_name)
    }

    /// Like [`join`](Self::join), but refuses a session the registry has retired
    ///
    /// Returns `None` when retired; the caller should fetch a fresh session
    /// from the registry and retry.
    pub async fn try_join(&self, user_id: &str, display_name: &str) -> Option<Leaderboard> {
        let mut inner = self.inner.write().await;
        if inner.retired {
            return None;
        }
        Some(self.join_locked(&mut inner, user_id, display_name))
    }

    fn join_locked(&self, inner: &mut SessionInner, user_id: &str, display_name: &str) -> Leaderboard {
        let now = (self.clock)();

        match inner.participants.get_mut(user_id) {
            Some(participant) => {
                participant.display_name = display_name.to_string();
                participant.last_updated = now;
                tracing::debug!(quiz = %self.id, user = user_id, "Participant rejoined");
            }
            None => {
                inner
                    .participants
                    .insert(user_id.to_string(), Participant::new(user_id, display_name, now));
                tracing::debug!(
                    quiz = %self.id,
                    user = user_id,
                    participants = inner.participants.len(),
                    "Participant joined"
                );
            }
        }

        self.broadcast_locked(inner)
    }

    /// Apply the outcome of an answer
    ///
    /// A correct answer adds `points`, or 1 when `points` is 0. The
    /// participant's timestamp advances whether or not the answer was correct.
    /// Returns the new snapshot and the participant's total.
    pub async fn apply_score(
        &self,
        user_id: &str,
        correct: bool,
        points: u32,
    ) -> Result<(Leaderboard, u64), QuizError> {
        let mut inner = self.inner.write().await;
        let now = (self.clock)();

        let participant = inner
            .participants
            .get_mut(user_id)
            .ok_or_else(|| QuizError::ParticipantNotFound(user_id.to_string()))?;

        if correct {
            participant.score += u64::from(points.max(1));
        }
        participant.last_updated = now;
        let total = participant.score;

        tracing::debug!(quiz = %self.id, user = user_id, correct, total, "Score applied");

        Ok((self.broadcast_locked(&inner), total))
    }

    /// Remove a participant (no-op if absent) and broadcast
    pub async fn leave(&self, user_id: &str) -> Leaderboard {
        let mut inner = self.inner.write().await;

        if inner.participants.remove(user_id).is_some() {
            tracing::debug!(
                quiz = %self.id,
                user = user_id,
                participants = inner.participants.len(),
                "Participant left"
            );
        }

        self.broadcast_locked(&inner)
    }

    /// Check if the session has no participants
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.participants.is_empty()
    }

    /// Check if the registry has dropped this session
    pub async fn is_retired(&self) -> bool {
        self.inner.read().await.retired
    }

    /// Current leaderboard without broadcasting it
    pub async fn snapshot(&self) -> Leaderboard {
        let inner = self.inner.read().await;
        self.snapshot_locked(&inner)
    }

    /// Subscribe to leaderboard updates
    ///
    /// The receiver already holds one initial snapshot when this returns.
    /// Call [`Subscription::cancel`] to unregister and close the receiver.
    pub async fn subscribe(self: &Arc<Self>) -> (LeaderboardReceiver, Subscription) {
        let (tx, rx) = subscriber::channel(self.subscriber_capacity);
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);

        let mut inner = self.inner.write().await;
        tx.push(self.snapshot_locked(&inner));
        inner.subscribers.insert(id, tx);

        tracing::debug!(
            quiz = %self.id,
            subscriber = id,
            subscribers = inner.subscribers.len(),
            "Subscriber added"
        );

        let subscription = Subscription {
            session: Arc::downgrade(self),
            id,
        };
        (rx, subscription)
    }

    /// Drop a subscriber's write end, closing its queue
    async fn unsubscribe(&self, id: u64) {
        let mut inner = self.inner.write().await;
        if inner.subscribers.remove(&id).is_some() {
            tracing::debug!(
                quiz = %self.id,
                subscriber = id,
                subscribers = inner.subscribers.len(),
                "Subscriber removed"
            );
        }
    }

    /// Mark the session retired if it is empty
    ///
    /// Called by the registry while it holds its own map lock, so the
    /// emptiness check and the removal form one critical section.
    pub(crate) async fn retire_if_empty(&self) -> bool {
        let mut inner = self.inner.write().await;
        if inner.participants.is_empty() {
            inner.retired = true;
            true
        } else {
            false
        }
    }

    /// Get session statistics
    pub async fn stats(&self) -> SessionStats {
        let inner = self.inner.read().await;
        SessionStats {
            quiz_id: self.id.clone(),
            participants: inner.participants.len(),
            subscribers: inner.subscribers.len(),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            dropped_snapshots: self.dropped_snapshots.load(Ordering::Relaxed),
            created_at: self.created_at,
        }
    }

    fn snapshot_locked(&self, inner: &SessionInner) -> Leaderboard {
        Leaderboard::rank(&self.id, inner.participants.values(), (self.clock)())
    }

    /// Compute one snapshot and push it to every subscriber
    fn broadcast_locked(&self, inner: &SessionInner) -> Leaderboard {
        let snapshot = self.snapshot_locked(inner);

        let mut evicted = 0u64;
        for tx in inner.subscribers.values() {
            if tx.push(snapshot.clone()) {
                evicted += 1;
            }
        }

        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        if evicted > 0 {
            self.dropped_snapshots.fetch_add(evicted, Ordering::Relaxed);
            tracing::trace!(quiz = %self.id, evicted, "Slow subscribers skipped a snapshot");
        }

        snapshot
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Cancellation handle for a leaderboard subscription
///
/// The first [`cancel`](Self::cancel) unregisters the subscriber and closes
/// its receiver; later calls do nothing.
#[derive(Debug, Clone)]
pub struct Subscription {
    session: Weak<Session>,
    id: u64,
}

impl Subscription {
    /// Unregister and close the subscription
    pub async fn cancel(&self) {
        // A dropped session already dropped every write end
        if let Some(session) = self.session.upgrade() {
            session.unsubscribe(self.id).await;
        }
    }

    /// Subscriber ID within its session
    pub fn id(&self) -> u64 {
        self.id
    }
}
