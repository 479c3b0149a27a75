//! Per-subscriber leaderboard queue
//!
//! Each subscriber gets a fixed-capacity ring buffer. The session is the only
//! writer and pushes without ever waiting: when the buffer is full the oldest
//! queued snapshot is evicted to make room. The subscriber is the only reader
//! and always ends up observing the most recent snapshot.
//!
//! ```text
//!   Session (write lock held)          LeaderboardReceiver
//!   ┌──────────────────────┐           ┌──────────────────┐
//!   │ push(lb) ──► [ring buffer, cap N] ──► recv().await   │
//!   │   full? evict oldest │           │                  │
//!   └──────────────────────┘           └──────────────────┘
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;

use crate::model::Leaderboard;

/// Default number of snapshot slots per subscriber
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 8;

struct Queue {
    buf: VecDeque<Leaderboard>,
    capacity: usize,
    closed: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    notify: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        // Critical sections never panic mid-update, so a poisoned queue is still consistent
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Create a subscriber queue with the given capacity (minimum 1)
pub(crate) fn channel(capacity: usize) -> (SnapshotSender, LeaderboardReceiver) {
    let capacity = capacity.max(1);
    let shared = Arc::new(Shared {
        queue: Mutex::new(Queue {
            buf: VecDeque::with_capacity(capacity),
            capacity,
            closed: false,
        }),
        notify: Notify::new(),
    });

    (
        SnapshotSender {
            shared: Arc::clone(&shared),
        },
        LeaderboardReceiver { shared },
    )
}

/// Write end, owned by the session
///
/// Dropping the sender closes the queue.
pub(crate) struct SnapshotSender {
    shared: Arc<Shared>,
}

impl SnapshotSender {
    /// Push a snapshot without blocking
    ///
    /// Returns true if an older snapshot was evicted to make room.
    pub(crate) fn push(&self, snapshot: Leaderboard) -> bool {
        let evicted = {
            let mut queue = self.shared.lock();
            let evicted = if queue.buf.len() >= queue.capacity {
                queue.buf.pop_front().is_some()
            } else {
                false
            };
            queue.buf.push_back(snapshot);
            evicted
        };

        self.shared.notify.notify_one();
        evicted
    }
}

impl Drop for SnapshotSender {
    fn drop(&mut self) {
        self.shared.lock().closed = true;
        self.shared.notify.notify_one();
    }
}

/// Error returned by [`LeaderboardReceiver::try_recv`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// Nothing queued right now
    Empty,
    /// The subscription was cancelled and the queue is drained
    Closed,
}

/// Read end of a leaderboard subscription
///
/// Yields queued snapshots in broadcast order. Returns `None` once the
/// subscription has been cancelled (or the session dropped) and every queued
/// snapshot has been read.
pub struct LeaderboardReceiver {
    shared: Arc<Shared>,
}

impl LeaderboardReceiver {
    /// Wait for the next snapshot
    ///
    /// Cancel safe: a snapshot is only removed from the queue when it is returned.
    pub async fn recv(&mut self) -> Option<Leaderboard> {
        let shared = Arc::clone(&self.shared);
        loop {
            let notified = shared.notify.notified();

            match self.try_recv() {
                Ok(snapshot) => return Some(snapshot),
                Err(TryRecvError::Closed) => return None,
                Err(TryRecvError::Empty) => {}
            }

            notified.await;
        }
    }

    /// Take the next snapshot if one is queued
    pub fn try_recv(&mut self) -> Result<Leaderboard, TryRecvError> {
        let mut queue = self.shared.lock();
        match queue.buf.pop_front() {
            Some(snapshot) => Ok(snapshot),
            None if queue.closed => Err(TryRecvError::Closed),
            None => Err(TryRecvError::Empty),
        }
    }

    /// Number of snapshots waiting to be read
    pub fn len(&self) -> usize {
        self.shared.lock().buf.len()
    }

    /// Check if nothing is waiting to be read
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the write end has been closed
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl std::fmt::Debug for LeaderboardReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.shared.lock();
        f.debug_struct("LeaderboardReceiver")
            .field("queued", &queue.buf.len())
            .field("capacity", &queue.capacity)
            .field("closed", &queue.closed)
            .finish()
    }
}
