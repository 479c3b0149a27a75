//! Session registry implementation
//!
//! The central map from quiz ID to live [`Session`]. Sessions are created on
//! first join and dropped as soon as they are empty.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::session::Session;

use super::config::RegistryConfig;

/// Storage backend for live sessions
///
/// The in-memory [`SessionRegistry`] and the liveness-mirroring
/// [`MirroredSessionStore`](super::MirroredSessionStore) both implement this
/// and can be swapped without changing behavior.
pub trait SessionStore: Send + Sync {
    /// Return the existing session or create and register a new one
    fn get_or_create(&self, quiz_id: &str) -> impl Future<Output = Arc<Session>> + Send;

    /// Look up a session without creating it
    fn get(&self, quiz_id: &str) -> impl Future<Output = Option<Arc<Session>>> + Send;

    /// Remove the session if it has no participants
    ///
    /// Returns true if a session was removed.
    fn delete_if_empty(&self, quiz_id: &str) -> impl Future<Output = bool> + Send;
}

/// In-memory registry of live sessions
///
/// Lock order is always registry map first, then the session's own lock.
pub struct SessionRegistry {
    /// Map of quiz ID to session
    sessions: RwLock<HashMap<String, Arc<Session>>>,

    /// Configuration
    config: RegistryConfig,
}

impl SessionRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Return the session for a quiz, creating it if needed
    ///
    /// The flag is true when this call created the session.
    pub async fn get_or_insert(&self, quiz_id: &str) -> (Arc<Session>, bool) {
        if let Some(session) = self.sessions.read().await.get(quiz_id) {
            return (Arc::clone(session), false);
        }

        let mut sessions = self.sessions.write().await;

        // Another caller may have created it between the two locks
        if let Some(session) = sessions.get(quiz_id) {
            return (Arc::clone(session), false);
        }

        let session = Arc::new(Session::with_config(quiz_id, &self.config));
        sessions.insert(quiz_id.to_string(), Arc::clone(&session));

        tracing::info!(quiz = quiz_id, sessions = sessions.len(), "Session created");

        (session, true)
    }

    /// Look up a session
    pub async fn lookup(&self, quiz_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(quiz_id).cloned()
    }

    /// Remove a session if it is empty
    ///
    /// The emptiness check runs under the session lock while the registry
    /// write lock is held, and retires the session so a caller still holding
    /// it cannot join into an unreachable session.
    pub async fn remove_if_empty(&self, quiz_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;

        let Some(session) = sessions.get(quiz_id) else {
            return false;
        };

        if !session.retire_if_empty().await {
            return false;
        }

        sessions.remove(quiz_id);
        tracing::info!(quiz = quiz_id, sessions = sessions.len(), "Session removed");
        true
    }

    /// Get total number of sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// IDs of all live sessions
    pub async fn quiz_ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Run cleanup once
    ///
    /// Removes every session that is currently empty. Returns the removed IDs.
    pub async fn cleanup(&self) -> Vec<String> {
        let mut sessions = self.sessions.write().await;

        let mut removed = Vec::new();
        for (quiz_id, session) in sessions.iter() {
            if session.retire_if_empty().await {
                removed.push(quiz_id.clone());
            }
        }

        for quiz_id in &removed {
            sessions.remove(quiz_id);
            tracing::info!(quiz = %quiz_id, "Session removed by cleanup");
        }

        removed
    }

    /// Spawn background cleanup task
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        let interval = registry.config.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.cleanup().await;
            }
        })
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for SessionRegistry {
    async fn get_or_create(&self, quiz_id: &str) -> Arc<Session> {
        self.get_or_insert(quiz_id).await.0
    }

    async fn get(&self, quiz_id: &str) -> Option<Arc<Session>> {
        self.lookup(quiz_id).await
    }

    async fn delete_if_empty(&self, quiz_id: &str) -> bool {
        self.remove_if_empty(quiz_id).await
    }
}

impl<S: SessionStore> SessionStore for Arc<S> {
    fn get_or_create(&self, quiz_id: &str) -> impl Future<Output = Arc<Session>> + Send {
        (**self).get_or_create(quiz_id)
    }

    fn get(&self, quiz_id: &str) -> impl Future<Output = Option<Arc<Session>>> + Send {
        (**self).get(quiz_id)
    }

    fn delete_if_empty(&self, quiz_id: &str) -> impl Future<Output = bool> + Send {
        (**self).delete_if_empty(quiz_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lifecycle() {
        let registry = SessionRegistry::new();

        let session = registry.get_or_create("quiz-1").await;
        assert_eq!(session.id(), "quiz-1");
        assert!(registry.get("quiz-1").await.is_some());

        assert!(registry.delete_if_empty("quiz-1").await);
        assert!(registry.get("quiz-1").await.is_none());
    }

    #[tokio::test]
    async fn test_get_or_create_returns_same_session() {
        let registry = SessionRegistry::new();

        let (a, created_a) = registry.get_or_insert("quiz-1").await;
        let (b, created_b) = registry.get_or_insert("quiz-1").await;

        assert!(created_a);
        assert!(!created_b);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_get_never_creates() {
        let registry = SessionRegistry::new();

        assert!(registry.get("quiz-1").await.is_none());
        assert_eq!(registry.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_occupied_session_kept() {
        let registry = SessionRegistry::new();
        let session = registry.get_or_create("quiz-1").await;
        session.join("u1", "Alice").await;

        assert!(!registry.delete_if_empty("quiz-1").await);
        assert!(registry.get("quiz-1").await.is_some());
        assert!(!session.is_retired().await);
    }

    #[tokio::test]
    async fn test_deleted_session_is_retired() {
        let registry = SessionRegistry::new();
        let stale = registry.get_or_create("quiz-1").await;

        registry.delete_if_empty("quiz-1").await;

        // A caller still holding the old session cannot join it
        assert!(stale.try_join("u1", "Alice").await.is_none());

        let fresh = registry.get_or_create("quiz-1").await;
        assert!(!Arc::ptr_eq(&stale, &fresh));
        assert!(fresh.try_join("u1", "Alice").await.is_some());
    }

    #[tokio::test]
    async fn test_recreated_session_starts_fresh() {
        let registry = SessionRegistry::new();
        let session = registry.get_or_create("quiz-1").await;
        session.join("u1", "Alice").await;
        session.apply_score("u1", true, 5).await.unwrap();
        session.leave("u1").await;
        registry.delete_if_empty("quiz-1").await;

        let session = registry.get_or_create("quiz-1").await;
        let lb = session.join("u1", "Alice").await;

        assert_eq!(lb.entries[0].score, 0);
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_empty() {
        let registry = SessionRegistry::new();
        registry.get_or_create("empty").await;
        registry.get_or_create("busy").await.join("u1", "Alice").await;

        let removed = registry.cleanup().await;

        assert_eq!(removed, vec!["empty".to_string()]);
        assert_eq!(registry.quiz_ids().await, vec!["busy".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_get_or_create() {
        let registry = Arc::new(SessionRegistry::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.get_or_insert("quiz-1").await })
            })
            .collect();

        let mut created = 0;
        let mut sessions = Vec::new();
        for handle in handles {
            let (session, was_created) = handle.await.unwrap();
            created += was_created as usize;
            sessions.push(session);
        }

        assert_eq!(created, 1);
        assert!(sessions.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_uses_configured_capacity() {
        let config = RegistryConfig::default().subscriber_capacity(2);
        let registry = SessionRegistry::with_config(config);
        let session = registry.get_or_create("quiz-1").await;
        session.join("u1", "Alice").await;

        let (rx, _sub) = session.subscribe().await;
        for _ in 0..5 {
            session.apply_score("u1", true, 1).await.unwrap();
        }

        assert_eq!(rx.len(), 2);
    }
}
