//! Liveness mirroring
//!
//! [`MirroredSessionStore`] behaves exactly like the in-memory registry it
//! wraps, and additionally writes a liveness marker to an external key/value
//! store when a session is created and clears it when the session is removed.
//! Other instances (or operators) can use the markers to see which quizzes
//! are live. Marker writes are best-effort: failures are logged, never
//! surfaced.
//!
//! Marker calls run after the registry lock is released, so they are not
//! ordered against each other. If a session is drained and recreated under
//! the same ID concurrently, the old `clear` can land after the new
//! `mark_live`, leaving a live session unmarked until it is next created.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::QuizError;
use crate::session::Session;

use super::config::RegistryConfig;
use super::store::{SessionRegistry, SessionStore};

/// Key under which a session's liveness marker is stored
pub fn liveness_key(quiz_id: &str) -> String {
    format!("quiz:session:{}", quiz_id)
}

/// External store that holds session liveness markers
pub trait LivenessMarker: Send + Sync {
    /// Set `key` with an expiry of `ttl`
    fn mark_live(&self, key: &str, ttl: Duration) -> impl Future<Output = Result<(), QuizError>> + Send;

    /// Delete `key`
    fn clear(&self, key: &str) -> impl Future<Output = Result<(), QuizError>> + Send;
}

/// Session store that mirrors liveness to an external marker store
pub struct MirroredSessionStore<M> {
    registry: Arc<SessionRegistry>,
    marker: M,
}

impl<M: LivenessMarker> MirroredSessionStore<M> {
    /// Create a store with default registry configuration
    pub fn new(marker: M) -> Self {
        Self::with_config(marker, RegistryConfig::default())
    }

    /// Create a store with custom registry configuration
    pub fn with_config(marker: M, config: RegistryConfig) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::with_config(config)),
            marker,
        }
    }

    /// The in-memory registry behind this store
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// The marker store
    pub fn marker(&self) -> &M {
        &self.marker
    }
}

impl<M: LivenessMarker> SessionStore for MirroredSessionStore<M> {
    async fn get_or_create(&self, quiz_id: &str) -> Arc<Session> {
        let (session, created) = self.registry.get_or_insert(quiz_id).await;

        if created {
            let ttl = self.registry.config().liveness_ttl;
            if let Err(e) = self.marker.mark_live(&liveness_key(quiz_id), ttl).await {
                tracing::warn!(quiz = quiz_id, error = %e, "Failed to mark session live");
            }
        }

        session
    }

    async fn get(&self, quiz_id: &str) -> Option<Arc<Session>> {
        self.registry.lookup(quiz_id).await
    }

    async fn delete_if_empty(&self, quiz_id: &str) -> bool {
        let removed = self.registry.remove_if_empty(quiz_id).await;

        if removed {
            if let Err(e) = self.marker.clear(&liveness_key(quiz_id)).await {
                tracing::warn!(quiz = quiz_id, error = %e, "Failed to clear session marker");
            }
        }

        removed
    }
}
