//! Stampede-safe quiz cache
//!
//! Reads are served from memory while an entry is fresh. On a miss, all
//! concurrent readers of the same quiz share one loader call; the freshness
//! check is repeated inside that call so a reader that lost the race to a
//! just-finished load does not trigger another one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::QuizError;
use crate::model::Quiz;
use crate::stats::{CacheCounters, CacheStats};

use super::config::CacheConfig;
use super::flight::Group;
use super::loader::QuizLoader;

/// Source of quiz content for the quiz service
pub trait QuizSource: Send + Sync {
    /// Fetch a quiz by ID
    fn get_quiz(&self, quiz_id: &str) -> impl Future<Output = Result<Arc<Quiz>, QuizError>> + Send;
}

impl<S: QuizSource> QuizSource for Arc<S> {
    fn get_quiz(&self, quiz_id: &str) -> impl Future<Output = Result<Arc<Quiz>, QuizError>> + Send {
        (**self).get_quiz(quiz_id)
    }
}

/// A cached quiz and when it stops being served
#[derive(Debug, Clone)]
struct CacheEntry {
    quiz: Arc<Quiz>,
    /// `None` never expires
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Lifetime for a new entry: `ttl` plus up to `ttl / 10` of random jitter
///
/// Returns `None` when `ttl` is zero (no expiry).
pub fn ttl_with_jitter(ttl: Duration) -> Option<Duration> {
    if ttl.is_zero() {
        return None;
    }

    let max_jitter = u64::try_from((ttl / 10).as_nanos()).unwrap_or(u64::MAX);
    let jitter = rand::thread_rng().gen_range(0..=max_jitter);
    Some(ttl + Duration::from_nanos(jitter))
}

/// TTL cache in front of a [`QuizLoader`]
pub struct QuizCache<L> {
    loader: L,
    config: CacheConfig,
    entries: RwLock<HashMap<String, CacheEntry>>,
    flights: Group<String, Result<Arc<Quiz>, QuizError>>,
    counters: CacheCounters,
}

impl<L: QuizLoader> QuizCache<L> {
    /// Create a cache with default configuration
    pub fn new(loader: L) -> Self {
        Self::with_config(loader, CacheConfig::default())
    }

    /// Create a cache with custom configuration
    pub fn with_config(loader: L, config: CacheConfig) -> Self {
        Self {
            loader,
            config,
            entries: RwLock::new(HashMap::new()),
            flights: Group::new(),
            counters: CacheCounters::default(),
        }
    }

    /// Get the cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get the wrapped loader
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Fetch a quiz, loading it on a miss
    ///
    /// Concurrent misses for the same quiz share one loader call and all
    /// receive its outcome, including its error.
    pub async fn get_quiz(&self, quiz_id: &str) -> Result<Arc<Quiz>, QuizError> {
        if let Some(quiz) = self.lookup_fresh(quiz_id).await {
            CacheCounters::incr(&self.counters.hits);
            return Ok(quiz);
        }
        CacheCounters::incr(&self.counters.misses);

        let (result, _) = self
            .flights
            .work(quiz_id.to_string(), || self.load(quiz_id))
            .await;
        result
    }

    async fn load(&self, quiz_id: &str) -> Result<Arc<Quiz>, QuizError> {
        // Someone may have filled the entry while we waited to get here
        if let Some(quiz) = self.lookup_fresh(quiz_id).await {
            return Ok(quiz);
        }

        let started = Instant::now();
        CacheCounters::incr(&self.counters.loads);

        match self.loader.load_quiz(quiz_id).await {
            Ok(quiz) => {
                let quiz = Arc::new(quiz);
                let expires_at = ttl_with_jitter(self.config.ttl).map(|ttl| started + ttl);

                self.entries.write().await.insert(
                    quiz_id.to_string(),
                    CacheEntry {
                        quiz: Arc::clone(&quiz),
                        expires_at,
                    },
                );

                tracing::debug!(
                    quiz = quiz_id,
                    questions = quiz.questions.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Quiz loaded"
                );
                Ok(quiz)
            }
            Err(e) => {
                CacheCounters::incr(&self.counters.load_failures);
                tracing::warn!(quiz = quiz_id, error = %e, "Quiz load failed");
                Err(e)
            }
        }
    }

    async fn lookup_fresh(&self, quiz_id: &str) -> Option<Arc<Quiz>> {
        let entries = self.entries.read().await;
        entries
            .get(quiz_id)
            .filter(|entry| entry.is_fresh(Instant::now()))
            .map(|entry| Arc::clone(&entry.quiz))
    }

    /// Drop a cached quiz so the next read reloads it
    pub async fn invalidate(&self, quiz_id: &str) -> bool {
        self.entries.write().await.remove(quiz_id).is_some()
    }

    /// Remove entries that can no longer be served
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    /// Number of stored entries, fresh or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

impl<L: QuizLoader> QuizSource for QuizCache<L> {
    fn get_quiz(&self, quiz_id: &str) -> impl Future<Output = Result<Arc<Quiz>, QuizError>> + Send {
        QuizCache::get_quiz(self, quiz_id)
    }
}
