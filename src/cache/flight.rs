//! Single-flight call coalescing
//!
//! A [`Group`] tracks one in-progress call per key. The first caller for a
//! key runs the work; callers arriving while it is in flight attach to the
//! same call and receive a clone of its result instead of starting their own.
//! Calls for different keys never wait on each other.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;

/// Coalesces concurrent calls that share a key
pub struct Group<K, V> {
    calls: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Group<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Arc<OnceCell<V>>>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `work` for `key`, or wait for the call already in flight
    ///
    /// Returns the result and whether this caller ran the work itself.
    pub async fn work<F, Fut>(&self, key: K, work: F) -> (V, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let call = {
            let mut calls = self.lock();
            Arc::clone(calls.entry(key.clone()).or_insert_with(|| Arc::new(OnceCell::new())))
        };

        let mut ran = false;
        let value = call
            .get_or_init(|| {
                ran = true;
                work()
            })
            .await
            .clone();

        // Forget the finished call so the next miss starts a new one
        let mut calls = self.lock();
        if calls.get(&key).is_some_and(|current| Arc::ptr_eq(current, &call)) {
            calls.remove(&key);
        }

        (value, ran)
    }

    /// Number of keys with a call in flight
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }
}

impl<K, V> Default for Group<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_single_caller_runs_work() {
        let group: Group<&str, u32> = Group::new();

        let (value, ran) = group.work("k", || async { 7 }).await;

        assert_eq!(value, 7);
        assert!(ran);
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_call() {
        let group: Arc<Group<String, usize>> = Arc::new(Group::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let group = Arc::clone(&group);
                let runs = Arc::clone(&runs);
                tokio::spawn(async move {
                    group
                        .work("k".to_string(), || async move {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            runs.fetch_add(1, Ordering::SeqCst) + 100
                        })
                        .await
                })
            })
            .collect();

        let mut leaders = 0;
        for handle in handles {
            let (value, ran) = handle.await.unwrap();
            assert_eq!(value, 100);
            leaders += ran as usize;
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(leaders, 1);
    }

    #[tokio::test]
    async fn test_sequential_calls_run_again() {
        let group: Group<&str, u32> = Group::new();

        let (first, _) = group.work("k", || async { 1 }).await;
        let (second, ran) = group.work("k", || async { 2 }).await;

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert!(ran);
    }
}
