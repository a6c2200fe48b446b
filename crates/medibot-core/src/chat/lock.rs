//! Per-session async locks.
//!
//! A chat turn reads the transcript, calls the generator, persists the turn
//! and appends to the cache. Two turns for the same (user, session) must not
//! interleave those steps, while turns for different sessions run freely.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use medibot_types::chat::SessionKey;

/// A map of async mutexes, one per session key.
#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    inner: Arc<DashMap<SessionKey, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. The lock is held until the guard drops.
    pub async fn acquire(&self, key: SessionKey) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the DashMap shard guard is released before awaiting.
        let mutex = self.inner.entry(key).or_default().value().clone();
        mutex.lock_owned().await
    }

    /// Forget the lock for a deleted session, unless a caller still holds
    /// or waits on it. Waiters keep using the same mutex.
    pub fn release(&self, key: &SessionKey) {
        self.inner.remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = SessionLocks::new();
        let key = SessionKey::new(Uuid::now_v7(), Uuid::now_v7());

        let guard = locks.acquire(key).await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(key).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = SessionLocks::new();
        let user = Uuid::now_v7();
        let _a = locks.acquire(SessionKey::new(user, Uuid::now_v7())).await;

        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(SessionKey::new(user, Uuid::now_v7())),
        )
        .await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn release_forgets_idle_key() {
        let locks = SessionLocks::new();
        let key = SessionKey::new(Uuid::now_v7(), Uuid::now_v7());
        drop(locks.acquire(key).await);
        locks.release(&key);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn release_keeps_key_with_waiter() {
        let locks = SessionLocks::new();
        let key = SessionKey::new(Uuid::now_v7(), Uuid::now_v7());

        let guard = locks.acquire(key).await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(key).await;
                tokio::time::sleep(Duration::from_millis(50)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        locks.release(&key);
        assert_eq!(locks.len(), 1);

        // A newcomer must queue behind the waiter on the same mutex.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let newcomer = tokio::time::timeout(Duration::from_millis(10), locks.acquire(key)).await;
        assert!(newcomer.is_err());

        waiter.await.unwrap();
        locks.release(&key);
        assert!(locks.is_empty());
    }
}
