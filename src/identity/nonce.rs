//! Nonce Replay Store
//!
//! Atomic check-and-insert of `(did, nonce)` pairs. Exactly-once
//! admission depends on `try_consume` being a single conditional insert
//! against the backing store, never a separate read-then-write.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Replay-prevention collaborator
#[async_trait::async_trait]
pub trait ReplayStore: Send + Sync {
    /// Atomically consume a nonce for a device
    ///
    /// Returns `true` if the nonce was fresh and is now consumed,
    /// `false` if it was already used. `Err` means the backing store
    /// is unavailable, which callers treat as retryable.
    async fn try_consume(&self, did: &str, nonce: &str) -> Result<bool, String>;
}

/// In-memory replay store
///
/// The single write lock makes the check-and-insert atomic: concurrent
/// submissions of the same `(did, nonce)` serialize on the lock and only
/// the first insert returns `true`.
#[derive(Clone, Default)]
pub struct InMemoryReplayStore {
    consumed: Arc<RwLock<HashSet<(String, String)>>>,
}

impl InMemoryReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of consumed nonces
    pub async fn count(&self) -> usize {
        self.consumed.read().await.len()
    }
}

#[async_trait::async_trait]
impl ReplayStore for InMemoryReplayStore {
    async fn try_consume(&self, did: &str, nonce: &str) -> Result<bool, String> {
        let mut consumed = self.consumed.write().await;
        Ok(consumed.insert((did.to_string(), nonce.to_string())))
    }
}
