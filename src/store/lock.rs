//! Advisory run lock kept as a boolean flag in the key-value store.
//!
//! Acquisition goes through [`KvStore::swap`], which is atomic on Redis. On a
//! store without a native swap two processes can both see `false` and both
//! start; deployments run a single scheduler so that window is accepted.
//! A process killed while holding the lock leaves the flag at `true` until
//! [`RunLock::force_clear`] is called.

use std::sync::Arc;

use tracing::{error, warn};

use super::{KvStore, StoreError};

const HELD: &str = "true";
const FREE: &str = "false";

#[derive(Clone)]
pub struct RunLock {
    store: Arc<dyn KvStore>,
    key: String,
}

impl RunLock {
    pub fn new(store: Arc<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Returns `None` when another run already holds the flag. Nothing is
    /// written in that case.
    pub async fn acquire(&self) -> Result<Option<RunLockGuard>, StoreError> {
        let previous = self.store.swap(&self.key, HELD).await?;
        if previous.as_deref() == Some(HELD) {
            return Ok(None);
        }
        Ok(Some(RunLockGuard {
            lock: self.clone(),
            released: false,
        }))
    }

    pub async fn is_held(&self) -> Result<bool, StoreError> {
        Ok(self.store.get(&self.key).await?.as_deref() == Some(HELD))
    }

    pub async fn force_clear(&self) -> Result<(), StoreError> {
        self.store.set(&self.key, FREE, 0).await
    }
}

/// Proof of a held [`RunLock`]. Call [`RunLockGuard::release`] on every exit
/// path; a guard dropped without it schedules the release on the runtime.
pub struct RunLockGuard {
    lock: RunLock,
    released: bool,
}

impl RunLockGuard {
    pub async fn release(mut self) -> Result<(), StoreError> {
        self.released = true;
        self.lock.force_clear().await
    }
}

impl Drop for RunLockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let lock = self.lock.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(key = %lock.key, "run lock guard dropped without release, releasing in background");
                handle.spawn(async move {
                    if let Err(e) = lock.force_clear().await {
                        error!(key = %lock.key, "❌ Failed to release run lock: {}", e);
                    }
                });
            }
            Err(_) => {
                error!(key = %lock.key, "❌ Run lock guard dropped outside a runtime, flag left set");
            }
        }
    }
}
