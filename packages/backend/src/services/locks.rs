use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

/// One async mutex per user. Holding the guard serializes every
/// read-modify-write sequence on that user's records; different users never
/// contend. Entries exist only while a guard is held or awaited.
#[derive(Debug, Default)]
pub struct UserLocks {
    inner: Mutex<LockMap>,
}

/// Exclusive access to one user's records. Dropping it releases the lock
/// and forgets the user once nobody else holds or awaits it.
#[derive(Debug)]
pub struct UserGuard<'a> {
    locks: &'a UserLocks,
    user_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: &str) -> UserGuard<'_> {
        let lock = {
            let mut map = self.inner.lock();
            Arc::clone(map.entry(user_id.to_string()).or_default())
        };
        let guard = lock.lock_owned().await;
        UserGuard {
            locks: self,
            user_id: user_id.to_string(),
            guard: Some(guard),
        }
    }

    pub fn tracked_users(&self) -> usize {
        self.inner.lock().len()
    }
}

impl Drop for UserGuard<'_> {
    fn drop(&mut self) {
        // release under the map lock so no acquirer can clone the entry in between
        let mut map = self.locks.inner.lock();
        drop(self.guard.take());
        let idle = map
            .get(&self.user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            map.remove(&self.user_id);
        }
    }
}
