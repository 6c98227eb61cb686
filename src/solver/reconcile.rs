use crate::rpc::TxtRecord;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// TTL of challenge records, and of RRsets written by the solver.
pub const CHALLENGE_TTL: u32 = 60;

/// Add a record carrying `key` to `existing`. Returns `None` when some record already carries
/// it, in which case nothing needs writing.
pub fn merge(mut existing: Vec<TxtRecord>, name: &str, key: &str) -> Option<Vec<TxtRecord>> {
    if existing.iter().any(|record| record.carries(key)) {
        return None;
    }
    existing.push(TxtRecord::new(name, CHALLENGE_TTL, key));
    Some(existing)
}

/// Split `records` into those carrying `key` and the rest, keeping their order.
pub fn partition(records: Vec<TxtRecord>, key: &str) -> (Vec<TxtRecord>, Vec<TxtRecord>) {
    records.into_iter().partition(|record| record.carries(key))
}

/// Serializes read-modify-write cycles on the same RRset within this process. Entries are
/// dropped once nobody holds or waits on their lock.
#[derive(Default)]
pub(crate) struct NameLocks {
    locks: Mutex<HashMap<String, Weak<Mutex<()>>>>,
}

impl NameLocks {
    pub(crate) async fn lock(&self, zone: &str, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| lock.strong_count() > 0);
            let key = format!("{name}/{zone}");
            if let Some(lock) = locks.get(&key).and_then(Weak::upgrade) {
                lock
            } else {
                let lock = Arc::new(Mutex::new(()));
                locks.insert(key, Arc::downgrade(&lock));
                lock
            }
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
