use crate::CacheKey;
use resrc_classpath::BinaryName;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Slot = (CacheKey, BinaryName);

/// One mutex per (partition, binary name), created on demand and dropped
/// once nobody holds it.
#[derive(Debug, Default)]
pub(crate) struct LockTable {
    locks: Mutex<HashMap<Slot, Weak<Mutex<()>>>>,
}

impl LockTable {
    pub(crate) fn get(&self, key: &CacheKey, name: &BinaryName) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = (key.clone(), name.clone());
        if let Some(lock) = locks.get(&slot).and_then(Weak::upgrade) {
            return lock;
        }
        locks.retain(|_, lock| lock.strong_count() > 0);
        let lock = Arc::new(Mutex::new(()));
        locks.insert(slot, Arc::downgrade(&lock));
        lock
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
