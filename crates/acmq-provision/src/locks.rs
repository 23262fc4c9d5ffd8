use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Per-artifact mutual exclusion, keyed by artifact path.
///
/// Reconcilers assume a single writer per artifact text. Callers that read, reconcile
/// and write back a file hold that file's lock for the whole cycle.
#[derive(Debug, Default)]
pub struct ArtifactLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ArtifactLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Handles for `keys`, deduplicated and sorted so every caller acquires in the
    /// same order.
    pub fn handles<S: AsRef<str>>(&self, keys: &[S]) -> Vec<Arc<Mutex<()>>> {
        let mut sorted: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.into_iter().map(|k| self.handle(k)).collect()
    }
}

/// Lock every handle in order. Guards release when the returned vector drops.
pub fn lock_all(handles: &[Arc<Mutex<()>>]) -> Vec<MutexGuard<'_, ()>> {
    handles
        .iter()
        .map(|h| h.lock().unwrap_or_else(PoisonError::into_inner))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_shares_one_lock() {
        let locks = ArtifactLocks::new();
        let a = locks.handle("repo/acmq.yaml");
        let b = locks.handle("repo/acmq.yaml");
        let c = locks.handle("repo/init.pp");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn handles_are_sorted_and_deduped() {
        let locks = ArtifactLocks::new();
        let hs = locks.handles(&["b", "a", "b"]);
        assert_eq!(hs.len(), 2);
        assert!(Arc::ptr_eq(&hs[0], &locks.handle("a")));
        let guards = lock_all(&hs);
        assert_eq!(guards.len(), 2);
    }
}
