use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use acmq_schemas::{ProvisionState, ProvisionStatus};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_RETENTION_SECS: i64 = 24 * 60 * 60;

/// Request-id keyed provisioning outcomes.
///
/// Entries expire `retention` after they were last recorded. Expired entries are
/// invisible to `get` and dropped by `purge_expired`.
#[derive(Debug)]
pub struct StatusStore {
    retention: Duration,
    entries: Mutex<HashMap<Uuid, ProvisionStatus>>,
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_RETENTION_SECS))
    }
}

impl StatusStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Allocate a request id and record it as pending.
    pub fn begin(&self, now: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.record(ProvisionStatus::pending(id, now));
        id
    }

    pub fn record(&self, status: ProvisionStatus) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(status.request_id, status);
    }

    pub fn finish(
        &self,
        request_id: Uuid,
        state: ProvisionState,
        message: impl Into<String>,
        changed_artifacts: Vec<String>,
        now: DateTime<Utc>,
    ) {
        self.record(ProvisionStatus {
            request_id,
            state,
            message: message.into(),
            changed_artifacts,
            recorded_at: now,
        });
    }

    pub fn get(&self, request_id: &Uuid, now: DateTime<Utc>) -> Option<ProvisionStatus> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(request_id)
            .filter(|s| !self.is_expired(s, now))
            .cloned()
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, s| !self.is_expired(s, now));
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, "expired provisioning statuses dropped");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, status: &ProvisionStatus, now: DateTime<Utc>) -> bool {
        now - status.recorded_at > self.retention
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn entries_expire_after_retention() {
        let store = StatusStore::new(Duration::minutes(10));
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

        let id = store.begin(t0);
        assert_eq!(store.get(&id, t0).unwrap().state, ProvisionState::Pending);

        store.finish(id, ProvisionState::Succeeded, "done", vec!["ledger".into()], t0 + Duration::minutes(5));
        assert!(store.get(&id, t0 + Duration::minutes(14)).is_some());
        assert!(store.get(&id, t0 + Duration::minutes(16)).is_none());

        assert_eq!(store.purge_expired(t0 + Duration::minutes(16)), 1);
        assert!(store.is_empty());
    }
}
