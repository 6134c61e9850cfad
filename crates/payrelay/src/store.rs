use dashmap::DashMap;

use crate::constants::PENDING_STATUS;

/// Latest known status per transaction id.
///
/// Last write wins; entries live for the lifetime of the process.
pub struct StatusStore {
    statuses: DashMap<String, String>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self {
            statuses: DashMap::new(),
        }
    }

    /// Record `status` for `transaction_id`, replacing any earlier value.
    pub fn set(&self, transaction_id: &str, status: &str) {
        let previous = self
            .statuses
            .insert(transaction_id.to_string(), status.to_string());
        tracing::debug!(
            transaction_id = %transaction_id,
            status = %status,
            previous = previous.as_deref().unwrap_or(PENDING_STATUS),
            "payment status stored"
        );
    }

    /// Current status, or `PENDING` if no callback has arrived yet.
    pub fn get(&self, transaction_id: &str) -> String {
        self.statuses
            .get(transaction_id)
            .map(|s| s.value().clone())
            .unwrap_or_else(|| PENDING_STATUS.to_string())
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unknown_is_pending() {
        let store = StatusStore::new();
        assert_eq!(store.get("T1"), "PENDING");
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_then_overwrite() {
        let store = StatusStore::new();
        store.set("T1", "SUCCESS");
        assert_eq!(store.get("T1"), "SUCCESS");
        store.set("T1", "FAILED");
        assert_eq!(store.get("T1"), "FAILED");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_identifiers_are_independent() {
        let store = StatusStore::new();
        store.set("T1", "SUCCESS");
        assert_eq!(store.get("T2"), "PENDING");
    }

    #[test]
    fn test_concurrent_writers() {
        let store = Arc::new(StatusStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..100 {
                        store.set(&format!("T{i}-{j}"), "COMPLETED");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 800);
        assert_eq!(store.get("T7-99"), "COMPLETED");
    }
}
