//! Row identity - Phantom ids and the deletion policy.
//!
//! Records created client-side carry `phantom: true` and an id from
//! [`PhantomAllocator`]: 0, -1, -2, ... Persisted ids are positive, so the two
//! ranges never collide.
//!
//! Removing a row depends on what it is bound to:
//! - phantom record: spliced out of the value (hard delete)
//! - persisted record: delete flag set, row hidden (soft delete), so the
//!   backend still receives the deletion marker

use serde_json::Value;

use crate::types::{flag_is_set, Record, PHANTOM_KEY};

// =============================================================================
// Phantom ids
// =============================================================================

/// Hands out strictly decreasing ids, starting at 0.
#[derive(Debug, Default)]
pub struct PhantomAllocator {
    next: i64,
}

impl PhantomAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next phantom id. Unique for the lifetime of the allocator.
    pub fn next_phantom_id(&mut self) -> i64 {
        let id = self.next;
        self.next -= 1;
        id
    }
}

// =============================================================================
// Record keys
// =============================================================================

/// Configurable names of the identity and delete-flag fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKeys {
    pub id: String,
    pub is_del: String,
}

impl RecordKeys {
    pub fn new(id: impl Into<String>, is_del: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_del: is_del.into(),
        }
    }

    pub fn is_deleted(&self, record: &Record) -> bool {
        flag_is_set(record, &self.is_del)
    }

    pub fn is_phantom(&self, record: &Record) -> bool {
        flag_is_set(record, PHANTOM_KEY)
    }

    /// `{phantom: true, <id>: id, <is_del>: false}`
    pub fn phantom_record(&self, id: i64) -> Record {
        let mut record = Record::new();
        record.insert(PHANTOM_KEY.to_string(), Value::Bool(true));
        record.insert(self.id.clone(), Value::from(id));
        record.insert(self.is_del.clone(), Value::Bool(false));
        record
    }
}

impl Default for RecordKeys {
    fn default() -> Self {
        Self::new("id", "is_del")
    }
}

// =============================================================================
// Deletion policy
// =============================================================================

/// What removing the row at `index` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// Splice the record out of the value.
    Hard { index: usize },
    /// Flag the record deleted and hide the row.
    Soft { index: usize },
}

/// Decide how to remove the row at `index` bound to `record`.
pub fn deletion_for(keys: &RecordKeys, record: &Record, index: usize) -> Deletion {
    if keys.is_phantom(record) {
        Deletion::Hard { index }
    } else {
        Deletion::Soft { index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_phantom_ids_decrease_from_zero() {
        let mut ids = PhantomAllocator::new();
        assert_eq!(ids.next_phantom_id(), 0);
        assert_eq!(ids.next_phantom_id(), -1);
        assert_eq!(ids.next_phantom_id(), -2);
    }

    #[test]
    fn test_phantom_record_shape() {
        let keys = RecordKeys::new("user_id", "user_is_del");
        let record = keys.phantom_record(-4);

        assert_eq!(
            Value::Object(record.clone()),
            json!({"phantom": true, "user_id": -4, "user_is_del": false})
        );
        assert!(keys.is_phantom(&record));
        assert!(!keys.is_deleted(&record));
    }

    #[test]
    fn test_deletion_policy() {
        let keys = RecordKeys::default();
        let phantom = keys.phantom_record(0);
        let persisted = json!({"id": 5, "is_del": false});
        let persisted = persisted.as_object().unwrap();

        assert_eq!(deletion_for(&keys, &phantom, 2), Deletion::Hard { index: 2 });
        assert_eq!(deletion_for(&keys, persisted, 0), Deletion::Soft { index: 0 });
    }
}
