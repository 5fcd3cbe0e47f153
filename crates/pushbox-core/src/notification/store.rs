//! The local notification inbox.

use super::model::NotificationRecord;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Deduplicated, insertion-ordered collection of notification records.
///
/// Records live in an ordered slot vector; `index` maps each `seqno` to its slot.
/// Removal leaves a tombstone (`None`) behind so that other positions stay valid,
/// and the slots are compacted once tombstones make up more than half of them.
/// Every identifier lookup therefore goes through the index in O(1), and
/// removal is O(1) amortized.
///
/// Invariant: `index` holds exactly the `seqno`s of the occupied slots, and
/// `index[seqno]` is the position of that record in `slots`.
#[derive(Debug, Default)]
pub struct NotificationStore {
    slots: Vec<Option<Arc<NotificationRecord>>>,
    index: HashMap<String, usize>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, seqno: &str) -> bool {
        self.index.contains_key(seqno)
    }

    /// Inserts `record` unless a record with the same `seqno` is already stored.
    ///
    /// The first write wins: a duplicate is rejected, not merged.
    ///
    /// # Returns
    ///
    /// `true` if the record was inserted, `false` if it was a duplicate.
    pub fn upsert(&mut self, record: NotificationRecord) -> bool {
        if self.index.contains_key(&record.seqno) {
            tracing::debug!(
                "[NotificationStore] Rejected duplicate seqno: {}",
                record.seqno
            );
            return false;
        }

        let position = self.slots.len();
        self.index.insert(record.seqno.clone(), position);
        self.slots.push(Some(Arc::new(record)));
        true
    }

    /// Same as [`upsert`](Self::upsert), but for a raw gateway payload.
    ///
    /// Payloads that are not well-formed records are silently dropped.
    pub fn upsert_payload(&mut self, payload: &Value) -> bool {
        match NotificationRecord::from_payload(payload) {
            Ok(record) => self.upsert(record),
            Err(e) => {
                tracing::debug!("[NotificationStore] Dropped payload: {}", e);
                false
            }
        }
    }

    /// Discards every record and stores `records` in the given order.
    ///
    /// When the input repeats a `seqno`, the record keeps the position of the
    /// first occurrence and the content of the last one.
    pub fn replace_all<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = NotificationRecord>,
    {
        let records = records.into_iter();
        let mut slots: Vec<Option<Arc<NotificationRecord>>> =
            Vec::with_capacity(records.size_hint().0);
        let mut index = HashMap::with_capacity(slots.capacity());

        for record in records {
            match index.get(&record.seqno) {
                Some(&position) => slots[position] = Some(Arc::new(record)),
                None => {
                    index.insert(record.seqno.clone(), slots.len());
                    slots.push(Some(Arc::new(record)));
                }
            }
        }

        self.slots = slots;
        self.index = index;
    }

    /// Removes the record with the given `seqno`.
    ///
    /// # Returns
    ///
    /// `true` if a record was removed; `false` if none matched.
    pub fn remove_by_seqno(&mut self, seqno: &str) -> bool {
        let Some(position) = self.index.remove(seqno) else {
            return false;
        };
        self.slots[position] = None;
        self.compact_if_sparse();
        true
    }

    pub fn find(&self, seqno: &str) -> Option<&NotificationRecord> {
        let position = *self.index.get(seqno)?;
        self.slots.get(position)?.as_deref()
    }

    /// Clones the shared handle to the record, for callers that outlive the borrow.
    pub fn find_shared(&self, seqno: &str) -> Option<Arc<NotificationRecord>> {
        let position = *self.index.get(seqno)?;
        self.slots.get(position)?.clone()
    }

    /// Iterates over the current records in insertion order.
    ///
    /// The iterator is `Clone`, so it can be restarted from any point.
    pub fn list(&self) -> Records<'_> {
        Records {
            slots: self.slots.iter(),
            remaining: self.index.len(),
        }
    }

    /// Takes an owned, ordered copy of the current records.
    pub fn snapshot(&self) -> InboxSnapshot {
        InboxSnapshot {
            records: self.slots.iter().flatten().cloned().collect(),
        }
    }

    fn compact_if_sparse(&mut self) {
        let tombstones = self.slots.len() - self.index.len();
        if tombstones * 2 <= self.slots.len() {
            return;
        }

        self.slots.retain(Option::is_some);
        for (position, slot) in self.slots.iter().enumerate() {
            if let Some(record) = slot {
                self.index.insert(record.seqno.clone(), position);
            }
        }
    }
}

/// Ordered iterator over the records of a [`NotificationStore`].
#[derive(Debug, Clone)]
pub struct Records<'a> {
    slots: std::slice::Iter<'a, Option<Arc<NotificationRecord>>>,
    remaining: usize,
}

impl<'a> Iterator for Records<'a> {
    type Item = &'a NotificationRecord;

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(record) = slot {
                self.remaining -= 1;
                return Some(record.as_ref());
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Records<'_> {}

/// An owned, read-only view of the inbox at one point in time.
///
/// Cloning is cheap: records are shared with the store, never copied.
#[derive(Debug, Clone, Default)]
pub struct InboxSnapshot {
    records: Vec<Arc<NotificationRecord>>,
}

impl InboxSnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&NotificationRecord> {
        self.records.get(position).map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationRecord> + Clone + '_ {
        self.records.iter().map(Arc::as_ref)
    }

    pub fn seqnos(&self) -> Vec<&str> {
        self.iter().map(|record| record.seqno.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(seqno: &str, title: &str) -> NotificationRecord {
        NotificationRecord::new(seqno, title, format!("body {seqno}"), "{}")
    }

    fn seqnos(store: &NotificationStore) -> Vec<&str> {
        store.list().map(|r| r.seqno.as_str()).collect()
    }

    #[test]
    fn test_upsert_rejects_duplicate_seqno() {
        let mut store = NotificationStore::new();

        assert!(store.upsert(record("1", "first")));
        assert!(!store.upsert(record("1", "second")));

        assert_eq!(store.len(), 1);
        assert_eq!(store.find("1").unwrap().title, "first");
        assert!(store.contains("1"));
        assert!(!store.contains("2"));
    }

    #[test]
    fn test_upsert_sequence_never_duplicates() {
        let mut store = NotificationStore::new();
        for seqno in ["a", "b", "a", "c", "b", "a", "d"] {
            store.upsert(record(seqno, seqno));
        }

        assert_eq!(seqnos(&store), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_upsert_payload_drops_malformed_input() {
        let mut store = NotificationStore::new();

        assert!(!store.upsert_payload(&json!("just a message string")));
        assert!(!store.upsert_payload(&json!({"seqno": "1"})));
        assert!(store.is_empty());

        assert!(store.upsert_payload(&json!({
            "seqno": "1", "title": "T", "body": "B", "message": "{}"
        })));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_replace_all_last_duplicate_wins() {
        let mut store = NotificationStore::new();
        store.upsert(record("old", "stale"));

        store.replace_all(vec![record("A", "A"), record("B", "B"), record("A", "A'")]);

        assert_eq!(seqnos(&store), vec!["A", "B"]);
        assert_eq!(store.find("A").unwrap().title, "A'");
        assert!(store.find("old").is_none());
    }

    #[test]
    fn test_replace_all_with_empty_input_clears() {
        let mut store = NotificationStore::new();
        store.upsert(record("1", "one"));

        store.replace_all(Vec::new());

        assert!(store.is_empty());
        assert_eq!(store.list().count(), 0);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut store = NotificationStore::new();
        assert!(!store.remove_by_seqno("x"));

        store.upsert(record("1", "one"));
        assert!(!store.remove_by_seqno("x"));
        assert_eq!(seqnos(&store), vec!["1"]);
    }

    #[test]
    fn test_find_after_upsert_and_remove() {
        let mut store = NotificationStore::new();
        let original = record("x", "the one");
        store.upsert(original.clone());

        assert!(store.find("x").unwrap().same_content(&original));
        assert!(store.remove_by_seqno("x"));
        assert!(store.find("x").is_none());
    }

    #[test]
    fn test_order_survives_removals_and_compaction() {
        let mut store = NotificationStore::new();
        for i in 0..10 {
            store.upsert(record(&i.to_string(), "t"));
        }

        for i in [0, 2, 4, 6, 8, 9] {
            assert!(store.remove_by_seqno(&i.to_string()));
        }
        store.upsert(record("10", "t"));

        assert_eq!(seqnos(&store), vec!["1", "3", "5", "7", "10"]);
        for seqno in ["1", "3", "5", "7", "10"] {
            assert_eq!(store.find(seqno).unwrap().seqno, seqno);
        }
        assert!(store.remove_by_seqno("5"));
        assert_eq!(seqnos(&store), vec!["1", "3", "7", "10"]);
    }

    #[test]
    fn test_removed_seqno_can_be_inserted_again() {
        let mut store = NotificationStore::new();
        store.upsert(record("1", "first"));
        store.upsert(record("2", "second"));
        store.remove_by_seqno("1");

        assert!(store.upsert(record("1", "again")));
        assert_eq!(seqnos(&store), vec!["2", "1"]);
    }

    #[test]
    fn test_list_is_restartable() {
        let mut store = NotificationStore::new();
        store.upsert(record("1", "one"));
        store.upsert(record("2", "two"));

        let mut list = store.list();
        assert_eq!(list.len(), 2);
        list.next();
        let restart = list.clone();

        assert_eq!(list.map(|r| r.seqno.as_str()).collect::<Vec<_>>(), vec!["2"]);
        assert_eq!(restart.count(), 1);
        assert_eq!(store.list().count(), 2);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_mutations() {
        let mut store = NotificationStore::new();
        store.upsert(record("1", "one"));

        let snapshot = store.snapshot();
        store.remove_by_seqno("1");
        store.upsert(record("2", "two"));

        assert_eq!(snapshot.seqnos(), vec!["1"]);
        assert_eq!(store.snapshot().seqnos(), vec!["2"]);
    }
}
