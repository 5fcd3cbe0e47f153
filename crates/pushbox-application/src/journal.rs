//! Mutation journal for refreshes in flight.
//!
//! A bulk refresh replaces the whole store with whatever `fetch_all` returned,
//! but that result may predate pushes and removals applied while the fetch was
//! running. Those mutations are journaled and replayed over the fresh result.

use pushbox_core::{NotificationRecord, NotificationStore};
use std::collections::HashMap;

/// A store mutation that can be re-applied.
#[derive(Debug, Clone)]
pub(crate) enum Mutation {
    Upsert(NotificationRecord),
    Remove(String),
}

impl Mutation {
    pub(crate) fn apply(self, store: &mut NotificationStore) -> bool {
        match self {
            Mutation::Upsert(record) => store.upsert(record),
            Mutation::Remove(seqno) => store.remove_by_seqno(&seqno),
        }
    }
}

/// Identifies one refresh for the lifetime of its fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct RefreshTicket(u64);

#[derive(Debug, Default)]
pub(crate) struct MutationJournal {
    entries: Vec<Mutation>,
    /// Open refreshes and the journal length when each one began.
    open: HashMap<RefreshTicket, usize>,
    next_ticket: u64,
}

impl MutationJournal {
    pub(crate) fn begin(&mut self) -> RefreshTicket {
        let ticket = RefreshTicket(self.next_ticket);
        self.next_ticket += 1;
        self.open.insert(ticket, self.entries.len());
        ticket
    }

    /// True while at least one refresh is in flight.
    pub(crate) fn is_recording(&self) -> bool {
        !self.open.is_empty()
    }

    pub(crate) fn record(&mut self, mutation: Mutation) {
        if self.is_recording() {
            self.entries.push(mutation);
        }
    }

    /// Closes `ticket` and returns the mutations recorded since it began.
    pub(crate) fn finish(&mut self, ticket: RefreshTicket) -> Vec<Mutation> {
        let replay = match self.open.remove(&ticket) {
            Some(start) => self.entries[start..].to_vec(),
            None => Vec::new(),
        };
        self.truncate_if_idle();
        replay
    }

    /// Closes `ticket` without replaying anything (the refresh failed).
    pub(crate) fn abandon(&mut self, ticket: RefreshTicket) {
        self.open.remove(&ticket);
        self.truncate_if_idle();
    }

    fn truncate_if_idle(&mut self) {
        if self.open.is_empty() {
            self.entries.clear();
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(seqno: &str) -> Mutation {
        Mutation::Upsert(NotificationRecord::new(seqno, "t", "b", "{}"))
    }

    #[test]
    fn test_nothing_recorded_without_open_refresh() {
        let mut journal = MutationJournal::default();
        journal.record(upsert("1"));
        assert!(!journal.is_recording());
        assert_eq!(journal.len(), 0);
    }

    #[test]
    fn test_finish_returns_mutations_since_begin() {
        let mut journal = MutationJournal::default();
        let ticket = journal.begin();
        journal.record(upsert("1"));
        journal.record(Mutation::Remove("2".to_string()));

        let replay = journal.finish(ticket);
        assert_eq!(replay.len(), 2);
        assert!(!journal.is_recording());
        assert_eq!(journal.len(), 0);
    }

    #[test]
    fn test_overlapping_refreshes_see_their_own_window() {
        let mut journal = MutationJournal::default();
        let first = journal.begin();
        journal.record(upsert("1"));
        let second = journal.begin();
        journal.record(upsert("2"));

        assert_eq!(journal.finish(second).len(), 1);
        // The first refresh is still open, so nothing is dropped yet.
        journal.record(upsert("3"));
        assert_eq!(journal.finish(first).len(), 3);
        assert_eq!(journal.len(), 0);
    }

    #[test]
    fn test_abandon_closes_ticket() {
        let mut journal = MutationJournal::default();
        let ticket = journal.begin();
        journal.record(upsert("1"));
        journal.abandon(ticket);

        assert!(!journal.is_recording());
        assert!(journal.finish(ticket).is_empty());
    }

    #[test]
    fn test_replay_applies_in_order() {
        let mut store = NotificationStore::new();
        for mutation in [upsert("1"), upsert("2"), Mutation::Remove("1".to_string())] {
            mutation.apply(&mut store);
        }
        assert!(store.find("1").is_none());
        assert!(store.find("2").is_some());
    }
}
