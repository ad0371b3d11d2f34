//! In-memory tables for the derived state.

use std::collections::BTreeMap;

use flowdex_kernel::{StateView, WriteSet};
use flowdex_types::{
    ActivityId, BlockNumber, CompositeKey, EventPosition, LogIndex, Stream, StreamActivity,
    StreamId, StreamRevision, TxHash,
};

/// The in-memory backing of the state store.
///
/// Holds one map per entity kind plus the two derived indexes, and the
/// ordered log of committed write sets that makes rebuild and rollback a
/// pure replay. All mutation goes through [`Tables::commit`]; readers only
/// ever observe fully committed write sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    /// Current state per stream id.
    streams: BTreeMap<StreamId, Stream>,
    /// Revision counter per composite key.
    revisions: BTreeMap<CompositeKey, StreamRevision>,
    /// Append-only activity log, keyed by activity id.
    activities: BTreeMap<ActivityId, StreamActivity>,
    /// Duplicate-delivery index: transaction provenance → activity.
    applied: BTreeMap<(TxHash, LogIndex), ActivityId>,
    /// Ordering cursor per composite key.
    cursors: BTreeMap<CompositeKey, EventPosition>,
    /// Committed write sets in commit order.
    log: Vec<WriteSet>,
}

impl Tables {
    /// Creates empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds tables by replaying write sets in order.
    pub fn rebuild(write_sets: impl IntoIterator<Item = WriteSet>) -> Self {
        let mut tables = Self::new();
        for write_set in write_sets {
            tables.commit(write_set);
        }
        tables
    }

    /// Applies one write set: stream upsert, revision write, activity
    /// append, and both index updates, together.
    ///
    /// The caller (the [`StateStore`](crate::StateStore) or a test) is the
    /// atomicity boundary; this method never partially applies.
    pub fn commit(&mut self, write_set: WriteSet) {
        // Precondition: activities are append-only and never reused.
        debug_assert!(
            !self.activities.contains_key(&write_set.activity.id),
            "activity id {} committed twice",
            write_set.activity.id
        );

        self.streams
            .insert(write_set.stream.id, write_set.stream.clone());
        self.revisions
            .insert(write_set.key, write_set.revision.clone());
        self.activities
            .insert(write_set.activity.id, write_set.activity.clone());
        self.applied.insert(
            (write_set.event.tx_hash, write_set.event.log_index),
            write_set.activity.id,
        );
        self.cursors.insert(write_set.key, write_set.position);
        self.log.push(write_set);
    }

    /// Discards every write set beyond `block` and rebuilds the tables.
    ///
    /// This is the bounded-rollback hook for chain reorganizations: the
    /// caller names the last canonical block, everything after it unwinds.
    /// Returns the number of write sets discarded.
    pub fn rollback_to(&mut self, block: BlockNumber) -> usize {
        let before = self.log.len();
        let kept: Vec<WriteSet> = std::mem::take(&mut self.log)
            .into_iter()
            .filter(|w| w.position.block_number <= block)
            .collect();
        let discarded = before - kept.len();
        *self = Self::rebuild(kept);
        discarded
    }

    /// Point lookup of a stream record.
    pub fn stream(&self, id: &StreamId) -> Option<&Stream> {
        self.streams.get(id)
    }

    /// Point lookup of a revision record.
    pub fn revision(&self, key: &CompositeKey) -> Option<&StreamRevision> {
        self.revisions.get(key)
    }

    /// Point lookup of an activity record.
    pub fn activity(&self, id: &ActivityId) -> Option<&StreamActivity> {
        self.activities.get(id)
    }

    /// Iterates all stream records.
    pub fn streams(&self) -> impl Iterator<Item = &Stream> + '_ {
        self.streams.values()
    }

    /// Iterates all activity records.
    pub fn activities(&self) -> impl Iterator<Item = &StreamActivity> + '_ {
        self.activities.values()
    }

    /// Iterates all revision records.
    pub fn revisions(&self) -> impl Iterator<Item = &StreamRevision> + '_ {
        self.revisions.values()
    }

    /// The committed write sets, in commit order.
    pub fn write_sets(&self) -> &[WriteSet] {
        &self.log
    }

    /// Number of stream records.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Number of activity records.
    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    /// True if nothing has ever been committed.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

impl StateView for Tables {
    fn stream(&self, id: &StreamId) -> Option<Stream> {
        self.streams.get(id).cloned()
    }

    fn revision(&self, key: &CompositeKey) -> Option<StreamRevision> {
        self.revisions.get(key).cloned()
    }

    fn applied(&self, tx_hash: &TxHash, log_index: LogIndex) -> bool {
        self.applied.contains_key(&(*tx_hash, log_index))
    }

    fn cursor(&self, key: &CompositeKey) -> Option<EventPosition> {
        self.cursors.get(key).copied()
    }
}
