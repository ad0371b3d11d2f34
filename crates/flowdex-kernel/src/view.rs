//! Read interface the reducer sees state through.

use flowdex_types::{
    CompositeKey, EventPosition, LogIndex, Stream, StreamId, StreamRevision, TxHash,
};

/// Read-only snapshot of the derived state, as visible to one reduction.
///
/// The store implements this over its committed tables; tests implement it
/// over plain maps. The reducer never writes through this trait: every
/// mutation travels in the returned [`WriteSet`](crate::WriteSet), so the
/// atomicity boundary stays in the store.
///
/// Callers must hold whatever mutual exclusion serializes reductions for a
/// composite key while the view is in use; the reducer itself is free of
/// interior state.
pub trait StateView {
    /// Current record for a stream id, if one exists.
    fn stream(&self, id: &StreamId) -> Option<Stream>;

    /// Revision record for a composite key, if one exists.
    fn revision(&self, key: &CompositeKey) -> Option<StreamRevision>;

    /// True if an activity for `(tx_hash, log_index)` was already committed.
    ///
    /// This is the duplicate-delivery check. It is keyed on transaction
    /// provenance rather than a re-derived stream id: a redelivered closing
    /// event would re-derive against the post-increment revision and miss
    /// its own activity.
    fn applied(&self, tx_hash: &TxHash, log_index: LogIndex) -> bool;

    /// High watermark of applied event positions for a composite key.
    fn cursor(&self, key: &CompositeKey) -> Option<EventPosition>;
}
