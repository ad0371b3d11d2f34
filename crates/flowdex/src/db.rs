//! Main entry point for embedding flowdex.
//!
//! The [`Flowdex`] struct owns the state store and the concurrency
//! discipline around the reducer: one lock per composite key serializes
//! same-relationship events, while unrelated relationships reduce in
//! parallel. The store's own lock is held only for the atomic commit and
//! for consistent reads, never across a reduction.

use std::sync::{Arc, Mutex, RwLock};

use dashmap::DashMap;

use flowdex_crypto::composite_key;
use flowdex_kernel::{Outcome, reduce};
use flowdex_query::{ActivityFilter, Page, ScanOrder, StreamFilter, StreamOrder};
use flowdex_store::StateStore;
use flowdex_types::{
    ActivityType, Address, BlockNumber, CompositeKey, FlowUpdateEvent, Stream, StreamActivity,
    StreamId, StreamRevision,
};

use crate::config::FlowdexConfig;
use crate::error::{FlowdexError, Result};
use crate::sequencer;

/// Result of ingesting one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The event mutated state.
    Applied {
        /// Stream the event was recorded against.
        stream_id: StreamId,
        /// How the transition was classified.
        activity_type: ActivityType,
    },
    /// The event had already been applied; nothing changed.
    Duplicate,
}

struct Inner {
    /// Committed derived state. Writers hold the lock only to commit one
    /// write set; readers only to take a consistent snapshot scan.
    store: RwLock<StateStore>,

    /// One reduction lock per composite key. This, not the store lock, is
    /// the mutual-exclusion scope that makes read-reduce-commit atomic per
    /// relationship without serializing unrelated relationships.
    reduce_locks: DashMap<CompositeKey, Arc<Mutex<()>>>,
}

/// The main flowdex handle.
///
/// Cheap to clone; all clones share one store.
#[derive(Clone)]
pub struct Flowdex {
    inner: Arc<Inner>,
}

impl Flowdex {
    /// Opens a durable instance rooted at the configured data directory.
    ///
    /// If the directory doesn't exist it is created; if a journal exists,
    /// state is recovered from it.
    pub fn open(config: FlowdexConfig) -> Result<Self> {
        let store = StateStore::open(&config.data_dir, config.fsync)?;
        Ok(Self::with_store(store))
    }

    /// Creates an instance with no durable backing.
    pub fn in_memory() -> Self {
        Self::with_store(StateStore::in_memory())
    }

    fn with_store(store: StateStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: RwLock::new(store),
                reduce_locks: DashMap::new(),
            }),
        }
    }

    /// Ingests one flow-update event.
    ///
    /// # Ordering contract
    ///
    /// Events for one `(sender, receiver, token)` relationship must be
    /// ingested in non-decreasing `(blockNumber, logIndex)` order; an event
    /// behind its relationship's cursor fails with an ordering error.
    /// Events for unrelated relationships may be ingested concurrently and
    /// in any relative order.
    ///
    /// # Idempotence
    ///
    /// Redelivery of an already-applied event (same `txHash` and
    /// `logIndex`) returns [`IngestOutcome::Duplicate`] and changes
    /// nothing, so an at-least-once upstream can retry freely, including
    /// after a storage failure, since a failed commit leaves no trace.
    pub fn ingest(&self, event: &FlowUpdateEvent) -> Result<IngestOutcome> {
        let key = composite_key(event.sender, event.receiver, event.token);
        let key_lock = self
            .inner
            .reduce_locks
            .entry(key)
            .or_default()
            .value()
            .clone();
        let _serialized = key_lock
            .lock()
            .map_err(|_| FlowdexError::internal("reduction lock poisoned"))?;

        let outcome = {
            let store = self.read_store()?;
            reduce(&*store, event)?
        };

        match outcome {
            Outcome::AlreadyApplied => {
                tracing::debug!(tx_hash = %event.tx_hash, "duplicate delivery ignored");
                Ok(IngestOutcome::Duplicate)
            }
            Outcome::Applied(write_set) => {
                if let Some(anomaly) = write_set.anomaly {
                    tracing::warn!(
                        stream_id = %write_set.stream.id,
                        ?anomaly,
                        "zero-rate event with no prior stream record; recorded a closed stream"
                    );
                }
                let stream_id = write_set.stream.id;
                let activity_type = write_set.activity.activity_type;

                let mut store = self.write_store()?;
                store.commit(write_set)?;
                drop(store);

                tracing::debug!(
                    stream_id = %stream_id,
                    activity_type = %activity_type,
                    "applied flow update"
                );
                Ok(IngestOutcome::Applied {
                    stream_id,
                    activity_type,
                })
            }
        }
    }

    /// Ingests a batch, resequencing per relationship first.
    ///
    /// Groups the batch by composite key, orders each group by
    /// `(blockNumber, logIndex)`, and applies group by group in key order,
    /// so a block's worth of interleaved logs can be handed over as-is.
    /// Outcomes are returned in application order. Stops at the first
    /// error; everything already applied stays applied (redelivering the
    /// batch is safe).
    pub fn ingest_batch(&self, events: Vec<FlowUpdateEvent>) -> Result<Vec<IngestOutcome>> {
        let mut outcomes = Vec::with_capacity(events.len());
        for (_, group) in sequencer::resequence(events) {
            for event in &group {
                outcomes.push(self.ingest(event)?);
            }
        }
        Ok(outcomes)
    }

    /// Unwinds every applied event beyond `block`.
    ///
    /// This is the bounded-rollback hook for chain reorganizations. The
    /// caller must quiesce ingestion first: the chain follower that
    /// detects the reorg is the same component that delivers events, so it
    /// stops feeding, rolls back to the last canonical block, then replays
    /// the new history.
    ///
    /// Returns the number of applied events discarded.
    pub fn rollback_to(&self, block: BlockNumber) -> Result<usize> {
        let mut store = self.write_store()?;
        Ok(store.rollback_to(block)?)
    }

    /// Point lookup of a stream record.
    pub fn stream(&self, id: &StreamId) -> Result<Option<Stream>> {
        let store = self.read_store()?;
        Ok(store.tables().stream(id).cloned())
    }

    /// The revision record for a relationship, if any event ever touched it.
    pub fn stream_revision(
        &self,
        sender: Address,
        receiver: Address,
        token: Address,
    ) -> Result<Option<StreamRevision>> {
        let key = composite_key(sender, receiver, token);
        let store = self.read_store()?;
        Ok(store.tables().revision(&key).cloned())
    }

    /// Lists stream records matching `filter`. Read-only; reflects only
    /// fully committed events.
    pub fn list_streams(
        &self,
        filter: &StreamFilter,
        order: StreamOrder,
        direction: ScanOrder,
        page: Page,
    ) -> Result<Vec<Stream>> {
        let store = self.read_store()?;
        Ok(flowdex_query::list_streams(
            store.tables(),
            filter,
            order,
            direction,
            page,
        ))
    }

    /// Lists activity records matching `filter`, ordered by timestamp.
    pub fn list_activities(
        &self,
        filter: &ActivityFilter,
        direction: ScanOrder,
        page: Page,
    ) -> Result<Vec<StreamActivity>> {
        let store = self.read_store()?;
        Ok(flowdex_query::list_activities(
            store.tables(),
            filter,
            direction,
            page,
        ))
    }

    /// Number of stream records.
    pub fn stream_count(&self) -> Result<usize> {
        Ok(self.read_store()?.tables().stream_count())
    }

    /// Number of activity records.
    pub fn activity_count(&self) -> Result<usize> {
        Ok(self.read_store()?.tables().activity_count())
    }

    fn read_store(&self) -> Result<std::sync::RwLockReadGuard<'_, StateStore>> {
        self.inner
            .store
            .read()
            .map_err(|_| FlowdexError::internal("store lock poisoned"))
    }

    fn write_store(&self) -> Result<std::sync::RwLockWriteGuard<'_, StateStore>> {
        self.inner
            .store
            .write()
            .map_err(|_| FlowdexError::internal("store lock poisoned"))
    }
}
