//! Durable state store: tables plus a write-ahead journal.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use flowdex_kernel::{StateView, WriteSet};
use flowdex_types::{
    BlockNumber, CompositeKey, EventPosition, LogIndex, Stream, StreamId, StreamRevision, TxHash,
};

use crate::record::JournalRecord;
use crate::tables::Tables;
use crate::StoreError;

/// Current journal filename. Future: rotation will make this dynamic.
pub const JOURNAL_FILENAME: &str = "journal_000000.log";

/// The state store: in-memory tables, optionally backed by a journal.
///
/// # Invariants
///
/// - The journal is append-only during normal operation; only
///   [`StateStore::rollback_to`] rewrites it, and does so via a temp file
///   swap.
/// - A write set reaches the tables only after its journal record is fully
///   written (and fsynced when configured), so every observable state is
///   reconstructible by replay.
/// - Journal sequence numbers are dense: record `n` is the `n`-th commit.
#[derive(Debug)]
pub struct StateStore {
    tables: Tables,
    journal: Option<Journal>,
}

impl StateStore {
    /// Creates a store with no durable backing.
    ///
    /// Everything lives in the tables; rollback still works because the
    /// tables keep the committed write sets.
    pub fn in_memory() -> Self {
        Self {
            tables: Tables::new(),
            journal: None,
        }
    }

    /// Opens (or creates) a durable store rooted at `data_dir`.
    ///
    /// An existing journal is replayed into the tables. A truncated final
    /// record is treated as a crash artifact: it is logged, cut off, and
    /// the store opens with everything before it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupted`] if a record fails its checksum or
    /// arrives out of sequence; corruption anywhere but the tail refuses
    /// to open rather than serving a partial history.
    pub fn open(data_dir: impl Into<PathBuf>, fsync: bool) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        let journal = Journal {
            path: data_dir.join(JOURNAL_FILENAME),
            fsync,
        };

        let write_sets = journal.replay()?;
        let tables = Tables::rebuild(write_sets);

        Ok(Self {
            tables,
            journal: Some(journal),
        })
    }

    /// Commits one write set as an atomic unit.
    ///
    /// Journal first, tables second: if the append fails, the tables are
    /// untouched and the caller may retry the whole event (the reducer is
    /// idempotent, so redelivery after a successful-but-unacknowledged
    /// append is also safe, since replay dedups on `(txHash, logIndex)`).
    pub fn commit(&mut self, write_set: WriteSet) -> Result<(), StoreError> {
        if let Some(journal) = &self.journal {
            let payload = serde_json::to_vec(&write_set)?;
            let record = JournalRecord::new(self.tables.write_sets().len() as u64, payload.into());
            journal.append(&record)?;
        }
        self.tables.commit(write_set);
        Ok(())
    }

    /// Unwinds every commit beyond `block`, durably.
    ///
    /// Returns the number of write sets discarded.
    pub fn rollback_to(&mut self, block: BlockNumber) -> Result<usize, StoreError> {
        let discarded = self.tables.rollback_to(block);
        if discarded > 0 {
            if let Some(journal) = &self.journal {
                journal.rewrite(self.tables.write_sets())?;
            }
            tracing::warn!(
                block = block.as_u64(),
                discarded,
                "rolled back beyond canonical block"
            );
        }
        Ok(discarded)
    }

    /// Read access to the committed tables.
    pub fn tables(&self) -> &Tables {
        &self.tables
    }
}

impl StateView for StateStore {
    fn stream(&self, id: &StreamId) -> Option<Stream> {
        StateView::stream(&self.tables, id)
    }

    fn revision(&self, key: &CompositeKey) -> Option<StreamRevision> {
        StateView::revision(&self.tables, key)
    }

    fn applied(&self, tx_hash: &TxHash, log_index: LogIndex) -> bool {
        StateView::applied(&self.tables, tx_hash, log_index)
    }

    fn cursor(&self, key: &CompositeKey) -> Option<EventPosition> {
        StateView::cursor(&self.tables, key)
    }
}

/// Append-only journal of write sets on disk.
#[derive(Debug)]
struct Journal {
    path: PathBuf,
    fsync: bool,
}

impl Journal {
    /// Appends one framed record.
    fn append(&self, record: &JournalRecord) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.write_all(&record.to_bytes())?;

        if self.fsync {
            file.sync_all()?;
        }

        Ok(())
    }

    /// Replays the journal into write sets, truncating a torn tail.
    fn replay(&self) -> Result<Vec<WriteSet>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let data: Bytes = fs::read(&self.path)?.into();
        let mut write_sets = Vec::new();
        let mut pos = 0;

        while pos < data.len() {
            match JournalRecord::from_bytes(&data.slice(pos..)) {
                Ok((record, consumed)) => {
                    if record.seq() != write_sets.len() as u64 {
                        return Err(StoreError::Corrupted {
                            seq: record.seq(),
                            reason: "sequence gap",
                        });
                    }
                    write_sets.push(serde_json::from_slice(record.payload())?);
                    pos += consumed;
                }
                Err(StoreError::UnexpectedEof) => {
                    // Crash artifact: the last append never finished.
                    tracing::warn!(
                        path = %self.path.display(),
                        offset = pos,
                        "truncating torn record at journal tail"
                    );
                    truncate_file(&self.path, pos as u64)?;
                    break;
                }
                Err(other) => return Err(other),
            }
        }

        Ok(write_sets)
    }

    /// Rewrites the whole journal from the given write sets.
    ///
    /// Writes to a temp file and renames over the original so a crash
    /// mid-rewrite leaves either the old journal or the new one, never a
    /// half-written mix.
    fn rewrite(&self, write_sets: &[WriteSet]) -> Result<(), StoreError> {
        let tmp_path = self.path.with_extension("log.tmp");

        let mut file = fs::File::create(&tmp_path)?;
        for (seq, write_set) in write_sets.iter().enumerate() {
            let payload = serde_json::to_vec(write_set)?;
            let record = JournalRecord::new(seq as u64, payload.into());
            file.write_all(&record.to_bytes())?;
        }
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn truncate_file(path: &Path, len: u64) -> Result<(), StoreError> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(len)?;
    file.sync_all()?;
    Ok(())
}
