//! # flowdex-store: The state store
//!
//! Durable home of the derived state: current [`Stream`](flowdex_types::Stream)
//! records, [`StreamRevision`](flowdex_types::StreamRevision) counters, and the
//! append-only [`StreamActivity`](flowdex_types::StreamActivity) log, plus the
//! two internal indexes the reducer's contracts need (duplicate detection by
//! `(txHash, logIndex)` and the per-composite-key ordering cursor).
//!
//! Two layers:
//! - [`Tables`]: plain in-memory maps. Implements the reducer's
//!   [`StateView`](flowdex_kernel::StateView) and the read surface the query
//!   layer scans. Usable on its own as the in-memory backing (and as the
//!   test fake).
//! - [`StateStore`]: [`Tables`] plus an optional write-ahead journal of
//!   committed [`WriteSet`](flowdex_kernel::WriteSet)s. The journal record is
//!   appended (and optionally fsynced) *before* the tables mutate, so a
//!   half-applied event cannot exist: either the record is fully on disk and
//!   replayable, or the event was never applied.
//!
//! # Journal Format
//!
//! Each record is stored as:
//! ```text
//! [seq:u64][length:u32][payload:bytes][crc32:u32]
//!    8B        4B          variable       4B
//! ```
//!
//! - **seq**: position of this write set in commit order
//! - **length**: size of the payload in bytes
//! - **payload**: the JSON-encoded write set
//! - **crc32**: checksum of seq + length + payload for corruption detection
//!
//! A truncated final record is a crash artifact and is dropped on recovery;
//! a checksum failure anywhere else is corruption and refuses to open.

mod error;
mod record;
mod store;
mod tables;

pub use error::StoreError;
pub use record::JournalRecord;
pub use store::{JOURNAL_FILENAME, StateStore};
pub use tables::Tables;
