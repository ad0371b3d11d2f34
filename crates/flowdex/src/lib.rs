//! # flowdex: flow-event materialization
//!
//! flowdex ingests an ordered chain of flow-rate update events (a sender
//! paying a receiver a per-second rate of a token) and materializes them
//! into two derived structures: a current-state record per logical stream
//! and an append-only activity log of every transition. Stream identity
//! survives close/reopen cycles through a per-relationship revision
//! counter, so each "life" of a relationship gets its own stable id.
//!
//! # Example
//!
//! ```ignore
//! use flowdex::{Flowdex, FlowdexConfig};
//!
//! let db = Flowdex::open(FlowdexConfig::new("./data"))?;
//! db.ingest(event)?;
//!
//! let open_streams = db.list_streams(
//!     &StreamFilter::any().with_sender(sender).with_flow_rate_is_zero(false),
//!     StreamOrder::UpdatedAt,
//!     ScanOrder::Descending,
//!     Page::first(),
//! )?;
//! ```
//!
//! Events for one relationship must arrive in chain order; events for
//! unrelated relationships may be ingested concurrently from any number of
//! threads. See [`Flowdex::ingest`] for the exact contract.

mod config;
mod db;
mod error;
mod sequencer;

pub use config::FlowdexConfig;
pub use db::{Flowdex, IngestOutcome};
pub use error::{FlowdexError, Result};

pub use flowdex_kernel::{Anomaly, Outcome, ReduceError, WriteSet};
pub use flowdex_query::{ActivityFilter, Page, ScanOrder, StreamFilter, StreamOrder};
pub use flowdex_store::StoreError;
pub use flowdex_types::{
    ActivityId, ActivityType, Address, BlockNumber, CompositeKey, EventPosition, FlowRate,
    FlowUpdateEvent, LogIndex, Stream, StreamActivity, StreamId, StreamRevision, Timestamp,
    TxHash,
};
