//! The atomic unit of one applied event.

use serde::{Deserialize, Serialize};

use flowdex_types::{
    CompositeKey, EventPosition, FlowUpdateEvent, Stream, StreamActivity, StreamRevision,
};

/// Every write implied by one applied event.
///
/// The store must commit all of it or none of it: a reader seeing the
/// stream upsert without the activity append (or either without the cursor
/// advance) is a correctness violation. The full incoming event rides along
/// as provenance: it is what the durable journal persists, so recovery and
/// rollback never have to reconstruct inputs from outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteSet {
    /// Composite key the event reduced under.
    pub key: CompositeKey,
    /// Position that becomes the key's new cursor.
    pub position: EventPosition,
    /// The triggering event, verbatim.
    pub event: FlowUpdateEvent,
    /// Upserted current-state record.
    pub stream: Stream,
    /// Revision record after any increment.
    pub revision: StreamRevision,
    /// Appended activity record.
    pub activity: StreamActivity,
    /// Set when the reduction was legal but suspicious (see [`Anomaly`]).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub anomaly: Option<Anomaly>,
}

/// Legal-but-suspicious reductions, surfaced for logging rather than fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anomaly {
    /// A zero-rate event arrived for a stream id with no prior record, so a
    /// closed stream was created and immediately retired. Either the flow
    /// was opened and closed in one transition, or a prior record went
    /// missing; the input shape cannot distinguish the two.
    CloseWithoutPriorStream,
}
