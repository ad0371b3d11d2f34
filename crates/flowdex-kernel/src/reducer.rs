//! The reduction function: one event in, one atomic write set out.

use flowdex_crypto::composite_key;
use flowdex_types::{
    ActivityId, ActivityType, Address, CompositeKey, EventPosition, FlowUpdateEvent, Stream,
    StreamActivity, StreamId, StreamRevision,
};

use crate::view::StateView;
use crate::write_set::{Anomaly, WriteSet};

/// Result of reducing one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event mutated state; commit the write set atomically.
    Applied(WriteSet),
    /// The event's `(txHash, logIndex)` was already recorded. Redelivery
    /// under at-least-once transport is expected; treat as success.
    AlreadyApplied,
}

impl Outcome {
    /// Returns the write set if the event was applied.
    pub fn into_write_set(self) -> Option<WriteSet> {
        match self {
            Outcome::Applied(write_set) => Some(write_set),
            Outcome::AlreadyApplied => None,
        }
    }
}

/// Errors that reject an event before any state is touched.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReduceError {
    /// A participant or token field carries the zero address.
    #[error("event at {position} has a zero {field} address")]
    ZeroAddress {
        field: &'static str,
        position: EventPosition,
    },

    /// Sender and receiver are the same account.
    #[error("event at {position} streams from {account} to itself")]
    SelfFlow {
        account: Address,
        position: EventPosition,
    },

    /// The event is at or behind the composite key's applied cursor without
    /// being a duplicate. Applying it would corrupt the classification and
    /// the revision counter, so it is refused outright.
    #[error("event at {incoming} is behind the applied cursor {cursor} for key {key}")]
    OrderingViolation {
        key: CompositeKey,
        cursor: EventPosition,
        incoming: EventPosition,
    },

    /// The stored revision record for this composite key belongs to a
    /// different `(sender, receiver, token)` triple. Two triples hashed to
    /// one key: unrecoverable corruption, never retried.
    #[error("revision record for key {key} belongs to a different (sender, receiver, token) triple")]
    IdentityCollision { key: CompositeKey },
}

/// Validates an event's shape before reduction.
///
/// Typed fields cannot be absent, so malformation here means non-canonical
/// content: zero addresses, or a self-flow no upstream contract can emit.
/// Rejected events must not be retried; the same bytes fail the same way.
pub fn validate(event: &FlowUpdateEvent) -> Result<(), ReduceError> {
    let position = event.position();
    for (field, address) in [
        ("sender", event.sender),
        ("receiver", event.receiver),
        ("token", event.token),
    ] {
        if address.is_zero() {
            return Err(ReduceError::ZeroAddress { field, position });
        }
    }
    if event.sender == event.receiver {
        return Err(ReduceError::SelfFlow {
            account: event.sender,
            position,
        });
    }
    Ok(())
}

/// Classifies a transition from the stored record and the incoming rate.
///
/// Existence decides CREATE; only then does the *incoming* rate split
/// DELETE from UPDATE. A zero rate on a missing record is still a CREATE:
/// opening and instantly closing a flow in one event is representable.
pub fn classify(existing: Option<&Stream>, event: &FlowUpdateEvent) -> ActivityType {
    match existing {
        None => ActivityType::Create,
        Some(_) if event.flow_rate.is_zero() => ActivityType::Delete,
        Some(_) => ActivityType::Update,
    }
}

/// Reduces one event against the current state.
///
/// Pure and synchronous: reads go through `view`, every write comes back in
/// the [`WriteSet`], and the caller owns both the per-key mutual exclusion
/// around this call and the atomic commit of the result.
///
/// # Errors
///
/// - [`ReduceError::ZeroAddress`] / [`ReduceError::SelfFlow`]: malformed
///   event, nothing applied.
/// - [`ReduceError::OrderingViolation`]: the event is behind its key's
///   cursor and is not a recorded duplicate.
/// - [`ReduceError::IdentityCollision`]: composite key corruption; fatal.
pub fn reduce(view: &impl StateView, event: &FlowUpdateEvent) -> Result<Outcome, ReduceError> {
    validate(event)?;

    let key = composite_key(event.sender, event.receiver, event.token);
    let position = event.position();

    // Duplicate delivery is checked before ordering: a redelivered old
    // event sits behind the cursor and must still be a quiet no-op.
    if view.applied(&event.tx_hash, event.log_index) {
        return Ok(Outcome::AlreadyApplied);
    }

    if let Some(cursor) = view.cursor(&key) {
        if position <= cursor {
            return Err(ReduceError::OrderingViolation {
                key,
                cursor,
                incoming: position,
            });
        }
    }

    let mut revision = match view.revision(&key) {
        Some(revision) => {
            if revision.sender != event.sender
                || revision.receiver != event.receiver
                || revision.token != event.token
            {
                return Err(ReduceError::IdentityCollision { key });
            }
            revision
        }
        None => StreamRevision::initial(key, event.sender, event.receiver, event.token),
    };

    // The current event always lands on the pre-increment id.
    let stream_id = StreamId::new(
        event.sender,
        event.receiver,
        event.token,
        revision.revision_index,
    );

    let existing = view.stream(&stream_id);
    let activity_type = classify(existing.as_ref(), event);

    // A closing event retires the id, whatever it was classified as: the
    // next open between this triple starts a new life.
    if event.flow_rate.is_zero() {
        revision.revision_index += 1;
    }
    revision.most_recent_stream_id = stream_id;

    let stream = match existing {
        None => Stream::created(stream_id, event.flow_rate, event.timestamp),
        Some(mut stream) => {
            stream.flow_rate = event.flow_rate;
            stream.updated_at = event.timestamp;
            stream
        }
    };

    let activity = StreamActivity {
        id: ActivityId::new(stream_id, event.tx_hash, event.log_index),
        stream_id,
        activity_type,
        flow_rate: event.flow_rate,
        tx_hash: event.tx_hash,
        timestamp: event.timestamp,
        position,
    };

    let anomaly = (activity_type == ActivityType::Create && event.flow_rate.is_zero())
        .then_some(Anomaly::CloseWithoutPriorStream);

    // Postcondition: the activity is recorded against the same life the
    // stream upsert touches.
    debug_assert_eq!(activity.stream_id, stream.id);

    Ok(Outcome::Applied(WriteSet {
        key,
        position,
        event: *event,
        stream,
        revision,
        activity,
        anomaly,
    }))
}
