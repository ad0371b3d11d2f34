//! # flowdex-types: Core types for flowdex
//!
//! This crate contains shared types used across the flowdex system:
//! - Chain primitives ([`Address`], [`TxHash`], [`FlowRate`], [`BlockNumber`],
//!   [`LogIndex`], [`Timestamp`], [`EventPosition`])
//! - Identity types ([`PairHash`], [`CompositeKey`], [`StreamId`],
//!   [`ActivityId`])
//! - The input event shape ([`FlowUpdateEvent`])
//! - Derived entities ([`Stream`], [`StreamRevision`], [`StreamActivity`])
//!
//! Identifier display forms are dash-joined hex, e.g. a stream id renders as
//! `0x{sender}-0x{receiver}-0x{token}-{revision}`. The display form is what
//! external consumers see; internally every identifier is structural, so
//! equality and ordering never go through strings.

use std::fmt::{self, Debug, Display};
use std::num::ParseIntError;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Parse errors
// ============================================================================

/// Errors from parsing the textual form of an identifier.
#[derive(thiserror::Error, Debug)]
pub enum TypeParseError {
    /// Wrong number of hex characters for the target width.
    #[error("invalid length: expected {expected} hex characters, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// Not valid hexadecimal.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The dash-joined shape didn't match.
    #[error("malformed identifier: {0}")]
    MalformedId(&'static str),

    /// A decimal component (revision, log index) didn't parse.
    #[error("invalid number: {0}")]
    InvalidNumber(#[from] ParseIntError),
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], TypeParseError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.len() != N * 2 {
        return Err(TypeParseError::InvalidLength {
            expected: N * 2,
            got: s.len(),
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(s, &mut out)?;
    Ok(out)
}

// ============================================================================
// Address - Copy (20-byte account or token identifier)
// ============================================================================

/// A 20-byte account or token address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true for the all-zero address, which no well-formed event
    /// carries as a participant or token.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl From<[u8; 20]> for Address {
    fn from(value: [u8; 20]) -> Self {
        Self(value)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(decode_fixed::<20>(s)?))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

// ============================================================================
// TxHash - Copy (32-byte transaction hash)
// ============================================================================

/// A 32-byte transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for TxHash {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl FromStr for TxHash {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(decode_fixed::<32>(s)?))
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

// ============================================================================
// FlowRate - Copy (signed units per second, 0 == closed)
// ============================================================================

/// Signed token units per second. Zero means the stream is closed.
///
/// Serialized as a decimal string: rates are 256-bit on the wire and the
/// consumers of this data (GraphQL-shaped dashboards) already treat big
/// integers as strings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FlowRate(i128);

impl FlowRate {
    pub const ZERO: FlowRate = FlowRate(0);

    pub const fn new(rate: i128) -> Self {
        Self(rate)
    }

    pub const fn as_i128(&self) -> i128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<i128> for FlowRate {
    fn from(value: i128) -> Self {
        Self(value)
    }
}

impl From<FlowRate> for i128 {
    fn from(rate: FlowRate) -> Self {
        rate.0
    }
}

impl Display for FlowRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for FlowRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlowRate({})", self.0)
    }
}

impl Serialize for FlowRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FlowRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<i128>().map(Self).map_err(D::Error::custom)
    }
}

// ============================================================================
// Event coordinates - all Copy
// ============================================================================

/// Height of the block that carried an event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct BlockNumber(u64);

impl BlockNumber {
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for BlockNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an event's log within its block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct LogIndex(u64);

impl LogIndex {
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for LogIndex {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for LogIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unix timestamp in seconds, as reported by the block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Total order of events on one chain: block height first, log index second.
///
/// The derived `Ord` is lexicographic over the declared field order, which
/// is exactly the `(blockNumber, logIndex)` ordering the reducer's
/// per-composite-key contract is stated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPosition {
    pub block_number: BlockNumber,
    pub log_index: LogIndex,
}

impl EventPosition {
    pub const fn new(block_number: BlockNumber, log_index: LogIndex) -> Self {
        Self {
            block_number,
            log_index,
        }
    }
}

impl Display for EventPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.block_number, self.log_index)
    }
}

// ============================================================================
// PairHash / CompositeKey - identity of a (sender, receiver, token) triple
// ============================================================================

/// 32-byte hash of the `(sender, receiver)` tuple.
///
/// Derivation lives in `flowdex-crypto`; this crate only carries the value.
/// Keeping the pair hash separate from the token suffix means "all tokens
/// flowing between this pair" is a prefix lookup over composite keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairHash([u8; 32]);

impl PairHash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for PairHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for PairHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PairHash({self})")
    }
}

impl FromStr for PairHash {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(decode_fixed::<32>(s)?))
    }
}

impl Serialize for PairHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PairHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Revision-independent identity of one sender→receiver→token relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeKey {
    pub pair_hash: PairHash,
    pub token: Address,
}

impl CompositeKey {
    pub const fn new(pair_hash: PairHash, token: Address) -> Self {
        Self { pair_hash, token }
    }
}

impl Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.pair_hash, self.token)
    }
}

// ============================================================================
// StreamId / ActivityId - structural, displayed as dash-joined hex
// ============================================================================

/// Canonical identifier of one life of a stream.
///
/// A stream id is a deterministic composition, not a hash: it stays
/// human-traceable to `(sender, receiver, token, revisionIndex)`, and a
/// re-open between the same parties gets a fresh id purely by carrying the
/// incremented revision index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub sender: Address,
    pub receiver: Address,
    pub token: Address,
    pub revision_index: u64,
}

impl StreamId {
    pub const fn new(sender: Address, receiver: Address, token: Address, revision_index: u64) -> Self {
        Self {
            sender,
            receiver,
            token,
            revision_index,
        }
    }
}

impl Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.sender, self.receiver, self.token, self.revision_index
        )
    }
}

impl Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamId({self})")
    }
}

impl FromStr for StreamId {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        let (Some(sender), Some(receiver), Some(token), Some(revision), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(TypeParseError::MalformedId(
                "stream id must have four dash-joined parts",
            ));
        };
        Ok(Self {
            sender: sender.parse()?,
            receiver: receiver.parse()?,
            token: token.parse()?,
            revision_index: revision.parse()?,
        })
    }
}

impl Serialize for StreamId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StreamId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Identifier of one activity record: `(streamId, txHash, logIndex)`.
///
/// Never reused; a transaction can touch the same stream more than once and
/// each touch lands on a distinct log index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActivityId {
    pub stream_id: StreamId,
    pub tx_hash: TxHash,
    pub log_index: LogIndex,
}

impl ActivityId {
    pub const fn new(stream_id: StreamId, tx_hash: TxHash, log_index: LogIndex) -> Self {
        Self {
            stream_id,
            tx_hash,
            log_index,
        }
    }
}

impl Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.stream_id, self.tx_hash, self.log_index)
    }
}

impl Debug for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActivityId({self})")
    }
}

impl FromStr for ActivityId {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 6 {
            return Err(TypeParseError::MalformedId(
                "activity id must have six dash-joined parts",
            ));
        }
        let stream_id = parts[..4].join("-").parse()?;
        Ok(Self {
            stream_id,
            tx_hash: parts[4].parse()?,
            log_index: LogIndex::new(parts[5].parse()?),
        })
    }
}

impl Serialize for ActivityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActivityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

// ============================================================================
// ActivityType
// ============================================================================

/// Classification of one state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityType {
    /// First event recorded against a stream id.
    Create,
    /// Rate change on a live stream.
    Update,
    /// Transition into a zero rate on a live stream.
    Delete,
}

impl Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityType::Create => write!(f, "CREATE"),
            ActivityType::Update => write!(f, "UPDATE"),
            ActivityType::Delete => write!(f, "DELETE"),
        }
    }
}

// ============================================================================
// FlowUpdateEvent - the one input shape
// ============================================================================

/// One flow-rate update, as delivered by the chain follower.
///
/// Events that causally matter to the same composite key must arrive in
/// non-decreasing `(blockNumber, logIndex)` order; that precondition is
/// enforced by the reducer, not assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowUpdateEvent {
    pub token: Address,
    pub sender: Address,
    pub receiver: Address,
    pub flow_rate: FlowRate,
    pub block_number: BlockNumber,
    pub log_index: LogIndex,
    pub tx_hash: TxHash,
    pub timestamp: Timestamp,
}

impl FlowUpdateEvent {
    /// The event's coordinates in the chain's total order.
    pub fn position(&self) -> EventPosition {
        EventPosition::new(self.block_number, self.log_index)
    }
}

// ============================================================================
// Derived entities
// ============================================================================

/// Current aggregate state of one life of a sender→receiver flow.
///
/// Never deleted: a closed stream keeps `flow_rate = 0`, and the next open
/// between the same parties materializes a new record under a new id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub id: StreamId,
    pub sender: Address,
    pub receiver: Address,
    pub token: Address,
    pub flow_rate: FlowRate,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Stream {
    /// Creates the record for a stream id seen for the first time.
    pub fn created(id: StreamId, flow_rate: FlowRate, at: Timestamp) -> Self {
        Self {
            id,
            sender: id.sender,
            receiver: id.receiver,
            token: id.token,
            flow_rate,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Per-composite-key counter controlling identity continuity.
///
/// The identity triple is stored alongside the counter: composite keys are
/// hash-derived, and a key whose stored triple disagrees with an incoming
/// event's triple is unrecoverable corruption, not a state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRevision {
    pub composite_key: CompositeKey,
    pub sender: Address,
    pub receiver: Address,
    pub token: Address,
    pub revision_index: u64,
    pub most_recent_stream_id: StreamId,
}

impl StreamRevision {
    /// The record synthesized on first contact with a composite key.
    ///
    /// `most_recent_stream_id` starts at revision 0 for the same triple;
    /// the reducer overwrites it on every applied event.
    pub fn initial(
        composite_key: CompositeKey,
        sender: Address,
        receiver: Address,
        token: Address,
    ) -> Self {
        Self {
            composite_key,
            sender,
            receiver,
            token,
            revision_index: 0,
            most_recent_stream_id: StreamId::new(sender, receiver, token, 0),
        }
    }
}

/// Immutable record of one state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamActivity {
    pub id: ActivityId,
    pub stream_id: StreamId,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub flow_rate: FlowRate,
    pub tx_hash: TxHash,
    pub timestamp: Timestamp,
    pub position: EventPosition,
}
