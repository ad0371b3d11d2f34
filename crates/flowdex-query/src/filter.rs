//! Query filters, ordering, and pagination.

use flowdex_types::{Address, Stream, StreamActivity, StreamId};

/// Filter over stream records. All set conditions must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamFilter {
    /// Only streams paying from this account.
    pub sender: Option<Address>,
    /// Only streams paying to this account.
    pub receiver: Option<Address>,
    /// Only streams of this token.
    pub token: Option<Address>,
    /// `Some(true)` keeps only closed streams, `Some(false)` only open ones.
    pub flow_rate_is_zero: Option<bool>,
}

impl StreamFilter {
    /// Matches everything.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_receiver(mut self, receiver: Address) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn with_token(mut self, token: Address) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_flow_rate_is_zero(mut self, is_zero: bool) -> Self {
        self.flow_rate_is_zero = Some(is_zero);
        self
    }

    /// Evaluates the filter against a stream record.
    pub fn matches(&self, stream: &Stream) -> bool {
        if let Some(sender) = self.sender {
            if stream.sender != sender {
                return false;
            }
        }
        if let Some(receiver) = self.receiver {
            if stream.receiver != receiver {
                return false;
            }
        }
        if let Some(token) = self.token {
            if stream.token != token {
                return false;
            }
        }
        if let Some(is_zero) = self.flow_rate_is_zero {
            if stream.flow_rate.is_zero() != is_zero {
                return false;
            }
        }
        true
    }
}

/// Filter over activity records. All set conditions must match.
///
/// The participant condition needs no table join: a stream id carries its
/// sender and receiver structurally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    /// Only activities of this stream.
    pub stream_id: Option<StreamId>,
    /// Only activities whose stream involves this account on either side.
    pub participant: Option<Address>,
}

impl ActivityFilter {
    /// Matches everything.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_stream_id(mut self, stream_id: StreamId) -> Self {
        self.stream_id = Some(stream_id);
        self
    }

    pub fn with_participant(mut self, participant: Address) -> Self {
        self.participant = Some(participant);
        self
    }

    /// Evaluates the filter against an activity record.
    pub fn matches(&self, activity: &StreamActivity) -> bool {
        if let Some(stream_id) = self.stream_id {
            if activity.stream_id != stream_id {
                return false;
            }
        }
        if let Some(participant) = self.participant {
            if activity.stream_id.sender != participant
                && activity.stream_id.receiver != participant
            {
                return false;
            }
        }
        true
    }
}

/// Scan direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOrder {
    /// Ascending order.
    #[default]
    Ascending,
    /// Descending order.
    Descending,
}

/// Sort key for stream listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamOrder {
    /// Order by creation time.
    #[default]
    CreatedAt,
    /// Order by last update time.
    UpdatedAt,
}

/// Offset/limit pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Records to skip.
    pub offset: usize,
    /// Maximum records to return.
    pub limit: usize,
}

impl Page {
    /// Default page size when callers don't say otherwise.
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// First page at the default size.
    pub fn first() -> Self {
        Self::default()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}
