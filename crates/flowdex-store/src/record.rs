//! Journal record framing.

use bytes::Bytes;

use crate::StoreError;

/// A single framed record in the write-ahead journal.
///
/// Records are the on-disk representation of committed write sets. Each
/// record carries its commit sequence number and is serialized with a CRC32
/// checksum for corruption detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalRecord {
    seq: u64,
    payload: Bytes,
}

impl JournalRecord {
    /// Creates a new record with the given sequence number and payload.
    pub fn new(seq: u64, payload: Bytes) -> Self {
        Self { seq, payload }
    }

    /// Returns the commit sequence number of this record.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns the payload of this record.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Serializes the record to bytes.
    ///
    /// Format: `[seq:u64][length:u32][payload][crc32:u32]`, little-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(16 + self.payload.len());

        buf.extend_from_slice(&self.seq.to_le_bytes());
        buf.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.payload);

        // checksum of everything above
        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());

        buf
    }

    /// Deserializes a record from bytes.
    ///
    /// Returns the parsed record and the number of bytes consumed. The
    /// payload is a zero-copy [`Bytes::slice`].
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnexpectedEof`] if the data is truncated
    /// - [`StoreError::Corrupted`] if the CRC doesn't match
    pub fn from_bytes(data: &Bytes) -> Result<(Self, usize), StoreError> {
        // Need at least header: seq(8) + len(4) = 12 bytes
        if data.len() < 12 {
            return Err(StoreError::UnexpectedEof);
        }

        let seq = u64::from_le_bytes(data[0..8].try_into().expect("8-byte slice"));
        let length = u32::from_le_bytes(data[8..12].try_into().expect("4-byte slice")) as usize;

        let total_size = 12 + length + 4;
        if data.len() < total_size {
            return Err(StoreError::UnexpectedEof);
        }

        let payload = data.slice(12..12 + length);

        let stored_crc =
            u32::from_le_bytes(data[12 + length..total_size].try_into().expect("4-byte slice"));
        let computed_crc = crc32fast::hash(&data[0..12 + length]);

        if stored_crc != computed_crc {
            return Err(StoreError::Corrupted {
                seq,
                reason: "CRC mismatch",
            });
        }

        Ok((JournalRecord { seq, payload }, total_size))
    }
}
