//! Delta log blocks and their on-disk framing

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::{Record, Schema, Value};

/// Frame header: CRC32 (4) + Len (4)
pub const FRAME_HEADER_SIZE: usize = 8;

/// Key removed by a delete block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteKey {
    pub key: String,
    pub partition_path: String,
    pub ordering_value: Value,
}

impl DeleteKey {
    pub fn new(key: impl Into<String>, partition_path: impl Into<String>, ordering_value: Value) -> Self {
        Self {
            key: key.into(),
            partition_path: partition_path.into(),
            ordering_value,
        }
    }

    pub fn into_record(self) -> Record {
        Record::delete(self.key, self.partition_path, self.ordering_value)
    }
}

/// A unit appended to a delta log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogBlock {
    /// Inserted or updated records, written with `schema`
    Data { schema: Schema, records: Vec<Record> },

    /// Deleted keys
    Delete { keys: Vec<DeleteKey> },
}

impl LogBlock {
    /// Encode as `[crc32][len][bincode payload]`
    pub fn encode(&self) -> Result<Bytes> {
        let payload = bincode::serialize(self)?;
        let mut frame = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
        frame.put_u32_le(crc32fast::hash(&payload));
        frame.put_u32_le(payload.len() as u32);
        frame.put_slice(&payload);
        Ok(frame.freeze())
    }
}

/// Outcome of reading one frame
#[derive(Debug)]
pub enum Frame {
    Block(LogBlock),

    /// Complete frame whose checksum or payload is bad
    Corrupt { offset: u64, reason: String },

    /// Frame cut short by the end of the file (partial write)
    Truncated { offset: u64 },
}

/// Splits the contents of a log file into frames
pub struct FrameReader {
    buf: Bytes,
    offset: u64,
    done: bool,
}

impl FrameReader {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self {
            buf: buf.into(),
            offset: 0,
            done: false,
        }
    }
}

impl Iterator for FrameReader {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.done || !self.buf.has_remaining() {
            return None;
        }

        let offset = self.offset;
        if self.buf.remaining() < FRAME_HEADER_SIZE {
            self.done = true;
            return Some(Frame::Truncated { offset });
        }

        let expected_crc = self.buf.get_u32_le();
        let len = self.buf.get_u32_le() as usize;
        if self.buf.remaining() < len {
            self.done = true;
            return Some(Frame::Truncated { offset });
        }

        let payload = self.buf.split_to(len);
        self.offset += (FRAME_HEADER_SIZE + len) as u64;

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            return Some(Frame::Corrupt {
                offset,
                reason: format!(
                    "CRC mismatch: expected {:#010x}, got {:#010x}",
                    expected_crc, actual_crc
                ),
            });
        }

        match bincode::deserialize::<LogBlock>(&payload) {
            Ok(block) => Some(Frame::Block(block)),
            Err(e) => Some(Frame::Corrupt {
                offset,
                reason: e.to_string(),
            }),
        }
    }
}
