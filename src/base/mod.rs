//! Base File Module
//!
//! Compacted, immutable snapshot of a slice, read sequentially.
//!
//! ## Responsibilities
//! - Define the cursor / reader contracts the slice reader consumes
//! - Provide an on-disk implementation and an in-memory one
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "FSBF" (4) | Version: u16 (2) | Count: u64 (8) │
//! ├─────────────────────────────────────────────────────────┤
//! │ Schema Block                                            │
//! │   [Len: u32][bincode Schema]                            │
//! ├─────────────────────────────────────────────────────────┤
//! │ Data Block (variable)                                   │
//! │   [Len: u32][CRC32: u32][bincode Record]                │
//! │   ... repeated for each record, in file order ...       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (16 bytes)                                       │
//! │   DataEnd: u64 (8) | DataCRC: u32 (4) | Padding (4)     │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod cursor;
mod memory;
mod reader;
mod writer;

use crate::error::Result;
use crate::record::{Record, SchemaRef};

pub use cursor::BaseFileCursor;
pub use memory::{MemoryBaseReader, VecCursor};
pub use reader::BaseFile;
pub use writer::{BaseFileMeta, BaseFileWriter};

// =============================================================================
// Shared Constants (used by writer, reader, cursor)
// =============================================================================

/// Magic bytes identifying a base file
pub(crate) const MAGIC: &[u8; 4] = b"FSBF";

/// Current base file format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + EntryCount (8) = 14 bytes
pub(crate) const HEADER_SIZE: u64 = 14;

/// Footer size: DataEnd (8) + DataCRC (4) + Padding (4) = 16 bytes
pub(crate) const FOOTER_SIZE: u64 = 16;

/// Per-record frame header: Len (4) + CRC32 (4)
pub(crate) const ENTRY_HEADER_SIZE: u64 = 8;

// =============================================================================
// Collaborator Contracts
// =============================================================================

/// One-directional, closable sequence over base-file records in file order
pub trait RecordCursor: Iterator<Item = Result<Record>> {
    /// Release the cursor. Safe to call more than once.
    fn close(&mut self) -> Result<()>;
}

/// Produces cursors over a base file
pub trait BaseFileReader {
    fn record_cursor(&mut self, schema: &SchemaRef) -> Result<Box<dyn RecordCursor>>;

    /// Release the reader. Safe to call more than once.
    fn close(&mut self) -> Result<()>;
}
