//! Delta Log Module
//!
//! Append-only change logs overlaid on a base file, and the scanner that
//! turns them into a pending-change index.
//!
//! ## Responsibilities
//! - Frame blocks with CRC32 checksums for corruption detection
//! - Fold inserts, updates and deletes into one pending record per key
//! - Own the index and the wrapping policy handed to the slice reader
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Block 1                                 │
//! │ ┌─────────┬─────────┬─────────────────┐ │
//! │ │ CRC (4) │ Len (4) │ bincode LogBlock│ │
//! │ └─────────┴─────────┴─────────────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Block 2                                 │
//! │ ┌─────────┬─────────┬─────────────────┐ │
//! │ │ CRC (4) │ Len (4) │ bincode LogBlock│ │
//! │ └─────────┴─────────┴─────────────────┘ │
//! └─────────────────────────────────────────┘
//! ```

mod block;
mod scanner;
mod writer;

use crate::error::Result;
use crate::index::PendingChangeIndex;

pub use block::{DeleteKey, Frame, FrameReader, LogBlock, FRAME_HEADER_SIZE};
pub use scanner::{DeltaLogScanner, ScanStats};
pub use writer::DeltaLogWriter;

/// Owner of a slice's pending changes, as seen by the slice reader
pub trait LogScanner {
    /// The fully built index; the reader pops and drains it
    fn records(&mut self) -> &mut PendingChangeIndex;

    /// Whether emitted records take their operation from the `_operation` column
    fn is_with_operation_field(&self) -> bool;

    /// Partition path forced onto every emitted record
    fn partition_name_override(&self) -> Option<&str>;

    /// Release backing resources. Safe to call more than once.
    fn close(&mut self) -> Result<()>;
}
