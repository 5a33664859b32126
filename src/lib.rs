//! # fileslice
//!
//! Merge-on-read reader for a table-format file slice:
//! - Streams a compacted base file without materializing it
//! - Resolves every base record against pending delta-log changes
//! - Pluggable merge functions (overwrite, event-time, partial update)
//! - Exactly-once emission, deletes suppressed
//! - Deterministic close of every underlying resource
//!
//! ## Architecture Overview
//!
//! ```text
//!   ┌─────────────┐                    ┌─────────────┐
//!   │  Base File  │                    │ Delta Logs  │
//!   │  (cursor)   │                    │  (blocks)   │
//!   └──────┬──────┘                    └──────┬──────┘
//!          │                                  │
//!          │                                  ▼
//!          │                          ┌───────────────┐
//!          │                          │  Log Scanner  │
//!          │                          │ (fold/merge)  │
//!          │                          └──────┬────────┘
//!          │                                  │
//!          │                                  ▼
//!          │                       ┌─────────────────────┐
//!          │                       │ PendingChangeIndex  │
//!          │                       │  (pop / drain)      │
//!          │                       └──────────┬──────────┘
//!          │                                  │
//! ┌────────▼──────────────────────────────────▼─────────────────┐
//! │                        SliceReader                           │
//! │     base phase: pop + merge(older=base, newer=pending)       │
//! │     tail phase: drain remaining pending changes              │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//!                                ▼
//!                        merged records
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod key;
pub mod merge;
pub mod index;
pub mod sequence;
pub mod base;
pub mod log;
pub mod reader;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, SliceError};
pub use config::Config;
pub use record::{Record, Schema, SchemaRef, Value};
pub use merge::{MergeFunction, MergeMode};
pub use index::PendingChangeIndex;
pub use sequence::LazySequence;
pub use base::{BaseFileReader, RecordCursor};
pub use log::LogScanner;
pub use reader::SliceReader;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of fileslice
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
