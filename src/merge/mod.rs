//! Merge Module
//!
//! Pluggable functions combining an older and a newer record for one key.
//!
//! ## Contract
//! - `older` is always the base-file (or earlier log) record, `newer` the
//!   pending change; the functions are not symmetric
//! - `Ok(None)` means the key is logically deleted
//! - Pure: no side effects, no retained state between calls
//!
//! ## Variants
//! - [`OverwriteWithLatest`]: newer always wins
//! - [`EventTimeOrdering`]: the larger ordering value wins, ties go to newer
//! - [`PartialUpdate`]: like event-time, but non-null newer columns are
//!   applied on top of the older row

mod event_time;
mod overwrite;
mod partial;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SliceError};
use crate::record::{Record, SchemaRef};

pub use event_time::EventTimeOrdering;
pub use overwrite::OverwriteWithLatest;
pub use partial::PartialUpdate;

/// Options handed to every merge call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeConfig {
    /// Column used to break ties by recency; `None` prefers newer
    pub ordering_field: Option<String>,
}

impl MergeConfig {
    pub fn new(ordering_field: Option<String>) -> Self {
        Self { ordering_field }
    }
}

/// Combines two records with the same key
pub trait MergeFunction: fmt::Debug + Send + Sync {
    fn merge(
        &self,
        older: &Record,
        older_schema: &SchemaRef,
        newer: &Record,
        newer_schema: &SchemaRef,
        config: &MergeConfig,
    ) -> Result<Option<(Record, SchemaRef)>>;
}

/// Selects a merge function by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    OverwriteWithLatest,
    EventTimeOrdering,
    PartialUpdate,
}

impl MergeMode {
    pub fn merger(&self) -> Box<dyn MergeFunction> {
        match self {
            MergeMode::OverwriteWithLatest => Box::new(OverwriteWithLatest),
            MergeMode::EventTimeOrdering => Box::new(EventTimeOrdering),
            MergeMode::PartialUpdate => Box::new(PartialUpdate),
        }
    }
}

impl FromStr for MergeMode {
    type Err = SliceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "overwrite" => Ok(MergeMode::OverwriteWithLatest),
            "event-time" => Ok(MergeMode::EventTimeOrdering),
            "partial" => Ok(MergeMode::PartialUpdate),
            other => Err(SliceError::Config(format!(
                "Unknown merge mode '{}' (expected overwrite, event-time or partial)",
                other
            ))),
        }
    }
}

/// True when `older` must be kept because its ordering value is strictly
/// greater than `newer`'s. Always false without an ordering field.
pub(crate) fn older_wins(older: &Record, newer: &Record, config: &MergeConfig) -> Result<bool> {
    let Some(field) = config.ordering_field.as_deref() else {
        return Ok(false);
    };

    let ordering = older
        .ordering_value(Some(field))
        .compare_ordering(newer.ordering_value(Some(field)))
        .map_err(|e| SliceError::Merge(format!("key '{}': {}", newer.key(), e)))?;

    Ok(ordering == Ordering::Greater)
}
