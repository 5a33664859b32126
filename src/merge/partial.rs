//! Partial-update merge

use crate::error::Result;
use crate::record::{Record, SchemaRef};

use super::{older_wins, MergeConfig, MergeFunction};

/// Applies every non-null column of the newer record on top of the older
/// row. Ordering and deletes behave as in
/// [`EventTimeOrdering`](super::EventTimeOrdering).
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialUpdate;

impl MergeFunction for PartialUpdate {
    fn merge(
        &self,
        older: &Record,
        older_schema: &SchemaRef,
        newer: &Record,
        newer_schema: &SchemaRef,
        config: &MergeConfig,
    ) -> Result<Option<(Record, SchemaRef)>> {
        if older_wins(older, newer, config)? {
            return Ok(Some((older.clone(), older_schema.clone())));
        }
        if newer.is_delete() {
            return Ok(None);
        }

        let (Some(older_row), Some(newer_row)) = (older.row(), newer.row()) else {
            return Ok(Some((newer.clone(), newer_schema.clone())));
        };

        let mut row = older_row.clone();
        for (name, value) in newer_row.iter().filter(|(_, v)| !v.is_null()) {
            row.insert(name.clone(), value.clone());
        }

        Ok(Some((newer.with_row(row), newer_schema.clone())))
    }
}
