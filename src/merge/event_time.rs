//! Event-time ordering merge

use crate::error::Result;
use crate::record::{Record, SchemaRef};

use super::{older_wins, MergeConfig, MergeFunction, OverwriteWithLatest};

/// Keeps whichever record has the larger ordering value. Ties go to the
/// newer record, and so does everything when no ordering field is set.
///
/// A delete only takes effect when it wins the comparison, so a late-arriving
/// delete with a stale ordering value leaves the older record in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventTimeOrdering;

impl MergeFunction for EventTimeOrdering {
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
        OverwriteWithLatest.merge(older, older_schema, newer, newer_schema, config)
    }
}
