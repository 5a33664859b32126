//! Overwrite-with-latest merge

use crate::error::Result;
use crate::record::{Record, SchemaRef};

use super::{MergeConfig, MergeFunction};

/// The newer record always replaces the older one
#[derive(Debug, Clone, Copy, Default)]
pub struct OverwriteWithLatest;

impl MergeFunction for OverwriteWithLatest {
    fn merge(
        &self,
        _older: &Record,
        _older_schema: &SchemaRef,
        newer: &Record,
        newer_schema: &SchemaRef,
        _config: &MergeConfig,
    ) -> Result<Option<(Record, SchemaRef)>> {
        if newer.is_delete() {
            return Ok(None);
        }
        Ok(Some((newer.clone(), newer_schema.clone())))
    }
}
