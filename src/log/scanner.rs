//! Delta Log Scanner
//!
//! Reads delta logs oldest → newest and folds their records into a
//! [`PendingChangeIndex`].

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, SliceError};
use crate::index::PendingChangeIndex;
use crate::merge::{MergeConfig, MergeFunction};
use crate::record::{Record, Schema, SchemaRef};

use super::block::{Frame, FrameReader, LogBlock};
use super::LogScanner;

/// Statistics gathered while scanning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub files_scanned: u64,
    pub blocks_read: u64,
    pub records_read: u64,
    pub deletes_read: u64,
    /// Blocks skipped because of a bad checksum or payload
    pub corrupt_blocks: u64,
    /// Files ending in a partially written block
    pub truncated_files: u64,
}

/// Builds and owns the pending-change index of a slice
#[derive(Debug)]
pub struct DeltaLogScanner {
    index: PendingChangeIndex,
    /// Schema of the most recent data block
    schema: Option<SchemaRef>,
    merger: Box<dyn MergeFunction>,
    merge_config: MergeConfig,
    with_operation_field: bool,
    partition_name_override: Option<String>,
    stats: ScanStats,
    closed: bool,
}

impl DeltaLogScanner {
    fn new(config: &Config) -> Self {
        Self {
            index: PendingChangeIndex::new(),
            schema: None,
            merger: config.merge_mode.merger(),
            merge_config: MergeConfig::new(config.ordering_field.clone()),
            with_operation_field: config.with_operation_field,
            partition_name_override: config.partition_name_override.clone(),
            stats: ScanStats::default(),
            closed: false,
        }
    }

    /// Scan `paths` in order; later files hold newer changes
    pub fn scan<P: AsRef<Path>>(paths: &[P], config: &Config) -> Result<Self> {
        let mut scanner = Self::new(config);
        for path in paths {
            scanner.scan_file(path.as_ref())?;
        }

        debug!(
            files = scanner.stats.files_scanned,
            blocks = scanner.stats.blocks_read,
            records = scanner.stats.records_read,
            deletes = scanner.stats.deletes_read,
            corrupt = scanner.stats.corrupt_blocks,
            pending = scanner.index.len(),
            "Delta log scan complete"
        );
        Ok(scanner)
    }

    /// Build a scanner from already-decoded changes, oldest first
    pub fn from_records<I>(records: I, schema: SchemaRef, config: &Config) -> Result<Self>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut scanner = Self::new(config);
        for record in records {
            scanner.stats.records_read += 1;
            scanner.fold(record, &schema)?;
        }
        scanner.schema = Some(schema);
        Ok(scanner)
    }

    /// Schema of the most recent data block, if any was read
    pub fn schema(&self) -> Option<&SchemaRef> {
        self.schema.as_ref()
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn scan_file(&mut self, path: &Path) -> Result<()> {
        let data = fs::read(path)?;
        self.stats.files_scanned += 1;

        for frame in FrameReader::new(data) {
            match frame {
                Frame::Block(block) => self.apply_block(block)?,
                Frame::Corrupt { offset, reason } => {
                    warn!(path = %path.display(), offset, %reason, "Skipping corrupt log block");
                    self.stats.corrupt_blocks += 1;
                }
                Frame::Truncated { offset } => {
                    warn!(path = %path.display(), offset, "Log ends in a partial block");
                    self.stats.truncated_files += 1;
                }
            }
        }
        Ok(())
    }

    fn apply_block(&mut self, block: LogBlock) -> Result<()> {
        self.stats.blocks_read += 1;
        match block {
            LogBlock::Data { schema, records } => {
                let schema = match &self.schema {
                    Some(current) if **current == schema => current.clone(),
                    _ => schema.into_ref(),
                };
                for record in records {
                    self.stats.records_read += 1;
                    self.fold(record, &schema)?;
                }
                self.schema = Some(schema);
            }
            LogBlock::Delete { keys } => {
                let schema = self.schema.clone().unwrap_or_else(|| {
                    Schema::new("deletes", Vec::new()).into_ref()
                });
                for key in keys {
                    self.stats.deletes_read += 1;
                    self.fold(key.into_record(), &schema)?;
                }
            }
        }
        Ok(())
    }

    /// Combine `record` with any pending change for its key. The pending
    /// change is older; an absent outcome leaves a delete marker.
    fn fold(&mut self, record: Record, schema: &SchemaRef) -> Result<()> {
        if self.closed {
            return Err(SliceError::Storage("Log scanner is closed".to_string()));
        }

        let Some(existing) = self.index.pop(record.key()) else {
            self.index.insert(record);
            return Ok(());
        };

        let merged = self
            .merger
            .merge(&existing, schema, &record, schema, &self.merge_config)?;

        match merged {
            Some((merged, _)) => self.index.insert(merged),
            None => {
                let ordering = record
                    .ordering_value(self.merge_config.ordering_field.as_deref())
                    .clone();
                self.index
                    .insert(Record::delete(record.key(), record.partition_path(), ordering))
            }
        };
        Ok(())
    }
}

impl LogScanner for DeltaLogScanner {
    fn records(&mut self) -> &mut PendingChangeIndex {
        &mut self.index
    }

    fn is_with_operation_field(&self) -> bool {
        self.with_operation_field
    }

    fn partition_name_override(&self) -> Option<&str> {
        self.partition_name_override.as_deref()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let dropped = self.index.len();
        self.index.clear();
        self.closed = true;
        debug!(dropped, "Closed delta log scanner");
        Ok(())
    }
}
