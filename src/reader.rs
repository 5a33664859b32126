//! Slice Reader
//!
//! Produces the merged view of one file slice.
//!
//! ## Responsibilities
//! - Stream base-file records and resolve each against the pending changes
//! - Suppress keys whose merge outcome is a delete
//! - Emit the remaining (insert-only) pending changes once the base file
//!   is exhausted
//! - Close the base cursor, the base reader and the log scanner exactly once
//!
//! ## Emission Order
//! ```text
//! base record 1 ─┐
//! base record 2  ├─ base file order (merged, passed through, or suppressed)
//! ...           ─┘
//! tail record 1 ─┐
//! ...            ├─ index drain order (unspecified)
//! tail record n ─┘
//! ```

use tracing::{debug, trace, warn};

use crate::base::{BaseFileReader, RecordCursor};
use crate::config::{Config, SimpleKeyFields};
use crate::error::{Result, SliceError};
use crate::index::ResidualRecords;
use crate::key::{KeyExtractor, SimpleKeyExtractor};
use crate::log::LogScanner;
use crate::merge::{MergeConfig, MergeFunction};
use crate::record::{Record, SchemaRef, WrapParams};
use crate::sequence::LazySequence;

/// Counters describing what a reader has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Records pulled from the base cursor
    pub base_records: u64,
    /// Base records that had a pending change
    pub merged: u64,
    /// Base records dropped because the merge outcome was a delete
    pub suppressed: u64,
    /// Pending changes emitted without a base record
    pub tail_records: u64,
}

/// Base reader together with the cursor it produced; both owned and closed
/// by the slice reader.
struct BaseSource {
    reader: Box<dyn BaseFileReader>,
    cursor: Box<dyn RecordCursor>,
}

enum Phase {
    /// Pulling from the base cursor
    Base,
    /// Draining what is left of the pending-change index
    Tail(ResidualRecords),
    Done,
}

/// Lazy, closable sequence of the reconciled records of a slice.
///
/// The base record is always the *older* input of the merge function and
/// the pending change the *newer* one. The reader borrows the log scanner
/// exclusively for its whole lifetime and forwards `close()` to it.
pub struct SliceReader<'a, S: LogScanner + ?Sized> {
    /// `None` for log-only slices
    base: Option<BaseSource>,
    scanner: &'a mut S,
    schema: SchemaRef,
    merger: Box<dyn MergeFunction>,
    merge_config: MergeConfig,
    key_extractor: Option<Box<dyn KeyExtractor>>,
    simple_key_fields: Option<SimpleKeyFields>,
    phase: Phase,
    /// Single-slot buffer shared by `has_next()` and `advance()`
    next_record: Option<Record>,
    /// Slot was filled by `has_next()` and not yet claimed by `advance()`
    peeked: bool,
    stats: ReadStats,
    closed: bool,
}

impl<'a, S: LogScanner + ?Sized> SliceReader<'a, S> {
    /// Create a reader over an optional base file and a fully built scanner.
    ///
    /// Opens the base cursor immediately. If that fails the base reader is
    /// closed before the error is returned.
    pub fn new(
        base_reader: Option<Box<dyn BaseFileReader>>,
        scanner: &'a mut S,
        schema: SchemaRef,
        config: &Config,
    ) -> Result<Self> {
        let base = match base_reader {
            Some(mut reader) => match reader.record_cursor(&schema) {
                Ok(cursor) => Some(BaseSource { reader, cursor }),
                Err(e) => {
                    if let Err(close_err) = reader.close() {
                        warn!(error = %close_err, "Failed to close base reader after open error");
                    }
                    return Err(e);
                }
            },
            None => None,
        };

        let key_extractor = config.simple_key_fields.as_ref().map(|fields| {
            Box::new(SimpleKeyExtractor::new(fields.record_key_field.clone()))
                as Box<dyn KeyExtractor>
        });

        debug!(
            has_base = base.is_some(),
            pending = scanner.records().len(),
            schema = %schema.name,
            "Opened slice reader"
        );

        Ok(Self {
            base,
            scanner,
            schema,
            merger: config.merge_mode.merger(),
            merge_config: MergeConfig::new(config.ordering_field.clone()),
            key_extractor,
            simple_key_fields: config.simple_key_fields.clone(),
            phase: Phase::Base,
            next_record: None,
            peeked: false,
            stats: ReadStats::default(),
            closed: false,
        })
    }

    /// Use `extractor` to derive base-record keys
    pub fn with_key_extractor(mut self, extractor: Box<dyn KeyExtractor>) -> Self {
        self.key_extractor = Some(extractor);
        self
    }

    /// Replace the merge function selected by the config
    pub fn with_merger(mut self, merger: Box<dyn MergeFunction>) -> Self {
        self.merger = merger;
        self
    }

    /// True if another record is ready. Buffers at most one record; a
    /// following `advance()` or `next()` yields that same record.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.next_record.is_some() {
            return Ok(true);
        }
        let ready = self.fill()?;
        self.peeked = ready;
        Ok(ready)
    }

    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the base cursor, the base reader and the log scanner. Each is
    /// attempted even if an earlier one fails; the last failure is returned.
    /// Later calls return `Ok(())`.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.next_record = None;
        self.peeked = false;

        let mut last_error = None;

        if let Phase::Tail(residual) = &mut self.phase {
            if let Err(e) = residual.close() {
                last_error = Some(e);
            }
        }
        self.phase = Phase::Done;

        if let Some(base) = self.base.as_mut() {
            if let Err(e) = base.cursor.close() {
                warn!(error = %e, "Failed to close base cursor");
                last_error = Some(SliceError::Close(format!("base cursor: {}", e)));
            }
            if let Err(e) = base.reader.close() {
                warn!(error = %e, "Failed to close base reader");
                last_error = Some(SliceError::Close(format!("base reader: {}", e)));
            }
        }

        if let Err(e) = self.scanner.close() {
            warn!(error = %e, "Failed to close log scanner");
            last_error = Some(SliceError::Close(format!("log scanner: {}", e)));
        }

        debug!(
            base_records = self.stats.base_records,
            merged = self.stats.merged,
            suppressed = self.stats.suppressed,
            tail_records = self.stats.tail_records,
            "Closed slice reader"
        );

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Fetch the next record into the slot. Any error fuses the sequence.
    fn fill(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        match self.fetch_next() {
            Ok(record) => {
                let ready = record.is_some();
                self.next_record = record;
                Ok(ready)
            }
            Err(e) => {
                self.phase = Phase::Done;
                self.next_record = None;
                Err(e)
            }
        }
    }

    fn take_buffered(&mut self) -> Option<Record> {
        self.peeked = false;
        self.next_record.take()
    }

    fn fetch_next(&mut self) -> Result<Option<Record>> {
        if matches!(self.phase, Phase::Base) {
            if let Some(record) = self.next_from_base()? {
                return Ok(Some(record));
            }
            let residual = self.scanner.records().take_remaining();
            debug!(
                base_records = self.stats.base_records,
                merged = self.stats.merged,
                suppressed = self.stats.suppressed,
                remaining = residual.remaining(),
                "Base file exhausted, draining pending changes"
            );
            self.phase = Phase::Tail(residual);
        }

        let next = match &mut self.phase {
            Phase::Tail(residual) => {
                if residual.advance()? {
                    residual.current()
                } else {
                    None
                }
            }
            _ => None,
        };

        match next {
            Some(record) => {
                self.stats.tail_records += 1;
                self.wrap(record).map(Some)
            }
            None => {
                self.phase = Phase::Done;
                Ok(None)
            }
        }
    }

    fn next_from_base(&mut self) -> Result<Option<Record>> {
        let Some(base) = self.base.as_mut() else {
            return Ok(None);
        };

        while let Some(next) = base.cursor.next() {
            let base_record = next?;
            self.stats.base_records += 1;

            let key = base_record.record_key(&self.schema, self.key_extractor.as_deref())?;
            let Some(pending) = self.scanner.records().pop(&key) else {
                return self.wrap(base_record).map(Some);
            };

            self.stats.merged += 1;
            let outcome = self.merger.merge(
                &base_record,
                &self.schema,
                &pending,
                &self.schema,
                &self.merge_config,
            )?;

            match outcome {
                Some((merged, _)) => return self.wrap(merged).map(Some),
                None => {
                    self.stats.suppressed += 1;
                    trace!(key = %key, "Suppressed deleted record");
                }
            }
        }

        Ok(None)
    }

    fn wrap(&self, record: Record) -> Result<Record> {
        let params = WrapParams {
            simple_key_fields: self.simple_key_fields.as_ref(),
            with_operation_field: self.scanner.is_with_operation_field(),
            partition_name_override: self.scanner.partition_name_override(),
        };
        record.wrap(&self.schema, &params)
    }
}

impl<'a, S: LogScanner + ?Sized> LazySequence for SliceReader<'a, S> {
    type Item = Record;

    fn advance(&mut self) -> Result<bool> {
        if self.peeked {
            self.peeked = false;
            return Ok(self.next_record.is_some());
        }
        self.fill()
    }

    fn current(&mut self) -> Option<Record> {
        self.take_buffered()
    }

    fn close(&mut self) -> Result<()> {
        SliceReader::close(self)
    }
}

impl<'a, S: LogScanner + ?Sized> Iterator for SliceReader<'a, S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        match self.has_next() {
            Ok(true) => self.take_buffered().map(Ok),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<'a, S: LogScanner + ?Sized> Drop for SliceReader<'a, S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "Failed to close slice reader on drop");
        }
    }
}
