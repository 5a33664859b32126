//! In-memory base reader, for slices whose base records are already decoded

use crate::error::{Result, SliceError};
use crate::record::{Record, SchemaRef};

use super::{BaseFileReader, RecordCursor};

/// Base reader over a vector of records
#[derive(Debug, Default)]
pub struct MemoryBaseReader {
    records: Vec<Record>,
    closed: bool,
}

impl MemoryBaseReader {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl BaseFileReader for MemoryBaseReader {
    fn record_cursor(&mut self, _schema: &SchemaRef) -> Result<Box<dyn RecordCursor>> {
        if self.closed {
            return Err(SliceError::Storage("Base reader is closed".to_string()));
        }
        Ok(Box::new(VecCursor::new(self.records.clone())))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Cursor over an owned vector of records
#[derive(Debug)]
pub struct VecCursor {
    records: std::vec::IntoIter<Record>,
    closed: bool,
}

impl VecCursor {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into_iter(),
            closed: false,
        }
    }
}

impl Iterator for VecCursor {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        self.records.next().map(Ok)
    }
}

impl RecordCursor for VecCursor {
    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
