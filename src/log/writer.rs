//! Delta Log Writer
//!
//! Appends framed blocks to a delta log file. Used by tooling, tests and
//! benchmarks to produce the logs a scanner reads.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::record::{Record, Schema};

use super::block::{DeleteKey, LogBlock};

/// Appends blocks to a delta log
pub struct DeltaLogWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    blocks_written: u64,
}

impl DeltaLogWriter {
    /// Open or create a log file, appending after any existing blocks
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            blocks_written: 0,
        })
    }

    /// Append a block; returns the number of bytes written
    pub fn append_block(&mut self, block: &LogBlock) -> Result<u64> {
        let frame = block.encode()?;
        self.writer.write_all(&frame)?;
        self.blocks_written += 1;
        Ok(frame.len() as u64)
    }

    /// Append a data block
    pub fn append_records(&mut self, schema: &Schema, records: Vec<Record>) -> Result<u64> {
        self.append_block(&LogBlock::Data {
            schema: schema.clone(),
            records,
        })
    }

    /// Append a delete block
    pub fn append_deletes(&mut self, keys: Vec<DeleteKey>) -> Result<u64> {
        self.append_block(&LogBlock::Delete { keys })
    }

    /// Flush buffered blocks and fsync
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    pub fn blocks_written(&self) -> u64 {
        self.blocks_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
