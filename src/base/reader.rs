//! Base File Reader
//!
//! Opens a base file, validates header and footer, and hands out cursors.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SliceError};
use crate::record::{Schema, SchemaRef};

use super::cursor::BaseFileCursor;
use super::{BaseFileReader, RecordCursor, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// An open base file
pub struct BaseFile {
    path: PathBuf,
    /// Held open until `close()` so the file cannot vanish underneath cursors
    file: Option<File>,
    schema: SchemaRef,
    entry_count: u64,
    /// First byte of the data block
    data_start: u64,
    /// First byte after the data block
    data_end: u64,
    data_crc: u32,
}

impl BaseFile {
    /// Open a base file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < HEADER_SIZE + 4 + FOOTER_SIZE {
            return Err(SliceError::Corruption(format!(
                "Base file too small: {} bytes",
                file_size
            )));
        }

        // Read and validate header
        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(SliceError::Storage(format!(
                "Invalid base file magic: expected FSBF, got {:?}",
                &header[0..4]
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(SliceError::Storage(format!(
                "Unsupported base file version: {}",
                version
            )));
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&header[6..14]);
        let entry_count = u64::from_le_bytes(count_bytes);

        // Schema block
        let mut len_bytes = [0u8; 4];
        file.read_exact(&mut len_bytes)?;
        let schema_len = u32::from_le_bytes(len_bytes) as u64;
        let data_start = HEADER_SIZE + 4 + schema_len;
        if data_start + FOOTER_SIZE > file_size {
            return Err(SliceError::Corruption(format!(
                "Schema block overruns file: {} bytes",
                schema_len
            )));
        }
        let mut schema_bytes = vec![0u8; schema_len as usize];
        file.read_exact(&mut schema_bytes)?;
        let schema: Schema = bincode::deserialize(&schema_bytes)?;

        // Footer
        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;

        let mut end_bytes = [0u8; 8];
        end_bytes.copy_from_slice(&footer[0..8]);
        let data_end = u64::from_le_bytes(end_bytes);
        let data_crc = u32::from_le_bytes([footer[8], footer[9], footer[10], footer[11]]);

        if data_end < data_start || data_end > file_size - FOOTER_SIZE {
            return Err(SliceError::Corruption(format!(
                "Data block bounds out of range: {}..{}",
                data_start, data_end
            )));
        }

        debug!(
            path = %path.display(),
            entry_count,
            schema = %schema.name,
            "Opened base file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            schema: schema.into_ref(),
            entry_count,
            data_start,
            data_end,
            data_crc,
        })
    }

    /// Schema the file was written with
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Open a cursor positioned at the first record
    pub fn cursor(&self) -> Result<BaseFileCursor> {
        if self.is_closed() {
            return Err(SliceError::Storage(format!(
                "Base file {} is closed",
                self.path.display()
            )));
        }
        let file = File::open(&self.path)?;
        BaseFileCursor::new(file, self.data_start, self.data_end, self.data_crc)
    }
}

impl BaseFileReader for BaseFile {
    fn record_cursor(&mut self, schema: &SchemaRef) -> Result<Box<dyn RecordCursor>> {
        if schema.fields != self.schema.fields {
            return Err(SliceError::Schema(format!(
                "Requested schema '{}' does not match base file schema '{}'",
                schema.name, self.schema.name
            )));
        }
        Ok(Box::new(self.cursor()?))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            drop(file);
            debug!(path = %self.path.display(), "Closed base file");
        }
        Ok(())
    }
}
