//! Base File Writer
//!
//! Writes records to a new base file. Used by tooling, tests and
//! benchmarks to lay out slices the reader consumes.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SliceError};
use crate::record::{Record, Schema};

use super::{ENTRY_HEADER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Metadata of a finished base file
#[derive(Debug, Clone)]
pub struct BaseFileMeta {
    pub path: PathBuf,
    pub entry_count: u64,
    pub file_size: u64,
}

/// Builder for base files
pub struct BaseFileWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    entry_count: u64,
    /// Current write position, the data end once finished
    current_offset: u64,
    /// Running CRC over all record frames
    data_hasher: crc32fast::Hasher,
}

impl BaseFileWriter {
    /// Create a base file. Writes header and schema immediately; call
    /// `add()` for each record in the desired read order, then `finish()`.
    pub fn create(path: &Path, schema: &Schema) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?; // Placeholder for entry count

        let schema_bytes = bincode::serialize(schema)?;
        writer.write_all(&(schema_bytes.len() as u32).to_le_bytes())?;
        writer.write_all(&schema_bytes)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            entry_count: 0,
            current_offset: HEADER_SIZE + 4 + schema_bytes.len() as u64,
            data_hasher: crc32fast::Hasher::new(),
        })
    }

    /// Append a record
    pub fn add(&mut self, record: &Record) -> Result<()> {
        let payload = bincode::serialize(record)?;
        let len_bytes = (payload.len() as u32).to_le_bytes();
        let crc_bytes = crc32fast::hash(&payload).to_le_bytes();

        self.writer.write_all(&len_bytes)?;
        self.writer.write_all(&crc_bytes)?;
        self.writer.write_all(&payload)?;

        self.data_hasher.update(&len_bytes);
        self.data_hasher.update(&crc_bytes);
        self.data_hasher.update(&payload);

        self.current_offset += ENTRY_HEADER_SIZE + payload.len() as u64;
        self.entry_count += 1;

        Ok(())
    }

    /// Write the footer, patch the entry count and sync
    pub fn finish(mut self) -> Result<BaseFileMeta> {
        let data_end = self.current_offset;
        let data_crc = self.data_hasher.finalize();

        self.writer.write_all(&data_end.to_le_bytes())?;
        self.writer.write_all(&data_crc.to_le_bytes())?;
        self.writer.write_all(&[0u8; 4])?; // Padding for alignment
        self.writer.flush()?;

        let mut file = self.writer.into_inner().map_err(|e| {
            SliceError::Storage(format!("Failed to flush base file: {}", e))
        })?;
        file.seek(SeekFrom::Start(6))?; // After magic + version
        file.write_all(&self.entry_count.to_le_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();

        Ok(BaseFileMeta {
            path: self.path,
            entry_count: self.entry_count,
            file_size,
        })
    }
}
