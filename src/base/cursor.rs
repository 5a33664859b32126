//! Base File Cursor
//!
//! Sequential iteration over the records of a base file.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};

use crate::error::{Result, SliceError};
use crate::record::Record;

use super::{RecordCursor, ENTRY_HEADER_SIZE};

/// Iterator over base-file records in file order.
///
/// Stops permanently after the first error. Once the data block is
/// exhausted, the running CRC is checked against the footer's data CRC.
pub struct BaseFileCursor {
    /// `None` once closed
    file: Option<BufReader<File>>,
    /// Stop reading at this offset (start of footer)
    end_offset: u64,
    current_offset: u64,
    /// Running CRC over every record frame read so far
    data_hasher: crc32fast::Hasher,
    expected_data_crc: u32,
    data_verified: bool,
    failed: bool,
}

impl BaseFileCursor {
    pub(super) fn new(
        file: File,
        start_offset: u64,
        end_offset: u64,
        expected_data_crc: u32,
    ) -> Result<Self> {
        let mut file = BufReader::new(file);
        file.seek(SeekFrom::Start(start_offset))?;
        Ok(Self {
            file: Some(file),
            end_offset,
            current_offset: start_offset,
            data_hasher: crc32fast::Hasher::new(),
            expected_data_crc,
            data_verified: false,
            failed: false,
        })
    }

    fn verify_data_crc(&mut self) -> Result<()> {
        self.data_verified = true;
        let actual = self.data_hasher.clone().finalize();
        if actual != self.expected_data_crc {
            return Err(SliceError::Corruption(format!(
                "Data block CRC mismatch: expected {:#010x}, got {:#010x}",
                self.expected_data_crc, actual
            )));
        }
        Ok(())
    }

    fn read_entry(&mut self) -> Result<Record> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| SliceError::Storage("Cursor is closed".to_string()))?;

        let mut header = [0u8; ENTRY_HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if self.current_offset + ENTRY_HEADER_SIZE + len > self.end_offset {
            return Err(SliceError::Corruption(format!(
                "Record at offset {} overruns data block",
                self.current_offset
            )));
        }

        let mut payload = vec![0u8; len as usize];
        file.read_exact(&mut payload)?;

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            return Err(SliceError::Corruption(format!(
                "CRC mismatch at offset {}: expected {:#010x}, got {:#010x}",
                self.current_offset, expected_crc, actual_crc
            )));
        }

        self.data_hasher.update(&header);
        self.data_hasher.update(&payload);

        let record: Record = bincode::deserialize(&payload)?;
        self.current_offset += ENTRY_HEADER_SIZE + len;
        Ok(record)
    }
}

impl Iterator for BaseFileCursor {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.file.is_none() {
            return None;
        }

        if self.current_offset >= self.end_offset {
            if self.data_verified {
                return None;
            }
            return match self.verify_data_crc() {
                Ok(()) => None,
                Err(e) => {
                    self.failed = true;
                    Some(Err(e))
                }
            };
        }

        let result = self.read_entry();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

impl RecordCursor for BaseFileCursor {
    fn close(&mut self) -> Result<()> {
        self.file = None;
        Ok(())
    }
}
