//! Key extraction
//!
//! Derives a record's logical key from its columns.

use std::fmt;

use crate::error::{Result, SliceError};
use crate::record::{Record, Schema, Value, RECORD_KEY_FIELD};

/// Placeholders used by [`ComplexKeyExtractor`]
pub const NULL_KEY_PLACEHOLDER: &str = "__null__";
pub const EMPTY_KEY_PLACEHOLDER: &str = "__empty__";

/// Derives the logical key of a record. Must be deterministic.
pub trait KeyExtractor: fmt::Debug + Send + Sync {
    fn extract(&self, record: &Record, schema: &Schema) -> Result<String>;
}

/// Reads the `_record_key` meta column, falling back to the key the record
/// was created with when the column is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaFieldKeyExtractor;

impl KeyExtractor for MetaFieldKeyExtractor {
    fn extract(&self, record: &Record, _schema: &Schema) -> Result<String> {
        match record.get(RECORD_KEY_FIELD) {
            Some(Value::Null) => Err(SliceError::KeyExtraction(format!(
                "Meta column '{}' is null for record '{}'",
                RECORD_KEY_FIELD,
                record.key()
            ))),
            Some(value) => value.to_key_string().ok_or_else(|| {
                SliceError::KeyExtraction(format!("Unusable key value {}", value))
            }),
            None => Ok(record.key().to_string()),
        }
    }
}

/// Uses a single column as the key
#[derive(Debug, Clone)]
pub struct SimpleKeyExtractor {
    field: String,
}

impl SimpleKeyExtractor {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl KeyExtractor for SimpleKeyExtractor {
    fn extract(&self, record: &Record, schema: &Schema) -> Result<String> {
        if !schema.contains(&self.field) {
            return Err(SliceError::KeyExtraction(format!(
                "Key column '{}' not in schema '{}'",
                self.field, schema.name
            )));
        }

        // Delete markers carry no row; their stored key is authoritative
        if record.row().is_none() {
            return Ok(record.key().to_string());
        }

        record
            .get(&self.field)
            .and_then(Value::to_key_string)
            .ok_or_else(|| {
                SliceError::KeyExtraction(format!(
                    "Key column '{}' is missing or null for record '{}'",
                    self.field,
                    record.key()
                ))
            })
    }
}

/// Combines several columns into `field1:value1,field2:value2`
#[derive(Debug, Clone)]
pub struct ComplexKeyExtractor {
    fields: Vec<String>,
}

impl ComplexKeyExtractor {
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(SliceError::Config(
                "Complex key needs at least one column".to_string(),
            ));
        }
        Ok(Self { fields })
    }
}

impl KeyExtractor for ComplexKeyExtractor {
    fn extract(&self, record: &Record, schema: &Schema) -> Result<String> {
        if record.row().is_none() {
            return Ok(record.key().to_string());
        }

        let mut parts = Vec::with_capacity(self.fields.len());
        let mut all_missing = true;

        for field in &self.fields {
            if !schema.contains(field) {
                return Err(SliceError::KeyExtraction(format!(
                    "Key column '{}' not in schema '{}'",
                    field, schema.name
                )));
            }

            let part = match record.get(field).and_then(Value::to_key_string) {
                None => NULL_KEY_PLACEHOLDER.to_string(),
                Some(s) if s.is_empty() => EMPTY_KEY_PLACEHOLDER.to_string(),
                Some(s) => {
                    all_missing = false;
                    s
                }
            };
            parts.push(format!("{}:{}", field, part));
        }

        if all_missing {
            return Err(SliceError::KeyExtraction(format!(
                "All key columns {:?} are null or empty for record '{}'",
                self.fields,
                record.key()
            )));
        }

        Ok(parts.join(","))
    }
}
