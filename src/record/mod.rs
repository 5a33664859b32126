//! Record Module
//!
//! Immutable data units flowing through the read path.
//!
//! ## Responsibilities
//! - Identify a record by key and partition path
//! - Carry an optional row payload (absent = delete marker)
//! - Expose the ordering value used by merge functions
//! - Wrap raw records into their final, emitted form
//!
//! ## Meta Columns
//! ```text
//! _record_key      record key (used when no key extractor is configured)
//! _partition_path  partition path
//! _operation       change operation ("I", "-U", "U", "D")
//! _is_deleted      soft-delete flag; `true` turns the row into a delete
//! ```

mod schema;
mod value;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SimpleKeyFields;
use crate::error::{Result, SliceError};
use crate::key::{KeyExtractor, MetaFieldKeyExtractor};

pub use schema::{DataType, Field, Schema, SchemaRef};
pub use value::Value;

/// Column name → value
pub type Row = BTreeMap<String, Value>;

pub const RECORD_KEY_FIELD: &str = "_record_key";
pub const PARTITION_PATH_FIELD: &str = "_partition_path";
pub const OPERATION_FIELD: &str = "_operation";
pub const IS_DELETED_FIELD: &str = "_is_deleted";

/// Change operation carried by a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Insert,
    UpdateBefore,
    UpdateAfter,
    Delete,
}

impl Operation {
    /// Short name stored in the `_operation` column
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Insert => "I",
            Operation::UpdateBefore => "-U",
            Operation::UpdateAfter => "U",
            Operation::Delete => "D",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "I" => Some(Operation::Insert),
            "-U" => Some(Operation::UpdateBefore),
            "U" => Some(Operation::UpdateAfter),
            "D" => Some(Operation::Delete),
            _ => None,
        }
    }
}

/// Parameters applied when wrapping a record into its emitted form
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapParams<'a> {
    /// Re-derive key and partition path from these columns
    pub simple_key_fields: Option<&'a SimpleKeyFields>,
    /// Populate the operation from the `_operation` column
    pub with_operation_field: bool,
    /// Replace the partition path
    pub partition_name_override: Option<&'a str>,
}

/// A keyed record from a base file or a delta log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    key: String,
    partition_path: String,
    /// `None` marks a delete
    row: Option<Row>,
    /// Fallback ordering value when the row lacks the ordering column
    ordering_value: Value,
    operation: Option<Operation>,
}

impl Record {
    /// Create a live record
    pub fn new(key: impl Into<String>, partition_path: impl Into<String>, row: Row) -> Self {
        Self {
            key: key.into(),
            partition_path: partition_path.into(),
            row: Some(row),
            ordering_value: Value::Null,
            operation: None,
        }
    }

    /// Create a delete marker
    pub fn delete(
        key: impl Into<String>,
        partition_path: impl Into<String>,
        ordering_value: Value,
    ) -> Self {
        Self {
            key: key.into(),
            partition_path: partition_path.into(),
            row: None,
            ordering_value,
            operation: Some(Operation::Delete),
        }
    }

    pub fn with_ordering_value(mut self, value: impl Into<Value>) -> Self {
        self.ordering_value = value.into();
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn partition_path(&self) -> &str {
        &self.partition_path
    }

    pub fn row(&self) -> Option<&Row> {
        self.row.as_ref()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.row.as_ref().and_then(|row| row.get(column))
    }

    pub fn operation(&self) -> Option<Operation> {
        self.operation
    }

    /// True for delete markers and rows flagged `_is_deleted = true`
    pub fn is_delete(&self) -> bool {
        match &self.row {
            None => true,
            Some(row) => matches!(row.get(IS_DELETED_FIELD), Some(Value::Bool(true))),
        }
    }

    /// Ordering value: the ordering column when the row carries a non-null
    /// one, otherwise the stored fallback.
    pub fn ordering_value(&self, ordering_field: Option<&str>) -> &Value {
        ordering_field
            .and_then(|field| self.get(field))
            .filter(|v| !v.is_null())
            .unwrap_or(&self.ordering_value)
    }

    /// Build a new record with the same identity and a different row
    pub fn with_row(&self, row: Row) -> Record {
        Record {
            key: self.key.clone(),
            partition_path: self.partition_path.clone(),
            row: Some(row),
            ordering_value: self.ordering_value.clone(),
            operation: self.operation,
        }
    }

    /// Logical key of this record. Without an extractor the `_record_key`
    /// meta column is used.
    pub fn record_key(&self, schema: &Schema, extractor: Option<&dyn KeyExtractor>) -> Result<String> {
        match extractor {
            Some(extractor) => extractor.extract(self, schema),
            None => MetaFieldKeyExtractor.extract(self, schema),
        }
    }

    /// Convert into the emitted form.
    ///
    /// Validates the row against `schema`, re-derives key and partition path
    /// from the simple key columns, applies the operation column policy and
    /// the partition override. Any failure is a [`SliceError::Read`].
    pub fn wrap(mut self, schema: &Schema, params: &WrapParams<'_>) -> Result<Record> {
        if let Some(row) = &self.row {
            schema
                .validate(row)
                .map_err(|e| SliceError::Read(format!("record '{}': {}", self.key, e)))?;

            if let Some(fields) = params.simple_key_fields {
                self.key = row
                    .get(&fields.record_key_field)
                    .and_then(Value::to_key_string)
                    .ok_or_else(|| {
                        SliceError::Read(format!(
                            "record '{}': key column '{}' is missing or null",
                            self.key, fields.record_key_field
                        ))
                    })?;
                if let Some(path) = row
                    .get(&fields.partition_path_field)
                    .and_then(Value::to_key_string)
                {
                    self.partition_path = path;
                }
            }
        }

        self.operation = if params.with_operation_field {
            match self.get(OPERATION_FIELD) {
                Some(Value::String(name)) => Some(Operation::from_name(name).ok_or_else(|| {
                    SliceError::Read(format!(
                        "record '{}': unknown operation '{}'",
                        self.key, name
                    ))
                })?),
                Some(Value::Null) | None => self.operation,
                Some(other) => {
                    return Err(SliceError::Read(format!(
                        "record '{}': operation column holds {}",
                        self.key, other
                    )))
                }
            }
        } else {
            None
        };

        if let Some(name) = params.partition_name_override {
            self.partition_path = name.to_string();
        }

        Ok(self)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t", self.key, self.partition_path)?;
        match self.operation {
            Some(op) => write!(f, "{}\t", op.name())?,
            None => write!(f, "-\t")?,
        }
        match &self.row {
            None => write!(f, "<deleted>"),
            Some(row) => {
                write!(f, "{{")?;
                for (i, (name, value)) in row.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
