//! Record schema
//!
//! Named, ordered column list used to validate rows and locate key and
//! ordering columns.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SliceError};

use super::{Row, Value};

/// Shared schema handle
pub type SchemaRef = Arc<Schema>;

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Long,
    Double,
    String,
    Bytes,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "bool",
            DataType::Long => "long",
            DataType::Double => "double",
            DataType::String => "string",
            DataType::Bytes => "bytes",
        };
        f.write_str(name)
    }
}

/// A single column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    pub fn required(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, data_type, false)
    }

    pub fn nullable(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, data_type, true)
    }
}

/// Ordered list of columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Wrap into a shared handle
    pub fn into_ref(self) -> SchemaRef {
        Arc::new(self)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Check that every column in `row` is declared, type-compatible, and that
    /// no required column is missing or null.
    pub fn validate(&self, row: &Row) -> Result<()> {
        for (name, value) in row {
            let field = self.field(name).ok_or_else(|| {
                SliceError::Schema(format!(
                    "Column '{}' not declared in schema '{}'",
                    name, self.name
                ))
            })?;
            check_value(field, value)?;
        }

        for field in self.fields.iter().filter(|f| !f.nullable) {
            if !row.contains_key(&field.name) {
                return Err(SliceError::Schema(format!(
                    "Required column '{}' is missing",
                    field.name
                )));
            }
        }

        Ok(())
    }
}

fn check_value(field: &Field, value: &Value) -> Result<()> {
    match value.data_type() {
        None if field.nullable => Ok(()),
        None => Err(SliceError::Schema(format!(
            "Column '{}' is not nullable",
            field.name
        ))),
        Some(actual) if actual == field.data_type => Ok(()),
        Some(actual) => Err(SliceError::Schema(format!(
            "Column '{}' expects {}, got {}",
            field.name, field.data_type, actual
        ))),
    }
}
