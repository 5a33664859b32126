//! Configuration for fileslice
//!
//! Centralized configuration with sensible defaults.

use crate::merge::MergeMode;

/// Main configuration for reading a file slice
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Merge Configuration
    // -------------------------------------------------------------------------
    /// Column used to break ties between an older and a newer record.
    /// `None` means the newer record always wins.
    pub ordering_field: Option<String>,

    /// Which merge function combines base records with pending changes
    pub merge_mode: MergeMode,

    // -------------------------------------------------------------------------
    // Key Configuration
    // -------------------------------------------------------------------------
    /// Columns holding the record key and partition path. When unset, keys
    /// come from the `_record_key` meta column.
    pub simple_key_fields: Option<SimpleKeyFields>,

    // -------------------------------------------------------------------------
    // Wrapping Policy (owned by the log scanner)
    // -------------------------------------------------------------------------
    /// Populate each record's operation from the `_operation` column
    pub with_operation_field: bool,

    /// Replace every emitted record's partition path with this name
    pub partition_name_override: Option<String>,
}

/// Record key / partition path column pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleKeyFields {
    pub record_key_field: String,
    pub partition_path_field: String,
}

impl SimpleKeyFields {
    pub fn new(record_key_field: impl Into<String>, partition_path_field: impl Into<String>) -> Self {
        Self {
            record_key_field: record_key_field.into(),
            partition_path_field: partition_path_field.into(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ordering_field: None,
            merge_mode: MergeMode::EventTimeOrdering,
            simple_key_fields: None,
            with_operation_field: false,
            partition_name_override: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the ordering (pre-combine) column
    pub fn ordering_field(mut self, field: impl Into<String>) -> Self {
        self.config.ordering_field = Some(field.into());
        self
    }

    /// Set the merge mode
    pub fn merge_mode(mut self, mode: MergeMode) -> Self {
        self.config.merge_mode = mode;
        self
    }

    /// Derive keys from the given record key / partition path columns
    pub fn simple_key_fields(mut self, fields: SimpleKeyFields) -> Self {
        self.config.simple_key_fields = Some(fields);
        self
    }

    /// Populate operations from the `_operation` column
    pub fn with_operation_field(mut self, enabled: bool) -> Self {
        self.config.with_operation_field = enabled;
        self
    }

    /// Override the partition path of every emitted record
    pub fn partition_name_override(mut self, name: impl Into<String>) -> Self {
        self.config.partition_name_override = Some(name.into());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
