//! Error types for fileslice
//!
//! Provides a unified error type for all read-path operations.

use thiserror::Error;

/// Result type alias using SliceError
pub type Result<T> = std::result::Result<T, SliceError>;

/// Unified error type for fileslice operations
#[derive(Debug, Error)]
pub enum SliceError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Read Path Errors
    // -------------------------------------------------------------------------
    /// Converting a base or merged record into its final form failed
    #[error("Read error: {0}")]
    Read(String),

    #[error("Merge failed: {0}")]
    Merge(String),

    #[error("Key extraction failed: {0}")]
    KeyExtraction(String),

    #[error("Schema error: {0}")]
    Schema(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Close failed: {0}")]
    Close(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for SliceError {
    fn from(e: bincode::Error) -> Self {
        SliceError::Serialization(e.to_string())
    }
}
