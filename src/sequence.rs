//! Lazy, closable sequences
//!
//! Cursor-style iteration shared by the slice reader and the residual
//! drain it falls back to once the base file is exhausted.

use crate::error::Result;

/// A forward-only sequence that must be closed when abandoned
pub trait LazySequence {
    type Item;

    /// Move to the next element. `Ok(false)` once exhausted.
    fn advance(&mut self) -> Result<bool>;

    /// Take the element reached by the last successful `advance`
    fn current(&mut self) -> Option<Self::Item>;

    /// Release underlying resources. Safe to call more than once.
    fn close(&mut self) -> Result<()>;
}
