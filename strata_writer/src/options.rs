use strata_core::MAX_BATCH_OPERATIONS;

use crate::error::{Result, SaveChangesError};

/// How operations are submitted to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// One atomic batch per partition chunk.
    #[default]
    Batched,
    /// Every operation is submitted on its own.
    Single,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Maximum number of operations per batch, at most [`MAX_BATCH_OPERATIONS`].
    pub max_batch_operations: usize,
    pub mode: WriteMode,
}

impl WriterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_batch_operations(mut self, max_batch_operations: usize) -> Self {
        self.max_batch_operations = max_batch_operations;
        self
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_BATCH_OPERATIONS).contains(&self.max_batch_operations) {
            return Err(SaveChangesError::InvalidOptions {
                message: format!(
                    "max_batch_operations must be between 1 and {MAX_BATCH_OPERATIONS}, got {}",
                    self.max_batch_operations
                ),
            });
        }

        Ok(())
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            max_batch_operations: MAX_BATCH_OPERATIONS,
            mode: WriteMode::Batched,
        }
    }
}
