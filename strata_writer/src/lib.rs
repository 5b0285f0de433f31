//! Applies pending changes to a table store.
//!
//! Changes are mapped to write operations, grouped by table and partition,
//! packed into batches and submitted concurrently. The results of all
//! submissions are reduced to a single count or a single error.

pub mod aggregator;
pub mod batcher;
pub mod creator;
pub mod dispatcher;
pub mod error;
pub mod grouper;
pub mod mapper;
mod metrics;
pub mod options;
mod writer;

pub use self::{
    creator::{create_tables, delete_account},
    error::{Result, SaveChangesError},
    mapper::map_change,
    options::{WriteMode, WriterOptions},
    writer::ChangeWriter,
};
