//! Background CSV import into the vault database.
//!
//! The worker owns a copy of the master key (wiped on drop), opens its own
//! database connection, and applies the whole file in one transaction:
//! cancellation or any SQL failure rolls everything back.

pub mod error;
pub mod worker;

pub use {
    error::ImportError,
    worker::{CsvImportWorker, DuplicatePolicy, ImportOptions, ImportReport, Progress},
};
