//! Tolerant CSV codec for password exchange.
//!
//! Reads the CSVs that password managers and browsers actually emit:
//! UTF-8 with or without a BOM, comma / semicolon / tab delimited, CRLF or
//! LF, quoted fields with doubled inner quotes. Header names are matched
//! case-insensitively against per-field alias lists, so KeePassXC, Chrome
//! and our own exports all map onto the same record shape.

pub mod detect;
pub mod error;
pub mod reader;
pub mod writer;

pub use {
    detect::{CsvFormat, CsvInfo, detect},
    error::CsvError,
    reader::{CsvParseResult, CsvRecord, parse},
    writer::export,
};
