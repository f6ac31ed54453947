//! Domain core for the production-time dashboard.
//!
//! Holds the record and table types shared by every layer, the column
//! resolver and value normalizer used at ingestion, date and number helpers,
//! the error type and the command-line settings.

pub mod columns;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
pub mod values;

pub use error::{Result, TiemposError};
