//! Data layer for the production-time dashboard.
//!
//! Discovers and reads the daily spreadsheet exports, aggregates them into
//! daily and monthly loads with rankings, and reads and writes the report
//! workbook.

pub mod aggregator;
pub mod analysis;
pub mod cells;
pub mod rankings;
pub mod reader;
pub mod workbook;
pub mod writer;

pub use tiempos_core as core;
