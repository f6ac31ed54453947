//! Query runtime for the production-time dashboard.
//!
//! Owns the TTL-cached report snapshot, the business filter applied on every
//! reload, and the read-only query derivations served over HTTP.

pub mod data_manager;
pub mod filter;
pub mod queries;

pub use tiempos_core as core;
pub use tiempos_data as data;
