//! Concrete adapter implementations for ports.

pub mod csv_store;
pub mod file_config_adapter;
pub mod mirrored_store;
#[cfg(feature = "sqlite")]
pub mod sqlite_store;
pub mod typst_report;
#[cfg(feature = "web")]
pub mod web;
