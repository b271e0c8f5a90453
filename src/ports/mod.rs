//! Port traits at the I/O boundaries.

pub mod config_port;
pub mod journal_store;
pub mod report_port;
