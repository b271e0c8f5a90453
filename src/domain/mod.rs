//! Core domain types and logic.

pub mod account;
pub mod achievement;
pub mod config_validation;
pub mod dashboard;
pub mod error;
pub mod ledger;
pub mod merge;
pub mod risk;
pub mod settings;
pub mod stats;
pub mod streak;
pub mod trade;
