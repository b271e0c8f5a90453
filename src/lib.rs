//! tradejournal: a trading journal with per-account trade logs, dashboards,
//! streaks and achievements, and a milestone-based risk calculator.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod ports;
