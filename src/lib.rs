//! `pboc-liquidity` library crate.
//!
//! The binary (`liquidity-report`) is a thin wrapper around this library so that:
//!
//! - the alignment/KPI logic is testable without touching the network
//! - source adapters can be swapped without touching the report code
//! - the report renderer can be exercised against fixed inputs

pub mod analysis;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
