//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - source selection and metric enums (`SourceKind`, `Metric`)
//! - raw and normalized series (`Observation`, `DatedSeries`)
//! - alignment/KPI outputs (`AlignedTable`, `KpiSet`, `SignClass`)

pub mod types;

pub use types::*;
