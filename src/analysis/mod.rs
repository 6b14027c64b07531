//! Core transforms: rate-anchored alignment and KPI derivation.
//!
//! Both are pure functions of their inputs; the pipeline calls them once per run.

pub mod align;
pub mod kpi;

pub use align::align;
pub use kpi::{TRAILING_WINDOW, derive};
