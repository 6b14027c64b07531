//! Input/output helpers.
//!
//! - report file writing (`export`)

pub mod export;

pub use export::*;
