//! Report rendering: the aligned table and KPIs as a static HTML page.
//!
//! - `format`: number/timestamp text forms used in the KPI boxes
//! - `html`: page assembly and the Plotly chart definition

pub mod format;
pub mod html;

pub use html::{EMPTY_MESSAGE, render_empty, render_report};
