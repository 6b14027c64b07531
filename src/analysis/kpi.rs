//! KPI derivation from the aligned table.

use crate::domain::{AlignedTable, KpiSet};

/// Rows (not calendar days) averaged for the trailing mean.
pub const TRAILING_WINDOW: usize = 7;

/// Summarize `table` into the report KPIs.
///
/// Returns `None` for an empty table; callers route that case to the
/// no-data report instead of the full one.
pub fn derive(table: &AlignedTable) -> Option<KpiSet> {
    let latest = table.latest()?;

    let window = TRAILING_WINDOW.min(table.len());
    let tail = &table.rows[table.len() - window..];
    let trailing_mean = tail.iter().map(|r| r.net_injection).sum::<f64>() / window as f64;

    Some(KpiSet {
        as_of: latest.date,
        latest_injection: latest.net_injection,
        latest_rate: latest.rate,
        trailing_mean,
        trailing_window: window,
    })
}
