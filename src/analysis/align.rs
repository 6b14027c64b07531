//! Rate-anchored left join of the two series.

use crate::domain::{AlignedRow, AlignedTable, DatedSeries};

/// Merge `rate` and `injection` into one table keyed by the rate series' dates.
///
/// - injection missing (or non-numeric) on an anchor date is filled with `0.0`
/// - anchor dates whose rate is absent are dropped
/// - dates only present in `injection` are discarded
pub fn align(rate: &DatedSeries, injection: &DatedSeries) -> AlignedTable {
    let rows = rate
        .points()
        .iter()
        .filter_map(|obs| {
            let value = obs.value?;
            Some(AlignedRow {
                date: obs.date,
                net_injection: injection.value_on(obs.date).unwrap_or(0.0),
                rate: value,
            })
        })
        .collect();

    AlignedTable { rows }
}
