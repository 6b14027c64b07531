//! The single-pass report pipeline.
//!
//! fetch injection -> fetch rate -> align -> derive KPIs -> render -> write
//!
//! Either series coming back empty short-circuits to the no-data page; there is
//! no partial report.

use std::fmt;

use chrono::NaiveDateTime;
use tracing::info;

use crate::analysis::{align, derive};
use crate::config::Settings;
use crate::data::{SourceAdapter, fetch_or_empty};
use crate::domain::{AlignedTable, KpiSet, Metric};
use crate::error::AppError;
use crate::report::{render_empty, render_report};

/// Why the no-data page was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoDataReason {
    /// One or both series came back empty.
    SeriesUnavailable(Vec<Metric>),
    /// Both series had rows but no rate date survived alignment.
    NothingAligned,
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::SeriesUnavailable(metrics) => {
                let names: Vec<&str> = metrics.iter().map(|m| m.display_name()).collect();
                write!(f, "no data for {}", names.join(", "))
            }
            NoDataReason::NothingAligned => write!(f, "no dated rate survived alignment"),
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub enum ReportOutcome {
    Full {
        table: AlignedTable,
        kpis: KpiSet,
        html: String,
    },
    NoData {
        reason: NoDataReason,
        html: String,
    },
}

impl ReportOutcome {
    pub fn html(&self) -> &str {
        match self {
            ReportOutcome::Full { html, .. } | ReportOutcome::NoData { html, .. } => html,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, ReportOutcome::Full { .. })
    }
}

/// Fetch both series from `adapter` and render the page in memory.
pub fn build_report(
    adapter: &dyn SourceAdapter,
    lookback: usize,
    generated_at: NaiveDateTime,
) -> ReportOutcome {
    let injection = fetch_or_empty(adapter, Metric::NetInjection, lookback);
    let rate = fetch_or_empty(adapter, Metric::Rate, lookback);

    let missing: Vec<Metric> = [&injection, &rate]
        .into_iter()
        .filter(|s| s.is_empty())
        .map(|s| s.metric)
        .collect();
    if !missing.is_empty() {
        return no_data(NoDataReason::SeriesUnavailable(missing));
    }

    let table = align(&rate, &injection);
    info!(
        rate_rows = rate.len(),
        injection_rows = injection.len(),
        aligned_rows = table.len(),
        "aligned series"
    );

    let Some(kpis) = derive(&table) else {
        return no_data(NoDataReason::NothingAligned);
    };

    let html = render_report(&table, &kpis, generated_at);
    ReportOutcome::Full { table, kpis, html }
}

/// Build the report and write it to `settings.output`.
pub fn run_report(
    adapter: &dyn SourceAdapter,
    settings: &Settings,
    generated_at: NaiveDateTime,
) -> Result<ReportOutcome, AppError> {
    let outcome = build_report(adapter, settings.lookback, generated_at);
    crate::io::write_report(&settings.output, outcome.html())?;
    Ok(outcome)
}

fn no_data(reason: NoDataReason) -> ReportOutcome {
    ReportOutcome::NoData {
        reason,
        html: render_empty(),
    }
}
