//! Shared domain types.
//!
//! These types only live for one run of the pipeline:
//!
//! - source adapters produce `DatedSeries`
//! - the aligner turns two series into an `AlignedTable`
//! - the KPI deriver summarizes the table into a `KpiSet`

use chrono::NaiveDate;
use clap::ValueEnum;

/// Which upstream source implementation feeds the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Commercial JSON API (POST request body).
    Datayes,
    /// Data-center JSON API (GET query, nested `result.data`).
    Datacenter,
    /// Public-site API answering with a JavaScript callback wrapper.
    Jsonp,
    /// Headless browser scrape of the rendered HTML table.
    Browser,
}

impl SourceKind {
    pub fn display_name(self) -> &'static str {
        match self {
            SourceKind::Datayes => "datayes",
            SourceKind::Datacenter => "datacenter",
            SourceKind::Jsonp => "jsonp",
            SourceKind::Browser => "browser",
        }
    }
}

/// The two metrics the report combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Open-market operation injection minus maturities, in 亿元.
    NetInjection,
    /// DR007 interbank repo rate, in percent.
    Rate,
}

impl Metric {
    pub fn display_name(self) -> &'static str {
        match self {
            Metric::NetInjection => "OMO net injection",
            Metric::Rate => "DR007",
        }
    }

    pub fn unit_label(self) -> &'static str {
        match self {
            Metric::NetInjection => "亿元",
            Metric::Rate => "%",
        }
    }

    /// Legend entry used on the combined chart.
    pub fn legend(self) -> &'static str {
        match self {
            Metric::NetInjection => "净投放/回笼 (亿元)",
            Metric::Rate => "DR007 利率 (%)",
        }
    }
}

/// One dated value as delivered by a source. `None` means "present but not numeric".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self {
            date,
            value: value.filter(|v| v.is_finite()),
        }
    }
}

/// Ascending, date-unique series for a single metric.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedSeries {
    pub metric: Metric,
    points: Vec<Observation>,
}

impl DatedSeries {
    pub fn empty(metric: Metric) -> Self {
        Self {
            metric,
            points: Vec::new(),
        }
    }

    /// Normalize raw observations into a series.
    ///
    /// Sorts by date, keeps the last write for a repeated date, then keeps only
    /// the trailing `lookback` rows.
    pub fn from_observations(
        metric: Metric,
        observations: impl IntoIterator<Item = Observation>,
        lookback: usize,
    ) -> Self {
        let mut points: Vec<Observation> = observations.into_iter().collect();
        // Stable sort keeps arrival order within a date, so the last one wins below.
        points.sort_by_key(|o| o.date);

        let mut deduped: Vec<Observation> = Vec::with_capacity(points.len());
        for obs in points {
            match deduped.last_mut() {
                Some(last) if last.date == obs.date => *last = obs,
                _ => deduped.push(obs),
            }
        }

        let skip = deduped.len().saturating_sub(lookback);
        Self {
            metric,
            points: deduped.split_off(skip),
        }
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value recorded for `date`, if the date is present and numeric.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |o| o.date)
            .ok()
            .and_then(|idx| self.points[idx].value)
    }
}

/// One row of the merged, rate-anchored table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub net_injection: f64,
    pub rate: f64,
}

/// Rows in ascending date order; every row carries a numeric rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedTable {
    pub rows: Vec<AlignedRow>,
}

impl AlignedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&AlignedRow> {
        self.rows.last()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.iter().map(|r| r.date)
    }
}

/// Scalar summary shown in the KPI boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiSet {
    pub as_of: NaiveDate,
    pub latest_injection: f64,
    pub latest_rate: f64,
    pub trailing_mean: f64,
    /// Number of rows that went into `trailing_mean`.
    pub trailing_window: usize,
}

/// Direction of a net-injection value. Zero counts as an injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignClass {
    Injection,
    Withdrawal,
}

impl SignClass {
    pub fn of(value: f64) -> Self {
        // `-0.0 < 0.0` is false, so negative zero lands here too.
        if value < 0.0 {
            SignClass::Withdrawal
        } else {
            SignClass::Injection
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            SignClass::Injection => "injection",
            SignClass::Withdrawal => "withdrawal",
        }
    }

    pub fn bar_color(self) -> &'static str {
        match self {
            SignClass::Injection => "#EE6363",
            SignClass::Withdrawal => "#90EE90",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn from_observations_sorts_and_keeps_last_duplicate() {
        let series = DatedSeries::from_observations(
            Metric::Rate,
            vec![
                Observation::new(d(3), Some(1.9)),
                Observation::new(d(1), Some(1.8)),
                Observation::new(d(3), Some(2.0)),
            ],
            90,
        );
        let dates: Vec<_> = series.points().iter().map(|o| o.date).collect();
        assert_eq!(dates, vec![d(1), d(3)]);
        assert_eq!(series.value_on(d(3)), Some(2.0));
    }

    #[test]
    fn lookback_keeps_trailing_rows() {
        let obs = (1..=10).map(|day| Observation::new(d(day), Some(day as f64)));
        let series = DatedSeries::from_observations(Metric::NetInjection, obs, 3);
        assert_eq!(series.len(), 3);
        assert_eq!(series.points()[0].date, d(8));

        let none = DatedSeries::from_observations(
            Metric::NetInjection,
            vec![Observation::new(d(1), Some(1.0))],
            0,
        );
        assert!(none.is_empty());
    }

    #[test]
    fn non_finite_values_become_absent() {
        assert_eq!(Observation::new(d(1), Some(f64::NAN)).value, None);
        assert_eq!(Observation::new(d(1), Some(f64::INFINITY)).value, None);
    }

    #[test]
    fn sign_class_boundary_at_zero() {
        assert_eq!(SignClass::of(0.0), SignClass::Injection);
        assert_eq!(SignClass::of(-0.0), SignClass::Injection);
        assert_eq!(SignClass::of(1.0), SignClass::Injection);
        assert_eq!(SignClass::of(-0.01), SignClass::Withdrawal);
    }
}
