//! Source adapters: everything upstream of the aligner.
//!
//! Each adapter turns one upstream (JSON API, JS-callback API, rendered web page)
//! into a `DatedSeries` for a requested metric. Failures are typed as
//! [`FetchError`] inside the adapter and downgraded to an empty series at the
//! [`fetch_or_empty`] boundary, so the pipeline only ever sees "data" or "no data".

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER};
use tracing::{info, warn};

use crate::config::{HttpSettings, Settings};
use crate::domain::{DatedSeries, Metric, SourceKind};
use crate::error::{AppError, FetchError};

pub mod browser;
pub mod datacenter;
pub mod datayes;
pub mod jsonp;
pub mod parse;

pub use browser::BrowserAdapter;
pub use datacenter::DatacenterAdapter;
pub use datayes::DatayesAdapter;
pub use jsonp::JsonpAdapter;

/// A single upstream that can deliver either metric.
pub trait SourceAdapter {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Fetch `metric`, keeping the trailing `lookback` rows.
    fn fetch(&self, metric: Metric, lookback: usize) -> Result<DatedSeries, FetchError>;
}

/// Call `adapter` and collapse every failure into an empty series.
///
/// A successful call with zero rows is logged as an empty payload, separately
/// from transport and format failures.
pub fn fetch_or_empty(adapter: &dyn SourceAdapter, metric: Metric, lookback: usize) -> DatedSeries {
    info!(source = adapter.name(), metric = metric.display_name(), "fetching series");

    let result = adapter.fetch(metric, lookback).and_then(|series| {
        if series.is_empty() {
            Err(FetchError::EmptyPayload)
        } else {
            Ok(series)
        }
    });

    match result {
        Ok(series) => {
            info!(
                source = adapter.name(),
                metric = metric.display_name(),
                rows = series.len(),
                "fetched series"
            );
            series
        }
        Err(err) => {
            warn!(
                source = adapter.name(),
                metric = metric.display_name(),
                kind = err.kind(),
                "fetch failed: {err}"
            );
            DatedSeries::empty(metric)
        }
    }
}

/// Construct the adapter selected by `kind`.
pub fn build_adapter(kind: SourceKind, settings: &Settings) -> Result<Box<dyn SourceAdapter>, AppError> {
    let adapter: Box<dyn SourceAdapter> = match kind {
        SourceKind::Datayes => Box::new(DatayesAdapter::new(
            http_client(&settings.http)?,
            settings.datayes.clone(),
        )),
        SourceKind::Datacenter => Box::new(DatacenterAdapter::new(
            http_client(&settings.http)?,
            settings.datacenter.clone(),
        )),
        SourceKind::Jsonp => Box::new(JsonpAdapter::new(
            http_client(&settings.http)?,
            settings.jsonp.clone(),
        )),
        SourceKind::Browser => Box::new(BrowserAdapter::new(
            settings.browser.clone(),
            settings.http.timeout_secs,
        )),
    };
    Ok(adapter)
}

/// Blocking client with the configured headers baked in.
pub fn http_client(http: &HttpSettings) -> Result<Client, AppError> {
    let mut headers = HeaderMap::new();
    if let Some(referer) = &http.referer {
        headers.insert(REFERER, header_value(referer)?);
    }
    if let Some(origin) = &http.origin {
        headers.insert(ORIGIN, header_value(origin)?);
    }

    Client::builder()
        .user_agent(http.user_agent.clone())
        .default_headers(headers)
        .timeout(std::time::Duration::from_secs(http.timeout_secs))
        .build()
        .map_err(|e| AppError::new(2, format!("Failed to build HTTP client: {e}")))
}

fn header_value(raw: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(raw).map_err(|e| AppError::new(2, format!("Invalid header value '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::Observation;

    enum Fixed {
        Rows(Vec<(u32, f64)>),
        TransportDown,
        BadPayload,
    }

    impl SourceAdapter for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn fetch(&self, metric: Metric, lookback: usize) -> Result<DatedSeries, FetchError> {
            match self {
                Fixed::Rows(rows) => Ok(DatedSeries::from_observations(
                    metric,
                    rows.iter().map(|&(day, v)| {
                        Observation::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), Some(v))
                    }),
                    lookback,
                )),
                Fixed::TransportDown => Err(FetchError::Transport("connection refused".into())),
                Fixed::BadPayload => Err(FetchError::Format("code=1".into())),
            }
        }
    }

    #[test]
    fn success_passes_series_through() {
        let adapter = Fixed::Rows(vec![(1, 1.8), (2, 1.9)]);
        let series = fetch_or_empty(&adapter, Metric::Rate, 90);
        assert_eq!(series.len(), 2);
        assert_eq!(series.metric, Metric::Rate);
    }

    #[test]
    fn failures_become_empty_series() {
        assert!(fetch_or_empty(&Fixed::TransportDown, Metric::Rate, 90).is_empty());
        assert!(fetch_or_empty(&Fixed::BadPayload, Metric::NetInjection, 90).is_empty());

        let series = fetch_or_empty(&Fixed::Rows(Vec::new()), Metric::NetInjection, 90);
        assert!(series.is_empty());
        assert_eq!(series.metric, Metric::NetInjection);
    }

    #[test]
    fn http_client_rejects_bad_header() {
        let http = HttpSettings {
            referer: Some("bad\nvalue".to_string()),
            ..HttpSettings::default()
        };
        assert!(http_client(&http).is_err());
    }
}
