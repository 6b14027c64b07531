//! Eastmoney data-center API.
//!
//! Same two metrics as the Datayes source, different envelope:
//! `{"success": true, "message": "ok", "result": {"data": [...]}}` with
//! amounts reported in yuan.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::DatacenterSettings;
use crate::data::SourceAdapter;
use crate::data::parse::{json_date, json_number};
use crate::domain::{DatedSeries, Metric, Observation};
use crate::error::FetchError;

const YUAN_PER_YI: f64 = 1e8;

const OMO_DATE: &str = "OPERATION_DATE";
const OMO_INJECTION: &str = "INJECT_AMOUNT";
const OMO_MATURITY: &str = "MATURE_AMOUNT";
const RATE_DATE: &str = "REPORT_DATE";
const RATE_VALUE: &str = "IR_RATE";
const RATE_FILTER: &str = r#"(IR_TYPE="DR007")"#;

pub struct DatacenterAdapter {
    client: Client,
    settings: DatacenterSettings,
}

impl DatacenterAdapter {
    pub fn new(client: Client, settings: DatacenterSettings) -> Self {
        Self { client, settings }
    }
}

impl SourceAdapter for DatacenterAdapter {
    fn name(&self) -> &'static str {
        "datacenter"
    }

    fn fetch(&self, metric: Metric, lookback: usize) -> Result<DatedSeries, FetchError> {
        let (report, sort_column) = match metric {
            Metric::NetInjection => (self.settings.omo_report.as_str(), OMO_DATE),
            Metric::Rate => (self.settings.rate_report.as_str(), RATE_DATE),
        };

        let page_size = self.settings.page_size.to_string();
        let mut req = self.client.get(&self.settings.url).query(&[
            ("reportName", report),
            ("columns", "ALL"),
            ("sortColumns", sort_column),
            ("sortTypes", "-1"),
            ("pageNumber", "1"),
            ("pageSize", page_size.as_str()),
            ("source", "WEB"),
            ("client", "WEB"),
        ]);
        if metric == Metric::Rate {
            req = req.query(&[("filter", RATE_FILTER)]);
        }

        let text = req.send()?.error_for_status()?.text()?;
        let observations = parse_response(metric, &text)?;
        Ok(DatedSeries::from_observations(metric, observations, lookback))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    result: Option<ResultPage>,
}

#[derive(Debug, Deserialize)]
struct ResultPage {
    #[serde(default)]
    data: Vec<Value>,
}

/// Decode a data-center response body into raw observations.
pub fn parse_response(metric: Metric, body: &str) -> Result<Vec<Observation>, FetchError> {
    let envelope: Envelope = serde_json::from_str(body)?;

    if !envelope.success {
        return Err(FetchError::Format(format!(
            "data-center error: {}",
            envelope.message.unwrap_or_else(|| "no message".to_string())
        )));
    }

    // The API answers `result: null` when the query matched nothing.
    let Some(page) = envelope.result else {
        return Err(FetchError::EmptyPayload);
    };
    if page.data.is_empty() {
        return Err(FetchError::EmptyPayload);
    }

    page.data.iter().map(|record| parse_record(metric, record)).collect()
}

fn parse_record(metric: Metric, record: &Value) -> Result<Observation, FetchError> {
    let date_field = match metric {
        Metric::NetInjection => OMO_DATE,
        Metric::Rate => RATE_DATE,
    };
    let date = json_date(&record[date_field])
        .ok_or_else(|| FetchError::Format(format!("invalid {date_field}: {}", record[date_field])))?;

    let value = match metric {
        Metric::NetInjection => {
            let injected = json_number(&record[OMO_INJECTION]).unwrap_or(0.0);
            let matured = json_number(&record[OMO_MATURITY]).unwrap_or(0.0);
            Some((injected - matured) / YUAN_PER_YI)
        }
        Metric::Rate => json_number(&record[RATE_VALUE]),
    };

    Ok(Observation::new(date, value))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn amounts_are_converted_to_yi() {
        let body = r#"{"success":true,"result":{"pages":1,"data":[
            {"OPERATION_DATE":"2024-01-02 00:00:00","INJECT_AMOUNT":250000000000,"MATURE_AMOUNT":50000000000}
        ]}}"#;

        let obs = parse_response(Metric::NetInjection, body).unwrap();
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(obs[0].value, Some(2000.0));
    }

    #[test]
    fn rate_rows_keep_percent_units() {
        let body = r#"{"success":true,"result":{"data":[
            {"REPORT_DATE":"2024-01-02 00:00:00","IR_RATE":1.85},
            {"REPORT_DATE":"2024-01-03 00:00:00","IR_RATE":null}
        ]}}"#;

        let obs = parse_response(Metric::Rate, body).unwrap();
        assert_eq!(obs[0].value, Some(1.85));
        assert_eq!(obs[1].value, None);
    }

    #[test]
    fn null_result_is_empty_or_error() {
        let empty = parse_response(Metric::Rate, r#"{"success":true,"result":null}"#);
        assert!(matches!(empty, Err(FetchError::EmptyPayload)));

        let failed = parse_response(
            Metric::Rate,
            r#"{"success":false,"message":"report not found","result":null}"#,
        );
        assert!(matches!(failed, Err(FetchError::Format(ref m)) if m.contains("report not found")));
    }

    #[test]
    fn unsuccessful_envelope_with_result_is_an_error() {
        let body = r#"{"success":false,"message":"rate limited","result":{"data":[
            {"REPORT_DATE":"2024-01-02 00:00:00","IR_RATE":1.85}
        ]}}"#;
        let err = parse_response(Metric::Rate, body).unwrap_err();
        assert!(matches!(err, FetchError::Format(ref m) if m.contains("rate limited")));
    }
}
