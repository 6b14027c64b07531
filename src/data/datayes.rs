//! Datayes robo-advisor API: open-market operations and DR fixings.
//!
//! Both endpoints take a JSON POST body and answer with
//! `{"code": 0, "message": "...", "data": [ {...}, ... ]}`.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::DatayesSettings;
use crate::data::SourceAdapter;
use crate::data::parse::{json_date, json_number};
use crate::domain::{DatedSeries, Metric, Observation};
use crate::error::FetchError;

const OMO_DATE: &str = "opDate";
const OMO_INJECTION: &str = "opRepoMoney";
const OMO_MATURITY: &str = "opRepoDueMoney";
const RATE_DATE: &str = "tradeDate";
const RATE_VALUE: &str = "rateDR007";

pub struct DatayesAdapter {
    client: Client,
    settings: DatayesSettings,
}

impl DatayesAdapter {
    pub fn new(client: Client, settings: DatayesSettings) -> Self {
        Self { client, settings }
    }

    fn request(&self, metric: Metric) -> (&str, Value) {
        match metric {
            Metric::NetInjection => (
                self.settings.omo_url.as_str(),
                json!({ "opType": "RRP", "period": self.settings.period }),
            ),
            Metric::Rate => (
                self.settings.rate_url.as_str(),
                json!({ "rateType": "DR", "period": self.settings.period }),
            ),
        }
    }
}

impl SourceAdapter for DatayesAdapter {
    fn name(&self) -> &'static str {
        "datayes"
    }

    fn fetch(&self, metric: Metric, lookback: usize) -> Result<DatedSeries, FetchError> {
        let (url, body) = self.request(metric);
        let resp = self.client.post(url).json(&body).send()?.error_for_status()?;
        let text = resp.text()?;

        let observations = parse_response(metric, &text)?;
        Ok(DatedSeries::from_observations(metric, observations, lookback))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: Option<i64>,
    message: Option<String>,
    data: Option<Value>,
}

/// Decode a Datayes response body into raw observations.
pub fn parse_response(metric: Metric, body: &str) -> Result<Vec<Observation>, FetchError> {
    let envelope: Envelope = serde_json::from_str(body)?;

    let records = match (envelope.code, envelope.data) {
        (Some(0), Some(Value::Array(records))) => records,
        _ => {
            let message = envelope.message.unwrap_or_else(|| "no message".to_string());
            return Err(FetchError::Format(format!("datayes error or bad shape: {message}")));
        }
    };
    if records.is_empty() {
        return Err(FetchError::EmptyPayload);
    }

    records.iter().map(|record| parse_record(metric, record)).collect()
}

fn parse_record(metric: Metric, record: &Value) -> Result<Observation, FetchError> {
    let date_field = match metric {
        Metric::NetInjection => OMO_DATE,
        Metric::Rate => RATE_DATE,
    };
    let date = json_date(&record[date_field])
        .ok_or_else(|| FetchError::Format(format!("invalid {date_field}: {}", record[date_field])))?;

    let value = match metric {
        // Missing legs count as zero: a day may have only injections or only maturities.
        Metric::NetInjection => {
            let injected = json_number(&record[OMO_INJECTION]).unwrap_or(0.0);
            let matured = json_number(&record[OMO_MATURITY]).unwrap_or(0.0);
            Some(injected - matured)
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
    fn net_injection_is_injection_minus_maturity() {
        let body = r#"{"code":0,"message":"ok","data":[
            {"opDate":"2024-01-03","opRepoMoney":"1000","opRepoDueMoney":"1500"},
            {"opDate":"2024-01-02","opRepoMoney":2000,"opRepoDueMoney":null},
            {"opDate":"2024-01-04","opRepoMoney":"-","opRepoDueMoney":300}
        ]}"#;

        let obs = parse_response(Metric::NetInjection, body).unwrap();
        let values: Vec<_> = obs.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![Some(-500.0), Some(2000.0), Some(-300.0)]);
    }

    #[test]
    fn rate_non_numeric_is_absent() {
        let body = r#"{"code":0,"data":[
            {"tradeDate":"2024-01-02","rateDR007":"1.8512"},
            {"tradeDate":"2024-01-03","rateDR007":""}
        ]}"#;

        let obs = parse_response(Metric::Rate, body).unwrap();
        assert_eq!(obs[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(obs[0].value, Some(1.8512));
        assert_eq!(obs[1].value, None);
    }

    #[test]
    fn error_code_is_a_format_failure() {
        let body = r#"{"code":-403,"message":"forbidden","data":null}"#;
        let err = parse_response(Metric::Rate, body).unwrap_err();
        assert!(matches!(err, FetchError::Format(ref m) if m.contains("forbidden")));
    }

    #[test]
    fn empty_list_is_an_empty_payload() {
        let err = parse_response(Metric::Rate, r#"{"code":0,"data":[]}"#).unwrap_err();
        assert!(matches!(err, FetchError::EmptyPayload));
    }

    #[test]
    fn bad_date_fails_the_whole_payload() {
        let body = r#"{"code":0,"data":[{"tradeDate":"yesterday","rateDR007":"1.8"}]}"#;
        assert!(matches!(parse_response(Metric::Rate, body), Err(FetchError::Format(_))));
    }

    #[test]
    fn not_json_is_a_format_failure() {
        assert!(matches!(
            parse_response(Metric::Rate, "<html>gateway timeout</html>"),
            Err(FetchError::Format(_))
        ));
    }
}
