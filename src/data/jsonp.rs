//! Public-site API that wraps its JSON in a JavaScript callback.
//!
//! Body shape: `liquidityCallback({"code":0,"records":[["2024-01-02","1.85"], ...]});`
//! Rows are positional: `[date, rate]` for the rate history and
//! `[date, injection, maturity]` for open-market operations.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::JsonpSettings;
use crate::data::SourceAdapter;
use crate::data::parse::{json_date, json_number};
use crate::domain::{DatedSeries, Metric, Observation};
use crate::error::FetchError;

pub struct JsonpAdapter {
    client: Client,
    settings: JsonpSettings,
}

impl JsonpAdapter {
    pub fn new(client: Client, settings: JsonpSettings) -> Self {
        Self { client, settings }
    }
}

impl SourceAdapter for JsonpAdapter {
    fn name(&self) -> &'static str {
        "jsonp"
    }

    fn fetch(&self, metric: Metric, lookback: usize) -> Result<DatedSeries, FetchError> {
        let url = match metric {
            Metric::NetInjection => &self.settings.omo_url,
            Metric::Rate => &self.settings.rate_url,
        };

        let text = self
            .client
            .get(url)
            .query(&[("callback", self.settings.callback.as_str())])
            .send()?
            .error_for_status()?
            .text()?;

        let observations = parse_response(metric, &text)?;
        Ok(DatedSeries::from_observations(metric, observations, lookback))
    }
}

/// Strip the `callback( ... );` wrapper and return the JSON inside.
pub fn unwrap_callback(body: &str) -> Result<&str, FetchError> {
    let open = body
        .find('(')
        .ok_or_else(|| FetchError::Format("no callback wrapper in response".to_string()))?;
    let close = body
        .rfind(')')
        .filter(|&close| close > open)
        .ok_or_else(|| FetchError::Format("unterminated callback wrapper".to_string()))?;
    Ok(body[open + 1..close].trim())
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    records: Vec<Vec<Value>>,
}

/// Decode a callback-wrapped response body into raw observations.
pub fn parse_response(metric: Metric, body: &str) -> Result<Vec<Observation>, FetchError> {
    let payload: Payload = serde_json::from_str(unwrap_callback(body)?)?;
    if payload.code != 0 {
        return Err(FetchError::Format(format!(
            "callback api error {}: {}",
            payload.code,
            payload.message.unwrap_or_default()
        )));
    }
    if payload.records.is_empty() {
        return Err(FetchError::EmptyPayload);
    }

    payload
        .records
        .iter()
        .map(|row| {
            let date = row
                .first()
                .and_then(json_date)
                .ok_or_else(|| FetchError::Format(format!("row without a valid date: {row:?}")))?;
            let cell = |idx: usize| row.get(idx).and_then(json_number);
            let value = match metric {
                Metric::NetInjection => Some(cell(1).unwrap_or(0.0) - cell(2).unwrap_or(0.0)),
                Metric::Rate => cell(1),
            };
            Ok(Observation::new(date, value))
        })
        .collect()
}
