//! Run settings: output location, lookback, HTTP headers and per-source endpoints.
//!
//! Everything has a default, so running without a settings file reproduces the
//! stock report. A TOML file may override any subset of fields.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

/// Top-level settings for one run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Report destination, overwritten on every run.
    pub output: PathBuf,
    /// Trailing rows kept from each fetched series.
    pub lookback: usize,
    pub http: HttpSettings,
    pub datayes: DatayesSettings,
    pub datacenter: DatacenterSettings,
    pub jsonp: JsonpSettings,
    pub browser: BrowserSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("public/index.html"),
            lookback: 90,
            http: HttpSettings::default(),
            datayes: DatayesSettings::default(),
            datacenter: DatacenterSettings::default(),
            jsonp: JsonpSettings::default(),
            browser: BrowserSettings::default(),
        }
    }
}

/// Request headers and timeout shared by the HTTP adapters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: String,
    pub referer: Option<String>,
    pub origin: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36"
                .to_string(),
            referer: Some("https://robo.datayes.com/".to_string()),
            origin: Some("https://robo.datayes.com".to_string()),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatayesSettings {
    pub omo_url: String,
    pub rate_url: String,
    /// Period code sent in the request body (e.g. `3M`).
    pub period: String,
}

impl Default for DatayesSettings {
    fn default() -> Self {
        Self {
            omo_url: "https://robo.datayes.com/v2/client/market/get_open_market_op".to_string(),
            rate_url: "https://robo.datayes.com/v2/client/market/get_interbank_rate".to_string(),
            period: "3M".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatacenterSettings {
    pub url: String,
    pub omo_report: String,
    pub rate_report: String,
    pub page_size: usize,
}

impl Default for DatacenterSettings {
    fn default() -> Self {
        Self {
            url: "https://datacenter-web.eastmoney.com/api/data/v1/get".to_string(),
            omo_report: "RPT_ECONOMY_OPEN_MARKET".to_string(),
            rate_report: "RPT_IMP_INTRESTRATEN".to_string(),
            page_size: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JsonpSettings {
    pub omo_url: String,
    pub rate_url: String,
    pub callback: String,
}

impl Default for JsonpSettings {
    fn default() -> Self {
        Self {
            omo_url: "https://www.chinamoney.com.cn/ags/ms/cm-u-bk-currency/OmoHis".to_string(),
            rate_url: "https://www.chinamoney.com.cn/ags/ms/cm-u-bk-currency/DrHis".to_string(),
            callback: "liquidityCallback".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub chrome_binary: PathBuf,
    pub omo_url: String,
    pub rate_url: String,
    /// Virtual time the page gets to run its scripts before the DOM is dumped.
    pub virtual_time_budget_ms: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_binary: PathBuf::from("chromium"),
            omo_url: "http://www.pbc.gov.cn/zhengcehuobisi/125207/125213/125431/125475/index.html"
                .to_string(),
            rate_url: "https://www.chinamoney.com.cn/chinese/bkdr/".to_string(),
            virtual_time_budget_ms: 10_000,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(2, format!("Failed to read settings '{}': {e}", path.display()))
        })?;
        Self::from_toml(&raw)
            .map_err(|e| AppError::new(2, format!("Invalid settings '{}': {e}", path.display())))
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}
