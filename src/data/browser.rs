//! Headless-browser scrape of the published HTML tables.
//!
//! The pages build their tables with client-side scripts, so a plain HTTP GET
//! returns an empty shell. We launch a headless Chromium with `--dump-dom`,
//! read the rendered DOM from its stdout and scan the first `<table>`.
//!
//! Expected row layouts (cells of a `<tr>`):
//! - open-market operations: `date | injection | maturity`
//! - rate history: `date | rate`
//!
//! Rows that do not fit (header rows, merged cells, bad numbers) are skipped.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::config::BrowserSettings;
use crate::data::SourceAdapter;
use crate::data::parse::{parse_date, parse_number};
use crate::domain::{DatedSeries, Metric, Observation};
use crate::error::FetchError;

pub struct BrowserAdapter {
    settings: BrowserSettings,
    timeout_secs: u64,
}

impl BrowserAdapter {
    pub fn new(settings: BrowserSettings, timeout_secs: u64) -> Self {
        Self {
            settings,
            timeout_secs,
        }
    }
}

impl SourceAdapter for BrowserAdapter {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn fetch(&self, metric: Metric, lookback: usize) -> Result<DatedSeries, FetchError> {
        let url = match metric {
            Metric::NetInjection => &self.settings.omo_url,
            Metric::Rate => &self.settings.rate_url,
        };

        let mut browser = BrowserProcess::launch(
            &self.settings.chrome_binary,
            url,
            self.settings.virtual_time_budget_ms,
            self.timeout_secs,
        )?;
        let html = browser.dump_dom()?;
        drop(browser);

        let observations = parse_table(metric, &html);
        if observations.is_empty() {
            return Err(FetchError::EmptyPayload);
        }
        Ok(DatedSeries::from_observations(metric, observations, lookback))
    }
}

/// Slack on top of Chromium's own `--timeout` before we stop waiting for output.
const READ_GRACE: Duration = Duration::from_secs(5);

/// Owns the Chromium child process; it is killed and reaped on drop.
pub struct BrowserProcess {
    child: Child,
    /// Wall-clock bound on reading the dumped DOM.
    read_timeout: Duration,
}

impl BrowserProcess {
    pub fn launch(
        binary: &Path,
        url: &str,
        virtual_time_budget_ms: u64,
        timeout_secs: u64,
    ) -> Result<Self, FetchError> {
        debug!(binary = %binary.display(), url, "launching headless browser");
        let budget = format!("--virtual-time-budget={virtual_time_budget_ms}");
        let timeout = format!("--timeout={}", timeout_secs * 1000);
        let child = Command::new(binary)
            .args([
                "--headless",
                "--disable-gpu",
                "--no-sandbox",
                "--no-first-run",
                budget.as_str(),
                timeout.as_str(),
                "--dump-dom",
                url,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| FetchError::Process(format!("failed to launch '{}': {e}", binary.display())))?;
        let read_timeout = Duration::from_secs(timeout_secs)
            + Duration::from_millis(virtual_time_budget_ms)
            + READ_GRACE;
        Ok(Self { child, read_timeout })
    }

    #[cfg(test)]
    fn from_child(child: Child, read_timeout: Duration) -> Self {
        Self { child, read_timeout }
    }

    /// Read the rendered DOM and wait for the browser to exit.
    ///
    /// Gives up after `read_timeout`; the hung process is then killed on drop,
    /// which also closes the pipe and ends the reader thread.
    pub fn dump_dom(&mut self) -> Result<String, FetchError> {
        let mut stdout = self
            .child
            .stdout
            .take()
            .ok_or_else(|| FetchError::Process("browser stdout not captured".to_string()))?;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut html = String::new();
            let result = stdout.read_to_string(&mut html).map(|_| html);
            let _ = tx.send(result);
        });

        let html = match rx.recv_timeout(self.read_timeout) {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => {
                return Err(FetchError::Process(format!("failed to read browser output: {e}")));
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                return Err(FetchError::Process(format!(
                    "browser produced no DOM within {}s",
                    self.read_timeout.as_secs()
                )));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(FetchError::Process("browser output reader stopped".to_string()));
            }
        };

        let status = self
            .child
            .wait()
            .map_err(|e| FetchError::Process(format!("failed to wait for browser: {e}")))?;
        if !status.success() {
            return Err(FetchError::Process(format!("browser exited with {status}")));
        }
        Ok(html)
    }
}

impl Drop for BrowserProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            debug!(pid = self.child.id(), "terminating headless browser");
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

/// Extract observations from the first table in `html`.
pub fn parse_table(metric: Metric, html: &str) -> Vec<Observation> {
    table_rows(html)
        .into_iter()
        .filter_map(|cells| {
            let parsed = parse_row(metric, &cells);
            if parsed.is_none() {
                debug!(?cells, "skipping unparseable table row");
            }
            parsed
        })
        .collect()
}

fn parse_row(metric: Metric, cells: &[String]) -> Option<Observation> {
    let date = parse_date(cells.first()?)?;
    let value = match metric {
        Metric::NetInjection => {
            let injected = parse_number(cells.get(1)?)?;
            let matured = parse_number(cells.get(2)?)?;
            injected - matured
        }
        Metric::Rate => parse_number(cells.get(1)?)?,
    };
    Some(Observation::new(date, Some(value)))
}

/// Text of every `<td>` cell, grouped by `<tr>`, within the first `<table>`.
///
/// Rows without `<td>` cells (e.g. `<th>` header rows) are omitted.
pub fn table_rows(html: &str) -> Vec<Vec<String>> {
    // ASCII lowercasing keeps byte offsets identical to `html`.
    let lower = html.to_ascii_lowercase();
    let Some(start) = lower.find("<table") else {
        return Vec::new();
    };
    let end = lower[start..]
        .find("</table>")
        .map(|i| start + i)
        .unwrap_or(lower.len());

    let mut rows = Vec::new();
    for (row_start, row_end) in blocks(&lower, start, end, "<tr", "</tr>") {
        let cells: Vec<String> = blocks(&lower, row_start, row_end, "<td", "</td>")
            .into_iter()
            .map(|(s, e)| cell_text(&html[s..e]))
            .collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    rows
}

/// Byte ranges of the inner content of `open ... close` blocks within `[from, to)`.
fn blocks(lower: &str, from: usize, to: usize, open: &str, close: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut pos = from;
    while let Some(rel) = lower[pos..to].find(open) {
        let tag_start = pos + rel;
        // Require a tag boundary so `<tr` does not match `<track`.
        let after = lower.as_bytes().get(tag_start + open.len()).copied();
        if !matches!(after, Some(b'>' | b' ' | b'\t' | b'\n' | b'\r' | b'/')) {
            pos = tag_start + open.len();
            continue;
        }
        let Some(gt) = lower[tag_start..to].find('>') else {
            break;
        };
        let content_start = tag_start + gt + 1;
        // Unclosed cells/rows run until the next opening tag or the outer end.
        let content_end = [
            lower[content_start..to].find(close),
            lower[content_start..to].find(open),
        ]
        .into_iter()
        .flatten()
        .min()
        .map(|i| content_start + i)
        .unwrap_or(to);
        out.push((content_start, content_end));
        pos = content_end;
    }
    out
}

fn cell_text(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut in_tag = false;
    for ch in raw.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const OMO_PAGE: &str = r#"
        <html><body>
        <div class="nav"><table><tr><td>not this one</td></tr></table></div>
        </body></html>"#;

    const RATE_PAGE: &str = r#"
        <html><body>
        <TABLE class="san-sheet-alternating">
          <THEAD><TR><TH>日期</TH><TH>DR007</TH></TR></THEAD>
          <tbody>
            <tr><td><span>2024-01-03</span></td><td>1.8700</td></tr>
            <tr class="odd"><td>2024-01-02</td><td> 1.8500 </td></tr>
            <tr><td colspan="2">数据来源: 中国外汇交易中心</td></tr>
            <tr><td>2024-01-04</td><td>--</td></tr>
          </tbody>
        </TABLE>
        <table><tr><td>2024-01-05</td><td>9.99</td></tr></table>
        </body></html>"#;

    #[test]
    fn percent_cells_with_entity_spacing_parse() {
        let html = "<table>\
            <tr><td>2024-01-02</td><td>1.85&nbsp;%</td></tr>\
            <tr><td>2024-01-03</td><td>1.86 %</td></tr>\
            </table>";
        let values: Vec<_> = parse_table(Metric::Rate, html).into_iter().map(|o| o.value).collect();
        assert_eq!(values, vec![Some(1.85), Some(1.86)]);
    }

    #[test]
    fn scrapes_first_table_and_skips_bad_rows() {
        let obs = parse_table(Metric::Rate, RATE_PAGE);
        assert_eq!(
            obs,
            vec![
                Observation::new(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), Some(1.87)),
                Observation::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), Some(1.85)),
            ]
        );
    }

    #[test]
    fn injection_rows_need_both_legs() {
        let html = r#"<table>
            <tr><td>2024-01-02</td><td>1,000</td><td>400</td></tr>
            <tr><td>2024-01-03</td><td>800</td></tr>
            <tr><td>2024-01-04</td><td>0</td><td>250</td></tr>
        </table>"#;
        let values: Vec<_> = parse_table(Metric::NetInjection, html)
            .into_iter()
            .map(|o| o.value)
            .collect();
        assert_eq!(values, vec![Some(600.0), Some(-250.0)]);
    }

    #[test]
    fn page_without_data_rows_yields_nothing() {
        assert!(parse_table(Metric::Rate, OMO_PAGE).is_empty());
        assert!(parse_table(Metric::Rate, "<html><body>maintenance</body></html>").is_empty());
    }

    #[test]
    fn cell_text_strips_tags_and_entities() {
        assert_eq!(cell_text("<b>1.85</b>&nbsp;%"), "1.85 %");
        assert_eq!(cell_text("\n  a  &amp;\n b "), "a & b");
    }

    #[test]
    fn launch_failure_is_a_process_error() {
        let err = BrowserProcess::launch(
            Path::new("/nonexistent/chromium-for-tests"),
            "about:blank",
            0,
            1,
        )
        .err()
        .unwrap();
        assert!(matches!(err, FetchError::Process(_)));
        assert_eq!(err.kind(), "transport");
    }

    #[cfg(unix)]
    #[test]
    fn dropping_the_guard_terminates_the_process() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let guard = BrowserProcess::from_child(child, Duration::from_secs(1));
        let pid = guard.child.id();
        drop(guard);

        // A reaped pid no longer exists under /proc.
        assert!(!Path::new(&format!("/proc/{pid}")).exists());
    }

    #[cfg(unix)]
    #[test]
    fn dump_dom_reads_child_stdout() {
        let child = Command::new("sh")
            .args(["-c", "printf '<table><tr><td>2024-01-02</td><td>1.9</td></tr></table>'"])
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let mut guard = BrowserProcess::from_child(child, Duration::from_secs(10));
        let html = guard.dump_dom().unwrap();
        assert_eq!(parse_table(Metric::Rate, &html).len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn hung_browser_times_out_and_is_torn_down() {
        let child = Command::new("sleep")
            .arg("30")
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let mut guard = BrowserProcess::from_child(child, Duration::from_millis(200));
        let pid = guard.child.id();

        let started = std::time::Instant::now();
        let err = guard.dump_dom().unwrap_err();
        assert!(matches!(err, FetchError::Process(ref m) if m.contains("no DOM")));
        assert!(started.elapsed() < Duration::from_secs(10));

        drop(guard);
        assert!(!Path::new(&format!("/proc/{pid}")).exists());
    }
}
