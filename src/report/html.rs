//! Static HTML report: header, three KPI boxes and a dual-axis Plotly chart.

use chrono::NaiveDateTime;
use serde_json::{Value, json};

use crate::domain::{AlignedTable, KpiSet, Metric, SignClass};
use crate::report::format::{fmt_rate, fmt_signed_int, fmt_timestamp};

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
pub const EMPTY_MESSAGE: &str = "数据为空或处理失败，无法生成报告。";

const PAGE_TITLE: &str = "央行流动性监测报告";
const CHART_ID: &str = "liquidity-chart";
const RATE_LINE_COLOR: &str = "#4682B4";

const STYLE: &str = "body { font-family: sans-serif; margin: 40px; } \
.container { max-width: 1200px; margin: auto; } \
.header { text-align: center; margin-bottom: 20px; } \
.kpi-container { display: flex; justify-content: space-around; text-align: center; margin-bottom: 40px; } \
.kpi-box { padding: 20px; border-radius: 8px; background-color: #f8f9fa; min-width: 200px; } \
.kpi-value { font-size: 2.5em; font-weight: bold; } \
.kpi-label { font-size: 1em; color: #6c757d; } \
.injection { color: #dc3545; } \
.withdrawal { color: #28a745; } \
#liquidity-chart { height: 600px; }";

/// Document written when there is nothing to report.
pub fn render_empty() -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"UTF-8\"></head>\
         <body><h1>{EMPTY_MESSAGE}</h1></body></html>\n"
    )
}

/// Full report for a non-empty table and its KPIs.
pub fn render_report(table: &AlignedTable, kpis: &KpiSet, generated_at: NaiveDateTime) -> String {
    let (data, layout) = chart_figure(table, kpis);
    let config = json!({ "responsive": true });

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"UTF-8\">");
    out.push_str(&format!("<title>{PAGE_TITLE}</title>"));
    out.push_str(&format!("<script src=\"{PLOTLY_CDN}\" charset=\"utf-8\"></script>"));
    out.push_str(&format!("<style>{STYLE}</style></head>\n"));

    out.push_str("<body><div class=\"container\">\n");
    out.push_str(&format!(
        "<div class=\"header\"><h1>{PAGE_TITLE}</h1><p>最后更新时间: {}</p></div>\n",
        fmt_timestamp(generated_at)
    ));

    out.push_str("<div class=\"kpi-container\">\n");
    out.push_str(&kpi_box(
        &fmt_signed_int(kpis.latest_injection),
        Some(SignClass::of(kpis.latest_injection)),
        &format!("最新净投放 ({})", Metric::NetInjection.unit_label()),
    ));
    out.push_str(&kpi_box(&fmt_rate(kpis.latest_rate), None, "最新 DR007 利率"));
    out.push_str(&kpi_box(
        &fmt_signed_int(kpis.trailing_mean),
        Some(SignClass::of(kpis.trailing_mean)),
        &format!(
            "近{}日平均净投放 ({})",
            crate::analysis::TRAILING_WINDOW,
            Metric::NetInjection.unit_label()
        ),
    ));
    out.push_str("</div>\n");

    out.push_str(&format!("<div id=\"{CHART_ID}\"></div>\n"));
    out.push_str(&format!(
        "<script>Plotly.newPlot(\"{CHART_ID}\", {}, {}, {});</script>\n",
        script_json(&data),
        script_json(&layout),
        script_json(&config)
    ));
    out.push_str("</div></body></html>\n");
    out
}

fn kpi_box(value: &str, class: Option<SignClass>, label: &str) -> String {
    let class_attr = match class {
        Some(c) => format!("kpi-value {}", c.css_class()),
        None => "kpi-value".to_string(),
    };
    format!(
        "<div class=\"kpi-box\"><div class=\"{class_attr}\">{value}</div>\
         <div class=\"kpi-label\">{label}</div></div>\n"
    )
}

/// Plotly `data` and `layout` for the bar + line chart.
pub fn chart_figure(table: &AlignedTable, kpis: &KpiSet) -> (Value, Value) {
    let dates: Vec<String> = table.dates().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    let injections: Vec<f64> = table.rows.iter().map(|r| r.net_injection).collect();
    let rates: Vec<f64> = table.rows.iter().map(|r| r.rate).collect();
    let colors: Vec<&str> = injections.iter().map(|&v| SignClass::of(v).bar_color()).collect();

    let data = json!([
        {
            "type": "bar",
            "name": Metric::NetInjection.legend(),
            "x": dates,
            "y": injections,
            "marker": { "color": colors },
            "yaxis": "y"
        },
        {
            "type": "scatter",
            "mode": "lines",
            "name": Metric::Rate.legend(),
            "x": dates,
            "y": rates,
            "line": { "color": RATE_LINE_COLOR, "width": 2 },
            "yaxis": "y2"
        }
    ]);

    let layout = json!({
        "title": { "text": format!("<b>中国央行流动性监测报告 (截至 {})</b>", kpis.as_of.format("%Y-%m-%d")) },
        "plot_bgcolor": "white",
        "xaxis": { "title": { "text": "日期" } },
        "yaxis": { "title": { "text": "<b>资金投放/回笼 (亿元)</b>" } },
        "yaxis2": {
            "title": { "text": "<b>DR007 利率 (%)</b>" },
            "overlaying": "y",
            "side": "right"
        },
        "legend": { "orientation": "h", "yanchor": "bottom", "y": 1.02, "xanchor": "right", "x": 1 }
    });

    (data, layout)
}

/// JSON safe to inline inside a `<script>` element.
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}
