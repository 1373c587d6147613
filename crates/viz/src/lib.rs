//! # ventas-viz
//!
//! Chart generation for the ventas viewer.
//!
//! This crate turns aggregate series into chart specifications that can be:
//! - Serialized to JSON for another front end
//! - Rendered as a self-contained HTML page with Chart.js

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ventas_core::{round2, ChartSeries, DashboardView, Metric};

/// Errors while rendering charts.
#[derive(Debug, Error)]
pub enum VizError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for chart rendering.
pub type Result<T> = std::result::Result<T, VizError>;

const CHART_JS: &str = "https://cdn.jsdelivr.net/npm/chart.js";

// ===== Value formats =====

/// How chart values and table cells are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    /// Whole number with thousands separators
    #[default]
    Integer,
    /// Dollar amount with two decimals
    Currency,
    /// Percentage with two decimals
    Percent,
}

impl ValueFormat {
    /// The format used for a metric's chart.
    #[must_use]
    pub fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::Unidades => ValueFormat::Integer,
            Metric::Ventas => ValueFormat::Currency,
            Metric::PctVentas => ValueFormat::Percent,
        }
    }

    /// Format a value, e.g. `1,234`, `$1,234.50` or `12.34%`.
    ///
    /// Integers are truncated toward zero; percentages are rounded half
    /// away from zero to two decimals.
    #[must_use]
    pub fn format(self, value: f64) -> String {
        match self {
            // -0.0 + 0.0 is 0.0
            ValueFormat::Integer => group_thousands(value.trunc() + 0.0, 0),
            ValueFormat::Currency if value < 0.0 => format!("-${}", group_thousands(-value, 2)),
            ValueFormat::Currency => format!("${}", group_thousands(value, 2)),
            ValueFormat::Percent => format!("{:.2}%", round2(value)),
        }
    }
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{value:.decimals$}");
    let (sign, digits) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

// ===== Chart spec =====

/// Chart specification for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub data: ChartData,
    pub options: ChartOptions,
}

/// Chart data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// A dataset in a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(rename = "backgroundColor", skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// Chart rendering options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
    pub value_format: ValueFormat,
    pub show_legend: bool,
}

/// Escape HTML special characters to prevent XSS.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JSON safe to embed in a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn bar_color(metric: Metric) -> &'static str {
    match metric {
        Metric::Unidades => "#4e79a7",
        Metric::Ventas => "#59a14f",
        Metric::PctVentas => "#f28e2b",
    }
}

impl ChartSpec {
    /// Create an empty bar chart.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            data: ChartData::default(),
            options: ChartOptions::default(),
        }
    }

    /// Bar chart of one aggregate series: one bar per group.
    #[must_use]
    pub fn from_series(series: &ChartSeries) -> Self {
        let mut spec = Self::new(series.metric.to_string(), series.title);
        spec.data.labels = series.rows.iter().map(|row| row.key.clone()).collect();
        spec.data.datasets.push(Dataset {
            label: series.title.to_string(),
            data: series.rows.iter().map(|row| series.metric.value(row)).collect(),
            background_color: Some(bar_color(series.metric).to_string()),
        });
        spec.options.x_axis_label = Some(series.group_by.to_string());
        spec.options.y_axis_label = Some(series.metric.to_string());
        spec.options.value_format = ValueFormat::for_metric(series.metric);
        spec
    }

    /// Convert to JSON string for another front end.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Generate an HTML page with this chart and embedded Chart.js.
    pub fn to_html(&self) -> Result<String> {
        render_page(&self.title, std::slice::from_ref(self))
    }
}

/// The three bar charts of a dashboard view.
#[must_use]
pub fn dashboard_charts(view: &DashboardView) -> Vec<ChartSpec> {
    view.charts.iter().map(ChartSpec::from_series).collect()
}

/// A single HTML page with every chart of a dashboard view.
pub fn dashboard_html(view: &DashboardView) -> Result<String> {
    render_page("Ventas", &dashboard_charts(view))
}

fn render_page(title: &str, charts: &[ChartSpec]) -> Result<String> {
    let title = escape_html(title);
    let specs = script_json(&charts)?;

    let canvases: String = charts
        .iter()
        .map(|chart| {
            format!(
                "    <section><canvas id=\"{}\"></canvas></section>\n",
                escape_html(&chart.id)
            )
        })
        .collect();

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <script src="{CHART_JS}"></script>
    <style>section {{ max-width: 900px; margin: 2em auto; }}</style>
</head>
<body>
{canvases}    <script>
        const specs = {specs};
        const formatters = {{
            integer: (v) => v.toLocaleString('en-US', {{ maximumFractionDigits: 0 }}),
            currency: (v) => v.toLocaleString('en-US', {{ style: 'currency', currency: 'USD' }}),
            percent: (v) => v.toFixed(2) + '%'
        }};
        for (const spec of specs) {{
            const format = formatters[spec.options.value_format];
            new Chart(document.getElementById(spec.id).getContext('2d'), {{
                type: 'bar',
                data: spec.data,
                options: {{
                    responsive: true,
                    plugins: {{
                        title: {{ display: true, text: spec.title }},
                        legend: {{ display: spec.options.show_legend }},
                        tooltip: {{ callbacks: {{ label: (ctx) => format(ctx.parsed.y) }} }}
                    }},
                    scales: {{
                        x: {{ title: {{ display: true, text: spec.options.x_axis_label }} }},
                        y: {{ ticks: {{ callback: (v) => format(v) }} }}
                    }}
                }}
            }});
        }}
    </script>
</body>
</html>"#
    ))
}
