//! Terminal rendering of dashboard views.

use crate::OutputFormat;
use anyhow::Result;
use arrow::util::pretty::pretty_format_batches;
use colored::Colorize;
use ventas_core::{ChartSeries, DashboardView, DetailReport, FilterSummary};
use ventas_sheet::{CellValue, Sheet};
use ventas_viz::ValueFormat;

/// Print a view in the requested format.
pub fn print_view(view: &DashboardView, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(view)?),
        OutputFormat::Csv => print!("{}", view.table.to_csv_string()),
        OutputFormat::Table => {
            print_summary(&view.summary);
            println!();
            print_sheet(&view.table)?;
            for chart in &view.charts {
                println!();
                print_series(chart)?;
            }
            println!();
            print_detail(view.detail.as_ref())?;
        }
    }
    Ok(())
}

/// One line of headline metrics.
pub fn summary_line(summary: &FilterSummary) -> String {
    format!(
        "Registros: {} | Unidades: {} | Ventas: {} | % del total: {}",
        summary.registros,
        ValueFormat::Integer.format(summary.unidades),
        ValueFormat::Currency.format(summary.ventas),
        ValueFormat::Percent.format(summary.pct_global),
    )
}

pub fn print_summary(summary: &FilterSummary) {
    println!("{}", summary_line(summary).bold());
}

/// Print a sheet as a pretty table.
pub fn print_sheet(sheet: &Sheet) -> Result<()> {
    if sheet.row_count() == 0 {
        println!("(empty table)");
        return Ok(());
    }
    let batch = sheet.to_record_batch()?;
    println!("{}", pretty_format_batches(&[batch])?);
    Ok(())
}

/// One chart's aggregate rows as a two-column table of formatted values.
pub fn series_sheet(series: &ChartSeries) -> Sheet {
    let format = ValueFormat::for_metric(series.metric);
    let mut data = vec![vec![
        CellValue::from(series.group_by.column()),
        CellValue::from(series.title),
    ]];
    data.extend(series.rows.iter().map(|row| {
        vec![
            CellValue::from(row.key.as_str()),
            CellValue::from(format.format(series.metric.value(row))),
        ]
    }));
    Sheet::from_data(data)
}

fn print_series(series: &ChartSeries) -> Result<()> {
    println!(
        "{}",
        format!("{} por {}", series.title, series.group_by).cyan().bold()
    );
    print_sheet(&series_sheet(series))
}

/// Print the detail report, or the no-salespeople notice.
pub fn print_detail(report: Option<&DetailReport>) -> Result<()> {
    let Some(report) = report else {
        println!("{}", "No salespeople in the current filter".yellow());
        return Ok(());
    };
    let summary = &report.summary;
    println!("{}", format!("Detalle de {}", summary.vendedor).cyan().bold());
    println!(
        "Registros: {} | Unidades: {} | Ventas: {} | % de ventas: {}",
        summary.registros,
        ValueFormat::Integer.format(summary.unidades),
        ValueFormat::Currency.format(summary.ventas),
        ValueFormat::Percent.format(summary.pct),
    );
    print_sheet(&report.rows)
}

/// Print a list of options, one per line.
pub fn print_options(title: &str, options: &[String]) {
    println!("{}", title.cyan().bold());
    if options.is_empty() {
        println!("  (none)");
    }
    for option in options {
        println!("  {option}");
    }
}
