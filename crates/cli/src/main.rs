//! # ventas-cli
//!
//! Command-line sales dashboard for spreadsheets.

mod render;
mod repl;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use ventas_core::session::EXPORT_FILE_NAME;
use ventas_core::{
    ChartGroupings, Choice, ColumnMapping, DashboardError, DashboardView, Dimension,
    KeywordTable, Metric, Role, Session, TableLoader, Upload, DEFAULT_FILE,
};
use ventas_sheet::Sheet;

/// ventas - Sales dashboard for spreadsheets
#[derive(Parser)]
#[command(name = "ventas")]
#[command(author, version, about = "Sales dashboard for spreadsheets", long_about = None)]
struct Cli {
    /// Spreadsheet to load (xlsx, xlsm, xls, ods, csv, tsv)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// File loaded when FILE is not given
    #[arg(long = "default-file", value_name = "PATH", default_value = DEFAULT_FILE)]
    default_file: PathBuf,

    /// Column for a role (region, vendedor, unidades, ventas, fecha)
    #[arg(short = 'm', long = "map", value_name = "ROLE=COLUMN")]
    map: Vec<String>,

    /// The file has no date column
    #[arg(long = "no-fecha")]
    no_fecha: bool,

    /// JSON file of keyword synonyms per role
    #[arg(long = "keywords", value_name = "FILE")]
    keywords: Option<PathBuf>,

    /// Only rows of this region
    #[arg(long)]
    region: Option<String>,

    /// Only rows of this salesperson
    #[arg(long)]
    vendedor: Option<String>,

    /// Grouping of every chart (region, vendedor)
    #[arg(short = 'g', long = "group-by", value_name = "DIMENSION")]
    group_by: Option<Dimension>,

    /// Grouping of the units chart
    #[arg(long = "units-by", value_name = "DIMENSION")]
    units_by: Option<Dimension>,

    /// Grouping of the sales chart
    #[arg(long = "sales-by", value_name = "DIMENSION")]
    sales_by: Option<Dimension>,

    /// Grouping of the sales share chart
    #[arg(long = "share-by", value_name = "DIMENSION")]
    share_by: Option<Dimension>,

    /// Salesperson to detail (defaults to the first one)
    #[arg(long)]
    detail: Option<String>,

    /// Export the filtered table (CSV, or XLSX when PATH ends in .xlsx)
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = EXPORT_FILE_NAME
    )]
    export: Option<PathBuf>,

    /// Write an HTML page with the charts
    #[arg(long, value_name = "PATH")]
    chart: Option<PathBuf>,

    /// Output format (table, json, csv)
    #[arg(short = 'f', long = "format", default_value = "table")]
    format: OutputFormat,

    /// Start REPL mode
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output format for results.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// JSON output
    Json,
    /// CSV of the filtered table
    Csv,
    /// Pretty tables (default)
    #[default]
    Table,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let keywords = load_keywords(cli.keywords.as_deref())?;

    let upload = cli
        .file
        .as_deref()
        .map(|path| {
            Upload::from_path(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))
        })
        .transpose()?;

    let mut loader = TableLoader::new(&cli.default_file);
    let raw = loader.load(upload.as_ref())?;
    if raw.is_empty() {
        println!("{}", no_data_message(loader.default_path()).yellow());
        return Ok(());
    }

    let mut mapping = ColumnMapping::guess(&keywords, &raw);
    for assignment in &cli.map {
        apply_override(&mut mapping, assignment)?;
    }
    if cli.no_fecha {
        mapping.set_use_fecha(false);
    }
    tracing::debug!(?mapping, "column mapping");

    if cli.interactive {
        return repl::run(raw, mapping, cli.format);
    }

    let mut session = open_session(raw, mapping)?;
    session.set_region(Choice::from(cli.region))?;
    session.set_vendedor(Choice::from(cli.vendedor))?;
    session.set_groupings(chart_groupings(
        cli.group_by,
        [cli.units_by, cli.sales_by, cli.share_by],
    ));
    session.set_detail(cli.detail)?;

    let view = session.view()?;
    render::print_view(&view, cli.format)?;

    if let Some(path) = &cli.export {
        export(&session, path)?;
    }
    if let Some(path) = &cli.chart {
        write_chart(&view, path)?;
    }

    Ok(())
}

/// Read the keyword table override, or the default table.
fn load_keywords(path: Option<&Path>) -> Result<KeywordTable> {
    let Some(path) = path else {
        return Ok(KeywordTable::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read keywords: {}", path.display()))?;
    KeywordTable::from_json(&json)
        .with_context(|| format!("Invalid keyword file: {}", path.display()))
}

/// Apply a `ROLE=COLUMN` override to the mapping.
fn apply_override(mapping: &mut ColumnMapping, assignment: &str) -> Result<()> {
    let (role, column) = assignment.split_once('=').with_context(|| {
        format!("Invalid mapping: '{assignment}'. Expected ROLE=COLUMN format")
    })?;
    let role: Role = role.parse()?;
    mapping.set(role, column.trim());
    Ok(())
}

/// Chart groupings from a shared default and per-chart overrides
/// (units, sales, share).
fn chart_groupings(group_by: Option<Dimension>, per_chart: [Option<Dimension>; 3]) -> ChartGroupings {
    let mut groupings = ChartGroupings::uniform(group_by.unwrap_or_default());
    for (metric, dimension) in Metric::ALL.into_iter().zip(per_chart) {
        if let Some(dimension) = dimension {
            groupings.set(metric, dimension);
        }
    }
    groupings
}

/// Open a session, adding a mapping hint to user-correctable errors.
fn open_session(raw: Arc<Sheet>, mapping: ColumnMapping) -> Result<Session> {
    let columns = raw.text_column_names().join(", ");
    Session::open(raw, mapping).map_err(|e| {
        if e.is_user_correctable() {
            anyhow::Error::new(e).context(format!(
                "Column mapping incomplete; adjust it with --map ROLE=COLUMN (columns: {columns})"
            ))
        } else {
            e.into()
        }
    })
}

fn no_data_message(default_path: &Path) -> String {
    DashboardError::EmptySource {
        default_file: default_path.display().to_string(),
    }
    .to_string()
}

/// Write the filtered table as CSV, or as XLSX for `.xlsx` paths; returns
/// the number of data rows written.
fn export(session: &Session, path: &Path) -> Result<usize> {
    let is_xlsx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));

    let filtered = session.filtered()?;
    if is_xlsx {
        filtered
            .save_as_xlsx(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    } else {
        let export = session.export_csv()?;
        std::fs::write(path, &export.content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let rows = filtered.row_count();
    println!(
        "{} {rows} rows to {}",
        "Exported".green().bold(),
        path.display()
    );
    Ok(rows)
}

/// Write the dashboard charts as an HTML page.
fn write_chart(view: &DashboardView, path: &Path) -> Result<()> {
    let html = ventas_viz::dashboard_html(view)?;
    std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} {}", "Charts written to".green().bold(), path.display());
    Ok(())
}
