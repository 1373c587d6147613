//! # ventas-core
//!
//! Sales-table pipeline for the ventas viewer.
//!
//! This crate provides:
//! - A memoizing table loader (upload, default file, or nothing)
//! - Keyword-based column role guessing and canonical renaming
//! - Numeric and date coercion
//! - Cascading region/salesperson filters
//! - Group-by aggregation, per-salesperson detail and headline metrics
//! - A [`Session`] that recomputes a [`DashboardView`] on every change
//!
//! ```
//! use std::sync::Arc;
//! use ventas_core::{ColumnMapping, KeywordTable, Session};
//! use ventas_sheet::Sheet;
//!
//! let raw = Arc::new(Sheet::from_data(vec![
//!     vec!["Zona", "Nombre", "Unidades", "Monto"],
//!     vec!["North", "Ana", "10", "100"],
//! ]));
//! let mapping = ColumnMapping::guess(&KeywordTable::default(), &raw);
//! let session = Session::open(raw, mapping).unwrap();
//! assert_eq!(session.view().unwrap().summary.ventas, 100.0);
//! ```

/// Group-by aggregation.
pub mod aggregate;
/// Per-salesperson detail and filter summary.
pub mod detail;
/// Error types and result aliases.
pub mod error;
/// Region and salesperson filters.
pub mod filter;
/// Memoizing table loader.
pub mod loader;
/// Column role guessing and renaming.
pub mod mapper;
/// Numeric and date coercion.
pub mod normalize;
/// Roles, dimensions and keyword synonyms.
pub mod role;
/// Dashboard session state.
pub mod session;

pub use aggregate::{aggregate, round2, AggregateRow};
pub use detail::{detail, detail_rows, summarize, DetailSummary, FilterSummary};
pub use error::{DashboardError, Result};
pub use filter::{apply_filters, distinct_values, vendedor_options, Choice, FilterSelection};
pub use loader::{TableLoader, Upload, DEFAULT_FILE};
pub use mapper::{apply_mapping, guess_role, ColumnMapping};
pub use normalize::{coerce_datetime, coerce_numeric, normalize};
pub use role::{Dimension, KeywordTable, Role};
pub use session::{
    ChartGroupings, ChartSeries, CsvExport, DashboardView, DetailReport, Metric, Session,
};
