//! Sheet module for ventas
//!
//! A rectangular table of named columns read from spreadsheets or CSV files,
//! with the cell type used by every other crate in the workspace.
//!
//! # Examples
//!
//! ## Creating a sheet from data
//!
//! The first row is the header:
//!
//! ```
//! use ventas_sheet::{CellValue, Sheet};
//!
//! let sheet = Sheet::from_data(vec![
//!     vec!["Zona", "Nombre", "Monto"],
//!     vec!["Norte", "Ana", "100"],
//! ]);
//!
//! assert_eq!(sheet.row_count(), 1);
//! assert_eq!(sheet.column_names(), vec!["Zona", "Nombre", "Monto"]);
//! ```
//!
//! ## Loading from a file
//!
//! ```no_run
//! use ventas_sheet::Sheet;
//!
//! let sheet = Sheet::from_path("vendedores.xlsx").unwrap();
//! ```

mod cell;
mod csv;
mod error;
mod format;
mod record_batch;
mod sheet;
mod xlsx;

/// Re-export cell value type.
pub use cell::{CellValue, DATETIME_FORMAT};
/// Re-export CSV options.
pub use csv::CsvOptions;
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export file format detection.
pub use format::FileFormat;
/// Re-export sheet type.
pub use sheet::Sheet;
