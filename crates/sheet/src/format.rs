use crate::csv::CsvOptions;
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use std::path::Path;

/// File formats a sheet can be read from, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Excel or OpenDocument workbook (first worksheet)
    Spreadsheet,
    Csv,
    Tsv,
}

impl FileFormat {
    /// Detect the format from a file name or path
    ///
    /// # Errors
    ///
    /// Returns `SheetError::UnsupportedFormat` for unknown or missing extensions.
    pub fn detect(file_name: impl AsRef<Path>) -> Result<Self> {
        let extension = file_name
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileFormat::Spreadsheet),
            "csv" => Ok(FileFormat::Csv),
            "tsv" => Ok(FileFormat::Tsv),
            _ => Err(SheetError::UnsupportedFormat { extension }),
        }
    }
}

impl Sheet {
    /// Load a sheet from a file, picking the reader by extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match FileFormat::detect(path)? {
            FileFormat::Spreadsheet => Self::from_xlsx(path),
            FileFormat::Csv => Self::from_csv(path),
            FileFormat::Tsv => Self::from_csv_with_options(path, CsvOptions::tsv()),
        }
    }

    /// Load a sheet from in-memory file contents; `file_name` selects the reader
    pub fn from_bytes(file_name: &str, bytes: &[u8]) -> Result<Self> {
        match FileFormat::detect(file_name)? {
            FileFormat::Spreadsheet => Self::from_xlsx_bytes(bytes),
            FileFormat::Csv => Self::from_csv_reader(bytes, CsvOptions::default()),
            FileFormat::Tsv => Self::from_csv_reader(bytes, CsvOptions::tsv()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(FileFormat::detect("vendedores.xlsx").unwrap(), FileFormat::Spreadsheet);
        assert_eq!(FileFormat::detect("VENTAS.XLS").unwrap(), FileFormat::Spreadsheet);
        assert_eq!(FileFormat::detect("data/ventas.csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::detect("ventas.tsv").unwrap(), FileFormat::Tsv);
        assert!(matches!(
            FileFormat::detect("ventas.pdf"),
            Err(SheetError::UnsupportedFormat { extension }) if extension == "pdf"
        ));
        assert!(FileFormat::detect("ventas").is_err());
    }

    #[test]
    fn test_from_bytes_csv() {
        let sheet = Sheet::from_bytes("subida.csv", b"zona,monto\nNorte,5\n").unwrap();
        assert_eq!(sheet.row_count(), 1);
        assert_eq!(sheet.column_names(), vec!["zona", "monto"]);
    }
}
