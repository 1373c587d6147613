use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};

/// A table of named columns (row-major storage).
///
/// The header keeps the original cell of each column name so callers can
/// tell text headers from numeric or date headers read out of a spreadsheet.
/// The file loaders make names unique; sheets built in memory may repeat a
/// name, and lookups by name resolve to the first matching column.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    headers: Vec<CellValue>,
    rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// Create a new empty sheet
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("Sheet1")
    }

    /// Create a new empty sheet with a name
    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Create a sheet from a 2D vector of values, using the first row as header.
    ///
    /// Data rows are padded with nulls (or truncated) to the header width.
    #[must_use]
    pub fn from_data<T: Into<CellValue>>(data: Vec<Vec<T>>) -> Self {
        let mut rows = data
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect::<Vec<CellValue>>());

        let headers = rows.next().unwrap_or_default();
        let width = headers.len();
        let rows = rows.map(|row| fit_width(row, width)).collect();

        Sheet {
            name: "Sheet1".to_string(),
            headers,
            rows,
        }
    }

    /// Create a sheet from a header and rows of the same width
    ///
    /// # Errors
    ///
    /// Returns `SheetError::LengthMismatch` if any row width differs from the header.
    pub fn from_parts(
        name: &str,
        headers: Vec<CellValue>,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self> {
        if let Some(row) = rows.iter().find(|row| row.len() != headers.len()) {
            return Err(SheetError::LengthMismatch {
                expected: headers.len(),
                actual: row.len(),
            });
        }

        Ok(Sheet {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of data rows (the header is not counted)
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.headers.len()
    }

    /// A sheet without data rows or without columns is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.headers.is_empty()
    }

    // ===== Columns =====

    /// Get the header cells
    #[must_use]
    pub fn headers(&self) -> &[CellValue] {
        &self.headers
    }

    /// Get every column name as text
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.headers.iter().map(ToString::to_string).collect()
    }

    /// Get the names of the columns whose header cell is text
    #[must_use]
    pub fn text_column_names(&self) -> Vec<&str> {
        self.headers
            .iter()
            .filter_map(|header| match header {
                CellValue::String(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Find the index of the first text column with the given name
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| matches!(header, CellValue::String(s) if s == name))
    }

    /// Check whether a text column with the given name exists
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn column_index_by_name(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| SheetError::ColumnNotFound {
                name: name.to_string(),
            })
    }

    /// Rename the column at `index`
    pub fn rename_column(&mut self, index: usize, name: &str) -> Result<()> {
        let count = self.col_count();
        let header = self
            .headers
            .get_mut(index)
            .ok_or(SheetError::ColumnIndexOutOfBounds { index, count })?;
        *header = CellValue::String(name.to_string());
        Ok(())
    }

    /// Get the values of a column by name
    pub fn column_by_name(&self, name: &str) -> Result<Vec<&CellValue>> {
        let index = self.column_index_by_name(name)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Apply a function to every cell of a column by name
    pub fn column_map_by_name<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        F: Fn(&CellValue) -> CellValue,
    {
        let index = self.column_index_by_name(name)?;
        for row in &mut self.rows {
            row[index] = f(&row[index]);
        }
        Ok(())
    }

    // ===== Cell Access =====

    /// Get a cell value by data row and column index (0-based)
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Get a cell value by data row index and column name
    pub fn get_by_name(&self, row: usize, col_name: &str) -> Result<&CellValue> {
        let col = self.column_index_by_name(col_name)?;
        self.get(row, col).ok_or(SheetError::RowIndexOutOfBounds {
            index: row,
            count: self.row_count(),
        })
    }

    /// Iterate over the data rows
    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Build a new sheet with the same header and only the rows matching the predicate
    #[must_use]
    pub fn filtered<F>(&self, predicate: F) -> Sheet
    where
        F: Fn(&[CellValue]) -> bool,
    {
        Sheet {
            name: self.name.clone(),
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| predicate(row))
                .cloned()
                .collect(),
        }
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}

/// Sheets serialize as a list of records keyed by column name.
impl Serialize for Sheet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let names = self.column_names();
        let mut seq = serializer.serialize_seq(Some(self.row_count()))?;
        for row in self.rows() {
            seq.serialize_element(&Record { names: &names, row })?;
        }
        seq.end()
    }
}

struct Record<'a> {
    names: &'a [String],
    row: &'a [CellValue],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, cell) in self.names.iter().zip(self.row) {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

/// Make header names unique by suffixing repeats with `.1`, `.2`, ...
///
/// `Notas, Notas` becomes `Notas, Notas.1`. A suffixed name that is already
/// taken moves on to the next number. Non-repeated cells are left untouched.
pub(crate) fn dedupe_headers(headers: Vec<CellValue>) -> Vec<CellValue> {
    let mut taken: HashSet<String> = headers.iter().map(ToString::to_string).collect();
    let mut counts: HashMap<String, usize> = HashMap::new();

    headers
        .into_iter()
        .map(|header| {
            let name = header.to_string();
            let count = counts.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                return header;
            }
            loop {
                let candidate = format!("{name}.{}", *count - 1);
                if taken.insert(candidate.clone()) {
                    return CellValue::String(candidate);
                }
                *count += 1;
            }
        })
        .collect()
}

/// Pad a row with nulls or truncate it so it matches `width`
pub(crate) fn fit_width(mut row: Vec<CellValue>, width: usize) -> Vec<CellValue> {
    row.resize(width, CellValue::Null);
    row
}
