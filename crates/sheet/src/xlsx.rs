use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::sheet::{dedupe_headers, fit_width, Sheet};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or(CellValue::Float(dt.as_f64()), CellValue::DateTime),
        Data::DateTimeIso(s) => CellValue::String(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}

fn spreadsheet_error(e: impl ToString) -> SheetError {
    SheetError::Spreadsheet(e.to_string())
}

/// Read the first worksheet, using its first row as header (repeated names
/// are suffixed)
fn read_first_worksheet<RS: Read + Seek>(mut workbook: Sheets<RS>) -> Result<Sheet> {
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Ok(Sheet::new());
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(spreadsheet_error)?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(data_to_cell_value).collect::<Vec<CellValue>>());

    let Some(headers) = rows.next() else {
        return Ok(Sheet::with_name(&sheet_name));
    };
    let width = headers.len();
    let data = rows.map(|row| fit_width(row, width)).collect();

    Sheet::from_parts(&sheet_name, dedupe_headers(headers), data)
}

impl Sheet {
    /// Load the first worksheet of a spreadsheet file (xlsx, xlsm, xlsb, xls, ods)
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or is not a readable workbook.
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        let workbook = open_workbook_auto(path.as_ref()).map_err(spreadsheet_error)?;
        read_first_worksheet(workbook)
    }

    /// Load the first worksheet of an in-memory spreadsheet
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a readable workbook.
    pub fn from_xlsx_bytes(bytes: &[u8]) -> Result<Self> {
        let workbook =
            open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(spreadsheet_error)?;
        read_first_worksheet(workbook)
    }

    /// Save the sheet to an Excel file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or written.
    pub fn save_as_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut workbook = self.to_workbook()?;
        workbook.save(path.as_ref()).map_err(spreadsheet_error)
    }

    /// Serialize the sheet as xlsx bytes
    ///
    /// # Errors
    ///
    /// Returns error if the workbook cannot be assembled.
    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>> {
        let mut workbook = self.to_workbook()?;
        workbook.save_to_buffer().map_err(spreadsheet_error)
    }

    fn to_workbook(&self) -> Result<Workbook> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        self.write_to_worksheet(worksheet).map_err(spreadsheet_error)?;
        Ok(workbook)
    }

    /// Write header and rows to a worksheet
    fn write_to_worksheet(&self, worksheet: &mut Worksheet) -> std::result::Result<(), XlsxError> {
        worksheet.set_name(self.name())?;

        let header = std::iter::once(self.headers());
        for (row_idx, row) in header.chain(self.rows()).enumerate() {
            let row_num = u32::try_from(row_idx).map_err(|_| XlsxError::RowColumnLimitError)?;
            for (col_idx, cell) in row.iter().enumerate() {
                let col_num =
                    u16::try_from(col_idx).map_err(|_| XlsxError::RowColumnLimitError)?;

                match cell {
                    CellValue::Null => {}
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(row_num, col_num, *b)?;
                    }
                    CellValue::Int(i) => {
                        // Excel stores all numbers as f64
                        worksheet.write_number(row_num, col_num, *i as f64)?;
                    }
                    CellValue::Float(f) => {
                        worksheet.write_number(row_num, col_num, *f)?;
                    }
                    CellValue::String(s) => {
                        worksheet.write_string(row_num, col_num, s)?;
                    }
                    CellValue::DateTime(_) => {
                        worksheet.write_string(row_num, col_num, cell.to_string())?;
                    }
                }
            }
        }

        Ok(())
    }
}
