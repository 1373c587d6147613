//! Arrow record batch conversion for Sheet
//!
//! Used by front ends that hand tables to Arrow tooling, such as the
//! pretty-printer in `arrow::util::pretty`.

use crate::cell::CellValue;
use crate::error::Result;
use crate::sheet::Sheet;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use std::sync::Arc;

impl Sheet {
    /// Convert the sheet to a single Arrow record batch
    ///
    /// Column types are inferred from the cells; mixed or date-time columns
    /// become UTF-8 text.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let col_types: Vec<DataType> = (0..self.col_count())
            .map(|col_idx| infer_column_type(self, col_idx))
            .collect();

        let fields: Vec<Field> = self
            .column_names()
            .iter()
            .zip(col_types.iter())
            .map(|(name, dtype)| Field::new(name, dtype.clone(), true))
            .collect();
        let schema = Arc::new(Schema::new(fields));

        let arrays: Vec<ArrayRef> = col_types
            .iter()
            .enumerate()
            .map(|(col_idx, dtype)| build_arrow_array(self, col_idx, dtype))
            .collect();

        Ok(RecordBatch::try_new(schema, arrays)?)
    }
}

/// Infer the Arrow DataType for a column based on cell values
fn infer_column_type(sheet: &Sheet, col_idx: usize) -> DataType {
    let mut has_bool = false;
    let mut has_int = false;
    let mut has_float = false;
    let mut has_text = false;

    for row in sheet.rows() {
        match &row[col_idx] {
            CellValue::Null => {}
            CellValue::Bool(_) => has_bool = true,
            CellValue::Int(_) => has_int = true,
            CellValue::Float(_) => has_float = true,
            CellValue::String(_) | CellValue::DateTime(_) => has_text = true,
        }
    }

    // Priority: Text > Float > Int > Bool (wider types win)
    if has_text || (has_bool && (has_int || has_float)) {
        DataType::Utf8
    } else if has_float {
        DataType::Float64
    } else if has_int {
        DataType::Int64
    } else if has_bool {
        DataType::Boolean
    } else {
        DataType::Utf8
    }
}

/// Build an Arrow array from column data
fn build_arrow_array(sheet: &Sheet, col_idx: usize, dtype: &DataType) -> ArrayRef {
    let cells = sheet.rows().map(|row| &row[col_idx]);
    match dtype {
        DataType::Boolean => {
            let values: Vec<Option<bool>> = cells
                .map(|cell| match cell {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Arc::new(BooleanArray::from(values))
        }
        DataType::Int64 => {
            let values: Vec<Option<i64>> = cells.map(CellValue::as_int).collect();
            Arc::new(Int64Array::from(values))
        }
        DataType::Float64 => {
            let values: Vec<Option<f64>> = cells.map(CellValue::as_float).collect();
            Arc::new(Float64Array::from(values))
        }
        _ => {
            let values: Vec<Option<String>> = cells
                .map(|cell| (!cell.is_null()).then(|| cell.to_string()))
                .collect();
            Arc::new(StringArray::from(values))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    #[test]
    fn test_to_record_batch_infers_types() {
        let sheet = Sheet::from_data(vec![
            vec![CellValue::from("region"), CellValue::from("unidades"), CellValue::from("ventas")],
            vec![CellValue::from("Norte"), CellValue::Int(10), CellValue::Float(100.0)],
            vec![CellValue::from("Sur"), CellValue::Null, CellValue::Int(20)],
        ]);

        let batch = sheet.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Int64);
        assert_eq!(batch.schema().field(2).data_type(), &DataType::Float64);
        assert!(batch.column(1).is_null(1));
    }

    #[test]
    fn test_empty_sheet_batch() {
        let sheet = Sheet::from_data(vec![vec!["a", "b"]]);
        let batch = sheet.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);
    }
}
