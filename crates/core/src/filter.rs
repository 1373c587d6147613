//! Region and salesperson filters.

use crate::error::Result;
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use ventas_sheet::{CellValue, Sheet, SheetError};

/// One filter choice: everything, or rows whose cell stringifies to a value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    #[default]
    All,
    Value(String),
}

impl Choice {
    /// Create a choice for a specific value.
    pub fn value(value: impl Into<String>) -> Self {
        Choice::Value(value.into())
    }

    /// Whether a cell passes this choice. Null cells only pass `All`.
    #[must_use]
    pub fn matches(&self, cell: &CellValue) -> bool {
        match self {
            Choice::All => true,
            Choice::Value(value) => !cell.is_null() && cell.to_string() == *value,
        }
    }
}

impl From<Option<String>> for Choice {
    fn from(value: Option<String>) -> Self {
        value.map_or(Choice::All, Choice::Value)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => f.write_str("(all)"),
            Choice::Value(value) => f.write_str(value),
        }
    }
}

/// The current region and salesperson choices.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSelection {
    pub region: Choice,
    pub vendedor: Choice,
}

/// Distinct non-null values of a column as text, sorted.
pub fn distinct_values(sheet: &Sheet, column: &str) -> Result<Vec<String>> {
    let index = sheet
        .column_index(column)
        .ok_or_else(|| SheetError::ColumnNotFound {
            name: column.to_string(),
        })?;

    let values: BTreeSet<String> = sheet
        .rows()
        .map(|row| &row[index])
        .filter(|cell| !cell.is_null())
        .map(ToString::to_string)
        .collect();

    Ok(values.into_iter().collect())
}

/// Keep the rows matching both choices.
pub fn apply_filters(sheet: &Sheet, region: &Choice, vendedor: &Choice) -> Result<Sheet> {
    let region_idx = Role::Region.index_in(sheet)?;
    let vendedor_idx = Role::Vendedor.index_in(sheet)?;

    Ok(sheet.filtered(|row| region.matches(&row[region_idx]) && vendedor.matches(&row[vendedor_idx])))
}

/// Salesperson options within the chosen region.
pub fn vendedor_options(sheet: &Sheet, region: &Choice) -> Result<Vec<String>> {
    let in_region = apply_filters(sheet, region, &Choice::All)?;
    distinct_values(&in_region, Role::Vendedor.canonical_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ventas() -> Sheet {
        Sheet::from_data(vec![
            vec![
                CellValue::from("region"),
                CellValue::from("vendedor"),
                CellValue::from("unidades"),
                CellValue::from("ventas"),
            ],
            vec![
                CellValue::from("North"),
                CellValue::from("Ana"),
                CellValue::Int(10),
                CellValue::Int(100),
            ],
            vec![
                CellValue::from("North"),
                CellValue::from("Beto"),
                CellValue::Int(5),
                CellValue::Int(50),
            ],
            vec![
                CellValue::from("South"),
                CellValue::from("Ana"),
                CellValue::Int(2),
                CellValue::Int(20),
            ],
            vec![
                CellValue::Null,
                CellValue::from("Caro"),
                CellValue::Int(1),
                CellValue::Int(1),
            ],
        ])
    }

    #[test]
    fn test_distinct_values_sorted_without_nulls() {
        let sheet = ventas();
        assert_eq!(distinct_values(&sheet, "region").unwrap(), vec!["North", "South"]);
        assert_eq!(
            distinct_values(&sheet, "vendedor").unwrap(),
            vec!["Ana", "Beto", "Caro"]
        );
        assert!(distinct_values(&sheet, "zona").is_err());
    }

    #[test]
    fn test_distinct_values_stringify_numbers() {
        let sheet = Sheet::from_data(vec![
            vec![CellValue::from("region")],
            vec![CellValue::Int(2)],
            vec![CellValue::Int(10)],
            vec![CellValue::from("2")],
        ]);
        assert_eq!(distinct_values(&sheet, "region").unwrap(), vec!["10", "2"]);
    }

    #[test]
    fn test_apply_filters() {
        let sheet = ventas();
        let all = apply_filters(&sheet, &Choice::All, &Choice::All).unwrap();
        assert_eq!(all.row_count(), 4);

        let north = apply_filters(&sheet, &Choice::value("North"), &Choice::All).unwrap();
        assert_eq!(north.row_count(), 2);

        let ana_north =
            apply_filters(&sheet, &Choice::value("North"), &Choice::value("Ana")).unwrap();
        assert_eq!(ana_north.row_count(), 1);

        let nobody = apply_filters(&sheet, &Choice::value("South"), &Choice::value("Beto")).unwrap();
        assert!(nobody.is_empty());
    }

    #[test]
    fn test_apply_filters_is_idempotent() {
        let sheet = ventas();
        let region = Choice::value("North");
        let vendedor = Choice::value("Ana");
        let once = apply_filters(&sheet, &region, &vendedor).unwrap();
        let twice = apply_filters(&once, &region, &vendedor).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_null_never_matches_a_value() {
        assert!(!Choice::value("").matches(&CellValue::Null));
        assert!(Choice::All.matches(&CellValue::Null));
    }

    #[test]
    fn test_vendedor_options_cascade() {
        let sheet = ventas();
        assert_eq!(
            vendedor_options(&sheet, &Choice::value("North")).unwrap(),
            vec!["Ana", "Beto"]
        );
        assert_eq!(
            vendedor_options(&sheet, &Choice::All).unwrap(),
            vec!["Ana", "Beto", "Caro"]
        );
    }

    #[test]
    fn test_choice_from_option() {
        assert_eq!(Choice::from(None), Choice::All);
        assert_eq!(Choice::from(Some("Sur".to_string())), Choice::value("Sur"));
    }
}
