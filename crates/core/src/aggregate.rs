//! Group-by aggregation of units and sales.

use crate::error::Result;
use crate::role::{Dimension, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ventas_sheet::{CellValue, Sheet};

/// Summed units and sales for one value of the grouping column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub key: String,
    pub unidades: f64,
    pub ventas: f64,
    /// Share of the total sales of all groups, rounded to two decimals.
    pub pct_ventas: f64,
}

/// Round to two decimals.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / total * 100`, or 0 when the total is zero.
#[must_use]
pub fn percentage(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

/// Numeric value of a cell for summing; nulls count as zero.
pub(crate) fn amount(cell: &CellValue) -> f64 {
    cell.as_float().filter(|v| !v.is_nan()).unwrap_or(0.0)
}

/// Sum of a role's column.
pub fn sum_column(sheet: &Sheet, role: Role) -> Result<f64> {
    let index = role.index_in(sheet)?;
    Ok(sheet.rows().map(|row| amount(&row[index])).sum())
}

/// Group rows by `group_by`, summing `unidades` and `ventas`.
///
/// Rows with a null group cell are left out of every group and of the
/// total used for `pct_ventas`. Groups are keyed by the cell's text, so
/// `2` and `"2"` share a group and keys sort as text (`"10"` before `"2"`).
pub fn aggregate(sheet: &Sheet, group_by: Dimension) -> Result<Vec<AggregateRow>> {
    let group_idx = group_by.role().index_in(sheet)?;
    let unidades_idx = Role::Unidades.index_in(sheet)?;
    let ventas_idx = Role::Ventas.index_in(sheet)?;

    let mut groups: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for row in sheet.rows() {
        let key = &row[group_idx];
        if key.is_null() {
            continue;
        }
        let entry = groups.entry(key.to_string()).or_insert((0.0, 0.0));
        entry.0 += amount(&row[unidades_idx]);
        entry.1 += amount(&row[ventas_idx]);
    }

    let total: f64 = groups.values().map(|(_, ventas)| ventas).sum();

    Ok(groups
        .into_iter()
        .map(|(key, (unidades, ventas))| AggregateRow {
            key,
            unidades,
            ventas,
            pct_ventas: round2(percentage(ventas, total)),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(region: &str, vendedor: &str, unidades: i64, ventas: f64) -> Vec<CellValue> {
        vec![
            CellValue::from(region),
            CellValue::from(vendedor),
            CellValue::Int(unidades),
            CellValue::Float(ventas),
        ]
    }

    fn header() -> Vec<CellValue> {
        ["region", "vendedor", "unidades", "ventas"]
            .into_iter()
            .map(CellValue::from)
            .collect()
    }

    fn example() -> Sheet {
        Sheet::from_data(vec![
            header(),
            row("North", "Ana", 10, 100.0),
            row("North", "Beto", 5, 50.0),
            row("South", "Ana", 2, 20.0),
        ])
    }

    #[test]
    fn test_aggregate_by_region() {
        let rows = aggregate(&example(), Dimension::Region).unwrap();
        assert_eq!(
            rows,
            vec![
                AggregateRow {
                    key: "North".to_string(),
                    unidades: 15.0,
                    ventas: 150.0,
                    pct_ventas: 88.24,
                },
                AggregateRow {
                    key: "South".to_string(),
                    unidades: 2.0,
                    ventas: 20.0,
                    pct_ventas: 11.76,
                },
            ]
        );
    }

    #[test]
    fn test_aggregate_keys_by_text() {
        let sheet = Sheet::from_data(vec![
            header(),
            vec![CellValue::Int(2), CellValue::from("Ana"), CellValue::Int(1), CellValue::Float(10.0)],
            vec![CellValue::from("2"), CellValue::from("Beto"), CellValue::Int(1), CellValue::Float(10.0)],
            vec![CellValue::Int(10), CellValue::from("Ana"), CellValue::Int(1), CellValue::Float(20.0)],
        ]);
        let rows = aggregate(&sheet, Dimension::Region).unwrap();
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["10", "2"]);
        assert_eq!(rows[1].ventas, 20.0);
    }

    #[test]
    fn test_aggregate_by_vendedor() {
        let rows = aggregate(&example(), Dimension::Vendedor).unwrap();
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Ana", "Beto"]);
        assert_eq!(rows[0].ventas, 120.0);
        assert_eq!(rows[0].pct_ventas, 70.59);
        assert_eq!(rows[1].pct_ventas, 29.41);
    }

    #[test]
    fn test_null_group_rows_are_dropped() {
        let mut data = vec![header(), row("North", "Ana", 1, 30.0)];
        data.push(vec![
            CellValue::Null,
            CellValue::from("Beto"),
            CellValue::Int(4),
            CellValue::Float(70.0),
        ]);
        let rows = aggregate(&Sheet::from_data(data), Dimension::Region).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ventas, 30.0);
        assert_eq!(rows[0].pct_ventas, 100.0);
    }

    #[test]
    fn test_null_amounts_sum_as_zero() {
        let data = vec![
            header(),
            row("North", "Ana", 1, 10.0),
            vec![
                CellValue::from("North"),
                CellValue::from("Ana"),
                CellValue::Null,
                CellValue::Null,
            ],
        ];
        let rows = aggregate(&Sheet::from_data(data), Dimension::Region).unwrap();
        assert_eq!(rows[0].unidades, 1.0);
        assert_eq!(rows[0].ventas, 10.0);
    }

    #[test]
    fn test_zero_total_gives_zero_percentages() {
        let data = vec![header(), row("North", "Ana", 1, 0.0), row("South", "Beto", 2, 0.0)];
        let rows = aggregate(&Sheet::from_data(data), Dimension::Region).unwrap();
        assert!(rows.iter().all(|r| r.pct_ventas == 0.0));
    }

    #[test]
    fn test_sales_mass_and_percentages_are_preserved() {
        let data = vec![
            header(),
            row("A", "x", 1, 33.3),
            row("B", "y", 1, 33.3),
            row("C", "z", 1, 33.4),
            row("A", "z", 1, 0.7),
        ];
        let sheet = Sheet::from_data(data);
        let rows = aggregate(&sheet, Dimension::Vendedor).unwrap();

        let grouped: f64 = rows.iter().map(|r| r.ventas).sum();
        assert!((grouped - sum_column(&sheet, Role::Ventas).unwrap()).abs() < 1e-9);

        let pct: f64 = rows.iter().map(|r| r.pct_ventas).sum();
        assert!((pct - 100.0).abs() <= 0.01 * rows.len() as f64);
    }

    #[test]
    fn test_empty_sheet_has_no_groups() {
        let sheet = Sheet::from_data(vec![header()]);
        assert!(aggregate(&sheet, Dimension::Region).unwrap().is_empty());
    }

    #[test]
    fn test_percentage_helpers() {
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(5.0, 20.0), 25.0);
        assert_eq!(round2(11.764_705), 11.76);
    }
}
