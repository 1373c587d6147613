//! Per-salesperson detail and headline metrics of a filtered table.

use crate::aggregate::{amount, percentage, sum_column};
use crate::error::Result;
use crate::filter::Choice;
use crate::role::Role;
use serde::{Deserialize, Serialize};
use ventas_sheet::Sheet;

/// Totals of one salesperson within the filtered table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailSummary {
    pub vendedor: String,
    pub registros: usize,
    pub unidades: f64,
    pub ventas: f64,
    /// Share of the filtered table's sales (not rounded).
    pub pct: f64,
}

/// Headline metrics of the filtered table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub registros: usize,
    pub unidades: f64,
    pub ventas: f64,
    /// Filtered sales as a share of the whole table's sales.
    pub pct_global: f64,
}

/// Rows of `sheet` whose `vendedor` stringifies to `vendedor`.
pub fn detail_rows(sheet: &Sheet, vendedor: &str) -> Result<Sheet> {
    let index = Role::Vendedor.index_in(sheet)?;
    let choice = Choice::value(vendedor);
    Ok(sheet.filtered(|row| choice.matches(&row[index])))
}

/// Sum units and sales of one salesperson and their share of the table's sales.
pub fn detail(sheet: &Sheet, vendedor: &str) -> Result<DetailSummary> {
    let rows = detail_rows(sheet, vendedor)?;
    let unidades_idx = Role::Unidades.index_in(&rows)?;
    let ventas_idx = Role::Ventas.index_in(&rows)?;

    let (unidades, ventas) = rows.rows().fold((0.0, 0.0), |(u, v), row| {
        (u + amount(&row[unidades_idx]), v + amount(&row[ventas_idx]))
    });
    let total = sum_column(sheet, Role::Ventas)?;

    Ok(DetailSummary {
        vendedor: vendedor.to_string(),
        registros: rows.row_count(),
        unidades,
        ventas,
        pct: percentage(ventas, total),
    })
}

/// Row count, units, sales and share of global sales for a filtered table.
pub fn summarize(full: &Sheet, filtered: &Sheet) -> Result<FilterSummary> {
    let ventas = sum_column(filtered, Role::Ventas)?;
    Ok(FilterSummary {
        registros: filtered.row_count(),
        unidades: sum_column(filtered, Role::Unidades)?,
        ventas,
        pct_global: percentage(ventas, sum_column(full, Role::Ventas)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::apply_filters;

    fn normalized(data: Vec<Vec<&str>>) -> Sheet {
        let mut sheet = Sheet::from_data(data);
        crate::normalize::normalize(&mut sheet).unwrap();
        sheet
    }

    fn example() -> Sheet {
        normalized(vec![
            vec!["region", "vendedor", "unidades", "ventas"],
            vec!["North", "Ana", "10", "100"],
            vec!["North", "Beto", "5", "50"],
            vec!["South", "Ana", "2", "20"],
        ])
    }

    #[test]
    fn test_detail_over_whole_table() {
        let summary = detail(&example(), "Ana").unwrap();
        assert_eq!(summary.registros, 2);
        assert_eq!(summary.unidades, 12.0);
        assert_eq!(summary.ventas, 120.0);
        assert!((summary.pct - 70.588_235).abs() < 1e-4);
    }

    #[test]
    fn test_detail_within_filtered_table() {
        let sheet = example();
        let north = apply_filters(&sheet, &Choice::value("North"), &Choice::All).unwrap();
        let summary = detail(&north, "Beto").unwrap();
        assert_eq!(summary.ventas, 50.0);
        assert!((summary.pct - 33.333_333).abs() < 1e-4);
    }

    #[test]
    fn test_detail_unknown_vendedor_is_zero() {
        let summary = detail(&example(), "Zoe").unwrap();
        assert_eq!(summary.registros, 0);
        assert_eq!(summary.ventas, 0.0);
        assert_eq!(summary.pct, 0.0);
    }

    #[test]
    fn test_detail_zero_total() {
        let sheet = normalized(vec![
            vec!["region", "vendedor", "unidades", "ventas"],
            vec!["North", "Ana", "1", "0"],
        ]);
        assert_eq!(detail(&sheet, "Ana").unwrap().pct, 0.0);
    }

    #[test]
    fn test_detail_rows() {
        let rows = detail_rows(&example(), "Ana").unwrap();
        assert_eq!(rows.row_count(), 2);
        assert_eq!(rows.column_names(), example().column_names());
    }

    #[test]
    fn test_summarize() {
        let sheet = example();
        let south = apply_filters(&sheet, &Choice::value("South"), &Choice::All).unwrap();
        let summary = summarize(&sheet, &south).unwrap();
        assert_eq!(summary.registros, 1);
        assert_eq!(summary.unidades, 2.0);
        assert_eq!(summary.ventas, 20.0);
        assert!((summary.pct_global - 11.764_705).abs() < 1e-4);
    }
}
