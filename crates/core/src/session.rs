//! One user's dashboard state and its recomputation pass.

use crate::aggregate::{aggregate, AggregateRow};
use crate::detail::{detail, detail_rows, summarize, DetailSummary, FilterSummary};
use crate::error::{DashboardError, Result};
use crate::filter::{apply_filters, distinct_values, vendedor_options, Choice, FilterSelection};
use crate::loader::DEFAULT_FILE;
use crate::mapper::{apply_mapping, ColumnMapping};
use crate::normalize::normalize;
use crate::role::{Dimension, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use ventas_sheet::Sheet;

/// File name of the filtered-table export.
pub const EXPORT_FILE_NAME: &str = "ventas_filtrado.csv";
/// MIME type of the filtered-table export.
pub const EXPORT_MIME: &str = "text/csv";

// ===== Charts =====

/// The value a chart plots per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Unidades,
    Ventas,
    PctVentas,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Unidades, Metric::Ventas, Metric::PctVentas];

    /// Chart title.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Metric::Unidades => "Unidades Vendidas",
            Metric::Ventas => "Ventas Totales",
            Metric::PctVentas => "% de Ventas",
        }
    }

    /// The plotted value of an aggregate row.
    #[must_use]
    pub fn value(self, row: &AggregateRow) -> f64 {
        match self {
            Metric::Unidades => row.unidades,
            Metric::Ventas => row.ventas,
            Metric::PctVentas => row.pct_ventas,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::Unidades => "unidades",
            Metric::Ventas => "ventas",
            Metric::PctVentas => "pct_ventas",
        })
    }
}

impl FromStr for Metric {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unidades" | "units" => Ok(Metric::Unidades),
            "ventas" | "sales" => Ok(Metric::Ventas),
            "pct_ventas" | "pct" | "share" | "%" => Ok(Metric::PctVentas),
            _ => Err(DashboardError::invalid("chart", s)),
        }
    }
}

/// Grouping dimension of each chart; charts group independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChartGroupings {
    pub unidades: Dimension,
    pub ventas: Dimension,
    pub pct_ventas: Dimension,
}

impl ChartGroupings {
    /// Every chart grouped by the same dimension.
    #[must_use]
    pub fn uniform(dimension: Dimension) -> Self {
        Self {
            unidades: dimension,
            ventas: dimension,
            pct_ventas: dimension,
        }
    }

    #[must_use]
    pub fn get(&self, metric: Metric) -> Dimension {
        match metric {
            Metric::Unidades => self.unidades,
            Metric::Ventas => self.ventas,
            Metric::PctVentas => self.pct_ventas,
        }
    }

    pub fn set(&mut self, metric: Metric, dimension: Dimension) {
        match metric {
            Metric::Unidades => self.unidades = dimension,
            Metric::Ventas => self.ventas = dimension,
            Metric::PctVentas => self.pct_ventas = dimension,
        }
    }
}

/// Aggregate rows backing one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub metric: Metric,
    pub title: &'static str,
    pub group_by: Dimension,
    pub rows: Vec<AggregateRow>,
}

// ===== View =====

/// Detail of the chosen salesperson.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailReport {
    pub summary: DetailSummary,
    pub rows: Sheet,
}

/// Everything one recomputation pass produces for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Columns of the mapped table.
    pub columns: Vec<String>,
    pub mapping: ColumnMapping,
    pub selection: FilterSelection,
    pub region_options: Vec<String>,
    pub vendedor_options: Vec<String>,
    pub summary: FilterSummary,
    pub table: Sheet,
    pub charts: Vec<ChartSeries>,
    pub detail_options: Vec<String>,
    /// `None` when the filtered table has no salespeople.
    pub detail: Option<DetailReport>,
}

/// The CSV download of the filtered table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub content: String,
}

// ===== Session =====

/// A loaded table with its mapping, filters, chart groupings and detail choice.
#[derive(Debug, Clone)]
pub struct Session {
    raw: Arc<Sheet>,
    mapping: ColumnMapping,
    table: Sheet,
    selection: FilterSelection,
    groupings: ChartGroupings,
    detail: Option<String>,
}

impl Session {
    /// Map and normalize a raw table.
    ///
    /// # Errors
    ///
    /// `EmptySource` for a table without rows or columns, `UnknownColumn` for
    /// a mapping that names absent columns, and the mapping errors of
    /// [`apply_mapping`].
    pub fn open(raw: Arc<Sheet>, mapping: ColumnMapping) -> Result<Self> {
        if raw.is_empty() {
            return Err(DashboardError::EmptySource {
                default_file: DEFAULT_FILE.to_string(),
            });
        }
        let table = prepare(&raw, &mapping)?;
        Ok(Self {
            raw,
            mapping,
            table,
            selection: FilterSelection::default(),
            groupings: ChartGroupings::default(),
            detail: None,
        })
    }

    /// The raw table as loaded.
    #[must_use]
    pub fn raw(&self) -> &Sheet {
        &self.raw
    }

    /// The mapped and normalized table.
    #[must_use]
    pub fn table(&self) -> &Sheet {
        &self.table
    }

    #[must_use]
    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    #[must_use]
    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    #[must_use]
    pub fn groupings(&self) -> ChartGroupings {
        self.groupings
    }

    /// Raw text columns a role can be mapped to.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.raw.text_column_names()
    }

    /// Re-derive the table from the raw source with a new mapping.
    ///
    /// On error the session keeps its previous mapping and table. Filter
    /// choices that no longer exist are reset.
    pub fn remap(&mut self, mapping: ColumnMapping) -> Result<()> {
        self.table = prepare(&self.raw, &mapping)?;
        self.mapping = mapping;

        if !is_option(&self.selection.region, &self.region_options()?) {
            self.selection.region = Choice::All;
        }
        self.reset_invalid_vendedor()
    }

    /// Distinct regions of the table.
    pub fn region_options(&self) -> Result<Vec<String>> {
        distinct_values(&self.table, Role::Region.canonical_name())
    }

    /// Salespeople within the chosen region.
    pub fn vendedor_options(&self) -> Result<Vec<String>> {
        vendedor_options(&self.table, &self.selection.region)
    }

    /// Choose the region; a salesperson not in the new region is reset to all.
    pub fn set_region(&mut self, region: Choice) -> Result<()> {
        if !is_option(&region, &self.region_options()?) {
            return Err(unknown_choice(Role::Region, &region));
        }
        self.selection.region = region;
        self.reset_invalid_vendedor()
    }

    /// Choose the salesperson among the current region's options.
    pub fn set_vendedor(&mut self, vendedor: Choice) -> Result<()> {
        if !is_option(&vendedor, &self.vendedor_options()?) {
            return Err(unknown_choice(Role::Vendedor, &vendedor));
        }
        self.selection.vendedor = vendedor;
        Ok(())
    }

    pub fn set_grouping(&mut self, metric: Metric, dimension: Dimension) {
        self.groupings.set(metric, dimension);
    }

    pub fn set_groupings(&mut self, groupings: ChartGroupings) {
        self.groupings = groupings;
    }

    /// Choose the salesperson to detail; `None` picks the first option.
    pub fn set_detail(&mut self, vendedor: Option<String>) -> Result<()> {
        if let Some(name) = &vendedor {
            if !self.detail_options()?.contains(name) {
                return Err(unknown_choice(Role::Vendedor, &Choice::value(name.as_str())));
            }
        }
        self.detail = vendedor;
        Ok(())
    }

    /// The table after the region and salesperson filters.
    pub fn filtered(&self) -> Result<Sheet> {
        apply_filters(&self.table, &self.selection.region, &self.selection.vendedor)
    }

    /// Salespeople present in the filtered table.
    pub fn detail_options(&self) -> Result<Vec<String>> {
        distinct_values(&self.filtered()?, Role::Vendedor.canonical_name())
    }

    /// Recompute every output from the current state.
    pub fn view(&self) -> Result<DashboardView> {
        let filtered = self.filtered()?;

        let charts = Metric::ALL
            .into_iter()
            .map(|metric| {
                let group_by = self.groupings.get(metric);
                Ok(ChartSeries {
                    metric,
                    title: metric.title(),
                    group_by,
                    rows: aggregate(&filtered, group_by)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let detail_options = distinct_values(&filtered, Role::Vendedor.canonical_name())?;
        let chosen = self
            .detail
            .as_ref()
            .filter(|name| detail_options.contains(name))
            .or_else(|| detail_options.first());
        let report = chosen
            .map(|name| {
                Ok::<_, DashboardError>(DetailReport {
                    summary: detail(&filtered, name)?,
                    rows: detail_rows(&filtered, name)?,
                })
            })
            .transpose()?;

        Ok(DashboardView {
            columns: self.table.column_names(),
            mapping: self.mapping.clone(),
            selection: self.selection.clone(),
            region_options: self.region_options()?,
            vendedor_options: self.vendedor_options()?,
            summary: summarize(&self.table, &filtered)?,
            table: filtered,
            charts,
            detail_options,
            detail: report,
        })
    }

    /// The filtered table as a CSV download.
    pub fn export_csv(&self) -> Result<CsvExport> {
        let filtered = self.filtered()?;
        tracing::info!(rows = filtered.row_count(), "exporting filtered table");
        Ok(CsvExport {
            file_name: EXPORT_FILE_NAME,
            mime: EXPORT_MIME,
            content: filtered.to_csv_string(),
        })
    }

    fn reset_invalid_vendedor(&mut self) -> Result<()> {
        if !is_option(&self.selection.vendedor, &self.vendedor_options()?) {
            tracing::debug!(vendedor = %self.selection.vendedor, "salesperson reset");
            self.selection.vendedor = Choice::All;
        }
        Ok(())
    }
}

fn prepare(raw: &Sheet, mapping: &ColumnMapping) -> Result<Sheet> {
    mapping.validate(raw)?;
    let mut table = apply_mapping(raw, mapping)?;
    normalize(&mut table)?;
    Ok(table)
}

fn is_option(choice: &Choice, options: &[String]) -> bool {
    match choice {
        Choice::All => true,
        Choice::Value(value) => options.contains(value),
    }
}

fn unknown_choice(role: Role, choice: &Choice) -> DashboardError {
    DashboardError::UnknownChoice {
        column: role.canonical_name().to_string(),
        value: choice.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::KeywordTable;

    fn raw() -> Arc<Sheet> {
        Arc::new(Sheet::from_data(vec![
            vec!["Zona", "Nombre", "Unidades", "Monto"],
            vec!["North", "Ana", "10", "100"],
            vec!["North", "Beto", "5", "50"],
            vec!["South", "Ana", "2", "20"],
        ]))
    }

    fn session() -> Session {
        let raw = raw();
        let mapping = ColumnMapping::guess(&KeywordTable::default(), &raw);
        Session::open(raw, mapping).unwrap()
    }

    #[test]
    fn test_open_empty_source() {
        let err = Session::open(Arc::new(Sheet::new()), ColumnMapping::new()).unwrap_err();
        assert!(matches!(err, DashboardError::EmptySource { .. }));
    }

    #[test]
    fn test_region_change_resets_vendedor() {
        let mut session = session();
        session.set_vendedor(Choice::value("Beto")).unwrap();
        session.set_region(Choice::value("South")).unwrap();
        assert_eq!(session.selection().vendedor, Choice::All);

        session.set_vendedor(Choice::value("Ana")).unwrap();
        session.set_region(Choice::All).unwrap();
        assert_eq!(session.selection().vendedor, Choice::value("Ana"));
    }

    #[test]
    fn test_unknown_choices_are_rejected() {
        let mut session = session();
        assert!(matches!(
            session.set_region(Choice::value("East")),
            Err(DashboardError::UnknownChoice { .. })
        ));
        session.set_region(Choice::value("South")).unwrap();
        assert!(session.set_vendedor(Choice::value("Beto")).is_err());
        assert!(session.set_detail(Some("Beto".to_string())).is_err());
    }

    #[test]
    fn test_view_charts_group_independently() {
        let mut session = session();
        session.set_grouping(Metric::Ventas, Dimension::Vendedor);
        let view = session.view().unwrap();

        assert_eq!(view.charts.len(), 3);
        assert_eq!(view.charts[0].group_by, Dimension::Region);
        assert_eq!(view.charts[0].rows[0].key, "North");
        assert_eq!(view.charts[1].group_by, Dimension::Vendedor);
        assert_eq!(view.charts[1].rows[0].key, "Ana");
        assert_eq!(view.charts[2].title, "% de Ventas");
    }

    #[test]
    fn test_view_detail_falls_back_to_first_option() {
        let mut session = session();
        session.set_detail(Some("Beto".to_string())).unwrap();
        session.set_region(Choice::value("South")).unwrap();
        let view = session.view().unwrap();
        assert_eq!(view.detail_options, vec!["Ana"]);
        let report = view.detail.unwrap();
        assert_eq!(report.summary.vendedor, "Ana");
        assert_eq!(report.summary.pct, 100.0);
        assert_eq!(report.rows.row_count(), 1);
    }

    #[test]
    fn test_view_summary() {
        let mut session = session();
        session.set_region(Choice::value("North")).unwrap();
        let view = session.view().unwrap();
        assert_eq!(view.summary.registros, 2);
        assert_eq!(view.summary.ventas, 150.0);
        assert_eq!(view.vendedor_options, vec!["Ana", "Beto"]);
        assert_eq!(view.region_options, vec!["North", "South"]);
    }

    #[test]
    fn test_failed_remap_keeps_state() {
        let mut session = session();
        let mut mapping = session.mapping().clone();
        mapping.clear(Role::Ventas);
        assert!(matches!(
            session.remap(mapping),
            Err(DashboardError::MissingColumns { .. })
        ));
        assert!(session.table().has_column("ventas"));
    }

    #[test]
    fn test_export_csv() {
        let mut session = session();
        session.set_region(Choice::value("South")).unwrap();
        let export = session.export_csv().unwrap();
        assert_eq!(export.file_name, "ventas_filtrado.csv");
        assert_eq!(export.mime, "text/csv");
        assert_eq!(export.content, "region,vendedor,unidades,ventas\nSouth,Ana,2,20\n");
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!("pct".parse::<Metric>().unwrap(), Metric::PctVentas);
        assert_eq!("Ventas".parse::<Metric>().unwrap(), Metric::Ventas);
        assert!("region".parse::<Metric>().is_err());
    }
}
