//! Loads the report workbook back into [`ReportTables`].
//!
//! `Datos_Centros` and `Rankings` must be present. The item and breakdown
//! sheets are optional and load empty when missing. Columns are looked up by
//! header, so column order in the file does not matter. Empty numeric cells
//! read as `0.0`.

use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, Range, Reader};
use chrono::NaiveDate;
use tiempos_core::models::{
    CenterItemBreakdownRow, CenterLoadRow, ItemLoadRow, RankingRow, RankingType, ReportTables,
    SHEET_BREAKDOWN, SHEET_CENTERS, SHEET_ITEMS, SHEET_RANKINGS,
};
use tiempos_core::values::normalize_number;
use tiempos_core::{Result, TiemposError};
use tracing::{debug, warn};

use crate::cells::{open_workbook, read_sheet, to_date, to_header, to_raw, WorkbookHandle};

/// Read all report tables from `path`.
pub fn read_report(path: &Path) -> Result<ReportTables> {
    let mut workbook = open_workbook(path)?;
    let names = workbook.sheet_names();

    for required in [SHEET_CENTERS, SHEET_RANKINGS] {
        if !names.iter().any(|n| n == required) {
            return Err(TiemposError::MissingSheet {
                path: path.to_path_buf(),
                sheet: required.to_string(),
            });
        }
    }

    let centers = SheetRows::load(&mut workbook, path, SHEET_CENTERS)?;
    let rankings = SheetRows::load(&mut workbook, path, SHEET_RANKINGS)?;
    let items = load_optional(&mut workbook, path, &names, SHEET_ITEMS)?;
    let breakdown = load_optional(&mut workbook, path, &names, SHEET_BREAKDOWN)?;

    let has_work_order = breakdown.as_ref().is_some_and(|s| s.has("OF"));

    let tables = ReportTables {
        centers: centers.rows_with_date(center_row),
        items: items.map(|s| s.rows_with_date(item_row)).unwrap_or_default(),
        breakdown: breakdown
            .map(|s| s.rows_with_date(breakdown_row))
            .unwrap_or_default(),
        rankings: rankings.rows_with_date(ranking_row),
        has_work_order,
    };
    debug!(rows = tables.total_rows(), "Report read from {}", path.display());
    Ok(tables)
}

fn load_optional(
    workbook: &mut WorkbookHandle,
    path: &Path,
    names: &[String],
    sheet: &str,
) -> Result<Option<SheetRows>> {
    if names.iter().any(|n| n == sheet) {
        SheetRows::load(workbook, path, sheet).map(Some)
    } else {
        warn!("Sheet '{}' missing from {}, loading empty", sheet, path.display());
        Ok(None)
    }
}

// ── Row builders ──────────────────────────────────────────────────────────────

fn center_row(row: &Row, date: NaiveDate) -> Option<CenterLoadRow> {
    Some(CenterLoadRow {
        date,
        center: row.text("Centro"),
        daily_load: row.number("Carga_Dia"),
        monthly_mean: row.number("Media_Mensual"),
        monthly_total: row.number("Total_Mes"),
    })
}

fn item_row(row: &Row, date: NaiveDate) -> Option<ItemLoadRow> {
    let item = row.text_any(&["Artículo", "Articulo"]);
    Some(ItemLoadRow {
        date,
        item,
        daily_load: row.number("Carga_Dia"),
        monthly_mean: row.number("Media_Mensual"),
        monthly_total: row.number("Total_Mes"),
    })
}

fn breakdown_row(row: &Row, date: NaiveDate) -> Option<CenterItemBreakdownRow> {
    Some(CenterItemBreakdownRow {
        date,
        center: row.text("Centro"),
        item: row.text_any(&["Articulo", "Artículo"]),
        work_order: row.identifier("OF"),
        hours: row.number("Horas"),
    })
}

fn ranking_row(row: &Row, date: NaiveDate) -> Option<RankingRow> {
    let kind = RankingType::from_label(&row.text("Tipo"))?;
    Some(RankingRow {
        date,
        kind,
        rank: row.number("Ranking").max(0.0) as u32,
        center: row.text("Centro"),
        item: row.text_any(&["Articulo", "Artículo"]),
        daily_load: row.number("Carga_Dia"),
        monthly_mean: row.number("Media_Mensual"),
        monthly_total: row.number("Total_Mes"),
    })
}

// ── SheetRows ─────────────────────────────────────────────────────────────────

/// One worksheet with its header index.
struct SheetRows {
    name: String,
    columns: HashMap<String, usize>,
    range: Range<Data>,
}

/// A data row viewed through its sheet's header index.
struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    cells: &'a [Data],
}

impl SheetRows {
    fn load(workbook: &mut WorkbookHandle, path: &Path, name: &str) -> Result<Self> {
        let range = read_sheet(workbook, path, name)?;
        let columns = range
            .rows()
            .next()
            .map(|header| {
                header
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| (to_header(cell), i))
                    .filter(|(h, _)| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            name: name.to_string(),
            columns,
            range,
        })
    }

    fn has(&self, header: &str) -> bool {
        self.columns.contains_key(header)
    }

    /// Build typed rows, skipping rows whose `Fecha` is not a date.
    fn rows_with_date<T>(&self, build: impl Fn(&Row, NaiveDate) -> Option<T>) -> Vec<T> {
        let mut skipped = 0usize;
        let out: Vec<T> = self
            .range
            .rows()
            .skip(1)
            .filter_map(|cells| {
                let row = Row {
                    columns: &self.columns,
                    cells,
                };
                let built = row.date("Fecha").and_then(|date| build(&row, date));
                if built.is_none() {
                    skipped += 1;
                }
                built
            })
            .collect();
        if skipped > 0 {
            debug!(skipped, "Skipped unreadable rows in sheet {}", self.name);
        }
        out
    }
}

impl Row<'_> {
    fn cell(&self, header: &str) -> Option<&Data> {
        self.columns.get(header).and_then(|i| self.cells.get(*i))
    }

    fn date(&self, header: &str) -> Option<NaiveDate> {
        self.cell(header).and_then(to_date)
    }

    fn identifier(&self, header: &str) -> Option<String> {
        self.cell(header).and_then(|c| to_raw(c).as_identifier())
    }

    fn text(&self, header: &str) -> String {
        self.identifier(header).unwrap_or_default()
    }

    fn text_any(&self, headers: &[&str]) -> String {
        headers
            .iter()
            .find_map(|h| self.identifier(h))
            .unwrap_or_default()
    }

    fn number(&self, header: &str) -> f64 {
        self.cell(header)
            .and_then(|c| normalize_number(&to_raw(c)))
            .unwrap_or(0.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
