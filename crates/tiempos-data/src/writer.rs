//! Report workbook writer.
//!
//! Each table becomes one worksheet with a header row and, when it has rows,
//! a named worksheet table over the data. The file is saved next to the
//! target and renamed over it, so a failed write leaves any previous report
//! in place.

use std::path::Path;

use rust_xlsxwriter::{Table, TableColumn, TableStyle, Workbook, XlsxError};
use tiempos_core::models::{
    ReportTables, BREAKDOWN_HEADERS, BREAKDOWN_HEADERS_WITH_OF, CENTER_HEADERS, ITEM_HEADERS,
    RANKING_HEADERS, SHEET_BREAKDOWN, SHEET_CENTERS, SHEET_ITEMS, SHEET_RANKINGS,
};
use tiempos_core::{Result, TiemposError};
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

enum Cell {
    Text(String),
    Number(f64),
}

struct Section<'a> {
    sheet: &'static str,
    table: &'static str,
    headers: &'a [&'a str],
    rows: Vec<Vec<Cell>>,
}

/// Write the four report tables to `path`.
pub fn write_report(tables: &ReportTables, path: &Path) -> Result<()> {
    let write_err = |message: String| TiemposError::ReportWrite {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = Workbook::new();
    for section in sections(tables) {
        debug!(rows = section.rows.len(), "Writing sheet {}", section.sheet);
        write_section(&mut workbook, &section).map_err(|e| write_err(e.to_string()))?;
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
    }

    save_atomically(&mut workbook, path).map_err(write_err)?;

    info!(
        centers = tables.centers.len(),
        items = tables.items.len(),
        breakdown = tables.breakdown.len(),
        rankings = tables.rankings.len(),
        "Report written to {}",
        path.display()
    );
    Ok(())
}

fn sections(tables: &ReportTables) -> Vec<Section<'static>> {
    let date = |d: &chrono::NaiveDate| Cell::Text(d.format(DATE_FORMAT).to_string());

    let centers = tables
        .centers
        .iter()
        .map(|r| {
            vec![
                date(&r.date),
                Cell::Text(r.center.clone()),
                Cell::Number(r.daily_load),
                Cell::Number(r.monthly_mean),
                Cell::Number(r.monthly_total),
            ]
        })
        .collect();

    let items = tables
        .items
        .iter()
        .map(|r| {
            vec![
                date(&r.date),
                Cell::Text(r.item.clone()),
                Cell::Number(r.daily_load),
                Cell::Number(r.monthly_mean),
                Cell::Number(r.monthly_total),
            ]
        })
        .collect();

    let breakdown_headers: &'static [&'static str] = if tables.has_work_order {
        &BREAKDOWN_HEADERS_WITH_OF
    } else {
        &BREAKDOWN_HEADERS
    };
    let breakdown = tables
        .breakdown
        .iter()
        .map(|r| {
            let mut row = vec![
                date(&r.date),
                Cell::Text(r.center.clone()),
                Cell::Text(r.item.clone()),
            ];
            if tables.has_work_order {
                row.push(Cell::Text(r.work_order.clone().unwrap_or_default()));
            }
            row.push(Cell::Number(r.hours));
            row
        })
        .collect();

    let rankings = tables
        .rankings
        .iter()
        .map(|r| {
            vec![
                date(&r.date),
                Cell::Text(r.kind.label().to_string()),
                Cell::Number(r.rank as f64),
                Cell::Text(r.center.clone()),
                Cell::Text(r.item.clone()),
                Cell::Number(r.daily_load),
                Cell::Number(r.monthly_mean),
                Cell::Number(r.monthly_total),
            ]
        })
        .collect();

    vec![
        Section {
            sheet: SHEET_CENTERS,
            table: "TablaCentros",
            headers: &CENTER_HEADERS,
            rows: centers,
        },
        Section {
            sheet: SHEET_ITEMS,
            table: "TablaArticulos",
            headers: &ITEM_HEADERS,
            rows: items,
        },
        Section {
            sheet: SHEET_BREAKDOWN,
            table: "TablaCentroArticulo",
            headers: breakdown_headers,
            rows: breakdown,
        },
        Section {
            sheet: SHEET_RANKINGS,
            table: "TablaRankings",
            headers: &RANKING_HEADERS,
            rows: rankings,
        },
    ]
}

/// Save next to `path` and rename over it. The temporary file is removed
/// on any failure.
fn save_atomically(workbook: &mut Workbook, path: &Path) -> std::result::Result<(), String> {
    let tmp = path.with_extension("xlsx.tmp");
    let saved = workbook
        .save(&tmp)
        .map_err(|e| e.to_string())
        .and_then(|()| std::fs::rename(&tmp, path).map_err(|e| e.to_string()));
    if saved.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    saved
}

fn write_section(workbook: &mut Workbook, section: &Section) -> std::result::Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(section.sheet)?;

    for (c, header) in section.headers.iter().enumerate() {
        sheet.write_string(0, c as u16, *header)?;
    }
    for (r, row) in section.rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Cell::Text(s) => sheet.write_string(r, c, s)?,
                Cell::Number(n) => sheet.write_number(r, c, *n)?,
            };
        }
    }

    if !section.rows.is_empty() {
        let columns: Vec<TableColumn> = section
            .headers
            .iter()
            .map(|h| TableColumn::new().set_header(*h))
            .collect();
        let table = Table::new()
            .set_name(section.table)
            .set_style(TableStyle::Medium2)
            .set_columns(&columns);
        let last_col = section.headers.len().saturating_sub(1) as u16;
        sheet.add_table(0, 0, section.rows.len() as u32, last_col, &table)?;
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
