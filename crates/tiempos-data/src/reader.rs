//! Source spreadsheet discovery and loading.
//!
//! Daily exports land in one directory with the report date embedded in the
//! file name (`... (2024-01-15).xlsx`). Only one file per date is admitted;
//! when several share a date the one whose name sorts last wins. Each admitted
//! file is narrowed to the canonical columns it carries and turned into
//! [`SourceRecord`]s.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use calamine::Reader;
use chrono::NaiveDate;
use tiempos_core::columns::{CanonicalColumn, ColumnMap, ColumnSet};
use tiempos_core::models::{FileFailure, SourceFile, SourceRecord, UnifiedDataset};
use tiempos_core::time_utils::{extract_report_date, month_key};
use tiempos_core::values::{normalize_number, RawValue};
use tiempos_core::{Result, TiemposError};
use tracing::{debug, info, warn};

use crate::cells::{open_workbook, read_sheet, to_header, to_raw};

/// Longest center identifier admitted at ingestion.
pub const MAX_CENTER_LEN: usize = 4;

// ── Types ─────────────────────────────────────────────────────────────────────

/// The first worksheet of a source file: trimmed header row plus raw cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

/// Records of one file together with the canonical columns it resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub records: Vec<SourceRecord>,
    pub columns: ColumnSet,
}

/// Outcome of the one-file-per-day selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySelection {
    /// Winning file per date, ascending by date.
    pub selected: Vec<(NaiveDate, PathBuf)>,
    /// Files that lost to a later-named file with the same date.
    pub superseded: Vec<PathBuf>,
    /// Files whose name carries no date.
    pub undated: Vec<PathBuf>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find the `.xlsx` files directly inside `data_path`, sorted by path.
///
/// Excel lock files (`~$...`) are ignored.
pub fn find_source_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && is_xlsx(entry.path())
                && !entry.file_name().to_string_lossy().starts_with("~$")
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Keep one file per report date: the one whose file name sorts last.
///
/// The result does not depend on the order of `files`.
pub fn select_daily_files(files: &[PathBuf]) -> DailySelection {
    let mut by_date: BTreeMap<NaiveDate, Vec<&PathBuf>> = BTreeMap::new();
    let mut undated = Vec::new();

    for path in files {
        match extract_report_date(&file_name(path)) {
            Some(date) => by_date.entry(date).or_default().push(path),
            None => undated.push(path.clone()),
        }
    }

    let mut selection = DailySelection {
        undated,
        ..Default::default()
    };

    for (date, mut group) in by_date {
        group.sort_by_key(|p| file_name(p));
        if let Some(winner) = group.pop() {
            selection.superseded.extend(group.into_iter().cloned());
            selection.selected.push((date, winner.clone()));
        }
    }

    selection.superseded.sort();
    selection
}

/// Run the whole ingestion stage over `data_path`.
///
/// A file that cannot be read is logged, recorded in
/// [`UnifiedDataset::failures`] and skipped. The returned dataset may be
/// empty; callers decide whether that is fatal.
pub fn load_unified_dataset(data_path: &Path) -> Result<UnifiedDataset> {
    if !data_path.is_dir() {
        return Err(TiemposError::DataPathNotFound(data_path.to_path_buf()));
    }

    let files = find_source_files(data_path);
    let selection = select_daily_files(&files);
    info!(
        files = files.len(),
        days = selection.selected.len(),
        superseded = selection.superseded.len(),
        "Discovered source files in {}",
        data_path.display()
    );
    for path in &selection.undated {
        debug!("No report date in file name: {}", path.display());
    }

    let mut dataset = UnifiedDataset {
        superseded: selection.superseded,
        ..Default::default()
    };

    for (date, path) in selection.selected {
        let table = match read_source_table(&path) {
            Ok(t) => t,
            Err(e) => {
                warn!("Error loading {}: {}", path.display(), e);
                dataset.failures.push(FileFailure {
                    path,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let Some(normalized) = normalize_table(&table, date) else {
            debug!("No usable rows in {}", path.display());
            continue;
        };

        debug!(
            rows = normalized.records.len(),
            "Loaded {}",
            path.display()
        );
        dataset.files.push(SourceFile {
            path,
            report_date: date,
            rows: normalized.records.len(),
        });
        dataset.columns.extend(&normalized.columns);
        dataset.records.extend(normalized.records);
    }

    info!(
        records = dataset.records.len(),
        files = dataset.files.len(),
        failures = dataset.failures.len(),
        "Unified dataset built"
    );
    Ok(dataset)
}

/// Read the first worksheet of `path`.
pub fn read_source_table(path: &Path) -> Result<SourceTable> {
    let mut workbook = open_workbook(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TiemposError::Workbook {
            path: path.to_path_buf(),
            message: "workbook has no worksheets".to_string(),
        })?;
    let range = read_sheet(&mut workbook, path, &sheet)?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(to_header).collect())
        .unwrap_or_default();
    let rows = rows.map(|r| r.iter().map(to_raw).collect()).collect();

    Ok(SourceTable { headers, rows })
}

/// Narrow a source table to its canonical columns and build records.
///
/// Returns `None` when no canonical column resolves or when no row survives
/// the center length filter.
pub fn normalize_table(table: &SourceTable, report_date: NaiveDate) -> Option<NormalizedTable> {
    let map = ColumnMap::resolve(&table.headers);
    if map.is_empty() {
        return None;
    }

    let year_month = month_key(report_date);
    let records: Vec<SourceRecord> = table
        .rows
        .iter()
        .filter(|row| !is_blank(row, &map))
        .filter_map(|row| {
            let cell = |column| cell_at(row, &map, column);
            let center = cell(CanonicalColumn::Center).as_identifier();
            if center
                .as_deref()
                .is_some_and(|c| c.chars().count() > MAX_CENTER_LEN)
            {
                return None;
            }
            Some(SourceRecord {
                center,
                item: cell(CanonicalColumn::Item).as_identifier(),
                available_time: normalize_number(&cell(CanonicalColumn::AvailableTime)),
                completed_qty: normalize_number(&cell(CanonicalColumn::CompletedQty)),
                completed_qty_prior: normalize_number(&cell(CanonicalColumn::CompletedQtyPrior)),
                work_order: cell(CanonicalColumn::WorkOrder).as_identifier(),
                report_date,
                year_month: year_month.clone(),
            })
        })
        .collect();

    if records.is_empty() {
        return None;
    }
    Some(NormalizedTable {
        records,
        columns: map.columns(),
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_xlsx(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn cell_at(row: &[RawValue], map: &ColumnMap, column: CanonicalColumn) -> RawValue {
    map.index_of(column)
        .and_then(|i| row.get(i))
        .cloned()
        .unwrap_or(RawValue::Missing)
}

/// True when every resolved column of the row is empty.
fn is_blank(row: &[RawValue], map: &ColumnMap) -> bool {
    CanonicalColumn::ALL
        .iter()
        .filter_map(|c| map.index_of(*c))
        .all(|i| match row.get(i) {
            None | Some(RawValue::Missing) => true,
            Some(RawValue::Text(s)) => s.trim().is_empty(),
            Some(RawValue::Number(_)) => false,
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
