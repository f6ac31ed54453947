//! Offline analysis pipeline.
//!
//! Loads the daily exports, aggregates them and writes the report workbook,
//! returning an [`AnalysisResult`] that describes the run.

use std::path::Path;

use chrono::Utc;
use tiempos_core::models::{FileFailure, ReportTables};
use tiempos_core::{Result, TiemposError};
use tracing::info;

use crate::aggregator::LoadAggregator;
use crate::reader::load_unified_dataset;
use crate::writer::write_report;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Files that contributed rows.
    pub files_used: usize,
    /// Files dropped by the one-file-per-day rule.
    pub files_superseded: usize,
    /// Files that failed to load.
    pub files_failed: usize,
    /// Source records after ingestion filters.
    pub records_processed: usize,
    pub center_rows: usize,
    pub item_rows: usize,
    pub breakdown_rows: usize,
    pub ranking_rows: usize,
    /// Wall-clock seconds spent loading the source files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent aggregating.
    pub aggregate_time_seconds: f64,
    /// Wall-clock seconds spent writing the report (zero when not written).
    pub write_time_seconds: f64,
}

/// The complete output of [`analyze_sources`] or [`run_analysis`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub tables: ReportTables,
    pub metadata: AnalysisMetadata,
    /// Per-file load failures, already logged.
    pub failures: Vec<FileFailure>,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Load and aggregate the exports in `data_path` without writing anything.
///
/// Fails with [`TiemposError::EmptyDataset`] when no file contributed rows.
pub fn analyze_sources(data_path: &Path) -> Result<AnalysisResult> {
    // ── Step 1: Load ──────────────────────────────────────────────────────────
    let load_start = std::time::Instant::now();
    let dataset = load_unified_dataset(data_path)?;
    let load_time = load_start.elapsed().as_secs_f64();

    if dataset.is_empty() {
        return Err(TiemposError::EmptyDataset(data_path.to_path_buf()));
    }

    // ── Step 2: Aggregate ─────────────────────────────────────────────────────
    let aggregate_start = std::time::Instant::now();
    let tables = LoadAggregator::aggregate(&dataset);
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        files_used: dataset.files.len(),
        files_superseded: dataset.superseded.len(),
        files_failed: dataset.failures.len(),
        records_processed: dataset.records.len(),
        center_rows: tables.centers.len(),
        item_rows: tables.items.len(),
        breakdown_rows: tables.breakdown.len(),
        ranking_rows: tables.rankings.len(),
        load_time_seconds: load_time,
        aggregate_time_seconds: aggregate_time,
        write_time_seconds: 0.0,
    };

    Ok(AnalysisResult {
        tables,
        metadata,
        failures: dataset.failures,
    })
}

/// Run the full pipeline and write the report to `output`.
pub fn run_analysis(data_path: &Path, output: &Path) -> Result<AnalysisResult> {
    let mut result = analyze_sources(data_path)?;

    let write_start = std::time::Instant::now();
    write_report(&result.tables, output)?;
    result.metadata.write_time_seconds = write_start.elapsed().as_secs_f64();

    let m = &result.metadata;
    info!(
        files = m.files_used,
        failed = m.files_failed,
        records = m.records_processed,
        centers = m.center_rows,
        items = m.item_rows,
        load_s = m.load_time_seconds,
        aggregate_s = m.aggregate_time_seconds,
        write_s = m.write_time_seconds,
        "Analysis complete"
    );
    Ok(result)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::read_report;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn write_export(dir: &Path, name: &str, rows: &[(&str, &str, f64)]) {
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        for (c, h) in ["Centro", "Artículo", "TEjec_Disp", "O.F"].iter().enumerate() {
            ws.write_string(0, c as u16, *h).unwrap();
        }
        for (i, (center, item, time)) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            ws.write_string(r, 0, *center).unwrap();
            ws.write_string(r, 1, *item).unwrap();
            ws.write_number(r, 2, *time).unwrap();
            ws.write_string(r, 3, "OF-1").unwrap();
        }
        wb.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_empty_directory_is_empty_dataset_error() {
        let dir = TempDir::new().unwrap();
        let err = analyze_sources(dir.path()).unwrap_err();
        assert!(matches!(err, TiemposError::EmptyDataset(_)));
    }

    #[test]
    fn test_run_analysis_writes_report() {
        let src = TempDir::new().unwrap();
        write_export(
            src.path(),
            "Avance (2024-02-10).xlsx",
            &[("123", "A", 2.0), ("123", "B", 3.0), ("45678", "A", 50.0)],
        );
        write_export(src.path(), "Avance (2024-02-20).xlsx", &[("123", "A", 15.0)]);

        let out = TempDir::new().unwrap();
        let report = out.path().join("report.xlsx");
        let result = run_analysis(src.path(), &report).unwrap();

        assert_eq!(result.metadata.files_used, 2);
        assert_eq!(result.metadata.records_processed, 3);
        assert!(result.failures.is_empty());

        let loaded = read_report(&report).unwrap();
        assert_eq!(loaded, result.tables);
        assert!(loaded.has_work_order);

        let feb: Vec<_> = loaded.centers.iter().filter(|r| r.center == "123").collect();
        assert_eq!(feb.len(), 2);
        for row in feb {
            assert_eq!(row.monthly_mean, 10.0);
            assert_eq!(row.monthly_total, 20.0);
        }
        assert!(loaded.centers.iter().all(|r| r.center != "45678"));
    }
}
