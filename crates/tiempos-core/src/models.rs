use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::columns::{CanonicalColumn, ColumnSet};

// ── Report workbook layout ────────────────────────────────────────────────────

/// Sheet holding [`CenterLoadRow`]s.
pub const SHEET_CENTERS: &str = "Datos_Centros";
/// Sheet holding [`ItemLoadRow`]s.
pub const SHEET_ITEMS: &str = "Datos_Articulos";
/// Sheet holding [`CenterItemBreakdownRow`]s.
pub const SHEET_BREAKDOWN: &str = "Datos_Centro_Articulo";
/// Sheet holding [`RankingRow`]s.
pub const SHEET_RANKINGS: &str = "Rankings";

pub const CENTER_HEADERS: [&str; 5] = ["Fecha", "Centro", "Carga_Dia", "Media_Mensual", "Total_Mes"];
pub const ITEM_HEADERS: [&str; 5] = ["Fecha", "Artículo", "Carga_Dia", "Media_Mensual", "Total_Mes"];
pub const BREAKDOWN_HEADERS: [&str; 4] = ["Fecha", "Centro", "Articulo", "Horas"];
pub const BREAKDOWN_HEADERS_WITH_OF: [&str; 5] = ["Fecha", "Centro", "Articulo", "OF", "Horas"];
pub const RANKING_HEADERS: [&str; 8] = [
    "Fecha",
    "Tipo",
    "Ranking",
    "Centro",
    "Articulo",
    "Carga_Dia",
    "Media_Mensual",
    "Total_Mes",
];

/// Number of rows kept per date and ranking type.
pub const RANKING_SIZE: usize = 15;

// ── Ingestion ─────────────────────────────────────────────────────────────────

/// One normalized row from a source spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// Work-center identifier; at most 4 characters. Absent when the cell
    /// was empty or the file had no center column.
    pub center: Option<String>,
    /// Trimmed item identifier.
    pub item: Option<String>,
    /// Available execution time, cleaned by the value normalizer.
    pub available_time: Option<f64>,
    pub completed_qty: Option<f64>,
    pub completed_qty_prior: Option<f64>,
    /// Production order identifier.
    pub work_order: Option<String>,
    /// Date taken from the source file name.
    pub report_date: NaiveDate,
    /// `YYYY-MM` of `report_date`.
    pub year_month: String,
}

/// A source file admitted into the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub report_date: NaiveDate,
    /// Rows contributed after filtering.
    pub rows: usize,
}

/// A source file that failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// All records from the admitted source files, in ascending date order.
#[derive(Debug, Clone, Default)]
pub struct UnifiedDataset {
    pub records: Vec<SourceRecord>,
    /// Union of the canonical columns resolved across all files.
    pub columns: ColumnSet,
    /// Files that contributed rows.
    pub files: Vec<SourceFile>,
    /// Files dropped because a later-named file exists for the same date.
    pub superseded: Vec<PathBuf>,
    /// Files skipped because they could not be read.
    pub failures: Vec<FileFailure>,
}

impl UnifiedDataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: CanonicalColumn) -> bool {
        self.columns.contains(column)
    }
}

// ── Derived tables ────────────────────────────────────────────────────────────

/// Daily load of one center with its month's mean and total (`Datos_Centros`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterLoadRow {
    #[serde(rename = "Fecha")]
    pub date: NaiveDate,
    #[serde(rename = "Centro")]
    pub center: String,
    #[serde(rename = "Carga_Dia")]
    pub daily_load: f64,
    #[serde(rename = "Media_Mensual")]
    pub monthly_mean: f64,
    #[serde(rename = "Total_Mes")]
    pub monthly_total: f64,
}

/// Daily load of one item with its month's mean and total (`Datos_Articulos`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemLoadRow {
    #[serde(rename = "Fecha")]
    pub date: NaiveDate,
    #[serde(rename = "Artículo")]
    pub item: String,
    #[serde(rename = "Carga_Dia")]
    pub daily_load: f64,
    #[serde(rename = "Media_Mensual")]
    pub monthly_mean: f64,
    #[serde(rename = "Total_Mes")]
    pub monthly_total: f64,
}

/// Hours per (date, center, item, work order) (`Datos_Centro_Articulo`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterItemBreakdownRow {
    #[serde(rename = "Fecha")]
    pub date: NaiveDate,
    #[serde(rename = "Centro")]
    pub center: String,
    #[serde(rename = "Articulo")]
    pub item: String,
    #[serde(rename = "OF")]
    pub work_order: Option<String>,
    #[serde(rename = "Horas")]
    pub hours: f64,
}

/// Which entity a ranking row ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankingType {
    #[serde(rename = "Centro")]
    Center,
    #[serde(rename = "Artículo")]
    Item,
}

impl RankingType {
    /// Label written to the `Tipo` column.
    pub fn label(self) -> &'static str {
        match self {
            RankingType::Center => "Centro",
            RankingType::Item => "Artículo",
        }
    }

    /// Parse a `Tipo` cell. Accepts the label with or without the accent.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "Centro" => Some(RankingType::Center),
            "Artículo" | "Articulo" => Some(RankingType::Item),
            _ => None,
        }
    }
}

/// Top-N position of a center or item on one date (`Rankings`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    #[serde(rename = "Fecha")]
    pub date: NaiveDate,
    #[serde(rename = "Tipo")]
    pub kind: RankingType,
    /// 1-based position within (date, kind).
    #[serde(rename = "Ranking")]
    pub rank: u32,
    /// Empty for item rankings.
    #[serde(rename = "Centro")]
    pub center: String,
    /// Empty for center rankings.
    #[serde(rename = "Articulo")]
    pub item: String,
    #[serde(rename = "Carga_Dia")]
    pub daily_load: f64,
    #[serde(rename = "Media_Mensual")]
    pub monthly_mean: f64,
    #[serde(rename = "Total_Mes")]
    pub monthly_total: f64,
}

/// The four derived tables persisted in the report workbook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportTables {
    pub centers: Vec<CenterLoadRow>,
    pub items: Vec<ItemLoadRow>,
    pub breakdown: Vec<CenterItemBreakdownRow>,
    pub rankings: Vec<RankingRow>,
    /// Whether the breakdown carries a work-order column.
    pub has_work_order: bool,
}

impl ReportTables {
    /// Total number of rows across the four tables.
    pub fn total_rows(&self) -> usize {
        self.centers.len() + self.items.len() + self.breakdown.len() + self.rankings.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
