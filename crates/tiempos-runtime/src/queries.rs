//! Read-only derivations over the cached report tables.
//!
//! Every function here is pure: it takes the filtered [`ReportTables`] of a
//! snapshot plus request parameters and builds a serializable response.
//! Field names follow the JSON contract of the dashboard front end.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tiempos_core::formatting::{percentage, round2};
use tiempos_core::models::{CenterLoadRow, RankingRow, RankingType, ReportTables};
use tiempos_core::time_utils::{month_key, parse_iso_date, parse_month_key};

/// Number of centers charted on the summary.
pub const TOP_CENTERS: usize = 5;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Errors ────────────────────────────────────────────────────────────────────

/// Request-scoped failures, each with a stable machine code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("No data in the selected range")]
    NoDataInRange,

    #[error("Centers {0} not found")]
    CenterNotFound(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
}

impl QueryError {
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::NoDataInRange => "NO_DATA_IN_RANGE",
            QueryError::CenterNotFound(_) => "CENTRO_NOT_FOUND",
            QueryError::InvalidDate(_) => "INVALID_DATE",
            QueryError::InvalidMonth(_) => "INVALID_MONTH",
        }
    }
}

// ── DateRange ─────────────────────────────────────────────────────────────────

/// Inclusive date range; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Parse optional `YYYY-MM-DD` bounds. Empty strings count as absent.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, QueryError> {
        Ok(Self {
            start: parse_bound(start)?,
            end: parse_bound(end)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

fn parse_bound(value: Option<&str>) -> Result<Option<NaiveDate>, QueryError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse_iso_date(v)
            .map(Some)
            .ok_or_else(|| QueryError::InvalidDate(v.to_string())),
    }
}

/// Split a comma-separated id list, dropping blanks.
pub fn parse_center_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterTotal {
    pub id: String,
    pub carga_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentersResponse {
    pub centros: Vec<CenterTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatesResponse {
    pub fecha_min: Option<String>,
    pub fecha_max: Option<String>,
    pub fechas: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total_carga: f64,
    /// Mean of the per-date totals.
    pub media_carga: f64,
    pub num_centros: usize,
    pub num_dias: usize,
}

/// A date axis with one load per date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub fechas: Vec<String>,
    pub cargas: Vec<f64>,
}

/// One center's totals over the requested range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRanking {
    #[serde(rename = "Centro")]
    pub centro: String,
    #[serde(rename = "Carga_Total")]
    pub carga_total: f64,
    #[serde(rename = "Media_Diaria")]
    pub media_diaria: f64,
    #[serde(rename = "Dias")]
    pub dias: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResponse {
    pub kpis: Kpis,
    pub evolucion_total: Series,
    pub evolucion_centros: BTreeMap<String, Series>,
    /// Ids of [`evolucion_centros`](Self::evolucion_centros) by descending load.
    pub top_centros: Vec<String>,
    pub rankings: Vec<RankingRow>,
    pub ultima_fecha: Option<String>,
    pub ranking_periodo: Vec<PeriodRanking>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadStats {
    pub total: f64,
    pub media: f64,
    pub max: f64,
    pub min: f64,
}

impl LoadStats {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let total: f64 = values.iter().sum();
        Self {
            total: round2(total),
            media: round2(total / values.len() as f64),
            max: round2(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            min: round2(values.iter().copied().fold(f64::INFINITY, f64::min)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterSeries {
    pub fechas: Vec<String>,
    pub cargas: Vec<f64>,
    pub stats: LoadStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterDetailResponse {
    pub multiple: bool,
    /// Shared date axis of every series.
    pub fechas: Vec<String>,
    pub centros: BTreeMap<String, CenterSeries>,
    pub stats_globales: LoadStats,
    /// Series of the single requested center; empty for several.
    pub cargas: Vec<f64>,
    /// Stats of the single requested center, or the global stats.
    pub stats: LoadStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateItem {
    pub articulo: String,
    /// Present only when the report carries work orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub of: Option<Option<String>>,
    pub horas: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateItemsResponse {
    pub centro: String,
    pub fecha: Option<String>,
    pub articulos: Vec<DateItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthItem {
    pub articulo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub of: Option<Option<String>>,
    pub horas: f64,
    /// Distinct dates with hours.
    pub dias: usize,
    pub porcentaje: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthItemsResponse {
    pub mes: String,
    pub centros: Vec<String>,
    pub total_horas: f64,
    pub articulos: Vec<MonthItem>,
}

// ── Queries ───────────────────────────────────────────────────────────────────

/// All centers with their total load, heaviest first.
pub fn list_centers(tables: &ReportTables) -> CentersResponse {
    let centros = sorted_totals(&tables.centers)
        .into_iter()
        .map(|(id, total)| CenterTotal {
            id,
            carga_total: round2(total),
        })
        .collect();
    CentersResponse { centros }
}

/// Distinct dates of the center table, ascending.
pub fn list_dates(tables: &ReportTables) -> DatesResponse {
    let dates: BTreeSet<NaiveDate> = tables.centers.iter().map(|r| r.date).collect();
    let fechas: Vec<String> = dates.into_iter().map(fmt_date).collect();
    DatesResponse {
        fecha_min: fechas.first().cloned(),
        fecha_max: fechas.last().cloned(),
        fechas,
    }
}

/// KPIs, evolution series and rankings over `range`.
pub fn summary(tables: &ReportTables, range: DateRange) -> Result<SummaryResponse, QueryError> {
    let rows: Vec<&CenterLoadRow> = tables
        .centers
        .iter()
        .filter(|r| range.contains(r.date))
        .collect();
    if rows.is_empty() {
        return Err(QueryError::NoDataInRange);
    }

    let mut per_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in &rows {
        *per_date.entry(r.date).or_insert(0.0) += r.daily_load;
    }
    let total: f64 = rows.iter().map(|r| r.daily_load).sum();
    let date_totals: f64 = per_date.values().sum();

    let centers = sorted_totals(rows.iter().copied());
    let kpis = Kpis {
        total_carga: round2(total),
        media_carga: round2(date_totals / per_date.len() as f64),
        num_centros: centers.len(),
        num_dias: per_date.len(),
    };

    let evolucion_total = Series {
        fechas: per_date.keys().copied().map(fmt_date).collect(),
        cargas: per_date.values().copied().collect(),
    };

    let top_centros: Vec<String> = centers
        .iter()
        .take(TOP_CENTERS)
        .map(|(id, _)| id.clone())
        .collect();
    let evolucion_centros = top_centros
        .iter()
        .map(|id| (id.clone(), center_series(&rows, id)))
        .collect();

    let center_rankings: Vec<&RankingRow> = tables
        .rankings
        .iter()
        .filter(|r| r.kind == RankingType::Center && range.contains(r.date))
        .collect();
    let latest = center_rankings.iter().map(|r| r.date).max();
    let rankings = center_rankings
        .into_iter()
        .filter(|r| Some(r.date) == latest)
        .cloned()
        .collect();

    Ok(SummaryResponse {
        kpis,
        evolucion_total,
        evolucion_centros,
        top_centros,
        rankings,
        ultima_fecha: latest.map(fmt_date),
        ranking_periodo: period_ranking(&rows),
    })
}

/// Per-center series over `range`, aligned on a shared date axis.
///
/// Unknown ids fail before the range is applied; a range that leaves no
/// rows fails with [`QueryError::NoDataInRange`].
pub fn center_detail(
    tables: &ReportTables,
    raw_ids: &str,
    range: DateRange,
) -> Result<CenterDetailResponse, QueryError> {
    let ids = parse_center_ids(raw_ids);
    let matching: Vec<&CenterLoadRow> = tables
        .centers
        .iter()
        .filter(|r| ids.contains(&r.center))
        .collect();
    if matching.is_empty() {
        return Err(QueryError::CenterNotFound(raw_ids.to_string()));
    }

    let rows: Vec<&CenterLoadRow> = matching
        .into_iter()
        .filter(|r| range.contains(r.date))
        .collect();
    if rows.is_empty() {
        return Err(QueryError::NoDataInRange);
    }

    let axis: Vec<NaiveDate> = rows
        .iter()
        .map(|r| r.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut centros = BTreeMap::new();
    for id in &ids {
        let own: Vec<&CenterLoadRow> = rows.iter().copied().filter(|r| &r.center == id).collect();
        if own.is_empty() {
            continue;
        }
        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for r in &own {
            *by_date.entry(r.date).or_insert(0.0) += r.daily_load;
        }
        let loads: Vec<f64> = own.iter().map(|r| r.daily_load).collect();
        centros.insert(
            id.clone(),
            CenterSeries {
                fechas: axis.iter().copied().map(fmt_date).collect(),
                cargas: axis
                    .iter()
                    .map(|d| by_date.get(d).copied().unwrap_or(0.0))
                    .collect(),
                stats: LoadStats::from_values(&loads),
            },
        );
    }

    let mut per_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in &rows {
        *per_date.entry(r.date).or_insert(0.0) += r.daily_load;
    }
    let date_totals: Vec<f64> = per_date.values().copied().collect();
    let mut stats_globales = LoadStats::from_values(&date_totals);
    stats_globales.total = round2(rows.iter().map(|r| r.daily_load).sum());

    let single = match ids.as_slice() {
        [only] => centros.get(only),
        _ => None,
    };
    let (cargas, stats) = match single {
        Some(series) => (series.cargas.clone(), series.stats),
        None => (Vec::new(), stats_globales),
    };

    Ok(CenterDetailResponse {
        multiple: ids.len() > 1,
        fechas: axis.into_iter().map(fmt_date).collect(),
        centros,
        stats_globales,
        cargas,
        stats,
    })
}

/// Item breakdown of one center on one date (latest breakdown date when
/// `fecha` is absent).
pub fn center_items_for_date(
    tables: &ReportTables,
    center: &str,
    fecha: Option<&str>,
) -> Result<DateItemsResponse, QueryError> {
    let center = center.trim();
    let date = match parse_bound(fecha)? {
        Some(d) => Some(d),
        None => tables.breakdown.iter().map(|r| r.date).max(),
    };

    let articulos = tables
        .breakdown
        .iter()
        .filter(|r| r.center == center && Some(r.date) == date)
        .map(|r| DateItem {
            articulo: r.item.clone(),
            of: tables.has_work_order.then(|| r.work_order.clone()),
            horas: round2(r.hours),
        })
        .collect();

    Ok(DateItemsResponse {
        centro: center.to_string(),
        fecha: date.map(fmt_date),
        articulos,
    })
}

/// Item and work-order breakdown of the given centers over one month.
pub fn center_items_for_month(
    tables: &ReportTables,
    raw_ids: &str,
    mes: &str,
) -> Result<MonthItemsResponse, QueryError> {
    let mes = parse_month_key(mes).ok_or_else(|| QueryError::InvalidMonth(mes.to_string()))?;
    let ids = parse_center_ids(raw_ids);

    let mut groups: BTreeMap<(String, Option<String>), (f64, BTreeSet<NaiveDate>)> =
        BTreeMap::new();
    for r in tables
        .breakdown
        .iter()
        .filter(|r| ids.contains(&r.center) && month_key(r.date) == mes)
    {
        let work_order = if tables.has_work_order {
            r.work_order.clone()
        } else {
            None
        };
        let entry = groups.entry((r.item.clone(), work_order)).or_default();
        entry.0 += r.hours;
        entry.1.insert(r.date);
    }

    let total: f64 = groups.values().map(|(h, _)| h).sum();
    let mut groups: Vec<_> = groups.into_iter().collect();
    groups.sort_by(|(_, (x, _)), (_, (y, _))| y.total_cmp(x));
    let articulos: Vec<MonthItem> = groups
        .into_iter()
        .map(|((articulo, of), (horas, dates))| MonthItem {
            articulo,
            of: tables.has_work_order.then_some(of),
            horas: round2(horas),
            dias: dates.len(),
            porcentaje: percentage(horas, total, 2),
        })
        .collect();

    Ok(MonthItemsResponse {
        mes,
        centros: ids,
        total_horas: round2(total),
        articulos,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Total load per center, heaviest first; ties in id order.
fn sorted_totals<'a>(rows: impl IntoIterator<Item = &'a CenterLoadRow>) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for r in rows {
        *totals.entry(r.center.as_str()).or_insert(0.0) += r.daily_load;
    }
    let mut sorted: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(id, total)| (id.to_string(), total))
        .collect();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
    sorted
}

fn center_series(rows: &[&CenterLoadRow], id: &str) -> Series {
    let mut own: Vec<&&CenterLoadRow> = rows.iter().filter(|r| r.center == id).collect();
    own.sort_by_key(|r| r.date);
    Series {
        fechas: own.iter().map(|r| fmt_date(r.date)).collect(),
        cargas: own.iter().map(|r| r.daily_load).collect(),
    }
}

fn period_ranking(rows: &[&CenterLoadRow]) -> Vec<PeriodRanking> {
    let mut acc: BTreeMap<&str, (f64, BTreeSet<NaiveDate>)> = BTreeMap::new();
    for r in rows {
        let entry = acc.entry(r.center.as_str()).or_default();
        entry.0 += r.daily_load;
        entry.1.insert(r.date);
    }
    let mut out: Vec<PeriodRanking> = acc
        .into_iter()
        .map(|(id, (total, dates))| PeriodRanking {
            centro: id.to_string(),
            carga_total: round2(total),
            media_diaria: round2(total / dates.len().max(1) as f64),
            dias: dates.len(),
        })
        .collect();
    out.sort_by(|a, b| b.carga_total.total_cmp(&a.carga_total));
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
