//! Route handlers. Spreadsheet I/O and query derivation run on the blocking
//! pool; handlers only parse parameters and shape the response.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tiempos_core::models::ReportTables;
use tiempos_runtime::queries::{self, DateRange, Kpis, QueryError};

use crate::response::{ApiError, NOT_FOUND};
use crate::AppState;

const STATUS_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
}

impl RangeParams {
    fn range(&self) -> Result<DateRange, QueryError> {
        DateRange::parse(self.fecha_inicio.as_deref(), self.fecha_fin.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DateParams {
    pub fecha: Option<String>,
}

/// Run `f` against the current snapshot on the blocking pool.
async fn with_tables<T, F>(state: &AppState, f: F) -> Result<Json<T>, ApiError>
where
    F: FnOnce(&ReportTables) -> Result<T, QueryError> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let manager = Arc::clone(&state.manager);
    let result = tokio::task::spawn_blocking(move || -> Result<T, ApiError> {
        let snapshot = manager.get_data()?;
        Ok(f(&snapshot.tables)?)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(result))
}

pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let manager = Arc::clone(&state.manager);
    let loaded = tokio::task::spawn_blocking(move || manager.get_data().is_ok())
        .await
        .unwrap_or(false);
    let status = state.manager.status();
    Json(json!({
        "status": if loaded { "online" } else { "degraded" },
        "last_cache": status.last_loaded.map(|t| t.format(STATUS_TIME_FORMAT).to_string()),
        "database": state.manager.report_name(),
    }))
}

pub async fn centers_handler(State(state): State<AppState>) -> impl IntoResponse {
    with_tables(&state, |t| Ok(queries::list_centers(t))).await
}

pub async fn dates_handler(State(state): State<AppState>) -> impl IntoResponse {
    with_tables(&state, |t| Ok(queries::list_dates(t))).await
}

pub async fn summary_handler(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Response {
    let range = match params.range() {
        Ok(r) => r,
        Err(e) => return ApiError::from(e).into_response(),
    };
    match with_tables(&state, move |t| queries::summary(t, range)).await {
        // Empty range: 200 with zeroed KPIs.
        Err(ApiError::Query(QueryError::NoDataInRange)) => (
            StatusCode::OK,
            Json(json!({
                "error": QueryError::NoDataInRange.code(),
                "kpis": Kpis::default(),
            })),
        )
            .into_response(),
        other => other.into_response(),
    }
}

pub async fn center_detail_handler(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Query(params): Query<RangeParams>,
) -> Response {
    let range = match params.range() {
        Ok(r) => r,
        Err(e) => return ApiError::from(e).into_response(),
    };
    with_tables(&state, move |t| queries::center_detail(t, &ids, range))
        .await
        .into_response()
}

pub async fn center_items_handler(
    State(state): State<AppState>,
    Path(center): Path<String>,
    Query(params): Query<DateParams>,
) -> impl IntoResponse {
    with_tables(&state, move |t| {
        queries::center_items_for_date(t, &center, params.fecha.as_deref())
    })
    .await
}

pub async fn center_month_items_handler(
    State(state): State<AppState>,
    Path((ids, mes)): Path<(String, String)>,
) -> impl IntoResponse {
    with_tables(&state, move |t| queries::center_items_for_month(t, &ids, &mes)).await
}

pub async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": NOT_FOUND, "message": "no such route"})),
    )
}
