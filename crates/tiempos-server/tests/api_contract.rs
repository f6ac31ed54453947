use std::net::SocketAddr;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value;
use tempfile::TempDir;
use tiempos_core::models::{
    CenterItemBreakdownRow, CenterLoadRow, RankingRow, RankingType, ReportTables,
};
use tiempos_data::writer::write_report;
use tiempos_runtime::data_manager::DataManager;
use tiempos_server::{build_router, AppState};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).expect("valid date")
}

fn center(day: u32, id: &str, load: f64) -> CenterLoadRow {
    CenterLoadRow {
        date: d(day),
        center: id.to_string(),
        daily_load: load,
        monthly_mean: load,
        monthly_total: load,
    }
}

fn fixture_tables() -> ReportTables {
    ReportTables {
        centers: vec![
            center(15, "101", 4.0),
            center(15, "102", 6.0),
            center(16, "101", 2.0),
            center(16, "9100", 50.0),
        ],
        breakdown: vec![
            CenterItemBreakdownRow {
                date: d(15),
                center: "101".into(),
                item: "A".into(),
                work_order: Some("OF1".into()),
                hours: 3.0,
            },
            CenterItemBreakdownRow {
                date: d(16),
                center: "101".into(),
                item: "B".into(),
                work_order: Some("OF2".into()),
                hours: 1.0,
            },
        ],
        rankings: vec![
            RankingRow {
                date: d(16),
                kind: RankingType::Center,
                rank: 1,
                center: "9100".into(),
                item: String::new(),
                daily_load: 50.0,
                monthly_mean: 50.0,
                monthly_total: 50.0,
            },
            RankingRow {
                date: d(16),
                kind: RankingType::Center,
                rank: 2,
                center: "101".into(),
                item: String::new(),
                daily_load: 2.0,
                monthly_mean: 3.0,
                monthly_total: 6.0,
            },
        ],
        has_work_order: true,
        ..Default::default()
    }
}

async fn spawn_app(report: &Path) -> SocketAddr {
    let app = build_router(AppState::new(DataManager::new(report)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn send_raw(addr: SocketAddr, path: &str) -> (u16, Value) {
    let mut stream = tokio::net::TcpStream::connect(addr).await.expect("connect");
    let req = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.expect("write");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    let json = serde_json::from_str(body).expect("json body");
    (status, json)
}

fn write_fixture(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("ANALISIS_MENSUAL_TIEMPOS_V2.xlsx");
    write_report(&fixture_tables(), &path).expect("write report");
    path
}

#[tokio::test]
async fn status_and_listing_endpoints() {
    let dir = TempDir::new().expect("tempdir");
    let addr = spawn_app(&write_fixture(&dir)).await;

    let (status, body) = send_raw(addr, "/api/status").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "online");
    assert_eq!(body["database"], "ANALISIS_MENSUAL_TIEMPOS_V2.xlsx");
    assert!(body["last_cache"].is_string());

    let (status, body) = send_raw(addr, "/api/centros").await;
    assert_eq!(status, 200);
    let ids: Vec<&str> = body["centros"]
        .as_array()
        .expect("centros array")
        .iter()
        .filter_map(|c| c["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["101", "102"]);

    let (status, body) = send_raw(addr, "/api/fechas").await;
    assert_eq!(status, 200);
    assert_eq!(body["fecha_min"], "2024-01-15");
    assert_eq!(body["fecha_max"], "2024-01-16");
}

#[tokio::test]
async fn summary_contract() {
    let dir = TempDir::new().expect("tempdir");
    let addr = spawn_app(&write_fixture(&dir)).await;

    let (status, body) = send_raw(addr, "/api/summary").await;
    assert_eq!(status, 200);
    assert_eq!(body["kpis"]["total_carga"], 12.0);
    assert_eq!(body["kpis"]["media_carga"], 6.0);
    assert_eq!(body["kpis"]["num_centros"], 2);
    assert_eq!(body["ultima_fecha"], "2024-01-16");
    let rankings = body["rankings"].as_array().expect("rankings");
    assert_eq!(rankings.len(), 1);
    assert_eq!(rankings[0]["Centro"], "101");
    assert_eq!(rankings[0]["Tipo"], "Centro");

    let (status, body) = send_raw(addr, "/api/summary?fecha_inicio=2030-01-01&fecha_fin=").await;
    assert_eq!(status, 200);
    assert_eq!(body["error"], "NO_DATA_IN_RANGE");
    assert_eq!(body["kpis"]["total_carga"], 0.0);

    let (status, body) = send_raw(addr, "/api/summary?fecha_inicio=15-01-2024").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_DATE");
}

#[tokio::test]
async fn center_endpoints() {
    let dir = TempDir::new().expect("tempdir");
    let addr = spawn_app(&write_fixture(&dir)).await;

    let (status, body) = send_raw(addr, "/api/centro/101,102").await;
    assert_eq!(status, 200);
    assert_eq!(body["multiple"], true);
    assert_eq!(body["centros"]["102"]["cargas"], serde_json::json!([6.0, 0.0]));

    let (status, body) = send_raw(addr, "/api/centro/9100").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "CENTRO_NOT_FOUND");

    let (status, body) = send_raw(addr, "/api/centro/101?fecha_inicio=2024-02-01").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NO_DATA_IN_RANGE");

    let (status, body) = send_raw(addr, "/api/centro/101/articulos").await;
    assert_eq!(status, 200);
    assert_eq!(body["fecha"], "2024-01-16");
    assert_eq!(body["articulos"][0]["of"], "OF2");

    let (status, body) = send_raw(addr, "/api/centro/101/articulos/mes/2024-01").await;
    assert_eq!(status, 200);
    assert_eq!(body["total_horas"], 4.0);
    assert_eq!(body["articulos"][0]["articulo"], "A");
    assert_eq!(body["articulos"][0]["porcentaje"], 75.0);

    let (status, body) = send_raw(addr, "/api/centro/101/articulos/mes/enero").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_MONTH");
}

#[tokio::test]
async fn missing_report_is_db_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let addr = spawn_app(&dir.path().join("missing.xlsx")).await;

    let (status, body) = send_raw(addr, "/api/centros").await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "DB_NOT_FOUND");

    let (status, body) = send_raw(addr, "/api/status").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "degraded");
    assert!(body["last_cache"].is_null());
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let dir = TempDir::new().expect("tempdir");
    let addr = spawn_app(&write_fixture(&dir)).await;
    let (status, body) = send_raw(addr, "/api/nope").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}
