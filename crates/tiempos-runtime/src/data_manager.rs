//! TTL-cached access to the report workbook.
//!
//! [`DataManager::get_data`] hands out an immutable [`CacheSnapshot`]. A stale
//! or missing snapshot triggers one reload: the report is read and filtered
//! off to the side, then published with a single pointer swap, so readers see
//! either the old tables or the new ones and never a mix. When a reload fails
//! the previous snapshot keeps being served and the next call retries.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tiempos_core::models::ReportTables;
use tiempos_core::settings::DEFAULT_CACHE_TTL_SECS;
use tiempos_core::{Result, TiemposError};
use tiempos_data::workbook::read_report;

use crate::filter::apply_business_filter;

// ── CacheSnapshot ─────────────────────────────────────────────────────────────

/// Filtered report tables as of one successful load.
#[derive(Debug)]
pub struct CacheSnapshot {
    pub tables: ReportTables,
    /// Monotonic load time, used for TTL checks.
    pub loaded_at: Instant,
    /// Wall-clock load time, reported by the status endpoint.
    pub loaded_at_wall: DateTime<Local>,
}

impl CacheSnapshot {
    pub fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }
}

/// Point-in-time view of the cache for health reporting.
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub loaded: bool,
    pub last_loaded: Option<DateTime<Local>>,
    pub age: Option<Duration>,
    pub last_error: Option<String>,
    pub reload_count: u64,
}

// ── DataManager ───────────────────────────────────────────────────────────────

/// TTL-cached wrapper around the report reader.
///
/// # Example
/// ```no_run
/// use tiempos_runtime::data_manager::DataManager;
///
/// let mgr = DataManager::new("ANALISIS_MENSUAL_TIEMPOS_V2.xlsx");
/// if let Ok(snapshot) = mgr.get_data() {
///     println!("centers rows: {}", snapshot.tables.centers.len());
/// }
/// ```
pub struct DataManager {
    report_path: PathBuf,
    cache_ttl: Duration,
    snapshot: RwLock<Option<Arc<CacheSnapshot>>>,
    /// Serializes reloads; readers of a fresh snapshot never take it.
    reload_lock: Mutex<()>,
    last_error: Mutex<Option<String>>,
    reload_count: AtomicU64,
}

impl DataManager {
    /// Create a manager with the default TTL.
    pub fn new(report_path: impl Into<PathBuf>) -> Self {
        Self::with_ttl(report_path, Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }

    pub fn with_ttl(report_path: impl Into<PathBuf>, cache_ttl: Duration) -> Self {
        Self {
            report_path: report_path.into(),
            cache_ttl,
            snapshot: RwLock::new(None),
            reload_lock: Mutex::new(()),
            last_error: Mutex::new(None),
            reload_count: AtomicU64::new(0),
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the cached tables, reloading them first when stale.
    ///
    /// Fails with [`TiemposError::ReportUnavailable`] only when the report
    /// cannot be loaded and nothing was ever cached.
    pub fn get_data(&self) -> Result<Arc<CacheSnapshot>> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot);
        }

        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have reloaded while we waited.
        if let Some(snapshot) = self.fresh_snapshot() {
            tracing::debug!("cache refreshed by a concurrent reload");
            return Ok(snapshot);
        }

        match self.load() {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(Arc::clone(&snapshot));
                self.reload_count.fetch_add(1, Ordering::Relaxed);
                *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
                tracing::info!(
                    centers = snapshot.tables.centers.len(),
                    rankings = snapshot.tables.rankings.len(),
                    breakdown = snapshot.tables.breakdown.len(),
                    "report cache reloaded from {}",
                    self.report_path.display()
                );
                Ok(snapshot)
            }
            Err(e) => {
                let reason = e.to_string();
                *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(reason.clone());
                match self.current() {
                    Some(stale) => {
                        tracing::warn!(error = %reason, "report reload failed; serving cached data");
                        Ok(stale)
                    }
                    None => {
                        tracing::error!(error = %reason, "report unavailable");
                        Err(TiemposError::ReportUnavailable {
                            path: self.report_path.clone(),
                            reason,
                        })
                    }
                }
            }
        }
    }

    /// Drop the current snapshot so the next [`get_data`] reloads.
    ///
    /// [`get_data`]: DataManager::get_data
    pub fn invalidate_cache(&self) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::debug!("cache invalidated");
    }

    pub fn status(&self) -> CacheStatus {
        let current = self.current();
        CacheStatus {
            loaded: current.is_some(),
            last_loaded: current.as_ref().map(|s| s.loaded_at_wall),
            age: current.as_ref().map(|s| s.age()),
            last_error: self.last_error(),
            reload_count: self.reload_count(),
        }
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// File name of the report, for display.
    pub fn report_name(&self) -> String {
        self.report_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.report_path.display().to_string())
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Description of the last failed reload, cleared by a successful one.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful reloads so far.
    pub fn reload_count(&self) -> u64 {
        self.reload_count.load(Ordering::Relaxed)
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn current(&self) -> Option<Arc<CacheSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current snapshot if its age is within the TTL.
    fn fresh_snapshot(&self) -> Option<Arc<CacheSnapshot>> {
        self.current().filter(|s| s.age() <= self.cache_ttl)
    }

    fn load(&self) -> Result<CacheSnapshot> {
        let tables = read_report(&self.report_path)?;
        Ok(CacheSnapshot {
            tables: apply_business_filter(tables),
            loaded_at: Instant::now(),
            loaded_at_wall: Local::now(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
