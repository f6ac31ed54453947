mod bootstrap;

use std::time::Duration;

use anyhow::{Context, Result};
use tiempos_core::settings::{AnalyzeArgs, Command, ServeArgs, Settings};
use tiempos_data::analysis::run_analysis;
use tiempos_runtime::data_manager::DataManager;
use tiempos_server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;
    tracing::info!("Tiempos dashboard v{} starting", env!("CARGO_PKG_VERSION"));

    match settings.command {
        Command::Analyze(args) => analyze(args).await,
        Command::Serve(args) => serve(args).await,
    }
}

async fn analyze(args: AnalyzeArgs) -> Result<()> {
    tracing::info!(
        data_dir = %args.data_dir.display(),
        output = %args.output.display(),
        "Running analysis"
    );
    let result = tokio::task::spawn_blocking(move || run_analysis(&args.data_dir, &args.output))
        .await
        .context("analysis task panicked")??;

    if !result.failures.is_empty() {
        tracing::warn!(
            failed = result.failures.len(),
            "Some source files could not be read"
        );
    }
    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let addr = args.bind_address();
    let manager = DataManager::with_ttl(&args.report, Duration::from_secs(args.cache_ttl));
    let state = AppState::new(manager);

    // A missing report is not fatal: requests answer DB_NOT_FOUND until it appears.
    let warm = std::sync::Arc::clone(&state.manager);
    match tokio::task::spawn_blocking(move || warm.get_data()).await {
        Ok(Ok(snapshot)) => tracing::info!(
            rows = snapshot.tables.total_rows(),
            "Report loaded"
        ),
        Ok(Err(e)) => tracing::warn!(error = %e, "Report not available at startup"),
        Err(e) => tracing::warn!(error = %e, "Report warm-up task failed"),
    }

    tiempos_server::serve(&addr, state)
        .await
        .with_context(|| format!("serving on {addr}"))
}
