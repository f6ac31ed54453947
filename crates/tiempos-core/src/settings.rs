use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default name of the report workbook.
pub const DEFAULT_REPORT_FILE: &str = "ANALISIS_MENSUAL_TIEMPOS_V2.xlsx";

/// Default directory scanned for daily exports.
pub const DEFAULT_DATA_DIR: &str = "List Avance Obra-Centro y Operacion";

/// Default report cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly production-time analysis and dashboard API
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tiempos-dashboard",
    about = "Monthly production-time analysis and dashboard API",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,

    /// Logging level
    #[arg(
        long,
        global = true,
        env = "TIEMPOS_LOG_LEVEL",
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,

    /// Log file path (stderr when absent)
    #[arg(long, global = true, env = "TIEMPOS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Aggregate the daily exports into the report workbook
    Analyze(AnalyzeArgs),
    /// Serve the report workbook over the read-only HTTP API
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Directory holding the daily `.xlsx` exports
    #[arg(long, env = "TIEMPOS_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Report workbook to write
    #[arg(long, env = "TIEMPOS_REPORT", default_value = DEFAULT_REPORT_FILE)]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Report workbook to serve
    #[arg(long, env = "TIEMPOS_REPORT", default_value = DEFAULT_REPORT_FILE)]
    pub report: PathBuf,

    /// Bind address
    #[arg(long, env = "TIEMPOS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Bind port
    #[arg(long, env = "TIEMPOS_PORT", default_value = "8000")]
    pub port: u16,

    /// Seconds before the cached report is reloaded (1-3600)
    #[arg(
        long,
        env = "TIEMPOS_CACHE_TTL",
        default_value = "60",
        value_parser = clap::value_parser!(u64).range(1..=3600)
    )]
    pub cache_ttl: u64,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`load`] but from an explicit argument list, enabling
    /// unit-testing without spawning subprocesses.
    ///
    /// [`load`]: Settings::load
    pub fn try_load_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve)
    }

    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

impl ServeArgs {
    /// `host:port` bind string.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Settings {
        let mut full = vec!["tiempos-dashboard"];
        full.extend_from_slice(args);
        Settings::try_load_from(full).expect("valid args")
    }

    #[test]
    fn test_analyze_defaults() {
        let settings = parse(&["analyze"]);
        assert_eq!(settings.log_level, "INFO");
        match settings.command {
            Command::Analyze(args) => {
                assert_eq!(args.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
                assert_eq!(args.output, PathBuf::from(DEFAULT_REPORT_FILE));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_analyze_explicit_paths() {
        let settings = parse(&["analyze", "--data-dir", "/exports", "--output", "/tmp/r.xlsx"]);
        let Command::Analyze(args) = settings.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.data_dir, PathBuf::from("/exports"));
        assert_eq!(args.output, PathBuf::from("/tmp/r.xlsx"));
    }

    #[test]
    fn test_serve_defaults() {
        let settings = parse(&["serve"]);
        let Command::Serve(args) = settings.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 8000);
        assert_eq!(args.cache_ttl, DEFAULT_CACHE_TTL_SECS);
        assert_eq!(args.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_serve_rejects_out_of_range_ttl() {
        let result = Settings::try_load_from(["tiempos-dashboard", "serve", "--cache-ttl", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let settings = parse(&["--log-level", "WARNING", "--debug", "serve"]);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let settings = parse(&["serve", "--log-level", "ERROR"]);
        assert_eq!(settings.log_level, "ERROR");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let result = Settings::try_load_from(["tiempos-dashboard", "--log-level", "TRACE", "serve"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_subcommand_rejected() {
        assert!(Settings::try_load_from(["tiempos-dashboard"]).is_err());
    }
}
