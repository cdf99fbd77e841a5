use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Directory under `$HOME` used when `--data-dir` is not given.
const DEFAULT_DATA_DIR: &str = ".nudge";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Headless task and habit sync driver speaking line-delimited JSON on stdio
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nudge",
    about = "Headless task and habit sync driver speaking line-delimited JSON on stdio",
    version
)]
pub struct Settings {
    /// Seconds to wait for a response before a call fails with a timeout (1-600)
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..=600))]
    pub call_timeout_secs: u64,

    /// Directory for logs (defaults to ~/.nudge)
    #[arg(long, env = "NUDGE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path (defaults to <data-dir>/logs/nudge.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os().collect())
    }

    /// Same as [`load`](Self::load) but with an explicit argument list, so
    /// tests do not depend on the process arguments.
    pub fn load_from_args(args: Vec<std::ffi::OsString>) -> Self {
        let mut settings = Settings::parse_from(args);
        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Bounded wait applied to every bridge call.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DEFAULT_DATA_DIR)
        })
    }

    /// Resolved log file path.
    pub fn log_file_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir().join("logs").join("nudge.log"))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
