use chrono_tz::Tz;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::models::ChartMode;

// ── OutputFormat ───────────────────────────────────────────────────────────────

/// How the report is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables.
    #[default]
    Text,
    /// The full report as JSON.
    Json,
    /// The two-line PPV / NOPPV totals block.
    Totals,
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Hourly earnings report from pasted transaction exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "earnings-report",
    about = "Hourly earnings report from pasted transaction exports",
    version
)]
pub struct Settings {
    /// Export file to read ("-" or absent reads stdin)
    pub input: Option<PathBuf>,

    /// Timezone the export's times are in (auto-detected if not specified)
    #[arg(long, default_value = "auto", env = "EARNINGS_TIMEZONE")]
    pub timezone: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Series shown in the hourly table
    #[arg(long, value_enum, default_value_t = ChartMode::All)]
    pub mode: ChartMode,

    /// Number of top spenders to list
    #[arg(long, default_value = "3")]
    pub top: usize,

    /// Re-run the report whenever the input file changes
    #[arg(long, requires = "input")]
    pub watch: bool,

    /// Poll interval in seconds for --watch (1-60)
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u32).range(1..=60))]
    pub refresh_rate: u32,

    /// Logging level
    #[arg(long, default_value = "INFO", env = "EARNINGS_LOG", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse CLI arguments and resolve `"auto"` values.
    pub fn load() -> Self {
        Self::parse().resolve()
    }

    /// Same as [`Settings::load`] but with an explicit argument list.
    pub fn load_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(args).resolve()
    }

    /// Resolve the `"auto"` timezone and apply the `--debug` flag.
    pub fn resolve(mut self) -> Self {
        if self.timezone == "auto" {
            self.timezone = crate::time_utils::get_system_timezone();
        }

        if self.debug {
            self.log_level = "DEBUG".to_string();
        }

        self
    }

    /// The configured timezone; unknown names fall back to UTC.
    pub fn tz(&self) -> Tz {
        crate::time_utils::resolve_timezone(&self.timezone)
    }

    /// The input path, with `"-"` meaning stdin.
    pub fn input_path(&self) -> Option<&std::path::Path> {
        self.input
            .as_deref()
            .filter(|p| p.as_os_str() != "-")
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
