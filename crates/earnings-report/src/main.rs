mod bootstrap;
mod render;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono_tz::Tz;
use earnings_core::settings::Settings;
use earnings_data::analysis::analyze;
use earnings_data::reader::read_input;
use earnings_runtime::watcher::InputWatcher;

/// Exit status when any pasted row could not be parsed.
const EXIT_BAD_INPUT: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    let tz = settings.tz();
    tracing::info!("Earnings report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Timezone: {}, Format: {:?}, Mode: {:?}",
        tz.name(),
        settings.format,
        settings.mode
    );

    if settings.watch {
        run_watch(&settings, tz).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let raw = read_input(settings.input_path())?;
    let report = analyze(&raw, tz, settings.top);
    print!(
        "{}",
        render::render(&report, settings.format, settings.mode, tz)?
    );

    if report.has_error() {
        Ok(ExitCode::from(EXIT_BAD_INPUT))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Print a fresh report each time the input file changes, until Ctrl+C.
async fn run_watch(settings: &Settings, tz: Tz) -> Result<()> {
    let Some(path) = settings.input_path() else {
        bail!("--watch needs an input file, not stdin");
    };

    tracing::info!("Watching {} every {}s", path.display(), settings.refresh_rate);

    let watcher = InputWatcher::new(
        path,
        Duration::from_secs(u64::from(settings.refresh_rate)),
        tz,
        settings.top,
    );
    let (mut rx, handle) = watcher.start();

    loop {
        tokio::select! {
            snapshot = rx.recv() => {
                let Some(snapshot) = snapshot else {
                    tracing::warn!("watch task stopped");
                    break;
                };
                println!("── Report #{} ──", snapshot.generation);
                print!(
                    "{}",
                    render::render(&snapshot.report, settings.format, settings.mode, tz)?
                );
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; stopping watch task");
                break;
            }
        }
    }

    handle.abort();
    Ok(())
}
