//! Async input watcher.
//!
//! Polls an export file in a tokio task and re-runs the analysis whenever its
//! text changes, sending each fresh [`Report`] through an `mpsc` channel. The
//! whole text is re-parsed every time; parsing runs on the blocking pool so a
//! large paste never stalls the consumer.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use earnings_data::analysis::{analyze, Report};
use tokio::sync::mpsc;
use tokio::time;

// ── Public types ──────────────────────────────────────────────────────────────

/// One analysis of the watched file.
#[derive(Debug, Clone)]
pub struct ReportSnapshot {
    pub report: Report,
    /// 1 for the first analysis, incremented on every content change.
    pub generation: u64,
}

// ── InputWatcher ──────────────────────────────────────────────────────────────

/// Background re-analysis of a file that is being edited or re-pasted.
pub struct InputWatcher {
    path: PathBuf,
    poll_interval: Duration,
    tz: Tz,
    top_n: usize,
}

impl InputWatcher {
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration, tz: Tz, top_n: usize) -> Self {
        Self {
            path: path.into(),
            poll_interval,
            tz,
            top_n,
        }
    }

    /// Spawn the watch loop. Returns the snapshot receiver and a handle that
    /// stops the loop.
    pub fn start(self) -> (mpsc::Receiver<ReportSnapshot>, WatchHandle) {
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.watch_loop(tx).await;
        });

        (rx, WatchHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Polls on `poll_interval`; exits when the receiver is dropped.
    async fn watch_loop(self, tx: mpsc::Sender<ReportSnapshot>) {
        let mut last_text: Option<String> = None;
        let mut generation = 0u64;
        let mut interval = time::interval(self.poll_interval);

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("watch channel closed; exiting loop");
                break;
            }

            let text = match tokio::fs::read_to_string(&self.path).await {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "failed to read input");
                    continue;
                }
            };

            if last_text.as_deref() == Some(text.as_str()) {
                continue;
            }

            let (tz, top_n) = (self.tz, self.top_n);
            let input = text.clone();
            let report = match tokio::task::spawn_blocking(move || analyze(&input, tz, top_n)).await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %e, "analysis task failed");
                    continue;
                }
            };

            last_text = Some(text);
            generation += 1;

            if let Err(e) = tx.send(ReportSnapshot { report, generation }).await {
                tracing::warn!(error = %e, "failed to send report snapshot; receiver dropped");
                break;
            }
        }
    }
}

// ── WatchHandle ───────────────────────────────────────────────────────────────

/// A handle to the background watch task.
pub struct WatchHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Immediately abort the watch loop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
