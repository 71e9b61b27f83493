//! Plain-text and JSON rendering of a [`Report`] for stdout.

use chrono::Timelike as _;
use chrono_tz::Tz;
use earnings_core::formatting::{format_hour_am_pm, format_month_day, format_tick, format_usd};
use earnings_core::models::ChartMode;
use earnings_core::settings::OutputFormat;
use earnings_data::aggregator::HourlyBucket;
use earnings_data::analysis::{Report, Statistics};
use rust_decimal::Decimal;

/// Shown in place of any totals when a row failed.
pub const STATS_UNAVAILABLE: &str = "Could not compute statistics, check input";

pub const NO_TRANSACTIONS: &str = "No transactions found";

/// Render `report` in the requested format.
///
/// JSON always carries the full report, failures included. The text and
/// totals formats print only the failed lines when any row failed.
pub fn render(
    report: &Report,
    format: OutputFormat,
    mode: ChartMode,
    tz: Tz,
) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        let mut json = serde_json::to_string_pretty(report)?;
        json.push('\n');
        return Ok(json);
    }

    if report.has_error() {
        return Ok(render_failures(report));
    }

    let Some(stats) = &report.statistics else {
        return Ok(format!("{NO_TRANSACTIONS}\n"));
    };

    Ok(match format {
        OutputFormat::Totals => format!("{}\n", stats.totals.summary_text()),
        _ => render_text(report, stats, mode, tz),
    })
}

/// The failure banner followed by one line per rejected row.
pub fn render_failures(report: &Report) -> String {
    let mut lines = vec![STATS_UNAVAILABLE.to_string()];
    lines.extend(
        report
            .failures
            .iter()
            .map(|f| format!("  line {}: {} | {}", f.line, f.error, f.text)),
    );
    if let Some(err) = &report.statistics_error {
        lines.push(format!("  {err}"));
    }
    to_text(lines)
}

fn render_text(report: &Report, stats: &Statistics, mode: ChartMode, tz: Tz) -> String {
    let mut lines = vec![
        format!("Earnings report ({})", report.metadata.timezone),
        format!(
            "Transactions: {}   Avg gross: {}   Avg net: {}",
            report.transactions.len(),
            format_usd(stats.average_gross),
            format_usd(stats.average_net)
        ),
        String::new(),
        "Totals".to_string(),
        money_row("PPV", stats.totals.ppv_net),
        money_row("No PPV", stats.totals.no_ppv_net),
        money_row("Total", stats.totals.total()),
        String::new(),
        "Breakdown".to_string(),
    ];

    lines.extend(stats.breakdown.iter().map(|item| {
        format!(
            "{}{:>9.2}%",
            money_row(item.category.label(), item.value),
            item.percent
        )
    }));

    if !stats.top_spenders.is_empty() {
        lines.push(String::new());
        lines.push("Top spenders".to_string());
        lines.extend(stats.top_spenders.iter().enumerate().map(|(rank, spender)| {
            format!(
                "  {}. {:<20}{:>14}{:>14}",
                rank + 1,
                spender.name,
                format_usd(spender.gross),
                format_usd(spender.net)
            )
        }));
    }

    lines.push(String::new());
    lines.push(format!("Hourly ({})", mode_label(mode)));
    lines.push(format!("  {:<14}{:>14}{:>8}", "Hour", "Net", "Count"));
    lines.extend(stats.buckets.iter().enumerate().map(|(i, bucket)| {
        format!(
            "  {:<14}{:>14}{:>8}",
            hour_label(bucket, tz, i == 0),
            format_usd(bucket.value(mode)),
            bucket.count_for(mode)
        )
    }));

    to_text(lines)
}

fn money_row(label: &str, amount: Decimal) -> String {
    format!("  {:<10}{:>14}", label, format_usd(amount))
}

/// Newline-terminated join of `lines`.
fn to_text(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn mode_label(mode: ChartMode) -> &'static str {
    mode.category().map_or("All", |c| c.label())
}

/// Tick label for a row; the first row always carries its date.
fn hour_label(bucket: &HourlyBucket, tz: Tz, first: bool) -> String {
    let tick = format_tick(bucket.timestamp, tz);
    if !first {
        return tick;
    }
    match chrono::DateTime::from_timestamp_millis(bucket.timestamp) {
        Some(dt) if dt.with_timezone(&tz).hour() != 0 => format!(
            "{} {}",
            format_month_day(bucket.timestamp, tz),
            format_hour_am_pm(dt.with_timezone(&tz).hour())
        ),
        _ => tick,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
