//! Main analysis pipeline for the earnings report.
//!
//! Parses the pasted export, and when every row is valid, aggregates it into
//! hourly buckets, a category breakdown and a top-spender list ready for the
//! presentation layer.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::Utc;
use chrono_tz::Tz;
use earnings_core::error::AggregateError;
use earnings_core::formatting::percentage;
use earnings_core::models::{Category, ParseResult, RowFailure, Transaction};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregator::{checked_sum, EarningsAggregator, HourlyBucket, Totals};
use crate::parser::TransactionParser;

// ── Public types ──────────────────────────────────────────────────────────────

/// Net earnings of one category and its share of the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownItem {
    pub category: Category,
    pub value: Decimal,
    /// Percentage of the overall net, two decimals.
    pub percent: f64,
}

/// Combined spend of one buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spender {
    pub name: String,
    pub gross: Decimal,
    pub net: Decimal,
}

/// Metadata produced alongside the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// IANA name of the zone the export was read in.
    pub timezone: String,
    pub transactions_parsed: usize,
    pub rows_failed: usize,
    /// Wall-clock seconds spent parsing and aggregating.
    pub elapsed_seconds: f64,
}

/// Figures that are only computed for a fully valid export.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub totals: Totals,
    pub buckets: Vec<HourlyBucket>,
    pub breakdown: Vec<BreakdownItem>,
    pub top_spenders: Vec<Spender>,
    /// Mean amount paid per transaction.
    pub average_gross: Decimal,
    /// Mean amount retained per transaction.
    pub average_net: Decimal,
}

/// The complete output of [`analyze`].
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub transactions: Vec<Transaction>,
    pub failures: Vec<RowFailure>,
    /// Set when every row parsed but the batch could not be totalled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics_error: Option<AggregateError>,
    /// `None` when any row failed, the batch overflowed or there were no
    /// transactions.
    pub statistics: Option<Statistics>,
}

impl Report {
    pub fn has_error(&self) -> bool {
        !self.failures.is_empty() || self.statistics_error.is_some()
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline over `raw`.
///
/// A single failed row suppresses all statistics: partial financial totals
/// are never produced.
pub fn analyze(raw: &str, tz: Tz, top_n: usize) -> Report {
    let start = std::time::Instant::now();

    let result = TransactionParser::new(tz).parse(raw);

    let (statistics, statistics_error) = match compute_statistics(&result, tz, top_n) {
        Ok(stats) => (stats, None),
        Err(err) => {
            warn!("{}; statistics suppressed", err);
            (None, Some(err))
        }
    };

    if result.has_error {
        warn!(
            "{} of the pasted rows could not be parsed; statistics suppressed",
            result.failures.len()
        );
    } else {
        info!("Parsed {} transactions", result.transactions.len());
    }

    Report {
        metadata: ReportMetadata {
            generated_at: Utc::now().to_rfc3339(),
            timezone: tz.name().to_string(),
            transactions_parsed: result.transactions.len(),
            rows_failed: result.failures.len(),
            elapsed_seconds: start.elapsed().as_secs_f64(),
        },
        transactions: result.transactions,
        failures: result.failures,
        statistics_error,
        statistics,
    }
}

/// `None` for a tainted or empty result.
fn compute_statistics(
    result: &ParseResult,
    tz: Tz,
    top_n: usize,
) -> Result<Option<Statistics>, AggregateError> {
    let aggregation = EarningsAggregator::new(tz).aggregate(result)?;
    let Some(totals) = aggregation.totals else {
        return Ok(None);
    };
    let transactions = &result.transactions;

    Ok(Some(Statistics {
        average_net: mean(totals.total(), transactions.len())?,
        totals,
        buckets: aggregation.buckets,
        breakdown: category_breakdown(transactions)?,
        top_spenders: top_spenders(transactions, top_n)?,
        average_gross: average_gross(transactions)?,
    }))
}

/// Net per category with its share of the total, largest first.
///
/// Ties keep the order tips, messages, subs, posts.
pub fn category_breakdown(
    transactions: &[Transaction],
) -> Result<Vec<BreakdownItem>, AggregateError> {
    let mut sums: HashMap<Category, Decimal> = HashMap::new();
    for tx in transactions {
        let sum = sums.entry(tx.category()).or_default();
        *sum = checked_sum(*sum, tx.net)?;
    }
    let total = sums
        .values()
        .try_fold(Decimal::ZERO, |acc, v| checked_sum(acc, *v))?;

    let mut items: Vec<BreakdownItem> = Category::ALL
        .iter()
        .map(|&category| {
            let value = sums.get(&category).copied().unwrap_or_default();
            BreakdownItem {
                category,
                value,
                percent: percentage(value, total, 2),
            }
        })
        .collect();

    items.sort_by(|a, b| b.value.cmp(&a.value));
    Ok(items)
}

/// The `n` buyers with the highest combined gross.
///
/// Buyers with equal gross keep their first-seen order.
pub fn top_spenders(
    transactions: &[Transaction],
    n: usize,
) -> Result<Vec<Spender>, AggregateError> {
    let mut spenders: Vec<Spender> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for tx in transactions {
        let name = buyer_name(&tx.description);
        match index.get(&name) {
            Some(&i) => {
                let spender = &mut spenders[i];
                spender.gross = checked_sum(spender.gross, tx.gross)?;
                spender.net = checked_sum(spender.net, tx.net)?;
            }
            None => {
                index.insert(name.clone(), spenders.len());
                spenders.push(Spender {
                    name,
                    gross: tx.gross,
                    net: tx.net,
                });
            }
        }
    }

    spenders.sort_by(|a, b| b.gross.cmp(&a.gross));
    spenders.truncate(n);
    Ok(spenders)
}

/// Buyer name from a description such as `"Tip from Alice"`.
///
/// Takes the text after the first `from` / `by`; otherwise strips the known
/// event phrases. Falls back to `"Unknown"`.
pub fn buyer_name(description: &str) -> String {
    static FROM_BY: OnceLock<Regex> = OnceLock::new();
    static PHRASES: OnceLock<Regex> = OnceLock::new();

    let from_by =
        FROM_BY.get_or_init(|| Regex::new(r"(?i)\b(?:from|by)\s+(.+)").expect("regex is valid"));
    let phrases = PHRASES.get_or_init(|| {
        Regex::new(r"(?i)payment for message|tip from|recurring subscription")
            .expect("regex is valid")
    });

    let name = match from_by.captures(description) {
        Some(caps) => caps[1].trim().to_string(),
        None => phrases.replace_all(description, "").trim().to_string(),
    };

    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name
    }
}

/// Mean gross per transaction, rounded to cents. Zero for no transactions.
pub fn average_gross(transactions: &[Transaction]) -> Result<Decimal, AggregateError> {
    let total = transactions
        .iter()
        .try_fold(Decimal::ZERO, |acc, tx| checked_sum(acc, tx.gross))?;
    mean(total, transactions.len())
}

/// `total / count` rounded to cents, zero when `count` is zero.
fn mean(total: Decimal, count: usize) -> Result<Decimal, AggregateError> {
    if count == 0 {
        return Ok(Decimal::ZERO);
    }
    total
        .checked_div(Decimal::from(count))
        .map(|avg| avg.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .ok_or(AggregateError::Overflow)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
