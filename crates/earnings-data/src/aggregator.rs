//! Hourly aggregation of parsed transactions.

use std::collections::BTreeMap;

use chrono_tz::Tz;
use earnings_core::error::AggregateError;
use earnings_core::formatting::format_usd;
use earnings_core::models::{Category, ChartMode, ParseResult, Transaction};
use earnings_core::time_utils::start_of_hour;
use rust_decimal::Decimal;
use serde::Serialize;

// ── Totals ────────────────────────────────────────────────────────────────────

/// Net earnings split by the premium flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub ppv_net: Decimal,
    pub no_ppv_net: Decimal,
}

/// `a + b`, or [`AggregateError::Overflow`] past the `Decimal` range.
pub fn checked_sum(a: Decimal, b: Decimal) -> Result<Decimal, AggregateError> {
    a.checked_add(b).ok_or(AggregateError::Overflow)
}

impl Totals {
    /// Add `tx.net` to its side. Fails if either side or their sum overflows.
    pub fn add(&mut self, tx: &Transaction) -> Result<(), AggregateError> {
        if tx.is_ppv {
            self.ppv_net = checked_sum(self.ppv_net, tx.net)?;
        } else {
            self.no_ppv_net = checked_sum(self.no_ppv_net, tx.net)?;
        }
        checked_sum(self.ppv_net, self.no_ppv_net)?;
        Ok(())
    }

    /// Exact for totals built through [`Totals::add`].
    pub fn total(&self) -> Decimal {
        self.ppv_net.saturating_add(self.no_ppv_net)
    }

    /// Two tab-separated lines for pasting into a spreadsheet.
    ///
    /// The `Total PPV` line carries the overall total, `Total NOPPV` only the
    /// non-premium share.
    pub fn summary_text(&self) -> String {
        format!(
            "Total PPV\t{}\nTotal NOPPV\t{}",
            format_usd(self.total()),
            format_usd(self.no_ppv_net)
        )
    }
}

// ── HourlyBucket ──────────────────────────────────────────────────────────────

/// Sums and counts for every transaction within one local clock hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyBucket {
    /// Start of the hour, epoch milliseconds.
    pub timestamp: i64,
    pub tips: Decimal,
    pub posts: Decimal,
    pub subs: Decimal,
    pub messages: Decimal,
    pub all: Decimal,
    pub messages_ppv: Decimal,
    pub messages_no_ppv: Decimal,
    pub count: u32,
    pub tips_count: u32,
    pub posts_count: u32,
    pub subs_count: u32,
    pub messages_count: u32,
    pub messages_ppv_count: u32,
    pub messages_no_ppv_count: u32,
}

impl HourlyBucket {
    fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            tips: Decimal::ZERO,
            posts: Decimal::ZERO,
            subs: Decimal::ZERO,
            messages: Decimal::ZERO,
            all: Decimal::ZERO,
            messages_ppv: Decimal::ZERO,
            messages_no_ppv: Decimal::ZERO,
            count: 0,
            tips_count: 0,
            posts_count: 0,
            subs_count: 0,
            messages_count: 0,
            messages_ppv_count: 0,
            messages_no_ppv_count: 0,
        }
    }

    fn add(&mut self, tx: &Transaction) -> Result<(), AggregateError> {
        let amount = tx.net;
        let category = tx.category();

        if category == Category::Messages {
            if tx.is_ppv {
                self.messages_ppv = checked_sum(self.messages_ppv, amount)?;
                self.messages_ppv_count += 1;
            } else {
                self.messages_no_ppv = checked_sum(self.messages_no_ppv, amount)?;
                self.messages_no_ppv_count += 1;
            }
        }

        let (sum, count) = match category {
            Category::Tips => (&mut self.tips, &mut self.tips_count),
            Category::Posts => (&mut self.posts, &mut self.posts_count),
            Category::Subs => (&mut self.subs, &mut self.subs_count),
            Category::Messages => (&mut self.messages, &mut self.messages_count),
        };
        *sum = checked_sum(*sum, amount)?;
        *count += 1;

        self.all = checked_sum(self.all, amount)?;
        self.count += 1;
        Ok(())
    }

    /// Net sum for one category.
    pub fn category_sum(&self, category: Category) -> Decimal {
        match category {
            Category::Tips => self.tips,
            Category::Posts => self.posts,
            Category::Subs => self.subs,
            Category::Messages => self.messages,
        }
    }

    /// Transaction count for one category.
    pub fn category_count(&self, category: Category) -> u32 {
        match category {
            Category::Tips => self.tips_count,
            Category::Posts => self.posts_count,
            Category::Subs => self.subs_count,
            Category::Messages => self.messages_count,
        }
    }

    /// The series value plotted for `mode`.
    pub fn value(&self, mode: ChartMode) -> Decimal {
        mode.category().map_or(self.all, |c| self.category_sum(c))
    }

    /// The transaction count shown for `mode`.
    pub fn count_for(&self, mode: ChartMode) -> u32 {
        mode.category().map_or(self.count, |c| self.category_count(c))
    }
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Totals plus hourly buckets in ascending time order.
///
/// `totals` is `None` exactly when there was nothing reportable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    pub totals: Option<Totals>,
    pub buckets: Vec<HourlyBucket>,
}

// ── EarningsAggregator ────────────────────────────────────────────────────────

/// Groups transactions into local clock hours of the configured timezone.
#[derive(Debug, Clone, Copy)]
pub struct EarningsAggregator {
    tz: Tz,
}

impl EarningsAggregator {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Aggregate a parse result, refusing tainted or empty input.
    pub fn aggregate(&self, result: &ParseResult) -> Result<Aggregation, AggregateError> {
        if !result.is_reportable() {
            return Ok(Aggregation::default());
        }
        self.aggregate_transactions(&result.transactions)
    }

    /// Aggregate `transactions` unconditionally. An empty slice yields an
    /// empty [`Aggregation`]; a batch whose sums overflow yields an error.
    pub fn aggregate_transactions(
        &self,
        transactions: &[Transaction],
    ) -> Result<Aggregation, AggregateError> {
        if transactions.is_empty() {
            return Ok(Aggregation::default());
        }

        let mut totals = Totals::default();
        let mut buckets: BTreeMap<i64, HourlyBucket> = BTreeMap::new();

        for tx in transactions {
            totals.add(tx)?;

            let hour = start_of_hour(tx.timestamp, self.tz);
            buckets
                .entry(hour)
                .or_insert_with(|| HourlyBucket::new(hour))
                .add(tx)?;
        }

        Ok(Aggregation {
            totals: Some(totals),
            buckets: buckets.into_values().collect(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
