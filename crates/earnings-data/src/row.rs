//! Parsing of one logical (tab-delimited) export row.

use std::str::FromStr;

use chrono_tz::Tz;
use earnings_core::classifier::classify;
use earnings_core::error::RowError;
use earnings_core::models::Transaction;
use earnings_core::time_utils::DateTimeParser;
use rust_decimal::{Decimal, RoundingStrategy};

/// Prefix that marks a cell as a money column.
pub const CURRENCY_MARKER: char = '$';

/// Turns one logical row into a [`Transaction`].
///
/// Layout: date cells, then `gross`, `fee`, `net` as the first three `$`
/// cells, then description cells. The row is rejected unless
/// `round(gross - fee, 2) == net`.
#[derive(Debug, Clone, Copy)]
pub struct RowParser {
    dates: DateTimeParser,
}

impl RowParser {
    pub fn new(tz: Tz) -> Self {
        Self {
            dates: DateTimeParser::new(tz),
        }
    }

    pub fn date_parser(&self) -> &DateTimeParser {
        &self.dates
    }

    pub fn parse_row(&self, line: &str) -> Result<Transaction, RowError> {
        let cells: Vec<&str> = line.split('\t').map(str::trim).collect();
        let money: Vec<usize> = cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.starts_with(CURRENCY_MARKER))
            .map(|(i, _)| i)
            .collect();

        if money.len() < 3 {
            return Err(RowError::InsufficientMoneyColumns { found: money.len() });
        }

        let date_text = cells[..money[0]].join(" ");
        let timestamp = self
            .dates
            .parse(&date_text)
            .ok_or_else(|| RowError::NoDate(date_text.clone()))?;

        let gross = parse_money(cells[money[0]])?;
        let fee = parse_money(cells[money[1]])?;
        let net = parse_money(cells[money[2]])?;

        let expected = gross
            .checked_sub(fee)
            .map(|diff| diff.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero));
        if expected != Some(net) {
            return Err(RowError::AmountMismatch {
                gross: gross.to_string(),
                fee: fee.to_string(),
                net: net.to_string(),
            });
        }

        let description = cells[money[2] + 1..].join(" ");
        let classification = classify(&description, gross)?;

        Ok(Transaction {
            timestamp,
            gross,
            net,
            tx_type: classification.tx_type,
            is_ppv: classification.is_ppv,
            description,
        })
    }
}

/// Parse a `$` cell such as `$1,234.50`. Thousands separators are ignored.
pub fn parse_money(cell: &str) -> Result<Decimal, RowError> {
    let digits: String = cell
        .trim()
        .trim_start_matches(CURRENCY_MARKER)
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .collect();

    Decimal::from_str(&digits).map_err(|_| RowError::InvalidAmount(cell.to_string()))
}
