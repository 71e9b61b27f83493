//! Splitting of a pasted export into logical rows.
//!
//! Two layouts are recognised:
//!
//! * one row per line, cells separated by tabs;
//! * one cell per line: a date/time line, three `$` lines (gross, fee, net)
//!   and an optional description line.
//!
//! Rows that fail are skipped, but any failure taints the [`ParseResult`].

use chrono_tz::Tz;
use earnings_core::error::RowError;
use earnings_core::models::{ParseResult, RowFailure, Transaction};
use tracing::debug;

use crate::row::{RowParser, CURRENCY_MARKER};

/// Number of physical lines a multi-line record spans, description included.
const MULTILINE_SPAN: usize = 5;

/// Parses whole exports. Stateless between calls.
#[derive(Debug, Clone, Copy)]
pub struct TransactionParser {
    rows: RowParser,
}

impl TransactionParser {
    pub fn new(tz: Tz) -> Self {
        Self {
            rows: RowParser::new(tz),
        }
    }

    /// Parse `raw` into transactions, recording every row that failed.
    pub fn parse(&self, raw: &str) -> ParseResult {
        let lines: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let mut transactions: Vec<Transaction> = Vec::new();
        let mut failures: Vec<RowFailure> = Vec::new();

        let mut i = 0;
        while i < lines.len() {
            let (row, consumed) = if lines[i].contains('\t') {
                (lines[i].to_string(), 1)
            } else if self.starts_multiline_record(&lines, i) {
                (join_multiline_record(&lines, i), MULTILINE_SPAN)
            } else {
                record_failure(&mut failures, i, lines[i].to_string(), RowError::Unrecognized);
                i += 1;
                continue;
            };

            match self.rows.parse_row(&row) {
                Ok(tx) => transactions.push(tx),
                Err(err) => record_failure(&mut failures, i, row, err),
            }
            i += consumed;
        }

        debug!(
            "Parsed {} transactions from {} lines ({} rows failed)",
            transactions.len(),
            lines.len(),
            failures.len()
        );

        ParseResult {
            transactions,
            has_error: !failures.is_empty(),
            failures,
        }
    }

    /// A non-tab line that parses as a date and is followed by three `$` lines.
    fn starts_multiline_record(&self, lines: &[&str], i: usize) -> bool {
        if self.rows.date_parser().parse(lines[i]).is_none() {
            return false;
        }
        (1..=3).all(|offset| {
            lines
                .get(i + offset)
                .is_some_and(|line| line.starts_with(CURRENCY_MARKER))
        })
    }
}

/// Parse `raw` with a one-off [`TransactionParser`] in `tz`.
pub fn parse_transactions(raw: &str, tz: Tz) -> ParseResult {
    TransactionParser::new(tz).parse(raw)
}

/// Tab-join lines `i..i + 5`; a missing description line becomes an empty cell.
fn join_multiline_record(lines: &[&str], i: usize) -> String {
    (0..MULTILINE_SPAN)
        .map(|offset| lines.get(i + offset).copied().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\t")
}

fn record_failure(failures: &mut Vec<RowFailure>, index: usize, text: String, error: RowError) {
    debug!(line = index + 1, %error, "rejected row");
    failures.push(RowFailure {
        line: index + 1,
        text,
        error,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use earnings_core::models::TxType;
    use rust_decimal_macros::dec;

    fn parse(raw: &str) -> ParseResult {
        parse_transactions(raw, Tz::UTC)
    }

    // ── tab-delimited ────────────────────────────────────────────────────────

    #[test]
    fn test_parse_single_tab_row() {
        let result = parse("Mar 1, 2024, 1:00 pm\t$10.00\t$2.00\t$8.00\tTip from Alice\n");
        assert!(!result.has_error);
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.transactions[0].tx_type, TxType::Tip);
    }

    #[test]
    fn test_parse_crlf_and_blank_lines() {
        let raw = "\r\nMar 1, 2024, 1:00 pm\t$10.00\t$2.00\t$8.00\tTip from Alice\r\n\r\n   \r\nMar 1, 2024, 2:00 pm\t$5.00\t$1.00\t$4.00\tPost unlock by Bob\r\n";
        let result = parse(raw);
        assert!(!result.has_error);
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(result.transactions[1].tx_type, TxType::Post);
    }

    #[test]
    fn test_parse_preserves_input_order() {
        let raw = "Mar 2, 2024, 1:00 pm\t$3.00\t$0.60\t$2.40\tTip from Late\n\
                   Mar 1, 2024, 1:00 pm\t$5.00\t$1.00\t$4.00\tTip from Early";
        let result = parse(raw);
        assert_eq!(result.transactions[0].description, "Tip from Late");
        assert_eq!(result.transactions[1].description, "Tip from Early");
    }

    // ── multi-line ───────────────────────────────────────────────────────────

    #[test]
    fn test_parse_multiline_record() {
        let raw = "Mar 1, 2024, 1:00pm\n$10.00\n$1.00\n$9.00\nTip from Alice";
        let result = parse(raw);
        assert!(!result.has_error, "failures: {:?}", result.failures);
        assert_eq!(result.transactions.len(), 1);
        let tx = &result.transactions[0];
        assert_eq!(tx.tx_type, TxType::Tip);
        assert_eq!(tx.gross, dec!(10.00));
        assert_eq!(tx.net, dec!(9.00));
    }

    #[test]
    fn test_parse_multiline_consumes_five_lines() {
        let raw = "Mar 1, 2024, 1:00pm\n$10.00\n$1.00\n$9.00\nTip from Alice\n\
                   Mar 1, 2024, 2:00pm\n$20.00\n$4.00\n$16.00\nSubscription from Bob";
        let result = parse(raw);
        assert!(!result.has_error, "failures: {:?}", result.failures);
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(result.transactions[1].tx_type, TxType::Sub);
    }

    #[test]
    fn test_parse_multiline_missing_description_fails_classification() {
        let raw = "Mar 1, 2024, 1:00pm\n$10.00\n$1.00\n$9.00";
        let result = parse(raw);
        assert!(result.has_error);
        assert!(result.transactions.is_empty());
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].error, RowError::Unclassified(String::new()));
    }

    #[test]
    fn test_parse_multiline_needs_three_money_lines() {
        let raw = "Mar 1, 2024, 1:00pm\n$10.00\n$1.00\nTip from Alice";
        let result = parse(raw);
        assert!(result.has_error);
        assert!(result.transactions.is_empty());
        // Every line is unrecognised on its own.
        assert_eq!(result.failures.len(), 4);
        assert!(result
            .failures
            .iter()
            .all(|f| f.error == RowError::Unrecognized));
    }

    #[test]
    fn test_parse_mixed_layouts() {
        let raw = "Mar 1, 2024, 1:00 pm\t$10.00\t$2.00\t$8.00\tTip from Alice\n\
                   Mar 1, 2024, 3:00pm\n$7.50\n$1.50\n$6.00\nPayment for message from Bob";
        let result = parse(raw);
        assert!(!result.has_error);
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(result.transactions[1].tx_type, TxType::Ppv);
    }

    // ── failures ─────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_garbage_line_taints_result() {
        let raw = "Mar 1, 2024, 1:00 pm\t$10.00\t$2.00\t$8.00\tTip from Alice\n\
                   this is not a transaction";
        let result = parse(raw);
        assert!(result.has_error);
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].line, 2);
        assert_eq!(result.failures[0].error, RowError::Unrecognized);
        assert_eq!(result.failures[0].text, "this is not a transaction");
    }

    #[test]
    fn test_parse_unclassified_row_does_not_abort() {
        let raw = "Mar 1, 2024, 1:00 pm\t$10.00\t$2.00\t$8.00\tUnknown event XYZ\n\
                   Mar 1, 2024, 2:00 pm\t$10.00\t$2.00\t$8.00\tTip from Alice";
        let result = parse(raw);
        assert!(result.has_error);
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.transactions[0].description, "Tip from Alice");
        assert_eq!(
            result.failures[0].error,
            RowError::Unclassified("Unknown event XYZ".to_string())
        );
    }

    #[test]
    fn test_parse_mismatched_amounts_fail() {
        let result = parse("Mar 1, 2024, 1:00 pm\t$10.00\t$2.00\t$9.00\tTip from Alice");
        assert!(result.has_error);
        assert!(result.transactions.is_empty());
    }

    #[test]
    fn test_parse_failure_line_numbers_skip_blank_lines() {
        let raw = "\n\nMar 1, 2024, 1:00pm\n$10.00\n$1.00\n$9.00\nTip from Alice\n\njunk";
        let result = parse(raw);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].line, 6);
    }

    #[test]
    fn test_parse_empty_input() {
        let result = parse("");
        assert!(!result.has_error);
        assert!(result.transactions.is_empty());
        assert!(result.failures.is_empty());

        let result = parse("  \n\t\n  ");
        assert!(!result.has_error);
        assert!(result.transactions.is_empty());
    }

    #[test]
    fn test_has_error_matches_failures() {
        for raw in ["", "junk", "Mar 1, 2024, 1:00 pm\t$1.00\t$0.20\t$0.80\tTip from A"] {
            let result = parse(raw);
            assert_eq!(result.has_error, !result.failures.is_empty(), "input {raw:?}");
        }
    }

    #[test]
    fn test_parse_overflowing_amounts_fail_without_panicking() {
        let result =
            parse("Mar 1, 2024, 1:00 pm\t$79228162514264337593543950335\t$-1\t$1\tTip from A");
        assert!(result.has_error);
        assert!(result.transactions.is_empty());
        assert!(matches!(
            result.failures[0].error,
            RowError::AmountMismatch { .. }
        ));
    }
}
