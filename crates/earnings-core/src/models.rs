use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RowError;

/// Kind of earnings event, as recognised from the export's description text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    Tip,
    Post,
    Sub,
    Resub,
    #[serde(rename = "PPV")]
    Ppv,
    Bundle,
}

impl TxType {
    /// Reporting category this type is bucketed under.
    pub fn category(self) -> Category {
        Category::from_type(self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TxType::Tip => "Tip",
            TxType::Post => "Post",
            TxType::Sub => "Sub",
            TxType::Resub => "Resub",
            TxType::Ppv => "PPV",
            TxType::Bundle => "Bundle",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Revenue category used for hourly bucketing and the breakdown table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tips,
    Posts,
    Subs,
    Messages,
}

impl Category {
    /// All categories in breakdown display order.
    pub const ALL: [Category; 4] = [
        Category::Tips,
        Category::Messages,
        Category::Subs,
        Category::Posts,
    ];

    /// Map a transaction type to its category. Independent of `is_ppv`.
    pub fn from_type(tx_type: TxType) -> Self {
        match tx_type {
            TxType::Tip => Category::Tips,
            TxType::Post => Category::Posts,
            TxType::Sub | TxType::Resub => Category::Subs,
            TxType::Ppv | TxType::Bundle => Category::Messages,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Tips => "tips",
            Category::Posts => "posts",
            Category::Subs => "subs",
            Category::Messages => "messages",
        }
    }

    /// Capitalised label for tables.
    pub fn label(self) -> &'static str {
        match self {
            Category::Tips => "Tips",
            Category::Posts => "Posts",
            Category::Subs => "Subs",
            Category::Messages => "Messages",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which series of an hourly bucket a chart or table should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartMode {
    #[default]
    All,
    Tips,
    Posts,
    Messages,
    Subs,
}

impl ChartMode {
    /// The category behind this mode, `None` for [`ChartMode::All`].
    pub fn category(self) -> Option<Category> {
        match self {
            ChartMode::All => None,
            ChartMode::Tips => Some(Category::Tips),
            ChartMode::Posts => Some(Category::Posts),
            ChartMode::Messages => Some(Category::Messages),
            ChartMode::Subs => Some(Category::Subs),
        }
    }
}

/// Outcome of classifying a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub tx_type: TxType,
    /// Counted in the pay-per-view / premium bucket rather than the general one.
    pub is_ppv: bool,
}

/// One parsed earnings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Epoch milliseconds (UTC).
    pub timestamp: i64,
    /// Amount paid by the buyer.
    pub gross: Decimal,
    /// Amount retained after the platform fee.
    pub net: Decimal,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub is_ppv: bool,
    /// Free-text remainder of the row.
    pub description: String,
}

impl Transaction {
    pub fn category(&self) -> Category {
        self.tx_type.category()
    }
}

/// A logical row that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    /// 1-based position among the trimmed, non-empty input lines.
    pub line: usize,
    /// The logical row text (tab-joined for multi-line records).
    pub text: String,
    pub error: RowError,
}

/// Result of parsing a whole pasted export.
///
/// `has_error` is true iff at least one logical row failed; `transactions`
/// still holds every row that did parse, in input order. Callers must not
/// report totals from a result with `has_error` set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    pub transactions: Vec<Transaction>,
    pub has_error: bool,
    pub failures: Vec<RowFailure>,
}

impl ParseResult {
    /// Whether the result may be used for financial totals.
    pub fn is_reportable(&self) -> bool {
        !self.has_error && !self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_category_from_type() {
        assert_eq!(Category::from_type(TxType::Tip), Category::Tips);
        assert_eq!(Category::from_type(TxType::Post), Category::Posts);
        assert_eq!(Category::from_type(TxType::Sub), Category::Subs);
        assert_eq!(Category::from_type(TxType::Resub), Category::Subs);
        assert_eq!(Category::from_type(TxType::Ppv), Category::Messages);
        assert_eq!(Category::from_type(TxType::Bundle), Category::Messages);
    }

    #[test]
    fn test_tx_type_serializes_ppv_uppercase() {
        let json = serde_json::to_string(&TxType::Ppv).unwrap();
        assert_eq!(json, "\"PPV\"");
        let json = serde_json::to_string(&TxType::Resub).unwrap();
        assert_eq!(json, "\"Resub\"");
    }

    #[test]
    fn test_transaction_serializes_type_field() {
        let tx = Transaction {
            timestamp: 1_709_298_000_000,
            gross: dec!(10.00),
            net: dec!(8.00),
            tx_type: TxType::Tip,
            is_ppv: false,
            description: "Tip from Alice".to_string(),
        };
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "Tip");
        assert_eq!(value["gross"], "10.00");
        assert_eq!(value["is_ppv"], false);
    }

    #[test]
    fn test_chart_mode_category() {
        assert_eq!(ChartMode::All.category(), None);
        assert_eq!(ChartMode::Messages.category(), Some(Category::Messages));
    }

    #[test]
    fn test_parse_result_reportable() {
        let mut result = ParseResult::default();
        assert!(!result.is_reportable());

        result.transactions.push(Transaction {
            timestamp: 0,
            gross: dec!(1),
            net: dec!(1),
            tx_type: TxType::Tip,
            is_ppv: false,
            description: String::new(),
        });
        assert!(result.is_reportable());

        result.has_error = true;
        assert!(!result.is_reportable());
    }
}
