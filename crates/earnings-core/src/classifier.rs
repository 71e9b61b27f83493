//! Keyword classification of export descriptions.
//!
//! Descriptions may contain overlapping terms ("Tip on your post"), so rules
//! are evaluated top to bottom and the first match wins.

use rust_decimal::prelude::*;

use crate::error::ClassifyError;
use crate::models::{Classification, TxType};

/// What a matching rule produces.
#[derive(Debug, Clone, Copy)]
enum Outcome {
    Fixed(Classification),
    /// PPV or Bundle, decided from the gross amount.
    PremiumMessage,
}

struct Rule {
    keys: &'static [&'static str],
    outcome: Outcome,
}

const fn fixed(tx_type: TxType, is_ppv: bool) -> Outcome {
    Outcome::Fixed(Classification { tx_type, is_ppv })
}

/// Ordered rule table. Keys are lowercase; matching is on the lowercased
/// description.
const RULES: &[Rule] = &[
    Rule {
        keys: &["tip", "sugerencia"],
        outcome: fixed(TxType::Tip, false),
    },
    Rule {
        keys: &["payment for message", "pago por mensaje"],
        outcome: Outcome::PremiumMessage,
    },
    Rule {
        keys: &["post", "publicación", "publicacion"],
        outcome: fixed(TxType::Post, true),
    },
    Rule {
        keys: &[
            "recurring subscription",
            "suscripción recurrente",
            "suscripcion recurrente",
        ],
        outcome: fixed(TxType::Resub, true),
    },
    Rule {
        keys: &["subscription", "suscripción de", "suscripcion de"],
        outcome: fixed(TxType::Sub, true),
    },
];

/// Classify `description` into a transaction type and premium flag.
///
/// `gross` only matters for message payments: a gross amount with non-zero
/// cents is a `PPV` unlock (premium), a whole-dollar amount is a `Bundle`
/// (not premium). See [`has_nonzero_cents`].
pub fn classify(description: &str, gross: Decimal) -> Result<Classification, ClassifyError> {
    let lowered = description.to_lowercase();

    let rule = RULES
        .iter()
        .find(|rule| rule.keys.iter().any(|key| lowered.contains(key)))
        .ok_or_else(|| ClassifyError::UnclassifiedDescription(description.to_string()))?;

    Ok(match rule.outcome {
        Outcome::Fixed(classification) => classification,
        Outcome::PremiumMessage if has_nonzero_cents(gross) => Classification {
            tx_type: TxType::Ppv,
            is_ppv: true,
        },
        Outcome::PremiumMessage => Classification {
            tx_type: TxType::Bundle,
            is_ppv: false,
        },
    })
}

/// Whether the fractional part of `amount`, in whole cents rounded half away
/// from zero, is non-zero.
///
/// `10.50` and `10.01` have cents; `10.00` and `10.004` do not; `10.996`
/// rounds to 100 cents and counts as having cents.
pub fn has_nonzero_cents(amount: Decimal) -> bool {
    let cents = (amount.fract().abs() * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    !cents.is_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn kind(description: &str, gross: Decimal) -> (TxType, bool) {
        let c = classify(description, gross).unwrap();
        (c.tx_type, c.is_ppv)
    }

    // ── keyword rules ────────────────────────────────────────────────────────

    #[test]
    fn test_tip() {
        assert_eq!(kind("Tip from Alice", dec!(5)), (TxType::Tip, false));
        assert_eq!(kind("Sugerencia de Bob", dec!(5)), (TxType::Tip, false));
    }

    #[test]
    fn test_post() {
        assert_eq!(kind("Post purchase by Carol", dec!(3)), (TxType::Post, true));
        assert_eq!(kind("Compra de publicación", dec!(3)), (TxType::Post, true));
    }

    #[test]
    fn test_resub_before_sub() {
        assert_eq!(
            kind("Recurring subscription from Dan", dec!(9.99)),
            (TxType::Resub, true)
        );
        assert_eq!(
            kind("Suscripción recurrente de Eva", dec!(9.99)),
            (TxType::Resub, true)
        );
    }

    #[test]
    fn test_sub() {
        assert_eq!(kind("Subscription from Frank", dec!(9.99)), (TxType::Sub, true));
        assert_eq!(kind("Suscripción de Gina", dec!(9.99)), (TxType::Sub, true));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(kind("TIP FROM ALICE", dec!(1)), (TxType::Tip, false));
        assert_eq!(kind("PAGO POR MENSAJE de Hugo", dec!(4)), (TxType::Bundle, false));
    }

    // ── priority ─────────────────────────────────────────────────────────────

    #[test]
    fn test_tip_wins_over_subscription() {
        assert_eq!(
            kind("Tip from subscription renewal", dec!(10)),
            (TxType::Tip, false)
        );
    }

    #[test]
    fn test_message_wins_over_post() {
        assert_eq!(
            kind("Payment for message about your post", dec!(7.50)),
            (TxType::Ppv, true)
        );
    }

    // ── premium message heuristic ────────────────────────────────────────────

    #[test]
    fn test_message_with_cents_is_ppv() {
        assert_eq!(
            kind("Payment for message from Ivy", dec!(10.50)),
            (TxType::Ppv, true)
        );
        assert_eq!(
            kind("Payment for message from Ivy", dec!(10.01)),
            (TxType::Ppv, true)
        );
    }

    #[test]
    fn test_message_whole_dollars_is_bundle() {
        assert_eq!(
            kind("Payment for message from Ivy", dec!(10.00)),
            (TxType::Bundle, false)
        );
        assert_eq!(
            kind("Payment for message from Ivy", dec!(10)),
            (TxType::Bundle, false)
        );
    }

    #[test]
    fn test_has_nonzero_cents_edges() {
        assert!(!has_nonzero_cents(dec!(10.004)));
        assert!(has_nonzero_cents(dec!(10.005)));
        assert!(has_nonzero_cents(dec!(10.996)));
        assert!(!has_nonzero_cents(dec!(0)));
    }

    // ── failure ──────────────────────────────────────────────────────────────

    #[test]
    fn test_unclassified() {
        let err = classify("Unknown event XYZ", dec!(1)).unwrap_err();
        assert_eq!(
            err,
            ClassifyError::UnclassifiedDescription("Unknown event XYZ".to_string())
        );
    }

    #[test]
    fn test_empty_description_is_unclassified() {
        assert!(classify("", dec!(1)).is_err());
    }
}
