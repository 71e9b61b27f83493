use chrono::Timelike as _;
use chrono_tz::Tz;
use rust_decimal::prelude::*;

/// Format a decimal with thousands separators and a fixed number of decimal
/// places, rounding half away from zero.
///
/// # Examples
///
/// ```
/// use earnings_core::formatting::format_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_amount(Decimal::new(12345, 1), 1), "1,234.5");
/// assert_eq!(format_amount(Decimal::new(1234567, 0), 0), "1,234,567");
/// assert_eq!(format_amount(Decimal::ZERO, 2), "0.00");
/// assert_eq!(format_amount(Decimal::new(-98765, 1), 1), "-9,876.5");
/// ```
pub fn format_amount(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let digits = format!("{:.prec$}", rounded.abs(), prec = decimals as usize);
    let (integer_part, frac_part) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits.as_str(), None),
    };

    let mut result = group_thousands(integer_part);
    if let Some(frac) = frac_part {
        result.push('.');
        result.push_str(frac);
    }

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a monetary amount as US dollars, e.g. `$1,234.56` or `-$9.99`.
///
/// # Examples
///
/// ```
/// use earnings_core::formatting::format_usd;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_usd(Decimal::new(123456, 2)), "$1,234.56");
/// assert_eq!(format_usd(Decimal::ZERO), "$0.00");
/// assert_eq!(format_usd(Decimal::new(-999, 2)), "-$9.99");
/// ```
pub fn format_usd(amount: Decimal) -> String {
    let body = format_amount(amount.abs(), 2);
    if amount.is_sign_negative() && body != "0.00" {
        format!("-${}", body)
    } else {
        format!("${}", body)
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero. Ratios outside the `Decimal` range are
/// computed in `f64`.
pub fn percentage(part: Decimal, whole: Decimal, decimal_places: u32) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    match part
        .checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    {
        Some(pct) => pct.round_dp(decimal_places).to_f64().unwrap_or(0.0),
        None => {
            let pct = part.to_f64().unwrap_or(0.0) / whole.to_f64().unwrap_or(1.0) * 100.0;
            let scale = 10f64.powi(decimal_places as i32);
            (pct * scale).round() / scale
        }
    }
}

/// 12-hour clock label for an hour of the day: `0` → `"12 AM"`, `13` → `"1 PM"`.
pub fn format_hour_am_pm(hour: u32) -> String {
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    let period = if hour >= 12 { "PM" } else { "AM" };
    format!("{} {}", display, period)
}

/// Short month and day of `timestamp_ms` in `tz`, e.g. `"Mar 14"`.
pub fn format_month_day(timestamp_ms: i64, tz: Tz) -> String {
    match chrono::DateTime::from_timestamp_millis(timestamp_ms) {
        Some(dt) => dt.with_timezone(&tz).format("%b %-d").to_string(),
        None => String::new(),
    }
}

/// Axis label for an hourly bucket: the date is only shown at local midnight.
pub fn format_tick(timestamp_ms: i64, tz: Tz) -> String {
    let Some(dt) = chrono::DateTime::from_timestamp_millis(timestamp_ms) else {
        return String::new();
    };
    let local = dt.with_timezone(&tz);
    if local.hour() == 0 {
        format!(
            "{} {}",
            format_month_day(timestamp_ms, tz),
            format_hour_am_pm(0)
        )
    } else {
        format_hour_am_pm(local.hour())
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ms(rfc3339: &str) -> i64 {
        chrono::DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .timestamp_millis()
    }

    // ── format_amount ────────────────────────────────────────────────────────

    #[test]
    fn test_format_amount_zero() {
        assert_eq!(format_amount(dec!(0), 0), "0");
        assert_eq!(format_amount(dec!(0), 2), "0.00");
    }

    #[test]
    fn test_format_amount_no_thousands() {
        assert_eq!(format_amount(dec!(123.456), 2), "123.46");
    }

    #[test]
    fn test_format_amount_pads_decimals() {
        assert_eq!(format_amount(dec!(7), 2), "7.00");
        assert_eq!(format_amount(dec!(7.5), 2), "7.50");
    }

    #[test]
    fn test_format_amount_rounds_half_up() {
        assert_eq!(format_amount(dec!(1.005), 2), "1.01");
    }

    #[test]
    fn test_format_amount_millions() {
        assert_eq!(format_amount(dec!(1234567), 0), "1,234,567");
    }

    #[test]
    fn test_format_amount_negative_rounding_to_zero() {
        assert_eq!(format_amount(dec!(-0.001), 2), "0.00");
    }

    // ── format_usd ───────────────────────────────────────────────────────────

    #[test]
    fn test_format_usd_positive() {
        assert_eq!(format_usd(dec!(1234.56)), "$1,234.56");
    }

    #[test]
    fn test_format_usd_negative() {
        assert_eq!(format_usd(dec!(-9.99)), "-$9.99");
    }

    #[test]
    fn test_format_usd_large() {
        assert_eq!(format_usd(dec!(1000000)), "$1,000,000.00");
    }

    // ── percentage ───────────────────────────────────────────────────────────

    #[test]
    fn test_percentage_basic() {
        let p = percentage(dec!(50), dec!(200), 1);
        assert!((p - 25.0).abs() < 1e-9, "percentage = {p}");
    }

    #[test]
    fn test_percentage_zero_whole() {
        assert_eq!(percentage(dec!(10), dec!(0), 2), 0.0);
    }

    #[test]
    fn test_percentage_rounding() {
        let p = percentage(dec!(1), dec!(3), 2);
        assert!((p - 33.33).abs() < 1e-9, "percentage = {p}");
    }

    #[test]
    fn test_percentage_out_of_decimal_range() {
        // MAX / 0.001 does not fit in a Decimal.
        let p = percentage(Decimal::MAX, dec!(0.001), 2);
        assert!(p.is_finite());
        assert!(p > 7.9e33, "percentage = {p}");
    }

    // ── hour / date labels ───────────────────────────────────────────────────

    #[test]
    fn test_format_hour_am_pm() {
        assert_eq!(format_hour_am_pm(0), "12 AM");
        assert_eq!(format_hour_am_pm(1), "1 AM");
        assert_eq!(format_hour_am_pm(11), "11 AM");
        assert_eq!(format_hour_am_pm(12), "12 PM");
        assert_eq!(format_hour_am_pm(13), "1 PM");
        assert_eq!(format_hour_am_pm(23), "11 PM");
    }

    #[test]
    fn test_format_month_day() {
        assert_eq!(format_month_day(ms("2024-03-04T10:00:00Z"), Tz::UTC), "Mar 4");
    }

    #[test]
    fn test_format_month_day_uses_timezone() {
        // 02:00Z on Mar 5 is still Mar 4 in New York.
        assert_eq!(
            format_month_day(ms("2024-03-05T02:00:00Z"), Tz::America__New_York),
            "Mar 4"
        );
    }

    #[test]
    fn test_format_tick_midnight_shows_date() {
        assert_eq!(format_tick(ms("2024-03-14T00:00:00Z"), Tz::UTC), "Mar 14 12 AM");
    }

    #[test]
    fn test_format_tick_other_hours() {
        assert_eq!(format_tick(ms("2024-03-14T15:00:00Z"), Tz::UTC), "3 PM");
    }

    // ── group_thousands ──────────────────────────────────────────────────────

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("5"), "5");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("123456"), "123,456");
    }
}
