//! Cent-denominated money helpers.
//!
//! All amounts are stored as whole cents (`i64`); rates are `f64` percent.
//! Percent math rounds half-up to the cent, applied once on the subtotal,
//! never per line item.

/// `round2(amount * rate / 100)` with round-half-up semantics.
pub fn percent_of(amount_cents: i64, rate: f64) -> i64 {
  (amount_cents as f64 * rate / 100.0).round() as i64
}

/// Format cents as a dollar string, e.g. `$102.20`.
pub fn fmt_usd(cents: i64) -> String {
  format!("${}.{:02}", cents / 100, cents % 100)
}

/// Parse a decimal dollar string from an external provider into cents.
/// Returns `None` for anything unparsable or negative.
pub fn parse_usd(s: &str) -> Option<i64> {
  let value: f64 = s.trim().parse().ok()?;
  if !value.is_finite() || value < 0.0 {
    return None;
  }
  Some((value * 100.0).round() as i64)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn percent_rounds_half_up() {
    // 8% of $90.00 = $7.20
    assert_eq!(percent_of(9000, 8.0), 720);
    // 10% of $100.00 = $10.00
    assert_eq!(percent_of(10000, 10.0), 1000);
    // 5% of $0.10 = half a cent, rounds up
    assert_eq!(percent_of(10, 5.0), 1);
    // 3% of $0.15 = 0.45 cents, rounds down
    assert_eq!(percent_of(15, 3.0), 0);
    assert_eq!(percent_of(0, 10.0), 0);
  }

  #[test]
  fn formats_dollars() {
    assert_eq!(fmt_usd(10220), "$102.20");
    assert_eq!(fmt_usd(5), "$0.05");
    assert_eq!(fmt_usd(900), "$9.00");
  }

  #[test]
  fn parses_provider_amounts() {
    assert_eq!(parse_usd("7.33"), Some(733));
    assert_eq!(parse_usd(" 12.00 "), Some(1200));
    assert_eq!(parse_usd("-1.00"), None);
    assert_eq!(parse_usd("abc"), None);
  }
}
