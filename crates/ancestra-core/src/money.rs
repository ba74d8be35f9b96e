//! # Money Formatting
//!
//! Amounts in this system are `f64` end-to-end because the wire contract is
//! JSON floats rendered with two decimals; what this module centralises is
//! the rendering, so receipts, activity descriptions and PDFs all agree.
//!
//! ```text
//! format_zmw(240.0)            -> "ZMW 240.00"     (receipts, audit log)
//! format_zmw_grouped(12400.5)  -> "ZMW 12,400.50"  (report PDFs)
//! ```

/// Currency code printed in front of every amount.
pub const CURRENCY: &str = "ZMW";

/// Renders an amount as `ZMW 123.45`.
pub fn format_zmw(amount: f64) -> String {
    format!("{CURRENCY} {amount:.2}")
}

/// Renders an amount as `ZMW 1,234,567.89`, thousands-grouped.
///
/// Used by the PDF reports where large totals are common. Negative values
/// (a loss-making profit line) keep the sign in front of the digits.
pub fn format_zmw_grouped(amount: f64) -> String {
    format!("{CURRENCY} {}", group_thousands(amount))
}

/// Formats `amount` with two decimals and commas every three integer digits.
pub fn group_thousands(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (int_part, dec_part) = match formatted.split_once('.') {
        Some(parts) => parts,
        None => (formatted.as_str(), "00"),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{dec_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_zmw() {
        assert_eq!(format_zmw(240.0), "ZMW 240.00");
        assert_eq!(format_zmw(0.0), "ZMW 0.00");
        assert_eq!(format_zmw(99.999), "ZMW 100.00");
    }

    #[test]
    fn test_grouping() {
        assert_eq!(group_thousands(0.0), "0.00");
        assert_eq!(group_thousands(999.0), "999.00");
        assert_eq!(group_thousands(1000.0), "1,000.00");
        assert_eq!(group_thousands(12400.5), "12,400.50");
        assert_eq!(group_thousands(1234567.891), "1,234,567.89");
    }

    #[test]
    fn test_grouping_negative() {
        assert_eq!(format_zmw_grouped(-1234.5), "ZMW -1,234.50");
    }
}
