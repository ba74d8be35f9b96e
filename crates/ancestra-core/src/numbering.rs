//! # Document Numbering
//!
//! The formats here are printed on paper and parsed by the frontend, so they
//! are contracts:
//!
//! ```text
//! Receipt   AB-20250301-9F21C4      date in CAT + 6 hex chars
//! Quote     QT0007_0103_2025        counter + ddmm + yyyy
//! Code      PROD-X4T9               4 chars from [A-Z0-9]
//! ```
//!
//! Uniqueness is enforced by the callers (collision retry against the
//! database); these functions only produce candidates.

use chrono::NaiveDate;
use uuid::Uuid;

const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Receipt number candidate for a sale recorded on `date` (the CAT business
/// date): `AB-<yyyymmdd>-<6 uppercase hex chars>`.
pub fn receipt_number(date: NaiveDate) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("AB-{}-{}", date.format("%Y%m%d"), suffix)
}

/// Quotation number for counter value `counter` on `date`:
/// `QT<counter, 4 digits>_<ddmm>_<yyyy>`.
pub fn quotation_number(counter: i64, date: NaiveDate) -> String {
    format!(
        "QT{:04}_{}_{}",
        counter,
        date.format("%d%m"),
        date.format("%Y")
    )
}

/// Product code candidate: `PROD-` plus four characters from `[A-Z0-9]`.
///
/// The characters are derived from fresh UUID bytes; with 36^4 combinations
/// collisions are rare and the caller retries against the unique index.
pub fn product_code_candidate() -> String {
    let bytes = *Uuid::new_v4().as_bytes();
    let mut code = String::from("PROD-");
    for byte in &bytes[..4] {
        code.push(CODE_ALPHABET[(*byte as usize) % CODE_ALPHABET.len()] as char);
    }
    code
}

/// Deterministic fallback when candidate generation keeps colliding:
/// `PROD-` plus the current epoch milliseconds modulo 10^8.
pub fn product_code_fallback(epoch_millis: i64) -> String {
    format!("PROD-{}", epoch_millis.rem_euclid(100_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_number_shape() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let number = receipt_number(date);
        assert!(number.starts_with("AB-20250301-"));
        assert_eq!(number.len(), "AB-20250301-".len() + 6);
        let suffix = &number["AB-20250301-".len()..];
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_receipt_numbers_vary() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let a = receipt_number(date);
        let b = receipt_number(date);
        assert_ne!(a, b);
    }

    #[test]
    fn test_quotation_number_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(quotation_number(7, date), "QT0007_1403_2025");
        assert_eq!(quotation_number(12345, date), "QT12345_1403_2025");
    }

    #[test]
    fn test_product_code_shape() {
        let code = product_code_candidate();
        assert!(code.starts_with("PROD-"));
        assert_eq!(code.len(), 9);
        assert!(code[5..]
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[test]
    fn test_product_code_fallback() {
        assert_eq!(product_code_fallback(1_712_345_678_901), "PROD-45678901");
        assert!(product_code_fallback(42).starts_with("PROD-"));
    }
}
