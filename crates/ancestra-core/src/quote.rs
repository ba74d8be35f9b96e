//! # Quotation Math
//!
//! Pure line/total computation for quotations, kept out of the PDF layer so
//! the numbers are testable without rendering anything.

use serde::Serialize;

/// One priced quotation line, description resolved from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteLine {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
}

impl QuoteLine {
    pub fn new(description: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        QuoteLine {
            description: description.into(),
            quantity,
            unit_price,
            amount: quantity * unit_price,
        }
    }
}

/// Subtotal, tax and grand total for a quotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuoteTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

/// Sums line amounts and applies `tax_rate` as a percentage.
pub fn compute_totals(lines: &[QuoteLine], tax_rate: f64) -> QuoteTotals {
    let subtotal: f64 = lines.iter().map(|line| line.amount).sum();
    let tax = subtotal * (tax_rate / 100.0);
    QuoteTotals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_amount() {
        let line = QuoteLine::new("Maize Flour 25kg", 2.5, 120.0);
        assert_eq!(line.amount, 300.0);
    }

    #[test]
    fn test_totals_with_default_rate() {
        let lines = vec![
            QuoteLine::new("Maize Flour 25kg", 2.0, 120.0),
            QuoteLine::new("Cooking Oil 5L", 1.0, 90.0),
        ];
        let totals = compute_totals(&lines, 5.0);
        assert_eq!(totals.subtotal, 330.0);
        assert!((totals.tax - 16.5).abs() < 1e-9);
        assert!((totals.total - 346.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_rate_and_empty_quote() {
        let totals = compute_totals(&[], 5.0);
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.total, 0.0);

        let lines = vec![QuoteLine::new("Soap", 4.0, 25.0)];
        let totals = compute_totals(&lines, 0.0);
        assert_eq!(totals.tax, 0.0);
        assert_eq!(totals.total, 100.0);
    }
}
