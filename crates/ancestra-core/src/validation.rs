//! # Input Validation
//!
//! Field-level validation that runs before any business logic or I/O.
//! Each function trims its input, checks requirements in a fixed order
//! (required → length → value), and returns the cleaned value on success.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::SaleItemDraft;
use crate::{MAX_ITEM_QUANTITY, MAX_SALE_ITEMS};

/// Result type for validations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trims a value and returns `None` when nothing is left.
///
/// Used to normalize optional text fields like product codes, where an
/// empty string and an absent field mean the same thing.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Validates a product name: required, at most 100 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    if trimmed.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 100,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates a product or expense category: required, at most 50 characters.
pub fn validate_category(category: &str) -> ValidationResult<String> {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "category".to_string(),
        });
    }
    if trimmed.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "category".to_string(),
            max: 50,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates an expense description: required, at most 200 characters.
pub fn validate_description(description: &str) -> ValidationResult<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }
    if trimmed.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: 200,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates a money amount: finite and zero or greater.
///
/// `field` feeds the error message, so expense handlers pass "Amount" to get
/// the exact "Amount must be positive" wire string, and product handlers
/// pass "price".
pub fn validate_amount(value: f64, field: &str) -> ValidationResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(value)
}

/// Validates a stock count or reorder level: zero or greater.
pub fn validate_stock_level(value: i64, field: &str) -> ValidationResult<i64> {
    if value < 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(value)
}

/// Validates a quotation tax rate: a percentage in `[0, 100]`.
pub fn validate_tax_rate(rate: f64) -> ValidationResult<f64> {
    if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(rate)
}

/// Validates a username: required, at most 50 characters.
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }
    if trimmed.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates a display name: required, at most 100 characters.
pub fn validate_full_name(full_name: &str) -> ValidationResult<String> {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "full_name".to_string(),
        });
    }
    if trimmed.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "full_name".to_string(),
            max: 100,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates a password: required. No shape rules beyond that; the hash
/// layer does not care and legacy accounts predate any policy.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    Ok(())
}

/// Validates the line items of a sale request before the engine runs.
///
/// Checks, in order: the list is non-empty, the list is not absurdly large,
/// and every line asks for a positive quantity within the per-line ceiling.
pub fn validate_sale_lines(items: &[SaleItemDraft]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(CoreError::EmptySale);
    }
    if items.len() > MAX_SALE_ITEMS {
        return Err(CoreError::SaleTooLarge {
            max: MAX_SALE_ITEMS,
        });
    }
    for item in items {
        if item.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if item.quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: item.quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if let Some(override_price) = item.price_override {
            if !override_price.is_finite() || override_price < 0.0 {
                return Err(ValidationError::MustBePositive {
                    field: "price_override".to_string(),
                }
                .into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(product_id: &str, quantity: i64) -> SaleItemDraft {
        SaleItemDraft {
            product_id: product_id.to_string(),
            quantity,
            price_override: None,
        }
    }

    #[test]
    fn test_product_name_trimmed() {
        assert_eq!(
            validate_product_name("  Maize Flour 25kg  ").unwrap(),
            "Maize Flour 25kg"
        );
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  PROD-1  "), Some("PROD-1".to_string()));
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty(""), None);
    }

    #[test]
    fn test_amount_rejects_negative_and_nan() {
        assert_eq!(validate_amount(0.0, "Amount").unwrap(), 0.0);
        assert_eq!(validate_amount(350.5, "Amount").unwrap(), 350.5);

        let err = validate_amount(-1.0, "Amount").unwrap_err();
        assert_eq!(err.to_string(), "Amount must be positive");
        assert!(validate_amount(f64::NAN, "price").is_err());
    }

    #[test]
    fn test_tax_rate_bounds() {
        assert_eq!(validate_tax_rate(0.0).unwrap(), 0.0);
        assert_eq!(validate_tax_rate(16.5).unwrap(), 16.5);
        assert!(validate_tax_rate(-0.1).is_err());
        assert!(validate_tax_rate(100.5).is_err());
    }

    #[test]
    fn test_sale_lines_empty() {
        let err = validate_sale_lines(&[]).unwrap_err();
        assert_eq!(err.to_string(), "Sale must include items");
    }

    #[test]
    fn test_sale_lines_quantity_bounds() {
        assert!(validate_sale_lines(&[draft("p1", 1)]).is_ok());
        assert!(validate_sale_lines(&[draft("p1", 0)]).is_err());
        assert!(validate_sale_lines(&[draft("p1", -3)]).is_err());
        assert!(validate_sale_lines(&[draft("p1", MAX_ITEM_QUANTITY + 1)]).is_err());
    }

    #[test]
    fn test_sale_lines_negative_override() {
        let mut item = draft("p1", 1);
        item.price_override = Some(-5.0);
        assert!(validate_sale_lines(&[item]).is_err());
    }

    #[test]
    fn test_sale_lines_too_many() {
        let items: Vec<_> = (0..=MAX_SALE_ITEMS).map(|i| draft(&i.to_string(), 1)).collect();
        assert!(validate_sale_lines(&items).is_err());
    }
}
