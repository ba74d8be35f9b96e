//! # Error Types
//!
//! Domain-specific error types for ancestra-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ancestra-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  ancestra-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP API errors (in apps/server)                                      │
//! │  └── ApiError         - What clients see as {"detail": ...}            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, row number, etc.)
//! 3. Errors are enum variants, never String
//! 4. Variant messages are the exact user-facing strings the API returns

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. Their `Display` output is
/// what the API ultimately sends to clients, so the wording is part of the
/// contract and must not drift.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale line references a product id that does not exist.
    #[error("Product {0} not found")]
    UnknownProduct(String),

    /// Not enough stock on hand to cover a sale line.
    ///
    /// ## When This Occurs
    /// - Requested quantity exceeds `products.quantity`
    /// - A concurrent sale drained the stock between read and decrement
    #[error("Insufficient stock for {name}")]
    InsufficientStock { name: String },

    /// A sale was submitted with an empty item list.
    #[error("Sale must include items")]
    EmptySale,

    /// Sale has exceeded the maximum allowed number of lines.
    #[error("Sale cannot have more than {max} items")]
    SaleTooLarge { max: usize },

    /// Line quantity exceeds the per-item ceiling.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A product with the same name already exists (case-insensitive).
    #[error("Product already exists")]
    DuplicateProduct,

    /// Username taken at registration time.
    #[error("Username already registered")]
    DuplicateUsername,

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be zero or greater.
    ///
    /// The bare "Amount must be positive" wording is the wire contract for
    /// expense and sale amounts, hence the capitalised field name.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., bad date, malformed number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Maize Flour 25kg".to_string(),
        };
        assert_eq!(err.to_string(), "Insufficient stock for Maize Flour 25kg");

        assert_eq!(
            CoreError::UnknownProduct("p-123".to_string()).to_string(),
            "Product p-123 not found"
        );
        assert_eq!(CoreError::EmptySale.to_string(), "Sale must include items");
        assert_eq!(
            CoreError::DuplicateProduct.to_string(),
            "Product already exists"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustBePositive {
            field: "Amount".to_string(),
        };
        assert_eq!(err.to_string(), "Amount must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "category".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        // The wrapper must not add a prefix; the message is the contract.
        assert_eq!(core_err.to_string(), "category is required");
    }
}
