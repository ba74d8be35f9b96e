//! # ancestra-core: Pure Business Logic for Ancestra Business
//!
//! This crate is the **heart** of the Ancestra backend. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Ancestra Business Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     Web Frontend (REST client)                  │   │
//! │  │    Inventory ──► POS ──► Expenses ──► Reports ──► Settings     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                     apps/server (axum)                          │   │
//! │  │    routing, auth, uploads, receipt HTML, PDF/QR rendering      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ancestra-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ numbering │  │    csv    │  │ validation│  │   │
//! │  │   │  Product  │  │ AB-/QT/   │  │  import   │  │   rules   │  │   │
//! │  │   │   Sale    │  │ PROD-     │  │  export   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   ancestra-db (Database Layer)                  │   │
//! │  │             SQLite queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Expense, report DTOs, ...)
//! - [`error`] - Domain error types with wire-contract messages
//! - [`validation`] - Input validation rules
//! - [`money`] - ZMW amount formatting
//! - [`time`] - Central Africa Time helpers
//! - [`numbering`] - Receipt / quotation / product-code formats
//! - [`csv`] - CSV import parsing and export serialization
//! - [`quote`] - Quotation line and tax math
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic where possible;
//!    the only nondeterminism is fresh UUIDs in number candidates
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Contract Messages**: Error `Display` strings are exactly what the
//!    API returns, so tests can assert on them
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod csv;
pub mod error;
pub mod money;
pub mod numbering;
pub mod quote;
pub mod time;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use ancestra_core::Product` instead of
// `use ancestra_core::types::Product`

pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale.
///
/// ## Business Reason
/// Prevents runaway carts and keeps receipts printable on one roll.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
