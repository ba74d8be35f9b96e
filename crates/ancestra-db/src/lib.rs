//! # Ancestra Database Layer
//!
//! SQLite persistence for the Ancestra business backend. Every HTTP handler
//! talks to this crate through [`Database`], which hands out per-concern
//! repositories over a shared connection pool:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          HTTP handlers                              │
//! └──────────────────────────────┬──────────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Database (SqlitePool)                         │
//! │                                                                     │
//! │  users() products() sales() expenses() activity() settings()        │
//! │  quotations() reports()                                             │
//! └──────────────────────────────┬──────────────────────────────────────┘
//!                                │  runtime-bound queries, WAL mode,
//!                                │  foreign keys on
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                 SQLite file (or :memory: in tests)                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mutations that the audit trail cares about (sales, product and expense
//! changes) write their activity entry inside the same transaction as the
//! change itself.
//!
//! ## Usage
//!
//! ```no_run
//! use ancestra_db::{Database, DbConfig};
//!
//! # async fn example() -> Result<(), ancestra_db::DbError> {
//! let db = Database::new(DbConfig::new("./ancestra.db")).await?;
//! let products = db.products().list().await?;
//! println!("{} products", products.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::activity::ActivityRepository;
pub use repository::expense::{ExpenseFilter, ExpenseRepository};
pub use repository::product::ProductRepository;
pub use repository::quotation::QuotationRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::{SaleFilter, SaleRepository};
pub use repository::settings::SettingsRepository;
pub use repository::user::UserRepository;
