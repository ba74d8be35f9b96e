//! # Repository Module
//!
//! Database repository implementations for the Ancestra Business backend.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Request Handler                                                       │
//! │       │                                                                 │
//! │       │  db.sales().create(&new_sale, &user.id)                        │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── create(&self, request, created_by)                                │
//! │  ├── list(&self, filter)                                               │
//! │  ├── get_by_id(&self, id)                                              │
//! │  └── items(&self, sale_id)                                             │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test against an in-memory database                          │
//! │  • SQL is isolated in one place                                        │
//! │  • Mutations and their audit entries share one transaction             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`] - Staff accounts
//! - [`product::ProductRepository`] - Inventory CRUD and CSV import
//! - [`sale::SaleRepository`] - The sale engine and sale queries
//! - [`expense::ExpenseRepository`] - Expense ledger
//! - [`activity::ActivityRepository`] - Audit trail
//! - [`settings::SettingsRepository`] - Receipt branding singleton
//! - [`quotation::QuotationRepository`] - Sequential quote numbering
//! - [`report::ReportRepository`] - Dashboard and employee aggregations

pub mod activity;
pub mod expense;
pub mod product;
pub mod quotation;
pub mod report;
pub mod sale;
pub mod settings;
pub mod user;
