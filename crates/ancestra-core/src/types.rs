//! # Core Domain Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Type Organization                               │
//! │                                                                         │
//! │  Enums          Role, PaymentMethod                                     │
//! │  Entities       User, Product, Sale, SaleItem, Expense,                 │
//! │                 ActivityLog, ReceiptSettings                            │
//! │  Requests       RegisterUser, NewProduct, NewSale, QuotationRequest ... │
//! │  Responses      SaleRead, ImportReport, ReportSummary,                  │
//! │                 EmployeeSummary ...                                     │
//! │                                                                         │
//! │  Entities mirror table rows (sqlx::FromRow behind the `sqlx` feature). │
//! │  Request/response structs are the JSON wire contract; field names      │
//! │  and enum spellings must stay stable.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// User role controlling endpoint access.
///
/// Management endpoints (product mutation, expenses, employees) require
/// `Owner` or `Manager`; receipt settings mutation requires `Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Manager,
    #[default]
    Cashier,
}

impl Role {
    /// Roles allowed to manage inventory, expenses and employees.
    pub fn is_management(&self) -> bool {
        matches!(self, Role::Owner | Role::Manager)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Manager => "manager",
            Role::Cashier => "cashier",
        }
    }

    /// Human-readable permission list shown on the employees screen.
    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            Role::Owner => &[
                "Full system access",
                "Manage users and roles",
                "Adjust inventory and pricing",
                "Review sales and reports",
            ],
            Role::Manager => &[
                "Manage inventory and pricing",
                "Review sales and reports",
                "Record sales transactions",
            ],
            Role::Cashier => &[
                "Record sales transactions",
                "View assigned inventory levels",
            ],
        }
    }
}

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    BankTransfer,
    AirtelMoney,
    MtnMoney,
}

impl PaymentMethod {
    /// Display label used on receipts.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::AirtelMoney => "Airtel Money",
            PaymentMethod::MtnMoney => "MTN Money",
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A staff account.
///
/// Deliberately not `Serialize`: the row carries the password hash, and
/// nothing should ever ship it to a client. Use [`UserProfile`] for the wire.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

/// An inventory item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub name: String,
    /// `PROD-XXXX`, auto-generated when not supplied at creation.
    pub product_code: Option<String>,
    pub category: String,
    pub price: f64,
    pub quantity: i64,
    pub reorder_level: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Low stock means at or below the reorder level.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

/// A completed sale. Line items live in [`SaleItem`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub customer_name: Option<String>,
    pub receipt_number: String,
    pub payment_method: PaymentMethod,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
    /// Null once the creating user has been deleted.
    pub created_by: Option<String>,
}

/// One line of a sale.
///
/// `product_name` and `unit_price` are snapshots taken at sale time, so the
/// line renders unchanged after the product is edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// A business expense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub expense_date: NaiveDate,
    /// Relative media path of the uploaded receipt, e.g.
    /// `expense_receipts/<hex>.png`. The API layer turns this into a URL.
    pub receipt_path: Option<String>,
}

/// Audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ActivityLog {
    pub id: String,
    pub user_id: Option<String>,
    pub action: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Receipt branding, stored as a single row created on first read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReceiptSettings {
    pub company_name: String,
    pub company_address: Option<String>,
    pub company_logo_url: Option<String>,
    pub company_tagline: Option<String>,
    pub footer_message: String,
    /// Overrides the default `receipt|total|timestamp` QR payload.
    pub qr_code_content: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Request Payloads
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub product_code: Option<String>,
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub reorder_level: i64,
}

/// Partial product update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub product_code: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub reorder_level: Option<i64>,
}

impl ProductUpdate {
    /// Field names that carry a value, sorted, for the audit description
    /// ("Updated product X (price, quantity)").
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.product_code.is_some() {
            fields.push("product_code");
        }
        if self.category.is_some() {
            fields.push("category");
        }
        if self.price.is_some() {
            fields.push("price");
        }
        if self.quantity.is_some() {
            fields.push("quantity");
        }
        if self.reorder_level.is_some() {
            fields.push("reorder_level");
        }
        fields.sort_unstable();
        fields
    }
}

/// One requested sale line.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleItemDraft {
    pub product_id: String,
    pub quantity: i64,
    /// Sell at a different price than the catalog one (discounts, haggling).
    pub price_override: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSale {
    pub customer_name: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub items: Vec<SaleItemDraft>,
}

/// Partial expense update. `receipt_url` is accepted for compatibility with
/// older clients but ignored; receipts only change through upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub expense_date: Option<NaiveDate>,
    #[serde(default)]
    pub receipt_url: Option<String>,
}

/// Receipt settings update; the logo changes through its own upload endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiptSettingsUpdate {
    pub company_name: Option<String>,
    pub company_address: Option<String>,
    pub company_tagline: Option<String>,
    pub footer_message: Option<String>,
    pub qr_code_content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotationItemDraft {
    pub product_id: String,
    /// Fractional quantities are allowed on quotes (e.g. 2.5 hours, 0.5 kg).
    pub quantity: f64,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotationRequest {
    pub customer_name: String,
    pub customer_address: Option<String>,
    pub customer_city: Option<String>,
    pub quote_date: NaiveDate,
    pub due_date: NaiveDate,
    pub items: Vec<QuotationItemDraft>,
    #[serde(default = "default_quote_terms")]
    pub terms: String,
    /// Percentage, e.g. 5.0 for 5%.
    #[serde(default = "default_quote_tax_rate")]
    pub tax_rate: f64,
}

fn default_quote_terms() -> String {
    "Payment is due in 14 days".to_string()
}

fn default_quote_tax_rate() -> f64 {
    5.0
}

// =============================================================================
// Response Payloads
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        TokenResponse {
            access_token,
            token_type: "bearer",
        }
    }
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleItemRead {
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
}

impl From<SaleItem> for SaleItemRead {
    fn from(item: SaleItem) -> Self {
        SaleItemRead {
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal: item.subtotal,
        }
    }
}

/// A sale with its lines, as returned by the sales endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SaleRead {
    pub id: String,
    pub customer_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub total_amount: f64,
    pub receipt_number: String,
    pub items: Vec<SaleItemRead>,
}

impl SaleRead {
    pub fn from_parts(sale: Sale, items: Vec<SaleItem>) -> Self {
        SaleRead {
            id: sale.id,
            customer_name: sale.customer_name,
            payment_method: sale.payment_method,
            created_at: sale.created_at,
            total_amount: sale.total_amount,
            receipt_number: sale.receipt_number,
            items: items.into_iter().map(SaleItemRead::from).collect(),
        }
    }
}

/// Expense as returned by the API: `receipt_path` resolved to a URL.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseRead {
    pub id: String,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub expense_date: NaiveDate,
    pub receipt_url: Option<String>,
}

/// Rendered receipt bundle for a sale.
#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    pub sale: SaleRead,
    pub receipt_number: String,
    /// Sale timestamp in Central Africa Time.
    pub issued_at: DateTime<FixedOffset>,
    pub html: String,
    /// PNG data URI.
    pub qr_code: String,
    pub company_name: String,
    pub company_logo_url: Option<String>,
    pub company_tagline: Option<String>,
    pub footer_message: String,
}

/// Outcome of a CSV product import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub created: u32,
    pub updated: u32,
    pub skipped: u32,
    pub errors: Vec<String>,
}

impl ImportReport {
    /// The import transaction only commits when something changed.
    pub fn has_changes(&self) -> bool {
        self.created > 0 || self.updated > 0
    }
}

// -----------------------------------------------------------------------------
// Reporting
// -----------------------------------------------------------------------------

/// One day in the sales-vs-expenses series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitPoint {
    pub period: NaiveDate,
    pub sales: f64,
    pub expenses: f64,
    pub profit: f64,
}

/// Rolling window totals (Daily / Weekly / Monthly).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub label: String,
    pub sales: f64,
    pub expenses: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestSeller {
    pub product_id: String,
    pub product_name: String,
    pub unit_price: f64,
    pub total_quantity: i64,
    pub total_revenue: f64,
    /// "In stock" or "Out of stock".
    pub status: String,
}

/// Sales attributed to one user; survives user deletion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSales {
    pub user_id: Option<String>,
    pub user_name: String,
    pub total_sales: f64,
    pub total_transactions: i64,
    pub is_deleted: bool,
}

/// The dashboard aggregate returned by `/api/reports/summary`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_sales: f64,
    pub total_expenses: f64,
    pub total_profit: f64,
    pub total_orders: i64,
    pub sales_today: f64,
    /// "Name (qty)" strings for products at or below reorder level.
    pub low_stock: Vec<String>,
    pub sales_vs_expenses: Vec<ProfitPoint>,
    pub period_summaries: Vec<PeriodSummary>,
    pub best_sellers: Vec<BestSeller>,
    pub sales_by_user: Vec<UserSales>,
}

// -----------------------------------------------------------------------------
// Employees
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeActivity {
    pub action: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EmployeeSalesPeriod {
    pub count: i64,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmployeeSalesSummary {
    pub total_count: i64,
    pub total_amount: f64,
    pub week: EmployeeSalesPeriod,
    pub month: EmployeeSalesPeriod,
    pub three_months: EmployeeSalesPeriod,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeSummary {
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub role: Role,
    pub permissions: Vec<String>,
    pub sales: EmployeeSalesSummary,
    pub recent_activity: Vec<EmployeeActivity>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::Cash.label(), "Cash");
        assert_eq!(PaymentMethod::BankTransfer.label(), "Bank Transfer");
        assert_eq!(PaymentMethod::AirtelMoney.label(), "Airtel Money");
        assert_eq!(PaymentMethod::MtnMoney.label(), "MTN Money");
    }

    #[test]
    fn test_payment_method_wire_spelling() {
        let json = serde_json::to_string(&PaymentMethod::MtnMoney).unwrap();
        assert_eq!(json, "\"mtn_money\"");
        let parsed: PaymentMethod = serde_json::from_str("\"bank_transfer\"").unwrap();
        assert_eq!(parsed, PaymentMethod::BankTransfer);
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Owner.is_management());
        assert!(Role::Manager.is_management());
        assert!(!Role::Cashier.is_management());

        assert_eq!(Role::Owner.permissions().len(), 4);
        assert_eq!(Role::Owner.permissions()[0], "Full system access");
        assert_eq!(
            Role::Cashier.permissions(),
            &["Record sales transactions", "View assigned inventory levels"]
        );
    }

    #[test]
    fn test_low_stock_boundary() {
        let mut product = Product {
            id: "p1".to_string(),
            name: "Dish Soap".to_string(),
            product_code: Some("PROD-AB12".to_string()),
            category: "Cleaning".to_string(),
            price: 25.0,
            quantity: 20,
            reorder_level: 20,
            created_at: Utc::now(),
            updated_at: None,
        };
        // At the reorder level counts as low.
        assert!(product.is_low_stock());
        product.quantity = 21;
        assert!(!product.is_low_stock());
    }

    #[test]
    fn test_new_sale_defaults_to_cash() {
        let sale: NewSale = serde_json::from_str(
            r#"{"items": [{"product_id": "p1", "quantity": 2}]}"#,
        )
        .unwrap();
        assert_eq!(sale.payment_method, PaymentMethod::Cash);
        assert!(sale.customer_name.is_none());
        assert!(sale.items[0].price_override.is_none());
    }

    #[test]
    fn test_quotation_request_defaults() {
        let req: QuotationRequest = serde_json::from_str(
            r#"{
                "customer_name": "Acme Ltd",
                "quote_date": "2025-03-01",
                "due_date": "2025-03-15",
                "items": [{"product_id": "p1", "quantity": 2.5, "unit_price": 40.0}]
            }"#,
        )
        .unwrap();
        assert_eq!(req.terms, "Payment is due in 14 days");
        assert_eq!(req.tax_rate, 5.0);
    }

    #[test]
    fn test_changed_fields_sorted() {
        let update = ProductUpdate {
            quantity: Some(5),
            category: Some("Food".to_string()),
            ..Default::default()
        };
        assert_eq!(update.changed_fields(), vec!["category", "quantity"]);
        assert!(ProductUpdate::default().changed_fields().is_empty());
    }

    #[test]
    fn test_user_profile_hides_hash() {
        let user = User {
            id: "u1".to_string(),
            username: "owner".to_string(),
            full_name: "Business Owner".to_string(),
            role: Role::Owner,
            hashed_password: "$argon2id$...".to_string(),
            created_at: Utc::now(),
        };
        let profile = UserProfile::from(&user);
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"owner\""));
    }
}
