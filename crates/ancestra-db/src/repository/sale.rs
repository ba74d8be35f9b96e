//! # Sale Repository
//!
//! The point-of-sale engine. A sale is priced, stock-checked, numbered and
//! written together with its audit entry in one transaction:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        create() transaction                             │
//! │                                                                         │
//! │  validate lines (count, quantity caps)                                  │
//! │       │                                                                 │
//! │       ▼  per line                                                       │
//! │  load product ──► UPDATE products SET quantity = quantity - n           │
//! │                   WHERE id = ? AND quantity >= n                        │
//! │                   (0 rows touched ⇒ insufficient stock, roll back)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  price line: override if given, else catalog price                      │
//! │  snapshot the product name onto the line                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  draw a unique receipt number ──► insert sale + lines + audit entry     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded decrement means two concurrent sales of the last unit cannot
//! both succeed; the loser rolls back with its stock error.

use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::activity::insert_activity;
use ancestra_core::{
    numbering, time, validation, CoreError, NewSale, Product, Sale, SaleItem,
};

const SALE_COLUMNS: &str =
    "id, customer_name, receipt_number, payment_method, total_amount, created_at, created_by";

const ITEM_COLUMNS: &str =
    "id, sale_id, product_id, product_name, quantity, unit_price, subtotal";

/// Optional filters for the sales listing. Dates select whole business days
/// in Central Africa Time, both ends inclusive.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive exact customer name.
    pub customer: Option<String>,
    /// Sales containing at least one line for this product.
    pub product_id: Option<String>,
    pub created_by: Option<String>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale. Returns the stored sale and its lines in entry order.
    ///
    /// Rolls back entirely on the first bad line, so a failed sale never
    /// leaves partial stock decrements behind.
    pub async fn create(&self, new: &NewSale, created_by: &str) -> DbResult<(Sale, Vec<SaleItem>)> {
        validation::validate_sale_lines(&new.items)?;

        let mut tx = self.pool.begin().await?;

        let sale_id = generate_sale_id();
        let mut items = Vec::with_capacity(new.items.len());
        let mut total_amount = 0.0;

        for line in &new.items {
            let product = sqlx::query_as::<_, Product>(
                "SELECT id, name, product_code, category, price, quantity, reorder_level, created_at, updated_at
                 FROM products WHERE id = ?1",
            )
            .bind(&line.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::UnknownProduct(line.product_id.clone()))?;

            // The quantity guard is the stock check; a concurrent sale that
            // got there first leaves zero rows to update.
            let decremented = sqlx::query(
                "UPDATE products SET quantity = quantity - ?2, updated_at = ?3
                 WHERE id = ?1 AND quantity >= ?2",
            )
            .bind(&product.id)
            .bind(line.quantity)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
            if decremented.rows_affected() == 0 {
                return Err(CoreError::InsufficientStock { name: product.name }.into());
            }

            let unit_price = line.price_override.unwrap_or(product.price);
            let subtotal = unit_price * line.quantity as f64;
            total_amount += subtotal;

            items.push(SaleItem {
                id: generate_sale_item_id(),
                sale_id: sale_id.clone(),
                product_id: Some(product.id),
                product_name: product.name,
                quantity: line.quantity,
                unit_price,
                subtotal,
            });
        }

        let receipt_number = unique_receipt_number(&mut tx).await?;
        let sale = Sale {
            id: sale_id,
            customer_name: new.customer_name.clone(),
            receipt_number,
            payment_method: new.payment_method,
            total_amount,
            created_at: Utc::now(),
            created_by: Some(created_by.to_string()),
        };

        sqlx::query(
            "INSERT INTO sales (id, customer_name, receipt_number, payment_method, total_amount, created_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&sale.id)
        .bind(&sale.customer_name)
        .bind(&sale.receipt_number)
        .bind(sale.payment_method)
        .bind(sale.total_amount)
        .bind(sale.created_at)
        .bind(&sale.created_by)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                "INSERT INTO sale_items (id, sale_id, product_id, product_name, quantity, unit_price, subtotal)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.subtotal)
            .execute(&mut *tx)
            .await?;
        }

        insert_activity(
            &mut tx,
            created_by,
            "sale_created",
            &format!(
                "Recorded sale {} for ZMW {:.2}",
                sale.receipt_number, sale.total_amount
            ),
        )
        .await?;

        tx.commit().await?;

        debug!(
            receipt = %sale.receipt_number,
            total = sale.total_amount,
            lines = items.len(),
            "Recorded sale"
        );
        Ok((sale, items))
    }

    /// Sales matching the filter, newest first, each paired with its lines.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<(Sale, Vec<SaleItem>)>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE 1=1"
        ));
        if let Some(start) = filter.start_date {
            query.push(" AND created_at >= ");
            query.push_bind(time::cat_day_start(start));
        }
        if let Some(end) = filter.end_date {
            query.push(" AND created_at < ");
            query.push_bind(time::cat_day_bounds(end).1);
        }
        if let Some(customer) = &filter.customer {
            query.push(" AND lower(customer_name) = ");
            query.push_bind(customer.to_lowercase());
        }
        if let Some(product_id) = &filter.product_id {
            query.push(" AND id IN (SELECT sale_id FROM sale_items WHERE product_id = ");
            query.push_bind(product_id.clone());
            query.push(")");
        }
        if let Some(created_by) = &filter.created_by {
            query.push(" AND created_by = ");
            query.push_bind(created_by.clone());
        }
        query.push(" ORDER BY created_at DESC");

        let sales = query
            .build_query_as::<Sale>()
            .fetch_all(&self.pool)
            .await?;

        let mut result = Vec::with_capacity(sales.len());
        for sale in sales {
            let items = self.items(&sale.id).await?;
            result.push((sale, items));
        }
        Ok(result)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lines for one sale in the order they were rung up.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Total number of recorded sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Draws receipt numbers until one is unused. Collisions need the same CAT
/// date and the same six random hex digits, so this rarely loops at all.
async fn unique_receipt_number(conn: &mut SqliteConnection) -> DbResult<String> {
    loop {
        let candidate = numbering::receipt_number(time::today_cat());
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM sales WHERE receipt_number = ?1")
                .bind(&candidate)
                .fetch_optional(&mut *conn)
                .await?;
        if exists.is_none() {
            return Ok(candidate);
        }
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use ancestra_core::{PaymentMethod, Role, SaleItemDraft};
    use std::collections::HashSet;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_user(db: &Database, username: &str) -> String {
        db.users()
            .create(username, "Test Cashier", Role::Cashier, "hash")
            .await
            .unwrap()
            .id
    }

    async fn seed_product(db: &Database, name: &str, price: f64, quantity: i64) -> Product {
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            product_code: None,
            category: "Food".to_string(),
            price,
            quantity,
            reorder_level: 5,
            created_at: Utc::now(),
            updated_at: None,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    fn line(product_id: &str, quantity: i64, price_override: Option<f64>) -> SaleItemDraft {
        SaleItemDraft {
            product_id: product_id.to_string(),
            quantity,
            price_override,
        }
    }

    #[tokio::test]
    async fn test_create_sale_prices_lines_and_decrements_stock() {
        let db = test_db().await;
        let user = seed_user(&db, "cashier").await;
        let flour = seed_product(&db, "Maize Flour 25kg", 120.0, 50).await;
        let oil = seed_product(&db, "Cooking Oil 5L", 90.0, 30).await;

        let new = NewSale {
            customer_name: Some("Jane Banda".to_string()),
            payment_method: PaymentMethod::Cash,
            items: vec![
                line(&flour.id, 2, None),
                line(&oil.id, 1, Some(50.0)),
            ],
        };
        let (sale, items) = db.sales().create(&new, &user).await.unwrap();

        assert_eq!(sale.total_amount, 290.0);
        assert_eq!(sale.created_by.as_deref(), Some(user.as_str()));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product_name, "Maize Flour 25kg");
        assert_eq!(items[0].subtotal, 240.0);
        assert_eq!(items[1].unit_price, 50.0);

        let flour_after = db.products().get_by_id(&flour.id).await.unwrap().unwrap();
        assert_eq!(flour_after.quantity, 48);
        let oil_after = db.products().get_by_id(&oil.id).await.unwrap().unwrap();
        assert_eq!(oil_after.quantity, 29);

        let entries = db.activity().recent_for_user(&user, 5).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].description.starts_with("Recorded sale AB-"));
        assert!(entries[0].description.ends_with("for ZMW 290.00"));
    }

    #[tokio::test]
    async fn test_receipt_number_shape() {
        let db = test_db().await;
        let user = seed_user(&db, "cashier").await;
        let flour = seed_product(&db, "Maize Flour 25kg", 120.0, 50).await;

        let new = NewSale {
            customer_name: None,
            payment_method: PaymentMethod::AirtelMoney,
            items: vec![line(&flour.id, 1, None)],
        };
        let (sale, _) = db.sales().create(&new, &user).await.unwrap();

        let parts: Vec<&str> = sale.receipt_number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "AB");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_everything_back() {
        let db = test_db().await;
        let user = seed_user(&db, "cashier").await;
        let flour = seed_product(&db, "Maize Flour 25kg", 120.0, 50).await;
        let soap = seed_product(&db, "Dish Soap", 25.0, 3).await;

        let new = NewSale {
            customer_name: None,
            payment_method: PaymentMethod::Cash,
            items: vec![line(&flour.id, 2, None), line(&soap.id, 5, None)],
        };
        let err = db.sales().create(&new, &user).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock for Dish Soap");

        // The first line's decrement must not survive the rollback.
        let flour_after = db.products().get_by_id(&flour.id).await.unwrap().unwrap();
        assert_eq!(flour_after.quantity, 50);
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert!(db.activity().recent_for_user(&user, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_and_empty_sale() {
        let db = test_db().await;
        let user = seed_user(&db, "cashier").await;

        let new = NewSale {
            customer_name: None,
            payment_method: PaymentMethod::Cash,
            items: vec![line("missing", 1, None)],
        };
        let err = db.sales().create(&new, &user).await.unwrap_err();
        assert_eq!(err.to_string(), "Product missing not found");

        let empty = NewSale {
            customer_name: None,
            payment_method: PaymentMethod::Cash,
            items: Vec::new(),
        };
        let err = db.sales().create(&empty, &user).await.unwrap_err();
        assert_eq!(err.to_string(), "Sale must include items");
    }

    #[tokio::test]
    async fn test_receipt_numbers_are_unique() {
        let db = test_db().await;
        let user = seed_user(&db, "cashier").await;
        let flour = seed_product(&db, "Maize Flour 25kg", 120.0, 50).await;

        let mut receipts = HashSet::new();
        for _ in 0..5 {
            let new = NewSale {
                customer_name: None,
                payment_method: PaymentMethod::Cash,
                items: vec![line(&flour.id, 1, None)],
            };
            let (sale, _) = db.sales().create(&new, &user).await.unwrap();
            receipts.insert(sale.receipt_number);
        }
        assert_eq!(receipts.len(), 5);
        assert_eq!(db.sales().count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let first = seed_user(&db, "first").await;
        let second = seed_user(&db, "second").await;
        let flour = seed_product(&db, "Maize Flour 25kg", 120.0, 50).await;
        let oil = seed_product(&db, "Cooking Oil 5L", 90.0, 30).await;

        let by_first = NewSale {
            customer_name: Some("Jane Banda".to_string()),
            payment_method: PaymentMethod::Cash,
            items: vec![line(&flour.id, 1, None)],
        };
        db.sales().create(&by_first, &first).await.unwrap();

        let by_second = NewSale {
            customer_name: None,
            payment_method: PaymentMethod::MtnMoney,
            items: vec![line(&oil.id, 2, None)],
        };
        db.sales().create(&by_second, &second).await.unwrap();

        let all = db.sales().list(&SaleFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let by_customer = SaleFilter {
            customer: Some("JANE BANDA".to_string()),
            ..Default::default()
        };
        let found = db.sales().list(&by_customer).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.customer_name.as_deref(), Some("Jane Banda"));

        let by_product = SaleFilter {
            product_id: Some(oil.id.clone()),
            ..Default::default()
        };
        let found = db.sales().list(&by_product).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1[0].product_name, "Cooking Oil 5L");

        let by_cashier = SaleFilter {
            created_by: Some(second.clone()),
            ..Default::default()
        };
        assert_eq!(db.sales().list(&by_cashier).await.unwrap().len(), 1);

        let today = SaleFilter {
            start_date: Some(time::today_cat()),
            end_date: Some(time::today_cat()),
            ..Default::default()
        };
        assert_eq!(db.sales().list(&today).await.unwrap().len(), 2);

        let before_today = SaleFilter {
            end_date: Some(time::today_cat() - chrono::Duration::days(1)),
            ..Default::default()
        };
        assert!(db.sales().list(&before_today).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sales_survive_user_deletion() {
        let db = test_db().await;
        let user = seed_user(&db, "leaver").await;
        let flour = seed_product(&db, "Maize Flour 25kg", 120.0, 50).await;

        let new = NewSale {
            customer_name: None,
            payment_method: PaymentMethod::Cash,
            items: vec![line(&flour.id, 1, None)],
        };
        db.sales().create(&new, &user).await.unwrap();
        db.users().delete(&user).await.unwrap();

        let all = db.sales().list(&SaleFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].0.created_by.is_none());
    }

    #[tokio::test]
    async fn test_lines_keep_name_snapshot_after_product_deletion() {
        let db = test_db().await;
        let user = seed_user(&db, "cashier").await;
        let flour = seed_product(&db, "Maize Flour 25kg", 120.0, 50).await;

        let new = NewSale {
            customer_name: None,
            payment_method: PaymentMethod::Cash,
            items: vec![line(&flour.id, 1, None)],
        };
        let (sale, _) = db.sales().create(&new, &user).await.unwrap();
        db.products().delete(&flour.id, &user).await.unwrap();

        let items = db.sales().items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].product_id.is_none());
        assert_eq!(items[0].product_name, "Maize Flour 25kg");
    }
}
