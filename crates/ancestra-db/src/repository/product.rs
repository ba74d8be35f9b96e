//! # Product Repository
//!
//! Inventory storage: CRUD, low-stock queries, unique code generation and
//! the CSV import upsert.
//!
//! ## Import Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CSV Import (one transaction)                       │
//! │                                                                         │
//! │  Parsed rows (ancestra-core csv)                                       │
//! │       │                                                                 │
//! │       ▼  per row                                                        │
//! │  id column present? ──► match by id, or error + skip the row           │
//! │  else code present? ──► match by code (case-insensitive)               │
//! │  else name present? ──► match by name (case-insensitive)               │
//! │       │                                                                 │
//! │       ├── matched   → apply provided fields, count as updated          │
//! │       └── unmatched → create (name/category/price/quantity required)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  created or updated > 0 ? commit + audit entry : roll back             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Negative numbers are reported per field: on updates the offending field
//! keeps its old value while the rest of the row still applies; on creates
//! the whole row is skipped.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::activity::insert_activity;
use ancestra_core::csv::RawRow;
use ancestra_core::{numbering, CoreError, ImportReport, NewProduct, Product, ProductUpdate};

const PRODUCT_COLUMNS: &str =
    "id, name, product_code, category, price, quantity, reorder_level, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Full catalog ordered by name; also the export order.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Case-insensitive name lookup, used for duplicate detection.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE lower(name) = lower(?1)"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a prebuilt product without an audit entry. Used by seeding;
    /// API mutations go through [`create`](Self::create).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        let mut conn = self.pool.acquire().await?;
        insert_product(&mut conn, product).await
    }

    /// Creates a product: rejects duplicate names, fills in a generated
    /// `PROD-XXXX` code when none is supplied, and records the audit entry
    /// in the same transaction.
    pub async fn create(&self, new: &NewProduct, actor: &str) -> DbResult<Product> {
        if self.find_by_name(&new.name).await?.is_some() {
            return Err(CoreError::DuplicateProduct.into());
        }

        let mut tx = self.pool.begin().await?;

        let product_code = match new.product_code.as_deref().filter(|c| !c.is_empty()) {
            Some(code) => code.to_string(),
            None => generate_code_on(&mut tx).await?,
        };

        let product = Product {
            id: generate_product_id(),
            name: new.name.clone(),
            product_code: Some(product_code),
            category: new.category.clone(),
            price: new.price,
            quantity: new.quantity,
            reorder_level: new.reorder_level,
            created_at: Utc::now(),
            updated_at: None,
        };

        debug!(id = %product.id, name = %product.name, "Creating product");

        insert_product(&mut tx, &product).await?;
        insert_activity(
            &mut tx,
            actor,
            "product_created",
            &format!("Created product {}", product.name),
        )
        .await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Applies a partial update and records which fields changed.
    pub async fn update(
        &self,
        id: &str,
        changes: &ProductUpdate,
        actor: &str,
    ) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        let mut product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;

        let fields = changes.changed_fields();
        if !fields.is_empty() {
            if let Some(name) = &changes.name {
                product.name = name.clone();
            }
            if let Some(code) = &changes.product_code {
                product.product_code = Some(code.clone());
            }
            if let Some(category) = &changes.category {
                product.category = category.clone();
            }
            if let Some(price) = changes.price {
                product.price = price;
            }
            if let Some(quantity) = changes.quantity {
                product.quantity = quantity;
            }
            if let Some(level) = changes.reorder_level {
                product.reorder_level = level;
            }
            product.updated_at = Some(Utc::now());

            update_product(&mut tx, &product).await?;
        }

        let detail = if fields.is_empty() {
            "no changes".to_string()
        } else {
            fields.join(", ")
        };
        insert_activity(
            &mut tx,
            actor,
            "product_updated",
            &format!("Updated product {} ({})", product.name, detail),
        )
        .await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Deletes a product. Sale lines that reference it keep their snapshots;
    /// only their `product_id` is detached by the schema.
    pub async fn delete(&self, id: &str, actor: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let name: Option<String> = sqlx::query_scalar("SELECT name FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let name = name.ok_or_else(|| DbError::not_found("Product", id))?;

        debug!(id = %id, name = %name, "Deleting product");

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_activity(
            &mut tx,
            actor,
            "product_deleted",
            &format!("Deleted product {name}"),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Products at or below their reorder level, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE quantity <= reorder_level
             ORDER BY quantity ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Total number of products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Applies parsed CSV rows as one batch. Commits only when at least one
    /// row was created or updated; a batch of pure errors leaves the catalog
    /// untouched.
    pub async fn import(&self, rows: &[RawRow], actor: &str) -> DbResult<ImportReport> {
        let mut report = ImportReport::default();
        let mut tx = self.pool.begin().await?;

        for raw in rows {
            let row = raw.interpret(&mut report.errors);

            let mut product: Option<Product> = None;

            if let Some(id) = &row.id {
                product = sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
                ))
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
                if product.is_none() {
                    report.errors.push(format!(
                        "Row {}: Product with id={} not found; skipping.",
                        row.number, id
                    ));
                    report.skipped += 1;
                    continue;
                }
            } else if let Some(code) = &row.product_code {
                product = sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE lower(product_code) = lower(?1)"
                ))
                .bind(code)
                .fetch_optional(&mut *tx)
                .await?;
            } else if let Some(name) = &row.name {
                product = sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE lower(name) = lower(?1)"
                ))
                .bind(name)
                .fetch_optional(&mut *tx)
                .await?;
            }

            if let Some(mut product) = product {
                if let Some(name) = &row.name {
                    product.name = name.clone();
                }
                if let Some(code) = &row.product_code {
                    product.product_code = Some(code.clone());
                }
                if let Some(category) = &row.category {
                    product.category = category.clone();
                }
                if let Some(price) = row.price {
                    if price < 0.0 {
                        report
                            .errors
                            .push(format!("Row {}: price must be positive.", row.number));
                    } else {
                        product.price = price;
                    }
                }
                if let Some(quantity) = row.quantity {
                    if quantity < 0 {
                        report
                            .errors
                            .push(format!("Row {}: quantity must be positive.", row.number));
                    } else {
                        product.quantity = quantity;
                    }
                }
                if let Some(level) = row.reorder_level {
                    if level < 0 {
                        report
                            .errors
                            .push(format!("Row {}: reorder_level must be positive.", row.number));
                    } else {
                        product.reorder_level = level;
                    }
                }
                product.updated_at = Some(Utc::now());

                update_product(&mut tx, &product).await?;
                report.updated += 1;
                continue;
            }

            // Creating a new product requires the mandatory fields.
            let Some(name) = row.name.clone() else {
                report.errors.push(format!(
                    "Row {}: name is required to create a new product.",
                    row.number
                ));
                report.skipped += 1;
                continue;
            };
            let Some(category) = row.category.clone() else {
                report.errors.push(format!(
                    "Row {}: category is required to create a new product.",
                    row.number
                ));
                report.skipped += 1;
                continue;
            };
            let Some(price) = row.price else {
                report.errors.push(format!(
                    "Row {}: price is required to create a new product.",
                    row.number
                ));
                report.skipped += 1;
                continue;
            };
            if price < 0.0 {
                report
                    .errors
                    .push(format!("Row {}: price must be positive.", row.number));
                report.skipped += 1;
                continue;
            }
            let Some(quantity) = row.quantity else {
                report.errors.push(format!(
                    "Row {}: quantity is required to create a new product.",
                    row.number
                ));
                report.skipped += 1;
                continue;
            };
            if quantity < 0 {
                report
                    .errors
                    .push(format!("Row {}: quantity must be positive.", row.number));
                report.skipped += 1;
                continue;
            }

            let product_code = match row.product_code.clone() {
                Some(code) => code,
                None => generate_code_on(&mut tx).await?,
            };

            let product = Product {
                id: generate_product_id(),
                name,
                product_code: Some(product_code),
                category,
                price,
                quantity,
                reorder_level: row.reorder_level.unwrap_or(0),
                created_at: Utc::now(),
                updated_at: None,
            };
            insert_product(&mut tx, &product).await?;
            report.created += 1;
        }

        if report.has_changes() {
            insert_activity(
                &mut tx,
                actor,
                "product_import",
                &format!(
                    "Imported products: {} created, {} updated, {} skipped",
                    report.created, report.updated, report.skipped
                ),
            )
            .await?;
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }

        Ok(report)
    }
}

async fn insert_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO products (id, name, product_code, category, price, quantity, reorder_level, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.product_code)
    .bind(&product.category)
    .bind(product.price)
    .bind(product.quantity)
    .bind(product.reorder_level)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn update_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        "UPDATE products
         SET name = ?2, product_code = ?3, category = ?4, price = ?5,
             quantity = ?6, reorder_level = ?7, updated_at = ?8
         WHERE id = ?1",
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.product_code)
    .bind(&product.category)
    .bind(product.price)
    .bind(product.quantity)
    .bind(product.reorder_level)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Finds an unused `PROD-XXXX` code; falls back to a timestamp-derived code
/// if random generation keeps colliding.
async fn generate_code_on(conn: &mut SqliteConnection) -> DbResult<String> {
    for _ in 0..100 {
        let candidate = numbering::product_code_candidate();
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE product_code = ?1")
            .bind(&candidate)
            .fetch_optional(&mut *conn)
            .await?;
        if exists.is_none() {
            return Ok(candidate);
        }
    }
    Ok(numbering::product_code_fallback(Utc::now().timestamp_millis()))
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use ancestra_core::csv::parse_import;
    use ancestra_core::Role;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_actor(db: &Database) -> String {
        db.users()
            .create("owner", "Business Owner", Role::Owner, "hash")
            .await
            .unwrap()
            .id
    }

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            product_code: None,
            category: "Food".to_string(),
            price: 120.0,
            quantity: 50,
            reorder_level: 10,
        }
    }

    #[tokio::test]
    async fn test_create_generates_code() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;

        let product = db
            .products()
            .create(&new_product("Maize Flour 25kg"), &actor)
            .await
            .unwrap();

        let code = product.product_code.unwrap();
        assert!(code.starts_with("PROD-"));
        assert_eq!(code.len(), "PROD-".len() + 4);

        let entries = db.activity().recent_for_user(&actor, 5).await.unwrap();
        assert_eq!(entries[0].description, "Created product Maize Flour 25kg");
    }

    #[tokio::test]
    async fn test_create_duplicate_name_case_insensitive() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;
        db.products()
            .create(&new_product("Dish Soap"), &actor)
            .await
            .unwrap();

        let err = db
            .products()
            .create(&new_product("DISH SOAP"), &actor)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Product already exists");
    }

    #[tokio::test]
    async fn test_update_audit_lists_sorted_fields() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;
        let product = db
            .products()
            .create(&new_product("Cooking Oil 5L"), &actor)
            .await
            .unwrap();

        let changes = ProductUpdate {
            quantity: Some(25),
            price: Some(95.0),
            ..Default::default()
        };
        let updated = db
            .products()
            .update(&product.id, &changes, &actor)
            .await
            .unwrap();

        assert_eq!(updated.price, 95.0);
        assert_eq!(updated.quantity, 25);
        assert!(updated.updated_at.is_some());

        let entries = db.activity().recent_for_user(&actor, 5).await.unwrap();
        assert_eq!(
            entries[0].description,
            "Updated product Cooking Oil 5L (price, quantity)"
        );
    }

    #[tokio::test]
    async fn test_empty_update_logs_no_changes() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;
        let product = db
            .products()
            .create(&new_product("Sugar 1kg"), &actor)
            .await
            .unwrap();

        let updated = db
            .products()
            .update(&product.id, &ProductUpdate::default(), &actor)
            .await
            .unwrap();
        assert!(updated.updated_at.is_none());

        let entries = db.activity().recent_for_user(&actor, 5).await.unwrap();
        assert_eq!(entries[0].description, "Updated product Sugar 1kg (no changes)");
    }

    #[tokio::test]
    async fn test_delete_product() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;
        let product = db
            .products()
            .create(&new_product("Dish Soap"), &actor)
            .await
            .unwrap();

        db.products().delete(&product.id, &actor).await.unwrap();
        assert_eq!(db.products().count().await.unwrap(), 0);

        let err = db.products().delete(&product.id, &actor).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_low_stock_ordering() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;
        for (name, quantity, reorder) in [("A", 5, 10), ("B", 2, 10), ("C", 50, 10)] {
            let mut p = new_product(name);
            p.quantity = quantity;
            p.reorder_level = reorder;
            db.products().create(&p, &actor).await.unwrap();
        }

        let low: Vec<String> = db
            .products()
            .low_stock()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(low, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn test_import_create_update_and_skip() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;
        db.products()
            .create(&new_product("Maize Flour 25kg"), &actor)
            .await
            .unwrap();

        let csv = "name,category,price,quantity\n\
                   Maize Flour 25kg,Food,130,60\n\
                   Rice 10kg,Food,150,40\n\
                   Mystery,,9,1\n";
        let rows = parse_import(csv).unwrap();
        let report = db.products().import(&rows, &actor).await.unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            report.errors,
            vec!["Row 4: category is required to create a new product."]
        );

        let flour = db.products().find_by_name("maize flour 25kg").await.unwrap().unwrap();
        assert_eq!(flour.price, 130.0);
        assert_eq!(flour.quantity, 60);
        assert_eq!(db.products().count().await.unwrap(), 2);

        let entries = db.activity().recent_for_user(&actor, 1).await.unwrap();
        assert_eq!(
            entries[0].description,
            "Imported products: 1 created, 1 updated, 1 skipped"
        );
    }

    #[tokio::test]
    async fn test_import_unknown_id_skips_row() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;

        let rows = parse_import("id,name,price\nmissing-id,Tea,5\n").unwrap();
        let report = db.products().import(&rows, &actor).await.unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            report.errors,
            vec!["Row 2: Product with id=missing-id not found; skipping."]
        );
    }

    #[tokio::test]
    async fn test_import_without_changes_rolls_back() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;

        let rows = parse_import("name,price\nOrphan,12\n").unwrap();
        let report = db.products().import(&rows, &actor).await.unwrap();

        // The only row is missing category and quantity, so nothing commits.
        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(db.products().count().await.unwrap(), 0);
        assert!(db.activity().recent_for_user(&actor, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_negative_update_keeps_old_value() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;
        db.products()
            .create(&new_product("Dish Soap"), &actor)
            .await
            .unwrap();

        let rows = parse_import("name,price,quantity\nDish Soap,-4,70\n").unwrap();
        let report = db.products().import(&rows, &actor).await.unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.errors, vec!["Row 2: price must be positive."]);

        let soap = db.products().find_by_name("Dish Soap").await.unwrap().unwrap();
        assert_eq!(soap.price, 120.0);
        assert_eq!(soap.quantity, 70);
    }

    #[tokio::test]
    async fn test_import_matches_by_code_before_name() {
        let db = test_db().await;
        let actor = seed_actor(&db).await;
        let mut p = new_product("Candles");
        p.product_code = Some("PROD-CNDL".to_string());
        db.products().create(&p, &actor).await.unwrap();

        let rows = parse_import("code,name,quantity\nprod-cndl,Candles Large,99\n").unwrap();
        let report = db.products().import(&rows, &actor).await.unwrap();

        assert_eq!(report.updated, 1);
        let renamed = db.products().find_by_name("Candles Large").await.unwrap();
        assert!(renamed.is_some());
        assert_eq!(renamed.unwrap().quantity, 99);
    }
}
