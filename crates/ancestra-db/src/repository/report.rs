//! # Report Repository
//!
//! Read-only aggregation across sales, expenses, products and users. The
//! dashboard summary is assembled here from a handful of SQL aggregates;
//! the only date handling is the Central Africa Time day windows.
//!
//! Sales windows compare `created_at` timestamps against CAT day starts;
//! expense windows compare the stored `expense_date` directly, since those
//! are plain dates entered by the user.

use chrono::{DateTime, Datelike, Duration, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::DbResult;
use ancestra_core::{
    time, BestSeller, EmployeeSalesPeriod, EmployeeSalesSummary, PeriodSummary, ProfitPoint,
    ReportSummary, UserSales,
};

#[derive(sqlx::FromRow)]
struct LowStockRow {
    name: String,
    quantity: i64,
}

#[derive(sqlx::FromRow)]
struct BestSellerRow {
    product_id: String,
    product_name: String,
    unit_price: f64,
    on_hand: i64,
    total_quantity: i64,
    total_revenue: f64,
}

#[derive(sqlx::FromRow)]
struct UserSalesRow {
    user_id: Option<String>,
    full_name: Option<String>,
    total_sales: f64,
    total_transactions: i64,
}

#[derive(sqlx::FromRow)]
struct StatRow {
    count: i64,
    total: f64,
}

/// Repository for reporting aggregates.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// The full dashboard aggregate.
    pub async fn summary(&self) -> DbResult<ReportSummary> {
        let total_sales: f64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(total_amount), 0.0) FROM sales")
                .fetch_one(&self.pool)
                .await?;
        let total_expenses: f64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0.0) FROM expenses")
                .fetch_one(&self.pool)
                .await?;
        let total_orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        let today = time::today_cat();
        let sales_today = self
            .sales_between(Some(time::cat_day_start(today)), None)
            .await?;

        let low_stock_rows = sqlx::query_as::<_, LowStockRow>(
            "SELECT name, quantity FROM products
             WHERE quantity <= reorder_level
             ORDER BY quantity ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        let low_stock = low_stock_rows
            .iter()
            .map(|row| format!("{} ({})", row.name, row.quantity))
            .collect();

        // Last seven CAT days, oldest first, today included.
        let mut sales_vs_expenses = Vec::with_capacity(7);
        for days_ago in (0..7i64).rev() {
            let day = today - Duration::days(days_ago);
            let (start, end) = time::cat_day_bounds(day);
            let sales = self.sales_between(Some(start), Some(end)).await?;
            let expenses: f64 = sqlx::query_scalar(
                "SELECT COALESCE(SUM(amount), 0.0) FROM expenses WHERE expense_date = ?1",
            )
            .bind(day)
            .fetch_one(&self.pool)
            .await?;
            sales_vs_expenses.push(ProfitPoint {
                period: day,
                sales,
                expenses,
                profit: sales - expenses,
            });
        }

        let mut period_summaries = Vec::with_capacity(3);
        for (label, days) in [("Daily", 1i64), ("Weekly", 7), ("Monthly", 30)] {
            let start = today - Duration::days(days - 1);
            let sales = self
                .sales_between(Some(time::cat_day_start(start)), None)
                .await?;
            let expenses: f64 = sqlx::query_scalar(
                "SELECT COALESCE(SUM(amount), 0.0) FROM expenses WHERE expense_date >= ?1",
            )
            .bind(start)
            .fetch_one(&self.pool)
            .await?;
            period_summaries.push(PeriodSummary {
                label: label.to_string(),
                sales,
                expenses,
                profit: sales - expenses,
            });
        }

        let best_sellers = self.best_sellers().await?;
        let sales_by_user = self.sales_by_user().await?;

        Ok(ReportSummary {
            total_sales,
            total_expenses,
            total_profit: total_sales - total_expenses,
            total_orders,
            sales_today,
            low_stock,
            sales_vs_expenses,
            period_summaries,
            best_sellers,
            sales_by_user,
        })
    }

    /// Top five products by units sold. Deleted products drop out because
    /// their sale lines are detached.
    pub async fn best_sellers(&self) -> DbResult<Vec<BestSeller>> {
        let rows = sqlx::query_as::<_, BestSellerRow>(
            "SELECT p.id AS product_id, p.name AS product_name, p.price AS unit_price,
                    p.quantity AS on_hand,
                    COALESCE(SUM(si.quantity), 0) AS total_quantity,
                    COALESCE(SUM(si.subtotal), 0.0) AS total_revenue
             FROM products p
             JOIN sale_items si ON si.product_id = p.id
             GROUP BY p.id
             ORDER BY total_quantity DESC, p.name ASC
             LIMIT 5",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| BestSeller {
                product_id: row.product_id,
                product_name: row.product_name,
                unit_price: row.unit_price,
                total_quantity: row.total_quantity,
                total_revenue: row.total_revenue,
                status: if row.on_hand > 0 {
                    "In stock".to_string()
                } else {
                    "Out of stock".to_string()
                },
            })
            .collect())
    }

    /// Sales grouped by the recording user. Sales whose user was deleted
    /// collapse into one "Deleted User" row.
    pub async fn sales_by_user(&self) -> DbResult<Vec<UserSales>> {
        let rows = sqlx::query_as::<_, UserSalesRow>(
            "SELECT s.created_by AS user_id, u.full_name AS full_name,
                    COALESCE(SUM(s.total_amount), 0.0) AS total_sales,
                    COUNT(s.id) AS total_transactions
             FROM sales s
             LEFT JOIN users u ON u.id = s.created_by
             GROUP BY s.created_by, u.full_name
             ORDER BY total_sales DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UserSales {
                user_id: row.user_id,
                user_name: row
                    .full_name
                    .clone()
                    .unwrap_or_else(|| "Deleted User".to_string()),
                total_sales: row.total_sales,
                total_transactions: row.total_transactions,
                is_deleted: row.full_name.is_none(),
            })
            .collect())
    }

    /// Per-employee sales figures for the employees screen: lifetime plus
    /// the last week, the current CAT calendar month, and the last 90 days.
    pub async fn employee_sales(&self, user_id: &str) -> DbResult<EmployeeSalesSummary> {
        let now = Utc::now();
        let today = time::today_cat();
        let month_start = time::cat_day_start(today.with_day(1).unwrap_or(today));

        let total = self.user_stats(user_id, None).await?;
        let week = self.user_stats(user_id, Some(now - Duration::days(7))).await?;
        let month = self.user_stats(user_id, Some(month_start)).await?;
        let three_months = self
            .user_stats(user_id, Some(now - Duration::days(90)))
            .await?;

        Ok(EmployeeSalesSummary {
            total_count: total.count,
            total_amount: total.total,
            week: EmployeeSalesPeriod {
                count: week.count,
                amount: week.total,
            },
            month: EmployeeSalesPeriod {
                count: month.count,
                amount: month.total,
            },
            three_months: EmployeeSalesPeriod {
                count: three_months.count,
                amount: three_months.total,
            },
        })
    }

    async fn sales_between(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DbResult<f64> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT COALESCE(SUM(total_amount), 0.0) FROM sales WHERE 1=1",
        );
        if let Some(start) = start {
            query.push(" AND created_at >= ");
            query.push_bind(start);
        }
        if let Some(end) = end {
            query.push(" AND created_at < ");
            query.push_bind(end);
        }

        let total: f64 = query.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn user_stats(&self, user_id: &str, since: Option<DateTime<Utc>>) -> DbResult<StatRow> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(id) AS count, COALESCE(SUM(total_amount), 0.0) AS total
             FROM sales WHERE created_by = ",
        );
        query.push_bind(user_id.to_string());
        if let Some(since) = since {
            query.push(" AND created_at >= ");
            query.push_bind(since);
        }

        let row = query.build_query_as::<StatRow>().fetch_one(&self.pool).await?;
        Ok(row)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::expense::generate_expense_id;
    use crate::repository::product::generate_product_id;
    use ancestra_core::{Expense, NewSale, PaymentMethod, Product, Role, SaleItemDraft};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_user(db: &Database, username: &str, full_name: &str) -> String {
        db.users()
            .create(username, full_name, Role::Cashier, "hash")
            .await
            .unwrap()
            .id
    }

    async fn seed_product(db: &Database, name: &str, price: f64, quantity: i64, reorder: i64) -> Product {
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            product_code: None,
            category: "Food".to_string(),
            price,
            quantity,
            reorder_level: reorder,
            created_at: Utc::now(),
            updated_at: None,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    async fn sell(db: &Database, user: &str, product: &Product, quantity: i64) {
        let new = NewSale {
            customer_name: None,
            payment_method: PaymentMethod::Cash,
            items: vec![SaleItemDraft {
                product_id: product.id.clone(),
                quantity,
                price_override: None,
            }],
        };
        db.sales().create(&new, user).await.unwrap();
    }

    #[tokio::test]
    async fn test_summary_on_empty_database() {
        let db = test_db().await;
        let summary = db.reports().summary().await.unwrap();

        assert_eq!(summary.total_sales, 0.0);
        assert_eq!(summary.total_expenses, 0.0);
        assert_eq!(summary.total_profit, 0.0);
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.sales_today, 0.0);
        assert!(summary.low_stock.is_empty());
        assert!(summary.best_sellers.is_empty());
        assert!(summary.sales_by_user.is_empty());
        assert_eq!(summary.sales_vs_expenses.len(), 7);
        assert!(summary.sales_vs_expenses.iter().all(|p| p.sales == 0.0));
        assert_eq!(summary.period_summaries.len(), 3);
    }

    #[tokio::test]
    async fn test_summary_totals_and_low_stock() {
        let db = test_db().await;
        let user = seed_user(&db, "cashier", "Test Cashier").await;
        let flour = seed_product(&db, "Maize Flour 25kg", 120.0, 50, 10).await;
        seed_product(&db, "Dish Soap", 25.0, 2, 10).await;

        sell(&db, &user, &flour, 2).await;
        let bill = Expense {
            id: generate_expense_id(),
            description: "Electricity Bill".to_string(),
            category: "Utilities".to_string(),
            amount: 90.0,
            expense_date: time::today_cat(),
            receipt_path: None,
        };
        db.expenses().insert(&bill).await.unwrap();

        let summary = db.reports().summary().await.unwrap();

        assert_eq!(summary.total_sales, 240.0);
        assert_eq!(summary.total_expenses, 90.0);
        assert_eq!(summary.total_profit, 150.0);
        assert_eq!(summary.total_orders, 1);
        assert_eq!(summary.sales_today, 240.0);
        assert_eq!(summary.low_stock, vec!["Dish Soap (2)"]);

        let today_point = summary.sales_vs_expenses.last().unwrap();
        assert_eq!(today_point.period, time::today_cat());
        assert_eq!(today_point.sales, 240.0);
        assert_eq!(today_point.expenses, 90.0);
        assert_eq!(today_point.profit, 150.0);
        assert!(summary.sales_vs_expenses[..6].iter().all(|p| p.sales == 0.0));

        let labels: Vec<&str> = summary
            .period_summaries
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Daily", "Weekly", "Monthly"]);
        assert!(summary.period_summaries.iter().all(|p| p.sales == 240.0));
        assert!(summary.period_summaries.iter().all(|p| p.profit == 150.0));
    }

    #[tokio::test]
    async fn test_best_sellers_order_and_stock_status() {
        let db = test_db().await;
        let user = seed_user(&db, "cashier", "Test Cashier").await;
        let flour = seed_product(&db, "Maize Flour 25kg", 120.0, 50, 5).await;
        let last_soap = seed_product(&db, "Dish Soap", 25.0, 1, 0).await;

        sell(&db, &user, &flour, 3).await;
        sell(&db, &user, &last_soap, 1).await;

        let best = db.reports().best_sellers().await.unwrap();
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].product_name, "Maize Flour 25kg");
        assert_eq!(best[0].total_quantity, 3);
        assert_eq!(best[0].total_revenue, 360.0);
        assert_eq!(best[0].status, "In stock");
        assert_eq!(best[1].product_name, "Dish Soap");
        assert_eq!(best[1].status, "Out of stock");
    }

    #[tokio::test]
    async fn test_sales_by_user_marks_deleted_users() {
        let db = test_db().await;
        let keeper = seed_user(&db, "keeper", "Keeps Selling").await;
        let leaver = seed_user(&db, "leaver", "Left The Shop").await;
        let flour = seed_product(&db, "Maize Flour 25kg", 120.0, 50, 5).await;

        sell(&db, &keeper, &flour, 3).await;
        sell(&db, &leaver, &flour, 1).await;
        db.users().delete(&leaver).await.unwrap();

        let rows = db.reports().sales_by_user().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_name, "Keeps Selling");
        assert_eq!(rows[0].total_sales, 360.0);
        assert!(!rows[0].is_deleted);
        assert_eq!(rows[1].user_name, "Deleted User");
        assert!(rows[1].is_deleted);
        assert!(rows[1].user_id.is_none());
        assert_eq!(rows[1].total_transactions, 1);
    }

    #[tokio::test]
    async fn test_employee_sales_windows_cover_today() {
        let db = test_db().await;
        let user = seed_user(&db, "cashier", "Test Cashier").await;
        let other = seed_user(&db, "other", "Someone Else").await;
        let flour = seed_product(&db, "Maize Flour 25kg", 120.0, 50, 5).await;

        sell(&db, &user, &flour, 1).await;
        sell(&db, &user, &flour, 2).await;
        sell(&db, &other, &flour, 5).await;

        let stats = db.reports().employee_sales(&user).await.unwrap();
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.total_amount, 360.0);
        // A sale made right now falls inside every window.
        assert_eq!(stats.week, EmployeeSalesPeriod { count: 2, amount: 360.0 });
        assert_eq!(stats.month, EmployeeSalesPeriod { count: 2, amount: 360.0 });
        assert_eq!(
            stats.three_months,
            EmployeeSalesPeriod { count: 2, amount: 360.0 }
        );
    }
}
