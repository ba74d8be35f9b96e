//! Seeds a development database with a demo owner account and sample data.
//!
//! Usage: `cargo run --bin seed -- [--db ./ancestra.db]`

use std::time::Instant;

use chrono::Utc;

use ancestra_core::{time, Expense, NewSale, PaymentMethod, Product, Role, SaleItemDraft};
use ancestra_db::repository::expense::generate_expense_id;
use ancestra_db::repository::product::generate_product_id;
use ancestra_db::{Database, DbConfig, DbResult};

#[tokio::main]
async fn main() {
    let mut db_path = String::from("./ancestra.db");

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" | "-d" => {
                if let Some(value) = args.next() {
                    db_path = value;
                }
            }
            "--help" | "-h" => {
                print_help();
                return;
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_help();
                std::process::exit(1);
            }
        }
    }

    println!("🌱 Seeding Ancestra database at {db_path}");
    let started = Instant::now();

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("✗ Failed to open database: {e}");
            std::process::exit(1);
        }
    };
    println!("✓ Connected to database");

    if let Err(e) = seed(&db).await {
        eprintln!("✗ Seeding failed: {e}");
        std::process::exit(1);
    }

    println!("✓ Done in {:.2?}", started.elapsed());
}

async fn seed(db: &Database) -> DbResult<()> {
    let owner = match db.users().get_by_username("owner").await? {
        Some(user) => {
            println!("⚠ Owner account already exists; keeping it.");
            user
        }
        None => {
            let hashed = hash_password("owner123");
            let user = db
                .users()
                .create("owner", "Business Owner", Role::Owner, &hashed)
                .await?;
            println!("✓ Created owner account (username: owner, password: owner123)");
            user
        }
    };

    db.settings().get_or_create().await?;
    println!("✓ Receipt settings initialized");

    if db.products().count().await? > 0 {
        println!("⚠ Database already has products. Skipping sample data.");
        return Ok(());
    }

    let products = [
        sample_product("Maize Flour 25kg", "PROD-MF25", "Food", 120.0, 50, 10),
        sample_product("Cooking Oil 5L", "PROD-CO5L", "Food", 90.0, 30, 5),
        sample_product("Dish Soap", "PROD-DS01", "Cleaning", 25.0, 80, 20),
    ];
    for product in &products {
        db.products().insert(product).await?;
    }
    println!("✓ Inserted {} products", products.len());

    let expenses = [
        sample_expense("Electricity Bill", "Utilities", 350.0),
        sample_expense("Supplier Payment", "Inventory", 500.0),
    ];
    for expense in &expenses {
        db.expenses().insert(expense).await?;
    }
    println!("✓ Inserted {} expenses", expenses.len());

    let demo = NewSale {
        customer_name: Some("Walk-in".to_string()),
        payment_method: PaymentMethod::Cash,
        items: vec![SaleItemDraft {
            product_id: products[0].id.clone(),
            quantity: 2,
            price_override: None,
        }],
    };
    let (sale, _) = db.sales().create(&demo, &owner.id).await?;
    println!("✓ Recorded demo sale {}", sale.receipt_number);

    Ok(())
}

fn sample_product(
    name: &str,
    code: &str,
    category: &str,
    price: f64,
    quantity: i64,
    reorder_level: i64,
) -> Product {
    Product {
        id: generate_product_id(),
        name: name.to_string(),
        product_code: Some(code.to_string()),
        category: category.to_string(),
        price,
        quantity,
        reorder_level,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn sample_expense(description: &str, category: &str, amount: f64) -> Expense {
    Expense {
        id: generate_expense_id(),
        description: description.to_string(),
        category: category.to_string(),
        amount,
        expense_date: time::today_cat(),
        receipt_path: None,
    }
}

fn hash_password(password: &str) -> String {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(password.as_bytes(), &salt) {
        Ok(hash) => hash.to_string(),
        Err(e) => {
            eprintln!("✗ Failed to hash password: {e}");
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!("Seeds an Ancestra database with a demo owner account and sample data.");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>    Database file (default: ./ancestra.db)");
    println!("  -h, --help         Show this help");
}
