//! # Seed Data Generator
//!
//! Populates the database with demo products and customers for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed into the default dev database
//! cargo run -p fiado-db --bin seed
//!
//! # Specify database path
//! cargo run -p fiado-db --bin seed -- --db ./data/fiado.db
//!
//! # Also run a demo credit flow (sale on credit + partial payment)
//! cargo run -p fiado-db --bin seed -- --demo
//! ```

use std::env;

use chrono::Utc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use fiado_core::{Customer, NewSaleLine, PaymentMethod, Product};
use fiado_db::{next_receipt_number, Database, DbConfig};

/// Demo catalog: (name, purchase_cents, sale_cents, stock, reorder_level)
const PRODUCTS: &[(&str, i64, i64, i64, i64)] = &[
    ("Rice 1kg", 900, 1500, 40, 10),
    ("Beans 500g", 600, 950, 35, 10),
    ("Sugar 1kg", 700, 1100, 30, 8),
    ("Salt 500g", 200, 400, 50, 10),
    ("Cooking Oil 1L", 1800, 2600, 24, 6),
    ("Flour 1kg", 650, 1000, 28, 8),
    ("Eggs Dozen", 1500, 2200, 20, 6),
    ("Whole Milk 1L", 1100, 1600, 18, 6),
    ("Coffee 250g", 2400, 3500, 15, 4),
    ("Pasta 500g", 500, 850, 32, 8),
    ("Canned Tuna", 900, 1400, 26, 6),
    ("Tomato Sauce", 450, 750, 30, 8),
    ("Soap Bar", 350, 600, 45, 12),
    ("Detergent 1kg", 1300, 1950, 22, 6),
    ("Toilet Paper 4pk", 1200, 1800, 25, 8),
    ("Soda 2L", 1000, 1550, 36, 10),
    ("Drinking Water 5L", 800, 1300, 20, 6),
    ("Bread Loaf", 600, 1000, 12, 4),
    ("Tortillas 1kg", 700, 1150, 16, 5),
    ("Chili Powder 100g", 400, 700, 18, 5),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Maria Lopez", "555-0101"),
    ("Jose Ramirez", "555-0102"),
    ("Ana Torres", "555-0103"),
    ("Luis Hernandez", "555-0104"),
    ("Carmen Diaz", "555-0105"),
    ("Pedro Alvarez", "555-0106"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./fiado_dev.db");
    let mut run_demo = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--demo" => {
                run_demo = true;
            }
            "--help" | "-h" => {
                println!("Fiado Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./fiado_dev.db)");
                println!("      --demo         Also run a demo credit sale + partial payment");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Fiado Seed Data Generator");
    println!("=========================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("Database already has {} products", existing);
        println!("Skipping seed to avoid duplicates.");
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    for (name, purchase, sale, stock, reorder) in PRODUCTS {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            purchase_price_cents: *purchase,
            sale_price_cents: *sale,
            stock: *stock,
            reorder_level: *reorder,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
    }
    println!("Seeded {} products", PRODUCTS.len());

    for (name, phone) in CUSTOMERS {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: Some(phone.to_string()),
            email: None,
            address: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.customers().insert(&customer).await?;
    }
    println!("Seeded {} customers", CUSTOMERS.len());

    if run_demo {
        run_demo_credit_flow(&db).await?;
    }

    println!();
    println!("Seed complete!");

    Ok(())
}

/// Sells two items on credit to the first customer, then registers a
/// partial payment, leaving a pending balance on the dashboard.
async fn run_demo_credit_flow(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let customer = db
        .customers()
        .list_active(1)
        .await?
        .into_iter()
        .next()
        .ok_or("no customers seeded")?;
    let products = db.products().list_active(2).await?;

    let lines: Vec<NewSaleLine> = products
        .iter()
        .map(|p| NewSaleLine {
            product_id: p.id.clone(),
            quantity: 2,
            unit_price_cents: p.sale_price_cents,
        })
        .collect();

    let sale = db
        .sales()
        .create_sale(Some(&customer.id), &lines, Some("demo credit sale"))
        .await?;
    println!(
        "Demo: sold {} on credit to {}",
        sale.total(),
        customer.name
    );

    let receipt = next_receipt_number(db.pool()).await?;
    let half = sale.total_cents / 2;
    db.accounts()
        .pay(&customer.id, half, PaymentMethod::Cash, Some("demo abono"), &receipt)
        .await?;

    let balance = db
        .accounts()
        .balance_of(&customer.id)
        .await?
        .ok_or("account missing after demo charge")?;
    println!(
        "Demo: {} paid {} ({}), still owes {}",
        customer.name,
        fiado_core::Money::from_cents(half),
        receipt,
        fiado_core::Money::from_cents(balance.pending_balance_cents)
    );

    Ok(())
}
