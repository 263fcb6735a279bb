//! # Seed Data Generator
//!
//! Populates the database with a demo shop for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p hamu-db --bin seed
//!
//! # Specify database path
//! cargo run -p hamu-db --bin seed -- --db ./data/hamu.db
//! ```
//!
//! ## Generated Data
//! - One shop ("Hamu Waters Demo") with a free-refill interval of 10
//! - Stock items (bottles per type, caps, labels, bundles) with opening
//!   ledger entries
//! - Refill and bottled packages
//! - A handful of registered customers

use chrono::Utc;
use std::env;
use uuid::Uuid;

use hamu_core::{
    Customer, Package, SaleType, Shop, StockItem, StockItemType, StockLogEntry,
};
use hamu_db::{Database, DbConfig};

const STOCK_ITEMS: &[(&str, StockItemType, i64, i64, i64)] = &[
    // (name, type, opening level, threshold, reorder point)
    ("18L hard bottle", StockItemType::Bottle, 120, 20, 40),
    ("20L soft bottle", StockItemType::Bottle, 80, 15, 30),
    ("Bottle caps", StockItemType::Cap, 2000, 200, 500),
    ("Brand labels", StockItemType::Label, 2000, 200, 500),
    ("500ml bundle", StockItemType::Bundle, 60, 10, 20),
    ("1L bundle", StockItemType::Bundle, 40, 10, 20),
];

const PACKAGES: &[(&str, Option<&str>, i64, SaleType)] = &[
    // (water amount label, bottle type, price cents, sale type)
    ("18", Some("hard"), 25000, SaleType::Sale),
    ("20", Some("soft"), 20000, SaleType::Sale),
    ("20", None, 5000, SaleType::Refill),
    ("10", None, 3000, SaleType::Refill),
    ("500ml", None, 2000, SaleType::Sale),
];

const CUSTOMERS: &[(&str, &str, Option<&str>, Option<&str>)] = &[
    ("Allan Thome", "0712345678", Some("Greenview"), Some("B12")),
    ("Mary Wanjiru", "0723456789", Some("Greenview"), Some("A03")),
    ("Peter Otieno", "0734567890", None, None),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./hamu_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Hamu POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./hamu_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Hamu POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let shop_id = Uuid::new_v4().to_string();
    db.shops()
        .insert(&Shop {
            id: shop_id.clone(),
            shop_name: "Hamu Waters Demo".to_string(),
            free_refill_interval: 10,
            created_at: Utc::now(),
        })
        .await?;
    println!("✓ Shop created: {}", shop_id);

    // Stock items first, then their opening ledger entries in one
    // transaction (append_log is the only write path for stock_logs)
    let mut item_ids = Vec::with_capacity(STOCK_ITEMS.len());
    for (name, item_type, opening, threshold, reorder_point) in STOCK_ITEMS {
        let item = StockItem {
            id: Uuid::new_v4().to_string(),
            shop_id: shop_id.clone(),
            name: name.to_string(),
            item_type: *item_type,
            threshold: *threshold,
            reorder_point: *reorder_point,
        };
        db.stock().insert_item(&item).await?;
        item_ids.push((item.id, *opening));
    }

    let mut tx = db.pool().begin().await?;
    for (item_id, opening) in &item_ids {
        db.stock()
            .append_log(
                &mut tx,
                &StockLogEntry {
                    id: Uuid::new_v4().to_string(),
                    stock_item_id: item_id.clone(),
                    shop_id: shop_id.clone(),
                    quantity_change: *opening,
                    notes: "Opening stock".to_string(),
                    actor_name: "Seed".to_string(),
                    logged_at: Utc::now(),
                },
            )
            .await?;
    }
    tx.commit().await?;
    println!("✓ {} stock items with opening levels", STOCK_ITEMS.len());

    for (label, bottle_type, price_cents, sale_type) in PACKAGES {
        db.packages()
            .insert(&Package {
                id: Uuid::new_v4().to_string(),
                shop_id: shop_id.clone(),
                water_amount_label: label.to_string(),
                bottle_type: bottle_type.map(String::from),
                price_cents: *price_cents,
                sale_type: *sale_type,
                description: None,
            })
            .await?;
    }
    println!("✓ {} packages", PACKAGES.len());

    for (names, phone, apartment, room) in CUSTOMERS {
        db.customers()
            .insert(&Customer {
                id: Uuid::new_v4().to_string(),
                shop_id: shop_id.clone(),
                names: names.to_string(),
                phone_number: phone.to_string(),
                apartment_name: apartment.map(String::from),
                room_number: room.map(String::from),
                date_registered: Utc::now(),
                client_id: None,
            })
            .await?;
    }
    println!("✓ {} customers", CUSTOMERS.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
