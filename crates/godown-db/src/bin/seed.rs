//! # Seed Data Generator
//!
//! Populates a database with demo shops, categories and stocked products.
//!
//! ## Usage
//! ```bash
//! # Seed ./godown_dev.db
//! cargo run -p godown-db --bin seed
//!
//! # Specify database path and products per category
//! cargo run -p godown-db --bin seed -- --db ./data/godown.db --per-category 10
//! ```
//!
//! ## Generated Data
//! ```text
//! shop ──► categories (Tea, Spices, Grains, Household)
//!            └──► products  item code `{CAT}-{SHOP}{NNN}`
//!                   └──► inventory  godown 0-60, display 0-12
//! ```
//!
//! Some products get zero godown stock so the display fallback of the sale
//! waterfall has something to exercise.

use std::env;

use godown_db::{Database, DbConfig, NewProduct};
use tracing_subscriber::EnvFilter;

/// Demo shops, with a short code used in item codes.
const SHOPS: &[(&str, &str)] = &[
    ("Lakshmi General Stores", "L"),
    ("Green Valley Traders", "G"),
    ("Sunrise Wholesale Mart", "S"),
];

/// Categories with the vendor supplying them and a base price in cents.
const CATEGORIES: &[(&str, &str, &str, i64)] = &[
    ("Tea", "TEA", "Assam Leaf Co", 24_000),
    ("Spices", "SPC", "Malabar Exports", 8_500),
    ("Grains", "GRN", "Punjab Mills", 6_200),
    ("Household", "HSE", "CleanHome Ltd", 3_900),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut per_category: usize = 8;
    let mut db_path = String::from("./godown_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--per-category" | "-n" => {
                if i + 1 < args.len() {
                    per_category = args[i + 1].parse().unwrap_or(8);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Godown POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --per-category <N>  Products per category per shop (default: 8)");
                println!("  -d, --db <PATH>         Database file path (default: ./godown_dev.db)");
                println!("  -h, --help              Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Godown POS Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Products per category: {}", per_category);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shops")
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        println!("⚠ Database already has {} shops", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0usize;

    for (shop_idx, (shop_name, shop_code)) in SHOPS.iter().enumerate() {
        let shop = db.shops().insert_shop(shop_name).await?;
        println!("  Shop '{}' ({})", shop.name, shop.id);

        for (cat_idx, (cat_name, cat_code, vendor, base_price)) in CATEGORIES.iter().enumerate() {
            let category = db.shops().insert_category(&shop.id, cat_name).await?;

            for n in 0..per_category {
                let seed = shop_idx * 1000 + cat_idx * 100 + n;
                let product = generate_product(
                    &shop.id,
                    &category.id,
                    cat_code,
                    shop_code,
                    vendor,
                    *base_price,
                    n,
                    seed,
                );

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.item_code, e);
                    continue;
                }
                generated += 1;
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    println!();
    println!("Verifying...");
    let shops = db.shops().search("store", 10).await?;
    println!("  Search 'store': {} shops", shops.len());
    if let Some(shop) = shops.first() {
        let categories = db.shops().list_categories(&shop.id).await?;
        let inventory = db.products().list_inventory(&shop.id).await?;
        println!(
            "  '{}': {} categories, {} products",
            shop.name,
            categories.len(),
            inventory.len()
        );
        if let Some(missing) = categories
            .iter()
            .find(|c| !inventory.iter().any(|e| e.category_name.as_deref() == Some(c.name.as_str())))
        {
            println!("  ! category '{}' has no products", missing.name);
        }
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Builds one product with deterministic pseudo-random price and stock.
#[allow(clippy::too_many_arguments)]
fn generate_product(
    shop_id: &str,
    category_id: &str,
    cat_code: &str,
    shop_code: &str,
    vendor: &str,
    base_price: i64,
    index: usize,
    seed: usize,
) -> NewProduct {
    let item_code = format!("{}-{}{:03}", cat_code, shop_code, index + 1);

    // Base price plus up to 50% in 1.00 steps
    let selling_price_cents = base_price + ((seed * 37) % (base_price as usize / 200 + 1)) as i64 * 100;

    // Cost 55-75% of selling price
    let cost_pct = 55 + (seed % 21) as i64;
    let cost_price_cents = selling_price_cents * cost_pct / 100;

    // Every fifth product lives only on the display shelf
    let qty_godown = if seed % 5 == 0 { 0 } else { ((seed * 13) % 61) as i64 };
    let qty_display = ((seed * 7) % 13) as i64;

    NewProduct {
        shop_id: shop_id.to_string(),
        category_id: Some(category_id.to_string()),
        item_code,
        cost_price_cents,
        selling_price_cents,
        vendor_name: Some(vendor.to_string()),
        remark: (seed % 4 == 0).then(|| "Fast moving".to_string()),
        photo_url: None,
        qty_godown,
        qty_display,
    }
}
