//! Seed the product catalog with the starter lineup.
//!
//! Inserts are idempotent: SKUs that already exist are left untouched, so
//! the command is safe to re-run against a live store.

use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing::info;

use stablefront_api::db;
use stablefront_api::models::NewProduct;
use stablefront_core::ProductId;

/// Seed the starter catalog.
///
/// # Errors
///
/// Returns an error if `STABLEFRONT_DATABASE_URL` is unset, the database is
/// unreachable, or an insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STABLEFRONT_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| "STABLEFRONT_DATABASE_URL not set")?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for product in starter_catalog() {
        if db::products::insert(&pool, &product).await? {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    info!("  Products skipped (already exist): {skipped}");

    Ok(())
}

fn product(
    id: &str,
    name: &str,
    price: Decimal,
    category: &str,
    description: &str,
    featured: bool,
    inventory: i32,
) -> NewProduct {
    NewProduct {
        id: ProductId::new(id),
        name: name.to_owned(),
        price,
        image: format!("/images/products/{id}.jpg"),
        description: description.to_owned(),
        category: category.to_owned(),
        tags: vec!["streetwear".to_owned()],
        sizes: vec![
            "S".to_owned(),
            "M".to_owned(),
            "L".to_owned(),
            "XL".to_owned(),
        ],
        colors: vec!["black".to_owned(), "white".to_owned()],
        in_stock: inventory > 0,
        featured,
        inventory,
    }
}

fn starter_catalog() -> Vec<NewProduct> {
    vec![
        product(
            "hoodie-cipher",
            "Cipher Hoodie",
            Decimal::new(8900, 2),
            "hoodies",
            "Heavyweight fleece hoodie with embroidered chest mark.",
            true,
            40,
        ),
        product(
            "hoodie-ledger",
            "Ledger Zip Hoodie",
            Decimal::new(9800, 2),
            "hoodies",
            "Full-zip hoodie in brushed loopback cotton.",
            false,
            25,
        ),
        product(
            "tee-genesis",
            "Genesis Tee",
            Decimal::new(4200, 2),
            "tees",
            "Boxy-cut tee with front graphic print.",
            true,
            120,
        ),
        product(
            "tee-relay",
            "Relay Tee",
            Decimal::new(3800, 2),
            "tees",
            "Garment-dyed tee with tonal back print.",
            false,
            90,
        ),
        product(
            "cap-validator",
            "Validator Cap",
            Decimal::new(3500, 2),
            "accessories",
            "Six-panel cap with adjustable strap.",
            false,
            60,
        ),
        product(
            "jacket-mainnet",
            "Mainnet Coach Jacket",
            Decimal::new(12500, 2),
            "outerwear",
            "Water-resistant coach jacket with snap front.",
            true,
            15,
        ),
    ]
}
