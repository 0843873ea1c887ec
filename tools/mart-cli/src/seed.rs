//! Demo seed data: catalog, IFSC directory, and the merchant account.

use anyhow::Result;
use mart_bank::merchant::bootstrap_merchant;
use mart_db::Db;

use crate::output::Output;

const CATEGORIES: &[&str] = &["Electronics", "Home & Kitchen", "Outdoors"];

const SELLERS: &[(&str, &str)] = &[
    ("Deccan Traders", "27AAACD1234F1Z5"),
    ("Coromandel Supply Co", "33AABCC9876K2Z1"),
];

// (name, description, price in paise, stock, category, seller, warranty months)
const PRODUCTS: &[(&str, &str, i64, i64, usize, usize, i64)] = &[
    ("Solar Lantern", "Foldable camping lantern, 12h charge", 49_900, 40, 2, 0, 6),
    ("Steel Kettle 1.5L", "Induction-ready stovetop kettle", 89_900, 25, 1, 1, 24),
    ("Desk Lamp", "Warm LED with adjustable arm", 129_900, 15, 0, 0, 12),
    ("Bluetooth Speaker", "Splash-proof, 10W output", 199_900, 30, 0, 1, 12),
    ("Cast Iron Tawa", "Pre-seasoned 26cm", 64_900, 50, 1, 0, 0),
    ("Trekking Bottle 1L", "Double-wall insulated", 39_900, 60, 2, 1, 0),
];

const BRANCHES: &[(&str, &str, &str, &str)] = &[
    ("MART0000001", "Mart Bank", "MG Road", "Bengaluru"),
    ("MART0000002", "Mart Bank", "Connaught Place", "New Delhi"),
    ("MART0000003", "Mart Bank", "Park Street", "Kolkata"),
];

/// Load demo data and provision the merchant. Idempotent: existing
/// rows are left alone.
pub async fn seed(db: &Db, merchant_name: &str, output: &Output) -> Result<()> {
    let total = CATEGORIES.len() + SELLERS.len() + PRODUCTS.len() + BRANCHES.len() + 1;
    let pb = output.progress(total as u64, "Seeding demo data");

    for name in CATEGORIES {
        sqlx::query("INSERT OR IGNORE INTO categories (name) VALUES (?)")
            .bind(name)
            .execute(db.pool())
            .await?;
        pb.inc(1);
    }

    for (name, gstin) in SELLERS {
        sqlx::query("INSERT OR IGNORE INTO sellers (name, gstin) VALUES (?, ?)")
            .bind(name)
            .bind(gstin)
            .execute(db.pool())
            .await?;
        pb.inc(1);
    }

    for (name, description, price, stock, category, seller, warranty) in PRODUCTS {
        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT product_id FROM products WHERE name = ?")
                .bind(name)
                .fetch_optional(db.pool())
                .await?;
        if exists.is_none() {
            sqlx::query(
                "INSERT INTO products (name, description, price, stock, category_id, seller_id, warranty_months)
                 SELECT ?, ?, ?, ?,
                        (SELECT category_id FROM categories WHERE name = ?),
                        (SELECT seller_id FROM sellers WHERE name = ?),
                        ?",
            )
            .bind(name)
            .bind(description)
            .bind(price)
            .bind(stock)
            .bind(CATEGORIES[*category])
            .bind(SELLERS[*seller].0)
            .bind(warranty)
            .execute(db.pool())
            .await?;
        }
        pb.inc(1);
    }

    for (ifsc, bank, branch, city) in BRANCHES {
        sqlx::query(
            "INSERT OR IGNORE INTO ifsc_branches (ifsc_code, bank_name, branch, city)
             VALUES (?, ?, ?, ?)",
        )
        .bind(ifsc)
        .bind(bank)
        .bind(branch)
        .bind(city)
        .execute(db.pool())
        .await?;
        pb.inc(1);
    }

    let merchant = bootstrap_merchant(db, merchant_name).await?;
    pb.inc(1);
    pb.finish_and_clear();

    output.success(&format!(
        "Demo data loaded; merchant account {}",
        merchant.id
    ));
    Ok(())
}
