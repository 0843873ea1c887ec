//! Shared fixtures for the unit tests.

use mart_core::{CustomerId, ProductId};
use mart_db::Db;

use crate::identity::{Identity, NewCustomer};

/// Fresh in-memory database with the schema applied.
pub async fn store() -> Db {
    Db::open_in_memory().await.expect("in-memory database")
}

/// Register a storefront customer.
pub async fn signup(db: &Db, email: &str) -> CustomerId {
    let identity = Identity::new(db.clone());
    identity
        .signup(NewCustomer {
            name: format!("Fixture {email}"),
            email: email.to_owned(),
            phone: None,
            secret: "shop secret".to_owned(),
        })
        .await
        .expect("fixture signup")
        .id
}

/// Insert a product directly; price in paise.
pub async fn add_product(
    db: &Db,
    name: &str,
    price: i64,
    stock: i64,
    warranty_months: i64,
) -> ProductId {
    let result = sqlx::query(
        "INSERT INTO products (name, description, price, stock, warranty_months)
         VALUES (?, NULL, ?, ?, ?)",
    )
    .bind(name)
    .bind(price)
    .bind(stock)
    .bind(warranty_months)
    .execute(db.pool())
    .await
    .expect("fixture product");
    ProductId::new(result.last_insert_rowid())
}
