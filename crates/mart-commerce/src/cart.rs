//! Per-customer shopping cart.
//!
//! One cart per customer, one line per product. Adding an already
//! carted product merges quantities; updating a quantity to zero or
//! below removes the line.

use chrono::Utc;
use mart_core::{CartId, CartItemId, CustomerId, Money, ProductId};
use mart_db::{encode_ts, Db, DbError};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::catalog::fetch_product_in;
use crate::error::CommerceError;

/// One cart line joined with its product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl CartLine {
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// Resolve the customer's cart id, creating the cart on first use.
pub(crate) async fn get_or_create_cart_in(
    conn: &mut SqliteConnection,
    customer: CustomerId,
) -> Result<CartId, CommerceError> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT cart_id FROM carts WHERE customer_id = ?")
        .bind(customer.get())
        .fetch_optional(&mut *conn)
        .await?;
    if let Some((id,)) = existing {
        return Ok(CartId::new(id));
    }

    let result = sqlx::query("INSERT INTO carts (customer_id, created_at) VALUES (?, ?)")
        .bind(customer.get())
        .bind(encode_ts(Utc::now()))
        .execute(&mut *conn)
        .await?;
    Ok(CartId::new(result.last_insert_rowid()))
}

/// The customer's cart lines joined with live product data.
pub(crate) async fn lines_in(
    conn: &mut SqliteConnection,
    customer: CustomerId,
) -> Result<Vec<CartLine>, CommerceError> {
    let rows: Vec<(i64, i64, String, i64, i64)> = sqlx::query_as(
        "SELECT ci.cart_item_id, ci.product_id, p.name, ci.quantity, p.price
         FROM cart_items ci
         JOIN carts c ON c.cart_id = ci.cart_id
         JOIN products p ON p.product_id = ci.product_id
         WHERE c.customer_id = ?
         ORDER BY ci.cart_item_id",
    )
    .bind(customer.get())
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(item_id, product_id, product_name, quantity, price)| CartLine {
            item_id: CartItemId::new(item_id),
            product_id: ProductId::new(product_id),
            product_name,
            quantity,
            unit_price: Money::from_paise(price),
        })
        .collect())
}

/// Delete one product's line from the customer's cart.
pub(crate) async fn remove_line_in(
    conn: &mut SqliteConnection,
    customer: CustomerId,
    product: ProductId,
) -> Result<(), CommerceError> {
    sqlx::query(
        "DELETE FROM cart_items WHERE product_id = ?
         AND cart_id IN (SELECT cart_id FROM carts WHERE customer_id = ?)",
    )
    .bind(product.get())
    .bind(customer.get())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Cart operations.
#[derive(Clone)]
pub struct Carts {
    db: Db,
}

impl Carts {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Add a product, merging into an existing line.
    pub async fn add(
        &self,
        customer: CustomerId,
        product: ProductId,
        quantity: i64,
    ) -> Result<(), CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }

        let mut tx = self.db.begin().await?;
        fetch_product_in(&mut tx, product).await?;
        let cart = get_or_create_cart_in(&mut tx, customer).await?;

        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES (?, ?, ?)
             ON CONFLICT (cart_id, product_id)
             DO UPDATE SET quantity = quantity + excluded.quantity",
        )
        .bind(cart.get())
        .bind(product.get())
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }

    /// Set a line's quantity; zero or below removes the line.
    pub async fn update_quantity(
        &self,
        customer: CustomerId,
        product: ProductId,
        quantity: i64,
    ) -> Result<(), CommerceError> {
        let mut tx = self.db.begin().await?;
        if quantity <= 0 {
            remove_line_in(&mut tx, customer, product).await?;
        } else {
            sqlx::query(
                "UPDATE cart_items SET quantity = ? WHERE product_id = ?
                 AND cart_id IN (SELECT cart_id FROM carts WHERE customer_id = ?)",
            )
            .bind(quantity)
            .bind(product.get())
            .bind(customer.get())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }

    /// Remove a product's line.
    pub async fn remove(&self, customer: CustomerId, product: ProductId) -> Result<(), CommerceError> {
        let mut tx = self.db.begin().await?;
        remove_line_in(&mut tx, customer, product).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }

    /// The cart's lines with live prices.
    pub async fn view(&self, customer: CustomerId) -> Result<Vec<CartLine>, CommerceError> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        lines_in(&mut conn, customer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[tokio::test]
    async fn test_add_merges_same_product() {
        let db = testutil::store().await;
        let customer = testutil::signup(&db, "c@example.com").await;
        let product = testutil::add_product(&db, "Mug", 19_900, 50, 0).await;
        let carts = Carts::new(db);

        carts.add(customer, product, 2).await.unwrap();
        carts.add(customer, product, 3).await.unwrap();

        let lines = carts.view(customer).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].line_total(), Some(Money::from_paise(99_500)));
    }

    #[tokio::test]
    async fn test_add_rejects_bad_quantity_and_missing_product() {
        let db = testutil::store().await;
        let customer = testutil::signup(&db, "c@example.com").await;
        let carts = Carts::new(db);

        let err = carts.add(customer, ProductId::new(1), 0).await.unwrap_err();
        assert!(matches!(err, CommerceError::InvalidQuantity(0)));

        let err = carts.add(customer, ProductId::new(123), 1).await.unwrap_err();
        assert!(matches!(err, CommerceError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes() {
        let db = testutil::store().await;
        let customer = testutil::signup(&db, "c@example.com").await;
        let product = testutil::add_product(&db, "Mug", 19_900, 50, 0).await;
        let carts = Carts::new(db);

        carts.add(customer, product, 2).await.unwrap();
        carts.update_quantity(customer, product, 0).await.unwrap();
        assert!(carts.view(customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_carts_are_per_customer() {
        let db = testutil::store().await;
        let alice = testutil::signup(&db, "alice@example.com").await;
        let bob = testutil::signup(&db, "bob@example.com").await;
        let product = testutil::add_product(&db, "Mug", 19_900, 50, 0).await;
        let carts = Carts::new(db);

        carts.add(alice, product, 1).await.unwrap();
        assert_eq!(carts.view(alice).await.unwrap().len(), 1);
        assert!(carts.view(bob).await.unwrap().is_empty());
    }
}
