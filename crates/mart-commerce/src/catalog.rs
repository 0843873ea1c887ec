//! Catalog queries: categories, products, price and stock resolution.
//!
//! The workflows never mutate catalog metadata; the only write here is
//! the stock adjustment used by order placement and restocking.

use mart_core::{CategoryId, CustomerId, Money, ProductId, SellerId};
use mart_db::{Db, DbError};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::error::CommerceError;

/// A catalog category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A product row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: i64,
    pub category_id: Option<CategoryId>,
    pub seller_id: Option<SellerId>,
    pub warranty_months: i64,
}

impl Product {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, CommerceError> {
        Ok(Self {
            id: ProductId::new(row.try_get("product_id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_paise(row.try_get("price")?),
            stock: row.try_get("stock")?,
            category_id: row.try_get::<Option<i64>, _>("category_id")?.map(CategoryId::new),
            seller_id: row.try_get::<Option<i64>, _>("seller_id")?.map(SellerId::new),
            warranty_months: row.try_get("warranty_months")?,
        })
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Load a product or fail with `ProductNotFound`.
pub(crate) async fn fetch_product_in(
    conn: &mut SqliteConnection,
    product: ProductId,
) -> Result<Product, CommerceError> {
    let row = sqlx::query("SELECT * FROM products WHERE product_id = ?")
        .bind(product.get())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CommerceError::ProductNotFound(product))?;
    Product::from_row(&row)
}

/// Adjust a product's stock by a signed delta.
pub(crate) async fn adjust_stock_in(
    conn: &mut SqliteConnection,
    product: ProductId,
    delta: i64,
) -> Result<(), CommerceError> {
    let result = sqlx::query("UPDATE products SET stock = stock + ? WHERE product_id = ?")
        .bind(delta)
        .bind(product.get())
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CommerceError::ProductNotFound(product));
    }
    Ok(())
}

/// Read-side catalog.
#[derive(Clone)]
pub struct Catalog {
    db: Db,
}

impl Catalog {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// All categories, alphabetical.
    pub async fn categories(&self) -> Result<Vec<Category>, CommerceError> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT category_id, name FROM categories ORDER BY name")
                .fetch_all(self.db.pool())
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| Category { id: CategoryId::new(id), name })
            .collect())
    }

    /// Products in a category, alphabetical.
    pub async fn by_category(&self, category: CategoryId) -> Result<Vec<Product>, CommerceError> {
        let rows = sqlx::query("SELECT * FROM products WHERE category_id = ? ORDER BY name")
            .bind(category.get())
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(Product::from_row).collect()
    }

    /// Case-insensitive name search.
    pub async fn search(&self, term: &str) -> Result<Vec<Product>, CommerceError> {
        let rows = sqlx::query("SELECT * FROM products WHERE name LIKE ? ORDER BY name")
            .bind(format!("%{term}%"))
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(Product::from_row).collect()
    }

    /// One product's detail.
    pub async fn product(&self, product: ProductId) -> Result<Product, CommerceError> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        fetch_product_in(&mut conn, product).await
    }

    /// Products a customer has ordered and could review.
    pub async fn purchased_by(&self, customer: CustomerId) -> Result<Vec<Product>, CommerceError> {
        let rows = sqlx::query(
            "SELECT DISTINCT p.* FROM products p
             JOIN order_items oi ON oi.product_id = p.product_id
             JOIN orders o ON o.order_id = oi.order_id
             WHERE o.customer_id = ? AND o.status != 'Cancelled'
             ORDER BY p.name",
        )
        .bind(customer.get())
        .fetch_all(self.db.pool())
        .await?;
        rows.iter().map(Product::from_row).collect()
    }
}
