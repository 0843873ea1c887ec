//! Product reviews, gated on a qualifying purchase.

use chrono::{DateTime, Utc};
use mart_core::{CustomerId, ProductId, ReviewId};
use mart_db::{decode_ts, encode_ts, Db};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::CommerceError;

/// A submitted review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub rating: i64,
    pub comment: Option<String>,
    pub review_date: DateTime<Utc>,
}

impl Review {
    fn from_row(row: &SqliteRow) -> Result<Self, CommerceError> {
        let date_raw: String = row.try_get("review_date")?;
        Ok(Self {
            id: ReviewId::new(row.try_get("review_id")?),
            customer_id: CustomerId::new(row.try_get("customer_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            rating: row.try_get("rating")?,
            comment: row.try_get("comment")?,
            review_date: decode_ts("review_date", &date_raw)?,
        })
    }
}

/// Review operations.
#[derive(Clone)]
pub struct Reviews {
    db: Db,
}

impl Reviews {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Whether the customer has a non-cancelled order containing the
    /// product. This is the purchase-verification predicate reviews
    /// are gated on.
    pub async fn has_purchased(
        &self,
        customer: CustomerId,
        product: ProductId,
    ) -> Result<bool, CommerceError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM order_items oi
             JOIN orders o ON o.order_id = oi.order_id
             WHERE o.customer_id = ? AND oi.product_id = ? AND o.status != 'Cancelled'",
        )
        .bind(customer.get())
        .bind(product.get())
        .fetch_one(self.db.pool())
        .await?;
        Ok(count > 0)
    }

    /// Submit a review. Ratings run 1 through 5.
    pub async fn submit(
        &self,
        customer: CustomerId,
        product: ProductId,
        rating: i64,
        comment: Option<String>,
    ) -> Result<Review, CommerceError> {
        if !(1..=5).contains(&rating) {
            return Err(CommerceError::InvalidRating(rating));
        }
        if !self.has_purchased(customer, product).await? {
            return Err(CommerceError::NotPurchased { customer, product });
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO reviews (customer_id, product_id, rating, comment, review_date)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(customer.get())
        .bind(product.get())
        .bind(rating)
        .bind(&comment)
        .bind(encode_ts(now))
        .execute(self.db.pool())
        .await?;

        Ok(Review {
            id: ReviewId::new(result.last_insert_rowid()),
            customer_id: customer,
            product_id: product,
            rating,
            comment,
            review_date: now,
        })
    }

    /// All reviews of a product, newest first.
    pub async fn list(&self, product: ProductId) -> Result<Vec<Review>, CommerceError> {
        let rows = sqlx::query("SELECT * FROM reviews WHERE product_id = ? ORDER BY review_id DESC")
            .bind(product.get())
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(Review::from_row).collect()
    }
}
