//! Invoices with warranty windows.

use chrono::{DateTime, Months, Utc};
use mart_core::{CustomerId, InvoiceId, Money, OrderId, PaymentId};
use mart_db::{decode_ts, encode_ts, Db};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::error::CommerceError;

/// The invoice row paired with an order and its payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub amount: Money,
    pub invoice_date: DateTime<Utc>,
    pub warranty_start: DateTime<Utc>,
    pub warranty_end: DateTime<Utc>,
}

impl Invoice {
    fn from_row(row: &SqliteRow) -> Result<Self, CommerceError> {
        let date_raw: String = row.try_get("invoice_date")?;
        let start_raw: String = row.try_get("warranty_start")?;
        let end_raw: String = row.try_get("warranty_end")?;
        Ok(Self {
            id: InvoiceId::new(row.try_get("invoice_id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            payment_id: PaymentId::new(row.try_get("payment_id")?),
            amount: Money::from_paise(row.try_get("amount")?),
            invoice_date: decode_ts("invoice_date", &date_raw)?,
            warranty_start: decode_ts("warranty_start", &start_raw)?,
            warranty_end: decode_ts("warranty_end", &end_raw)?,
        })
    }
}

/// Write the invoice for a freshly placed order.
///
/// The warranty window starts at the invoice date and runs for the
/// maximum warranty months among the ordered products; zero months
/// collapses the window to a point.
pub(crate) async fn create_in(
    conn: &mut SqliteConnection,
    order: OrderId,
    payment: PaymentId,
    amount: Money,
    warranty_months: i64,
    now: DateTime<Utc>,
) -> Result<(), CommerceError> {
    let warranty_end = now
        .checked_add_months(Months::new(warranty_months.max(0) as u32))
        .unwrap_or(now);

    sqlx::query(
        "INSERT INTO invoices (order_id, payment_id, amount, invoice_date, warranty_start, warranty_end)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(order.get())
    .bind(payment.get())
    .bind(amount.paise())
    .bind(encode_ts(now))
    .bind(encode_ts(now))
    .bind(encode_ts(warranty_end))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Invoice reads.
#[derive(Clone)]
pub struct Invoices {
    db: Db,
}

impl Invoices {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// The invoice for a customer's order.
    pub async fn for_order(
        &self,
        order: OrderId,
        customer: CustomerId,
    ) -> Result<Invoice, CommerceError> {
        let row = sqlx::query(
            "SELECT i.* FROM invoices i
             JOIN orders o ON o.order_id = i.order_id
             WHERE i.order_id = ? AND o.customer_id = ?",
        )
        .bind(order.get())
        .bind(customer.get())
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(CommerceError::OrderNotFound(order))?;
        Invoice::from_row(&row)
    }
}
