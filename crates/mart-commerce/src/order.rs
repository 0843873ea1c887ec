//! Order, order item, and payment records with their status machines.

use chrono::{DateTime, Utc};
use mart_core::{CustomerId, Money, OrderId, OrderItemId, PaymentId, ProductId};
use mart_db::{decode_ts, Db, DbError};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::fmt;

use crate::error::CommerceError;

/// Lifecycle status of an order.
///
/// `Shipped` and `OutForDelivery` are recognized so the cancellation
/// gate can refuse them, even though nothing in the current workflows
/// sets them automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Returned => "Returned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(OrderStatus::Pending),
            "Confirmed" => Some(OrderStatus::Confirmed),
            "Shipped" => Some(OrderStatus::Shipped),
            "Out for Delivery" => Some(OrderStatus::OutForDelivery),
            "Delivered" => Some(OrderStatus::Delivered),
            "Cancelled" => Some(OrderStatus::Cancelled),
            "Returned" => Some(OrderStatus::Returned),
            _ => None,
        }
    }

    /// Cancellation is pre-fulfillment only.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Returned
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the order is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    CashOnDelivery,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
            PaymentMethod::Online => "Online Payment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Cash on Delivery" => Some(PaymentMethod::CashOnDelivery),
            "Online Payment" => Some(PaymentMethod::Online),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement status of an order's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Refunded => "Refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(PaymentStatus::Pending),
            "Paid" => Some(PaymentStatus::Paid),
            "Refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An order row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total: Money,
}

impl Order {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, CommerceError> {
        let status_raw: String = row.try_get("status")?;
        let date_raw: String = row.try_get("order_date")?;
        Ok(Self {
            id: OrderId::new(row.try_get("order_id")?),
            customer_id: CustomerId::new(row.try_get("customer_id")?),
            order_date: decode_ts("order_date", &date_raw)?,
            status: OrderStatus::parse(&status_raw).ok_or(DbError::Column {
                column: "status",
                value: status_raw,
            })?,
            total: Money::from_paise(row.try_get("total_amount")?),
        })
    }
}

/// One line of an order, with the unit price snapshotted at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderItem {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, CommerceError> {
        Ok(Self {
            id: OrderItemId::new(row.try_get("order_item_id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: row.try_get("quantity")?,
            unit_price: Money::from_paise(row.try_get("unit_price")?),
        })
    }
}

/// The payment row paired one-to-one with an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Money,
}

impl Payment {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, CommerceError> {
        let method_raw: String = row.try_get("method")?;
        let status_raw: String = row.try_get("status")?;
        Ok(Self {
            id: PaymentId::new(row.try_get("payment_id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            method: PaymentMethod::parse(&method_raw).ok_or(DbError::Column {
                column: "method",
                value: method_raw,
            })?,
            status: PaymentStatus::parse(&status_raw).ok_or(DbError::Column {
                column: "status",
                value: status_raw,
            })?,
            amount: Money::from_paise(row.try_get("amount")?),
        })
    }
}

/// Load an order owned by the customer, or fail with `OrderNotFound`.
pub(crate) async fn fetch_order_in(
    conn: &mut SqliteConnection,
    order: OrderId,
    customer: CustomerId,
) -> Result<Order, CommerceError> {
    let row = sqlx::query("SELECT * FROM orders WHERE order_id = ? AND customer_id = ?")
        .bind(order.get())
        .bind(customer.get())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CommerceError::OrderNotFound(order))?;
    Order::from_row(&row)
}

/// Load the payment paired with an order.
pub(crate) async fn fetch_payment_in(
    conn: &mut SqliteConnection,
    order: OrderId,
) -> Result<Payment, CommerceError> {
    let row = sqlx::query("SELECT * FROM payments WHERE order_id = ?")
        .bind(order.get())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CommerceError::OrderNotFound(order))?;
    Payment::from_row(&row)
}

/// All items of an order.
pub(crate) async fn items_in(
    conn: &mut SqliteConnection,
    order: OrderId,
) -> Result<Vec<OrderItem>, CommerceError> {
    let rows = sqlx::query("SELECT * FROM order_items WHERE order_id = ? ORDER BY order_item_id")
        .bind(order.get())
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(OrderItem::from_row).collect()
}

/// Read-only order queries.
#[derive(Clone)]
pub struct Orders {
    db: Db,
}

impl Orders {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// A customer's orders, newest first.
    pub async fn list_for(&self, customer: CustomerId) -> Result<Vec<Order>, CommerceError> {
        let rows = sqlx::query("SELECT * FROM orders WHERE customer_id = ? ORDER BY order_id DESC")
            .bind(customer.get())
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(Order::from_row).collect()
    }

    /// One order owned by the customer.
    pub async fn get(&self, order: OrderId, customer: CustomerId) -> Result<Order, CommerceError> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        fetch_order_in(&mut conn, order, customer).await
    }

    /// The order's lines.
    pub async fn items(&self, order: OrderId) -> Result<Vec<OrderItem>, CommerceError> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        items_in(&mut conn, order).await
    }

    /// The order's payment row.
    pub async fn payment(&self, order: OrderId) -> Result<Payment, CommerceError> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        fetch_payment_in(&mut conn, order).await
    }
}
