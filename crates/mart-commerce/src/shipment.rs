//! Shipment records and the lazy delivery projector.
//!
//! `Processing → Delivered` is the only automatic transition, taken
//! when a status read finds the order at least 24 hours old. There is
//! no background scheduler: every read through [`Shipments::track`]
//! re-evaluates and may transition as a side effect. `Cancelled` and
//! `Returned` are reachable only through the cancellation/return
//! workflow.

use chrono::{DateTime, Duration, Utc};
use mart_core::{CustomerId, OrderId, ShipmentId};
use mart_db::{decode_ts, encode_ts, Db, DbError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::fmt;
use tracing::info;

use crate::error::CommerceError;
use crate::order::{fetch_order_in, OrderStatus};

/// Hours after order placement at which a Processing shipment counts
/// as delivered.
pub const DELIVERY_AFTER_HOURS: i64 = 24;

/// Delivery status of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentStatus {
    Processing,
    Delivered,
    Cancelled,
    Returned,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Processing => "Processing",
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::Cancelled => "Cancelled",
            ShipmentStatus::Returned => "Returned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Processing" => Some(ShipmentStatus::Processing),
            "Delivered" => Some(ShipmentStatus::Delivered),
            "Cancelled" => Some(ShipmentStatus::Cancelled),
            "Returned" => Some(ShipmentStatus::Returned),
            _ => None,
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A shipment row, one per order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub shipment_date: Option<DateTime<Utc>>,
    pub delivery_date: DateTime<Utc>,
    pub courier: String,
    pub tracking_number: String,
    pub status: ShipmentStatus,
}

impl Shipment {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, CommerceError> {
        let status_raw: String = row.try_get("status")?;
        let shipped_raw: Option<String> = row.try_get("shipment_date")?;
        let delivery_raw: String = row.try_get("delivery_date")?;
        Ok(Self {
            id: ShipmentId::new(row.try_get("shipment_id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            shipment_date: shipped_raw
                .map(|raw| decode_ts("shipment_date", &raw))
                .transpose()?,
            delivery_date: decode_ts("delivery_date", &delivery_raw)?,
            courier: row.try_get("courier")?,
            tracking_number: row.try_get("tracking_number")?,
            status: ShipmentStatus::parse(&status_raw).ok_or(DbError::Column {
                column: "status",
                value: status_raw,
            })?,
        })
    }
}

/// Generate a tracking number: `MX` followed by nine digits.
pub(crate) fn tracking_number() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("MX{n:09}")
}

/// Load an order's shipment row.
pub(crate) async fn fetch_shipment_in(
    conn: &mut SqliteConnection,
    order: OrderId,
) -> Result<Shipment, CommerceError> {
    let row = sqlx::query("SELECT * FROM shipments WHERE order_id = ?")
        .bind(order.get())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CommerceError::OrderNotFound(order))?;
    Shipment::from_row(&row)
}

/// Shipment status reads with lazy projection.
#[derive(Clone)]
pub struct Shipments {
    db: Db,
}

impl Shipments {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Current shipment status of the customer's order.
    ///
    /// Idempotent before the threshold; exactly one transition happens
    /// the first time a read crosses it.
    pub async fn track(
        &self,
        order: OrderId,
        customer: CustomerId,
    ) -> Result<Shipment, CommerceError> {
        self.track_at(order, customer, Utc::now()).await
    }

    /// [`Shipments::track`] against an explicit clock.
    pub async fn track_at(
        &self,
        order: OrderId,
        customer: CustomerId,
        now: DateTime<Utc>,
    ) -> Result<Shipment, CommerceError> {
        let mut tx = self.db.begin().await?;

        let order_row = fetch_order_in(&mut tx, order, customer).await?;
        let mut shipment = fetch_shipment_in(&mut tx, order).await?;

        if shipment.status == ShipmentStatus::Processing
            && now - order_row.order_date >= Duration::hours(DELIVERY_AFTER_HOURS)
        {
            let stamp = encode_ts(now);
            sqlx::query(
                "UPDATE shipments SET status = ?, shipment_date = ?, delivery_date = ?
                 WHERE shipment_id = ?",
            )
            .bind(ShipmentStatus::Delivered.as_str())
            .bind(&stamp)
            .bind(&stamp)
            .bind(shipment.id.get())
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE orders SET status = ? WHERE order_id = ?")
                .bind(OrderStatus::Delivered.as_str())
                .bind(order.get())
                .execute(&mut *tx)
                .await?;

            tx.commit().await.map_err(DbError::from)?;
            info!(order = order.get(), tracking = %shipment.tracking_number, "shipment delivered");

            shipment.status = ShipmentStatus::Delivered;
            shipment.shipment_date = Some(now);
            shipment.delivery_date = now;
            return Ok(shipment);
        }

        tx.commit().await.map_err(DbError::from)?;
        Ok(shipment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_number_shape() {
        for _ in 0..50 {
            let t = tracking_number();
            assert_eq!(t.len(), 11);
            assert!(t.starts_with("MX"));
            assert!(t[2..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ShipmentStatus::Processing,
            ShipmentStatus::Delivered,
            ShipmentStatus::Cancelled,
            ShipmentStatus::Returned,
        ] {
            assert_eq!(ShipmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ShipmentStatus::parse("Shipped"), None);
    }
}
