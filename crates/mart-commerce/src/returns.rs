//! Cancellation and return workflows.
//!
//! Both reverse an order: refund first (for online payments), then
//! restock and flip the order/payment/shipment statuses, all in one
//! transaction scope. A refund failure therefore aborts with no state
//! change at all. Cancellation is pre-fulfillment and return is
//! post-fulfillment; their reachable states never overlap.

use mart_bank::{verify, BankCredentials, PaymentProcessor};
use mart_core::{CustomerId, OrderId};
use mart_db::{Db, DbError};
use sqlx::SqliteConnection;
use tracing::{info, instrument};

use crate::catalog::adjust_stock_in;
use crate::error::CommerceError;
use crate::order::{fetch_order_in, fetch_payment_in, items_in, OrderStatus, PaymentMethod, PaymentStatus};
use crate::shipment::{fetch_shipment_in, ShipmentStatus};

/// Outcome of a cancellation or return.
#[derive(Debug, Clone)]
pub struct ReversalReceipt {
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    /// Reference of the refund transfer, when money moved back.
    pub refund_reference: Option<String>,
}

/// The cancellation/return workflow.
#[derive(Clone)]
pub struct Returns {
    db: Db,
    processor: PaymentProcessor,
}

impl Returns {
    pub fn new(db: Db, processor: PaymentProcessor) -> Self {
        Self { db, processor }
    }

    /// Cancel an order that has not left fulfillment.
    ///
    /// Fails with `InvalidState` once the order is shipped or beyond.
    /// Online payments require banking credentials for the refund.
    #[instrument(skip(self, refund_auth))]
    pub async fn cancel_order(
        &self,
        order: OrderId,
        customer: CustomerId,
        refund_auth: Option<&BankCredentials>,
    ) -> Result<ReversalReceipt, CommerceError> {
        let mut tx = self.db.begin().await?;

        let order_row = fetch_order_in(&mut tx, order, customer).await?;
        let payment = fetch_payment_in(&mut tx, order).await?;

        if !order_row.status.can_cancel() {
            return Err(CommerceError::InvalidState {
                order,
                action: "cancelled",
                state: order_row.status.as_str().to_owned(),
            });
        }

        let refund_reference = self
            .refund_if_online(&mut tx, &payment.method, payment.amount, order, refund_auth)
            .await?;

        self.reverse_in(&mut tx, order, OrderStatus::Cancelled, ShipmentStatus::Cancelled)
            .await?;

        tx.commit().await.map_err(DbError::from)?;
        info!(order = order.get(), refunded = refund_reference.is_some(), "order cancelled");
        Ok(ReversalReceipt {
            order_id: order,
            order_status: OrderStatus::Cancelled,
            refund_reference,
        })
    }

    /// Return a delivered order.
    ///
    /// Requires the shipment to be in `Delivered`; an already returned
    /// order is rejected.
    #[instrument(skip(self, refund_auth))]
    pub async fn return_order(
        &self,
        order: OrderId,
        customer: CustomerId,
        refund_auth: Option<&BankCredentials>,
    ) -> Result<ReversalReceipt, CommerceError> {
        let mut tx = self.db.begin().await?;

        let order_row = fetch_order_in(&mut tx, order, customer).await?;
        let payment = fetch_payment_in(&mut tx, order).await?;
        let shipment = fetch_shipment_in(&mut tx, order).await?;

        if order_row.status == OrderStatus::Returned {
            return Err(CommerceError::InvalidState {
                order,
                action: "returned",
                state: order_row.status.as_str().to_owned(),
            });
        }
        if shipment.status != ShipmentStatus::Delivered {
            return Err(CommerceError::InvalidState {
                order,
                action: "returned",
                state: shipment.status.as_str().to_owned(),
            });
        }

        let refund_reference = self
            .refund_if_online(&mut tx, &payment.method, payment.amount, order, refund_auth)
            .await?;

        self.reverse_in(&mut tx, order, OrderStatus::Returned, ShipmentStatus::Returned)
            .await?;

        tx.commit().await.map_err(DbError::from)?;
        info!(order = order.get(), refunded = refund_reference.is_some(), "order returned");
        Ok(ReversalReceipt {
            order_id: order,
            order_status: OrderStatus::Returned,
            refund_reference,
        })
    }

    /// Run the refund gate for online payments; cash settles out of
    /// band and moves nothing.
    async fn refund_if_online(
        &self,
        conn: &mut SqliteConnection,
        method: &PaymentMethod,
        amount: mart_core::Money,
        order: OrderId,
        refund_auth: Option<&BankCredentials>,
    ) -> Result<Option<String>, CommerceError> {
        if *method != PaymentMethod::Online {
            return Ok(None);
        }
        let credentials = refund_auth.ok_or(mart_bank::BankError::AuthenticationFailed)?;
        let payer = verify(conn, credentials).await?;
        let receipt = self.processor.refund(conn, payer, amount, order.get()).await?;
        Ok(Some(receipt.reference_no))
    }

    /// Restock every line and flip the three statuses.
    async fn reverse_in(
        &self,
        conn: &mut SqliteConnection,
        order: OrderId,
        order_status: OrderStatus,
        shipment_status: ShipmentStatus,
    ) -> Result<(), CommerceError> {
        for item in items_in(conn, order).await? {
            adjust_stock_in(conn, item.product_id, item.quantity).await?;
        }

        sqlx::query("UPDATE orders SET status = ? WHERE order_id = ?")
            .bind(order_status.as_str())
            .bind(order.get())
            .execute(&mut *conn)
            .await?;
        sqlx::query("UPDATE payments SET status = ? WHERE order_id = ?")
            .bind(PaymentStatus::Refunded.as_str())
            .bind(order.get())
            .execute(&mut *conn)
            .await?;
        sqlx::query("UPDATE shipments SET status = ? WHERE order_id = ?")
            .bind(shipment_status.as_str())
            .bind(order.get())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
