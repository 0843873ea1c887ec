//! The order workflow: cart or direct lines into a committed
//! order + shipment + payment + invoice unit.
//!
//! One transaction scope covers the whole operation, including the
//! bank transfer for Pay Now orders, so a failure at any step after
//! the first write rolls everything back. Lines whose requested
//! quantity exceeds live stock are skipped with a warning rather than
//! failing the order; stock is decremented and cart lines are cleared
//! only for lines that actually commit.

use chrono::{Duration, Utc};
use mart_bank::{verify, AccountSelection, BankCredentials, PaymentProcessor};
use mart_core::{CustomerId, Money, OrderId, PaymentId, ProductId};
use mart_db::{encode_ts, Db, DbError};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::address::{resolve_in, AddressChoice};
use crate::cart::{lines_in, remove_line_in};
use crate::catalog::{adjust_stock_in, fetch_product_in, Product};
use crate::error::CommerceError;
use crate::invoice::create_in as create_invoice_in;
use crate::order::{OrderStatus, PaymentMethod, PaymentStatus};
use crate::shipment::{tracking_number, ShipmentStatus};

/// Storefront-wide checkout settings.
#[derive(Debug, Clone)]
pub struct CheckoutPolicy {
    pub courier: String,
    pub delivery_window_days: i64,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            courier: "Mart Express".into(),
            delivery_window_days: 3,
        }
    }
}

/// Where the order's lines come from.
#[derive(Debug, Clone)]
pub enum OrderSource {
    /// The customer's cart, optionally narrowed to some products.
    Cart { only: Option<Vec<ProductId>> },
    /// A single product ordered directly.
    Direct { product: ProductId, quantity: i64 },
}

/// How the order is to be settled.
#[derive(Debug, Clone)]
pub enum PaymentInstruction {
    /// Settle on delivery; no money moves now.
    CashOnDelivery,
    /// Pay now over the banking rail.
    PayNow {
        credentials: BankCredentials,
        funding: AccountSelection,
    },
}

impl PaymentInstruction {
    fn method(&self) -> PaymentMethod {
        match self {
            PaymentInstruction::CashOnDelivery => PaymentMethod::CashOnDelivery,
            PaymentInstruction::PayNow { .. } => PaymentMethod::Online,
        }
    }
}

/// Everything `place_order` needs, already validated in shape.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub customer: CustomerId,
    pub source: OrderSource,
    pub address: AddressChoice,
    pub payment: PaymentInstruction,
}

/// A line dropped from the order for lack of stock.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedLine {
    pub product: ProductId,
    pub product_name: String,
    pub requested: i64,
    pub available: i64,
}

/// What a committed order looks like to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total: Money,
    pub tracking_number: String,
    pub payment_reference: Option<String>,
    pub skipped: Vec<SkippedLine>,
}

/// The order placement workflow.
#[derive(Clone)]
pub struct Checkout {
    db: Db,
    processor: PaymentProcessor,
    policy: CheckoutPolicy,
}

impl Checkout {
    pub fn new(db: Db, processor: PaymentProcessor, policy: CheckoutPolicy) -> Self {
        Self { db, processor, policy }
    }

    /// Place an order. See the module docs for the atomicity contract.
    #[instrument(skip(self, request), fields(customer = request.customer.get()))]
    pub async fn place_order(&self, request: OrderRequest) -> Result<OrderReceipt, CommerceError> {
        let mut tx = self.db.begin().await?;
        let customer = request.customer;

        // Requested lines, from the cart or the direct parameters.
        let from_cart = matches!(request.source, OrderSource::Cart { .. });
        let requested: Vec<(ProductId, i64)> = match &request.source {
            OrderSource::Direct { product, quantity } => {
                if *quantity <= 0 {
                    return Err(CommerceError::InvalidQuantity(*quantity));
                }
                vec![(*product, *quantity)]
            }
            OrderSource::Cart { only } => {
                let lines = lines_in(&mut tx, customer).await?;
                lines
                    .into_iter()
                    .filter(|line| match only {
                        Some(subset) => subset.contains(&line.product_id),
                        None => true,
                    })
                    .map(|line| (line.product_id, line.quantity))
                    .collect()
            }
        };
        if requested.is_empty() {
            return Err(CommerceError::EmptyOrder);
        }

        // Stock validation: keep what fits, skip the rest with a warning.
        let mut kept: Vec<(Product, i64)> = Vec::new();
        let mut skipped: Vec<SkippedLine> = Vec::new();
        for (product_id, quantity) in requested {
            let product = fetch_product_in(&mut tx, product_id).await?;
            if quantity > product.stock {
                warn!(
                    product = product_id.get(),
                    requested = quantity,
                    available = product.stock,
                    "skipping line; insufficient stock"
                );
                skipped.push(SkippedLine {
                    product: product_id,
                    product_name: product.name,
                    requested: quantity,
                    available: product.stock,
                });
            } else {
                kept.push((product, quantity));
            }
        }
        if kept.is_empty() {
            return Err(CommerceError::EmptyOrder);
        }

        let total = kept
            .iter()
            .try_fold(Money::ZERO, |acc, (product, quantity)| {
                product
                    .price
                    .checked_mul(*quantity)
                    .and_then(|line| acc.checked_add(line))
            })
            .ok_or(CommerceError::AmountOverflow)?;

        let address = resolve_in(&mut tx, customer, &request.address).await?;

        // Payment state machine. Pay Now moves money inside this same
        // scope; any banking failure aborts the order before a single
        // commerce row exists.
        let (order_status, payment_status, payment_reference) = match &request.payment {
            PaymentInstruction::CashOnDelivery => {
                (OrderStatus::Confirmed, PaymentStatus::Pending, None)
            }
            PaymentInstruction::PayNow { credentials, funding } => {
                let payer = verify(&mut tx, credentials).await?;
                let receipt = self.processor.process(&mut tx, payer, total, *funding).await?;
                (OrderStatus::Confirmed, PaymentStatus::Paid, Some(receipt.reference_no))
            }
        };

        let now = Utc::now();
        let order_result = sqlx::query(
            "INSERT INTO orders (customer_id, order_date, status, total_amount) VALUES (?, ?, ?, ?)",
        )
        .bind(customer.get())
        .bind(encode_ts(now))
        .bind(order_status.as_str())
        .bind(total.paise())
        .execute(&mut *tx)
        .await?;
        let order_id = OrderId::new(order_result.last_insert_rowid());

        let tracking = tracking_number();
        let delivery_estimate = now + Duration::days(self.policy.delivery_window_days);
        sqlx::query(
            "INSERT INTO shipments (order_id, shipment_date, delivery_date, courier, tracking_number, status)
             VALUES (?, NULL, ?, ?, ?, ?)",
        )
        .bind(order_id.get())
        .bind(encode_ts(delivery_estimate))
        .bind(&self.policy.courier)
        .bind(&tracking)
        .bind(ShipmentStatus::Processing.as_str())
        .execute(&mut *tx)
        .await?;

        let payment_result = sqlx::query(
            "INSERT INTO payments (order_id, method, status, amount) VALUES (?, ?, ?, ?)",
        )
        .bind(order_id.get())
        .bind(request.payment.method().as_str())
        .bind(payment_status.as_str())
        .bind(total.paise())
        .execute(&mut *tx)
        .await?;
        let payment_id = PaymentId::new(payment_result.last_insert_rowid());

        let mut max_warranty = 0;
        for (product, quantity) in &kept {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(order_id.get())
            .bind(product.id.get())
            .bind(quantity)
            .bind(product.price.paise())
            .execute(&mut *tx)
            .await?;

            adjust_stock_in(&mut tx, product.id, -quantity).await?;
            if from_cart {
                remove_line_in(&mut tx, customer, product.id).await?;
            }
            max_warranty = max_warranty.max(product.warranty_months);
        }

        create_invoice_in(&mut tx, order_id, payment_id, total, max_warranty, now).await?;

        tx.commit().await.map_err(DbError::from)?;
        info!(
            order = order_id.get(),
            total = total.paise(),
            address = %address.one_line(),
            lines = kept.len(),
            skipped = skipped.len(),
            "order placed"
        );

        Ok(OrderReceipt {
            order_id,
            status: order_status,
            payment_status,
            total,
            tracking_number: tracking,
            payment_reference,
            skipped,
        })
    }
}
