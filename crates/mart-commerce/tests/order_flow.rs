//! End-to-end storefront flows against in-memory SQLite: placement,
//! payment, projection, cancellation, return, and the review gate.

use chrono::{Duration, Utc};
use mart_bank::merchant::{bootstrap_merchant, DEFAULT_MERCHANT_NAME};
use mart_bank::{
    AccountSelection, AccountType, BankCredentials, BankError, Customers, NewBankCustomer,
    PaymentProcessor,
};
use mart_commerce::{
    AddressChoice, AddressKind, Carts, Checkout, CheckoutPolicy, CommerceError, Invoices,
    NewAddress, OrderRequest, OrderSource, OrderStatus, Orders, PaymentInstruction, PaymentStatus,
    Returns, Reviews, ShipmentStatus, Shipments,
};
use mart_core::{AccountId, BankCustomerId, CustomerId, Money, OrderId, ProductId};
use mart_db::Db;

const BANK_SECRET: &str = "vault code 9";

struct Store {
    db: Db,
    checkout: Checkout,
    returns: Returns,
    shipments: Shipments,
    orders: Orders,
    customer: CustomerId,
    bank_customer: BankCustomerId,
    bank_account: AccountId,
}

impl Store {
    /// Full fixture: merchant, one bank customer with the given paise
    /// balance, one storefront customer.
    async fn new(bank_balance: i64) -> Self {
        let db = Db::open_in_memory().await.unwrap();
        bootstrap_merchant(&db, DEFAULT_MERCHANT_NAME).await.unwrap();

        let (bank_customer, account) = Customers::new(db.clone())
            .open(NewBankCustomer {
                name: "Asha Rao".into(),
                email: "asha@example.com".into(),
                phone: None,
                address: None,
                secret: BANK_SECRET.into(),
                account_type: AccountType::Savings,
                ifsc: None,
                opening_deposit: (bank_balance > 0).then(|| Money::from_paise(bank_balance)),
            })
            .await
            .unwrap();

        let customer = mart_commerce::Identity::new(db.clone())
            .signup(mart_commerce::NewCustomer {
                name: "Asha Rao".into(),
                email: "asha@shop.example.com".into(),
                phone: None,
                secret: "shop secret".into(),
            })
            .await
            .unwrap()
            .id;

        let processor = PaymentProcessor::new(DEFAULT_MERCHANT_NAME);
        Self {
            checkout: Checkout::new(db.clone(), processor.clone(), CheckoutPolicy::default()),
            returns: Returns::new(db.clone(), processor),
            shipments: Shipments::new(db.clone()),
            orders: Orders::new(db.clone()),
            customer,
            bank_customer: bank_customer.id,
            bank_account: account.id,
            db,
        }
    }

    async fn add_product(&self, name: &str, price: i64, stock: i64, warranty: i64) -> ProductId {
        let result = sqlx::query(
            "INSERT INTO products (name, price, stock, warranty_months) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(price)
        .bind(stock)
        .bind(warranty)
        .execute(self.db.pool())
        .await
        .unwrap();
        ProductId::new(result.last_insert_rowid())
    }

    fn credentials(&self) -> BankCredentials {
        BankCredentials::new(self.bank_customer, BANK_SECRET)
    }

    fn new_address(&self) -> AddressChoice {
        AddressChoice::New(NewAddress {
            kind: AddressKind::Shipping,
            street: "12 Lake View Road".into(),
            city: "Pune".into(),
            state: "Maharashtra".into(),
            pincode: "411001".into(),
        })
    }

    fn pay_now(&self) -> PaymentInstruction {
        PaymentInstruction::PayNow {
            credentials: self.credentials(),
            funding: AccountSelection::Auto,
        }
    }

    async fn balance(&self, account: AccountId) -> i64 {
        let (balance,): (i64,) = sqlx::query_as("SELECT balance FROM accounts WHERE account_id = ?")
            .bind(account.get())
            .fetch_one(self.db.pool())
            .await
            .unwrap();
        balance
    }

    async fn stock(&self, product: ProductId) -> i64 {
        let (stock,): (i64,) = sqlx::query_as("SELECT stock FROM products WHERE product_id = ?")
            .bind(product.get())
            .fetch_one(self.db.pool())
            .await
            .unwrap();
        stock
    }

    async fn count(&self, table: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.db.pool())
            .await
            .unwrap();
        count
    }

    async fn backdate_order(&self, order: OrderId, hours: i64) {
        sqlx::query("UPDATE orders SET order_date = ? WHERE order_id = ?")
            .bind((Utc::now() - Duration::hours(hours)).to_rfc3339())
            .bind(order.get())
            .execute(self.db.pool())
            .await
            .unwrap();
    }

    async fn force_order_status(&self, order: OrderId, status: &str) {
        sqlx::query("UPDATE orders SET status = ? WHERE order_id = ?")
            .bind(status)
            .bind(order.get())
            .execute(self.db.pool())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn cart_order_cash_on_delivery_commits_one_unit() {
    let store = Store::new(0).await;
    let lantern = store.add_product("Solar Lantern", 49_900, 10, 6).await;
    let kettle = store.add_product("Kettle", 89_900, 4, 24).await;

    let carts = Carts::new(store.db.clone());
    carts.add(store.customer, lantern, 2).await.unwrap();
    carts.add(store.customer, kettle, 1).await.unwrap();

    let receipt = store
        .checkout
        .place_order(OrderRequest {
            customer: store.customer,
            source: OrderSource::Cart { only: None },
            address: store.new_address(),
            payment: PaymentInstruction::CashOnDelivery,
        })
        .await
        .unwrap();

    assert_eq!(receipt.status, OrderStatus::Confirmed);
    assert_eq!(receipt.payment_status, PaymentStatus::Pending);
    assert_eq!(receipt.total, Money::from_paise(2 * 49_900 + 89_900));
    assert!(receipt.tracking_number.starts_with("MX"));
    assert!(receipt.skipped.is_empty());

    // Stock decremented, cart cleared, one row per companion table.
    assert_eq!(store.stock(lantern).await, 8);
    assert_eq!(store.stock(kettle).await, 3);
    assert!(carts.view(store.customer).await.unwrap().is_empty());
    assert_eq!(store.count("shipments").await, 1);
    assert_eq!(store.count("payments").await, 1);
    assert_eq!(store.count("invoices").await, 1);

    // Invoice warranty window follows the longest warranty (24 months).
    let invoice = Invoices::new(store.db.clone())
        .for_order(receipt.order_id, store.customer)
        .await
        .unwrap();
    assert_eq!(invoice.amount, receipt.total);
    let months = (invoice.warranty_end - invoice.warranty_start).num_days() / 28;
    assert!(months >= 24, "warranty window too short: {months}");
}

#[tokio::test]
async fn online_payment_then_cancel_refunds_in_full() {
    // Balance exactly covers the total.
    let store = Store::new(100_000).await;
    let product = store.add_product("Kettle", 100_000, 5, 0).await;

    let receipt = store
        .checkout
        .place_order(OrderRequest {
            customer: store.customer,
            source: OrderSource::Direct { product, quantity: 1 },
            address: store.new_address(),
            payment: store.pay_now(),
        })
        .await
        .unwrap();

    assert_eq!(receipt.payment_status, PaymentStatus::Paid);
    assert!(receipt.payment_reference.is_some());
    assert_eq!(store.balance(store.bank_account).await, 0);

    let reversal = store
        .returns
        .cancel_order(receipt.order_id, store.customer, Some(&store.credentials()))
        .await
        .unwrap();

    assert!(reversal.refund_reference.is_some());
    assert_eq!(store.balance(store.bank_account).await, 100_000);
    assert_eq!(store.stock(product).await, 5);

    let order = store.orders.get(receipt.order_id, store.customer).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    let payment = store.orders.payment(receipt.order_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn insufficient_balance_aborts_whole_order() {
    let store = Store::new(50_000).await;
    let product = store.add_product("Kettle", 100_000, 5, 0).await;

    let err = store
        .checkout
        .place_order(OrderRequest {
            customer: store.customer,
            source: OrderSource::Direct { product, quantity: 1 },
            address: store.new_address(),
            payment: store.pay_now(),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CommerceError::Bank(BankError::InsufficientFunds { .. })
    ));
    assert_eq!(store.balance(store.bank_account).await, 50_000);
    assert_eq!(store.count("orders").await, 0);
    assert_eq!(store.count("shipments").await, 0);
    assert_eq!(store.count("payments").await, 0);
    // The inline address rolled back with everything else.
    assert_eq!(store.count("addresses").await, 0);
    assert_eq!(store.stock(product).await, 5);
}

#[tokio::test]
async fn wrong_bank_credentials_abort_order() {
    let store = Store::new(100_000).await;
    let product = store.add_product("Kettle", 10_000, 5, 0).await;

    let err = store
        .checkout
        .place_order(OrderRequest {
            customer: store.customer,
            source: OrderSource::Direct { product, quantity: 1 },
            address: store.new_address(),
            payment: PaymentInstruction::PayNow {
                credentials: BankCredentials::new(store.bank_customer, "wrong"),
                funding: AccountSelection::Auto,
            },
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CommerceError::Bank(BankError::AuthenticationFailed)));
    assert_eq!(store.count("orders").await, 0);
}

#[tokio::test]
async fn short_stock_lines_are_skipped_not_fatal() {
    let store = Store::new(0).await;
    let plenty = store.add_product("Mug", 19_900, 50, 0).await;
    let scarce = store.add_product("Lamp", 129_900, 2, 0).await;

    let carts = Carts::new(store.db.clone());
    carts.add(store.customer, plenty, 3).await.unwrap();
    carts.add(store.customer, scarce, 5).await.unwrap();

    let receipt = store
        .checkout
        .place_order(OrderRequest {
            customer: store.customer,
            source: OrderSource::Cart { only: None },
            address: store.new_address(),
            payment: PaymentInstruction::CashOnDelivery,
        })
        .await
        .unwrap();

    assert_eq!(receipt.total, Money::from_paise(3 * 19_900));
    assert_eq!(receipt.skipped.len(), 1);
    assert_eq!(receipt.skipped[0].product, scarce);
    assert_eq!(receipt.skipped[0].available, 2);

    // The skipped line keeps its stock and stays in the cart.
    assert_eq!(store.stock(scarce).await, 2);
    assert_eq!(store.stock(plenty).await, 47);
    let remaining = carts.view(store.customer).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].product_id, scarce);
}

#[tokio::test]
async fn all_lines_short_aborts_with_nothing_written() {
    let store = Store::new(0).await;
    let product = store.add_product("Lamp", 129_900, 5, 0).await;

    let err = store
        .checkout
        .place_order(OrderRequest {
            customer: store.customer,
            source: OrderSource::Direct { product, quantity: 10 },
            address: store.new_address(),
            payment: PaymentInstruction::CashOnDelivery,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CommerceError::EmptyOrder));
    assert_eq!(store.count("orders").await, 0);
    assert_eq!(store.count("shipments").await, 0);
    assert_eq!(store.count("payments").await, 0);
    assert_eq!(store.stock(product).await, 5);
}

#[tokio::test]
async fn projector_delivers_exactly_once_after_threshold() {
    let store = Store::new(0).await;
    let product = store.add_product("Mug", 19_900, 5, 0).await;

    let receipt = store
        .checkout
        .place_order(OrderRequest {
            customer: store.customer,
            source: OrderSource::Direct { product, quantity: 1 },
            address: store.new_address(),
            payment: PaymentInstruction::CashOnDelivery,
        })
        .await
        .unwrap();

    // Repeated reads before the threshold change nothing.
    for _ in 0..3 {
        let shipment = store.shipments.track(receipt.order_id, store.customer).await.unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Processing);
        assert!(shipment.shipment_date.is_none());
    }

    store.backdate_order(receipt.order_id, 25).await;

    let shipment = store.shipments.track(receipt.order_id, store.customer).await.unwrap();
    assert_eq!(shipment.status, ShipmentStatus::Delivered);
    assert!(shipment.shipment_date.is_some());
    let delivered_at = shipment.delivery_date;

    // Idempotent after the transition; the stamp does not move.
    let again = store.shipments.track(receipt.order_id, store.customer).await.unwrap();
    assert_eq!(again.status, ShipmentStatus::Delivered);
    assert_eq!(again.delivery_date, delivered_at);

    let order = store.orders.get(receipt.order_id, store.customer).await.unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn cancel_is_blocked_once_shipped() {
    let store = Store::new(0).await;
    let product = store.add_product("Mug", 19_900, 5, 0).await;

    let receipt = store
        .checkout
        .place_order(OrderRequest {
            customer: store.customer,
            source: OrderSource::Direct { product, quantity: 2 },
            address: store.new_address(),
            payment: PaymentInstruction::CashOnDelivery,
        })
        .await
        .unwrap();
    store.force_order_status(receipt.order_id, "Shipped").await;

    let err = store
        .returns
        .cancel_order(receipt.order_id, store.customer, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::InvalidState { .. }));

    // Nothing moved.
    assert_eq!(store.stock(product).await, 3);
    let payment = store.orders.payment(receipt.order_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    let shipment = store.shipments.track(receipt.order_id, store.customer).await.unwrap();
    assert_eq!(shipment.status, ShipmentStatus::Processing);
}

#[tokio::test]
async fn return_requires_prior_delivery() {
    let store = Store::new(0).await;
    let product = store.add_product("Mug", 19_900, 5, 0).await;

    let receipt = store
        .checkout
        .place_order(OrderRequest {
            customer: store.customer,
            source: OrderSource::Direct { product, quantity: 1 },
            address: store.new_address(),
            payment: PaymentInstruction::CashOnDelivery,
        })
        .await
        .unwrap();

    let err = store
        .returns
        .return_order(receipt.order_id, store.customer, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::InvalidState { .. }));
    assert_eq!(store.stock(product).await, 4);

    // Deliver via the projector, then the return goes through.
    store.backdate_order(receipt.order_id, 25).await;
    store.shipments.track(receipt.order_id, store.customer).await.unwrap();

    let reversal = store
        .returns
        .return_order(receipt.order_id, store.customer, None)
        .await
        .unwrap();
    assert_eq!(reversal.order_status, OrderStatus::Returned);
    assert_eq!(store.stock(product).await, 5);

    // A second return is rejected.
    let err = store
        .returns
        .return_order(receipt.order_id, store.customer, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::InvalidState { .. }));
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let store = Store::new(0).await;
    let err = store
        .returns
        .cancel_order(OrderId::new(404), store.customer, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::OrderNotFound(_)));
}

#[tokio::test]
async fn review_gate_follows_purchases() {
    let store = Store::new(0).await;
    let product = store.add_product("Mug", 19_900, 5, 0).await;
    let reviews = Reviews::new(store.db.clone());

    let err = reviews.submit(store.customer, product, 5, None).await.unwrap_err();
    assert!(matches!(err, CommerceError::NotPurchased { .. }));

    let receipt = store
        .checkout
        .place_order(OrderRequest {
            customer: store.customer,
            source: OrderSource::Direct { product, quantity: 1 },
            address: store.new_address(),
            payment: PaymentInstruction::CashOnDelivery,
        })
        .await
        .unwrap();

    let review = reviews
        .submit(store.customer, product, 5, Some("Sturdy.".into()))
        .await
        .unwrap();
    assert_eq!(review.rating, 5);
    assert_eq!(reviews.list(product).await.unwrap().len(), 1);

    // A cancelled order no longer qualifies.
    store.returns.cancel_order(receipt.order_id, store.customer, None).await.unwrap();
    assert!(!reviews.has_purchased(store.customer, product).await.unwrap());
}
