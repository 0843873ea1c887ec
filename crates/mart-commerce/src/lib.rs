//! # mart-commerce
//!
//! The storefront side of MartKit: catalog, cart, and address book
//! around the three core workflows of order placement, lazy shipment
//! projection, and cancellation/return, all settling against the
//! banking rail in [`mart_bank`].
//!
//! Every multi-step workflow runs inside a single database transaction
//! scope, including the money movement, so partial orders and partial
//! refunds cannot be observed.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod identity;
pub mod invoice;
pub mod order;
pub mod returns;
pub mod review;
pub mod shipment;

#[cfg(test)]
pub(crate) mod testutil;

pub use address::{Address, AddressChoice, AddressKind, Addresses, NewAddress};
pub use cart::{CartLine, Carts};
pub use catalog::{Catalog, Category, Product};
pub use checkout::{
    Checkout, CheckoutPolicy, OrderReceipt, OrderRequest, OrderSource, PaymentInstruction,
    SkippedLine,
};
pub use error::CommerceError;
pub use identity::{Customer, Identity, NewCustomer};
pub use invoice::{Invoice, Invoices};
pub use order::{Order, OrderItem, OrderStatus, Orders, Payment, PaymentMethod, PaymentStatus};
pub use returns::{Returns, ReversalReceipt};
pub use review::{Review, Reviews};
pub use shipment::{Shipment, ShipmentStatus, Shipments, DELIVERY_AFTER_HOURS};
