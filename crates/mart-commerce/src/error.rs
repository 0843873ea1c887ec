//! Storefront error types.

use mart_bank::BankError;
use mart_core::secret::SecretError;
use mart_core::{AddressId, CustomerId, OrderId, ProductId};
use mart_db::DbError;
use thiserror::Error;

/// Errors surfaced by storefront operations.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// The product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// No order (with its payment) matches the id for this customer.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// The address does not exist or belongs to someone else.
    #[error("address {0} not found")]
    AddressNotFound(AddressId),

    /// No line survived stock validation; nothing to order.
    #[error("no orderable items; order aborted")]
    EmptyOrder,

    /// A quantity was zero or negative.
    #[error("quantity {0} is not valid")]
    InvalidQuantity(i64),

    /// An order total overflowed the money range.
    #[error("order total overflows the supported amount range")]
    AmountOverflow,

    /// The order or shipment state precludes the requested transition.
    #[error("order {order} cannot be {action} from state {state}")]
    InvalidState {
        order: OrderId,
        action: &'static str,
        state: String,
    },

    /// The email is already registered.
    #[error("email {0} is already registered")]
    EmailTaken(String),

    /// Unknown email or wrong password.
    #[error("login failed")]
    LoginFailed,

    /// Reviews require a qualifying purchase.
    #[error("customer {customer} has not purchased product {product}")]
    NotPurchased {
        customer: CustomerId,
        product: ProductId,
    },

    /// Ratings are 1 through 5.
    #[error("rating {0} is outside 1..=5")]
    InvalidRating(i64),

    /// Credential hashing failed.
    #[error("credential hashing failed: {0}")]
    Credential(#[from] SecretError),

    /// Banking-side rejection (authentication, funds, merchant).
    #[error(transparent)]
    Bank(#[from] BankError),

    /// Underlying store failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for CommerceError {
    fn from(err: sqlx::Error) -> Self {
        CommerceError::Db(DbError::from(err))
    }
}

impl CommerceError {
    /// Whether re-prompting the user could resolve the failure.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CommerceError::InvalidQuantity(_)
            | CommerceError::InvalidRating(_)
            | CommerceError::EmailTaken(_)
            | CommerceError::LoginFailed => true,
            CommerceError::Bank(err) => err.is_recoverable(),
            _ => false,
        }
    }
}
