//! Newtype IDs for type-safe identifiers.
//!
//! Using newtypes prevents accidentally mixing up different ID types,
//! e.g., passing a commerce `CustomerId` where a banking
//! `BankCustomerId` is expected. All MartKit identifiers are integer
//! database keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs over `i64` rowids.
macro_rules! define_id {
    ($name:ident) => {
        /// A unique identifier.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create an ID from a raw database key.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the raw database key.
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

// Commerce-side ID types
define_id!(CustomerId);
define_id!(CategoryId);
define_id!(SellerId);
define_id!(ProductId);
define_id!(CartId);
define_id!(CartItemId);
define_id!(AddressId);
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(PaymentId);
define_id!(ShipmentId);
define_id!(InvoiceId);
define_id!(ReviewId);

// Banking-side ID types
define_id!(BankCustomerId);
define_id!(AccountId);
define_id!(TransactionId);
define_id!(TransferId);
define_id!(BeneficiaryId);
