//! # mart-bank
//!
//! The banking side of MartKit: account ledger, authentication bridge,
//! and the payment rail the storefront settles against, plus customer,
//! beneficiary, and merchant management.
//!
//! Balances are mutated only by the ledger primitives in [`ledger`],
//! always inside a transaction scope, so an account's balance is never
//! out of step with its ledger entries.

pub mod account;
pub mod auth;
pub mod beneficiary;
pub mod customer;
pub mod error;
pub mod ledger;
pub mod merchant;
pub mod payment;
pub mod transaction;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testutil;

pub use account::{select_account, Account, AccountSelection, AccountStatus, AccountType};
pub use auth::{verify, BankCredentials};
pub use beneficiary::{Beneficiaries, Beneficiary};
pub use customer::{BankCustomer, Customers, NewBankCustomer};
pub use error::BankError;
pub use ledger::{Ledger, TransferReceipt};
pub use payment::{PaymentProcessor, PaymentReceipt};
pub use transaction::{Direction, TransactionRecord};
pub use transfer::{Transfer, TransferMode, TransferStatus};
