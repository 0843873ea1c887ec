//! Banking error types.

use mart_core::secret::SecretError;
use mart_core::{AccountId, BankCustomerId, BeneficiaryId, Money};
use mart_db::DbError;
use thiserror::Error;

/// Errors surfaced by banking operations.
#[derive(Debug, Error)]
pub enum BankError {
    /// The account does not exist in the books.
    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    /// The bank customer does not exist.
    #[error("bank customer {0} not found")]
    CustomerNotFound(BankCustomerId),

    /// A debit would take the balance below zero.
    #[error("insufficient funds: balance {balance} cannot cover {requested}")]
    InsufficientFunds { balance: Money, requested: Money },

    /// The merchant account cannot cover a refund.
    #[error("merchant account cannot cover refund of {requested}")]
    MerchantInsufficientFunds { requested: Money },

    /// No merchant account has been provisioned.
    #[error("merchant account is not provisioned")]
    MerchantAccountMissing,

    /// The customer owns no accounts.
    #[error("no accounts found for this customer")]
    NoAccounts,

    /// Several accounts exist and no explicit choice was made.
    #[error("{count} accounts available; an explicit selection is required")]
    SelectionRequired { count: usize },

    /// The 1-based account choice is out of range.
    #[error("selection {selected} is out of range 1..={count}")]
    InvalidSelection { selected: usize, count: usize },

    /// Credentials did not verify.
    #[error("banking authentication failed")]
    AuthenticationFailed,

    /// The email is already registered.
    #[error("email {0} is already registered")]
    EmailTaken(String),

    /// A beneficiary with this account number is already saved.
    #[error("beneficiary with account number {0} already saved")]
    DuplicateBeneficiary(i64),

    /// The beneficiary does not exist for this customer.
    #[error("beneficiary {0} not found")]
    BeneficiaryNotFound(BeneficiaryId),

    /// The amount is non-positive or outside the ledger range.
    #[error("amount must be positive and within ledger range")]
    InvalidAmount,

    /// Credential hashing failed.
    #[error("credential hashing failed: {0}")]
    Credential(#[from] SecretError),

    /// Underlying store failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for BankError {
    fn from(err: sqlx::Error) -> Self {
        BankError::Db(DbError::from(err))
    }
}

impl BankError {
    /// Whether re-prompting the user could resolve the failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BankError::SelectionRequired { .. }
                | BankError::InvalidSelection { .. }
                | BankError::AuthenticationFailed
                | BankError::EmailTaken(_)
                | BankError::InvalidAmount
        )
    }
}
