//! Payment processor: the storefront's rail onto the ledger.
//!
//! Both operations run against a caller-provided connection so the
//! commerce workflows can fold the money movement into the same
//! transaction scope as their own record writes; a late failure on the
//! commerce side then also rolls the transfer back.

use mart_core::{AccountId, BankCustomerId, Money, TransferId};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::account::{select_account, Account, AccountSelection};
use crate::error::BankError;
use crate::ledger::{accounts_for_in, transfer_described_in, transfer_in};
use crate::merchant::merchant_account_in;
use crate::transfer::TransferMode;

/// Receipt for one processed payment or refund.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub transfer_id: TransferId,
    pub reference_no: String,
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: Money,
}

/// Moves money between customer accounts and the fixed merchant account.
#[derive(Debug, Clone)]
pub struct PaymentProcessor {
    merchant_name: String,
}

impl PaymentProcessor {
    pub fn new(merchant_name: impl Into<String>) -> Self {
        Self {
            merchant_name: merchant_name.into(),
        }
    }

    /// The merchant profile name this processor settles against.
    pub fn merchant_name(&self) -> &str {
        &self.merchant_name
    }

    /// List the payer's accounts in selection order.
    pub async fn funding_accounts(
        &self,
        conn: &mut SqliteConnection,
        payer: BankCustomerId,
    ) -> Result<Vec<Account>, BankError> {
        accounts_for_in(conn, payer).await
    }

    /// Pay `amount` from one of the payer's accounts to the merchant.
    ///
    /// The caller is expected to have run the authentication bridge for
    /// `payer` already. Fails without writing anything on an empty or
    /// ambiguous account selection, on a balance that cannot cover the
    /// amount, or on a missing merchant account; otherwise executes one
    /// IMPS transfer inside the caller's scope.
    pub async fn process(
        &self,
        conn: &mut SqliteConnection,
        payer: BankCustomerId,
        amount: Money,
        selection: AccountSelection,
    ) -> Result<PaymentReceipt, BankError> {
        let accounts = self.funding_accounts(conn, payer).await?;
        let funding = select_account(&accounts, selection)?;

        if funding.balance < amount {
            return Err(BankError::InsufficientFunds {
                balance: funding.balance,
                requested: amount,
            });
        }
        let funding_id = funding.id;

        let merchant = merchant_account_in(conn, &self.merchant_name).await?;
        debug!(
            payer = payer.get(),
            funding = funding_id.get(),
            merchant = merchant.id.get(),
            amount = amount.paise(),
            "processing payment"
        );

        let receipt = transfer_in(conn, funding_id, merchant.id, amount, TransferMode::Imps).await?;
        info!(reference = %receipt.transfer.reference_no, "payment settled");

        Ok(PaymentReceipt {
            transfer_id: receipt.transfer.id,
            reference_no: receipt.transfer.reference_no,
            from_account: funding_id,
            to_account: merchant.id,
            amount,
        })
    }

    /// Refund `amount` for an order from the merchant back to the
    /// customer's first account.
    pub async fn refund(
        &self,
        conn: &mut SqliteConnection,
        customer: BankCustomerId,
        amount: Money,
        order_ref: i64,
    ) -> Result<PaymentReceipt, BankError> {
        let merchant = merchant_account_in(conn, &self.merchant_name).await?;
        if merchant.balance < amount {
            return Err(BankError::MerchantInsufficientFunds { requested: amount });
        }

        let accounts = self.funding_accounts(conn, customer).await?;
        let destination = accounts.first().ok_or(BankError::NoAccounts)?.id;

        let receipt = transfer_described_in(
            conn,
            merchant.id,
            destination,
            amount,
            TransferMode::Imps,
            &format!("Refund for order #{order_ref} to account {destination}"),
            &format!("Refund for order #{order_ref}"),
        )
        .await?;

        info!(order = order_ref, reference = %receipt.transfer.reference_no, "refund issued");
        Ok(PaymentReceipt {
            transfer_id: receipt.transfer.id,
            reference_no: receipt.transfer.reference_no,
            from_account: merchant.id,
            to_account: destination,
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merchant::{bootstrap_merchant, DEFAULT_MERCHANT_NAME};
    use crate::testutil;

    #[tokio::test]
    async fn test_process_pays_merchant() {
        let (db, customer, account) = testutil::bank_with_account(100_000).await;
        let merchant = bootstrap_merchant(&db, DEFAULT_MERCHANT_NAME).await.unwrap();
        let processor = PaymentProcessor::new(DEFAULT_MERCHANT_NAME);

        let mut tx = db.begin().await.unwrap();
        let receipt = processor
            .process(&mut tx, customer, Money::from_paise(40_000), AccountSelection::Auto)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(receipt.from_account, account);
        assert_eq!(receipt.to_account, merchant.id);
        assert_eq!(testutil::balance_of(&db, account).await, 60_000);
        assert_eq!(testutil::balance_of(&db, merchant.id).await, 40_000);
    }

    #[tokio::test]
    async fn test_process_insufficient_balance() {
        let (db, customer, account) = testutil::bank_with_account(500).await;
        bootstrap_merchant(&db, DEFAULT_MERCHANT_NAME).await.unwrap();
        let processor = PaymentProcessor::new(DEFAULT_MERCHANT_NAME);

        let mut tx = db.begin().await.unwrap();
        let err = processor
            .process(&mut tx, customer, Money::from_paise(501), AccountSelection::Auto)
            .await
            .unwrap_err();
        drop(tx);

        assert!(matches!(err, BankError::InsufficientFunds { .. }));
        assert_eq!(testutil::balance_of(&db, account).await, 500);
    }

    #[tokio::test]
    async fn test_process_without_merchant() {
        let (db, customer, _) = testutil::bank_with_account(100_000).await;
        let processor = PaymentProcessor::new(DEFAULT_MERCHANT_NAME);

        let mut tx = db.begin().await.unwrap();
        let err = processor
            .process(&mut tx, customer, Money::from_paise(1_000), AccountSelection::Auto)
            .await
            .unwrap_err();
        assert!(matches!(err, BankError::MerchantAccountMissing));
    }

    #[tokio::test]
    async fn test_refund_returns_to_first_account() {
        let (db, customer, account) = testutil::bank_with_account(100_000).await;
        bootstrap_merchant(&db, DEFAULT_MERCHANT_NAME).await.unwrap();
        let processor = PaymentProcessor::new(DEFAULT_MERCHANT_NAME);

        let mut tx = db.begin().await.unwrap();
        processor
            .process(&mut tx, customer, Money::from_paise(100_000), AccountSelection::Auto)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let receipt = processor
            .refund(&mut tx, customer, Money::from_paise(100_000), 7)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(receipt.to_account, account);
        assert_eq!(testutil::balance_of(&db, account).await, 100_000);

        let (desc,): (String,) = sqlx::query_as(
            "SELECT description FROM transactions WHERE reference_no = ? AND account_id = ?",
        )
        .bind(&receipt.reference_no)
        .bind(account.get())
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(desc, "Refund for order #7");
    }

    #[tokio::test]
    async fn test_refund_labels_both_ledger_entries() {
        let (db, customer, account) = testutil::bank_with_account(50_000).await;
        let merchant = bootstrap_merchant(&db, DEFAULT_MERCHANT_NAME).await.unwrap();
        let processor = PaymentProcessor::new(DEFAULT_MERCHANT_NAME);

        let mut tx = db.begin().await.unwrap();
        processor
            .process(&mut tx, customer, Money::from_paise(50_000), AccountSelection::Auto)
            .await
            .unwrap();
        let receipt = processor
            .refund(&mut tx, customer, Money::from_paise(50_000), 42)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        // Both rows of the pair get the refund label when inserted; the
        // ledger stays append-only.
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT account_id, description FROM transactions WHERE reference_no = ?",
        )
        .bind(&receipt.reference_no)
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(rows.len(), 2);
        for (account_id, desc) in &rows {
            assert!(desc.starts_with("Refund for order #42"), "{desc}");
            assert!([merchant.id.get(), account.get()].contains(account_id));
        }
    }

    #[tokio::test]
    async fn test_refund_merchant_short() {
        let (db, customer, _) = testutil::bank_with_account(0).await;
        bootstrap_merchant(&db, DEFAULT_MERCHANT_NAME).await.unwrap();
        let processor = PaymentProcessor::new(DEFAULT_MERCHANT_NAME);

        let mut tx = db.begin().await.unwrap();
        let err = processor
            .refund(&mut tx, customer, Money::from_paise(1), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, BankError::MerchantInsufficientFunds { .. }));
    }
}
