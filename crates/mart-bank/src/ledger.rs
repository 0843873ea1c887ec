//! Ledger primitives: debit, credit, and atomic transfer.
//!
//! Two forms of every primitive exist. The `*_in` functions run against
//! a caller-provided connection, so workflows can compose ledger steps
//! with their own writes in one transaction scope. The [`Ledger`]
//! methods own a scope of their own and commit it, for standalone use
//! (deposits, direct transfers from the banking menus).

use chrono::Utc;
use mart_core::{AccountId, BankCustomerId, Money};
use mart_db::{encode_ts, Db};
use sqlx::SqliteConnection;
use tracing::{debug, instrument};

use crate::account::Account;
use crate::error::BankError;
use crate::transaction::{reference_number, Direction, TransactionRecord};
use crate::transfer::{Transfer, TransferMode, TransferStatus};

/// Load an account row or fail with `AccountNotFound`.
pub async fn fetch_account_in(
    conn: &mut SqliteConnection,
    account: AccountId,
) -> Result<Account, BankError> {
    let row = sqlx::query("SELECT * FROM accounts WHERE account_id = ?")
        .bind(account.get())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(BankError::AccountNotFound(account))?;
    Account::from_row(&row)
}

/// List a customer's accounts in enumeration order (oldest first).
///
/// The order is what [`crate::account::AccountSelection::Index`]
/// indexes into, so enumerated lists shown to the user and retried
/// selections always agree.
pub async fn accounts_for_in(
    conn: &mut SqliteConnection,
    customer: BankCustomerId,
) -> Result<Vec<Account>, BankError> {
    let rows = sqlx::query("SELECT * FROM accounts WHERE customer_id = ? ORDER BY account_id")
        .bind(customer.get())
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(Account::from_row).collect()
}

/// Apply one signed balance change and append the matching ledger entry.
async fn post_in(
    conn: &mut SqliteConnection,
    account: AccountId,
    direction: Direction,
    amount: Money,
    description: &str,
    reference_no: &str,
) -> Result<TransactionRecord, BankError> {
    if !amount.is_positive() {
        return Err(BankError::InvalidAmount);
    }

    let current = fetch_account_in(conn, account).await?;
    if direction == Direction::Debit && amount > current.balance {
        return Err(BankError::InsufficientFunds {
            balance: current.balance,
            requested: amount,
        });
    }

    let now = Utc::now();
    sqlx::query("UPDATE accounts SET balance = balance + ? WHERE account_id = ?")
        .bind(amount.paise() * direction.sign())
        .bind(account.get())
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query(
        "INSERT INTO transactions (account_id, direction, amount, posted_at, description, reference_no)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(account.get())
    .bind(direction.as_str())
    .bind(amount.paise())
    .bind(encode_ts(now))
    .bind(description)
    .bind(reference_no)
    .execute(&mut *conn)
    .await?;

    debug!(
        account = account.get(),
        direction = direction.as_str(),
        amount = amount.paise(),
        "ledger entry posted"
    );

    Ok(TransactionRecord {
        id: result.last_insert_rowid().into(),
        account_id: account,
        direction,
        amount,
        posted_at: now,
        description: Some(description.to_owned()),
        reference_no: reference_no.to_owned(),
    })
}

/// Credit an account inside the caller's transaction scope.
pub async fn credit_in(
    conn: &mut SqliteConnection,
    account: AccountId,
    amount: Money,
    description: &str,
) -> Result<TransactionRecord, BankError> {
    post_in(conn, account, Direction::Credit, amount, description, &reference_number()).await
}

/// Debit an account inside the caller's transaction scope.
///
/// Fails with `InsufficientFunds` before anything is written if the
/// balance cannot cover the amount.
pub async fn debit_in(
    conn: &mut SqliteConnection,
    account: AccountId,
    amount: Money,
    description: &str,
) -> Result<TransactionRecord, BankError> {
    post_in(conn, account, Direction::Debit, amount, description, &reference_number()).await
}

/// Receipt for one completed transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub transfer: Transfer,
    pub debit: TransactionRecord,
    pub credit: TransactionRecord,
}

/// Move funds between two accounts inside the caller's scope.
///
/// Debits the source, credits the destination, and writes one transfer
/// row, all sharing a fresh reference number. The caller's transaction
/// makes the three effects atomic: an error from any step leaves the
/// scope poisoned and nothing visible after rollback.
pub async fn transfer_in(
    conn: &mut SqliteConnection,
    from: AccountId,
    to: AccountId,
    amount: Money,
    mode: TransferMode,
) -> Result<TransferReceipt, BankError> {
    transfer_described_in(
        conn,
        from,
        to,
        amount,
        mode,
        &format!("{mode} transfer to account {to}"),
        &format!("{mode} transfer from account {from}"),
    )
    .await
}

/// [`transfer_in`] with caller-supplied entry descriptions.
///
/// Descriptions are fixed at insert time; ledger entries are never
/// rewritten after the fact.
pub async fn transfer_described_in(
    conn: &mut SqliteConnection,
    from: AccountId,
    to: AccountId,
    amount: Money,
    mode: TransferMode,
    debit_description: &str,
    credit_description: &str,
) -> Result<TransferReceipt, BankError> {
    let reference_no = reference_number();

    let debit = post_in(conn, from, Direction::Debit, amount, debit_description, &reference_no)
        .await?;
    let credit =
        post_in(conn, to, Direction::Credit, amount, credit_description, &reference_no).await?;

    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO transfers (from_account_id, to_account_id, amount, mode, status, transferred_at, reference_no)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(from.get())
    .bind(to.get())
    .bind(amount.paise())
    .bind(mode.as_str())
    .bind(TransferStatus::Success.as_str())
    .bind(encode_ts(now))
    .bind(&reference_no)
    .execute(&mut *conn)
    .await?;

    Ok(TransferReceipt {
        transfer: Transfer {
            id: result.last_insert_rowid().into(),
            from_account_id: from,
            to_account_id: to,
            amount,
            mode,
            status: TransferStatus::Success,
            transferred_at: now,
            reference_no,
        },
        debit,
        credit,
    })
}

/// The subsystem of record for balances and money movement.
#[derive(Clone)]
pub struct Ledger {
    db: Db,
}

impl Ledger {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Credit an account in its own transaction scope.
    #[instrument(skip(self))]
    pub async fn credit(
        &self,
        account: AccountId,
        amount: Money,
        description: &str,
    ) -> Result<TransactionRecord, BankError> {
        let mut tx = self.db.begin().await?;
        let record = credit_in(&mut tx, account, amount, description).await?;
        tx.commit().await.map_err(mart_db::DbError::from)?;
        Ok(record)
    }

    /// Debit an account in its own transaction scope.
    #[instrument(skip(self))]
    pub async fn debit(
        &self,
        account: AccountId,
        amount: Money,
        description: &str,
    ) -> Result<TransactionRecord, BankError> {
        let mut tx = self.db.begin().await?;
        let record = debit_in(&mut tx, account, amount, description).await?;
        tx.commit().await.map_err(mart_db::DbError::from)?;
        Ok(record)
    }

    /// Transfer between two accounts as one atomic unit.
    #[instrument(skip(self))]
    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Money,
        mode: TransferMode,
    ) -> Result<TransferReceipt, BankError> {
        let mut tx = self.db.begin().await?;
        let receipt = transfer_in(&mut tx, from, to, amount, mode).await?;
        tx.commit().await.map_err(mart_db::DbError::from)?;
        Ok(receipt)
    }

    /// Cash deposit: a standalone credit with a fixed description.
    pub async fn deposit(
        &self,
        account: AccountId,
        amount: Money,
    ) -> Result<TransactionRecord, BankError> {
        self.credit(account, amount, "Cash deposit").await
    }

    /// Current balance of an account.
    pub async fn balance(&self, account: AccountId) -> Result<Money, BankError> {
        let mut conn = self.db.pool().acquire().await.map_err(mart_db::DbError::from)?;
        Ok(fetch_account_in(&mut conn, account).await?.balance)
    }

    /// All accounts owned by a bank customer, oldest first.
    pub async fn accounts_for(&self, customer: BankCustomerId) -> Result<Vec<Account>, BankError> {
        let mut conn = self.db.pool().acquire().await.map_err(mart_db::DbError::from)?;
        accounts_for_in(&mut conn, customer).await
    }

    /// Recent ledger entries for an account, newest first.
    pub async fn statement(
        &self,
        account: AccountId,
        limit: i64,
    ) -> Result<Vec<TransactionRecord>, BankError> {
        let rows = sqlx::query(
            "SELECT * FROM transactions WHERE account_id = ?
             ORDER BY transaction_id DESC LIMIT ?",
        )
        .bind(account.get())
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;
        rows.iter().map(TransactionRecord::from_row).collect()
    }

    /// Transfer history touching an account, newest first.
    pub async fn transfers_for(&self, account: AccountId) -> Result<Vec<Transfer>, BankError> {
        let rows = sqlx::query(
            "SELECT * FROM transfers WHERE from_account_id = ? OR to_account_id = ?
             ORDER BY transfer_id DESC",
        )
        .bind(account.get())
        .bind(account.get())
        .fetch_all(self.db.pool())
        .await?;
        rows.iter().map(Transfer::from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[tokio::test]
    async fn test_credit_then_debit_updates_balance() {
        let (db, _, account) = testutil::bank_with_account(50_000).await;
        let ledger = Ledger::new(db);

        ledger.credit(account, Money::from_paise(10_000), "gift").await.unwrap();
        ledger.debit(account, Money::from_paise(25_000), "spend").await.unwrap();

        assert_eq!(ledger.balance(account).await.unwrap(), Money::from_paise(35_000));
    }

    #[tokio::test]
    async fn test_debit_rejects_overdraft() {
        let (db, _, account) = testutil::bank_with_account(500).await;
        let ledger = Ledger::new(db);

        let err = ledger
            .debit(account, Money::from_paise(501), "too much")
            .await
            .unwrap_err();
        assert!(matches!(err, BankError::InsufficientFunds { .. }));
        assert_eq!(ledger.balance(account).await.unwrap(), Money::from_paise(500));
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let db = testutil::bank().await;
        let ledger = Ledger::new(db);
        let ghost = AccountId::new(9_999);

        let err = ledger.credit(ghost, Money::from_paise(1), "x").await.unwrap_err();
        assert!(matches!(err, BankError::AccountNotFound(id) if id == ghost));
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let (db, _, account) = testutil::bank_with_account(1_000).await;
        let ledger = Ledger::new(db);

        let err = ledger.credit(account, Money::ZERO, "nothing").await.unwrap_err();
        assert!(matches!(err, BankError::InvalidAmount));
    }

    #[tokio::test]
    async fn test_transfer_moves_both_balances_and_pairs_rows() {
        let (db, _, from) = testutil::bank_with_account(50_000).await;
        let to = testutil::open_account(&db, "payee@example.com", 0).await;
        let ledger = Ledger::new(db);

        let receipt = ledger
            .transfer(from, to, Money::from_paise(20_000), TransferMode::Imps)
            .await
            .unwrap();

        assert_eq!(receipt.debit.reference_no, receipt.credit.reference_no);
        assert_eq!(receipt.transfer.reference_no, receipt.debit.reference_no);
        assert_eq!(ledger.balance(from).await.unwrap(), Money::from_paise(30_000));
        assert_eq!(ledger.balance(to).await.unwrap(), Money::from_paise(20_000));
    }

    #[tokio::test]
    async fn test_failed_transfer_writes_nothing() {
        let (db, _, from) = testutil::bank_with_account(500).await;
        let to = testutil::open_account(&db, "payee@example.com", 0).await;
        let ledger = Ledger::new(db.clone());

        ledger.transfer(from, to, Money::from_paise(500), TransferMode::Imps).await.unwrap();
        let err = ledger
            .transfer(from, to, Money::from_paise(1), TransferMode::Imps)
            .await
            .unwrap_err();
        assert!(matches!(err, BankError::InsufficientFunds { .. }));

        assert_eq!(ledger.balance(from).await.unwrap(), Money::ZERO);
        assert_eq!(ledger.balance(to).await.unwrap(), Money::from_paise(500));

        let (transfers,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transfers")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(transfers, 1);
    }

    #[tokio::test]
    async fn test_balance_equals_signed_transaction_sum() {
        let (db, _, account) = testutil::bank_with_account(10_000).await;
        let ledger = Ledger::new(db.clone());

        ledger.credit(account, Money::from_paise(3_000), "a").await.unwrap();
        ledger.debit(account, Money::from_paise(4_500), "b").await.unwrap();
        ledger.deposit(account, Money::from_paise(200)).await.unwrap();

        let (signed_sum,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(CASE direction WHEN 'Credit' THEN amount ELSE -amount END), 0)
             FROM transactions WHERE account_id = ?",
        )
        .bind(account.get())
        .fetch_one(db.pool())
        .await
        .unwrap();

        // The opening deposit is itself a ledger entry, so the signed
        // sum covers the whole balance.
        assert_eq!(ledger.balance(account).await.unwrap().paise(), signed_sum);
    }

    #[tokio::test]
    async fn test_statement_newest_first() {
        let (db, _, account) = testutil::bank_with_account(10_000).await;
        let ledger = Ledger::new(db);

        ledger.credit(account, Money::from_paise(100), "first").await.unwrap();
        ledger.credit(account, Money::from_paise(200), "second").await.unwrap();

        let entries = ledger.statement(account, 10).await.unwrap();
        assert_eq!(entries[0].description.as_deref(), Some("second"));
        assert_eq!(entries[1].description.as_deref(), Some("first"));
    }
}
