//! The fixed merchant: the single receiving account for all storefront
//! payments and the source of all refunds.

use chrono::Utc;
use mart_core::secret::hash_secret;
use mart_core::BankCustomerId;
use mart_db::{encode_ts, Db, DbError};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::SqliteConnection;
use tracing::info;

use crate::account::{open_account_in, Account, AccountType};
use crate::error::BankError;

/// Default display name of the merchant's banking profile.
pub const DEFAULT_MERCHANT_NAME: &str = "Mart Merchant";

/// Resolve the merchant's receiving account by profile name.
pub async fn merchant_account_in(
    conn: &mut SqliteConnection,
    merchant_name: &str,
) -> Result<Account, BankError> {
    let row = sqlx::query(
        "SELECT a.* FROM accounts a
         JOIN bank_customers c ON c.customer_id = a.customer_id
         WHERE c.name = ?
         ORDER BY a.account_id
         LIMIT 1",
    )
    .bind(merchant_name)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(BankError::MerchantAccountMissing)?;
    Account::from_row(&row)
}

/// Create the merchant profile and its Current account if absent.
///
/// Safe to run on every startup. The profile's credential is a random
/// throwaway: the merchant never authenticates, money only leaves its
/// account through the refund path.
pub async fn bootstrap_merchant(db: &Db, merchant_name: &str) -> Result<Account, BankError> {
    let mut tx = db.begin().await?;

    match merchant_account_in(&mut tx, merchant_name).await {
        Ok(existing) => return Ok(existing),
        Err(BankError::MerchantAccountMissing) => {}
        Err(err) => return Err(err),
    }

    let throwaway: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let hash = hash_secret(&throwaway)?;
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO bank_customers (name, email, phone, address, password_hash, created_at)
         VALUES (?, ?, NULL, NULL, ?, ?)",
    )
    .bind(merchant_name)
    .bind(format!("{}@merchant.invalid", merchant_name.to_lowercase().replace(' ', ".")))
    .bind(&hash)
    .bind(encode_ts(now))
    .execute(&mut *tx)
    .await?;

    let customer_id = BankCustomerId::new(result.last_insert_rowid());
    let account =
        open_account_in(&mut tx, customer_id, AccountType::Current, None, now).await?;

    tx.commit().await.map_err(DbError::from)?;
    info!(account = account.id.get(), name = merchant_name, "merchant account provisioned");
    Ok(account)
}
