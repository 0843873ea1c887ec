//! Bank customer profiles and account opening.

use chrono::{DateTime, Utc};
use mart_core::secret::hash_secret;
use mart_core::{BankCustomerId, Money};
use mart_db::{decode_ts, encode_ts, is_unique_violation, Db, DbError};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::{info, instrument};

use crate::account::{open_account_in, Account, AccountType};
use crate::error::BankError;
use crate::ledger::credit_in;

/// A banking identity, distinct from the storefront customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankCustomer {
    pub id: BankCustomerId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BankCustomer {
    fn from_row(row: &SqliteRow) -> Result<Self, BankError> {
        let created_raw: String = row.try_get("created_at")?;
        Ok(Self {
            id: BankCustomerId::new(row.try_get("customer_id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            created_at: decode_ts("created_at", &created_raw)?,
        })
    }
}

/// Details for opening a banking profile with its first account.
#[derive(Debug, Clone)]
pub struct NewBankCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub secret: String,
    pub account_type: AccountType,
    /// IFSC code of the home branch; resolved against the branch
    /// directory, unknown codes leave the branch unset.
    pub ifsc: Option<String>,
    pub opening_deposit: Option<Money>,
}

/// Bank customer repository.
#[derive(Clone)]
pub struct Customers {
    db: Db,
}

impl Customers {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Open a banking profile and its first account, with an optional
    /// opening deposit, as one unit.
    #[instrument(skip(self, new), fields(email = %new.email))]
    pub async fn open(&self, new: NewBankCustomer) -> Result<(BankCustomer, Account), BankError> {
        let hash = hash_secret(&new.secret)?;
        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let branch = match &new.ifsc {
            Some(code) => lookup_branch_in(&mut tx, code).await?,
            None => None,
        };

        let result = sqlx::query(
            "INSERT INTO bank_customers (name, email, phone, address, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(&hash)
        .bind(encode_ts(now))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BankError::EmailTaken(new.email.clone())
            } else {
                BankError::Db(DbError::from(e))
            }
        })?;

        let customer_id = BankCustomerId::new(result.last_insert_rowid());
        let mut account =
            open_account_in(&mut tx, customer_id, new.account_type, branch.as_deref(), now).await?;

        if let Some(deposit) = new.opening_deposit {
            credit_in(&mut tx, account.id, deposit, "Opening deposit").await?;
            account.balance = deposit;
        }

        tx.commit().await.map_err(DbError::from)?;
        info!(
            customer = customer_id.get(),
            account = account.id.get(),
            "banking profile opened"
        );

        Ok((
            BankCustomer {
                id: customer_id,
                name: new.name,
                email: new.email,
                phone: new.phone,
                address: new.address,
                created_at: now,
            },
            account,
        ))
    }

    /// Open an additional account for an existing customer.
    pub async fn open_account(
        &self,
        customer: BankCustomerId,
        account_type: AccountType,
        ifsc: Option<&str>,
    ) -> Result<Account, BankError> {
        let mut tx = self.db.begin().await?;
        self.get_in(&mut tx, customer).await?;
        let branch = match ifsc {
            Some(code) => lookup_branch_in(&mut tx, code).await?,
            None => None,
        };
        let account =
            open_account_in(&mut tx, customer, account_type, branch.as_deref(), Utc::now()).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(account)
    }

    /// Load a profile by id.
    pub async fn get(&self, id: BankCustomerId) -> Result<BankCustomer, BankError> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        self.get_in(&mut conn, id).await
    }

    /// Replace a profile's contact details.
    pub async fn update(
        &self,
        id: BankCustomerId,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<BankCustomer, BankError> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        self.get_in(&mut conn, id).await?;

        sqlx::query("UPDATE bank_customers SET phone = ?, address = ? WHERE customer_id = ?")
            .bind(phone)
            .bind(address)
            .bind(id.get())
            .execute(&mut *conn)
            .await?;
        self.get_in(&mut conn, id).await
    }

    async fn get_in(
        &self,
        conn: &mut SqliteConnection,
        id: BankCustomerId,
    ) -> Result<BankCustomer, BankError> {
        let row = sqlx::query("SELECT * FROM bank_customers WHERE customer_id = ?")
            .bind(id.get())
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(BankError::CustomerNotFound(id))?;
        BankCustomer::from_row(&row)
    }
}

/// Resolve a branch display name from the IFSC directory.
async fn lookup_branch_in(
    conn: &mut SqliteConnection,
    ifsc: &str,
) -> Result<Option<String>, BankError> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT bank_name, branch FROM ifsc_branches WHERE ifsc_code = ?")
            .bind(ifsc)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row.map(|(bank, branch)| format!("{bank}, {branch}")))
}
