//! Storefront signup and login.
//!
//! Independent of the banking authentication bridge: a commerce login
//! never grants money movement, and the two customer id spaces stay
//! uncorrelated except per-transaction.

use chrono::{DateTime, Utc};
use mart_core::secret::{hash_secret, verify_secret};
use mart_core::CustomerId;
use mart_db::{decode_ts, encode_ts, is_unique_violation, Db, DbError};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, instrument};

use crate::error::CommerceError;

/// A storefront customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    fn from_row(row: &SqliteRow) -> Result<Self, CommerceError> {
        let created_raw: String = row.try_get("created_at")?;
        Ok(Self {
            id: CustomerId::new(row.try_get("customer_id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            created_at: decode_ts("created_at", &created_raw)?,
        })
    }
}

/// Signup details.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub secret: String,
}

/// Customer identity repository.
#[derive(Clone)]
pub struct Identity {
    db: Db,
}

impl Identity {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Register a storefront customer. Emails are unique.
    #[instrument(skip(self, new), fields(email = %new.email))]
    pub async fn signup(&self, new: NewCustomer) -> Result<Customer, CommerceError> {
        let hash = hash_secret(&new.secret)?;
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO customers (name, email, phone, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&hash)
        .bind(encode_ts(now))
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CommerceError::EmailTaken(new.email.clone())
            } else {
                CommerceError::Db(DbError::from(e))
            }
        })?;

        let id = CustomerId::new(result.last_insert_rowid());
        info!(customer = id.get(), "storefront signup");
        Ok(Customer {
            id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            created_at: now,
        })
    }

    /// Log in by email. Unknown email and wrong password are not
    /// distinguished.
    pub async fn login(&self, email: &str, secret: &str) -> Result<Customer, CommerceError> {
        let row = sqlx::query("SELECT * FROM customers WHERE email = ?")
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(CommerceError::LoginFailed)?;

        let hash: String = row.try_get("password_hash")?;
        if !verify_secret(secret, &hash) {
            return Err(CommerceError::LoginFailed);
        }
        Customer::from_row(&row)
    }

    /// Load a profile by id.
    pub async fn get(&self, id: CustomerId) -> Result<Customer, CommerceError> {
        let row = sqlx::query("SELECT * FROM customers WHERE customer_id = ?")
            .bind(id.get())
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(CommerceError::LoginFailed)?;
        Customer::from_row(&row)
    }
}
