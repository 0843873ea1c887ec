//! Bank account records and funding-account selection.

use chrono::{DateTime, Datelike, Utc};
use mart_core::{AccountId, BankCustomerId, Money};
use mart_db::{decode_ts, encode_ts, DbError};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::fmt;

use crate::error::BankError;

/// Type of a bank account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Savings,
    Current,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "Savings",
            AccountType::Current => "Current",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Savings" => Some(AccountType::Savings),
            "Current" => Some(AccountType::Current),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Inactive,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::Inactive => "Inactive",
            AccountStatus::Closed => "Closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Active" => Some(AccountStatus::Active),
            "Inactive" => Some(AccountStatus::Inactive),
            "Closed" => Some(AccountStatus::Closed),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bank account row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub customer_id: BankCustomerId,
    pub account_type: AccountType,
    pub balance: Money,
    pub branch: Option<String>,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, BankError> {
        let type_raw: String = row.try_get("account_type")?;
        let status_raw: String = row.try_get("status")?;
        let created_raw: String = row.try_get("created_at")?;

        Ok(Self {
            id: AccountId::new(row.try_get("account_id")?),
            customer_id: BankCustomerId::new(row.try_get("customer_id")?),
            account_type: AccountType::parse(&type_raw).ok_or(DbError::Column {
                column: "account_type",
                value: type_raw,
            })?,
            balance: Money::from_paise(row.try_get("balance")?),
            branch: row.try_get("branch")?,
            status: AccountStatus::parse(&status_raw).ok_or(DbError::Column {
                column: "status",
                value: status_raw,
            })?,
            created_at: decode_ts("created_at", &created_raw)?,
        })
    }
}

/// Allocate the next date-prefixed account number (`YYYYMMDDnn`).
///
/// The two-digit suffix restarts at 01 each day; numbers stay
/// recognizable in statements and sort by opening date.
pub(crate) async fn next_account_id_in(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> Result<AccountId, BankError> {
    let date = now.date_naive();
    let prefix =
        (date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64) * 100;

    let (max,): (Option<i64>,) =
        sqlx::query_as("SELECT MAX(account_id) FROM accounts WHERE account_id BETWEEN ? AND ?")
            .bind(prefix + 1)
            .bind(prefix + 99)
            .fetch_one(&mut *conn)
            .await?;

    Ok(AccountId::new(max.map_or(prefix + 1, |m| m + 1)))
}

/// Insert a new active account with a zero balance.
///
/// Opening deposits go through the ledger afterwards so the balance
/// stays equal to the signed sum of the account's entries.
pub(crate) async fn open_account_in(
    conn: &mut SqliteConnection,
    customer: BankCustomerId,
    account_type: AccountType,
    branch: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Account, BankError> {
    let id = next_account_id_in(conn, now).await?;

    sqlx::query(
        "INSERT INTO accounts (account_id, customer_id, account_type, balance, branch, status, created_at)
         VALUES (?, ?, ?, 0, ?, ?, ?)",
    )
    .bind(id.get())
    .bind(customer.get())
    .bind(account_type.as_str())
    .bind(branch)
    .bind(AccountStatus::Active.as_str())
    .bind(encode_ts(now))
    .execute(&mut *conn)
    .await?;

    Ok(Account {
        id,
        customer_id: customer,
        account_type,
        balance: Money::ZERO,
        branch: branch.map(str::to_owned),
        status: AccountStatus::Active,
        created_at: now,
    })
}

/// How a caller picked a funding account from its set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountSelection {
    /// Use the only account; valid when exactly one exists.
    Auto,
    /// 1-based index into the customer's enumerated account list.
    Index(usize),
}

/// Pick a funding account from a customer's account set.
///
/// Exactly one account auto-selects; more than one requires an explicit
/// 1-based index. The index space matches the enumerated list shown to
/// the user, so `Index(1)` is always the first account.
pub fn select_account(accounts: &[Account], selection: AccountSelection) -> Result<&Account, BankError> {
    if accounts.is_empty() {
        return Err(BankError::NoAccounts);
    }

    match selection {
        AccountSelection::Auto => {
            if accounts.len() == 1 {
                Ok(&accounts[0])
            } else {
                Err(BankError::SelectionRequired {
                    count: accounts.len(),
                })
            }
        }
        AccountSelection::Index(selected) => selected
            .checked_sub(1)
            .and_then(|i| accounts.get(i))
            .ok_or(BankError::InvalidSelection {
                selected,
                count: accounts.len(),
            }),
    }
}
