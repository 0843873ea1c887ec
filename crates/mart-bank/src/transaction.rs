//! Ledger entries.
//!
//! Every balance change appends exactly one row here. Rows are
//! append-only: nothing in the crate updates or deletes them, so the
//! signed sum of an account's entries always reconciles to its balance.

use chrono::{DateTime, Utc};
use mart_core::{AccountId, Money, TransactionId};
use mart_db::{decode_ts, DbError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::fmt;

use crate::error::BankError;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "Credit",
            Direction::Debit => "Debit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Credit" => Some(Direction::Credit),
            "Debit" => Some(Direction::Debit),
            _ => None,
        }
    }

    /// Sign applied to the account balance: +1 for credit, -1 for debit.
    pub fn sign(&self) -> i64 {
        match self {
            Direction::Credit => 1,
            Direction::Debit => -1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ledger entry on an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub direction: Direction,
    pub amount: Money,
    pub posted_at: DateTime<Utc>,
    pub description: Option<String>,
    pub reference_no: String,
}

impl TransactionRecord {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, BankError> {
        let direction_raw: String = row.try_get("direction")?;
        let posted_raw: String = row.try_get("posted_at")?;

        Ok(Self {
            id: TransactionId::new(row.try_get("transaction_id")?),
            account_id: AccountId::new(row.try_get("account_id")?),
            direction: Direction::parse(&direction_raw).ok_or(DbError::Column {
                column: "direction",
                value: direction_raw,
            })?,
            amount: Money::from_paise(row.try_get("amount")?),
            posted_at: decode_ts("posted_at", &posted_raw)?,
            description: row.try_get("description")?,
            reference_no: row.try_get("reference_no")?,
        })
    }
}

/// Generate a random 16-digit reference number.
///
/// Links the paired debit/credit rows of a transfer for traceability;
/// collisions are tolerable because the reference is never used as a
/// key or for idempotency.
pub fn reference_number() -> String {
    let n: u64 = rand::thread_rng().gen_range(0..10_000_000_000_000_000);
    format!("{n:016}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_round_trip() {
        assert_eq!(Direction::parse("Credit"), Some(Direction::Credit));
        assert_eq!(Direction::parse("Debit"), Some(Direction::Debit));
        assert_eq!(Direction::parse("credit"), None);
        assert_eq!(Direction::Debit.as_str(), "Debit");
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Credit.sign(), 1);
        assert_eq!(Direction::Debit.sign(), -1);
    }

    #[test]
    fn test_reference_number_shape() {
        for _ in 0..50 {
            let r = reference_number();
            assert_eq!(r.len(), 16);
            assert!(r.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
