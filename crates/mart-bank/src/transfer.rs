//! Fund-transfer records.

use chrono::{DateTime, Utc};
use mart_core::{AccountId, Money, TransferId};
use mart_db::{decode_ts, DbError};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::fmt;

use crate::error::BankError;

/// Transfer rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferMode {
    Neft,
    Imps,
    Rtgs,
}

impl TransferMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMode::Neft => "NEFT",
            TransferMode::Imps => "IMPS",
            TransferMode::Rtgs => "RTGS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEFT" => Some(TransferMode::Neft),
            "IMPS" => Some(TransferMode::Imps),
            "RTGS" => Some(TransferMode::Rtgs),
            _ => None,
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome recorded on a transfer row.
///
/// A row is only written once the paired debit/credit have both
/// succeeded, so `Success` is the only status the ledger writes today;
/// `Failed` exists for operator corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    Success,
    Failed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Success => "Success",
            TransferStatus::Failed => "Failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Success" => Some(TransferStatus::Success),
            "Failed" => Some(TransferStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One completed movement of funds between two accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Money,
    pub mode: TransferMode,
    pub status: TransferStatus,
    pub transferred_at: DateTime<Utc>,
    pub reference_no: String,
}

impl Transfer {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, BankError> {
        let mode_raw: String = row.try_get("mode")?;
        let status_raw: String = row.try_get("status")?;
        let at_raw: String = row.try_get("transferred_at")?;

        Ok(Self {
            id: TransferId::new(row.try_get("transfer_id")?),
            from_account_id: AccountId::new(row.try_get("from_account_id")?),
            to_account_id: AccountId::new(row.try_get("to_account_id")?),
            amount: Money::from_paise(row.try_get("amount")?),
            mode: TransferMode::parse(&mode_raw).ok_or(DbError::Column {
                column: "mode",
                value: mode_raw,
            })?,
            status: TransferStatus::parse(&status_raw).ok_or(DbError::Column {
                column: "status",
                value: status_raw,
            })?,
            transferred_at: decode_ts("transferred_at", &at_raw)?,
            reference_no: row.try_get("reference_no")?,
        })
    }
}
