//! Beneficiary directory and beneficiary transfers.

use mart_core::{AccountId, BankCustomerId, BeneficiaryId, Money};
use mart_db::{is_unique_violation, Db, DbError};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::instrument;

use crate::account::{select_account, AccountSelection};
use crate::auth::{verify, BankCredentials};
use crate::error::BankError;
use crate::ledger::{accounts_for_in, transfer_in, TransferReceipt};
use crate::transfer::TransferMode;

/// A saved payee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: BeneficiaryId,
    pub customer_id: BankCustomerId,
    pub name: String,
    pub account_number: i64,
    pub bank_name: Option<String>,
    pub ifsc_code: Option<String>,
}

impl Beneficiary {
    fn from_row(row: &SqliteRow) -> Result<Self, BankError> {
        Ok(Self {
            id: BeneficiaryId::new(row.try_get("beneficiary_id")?),
            customer_id: BankCustomerId::new(row.try_get("customer_id")?),
            name: row.try_get("name")?,
            account_number: row.try_get("account_number")?,
            bank_name: row.try_get("bank_name")?,
            ifsc_code: row.try_get("ifsc_code")?,
        })
    }
}

/// Beneficiary repository and transfer entry point.
#[derive(Clone)]
pub struct Beneficiaries {
    db: Db,
}

impl Beneficiaries {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Save a payee. One row per (customer, account number).
    pub async fn add(
        &self,
        customer: BankCustomerId,
        name: &str,
        account_number: i64,
        bank_name: Option<&str>,
        ifsc_code: Option<&str>,
    ) -> Result<Beneficiary, BankError> {
        let result = sqlx::query(
            "INSERT INTO beneficiaries (customer_id, name, account_number, bank_name, ifsc_code)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(customer.get())
        .bind(name)
        .bind(account_number)
        .bind(bank_name)
        .bind(ifsc_code)
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BankError::DuplicateBeneficiary(account_number)
            } else {
                BankError::Db(DbError::from(e))
            }
        })?;

        Ok(Beneficiary {
            id: BeneficiaryId::new(result.last_insert_rowid()),
            customer_id: customer,
            name: name.to_owned(),
            account_number,
            bank_name: bank_name.map(str::to_owned),
            ifsc_code: ifsc_code.map(str::to_owned),
        })
    }

    /// All payees saved by a customer.
    pub async fn list(&self, customer: BankCustomerId) -> Result<Vec<Beneficiary>, BankError> {
        let rows =
            sqlx::query("SELECT * FROM beneficiaries WHERE customer_id = ? ORDER BY beneficiary_id")
                .bind(customer.get())
                .fetch_all(self.db.pool())
                .await?;
        rows.iter().map(Beneficiary::from_row).collect()
    }

    /// Authenticated NEFT transfer from one of the customer's accounts
    /// to a saved beneficiary.
    ///
    /// The beneficiary's account number must exist in this bank's
    /// books; an outside account surfaces as `AccountNotFound`. One
    /// transaction scope covers the whole movement.
    #[instrument(skip(self, credentials))]
    pub async fn transfer_to_beneficiary(
        &self,
        credentials: &BankCredentials,
        beneficiary: BeneficiaryId,
        selection: AccountSelection,
        amount: Money,
    ) -> Result<TransferReceipt, BankError> {
        let mut tx = self.db.begin().await?;

        let customer = verify(&mut tx, credentials).await?;

        let row = sqlx::query(
            "SELECT * FROM beneficiaries WHERE beneficiary_id = ? AND customer_id = ?",
        )
        .bind(beneficiary.get())
        .bind(customer.get())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(BankError::BeneficiaryNotFound(beneficiary))?;
        let payee = Beneficiary::from_row(&row)?;
        let destination = AccountId::new(payee.account_number);

        let accounts = accounts_for_in(&mut tx, customer).await?;
        let source = select_account(&accounts, selection)?.id;

        let receipt = transfer_in(&mut tx, source, destination, amount, TransferMode::Neft).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(receipt)
    }
}
