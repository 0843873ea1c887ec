//! Shared fixtures for the unit tests.

use mart_core::{AccountId, BankCustomerId, Money};
use mart_db::Db;

use crate::account::AccountType;
use crate::customer::{Customers, NewBankCustomer};

/// The secret every fixture customer is opened with.
pub const TEST_SECRET: &str = "correct horse battery";

/// Fresh in-memory database with the schema applied.
pub async fn bank() -> Db {
    Db::open_in_memory().await.expect("in-memory database")
}

/// Database plus one customer owning one Savings account with the
/// given opening balance (in paise).
pub async fn bank_with_account(balance: i64) -> (Db, BankCustomerId, AccountId) {
    let db = bank().await;
    let account = open_account(&db, "fixture@example.com", balance).await;
    let (customer,): (i64,) = sqlx::query_as("SELECT customer_id FROM accounts WHERE account_id = ?")
        .bind(account.get())
        .fetch_one(db.pool())
        .await
        .expect("fixture account");
    (db, BankCustomerId::new(customer), account)
}

/// Open a customer + account pair directly through the public path.
pub async fn open_account(db: &Db, email: &str, balance: i64) -> AccountId {
    let customers = Customers::new(db.clone());
    let (_, account) = customers
        .open(NewBankCustomer {
            name: format!("Fixture {email}"),
            email: email.to_owned(),
            phone: None,
            address: None,
            secret: TEST_SECRET.to_owned(),
            account_type: AccountType::Savings,
            ifsc: None,
            opening_deposit: (balance > 0).then(|| Money::from_paise(balance)),
        })
        .await
        .expect("fixture customer");
    account.id
}

/// Raw balance read, in paise.
pub async fn balance_of(db: &Db, account: AccountId) -> i64 {
    let (balance,): (i64,) = sqlx::query_as("SELECT balance FROM accounts WHERE account_id = ?")
        .bind(account.get())
        .fetch_one(db.pool())
        .await
        .expect("balance");
    balance
}
