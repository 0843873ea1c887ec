//! Banking flows through the public API: profile opening, deposits,
//! statements, beneficiary transfers, and the payment/refund rail.

use mart_bank::merchant::{bootstrap_merchant, DEFAULT_MERCHANT_NAME};
use mart_bank::{
    AccountSelection, AccountType, BankCredentials, BankError, Beneficiaries, Customers, Ledger,
    NewBankCustomer, PaymentProcessor, TransferMode,
};
use mart_core::Money;
use mart_db::Db;

const SECRET: &str = "vault code 9";

fn profile(email: &str, deposit: i64) -> NewBankCustomer {
    NewBankCustomer {
        name: format!("Holder {email}"),
        email: email.into(),
        phone: None,
        address: None,
        secret: SECRET.into(),
        account_type: AccountType::Savings,
        ifsc: None,
        opening_deposit: (deposit > 0).then(|| Money::from_paise(deposit)),
    }
}

#[tokio::test]
async fn deposit_shows_up_on_the_statement() {
    let db = Db::open_in_memory().await.unwrap();
    let customers = Customers::new(db.clone());
    let ledger = Ledger::new(db);

    let (customer, account) = customers.open(profile("a@example.com", 50_000)).await.unwrap();
    ledger.deposit(account.id, Money::from_paise(25_000)).await.unwrap();

    assert_eq!(ledger.balance(account.id).await.unwrap(), Money::from_paise(75_000));

    let statement = ledger.statement(account.id, 10).await.unwrap();
    assert_eq!(statement.len(), 2);
    assert_eq!(statement[0].description.as_deref(), Some("Cash deposit"));
    assert_eq!(statement[1].description.as_deref(), Some("Opening deposit"));

    let accounts = ledger.accounts_for(customer.id).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].balance, Money::from_paise(75_000));
}

#[tokio::test]
async fn beneficiary_transfer_appears_in_both_histories() {
    let db = Db::open_in_memory().await.unwrap();
    let customers = Customers::new(db.clone());
    let ledger = Ledger::new(db.clone());
    let beneficiaries = Beneficiaries::new(db);

    let (sender, sender_account) = customers.open(profile("s@example.com", 60_000)).await.unwrap();
    let (_, payee_account) = customers.open(profile("p@example.com", 0)).await.unwrap();

    let saved = beneficiaries
        .add(sender.id, "Payee", payee_account.id.get(), Some("Mart Bank"), None)
        .await
        .unwrap();
    let receipt = beneficiaries
        .transfer_to_beneficiary(
            &BankCredentials::new(sender.id, SECRET),
            saved.id,
            AccountSelection::Auto,
            Money::from_paise(15_000),
        )
        .await
        .unwrap();
    assert_eq!(receipt.transfer.mode, TransferMode::Neft);

    assert_eq!(ledger.balance(sender_account.id).await.unwrap(), Money::from_paise(45_000));
    assert_eq!(ledger.balance(payee_account.id).await.unwrap(), Money::from_paise(15_000));

    let outgoing = ledger.transfers_for(sender_account.id).await.unwrap();
    let incoming = ledger.transfers_for(payee_account.id).await.unwrap();
    assert_eq!(outgoing.len(), 1);
    assert_eq!(incoming.len(), 1);
    assert_eq!(outgoing[0].reference_no, incoming[0].reference_no);
}

#[tokio::test]
async fn payment_and_refund_round_trip_through_merchant() {
    let db = Db::open_in_memory().await.unwrap();
    let merchant = bootstrap_merchant(&db, DEFAULT_MERCHANT_NAME).await.unwrap();
    let customers = Customers::new(db.clone());
    let ledger = Ledger::new(db.clone());
    let processor = PaymentProcessor::new(DEFAULT_MERCHANT_NAME);

    let (customer, account) = customers.open(profile("c@example.com", 80_000)).await.unwrap();

    let mut tx = db.begin().await.unwrap();
    processor
        .process(&mut tx, customer.id, Money::from_paise(30_000), AccountSelection::Auto)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert_eq!(ledger.balance(merchant.id).await.unwrap(), Money::from_paise(30_000));

    let mut tx = db.begin().await.unwrap();
    processor.refund(&mut tx, customer.id, Money::from_paise(30_000), 1).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(ledger.balance(account.id).await.unwrap(), Money::from_paise(80_000));
    assert_eq!(ledger.balance(merchant.id).await.unwrap(), Money::ZERO);
}

#[tokio::test]
async fn selection_is_required_with_multiple_accounts() {
    let db = Db::open_in_memory().await.unwrap();
    bootstrap_merchant(&db, DEFAULT_MERCHANT_NAME).await.unwrap();
    let customers = Customers::new(db.clone());
    let processor = PaymentProcessor::new(DEFAULT_MERCHANT_NAME);

    let (customer, _) = customers.open(profile("m@example.com", 40_000)).await.unwrap();
    customers.open_account(customer.id, AccountType::Current, None).await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let err = processor
        .process(&mut tx, customer.id, Money::from_paise(1_000), AccountSelection::Auto)
        .await
        .unwrap_err();
    assert!(matches!(err, BankError::SelectionRequired { count: 2 }));
    drop(tx);

    // Retrying with the explicit first account succeeds.
    let mut tx = db.begin().await.unwrap();
    processor
        .process(&mut tx, customer.id, Money::from_paise(1_000), AccountSelection::Index(1))
        .await
        .unwrap();
    tx.commit().await.unwrap();
}
