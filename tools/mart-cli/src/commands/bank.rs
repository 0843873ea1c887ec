//! `mart bank` - interactive banking session.

use anyhow::Result;
use dialoguer::{Input, Password, Select};
use mart_bank::{
    verify, Account, AccountSelection, AccountType, BankCredentials, Beneficiaries, Customers,
    Ledger, NewBankCustomer,
};
use mart_core::{AccountId, BankCustomerId, BeneficiaryId, Money};

use crate::context::Context;

struct Session {
    customers: Customers,
    ledger: Ledger,
    beneficiaries: Beneficiaries,
    customer: BankCustomerId,
}

pub async fn run(ctx: &Context) -> Result<()> {
    let customers = Customers::new(ctx.db.clone());
    let customer = login_or_open(ctx, &customers).await?;

    let session = Session {
        customers,
        ledger: Ledger::new(ctx.db.clone()),
        beneficiaries: Beneficiaries::new(ctx.db.clone()),
        customer,
    };

    loop {
        let choice = Select::new()
            .with_prompt("Banking")
            .items(&[
                "Accounts & balances",
                "Deposit cash",
                "Account statement",
                "Transfer history",
                "Beneficiaries",
                "Pay a beneficiary",
                "Open another account",
                "Update contact details",
                "Log out",
            ])
            .default(0)
            .interact()?;

        let result = match choice {
            0 => accounts(ctx, &session).await,
            1 => deposit(ctx, &session).await,
            2 => statement(ctx, &session).await,
            3 => transfer_history(ctx, &session).await,
            4 => beneficiaries(ctx, &session).await,
            5 => pay_beneficiary(ctx, &session).await,
            6 => open_account(ctx, &session).await,
            7 => update_contact(ctx, &session).await,
            _ => return Ok(()),
        };

        if let Err(err) = result {
            ctx.output.error(&format!("{:#}", err));
        }
    }
}

async fn login_or_open(ctx: &Context, customers: &Customers) -> Result<BankCustomerId> {
    loop {
        let choice = Select::new()
            .with_prompt("Banking profile")
            .items(&["Log in", "Open a new profile"])
            .default(0)
            .interact()?;

        let attempt = if choice == 0 {
            let credentials = prompt_credentials()?;
            let mut conn = ctx.db.pool().acquire().await?;
            match verify(&mut conn, &credentials).await {
                Ok(id) => {
                    let profile = customers.get(id).await?;
                    ctx.output.success(&format!("Welcome back, {}", profile.name));
                    return Ok(id);
                }
                Err(err) => Err(err),
            }
        } else {
            match open_profile(ctx, customers).await? {
                Ok(id) => return Ok(id),
                Err(err) => Err(err),
            }
        };

        match attempt {
            Ok(id) => return Ok(id),
            Err(err) if err.is_recoverable() => ctx.output.warn(&format!("{err}")),
            Err(err) => return Err(err.into()),
        }
    }
}

// Outer Result is prompt/config failure; inner carries the recoverable
// banking outcome back to the login loop.
async fn open_profile(
    ctx: &Context,
    customers: &Customers,
) -> Result<std::result::Result<BankCustomerId, mart_bank::BankError>> {
    let name: String = Input::new().with_prompt("Name").interact_text()?;
    let email: String = Input::new().with_prompt("Email").interact_text()?;
    let phone: String = Input::new()
        .with_prompt("Phone (optional)")
        .allow_empty(true)
        .interact_text()?;
    let secret = Password::new()
        .with_prompt("Banking password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;
    let account_type = prompt_account_type()?;
    let ifsc: String = Input::new()
        .with_prompt("Home branch IFSC (optional)")
        .allow_empty(true)
        .interact_text()?;
    let deposit: f64 = Input::new()
        .with_prompt("Opening deposit in rupees (0 for none)")
        .interact_text()?;

    let opening_deposit = (deposit > 0.0).then(|| Money::from_rupees(deposit));
    let new = NewBankCustomer {
        name,
        email,
        phone: (!phone.is_empty()).then_some(phone),
        address: None,
        secret,
        account_type,
        ifsc: (!ifsc.is_empty()).then_some(ifsc),
        opening_deposit,
    };

    match customers.open(new).await {
        Ok((customer, account)) => {
            ctx.output.success(&format!("Profile opened for {}", customer.name));
            ctx.output.kv("Customer id", &customer.id.to_string());
            ctx.output.kv("Account number", &account.id.to_string());
            ctx.output.info("Log in with the customer id, not the email");
            Ok(Ok(customer.id))
        }
        Err(err) => Ok(Err(err)),
    }
}

async fn accounts(ctx: &Context, session: &Session) -> Result<()> {
    ctx.output.header("Accounts");
    for account in session.ledger.accounts_for(session.customer).await? {
        describe_account(ctx, &account);
    }
    Ok(())
}

async fn deposit(ctx: &Context, session: &Session) -> Result<()> {
    let account = pick_account(ctx, session).await?;
    let rupees: f64 = Input::new().with_prompt("Amount in rupees").interact_text()?;
    let record = session
        .ledger
        .deposit(account, Money::from_rupees(rupees))
        .await?;
    ctx.output.success(&format!(
        "Deposited {} (ref {})",
        record.amount, record.reference_no
    ));
    Ok(())
}

async fn statement(ctx: &Context, session: &Session) -> Result<()> {
    let account = pick_account(ctx, session).await?;
    let entries = session.ledger.statement(account, 20).await?;
    if entries.is_empty() {
        ctx.output.info("No transactions yet");
        return Ok(());
    }

    ctx.output.header(&format!("Statement for {account}"));
    for entry in entries {
        ctx.output.list_item(&format!(
            "{} {} {} — {} (ref {})",
            entry.posted_at.format("%d %b %Y"),
            entry.direction,
            entry.amount,
            entry.description.as_deref().unwrap_or("-"),
            entry.reference_no
        ));
    }
    Ok(())
}

async fn transfer_history(ctx: &Context, session: &Session) -> Result<()> {
    let account = pick_account(ctx, session).await?;
    let transfers = session.ledger.transfers_for(account).await?;
    if transfers.is_empty() {
        ctx.output.info("No transfers yet");
        return Ok(());
    }

    ctx.output.header(&format!("Transfers for {account}"));
    for transfer in transfers {
        let direction = if transfer.from_account_id == account {
            format!("to {}", transfer.to_account_id)
        } else {
            format!("from {}", transfer.from_account_id)
        };
        ctx.output.list_item(&format!(
            "{} {} {} {} — {} (ref {})",
            transfer.transferred_at.format("%d %b %Y"),
            transfer.mode,
            transfer.amount,
            direction,
            transfer.status,
            transfer.reference_no
        ));
    }
    Ok(())
}

async fn beneficiaries(ctx: &Context, session: &Session) -> Result<()> {
    let choice = Select::new()
        .with_prompt("Beneficiaries")
        .items(&["List", "Add"])
        .default(0)
        .interact()?;

    if choice == 0 {
        let saved = session.beneficiaries.list(session.customer).await?;
        if saved.is_empty() {
            ctx.output.info("No beneficiaries saved");
            return Ok(());
        }
        for payee in saved {
            ctx.output.list_item(&format!(
                "#{} {} — account {}{}",
                payee.id,
                payee.name,
                payee.account_number,
                payee
                    .bank_name
                    .as_deref()
                    .map(|b| format!(" ({b})"))
                    .unwrap_or_default()
            ));
        }
        return Ok(());
    }

    let name: String = Input::new().with_prompt("Payee name").interact_text()?;
    let account_number: i64 = Input::new().with_prompt("Account number").interact_text()?;
    let bank_name: String = Input::new()
        .with_prompt("Bank name (optional)")
        .allow_empty(true)
        .interact_text()?;
    let ifsc: String = Input::new()
        .with_prompt("IFSC (optional)")
        .allow_empty(true)
        .interact_text()?;

    let saved = session
        .beneficiaries
        .add(
            session.customer,
            &name,
            account_number,
            (!bank_name.is_empty()).then_some(bank_name.as_str()),
            (!ifsc.is_empty()).then_some(ifsc.as_str()),
        )
        .await?;
    ctx.output.success(&format!("Saved beneficiary #{}", saved.id));
    Ok(())
}

async fn pay_beneficiary(ctx: &Context, session: &Session) -> Result<()> {
    let saved = session.beneficiaries.list(session.customer).await?;
    if saved.is_empty() {
        ctx.output.warn("Save a beneficiary first");
        return Ok(());
    }

    let items: Vec<String> = saved
        .iter()
        .map(|p| format!("{} (account {})", p.name, p.account_number))
        .collect();
    let picked = Select::new()
        .with_prompt("Pay")
        .items(&items)
        .default(0)
        .interact()?;
    let payee: BeneficiaryId = saved[picked].id;

    let source = pick_account(ctx, session).await?;
    let accounts = session.ledger.accounts_for(session.customer).await?;
    let selection = accounts
        .iter()
        .position(|a| a.id == source)
        .map(|i| AccountSelection::Index(i + 1))
        .unwrap_or(AccountSelection::Auto);

    let rupees: f64 = Input::new().with_prompt("Amount in rupees").interact_text()?;
    ctx.output.info("Confirm with your banking password");
    let secret = Password::new().with_prompt("Banking password").interact()?;

    let receipt = session
        .beneficiaries
        .transfer_to_beneficiary(
            &BankCredentials::new(session.customer, secret),
            payee,
            selection,
            Money::from_rupees(rupees),
        )
        .await?;

    ctx.output.success(&format!(
        "Transferred {} by {} (ref {})",
        receipt.transfer.amount, receipt.transfer.mode, receipt.transfer.reference_no
    ));
    Ok(())
}

async fn open_account(ctx: &Context, session: &Session) -> Result<()> {
    let account_type = prompt_account_type()?;
    let ifsc: String = Input::new()
        .with_prompt("Home branch IFSC (optional)")
        .allow_empty(true)
        .interact_text()?;

    let account = session
        .customers
        .open_account(
            session.customer,
            account_type,
            (!ifsc.is_empty()).then_some(ifsc.as_str()),
        )
        .await?;
    ctx.output.success(&format!("Opened account {}", account.id));
    describe_account(ctx, &account);
    Ok(())
}

async fn update_contact(ctx: &Context, session: &Session) -> Result<()> {
    let current = session.customers.get(session.customer).await?;
    let phone: String = Input::new()
        .with_prompt("Phone (blank to clear)")
        .with_initial_text(current.phone.unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;
    let address: String = Input::new()
        .with_prompt("Address (blank to clear)")
        .with_initial_text(current.address.unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    session
        .customers
        .update(
            session.customer,
            (!phone.is_empty()).then_some(phone.as_str()),
            (!address.is_empty()).then_some(address.as_str()),
        )
        .await?;
    ctx.output.success("Contact details updated");
    Ok(())
}

async fn pick_account(ctx: &Context, session: &Session) -> Result<AccountId> {
    let accounts = session.ledger.accounts_for(session.customer).await?;
    match accounts.len() {
        0 => Err(mart_bank::BankError::NoAccounts.into()),
        1 => Ok(accounts[0].id),
        _ => {
            let items: Vec<String> = accounts
                .iter()
                .map(|a| format!("{} ({}) — {}", a.id, a.account_type, a.balance))
                .collect();
            let picked = Select::new()
                .with_prompt("Account")
                .items(&items)
                .default(0)
                .interact()?;
            Ok(accounts[picked].id)
        }
    }
}

fn describe_account(ctx: &Context, account: &Account) {
    ctx.output.list_item(&format!(
        "{} {} — {} [{}]{}",
        account.id,
        account.account_type,
        account.balance,
        account.status,
        account
            .branch
            .as_deref()
            .map(|b| format!(" at {b}"))
            .unwrap_or_default()
    ));
}

fn prompt_account_type() -> Result<AccountType> {
    let picked = Select::new()
        .with_prompt("Account type")
        .items(&["Savings", "Current"])
        .default(0)
        .interact()?;
    Ok(if picked == 0 {
        AccountType::Savings
    } else {
        AccountType::Current
    })
}

fn prompt_credentials() -> Result<BankCredentials> {
    let id: i64 = Input::new().with_prompt("Customer id").interact_text()?;
    let secret = Password::new().with_prompt("Banking password").interact()?;
    Ok(BankCredentials::new(BankCustomerId::new(id), secret))
}
