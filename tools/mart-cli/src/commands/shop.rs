//! `mart shop` - interactive storefront session.
//!
//! Menus collect and shape raw input only; every decision is made by
//! the mart-commerce workflows the session calls into.

use anyhow::Result;
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};
use mart_bank::{AccountSelection, BankCredentials, BankError};
use mart_commerce::{
    AddressChoice, AddressKind, Addresses, Carts, Catalog, Checkout, CommerceError, Customer,
    Identity, Invoices, NewAddress, NewCustomer, OrderRequest, OrderSource, Orders,
    PaymentInstruction, Returns, Reviews, Shipments,
};
use mart_core::{BankCustomerId, Money, OrderId, ProductId};

use crate::context::Context;

struct Session {
    catalog: Catalog,
    carts: Carts,
    addresses: Addresses,
    orders: Orders,
    shipments: Shipments,
    invoices: Invoices,
    reviews: Reviews,
    checkout: Checkout,
    returns: Returns,
    customer: Customer,
}

pub async fn run(ctx: &Context) -> Result<()> {
    let identity = Identity::new(ctx.db.clone());
    let customer = login_or_signup(ctx, &identity).await?;
    ctx.output.success(&format!("Welcome, {}", customer.name));

    let session = Session {
        catalog: Catalog::new(ctx.db.clone()),
        carts: Carts::new(ctx.db.clone()),
        addresses: Addresses::new(ctx.db.clone()),
        orders: Orders::new(ctx.db.clone()),
        shipments: Shipments::new(ctx.db.clone()),
        invoices: Invoices::new(ctx.db.clone()),
        reviews: Reviews::new(ctx.db.clone()),
        checkout: Checkout::new(ctx.db.clone(), ctx.processor(), ctx.checkout_policy()),
        returns: Returns::new(ctx.db.clone(), ctx.processor()),
        customer,
    };

    loop {
        let choice = Select::new()
            .with_prompt("Storefront")
            .items(&[
                "Browse catalog",
                "Search products",
                "Product details",
                "View cart",
                "Add to cart",
                "Edit cart line",
                "Checkout cart",
                "Buy a product now",
                "My orders",
                "My addresses",
                "Review a product",
                "Log out",
            ])
            .default(0)
            .interact()?;

        let result = match choice {
            0 => browse(ctx, &session).await,
            1 => search(ctx, &session).await,
            2 => product_detail(ctx, &session).await,
            3 => view_cart(ctx, &session).await,
            4 => add_to_cart(ctx, &session).await,
            5 => edit_cart_line(ctx, &session).await,
            6 => checkout_cart(ctx, &session).await,
            7 => buy_now(ctx, &session).await,
            8 => my_orders(ctx, &session).await,
            9 => addresses(ctx, &session).await,
            10 => review_product(ctx, &session).await,
            _ => return Ok(()),
        };

        if let Err(err) = result {
            ctx.output.error(&format!("{:#}", err));
        }
    }
}

async fn login_or_signup(ctx: &Context, identity: &Identity) -> Result<Customer> {
    loop {
        let choice = Select::new()
            .with_prompt("Storefront account")
            .items(&["Log in", "Sign up"])
            .default(0)
            .interact()?;

        let email: String = Input::new().with_prompt("Email").interact_text()?;
        let secret = Password::new().with_prompt("Password").interact()?;

        let attempt = if choice == 0 {
            identity.login(&email, &secret).await
        } else {
            let name: String = Input::new().with_prompt("Name").interact_text()?;
            identity
                .signup(NewCustomer { name, email, phone: None, secret })
                .await
        };

        match attempt {
            Ok(customer) => return Ok(customer),
            Err(err) if err.is_recoverable() => ctx.output.warn(&format!("{err}")),
            Err(err) => return Err(err.into()),
        }
    }
}

async fn browse(ctx: &Context, session: &Session) -> Result<()> {
    let categories = session.catalog.categories().await?;
    if categories.is_empty() {
        ctx.output.warn("Catalog is empty; run `mart init` first");
        return Ok(());
    }

    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    let picked = Select::new()
        .with_prompt("Category")
        .items(&names)
        .default(0)
        .interact()?;

    let products = session.catalog.by_category(categories[picked].id).await?;
    ctx.output.header(&categories[picked].name);
    for product in products {
        ctx.output.list_item(&format!(
            "#{} {} — {} ({} in stock)",
            product.id, product.name, product.price, product.stock
        ));
    }
    Ok(())
}

async fn search(ctx: &Context, session: &Session) -> Result<()> {
    let term: String = Input::new().with_prompt("Search").interact_text()?;
    let hits = session.catalog.search(&term).await?;
    if hits.is_empty() {
        ctx.output.info("No products matched");
        return Ok(());
    }
    for product in hits {
        ctx.output.list_item(&format!(
            "#{} {} — {} ({} in stock)",
            product.id, product.name, product.price, product.stock
        ));
    }
    Ok(())
}

async fn product_detail(ctx: &Context, session: &Session) -> Result<()> {
    let id = prompt_product_id()?;
    let product = session.catalog.product(id).await?;

    ctx.output.header(&product.name);
    if let Some(description) = &product.description {
        ctx.output.info(description);
    }
    ctx.output.kv("Price", &product.price.to_string());
    ctx.output.kv("In stock", &product.stock.to_string());
    if product.warranty_months > 0 {
        ctx.output.kv("Warranty", &format!("{} months", product.warranty_months));
    }

    let reviews = session.reviews.list(product.id).await?;
    if !reviews.is_empty() {
        ctx.output.header("Reviews");
        for review in reviews {
            ctx.output.list_item(&format!(
                "{}/5 — {}",
                review.rating,
                review.comment.as_deref().unwrap_or("(no comment)")
            ));
        }
    }
    Ok(())
}

async fn view_cart(ctx: &Context, session: &Session) -> Result<()> {
    let lines = session.carts.view(session.customer.id).await?;
    if lines.is_empty() {
        ctx.output.info("Cart is empty");
        return Ok(());
    }

    ctx.output.header("Cart");
    let mut total = Money::ZERO;
    for line in &lines {
        let line_total = line.line_total().unwrap_or(Money::ZERO);
        total = total + line_total;
        ctx.output.list_item(&format!(
            "#{} {} × {} = {}",
            line.product_id, line.product_name, line.quantity, line_total
        ));
    }
    ctx.output.kv("Total", &total.to_string());
    Ok(())
}

async fn add_to_cart(ctx: &Context, session: &Session) -> Result<()> {
    let product = prompt_product_id()?;
    let quantity: i64 = Input::new().with_prompt("Quantity").interact_text()?;
    session.carts.add(session.customer.id, product, quantity).await?;
    ctx.output.success("Added to cart");
    Ok(())
}

async fn edit_cart_line(ctx: &Context, session: &Session) -> Result<()> {
    let lines = session.carts.view(session.customer.id).await?;
    if lines.is_empty() {
        ctx.output.info("Cart is empty");
        return Ok(());
    }

    let items: Vec<String> = lines
        .iter()
        .map(|l| format!("{} × {}", l.product_name, l.quantity))
        .collect();
    let picked = Select::new()
        .with_prompt("Line")
        .items(&items)
        .default(0)
        .interact()?;
    let product = lines[picked].product_id;

    let quantity: i64 = Input::new()
        .with_prompt("New quantity (0 removes)")
        .interact_text()?;
    if quantity <= 0 {
        session.carts.remove(session.customer.id, product).await?;
        ctx.output.success("Line removed");
    } else {
        session
            .carts
            .update_quantity(session.customer.id, product, quantity)
            .await?;
        ctx.output.success("Quantity updated");
    }
    Ok(())
}

async fn checkout_cart(ctx: &Context, session: &Session) -> Result<()> {
    let lines = session.carts.view(session.customer.id).await?;
    if lines.is_empty() {
        ctx.output.warn("Cart is empty");
        return Ok(());
    }

    let everything = Confirm::new()
        .with_prompt("Order everything in the cart?")
        .default(true)
        .interact()?;
    let only = if everything {
        None
    } else {
        let items: Vec<String> = lines
            .iter()
            .map(|l| format!("{} × {}", l.product_name, l.quantity))
            .collect();
        let picked = MultiSelect::new()
            .with_prompt("Lines to order")
            .items(&items)
            .interact()?;
        if picked.is_empty() {
            ctx.output.warn("Nothing selected");
            return Ok(());
        }
        Some(picked.into_iter().map(|i| lines[i].product_id).collect())
    };

    place(ctx, session, OrderSource::Cart { only }).await
}

async fn buy_now(ctx: &Context, session: &Session) -> Result<()> {
    let product = prompt_product_id()?;
    let quantity: i64 = Input::new().with_prompt("Quantity").interact_text()?;
    place(ctx, session, OrderSource::Direct { product, quantity }).await
}

async fn place(ctx: &Context, session: &Session, source: OrderSource) -> Result<()> {
    let address = pick_address(ctx, session).await?;
    let payment = pick_payment(ctx)?;

    let mut request = OrderRequest {
        customer: session.customer.id,
        source,
        address,
        payment,
    };

    let receipt = loop {
        match session.checkout.place_order(request.clone()).await {
            Ok(receipt) => break receipt,
            // Several funding accounts: ask for the 1-based position
            // and retry the whole order.
            Err(CommerceError::Bank(BankError::SelectionRequired { count })) => {
                let index: usize = Input::new()
                    .with_prompt(format!("Which account (1-{count})"))
                    .interact_text()?;
                if let PaymentInstruction::PayNow { funding, .. } = &mut request.payment {
                    *funding = AccountSelection::Index(index);
                }
            }
            Err(err) => return Err(err.into()),
        }
    };

    for line in &receipt.skipped {
        ctx.output.warn(&format!(
            "Skipped {} (wanted {}, only {} in stock)",
            line.product_name, line.requested, line.available
        ));
    }

    if ctx.output.is_json() {
        ctx.output.json(&receipt);
        return Ok(());
    }

    ctx.output.success(&format!("Order #{} placed", receipt.order_id));
    ctx.output.kv("Total", &receipt.total.to_string());
    ctx.output.kv("Payment", receipt.payment_status.as_str());
    ctx.output.kv("Tracking", &receipt.tracking_number);
    Ok(())
}

async fn pick_address(ctx: &Context, session: &Session) -> Result<AddressChoice> {
    let saved = session.addresses.list(session.customer.id).await?;
    if !saved.is_empty() {
        let mut items: Vec<String> = saved.iter().map(|a| a.one_line()).collect();
        items.push("New address".into());
        let picked = Select::new()
            .with_prompt("Ship to")
            .items(&items)
            .default(0)
            .interact()?;
        if picked < saved.len() {
            return Ok(AddressChoice::Existing(saved[picked].id));
        }
    } else {
        ctx.output.info("No saved addresses; enter one");
    }

    Ok(AddressChoice::New(NewAddress {
        kind: AddressKind::Shipping,
        street: Input::new().with_prompt("Street").interact_text()?,
        city: Input::new().with_prompt("City").interact_text()?,
        state: Input::new().with_prompt("State").interact_text()?,
        pincode: Input::new().with_prompt("PIN code").interact_text()?,
    }))
}

fn pick_payment(ctx: &Context) -> Result<PaymentInstruction> {
    let picked = Select::new()
        .with_prompt("Payment")
        .items(&["Cash on Delivery", "Pay Now (bank transfer)"])
        .default(0)
        .interact()?;

    if picked == 0 {
        return Ok(PaymentInstruction::CashOnDelivery);
    }

    ctx.output.info("Banking credentials (separate from your shop login)");
    Ok(PaymentInstruction::PayNow {
        credentials: prompt_bank_credentials()?,
        funding: AccountSelection::Auto,
    })
}

async fn my_orders(ctx: &Context, session: &Session) -> Result<()> {
    let orders = session.orders.list_for(session.customer.id).await?;
    if orders.is_empty() {
        ctx.output.info("No orders yet");
        return Ok(());
    }

    let items: Vec<String> = orders
        .iter()
        .map(|o| format!("#{} {} — {} ({})", o.id, o.order_date.format("%d %b %Y"), o.total, o.status))
        .collect();
    let picked = Select::new()
        .with_prompt("Order")
        .items(&items)
        .default(0)
        .interact()?;
    let order = orders[picked].id;

    for item in session.orders.items(order).await? {
        ctx.output.list_item(&format!(
            "product #{} × {} @ {}",
            item.product_id, item.quantity, item.unit_price
        ));
    }

    let action = Select::new()
        .with_prompt("Action")
        .items(&["Track shipment", "View invoice", "Cancel order", "Return order", "Back"])
        .default(0)
        .interact()?;

    match action {
        0 => track(ctx, session, order).await,
        1 => invoice(ctx, session, order).await,
        2 => cancel_or_return(ctx, session, order, true).await,
        3 => cancel_or_return(ctx, session, order, false).await,
        _ => Ok(()),
    }
}

async fn track(ctx: &Context, session: &Session, order: OrderId) -> Result<()> {
    let shipment = session.shipments.track(order, session.customer.id).await?;
    ctx.output.header(&format!("Shipment for order #{order}"));
    ctx.output.kv("Status", shipment.status.as_str());
    ctx.output.kv("Courier", &shipment.courier);
    ctx.output.kv("Tracking", &shipment.tracking_number);
    match shipment.shipment_date {
        Some(shipped) => ctx.output.kv("Delivered", &shipped.format("%d %b %Y").to_string()),
        None => ctx
            .output
            .kv("Estimated delivery", &shipment.delivery_date.format("%d %b %Y").to_string()),
    }
    Ok(())
}

async fn invoice(ctx: &Context, session: &Session, order: OrderId) -> Result<()> {
    let invoice = session.invoices.for_order(order, session.customer.id).await?;
    ctx.output.header(&format!("Invoice #{}", invoice.id));
    ctx.output.kv("Amount", &invoice.amount.to_string());
    ctx.output.kv(
        "Warranty",
        &format!(
            "{} to {}",
            invoice.warranty_start.format("%d %b %Y"),
            invoice.warranty_end.format("%d %b %Y")
        ),
    );
    Ok(())
}

async fn cancel_or_return(
    ctx: &Context,
    session: &Session,
    order: OrderId,
    cancel: bool,
) -> Result<()> {
    let payment = session.orders.payment(order).await?;
    let auth = if payment.method == mart_commerce::PaymentMethod::Online {
        ctx.output.info("Refunds need your banking credentials");
        Some(prompt_bank_credentials()?)
    } else {
        None
    };

    let confirmed = Confirm::new()
        .with_prompt(if cancel { "Cancel this order?" } else { "Return this order?" })
        .default(false)
        .interact()?;
    if !confirmed {
        return Ok(());
    }

    let receipt = if cancel {
        session.returns.cancel_order(order, session.customer.id, auth.as_ref()).await?
    } else {
        session.returns.return_order(order, session.customer.id, auth.as_ref()).await?
    };

    ctx.output.success(&format!("Order #{} is now {}", order, receipt.order_status));
    if receipt.refund_reference.is_some() {
        ctx.output.kv("Refund", &payment.amount.to_string());
    }
    Ok(())
}

async fn addresses(ctx: &Context, session: &Session) -> Result<()> {
    let choice = Select::new()
        .with_prompt("Addresses")
        .items(&["List", "Add"])
        .default(0)
        .interact()?;

    if choice == 0 {
        let saved = session.addresses.list(session.customer.id).await?;
        if saved.is_empty() {
            ctx.output.info("No addresses saved");
            return Ok(());
        }
        for address in saved {
            ctx.output
                .list_item(&format!("[{}] {}", address.kind, address.one_line()));
        }
        return Ok(());
    }

    let kind = if Select::new()
        .with_prompt("Kind")
        .items(&["Shipping", "Billing"])
        .default(0)
        .interact()?
        == 0
    {
        AddressKind::Shipping
    } else {
        AddressKind::Billing
    };

    let saved = session
        .addresses
        .create(
            session.customer.id,
            NewAddress {
                kind,
                street: Input::new().with_prompt("Street").interact_text()?,
                city: Input::new().with_prompt("City").interact_text()?,
                state: Input::new().with_prompt("State").interact_text()?,
                pincode: Input::new().with_prompt("PIN code").interact_text()?,
            },
        )
        .await?;
    ctx.output.success(&format!("Saved address #{}", saved.id));
    Ok(())
}

async fn review_product(ctx: &Context, session: &Session) -> Result<()> {
    let purchased = session.catalog.purchased_by(session.customer.id).await?;
    if purchased.is_empty() {
        ctx.output.info("Nothing to review; reviews need a purchase");
        return Ok(());
    }

    let items: Vec<&str> = purchased.iter().map(|p| p.name.as_str()).collect();
    let picked = Select::new()
        .with_prompt("Product")
        .items(&items)
        .default(0)
        .interact()?;

    let rating: i64 = Input::new().with_prompt("Rating (1-5)").interact_text()?;
    let comment: String = Input::new()
        .with_prompt("Comment (optional)")
        .allow_empty(true)
        .interact_text()?;

    session
        .reviews
        .submit(
            session.customer.id,
            purchased[picked].id,
            rating,
            (!comment.is_empty()).then_some(comment),
        )
        .await?;
    ctx.output.success("Review submitted");
    Ok(())
}

fn prompt_product_id() -> Result<ProductId> {
    let id: i64 = Input::new().with_prompt("Product id").interact_text()?;
    Ok(ProductId::new(id))
}

fn prompt_bank_credentials() -> Result<BankCredentials> {
    let id: i64 = Input::new().with_prompt("Bank customer id").interact_text()?;
    let secret = Password::new().with_prompt("Banking password").interact()?;
    Ok(BankCredentials::new(BankCustomerId::new(id), secret))
}
