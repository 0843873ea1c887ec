//! Schema DDL for the commerce and banking tables.
//!
//! Monetary columns are integer paise; timestamps are RFC 3339 TEXT.
//! Every statement is `IF NOT EXISTS` so the bootstrap can run on every
//! startup.

pub const CREATE_CUSTOMERS: &str = "
CREATE TABLE IF NOT EXISTS customers (
    customer_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    phone         TEXT,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
)";

pub const CREATE_CATEGORIES: &str = "
CREATE TABLE IF NOT EXISTS categories (
    category_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE
)";

pub const CREATE_SELLERS: &str = "
CREATE TABLE IF NOT EXISTS sellers (
    seller_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    gstin         TEXT UNIQUE,
    phone         TEXT,
    contact_email TEXT
)";

pub const CREATE_PRODUCTS: &str = "
CREATE TABLE IF NOT EXISTS products (
    product_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    description     TEXT,
    price           INTEGER NOT NULL,
    stock           INTEGER NOT NULL DEFAULT 0,
    category_id     INTEGER REFERENCES categories(category_id),
    seller_id       INTEGER REFERENCES sellers(seller_id),
    warranty_months INTEGER NOT NULL DEFAULT 0
)";

pub const CREATE_CARTS: &str = "
CREATE TABLE IF NOT EXISTS carts (
    cart_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL UNIQUE REFERENCES customers(customer_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL
)";

pub const CREATE_CART_ITEMS: &str = "
CREATE TABLE IF NOT EXISTS cart_items (
    cart_item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    cart_id      INTEGER NOT NULL REFERENCES carts(cart_id) ON DELETE CASCADE,
    product_id   INTEGER NOT NULL REFERENCES products(product_id),
    quantity     INTEGER NOT NULL CHECK (quantity > 0),
    UNIQUE (cart_id, product_id)
)";

pub const CREATE_ADDRESSES: &str = "
CREATE TABLE IF NOT EXISTS addresses (
    address_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL REFERENCES customers(customer_id) ON DELETE CASCADE,
    kind        TEXT NOT NULL CHECK (kind IN ('Shipping', 'Billing')),
    street      TEXT NOT NULL,
    city        TEXT NOT NULL,
    state       TEXT NOT NULL,
    pincode     TEXT NOT NULL
)";

pub const CREATE_ORDERS: &str = "
CREATE TABLE IF NOT EXISTS orders (
    order_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id  INTEGER NOT NULL REFERENCES customers(customer_id),
    order_date   TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'Pending',
    total_amount INTEGER NOT NULL
)";

pub const CREATE_ORDER_ITEMS: &str = "
CREATE TABLE IF NOT EXISTS order_items (
    order_item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id      INTEGER NOT NULL REFERENCES orders(order_id),
    product_id    INTEGER NOT NULL REFERENCES products(product_id),
    quantity      INTEGER NOT NULL CHECK (quantity > 0),
    unit_price    INTEGER NOT NULL
)";

pub const CREATE_PAYMENTS: &str = "
CREATE TABLE IF NOT EXISTS payments (
    payment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id   INTEGER NOT NULL UNIQUE REFERENCES orders(order_id),
    method     TEXT NOT NULL,
    status     TEXT NOT NULL DEFAULT 'Pending',
    amount     INTEGER NOT NULL
)";

pub const CREATE_SHIPMENTS: &str = "
CREATE TABLE IF NOT EXISTS shipments (
    shipment_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id        INTEGER NOT NULL UNIQUE REFERENCES orders(order_id),
    shipment_date   TEXT,
    delivery_date   TEXT NOT NULL,
    courier         TEXT NOT NULL,
    tracking_number TEXT NOT NULL UNIQUE,
    status          TEXT NOT NULL DEFAULT 'Processing'
)";

pub const CREATE_INVOICES: &str = "
CREATE TABLE IF NOT EXISTS invoices (
    invoice_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id       INTEGER NOT NULL UNIQUE REFERENCES orders(order_id),
    payment_id     INTEGER NOT NULL REFERENCES payments(payment_id),
    amount         INTEGER NOT NULL,
    invoice_date   TEXT NOT NULL,
    warranty_start TEXT NOT NULL,
    warranty_end   TEXT NOT NULL
)";

pub const CREATE_REVIEWS: &str = "
CREATE TABLE IF NOT EXISTS reviews (
    review_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL REFERENCES customers(customer_id),
    product_id  INTEGER NOT NULL REFERENCES products(product_id),
    rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment     TEXT,
    review_date TEXT NOT NULL
)";

pub const CREATE_BANK_CUSTOMERS: &str = "
CREATE TABLE IF NOT EXISTS bank_customers (
    customer_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    phone         TEXT,
    address       TEXT,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
)";

pub const CREATE_ACCOUNTS: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    account_id   INTEGER PRIMARY KEY,
    customer_id  INTEGER NOT NULL REFERENCES bank_customers(customer_id) ON DELETE CASCADE,
    account_type TEXT NOT NULL CHECK (account_type IN ('Savings', 'Current')),
    balance      INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
    branch       TEXT,
    status       TEXT NOT NULL DEFAULT 'Active' CHECK (status IN ('Active', 'Inactive', 'Closed')),
    created_at   TEXT NOT NULL
)";

pub const CREATE_TRANSACTIONS: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    transaction_id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id     INTEGER NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    direction      TEXT NOT NULL CHECK (direction IN ('Credit', 'Debit')),
    amount         INTEGER NOT NULL CHECK (amount > 0),
    posted_at      TEXT NOT NULL,
    description    TEXT,
    reference_no   TEXT NOT NULL
)";

pub const CREATE_TRANSFERS: &str = "
CREATE TABLE IF NOT EXISTS transfers (
    transfer_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    from_account_id INTEGER NOT NULL REFERENCES accounts(account_id),
    to_account_id   INTEGER NOT NULL REFERENCES accounts(account_id),
    amount          INTEGER NOT NULL CHECK (amount > 0),
    mode            TEXT NOT NULL CHECK (mode IN ('NEFT', 'IMPS', 'RTGS')),
    status          TEXT NOT NULL DEFAULT 'Success',
    transferred_at  TEXT NOT NULL,
    reference_no    TEXT NOT NULL
)";

pub const CREATE_BENEFICIARIES: &str = "
CREATE TABLE IF NOT EXISTS beneficiaries (
    beneficiary_id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id    INTEGER NOT NULL REFERENCES bank_customers(customer_id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    account_number INTEGER NOT NULL,
    bank_name      TEXT,
    ifsc_code      TEXT,
    UNIQUE (customer_id, account_number)
)";

pub const CREATE_IFSC_BRANCHES: &str = "
CREATE TABLE IF NOT EXISTS ifsc_branches (
    ifsc_code TEXT PRIMARY KEY,
    bank_name TEXT NOT NULL,
    branch    TEXT NOT NULL,
    city      TEXT
)";

pub const CREATE_IDX_ORDERS_CUSTOMER: &str =
    "CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_id)";

pub const CREATE_IDX_ORDER_ITEMS_ORDER: &str =
    "CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id)";

pub const CREATE_IDX_TRANSACTIONS_ACCOUNT: &str =
    "CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id)";

pub const CREATE_IDX_ACCOUNTS_CUSTOMER: &str =
    "CREATE INDEX IF NOT EXISTS idx_accounts_customer ON accounts(customer_id)";

/// Every DDL statement, in foreign-key dependency order.
pub const TABLES: &[&str] = &[
    CREATE_CUSTOMERS,
    CREATE_CATEGORIES,
    CREATE_SELLERS,
    CREATE_PRODUCTS,
    CREATE_CARTS,
    CREATE_CART_ITEMS,
    CREATE_ADDRESSES,
    CREATE_ORDERS,
    CREATE_ORDER_ITEMS,
    CREATE_PAYMENTS,
    CREATE_SHIPMENTS,
    CREATE_INVOICES,
    CREATE_REVIEWS,
    CREATE_BANK_CUSTOMERS,
    CREATE_ACCOUNTS,
    CREATE_TRANSACTIONS,
    CREATE_TRANSFERS,
    CREATE_BENEFICIARIES,
    CREATE_IFSC_BRANCHES,
    CREATE_IDX_ORDERS_CUSTOMER,
    CREATE_IDX_ORDER_ITEMS_ORDER,
    CREATE_IDX_TRANSACTIONS_ACCOUNT,
    CREATE_IDX_ACCOUNTS_CUSTOMER,
];
