//! Customer address book.

use mart_core::{AddressId, CustomerId};
use mart_db::{Db, DbError};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::fmt;

use crate::error::CommerceError;

/// What an address is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressKind {
    Shipping,
    Billing,
}

impl AddressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Shipping => "Shipping",
            AddressKind::Billing => "Billing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Shipping" => Some(AddressKind::Shipping),
            "Billing" => Some(AddressKind::Billing),
            _ => None,
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An address book entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub kind: AddressKind,
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl Address {
    fn from_row(row: &SqliteRow) -> Result<Self, CommerceError> {
        let kind_raw: String = row.try_get("kind")?;
        Ok(Self {
            id: AddressId::new(row.try_get("address_id")?),
            customer_id: CustomerId::new(row.try_get("customer_id")?),
            kind: AddressKind::parse(&kind_raw).ok_or(DbError::Column {
                column: "kind",
                value: kind_raw,
            })?,
            street: row.try_get("street")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            pincode: row.try_get("pincode")?,
        })
    }

    /// Single-line rendering for receipts and menus.
    pub fn one_line(&self) -> String {
        format!("{}, {}, {} {}", self.street, self.city, self.state, self.pincode)
    }
}

/// A new address to record.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub kind: AddressKind,
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// How an order picks its shipping address.
#[derive(Debug, Clone)]
pub enum AddressChoice {
    /// An existing entry owned by the ordering customer.
    Existing(AddressId),
    /// Record a new address inline, inside the order's transaction.
    New(NewAddress),
}

/// Insert a new address row.
pub(crate) async fn create_in(
    conn: &mut SqliteConnection,
    customer: CustomerId,
    new: &NewAddress,
) -> Result<Address, CommerceError> {
    let result = sqlx::query(
        "INSERT INTO addresses (customer_id, kind, street, city, state, pincode)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(customer.get())
    .bind(new.kind.as_str())
    .bind(&new.street)
    .bind(&new.city)
    .bind(&new.state)
    .bind(&new.pincode)
    .execute(&mut *conn)
    .await?;

    Ok(Address {
        id: AddressId::new(result.last_insert_rowid()),
        customer_id: customer,
        kind: new.kind,
        street: new.street.clone(),
        city: new.city.clone(),
        state: new.state.clone(),
        pincode: new.pincode.clone(),
    })
}

/// Resolve an order's address choice to a concrete entry.
///
/// An existing id must belong to the ordering customer; anything else
/// surfaces as `AddressNotFound`.
pub(crate) async fn resolve_in(
    conn: &mut SqliteConnection,
    customer: CustomerId,
    choice: &AddressChoice,
) -> Result<Address, CommerceError> {
    match choice {
        AddressChoice::Existing(id) => {
            let row = sqlx::query("SELECT * FROM addresses WHERE address_id = ? AND customer_id = ?")
                .bind(id.get())
                .bind(customer.get())
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(CommerceError::AddressNotFound(*id))?;
            Address::from_row(&row)
        }
        AddressChoice::New(new) => create_in(conn, customer, new).await,
    }
}

/// Address book operations.
#[derive(Clone)]
pub struct Addresses {
    db: Db,
}

impl Addresses {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// The customer's saved addresses.
    pub async fn list(&self, customer: CustomerId) -> Result<Vec<Address>, CommerceError> {
        let rows = sqlx::query("SELECT * FROM addresses WHERE customer_id = ? ORDER BY address_id")
            .bind(customer.get())
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(Address::from_row).collect()
    }

    /// Save a new address.
    pub async fn create(
        &self,
        customer: CustomerId,
        new: NewAddress,
    ) -> Result<Address, CommerceError> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        create_in(&mut conn, customer, &new).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    fn home() -> NewAddress {
        NewAddress {
            kind: AddressKind::Shipping,
            street: "12 Lake View Road".into(),
            city: "Pune".into(),
            state: "Maharashtra".into(),
            pincode: "411001".into(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let db = testutil::store().await;
        let customer = testutil::signup(&db, "c@example.com").await;
        let addresses = Addresses::new(db);

        let created = addresses.create(customer, home()).await.unwrap();
        let listed = addresses.list(customer).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].one_line(), "12 Lake View Road, Pune, Maharashtra 411001");
    }

    #[tokio::test]
    async fn test_resolve_rejects_foreign_address() {
        let db = testutil::store().await;
        let alice = testutil::signup(&db, "alice@example.com").await;
        let bob = testutil::signup(&db, "bob@example.com").await;
        let addresses = Addresses::new(db.clone());

        let alices = addresses.create(alice, home()).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let err = resolve_in(&mut conn, bob, &AddressChoice::Existing(alices.id))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::AddressNotFound(_)));
    }
}
