//! Authentication bridge for money movement.
//!
//! Every operation that debits a customer-owned account (payment,
//! refund, beneficiary transfer) passes through [`verify`] first. The
//! storefront's own login is deliberately independent: the commerce
//! and banking customer id spaces are distinct, and the bridge is the
//! only point where they are correlated, per transaction.

use mart_core::secret::verify_secret;
use mart_core::BankCustomerId;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::BankError;

/// Banking credentials presented for one money movement.
#[derive(Debug, Clone)]
pub struct BankCredentials {
    pub customer_id: BankCustomerId,
    pub secret: String,
}

impl BankCredentials {
    pub fn new(customer_id: BankCustomerId, secret: impl Into<String>) -> Self {
        Self {
            customer_id,
            secret: secret.into(),
        }
    }
}

/// Verify banking credentials, returning the verified customer id.
///
/// An unknown customer and a wrong secret both surface as
/// `AuthenticationFailed`; the caller learns nothing about which.
/// Stored credentials are salted argon2 hashes, never plain text.
pub async fn verify(
    conn: &mut SqliteConnection,
    credentials: &BankCredentials,
) -> Result<BankCustomerId, BankError> {
    let stored: Option<(String,)> =
        sqlx::query_as("SELECT password_hash FROM bank_customers WHERE customer_id = ?")
            .bind(credentials.customer_id.get())
            .fetch_optional(&mut *conn)
            .await?;

    match stored {
        Some((hash,)) if verify_secret(&credentials.secret, &hash) => {
            debug!(customer = credentials.customer_id.get(), "banking credentials verified");
            Ok(credentials.customer_id)
        }
        _ => Err(BankError::AuthenticationFailed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[tokio::test]
    async fn test_verify_accepts_correct_secret() {
        let (db, customer, _) = testutil::bank_with_account(0).await;
        let mut conn = db.pool().acquire().await.unwrap();

        let verified = verify(
            &mut conn,
            &BankCredentials::new(customer, testutil::TEST_SECRET),
        )
        .await
        .unwrap();
        assert_eq!(verified, customer);
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_secret() {
        let (db, customer, _) = testutil::bank_with_account(0).await;
        let mut conn = db.pool().acquire().await.unwrap();

        let err = verify(&mut conn, &BankCredentials::new(customer, "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, BankError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_verify_rejects_unknown_customer() {
        let db = testutil::bank().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let err = verify(
            &mut conn,
            &BankCredentials::new(BankCustomerId::new(404), "whatever"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BankError::AuthenticationFailed));
    }
}
