//! Money type for representing monetary values.
//!
//! Uses paise-based integer representation to avoid floating-point
//! precision issues that plague monetary calculations. All MartKit
//! amounts are rupee values held as paise (1/100 INR).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// A rupee amount stored in paise.
///
/// Database columns, ledger balances, and order totals all carry this
/// type; conversion to and from decimal rupees happens only at the
/// presentation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero rupees.
    pub const ZERO: Money = Money(0);

    /// Create a Money value from paise.
    pub fn from_paise(paise: i64) -> Self {
        Self(paise)
    }

    /// Create a Money value from a decimal rupee amount.
    ///
    /// ```
    /// use mart_core::Money;
    /// let price = Money::from_rupees(49.99);
    /// assert_eq!(price.paise(), 4999);
    /// ```
    pub fn from_rupees(rupees: f64) -> Self {
        Self((rupees * 100.0).round() as i64)
    }

    /// Get the amount in paise.
    pub fn paise(&self) -> i64 {
        self.0
    }

    /// Convert to a decimal rupee value.
    pub fn to_rupees(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check if this is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Checked addition, `None` on overflow.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Checked subtraction, `None` on overflow.
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Checked multiplication by a quantity, `None` on overflow.
    pub fn checked_mul(self, factor: i64) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    /// Format as a display string (e.g., "\u{20b9}49.99").
    pub fn display(&self) -> String {
        format!("\u{20b9}{:.2}", self.to_rupees())
    }

    /// Format without the currency symbol (e.g., "49.99").
    pub fn display_amount(&self) -> String {
        format!("{:.2}", self.to_rupees())
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, factor: i64) -> Money {
        Money(self.0 * factor)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_paise() {
        let m = Money::from_paise(4999);
        assert_eq!(m.paise(), 4999);
    }

    #[test]
    fn test_money_from_rupees() {
        let m = Money::from_rupees(49.99);
        assert_eq!(m.paise(), 4999);

        let m = Money::from_rupees(650.0);
        assert_eq!(m.paise(), 65000);
    }

    #[test]
    fn test_money_to_rupees() {
        let m = Money::from_paise(4999);
        assert!((m.to_rupees() - 49.99).abs() < 0.001);
    }

    #[test]
    fn test_money_display() {
        let m = Money::from_paise(4999);
        assert_eq!(m.display(), "\u{20b9}49.99");
        assert_eq!(m.display_amount(), "49.99");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);
        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((a * 3).paise(), 3000);
    }

    #[test]
    fn test_money_checked_overflow() {
        let m = Money::from_paise(i64::MAX);
        assert!(m.checked_add(Money::from_paise(1)).is_none());
        assert!(m.checked_mul(2).is_none());
        assert_eq!(
            Money::from_paise(10).checked_mul(5),
            Some(Money::from_paise(50))
        );
    }

    #[test]
    fn test_money_ordering() {
        assert!(Money::from_paise(100) < Money::from_paise(200));
        assert!(Money::from_paise(-1).is_negative());
        assert!(Money::ZERO.is_zero());
    }
}
