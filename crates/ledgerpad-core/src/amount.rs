//! Amount type representing a decimal number with a currency.
//!
//! An [`Amount`] combines an exact decimal quantity with a currency code.
//! All ledger arithmetic is done in `rust_decimal`; no floating point is
//! used anywhere, so balance comparisons are exact up to a tolerance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::intern::InternedStr;

/// An amount is a quantity paired with a currency.
///
/// # Examples
///
/// ```
/// use ledgerpad_core::Amount;
/// use rust_decimal_macros::dec;
///
/// let amount = Amount::new(dec!(100.00), "USD");
/// assert_eq!(amount.number, dec!(100.00));
/// assert_eq!(amount.currency, "USD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    /// The decimal quantity
    pub number: Decimal,
    /// The currency code (e.g., "USD", "EUR", "AAPL")
    pub currency: InternedStr,
}

impl Amount {
    /// Create a new amount.
    #[must_use]
    pub fn new(number: Decimal, currency: impl Into<InternedStr>) -> Self {
        Self {
            number,
            currency: currency.into(),
        }
    }

    /// Create a zero amount with the given currency.
    #[must_use]
    pub fn zero(currency: impl Into<InternedStr>) -> Self {
        Self {
            number: Decimal::ZERO,
            currency: currency.into(),
        }
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.number.is_zero()
    }

    /// Check if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.number.is_sign_positive() && !self.number.is_zero()
    }

    /// Check if the amount is negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.number.is_sign_negative()
    }

    /// Get the absolute value of this amount.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self {
            number: self.number.abs(),
            currency: self.currency.clone(),
        }
    }

    /// Get the scale (number of decimal places) of this amount.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.number.scale()
    }

    /// Calculate the inferred tolerance for this amount.
    ///
    /// Tolerance is `0.5 * 10^(-scale)`, so:
    /// - scale 0 (integer) → tolerance 0.5
    /// - scale 1 → tolerance 0.05
    /// - scale 2 → tolerance 0.005
    #[must_use]
    pub fn inferred_tolerance(&self) -> Decimal {
        // tolerance = 5 * 10^(-(scale+1)) = 0.5 * 10^(-scale)
        Decimal::new(5, self.number.scale() + 1)
    }

    /// Check if this amount is near another amount within tolerance.
    ///
    /// Returns `false` if currencies don't match.
    #[must_use]
    pub fn is_near(&self, other: &Self, tolerance: Decimal) -> bool {
        self.currency == other.currency && (self.number - other.number).abs() <= tolerance
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.currency)
    }
}

impl Add for &Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Amount {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch in add");
        Amount {
            number: self.number + rhs.number,
            currency: self.currency.clone(),
        }
    }
}

impl Sub for &Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Amount {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch in sub");
        Amount {
            number: self.number - rhs.number,
            currency: self.currency.clone(),
        }
    }
}

impl Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount {
            number: -self.number,
            currency: self.currency.clone(),
        }
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            number: -self.number,
            currency: self.currency,
        }
    }
}

impl AddAssign<&Self> for Amount {
    fn add_assign(&mut self, rhs: &Self) {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch in add");
        self.number += rhs.number;
    }
}

impl SubAssign<&Self> for Amount {
    fn sub_assign(&mut self, rhs: &Self) {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch in sub");
        self.number -= rhs.number;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_arithmetic() {
        let a = Amount::new(dec!(100.00), "USD");
        let b = Amount::new(dec!(50.00), "USD");

        assert_eq!((&a + &b).number, dec!(150.00));
        assert_eq!((&a - &b).number, dec!(50.00));
        assert_eq!((-&a).number, dec!(-100.00));
    }

    #[test]
    fn test_inferred_tolerance() {
        assert_eq!(Amount::new(dec!(100), "USD").inferred_tolerance(), dec!(0.5));
        assert_eq!(
            Amount::new(dec!(100.0), "USD").inferred_tolerance(),
            dec!(0.05)
        );
        assert_eq!(
            Amount::new(dec!(100.00), "USD").inferred_tolerance(),
            dec!(0.005)
        );
    }

    #[test]
    fn test_is_near() {
        let a = Amount::new(dec!(100.00), "USD");
        let b = Amount::new(dec!(100.004), "USD");
        let c = Amount::new(dec!(100.004), "EUR");

        assert!(a.is_near(&b, dec!(0.005)));
        assert!(!a.is_near(&b, dec!(0.001)));
        assert!(!a.is_near(&c, dec!(0.005)));
    }

    #[test]
    fn test_display() {
        let a = Amount::new(dec!(1234.56), "EUR");
        assert_eq!(a.to_string(), "1234.56 EUR");
    }
}
