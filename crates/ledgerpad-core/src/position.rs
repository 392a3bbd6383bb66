//! Position type representing units held at an optional cost.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Amount, Cost};

/// A position is units of a currency held at an optional cost.
///
/// Cash positions have no cost. Investment positions carry a [`Cost`]
/// (the lot), which marks them as ineligible for padding adjustments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// The units held (number + currency/commodity)
    pub units: Amount,
    /// The cost basis (if tracked)
    pub cost: Option<Cost>,
}

impl Position {
    /// Create a new position without cost tracking.
    #[must_use]
    pub const fn simple(units: Amount) -> Self {
        Self { units, cost: None }
    }

    /// Create a new position with cost tracking.
    #[must_use]
    pub const fn with_cost(units: Amount, cost: Cost) -> Self {
        Self {
            units,
            cost: Some(cost),
        }
    }

    /// Check if this position is empty (zero units).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.units.is_zero()
    }

    /// Get the currency of this position's units.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.units.currency
    }

    /// Check if this position holds negative units at a cost.
    ///
    /// A short position at cost is not a meaningful ledger state; the
    /// reconciliation engine treats producing one as a fatal fault.
    #[must_use]
    pub const fn is_negative_at_cost(&self) -> bool {
        self.cost.is_some() && self.units.is_negative() && !self.units.is_zero()
    }

    /// Calculate the book value (total cost) of this position.
    ///
    /// Returns `None` if there is no cost.
    #[must_use]
    pub fn book_value(&self) -> Option<Amount> {
        self.cost.as_ref().map(|c| c.total_cost(self.units.number))
    }

    /// Negate this position (reverse the sign of units).
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            units: -&self.units,
            cost: self.cost.clone(),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.units)?;
        if let Some(cost) = &self.cost {
            write!(f, " {cost}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_simple_position() {
        let pos = Position::simple(Amount::new(dec!(1000.00), "USD"));
        assert!(pos.cost.is_none());
        assert!(!pos.is_negative_at_cost());
    }

    #[test]
    fn test_negative_at_cost() {
        let cost = Cost::new(dec!(150.00), "USD");
        let long = Position::with_cost(Amount::new(dec!(10), "AAPL"), cost.clone());
        let short = Position::with_cost(Amount::new(dec!(-10), "AAPL"), cost);

        assert!(!long.is_negative_at_cost());
        assert!(short.is_negative_at_cost());
    }

    #[test]
    fn test_book_value() {
        let cost = Cost::new(dec!(150.00), "USD");
        let pos = Position::with_cost(Amount::new(dec!(10), "AAPL"), cost);
        assert_eq!(pos.book_value(), Some(Amount::new(dec!(1500.00), "USD")));
    }
}
