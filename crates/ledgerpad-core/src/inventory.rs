//! Inventory type representing a collection of positions.
//!
//! An [`Inventory`] tracks the holdings of an account as a collection of
//! [`Position`]s. The reconciliation engine rebuilds one fresh per account
//! walk; it is pure computation state and is never persisted.
//!
//! Lot reduction (FIFO/LIFO matching) is the host booking engine's concern
//! and is deliberately absent here. `add` merges cost-less positions by
//! currency and appends costed positions as separate lots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Position, intern::InternedStr};

/// A collection of positions held by one account.
///
/// # Examples
///
/// ```
/// use ledgerpad_core::{Amount, Inventory, Position};
/// use rust_decimal_macros::dec;
///
/// let mut inv = Inventory::new();
/// inv.add(Position::simple(Amount::new(dec!(100), "USD")));
/// inv.add(Position::simple(Amount::new(dec!(50), "USD")));
/// assert_eq!(inv.units("USD"), dec!(150));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    positions: Vec<Position>,
}

impl Inventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all positions.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Check if inventory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.iter().all(Position::is_empty)
    }

    /// Get total units of a currency (ignoring cost lots).
    ///
    /// This sums all positions of the given currency regardless of cost
    /// basis. Balance assertions check this aggregate, not a single lot.
    #[must_use]
    pub fn units(&self, currency: &str) -> Decimal {
        self.positions
            .iter()
            .filter(|p| p.units.currency == currency)
            .map(|p| p.units.number)
            .sum()
    }

    /// Get all currencies present in this inventory.
    #[must_use]
    pub fn currencies(&self) -> Vec<&str> {
        let mut currencies: Vec<&str> = self
            .positions
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.units.currency.as_str())
            .collect();
        currencies.sort_unstable();
        currencies.dedup();
        currencies
    }

    /// Iterate the positions holding a given currency.
    pub fn positions_for(&self, currency: &str) -> impl Iterator<Item = &Position> {
        let currency = InternedStr::from(currency);
        self.positions
            .iter()
            .filter(move |p| p.units.currency == currency)
    }

    /// Add a position to the inventory.
    ///
    /// Positions without cost merge with an existing cost-less position of
    /// the same currency; positions with cost are appended as new lots.
    /// Returns a reference to the position the units ended up in.
    pub fn add(&mut self, position: Position) -> &Position {
        if position.cost.is_none() {
            if let Some(idx) = self
                .positions
                .iter()
                .position(|p| p.cost.is_none() && p.units.currency == position.units.currency)
            {
                self.positions[idx].units += &position.units;
                return &self.positions[idx];
            }
        }

        self.positions.push(position);
        let last = self.positions.len() - 1;
        &self.positions[last]
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, pos) in self.positions.iter().filter(|p| !p.is_empty()).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{pos}")?;
        }
        write!(f, ")")
    }
}
