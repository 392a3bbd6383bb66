//! Core types for ledgerpad
//!
//! This crate provides the fundamental types shared by every plugin:
//!
//! - [`Amount`] - A decimal number with a currency
//! - [`Cost`] - Acquisition cost of a position (lot)
//! - [`Position`] - Units held at an optional cost
//! - [`Inventory`] - A per-account collection of positions
//! - [`Directive`] - All directive types (Transaction, Balance, Pad, etc.)
//!
//! # Example
//!
//! ```
//! use ledgerpad_core::{Amount, Inventory, Position};
//! use rust_decimal_macros::dec;
//!
//! let mut inv = Inventory::new();
//! inv.add(Position::simple(Amount::new(dec!(100.00), "USD")));
//! inv.add(Position::simple(Amount::new(dec!(50.00), "USD")));
//! assert_eq!(inv.units("USD"), dec!(150.00));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod amount;
pub mod cost;
pub mod directive;
pub mod intern;
pub mod inventory;
pub mod position;

pub use amount::Amount;
pub use cost::Cost;
pub use directive::{
    sort_directives, Balance, Commodity, Custom, Directive, DirectivePriority, MetaValue, Metadata,
    Open, Pad, Posting, Price, Transaction, FLAG_PADDING,
};
pub use intern::{InternedStr, StringInterner};
pub use inventory::Inventory;
pub use position::Position;

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
