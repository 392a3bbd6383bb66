//! Directive types shared by every plugin.
//!
//! A ledger is an ordered list of directives. The variants modeled here are
//! the ones the plugin pipeline consumes and produces:
//!
//! - [`Transaction`] - Transfers between accounts, as a list of postings
//! - [`Balance`] - Assert that an account has a specific balance
//! - [`Open`] - Open an account for use
//! - [`Commodity`] - Declare a commodity/currency
//! - [`Pad`] - Automatically pad an account to match a balance assertion
//! - [`Price`] - Record a price for a commodity
//! - [`Custom`] - User-extension directive (pad markers, plugin config)

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::intern::InternedStr;
use crate::{Amount, Cost};

/// The flag placed on transactions synthesized by padding.
pub const FLAG_PADDING: char = 'P';

/// Metadata value types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaValue {
    /// String value
    String(String),
    /// Account reference
    Account(String),
    /// Currency code
    Currency(String),
    /// Date value
    Date(NaiveDate),
    /// Numeric value
    Number(Decimal),
    /// Boolean value
    Bool(bool),
    /// Amount value
    Amount(Amount),
    /// Null/None value
    None,
}

impl MetaValue {
    /// Get the string content for string-like values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Account(a) => Some(a),
            Self::Currency(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Account(a) => write!(f, "{a}"),
            Self::Currency(c) => write!(f, "{c}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Amount(a) => write!(f, "{a}"),
            Self::None => write!(f, "None"),
        }
    }
}

/// Metadata is a key-value map attached to directives and postings.
pub type Metadata = HashMap<String, MetaValue>;

/// A posting within a transaction.
///
/// Postings are the individual legs of a transaction and never exist
/// outside one. Plugins run after booking and interpolation, so units
/// that are present are complete amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// The account for this posting
    pub account: InternedStr,
    /// The units moved (post-interpolation)
    pub units: Option<Amount>,
    /// Cost basis of the position (lot)
    pub cost: Option<Cost>,
    /// Per-unit price annotation
    pub price: Option<Amount>,
    /// Posting-level flag
    pub flag: Option<char>,
    /// Posting metadata
    pub meta: Metadata,
}

impl Posting {
    /// Create a new posting with the given account and units.
    #[must_use]
    pub fn new(account: impl Into<InternedStr>, units: Amount) -> Self {
        Self {
            account: account.into(),
            units: Some(units),
            cost: None,
            price: None,
            flag: None,
            meta: Metadata::new(),
        }
    }

    /// Get the units if present.
    #[must_use]
    pub const fn amount(&self) -> Option<&Amount> {
        self.units.as_ref()
    }

    /// Add a cost basis.
    #[must_use]
    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Add a price annotation.
    #[must_use]
    pub fn with_price(mut self, price: Amount) -> Self {
        self.price = Some(price);
        self
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        if let Some(flag) = self.flag {
            write!(f, "{flag} ")?;
        }
        write!(f, "{}", self.account)?;
        if let Some(units) = &self.units {
            write!(f, "  {units}")?;
        }
        if let Some(cost) = &self.cost {
            write!(f, " {cost}")?;
        }
        if let Some(price) = &self.price {
            write!(f, " @ {price}")?;
        }
        Ok(())
    }
}

/// Directive ordering priority for sorting.
///
/// When directives have the same date, hosts order them by type so that
/// pads precede the balance assertions they feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectivePriority {
    /// Open accounts first so they exist before use
    Open = 0,
    /// Commodities declared before use
    Commodity = 1,
    /// Padding before balance assertions
    Pad = 2,
    /// Balance assertions checked at start of day
    Balance = 3,
    /// Main entries
    Transaction = 4,
    /// Prices at end of day
    Price = 5,
    /// User extensions last
    Custom = 6,
}

/// All directive types consumed by the plugin pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Transaction directive - records transfers between accounts
    Transaction(Transaction),
    /// Balance assertion - asserts an account balance at a point in time
    Balance(Balance),
    /// Open account - opens an account for use
    Open(Open),
    /// Commodity declaration - declares a currency/commodity
    Commodity(Commodity),
    /// Pad directive - auto-pad an account to match a balance
    Pad(Pad),
    /// Price directive - records a commodity price
    Price(Price),
    /// Custom directive - custom user-defined directive
    Custom(Custom),
}

impl Directive {
    /// Get the date of this directive.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::Transaction(t) => t.date,
            Self::Balance(b) => b.date,
            Self::Open(o) => o.date,
            Self::Commodity(c) => c.date,
            Self::Pad(p) => p.date,
            Self::Price(p) => p.date,
            Self::Custom(c) => c.date,
        }
    }

    /// Get the metadata of this directive.
    #[must_use]
    pub const fn meta(&self) -> &Metadata {
        match self {
            Self::Transaction(t) => &t.meta,
            Self::Balance(b) => &b.meta,
            Self::Open(o) => &o.meta,
            Self::Commodity(c) => &c.meta,
            Self::Pad(p) => &p.meta,
            Self::Price(p) => &p.meta,
            Self::Custom(c) => &c.meta,
        }
    }

    /// Check if this is a transaction.
    #[must_use]
    pub const fn is_transaction(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }

    /// Get as a transaction, if this is one.
    #[must_use]
    pub const fn as_transaction(&self) -> Option<&Transaction> {
        match self {
            Self::Transaction(t) => Some(t),
            _ => None,
        }
    }

    /// Get as a custom directive, if this is one.
    #[must_use]
    pub const fn as_custom(&self) -> Option<&Custom> {
        match self {
            Self::Custom(c) => Some(c),
            _ => None,
        }
    }

    /// Get the directive type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Transaction(_) => "transaction",
            Self::Balance(_) => "balance",
            Self::Open(_) => "open",
            Self::Commodity(_) => "commodity",
            Self::Pad(_) => "pad",
            Self::Price(_) => "price",
            Self::Custom(_) => "custom",
        }
    }

    /// Get the sorting priority for this directive.
    ///
    /// Used by hosts to determine order when directives have the same date.
    #[must_use]
    pub const fn priority(&self) -> DirectivePriority {
        match self {
            Self::Open(_) => DirectivePriority::Open,
            Self::Commodity(_) => DirectivePriority::Commodity,
            Self::Pad(_) => DirectivePriority::Pad,
            Self::Balance(_) => DirectivePriority::Balance,
            Self::Transaction(_) => DirectivePriority::Transaction,
            Self::Price(_) => DirectivePriority::Price,
            Self::Custom(_) => DirectivePriority::Custom,
        }
    }
}

/// Sort directives by date, then by type priority.
///
/// This is a stable sort that preserves input order for directives with
/// the same date and type, matching the host's sorting conventions.
pub fn sort_directives(directives: &mut [Directive]) {
    directives.sort_by(|a, b| {
        a.date()
            .cmp(&b.date())
            .then_with(|| a.priority().cmp(&b.priority()))
    });
}

/// A transaction directive.
///
/// Transactions record transfers between accounts. Plugins treat them as
/// immutable values: a plugin that changes postings constructs a new
/// transaction rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction date
    pub date: NaiveDate,
    /// Transaction flag (* or !, P for synthesized padding)
    pub flag: char,
    /// Payee (optional)
    pub payee: Option<String>,
    /// Narration (description)
    pub narration: String,
    /// Tags attached to this transaction
    pub tags: Vec<String>,
    /// Links attached to this transaction
    pub links: Vec<String>,
    /// Transaction metadata
    pub meta: Metadata,
    /// Postings (account entries)
    pub postings: Vec<Posting>,
}

impl Transaction {
    /// Create a new transaction.
    #[must_use]
    pub fn new(date: NaiveDate, narration: impl Into<String>) -> Self {
        Self {
            date,
            flag: '*',
            payee: None,
            narration: narration.into(),
            tags: Vec::new(),
            links: Vec::new(),
            meta: Metadata::new(),
            postings: Vec::new(),
        }
    }

    /// Set the flag.
    #[must_use]
    pub const fn with_flag(mut self, flag: char) -> Self {
        self.flag = flag;
        self
    }

    /// Set the payee.
    #[must_use]
    pub fn with_payee(mut self, payee: impl Into<String>) -> Self {
        self.payee = Some(payee.into());
        self
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }

    /// Add a posting.
    #[must_use]
    pub fn with_posting(mut self, posting: Posting) -> Self {
        self.postings.push(posting);
        self
    }

    /// Check if this transaction was synthesized by padding.
    #[must_use]
    pub const fn is_padding(&self) -> bool {
        self.flag == FLAG_PADDING
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.date, self.flag)?;
        if let Some(payee) = &self.payee {
            write!(f, "\"{payee}\" ")?;
        }
        write!(f, "\"{}\"", self.narration)?;
        for tag in &self.tags {
            write!(f, " #{tag}")?;
        }
        for link in &self.links {
            write!(f, " ^{link}")?;
        }
        for posting in &self.postings {
            write!(f, "\n{posting}")?;
        }
        Ok(())
    }
}

/// A balance assertion directive.
///
/// Asserts that an account has a specific balance at the beginning of a
/// date. Read-only input to reconciliation: never mutated, only consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Assertion date
    pub date: NaiveDate,
    /// Account to check
    pub account: InternedStr,
    /// Expected amount
    pub amount: Amount,
    /// Tolerance (if explicitly specified)
    pub tolerance: Option<Decimal>,
    /// Metadata
    pub meta: Metadata,
}

impl Balance {
    /// Create a new balance assertion.
    #[must_use]
    pub fn new(date: NaiveDate, account: impl Into<InternedStr>, amount: Amount) -> Self {
        Self {
            date,
            account: account.into(),
            amount,
            tolerance: None,
            meta: Metadata::new(),
        }
    }

    /// Set explicit tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} balance {} {}", self.date, self.account, self.amount)?;
        if let Some(tol) = self.tolerance {
            write!(f, " ~ {tol}")?;
        }
        Ok(())
    }
}

/// An open account directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Open {
    /// Date account was opened
    pub date: NaiveDate,
    /// Account name (e.g., "Assets:Bank:Checking")
    pub account: InternedStr,
    /// Allowed currencies (empty = any currency allowed)
    pub currencies: Vec<InternedStr>,
    /// Booking method for this account
    pub booking: Option<String>,
    /// Metadata
    pub meta: Metadata,
}

impl Open {
    /// Create a new open directive.
    #[must_use]
    pub fn new(date: NaiveDate, account: impl Into<InternedStr>) -> Self {
        Self {
            date,
            account: account.into(),
            currencies: Vec::new(),
            booking: None,
            meta: Metadata::new(),
        }
    }

    /// Set allowed currencies.
    #[must_use]
    pub fn with_currencies(mut self, currencies: Vec<InternedStr>) -> Self {
        self.currencies = currencies;
        self
    }
}

impl fmt::Display for Open {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} open {}", self.date, self.account)?;
        if !self.currencies.is_empty() {
            let list: Vec<&str> = self.currencies.iter().map(InternedStr::as_str).collect();
            write!(f, " {}", list.join(","))?;
        }
        if let Some(booking) = &self.booking {
            write!(f, " \"{booking}\"")?;
        }
        Ok(())
    }
}

/// A commodity declaration directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commodity {
    /// Declaration date
    pub date: NaiveDate,
    /// Currency/commodity code (e.g., "USD", "AAPL")
    pub currency: InternedStr,
    /// Metadata
    pub meta: Metadata,
}

impl Commodity {
    /// Create a new commodity declaration.
    #[must_use]
    pub fn new(date: NaiveDate, currency: impl Into<InternedStr>) -> Self {
        Self {
            date,
            currency: currency.into(),
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} commodity {}", self.date, self.currency)
    }
}

/// A pad directive.
///
/// Declares that gaps between the actual and asserted balance of `account`
/// may be auto-filled from `source_account` until the next assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pad {
    /// Pad date
    pub date: NaiveDate,
    /// Account to pad
    pub account: InternedStr,
    /// Source account for padding (e.g., Equity:Opening-Balances)
    pub source_account: InternedStr,
    /// Metadata
    pub meta: Metadata,
}

impl Pad {
    /// Create a new pad directive.
    #[must_use]
    pub fn new(
        date: NaiveDate,
        account: impl Into<InternedStr>,
        source_account: impl Into<InternedStr>,
    ) -> Self {
        Self {
            date,
            account: account.into(),
            source_account: source_account.into(),
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pad {} {}",
            self.date, self.account, self.source_account
        )
    }
}

/// A price directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Price date
    pub date: NaiveDate,
    /// Currency being priced
    pub currency: InternedStr,
    /// Price amount (in another currency)
    pub amount: Amount,
    /// Metadata
    pub meta: Metadata,
}

impl Price {
    /// Create a new price directive.
    #[must_use]
    pub fn new(date: NaiveDate, currency: impl Into<InternedStr>, amount: Amount) -> Self {
        Self {
            date,
            currency: currency.into(),
            amount,
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} price {} {}", self.date, self.currency, self.amount)
    }
}

/// A custom directive.
///
/// User-defined directive type for extensions. The pad plugins consume two
/// encodings: `pad-ext` markers (padded account as the sole positional
/// value) and `pad-ext-config` mapping rules (fields in metadata).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Custom {
    /// Custom directive date
    pub date: NaiveDate,
    /// Custom type name (e.g., "pad-ext")
    pub custom_type: String,
    /// Values/arguments for this custom directive
    pub values: Vec<MetaValue>,
    /// Metadata
    pub meta: Metadata,
}

impl Custom {
    /// Create a new custom directive.
    #[must_use]
    pub fn new(date: NaiveDate, custom_type: impl Into<String>) -> Self {
        Self {
            date,
            custom_type: custom_type.into(),
            values: Vec::new(),
            meta: Metadata::new(),
        }
    }

    /// Add a value.
    #[must_use]
    pub fn with_value(mut self, value: MetaValue) -> Self {
        self.values.push(value);
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_meta_entry(mut self, key: impl Into<String>, value: MetaValue) -> Self {
        self.meta.insert(key.into(), value);
        self
    }
}

impl fmt::Display for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} custom \"{}\"", self.date, self.custom_type)?;
        for value in &self.values {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}
