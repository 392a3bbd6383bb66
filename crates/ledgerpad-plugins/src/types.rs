//! Plugin boundary types.
//!
//! Plugins run inside the host's processing pipeline, after parsing and
//! before report generation: they receive the full parsed directive list
//! plus parser options, and return a possibly-modified list together with
//! accumulated diagnostics. Plugins never print; the host surfaces the
//! diagnostics to the user.

use std::collections::HashMap;
use std::fmt;

use ledgerpad_core::{Balance, Decimal, Directive, Metadata};

/// Parser options exposed to plugins.
///
/// Only the fields needed by the plugins in this collection are carried:
/// the operating currencies and the tolerance-inference defaults.
#[derive(Debug, Clone, Default)]
pub struct PluginOptions {
    /// Currencies the ledger primarily operates in.
    pub operating_currencies: Vec<String>,
    /// Per-currency default tolerance for balance assertions without an
    /// explicit override.
    pub inferred_tolerance_default: HashMap<String, Decimal>,
}

/// Compute the allowed tolerance for a balance assertion.
///
/// Precedence: the assertion's explicit tolerance, then the per-currency
/// default from the options, then a tolerance inferred from the precision
/// of the asserted amount.
#[must_use]
pub fn balance_tolerance(assertion: &Balance, options: &PluginOptions) -> Decimal {
    if let Some(tolerance) = assertion.tolerance {
        return tolerance;
    }
    if let Some(tolerance) = options
        .inferred_tolerance_default
        .get(assertion.amount.currency.as_str())
    {
        return *tolerance;
    }
    assertion.amount.inferred_tolerance()
}

/// Input handed to a plugin by the host pipeline.
#[derive(Debug, Clone)]
pub struct PluginInput {
    /// The full ordered directive list.
    pub directives: Vec<Directive>,
    /// Parser options.
    pub options: PluginOptions,
    /// Optional plugin-specific configuration string.
    pub config: Option<String>,
}

/// Output returned by a plugin to the host pipeline.
#[derive(Debug, Clone, Default)]
pub struct PluginOutput {
    /// The possibly-modified directive list.
    pub directives: Vec<Directive>,
    /// Diagnostics produced while processing.
    pub errors: Vec<PluginError>,
}

/// A recoverable per-entry diagnostic produced by a plugin.
///
/// Carries the metadata of the source location that triggered it and,
/// when applicable, the offending directive.
#[derive(Debug, Clone)]
pub struct PluginError {
    /// Metadata of the directive the diagnostic points at.
    pub source: Option<Metadata>,
    /// Human-readable message.
    pub message: String,
    /// The offending directive, if any.
    pub entry: Option<Directive>,
}

impl PluginError {
    /// Create a new diagnostic with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            source: None,
            message: message.into(),
            entry: None,
        }
    }

    /// Attach source metadata.
    #[must_use]
    pub fn with_source(mut self, source: Metadata) -> Self {
        self.source = Some(source);
        self
    }

    /// Attach the offending directive.
    #[must_use]
    pub fn with_entry(mut self, entry: Directive) -> Self {
        self.entry = Some(entry);
        self
    }
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
