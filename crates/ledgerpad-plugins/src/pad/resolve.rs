//! Source-account resolution for pad markers.
//!
//! Given a marker and the sign of the imbalance, decides which account
//! absorbs the adjustment. Precedence, most specific first:
//!
//! 1. an explicit source account on the marker itself (always wins);
//! 2. directive-declared `pad-ext-config` rules, most recently declared
//!    first;
//! 3. the default mapping table, in declared order.
//!
//! Templates may reference `{type}` (the account's top-level category) and
//! `{name}` (the rest of the path). Results are memoized per
//! `(padded account, sign)` for the duration of one run. When nothing
//! matches the resolution returns `None`; the caller reports and never
//! guesses a destination.

use std::collections::HashMap;

use ledgerpad_core::{account, Decimal, InternedStr};

use crate::pad::config::{MappingTarget, RegexMapping};
use crate::pad::marker::PadMarker;

/// Direction of a padding adjustment, from the padded account's viewpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImbalanceSign {
    /// The padded account gained value (cash inflow).
    Positive,
    /// The padded account lost value.
    Negative,
}

impl ImbalanceSign {
    /// Classify a non-zero adjustment amount.
    #[must_use]
    pub fn of(number: Decimal) -> Self {
        if number.is_sign_positive() {
            Self::Positive
        } else {
            Self::Negative
        }
    }
}

/// Resolves source accounts for one reconciliation run.
///
/// Holds the combined rule list (directive-declared rules first, then the
/// default table) and the per-run memo cache. The cache is idempotent per
/// key, so sharing it between account walks is safe.
pub struct SourceResolver {
    mappings: Vec<RegexMapping>,
    cache: HashMap<(InternedStr, ImbalanceSign), Option<InternedStr>>,
}

impl SourceResolver {
    /// Create a resolver from directive-declared rules and the default
    /// table, in that precedence order.
    #[must_use]
    pub fn new(declared: Vec<RegexMapping>, defaults: Vec<RegexMapping>) -> Self {
        let mut mappings = declared;
        mappings.extend(defaults);
        Self {
            mappings,
            cache: HashMap::new(),
        }
    }

    /// Resolve the source account for `marker` given the imbalance sign.
    pub fn resolve(&mut self, marker: &PadMarker, sign: ImbalanceSign) -> Option<InternedStr> {
        // An explicit source ignores sign and regex rules alike.
        if let Some(source) = marker.explicit_source() {
            return Some(source.clone());
        }

        let key = (marker.padded_account().clone(), sign);
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let resolved = self.lookup(marker.padded_account(), sign);
        self.cache.insert(key, resolved.clone());
        resolved
    }

    fn lookup(&self, padded_account: &str, sign: ImbalanceSign) -> Option<InternedStr> {
        let (account_type, name) = account::root_and_leaf(padded_account);

        for mapping in &self.mappings {
            if !mapping.pattern.is_match(padded_account) {
                continue;
            }
            let template = match (&mapping.target, sign) {
                (MappingTarget::Single(template), _) => template,
                (MappingTarget::Signed { income, .. }, ImbalanceSign::Positive) => income,
                (MappingTarget::Signed { expenses, .. }, ImbalanceSign::Negative) => expenses,
            };
            return Some(expand_template(template, account_type, name));
        }
        None
    }
}

fn expand_template(template: &str, account_type: &str, name: &str) -> InternedStr {
    InternedStr::from(
        template
            .replace("{type}", account_type)
            .replace("{name}", name),
    )
}
