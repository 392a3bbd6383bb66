//! Grouping of padding transactions.
//!
//! Reconciliation can leave many small padding transactions between the
//! same two accounts on the same day (one per currency). This plugin
//! collapses each such group into a single regular transaction carrying
//! all the postings, which reads better in reports.

use std::collections::BTreeMap;

use ledgerpad_core::{Directive, InternedStr, NaiveDate, Transaction};

use crate::types::{PluginInput, PluginOutput};
use crate::LedgerPlugin;

const PADDING_NARRATION_PREFIX: &str = "(Padding inserted";

type GroupKey = (NaiveDate, InternedStr, InternedStr);

/// Collapse padding transactions that share a date and account pair.
///
/// Only transactions synthesized by padding (padding flag, recognizable
/// narration, exactly two postings) are grouped; everything else passes
/// through untouched. Grouped transactions are appended after the
/// remaining directives, keyed deterministically by (date, accounts).
#[must_use]
pub fn group_padding(entries: Vec<Directive>) -> Vec<Directive> {
    let mut result = Vec::with_capacity(entries.len());
    let mut groups: BTreeMap<GroupKey, Vec<Transaction>> = BTreeMap::new();

    for entry in entries {
        match entry {
            Directive::Transaction(txn) if is_padding_pair(&txn) => {
                let mut accounts: Vec<&InternedStr> =
                    txn.postings.iter().map(|p| &p.account).collect();
                accounts.sort();
                let key = (txn.date, accounts[0].clone(), accounts[1].clone());
                groups.entry(key).or_default().push(txn);
            }
            other => result.push(other),
        }
    }

    for ((date, _, _), group) in groups {
        let narration = if group.len() > 1 {
            format!("Padding (group of {})", group.len())
        } else {
            group[0].narration.clone()
        };

        let mut merged = Transaction::new(date, narration).with_meta(group[0].meta.clone());
        for txn in group {
            merged.postings.extend(txn.postings);
        }
        result.push(Directive::Transaction(merged));
    }

    result
}

fn is_padding_pair(txn: &Transaction) -> bool {
    txn.is_padding()
        && txn.narration.starts_with(PADDING_NARRATION_PREFIX)
        && txn.postings.len() == 2
}

/// The `group_padding` plugin.
pub struct GroupPaddingPlugin;

impl LedgerPlugin for GroupPaddingPlugin {
    fn name(&self) -> &'static str {
        "group_padding"
    }

    fn process(&self, input: PluginInput) -> anyhow::Result<PluginOutput> {
        Ok(PluginOutput {
            directives: group_padding(input.directives),
            errors: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerpad_core::{Amount, Posting, FLAG_PADDING};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn padding_txn(d: NaiveDate, currency: &str, number: rust_decimal::Decimal) -> Directive {
        Directive::Transaction(
            Transaction::new(d, format!("{PADDING_NARRATION_PREFIX} for {currency})"))
                .with_flag(FLAG_PADDING)
                .with_posting(Posting::new("Assets:Bank", Amount::new(number, currency)))
                .with_posting(Posting::new(
                    "Equity:Opening",
                    Amount::new(-number, currency),
                )),
        )
    }

    #[test]
    fn test_same_day_pair_grouped() {
        let d = date(2024, 1, 2);
        let entries = vec![
            padding_txn(d, "USD", dec!(50)),
            padding_txn(d, "EUR", dec!(20)),
        ];

        let out = group_padding(entries);

        assert_eq!(out.len(), 1);
        let txn = out[0].as_transaction().unwrap();
        assert_eq!(txn.flag, '*');
        assert_eq!(txn.narration, "Padding (group of 2)");
        assert_eq!(txn.postings.len(), 4);
    }

    #[test]
    fn test_single_padding_txn_keeps_narration() {
        let entries = vec![padding_txn(date(2024, 1, 2), "USD", dec!(50))];

        let out = group_padding(entries);

        assert_eq!(out.len(), 1);
        let txn = out[0].as_transaction().unwrap();
        assert!(txn.narration.starts_with(PADDING_NARRATION_PREFIX));
        assert_eq!(txn.postings.len(), 2);
    }

    #[test]
    fn test_different_days_not_grouped() {
        let entries = vec![
            padding_txn(date(2024, 1, 2), "USD", dec!(50)),
            padding_txn(date(2024, 1, 3), "EUR", dec!(20)),
        ];

        let out = group_padding(entries);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_non_padding_passes_through() {
        let entries = vec![Directive::Transaction(
            Transaction::new(date(2024, 1, 2), "groceries")
                .with_posting(Posting::new("Expenses:Food", Amount::new(dec!(10), "USD")))
                .with_posting(Posting::new("Assets:Cash", Amount::new(dec!(-10), "USD"))),
        )];

        let out = group_padding(entries.clone());
        assert_eq!(out, entries);
    }
}
