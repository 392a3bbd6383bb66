//! Insertion and sequencing of synthesized transactions.
//!
//! The final directive list preserves the input order; every synthesized
//! transaction is spliced in immediately after the pad marker that
//! produced it. Markers that produced nothing are dropped from the output,
//! with one "unused pad" diagnostic each when configured.

use tracing::debug;

use ledgerpad_core::{Directive, Transaction};

use crate::pad::marker::MarkerArena;
use crate::types::PluginError;

/// Merge the input list with the per-marker synthesized transactions.
pub fn splice(
    entries: Vec<Directive>,
    arena: &MarkerArena,
    mut synthesized: Vec<Vec<Transaction>>,
    generate_errors_on_unused: bool,
    errors: &mut Vec<PluginError>,
) -> Vec<Directive> {
    let mut out = Vec::with_capacity(entries.len());

    for (entry_index, entry) in entries.into_iter().enumerate() {
        let Some(marker_index) = arena.index_at_entry(entry_index) else {
            out.push(entry);
            continue;
        };

        let produced = std::mem::take(&mut synthesized[marker_index]);
        if produced.is_empty() {
            debug!(entry = %arena.get(marker_index).padded_account(), "dropping unused pad marker");
            if generate_errors_on_unused {
                errors.push(
                    PluginError::new("Unused pad entry")
                        .with_source(entry.meta().clone())
                        .with_entry(entry),
                );
            }
            continue;
        }

        out.push(entry);
        out.extend(produced.into_iter().map(Directive::Transaction));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pad::config::PAD_MARKER_TYPE;
    use ledgerpad_core::{Amount, Balance, Custom, MetaValue, NaiveDate, Posting};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn marker(d: NaiveDate, account: &str) -> Directive {
        Directive::Custom(
            Custom::new(d, PAD_MARKER_TYPE)
                .with_value(MetaValue::Account(account.to_string())),
        )
    }

    fn correction(d: NaiveDate) -> Transaction {
        Transaction::new(d, "(Padding inserted)")
            .with_posting(Posting::new("Assets:Bank", Amount::new(dec!(50), "USD")))
            .with_posting(Posting::new("Equity:Open", Amount::new(dec!(-50), "USD")))
    }

    #[test]
    fn test_corrections_follow_their_marker() {
        let entries = vec![
            marker(date(2024, 1, 2), "Assets:Bank"),
            Directive::Balance(Balance::new(
                date(2024, 1, 3),
                "Assets:Bank",
                Amount::new(dec!(50), "USD"),
            )),
        ];
        let mut errors = Vec::new();
        let arena = MarkerArena::collect(&entries, false, &mut errors);
        let synthesized = vec![vec![correction(date(2024, 1, 2))]];

        let out = splice(entries, &arena, synthesized, false, &mut errors);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].type_name(), "custom");
        assert_eq!(out[1].type_name(), "transaction");
        assert_eq!(out[2].type_name(), "balance");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unused_marker_dropped_silently() {
        let entries = vec![marker(date(2024, 1, 2), "Assets:Bank")];
        let mut errors = Vec::new();
        let arena = MarkerArena::collect(&entries, false, &mut errors);

        let out = splice(entries, &arena, vec![Vec::new()], false, &mut errors);

        assert!(out.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unused_marker_reported_and_dropped() {
        let entries = vec![marker(date(2024, 1, 2), "Assets:Bank")];
        let mut errors = Vec::new();
        let arena = MarkerArena::collect(&entries, false, &mut errors);

        let out = splice(entries, &arena, vec![Vec::new()], true, &mut errors);

        assert!(out.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Unused"));
    }
}
