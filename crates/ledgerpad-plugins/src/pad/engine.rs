//! The reconciliation engine.
//!
//! Walks each padded account's timeline once, maintaining a running
//! inventory per currency, and synthesizes an adjusting transaction for
//! every balance assertion that fails beyond tolerance while a pad marker
//! is active for the account and the currency has not been padded under
//! that activation yet.
//!
//! All per-account state (`active_pad`, `padded_currencies`, the running
//! inventory) is constructed fresh per account and never shared across
//! accounts; only the resolution cache is shared, and it is idempotent.

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;
use tracing::debug;

use ledgerpad_core::{
    Amount, Balance, InternedStr, Inventory, Position, Posting, Transaction,
    FLAG_PADDING,
};

use crate::pad::marker::{MarkerArena, PadMarker};
use crate::pad::resolve::{ImbalanceSign, SourceResolver};
use crate::pad::timeline::{EventKind, Timeline};
use crate::types::{balance_tolerance, PluginError, PluginOptions};

/// Fatal faults of the reconciliation engine.
///
/// These indicate a logic error or an unsupported ledger shape, not a
/// user-correctable condition; they abort the whole plugin invocation.
#[derive(Debug, Error)]
pub enum PadFatal {
    /// Applying an adjustment left a position held at cost negative.
    #[error("position held at cost goes negative: {position}")]
    NegativeAtCost {
        /// The offending position.
        position: Position,
    },
}

/// Result of reconciling every padded account.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Synthesized transactions, keyed by marker arena index.
    pub synthesized: Vec<Vec<Transaction>>,
    /// Per-entry diagnostics.
    pub errors: Vec<PluginError>,
}

/// Per-account walk state, constructed fresh per account.
struct AccountState {
    active_pad: Option<usize>,
    padded_currencies: HashSet<InternedStr>,
    inventory: Inventory,
}

impl AccountState {
    fn new() -> Self {
        Self {
            active_pad: None,
            padded_currencies: HashSet::new(),
            inventory: Inventory::new(),
        }
    }
}

/// Walk every padded account's timeline and synthesize corrections.
///
/// Accounts are processed in sorted name order so diagnostics are
/// deterministic; each account's walk is independent of the others.
pub fn reconcile(
    timeline: &Timeline<'_>,
    arena: &MarkerArena,
    resolver: &mut SourceResolver,
    options: &PluginOptions,
) -> Result<ReconcileOutcome, PadFatal> {
    let mut outcome = ReconcileOutcome {
        synthesized: vec![Vec::new(); arena.len()],
        errors: Vec::new(),
    };

    // Walk padded accounts in sorted name order.
    let accounts: BTreeSet<&InternedStr> = arena
        .markers()
        .iter()
        .map(PadMarker::padded_account)
        .collect();

    for account in accounts {
        walk_account(account, timeline, arena, resolver, options, &mut outcome)?;
    }

    Ok(outcome)
}

fn walk_account(
    account: &InternedStr,
    timeline: &Timeline<'_>,
    arena: &MarkerArena,
    resolver: &mut SourceResolver,
    options: &PluginOptions,
    outcome: &mut ReconcileOutcome,
) -> Result<(), PadFatal> {
    let mut state = AccountState::new();

    for event in timeline.for_account(account) {
        match event.kind {
            EventKind::Posting(posting) => {
                if let Some(units) = posting.amount() {
                    let position = match &posting.cost {
                        Some(cost) => Position::with_cost(units.clone(), cost.clone()),
                        None => Position::simple(units.clone()),
                    };
                    state.inventory.add(position);
                }
            }
            EventKind::PadActivation(marker_index) => {
                // A new activation supersedes the previous one and allows
                // every currency to be padded once again.
                state.active_pad = Some(marker_index);
                state.padded_currencies.clear();
            }
            EventKind::Assertion(assertion) => {
                check_assertion(assertion, &mut state, arena, resolver, options, outcome)?;
            }
        }
    }

    Ok(())
}

fn check_assertion(
    assertion: &Balance,
    state: &mut AccountState,
    arena: &MarkerArena,
    resolver: &mut SourceResolver,
    options: &PluginOptions,
    outcome: &mut ReconcileOutcome,
) -> Result<(), PadFatal> {
    let currency = &assertion.amount.currency;

    // The assertion checks the total units for the currency, across lots,
    // not any single position.
    let actual = state.inventory.units(currency);
    let diff = actual - assertion.amount.number;
    let tolerance = balance_tolerance(assertion, options);

    if diff.abs() > tolerance {
        match state.active_pad {
            Some(marker_index) if !state.padded_currencies.contains(currency) => {
                synthesize_correction(
                    assertion,
                    arena.get(marker_index),
                    marker_index,
                    state,
                    resolver,
                    outcome,
                )?;
            }
            Some(marker_index) => {
                outcome.errors.push(
                    PluginError::new(format!(
                        "Balance of {} differs by {} {} but {} was already padded once \
                         under the active pad",
                        assertion.account, diff, currency, currency
                    ))
                    .with_source(assertion.meta.clone())
                    .with_entry(arena.get(marker_index).directive.clone()),
                );
            }
            None => {
                outcome.errors.push(
                    PluginError::new(format!(
                        "Balance of {} differs by {} {} with no active pad",
                        assertion.account, diff, currency
                    ))
                    .with_source(assertion.meta.clone()),
                );
            }
        }
    }

    // Mark the currency as encountered for this activation regardless of
    // outcome; at most one correction per currency per activation.
    state.padded_currencies.insert(currency.clone());

    Ok(())
}

fn synthesize_correction(
    assertion: &Balance,
    marker: &PadMarker,
    marker_index: usize,
    state: &mut AccountState,
    resolver: &mut SourceResolver,
    outcome: &mut ReconcileOutcome,
) -> Result<(), PadFatal> {
    let currency = &assertion.amount.currency;

    // Padding a lot held at cost is an error; report one diagnostic per
    // costed lot, then proceed with the cost-less adjustment anyway.
    for position in state.inventory.positions_for(currency) {
        if position.cost.is_some() {
            outcome.errors.push(
                PluginError::new(format!(
                    "Attempt to pad an entry with cost for balance: {}",
                    state.inventory
                ))
                .with_source(assertion.meta.clone())
                .with_entry(marker.directive.clone()),
            );
        }
    }

    let adjustment = Amount::new(
        assertion.amount.number - state.inventory.units(currency),
        currency.clone(),
    );
    if adjustment.is_zero() {
        return Ok(());
    }

    let Some(source_account) = resolver.resolve(marker, ImbalanceSign::of(adjustment.number))
    else {
        outcome.errors.push(
            PluginError::new(format!(
                "No pad account could be resolved for {}",
                marker.padded_account()
            ))
            .with_source(assertion.meta.clone())
            .with_entry(marker.directive.clone()),
        );
        return Ok(());
    };

    debug!(
        account = %marker.padded_account(),
        source = %source_account,
        amount = %adjustment,
        date = %marker.date(),
        "synthesizing padding transaction"
    );

    let narration = format!(
        "(Padding inserted for Balance of {} for difference {})",
        assertion.amount, adjustment
    );
    let correction = Transaction::new(marker.date(), narration)
        .with_flag(FLAG_PADDING)
        .with_meta(marker.meta().clone())
        .with_posting(
            Posting::new(marker.padded_account().clone(), adjustment.clone())
                .with_meta(assertion.meta.clone()),
        )
        .with_posting(
            Posting::new(source_account, -&adjustment).with_meta(assertion.meta.clone()),
        );

    // Apply immediately so later assertions in this walk see the corrected
    // balance.
    let merged = state.inventory.add(Position::simple(adjustment));
    if merged.is_negative_at_cost() {
        return Err(PadFatal::NegativeAtCost {
            position: merged.clone(),
        });
    }

    outcome.synthesized[marker_index].push(correction);
    state.padded_currencies.insert(currency.clone());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pad::config::{PadConfig, PAD_MARKER_TYPE};
    use ledgerpad_core::{Cost, Custom, Directive, MetaValue, NaiveDate};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn pad_marker(d: NaiveDate, account: &str, source: &str) -> Directive {
        Directive::Custom(
            Custom::new(d, PAD_MARKER_TYPE)
                .with_value(MetaValue::Account(account.to_string()))
                .with_meta_entry("pad_account", MetaValue::Account(source.to_string())),
        )
    }

    fn run(entries: &[Directive]) -> Result<ReconcileOutcome, PadFatal> {
        let mut errors = Vec::new();
        let arena = MarkerArena::collect(entries, true, &mut errors);
        assert!(errors.is_empty());
        let timeline = Timeline::build(entries, &arena);
        let config = PadConfig::parse(None).unwrap();
        let mut resolver = SourceResolver::new(Vec::new(), config.default_mappings);
        reconcile(&timeline, &arena, &mut resolver, &PluginOptions::default())
    }

    #[test]
    fn test_basic_gap_fill() {
        let entries = vec![
            Directive::Transaction(
                Transaction::new(date(2024, 1, 1), "seed").with_posting(Posting::new(
                    "Assets:Bank",
                    Amount::new(dec!(100.00), "USD"),
                )),
            ),
            pad_marker(date(2024, 1, 2), "Assets:Bank", "Equity:Opening"),
            Directive::Balance(Balance::new(
                date(2024, 1, 3),
                "Assets:Bank",
                Amount::new(dec!(150.00), "USD"),
            )),
        ];

        let outcome = run(&entries).unwrap();

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.synthesized[0].len(), 1);

        let txn = &outcome.synthesized[0][0];
        assert_eq!(txn.date, date(2024, 1, 2));
        assert_eq!(txn.flag, FLAG_PADDING);
        assert_eq!(
            txn.postings[0].amount(),
            Some(&Amount::new(dec!(50.00), "USD"))
        );
        assert_eq!(txn.postings[1].account, "Equity:Opening");
        assert_eq!(
            txn.postings[1].amount(),
            Some(&Amount::new(dec!(-50.00), "USD"))
        );
    }

    #[test]
    fn test_second_failure_same_currency_is_reported_not_padded() {
        let entries = vec![
            Directive::Transaction(
                Transaction::new(date(2024, 1, 1), "seed").with_posting(Posting::new(
                    "Assets:Bank",
                    Amount::new(dec!(100.00), "USD"),
                )),
            ),
            pad_marker(date(2024, 1, 2), "Assets:Bank", "Equity:Opening"),
            Directive::Balance(Balance::new(
                date(2024, 1, 3),
                "Assets:Bank",
                Amount::new(dec!(150.00), "USD"),
            )),
            Directive::Balance(Balance::new(
                date(2024, 1, 4),
                "Assets:Bank",
                Amount::new(dec!(200.00), "USD"),
            )),
        ];

        let outcome = run(&entries).unwrap();

        // One correction for day 3; the day-4 failure is only reported.
        assert_eq!(outcome.synthesized[0].len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("already padded"));
    }

    #[test]
    fn test_passing_assertion_marks_currency_encountered() {
        let entries = vec![
            pad_marker(date(2024, 1, 1), "Assets:Bank", "Equity:Opening"),
            Directive::Balance(Balance::new(
                date(2024, 1, 2),
                "Assets:Bank",
                Amount::new(dec!(0.00), "USD"),
            )),
            Directive::Balance(Balance::new(
                date(2024, 1, 3),
                "Assets:Bank",
                Amount::new(dec!(100.00), "USD"),
            )),
        ];

        let outcome = run(&entries).unwrap();

        // The passing day-2 assertion consumed USD for this activation, so
        // the day-3 failure is a discrepancy, not a fill.
        assert!(outcome.synthesized[0].is_empty());
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_new_activation_resets_padded_currencies() {
        let entries = vec![
            pad_marker(date(2024, 1, 1), "Assets:Bank", "Equity:Opening"),
            Directive::Balance(Balance::new(
                date(2024, 1, 2),
                "Assets:Bank",
                Amount::new(dec!(100.00), "USD"),
            )),
            pad_marker(date(2024, 1, 3), "Assets:Bank", "Equity:Opening"),
            Directive::Balance(Balance::new(
                date(2024, 1, 4),
                "Assets:Bank",
                Amount::new(dec!(250.00), "USD"),
            )),
        ];

        let outcome = run(&entries).unwrap();

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.synthesized[0].len(), 1);
        assert_eq!(outcome.synthesized[1].len(), 1);
        assert_eq!(
            outcome.synthesized[1][0].postings[0].amount(),
            Some(&Amount::new(dec!(150.00), "USD"))
        );
    }

    #[test]
    fn test_tolerance_suppresses_correction() {
        let entries = vec![
            Directive::Transaction(
                Transaction::new(date(2024, 1, 1), "seed").with_posting(Posting::new(
                    "Assets:Bank",
                    Amount::new(dec!(100.004), "USD"),
                )),
            ),
            pad_marker(date(2024, 1, 2), "Assets:Bank", "Equity:Opening"),
            Directive::Balance(Balance::new(
                date(2024, 1, 3),
                "Assets:Bank",
                Amount::new(dec!(100.00), "USD"),
            )),
        ];

        let outcome = run(&entries).unwrap();

        assert!(outcome.errors.is_empty());
        assert!(outcome.synthesized[0].is_empty());
    }

    #[test]
    fn test_costed_lot_reports_error_but_still_pads() {
        // Reporting-yet-continuing: the costed-lot diagnostic does not
        // block the synthesis. Suspicious but longstanding behavior.
        let entries = vec![
            Directive::Transaction(
                Transaction::new(date(2024, 1, 1), "buy").with_posting(
                    Posting::new("Assets:Broker", Amount::new(dec!(10), "AAPL"))
                        .with_cost(Cost::new(dec!(150.00), "USD")),
                ),
            ),
            pad_marker(date(2024, 1, 2), "Assets:Broker", "Equity:Opening"),
            Directive::Balance(Balance::new(
                date(2024, 1, 3),
                "Assets:Broker",
                Amount::new(dec!(12), "AAPL"),
            )),
        ];

        let outcome = run(&entries).unwrap();

        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("with cost"));
        assert_eq!(outcome.synthesized[0].len(), 1);
        assert_eq!(
            outcome.synthesized[0][0].postings[0].amount(),
            Some(&Amount::new(dec!(2), "AAPL"))
        );
        assert!(outcome.synthesized[0][0].postings[0].cost.is_none());
    }

    #[test]
    fn test_unresolvable_source_reports_and_skips() {
        let entries = vec![
            Directive::Custom(
                Custom::new(date(2024, 1, 1), PAD_MARKER_TYPE)
                    .with_value(MetaValue::Account("Assets:Bank".to_string())),
            ),
            Directive::Balance(Balance::new(
                date(2024, 1, 2),
                "Assets:Bank",
                Amount::new(dec!(100.00), "USD"),
            )),
        ];

        let mut errors = Vec::new();
        let arena = MarkerArena::collect(&entries, false, &mut errors);
        let timeline = Timeline::build(&entries, &arena);
        // Empty rule set: resolution must fail.
        let mut resolver = SourceResolver::new(Vec::new(), Vec::new());
        let outcome =
            reconcile(&timeline, &arena, &mut resolver, &PluginOptions::default()).unwrap();

        assert!(outcome.synthesized[0].is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("could be resolved"));
    }

    #[test]
    fn test_multi_currency_independent_fills() {
        let entries = vec![
            pad_marker(date(2024, 1, 1), "Assets:Bank", "Equity:Opening"),
            Directive::Balance(Balance::new(
                date(2024, 1, 2),
                "Assets:Bank",
                Amount::new(dec!(100.00), "USD"),
            )),
            Directive::Balance(Balance::new(
                date(2024, 1, 2),
                "Assets:Bank",
                Amount::new(dec!(40.00), "EUR"),
            )),
        ];

        let outcome = run(&entries).unwrap();

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.synthesized[0].len(), 2);
    }

    #[test]
    fn test_child_postings_count_toward_parent_assertion() {
        let entries = vec![
            Directive::Transaction(
                Transaction::new(date(2024, 1, 1), "child seed").with_posting(Posting::new(
                    "Assets:Bank:Checking",
                    Amount::new(dec!(80.00), "USD"),
                )),
            ),
            pad_marker(date(2024, 1, 2), "Assets:Bank", "Equity:Opening"),
            Directive::Balance(Balance::new(
                date(2024, 1, 3),
                "Assets:Bank",
                Amount::new(dec!(100.00), "USD"),
            )),
        ];

        let outcome = run(&entries).unwrap();

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.synthesized[0].len(), 1);
        assert_eq!(
            outcome.synthesized[0][0].postings[0].amount(),
            Some(&Amount::new(dec!(20.00), "USD"))
        );
    }
}
