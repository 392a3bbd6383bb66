//! Account-scoped posting timeline.
//!
//! The reconciliation walk needs, per padded account, the ordered sequence
//! of events attributable to that account and all of its descendants:
//! postings, pad-marker activations and balance assertions. Events are
//! ordered by date first, then by original input index, so that same-day
//! events interleave deterministically in their declaration order.
//!
//! The timeline is a pure, read-only view built once per reconciliation
//! run.

use ledgerpad_core::{account, Balance, Directive, InternedStr, NaiveDate, Posting};

use crate::pad::marker::MarkerArena;

/// What happened at one point of an account's timeline.
#[derive(Debug, Clone, Copy)]
pub enum EventKind<'a> {
    /// A posting touched the account (or a descendant).
    Posting(&'a Posting),
    /// A pad marker for the account activated (arena index).
    PadActivation(usize),
    /// A balance assertion for the account (or a descendant).
    Assertion(&'a Balance),
}

/// One timeline event, keyed for deterministic ordering.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    /// Event date.
    pub date: NaiveDate,
    /// Index of the originating directive in the input list.
    pub input_index: usize,
    /// The account the event is attributed to.
    pub account: &'a InternedStr,
    /// The event payload.
    pub kind: EventKind<'a>,
}

/// The full event timeline of one reconciliation run.
#[derive(Debug, Default)]
pub struct Timeline<'a> {
    events: Vec<Event<'a>>,
}

impl<'a> Timeline<'a> {
    /// Build the timeline from the input directive list.
    #[must_use]
    pub fn build(entries: &'a [Directive], arena: &'a MarkerArena) -> Self {
        let mut events = Vec::new();

        for (input_index, entry) in entries.iter().enumerate() {
            match entry {
                Directive::Transaction(txn) => {
                    for posting in &txn.postings {
                        events.push(Event {
                            date: txn.date,
                            input_index,
                            account: &posting.account,
                            kind: EventKind::Posting(posting),
                        });
                    }
                }
                Directive::Balance(bal) => {
                    events.push(Event {
                        date: bal.date,
                        input_index,
                        account: &bal.account,
                        kind: EventKind::Assertion(bal),
                    });
                }
                _ => {}
            }
        }

        for (marker_index, marker) in arena.markers().iter().enumerate() {
            events.push(Event {
                date: marker.date(),
                input_index: marker.entry_index,
                account: marker.padded_account(),
                kind: EventKind::PadActivation(marker_index),
            });
        }

        // Stable: same-day events keep their declaration order.
        events.sort_by_key(|e| (e.date, e.input_index));

        Self { events }
    }

    /// The ordered events attributable to `account`.
    ///
    /// Postings and assertions of descendant accounts are included;
    /// pad activations only when they target `account` exactly.
    #[must_use]
    pub fn for_account(&self, account: &str) -> Vec<&Event<'a>> {
        self.events
            .iter()
            .filter(|event| match event.kind {
                EventKind::PadActivation(_) => event.account == account,
                EventKind::Posting(_) | EventKind::Assertion(_) => {
                    account::is_self_or_descendant(event.account, account)
                }
            })
            .collect()
    }
}
