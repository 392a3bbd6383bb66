//! Pad markers and the marker arena.
//!
//! A pad marker is either the host's native `Pad` directive or a `pad-ext`
//! custom directive. Both are unified behind [`PadMarker`], which exposes
//! the padded account and the explicit source account (if any); whether
//! native pads participate is decided once, at collection time.
//!
//! Markers are collected into a [`MarkerArena`] that assigns each one a
//! stable index. Synthesized transactions are keyed by that index, and the
//! insertion pass looks markers up by their position in the input list.

use std::collections::HashMap;

use ledgerpad_core::{Directive, InternedStr, MetaValue, Metadata, NaiveDate};

use crate::pad::config::{META_SOURCE_ACCOUNT, PAD_MARKER_TYPE};
use crate::types::PluginError;

/// One pad marker, native or custom-encoded.
#[derive(Debug, Clone)]
pub struct PadMarker {
    /// Index of the originating directive in the input list.
    pub entry_index: usize,
    /// The originating directive, kept for diagnostics.
    pub directive: Directive,
    date: NaiveDate,
    padded_account: InternedStr,
    explicit_source: Option<InternedStr>,
}

impl PadMarker {
    /// The date gaps may be filled from (synthesized transactions carry it).
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// The account whose gaps this marker fills.
    #[must_use]
    pub const fn padded_account(&self) -> &InternedStr {
        &self.padded_account
    }

    /// The explicitly declared source account, if any.
    ///
    /// Native pads always declare one; custom markers may carry one in
    /// their metadata. An explicit source bypasses all regex rules.
    #[must_use]
    pub const fn explicit_source(&self) -> Option<&InternedStr> {
        self.explicit_source.as_ref()
    }

    /// Metadata of the originating directive.
    #[must_use]
    pub fn meta(&self) -> &Metadata {
        self.directive.meta()
    }
}

/// All pad markers of one reconciliation run, with stable indices.
#[derive(Debug, Default)]
pub struct MarkerArena {
    markers: Vec<PadMarker>,
    by_entry_index: HashMap<usize, usize>,
}

impl MarkerArena {
    /// Collect all pad markers from the directive list.
    ///
    /// Native `Pad` directives are included only when
    /// `handle_default_pad_directives` is set. A `pad-ext` marker without a
    /// padded-account value yields a diagnostic and is skipped.
    pub fn collect(
        entries: &[Directive],
        handle_default_pad_directives: bool,
        errors: &mut Vec<PluginError>,
    ) -> Self {
        let mut arena = Self::default();

        for (entry_index, entry) in entries.iter().enumerate() {
            let marker = match entry {
                Directive::Pad(pad) if handle_default_pad_directives => PadMarker {
                    entry_index,
                    directive: entry.clone(),
                    date: pad.date,
                    padded_account: pad.account.clone(),
                    explicit_source: Some(pad.source_account.clone()),
                },
                Directive::Custom(custom) if custom.custom_type == PAD_MARKER_TYPE => {
                    let Some(account) = custom.values.first().and_then(MetaValue::as_str) else {
                        errors.push(
                            PluginError::new(format!(
                                "{PAD_MARKER_TYPE} requires the padded account as its first value"
                            ))
                            .with_source(custom.meta.clone())
                            .with_entry(entry.clone()),
                        );
                        continue;
                    };
                    let explicit_source = custom
                        .meta
                        .get(META_SOURCE_ACCOUNT)
                        .and_then(MetaValue::as_str)
                        .map(InternedStr::from);
                    PadMarker {
                        entry_index,
                        directive: entry.clone(),
                        date: custom.date,
                        padded_account: InternedStr::from(account),
                        explicit_source,
                    }
                }
                _ => continue,
            };

            let index = arena.markers.len();
            arena.by_entry_index.insert(entry_index, index);
            arena.markers.push(marker);
        }

        arena
    }

    /// All markers, in input order.
    #[must_use]
    pub fn markers(&self) -> &[PadMarker] {
        &self.markers
    }

    /// Number of markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Check if no markers were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Get a marker by arena index.
    #[must_use]
    pub fn get(&self, index: usize) -> &PadMarker {
        &self.markers[index]
    }

    /// Look up the arena index of the marker at an input position.
    #[must_use]
    pub fn index_at_entry(&self, entry_index: usize) -> Option<usize> {
        self.by_entry_index.get(&entry_index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerpad_core::{Custom, Pad};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_native_pads_gated_by_config() {
        let entries = vec![Directive::Pad(Pad::new(
            date(2024, 1, 1),
            "Assets:Bank",
            "Equity:Opening",
        ))];

        let mut errors = Vec::new();
        let without = MarkerArena::collect(&entries, false, &mut errors);
        let with = MarkerArena::collect(&entries, true, &mut errors);

        assert!(without.is_empty());
        assert_eq!(with.len(), 1);
        assert_eq!(
            with.get(0).explicit_source().map(InternedStr::as_str),
            Some("Equity:Opening")
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_custom_marker_with_explicit_source() {
        let entries = vec![Directive::Custom(
            Custom::new(date(2024, 1, 1), PAD_MARKER_TYPE)
                .with_value(MetaValue::Account("Assets:Bank".to_string()))
                .with_meta_entry(
                    META_SOURCE_ACCOUNT,
                    MetaValue::Account("Equity:Fixes".to_string()),
                ),
        )];

        let mut errors = Vec::new();
        let arena = MarkerArena::collect(&entries, false, &mut errors);

        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(0).padded_account(), "Assets:Bank");
        assert_eq!(
            arena.get(0).explicit_source().map(InternedStr::as_str),
            Some("Equity:Fixes")
        );
        assert_eq!(arena.index_at_entry(0), Some(0));
    }

    #[test]
    fn test_custom_marker_without_account_is_reported() {
        let entries = vec![Directive::Custom(Custom::new(
            date(2024, 1, 1),
            PAD_MARKER_TYPE,
        ))];

        let mut errors = Vec::new();
        let arena = MarkerArena::collect(&entries, false, &mut errors);

        assert!(arena.is_empty());
        assert_eq!(errors.len(), 1);
    }
}
