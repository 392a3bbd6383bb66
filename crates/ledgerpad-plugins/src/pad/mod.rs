//! Extended balance-padding and gap-filling plugin.
//!
//! Given a historical sequence of postings, balance assertions and pad
//! markers per account, this plugin synthesizes the minimal set of
//! adjusting transactions that make every balance assertion hold, while
//! respecting per-currency "already padded" state and cost-basis safety
//! constraints.
//!
//! A pad marker is either the host's native `pad` directive (when the
//! `handle_default_pad_directives` configuration flag is set) or a
//! `pad-ext` custom directive:
//!
//! ```text
//! 2024-01-01 custom "pad-ext" Assets:Bank
//! 2024-01-02 balance Assets:Bank 1000.00 USD
//! ```
//!
//! The source account absorbing each adjustment is resolved through a
//! precedence chain: explicit marker metadata, then in-ledger
//! `pad-ext-config` regex rules (latest declaration first), then the
//! configured or built-in default table.

pub mod config;
pub mod engine;
pub mod insert;
pub mod marker;
pub mod resolve;
pub mod timeline;

pub use config::PadConfig;
pub use engine::{PadFatal, ReconcileOutcome};
pub use marker::{MarkerArena, PadMarker};
pub use resolve::{ImbalanceSign, SourceResolver};
pub use timeline::{Event, EventKind, Timeline};

use ledgerpad_core::Directive;
use tracing::debug;

use crate::types::{PluginError, PluginInput, PluginOptions, PluginOutput};
use crate::LedgerPlugin;

/// Insert transactions to fulfill subsequent balance assertions.
///
/// Configuration errors abort eagerly and return the original, unmodified
/// directive list plus the errors. Per-entry reconciliation problems are
/// reported as diagnostics while processing continues. The only `Err`
/// case is a fatal invariant violation ([`PadFatal`]).
pub fn pad_extended(
    entries: Vec<Directive>,
    options: &PluginOptions,
    config_str: Option<&str>,
) -> Result<(Vec<Directive>, Vec<PluginError>), PadFatal> {
    let config = match PadConfig::parse(config_str) {
        Ok(config) => config,
        Err(error) => return Ok((entries, vec![error])),
    };

    let declared = match config::directive_declared_mappings(&entries) {
        Ok(declared) => declared,
        Err(errors) => return Ok((entries, errors)),
    };

    let mut errors = Vec::new();
    let arena = MarkerArena::collect(
        &entries,
        config.handle_default_pad_directives,
        &mut errors,
    );

    let timeline = Timeline::build(&entries, &arena);
    let mut resolver = SourceResolver::new(declared, config.default_mappings);

    let outcome = engine::reconcile(&timeline, &arena, &mut resolver, options)?;
    errors.extend(outcome.errors);

    debug!(
        markers = arena.len(),
        corrections = outcome.synthesized.iter().map(Vec::len).sum::<usize>(),
        "pad reconciliation finished"
    );

    let directives = insert::splice(
        entries,
        &arena,
        outcome.synthesized,
        config.generate_errors_on_unused_pad_entries,
        &mut errors,
    );

    Ok((directives, errors))
}

/// The `pad_extended` plugin.
pub struct PadExtendedPlugin;

impl LedgerPlugin for PadExtendedPlugin {
    fn name(&self) -> &'static str {
        "pad_extended"
    }

    fn process(&self, input: PluginInput) -> anyhow::Result<PluginOutput> {
        let (directives, errors) =
            pad_extended(input.directives, &input.options, input.config.as_deref())?;
        Ok(PluginOutput { directives, errors })
    }
}
