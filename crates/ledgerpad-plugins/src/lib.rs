//! Plugin collection for a plain-text double-entry ledger.
//!
//! Each plugin receives the full parsed directive list plus parser options
//! and returns a possibly-modified list of directives together with a list
//! of diagnostics. Plugins run strictly inside the host pipeline, after
//! parsing and before report generation.
//!
//! # Plugins
//!
//! - `pad_extended`: balance-padding and gap-filling engine. Given the
//!   historical postings, balance assertions and pad markers of an account,
//!   synthesizes the minimal set of adjusting transactions that make every
//!   balance assertion hold, with configurable source-account resolution.
//! - `group_padding`: collapses same-day padding transactions between the
//!   same pair of accounts into one grouped transaction.
//!
//! # Example
//!
//! ```
//! use ledgerpad_plugins::{PluginInput, PluginOptions, PluginRegistry};
//!
//! let registry = PluginRegistry::new();
//! let plugin = registry.find("pad_extended").unwrap();
//!
//! let input = PluginInput {
//!     directives: vec![],
//!     options: PluginOptions::default(),
//!     config: None,
//! };
//! let output = plugin.process(input).unwrap();
//! assert!(output.directives.is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod group;
pub mod pad;
pub mod types;

pub use group::GroupPaddingPlugin;
pub use pad::{pad_extended, PadExtendedPlugin, PadFatal};
pub use types::{balance_tolerance, PluginError, PluginInput, PluginOptions, PluginOutput};

/// Trait implemented by every plugin in this collection.
///
/// `process` returns `Err` only for fatal faults (detected internal
/// inconsistencies with no recoverable path); recoverable per-entry
/// problems are reported as diagnostics in the output instead.
pub trait LedgerPlugin: Send + Sync {
    /// Plugin name, as referenced from the ledger file.
    fn name(&self) -> &str;

    /// Process directives and return modified directives plus diagnostics.
    fn process(&self, input: PluginInput) -> anyhow::Result<PluginOutput>;
}

/// Registry of the plugins in this collection.
pub struct PluginRegistry {
    plugins: Vec<Box<dyn LedgerPlugin>>,
}

impl PluginRegistry {
    /// Create a registry with all built-in plugins.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: vec![
                Box::new(PadExtendedPlugin),
                Box::new(GroupPaddingPlugin),
            ],
        }
    }

    /// Find a plugin by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&dyn LedgerPlugin> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .map(std::convert::AsRef::as_ref)
    }

    /// Iterate the registered plugins.
    pub fn iter(&self) -> impl Iterator<Item = &dyn LedgerPlugin> {
        self.plugins.iter().map(std::convert::AsRef::as_ref)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_finds_plugins() {
        let registry = PluginRegistry::new();
        assert!(registry.find("pad_extended").is_some());
        assert!(registry.find("group_padding").is_some());
        assert!(registry.find("nonexistent").is_none());
    }
}
