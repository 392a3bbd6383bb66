//! Configuration for the extended pad plugin.
//!
//! Configuration comes from two places:
//!
//! - the plugin configuration string, a JSON object with the keys
//!   `handle_default_pad_directives`, `default_pad_account` and
//!   `generate_errors_on_unused_pad_entries`;
//! - in-ledger `pad-ext-config` custom directives mapping account regexes
//!   to source accounts.
//!
//! All configuration errors are detected eagerly, before any reconciliation
//! runs; on error the plugin returns the original, unmodified directive
//! list plus the errors.

use regex::Regex;
use serde::Deserialize;

use ledgerpad_core::{Custom, Directive, MetaValue};

use crate::types::PluginError;

/// The custom directive type encoding a pad marker.
pub const PAD_MARKER_TYPE: &str = "pad-ext";
/// The custom directive type encoding an account-regex-to-source mapping.
pub const PAD_CONFIG_TYPE: &str = "pad-ext-config";
/// Metadata key carrying an explicit source account on a pad marker.
pub const META_SOURCE_ACCOUNT: &str = "pad_account";

const META_ACCOUNT_REGEX: &str = "account_regex";
const META_EXPENSES_ACCOUNT: &str = "pad_account_expenses";
const META_INCOME_ACCOUNT: &str = "pad_account_income";

/// Built-in fallback mapping table, used when the configuration string does
/// not override `default_pad_account`. The catch-all pattern is last (and
/// here, only): a positive imbalance is absorbed by an income account, a
/// negative one by an expenses account.
const DEFAULT_PAD_ACCOUNT_TABLE: &[(&str, &str, &str)] = &[(
    r"^.*$",
    "Income:Unattributed:{name}",
    "Expenses:Unattributed:{name}",
)];

/// Where a matched mapping sends the adjustment.
#[derive(Debug, Clone)]
pub enum MappingTarget {
    /// One source account template, used regardless of imbalance sign.
    Single(String),
    /// A pair of templates selected by the sign of the imbalance.
    Signed {
        /// Template used when the padded account gained value.
        income: String,
        /// Template used when the padded account lost value.
        expenses: String,
    },
}

/// One `(account regex) -> source account template(s)` rule.
#[derive(Debug, Clone)]
pub struct RegexMapping {
    /// Compiled pattern over the full padded-account path.
    pub pattern: Regex,
    /// The template(s) to expand on a match.
    pub target: MappingTarget,
}

/// Parsed plugin configuration.
#[derive(Debug, Clone)]
pub struct PadConfig {
    /// Whether native `Pad` directives participate in auto-padding.
    pub handle_default_pad_directives: bool,
    /// Whether unused pad markers produce diagnostics.
    pub generate_errors_on_unused_pad_entries: bool,
    /// The default mapping table, checked after directive-declared rules.
    pub default_mappings: Vec<RegexMapping>,
}

/// Raw shape of the JSON configuration string.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    handle_default_pad_directives: bool,
    #[serde(default)]
    generate_errors_on_unused_pad_entries: bool,
    default_pad_account: Option<Vec<RawMappingEntry>>,
}

/// One `default_pad_account` entry: `[regex, source]` or
/// `[regex, income_source, expenses_source]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMappingEntry {
    Signed(String, String, String),
    Single(String, String),
}

impl RawMappingEntry {
    fn compile(&self) -> Result<RegexMapping, PluginError> {
        let (pattern_str, target) = match self {
            Self::Single(pattern, source) => (pattern, MappingTarget::Single(source.clone())),
            Self::Signed(pattern, income, expenses) => (
                pattern,
                MappingTarget::Signed {
                    income: income.clone(),
                    expenses: expenses.clone(),
                },
            ),
        };
        let pattern = Regex::new(pattern_str).map_err(|e| {
            PluginError::new(format!("Invalid account regex {pattern_str:?}: {e}"))
        })?;
        Ok(RegexMapping { pattern, target })
    }
}

impl PadConfig {
    /// Parse the plugin configuration string.
    ///
    /// `None` or an empty string yields the defaults. Malformed JSON,
    /// unknown keys and invalid regexes are configuration errors.
    pub fn parse(config_str: Option<&str>) -> Result<Self, PluginError> {
        let raw = match config_str.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => serde_json::from_str::<RawConfig>(text)
                .map_err(|e| PluginError::new(format!("Invalid configuration string: {e}")))?,
            None => RawConfig {
                handle_default_pad_directives: false,
                generate_errors_on_unused_pad_entries: false,
                default_pad_account: None,
            },
        };

        let default_mappings = match raw.default_pad_account {
            Some(entries) => entries
                .iter()
                .map(RawMappingEntry::compile)
                .collect::<Result<Vec<_>, _>>()?,
            None => builtin_mapping_table()?,
        };

        Ok(Self {
            handle_default_pad_directives: raw.handle_default_pad_directives,
            generate_errors_on_unused_pad_entries: raw.generate_errors_on_unused_pad_entries,
            default_mappings,
        })
    }
}

fn builtin_mapping_table() -> Result<Vec<RegexMapping>, PluginError> {
    DEFAULT_PAD_ACCOUNT_TABLE
        .iter()
        .map(|(pattern, income, expenses)| {
            RawMappingEntry::Signed((*pattern).to_string(), (*income).to_string(), (*expenses).to_string())
                .compile()
        })
        .collect()
}

/// Scan the ledger for `pad-ext-config` directives and compile their rules.
///
/// Directives are reversed before matching so that later declarations take
/// priority over earlier ones. Each malformed directive yields one error;
/// any error aborts the plugin before reconciliation.
pub fn directive_declared_mappings(
    entries: &[Directive],
) -> Result<Vec<RegexMapping>, Vec<PluginError>> {
    let mut mappings = Vec::new();
    let mut errors = Vec::new();

    let config_entries = entries
        .iter()
        .filter_map(Directive::as_custom)
        .filter(|c| c.custom_type == PAD_CONFIG_TYPE);

    for entry in config_entries.collect::<Vec<_>>().into_iter().rev() {
        match compile_config_directive(entry) {
            Ok(mapping) => mappings.push(mapping),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(mappings)
    } else {
        Err(errors)
    }
}

fn compile_config_directive(entry: &Custom) -> Result<RegexMapping, PluginError> {
    let fail = |message: String| {
        PluginError::new(message)
            .with_source(entry.meta.clone())
            .with_entry(Directive::Custom(entry.clone()))
    };

    let meta_str = |key: &str| entry.meta.get(key).and_then(MetaValue::as_str);

    let Some(pattern_str) = meta_str(META_ACCOUNT_REGEX) else {
        return Err(fail(format!(
            "{META_ACCOUNT_REGEX} is required in config entry"
        )));
    };
    let pattern = Regex::new(pattern_str)
        .map_err(|e| fail(format!("Invalid {META_ACCOUNT_REGEX}: {e}")))?;

    let expenses = meta_str(META_EXPENSES_ACCOUNT);
    let income = meta_str(META_INCOME_ACCOUNT);
    let single = meta_str(META_SOURCE_ACCOUNT);

    let target = match (single, income, expenses) {
        (_, Some(income), Some(expenses)) => MappingTarget::Signed {
            income: income.to_string(),
            expenses: expenses.to_string(),
        },
        (Some(single), _, _) => MappingTarget::Single(single.to_string()),
        _ => {
            return Err(fail(format!(
                "{PAD_CONFIG_TYPE} requires {META_ACCOUNT_REGEX} and \
                 ({META_SOURCE_ACCOUNT} or {META_EXPENSES_ACCOUNT} and {META_INCOME_ACCOUNT})"
            )));
        }
    };

    Ok(RegexMapping { pattern, target })
}
