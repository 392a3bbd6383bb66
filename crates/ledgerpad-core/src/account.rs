//! Helpers for colon-delimited hierarchical account paths.
//!
//! Account names look like `Assets:Bank:Checking`: a top-level category
//! followed by progressively more specific components.

/// The separator between account path components.
pub const SEPARATOR: char = ':';

/// Split an account path into its top-level category and the rest.
///
/// `Assets:Bank:Checking` splits into `("Assets", "Bank:Checking")`.
/// An account with a single component has an empty remainder.
#[must_use]
pub fn root_and_leaf(account: &str) -> (&str, &str) {
    match account.split_once(SEPARATOR) {
        Some((root, rest)) => (root, rest),
        None => (account, ""),
    }
}

/// Check whether `account` is `ancestor` itself or one of its descendants.
///
/// The match is on whole path components: `Assets:Bank` covers
/// `Assets:Bank:Checking` but not `Assets:Bankers`.
#[must_use]
pub fn is_self_or_descendant(account: &str, ancestor: &str) -> bool {
    account == ancestor
        || (account.len() > ancestor.len()
            && account.starts_with(ancestor)
            && account[ancestor.len()..].starts_with(SEPARATOR))
}
