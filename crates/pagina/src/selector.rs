//! Selector composition for hierarchically scoped page objects.
//!
//! Every accessor on a page-object node computes its effective CSS selector
//! on demand by walking the node's ancestor chain and merging scope fragments
//! with per-call options. Composition is pure string assembly: narrowing to
//! an indexed match or filtering by visible text is *recorded* on the
//! resolved [`ScopedSelector`] and performed by the host DOM collaborator,
//! never rewritten into the CSS string itself.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// QUERY OPTIONS
// =============================================================================

/// Per-call options accepted by every descriptor factory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Replacement for the descriptor's own selector fragment for this call
    pub scope: Option<String>,
    /// Narrow the match to the element at this zero-based index
    pub at: Option<usize>,
    /// Ignore all ancestor scopes; the local selector becomes the whole selector
    pub reset_scope: bool,
    /// Root the query in an alternate test container
    pub test_container: Option<String>,
    /// Key used in diagnostics instead of the raw selector
    pub page_object_key: Option<String>,
}

impl QueryOptions {
    /// Create empty options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the effective local selector for this call
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Restrict the match to the element at `at` (zero-based)
    #[must_use]
    pub const fn with_at(mut self, at: usize) -> Self {
        self.at = Some(at);
        self
    }

    /// Discard every ancestor scope when composing
    #[must_use]
    pub const fn with_reset_scope(mut self) -> Self {
        self.reset_scope = true;
        self
    }

    /// Root the query in `container` instead of the default test root
    #[must_use]
    pub fn with_test_container(mut self, container: impl Into<String>) -> Self {
        self.test_container = Some(container.into());
        self
    }

    /// Name this query in diagnostics
    #[must_use]
    pub fn with_page_object_key(mut self, key: impl Into<String>) -> Self {
        self.page_object_key = Some(key.into());
        self
    }
}

// =============================================================================
// SCOPE FRAGMENTS
// =============================================================================

/// One node's contribution to the ancestor scope chain, in root-to-leaf order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFragment {
    /// The node's local selector fragment, if any
    pub selector: Option<String>,
    /// Whether this node discards every fragment above it
    pub reset_scope: bool,
    /// The node's test-container override, if any
    pub test_container: Option<String>,
    /// The node's local index, if any (only the leaf's index participates)
    pub at: Option<usize>,
}

impl ScopeFragment {
    /// Create a fragment carrying only a selector
    #[must_use]
    pub fn new(selector: Option<String>) -> Self {
        Self {
            selector,
            ..Self::default()
        }
    }

    /// Mark this fragment as a scope reset point
    #[must_use]
    pub const fn with_reset_scope(mut self) -> Self {
        self.reset_scope = true;
        self
    }

    /// Attach a test-container override
    #[must_use]
    pub fn with_test_container(mut self, container: impl Into<String>) -> Self {
        self.test_container = Some(container.into());
        self
    }

    /// Attach a local index
    #[must_use]
    pub const fn with_at(mut self, at: usize) -> Self {
        self.at = Some(at);
        self
    }
}

// =============================================================================
// RESOLVED SELECTOR
// =============================================================================

/// The resolved product handed to the execution context.
///
/// `css` alone is a plain selector; `text` asks the host to keep only
/// elements whose visible text (or label) matches exactly; `at` asks for the
/// single element at that ordinal among matches; `container` roots the query
/// in an alternate test container. An empty `css` with no `text` filter is a
/// valid "match anything in the container" query, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedSelector {
    /// Composed CSS selector (may be empty)
    pub css: String,
    /// Exact visible-text filter, applied by the host
    pub text: Option<String>,
    /// Zero-based ordinal narrowing, applied by the host
    pub at: Option<usize>,
    /// Alternate test-container root
    pub container: Option<String>,
}

impl ScopedSelector {
    /// Create a plain CSS selector with no narrowing
    #[must_use]
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            ..Self::default()
        }
    }

    /// Filter to elements whose visible text matches `text` exactly
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Narrow to the element at `at` (zero-based)
    #[must_use]
    pub const fn with_at(mut self, at: usize) -> Self {
        self.at = Some(at);
        self
    }

    /// Root the query in `container`
    #[must_use]
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// True when the selector matches anything in the container
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.css.is_empty() && self.text.is_none()
    }
}

impl fmt::Display for ScopedSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.css.is_empty() {
            write!(f, "*")?;
        } else {
            write!(f, "{}", self.css)?;
        }
        if let Some(ref text) = self.text {
            write!(f, " [text={text:?}]")?;
        }
        if let Some(at) = self.at {
            write!(f, " [at={at}]")?;
        }
        if let Some(ref container) = self.container {
            write!(f, " [container={container}]")?;
        }
        Ok(())
    }
}

// =============================================================================
// COMPOSITION
// =============================================================================

/// Join selector fragments with single spaces, skipping empty pieces.
fn join_fragments<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for piece in pieces {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(piece);
    }
    out
}

/// Compute the effective selector for a node's accessor call.
///
/// `chain` is the node's scope chain in root-to-leaf order, the leaf fragment
/// being the node's own. `local` is the descriptor's selector fragment, if
/// any; `options.scope` replaces it for this call. Fragments strictly above
/// the last reset point are discarded, as is the whole ancestor scope when
/// `options.reset_scope` is set. The leaf's local index applies unless
/// overridden by `options.at`; the innermost test container wins unless
/// overridden by `options.test_container`.
#[must_use]
pub fn compose(chain: &[ScopeFragment], local: Option<&str>, options: &QueryOptions) -> ScopedSelector {
    let effective_local = options.scope.as_deref().or(local);

    let css = if options.reset_scope {
        effective_local.unwrap_or("").trim().to_string()
    } else {
        // Keep fragments from the last reset point onward.
        let base = chain
            .iter()
            .rposition(|fragment| fragment.reset_scope)
            .unwrap_or(0);
        join_fragments(
            chain[base..]
                .iter()
                .filter_map(|fragment| fragment.selector.as_deref())
                .chain(effective_local),
        )
    };

    let at = options.at.or_else(|| chain.last().and_then(|leaf| leaf.at));
    let container = options.test_container.clone().or_else(|| {
        chain
            .iter()
            .rev()
            .find_map(|fragment| fragment.test_container.clone())
    });

    let resolved = ScopedSelector {
        css,
        text: None,
        at,
        container,
    };
    tracing::trace!(
        selector = %resolved,
        key = options.page_object_key.as_deref().unwrap_or_default(),
        "composed selector"
    );
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_of(selectors: &[&str]) -> Vec<ScopeFragment> {
        selectors
            .iter()
            .map(|s| ScopeFragment::new(Some((*s).to_string())))
            .collect()
    }

    mod compose_tests {
        use super::*;

        #[test]
        fn test_concatenates_root_to_leaf() {
            let chain = chain_of(&[".calculator", ".screen"]);
            let resolved = compose(&chain, Some("input"), &QueryOptions::default());
            assert_eq!(resolved.css, ".calculator .screen input");
        }

        #[test]
        fn test_no_local_selector() {
            let chain = chain_of(&[".calculator", ".numbers"]);
            let resolved = compose(&chain, None, &QueryOptions::default());
            assert_eq!(resolved.css, ".calculator .numbers");
        }

        #[test]
        fn test_absent_fragments_are_skipped() {
            let chain = vec![
                ScopeFragment::new(Some(".calculator".to_string())),
                ScopeFragment::new(None),
                ScopeFragment::new(Some("input".to_string())),
            ];
            let resolved = compose(&chain, None, &QueryOptions::default());
            assert_eq!(resolved.css, ".calculator input");
        }

        #[test]
        fn test_empty_everything_is_global() {
            let resolved = compose(&[], None, &QueryOptions::default());
            assert_eq!(resolved.css, "");
            assert!(resolved.is_global());
        }

        #[test]
        fn test_scope_option_overrides_local() {
            let chain = chain_of(&[".calculator"]);
            let options = QueryOptions::new().with_scope(".screen input");
            let resolved = compose(&chain, Some("button"), &options);
            assert_eq!(resolved.css, ".calculator .screen input");
        }
    }

    mod reset_scope_tests {
        use super::*;

        #[test]
        fn test_ancestor_reset_discards_fragments_above() {
            let chain = vec![
                ScopeFragment::new(Some(".page".to_string())),
                ScopeFragment::new(Some(".modal".to_string())).with_reset_scope(),
                ScopeFragment::new(Some(".body".to_string())),
            ];
            let resolved = compose(&chain, Some("button"), &QueryOptions::default());
            assert_eq!(resolved.css, ".modal .body button");
        }

        #[test]
        fn test_innermost_reset_wins() {
            let chain = vec![
                ScopeFragment::new(Some(".a".to_string())),
                ScopeFragment::new(Some(".b".to_string())).with_reset_scope(),
                ScopeFragment::new(Some(".c".to_string())).with_reset_scope(),
            ];
            let resolved = compose(&chain, None, &QueryOptions::default());
            assert_eq!(resolved.css, ".c");
        }

        #[test]
        fn test_option_reset_replaces_everything() {
            let chain = chain_of(&[".page", ".modal"]);
            let options = QueryOptions::new().with_reset_scope();
            let resolved = compose(&chain, Some(".standalone"), &options);
            assert_eq!(resolved.css, ".standalone");
        }

        #[test]
        fn test_option_reset_with_no_local_is_global() {
            let chain = chain_of(&[".page"]);
            let options = QueryOptions::new().with_reset_scope();
            let resolved = compose(&chain, None, &options);
            assert!(resolved.is_global());
        }
    }

    mod narrowing_tests {
        use super::*;

        #[test]
        fn test_at_is_recorded_not_rewritten() {
            let chain = chain_of(&[".numbers"]);
            let options = QueryOptions::new().with_at(2);
            let resolved = compose(&chain, Some("button"), &options);
            assert_eq!(resolved.css, ".numbers button");
            assert_eq!(resolved.at, Some(2));
        }

        #[test]
        fn test_leaf_local_at_applies() {
            let chain = vec![
                ScopeFragment::new(Some(".rows".to_string())),
                ScopeFragment::new(Some(".row".to_string())).with_at(1),
            ];
            let resolved = compose(&chain, None, &QueryOptions::default());
            assert_eq!(resolved.at, Some(1));
        }

        #[test]
        fn test_option_at_overrides_leaf_at() {
            let chain = vec![ScopeFragment::new(Some(".row".to_string())).with_at(1)];
            let options = QueryOptions::new().with_at(4);
            let resolved = compose(&chain, None, &options);
            assert_eq!(resolved.at, Some(4));
        }

        #[test]
        fn test_ancestor_at_does_not_leak() {
            let chain = vec![
                ScopeFragment::new(Some(".rows".to_string())).with_at(3),
                ScopeFragment::new(Some(".cell".to_string())),
            ];
            let resolved = compose(&chain, None, &QueryOptions::default());
            assert_eq!(resolved.at, None);
        }
    }

    mod container_tests {
        use super::*;

        #[test]
        fn test_innermost_container_wins() {
            let chain = vec![
                ScopeFragment::new(Some(".a".to_string())).with_test_container("#outer"),
                ScopeFragment::new(Some(".b".to_string())).with_test_container("#inner"),
            ];
            let resolved = compose(&chain, None, &QueryOptions::default());
            assert_eq!(resolved.container.as_deref(), Some("#inner"));
        }

        #[test]
        fn test_option_container_overrides_chain() {
            let chain =
                vec![ScopeFragment::new(Some(".a".to_string())).with_test_container("#outer")];
            let options = QueryOptions::new().with_test_container("#override");
            let resolved = compose(&chain, None, &options);
            assert_eq!(resolved.container.as_deref(), Some("#override"));
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn test_display_plain() {
            let sel = ScopedSelector::css(".screen input");
            assert_eq!(sel.to_string(), ".screen input");
        }

        #[test]
        fn test_display_global() {
            let sel = ScopedSelector::css("");
            assert_eq!(sel.to_string(), "*");
        }

        #[test]
        fn test_display_narrowed() {
            let sel = ScopedSelector::css("button").with_text("9").with_at(1);
            assert_eq!(sel.to_string(), "button [text=\"9\"] [at=1]");
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_concatenation_law(
                selectors in prop::collection::vec("[a-z][a-z0-9]{0,5}", 1..6),
                local in "[a-z][a-z0-9]{0,5}",
            ) {
                let chain = selectors
                    .iter()
                    .map(|s| ScopeFragment::new(Some(s.clone())))
                    .collect::<Vec<_>>();
                let resolved = compose(&chain, Some(&local), &QueryOptions::default());
                let mut expected = selectors.join(" ");
                expected.push(' ');
                expected.push_str(&local);
                prop_assert_eq!(resolved.css, expected);
            }

            #[test]
            fn prop_reset_discards_strict_ancestors(
                selectors in prop::collection::vec("[a-z][a-z0-9]{0,5}", 2..6),
                reset_index in 0usize..5,
            ) {
                let reset_index = reset_index % selectors.len();
                let chain = selectors
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        let fragment = ScopeFragment::new(Some(s.clone()));
                        if i == reset_index {
                            fragment.with_reset_scope()
                        } else {
                            fragment
                        }
                    })
                    .collect::<Vec<_>>();
                let resolved = compose(&chain, None, &QueryOptions::default());
                prop_assert_eq!(resolved.css, selectors[reset_index..].join(" "));
            }
        }
    }
}
