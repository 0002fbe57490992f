//! Built-in descriptor behaviors.
//!
//! Concrete DOM-facing operations behind every built-in descriptor,
//! expressed in terms of the selector composer and the execution bridge.
//! None of these carry cross-call state: each invocation is a pure function
//! of the current DOM, the resolved selector, and its arguments.

use crate::bridge::{run_async, run_sync};
use crate::context::ExecutionContext;
use crate::node::PageNode;
use crate::result::{PaginaError, PaginaResult};
use crate::selector::{QueryOptions, ScopedSelector};
use serde_json::Value;

/// Descendants considered clickable by the default `clickOn` behavior.
pub const CLICKABLE_DESCENDANTS: &str = "a, button, label, input";

/// Form-control tags probed by the clue search, outermost loop second.
const FILLABLE_TAGS: [&str; 3] = ["input", "textarea", "select"];

/// Attributes a clue is matched against, in priority order.
const CLUE_ATTRIBUTES: [&str; 5] = ["data-testid", "aria-label", "placeholder", "name", "id"];

fn resolved(node: &PageNode, selector: &str, options: &QueryOptions) -> ScopedSelector {
    let local = if selector.is_empty() {
        None
    } else {
        Some(selector)
    };
    node.resolve_selector(local, options)
}

fn string_arg(args: &[Value], index: usize, what: &str) -> PaginaResult<String> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PaginaError::InvalidState {
            message: format!("{what} expects a string argument at position {index}"),
        })
}

fn join_scope(scope: &str, descendant: &str) -> String {
    if scope.is_empty() {
        descendant.to_string()
    } else {
        format!("{scope} {descendant}")
    }
}

// =============================================================================
// QUERIES
// =============================================================================

/// Read the resolved element's trimmed text.
///
/// With `at` set the read is strict and a missing element is
/// `ElementNotFound`; without it, zero matches read as the empty string and
/// multiple matches read the first in document order.
pub(crate) fn read_text(
    node: &PageNode,
    selector: &str,
    options: &QueryOptions,
) -> PaginaResult<Value> {
    lenient_read(node, selector, options, ReadKind::Text).map(Value::String)
}

/// Read the resolved form control's current value (same match policy as text).
pub(crate) fn read_value(
    node: &PageNode,
    selector: &str,
    options: &QueryOptions,
) -> PaginaResult<Value> {
    lenient_read(node, selector, options, ReadKind::ControlValue).map(Value::String)
}

#[derive(Clone, Copy)]
enum ReadKind {
    Text,
    ControlValue,
}

fn lenient_read(
    node: &PageNode,
    selector: &str,
    options: &QueryOptions,
    kind: ReadKind,
) -> PaginaResult<String> {
    let target = resolved(node, selector, options);
    run_sync(node, |ctx| {
        if target.at.is_some() {
            ctx.assert_element_exists(&target)?;
        }
        let outcome = match kind {
            ReadKind::Text => ctx.text(&target),
            ReadKind::ControlValue => ctx.value(&target),
        };
        match outcome {
            Ok(text) => Ok(text),
            Err(PaginaError::ElementNotFound { .. }) if target.at.is_none() => {
                Ok(String::new())
            }
            Err(other) => Err(other),
        }
    })
}

/// True when at least one match is present and the first/`at` match is visible.
pub(crate) fn visible(
    node: &PageNode,
    selector: &str,
    options: &QueryOptions,
) -> PaginaResult<Value> {
    let target = resolved(node, selector, options);
    run_sync(node, |ctx| ctx.is_visible(&target).map(Value::Bool))
}

/// True when a present match is not visible, or when narrowing by `at` does
/// not resolve to a visible element.
pub(crate) fn hidden(
    node: &PageNode,
    selector: &str,
    options: &QueryOptions,
) -> PaginaResult<Value> {
    let target = resolved(node, selector, options);
    run_sync(node, |ctx| {
        let result = match target.at {
            Some(index) => index >= ctx.count(&target)? || !ctx.is_visible(&target)?,
            None => ctx.count(&target)? >= 1 && !ctx.is_visible(&target)?,
        };
        Ok(Value::Bool(result))
    })
}

/// Case-sensitive substring test against the resolved element's text.
pub(crate) fn contains(
    node: &PageNode,
    selector: &str,
    options: &QueryOptions,
    args: &[Value],
) -> PaginaResult<Value> {
    let needle = string_arg(args, 0, "contains")?;
    let text = lenient_read(node, selector, options, ReadKind::Text)?;
    Ok(Value::Bool(text.contains(&needle)))
}

/// Number of elements matching the resolved selector (`at` ignored).
pub(crate) fn count_of(
    node: &PageNode,
    selector: &str,
    options: &QueryOptions,
) -> PaginaResult<Value> {
    let target = resolved(node, selector, options);
    run_sync(node, |ctx| ctx.count(&target).map(|n| Value::from(n as u64)))
}

/// True when at least one element matches, visible or not.
pub(crate) fn present(
    node: &PageNode,
    selector: &str,
    options: &QueryOptions,
) -> PaginaResult<Value> {
    let target = resolved(node, selector, options);
    run_sync(node, |ctx| ctx.count(&target).map(|n| Value::Bool(n >= 1)))
}

/// Attribute value of the resolved element; `Null` when the attribute (or,
/// without `at`, the element) is absent.
pub(crate) fn attribute_of(
    node: &PageNode,
    attribute: &str,
    selector: &str,
    options: &QueryOptions,
) -> PaginaResult<Value> {
    let target = resolved(node, selector, options);
    run_sync(node, |ctx| {
        if target.at.is_some() {
            ctx.assert_element_exists(&target)?;
        }
        match ctx.attribute(&target, attribute) {
            Ok(found) => Ok(found.map_or(Value::Null, Value::String)),
            Err(PaginaError::ElementNotFound { .. }) if target.at.is_none() => Ok(Value::Null),
            Err(other) => Err(other),
        }
    })
}

// =============================================================================
// ACTIONS
// =============================================================================

/// Assert the resolved element exists, then enqueue a click on it.
pub(crate) fn click(
    node: &PageNode,
    selector: &str,
    options: &QueryOptions,
) -> PaginaResult<Value> {
    let target = resolved(node, selector, options);
    run_async(node, |ctx| {
        ctx.assert_element_exists(&target)?;
        ctx.click(&target)
    })?;
    Ok(Value::Null)
}

/// Click the first clickable descendant whose visible text or label matches
/// the argument exactly; existence is asserted before the click is enqueued.
pub(crate) fn click_on_text(
    node: &PageNode,
    selector: &str,
    options: &QueryOptions,
    args: &[Value],
) -> PaginaResult<Value> {
    let text = string_arg(args, 0, "clickOn")?;
    let local = if selector.is_empty() {
        format!(":is({CLICKABLE_DESCENDANTS})")
    } else {
        selector.to_string()
    };
    let target = node.resolve_selector(Some(&local), options).with_text(text);
    run_async(node, |ctx| {
        ctx.assert_element_exists(&target)?;
        ctx.click(&target)
    })?;
    Ok(Value::Null)
}

/// Fill the resolved element, or a clue-identified form-control descendant.
///
/// One argument fills the resolved selector directly. Two arguments search
/// within the resolved scope for `input`/`textarea`/`select` descendants
/// whose test-id attribute, aria-label, placeholder, name, or id (in that
/// priority order) equals the clue, and fill the first match, never the
/// resolved element itself.
pub(crate) fn fill(
    node: &PageNode,
    selector: &str,
    options: &QueryOptions,
    args: &[Value],
    select_option: bool,
) -> PaginaResult<Value> {
    let what = if select_option { "select" } else { "fillIn" };
    match args {
        [_value] => {
            let value = string_arg(args, 0, what)?;
            let target = resolved(node, selector, options);
            run_async(node, |ctx| {
                ctx.assert_element_exists(&target)?;
                apply_fill(ctx, &target, &value, select_option)
            })?;
        }
        [_clue, _value] => {
            let clue = string_arg(args, 0, what)?;
            let value = string_arg(args, 1, what)?;
            let scope = resolved(node, selector, options);
            let target = run_sync(node, |ctx| find_by_clue(ctx, &scope, &clue))?;
            run_async(node, |ctx| apply_fill(ctx, &target, &value, select_option))?;
        }
        _ => {
            return Err(PaginaError::InvalidState {
                message: format!("{what} expects (value) or (clue, value)"),
            })
        }
    }
    Ok(Value::Null)
}

fn apply_fill(
    ctx: &dyn ExecutionContext,
    target: &ScopedSelector,
    value: &str,
    select_option: bool,
) -> PaginaResult<()> {
    if select_option {
        ctx.select(target, value)
    } else {
        ctx.fill_in(target, value)
    }
}

/// Probe clue candidates through the host, in priority order.
///
/// Candidate selectors are composed as strings and counted by the host; the
/// ordinal narrowing of the enclosing scope does not participate (this is a
/// descendant search).
fn find_by_clue(
    ctx: &dyn ExecutionContext,
    scope: &ScopedSelector,
    clue: &str,
) -> PaginaResult<ScopedSelector> {
    for attribute in CLUE_ATTRIBUTES {
        for tag in FILLABLE_TAGS {
            let descendant = format!("{tag}[{attribute}=\"{clue}\"]");
            let candidate = ScopedSelector {
                css: join_scope(&scope.css, &descendant),
                text: None,
                at: None,
                container: scope.container.clone(),
            };
            if ctx.count(&candidate)? > 0 {
                return Ok(candidate);
            }
        }
    }
    Err(PaginaError::ElementNotFound {
        selector: format!("{scope} [clue={clue:?}]"),
    })
}

// =============================================================================
// SETTLE
// =============================================================================

/// Forward to the host's settle primitive through the resolved context.
pub(crate) fn settle(node: &PageNode) -> PaginaResult<Value> {
    tracing::debug!(key = %node.key(), "settling pending actions");
    run_sync(node, |ctx| ctx.settle())?;
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_scope_handles_empty_base() {
        assert_eq!(join_scope("", "input"), "input");
        assert_eq!(join_scope(".form", "input"), ".form input");
    }

    #[test]
    fn test_string_arg_rejects_non_strings() {
        let err = string_arg(&[Value::Bool(true)], 0, "contains").unwrap_err();
        assert!(matches!(err, PaginaError::InvalidState { .. }));
        let err = string_arg(&[], 0, "contains").unwrap_err();
        assert!(matches!(err, PaginaError::InvalidState { .. }));
    }

    #[test]
    fn test_clue_attribute_priority_order() {
        // The ladder is part of the public fill contract.
        assert_eq!(
            CLUE_ATTRIBUTES,
            ["data-testid", "aria-label", "placeholder", "name", "id"]
        );
    }
}
