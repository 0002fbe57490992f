//! Host execution contexts and the process-wide default.
//!
//! Pagina never touches the DOM itself. Every query and action is delegated
//! to an [`ExecutionContext`]: the host test framework's adapter over its DOM
//! helpers and its settle/"wait for quiescent" primitive. A context can be
//! attached to any node of a built page-object tree with `set_context`;
//! nodes without one resolve upward through their ancestors and finally fall
//! back to the default installed here.
//!
//! The default is explicit per-thread state with a documented lifecycle:
//! install it once at test start with [`set_default_context`], read it with
//! [`default_context`], tear it down with [`clear_default_context`]. The host
//! runner executes tests on a single cooperative thread, so thread-scoped
//! state is process-wide state for resolution purposes; `#[test]` threads
//! each install their own.

use crate::result::PaginaResult;
use crate::selector::ScopedSelector;
use std::cell::RefCell;
use std::rc::Rc;

/// The strategy used to run DOM operations for a page-object node.
///
/// Queries (`count`, `text`, `value`, `attribute`, `is_visible`) read the
/// current DOM synchronously. Mutating operations (`click`, `fill_in`,
/// `select`) enqueue work against the host's pending-action queue and return
/// immediately; nothing is guaranteed complete until [`settle`] resolves.
/// Where a query narrows by ordinal but multiple elements match without an
/// `at`, the first match in document order is used.
///
/// [`settle`]: ExecutionContext::settle
pub trait ExecutionContext {
    /// Fail with `ElementNotFound` unless `target` matches at least one
    /// element (the element at `target.at`, when set).
    fn assert_element_exists(&self, target: &ScopedSelector) -> PaginaResult<()>;

    /// Number of elements matching `target`'s css and text filter.
    ///
    /// Ordinal narrowing (`target.at`) is ignored: this counts the whole
    /// collection the ordinal would index into.
    fn count(&self, target: &ScopedSelector) -> PaginaResult<usize>;

    /// Trimmed visible text of the first (or `at`-indexed) match.
    ///
    /// Fails with `ElementNotFound` when nothing matches.
    fn text(&self, target: &ScopedSelector) -> PaginaResult<String>;

    /// Current value of the first (or `at`-indexed) matching form control.
    fn value(&self, target: &ScopedSelector) -> PaginaResult<String>;

    /// Attribute `name` of the first (or `at`-indexed) match, `None` when
    /// the attribute is absent.
    fn attribute(&self, target: &ScopedSelector, name: &str) -> PaginaResult<Option<String>>;

    /// Whether the first (or `at`-indexed) match exists and is visible.
    fn is_visible(&self, target: &ScopedSelector) -> PaginaResult<bool>;

    /// Enqueue a click on the first (or `at`-indexed) match.
    fn click(&self, target: &ScopedSelector) -> PaginaResult<()>;

    /// Enqueue filling the first (or `at`-indexed) match with `value`.
    fn fill_in(&self, target: &ScopedSelector, value: &str) -> PaginaResult<()>;

    /// Enqueue selecting the option `value` in the first (or `at`-indexed)
    /// matching select control.
    fn select(&self, target: &ScopedSelector, value: &str) -> PaginaResult<()> {
        self.fill_in(target, value)
    }

    /// Block until every enqueued action has completed.
    ///
    /// Timeouts are the host's responsibility and surface as
    /// `PaginaError::Timeout`.
    fn settle(&self) -> PaginaResult<()>;
}

thread_local! {
    static DEFAULT_CONTEXT: RefCell<Option<Rc<dyn ExecutionContext>>> =
        const { RefCell::new(None) };
}

/// Install the process-wide default execution context.
///
/// Called once at test-process start by the host adapter. Trees without an
/// explicitly attached context resolve to this one.
pub fn set_default_context(context: Rc<dyn ExecutionContext>) {
    tracing::debug!("installing default execution context");
    DEFAULT_CONTEXT.with(|slot| {
        *slot.borrow_mut() = Some(context);
    });
}

/// Remove the process-wide default execution context.
pub fn clear_default_context() {
    tracing::debug!("clearing default execution context");
    DEFAULT_CONTEXT.with(|slot| {
        *slot.borrow_mut() = None;
    });
}

/// The currently installed default execution context, if any.
#[must_use]
pub fn default_context() -> Option<Rc<dyn ExecutionContext>> {
    DEFAULT_CONTEXT.with(|slot| slot.borrow().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockContext;

    mod default_context_tests {
        use super::*;

        #[test]
        fn test_unset_by_default() {
            clear_default_context();
            assert!(default_context().is_none());
        }

        #[test]
        fn test_set_and_clear_roundtrip() {
            let mock = MockContext::new();
            set_default_context(Rc::new(mock));
            assert!(default_context().is_some());
            clear_default_context();
            assert!(default_context().is_none());
        }

        #[test]
        fn test_set_replaces_previous() {
            let first: Rc<dyn ExecutionContext> = Rc::new(MockContext::new());
            let second: Rc<dyn ExecutionContext> = Rc::new(MockContext::new());
            set_default_context(first);
            set_default_context(second.clone());
            let resolved = default_context().unwrap();
            assert!(Rc::ptr_eq(&resolved, &second));
            clear_default_context();
        }
    }

    mod select_default_tests {
        use super::*;
        use crate::selector::ScopedSelector;

        #[test]
        fn test_select_defaults_to_fill_in() {
            // The default trait impl forwards select to fill_in; MockContext
            // overrides it, so probe via a minimal inline context.
            struct FillOnly {
                fills: RefCell<Vec<String>>,
            }
            impl ExecutionContext for FillOnly {
                fn assert_element_exists(&self, _: &ScopedSelector) -> PaginaResult<()> {
                    Ok(())
                }
                fn count(&self, _: &ScopedSelector) -> PaginaResult<usize> {
                    Ok(1)
                }
                fn text(&self, _: &ScopedSelector) -> PaginaResult<String> {
                    Ok(String::new())
                }
                fn value(&self, _: &ScopedSelector) -> PaginaResult<String> {
                    Ok(String::new())
                }
                fn attribute(
                    &self,
                    _: &ScopedSelector,
                    _: &str,
                ) -> PaginaResult<Option<String>> {
                    Ok(None)
                }
                fn is_visible(&self, _: &ScopedSelector) -> PaginaResult<bool> {
                    Ok(true)
                }
                fn click(&self, _: &ScopedSelector) -> PaginaResult<()> {
                    Ok(())
                }
                fn fill_in(&self, _: &ScopedSelector, value: &str) -> PaginaResult<()> {
                    self.fills.borrow_mut().push(value.to_string());
                    Ok(())
                }
                fn settle(&self) -> PaginaResult<()> {
                    Ok(())
                }
            }

            let ctx = FillOnly {
                fills: RefCell::new(Vec::new()),
            };
            ctx.select(&ScopedSelector::css("select"), "blue").unwrap();
            assert_eq!(ctx.fills.borrow().as_slice(), ["blue".to_string()]);
        }
    }
}
