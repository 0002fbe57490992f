//! Execution bridge between page-object nodes and host contexts.
//!
//! Every bound accessor funnels through two entry points here. [`run_sync`]
//! resolves the invoking node's execution context and runs a read against it,
//! returning the result directly; predicates and queries use it.
//! [`run_async`] runs an enqueueing operation and returns a [`Chain`]: a
//! handle on which further navigation and actions stay valid while the
//! enqueued work is still pending.
//!
//! Context resolution is dynamic: the walk from the invoking node to the
//! root happens on every call, so re-attaching a context at the root after
//! the tree was built is immediately visible to every descendant. Nothing is
//! cached.

use crate::context::{default_context, ExecutionContext};
use crate::node::PageNode;
use crate::result::{PaginaError, PaginaResult};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// Resolve the execution context for `node`.
///
/// Walks from `node` up through parent links until a node with an explicitly
/// attached context is found; falls back to the process-wide default.
pub fn resolve_context(node: &PageNode) -> PaginaResult<Rc<dyn ExecutionContext>> {
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if let Some(context) = candidate.attached_context() {
            return Ok(context);
        }
        current = candidate.parent();
    }
    default_context().ok_or(PaginaError::ContextMissing)
}

/// Run a synchronous read against the resolved context.
///
/// The caller must have settled prior pending actions, or the read may see
/// stale DOM state; that obligation is the caller's, not enforced here.
pub fn run_sync<T>(
    node: &PageNode,
    operation: impl FnOnce(&dyn ExecutionContext) -> PaginaResult<T>,
) -> PaginaResult<T> {
    let context = resolve_context(node)?;
    operation(context.as_ref())
}

/// Run an enqueueing operation against the resolved context and return a
/// chainable handle.
///
/// The operation's assertion phase runs now (failures surface at enqueue
/// time); the DOM work itself completes only once the host settles.
pub fn run_async(
    node: &PageNode,
    operation: impl FnOnce(&dyn ExecutionContext) -> PaginaResult<()>,
) -> PaginaResult<Chain> {
    let context = resolve_context(node)?;
    operation(context.as_ref())?;
    Ok(Chain::new(node.clone()))
}

/// A pending-action handle over a page-object node.
///
/// Returned by every mutating action. Actions chained on one handle execute
/// in call order; actions issued from independent top-level calls have no
/// ordering guarantee relative to each other except via explicit settlement
/// between them. Once enqueued, an action cannot be cancelled.
///
/// The handle dereferences to its [`PageNode`], so predicates and queries
/// remain reachable, but they read the *current* DOM and will not observe
/// still-pending actions until [`Chain::then`] (or the host settle) runs.
#[derive(Clone)]
pub struct Chain {
    node: PageNode,
}

impl Chain {
    /// Wrap a node in a chain handle
    #[must_use]
    pub fn new(node: PageNode) -> Self {
        Self { node }
    }

    /// The node this chain operates on
    #[must_use]
    pub fn node(&self) -> &PageNode {
        &self.node
    }

    /// Continue the chain on a child node
    pub fn child(&self, name: &str) -> PaginaResult<Chain> {
        self.node.child(name).map(Chain::new)
    }

    /// Enqueue a click on this node's resolved element
    pub fn click(&self) -> PaginaResult<Chain> {
        self.node.click()
    }

    /// Enqueue a click on the clickable descendant with exact text `text`
    pub fn click_on(&self, text: &str) -> PaginaResult<Chain> {
        self.node.click_on(text)
    }

    /// Enqueue filling this node's resolved element
    pub fn fill_in(&self, value: &str) -> PaginaResult<Chain> {
        self.node.fill_in(value)
    }

    /// Enqueue filling the descendant identified by `clue`
    pub fn fill_in_by(&self, clue: &str, value: &str) -> PaginaResult<Chain> {
        self.node.fill_in_by(clue, value)
    }

    /// Enqueue selecting an option in this node's resolved select control
    pub fn select(&self, value: &str) -> PaginaResult<Chain> {
        self.node.select(value)
    }

    /// Settle every pending action, then return the underlying node
    pub fn then(&self) -> PaginaResult<PageNode> {
        self.node.then()
    }
}

impl Deref for Chain {
    type Target = PageNode;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("key", &self.node.key())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{clear_default_context, set_default_context};
    use crate::mock::MockContext;

    fn leaf_with_parent() -> (PageNode, PageNode) {
        let root = PageNode::new("", None);
        let leaf = PageNode::new("leaf", Some(&root));
        root.insert_child("leaf".to_string(), leaf.clone());
        (root, leaf)
    }

    mod resolution_tests {
        use super::*;

        #[test]
        fn test_no_context_anywhere_errors() {
            clear_default_context();
            let (_root, leaf) = leaf_with_parent();
            let err = resolve_context(&leaf).err().unwrap();
            assert!(matches!(err, PaginaError::ContextMissing));
        }

        #[test]
        fn test_ancestor_context_is_found() {
            clear_default_context();
            let (root, leaf) = leaf_with_parent();
            let context: Rc<dyn ExecutionContext> = Rc::new(MockContext::new());
            root.set_context(context.clone());
            let resolved = resolve_context(&leaf).unwrap();
            assert!(Rc::ptr_eq(&resolved, &context));
        }

        #[test]
        fn test_nearest_context_wins() {
            clear_default_context();
            let (root, leaf) = leaf_with_parent();
            let outer: Rc<dyn ExecutionContext> = Rc::new(MockContext::new());
            let inner: Rc<dyn ExecutionContext> = Rc::new(MockContext::new());
            root.set_context(outer);
            leaf.set_context(inner.clone());
            let resolved = resolve_context(&leaf).unwrap();
            assert!(Rc::ptr_eq(&resolved, &inner));
        }

        #[test]
        fn test_default_context_fallback() {
            let (_root, leaf) = leaf_with_parent();
            let fallback: Rc<dyn ExecutionContext> = Rc::new(MockContext::new());
            set_default_context(fallback.clone());
            let resolved = resolve_context(&leaf).unwrap();
            assert!(Rc::ptr_eq(&resolved, &fallback));
            clear_default_context();
        }

        #[test]
        fn test_resolution_is_dynamic_not_cached() {
            clear_default_context();
            let (root, leaf) = leaf_with_parent();
            let first: Rc<dyn ExecutionContext> = Rc::new(MockContext::new());
            root.set_context(first.clone());
            assert!(Rc::ptr_eq(&resolve_context(&leaf).unwrap(), &first));

            // Swapping the root context after construction must be visible
            // to already-built descendants.
            let second: Rc<dyn ExecutionContext> = Rc::new(MockContext::new());
            root.set_context(second.clone());
            assert!(Rc::ptr_eq(&resolve_context(&leaf).unwrap(), &second));

            root.remove_context();
            assert!(resolve_context(&leaf).is_err());
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_run_sync_returns_result_directly() {
            clear_default_context();
            let (root, leaf) = leaf_with_parent();
            root.set_context(Rc::new(MockContext::new()));
            let answer = run_sync(&leaf, |_ctx| Ok(42)).unwrap();
            assert_eq!(answer, 42);
        }

        #[test]
        fn test_run_async_returns_chain_on_same_node() {
            clear_default_context();
            let (root, leaf) = leaf_with_parent();
            root.set_context(Rc::new(MockContext::new()));
            let chain = run_async(&leaf, |_ctx| Ok(())).unwrap();
            assert!(chain.node().ptr_eq(&leaf));
        }
    }
}
