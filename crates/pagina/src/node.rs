//! Live page-object tree nodes.
//!
//! A [`PageNode`] is a cheap-clone handle (`Rc`) to one point of a built
//! page-object tree. Ownership flows strictly parent-to-child; every node
//! keeps a *weak* back-reference to its parent that is used only for upward
//! resolution (selector scopes, execution contexts) and never for
//! destruction or iteration.
//!
//! Typed convenience methods (`text`, `click`, `fill_in`, ...) dispatch
//! through the node's bound-property map, so a property the definition
//! overrides always wins over the built-in behavior.

use crate::bridge::Chain;
use crate::context::ExecutionContext;
use crate::descriptor::{AccessorFn, MethodFn};
use crate::result::{PaginaError, PaginaResult};
use crate::selector::{compose, QueryOptions, ScopeFragment, ScopedSelector};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

// =============================================================================
// BOUND PROPERTIES
// =============================================================================

/// Tag of a bound property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// A plain value returned as-is
    Value,
    /// Evaluated on access, no arguments
    Accessor,
    /// Evaluated on invocation with arguments
    Method,
}

/// A descriptor bound to a node.
///
/// The closure captures the node weakly; invoking a property of a dropped
/// tree is an `InvalidState` error rather than a leak-inducing strong cycle.
#[derive(Clone)]
pub struct BoundProperty {
    kind: BoundKind,
}

#[derive(Clone)]
enum BoundKind {
    Value(Value),
    Accessor {
        node: Weak<NodeInner>,
        eval: AccessorFn,
    },
    Method {
        node: Weak<NodeInner>,
        call: MethodFn,
    },
}

impl BoundProperty {
    pub(crate) fn value(value: Value) -> Self {
        Self {
            kind: BoundKind::Value(value),
        }
    }

    pub(crate) fn accessor(node: Weak<NodeInner>, eval: AccessorFn) -> Self {
        Self {
            kind: BoundKind::Accessor { node, eval },
        }
    }

    pub(crate) fn method(node: Weak<NodeInner>, call: MethodFn) -> Self {
        Self {
            kind: BoundKind::Method { node, call },
        }
    }

    /// Which kind of property this is
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        match self.kind {
            BoundKind::Value(_) => PropertyKind::Value,
            BoundKind::Accessor { .. } => PropertyKind::Accessor,
            BoundKind::Method { .. } => PropertyKind::Method,
        }
    }

    /// Invoke the property.
    ///
    /// Values ignore `args` and return a clone; accessors ignore `args` and
    /// evaluate; methods receive `args`.
    pub fn invoke(&self, args: &[Value]) -> PaginaResult<Value> {
        match &self.kind {
            BoundKind::Value(value) => Ok(value.clone()),
            BoundKind::Accessor { node, eval } => eval(&upgrade(node)?),
            BoundKind::Method { node, call } => call(&upgrade(node)?, args),
        }
    }
}

impl fmt::Debug for BoundProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundProperty")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

fn upgrade(node: &Weak<NodeInner>) -> PaginaResult<PageNode> {
    node.upgrade()
        .map(|inner| PageNode { inner })
        .ok_or_else(|| PaginaError::InvalidState {
            message: "page object node was dropped".to_string(),
        })
}

// =============================================================================
// NODE
// =============================================================================

pub(crate) struct NodeInner {
    key: String,
    parent: Weak<NodeInner>,
    scope: RefCell<Option<String>>,
    at: Cell<Option<usize>>,
    reset_scope: Cell<bool>,
    test_container: RefCell<Option<String>>,
    children: RefCell<BTreeMap<String, PageNode>>,
    props: RefCell<BTreeMap<String, BoundProperty>>,
    context: RefCell<Option<Rc<dyn ExecutionContext>>>,
}

/// One point in a built page-object tree.
#[derive(Clone)]
pub struct PageNode {
    pub(crate) inner: Rc<NodeInner>,
}

impl PageNode {
    pub(crate) fn new(key: &str, parent: Option<&PageNode>) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                key: key.to_string(),
                parent: parent.map_or_else(Weak::new, |p| Rc::downgrade(&p.inner)),
                scope: RefCell::new(None),
                at: Cell::new(None),
                reset_scope: Cell::new(false),
                test_container: RefCell::new(None),
                children: RefCell::new(BTreeMap::new()),
                props: RefCell::new(BTreeMap::new()),
                context: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn set_local_scope(
        &self,
        scope: Option<String>,
        at: Option<usize>,
        reset_scope: bool,
        test_container: Option<String>,
    ) {
        *self.inner.scope.borrow_mut() = scope;
        self.inner.at.set(at);
        self.inner.reset_scope.set(reset_scope);
        *self.inner.test_container.borrow_mut() = test_container;
    }

    pub(crate) fn insert_child(&self, name: String, child: PageNode) {
        self.inner.children.borrow_mut().insert(name, child);
    }

    pub(crate) fn insert_property(&self, name: String, property: BoundProperty) {
        self.inner.props.borrow_mut().insert(name, property);
    }

    pub(crate) fn clear_members(&self) {
        self.inner.children.borrow_mut().clear();
        self.inner.props.borrow_mut().clear();
    }

    pub(crate) fn has_member(&self, name: &str) -> bool {
        self.inner.children.borrow().contains_key(name)
            || self.inner.props.borrow().contains_key(name)
    }

    pub(crate) fn downgrade(&self) -> Weak<NodeInner> {
        Rc::downgrade(&self.inner)
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// The node's key in its parent (empty for the root)
    #[must_use]
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// The node's parent, if any
    #[must_use]
    pub fn parent(&self) -> Option<PageNode> {
        self.inner.parent.upgrade().map(|inner| PageNode { inner })
    }

    /// Whether this node is the tree root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.inner.parent.upgrade().is_none()
    }

    /// Whether two handles refer to the same node
    #[must_use]
    pub fn ptr_eq(&self, other: &PageNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Look up a child node by key
    pub fn child(&self, name: &str) -> PaginaResult<PageNode> {
        self.inner
            .children
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| PaginaError::UnknownProperty {
                name: name.to_string(),
            })
    }

    /// Keys of this node's children, sorted
    #[must_use]
    pub fn child_names(&self) -> Vec<String> {
        self.inner.children.borrow().keys().cloned().collect()
    }

    /// Names of this node's bound properties, sorted
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.inner.props.borrow().keys().cloned().collect()
    }

    /// Look up a bound property by name
    pub fn property(&self, name: &str) -> PaginaResult<BoundProperty> {
        self.inner
            .props
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| PaginaError::UnknownProperty {
                name: name.to_string(),
            })
    }

    // -------------------------------------------------------------------------
    // Dynamic property dispatch
    // -------------------------------------------------------------------------

    /// Invoke a bound property with arguments.
    ///
    /// The property is cloned out of the map before invocation, so a custom
    /// property may itself read other properties of the same node.
    pub fn invoke(&self, name: &str, args: &[Value]) -> PaginaResult<Value> {
        let property = self.property(name)?;
        property.invoke(args)
    }

    /// Evaluate a zero-argument property
    pub fn read(&self, name: &str) -> PaginaResult<Value> {
        self.invoke(name, &[])
    }

    /// Evaluate a property and coerce it to a string
    pub fn read_string(&self, name: &str) -> PaginaResult<String> {
        self.read(name).map(coerce_string)
    }

    /// Evaluate a property and coerce it to a bool (non-bool coerces false)
    pub fn read_bool(&self, name: &str) -> PaginaResult<bool> {
        self.read(name).map(|value| coerce_bool(&value))
    }

    // -------------------------------------------------------------------------
    // Built-in property surface
    //
    // Each of these dispatches through the property map, so definitions that
    // override the property replace the behavior wholesale.
    // -------------------------------------------------------------------------

    /// Trimmed visible text of the node's resolved element
    pub fn text(&self) -> PaginaResult<String> {
        self.read_string("text")
    }

    /// Whether the node's resolved element is present and visible
    pub fn is_visible(&self) -> PaginaResult<bool> {
        self.read_bool("isVisible")
    }

    /// Whether the node's resolved element is present and hidden
    pub fn is_hidden(&self) -> PaginaResult<bool> {
        self.read_bool("isHidden")
    }

    /// Whether the resolved element's text contains `needle` (case-sensitive)
    pub fn contains(&self, needle: &str) -> PaginaResult<bool> {
        self.invoke("contains", &[Value::String(needle.to_string())])
            .map(|value| coerce_bool(&value))
    }

    /// Enqueue a click on the resolved element
    pub fn click(&self) -> PaginaResult<Chain> {
        self.invoke("click", &[])?;
        Ok(Chain::new(self.clone()))
    }

    /// Enqueue a click on the first clickable descendant whose visible text
    /// or label matches `text` exactly
    pub fn click_on(&self, text: &str) -> PaginaResult<Chain> {
        self.invoke("clickOn", &[Value::String(text.to_string())])?;
        Ok(Chain::new(self.clone()))
    }

    /// Enqueue filling the resolved element with `value`
    pub fn fill_in(&self, value: &str) -> PaginaResult<Chain> {
        self.invoke("fillIn", &[Value::String(value.to_string())])?;
        Ok(Chain::new(self.clone()))
    }

    /// Enqueue filling the form-control descendant identified by `clue`.
    ///
    /// The clue is matched against, in priority order, a test-id attribute,
    /// an aria-label, a placeholder, a name attribute, or an element id.
    /// The resolved element itself is never the fill target.
    pub fn fill_in_by(&self, clue: &str, value: &str) -> PaginaResult<Chain> {
        self.invoke(
            "fillIn",
            &[
                Value::String(clue.to_string()),
                Value::String(value.to_string()),
            ],
        )?;
        Ok(Chain::new(self.clone()))
    }

    /// Enqueue selecting the option `value` in the resolved select control
    pub fn select(&self, value: &str) -> PaginaResult<Chain> {
        self.invoke("select", &[Value::String(value.to_string())])?;
        Ok(Chain::new(self.clone()))
    }

    /// Wait for every enqueued action to complete, then return this node.
    ///
    /// Forwards to the host framework's settle primitive through the `then`
    /// bound property.
    pub fn then(&self) -> PaginaResult<PageNode> {
        self.invoke("then", &[])?;
        Ok(self.clone())
    }

    // -------------------------------------------------------------------------
    // Context lifecycle
    // -------------------------------------------------------------------------

    /// Attach an execution context to this node.
    ///
    /// Descendants resolve to it dynamically by walking up, so attaching at
    /// the root after construction is visible to every already-built node.
    pub fn set_context(&self, context: Rc<dyn ExecutionContext>) {
        tracing::debug!(key = %self.inner.key, "attaching execution context");
        *self.inner.context.borrow_mut() = Some(context);
    }

    /// Detach this node's execution context, reverting resolution to the
    /// nearest ancestor context or the process-wide default.
    pub fn remove_context(&self) {
        tracing::debug!(key = %self.inner.key, "detaching execution context");
        *self.inner.context.borrow_mut() = None;
    }

    pub(crate) fn attached_context(&self) -> Option<Rc<dyn ExecutionContext>> {
        self.inner.context.borrow().clone()
    }

    /// Rebuild this node's subtree from a new definition, in place.
    ///
    /// Existing handles to this node stay valid; handles to replaced
    /// descendants go stale. A context explicitly attached to this node is
    /// preserved unless the new definition carries its own.
    pub fn render(&self, definition: crate::tree::Definition) -> PaginaResult<()> {
        crate::tree::render_into(self, definition)
    }

    // -------------------------------------------------------------------------
    // Selector resolution
    // -------------------------------------------------------------------------

    /// Compute the effective selector for an accessor call on this node.
    ///
    /// This is the entry point custom descriptors use; built-in descriptors
    /// go through it as well.
    #[must_use]
    pub fn resolve_selector(&self, local: Option<&str>, options: &QueryOptions) -> ScopedSelector {
        compose(&self.scope_chain(), local, options)
    }

    fn scope_chain(&self) -> Vec<ScopeFragment> {
        let mut chain = Vec::new();
        let mut current = Some(Rc::clone(&self.inner));
        while let Some(inner) = current {
            chain.push(ScopeFragment {
                selector: inner.scope.borrow().clone(),
                reset_scope: inner.reset_scope.get(),
                test_container: inner.test_container.borrow().clone(),
                at: inner.at.get(),
            });
            current = inner.parent.upgrade();
        }
        chain.reverse();
        chain
    }
}

impl fmt::Debug for PageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageNode")
            .field("key", &self.inner.key)
            .field("scope", &self.inner.scope.borrow())
            .field("children", &self.child_names())
            .field("properties", &self.property_names())
            .finish_non_exhaustive()
    }
}

fn coerce_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn coerce_bool(value: &Value) -> bool {
    value.as_bool().unwrap_or(false)
}
