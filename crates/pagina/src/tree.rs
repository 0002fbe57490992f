//! Page-object tree construction.
//!
//! A [`Definition`] is the user-authored, declarative shape of a page:
//! nested scopes and named descriptors. [`build`] compiles it into a live
//! [`PageNode`] tree. Construction is deterministic and never touches the
//! DOM; selectors are resolved per accessor call, not at build time.
//!
//! Every node is augmented with default properties for any name the
//! definition does not supply: `contains`, `isHidden`, `isVisible`, `text`,
//! `clickOn`, `click`, `fillIn`, `select`, and `then`. Augmentation is
//! per-node, so an override at a leaf affects neither siblings nor
//! ancestors, and an override at any level replaces the default wholesale.
//!
//! # Example
//!
//! ```
//! use pagina::{build, Definition};
//! use pagina::descriptor::clickable;
//! use pagina::QueryOptions;
//!
//! let page = build(
//!     Definition::new()
//!         .scope(".calculator")
//!         .node("screen", Definition::new().scope(".screen"))
//!         .prop("equals", clickable("button.equals", QueryOptions::default())),
//! )
//! .unwrap();
//! assert!(page.child("screen").is_ok());
//! ```

use crate::context::ExecutionContext;
use crate::descriptor::{self as descriptors, Descriptor, DescriptorKind};
use crate::node::{BoundProperty, PageNode};
use crate::result::{PaginaError, PaginaResult};
use crate::selector::QueryOptions;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Keys that may not name a child or descriptor.
const RESERVED_KEYS: [&str; 1] = ["context"];

/// Property names injected on every node unless the definition supplies them.
pub const DEFAULT_PROPERTY_NAMES: [&str; 9] = [
    "contains",
    "isHidden",
    "isVisible",
    "text",
    "clickOn",
    "click",
    "fillIn",
    "select",
    "then",
];

#[derive(Clone)]
enum Entry {
    Node(Definition),
    Descriptor(Descriptor),
}

/// Declarative definition of one page-object node and its subtree.
#[derive(Clone, Default)]
pub struct Definition {
    scope: Option<String>,
    at: Option<usize>,
    reset_scope: bool,
    test_container: Option<String>,
    context: Option<Rc<dyn ExecutionContext>>,
    entries: BTreeMap<String, Entry>,
}

impl Definition {
    /// Create an empty definition
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the node's local selector fragment
    #[must_use]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Restrict the node to the match at `at` (zero-based)
    #[must_use]
    pub const fn at(mut self, at: usize) -> Self {
        self.at = Some(at);
        self
    }

    /// Discard ancestor scopes; this node's fragment becomes the new base
    #[must_use]
    pub const fn reset_scope(mut self) -> Self {
        self.reset_scope = true;
        self
    }

    /// Root this node's queries in an alternate test container
    #[must_use]
    pub fn test_container(mut self, container: impl Into<String>) -> Self {
        self.test_container = Some(container.into());
        self
    }

    /// Bind an execution context to the node built from this definition.
    ///
    /// The reserved `context` slot of the input definition; it is extracted
    /// here and never becomes a tree member.
    #[must_use]
    pub fn context(mut self, context: Rc<dyn ExecutionContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Add a nested child definition under `name`
    #[must_use]
    pub fn node(mut self, name: impl Into<String>, definition: Definition) -> Self {
        self.entries.insert(name.into(), Entry::Node(definition));
        self
    }

    /// Add a descriptor property under `name`
    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, descriptor: Descriptor) -> Self {
        self.entries
            .insert(name.into(), Entry::Descriptor(descriptor));
        self
    }

    /// Compile this definition into a live page-object tree
    pub fn build(self) -> PaginaResult<PageNode> {
        build(self)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("scope", &self.scope)
            .field("at", &self.at)
            .field("reset_scope", &self.reset_scope)
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// BUILD
// =============================================================================

/// Compile a definition into a live page-object tree.
///
/// Building is deterministic and side-effect-free aside from tree
/// construction; no DOM access happens until a bound property is invoked.
pub fn build(definition: Definition) -> PaginaResult<PageNode> {
    validate(&definition, "")?;
    let root = PageNode::new("", None);
    populate(&root, definition);
    tracing::debug!(nodes = count_nodes(&root), "built page object tree");
    Ok(root)
}

/// Rebuild `node`'s subtree from a new definition, replacing it in place.
///
/// The node handle keeps its identity; a context explicitly attached to it
/// survives unless the new definition carries its own.
pub(crate) fn render_into(node: &PageNode, definition: Definition) -> PaginaResult<()> {
    validate(&definition, "")?;
    node.clear_members();
    populate(node, definition);
    tracing::debug!(key = %node.key(), "re-rendered page object subtree");
    Ok(())
}

fn validate(definition: &Definition, path: &str) -> PaginaResult<()> {
    for (name, entry) in &definition.entries {
        if name.is_empty() {
            return Err(PaginaError::InvalidDefinition {
                message: format!("empty property name under \"{path}\""),
            });
        }
        if RESERVED_KEYS.contains(&name.as_str()) {
            return Err(PaginaError::InvalidDefinition {
                message: format!("\"{name}\" is a reserved key and cannot name a property"),
            });
        }
        if let Entry::Node(child) = entry {
            let child_path = if path.is_empty() {
                name.clone()
            } else {
                format!("{path}.{name}")
            };
            validate(child, &child_path)?;
        }
    }
    Ok(())
}

fn populate(node: &PageNode, definition: Definition) {
    node.set_local_scope(
        definition.scope,
        definition.at,
        definition.reset_scope,
        definition.test_container,
    );
    if let Some(context) = definition.context {
        node.set_context(context);
    }
    for (name, entry) in definition.entries {
        match entry {
            Entry::Node(child_definition) => {
                let child = PageNode::new(&name, Some(node));
                populate(&child, child_definition);
                node.insert_child(name, child);
            }
            Entry::Descriptor(descriptor) => {
                node.insert_property(name, bind(node, descriptor));
            }
        }
    }
    inject_defaults(node);
}

/// Bind a descriptor to a node: the single dispatch switch over tags.
fn bind(node: &PageNode, descriptor: Descriptor) -> BoundProperty {
    match descriptor.kind {
        DescriptorKind::Value(value) => BoundProperty::value(value),
        DescriptorKind::Accessor(eval) => BoundProperty::accessor(node.downgrade(), eval),
        DescriptorKind::Method(call) => BoundProperty::method(node.downgrade(), call),
    }
}

fn inject_defaults(node: &PageNode) {
    for name in DEFAULT_PROPERTY_NAMES {
        if !node.has_member(name) {
            node.insert_property(name.to_string(), bind(node, default_descriptor(name)));
        }
    }
}

fn default_descriptor(name: &str) -> Descriptor {
    let options = QueryOptions::default;
    match name {
        "text" => descriptors::text("", options()),
        "isVisible" => descriptors::is_visible("", options()),
        "isHidden" => descriptors::is_hidden("", options()),
        "contains" => descriptors::contains_text("", options()),
        "clickOn" => descriptors::click_on_text("", options()),
        "click" => descriptors::clickable("", options()),
        "fillIn" => descriptors::fillable("", options()),
        "select" => descriptors::selectable("", options()),
        _ => descriptors::settle(),
    }
}

fn count_nodes(node: &PageNode) -> usize {
    1 + node
        .child_names()
        .iter()
        .filter_map(|name| node.child(name).ok())
        .map(|child| count_nodes(&child))
        .sum::<usize>()
}
