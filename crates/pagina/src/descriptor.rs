//! Descriptor factories for page-object definitions.
//!
//! A [`Descriptor`] is the compiled specification for one property of a
//! page-object node, tagged explicitly as a plain value, a computed accessor
//! (evaluated on access), or a method (invoked with arguments). The tree
//! builder binds descriptors to nodes with a single switch on the tag; no
//! runtime shape inspection is involved.
//!
//! Built-in factories capture a selector fragment and [`QueryOptions`] at
//! definition-compile time and defer all selector resolution and DOM access
//! to invocation time.
//!
//! # Example
//!
//! ```
//! use pagina::descriptor::{clickable, text};
//! use pagina::{Definition, QueryOptions};
//!
//! let definition = Definition::new()
//!     .scope(".login-form")
//!     .prop("title", text("h1", QueryOptions::default()))
//!     .prop("submit", clickable("button[type='submit']", QueryOptions::default()));
//! ```

use crate::actions;
use crate::node::PageNode;
use crate::result::PaginaResult;
use crate::selector::QueryOptions;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// Closure form of a computed accessor
pub type AccessorFn = Rc<dyn Fn(&PageNode) -> PaginaResult<Value>>;

/// Closure form of a method
pub type MethodFn = Rc<dyn Fn(&PageNode, &[Value]) -> PaginaResult<Value>>;

/// A compiled property specification, ready to be bound to a node.
#[derive(Clone)]
pub struct Descriptor {
    pub(crate) kind: DescriptorKind,
}

#[derive(Clone)]
pub(crate) enum DescriptorKind {
    Value(Value),
    Accessor(AccessorFn),
    Method(MethodFn),
}

impl Descriptor {
    fn accessor_of(eval: AccessorFn) -> Self {
        Self {
            kind: DescriptorKind::Accessor(eval),
        }
    }

    fn method_of(call: MethodFn) -> Self {
        Self {
            kind: DescriptorKind::Method(call),
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DescriptorKind::Value(_) => "Value",
            DescriptorKind::Accessor(_) => "Accessor",
            DescriptorKind::Method(_) => "Method",
        };
        f.debug_struct("Descriptor")
            .field("kind", &kind)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// CUSTOM DESCRIPTORS
// =============================================================================

/// A plain value property
#[must_use]
pub fn value(value: impl Into<Value>) -> Descriptor {
    Descriptor {
        kind: DescriptorKind::Value(value.into()),
    }
}

/// A custom computed accessor, evaluated on access with no arguments.
///
/// The closure receives the node it is bound to and may resolve selectors
/// via [`PageNode::resolve_selector`] and reach the host through the bridge.
#[must_use]
pub fn accessor(eval: impl Fn(&PageNode) -> PaginaResult<Value> + 'static) -> Descriptor {
    Descriptor::accessor_of(Rc::new(eval))
}

/// A custom method, invoked with arguments
#[must_use]
pub fn method(call: impl Fn(&PageNode, &[Value]) -> PaginaResult<Value> + 'static) -> Descriptor {
    Descriptor::method_of(Rc::new(call))
}

// =============================================================================
// BUILT-IN QUERIES
// =============================================================================

/// Trimmed visible text of the resolved element
#[must_use]
pub fn text(selector: impl Into<String>, options: QueryOptions) -> Descriptor {
    let selector = selector.into();
    Descriptor::accessor_of(Rc::new(move |node| {
        actions::read_text(node, &selector, &options)
    }))
}

/// Whether the resolved element is present and visible
#[must_use]
pub fn is_visible(selector: impl Into<String>, options: QueryOptions) -> Descriptor {
    let selector = selector.into();
    Descriptor::accessor_of(Rc::new(move |node| {
        actions::visible(node, &selector, &options)
    }))
}

/// Whether the resolved element is present and hidden
#[must_use]
pub fn is_hidden(selector: impl Into<String>, options: QueryOptions) -> Descriptor {
    let selector = selector.into();
    Descriptor::accessor_of(Rc::new(move |node| {
        actions::hidden(node, &selector, &options)
    }))
}

/// Case-sensitive substring test against the resolved element's text
#[must_use]
pub fn contains_text(selector: impl Into<String>, options: QueryOptions) -> Descriptor {
    let selector = selector.into();
    Descriptor::method_of(Rc::new(move |node, args| {
        actions::contains(node, &selector, &options, args)
    }))
}

/// Current value of the resolved form control
#[must_use]
pub fn value_of(selector: impl Into<String>, options: QueryOptions) -> Descriptor {
    let selector = selector.into();
    Descriptor::accessor_of(Rc::new(move |node| {
        actions::read_value(node, &selector, &options)
    }))
}

/// Number of elements matching the resolved selector
#[must_use]
pub fn count_of(selector: impl Into<String>, options: QueryOptions) -> Descriptor {
    let selector = selector.into();
    Descriptor::accessor_of(Rc::new(move |node| {
        actions::count_of(node, &selector, &options)
    }))
}

/// Whether at least one element matches, visible or not
#[must_use]
pub fn is_present(selector: impl Into<String>, options: QueryOptions) -> Descriptor {
    let selector = selector.into();
    Descriptor::accessor_of(Rc::new(move |node| {
        actions::present(node, &selector, &options)
    }))
}

/// Attribute value of the resolved element
#[must_use]
pub fn attribute_of(
    attribute: impl Into<String>,
    selector: impl Into<String>,
    options: QueryOptions,
) -> Descriptor {
    let attribute = attribute.into();
    let selector = selector.into();
    Descriptor::accessor_of(Rc::new(move |node| {
        actions::attribute_of(node, &attribute, &selector, &options)
    }))
}

// =============================================================================
// BUILT-IN ACTIONS
// =============================================================================

/// Click the resolved element (existence asserted first)
#[must_use]
pub fn clickable(selector: impl Into<String>, options: QueryOptions) -> Descriptor {
    let selector = selector.into();
    Descriptor::method_of(Rc::new(move |node, _args| {
        actions::click(node, &selector, &options)
    }))
}

/// Click the clickable descendant whose visible text matches exactly
#[must_use]
pub fn click_on_text(selector: impl Into<String>, options: QueryOptions) -> Descriptor {
    let selector = selector.into();
    Descriptor::method_of(Rc::new(move |node, args| {
        actions::click_on_text(node, &selector, &options, args)
    }))
}

/// Fill the resolved element, or a clue-identified descendant.
///
/// Invoked with one argument it fills the resolved selector directly; with
/// two it treats the first as a clue and fills the matching
/// `input`/`textarea`/`select` descendant.
#[must_use]
pub fn fillable(selector: impl Into<String>, options: QueryOptions) -> Descriptor {
    let selector = selector.into();
    Descriptor::method_of(Rc::new(move |node, args| {
        actions::fill(node, &selector, &options, args, false)
    }))
}

/// Select an option in the resolved select control (same call shapes as
/// [`fillable`])
#[must_use]
pub fn selectable(selector: impl Into<String>, options: QueryOptions) -> Descriptor {
    let selector = selector.into();
    Descriptor::method_of(Rc::new(move |node, args| {
        actions::fill(node, &selector, &options, args, true)
    }))
}

/// Forward to the host framework's settle primitive.
///
/// Injected as the `then` default property; manual chains call it to await
/// completion of every enqueued action.
#[must_use]
pub fn settle() -> Descriptor {
    Descriptor::method_of(Rc::new(move |node, _args| actions::settle(node)))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod tag_tests {
        use super::*;

        #[test]
        fn test_value_descriptor_tag() {
            let descriptor = value("hello");
            assert!(matches!(descriptor.kind, DescriptorKind::Value(_)));
        }

        #[test]
        fn test_query_factories_are_accessors() {
            for descriptor in [
                text("h1", QueryOptions::default()),
                is_visible("h1", QueryOptions::default()),
                is_hidden("h1", QueryOptions::default()),
                value_of("input", QueryOptions::default()),
                count_of("li", QueryOptions::default()),
                is_present("li", QueryOptions::default()),
                attribute_of("href", "a", QueryOptions::default()),
            ] {
                assert!(matches!(descriptor.kind, DescriptorKind::Accessor(_)));
            }
        }

        #[test]
        fn test_action_factories_are_methods() {
            for descriptor in [
                contains_text("h1", QueryOptions::default()),
                clickable("button", QueryOptions::default()),
                click_on_text("", QueryOptions::default()),
                fillable("input", QueryOptions::default()),
                selectable("select", QueryOptions::default()),
                settle(),
            ] {
                assert!(matches!(descriptor.kind, DescriptorKind::Method(_)));
            }
        }
    }

    mod debug_tests {
        use super::*;

        #[test]
        fn test_debug_names_the_tag() {
            let formatted = format!("{:?}", value(1));
            assert!(formatted.contains("Value"));
            let formatted = format!("{:?}", text("h1", QueryOptions::default()));
            assert!(formatted.contains("Accessor"));
        }
    }
}
