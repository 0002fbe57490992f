//! Pagina: declarative page objects for browser acceptance tests.
//!
//! Pagina (Spanish: "page") compiles a nested definition of CSS selectors
//! and named accessors into a tree of live query objects. Each node exposes
//! actions (click, fill, select) and predicates (visible, hidden, contains
//! text) against the current DOM, scoped hierarchically by selector
//! composition. All DOM access is delegated to a host execution context; the
//! library owns only the scoping, composition, and asynchronous-contract
//! plumbing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                    PAGINA Architecture                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌──────────────────┐       │
//! │   │ Definition │    │ PageNode   │    │ ExecutionContext │       │
//! │   │ (declara-  │───►│ tree       │───►│ (host adapter:   │       │
//! │   │  tive)     │    │ + selector │    │  DOM + settle)   │       │
//! │   └────────────┘    │  composer  │    └──────────────────┘       │
//! │                     └────────────┘                               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use pagina::mock::{MockContext, MockElement};
//! use pagina::{build, Definition};
//! use std::rc::Rc;
//!
//! let ctx = MockContext::new();
//! ctx.add_element(
//!     MockElement::new("title")
//!         .matching(".app h1")
//!         .with_text("Welcome"),
//! );
//!
//! let page = build(
//!     Definition::new()
//!         .scope(".app")
//!         .node("title", Definition::new().scope("h1")),
//! )
//! .unwrap();
//! page.set_context(Rc::new(ctx));
//!
//! assert_eq!(page.child("title").unwrap().text().unwrap(), "Welcome");
//! ```
//!
//! # Asynchronous contract
//!
//! Mutating actions enqueue work against the host's pending-action queue and
//! return a chainable [`Chain`] handle immediately. Predicates and queries
//! are synchronous reads of the current DOM. Callers that need an action's
//! outcome must settle first: through [`PageNode::then`], [`Chain::then`],
//! or the host's own wait primitive.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod actions;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod bridge;
mod context;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod node;
mod result;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod selector;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod tree;

/// Descriptor factories bound into definitions.
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod descriptor;

/// Mock host context for testing page objects without a browser.
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
pub mod mock;

pub use actions::CLICKABLE_DESCENDANTS;
pub use bridge::{resolve_context, run_async, run_sync, Chain};
pub use context::{
    clear_default_context, default_context, set_default_context, ExecutionContext,
};
pub use descriptor::Descriptor;
pub use node::{BoundProperty, PageNode, PropertyKind};
pub use result::{PaginaError, PaginaResult};
pub use selector::{compose, QueryOptions, ScopeFragment, ScopedSelector};
pub use tree::{build, Definition, DEFAULT_PROPERTY_NAMES};
