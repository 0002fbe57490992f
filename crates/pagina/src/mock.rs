//! Mock host context for testing page objects without a browser.
//!
//! [`MockContext`] implements [`ExecutionContext`] over an in-memory
//! [`MockDom`] with deterministic, single-threaded semantics: mutating
//! actions land in a pending queue and take effect only when `settle` drains
//! it, exactly the contract real host adapters follow.
//!
//! The mock deliberately contains no selector engine. Elements are
//! registered with the exact composed selector strings they answer to
//! (`MockElement::matching`), keeping all CSS interpretation on the host
//! side of the boundary. Document order is registration order.

use crate::context::ExecutionContext;
use crate::result::{PaginaError, PaginaResult};
use crate::selector::ScopedSelector;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

// =============================================================================
// ELEMENTS AND DOM
// =============================================================================

/// One element in the mock DOM.
#[derive(Debug, Clone)]
pub struct MockElement {
    id: String,
    text: String,
    value: String,
    visible: bool,
    container: Option<String>,
    attributes: BTreeMap<String, String>,
    matches: Vec<String>,
}

impl MockElement {
    /// Create a visible, empty element with the given id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: String::new(),
            value: String::new(),
            visible: true,
            container: None,
            attributes: BTreeMap::new(),
            matches: Vec::new(),
        }
    }

    /// Register a composed selector string this element answers to
    #[must_use]
    pub fn matching(mut self, selector: impl Into<String>) -> Self {
        self.matches.push(selector.into());
        self
    }

    /// Set the element's visible text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the element's form-control value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Mark the element as hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Place the element in an alternate test container
    #[must_use]
    pub fn in_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// The element's id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The element's visible text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The element's form-control value
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the element is visible
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    fn answers_to(&self, target: &ScopedSelector) -> bool {
        if target.container != self.container {
            return false;
        }
        let css_matches = target.css.is_empty() || self.matches.iter().any(|m| m == &target.css);
        let text_matches = target
            .text
            .as_deref()
            .map_or(true, |text| self.text.trim() == text);
        css_matches && text_matches
    }
}

/// In-memory element store, in document (registration) order.
#[derive(Debug, Default)]
pub struct MockDom {
    elements: Vec<MockElement>,
}

impl MockDom {
    /// Create an empty DOM
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element (document order is registration order)
    pub fn add(&mut self, element: MockElement) {
        self.elements.push(element);
    }

    /// Look up an element by id
    #[must_use]
    pub fn element(&self, id: &str) -> Option<&MockElement> {
        self.elements.iter().find(|element| element.id == id)
    }

    /// Replace an element's visible text (unknown ids are ignored)
    pub fn set_text(&mut self, id: &str, text: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.text = text.into();
        }
    }

    /// Append to an element's visible text
    pub fn append_text(&mut self, id: &str, suffix: &str) {
        if let Some(element) = self.element_mut(id) {
            element.text.push_str(suffix);
        }
    }

    /// Replace an element's form-control value
    pub fn set_value(&mut self, id: &str, value: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.value = value.into();
        }
    }

    /// Show or hide an element
    pub fn set_visible(&mut self, id: &str, visible: bool) {
        if let Some(element) = self.element_mut(id) {
            element.visible = visible;
        }
    }

    fn element_mut(&mut self, id: &str) -> Option<&mut MockElement> {
        self.elements.iter_mut().find(|element| element.id == id)
    }

    fn matching(&self, target: &ScopedSelector) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.answers_to(target))
            .map(|(index, _)| index)
            .collect()
    }

    fn selected(&self, target: &ScopedSelector) -> Option<&MockElement> {
        let matches = self.matching(target);
        let index = match target.at {
            Some(at) => matches.get(at).copied()?,
            None => matches.first().copied()?,
        };
        self.elements.get(index)
    }
}

// =============================================================================
// PENDING ACTIONS
// =============================================================================

/// An enqueued mutating action, recorded verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    /// A click awaiting settlement
    Click {
        /// Resolved click target
        target: ScopedSelector,
    },
    /// A fill awaiting settlement
    FillIn {
        /// Resolved fill target
        target: ScopedSelector,
        /// Value to fill
        value: String,
    },
    /// An option selection awaiting settlement
    SelectOption {
        /// Resolved select target
        target: ScopedSelector,
        /// Option value to select
        value: String,
    },
}

// =============================================================================
// CONTEXT
// =============================================================================

type ClickHandler = Box<dyn Fn(&mut MockDom)>;

/// Deterministic [`ExecutionContext`] over a [`MockDom`].
///
/// Clones share state, so a test can hand one clone to the page object and
/// keep another for inspection.
#[derive(Clone)]
pub struct MockContext {
    dom: Rc<RefCell<MockDom>>,
    pending: Rc<RefCell<VecDeque<PendingAction>>>,
    handlers: Rc<RefCell<BTreeMap<String, ClickHandler>>>,
    performed: Rc<RefCell<Vec<PendingAction>>>,
    queries: Rc<Cell<usize>>,
    settles: Rc<Cell<usize>>,
}

impl MockContext {
    /// Create a context over an empty DOM
    #[must_use]
    pub fn new() -> Self {
        Self {
            dom: Rc::new(RefCell::new(MockDom::new())),
            pending: Rc::new(RefCell::new(VecDeque::new())),
            handlers: Rc::new(RefCell::new(BTreeMap::new())),
            performed: Rc::new(RefCell::new(Vec::new())),
            queries: Rc::new(Cell::new(0)),
            settles: Rc::new(Cell::new(0)),
        }
    }

    /// Register an element
    pub fn add_element(&self, element: MockElement) {
        self.dom.borrow_mut().add(element);
    }

    /// Register a click handler run when a settled click lands on `id`
    pub fn on_click(&self, id: impl Into<String>, handler: impl Fn(&mut MockDom) + 'static) {
        self.handlers.borrow_mut().insert(id.into(), Box::new(handler));
    }

    /// Current visible text of the element `id`, if registered
    #[must_use]
    pub fn element_text(&self, id: &str) -> Option<String> {
        self.dom.borrow().element(id).map(|e| e.text().to_string())
    }

    /// Current value of the element `id`, if registered
    #[must_use]
    pub fn element_value(&self, id: &str) -> Option<String> {
        self.dom.borrow().element(id).map(|e| e.value().to_string())
    }

    /// Mutate the DOM directly (test setup between settles)
    pub fn with_dom<T>(&self, mutate: impl FnOnce(&mut MockDom) -> T) -> T {
        mutate(&mut self.dom.borrow_mut())
    }

    /// Number of actions still awaiting settlement
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Snapshot of the actions awaiting settlement, in enqueue order
    #[must_use]
    pub fn pending_actions(&self) -> Vec<PendingAction> {
        self.pending.borrow().iter().cloned().collect()
    }

    /// Actions already executed by settles, in execution order
    #[must_use]
    pub fn performed_actions(&self) -> Vec<PendingAction> {
        self.performed.borrow().clone()
    }

    /// Number of synchronous DOM queries served
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.get()
    }

    /// Number of times `settle` ran
    #[must_use]
    pub fn settle_count(&self) -> usize {
        self.settles.get()
    }

    fn record_query(&self) {
        self.queries.set(self.queries.get() + 1);
    }
}

impl Default for MockContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockContext")
            .field("pending", &self.pending_count())
            .field("performed", &self.performed.borrow().len())
            .field("settles", &self.settles.get())
            .finish_non_exhaustive()
    }
}

impl ExecutionContext for MockContext {
    fn assert_element_exists(&self, target: &ScopedSelector) -> PaginaResult<()> {
        self.record_query();
        if self.dom.borrow().selected(target).is_some() {
            Ok(())
        } else {
            Err(PaginaError::ElementNotFound {
                selector: target.to_string(),
            })
        }
    }

    fn count(&self, target: &ScopedSelector) -> PaginaResult<usize> {
        self.record_query();
        Ok(self.dom.borrow().matching(target).len())
    }

    fn text(&self, target: &ScopedSelector) -> PaginaResult<String> {
        self.record_query();
        self.dom
            .borrow()
            .selected(target)
            .map(|element| element.text().trim().to_string())
            .ok_or_else(|| PaginaError::ElementNotFound {
                selector: target.to_string(),
            })
    }

    fn value(&self, target: &ScopedSelector) -> PaginaResult<String> {
        self.record_query();
        self.dom
            .borrow()
            .selected(target)
            .map(|element| element.value().to_string())
            .ok_or_else(|| PaginaError::ElementNotFound {
                selector: target.to_string(),
            })
    }

    fn attribute(&self, target: &ScopedSelector, name: &str) -> PaginaResult<Option<String>> {
        self.record_query();
        self.dom
            .borrow()
            .selected(target)
            .map(|element| element.attributes.get(name).cloned())
            .ok_or_else(|| PaginaError::ElementNotFound {
                selector: target.to_string(),
            })
    }

    fn is_visible(&self, target: &ScopedSelector) -> PaginaResult<bool> {
        self.record_query();
        Ok(self
            .dom
            .borrow()
            .selected(target)
            .is_some_and(MockElement::is_visible))
    }

    fn click(&self, target: &ScopedSelector) -> PaginaResult<()> {
        self.pending.borrow_mut().push_back(PendingAction::Click {
            target: target.clone(),
        });
        Ok(())
    }

    fn fill_in(&self, target: &ScopedSelector, value: &str) -> PaginaResult<()> {
        self.pending.borrow_mut().push_back(PendingAction::FillIn {
            target: target.clone(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn select(&self, target: &ScopedSelector, value: &str) -> PaginaResult<()> {
        self.pending
            .borrow_mut()
            .push_back(PendingAction::SelectOption {
                target: target.clone(),
                value: value.to_string(),
            });
        Ok(())
    }

    fn settle(&self) -> PaginaResult<()> {
        self.settles.set(self.settles.get() + 1);
        let mut drained = 0usize;
        loop {
            let action = self.pending.borrow_mut().pop_front();
            let Some(action) = action else { break };
            match &action {
                PendingAction::Click { target } => {
                    // An element may have vanished between enqueue and
                    // settle; such clicks land nowhere, as in a real DOM.
                    let clicked = self
                        .dom
                        .borrow()
                        .selected(target)
                        .map(|element| element.id().to_string());
                    if let Some(id) = clicked {
                        let handlers = self.handlers.borrow();
                        if let Some(handler) = handlers.get(&id) {
                            handler(&mut self.dom.borrow_mut());
                        }
                    }
                }
                PendingAction::FillIn { target, value }
                | PendingAction::SelectOption { target, value } => {
                    let filled = self
                        .dom
                        .borrow()
                        .selected(target)
                        .map(|element| element.id().to_string());
                    if let Some(id) = filled {
                        self.dom.borrow_mut().set_value(&id, value.clone());
                    }
                }
            }
            self.performed.borrow_mut().push(action);
            drained += 1;
        }
        tracing::debug!(drained, "mock settle complete");
        Ok(())
    }
}
