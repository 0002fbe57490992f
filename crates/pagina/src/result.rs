//! Result and error types for Pagina.

use thiserror::Error;

/// Result type for Pagina operations
pub type PaginaResult<T> = Result<T, PaginaError>;

/// Errors that can occur in Pagina
#[derive(Debug, Error)]
pub enum PaginaError {
    /// A required selector match is absent
    ///
    /// Raised before click/fill actions are enqueued and by strict reads
    /// (`at`-indexed text and visibility queries).
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// The resolved selector that matched nothing
        selector: String,
    },

    /// A definition slot collides with a reserved key or is otherwise unusable
    #[error("Invalid definition: {message}")]
    InvalidDefinition {
        /// What is wrong with the definition
        message: String,
    },

    /// No execution context is reachable from the invoking node
    ///
    /// Attach one with `set_context` or install a process default via
    /// `set_default_context` at test start.
    #[error("No execution context attached and no default context installed")]
    ContextMissing,

    /// A property name resolved to nothing on the node
    #[error("Unknown property or child: {name}")]
    UnknownProperty {
        /// The name that was looked up
        name: String,
    },

    /// Invalid state error (operation called in wrong state)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// A host settle/wait primitive timed out
    ///
    /// Pagina never times out on its own; host execution contexts surface
    /// their settle timeouts through this variant.
    #[error("Settle timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },
}
