//! Error types for path templates.

use thiserror::Error;

/// Errors raised while parsing a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `${` was never closed.
    #[error("Unclosed field reference at position {position} in template: {template}")]
    UnclosedField { template: String, position: usize },

    /// A `%name{` argument list was never closed.
    #[error("Unclosed argument list for %{name} at position {position} in template: {template}")]
    UnclosedCall {
        template: String,
        name: String,
        position: usize,
    },
}
