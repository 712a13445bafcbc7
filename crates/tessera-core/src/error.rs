//! Error taxonomy for the compiler core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CompilationError  - recoverable semantic errors, accumulated in `Diagnostics`
//! InternalError     - violated implementation invariants, abort the run
//! ```
//!
//! Semantic errors are never used as control flow: the analyzer appends them
//! to the shared [`Diagnostics`] sink and substitutes an invalid result so the
//! walk can continue. Internal errors travel through `Result` and `?`.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Semantic Errors
// ============================================================================

/// A recoverable semantic error anchored at a source position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilationError {
    /// A name did not resolve at any scope level.
    #[error("at {span}: undefined name '{name}'")]
    UndefinedName {
        /// The name that wasn't found.
        name: String,
        /// Where the name was referenced.
        span: Span,
    },

    /// A member or operator has no candidates on the owner type.
    #[error("at {span}: '{member}' is not defined on '{owner}'")]
    NotDefined {
        /// Rendered owner type.
        owner: String,
        /// The member or operator name.
        member: String,
        /// Where the member was referenced.
        span: Span,
    },

    /// More than one overload is equally compatible.
    #[error("at {span}: ambiguous call to '{name}': could be {candidates}")]
    AmbiguousOverload {
        /// The called member name.
        name: String,
        /// Rendered candidate signatures.
        candidates: String,
        /// Where the call occurred.
        span: Span,
    },

    /// A value's type is not accepted by its context.
    #[error("at {span}: {message}")]
    TypeMismatch {
        /// Description of the mismatch.
        message: String,
        /// Where the mismatch occurred.
        span: Span,
    },

    /// An expression that is not an assignable target was used as one.
    #[error("at {span}: {message}")]
    InvalidLeftValue {
        /// Description of what's invalid.
        message: String,
        /// Where the target was written.
        span: Span,
    },

    /// A declaration conflicts with an earlier one in the same scope.
    #[error("at {span}: conflicting declaration of '{name}'")]
    ConflictingDeclaration {
        /// The declared name.
        name: String,
        /// Where the second declaration occurred.
        span: Span,
    },

    /// An attribute is not allowed here or clashes with another attribute.
    #[error("at {span}: {message}")]
    InvalidAttribute {
        /// Description of the problem.
        message: String,
        /// Where the attribute was written.
        span: Span,
    },

    /// A destructuring pattern or call has the wrong number of components.
    #[error("at {span}: expected {expected} {what}, found {found}")]
    ArityMismatch {
        /// What was being counted ("names", "arguments").
        what: &'static str,
        /// Number required by the context.
        expected: usize,
        /// Number supplied.
        found: usize,
        /// Where the mismatch occurred.
        span: Span,
    },

    /// A type still contains an unresolved placeholder where a concrete type is required.
    #[error("at {span}: cannot infer a concrete type for '{name}'")]
    CannotInfer {
        /// The binding or construct being typed.
        name: String,
        /// Where inference failed.
        span: Span,
    },

    /// `return`, `break` or `continue` outside its enclosing construct.
    #[error("at {span}: '{keyword}' outside of {context}")]
    InvalidControlFlow {
        /// The offending keyword.
        keyword: &'static str,
        /// The construct that would have to enclose it.
        context: &'static str,
        /// Where the keyword appeared.
        span: Span,
    },
}

impl CompilationError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            CompilationError::UndefinedName { span, .. }
            | CompilationError::NotDefined { span, .. }
            | CompilationError::AmbiguousOverload { span, .. }
            | CompilationError::TypeMismatch { span, .. }
            | CompilationError::InvalidLeftValue { span, .. }
            | CompilationError::ConflictingDeclaration { span, .. }
            | CompilationError::InvalidAttribute { span, .. }
            | CompilationError::ArityMismatch { span, .. }
            | CompilationError::CannotInfer { span, .. }
            | CompilationError::InvalidControlFlow { span, .. } => *span,
        }
    }
}

/// Ordered sink of semantic errors, in discovery order.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    errors: Vec<CompilationError>,
}

impl Diagnostics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error.
    pub fn report(&mut self, error: CompilationError) {
        self.errors.push(error);
    }

    /// Whether no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Recorded errors in discovery order.
    pub fn errors(&self) -> &[CompilationError] {
        &self.errors
    }

    /// Take the recorded errors, leaving the sink empty.
    pub fn take(&mut self) -> Vec<CompilationError> {
        std::mem::take(&mut self.errors)
    }
}

// ============================================================================
// Internal Errors
// ============================================================================

/// A violated implementation invariant. Fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    /// A temporary slot was released or re-retained in a state that forbids it.
    #[error("temporary pool: {message}")]
    Pool {
        /// What went wrong.
        message: String,
    },

    /// A scope was popped that was never pushed.
    #[error("scope stack underflow while leaving {context}")]
    ScopeUnderflow {
        /// The construct being left.
        context: &'static str,
    },

    /// An entity id did not refer to a table entry.
    #[error("unknown {kind} id {index}")]
    UnknownEntity {
        /// Table name.
        kind: &'static str,
        /// Offending index.
        index: u32,
    },

    /// A typed result was missing information the later phases rely on.
    #[error("malformed typed result: {message}")]
    Malformed {
        /// Description of the defect.
        message: String,
    },

    /// Layout or patching of the instruction list failed.
    #[error("link: {message}")]
    Link {
        /// Description of the defect.
        message: String,
    },
}

impl InternalError {
    /// Shorthand for [`InternalError::Malformed`].
    pub fn malformed(message: impl Into<String>) -> Self {
        InternalError::Malformed {
            message: message.into(),
        }
    }

    /// Shorthand for [`InternalError::Pool`].
    pub fn pool(message: impl Into<String>) -> Self {
        InternalError::Pool {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_with_position() {
        let err = CompilationError::UndefinedName {
            name: "foo".to_string(),
            span: Span::new(2, 7, 3),
        };
        assert_eq!(err.to_string(), "at 2:7: undefined name 'foo'");
        assert_eq!(err.span(), Span::new(2, 7, 3));
    }

    #[test]
    fn arity_mismatch_message() {
        let err = CompilationError::ArityMismatch {
            what: "names",
            expected: 2,
            found: 3,
            span: Span::point(1, 1),
        };
        assert_eq!(err.to_string(), "at 1:1: expected 2 names, found 3");
    }

    #[test]
    fn diagnostics_keep_discovery_order() {
        let mut sink = Diagnostics::new();
        sink.report(CompilationError::UndefinedName {
            name: "b".to_string(),
            span: Span::point(5, 1),
        });
        sink.report(CompilationError::UndefinedName {
            name: "a".to_string(),
            span: Span::point(1, 1),
        });
        let names: Vec<_> = sink
            .errors()
            .iter()
            .map(|e| e.span().line)
            .collect();
        assert_eq!(names, vec![5, 1]);
        assert_eq!(sink.take().len(), 2);
        assert!(sink.is_empty());
    }
}
