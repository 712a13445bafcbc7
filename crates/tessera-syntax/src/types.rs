//! Type annotations.

use tessera_core::Span;

use crate::Ident;

/// A type as written in source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeExpr<'ast> {
    /// `int`, `array<int>`, `Debug`
    Named {
        /// Type or generic root name.
        name: Ident<'ast>,
        /// Type arguments, empty for plain names.
        args: &'ast [TypeExpr<'ast>],
        /// Source location.
        span: Span,
    },
    /// `(int, string)`
    Tuple {
        /// Component types.
        elems: &'ast [TypeExpr<'ast>],
        /// Source location.
        span: Span,
    },
    /// `fn(int) -> int` or `det fn(int) -> int`
    Func {
        /// Whether declared deterministic.
        det: bool,
        /// Parameter types.
        params: &'ast [TypeExpr<'ast>],
        /// Result type, `void` when absent.
        ret: Option<&'ast TypeExpr<'ast>>,
        /// Source location.
        span: Span,
    },
}

impl<'ast> TypeExpr<'ast> {
    /// A plain named type.
    pub fn named(name: Ident<'ast>) -> Self {
        TypeExpr::Named {
            name,
            args: &[],
            span: name.span,
        }
    }

    /// Get the span of this annotation.
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named { span, .. }
            | TypeExpr::Tuple { span, .. }
            | TypeExpr::Func { span, .. } => *span,
        }
    }
}
