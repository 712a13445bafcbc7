//! Statement nodes.

use tessera_core::Span;

use crate::{Attribute, Expr, FnExpr, Ident, TypeExpr};

/// A statement inside a module or block.
#[derive(Debug, Clone, Copy)]
pub enum Stmt<'ast> {
    /// `let` / `let mut` binding.
    Let(&'ast LetStmt<'ast>),
    /// Named function declaration.
    Fn(&'ast FnDecl<'ast>),
    /// Expression evaluated for effect.
    Expr(&'ast Expr<'ast>),
}

impl<'ast> Stmt<'ast> {
    /// Get the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let(s) => s.span,
            Stmt::Fn(s) => s.span,
            Stmt::Expr(e) => e.span(),
        }
    }
}

/// The left side of a binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pattern<'ast> {
    /// `let x = ..`
    Name(Ident<'ast>),
    /// `let (a, b) = ..`
    Tuple(&'ast [Ident<'ast>], Span),
}

impl<'ast> Pattern<'ast> {
    /// Get the span of this pattern.
    pub fn span(&self) -> Span {
        match self {
            Pattern::Name(ident) => ident.span,
            Pattern::Tuple(_, span) => *span,
        }
    }
}

/// `[attrs] let [mut] pattern [: ty] = init;`
#[derive(Debug, Clone, Copy)]
pub struct LetStmt<'ast> {
    /// Attributes written before the binding.
    pub attrs: &'ast [Attribute],
    /// Whether the bound variables are mutable.
    pub mutable: bool,
    /// Bound names.
    pub pattern: Pattern<'ast>,
    /// Declared type.
    pub ty: Option<TypeExpr<'ast>>,
    /// Initializer.
    pub init: &'ast Expr<'ast>,
    /// Source location.
    pub span: Span,
}

/// `[attrs] fn name(params) -> ret { body }`
#[derive(Debug, Clone, Copy)]
pub struct FnDecl<'ast> {
    /// Attributes written before the declaration.
    pub attrs: &'ast [Attribute],
    /// Function name.
    pub name: Ident<'ast>,
    /// Parameters, result and body.
    pub func: &'ast FnExpr<'ast>,
    /// Source location.
    pub span: Span,
}
