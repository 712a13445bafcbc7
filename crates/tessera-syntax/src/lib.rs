//! Syntax tree consumed by the tessera analyzer.
//!
//! Lexing and parsing happen outside this workspace. A parser allocates the
//! tree in a [`bumpalo::Bump`] arena and hands over a [`Module`]; every node
//! is a tagged variant per grammar production and borrows its children from
//! the arena. [`AstBuilder`] builds the same trees without a parser.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use tessera_core::Span;
//! use tessera_syntax::{Expr, Ident, LetStmt, LiteralExpr, LiteralKind, Module, Pattern, Stmt};
//!
//! let arena = Bump::new();
//! let init = arena.alloc(Expr::Literal(LiteralExpr {
//!     kind: LiteralKind::Int(123),
//!     text: "123",
//!     span: Span::new(1, 14, 3),
//! }));
//! let stmt = Stmt::Let(arena.alloc(LetStmt {
//!     attrs: &[],
//!     mutable: false,
//!     pattern: Pattern::Name(Ident::new("x", Span::new(1, 5, 1))),
//!     ty: None,
//!     init,
//!     span: Span::new(1, 1, 18),
//! }));
//! let module = Module::new(arena.alloc_slice_copy(&[stmt]), Span::new(1, 1, 18));
//! assert_eq!(module.items().len(), 1);
//! ```

pub mod build;
pub mod expr;
pub mod ops;
pub mod stmt;
pub mod types;

pub use build::AstBuilder;
pub use expr::*;
pub use ops::*;
pub use stmt::*;
pub use types::*;

use tessera_core::Span;

/// An identifier with its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    /// The identifier text.
    pub name: &'ast str,
    /// Source location.
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    /// Create an identifier.
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

/// One compilation unit.
#[derive(Debug, Clone, Copy)]
pub struct Module<'ast> {
    items: &'ast [Stmt<'ast>],
    span: Span,
}

impl<'ast> Module<'ast> {
    /// Create a module from parsed top-level statements.
    pub fn new(items: &'ast [Stmt<'ast>], span: Span) -> Self {
        Self { items, span }
    }

    /// Top-level statements in source order.
    pub fn items(&self) -> &'ast [Stmt<'ast>] {
        self.items
    }

    /// Span of the whole unit.
    pub fn span(&self) -> Span {
        self.span
    }
}
