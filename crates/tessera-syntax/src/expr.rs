//! Expression nodes.
//!
//! The language is expression-oriented: blocks, conditionals and loops are
//! expressions, and a block's value is its tail expression.

use tessera_core::Span;

use crate::{BinaryOp, Ident, Stmt, TypeExpr, UnaryOp};

/// An expression.
#[derive(Debug, Clone, Copy)]
pub enum Expr<'ast> {
    /// Literal value.
    Literal(LiteralExpr<'ast>),
    /// Name reference.
    Ident(Ident<'ast>),
    /// The receiver object.
    This(Span),
    /// `(a, b, c)`
    Tuple(&'ast TupleExpr<'ast>),
    /// `[a, b, c]`
    Array(&'ast ArrayExpr<'ast>),
    /// `{ stmts; tail }`
    Block(&'ast Block<'ast>),
    /// `a + b`
    Binary(&'ast BinaryExpr<'ast>),
    /// `-a`, `!a`
    Unary(&'ast UnaryExpr<'ast>),
    /// `a = b`
    Assign(&'ast AssignExpr<'ast>),
    /// `if c { .. } else { .. }`
    If(&'ast IfExpr<'ast>),
    /// `while c { .. }`
    While(&'ast WhileExpr<'ast>),
    /// `for x in xs { .. }`
    For(&'ast ForExpr<'ast>),
    /// `fn(x: int) -> int { .. }`
    Fn(&'ast FnExpr<'ast>),
    /// `f(a, b)`
    Call(&'ast CallExpr<'ast>),
    /// `a.b`
    Member(&'ast MemberExpr<'ast>),
    /// `a[i]`
    Index(&'ast IndexExpr<'ast>),
    /// `array<int>`
    TypeApply(&'ast TypeApplyExpr<'ast>),
    /// `return` / `return x`
    Return(&'ast ReturnExpr<'ast>),
    /// `break`
    Break(Span),
    /// `continue`
    Continue(Span),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(e) => e.span,
            Expr::Ident(e) => e.span,
            Expr::This(span) | Expr::Break(span) | Expr::Continue(span) => *span,
            Expr::Tuple(e) => e.span,
            Expr::Array(e) => e.span,
            Expr::Block(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Assign(e) => e.span,
            Expr::If(e) => e.span,
            Expr::While(e) => e.span,
            Expr::For(e) => e.span,
            Expr::Fn(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Member(e) => e.span,
            Expr::Index(e) => e.span,
            Expr::TypeApply(e) => e.span,
            Expr::Return(e) => e.span,
        }
    }

    /// Short name of the construct, used in traces and comments.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "literal",
            Expr::Ident(_) => "name",
            Expr::This(_) => "this",
            Expr::Tuple(_) => "tuple",
            Expr::Array(_) => "array",
            Expr::Block(_) => "block",
            Expr::Binary(_) => "binary",
            Expr::Unary(_) => "unary",
            Expr::Assign(_) => "assignment",
            Expr::If(_) => "if",
            Expr::While(_) => "while",
            Expr::For(_) => "for",
            Expr::Fn(_) => "fn",
            Expr::Call(_) => "call",
            Expr::Member(_) => "member",
            Expr::Index(_) => "index",
            Expr::TypeApply(_) => "type application",
            Expr::Return(_) => "return",
            Expr::Break(_) => "break",
            Expr::Continue(_) => "continue",
        }
    }
}

/// Literal payloads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// `true` / `false`
    Bool(bool),
    /// String literal with escapes already processed.
    String(&'ast str),
    /// `null`
    Null,
}

/// A literal with its original spelling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    /// Parsed value.
    pub kind: LiteralKind<'ast>,
    /// Source text as written.
    pub text: &'ast str,
    /// Source location.
    pub span: Span,
}

/// `(a, b, c)`
#[derive(Debug, Clone, Copy)]
pub struct TupleExpr<'ast> {
    /// Components.
    pub elems: &'ast [Expr<'ast>],
    /// Source location.
    pub span: Span,
}

/// `[a, b, c]`
#[derive(Debug, Clone, Copy)]
pub struct ArrayExpr<'ast> {
    /// Elements.
    pub elems: &'ast [Expr<'ast>],
    /// Source location.
    pub span: Span,
}

/// `{ stmts; tail }`
#[derive(Debug, Clone, Copy)]
pub struct Block<'ast> {
    /// Statements in order.
    pub stmts: &'ast [Stmt<'ast>],
    /// Value-producing final expression.
    pub tail: Option<&'ast Expr<'ast>>,
    /// Source location.
    pub span: Span,
}

/// A binary operation.
#[derive(Debug, Clone, Copy)]
pub struct BinaryExpr<'ast> {
    /// Left operand.
    pub left: &'ast Expr<'ast>,
    /// The operator.
    pub op: BinaryOp,
    /// Location of the operator token.
    pub op_span: Span,
    /// Right operand.
    pub right: &'ast Expr<'ast>,
    /// Source location.
    pub span: Span,
}

/// A prefix operation.
#[derive(Debug, Clone, Copy)]
pub struct UnaryExpr<'ast> {
    /// The operator.
    pub op: UnaryOp,
    /// The operand.
    pub operand: &'ast Expr<'ast>,
    /// Source location.
    pub span: Span,
}

/// `target = value`
#[derive(Debug, Clone, Copy)]
pub struct AssignExpr<'ast> {
    /// Assigned location.
    pub target: &'ast Expr<'ast>,
    /// Assigned value.
    pub value: &'ast Expr<'ast>,
    /// Source location.
    pub span: Span,
}

/// `if cond { then } else { else_branch }`
#[derive(Debug, Clone, Copy)]
pub struct IfExpr<'ast> {
    /// Condition.
    pub cond: &'ast Expr<'ast>,
    /// Taken when the condition holds.
    pub then_branch: &'ast Expr<'ast>,
    /// Taken otherwise.
    pub else_branch: Option<&'ast Expr<'ast>>,
    /// Source location.
    pub span: Span,
}

/// `while cond { body }`
#[derive(Debug, Clone, Copy)]
pub struct WhileExpr<'ast> {
    /// Loop condition.
    pub cond: &'ast Expr<'ast>,
    /// Loop body.
    pub body: &'ast Expr<'ast>,
    /// Source location.
    pub span: Span,
}

/// `for binding in iterable { body }`
#[derive(Debug, Clone, Copy)]
pub struct ForExpr<'ast> {
    /// Element variable.
    pub binding: Ident<'ast>,
    /// The array being iterated.
    pub iterable: &'ast Expr<'ast>,
    /// Loop body.
    pub body: &'ast Expr<'ast>,
    /// Source location.
    pub span: Span,
}

/// A function parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param<'ast> {
    /// Parameter name.
    pub name: Ident<'ast>,
    /// Whether the body may assign to it.
    pub mutable: bool,
    /// Declared type.
    pub ty: TypeExpr<'ast>,
}

/// A function literal; also the body of a named function declaration.
#[derive(Debug, Clone, Copy)]
pub struct FnExpr<'ast> {
    /// Declared deterministic.
    pub det: bool,
    /// Parameters.
    pub params: &'ast [Param<'ast>],
    /// Declared result type.
    pub ret: Option<TypeExpr<'ast>>,
    /// Function body.
    pub body: &'ast Expr<'ast>,
    /// Source location.
    pub span: Span,
}

/// `callee(args)`
#[derive(Debug, Clone, Copy)]
pub struct CallExpr<'ast> {
    /// The called expression.
    pub callee: &'ast Expr<'ast>,
    /// Arguments in order.
    pub args: &'ast [Expr<'ast>],
    /// Source location.
    pub span: Span,
}

/// `object.name`
#[derive(Debug, Clone, Copy)]
pub struct MemberExpr<'ast> {
    /// The accessed expression.
    pub object: &'ast Expr<'ast>,
    /// Member name.
    pub name: Ident<'ast>,
    /// Source location.
    pub span: Span,
}

/// `object[index]`
#[derive(Debug, Clone, Copy)]
pub struct IndexExpr<'ast> {
    /// The indexed expression.
    pub object: &'ast Expr<'ast>,
    /// The index.
    pub index: &'ast Expr<'ast>,
    /// Source location.
    pub span: Span,
}

/// `base<args>` in expression position.
#[derive(Debug, Clone, Copy)]
pub struct TypeApplyExpr<'ast> {
    /// The generic being applied.
    pub base: &'ast Expr<'ast>,
    /// Type arguments.
    pub args: &'ast [TypeExpr<'ast>],
    /// Source location.
    pub span: Span,
}

/// `return value?`
#[derive(Debug, Clone, Copy)]
pub struct ReturnExpr<'ast> {
    /// Returned value.
    pub value: Option<&'ast Expr<'ast>>,
    /// Source location.
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    #[test]
    fn binary_span_and_kind() {
        let arena = Bump::new();
        let left = arena.alloc(Expr::Ident(Ident::new("a", Span::new(1, 1, 1))));
        let right = arena.alloc(Expr::Ident(Ident::new("b", Span::new(1, 5, 1))));
        let expr = Expr::Binary(arena.alloc(BinaryExpr {
            left,
            op: BinaryOp::Add,
            op_span: Span::new(1, 3, 1),
            right,
            span: Span::new(1, 1, 5),
        }));

        assert_eq!(expr.span(), Span::new(1, 1, 5));
        assert_eq!(expr.kind_name(), "binary");
        if let Expr::Binary(bin) = expr {
            assert_eq!(bin.op_span.col, 3);
        }
    }

    #[test]
    fn block_without_tail() {
        let arena = Bump::new();
        let block = Expr::Block(arena.alloc(Block {
            stmts: &[],
            tail: None,
            span: Span::new(2, 1, 2),
        }));
        assert_eq!(block.span().line, 2);
    }
}
