//! Programmatic tree construction.
//!
//! [`AstBuilder`] allocates nodes in a caller-owned arena the same way a
//! parser does. Every node gets a fresh single-column span on line 1, so
//! sites stay distinct and diagnostics can be matched back to the node that
//! produced them.

use std::cell::Cell;

use bumpalo::Bump;
use tessera_core::Span;

use crate::{
    ArrayExpr, AssignExpr, AttrKind, Attribute, BinaryExpr, BinaryOp, Block, CallExpr, Expr,
    FnDecl, FnExpr, ForExpr, Ident, IfExpr, IndexExpr, LetStmt, LiteralExpr, LiteralKind,
    MemberExpr, Module, Param, Pattern, ReturnExpr, Stmt, TupleExpr, TypeApplyExpr, TypeExpr,
    UnaryExpr, UnaryOp, WhileExpr,
};

/// Arena-backed node factory.
pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    column: Cell<u32>,
}

impl<'ast> AstBuilder<'ast> {
    /// Create a builder allocating into `arena`.
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            column: Cell::new(1),
        }
    }

    /// A span no other node of this builder has.
    pub fn span(&self) -> Span {
        let col = self.column.get();
        self.column.set(col + 1);
        Span::new(1, col, 1)
    }

    fn alloc(&self, expr: Expr<'ast>) -> &'ast Expr<'ast> {
        self.arena.alloc(expr)
    }

    fn exprs(&self, exprs: &[&'ast Expr<'ast>]) -> &'ast [Expr<'ast>] {
        self.arena.alloc_slice_fill_iter(exprs.iter().map(|e| **e))
    }

    // ------------------------------------------------------------------
    // Literals and names
    // ------------------------------------------------------------------

    fn literal(&self, kind: LiteralKind<'ast>, text: &str) -> &'ast Expr<'ast> {
        let text = self.arena.alloc_str(text);
        self.alloc(Expr::Literal(LiteralExpr {
            kind,
            text,
            span: self.span(),
        }))
    }

    /// An `int` literal.
    pub fn int(&self, value: i64) -> &'ast Expr<'ast> {
        self.literal(LiteralKind::Int(value), &value.to_string())
    }

    /// A `float` literal.
    pub fn float(&self, value: f64) -> &'ast Expr<'ast> {
        self.literal(LiteralKind::Float(value), &value.to_string())
    }

    /// A `bool` literal.
    pub fn boolean(&self, value: bool) -> &'ast Expr<'ast> {
        self.literal(LiteralKind::Bool(value), if value { "true" } else { "false" })
    }

    /// A string literal.
    pub fn string(&self, value: &str) -> &'ast Expr<'ast> {
        let value = self.arena.alloc_str(value);
        self.literal(LiteralKind::String(value), &format!("{value:?}"))
    }

    /// `null`
    pub fn null(&self) -> &'ast Expr<'ast> {
        self.literal(LiteralKind::Null, "null")
    }

    /// A bare identifier.
    pub fn name(&self, name: &str) -> Ident<'ast> {
        Ident::new(self.arena.alloc_str(name), self.span())
    }

    /// A name in expression position.
    pub fn ident(&self, name: &str) -> &'ast Expr<'ast> {
        let ident = self.name(name);
        self.alloc(Expr::Ident(ident))
    }

    /// `this`
    pub fn this(&self) -> &'ast Expr<'ast> {
        self.alloc(Expr::This(self.span()))
    }

    // ------------------------------------------------------------------
    // Compound expressions
    // ------------------------------------------------------------------

    /// `(a, b, ..)`
    pub fn tuple(&self, elems: &[&'ast Expr<'ast>]) -> &'ast Expr<'ast> {
        let elems = self.exprs(elems);
        self.alloc(Expr::Tuple(self.arena.alloc(TupleExpr {
            elems,
            span: self.span(),
        })))
    }

    /// `[a, b, ..]`
    pub fn array(&self, elems: &[&'ast Expr<'ast>]) -> &'ast Expr<'ast> {
        let elems = self.exprs(elems);
        self.alloc(Expr::Array(self.arena.alloc(ArrayExpr {
            elems,
            span: self.span(),
        })))
    }

    /// `{ stmts; tail }`
    pub fn block(&self, stmts: &[Stmt<'ast>], tail: Option<&'ast Expr<'ast>>) -> &'ast Expr<'ast> {
        let stmts = self.arena.alloc_slice_copy(stmts);
        self.alloc(Expr::Block(self.arena.alloc(Block {
            stmts,
            tail,
            span: self.span(),
        })))
    }

    /// `left op right`
    pub fn binary(
        &self,
        left: &'ast Expr<'ast>,
        op: BinaryOp,
        right: &'ast Expr<'ast>,
    ) -> &'ast Expr<'ast> {
        let op_span = self.span();
        self.alloc(Expr::Binary(self.arena.alloc(BinaryExpr {
            left,
            op,
            op_span,
            right,
            span: left.span().merge(right.span()),
        })))
    }

    /// `op operand`
    pub fn unary(&self, op: UnaryOp, operand: &'ast Expr<'ast>) -> &'ast Expr<'ast> {
        self.alloc(Expr::Unary(self.arena.alloc(UnaryExpr {
            op,
            operand,
            span: self.span(),
        })))
    }

    /// `target = value`
    pub fn assign(&self, target: &'ast Expr<'ast>, value: &'ast Expr<'ast>) -> &'ast Expr<'ast> {
        self.alloc(Expr::Assign(self.arena.alloc(AssignExpr {
            target,
            value,
            span: self.span(),
        })))
    }

    /// `if cond then else`
    pub fn if_else(
        &self,
        cond: &'ast Expr<'ast>,
        then_branch: &'ast Expr<'ast>,
        else_branch: Option<&'ast Expr<'ast>>,
    ) -> &'ast Expr<'ast> {
        self.alloc(Expr::If(self.arena.alloc(IfExpr {
            cond,
            then_branch,
            else_branch,
            span: self.span(),
        })))
    }

    /// `while cond body`
    pub fn while_loop(&self, cond: &'ast Expr<'ast>, body: &'ast Expr<'ast>) -> &'ast Expr<'ast> {
        self.alloc(Expr::While(self.arena.alloc(WhileExpr {
            cond,
            body,
            span: self.span(),
        })))
    }

    /// `for binding in iterable body`
    pub fn for_loop(
        &self,
        binding: &str,
        iterable: &'ast Expr<'ast>,
        body: &'ast Expr<'ast>,
    ) -> &'ast Expr<'ast> {
        let binding = self.name(binding);
        self.alloc(Expr::For(self.arena.alloc(ForExpr {
            binding,
            iterable,
            body,
            span: self.span(),
        })))
    }

    /// A function literal.
    pub fn func(
        &self,
        det: bool,
        params: &[Param<'ast>],
        ret: Option<TypeExpr<'ast>>,
        body: &'ast Expr<'ast>,
    ) -> &'ast FnExpr<'ast> {
        let params = self.arena.alloc_slice_copy(params);
        self.arena.alloc(FnExpr {
            det,
            params,
            ret,
            body,
            span: self.span(),
        })
    }

    /// A function literal in expression position.
    pub fn lambda(&self, func: &'ast FnExpr<'ast>) -> &'ast Expr<'ast> {
        self.alloc(Expr::Fn(func))
    }

    /// A parameter.
    pub fn param(&self, name: &str, mutable: bool, ty: TypeExpr<'ast>) -> Param<'ast> {
        Param {
            name: self.name(name),
            mutable,
            ty,
        }
    }

    /// `callee(args)`
    pub fn call(&self, callee: &'ast Expr<'ast>, args: &[&'ast Expr<'ast>]) -> &'ast Expr<'ast> {
        let args = self.exprs(args);
        self.alloc(Expr::Call(self.arena.alloc(CallExpr {
            callee,
            args,
            span: self.span(),
        })))
    }

    /// `object.name`
    pub fn member(&self, object: &'ast Expr<'ast>, name: &str) -> &'ast Expr<'ast> {
        let name = self.name(name);
        self.alloc(Expr::Member(self.arena.alloc(MemberExpr {
            object,
            name,
            span: self.span(),
        })))
    }

    /// `object.name(args)`
    pub fn method(
        &self,
        object: &'ast Expr<'ast>,
        name: &str,
        args: &[&'ast Expr<'ast>],
    ) -> &'ast Expr<'ast> {
        let callee = self.member(object, name);
        self.call(callee, args)
    }

    /// `object[index]`
    pub fn index(&self, object: &'ast Expr<'ast>, index: &'ast Expr<'ast>) -> &'ast Expr<'ast> {
        self.alloc(Expr::Index(self.arena.alloc(IndexExpr {
            object,
            index,
            span: self.span(),
        })))
    }

    /// `base<args>`
    pub fn type_apply(&self, base: &'ast Expr<'ast>, args: &[TypeExpr<'ast>]) -> &'ast Expr<'ast> {
        let args = self.arena.alloc_slice_copy(args);
        self.alloc(Expr::TypeApply(self.arena.alloc(TypeApplyExpr {
            base,
            args,
            span: self.span(),
        })))
    }

    /// `return value?`
    pub fn ret(&self, value: Option<&'ast Expr<'ast>>) -> &'ast Expr<'ast> {
        self.alloc(Expr::Return(self.arena.alloc(ReturnExpr {
            value,
            span: self.span(),
        })))
    }

    /// `break`
    pub fn brk(&self) -> &'ast Expr<'ast> {
        self.alloc(Expr::Break(self.span()))
    }

    /// `continue`
    pub fn cont(&self) -> &'ast Expr<'ast> {
        self.alloc(Expr::Continue(self.span()))
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// A plain named type.
    pub fn ty(&self, name: &str) -> TypeExpr<'ast> {
        TypeExpr::named(self.name(name))
    }

    /// `name<args>`
    pub fn generic(&self, name: &str, args: &[TypeExpr<'ast>]) -> TypeExpr<'ast> {
        TypeExpr::Named {
            name: self.name(name),
            args: self.arena.alloc_slice_copy(args),
            span: self.span(),
        }
    }

    /// `(a, b, ..)` in type position.
    pub fn tuple_ty(&self, elems: &[TypeExpr<'ast>]) -> TypeExpr<'ast> {
        TypeExpr::Tuple {
            elems: self.arena.alloc_slice_copy(elems),
            span: self.span(),
        }
    }

    /// `fn(params) -> ret`, or `det fn(..)`.
    pub fn func_ty(
        &self,
        det: bool,
        params: &[TypeExpr<'ast>],
        ret: Option<TypeExpr<'ast>>,
    ) -> TypeExpr<'ast> {
        TypeExpr::Func {
            det,
            params: self.arena.alloc_slice_copy(params),
            ret: ret.map(|r| &*self.arena.alloc(r)),
            span: self.span(),
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// An attribute.
    pub fn attr(&self, kind: AttrKind) -> Attribute {
        Attribute {
            kind,
            span: self.span(),
        }
    }

    /// A binding with every part spelled out.
    pub fn binding(
        &self,
        attrs: &[Attribute],
        mutable: bool,
        pattern: Pattern<'ast>,
        ty: Option<TypeExpr<'ast>>,
        init: &'ast Expr<'ast>,
    ) -> Stmt<'ast> {
        let attrs = self.arena.alloc_slice_copy(attrs);
        Stmt::Let(self.arena.alloc(LetStmt {
            attrs,
            mutable,
            pattern,
            ty,
            init,
            span: self.span(),
        }))
    }

    /// `let name = init;`
    pub fn let_(&self, name: &str, init: &'ast Expr<'ast>) -> Stmt<'ast> {
        let pattern = Pattern::Name(self.name(name));
        self.binding(&[], false, pattern, None, init)
    }

    /// `let mut name = init;`
    pub fn let_mut(&self, name: &str, init: &'ast Expr<'ast>) -> Stmt<'ast> {
        let pattern = Pattern::Name(self.name(name));
        self.binding(&[], true, pattern, None, init)
    }

    /// `let name: ty = init;`
    pub fn let_typed(&self, name: &str, ty: TypeExpr<'ast>, init: &'ast Expr<'ast>) -> Stmt<'ast> {
        let pattern = Pattern::Name(self.name(name));
        self.binding(&[], false, pattern, Some(ty), init)
    }

    /// A destructuring pattern `(a, b, ..)`.
    pub fn tuple_pattern(&self, names: &[&str]) -> Pattern<'ast> {
        let idents: Vec<Ident<'ast>> = names.iter().map(|n| self.name(n)).collect();
        Pattern::Tuple(self.arena.alloc_slice_copy(&idents), self.span())
    }

    /// A named function declaration.
    pub fn fn_decl(&self, attrs: &[Attribute], name: &str, func: &'ast FnExpr<'ast>) -> Stmt<'ast> {
        let attrs = self.arena.alloc_slice_copy(attrs);
        let name = self.name(name);
        Stmt::Fn(self.arena.alloc(FnDecl {
            attrs,
            name,
            func,
            span: self.span(),
        }))
    }

    /// An expression statement.
    pub fn stmt(&self, expr: &'ast Expr<'ast>) -> Stmt<'ast> {
        Stmt::Expr(expr)
    }

    /// A compilation unit.
    pub fn module(&self, items: &[Stmt<'ast>]) -> Module<'ast> {
        Module::new(self.arena.alloc_slice_copy(items), Span::new(1, 1, self.column.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_get_distinct_spans() {
        let arena = Bump::new();
        let ast = AstBuilder::new(&arena);
        let a = ast.int(1);
        let b = ast.ident("b");
        assert_ne!(a.span(), b.span());
    }

    #[test]
    fn binary_spans_cover_operands() {
        let arena = Bump::new();
        let ast = AstBuilder::new(&arena);
        let sum = ast.binary(ast.int(1), BinaryOp::Add, ast.int(2));
        let Expr::Binary(bin) = sum else {
            panic!("expected a binary node");
        };
        assert_eq!(bin.span.col, bin.left.span().col);
        assert!(bin.span.len() >= 2);
        assert_ne!(bin.op_span, bin.left.span());
    }

    #[test]
    fn module_keeps_item_order() {
        let arena = Bump::new();
        let ast = AstBuilder::new(&arena);
        let module = ast.module(&[ast.let_("a", ast.int(1)), ast.stmt(ast.ident("a"))]);
        assert!(matches!(module.items()[0], Stmt::Let(_)));
        assert!(matches!(module.items()[1], Stmt::Expr(_)));
    }
}
