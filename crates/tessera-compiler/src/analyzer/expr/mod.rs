//! Expression analysis.
//!
//! Each expression yields a [`Typed`] whose `temps` are the slots it hands
//! to its consumer. Operands are analyzed left to right; an operation
//! retains its own output slots before it releases the slots of its
//! operands, so an output never aliases an input.

mod assignment;
mod calls;
mod identifiers;
mod literals;
mod operators;

use tessera_syntax::Expr;

use crate::typed::Typed;

use super::{Analyzer, Result};

impl Analyzer<'_> {
    /// Analyze an expression.
    pub(crate) fn expr(&mut self, expr: &Expr<'_>) -> Result<Typed> {
        match expr {
            Expr::Literal(lit) => Ok(self.literal(lit)),
            Expr::Ident(ident) => self.ident(ident),
            Expr::This(span) => self.this(*span),
            Expr::Tuple(tuple) => self.tuple(tuple),
            Expr::Array(array) => self.array(array),
            Expr::Block(block) => self.block(block),
            Expr::Binary(binary) => self.binary(binary),
            Expr::Unary(unary) => self.unary(unary),
            Expr::Assign(assign) => self.assign(assign),
            Expr::If(if_expr) => self.if_expr(if_expr),
            Expr::While(while_expr) => self.while_expr(while_expr),
            Expr::For(for_expr) => self.for_expr(for_expr),
            Expr::Fn(func) => self.fn_literal(func),
            Expr::Call(call) => self.call(call),
            Expr::Member(member) => self.member(member),
            Expr::Index(index) => self.index(index),
            Expr::TypeApply(apply) => self.type_apply(apply),
            Expr::Return(ret) => self.return_expr(ret),
            Expr::Break(span) => Ok(self.loop_jump("break", *span)),
            Expr::Continue(span) => Ok(self.loop_jump("continue", *span)),
        }
    }

    /// Analyze a list of operands, left to right.
    pub(crate) fn exprs(&mut self, exprs: &[Expr<'_>]) -> Result<Vec<Typed>> {
        let mut out = Vec::with_capacity(exprs.len());
        for expr in exprs {
            out.push(self.expr(expr)?);
        }
        Ok(out)
    }

    /// Release the slots of every node in `nodes`.
    pub(crate) fn release_nodes(&mut self, nodes: &[Typed]) -> Result<()> {
        for node in nodes {
            self.release_all(&node.temps)?;
        }
        Ok(())
    }
}
