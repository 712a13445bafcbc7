//! `return`, `break` and `continue`.

use tessera_core::{CompilationError, ScopeKind, Span, TypeTable};
use tessera_syntax::ReturnExpr;

use crate::typed::{Typed, TypedKind};

use super::super::{Analyzer, Result};

impl Analyzer<'_> {
    /// Analyze `return [value]`. The value's type is checked against the
    /// function's result once the whole body is known.
    pub(crate) fn return_expr(&mut self, expr: &ReturnExpr<'_>) -> Result<Typed> {
        let in_function = self
            .scopes
            .last_scope(&self.session.qualifiers, ScopeKind::Func)
            .is_some();
        let mut value = match expr.value {
            Some(value) => Some(self.expr(value)?),
            None => None,
        };

        if !in_function || self.functions.is_empty() {
            self.report(CompilationError::InvalidControlFlow {
                keyword: "return",
                context: "a function",
                span: expr.span,
            });
            if let Some(value) = &value {
                self.release_all(&value.temps)?;
            }
            return Ok(Typed::invalid(expr.span));
        }

        let declared = self.functions.last().and_then(|f| f.declared_ret);
        if let (Some(node), Some(ret)) = (value.as_mut(), declared)
            && !node.is_invalid()
        {
            self.fixate(node, ret)?;
        }

        let mut deterministic = true;
        if let Some(node) = &value {
            deterministic = node.deterministic;
            if !node.is_invalid()
                && let Some(context) = self.functions.last_mut()
            {
                context.returns.push((node.ty, expr.span));
            }
            self.release_all(&node.temps)?;
        } else if let Some(context) = self.functions.last_mut() {
            context.returns.push((TypeTable::VOID, expr.span));
        }

        let kind = TypedKind::Return(value.map(Box::new));
        Ok(Typed::new(kind, TypeTable::VOID, expr.span).with_deterministic(deterministic))
    }

    /// Analyze `break` or `continue`: the nearest enclosing loop must be
    /// closer than the nearest enclosing function.
    pub(crate) fn loop_jump(&mut self, keyword: &'static str, span: Span) -> Typed {
        let target = self.scopes.last_scope_of(
            &self.session.qualifiers,
            &[ScopeKind::For, ScopeKind::While, ScopeKind::Func],
        );
        match target {
            Some(label) if label.kind.is_loop() => {
                let kind = if keyword == "break" {
                    TypedKind::Break
                } else {
                    TypedKind::Continue
                };
                Typed::new(kind, TypeTable::VOID, span)
            }
            _ => {
                self.report(CompilationError::InvalidControlFlow {
                    keyword,
                    context: "a loop",
                    span,
                });
                Typed::invalid(span)
            }
        }
    }
}
