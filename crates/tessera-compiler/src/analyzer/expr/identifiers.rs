//! Names, `this` and explicit type application.

use tessera_core::{CompilationError, ScopeKind, Span, TypeId, TypeTable};
use tessera_syntax::{Expr, Ident, TypeApplyExpr};

use crate::typed::{LeftValue, Typed, TypedKind, Value};

use super::super::{Analyzer, Position, Resolved, Result};

impl Analyzer<'_> {
    /// A name in expression position: a variable, or a type or namespace
    /// used as the target of a static member access or construction.
    pub(crate) fn ident(&mut self, ident: &Ident<'_>) -> Result<Typed> {
        match self.resolve_name(ident.name, Position::Value) {
            Some(Resolved::Var(var)) => {
                let ty = self.type_of_var(var);
                let mut node = Typed::new(TypedKind::Var(var), ty, ident.span).with_value(Value::Var(var));
                if self.is_mutable(var) {
                    node.lvalue = Some(LeftValue::Var(var));
                }
                Ok(node)
            }
            Some(Resolved::Type(ty)) => Ok(self.meta(ty, ident.span)),
            Some(Resolved::Root(_)) | None => {
                self.report(CompilationError::UndefinedName {
                    name: ident.name.to_string(),
                    span: ident.span,
                });
                Ok(Typed::invalid(ident.span))
            }
        }
    }

    /// The receiver of the running behaviour, read in its own `this` scope.
    pub(crate) fn this(&mut self, span: Span) -> Result<Typed> {
        self.enter(ScopeKind::This);
        let node = Typed::new(TypedKind::This, TypeTable::OBJECT, span).with_value(Value::This);
        self.leave("this")?;
        Ok(node)
    }

    /// `base<args>`: only generic roots can be applied.
    pub(crate) fn type_apply(&mut self, apply: &TypeApplyExpr<'_>) -> Result<Typed> {
        let mut args = Vec::with_capacity(apply.args.len());
        for arg in apply.args {
            args.push(self.resolve_type(arg)?);
        }

        let Expr::Ident(base) = apply.base else {
            let message = format!("a {} cannot take type arguments", apply.base.kind_name());
            self.mismatch(message, apply.span);
            return Ok(Typed::invalid(apply.span));
        };

        match self.resolve_name(base.name, Position::TypeArgument) {
            Some(Resolved::Root(root)) => {
                let ty = self.specialize(root, &args, apply.span);
                if ty == TypeTable::UNKNOWN {
                    return Ok(Typed::invalid(apply.span));
                }
                Ok(self.meta(ty, apply.span))
            }
            Some(Resolved::Type(ty)) => {
                let message = format!("'{}' is not generic", self.display(ty));
                self.mismatch(message, apply.span);
                Ok(Typed::invalid(apply.span))
            }
            Some(Resolved::Var(_)) => {
                let message = format!("variable '{}' cannot take type arguments", base.name);
                self.mismatch(message, apply.span);
                Ok(Typed::invalid(apply.span))
            }
            None => {
                self.report(CompilationError::UndefinedName {
                    name: base.name.to_string(),
                    span: base.span,
                });
                Ok(Typed::invalid(apply.span))
            }
        }
    }

    /// A node naming the type or namespace `ty`.
    fn meta(&mut self, ty: TypeId, span: Span) -> Typed {
        let meta = self.meta_type_of(ty);
        Typed::new(TypedKind::Meta(ty), meta, span)
    }
}
