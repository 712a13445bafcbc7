//! Function literals and named function declarations.
//!
//! Every function body is analyzed under its own `Func` qualifier, which is
//! also a new temp root: slots of different functions never interact. Named
//! functions are hoisted, so their variables exist before any statement of
//! the enclosing scope runs; their types come from the annotations alone.
//! Anonymous functions are deterministic when declared so or when nothing
//! in the body is non-deterministic.

use tracing::trace;

use tessera_core::{CompilationError, ScopeKind, SignatureHash, Span, TypeId, TypeTable};
use tessera_syntax::{FnDecl, FnExpr};

use crate::analyzer::attributes::AttrTarget;
use crate::entities::{Func, FuncId, VarDecl, VarFlags, VarId};
use crate::typed::{Typed, TypedKind, TypedStmt, Value};

use super::{Analyzer, FnContext, Result};

/// What a named declaration adds to a function literal.
struct NamedFn<'a> {
    name: &'a str,
    export: bool,
    binding: Option<VarId>,
}

impl Analyzer<'_> {
    /// Analyze an anonymous function; its value is the function itself.
    pub(crate) fn fn_literal(&mut self, func: &FnExpr<'_>) -> Result<Typed> {
        let Some(id) = self.function(func, None)? else {
            return Ok(Typed::invalid(func.span));
        };
        let ty = self.session.funcs.get(id)?.ty;
        Ok(Typed::new(TypedKind::Func(id), ty, func.span).with_value(Value::Func(id)))
    }

    /// Analyze `[attrs] fn name(..) { .. }`.
    pub(crate) fn fn_decl(&mut self, decl: &FnDecl<'_>) -> Result<TypedStmt> {
        let at_module = self.at_module_level();
        let attrs = self.check_attrs(decl.attrs, at_module, AttrTarget::Function);
        if attrs.export && !decl.func.params.is_empty() {
            self.report(CompilationError::InvalidAttribute {
                message: format!("exported function '{}' must not take parameters", decl.name.name),
                span: decl.name.span,
            });
        }

        let named = NamedFn {
            name: decl.name.name,
            export: attrs.export,
            binding: self.hoisted.get(&decl.name.span).copied(),
        };
        Ok(match self.function(decl.func, Some(named))? {
            Some(id) => TypedStmt::Fn(id),
            None => TypedStmt::Expr(Typed::invalid(decl.span)),
        })
    }

    fn function(&mut self, func: &FnExpr<'_>, named: Option<NamedFn<'_>>) -> Result<Option<FuncId>> {
        let declared_in = self.scopes.current();
        let hoisted_sig = named
            .as_ref()
            .and_then(|n| n.binding)
            .and_then(|var| self.session.types.function_sig(self.type_of_var(var)));
        let (params, declared_ret) = match hoisted_sig {
            Some(sig) => (sig.params, Some(sig.ret)),
            None => {
                let (params, ret) = self.annotated_signature(func)?;
                let ret = if named.is_some() {
                    Some(ret.unwrap_or(TypeTable::VOID))
                } else {
                    ret
                };
                (params, ret)
            }
        };

        let qualifier = self.enter(ScopeKind::Func);
        let mut param_vars = Vec::with_capacity(params.len());
        for (param, &ty) in func.params.iter().zip(&params) {
            let mut flags = VarFlags::PARAM;
            if param.mutable {
                flags |= VarFlags::MUTABLE;
            }
            let declared = self.declare_var(VarDecl {
                qualifier,
                name: param.name.name.to_string(),
                ty,
                flags,
                sync: None,
                default: None,
                span: param.name.span,
            });
            param_vars.extend(declared);
        }

        self.functions.push(FnContext {
            declared_ret,
            returns: Vec::new(),
        });
        let body = self.expr(func.body);
        let context = self.functions.pop();
        let mut body = body?;
        let returns = context.map(|c| c.returns).unwrap_or_default();

        let ret = self.function_result(&mut body, declared_ret, &returns, func)?;
        let deterministic = body.deterministic;
        if func.det && !deterministic {
            self.report(CompilationError::InvalidAttribute {
                message: "deterministic function calls non-deterministic code".to_string(),
                span: func.span,
            });
        }
        let detfunc = func.det || (named.is_none() && deterministic);
        let ty = self.session.types.function(&params, ret, detfunc);
        let signature = self.session.types.function(&params, ret, false);

        self.release_all(&body.temps)?;
        self.leave("function")?;

        if param_vars.len() != params.len() {
            return Ok(None);
        }

        let param_ids: Vec<u32> = params.iter().map(|p| p.0).collect();
        let (hash, name, export, binding) = match &named {
            Some(n) => (
                SignatureHash::from_function(
                    &self.session.qualifiers.render(declared_in),
                    n.name,
                    &param_ids,
                ),
                Some(n.name.to_string()),
                n.export,
                n.binding,
            ),
            None => (
                SignatureHash::from_function(&self.session.qualifiers.render(qualifier), "", &param_ids),
                None,
                false,
                None,
            ),
        };

        let entry = Func {
            index: FuncId(0),
            qualifier,
            name: name.clone(),
            ty,
            signature,
            params: param_vars,
            body,
            deterministic,
            export,
            binding,
            span: func.span,
        };
        match self.session.funcs.register(hash, entry) {
            Some(id) => {
                trace!(func = id.0, name = name.as_deref().unwrap_or("<anonymous>"), "function registered");
                Ok(Some(id))
            }
            None => {
                // A hoisting conflict was already reported for the name.
                if binding.is_some() {
                    self.report(CompilationError::ConflictingDeclaration {
                        name: name.unwrap_or_default(),
                        span: func.span,
                    });
                }
                Ok(None)
            }
        }
    }

    /// Settle the result type and check the body value and every `return`
    /// against it. Unannotated anonymous functions take the body's type, or
    /// the first valued `return`'s. A body without a value must leave through
    /// `return` on every path.
    fn function_result(
        &mut self,
        body: &mut Typed,
        declared: Option<TypeId>,
        returns: &[(TypeId, Span)],
        func: &FnExpr<'_>,
    ) -> Result<TypeId> {
        let ret = match declared {
            Some(ret) => ret,
            None if body.ty != TypeTable::VOID => body.ty,
            None => returns
                .iter()
                .map(|&(ty, _)| ty)
                .find(|&ty| ty != TypeTable::VOID)
                .unwrap_or(TypeTable::VOID),
        };

        let checked = !body.is_invalid() && ret != TypeTable::VOID;
        if checked && body.ty == TypeTable::VOID {
            if !body.diverges() {
                let message = format!(
                    "function body yields no value, expected '{}'",
                    self.display(ret)
                );
                self.mismatch(message, body.span);
            }
        } else if checked {
            if self.session.types.accepts(ret, body.ty) {
                self.fixate(body, ret)?;
            } else {
                let message = format!(
                    "function body yields '{}', expected '{}'",
                    self.display(body.ty),
                    self.display(ret)
                );
                self.mismatch(message, body.span);
            }
        }

        for &(ty, span) in returns {
            let fits = if ret == TypeTable::VOID {
                ty == TypeTable::VOID
            } else {
                ty != TypeTable::VOID && self.session.types.accepts(ret, ty)
            };
            if !fits {
                let message = format!(
                    "cannot return '{}' from a function returning '{}'",
                    self.display(ty),
                    self.display(ret)
                );
                self.mismatch(message, span);
            }
        }

        if declared.is_none() {
            self.require_concrete(ret, "function result", func.span);
        }
        Ok(ret)
    }
}
