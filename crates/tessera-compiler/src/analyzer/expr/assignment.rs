//! Assignment.
//!
//! The target is analyzed like any other expression; what it may be
//! assigned through is its left-value: a mutable variable, a property written
//! through `set_Name`, or an indexed element written through `Set`. The
//! target's receiver and index are evaluated before the assigned value.

use tessera_core::{CompilationError, InternalError, Span, TypeId, TypeTable};
use tessera_registry::{MethodId, MethodKind};
use tessera_syntax::{AssignExpr, Expr};

use crate::entities::VarId;
use crate::typed::{LeftValue, Typed, TypedKind};

use super::super::{Analyzer, Result};

/// The analyzed left side, before the value is known.
enum Target {
    Var(VarId),
    Setter {
        owner: TypeId,
        name: String,
        kind: MethodKind,
        args: Vec<Typed>,
        span: Span,
    },
    Invalid,
}

impl Analyzer<'_> {
    /// `target = value`; yields `void`.
    pub(crate) fn assign(&mut self, expr: &AssignExpr<'_>) -> Result<Typed> {
        let target = self.assign_target(expr.target)?;
        let mut value = self.expr(expr.value)?;

        let target = match target {
            Target::Invalid => Err(Vec::new()),
            Target::Setter { args, .. } if value.is_invalid() => Err(args),
            Target::Var(_) if value.is_invalid() => Err(Vec::new()),
            target => Ok(target),
        };
        let target = match target {
            Ok(target) => target,
            Err(args) => {
                self.release_nodes(&args)?;
                self.release_all(&value.temps)?;
                return Ok(Typed::invalid(expr.span));
            }
        };

        let (target, target_args) = match target {
            Target::Var(var) => {
                let ty = self.type_of_var(var);
                if !self.session.types.accepts(ty, value.ty) {
                    let message = format!(
                        "cannot assign a value of type '{}' to a variable of type '{}'",
                        self.display(value.ty),
                        self.display(ty)
                    );
                    self.mismatch(message, value.span);
                    self.release_all(&value.temps)?;
                    return Ok(Typed::invalid(expr.span));
                }
                self.fixate(&mut value, ty)?;
                (LeftValue::Var(var), Vec::new())
            }
            Target::Setter {
                owner,
                name,
                kind,
                args,
                span,
            } => {
                let mut arg_types: Vec<TypeId> = args.iter().map(|a| a.ty).collect();
                arg_types.push(value.ty);
                let Some(setter) = self.setter(owner, &name, kind, &arg_types, span) else {
                    self.release_nodes(&args)?;
                    self.release_all(&value.temps)?;
                    return Ok(Typed::invalid(expr.span));
                };
                let param = self.session.methods.get(setter).params.last().copied();
                if let Some(param) = param {
                    self.fixate(&mut value, param)?;
                }
                (LeftValue::Setter(setter), args)
            }
            Target::Invalid => return Ok(Typed::invalid(expr.span)),
        };

        let deterministic = value.deterministic && target_args.iter().all(|a| a.deterministic);
        self.release_nodes(&target_args)?;
        self.release_all(&value.temps)?;

        let kind = TypedKind::Assign {
            target,
            target_args,
            value: Box::new(value),
        };
        Ok(Typed::new(kind, TypeTable::VOID, expr.span).with_deterministic(deterministic))
    }

    /// Analyze the left side as an ordinary expression and take the
    /// left-value it denotes.
    fn assign_target(&mut self, target: &Expr<'_>) -> Result<Target> {
        let node = self.expr(target)?;
        if node.is_invalid() {
            return Ok(Target::Invalid);
        }
        let lvalue = node.lvalue;
        match lvalue {
            Some(LeftValue::Var(var)) => Ok(Target::Var(var)),
            Some(LeftValue::Setter(setter)) => self.setter_target(node, setter, target),
            None => {
                let message = self.not_assignable(&node, target);
                self.report(CompilationError::InvalidLeftValue {
                    message,
                    span: target_span(target),
                });
                self.release_all(&node.temps)?;
                Ok(Target::Invalid)
            }
        }
    }

    /// Turn an accessor read into a setter target. The accessor's arguments
    /// become the setter's and stay live until the setter runs; the read
    /// itself is dropped.
    fn setter_target(&mut self, node: Typed, setter: MethodId, target: &Expr<'_>) -> Result<Target> {
        let TypedKind::Extern { args, .. } = node.kind else {
            return Err(InternalError::malformed(
                "setter-backed left-value without an accessor call",
            ));
        };
        self.release_all(&node.temps)?;
        for arg in &args {
            self.force_retain_all(&arg.temps);
        }

        let method = self.session.methods.get(setter);
        let (name, kind) = (method.name.clone(), method.kind);
        let owner = match (kind, args.first()) {
            (MethodKind::Instance, Some(receiver)) => receiver.ty,
            _ => method.owner,
        };
        Ok(Target::Setter {
            owner,
            name,
            kind,
            args,
            span: target_span(target),
        })
    }

    fn not_assignable(&self, node: &Typed, target: &Expr<'_>) -> String {
        match (&node.kind, target) {
            (TypedKind::Var(_), Expr::Ident(ident)) => {
                format!("cannot assign to immutable variable '{}'", ident.name)
            }
            (TypedKind::Extern { method, .. }, Expr::Member(member)) => format!(
                "'{}' has no writable '{}'",
                self.display(self.session.methods.get(*method).owner),
                member.name.name
            ),
            (TypedKind::Extern { args, .. }, Expr::Index(_)) => format!(
                "'{}' has no writable 'Set'",
                self.display(args.first().map_or(node.ty, |a| a.ty))
            ),
            (_, Expr::Ident(ident)) => format!("'{}' is not assignable", ident.name),
            (_, other) => format!("a {} is not assignable", other.kind_name()),
        }
    }

    /// Resolve a setter, reporting a missing one as a bad assignment target.
    fn setter(
        &mut self,
        owner: TypeId,
        name: &str,
        kind: MethodKind,
        args: &[TypeId],
        span: Span,
    ) -> Option<MethodId> {
        if !self.session.methods.has_member(&self.session.types, owner, name) {
            let message = format!(
                "'{}' has no writable '{}'",
                self.display(owner),
                name.trim_start_matches("set_")
            );
            self.report(CompilationError::InvalidLeftValue { message, span });
            return None;
        }
        self.resolve_method(owner, name, kind, args, span)
    }
}

/// Properties are blamed at the member name.
fn target_span(target: &Expr<'_>) -> Span {
    match target {
        Expr::Member(member) => member.name.span,
        other => other.span(),
    }
}
