//! Calls, member access and indexing.
//!
//! Host operations become [`TypedKind::Extern`] nodes; applying a value of
//! function type becomes a [`TypedKind::Call`]. Members are looked up
//! statically when the object names a type or namespace and on the value's
//! type otherwise, with the value passed as the receiver. Properties map to
//! `get_Name` methods and indexing to `Get`; a matching `set_Name` or `Set`
//! makes the node a left-value.

use tessera_core::{CompilationError, Span, TypeId, TypeKind};
use tessera_registry::{MethodId, MethodKind};
use tessera_syntax::{CallExpr, Expr, IndexExpr, MemberExpr};

use crate::typed::{LeftValue, Typed, TypedKind, Value};

use super::super::{Analyzer, Result};

impl Analyzer<'_> {
    /// `callee(args)`.
    pub(crate) fn call(&mut self, call: &CallExpr<'_>) -> Result<Typed> {
        if let Expr::Member(member) = call.callee {
            return self.method_call(member, call);
        }

        let callee = self.expr(call.callee)?;
        let args = self.exprs(call.args)?;
        if callee.is_invalid() || args.iter().any(Typed::is_invalid) {
            self.release_all(&callee.temps)?;
            self.release_nodes(&args)?;
            return Ok(Typed::invalid(call.span));
        }

        if let Some(target) = callee.meta() {
            if self.session.types.get(target).kind == TypeKind::Namespace {
                let message = format!("namespace '{}' cannot be called", self.display(target));
                self.mismatch(message, callee.span);
                self.release_nodes(&args)?;
                return Ok(Typed::invalid(call.span));
            }
            let arg_types: Vec<_> = args.iter().map(|a| a.ty).collect();
            let Some(method) =
                self.resolve_method(target, "ctor", MethodKind::Static, &arg_types, call.span)
            else {
                self.release_nodes(&args)?;
                return Ok(Typed::invalid(call.span));
            };
            return self.extern_call(method, args, call.span);
        }

        self.call_function(callee, args, call.span)
    }

    /// `object.name(args)`.
    fn method_call(&mut self, member: &MemberExpr<'_>, call: &CallExpr<'_>) -> Result<Typed> {
        let object = self.expr(member.object)?;
        let args = self.exprs(call.args)?;
        if object.is_invalid() || args.iter().any(Typed::is_invalid) {
            self.release_all(&object.temps)?;
            self.release_nodes(&args)?;
            return Ok(Typed::invalid(call.span));
        }

        let name = member.name.name;
        let (owner, kind, operands) = match object.meta() {
            Some(target) => (target, MethodKind::Static, args),
            None => {
                let mut operands = Vec::with_capacity(args.len() + 1);
                let owner = object.ty;
                operands.push(object);
                operands.extend(args);
                (owner, MethodKind::Instance, operands)
            }
        };

        let arg_types: Vec<_> = operands.iter().map(|a| a.ty).collect();
        match self.resolve_method(owner, name, kind, &arg_types, member.name.span) {
            Some(method) => self.extern_call(method, operands, call.span),
            None => {
                self.release_nodes(&operands)?;
                Ok(Typed::invalid(call.span))
            }
        }
    }

    /// `object.name` read through a property getter.
    pub(crate) fn member(&mut self, member: &MemberExpr<'_>) -> Result<Typed> {
        let object = self.expr(member.object)?;
        if object.is_invalid() {
            return Ok(Typed::invalid(member.span));
        }

        let getter = format!("get_{}", member.name.name);
        let (owner, kind, operands) = match object.meta() {
            Some(target) => (target, MethodKind::Static, Vec::new()),
            None => (object.ty, MethodKind::Instance, vec![object]),
        };
        let arg_types: Vec<_> = operands.iter().map(|a| a.ty).collect();

        let has_getter = self
            .session
            .methods
            .has_member(&self.session.types, owner, &getter);
        if !has_getter {
            let owner = self.display(owner);
            self.report(CompilationError::NotDefined {
                owner,
                member: member.name.name.to_string(),
                span: member.name.span,
            });
            self.release_nodes(&operands)?;
            return Ok(Typed::invalid(member.span));
        }

        match self.resolve_method(owner, &getter, kind, &arg_types, member.name.span) {
            Some(method) => {
                let mut node = self.extern_call(method, operands, member.span)?;
                let setter = format!("set_{}", member.name.name);
                self.mark_writable(&mut node, owner, &setter, kind, arg_types);
                Ok(node)
            }
            None => {
                self.release_nodes(&operands)?;
                Ok(Typed::invalid(member.span))
            }
        }
    }

    /// `object[index]` read through `Get`.
    pub(crate) fn index(&mut self, index: &IndexExpr<'_>) -> Result<Typed> {
        let object = self.expr(index.object)?;
        let position = self.expr(index.index)?;
        if object.is_invalid() || position.is_invalid() {
            self.release_all(&object.temps)?;
            self.release_all(&position.temps)?;
            return Ok(Typed::invalid(index.span));
        }

        let owner = object.ty;
        let arg_types = vec![object.ty, position.ty];
        let operands = vec![object, position];
        match self.resolve_method(owner, "Get", MethodKind::Instance, &arg_types, index.span) {
            Some(method) => {
                let mut node = self.extern_call(method, operands, index.span)?;
                self.mark_writable(&mut node, owner, "Set", MethodKind::Instance, arg_types);
                Ok(node)
            }
            None => {
                self.release_nodes(&operands)?;
                Ok(Typed::invalid(index.span))
            }
        }
    }

    /// Record the setter that writes back what an accessor read, if the
    /// owner has one taking the read value's type.
    fn mark_writable(
        &self,
        node: &mut Typed,
        owner: TypeId,
        setter: &str,
        kind: MethodKind,
        mut args: Vec<TypeId>,
    ) {
        if node.is_invalid() {
            return;
        }
        args.push(node.ty);
        node.lvalue = self.find_method(owner, setter, kind, &args).map(LeftValue::Setter);
    }

    /// Build the node for a resolved host method.
    ///
    /// Written (`out`/`inout`) parameters need a mutable variable argument.
    /// The outputs are retained before the arguments' slots are released.
    pub(crate) fn extern_call(
        &mut self,
        id: MethodId,
        mut args: Vec<Typed>,
        span: Span,
    ) -> Result<Typed> {
        let method = self.session.methods.get(id).clone();

        let mut valid = true;
        for (i, (arg, dir)) in args.iter().zip(&method.directions).enumerate() {
            if dir.writes() && !matches!(arg.lvalue, Some(LeftValue::Var(_))) {
                valid = false;
                self.report(CompilationError::InvalidLeftValue {
                    message: format!(
                        "argument {} of '{}' must be a mutable variable",
                        i + 1,
                        method.name
                    ),
                    span: arg.span,
                });
            }
        }
        if !valid {
            self.release_nodes(&args)?;
            return Ok(Typed::invalid(span));
        }

        for (arg, &param) in args.iter_mut().zip(&method.params) {
            self.fixate(arg, param)?;
        }

        let ty = method.result_type(&mut self.session.types);
        let deterministic = method.deterministic && args.iter().all(|a| a.deterministic);
        let mut outputs: Vec<Value> = method
            .outputs
            .iter()
            .map(|&out| self.retain_value(out))
            .collect();
        let value = match outputs.len() {
            0 => Value::None,
            1 => outputs.remove(0),
            _ => Value::Tuple(outputs),
        };
        self.release_nodes(&args)?;

        let kind = TypedKind::Extern { method: id, args };
        Ok(Typed::new(kind, ty, span)
            .with_value(value)
            .with_deterministic(deterministic))
    }

    /// Apply a value of function type.
    fn call_function(&mut self, callee: Typed, mut args: Vec<Typed>, span: Span) -> Result<Typed> {
        let Some(sig) = self.session.types.function_sig(callee.ty) else {
            let message = format!("a value of type '{}' cannot be called", self.display(callee.ty));
            self.mismatch(message, callee.span);
            self.release_all(&callee.temps)?;
            self.release_nodes(&args)?;
            return Ok(Typed::invalid(span));
        };

        if sig.params.len() != args.len() {
            self.report(CompilationError::ArityMismatch {
                what: "arguments",
                expected: sig.params.len(),
                found: args.len(),
                span,
            });
            self.release_all(&callee.temps)?;
            self.release_nodes(&args)?;
            return Ok(Typed::invalid(span));
        }

        let mut valid = true;
        for (arg, &param) in args.iter_mut().zip(&sig.params) {
            if self.session.types.accepts(param, arg.ty) {
                self.fixate(arg, param)?;
            } else {
                valid = false;
                let message = format!(
                    "argument of type '{}' where '{}' was expected",
                    self.display(arg.ty),
                    self.display(param)
                );
                self.mismatch(message, arg.span);
            }
        }
        if !valid {
            self.release_all(&callee.temps)?;
            self.release_nodes(&args)?;
            return Ok(Typed::invalid(span));
        }

        let deterministic = callee.deterministic
            && args.iter().all(|a| a.deterministic)
            && !self.session.types.is_nondeterministic_function(callee.ty);
        let signature = self.session.types.function(&sig.params, sig.ret, false);
        let value = self.retain_value(sig.ret);
        self.release_all(&callee.temps)?;
        self.release_nodes(&args)?;

        let ty = sig.ret;
        let kind = TypedKind::Call {
            callee: Box::new(callee),
            args,
            signature,
        };
        Ok(Typed::new(kind, ty, span)
            .with_value(value)
            .with_deterministic(deterministic))
    }
}
