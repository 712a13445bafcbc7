//! Operators.
//!
//! Arithmetic, comparison and bitwise operators are host methods named
//! after the operator (`op_Addition`) and declared on either operand's
//! type. `&&`, `||` and `??` evaluate their right operand conditionally and
//! are expanded into jumps instead.

use tessera_core::{CompilationError, InternalError, Span, TypeId, TypeTable};
use tessera_registry::{MethodId, MethodKind};
use tessera_syntax::{BinaryExpr, BinaryOp, UnaryExpr};

use crate::entities::LiteralValue;
use crate::overload::{OverloadError, resolve_overload};
use crate::typed::{NullTest, Typed, TypedKind, Value};

use super::super::{Analyzer, Result};

impl Analyzer<'_> {
    /// `left op right`.
    pub(crate) fn binary(&mut self, expr: &BinaryExpr<'_>) -> Result<Typed> {
        if expr.op.is_short_circuit() {
            return self.short_circuit(expr);
        }

        let left = self.expr(expr.left)?;
        let right = self.expr(expr.right)?;
        let operands = vec![left, right];
        if operands.iter().any(Typed::is_invalid) {
            self.release_nodes(&operands)?;
            return Ok(Typed::invalid(expr.span));
        }

        let Some(name) = expr.op.method_name() else {
            return Err(InternalError::malformed(format!(
                "operator '{}' has no method",
                expr.op
            )));
        };
        let (lty, rty) = (operands[0].ty, operands[1].ty);

        let types = &self.session.types;
        let methods = &self.session.methods;
        let mut candidates: Vec<MethodId> = methods.candidates(types, lty, name).to_vec();
        if !types.logically_equal(lty, rty) {
            for &id in methods.candidates(types, rty, name) {
                if !candidates.contains(&id) {
                    candidates.push(id);
                }
            }
        }
        candidates.retain(|&id| methods.get(id).kind == MethodKind::Static);

        if candidates.is_empty() {
            let owner = self.display(lty);
            self.report(CompilationError::NotDefined {
                owner,
                member: expr.op.as_str().to_string(),
                span: expr.op_span,
            });
            self.release_nodes(&operands)?;
            return Ok(Typed::invalid(expr.span));
        }

        match self.operator_overload(&candidates, expr.op.as_str(), &[lty, rty], expr.op_span) {
            Some(method) => self.extern_call(method, operands, expr.span),
            None => {
                self.release_nodes(&operands)?;
                Ok(Typed::invalid(expr.span))
            }
        }
    }

    /// `-x`, `!x`.
    pub(crate) fn unary(&mut self, expr: &UnaryExpr<'_>) -> Result<Typed> {
        let operand = self.expr(expr.operand)?;
        if operand.is_invalid() {
            return Ok(Typed::invalid(expr.span));
        }

        let ty = operand.ty;
        let name = expr.op.method_name();
        let candidates: Vec<MethodId> = self
            .session
            .methods
            .candidates(&self.session.types, ty, name)
            .to_vec();
        if candidates.is_empty() {
            let owner = self.display(ty);
            self.report(CompilationError::NotDefined {
                owner,
                member: expr.op.as_str().to_string(),
                span: expr.span,
            });
            self.release_all(&operand.temps)?;
            return Ok(Typed::invalid(expr.span));
        }

        match self.operator_overload(&candidates, expr.op.as_str(), &[ty], expr.span) {
            Some(method) => self.extern_call(method, vec![operand], expr.span),
            None => {
                self.release_all(&operand.temps)?;
                Ok(Typed::invalid(expr.span))
            }
        }
    }

    /// Overload resolution with operator-flavoured diagnostics.
    fn operator_overload(
        &mut self,
        candidates: &[MethodId],
        symbol: &str,
        args: &[TypeId],
        span: Span,
    ) -> Option<MethodId> {
        match resolve_overload(&self.session.types, &self.session.methods, candidates, args) {
            Ok(found) => Some(found.method),
            Err(OverloadError::NoViable) => {
                let operands: Vec<String> = args.iter().map(|&a| self.display(a)).collect();
                let message = format!(
                    "operator '{symbol}' cannot be applied to '{}'",
                    operands.join("' and '")
                );
                self.mismatch(message, span);
                None
            }
            Err(OverloadError::Ambiguous(ids)) => {
                let candidates = ids
                    .iter()
                    .map(|&id| self.session.methods.get(id).describe(&self.session.types))
                    .collect::<Vec<_>>()
                    .join(" or ");
                self.report(CompilationError::AmbiguousOverload {
                    name: symbol.to_string(),
                    candidates,
                    span,
                });
                None
            }
        }
    }

    /// `a && b`, `a || b`, `a ?? b`.
    ///
    /// The result lives in `a`'s slot when `a` already produced a slot of
    /// the result type, otherwise in a fresh one. `b` runs in its own pool
    /// region; its slots are force-retained so they stay distinct from the
    /// result while the node is live.
    fn short_circuit(&mut self, expr: &BinaryExpr<'_>) -> Result<Typed> {
        let op = expr.op;
        let mut left = self.expr(expr.left)?;
        if left.is_invalid() {
            let right = self.expr(expr.right)?;
            self.release_all(&right.temps)?;
            return Ok(Typed::invalid(expr.span));
        }

        let (ty, usable) = if op == BinaryOp::Coalesce {
            let concrete = self.require_concrete(left.ty, op.as_str(), expr.op_span);
            (left.ty, concrete)
        } else {
            (TypeTable::BOOL, self.require_bool(&mut left, op)?)
        };
        if !usable {
            self.release_all(&left.temps)?;
            let right = self.expr(expr.right)?;
            self.release_all(&right.temps)?;
            return Ok(Typed::invalid(expr.span));
        }

        let result = match left.value {
            Value::Temp(slot) if slot.ty == ty => slot,
            _ => self.retain(ty),
        };
        let consumed: Vec<_> = left.temps.iter().copied().filter(|t| *t != result).collect();
        self.release_all(&consumed)?;

        let null_test = if op == BinaryOp::Coalesce {
            let any = TypeTable::UNKNOWN;
            let method = self.resolve_method(
                TypeTable::OBJECT,
                "ReferenceEquals",
                MethodKind::Static,
                &[any, any],
                expr.op_span,
            );
            let null = self
                .session
                .literals
                .intern("null", TypeTable::OBJECT, LiteralValue::Null);
            match method {
                Some(method) => Some(NullTest {
                    method,
                    null,
                    result: self.retain(TypeTable::BOOL),
                }),
                None => None,
            }
        } else {
            None
        };

        let root = self.push_region();
        let mut right = self.expr(expr.right)?;
        self.pop_region(root)?;
        self.force_retain_all(&right.temps);

        let mut valid = !right.is_invalid() && (op != BinaryOp::Coalesce || null_test.is_some());
        if valid {
            if op == BinaryOp::Coalesce {
                if self.session.types.accepts(ty, right.ty) {
                    self.fixate(&mut right, ty)?;
                } else {
                    valid = false;
                    let message = format!(
                        "operator '??' cannot combine '{}' and '{}'",
                        self.display(ty),
                        self.display(right.ty)
                    );
                    self.mismatch(message, expr.op_span);
                }
            } else {
                valid = self.require_bool(&mut right, op)?;
            }
        }

        let mut temps = vec![result];
        if let Some(test) = &null_test {
            temps.push(test.result);
        }
        temps.extend(right.temps.iter().copied());
        if !valid {
            self.release_all(&temps)?;
            return Ok(Typed::invalid(expr.span));
        }

        let deterministic = left.deterministic && right.deterministic;
        let kind = TypedKind::ShortCircuit {
            op,
            left: Box::new(left),
            right: Box::new(right),
            null_test,
        };
        Ok(Typed::new(kind, ty, expr.span)
            .with_value(Value::Temp(result))
            .with_temps(temps)
            .with_deterministic(deterministic))
    }

    /// Fix an operand of `&&`/`||` to `bool`, reporting anything else.
    fn require_bool(&mut self, operand: &mut Typed, op: BinaryOp) -> Result<bool> {
        if self.session.types.accepts(TypeTable::BOOL, operand.ty) {
            self.fixate(operand, TypeTable::BOOL)?;
            return Ok(true);
        }
        let message = format!(
            "operator '{}' requires 'bool' operands, found '{}'",
            op.as_str(),
            self.display(operand.ty)
        );
        self.mismatch(message, operand.span);
        Ok(false)
    }
}
