//! Literal, tuple and array expressions.

use ordered_float::OrderedFloat;

use tessera_core::{CompilationError, ScopeKind, TypeId, TypeTable};
use tessera_syntax::{ArrayExpr, LiteralExpr, LiteralKind, TupleExpr};

use crate::entities::LiteralValue;
use crate::typed::{Typed, TypedKind, Value};

use super::super::{Analyzer, Result};

impl Analyzer<'_> {
    /// Intern a literal. `null` is typed with the placeholder until a
    /// context fixes it.
    pub(crate) fn literal(&mut self, lit: &LiteralExpr<'_>) -> Typed {
        let (ty, value) = match lit.kind {
            LiteralKind::Int(v) => (TypeTable::INT, LiteralValue::Int(v)),
            LiteralKind::Float(v) => (TypeTable::FLOAT, LiteralValue::Float(OrderedFloat(v))),
            LiteralKind::Bool(v) => (TypeTable::BOOL, LiteralValue::Bool(v)),
            LiteralKind::String(s) => (TypeTable::STRING, LiteralValue::String(s.to_string())),
            LiteralKind::Null => (TypeTable::UNKNOWN, LiteralValue::Null),
        };
        let id = self.session.literals.intern(lit.text, ty, value);
        Typed::new(TypedKind::Literal(id), ty, lit.span).with_value(Value::Literal(id))
    }

    /// `(a, b, ..)`: the value is the flattened components.
    pub(crate) fn tuple(&mut self, tuple: &TupleExpr<'_>) -> Result<Typed> {
        self.enter(ScopeKind::Literal);
        let elems = self.exprs(tuple.elems)?;
        self.leave("tuple")?;

        let tys: Vec<TypeId> = elems.iter().map(|e| e.ty).collect();
        let ty = self.session.types.tuple_of(&tys);
        let deterministic = elems.iter().all(|e| e.deterministic);
        let value = Value::Tuple(elems.iter().map(|e| e.value.clone()).collect());
        let temps: Vec<_> = elems.iter().flat_map(|e| e.temps.iter().copied()).collect();

        Ok(Typed::new(TypedKind::Tuple(elems), ty, tuple.span)
            .with_value(value)
            .with_temps(temps)
            .with_deterministic(deterministic))
    }

    /// `[a, b, ..]`.
    ///
    /// The element type is the first concrete element type; every other
    /// element must be accepted by it and is fixed to it. The literal keeps
    /// its elements' slots alive because they are stored only after the
    /// array is constructed.
    pub(crate) fn array(&mut self, array: &ArrayExpr<'_>) -> Result<Typed> {
        self.enter(ScopeKind::Literal);
        let mut elems = self.exprs(array.elems)?;
        self.leave("array")?;

        let types = &self.session.types;
        let elem_ty = elems
            .iter()
            .map(|e| e.ty)
            .find(|&t| !types.contains_unknown(t))
            .or_else(|| elems.first().map(|e| e.ty))
            .unwrap_or(TypeTable::UNKNOWN);

        let mut valid = true;
        for elem in &mut elems {
            if elem.is_invalid() {
                valid = false;
                continue;
            }
            if self.session.types.accepts(elem_ty, elem.ty) {
                self.fixate(elem, elem_ty)?;
            } else {
                valid = false;
                let message = format!(
                    "array element of type '{}' where '{}' was expected",
                    self.display(elem.ty),
                    self.display(elem_ty)
                );
                self.mismatch(message, elem.span);
            }
        }

        let ty = self.session.types.array_of(elem_ty);
        if valid
            && !self.session.types.contains_unknown(elem_ty)
            && self.session.types.real_name(ty).is_none()
        {
            valid = false;
            let message = format!("no runtime array type holds '{}'", self.display(elem_ty));
            self.report(CompilationError::TypeMismatch {
                message,
                span: array.span,
            });
        }
        if !valid {
            self.release_nodes(&elems)?;
            return Ok(Typed::invalid(array.span));
        }

        let len = self.session.literals.int(elems.len() as i64);
        let indices = (0..elems.len())
            .map(|i| self.session.literals.int(i as i64))
            .collect();
        let deterministic = elems.iter().all(|e| e.deterministic);
        let value = self.retain_value(ty);
        let temps: Vec<_> = elems.iter().flat_map(|e| e.temps.iter().copied()).collect();

        let kind = TypedKind::Array {
            elems,
            len,
            indices,
        };
        Ok(Typed::new(kind, ty, array.span)
            .with_value(value)
            .with_temps(temps)
            .with_deterministic(deterministic))
    }
}
