//! `if` expressions.

use tessera_core::{TypeId, TypeTable};
use tessera_syntax::{Expr, IfExpr};

use crate::typed::{Typed, TypedKind, Value};

use super::super::{Analyzer, Result};

impl Analyzer<'_> {
    /// Analyze `if cond { .. } else { .. }`.
    ///
    /// Each arm runs in its own pool region. Temporaries an arm hands out are
    /// force-retained afterwards so the merged value can live in one of them.
    /// When both arms leave their value in the same slot, that slot is the
    /// result and no copy is needed.
    pub(crate) fn if_expr(&mut self, expr: &IfExpr<'_>) -> Result<Typed> {
        let cond = self.condition(expr.cond)?;
        self.release_all(&cond.temps)?;

        let mut then_branch = self.arm(expr.then_branch)?;
        let else_branch = match expr.else_branch {
            Some(arm) => Some(self.arm(arm)?),
            None => None,
        };

        let mut deterministic = cond.deterministic && then_branch.deterministic;
        let Some(mut else_branch) = else_branch else {
            let kind = TypedKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: None,
            };
            return Ok(Typed::new(kind, TypeTable::VOID, expr.span).with_deterministic(deterministic));
        };
        deterministic &= else_branch.deterministic;

        self.force_retain_all(&then_branch.temps);
        self.force_retain_all(&else_branch.temps);
        let ty = self.merge_arm_types(&mut then_branch, &mut else_branch)?;

        let mut arm_temps = then_branch.temps.clone();
        for temp in &else_branch.temps {
            if !arm_temps.contains(temp) {
                arm_temps.push(*temp);
            }
        }
        let value = self.merged_value(ty, &then_branch, &else_branch);

        let kind = TypedKind::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
        };
        Ok(Typed::new(kind, ty, expr.span)
            .with_temps(arm_temps)
            .with_value(value)
            .with_deterministic(deterministic))
    }

    /// Analyze a condition and fix it to `bool`.
    pub(crate) fn condition(&mut self, expr: &Expr<'_>) -> Result<Typed> {
        let mut cond = self.expr(expr)?;
        if cond.is_invalid() {
            return Ok(cond);
        }
        if self.session.types.accepts(TypeTable::BOOL, cond.ty) {
            self.fixate(&mut cond, TypeTable::BOOL)?;
        } else {
            let message = format!("condition must be 'bool', found '{}'", self.display(cond.ty));
            self.mismatch(message, cond.span);
        }
        Ok(cond)
    }

    fn arm(&mut self, expr: &Expr<'_>) -> Result<Typed> {
        let root = self.push_region();
        let node = self.expr(expr)?;
        self.pop_region(root)?;
        Ok(node)
    }

    /// Where the merged value of two arms of type `ty` lives. An arm slot of
    /// the right type is shared; otherwise a fresh slot is retained.
    pub(crate) fn merged_value(&mut self, ty: TypeId, then_branch: &Typed, else_branch: &Typed) -> Value {
        if !self.session.types.is_value_type(ty) || self.session.types.contains_unknown(ty) {
            return Value::None;
        }
        match (&then_branch.value, &else_branch.value) {
            (Value::Temp(a), Value::Temp(b)) if a == b => then_branch.value.clone(),
            (Value::Temp(a), _) if a.ty == ty && !then_branch.diverges() => then_branch.value.clone(),
            _ => self.retain_value(ty),
        }
    }

    /// The common type of two arms. An arm that always jumps away takes the
    /// other arm's type; incompatible arms make the whole expression `void`.
    fn merge_arm_types(&mut self, then_branch: &mut Typed, else_branch: &mut Typed) -> Result<TypeId> {
        let (a, b) = (then_branch.ty, else_branch.ty);
        if then_branch.is_invalid() {
            return Ok(b);
        }
        if else_branch.is_invalid() || a == b {
            return Ok(a);
        }
        match (then_branch.diverges(), else_branch.diverges()) {
            (true, false) => return Ok(b),
            (false, true) => return Ok(a),
            _ => {}
        }

        let types = &self.session.types;
        if types.accepts(a, b) && !types.contains_unknown(a) {
            self.fixate(else_branch, a)?;
            Ok(a)
        } else if types.accepts(b, a) && !types.contains_unknown(b) {
            self.fixate(then_branch, b)?;
            Ok(b)
        } else if types.accepts(a, b) {
            Ok(a)
        } else {
            Ok(TypeTable::VOID)
        }
    }
}
