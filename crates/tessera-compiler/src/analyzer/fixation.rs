//! Fixation: pushing a concrete type into a node whose type still contains
//! the placeholder.
//!
//! `null` literals, array and tuple literals, blocks ending in one of those
//! and `if`/`else` over such arms can be fixed. An array literal owns a slot of its own type and
//! keeps its elements' slots alive, so fixing it swaps each of those for a
//! slot of the concrete type.

use tessera_core::{CompilationError, TypeId};

use crate::entities::LiteralValue;
use crate::typed::{Typed, TypedKind, Value};

use super::{Analyzer, Result};

impl Analyzer<'_> {
    /// Fix `node` to `ty` when [`TypeTable::can_fixate`] allows it; a no-op
    /// otherwise.
    ///
    /// [`TypeTable::can_fixate`]: tessera_core::TypeTable::can_fixate
    pub(crate) fn fixate(&mut self, node: &mut Typed, ty: TypeId) -> Result<()> {
        if !self.session.types.can_fixate(node.ty, ty) {
            return Ok(());
        }

        match &mut node.kind {
            TypedKind::Literal(id) => {
                let literal = self.session.literals.get(*id)?;
                if literal.value != LiteralValue::Null {
                    return Ok(());
                }
                let text = literal.text.clone();
                let fixed = self.session.literals.intern(&text, ty, LiteralValue::Null);
                *id = fixed;
                node.value = Value::Literal(fixed);
            }
            TypedKind::Array { elems, .. } => {
                let Some(elem_ty) = self.session.types.element_type(ty) else {
                    return Ok(());
                };
                for elem in elems.iter_mut() {
                    self.fixate(elem, elem_ty)?;
                }
                if let Value::Temp(old) = node.value {
                    self.session.pool.release(old)?;
                }
                node.value = Value::Temp(self.retain(ty));
                let mut temps = node.value.temps();
                temps.extend(elems.iter().flat_map(|e| e.temps.iter().copied()));
                node.temps = temps;
            }
            TypedKind::Tuple(elems) => {
                let Some(targets) = self.session.types.tuple_elems(ty).map(<[TypeId]>::to_vec)
                else {
                    return Ok(());
                };
                if targets.len() != elems.len() {
                    return Ok(());
                }
                for (elem, target) in elems.iter_mut().zip(targets) {
                    self.fixate(elem, target)?;
                }
                node.value = Value::Tuple(elems.iter().map(|e| e.value.clone()).collect());
                node.temps = elems.iter().flat_map(|e| e.temps.iter().copied()).collect();
            }
            TypedKind::Block {
                tail: Some(tail), ..
            } => {
                self.fixate(tail, ty)?;
                node.value = tail.value.clone();
                node.temps = tail.temps.clone();
            }
            TypedKind::If {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => {
                let mut fixed = true;
                for arm in [&mut **then_branch, &mut **else_branch] {
                    if arm.is_invalid() || arm.diverges() {
                        continue;
                    }
                    self.fixate(arm, ty)?;
                    if self.session.types.contains_unknown(arm.ty) {
                        fixed = false;
                        self.report(CompilationError::CannotInfer {
                            name: "if".to_string(),
                            span: arm.span,
                        });
                    }
                }
                if !fixed {
                    return Ok(());
                }

                let mut temps = then_branch.temps.clone();
                for temp in &else_branch.temps {
                    if !temps.contains(temp) {
                        temps.push(*temp);
                    }
                }
                for old in node.value.temps() {
                    if !temps.contains(&old) {
                        self.session.pool.release(old)?;
                    }
                }
                node.value = self.merged_value(ty, then_branch, else_branch);
                for temp in node.value.temps() {
                    if !temps.contains(&temp) {
                        temps.push(temp);
                    }
                }
                node.temps = temps;
            }
            _ => return Ok(()),
        }

        node.ty = ty;
        Ok(())
    }
}
