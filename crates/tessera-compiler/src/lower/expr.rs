//! Expression lowering.
//!
//! Children are lowered left to right before their parent reads their
//! cells, matching the order in which analysis handed out temporaries.

use tessera_core::InternalError;
use tessera_syntax::BinaryOp;

use crate::asm::{CodeTarget, Instr};
use crate::entities::LiteralId;
use crate::typed::{ForLoop, LeftValue, Typed, TypedKind};

use super::{Lowerer, Result, cells};

impl Lowerer<'_> {
    pub(super) fn expr(&mut self, node: &Typed) -> Result<()> {
        match &node.kind {
            TypedKind::Invalid => Err(InternalError::malformed(format!(
                "invalid node at {:?} reached lowering",
                node.span
            ))),
            TypedKind::Literal(_)
            | TypedKind::Var(_)
            | TypedKind::This
            | TypedKind::Func(_)
            | TypedKind::Meta(_) => Ok(()),
            TypedKind::Break => {
                let target = self.loops.break_label()?;
                self.emit(Instr::Jump(CodeTarget::Label(target)));
                Ok(())
            }
            TypedKind::Continue => {
                let target = self.loops.continue_label()?;
                self.emit(Instr::Jump(CodeTarget::Label(target)));
                Ok(())
            }
            TypedKind::Tuple(elems) => elems.iter().try_for_each(|e| self.expr(e)),
            TypedKind::Array {
                elems,
                len,
                indices,
            } => self.array(node, elems, *len, indices),
            TypedKind::Block { stmts, tail } => {
                for stmt in stmts {
                    self.stmt(stmt)?;
                }
                match tail {
                    Some(tail) => self.expr(tail),
                    None => Ok(()),
                }
            }
            TypedKind::Extern { method, args } => {
                for arg in args {
                    self.expr(arg)?;
                }
                let mut operands = Vec::new();
                for arg in args {
                    operands.extend(self.cells(&arg.value)?);
                }
                operands.extend(self.cells(&node.value)?);
                self.call_extern(&operands, *method);
                Ok(())
            }
            TypedKind::Call {
                callee,
                args,
                signature,
            } => {
                self.expr(callee)?;
                for arg in args {
                    self.expr(arg)?;
                }
                let session = self.session;
                let mut sources = Vec::new();
                for arg in args {
                    sources.extend(self.cells(&arg.value)?);
                }
                let params = self.signatures.args(&session.types, *signature)?;
                self.copy_all(&sources, &params)?;

                let back = self.label();
                let point = self.return_point(&back);
                let ra = self.signatures.ra(*signature);
                self.copy(&point, &ra);
                let target = self.single(&callee.value)?;
                self.emit(Instr::JumpIndirect(target));
                self.emit(Instr::Label(back));

                let results = self.cells(&node.value)?;
                if !results.is_empty() {
                    let ret = self.signatures.ret(&session.types, *signature)?;
                    self.copy_all(&ret, &results)?;
                }
                Ok(())
            }
            TypedKind::Assign {
                target,
                target_args,
                value,
            } => {
                for arg in target_args {
                    self.expr(arg)?;
                }
                self.expr(value)?;
                let sources = self.cells(&value.value)?;
                match *target {
                    LeftValue::Var(var) => {
                        let targets = self.var_cells(var)?;
                        self.copy_all(&sources, &targets)
                    }
                    LeftValue::Setter(method) => {
                        let mut operands = Vec::new();
                        for arg in target_args {
                            operands.extend(self.cells(&arg.value)?);
                        }
                        operands.extend(sources);
                        self.call_extern(&operands, method);
                        Ok(())
                    }
                }
            }
            TypedKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.if_expr(node, cond, then_branch, else_branch.as_deref()),
            TypedKind::While { cond, body } => {
                let top = self.label();
                let end = self.label();
                self.emit(Instr::Label(top.clone()));
                self.expr(cond)?;
                let test = self.single(&cond.value)?;
                self.push(&test);
                self.emit(Instr::JumpIfFalse(CodeTarget::Label(end.clone())));

                self.loops.enter(top.clone(), end.clone());
                self.expr(body)?;
                self.loops.exit()?;
                self.emit(Instr::Jump(CodeTarget::Label(top)));
                self.emit(Instr::Label(end));
                Ok(())
            }
            TypedKind::For(for_loop) => self.for_loop(for_loop),
            TypedKind::ShortCircuit {
                op,
                left,
                right,
                null_test,
            } => {
                self.expr(left)?;
                let result = self.single(&node.value)?;
                let first = self.single(&left.value)?;
                self.copy(&first, &result);

                let end = self.label();
                match op {
                    BinaryOp::LogicalAnd => {
                        self.push(&result);
                        self.emit(Instr::JumpIfFalse(CodeTarget::Label(end.clone())));
                    }
                    BinaryOp::LogicalOr => {
                        let rhs = self.label();
                        self.push(&result);
                        self.emit(Instr::JumpIfFalse(CodeTarget::Label(rhs.clone())));
                        self.emit(Instr::Jump(CodeTarget::Label(end.clone())));
                        self.emit(Instr::Label(rhs));
                    }
                    BinaryOp::Coalesce => {
                        let test = null_test
                            .ok_or_else(|| InternalError::malformed("'??' without a null test"))?;
                        let is_null = self.temp(test.result)?;
                        let operands = [result.clone(), cells::literal(test.null), is_null.clone()];
                        self.call_extern(&operands, test.method);
                        self.push(&is_null);
                        self.emit(Instr::JumpIfFalse(CodeTarget::Label(end.clone())));
                    }
                    other => {
                        return Err(InternalError::malformed(format!(
                            "'{other}' is not a short-circuit operator"
                        )));
                    }
                }

                self.expr(right)?;
                let second = self.single(&right.value)?;
                self.copy(&second, &result);
                self.emit(Instr::Label(end));
                Ok(())
            }
            TypedKind::Return(value) => {
                let current = self
                    .current
                    .ok_or_else(|| InternalError::malformed("'return' outside of a function"))?;
                if let Some(value) = value {
                    self.expr(value)?;
                    let sources = self.cells(&value.value)?;
                    if !sources.is_empty() {
                        let session = self.session;
                        let ret = self.signatures.ret(&session.types, current.signature)?;
                        self.copy_all(&sources, &ret)?;
                    }
                }
                self.emit(Instr::JumpIndirect(cells::func_ra(current.func)));
                Ok(())
            }
        }
    }

    /// Construct the array, then store each element.
    fn array(
        &mut self,
        node: &Typed,
        elems: &[Typed],
        len: LiteralId,
        indices: &[LiteralId],
    ) -> Result<()> {
        for elem in elems {
            self.expr(elem)?;
        }
        let types = &self.session.types;
        let real = cells::real(types, node.ty)?.to_string();
        let elem_ty = types
            .element_type(node.ty)
            .ok_or_else(|| InternalError::malformed("array literal of a non-array type"))?;
        let elem_real = cells::real(types, elem_ty)?.to_string();

        let array = self.single(&node.value)?;
        self.push(&cells::literal(len));
        self.push(&array);
        self.emit(Instr::Extern(format!("{real}.__ctor__SystemInt32__{real}")));

        let set = format!("{real}.__Set__SystemInt32_{elem_real}__SystemVoid");
        for (elem, &index) in elems.iter().zip(indices) {
            let value = self.single(&elem.value)?;
            self.push(&array);
            self.push(&cells::literal(index));
            self.push(&value);
            self.emit(Instr::Extern(set.clone()));
        }
        Ok(())
    }

    /// `if`/`else`: each arm copies its value into the merged result.
    fn if_expr(
        &mut self,
        node: &Typed,
        cond: &Typed,
        then_branch: &Typed,
        else_branch: Option<&Typed>,
    ) -> Result<()> {
        self.expr(cond)?;
        let test = self.single(&cond.value)?;
        let result = self.cells(&node.value)?;
        let end = self.label();

        let Some(else_branch) = else_branch else {
            self.push(&test);
            self.emit(Instr::JumpIfFalse(CodeTarget::Label(end.clone())));
            self.expr(then_branch)?;
            self.emit(Instr::Label(end));
            return Ok(());
        };

        let otherwise = self.label();
        self.push(&test);
        self.emit(Instr::JumpIfFalse(CodeTarget::Label(otherwise.clone())));
        self.expr(then_branch)?;
        self.merge(then_branch, &result)?;
        self.emit(Instr::Jump(CodeTarget::Label(end.clone())));
        self.emit(Instr::Label(otherwise));
        self.expr(else_branch)?;
        self.merge(else_branch, &result)?;
        self.emit(Instr::Label(end));
        Ok(())
    }

    /// Copy an arm's value into the merged result. An arm without a value
    /// leaves through a jump.
    fn merge(&mut self, arm: &Typed, result: &[String]) -> Result<()> {
        if result.is_empty() {
            return Ok(());
        }
        let sources = self.cells(&arm.value)?;
        if sources.is_empty() {
            return Ok(());
        }
        self.copy_all(&sources, result)
    }

    /// Index from zero to the array's length, reading each element into the
    /// binding before the body runs.
    fn for_loop(&mut self, f: &ForLoop) -> Result<()> {
        self.expr(&f.iterable)?;
        let array = self.single(&f.iterable.value)?;
        let index = self.temp(f.index)?;
        let length = self.temp(f.length)?;
        let cond = self.temp(f.cond)?;
        let element = {
            let mut cells = self.var_cells(f.binding)?;
            if cells.len() != 1 {
                return Err(InternalError::malformed("loop binding is not a single cell"));
            }
            cells.remove(0)
        };

        self.copy(&cells::literal(f.zero), &index);
        self.call_extern(&[array.clone(), length.clone()], f.get_length);

        let top = self.label();
        let step = self.label();
        let end = self.label();
        self.emit(Instr::Label(top.clone()));
        self.call_extern(&[index.clone(), length, cond.clone()], f.less);
        self.push(&cond);
        self.emit(Instr::JumpIfFalse(CodeTarget::Label(end.clone())));
        self.call_extern(&[array, index.clone(), element], f.get);

        self.loops.enter(step.clone(), end.clone());
        self.expr(&f.body)?;
        self.loops.exit()?;

        self.emit(Instr::Label(step));
        self.call_extern(&[index.clone(), cells::literal(f.one), index], f.add);
        self.emit(Instr::Jump(CodeTarget::Label(top)));
        self.emit(Instr::Label(end));
        Ok(())
    }
}
