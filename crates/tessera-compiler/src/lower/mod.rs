//! Lowering: typed result tree to raw instructions.
//!
//! The target machine has a stack of data-cell addresses and no registers.
//! Host methods pop their inputs and outputs as addresses, so every value
//! the code touches lives in a named cell (see [`cells`] for the naming).
//!
//! ## Layout
//!
//! ```text
//! .export _start
//! _start:                 module statements, in source order
//!     JUMP, 0xFFFFFFFC
//! [.export name / name:]  exported functions: fake a halting return, jump to body
//! __fn_N_entry:           copy signature arguments into parameters, save return address
//! __fn_N_body:            body, result into the signature's result cell
//!     JUMP_INDIRECT, __fn_N_ra
//! ```
//!
//! ## Calls
//!
//! A call through a function value copies its arguments into the cells of
//! the callee's signature, stores the address of the instruction after the
//! jump in the signature's return-address cell and jumps through the cell
//! holding the callee's entry offset. Functions of one signature share these
//! cells, so the convention is not reentrant.

mod cells;
mod expr;
mod jumps;

use tracing::debug;

use tessera_core::{InternalError, QualifierId, TypeId};
use tessera_registry::MethodId;

use crate::analyzer::TypedModule;
use crate::asm::{CodeTarget, Instr, RawProgram};
use crate::entities::{Func, FuncId, VarId};
use crate::pool::OutValue;
use crate::session::Session;
use crate::typed::{TypedStmt, Value};

use cells::SignatureCells;
use jumps::LoopStack;

type Result<T> = std::result::Result<T, InternalError>;

/// Lowering configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowerOptions {
    /// Exported label of the module's entry routine.
    pub entry_label: String,
    /// Emit `# ...` comments naming the source constructs.
    pub emit_comments: bool,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            entry_label: "_start".to_string(),
            emit_comments: false,
        }
    }
}

/// Lower an analyzed module.
///
/// `module` must come from a run that recorded no semantic errors: an
/// [`Invalid`](crate::typed::TypedKind::Invalid) node is an internal error.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn lower(session: &Session, module: &TypedModule, options: &LowerOptions) -> Result<RawProgram> {
    let program = Lowerer::new(session, module.qualifier, options).run(module)?;
    debug!(
        data = program.data.len(),
        code = program.code.len(),
        "lowered module"
    );
    Ok(program)
}

/// The function whose body is being lowered.
#[derive(Debug, Clone, Copy)]
struct Current {
    func: FuncId,
    signature: TypeId,
}

/// Instruction builder for one module.
struct Lowerer<'s> {
    session: &'s Session,
    module: QualifierId,
    options: &'s LowerOptions,
    code: Vec<Instr>,
    loops: LoopStack,
    signatures: SignatureCells,
    /// Return-point cells and the labels they hold.
    returns: Vec<(String, String)>,
    labels: u32,
    current: Option<Current>,
}

impl<'s> Lowerer<'s> {
    fn new(session: &'s Session, module: QualifierId, options: &'s LowerOptions) -> Self {
        Self {
            session,
            module,
            options,
            code: Vec::new(),
            loops: LoopStack::default(),
            signatures: SignatureCells::default(),
            returns: Vec::new(),
            labels: 0,
            current: None,
        }
    }

    fn run(mut self, module: &TypedModule) -> Result<RawProgram> {
        let entry = self.options.entry_label.clone();
        self.emit(Instr::Export(entry.clone()));
        self.emit(Instr::Label(entry));
        for stmt in &module.stmts {
            self.stmt(stmt)?;
        }
        self.emit(Instr::Jump(CodeTarget::HALT));

        let session = self.session;
        for func in session.funcs.iter() {
            self.function(func)?;
        }
        if self.loops.depth() != 0 {
            return Err(InternalError::malformed("loop left open after lowering"));
        }

        let data = cells::data_section(session, self.module, &self.signatures, &self.returns)?;
        Ok(RawProgram {
            data,
            code: self.code,
        })
    }

    // ==========================================================================
    // Statements and functions
    // ==========================================================================

    fn stmt(&mut self, stmt: &TypedStmt) -> Result<()> {
        match stmt {
            TypedStmt::Let { in_data: true, .. } | TypedStmt::Fn(_) => Ok(()),
            TypedStmt::Let { vars, init, .. } => {
                if self.options.emit_comments {
                    let session = self.session;
                    let names = vars
                        .iter()
                        .map(|&v| Ok(session.vars.get(v)?.name.as_str()))
                        .collect::<Result<Vec<_>>>()?;
                    self.emit(Instr::Comment(format!("let {}", names.join(", "))));
                }
                self.expr(init)?;
                if vars.is_empty() {
                    return Ok(());
                }
                let mut targets = Vec::new();
                for &var in vars {
                    targets.extend(self.var_cells(var)?);
                }
                let sources = self.cells(&init.value)?;
                self.copy_all(&sources, &targets)
            }
            TypedStmt::Expr(expr) => self.expr(expr),
        }
    }

    fn function(&mut self, func: &Func) -> Result<()> {
        let id = func.index;
        let session = self.session;
        let types = &session.types;
        let ra = cells::func_ra(id);

        if self.options.emit_comments {
            let name = func.name.as_deref().unwrap_or("<anonymous>");
            self.emit(Instr::Comment(format!("fn {name} at {:?}", func.span)));
        }
        if func.export {
            let name = func
                .name
                .clone()
                .ok_or_else(|| InternalError::malformed("exported function without a name"))?;
            self.emit(Instr::Export(name.clone()));
            self.emit(Instr::Label(name));
            self.copy(cells::HALT, &ra);
            self.emit(Instr::Jump(CodeTarget::Label(cells::func_body(id))));
        }

        self.emit(Instr::Label(cells::func_entry(id)));
        let args = self.signatures.args(types, func.signature)?;
        let mut params = Vec::new();
        for &param in &func.params {
            params.extend(self.var_cells(param)?);
        }
        self.copy_all(&args, &params)?;
        let caller_ra = self.signatures.ra(func.signature);
        self.copy(&caller_ra, &ra);

        self.emit(Instr::Label(cells::func_body(id)));
        self.current = Some(Current {
            func: id,
            signature: func.signature,
        });
        self.expr(&func.body)?;
        let result = self.signatures.ret(types, func.signature)?;
        if !result.is_empty() {
            let value = self.cells(&func.body.value)?;
            if !value.is_empty() {
                self.copy_all(&value, &result)?;
            }
        }
        self.current = None;
        self.emit(Instr::JumpIndirect(ra));
        Ok(())
    }

    // ==========================================================================
    // Emission helpers
    // ==========================================================================

    fn emit(&mut self, instr: Instr) {
        self.code.push(instr);
    }

    fn label(&mut self) -> String {
        let label = format!("__L{}", self.labels);
        self.labels += 1;
        label
    }

    /// A return-point cell holding the offset of `label`.
    fn return_point(&mut self, label: &str) -> String {
        let cell = format!("__ret_{}", self.returns.len());
        self.returns.push((cell.clone(), label.to_string()));
        cell
    }

    fn push(&mut self, cell: &str) {
        self.emit(Instr::Push(cell.to_string()));
    }

    /// `PUSH src, PUSH dst, COPY`; nothing when they are the same cell.
    fn copy(&mut self, src: &str, dst: &str) {
        if src == dst {
            return;
        }
        self.push(src);
        self.push(dst);
        self.emit(Instr::Copy);
    }

    fn copy_all(&mut self, sources: &[String], targets: &[String]) -> Result<()> {
        if sources.len() != targets.len() {
            return Err(InternalError::malformed(format!(
                "copying {} cells into {}",
                sources.len(),
                targets.len()
            )));
        }
        for (src, dst) in sources.iter().zip(targets) {
            self.copy(src, dst);
        }
        Ok(())
    }

    /// Push every cell, then call the host method.
    fn call_extern(&mut self, operands: &[String], method: MethodId) {
        for cell in operands {
            self.push(cell);
        }
        let name = self.session.methods.get(method).extern_name.clone();
        self.emit(Instr::Extern(name));
    }

    // ==========================================================================
    // Cells
    // ==========================================================================

    fn var_cells(&self, var: VarId) -> Result<Vec<String>> {
        let var = self.session.vars.get(var)?;
        let base = cells::var_base(var, self.module);
        Ok(cells::flatten(&self.session.types, &base, var.ty)
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    fn temp(&self, value: OutValue) -> Result<String> {
        cells::temp(self.session, value)
    }

    /// The cells holding `value`, flattened.
    fn cells(&self, value: &Value) -> Result<Vec<String>> {
        Ok(match value {
            Value::None => Vec::new(),
            Value::Var(var) => self.var_cells(*var)?,
            Value::Literal(id) => vec![cells::literal(*id)],
            Value::Temp(slot) => vec![self.temp(*slot)?],
            Value::Func(id) => vec![cells::func(*id)],
            Value::This => vec![cells::THIS.to_string()],
            Value::Tuple(parts) => {
                let mut out = Vec::new();
                for part in parts {
                    out.extend(self.cells(part)?);
                }
                out
            }
        })
    }

    /// The one cell holding a non-tuple value.
    fn single(&self, value: &Value) -> Result<String> {
        let mut cells = self.cells(value)?;
        if cells.len() != 1 {
            return Err(InternalError::malformed(format!(
                "expected one cell, found {}",
                cells.len()
            )));
        }
        Ok(cells.remove(0))
    }
}

#[cfg(test)]
mod tests;
