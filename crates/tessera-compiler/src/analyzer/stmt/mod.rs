//! Statement and control-flow analysis.
//!
//! Statements release the temporaries of their expressions as soon as the
//! statement ends; only a block's tail value survives the block.

mod block;
mod conditional;
mod jumps;
mod let_stmt;
mod loops;

use tessera_core::{CompilationError, TypeId, TypeTable};
use tessera_syntax::Stmt;

use crate::entities::{VarDecl, VarFlags, VarId};
use crate::typed::{TypedKind, TypedStmt};

use super::{Analyzer, Result};

impl Analyzer<'_> {
    pub(crate) fn stmt(&mut self, stmt: &Stmt<'_>) -> Result<TypedStmt> {
        match stmt {
            Stmt::Let(binding) => self.let_stmt(binding),
            Stmt::Fn(decl) => self.fn_decl(decl),
            Stmt::Expr(expr) => {
                let node = self.expr(expr)?;
                if matches!(
                    node.kind,
                    TypedKind::Literal(_) | TypedKind::Array { .. } | TypedKind::Tuple(_)
                ) {
                    self.require_concrete(node.ty, expr.kind_name(), node.span);
                }
                self.release_all(&node.temps)?;
                Ok(TypedStmt::Expr(node))
            }
        }
    }

    /// Declare the variables of the named functions in `stmts` so bodies
    /// earlier in the same scope can call them.
    pub(crate) fn hoist(&mut self, stmts: &[Stmt<'_>]) -> Result<()> {
        for stmt in stmts {
            let Stmt::Fn(decl) = stmt else {
                continue;
            };
            let (params, ret) = self.annotated_signature(decl.func)?;
            let ret = ret.unwrap_or(TypeTable::VOID);
            let ty = self.session.types.function(&params, ret, decl.func.det);
            let qualifier = self.scopes.current();
            if let Some(var) = self.declare_var(VarDecl {
                qualifier,
                name: decl.name.name.to_string(),
                ty,
                flags: VarFlags::empty(),
                sync: None,
                default: None,
                span: decl.name.span,
            }) {
                self.hoisted.insert(decl.name.span, var);
            }
        }
        Ok(())
    }

    /// Declare a variable, reporting reserved names and redeclarations.
    pub(crate) fn declare_var(&mut self, decl: VarDecl) -> Option<VarId> {
        let (name, span) = (decl.name.clone(), decl.span);
        let declared = if name.starts_with("__") {
            None
        } else {
            self.session.vars.declare(decl)
        };
        if declared.is_none() {
            self.report(CompilationError::ConflictingDeclaration { name, span });
        }
        declared
    }

    /// Whether `var` can be written.
    pub(crate) fn is_mutable(&self, var: VarId) -> bool {
        self.session.vars.get(var).is_ok_and(|v| v.is_mutable())
    }

    /// The type a variable was declared with.
    pub(crate) fn type_of_var(&self, var: VarId) -> TypeId {
        self.session
            .vars
            .get(var)
            .map(|v| v.ty)
            .unwrap_or(TypeTable::UNKNOWN)
    }
}
