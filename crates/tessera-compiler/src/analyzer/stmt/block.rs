//! Block expressions.

use tessera_core::{ScopeKind, TypeTable};
use tessera_syntax::Block;

use crate::typed::{Typed, TypedKind, Value};

use super::super::{Analyzer, Result};

impl Analyzer<'_> {
    /// Analyze `{ stmts; tail }`.
    ///
    /// The block gets its own qualifier and pool region. The tail's
    /// temporaries are force-retained in the enclosing region so the value
    /// outlives the block.
    pub(crate) fn block(&mut self, block: &Block<'_>) -> Result<Typed> {
        self.enter(ScopeKind::Block);
        let root = self.push_region();
        self.hoist(block.stmts)?;

        let mut deterministic = true;
        let mut stmts = Vec::with_capacity(block.stmts.len());
        for stmt in block.stmts {
            let typed = self.stmt(stmt)?;
            deterministic &= typed.is_deterministic();
            stmts.push(typed);
        }
        let tail = match block.tail {
            Some(expr) => Some(self.expr(expr)?),
            None => None,
        };

        self.pop_region(root)?;
        let (ty, value, temps) = match &tail {
            Some(tail) => (tail.ty, tail.value.clone(), tail.temps.clone()),
            None => (TypeTable::VOID, Value::None, Vec::new()),
        };
        self.force_retain_all(&temps);
        self.leave("block")?;

        deterministic &= tail.as_ref().is_none_or(|t| t.deterministic);
        let kind = TypedKind::Block {
            stmts,
            tail: tail.map(Box::new),
        };
        Ok(Typed::new(kind, ty, block.span)
            .with_value(value)
            .with_temps(temps)
            .with_deterministic(deterministic))
    }
}
