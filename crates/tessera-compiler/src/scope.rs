//! The active qualifier stack.
//!
//! Mirrors syntactic nesting during analysis: entering a construct that
//! introduces a namespace pushes the current qualifier extended by a freshly
//! minted label, leaving it pops.

use tracing::trace;

use tessera_core::{InternalError, QualifierId, QualifierTable, ScopeKind, ScopeLabel};

/// Stack of active qualifiers, innermost last.
#[derive(Debug)]
pub struct QualifierStack {
    stack: Vec<QualifierId>,
}

impl QualifierStack {
    /// A stack holding only the root qualifier.
    pub fn new() -> Self {
        Self {
            stack: vec![QualifierId::ROOT],
        }
    }

    /// The active qualifier.
    pub fn current(&self) -> QualifierId {
        self.stack.last().copied().unwrap_or(QualifierId::ROOT)
    }

    /// Enter a construct of `kind`, returning the new active qualifier.
    pub fn push(&mut self, table: &mut QualifierTable, kind: ScopeKind) -> QualifierId {
        let id = table.extend(self.current(), kind);
        trace!(qualifier = %table.render(id), "enter scope");
        self.stack.push(id);
        id
    }

    /// Leave the innermost construct.
    pub fn pop(&mut self, context: &'static str) -> Result<QualifierId, InternalError> {
        if self.stack.len() < 2 {
            return Err(InternalError::ScopeUnderflow { context });
        }
        self.stack
            .pop()
            .ok_or(InternalError::ScopeUnderflow { context })
    }

    /// Active qualifiers from innermost to outermost, ending at the root.
    pub fn levels(&self) -> impl Iterator<Item = QualifierId> + '_ {
        self.stack.iter().rev().copied()
    }

    /// The nearest enclosing label of `kind`.
    pub fn last_scope(&self, table: &QualifierTable, kind: ScopeKind) -> Option<ScopeLabel> {
        table.get(self.current()).last_scope(kind)
    }

    /// The nearest enclosing label whose kind is one of `kinds`.
    pub fn last_scope_of(&self, table: &QualifierTable, kinds: &[ScopeKind]) -> Option<ScopeLabel> {
        table.get(self.current()).last_scope_of(kinds)
    }

    /// The temp root of the active qualifier.
    pub fn temp_root(&self, table: &mut QualifierTable) -> QualifierId {
        table.temp_root(self.current())
    }

    /// Number of active qualifiers including the root.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for QualifierStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_extends_current_qualifier() {
        let mut table = QualifierTable::new();
        let mut stack = QualifierStack::new();
        let m = stack.push(&mut table, ScopeKind::Module);
        let b = stack.push(&mut table, ScopeKind::Block);

        assert_eq!(table.render(b), "m0.b0");
        assert_eq!(stack.current(), b);
        assert_eq!(stack.pop("block").unwrap(), b);
        assert_eq!(stack.current(), m);
    }

    #[test]
    fn identical_constructs_get_distinct_qualifiers() {
        let mut table = QualifierTable::new();
        let mut stack = QualifierStack::new();
        stack.push(&mut table, ScopeKind::Module);
        let first = stack.push(&mut table, ScopeKind::Block);
        stack.pop("block").unwrap();
        let second = stack.push(&mut table, ScopeKind::Block);
        assert_ne!(first, second);
    }

    #[test]
    fn last_scope_finds_nearest_kind() {
        let mut table = QualifierTable::new();
        let mut stack = QualifierStack::new();
        stack.push(&mut table, ScopeKind::Module);
        stack.push(&mut table, ScopeKind::Func);
        stack.push(&mut table, ScopeKind::While);
        stack.push(&mut table, ScopeKind::Block);

        let found = stack
            .last_scope_of(&table, &[ScopeKind::For, ScopeKind::While, ScopeKind::Func])
            .unwrap();
        assert_eq!(found.kind, ScopeKind::While);
        assert!(stack.last_scope(&table, ScopeKind::For).is_none());
        let root = stack.temp_root(&mut table);
        assert_eq!(table.render(root), "m0.f0");
    }

    #[test]
    fn root_cannot_be_popped() {
        let mut stack = QualifierStack::new();
        assert_eq!(
            stack.pop("module"),
            Err(InternalError::ScopeUnderflow { context: "module" })
        );
    }
}
