//! Compilation session: owner of every table of one run.
//!
//! The session is threaded explicitly through analysis, lowering and linking.
//! Tables are only mutated while a run is in progress; starting another run
//! requires a fresh session or [`Session::reset`].

use tracing::debug;

use tessera_core::{Diagnostics, QualifierTable, TypeTable};
use tessera_registry::{CatalogBuilder, MethodCatalog, MethodRegistry, RegistrationError};

use crate::entities::{FuncTable, LiteralTable, VarTable};
use crate::pool::TempPool;

/// All state of one compilation run.
#[derive(Debug)]
pub struct Session {
    /// Interned types.
    pub types: TypeTable,
    /// Interned qualifiers and label counters.
    pub qualifiers: QualifierTable,
    /// Host method overloads.
    pub methods: MethodRegistry,
    /// Declared variables.
    pub vars: VarTable,
    /// Analyzed functions.
    pub funcs: FuncTable,
    /// Interned literals.
    pub literals: LiteralTable,
    /// Temporary slots.
    pub pool: TempPool,
    /// Semantic errors in discovery order.
    pub diagnostics: Diagnostics,
}

impl Session {
    /// Create a session whose method table is filled from `catalog`.
    pub fn new(catalog: &dyn MethodCatalog) -> Result<Self, RegistrationError> {
        let mut types = TypeTable::new();
        let mut methods = MethodRegistry::new();
        catalog.register(&mut CatalogBuilder::new(&mut types, &mut methods))?;
        debug!(
            types = types.len(),
            methods = methods.len(),
            "session initialized"
        );

        Ok(Self {
            types,
            qualifiers: QualifierTable::new(),
            methods,
            vars: VarTable::new(),
            funcs: FuncTable::new(),
            literals: LiteralTable::new(),
            pool: TempPool::new(),
            diagnostics: Diagnostics::new(),
        })
    }

    /// Reinitialize every table for another run.
    pub fn reset(&mut self, catalog: &dyn MethodCatalog) -> Result<(), RegistrationError> {
        *self = Self::new(catalog)?;
        Ok(())
    }

    /// Whether the run has recorded semantic errors.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{CompilationError, Span};
    use tessera_registry::StandardCatalog;

    #[test]
    fn new_session_has_catalog_loaded() {
        let session = Session::new(&StandardCatalog).unwrap();
        assert!(!session.methods.is_empty());
        assert!(session.vars.is_empty());
        assert!(!session.has_errors());
    }

    #[test]
    fn reset_discards_run_state() {
        let mut session = Session::new(&StandardCatalog).unwrap();
        session.literals.int(5);
        session.diagnostics.report(CompilationError::UndefinedName {
            name: "x".to_string(),
            span: Span::point(1, 1),
        });

        session.reset(&StandardCatalog).unwrap();
        assert!(session.literals.is_empty());
        assert!(!session.has_errors());
    }
}
