//! Fixtures shared by analyzer and lowering tests.

use tessera_core::{CompilationError, QualifierId};
use tessera_registry::StandardCatalog;
use tessera_syntax::Module;

use crate::entities::{Var, VarId};
use crate::session::Session;

use super::{TypedModule, analyze_module};

/// A fresh session over the standard catalog.
pub(crate) fn session() -> Session {
    Session::new(&StandardCatalog).expect("standard catalog registers")
}

/// Analyze `module` in a fresh session.
pub(crate) fn analyze(module: &Module<'_>) -> (Session, TypedModule) {
    let mut session = session();
    let typed = analyze_module(&mut session, module).expect("no internal error");
    (session, typed)
}

/// Analyze `module`, failing the test on any diagnostic.
pub(crate) fn analyze_clean(module: &Module<'_>) -> (Session, TypedModule) {
    let (session, typed) = analyze(module);
    assert!(
        !session.has_errors(),
        "unexpected diagnostics: {:?}",
        session.diagnostics.errors()
    );
    (session, typed)
}

/// The diagnostics of a run.
pub(crate) fn errors(session: &Session) -> &[CompilationError] {
    session.diagnostics.errors()
}

/// The variable `name` declared directly in `qualifier`.
pub(crate) fn var<'s>(session: &'s Session, qualifier: QualifierId, name: &str) -> &'s Var {
    let id: VarId = session
        .vars
        .lookup(qualifier, name)
        .unwrap_or_else(|| panic!("variable '{name}' is not declared"));
    session.vars.get(id).expect("declared variable exists")
}
