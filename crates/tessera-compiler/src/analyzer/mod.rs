//! Semantic analysis.
//!
//! The [`Analyzer`] walks a parsed [`Module`] once, depth first, and produces
//! a [`TypedModule`]: every node gets a resolved type, a determinism flag, a
//! value location and the temporaries it owns. Semantic errors are recorded
//! in the session's diagnostics and replaced by [`TypedKind::Invalid`] nodes,
//! so analysis always runs to the end of the module. Only broken compiler
//! invariants abort with an [`InternalError`].
//!
//! ## Layout
//!
//! - [`expr`]: literals, names, aggregates, calls, members, operators, assignment
//! - [`stmt`]: blocks, bindings, conditionals, loops, jumps
//! - [`functions`]: function literals and named function declarations
//! - [`attributes`]: `export`/`sync` validation
//! - [`fixation`]: pushing concrete types into placeholder-typed nodes
//! - [`type_resolver`]: type annotations
//!
//! ## Name resolution
//!
//! A name is looked up at each active qualifier from innermost to outermost:
//! first variables, then types, then the generic roots. The first hit wins.
//! Generic roots are only visible where type arguments can follow, and type
//! annotations never see variables.

mod attributes;
mod expr;
mod fixation;
mod functions;
mod stmt;
mod type_resolver;

use rustc_hash::FxHashMap;
use tracing::debug;

use tessera_core::{
    CompilationError, GenericRoot, InternalError, QualifierId, ScopeKind, Span, TypeId,
    TypeKind,
};
use tessera_registry::{MethodId, MethodKind};
use tessera_syntax::Module;

use crate::entities::VarId;
use crate::overload::{OverloadError, resolve_overload};
use crate::pool::OutValue;
use crate::scope::QualifierStack;
use crate::session::Session;
use crate::typed::{TypedStmt, Value};

type Result<T> = std::result::Result<T, InternalError>;

/// The analyzed form of a module.
#[derive(Debug, Clone)]
pub struct TypedModule {
    /// The module's qualifier.
    pub qualifier: QualifierId,
    /// Top-level statements in source order.
    pub stmts: Vec<TypedStmt>,
}

impl TypedModule {
    /// Whether no top-level statement applies a non-deterministic operation.
    pub fn is_deterministic(&self) -> bool {
        self.stmts.iter().all(TypedStmt::is_deterministic)
    }
}

/// Analyze `module` into `session`.
///
/// Semantic errors land in `session.diagnostics`; the returned tree is only
/// fit for lowering when no errors were recorded.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn analyze_module(session: &mut Session, module: &Module<'_>) -> Result<TypedModule> {
    Analyzer::new(session).module(module)
}

/// What a name resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolved {
    Var(VarId),
    Type(TypeId),
    Root(GenericRoot),
}

/// Where a name occurs; decides which namespaces are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Expression position: variables, then types.
    Value,
    /// Base of a type application: variables, types, generic roots.
    TypeArgument,
    /// Inside a type annotation: types and generic roots only.
    Annotation,
}

/// Per-function analysis state.
#[derive(Debug)]
struct FnContext {
    /// Annotated result type.
    declared_ret: Option<TypeId>,
    /// Types of `return` values seen in the body, with their sites.
    returns: Vec<(TypeId, Span)>,
}

/// Single-pass semantic analyzer.
pub struct Analyzer<'s> {
    session: &'s mut Session,
    scopes: QualifierStack,
    functions: Vec<FnContext>,
    /// Variables pre-declared for named functions, keyed by the name's site.
    hoisted: FxHashMap<Span, VarId>,
    module: QualifierId,
}

impl<'s> Analyzer<'s> {
    /// Create an analyzer over `session`.
    pub fn new(session: &'s mut Session) -> Self {
        Self {
            session,
            scopes: QualifierStack::new(),
            functions: Vec::new(),
            hoisted: FxHashMap::default(),
            module: QualifierId::ROOT,
        }
    }

    /// Analyze a whole module.
    pub fn module(mut self, module: &Module<'_>) -> Result<TypedModule> {
        let qualifier = self.enter(ScopeKind::Module);
        self.module = qualifier;
        debug!(
            module = %self.session.qualifiers.render(qualifier),
            items = module.items().len(),
            "analysis started"
        );

        self.hoist(module.items())?;
        let mut stmts = Vec::with_capacity(module.items().len());
        for item in module.items() {
            let stmt = self.stmt(item)?;
            stmts.push(stmt);
        }
        self.leave("module")?;

        debug!(
            errors = self.session.diagnostics.len(),
            funcs = self.session.funcs.len(),
            "analysis finished"
        );
        Ok(TypedModule { qualifier, stmts })
    }

    // ==========================================================================
    // Scopes and temporaries
    // ==========================================================================

    fn enter(&mut self, kind: ScopeKind) -> QualifierId {
        self.scopes.push(&mut self.session.qualifiers, kind)
    }

    fn leave(&mut self, context: &'static str) -> Result<QualifierId> {
        self.scopes.pop(context)
    }

    fn at_module_level(&self) -> bool {
        self.scopes.current() == self.module
    }

    fn temp_root(&mut self) -> QualifierId {
        self.scopes.temp_root(&mut self.session.qualifiers)
    }

    /// Open a pool region under the active temp root.
    fn push_region(&mut self) -> QualifierId {
        let root = self.temp_root();
        self.session.pool.push_scope(root);
        root
    }

    fn pop_region(&mut self, root: QualifierId) -> Result<()> {
        self.session.pool.pop_scope(root)
    }

    fn retain(&mut self, ty: TypeId) -> OutValue {
        let root = self.temp_root();
        self.session.pool.retain(root, ty)
    }

    /// Retain storage for a value of `ty`: nothing for non-values, one slot
    /// per component for tuples, one slot otherwise.
    fn retain_value(&mut self, ty: TypeId) -> Value {
        if let Some(elems) = self.session.types.tuple_elems(ty) {
            let elems = elems.to_vec();
            return Value::Tuple(elems.into_iter().map(|t| self.retain_value(t)).collect());
        }
        if !self.session.types.is_value_type(ty) || self.session.types.contains_unknown(ty) {
            return Value::None;
        }
        Value::Temp(self.retain(ty))
    }

    fn release_all(&mut self, temps: &[OutValue]) -> Result<()> {
        for &temp in temps {
            self.session.pool.release(temp)?;
        }
        Ok(())
    }

    fn force_retain_all(&mut self, temps: &[OutValue]) {
        for &temp in temps {
            self.session.pool.force_retain(temp);
        }
    }

    // ==========================================================================
    // Diagnostics
    // ==========================================================================

    fn report(&mut self, error: CompilationError) {
        self.session.diagnostics.report(error);
    }

    fn display(&self, ty: TypeId) -> String {
        self.session.types.display(ty)
    }

    fn mismatch(&mut self, message: String, span: Span) {
        self.report(CompilationError::TypeMismatch { message, span });
    }

    /// Report unless the value's type is concrete. Returns whether it was.
    fn require_concrete(&mut self, ty: TypeId, name: &str, span: Span) -> bool {
        if self.session.types.contains_unknown(ty) {
            self.report(CompilationError::CannotInfer {
                name: name.to_string(),
                span,
            });
            return false;
        }
        true
    }

    // ==========================================================================
    // Name resolution
    // ==========================================================================

    fn resolve_name(&self, name: &str, position: Position) -> Option<Resolved> {
        for level in self.scopes.levels() {
            if position != Position::Annotation {
                if let Some(var) = self.session.vars.lookup(level, name) {
                    return Some(Resolved::Var(var));
                }
            }
            if let Some(ty) = self.session.types.lookup(level, name) {
                return Some(Resolved::Type(ty));
            }
            if position != Position::Value && level == QualifierId::ROOT {
                if let Some(root) = GenericRoot::from_name(name) {
                    return Some(Resolved::Root(root));
                }
            }
        }
        None
    }

    /// The meta type of a named type: `qual<N>` for namespaces, `type<T>` otherwise.
    fn meta_type_of(&mut self, ty: TypeId) -> TypeId {
        if self.session.types.get(ty).kind == TypeKind::Namespace {
            self.session.types.qual_of(ty)
        } else {
            self.session.types.type_of(ty)
        }
    }

    // ==========================================================================
    // Method lookup
    // ==========================================================================

    /// Find the overload of `owner.name` that accepts `args`, reporting why
    /// there is none.
    fn resolve_method(
        &mut self,
        owner: TypeId,
        name: &str,
        kind: MethodKind,
        args: &[TypeId],
        span: Span,
    ) -> Option<MethodId> {
        let candidates = self.candidates(owner, name, kind);
        if candidates.is_empty() {
            let owner = self.display(owner);
            self.report(CompilationError::NotDefined {
                owner,
                member: name.to_string(),
                span,
            });
            return None;
        }
        self.pick_overload(&candidates, name, args, span)
    }

    /// Like [`Self::resolve_method`], but a missing or ambiguous overload is
    /// not an error.
    fn find_method(&self, owner: TypeId, name: &str, kind: MethodKind, args: &[TypeId]) -> Option<MethodId> {
        let candidates = self.candidates(owner, name, kind);
        resolve_overload(&self.session.types, &self.session.methods, &candidates, args)
            .ok()
            .map(|found| found.method)
    }

    fn candidates(&self, owner: TypeId, name: &str, kind: MethodKind) -> Vec<MethodId> {
        let types = &self.session.types;
        let methods = &self.session.methods;
        methods
            .candidates(types, owner, name)
            .iter()
            .copied()
            .filter(|&id| {
                let method = methods.get(id);
                method.kind == kind
                    && (kind == MethodKind::Instance || types.accepts(method.owner, owner))
            })
            .collect()
    }

    /// Run overload resolution over a non-empty candidate set.
    fn pick_overload(
        &mut self,
        candidates: &[MethodId],
        name: &str,
        args: &[TypeId],
        span: Span,
    ) -> Option<MethodId> {
        match resolve_overload(&self.session.types, &self.session.methods, candidates, args) {
            Ok(found) => Some(found.method),
            Err(OverloadError::NoViable) => {
                let rendered: Vec<String> = args.iter().map(|&a| self.display(a)).collect();
                self.mismatch(
                    format!(
                        "no overload of '{name}' accepts ({})",
                        rendered.join(", ")
                    ),
                    span,
                );
                None
            }
            Err(OverloadError::Ambiguous(ids)) => {
                let candidates = ids
                    .iter()
                    .map(|&id| self.session.methods.get(id).describe(&self.session.types))
                    .collect::<Vec<_>>()
                    .join(" or ");
                self.report(CompilationError::AmbiguousOverload {
                    name: name.to_string(),
                    candidates,
                    span,
                });
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support;
