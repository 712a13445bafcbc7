//! Type annotations.

use tessera_core::{
    CompilationError, GenericRoot, ScopeKind, Span, TypeError, TypeId, TypeKind, TypeTable,
};
use tessera_syntax::{FnExpr, TypeExpr};

use super::{Analyzer, Position, Resolved, Result};

impl Analyzer<'_> {
    /// Resolve an annotation. Errors are reported and yield the placeholder.
    pub(crate) fn resolve_type(&mut self, expr: &TypeExpr<'_>) -> Result<TypeId> {
        self.enter(ScopeKind::Type);
        let ty = self.type_expr(expr);
        self.leave("type annotation")?;
        Ok(ty)
    }

    /// Parameter types and the annotated result of a function literal.
    pub(crate) fn annotated_signature(
        &mut self,
        func: &FnExpr<'_>,
    ) -> Result<(Vec<TypeId>, Option<TypeId>)> {
        let mut params = Vec::with_capacity(func.params.len());
        for param in func.params {
            params.push(self.resolve_type(&param.ty)?);
        }
        let ret = match &func.ret {
            Some(ret) => Some(self.resolve_type(ret)?),
            None => None,
        };
        Ok((params, ret))
    }

    fn type_expr(&mut self, expr: &TypeExpr<'_>) -> TypeId {
        match expr {
            TypeExpr::Named { name, args, span } => {
                let args: Vec<TypeId> = args.iter().map(|a| self.type_expr(a)).collect();
                match self.resolve_name(name.name, Position::Annotation) {
                    Some(Resolved::Type(ty)) if !args.is_empty() => {
                        let message = format!("'{}' is not generic", self.display(ty));
                        self.mismatch(message, *span);
                        TypeTable::UNKNOWN
                    }
                    Some(Resolved::Type(ty)) if self.session.types.get(ty).kind == TypeKind::Namespace => {
                        let message = format!("'{}' is a namespace, not a type", name.name);
                        self.mismatch(message, *span);
                        TypeTable::UNKNOWN
                    }
                    Some(Resolved::Type(ty)) => ty,
                    Some(Resolved::Root(root)) => self.specialize(root, &args, *span),
                    Some(Resolved::Var(_)) | None => {
                        self.report(CompilationError::UndefinedName {
                            name: name.name.to_string(),
                            span: name.span,
                        });
                        TypeTable::UNKNOWN
                    }
                }
            }
            TypeExpr::Tuple { elems, .. } => {
                let elems: Vec<TypeId> = elems.iter().map(|e| self.type_expr(e)).collect();
                self.session.types.tuple_of(&elems)
            }
            TypeExpr::Func {
                det, params, ret, ..
            } => {
                let params: Vec<TypeId> = params.iter().map(|p| self.type_expr(p)).collect();
                let ret = match ret {
                    Some(ret) => self.type_expr(ret),
                    None => TypeTable::VOID,
                };
                self.session.types.function(&params, ret, *det)
            }
        }
    }

    /// Apply arguments to a generic root, reporting arity problems.
    pub(crate) fn specialize(&mut self, root: GenericRoot, args: &[TypeId], span: Span) -> TypeId {
        match self.session.types.specialize(root, args) {
            Ok(ty) => ty,
            Err(TypeError::Arity {
                expected, found, ..
            }) => {
                self.report(CompilationError::ArityMismatch {
                    what: "type arguments",
                    expected,
                    found,
                    span,
                });
                TypeTable::UNKNOWN
            }
            Err(err @ TypeError::ParameterList { .. }) => {
                self.mismatch(err.to_string(), span);
                TypeTable::UNKNOWN
            }
        }
    }
}
