//! `let` bindings.

use tessera_core::{CompilationError, ScopeKind, TypeId, TypeTable};
use tessera_syntax::{Ident, LetStmt, Pattern};

use crate::analyzer::attributes::AttrTarget;
use crate::entities::{VarDecl, VarFlags};
use crate::typed::{TypedKind, TypedStmt};

use super::super::{Analyzer, Result};

impl Analyzer<'_> {
    /// Analyze a binding.
    ///
    /// The initializer is analyzed before the names are declared, so it can
    /// not see them. A module-level single-name binding of a literal is
    /// initialized by the data section instead of by code.
    pub(crate) fn let_stmt(&mut self, stmt: &LetStmt<'_>) -> Result<TypedStmt> {
        let at_module = self.at_module_level();
        let attrs = self.check_attrs(
            stmt.attrs,
            at_module,
            AttrTarget::Binding {
                mutable: stmt.mutable,
            },
        );
        let declared = match &stmt.ty {
            Some(ty) => Some(self.resolve_type(ty)?),
            None => None,
        };

        self.enter(ScopeKind::Let);
        let mut init = self.expr(stmt.init)?;
        self.leave("let")?;

        if let Some(declared) = declared
            && !init.is_invalid()
        {
            if self.session.types.accepts(declared, init.ty) {
                self.fixate(&mut init, declared)?;
            } else {
                let message = format!(
                    "cannot initialize a binding of type '{}' with a value of type '{}'",
                    self.display(declared),
                    self.display(init.ty)
                );
                self.mismatch(message, init.span);
            }
        }
        if init.meta().is_some() {
            let message = format!("'{}' is not a value", self.display(init.ty));
            self.mismatch(message, init.span);
        }

        let ty = declared.unwrap_or(init.ty);
        let bindings = self.bind_pattern(&stmt.pattern, ty, init.is_invalid());

        if let Some(mode) = attrs.sync
            && mode.interpolates()
            && !self.session.types.is_numeric(ty)
        {
            let message = format!(
                "'sync({})' requires a numeric type, found '{}'",
                mode.as_str(),
                self.display(ty)
            );
            self.report(CompilationError::InvalidAttribute {
                message,
                span: stmt.span,
            });
        }

        let default = match init.kind {
            TypedKind::Literal(id)
                if at_module
                    && matches!(stmt.pattern, Pattern::Name(_))
                    && !self.session.types.contains_unknown(init.ty) =>
            {
                Some(id)
            }
            _ => None,
        };

        let mut flags = VarFlags::empty();
        if stmt.mutable {
            flags |= VarFlags::MUTABLE;
        }
        if attrs.export {
            flags |= VarFlags::EXPORT;
        }

        let qualifier = self.scopes.current();
        let mut vars = Vec::with_capacity(bindings.len());
        for (ident, ty) in bindings {
            if !init.is_invalid() {
                self.require_concrete(ty, ident.name, ident.span);
            }
            let declared = self.declare_var(VarDecl {
                qualifier,
                name: ident.name.to_string(),
                ty,
                flags,
                sync: attrs.sync,
                default,
                span: ident.span,
            });
            vars.extend(declared);
        }

        self.release_all(&init.temps)?;
        Ok(TypedStmt::Let {
            vars,
            init,
            in_data: default.is_some(),
        })
    }

    /// Pair the pattern's names with their component types.
    ///
    /// A failed destructuring binds nothing, except after an invalid
    /// initializer where every name is bound to the placeholder so later
    /// uses do not cascade.
    fn bind_pattern<'a>(
        &mut self,
        pattern: &Pattern<'a>,
        ty: TypeId,
        init_invalid: bool,
    ) -> Vec<(Ident<'a>, TypeId)> {
        let names = match pattern {
            Pattern::Name(ident) => return vec![(*ident, ty)],
            Pattern::Tuple(names, _) => *names,
        };
        if init_invalid {
            return names.iter().map(|&n| (n, TypeTable::UNKNOWN)).collect();
        }

        let Some(elems) = self.session.types.tuple_elems(ty).map(<[TypeId]>::to_vec) else {
            let message = format!("cannot destructure a value of type '{}'", self.display(ty));
            self.mismatch(message, pattern.span());
            return Vec::new();
        };
        if elems.len() != names.len() {
            self.report(CompilationError::ArityMismatch {
                what: "names",
                expected: elems.len(),
                found: names.len(),
                span: pattern.span(),
            });
            return Vec::new();
        }
        names.iter().copied().zip(elems).collect()
    }
}
