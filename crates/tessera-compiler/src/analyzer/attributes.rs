//! Declaration attributes.
//!
//! `export` and `sync(mode)` are only meaningful on module-level
//! declarations. `sync` replicates a variable's value to other clients, so it
//! needs a mutable binding and never applies to functions. The
//! numeric requirement of interpolating modes is checked by the binding once
//! its type is known.

use tessera_core::CompilationError;
use tessera_syntax::{AttrKind, Attribute, SyncMode};

use super::Analyzer;

/// Attributes that survived validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AttrSet {
    pub export: bool,
    pub sync: Option<SyncMode>,
}

/// The declaration an attribute list is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttrTarget {
    Binding { mutable: bool },
    Function,
}

impl Analyzer<'_> {
    pub(crate) fn check_attrs(
        &mut self,
        attrs: &[Attribute],
        at_module: bool,
        target: AttrTarget,
    ) -> AttrSet {
        let mut set = AttrSet::default();
        let mut seen: Vec<&'static str> = Vec::with_capacity(attrs.len());

        for attr in attrs {
            let name = attr.kind.name();
            let problem = if !at_module {
                Some(format!("'{name}' is only allowed on module-level declarations"))
            } else if seen.contains(&name) {
                Some(format!("duplicate attribute '{name}'"))
            } else {
                seen.push(name);
                match (attr.kind, target) {
                    (AttrKind::Export, _) => {
                        set.export = true;
                        None
                    }
                    (AttrKind::Sync(_), AttrTarget::Function) => {
                        Some("'sync' cannot be applied to a function".to_string())
                    }
                    (AttrKind::Sync(_), AttrTarget::Binding { mutable: false }) => {
                        Some("'sync' requires a mutable binding".to_string())
                    }
                    (AttrKind::Sync(mode), AttrTarget::Binding { mutable: true }) => {
                        set.sync = Some(mode);
                        None
                    }
                }
            };

            if let Some(message) = problem {
                self.report(CompilationError::InvalidAttribute {
                    message,
                    span: attr.span,
                });
            }
        }
        set
    }
}
