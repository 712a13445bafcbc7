//! Tessera
//!
//! Compiles an expression-oriented scripting language into an assembly
//! listing for a register-less stack machine.
//!
//! Parsing happens outside this crate: hand [`Compiler::compile`] a
//! [`Module`] built by a parser (or by [`AstBuilder`]) together with the
//! catalog of host methods the script may call.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use tessera::{CompileOptions, Compiler};
//! use tessera::registry::StandardCatalog;
//! use tessera::syntax::AstBuilder;
//!
//! let arena = Bump::new();
//! let ast = AstBuilder::new(&arena);
//! let log = ast.method(ast.ident("Debug"), "Log", &[ast.string("hello")]);
//! let module = ast.module(&[ast.stmt(log)]);
//!
//! let result = Compiler::new(CompileOptions::default()).compile(&module, &StandardCatalog);
//! assert!(result.is_success());
//! let listing = result.listing.unwrap();
//! assert!(listing.text.contains("EXTERN, \"UnityEngineDebug.__Log__SystemObject__SystemVoid\""));
//! ```

use thiserror::Error;
use tracing::{debug, warn};

use tessera_compiler::asm::{DataInit, LinkedProgram};
use tessera_compiler::{LowerOptions, Session, analyze_module, link, lower, write_listing};
use tessera_registry::{MethodCatalog, RegistrationError};
use tessera_syntax::Module;

pub use tessera_compiler as compiler;
pub use tessera_registry as registry;
pub use tessera_syntax as syntax;

pub use tessera_core::{CompilationError, InternalError, Span};
pub use tessera_syntax::AstBuilder;

// ============================================================================
// Options
// ============================================================================

/// Compiler configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Exported label of the module's entry routine.
    pub entry_label: String,
    /// Emit `# ...` comments naming the source constructs.
    pub emit_comments: bool,
    /// Spaces per nesting level in the listing.
    pub indent: usize,
}

impl CompileOptions {
    /// Set the entry label.
    pub fn with_entry_label(mut self, label: impl Into<String>) -> Self {
        self.entry_label = label.into();
        self
    }

    /// Turn listing comments on or off.
    pub fn with_comments(mut self, emit: bool) -> Self {
        self.emit_comments = emit;
        self
    }

    /// Set the indentation width.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    fn lower_options(&self) -> LowerOptions {
        LowerOptions {
            entry_label: self.entry_label.clone(),
            emit_comments: self.emit_comments,
        }
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            entry_label: "_start".to_string(),
            emit_comments: false,
            indent: 4,
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// A diagnostic reported by a compilation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A recoverable error in the script.
    #[error(transparent)]
    Semantic(#[from] CompilationError),

    /// The host catalog could not be registered.
    #[error("catalog: {0}")]
    Registration(#[from] RegistrationError),

    /// An implementation invariant was violated; the run was aborted.
    #[error("internal compiler error: {0}")]
    Internal(#[from] InternalError),
}

/// A data cell exported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedCell {
    /// Cell name.
    pub name: String,
    /// Source-level type name.
    pub ty: String,
    /// Initial value text, if the cell starts with a literal.
    pub default: Option<String>,
}

/// The emitted program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Listing text: data section, then code section.
    pub text: String,
    /// Exported cells that survived linking, in data order.
    pub exports: Vec<ExportedCell>,
}

/// Result of compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationResult {
    /// The listing; `None` whenever a diagnostic was reported.
    pub listing: Option<Listing>,
    /// Diagnostics in discovery order.
    pub diagnostics: Vec<CompileError>,
}

impl CompilationResult {
    /// Check if compilation succeeded (no diagnostics).
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn failed(diagnostics: Vec<CompileError>) -> Self {
        Self {
            listing: None,
            diagnostics,
        }
    }
}

// ============================================================================
// Driver
// ============================================================================

/// The main compiler entry point.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a compiler with the given options.
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// The options this compiler runs with.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile a module against a host catalog.
    ///
    /// Every run gets a fresh [`Session`]. Semantic errors do not stop
    /// analysis but suppress the listing; an internal error aborts the run
    /// and is reported after the semantic errors found so far.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&self, module: &Module<'_>, catalog: &dyn MethodCatalog) -> CompilationResult {
        let mut session = match Session::new(catalog) {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "catalog registration failed");
                return CompilationResult::failed(vec![err.into()]);
            }
        };

        match self.run(&mut session, module) {
            Ok(listing) => {
                if session.has_errors() {
                    debug!(errors = session.diagnostics.len(), "compilation failed");
                    return CompilationResult::failed(semantic(&mut session));
                }
                CompilationResult {
                    listing,
                    diagnostics: Vec::new(),
                }
            }
            Err(err) => {
                warn!(error = %err, "compilation aborted");
                let mut diagnostics = semantic(&mut session);
                diagnostics.push(err.into());
                CompilationResult::failed(diagnostics)
            }
        }
    }

    /// Analyze, then lower and link if analysis was clean.
    fn run(&self, session: &mut Session, module: &Module<'_>) -> Result<Option<Listing>, InternalError> {
        let typed = analyze_module(session, module)?;
        if session.has_errors() {
            return Ok(None);
        }
        let raw = lower(session, &typed, &self.options.lower_options())?;
        let linked = link(raw)?;
        let text = write_listing(&linked, self.options.indent);
        debug!(bytes = text.len(), "listing written");
        Ok(Some(Listing {
            text,
            exports: exports(&linked),
        }))
    }
}

fn semantic(session: &mut Session) -> Vec<CompileError> {
    session.diagnostics.take().into_iter().map(CompileError::from).collect()
}

fn exports(program: &LinkedProgram) -> Vec<ExportedCell> {
    program
        .cells
        .iter()
        .filter(|cell| cell.decl.attrs.export)
        .map(|cell| ExportedCell {
            name: cell.decl.name.clone(),
            ty: cell
                .decl
                .declared
                .clone()
                .unwrap_or_else(|| cell.decl.real.clone()),
            default: match &cell.decl.init {
                DataInit::Literal(text) => Some(text.clone()),
                _ => None,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_builders() {
        let options = CompileOptions::default()
            .with_entry_label("_main")
            .with_comments(true)
            .with_indent(2);
        assert_eq!(options.entry_label, "_main");
        assert!(options.emit_comments);
        assert_eq!(options.indent, 2);
        assert_eq!(options.lower_options().entry_label, "_main");
    }

    #[test]
    fn internal_errors_render_as_fatal() {
        let err = CompileError::from(InternalError::malformed("boom"));
        assert_eq!(err.to_string(), "internal compiler error: malformed typed result: boom");
    }
}
