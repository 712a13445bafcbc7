//! Tessera Compiler
//!
//! Turns a parsed [`Module`](tessera_syntax::Module) into an assembly
//! listing for a stack machine whose operands are named data cells.
//!
//! ## Pipeline
//!
//! - **Analysis**: resolve names, check and fix types, pick overloads and
//!   hand out temporary slots, producing a typed result tree
//! - **Lowering**: walk the typed tree and emit raw instructions and data
//!   declarations
//! - **Linking**: lay out code, patch indirect addresses and drop unused
//!   cells, then write the listing
//!
//! ## Modules
//!
//! - [`analyzer`]: Semantic analysis of a module
//! - [`asm`]: Instructions, linker and listing writer
//! - [`entities`]: Variables, functions and literals declared during a run
//! - [`lower`]: Typed tree to raw instructions
//! - [`overload`]: Overload ranking for host method calls
//! - [`pool`]: Temporary slot allocation
//! - [`scope`]: Scope stack and name lookup
//! - [`session`]: Per-run compilation state
//! - [`typed`]: Typed result tree

pub mod analyzer;
pub mod asm;
pub mod entities;
pub mod lower;
pub mod overload;
pub mod pool;
pub mod scope;
pub mod session;
pub mod typed;

pub use analyzer::{TypedModule, analyze_module};
pub use asm::{LinkError, LinkedProgram, RawProgram, link, write_listing};
pub use lower::{LowerOptions, lower};
pub use session::Session;

// Re-export CompilationError from core for convenience
pub use tessera_core::CompilationError;
