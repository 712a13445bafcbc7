//! Core types for the tessera compiler.
//!
//! This crate holds everything the later phases share and that depends on
//! nothing else: source positions, the error taxonomy, signature hashing,
//! the qualifier tables and the structural type system.
//!
//! ## Modules
//!
//! - [`span`]: source positions
//! - [`error`]: semantic and internal errors, the diagnostics sink
//! - [`hash`]: deterministic signature hashes
//! - [`qualifier`]: scope labels, qualifier paths and their interning table
//! - [`types`]: interned types, assignability, logical equality, fixation

pub mod error;
pub mod hash;
pub mod qualifier;
pub mod span;
pub mod types;

pub use error::{CompilationError, Diagnostics, InternalError};
pub use hash::SignatureHash;
pub use qualifier::{Qualifier, QualifierId, QualifierTable, ScopeKind, ScopeLabel};
pub use span::Span;
pub use types::{
    FunctionSig, GenericRoot, LogicalKey, Type, TypeError, TypeId, TypeKind, TypeTable,
};
