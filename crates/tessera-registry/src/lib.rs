//! Host method catalog and overload table.
//!
//! The analyzer never calls host code; it only needs to know which operations
//! exist. A [`MethodCatalog`] enumerates them into a [`CatalogBuilder`], which
//! declares catalog types in the [`TypeTable`] and records every [`Method`] in
//! the [`MethodRegistry`], grouped by the owner's logical key and the method
//! name.
//!
//! # Example
//!
//! ```
//! use tessera_core::TypeTable;
//! use tessera_registry::{CatalogBuilder, MethodCatalog, MethodRegistry, StandardCatalog};
//!
//! let mut types = TypeTable::new();
//! let mut registry = MethodRegistry::new();
//! StandardCatalog
//!     .register(&mut CatalogBuilder::new(&mut types, &mut registry))
//!     .unwrap();
//!
//! let adds = registry.candidates(&types, TypeTable::INT, "op_Addition");
//! assert_eq!(adds.len(), 1);
//! assert_eq!(
//!     registry.get(adds[0]).extern_name,
//!     "SystemInt32.__op_Addition__SystemInt32_SystemInt32__SystemInt32"
//! );
//! ```

mod catalog;
mod method;
mod registry;
mod standard;

pub use catalog::{CatalogBuilder, MethodBuilder, MethodCatalog};
pub use method::{Method, MethodId, MethodKind, ParamDirection};
pub use registry::{MethodRegistry, RegistrationError};
pub use standard::StandardCatalog;
