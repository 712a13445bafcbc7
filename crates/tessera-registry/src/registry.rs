//! MethodRegistry - the global overload table.
//!
//! # Storage Model
//!
//! - **Methods**: stored once in a `Vec`, addressed by [`MethodId`].
//! - **Groups**: `(LogicalKey, name) -> [MethodId]`. Lookups go through the
//!   owner's logical key, so every specialization of a generic family shares
//!   one group and instance candidates are narrowed later by their receiver.
//! - **Signatures**: `SignatureHash -> MethodId`, rejecting duplicate overloads.
//!
//! The registry is filled once per session from a catalog and is read-only
//! during analysis.

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::trace;

use tessera_core::{LogicalKey, SignatureHash, TypeId, TypeTable};

use crate::{Method, MethodId, MethodKind};

/// Errors raised while filling the registry from a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// An overload with the same owner, name and parameters already exists.
    #[error("duplicate registration: {signature}")]
    DuplicateMethod {
        /// Rendered signature.
        signature: String,
    },

    /// Directions and parameters disagree in length.
    #[error("'{name}': {params} parameter(s) but {directions} direction(s)")]
    DirectionCount {
        /// Method name.
        name: String,
        /// Number of parameters.
        params: usize,
        /// Number of directions.
        directions: usize,
    },

    /// An instance method was declared without a receiver parameter.
    #[error("instance method '{name}' has no receiver parameter")]
    MissingReceiver {
        /// Method name.
        name: String,
    },

    /// A type name referenced by the catalog was not declared.
    #[error("type not found: {0}")]
    TypeNotFound(String),
}

/// Overload table of host methods.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: Vec<Method>,
    groups: FxHashMap<(LogicalKey, String), Vec<MethodId>>,
    signatures: FxHashMap<SignatureHash, MethodId>,
}

impl MethodRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a method.
    pub fn register(
        &mut self,
        types: &TypeTable,
        method: Method,
    ) -> Result<MethodId, RegistrationError> {
        if method.params.len() != method.directions.len() {
            return Err(RegistrationError::DirectionCount {
                name: method.name.clone(),
                params: method.params.len(),
                directions: method.directions.len(),
            });
        }
        if method.kind == MethodKind::Instance && method.params.is_empty() {
            return Err(RegistrationError::MissingReceiver {
                name: method.name.clone(),
            });
        }

        let hash = method.signature_hash(types);
        if self.signatures.contains_key(&hash) {
            return Err(RegistrationError::DuplicateMethod {
                signature: method.describe(types),
            });
        }

        let id = MethodId(self.methods.len() as u32);
        trace!(method = %method.describe(types), extern_name = %method.extern_name, "registered method");
        self.signatures.insert(hash, id);
        self.groups
            .entry((types.logical_key(method.owner), method.name.clone()))
            .or_default()
            .push(id);
        self.methods.push(method);
        Ok(id)
    }

    /// All overloads of `name` on types logically equal to `owner`.
    pub fn candidates(&self, types: &TypeTable, owner: TypeId, name: &str) -> &[MethodId] {
        self.groups
            .get(&(types.logical_key(owner), name.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any overload of `name` exists on `owner`'s family.
    pub fn has_member(&self, types: &TypeTable, owner: TypeId, name: &str) -> bool {
        !self.candidates(types, owner, name).is_empty()
    }

    /// Get a method by id.
    pub fn get(&self, id: MethodId) -> &Method {
        &self.methods[id.0 as usize]
    }

    /// Iterate all methods in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (MethodId, &Method)> {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, m)| (MethodId(i as u32), m))
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParamDirection;

    fn method(owner: TypeId, name: &str, params: &[TypeId], out: TypeId) -> Method {
        Method {
            owner,
            name: name.to_string(),
            kind: MethodKind::Static,
            params: params.to_vec(),
            directions: vec![ParamDirection::In; params.len()],
            outputs: vec![out],
            extern_name: format!("Test.__{name}"),
            deterministic: true,
        }
    }

    #[test]
    fn groups_by_logical_key_and_name() {
        let mut types = TypeTable::new();
        let mut registry = MethodRegistry::new();
        let arr_int = types.array_of(TypeTable::INT);
        let arr_str = types.array_of(TypeTable::STRING);

        let mut get_int = method(arr_int, "Get", &[arr_int, TypeTable::INT], TypeTable::INT);
        get_int.kind = MethodKind::Instance;
        let mut get_str = method(arr_str, "Get", &[arr_str, TypeTable::INT], TypeTable::STRING);
        get_str.kind = MethodKind::Instance;
        registry.register(&types, get_int).unwrap();
        registry.register(&types, get_str).unwrap();

        // Both specializations share the `array` family group.
        assert_eq!(registry.candidates(&types, arr_int, "Get").len(), 2);
        assert!(registry.candidates(&types, arr_int, "Set").is_empty());
        assert!(registry.has_member(&types, arr_str, "Get"));
    }

    #[test]
    fn rejects_duplicate_signature() {
        let types = TypeTable::new();
        let mut registry = MethodRegistry::new();
        let m = method(TypeTable::INT, "Parse", &[TypeTable::STRING], TypeTable::INT);
        registry.register(&types, m.clone()).unwrap();

        let err = registry.register(&types, m).unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateMethod { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn overloads_with_distinct_params_coexist() {
        let types = TypeTable::new();
        let mut registry = MethodRegistry::new();
        registry
            .register(&types, method(TypeTable::INT, "Max", &[TypeTable::INT], TypeTable::INT))
            .unwrap();
        registry
            .register(
                &types,
                method(TypeTable::INT, "Max", &[TypeTable::FLOAT], TypeTable::FLOAT),
            )
            .unwrap();
        assert_eq!(registry.candidates(&types, TypeTable::INT, "Max").len(), 2);
    }

    #[test]
    fn rejects_instance_method_without_receiver() {
        let types = TypeTable::new();
        let mut registry = MethodRegistry::new();
        let mut m = method(TypeTable::STRING, "get_Length", &[], TypeTable::INT);
        m.kind = MethodKind::Instance;
        assert_eq!(
            registry.register(&types, m),
            Err(RegistrationError::MissingReceiver {
                name: "get_Length".to_string()
            })
        );
    }
}
