//! The catalog boundary.

use tessera_core::{QualifierId, TypeId, TypeTable};

use crate::{Method, MethodId, MethodKind, MethodRegistry, ParamDirection, RegistrationError};

/// A read-only enumeration of host-callable operations.
///
/// Implementations declare the types they own and every method on them. The
/// analyzer only ever looks methods up afterwards.
pub trait MethodCatalog {
    /// Declare types and methods into `builder`.
    fn register(&self, builder: &mut CatalogBuilder<'_>) -> Result<(), RegistrationError>;
}

/// Write access to the type table and method registry while a catalog registers.
pub struct CatalogBuilder<'a> {
    types: &'a mut TypeTable,
    registry: &'a mut MethodRegistry,
}

impl<'a> CatalogBuilder<'a> {
    /// Create a builder over a session's tables.
    pub fn new(types: &'a mut TypeTable, registry: &'a mut MethodRegistry) -> Self {
        Self { types, registry }
    }

    /// The type table, for building specializations.
    pub fn types(&mut self) -> &mut TypeTable {
        self.types
    }

    /// Declare a named type at the root qualifier.
    pub fn declare_type(&mut self, name: &str, real: &str) -> TypeId {
        self.types.declare_nominal(QualifierId::ROOT, name, real)
    }

    /// Declare a namespace at the root qualifier.
    pub fn declare_namespace(&mut self, name: &str, real: &str) -> TypeId {
        self.types.declare_namespace(QualifierId::ROOT, name, real)
    }

    /// Look up a root-level type by name.
    pub fn lookup(&self, name: &str) -> Result<TypeId, RegistrationError> {
        self.types
            .lookup(QualifierId::ROOT, name)
            .ok_or_else(|| RegistrationError::TypeNotFound(name.to_string()))
    }

    /// Start a static method on `owner`.
    pub fn method<'b>(&'b mut self, owner: TypeId, name: &str) -> MethodBuilder<'b, 'a> {
        MethodBuilder::new(self, owner, name, MethodKind::Static)
    }

    /// Start an instance method on `owner`; the receiver is added as parameter 0.
    pub fn instance<'b>(&'b mut self, owner: TypeId, name: &str) -> MethodBuilder<'b, 'a> {
        let mut builder = MethodBuilder::new(self, owner, name, MethodKind::Instance);
        builder.params.push(owner);
        builder.directions.push(ParamDirection::In);
        builder
    }
}

/// Fluent description of one method.
pub struct MethodBuilder<'b, 'a> {
    catalog: &'b mut CatalogBuilder<'a>,
    owner: TypeId,
    name: String,
    kind: MethodKind,
    params: Vec<TypeId>,
    directions: Vec<ParamDirection>,
    outputs: Vec<TypeId>,
    extern_name: Option<String>,
    deterministic: bool,
}

impl<'b, 'a> MethodBuilder<'b, 'a> {
    fn new(catalog: &'b mut CatalogBuilder<'a>, owner: TypeId, name: &str, kind: MethodKind) -> Self {
        Self {
            catalog,
            owner,
            name: name.to_string(),
            kind,
            params: Vec::new(),
            directions: Vec::new(),
            outputs: Vec::new(),
            extern_name: None,
            deterministic: true,
        }
    }

    /// Add an input parameter.
    pub fn param(mut self, ty: TypeId) -> Self {
        self.params.push(ty);
        self.directions.push(ParamDirection::In);
        self
    }

    /// Add an output parameter.
    pub fn out_param(mut self, ty: TypeId) -> Self {
        self.params.push(ty);
        self.directions.push(ParamDirection::Out);
        self
    }

    /// Add an input-output parameter.
    pub fn inout_param(mut self, ty: TypeId) -> Self {
        self.params.push(ty);
        self.directions.push(ParamDirection::InOut);
        self
    }

    /// Add a result type.
    pub fn returns(mut self, ty: TypeId) -> Self {
        self.outputs.push(ty);
        self
    }

    /// Use an explicit host entry point instead of the derived one.
    pub fn extern_name(mut self, name: impl Into<String>) -> Self {
        self.extern_name = Some(name.into());
        self
    }

    /// Mark the method as non-deterministic.
    pub fn nondeterministic(mut self) -> Self {
        self.deterministic = false;
        self
    }

    /// Finish and register the method.
    pub fn register(self) -> Result<MethodId, RegistrationError> {
        let types = &*self.catalog.types;
        let extern_name = match self.extern_name {
            Some(name) => name,
            None => derive_extern_name(
                types,
                self.owner,
                &self.name,
                self.kind,
                &self.params,
                &self.directions,
                &self.outputs,
            ),
        };
        let method = Method {
            owner: self.owner,
            name: self.name,
            kind: self.kind,
            params: self.params,
            directions: self.directions,
            outputs: self.outputs,
            extern_name,
            deterministic: self.deterministic,
        };
        self.catalog.registry.register(types, method)
    }
}

/// `{Owner}.__{name}__{Params}__{Output}`, params joined by `_`, `Ref` after
/// written params, the parameter segment omitted when there are none.
fn derive_extern_name(
    types: &TypeTable,
    owner: TypeId,
    name: &str,
    kind: MethodKind,
    params: &[TypeId],
    directions: &[ParamDirection],
    outputs: &[TypeId],
) -> String {
    let real = |ty: TypeId| {
        types
            .real_name(ty)
            .map(str::to_string)
            .unwrap_or_else(|| types.display(ty))
    };
    let skip = usize::from(kind == MethodKind::Instance);

    let mut out = format!("{}.__{}", real(owner), name);
    let explicit: Vec<String> = params
        .iter()
        .zip(directions)
        .skip(skip)
        .map(|(&ty, dir)| {
            let mut name = real(ty);
            if dir.writes() {
                name.push_str("Ref");
            }
            name
        })
        .collect();
    if !explicit.is_empty() {
        out.push_str("__");
        out.push_str(&explicit.join("_"));
    }
    out.push_str("__");
    if outputs.is_empty() {
        out.push_str("SystemVoid");
    } else {
        let outs: Vec<String> = outputs.iter().map(|&t| real(t)).collect();
        out.push_str(&outs.join("_"));
    }
    out
}
