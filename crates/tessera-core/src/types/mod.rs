//! Interned structural types.
//!
//! Every [`Type`] is identified by its full identity (qualifier path, declared
//! name, ordered arguments, logical family name, backing real type) and
//! interned in a [`TypeTable`], so exact equality is [`TypeId`] equality.
//!
//! ## Generic roots
//!
//! The families `array`, `list`, `tuple`, `func`, `detfunc`, `type` and
//! `qual` are registered once per table. Applying concrete arguments to a
//! root with [`TypeTable::specialize`] interns a specialization.
//!
//! ## Unknown
//!
//! [`TypeTable::UNKNOWN`] is the inference placeholder. It may appear nested in
//! containers (`array<?>`) until a consuming context fixes it; see
//! [`TypeTable::can_fixate`].

mod relations;

pub use relations::LogicalKey;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::QualifierId;

/// Interned handle to a [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// The built-in generic families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenericRoot {
    /// Fixed-length homogeneous array, `array<T>`.
    Array,
    /// Homogeneous sequence, `list<T>`.
    List,
    /// Heterogeneous product, `tuple<A, B, ..>`.
    Tuple,
    /// Possibly non-deterministic function, `func<tuple<P..>, R>`.
    Func,
    /// Deterministic function, `detfunc<tuple<P..>, R>`.
    DetFunc,
    /// The type of an expression naming a type, `type<T>`.
    Type,
    /// The type of an expression naming a namespace, `qual<N>`.
    Qual,
}

impl GenericRoot {
    /// All roots in registration order.
    pub const ALL: [GenericRoot; 7] = [
        GenericRoot::Array,
        GenericRoot::List,
        GenericRoot::Tuple,
        GenericRoot::Func,
        GenericRoot::DetFunc,
        GenericRoot::Type,
        GenericRoot::Qual,
    ];

    /// The declared family name.
    pub fn name(self) -> &'static str {
        match self {
            GenericRoot::Array => "array",
            GenericRoot::List => "list",
            GenericRoot::Tuple => "tuple",
            GenericRoot::Func => "func",
            GenericRoot::DetFunc => "detfunc",
            GenericRoot::Type => "type",
            GenericRoot::Qual => "qual",
        }
    }

    /// Look up a root by its family name.
    pub fn from_name(name: &str) -> Option<GenericRoot> {
        GenericRoot::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Required argument count, `None` for variadic roots.
    pub fn arity(self) -> Option<usize> {
        match self {
            GenericRoot::Tuple => None,
            GenericRoot::Func | GenericRoot::DetFunc => Some(2),
            _ => Some(1),
        }
    }

    /// Whether instances are function types.
    pub fn is_function(self) -> bool {
        matches!(self, GenericRoot::Func | GenericRoot::DetFunc)
    }
}

/// What a type is, structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// The inference placeholder.
    Unknown,
    /// A built-in scalar.
    Primitive,
    /// A catalog-declared type.
    Nominal,
    /// A catalog-declared namespace; has static members only.
    Namespace,
    /// An uninstantiated generic root.
    Root(GenericRoot),
    /// A specialization of a generic root.
    Instance(GenericRoot),
}

/// A structural type. The whole struct is the interning key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    /// Where the type was declared.
    pub qualifier: QualifierId,
    /// Declared name (the root name for specializations).
    pub name: String,
    /// Ordered type arguments.
    pub args: Vec<TypeId>,
    /// Family name used for logical grouping.
    pub logical: String,
    /// Backing runtime type name, if the type has one.
    pub real: Option<String>,
    /// Structural category.
    pub kind: TypeKind,
}

/// Errors from applying arguments to a generic root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Wrong number of type arguments.
    #[error("'{root}' expects {expected} type argument(s), found {found}")]
    Arity {
        /// Root family name.
        root: &'static str,
        /// Required count.
        expected: usize,
        /// Supplied count.
        found: usize,
    },
    /// A function type whose first argument is not a tuple of parameters.
    #[error("'{root}' expects a parameter tuple as its first argument")]
    ParameterList {
        /// Root family name.
        root: &'static str,
    },
}

/// Parameter and result types of a function type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSig {
    /// Parameter types in order.
    pub params: Vec<TypeId>,
    /// Result type.
    pub ret: TypeId,
    /// Whether the type is the deterministic-function family.
    pub deterministic: bool,
}

/// Interning table for all types of one compilation run.
#[derive(Debug)]
pub struct TypeTable {
    types: Vec<Type>,
    index: FxHashMap<Type, TypeId>,
    by_name: FxHashMap<(QualifierId, String), TypeId>,
    roots: FxHashMap<GenericRoot, TypeId>,
}

impl TypeTable {
    /// The inference placeholder.
    pub const UNKNOWN: TypeId = TypeId(0);
    /// `void`.
    pub const VOID: TypeId = TypeId(1);
    /// `int`.
    pub const INT: TypeId = TypeId(2);
    /// `float`.
    pub const FLOAT: TypeId = TypeId(3);
    /// `bool`.
    pub const BOOL: TypeId = TypeId(4);
    /// `string`.
    pub const STRING: TypeId = TypeId(5);
    /// `object`.
    pub const OBJECT: TypeId = TypeId(6);

    /// Create a table with the placeholder, primitives and generic roots registered.
    pub fn new() -> Self {
        let mut table = Self {
            types: Vec::new(),
            index: FxHashMap::default(),
            by_name: FxHashMap::default(),
            roots: FxHashMap::default(),
        };

        let unknown = table.intern(Type {
            qualifier: QualifierId::ROOT,
            name: "?".to_string(),
            args: Vec::new(),
            logical: "?".to_string(),
            real: None,
            kind: TypeKind::Unknown,
        });
        debug_assert_eq!(unknown, Self::UNKNOWN);

        for (name, real) in [
            ("void", "SystemVoid"),
            ("int", "SystemInt32"),
            ("float", "SystemSingle"),
            ("bool", "SystemBoolean"),
            ("string", "SystemString"),
            ("object", "SystemObject"),
        ] {
            table.declare(QualifierId::ROOT, name, Some(real), TypeKind::Primitive);
        }

        for root in GenericRoot::ALL {
            let id = table.intern(Type {
                qualifier: QualifierId::ROOT,
                name: root.name().to_string(),
                args: Vec::new(),
                logical: root.name().to_string(),
                real: None,
                kind: TypeKind::Root(root),
            });
            table.roots.insert(root, id);
        }

        table
    }

    /// Intern a type, returning the existing id for an identical one.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.index.get(&ty) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.index.insert(ty, id);
        id
    }

    fn declare(
        &mut self,
        qualifier: QualifierId,
        name: &str,
        real: Option<&str>,
        kind: TypeKind,
    ) -> TypeId {
        let id = self.intern(Type {
            qualifier,
            name: name.to_string(),
            args: Vec::new(),
            logical: name.to_string(),
            real: real.map(str::to_string),
            kind,
        });
        self.by_name.insert((qualifier, name.to_string()), id);
        id
    }

    /// Declare a named type with a backing runtime type.
    pub fn declare_nominal(&mut self, qualifier: QualifierId, name: &str, real: &str) -> TypeId {
        self.declare(qualifier, name, Some(real), TypeKind::Nominal)
    }

    /// Declare a namespace. `real` names the runtime owner of its static members.
    pub fn declare_namespace(&mut self, qualifier: QualifierId, name: &str, real: &str) -> TypeId {
        self.declare(qualifier, name, Some(real), TypeKind::Namespace)
    }

    /// Look up a named (non-generic) type declared exactly at `qualifier`.
    pub fn lookup(&self, qualifier: QualifierId, name: &str) -> Option<TypeId> {
        self.by_name.get(&(qualifier, name.to_string())).copied()
    }

    /// The id of an uninstantiated root.
    pub fn root(&self, root: GenericRoot) -> TypeId {
        self.roots[&root]
    }

    /// Get a type by id.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    /// Number of interned types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the table is empty (never true after `new`).
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // ==========================================================================
    // Specialization
    // ==========================================================================

    /// Apply type arguments to a generic root.
    pub fn specialize(&mut self, root: GenericRoot, args: &[TypeId]) -> Result<TypeId, TypeError> {
        if let Some(expected) = root.arity()
            && args.len() != expected
        {
            return Err(TypeError::Arity {
                root: root.name(),
                expected,
                found: args.len(),
            });
        }
        if root.is_function() && self.instance_root(args[0]) != Some(GenericRoot::Tuple) {
            return Err(TypeError::ParameterList { root: root.name() });
        }

        Ok(self.instance(root, args.to_vec()))
    }

    /// `array<elem>`.
    pub fn array_of(&mut self, elem: TypeId) -> TypeId {
        self.instance(GenericRoot::Array, vec![elem])
    }

    /// `tuple<elems..>`.
    pub fn tuple_of(&mut self, elems: &[TypeId]) -> TypeId {
        self.instance(GenericRoot::Tuple, elems.to_vec())
    }

    /// `type<ty>`.
    pub fn type_of(&mut self, ty: TypeId) -> TypeId {
        self.instance(GenericRoot::Type, vec![ty])
    }

    /// `qual<ns>`.
    pub fn qual_of(&mut self, ns: TypeId) -> TypeId {
        self.instance(GenericRoot::Qual, vec![ns])
    }

    /// A function type over `params` returning `ret`.
    pub fn function(&mut self, params: &[TypeId], ret: TypeId, deterministic: bool) -> TypeId {
        let params = self.tuple_of(params);
        let root = if deterministic {
            GenericRoot::DetFunc
        } else {
            GenericRoot::Func
        };
        self.instance(root, vec![params, ret])
    }

    // Arity is correct by construction for the helpers above.
    fn instance(&mut self, root: GenericRoot, args: Vec<TypeId>) -> TypeId {
        let real = match root {
            GenericRoot::Array => self
                .real_name(args[0])
                .filter(|_| !self.contains_unknown(args[0]))
                .map(|elem| format!("{elem}Array")),
            GenericRoot::List => Some("SystemObjectArray".to_string()),
            GenericRoot::Func | GenericRoot::DetFunc => Some("SystemUInt32".to_string()),
            GenericRoot::Type => Some("SystemType".to_string()),
            GenericRoot::Tuple | GenericRoot::Qual => None,
        };
        self.intern(Type {
            qualifier: QualifierId::ROOT,
            name: root.name().to_string(),
            args,
            logical: root.name().to_string(),
            real,
            kind: TypeKind::Instance(root),
        })
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    /// The root family of a specialization.
    pub fn instance_root(&self, id: TypeId) -> Option<GenericRoot> {
        match self.get(id).kind {
            TypeKind::Instance(root) => Some(root),
            _ => None,
        }
    }

    /// Whether `id` is the placeholder itself.
    pub fn is_unknown(&self, id: TypeId) -> bool {
        id == Self::UNKNOWN
    }

    /// Backing runtime type name.
    pub fn real_name(&self, id: TypeId) -> Option<&str> {
        self.get(id).real.as_deref()
    }

    /// Element type of `array<T>` or `list<T>`.
    pub fn element_type(&self, id: TypeId) -> Option<TypeId> {
        match self.instance_root(id)? {
            GenericRoot::Array | GenericRoot::List => Some(self.get(id).args[0]),
            _ => None,
        }
    }

    /// Components of a tuple type.
    pub fn tuple_elems(&self, id: TypeId) -> Option<&[TypeId]> {
        match self.instance_root(id)? {
            GenericRoot::Tuple => Some(&self.get(id).args),
            _ => None,
        }
    }

    /// Parameter/result view of a function type.
    pub fn function_sig(&self, id: TypeId) -> Option<FunctionSig> {
        let root = self.instance_root(id)?;
        if !root.is_function() {
            return None;
        }
        let ty = self.get(id);
        Some(FunctionSig {
            params: self.tuple_elems(ty.args[0])?.to_vec(),
            ret: ty.args[1],
            deterministic: root == GenericRoot::DetFunc,
        })
    }

    /// The named type behind `type<T>` or `qual<N>`.
    pub fn meta_target(&self, id: TypeId) -> Option<TypeId> {
        match self.instance_root(id)? {
            GenericRoot::Type | GenericRoot::Qual => Some(self.get(id).args[0]),
            _ => None,
        }
    }

    /// Whether values of this type exist at run time.
    pub fn is_value_type(&self, id: TypeId) -> bool {
        match self.get(id).kind {
            TypeKind::Namespace | TypeKind::Root(_) => false,
            TypeKind::Instance(GenericRoot::Qual) => false,
            _ => id != Self::VOID,
        }
    }

    /// Whether arithmetic interpolation makes sense for the type.
    pub fn is_numeric(&self, id: TypeId) -> bool {
        id == Self::INT || id == Self::FLOAT
    }

    /// Render a type for diagnostics.
    pub fn display(&self, id: TypeId) -> String {
        let ty = self.get(id);
        let join = |ids: &[TypeId]| {
            ids.iter()
                .map(|&a| self.display(a))
                .collect::<Vec<_>>()
                .join(", ")
        };
        match ty.kind {
            TypeKind::Instance(GenericRoot::Tuple) => format!("({})", join(&ty.args)),
            TypeKind::Instance(root) if root.is_function() => {
                let params = self
                    .tuple_elems(ty.args[0])
                    .map(join)
                    .unwrap_or_default();
                let prefix = if root == GenericRoot::DetFunc { "det fn" } else { "fn" };
                format!("{prefix}({params}) -> {}", self.display(ty.args[1]))
            }
            TypeKind::Instance(_) => format!("{}<{}>", ty.name, join(&ty.args)),
            _ => ty.name.clone(),
        }
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_have_fixed_ids() {
        let table = TypeTable::new();
        assert_eq!(table.get(TypeTable::INT).name, "int");
        assert_eq!(table.get(TypeTable::STRING).name, "string");
        assert_eq!(table.real_name(TypeTable::FLOAT), Some("SystemSingle"));
        assert_eq!(table.lookup(QualifierId::ROOT, "bool"), Some(TypeTable::BOOL));
    }

    #[test]
    fn specializations_are_interned() {
        let mut table = TypeTable::new();
        let a = table.array_of(TypeTable::INT);
        let b = table.specialize(GenericRoot::Array, &[TypeTable::INT]).unwrap();
        assert_eq!(a, b);
        assert_eq!(table.real_name(a), Some("SystemInt32Array"));
        assert_eq!(table.display(a), "array<int>");
    }

    #[test]
    fn unknown_element_has_no_backing_type() {
        let mut table = TypeTable::new();
        let a = table.array_of(TypeTable::UNKNOWN);
        assert_eq!(table.real_name(a), None);
    }

    #[test]
    fn specialize_checks_arity() {
        let mut table = TypeTable::new();
        let err = table
            .specialize(GenericRoot::Array, &[TypeTable::INT, TypeTable::INT])
            .unwrap_err();
        assert_eq!(
            err,
            TypeError::Arity {
                root: "array",
                expected: 1,
                found: 2
            }
        );
        assert!(table.specialize(GenericRoot::Tuple, &[]).is_ok());
    }

    #[test]
    fn function_types_need_parameter_tuple() {
        let mut table = TypeTable::new();
        let err = table
            .specialize(GenericRoot::Func, &[TypeTable::INT, TypeTable::INT])
            .unwrap_err();
        assert!(matches!(err, TypeError::ParameterList { .. }));

        let f = table.function(&[TypeTable::INT], TypeTable::BOOL, true);
        let sig = table.function_sig(f).unwrap();
        assert_eq!(sig.params, vec![TypeTable::INT]);
        assert_eq!(sig.ret, TypeTable::BOOL);
        assert!(sig.deterministic);
        assert_eq!(table.display(f), "det fn(int) -> bool");
    }

    #[test]
    fn meta_types_wrap_named_types() {
        let mut table = TypeTable::new();
        let debug = table.declare_namespace(QualifierId::ROOT, "Debug", "UnityEngineDebug");
        let q = table.qual_of(debug);
        let t = table.type_of(TypeTable::INT);
        assert_eq!(table.meta_target(q), Some(debug));
        assert_eq!(table.meta_target(t), Some(TypeTable::INT));
        assert!(!table.is_value_type(debug));
        assert!(!table.is_value_type(q));
        assert!(table.is_value_type(t));
    }
}
