//! Global entity tables: variables, functions and literals.
//!
//! Every entry is immutable and permanent once added. Ids index into the
//! owning table.

use std::fmt;

use bitflags::bitflags;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use tessera_core::{InternalError, QualifierId, SignatureHash, Span, TypeId, TypeTable};
use tessera_syntax::SyncMode;

use crate::typed::Typed;

// ============================================================================
// Variables
// ============================================================================

/// Index of a [`Var`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

bitflags! {
    /// Properties of a declared variable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VarFlags: u8 {
        /// May be assigned after declaration.
        const MUTABLE = 1 << 0;
        /// Compiler-introduced; never visible to name resolution.
        const SYSTEM = 1 << 1;
        /// Visible to the host.
        const EXPORT = 1 << 2;
        /// A function parameter.
        const PARAM = 1 << 3;
    }
}

/// A declared variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    /// Table index.
    pub index: VarId,
    /// Declaring qualifier.
    pub qualifier: QualifierId,
    /// Source name.
    pub name: String,
    /// Declared or inferred type.
    pub ty: TypeId,
    /// Mutability and visibility.
    pub flags: VarFlags,
    /// Replication mode for synced variables.
    pub sync: Option<SyncMode>,
    /// Initial value held in the data section.
    pub default: Option<LiteralId>,
    /// Declaration site.
    pub span: Span,
}

impl Var {
    /// Whether assignments to the variable are allowed.
    pub fn is_mutable(&self) -> bool {
        self.flags.contains(VarFlags::MUTABLE)
    }

    /// Whether the variable is exported to the host.
    pub fn is_exported(&self) -> bool {
        self.flags.contains(VarFlags::EXPORT)
    }
}

/// Everything needed to declare a variable.
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// Declaring qualifier.
    pub qualifier: QualifierId,
    /// Source name.
    pub name: String,
    /// Type.
    pub ty: TypeId,
    /// Flags.
    pub flags: VarFlags,
    /// Replication mode.
    pub sync: Option<SyncMode>,
    /// Data-section initial value.
    pub default: Option<LiteralId>,
    /// Declaration site.
    pub span: Span,
}

/// All variables of a run, indexed by declaring qualifier and name.
#[derive(Debug, Default)]
pub struct VarTable {
    vars: Vec<Var>,
    by_scope: FxHashMap<(QualifierId, String), VarId>,
}

impl VarTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable. Returns `None` when the name is already declared
    /// in the same qualifier.
    pub fn declare(&mut self, decl: VarDecl) -> Option<VarId> {
        let key = (decl.qualifier, decl.name.clone());
        if self.by_scope.contains_key(&key) {
            return None;
        }
        let index = VarId(self.vars.len() as u32);
        self.vars.push(Var {
            index,
            qualifier: decl.qualifier,
            name: decl.name,
            ty: decl.ty,
            flags: decl.flags,
            sync: decl.sync,
            default: decl.default,
            span: decl.span,
        });
        self.by_scope.insert(key, index);
        Some(index)
    }

    /// The variable named `name` declared exactly at `qualifier`.
    pub fn lookup(&self, qualifier: QualifierId, name: &str) -> Option<VarId> {
        self.by_scope.get(&(qualifier, name.to_string())).copied()
    }

    /// Get a variable by id.
    pub fn get(&self, id: VarId) -> Result<&Var, InternalError> {
        self.vars
            .get(id.0 as usize)
            .ok_or(InternalError::UnknownEntity {
                kind: "var",
                index: id.0,
            })
    }

    /// All variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Var> {
        self.vars.iter()
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variable is declared.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Index of a [`Func`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub u32);

/// A fully analyzed function literal.
#[derive(Debug, Clone)]
pub struct Func {
    /// Table index.
    pub index: FuncId,
    /// The function body's qualifier.
    pub qualifier: QualifierId,
    /// Declared name for named functions.
    pub name: Option<String>,
    /// The function type.
    pub ty: TypeId,
    /// The function type with determinism erased; selects the calling-convention cells.
    pub signature: TypeId,
    /// Parameter variables in order.
    pub params: Vec<VarId>,
    /// Analyzed body.
    pub body: Typed,
    /// Whether the body is deterministic.
    pub deterministic: bool,
    /// Exported as a host entry point.
    pub export: bool,
    /// The variable a named function is bound to.
    pub binding: Option<VarId>,
    /// Declaration site.
    pub span: Span,
}

/// All functions of a run.
#[derive(Debug, Default)]
pub struct FuncTable {
    funcs: Vec<Func>,
    signatures: FxHashMap<SignatureHash, FuncId>,
    bindings: FxHashMap<VarId, FuncId>,
}

impl FuncTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function. Returns `None` when the same qualifier already
    /// declares a function with this name and parameter list.
    pub fn register(&mut self, hash: SignatureHash, mut func: Func) -> Option<FuncId> {
        if self.signatures.contains_key(&hash) {
            return None;
        }
        let id = FuncId(self.funcs.len() as u32);
        func.index = id;
        if let Some(var) = func.binding {
            self.bindings.insert(var, id);
        }
        self.signatures.insert(hash, id);
        self.funcs.push(func);
        Some(id)
    }

    /// Get a function by id.
    pub fn get(&self, id: FuncId) -> Result<&Func, InternalError> {
        self.funcs
            .get(id.0 as usize)
            .ok_or(InternalError::UnknownEntity {
                kind: "func",
                index: id.0,
            })
    }

    /// The function a named-function variable is bound to.
    pub fn bound_to(&self, var: VarId) -> Option<FuncId> {
        self.bindings.get(&var).copied()
    }

    /// All functions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Func> {
        self.funcs.iter()
    }

    /// Number of functions.
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    /// Whether no function is registered.
    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

// ============================================================================
// Literals
// ============================================================================

/// Index of a [`Literal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LiteralId(pub u32);

/// A parsed literal value. Floats are ordered so literals can be interned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    /// Integer.
    Int(i64),
    /// Floating point.
    Float(OrderedFloat<f64>),
    /// Boolean.
    Bool(bool),
    /// String contents.
    String(String),
    /// `null`.
    Null,
}

impl fmt::Display for LiteralValue {
    /// Renders in data-section syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(v) => write!(f, "{v}"),
            LiteralValue::Float(v) => {
                let v = v.into_inner();
                if v.fract() == 0.0 && v.is_finite() {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            LiteralValue::Bool(v) => write!(f, "{v}"),
            LiteralValue::String(s) => write!(f, "{s:?}"),
            LiteralValue::Null => f.write_str("null"),
        }
    }
}

/// An interned literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    /// Table index.
    pub index: LiteralId,
    /// Spelling of the first occurrence.
    pub text: String,
    /// Type of the value.
    pub ty: TypeId,
    /// Parsed value.
    pub value: LiteralValue,
}

/// Literals interned by value and type, so equal literals share one cell.
#[derive(Debug, Default)]
pub struct LiteralTable {
    literals: Vec<Literal>,
    index: FxHashMap<(LiteralValue, TypeId), LiteralId>,
}

impl LiteralTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a literal.
    pub fn intern(&mut self, text: &str, ty: TypeId, value: LiteralValue) -> LiteralId {
        let key = (value, ty);
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = LiteralId(self.literals.len() as u32);
        self.literals.push(Literal {
            index: id,
            text: text.to_string(),
            ty,
            value: key.0.clone(),
        });
        self.index.insert(key, id);
        id
    }

    /// Intern an `int` literal.
    pub fn int(&mut self, value: i64) -> LiteralId {
        self.intern(&value.to_string(), TypeTable::INT, LiteralValue::Int(value))
    }

    /// Get a literal by id.
    pub fn get(&self, id: LiteralId) -> Result<&Literal, InternalError> {
        self.literals
            .get(id.0 as usize)
            .ok_or(InternalError::UnknownEntity {
                kind: "literal",
                index: id.0,
            })
    }

    /// All literals in interning order.
    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    /// Number of literals.
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Whether no literal is interned.
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}
