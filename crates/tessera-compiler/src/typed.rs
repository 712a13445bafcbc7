//! The typed result tree produced by analysis.
//!
//! Every syntax node yields one [`Typed`]: its resolved type, typed children,
//! the left-value it denotes (if any), a determinism flag, where its value
//! lives at run time, and the temporaries it owns. A parent consumes a child's
//! value and then releases the child's owned temporaries.

use tessera_core::{Span, TypeId, TypeTable};
use tessera_registry::MethodId;
use tessera_syntax::BinaryOp;

use crate::entities::{FuncId, LiteralId, VarId};
use crate::pool::OutValue;

/// Where a node's value lives at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// No run-time value (void, types, namespaces, invalid nodes).
    None,
    /// A variable cell.
    Var(VarId),
    /// A literal cell.
    Literal(LiteralId),
    /// A temporary slot.
    Temp(OutValue),
    /// The indirect cell holding a function's code address.
    Func(FuncId),
    /// The receiver cell.
    This,
    /// Components of a flattened tuple.
    Tuple(Vec<Value>),
}

impl Value {
    /// All temporary slots referenced by this value.
    pub fn temps(&self) -> Vec<OutValue> {
        let mut out = Vec::new();
        self.collect_temps(&mut out);
        out
    }

    fn collect_temps(&self, out: &mut Vec<OutValue>) {
        match self {
            Value::Temp(t) => out.push(*t),
            Value::Tuple(parts) => parts.iter().for_each(|p| p.collect_temps(out)),
            _ => {}
        }
    }

    /// Replace every occurrence of slot `old` by `new`.
    pub fn replace_temp(&mut self, old: OutValue, new: OutValue) {
        match self {
            Value::Temp(t) if *t == old => *t = new,
            Value::Tuple(parts) => parts.iter_mut().for_each(|p| p.replace_temp(old, new)),
            _ => {}
        }
    }
}

/// An assignable storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeftValue {
    /// A mutable variable.
    Var(VarId),
    /// A property or indexer written through a setter method.
    Setter(MethodId),
}

/// A typed statement.
#[derive(Debug, Clone)]
pub enum TypedStmt {
    /// A binding. `in_data` means the variables are initialized in the data
    /// section and no code is needed.
    Let {
        /// Bound variables, in pattern order; empty when binding failed.
        vars: Vec<VarId>,
        /// Initializer.
        init: Typed,
        /// Initialized by the data section.
        in_data: bool,
    },
    /// A named function declaration; the body lives in the function table.
    Fn(FuncId),
    /// An expression evaluated for effect.
    Expr(Typed),
}

impl TypedStmt {
    /// Whether the statement contains no non-deterministic application.
    pub fn is_deterministic(&self) -> bool {
        match self {
            TypedStmt::Let { init, .. } => init.deterministic,
            TypedStmt::Fn(_) => true,
            TypedStmt::Expr(e) => e.deterministic,
        }
    }
}

/// Node-specific payload of a [`Typed`].
#[derive(Debug, Clone)]
pub enum TypedKind {
    /// Stand-in for a node that failed analysis.
    Invalid,
    /// A literal.
    Literal(LiteralId),
    /// A variable reference.
    Var(VarId),
    /// The receiver.
    This,
    /// A function literal or named function value.
    Func(FuncId),
    /// A type or namespace in expression position.
    Meta(TypeId),
    /// `(a, b)`
    Tuple(Vec<Typed>),
    /// `[a, b]`; `indices[i]` is the literal index of element `i`.
    Array {
        /// Elements.
        elems: Vec<Typed>,
        /// Length literal.
        len: LiteralId,
        /// Index literals.
        indices: Vec<LiteralId>,
    },
    /// `{ stmts; tail }`
    Block {
        /// Statements.
        stmts: Vec<TypedStmt>,
        /// Value expression.
        tail: Option<Box<Typed>>,
    },
    /// A host method call. Outputs are in the node's value.
    Extern {
        /// Resolved overload.
        method: MethodId,
        /// Arguments including the receiver.
        args: Vec<Typed>,
    },
    /// A call through a function value.
    Call {
        /// The function value.
        callee: Box<Typed>,
        /// Arguments.
        args: Vec<Typed>,
        /// Callee signature with determinism erased.
        signature: TypeId,
    },
    /// `target = value`
    Assign {
        /// The written location.
        target: LeftValue,
        /// Receiver and index arguments of a setter.
        target_args: Vec<Typed>,
        /// Assigned value.
        value: Box<Typed>,
    },
    /// `if`; a merged value lives in the node's value.
    If {
        /// Condition.
        cond: Box<Typed>,
        /// Then arm.
        then_branch: Box<Typed>,
        /// Else arm.
        else_branch: Option<Box<Typed>>,
    },
    /// `while`
    While {
        /// Condition.
        cond: Box<Typed>,
        /// Body.
        body: Box<Typed>,
    },
    /// `for binding in iterable`
    For(Box<ForLoop>),
    /// `&&`, `||`, `??`; the result slot is the node's value.
    ShortCircuit {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Typed>,
        /// Conditionally evaluated right operand.
        right: Box<Typed>,
        /// `??` only: the null test and its inputs.
        null_test: Option<NullTest>,
    },
    /// `return`
    Return(Option<Box<Typed>>),
    /// `break`
    Break,
    /// `continue`
    Continue,
}

/// Resolved pieces of a `for` loop.
#[derive(Debug, Clone)]
pub struct ForLoop {
    /// The element variable.
    pub binding: VarId,
    /// The iterated array.
    pub iterable: Typed,
    /// Loop body.
    pub body: Typed,
    /// Current index.
    pub index: OutValue,
    /// Array length.
    pub length: OutValue,
    /// `index < length`.
    pub cond: OutValue,
    /// `get_Length` on the array.
    pub get_length: MethodId,
    /// `Get` on the array.
    pub get: MethodId,
    /// `int < int`.
    pub less: MethodId,
    /// `int + int`.
    pub add: MethodId,
    /// Literal `0`.
    pub zero: LiteralId,
    /// Literal `1`.
    pub one: LiteralId,
}

/// The `ReferenceEquals(result, null)` check of `??`.
#[derive(Debug, Clone, Copy)]
pub struct NullTest {
    /// `object.ReferenceEquals`.
    pub method: MethodId,
    /// The `null` literal.
    pub null: LiteralId,
    /// Boolean slot receiving the test.
    pub result: OutValue,
}

/// An analyzed node.
#[derive(Debug, Clone)]
pub struct Typed {
    /// Node payload.
    pub kind: TypedKind,
    /// Resolved type.
    pub ty: TypeId,
    /// Source location.
    pub span: Span,
    /// No non-deterministic application anywhere below.
    pub deterministic: bool,
    /// The assignable location this node denotes.
    pub lvalue: Option<LeftValue>,
    /// Where the value lives.
    pub value: Value,
    /// Temporaries owned by this node, to be released by its consumer.
    pub temps: Vec<OutValue>,
}

impl Typed {
    /// A node with no value and no temporaries.
    pub fn new(kind: TypedKind, ty: TypeId, span: Span) -> Self {
        Self {
            kind,
            ty,
            span,
            deterministic: true,
            lvalue: None,
            value: Value::None,
            temps: Vec::new(),
        }
    }

    /// The stand-in for a node that failed analysis.
    pub fn invalid(span: Span) -> Self {
        Self::new(TypedKind::Invalid, TypeTable::UNKNOWN, span)
    }

    /// Whether this node failed analysis.
    pub fn is_invalid(&self) -> bool {
        matches!(self.kind, TypedKind::Invalid)
    }

    /// Set where the value lives; the value's temporaries become owned.
    pub fn with_value(mut self, value: Value) -> Self {
        for temp in value.temps() {
            if !self.temps.contains(&temp) {
                self.temps.push(temp);
            }
        }
        self.value = value;
        self
    }

    /// Set the determinism flag.
    pub fn with_deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    /// Add owned temporaries, skipping ones already owned.
    pub fn with_temps(mut self, temps: impl IntoIterator<Item = OutValue>) -> Self {
        for temp in temps {
            if !self.temps.contains(&temp) {
                self.temps.push(temp);
            }
        }
        self
    }

    /// The type-or-namespace this node names, if it names one.
    pub fn meta(&self) -> Option<TypeId> {
        match self.kind {
            TypedKind::Meta(ty) => Some(ty),
            _ => None,
        }
    }

    /// Whether control never falls out of this node: it always leaves
    /// through `return`, `break` or `continue`.
    pub fn diverges(&self) -> bool {
        match &self.kind {
            TypedKind::Return(_) | TypedKind::Break | TypedKind::Continue => true,
            TypedKind::Block { stmts, tail } => {
                stmts
                    .iter()
                    .any(|stmt| matches!(stmt, TypedStmt::Expr(e) if e.diverges()))
                    || tail.as_ref().is_some_and(|t| t.diverges())
            }
            TypedKind::If {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => then_branch.diverges() && else_branch.diverges(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::QualifierId;

    fn slot(n: u32) -> OutValue {
        OutValue {
            root: QualifierId(1),
            ty: TypeTable::INT,
            slot: n,
        }
    }

    #[test]
    fn tuple_value_collects_nested_temps() {
        let value = Value::Tuple(vec![
            Value::Temp(slot(0)),
            Value::Literal(LiteralId(0)),
            Value::Tuple(vec![Value::Temp(slot(2))]),
        ]);
        assert_eq!(value.temps(), vec![slot(0), slot(2)]);
    }

    #[test]
    fn with_value_owns_temps_once() {
        let node = Typed::new(TypedKind::Invalid, TypeTable::INT, Span::default())
            .with_temps([slot(0)])
            .with_value(Value::Temp(slot(0)));
        assert_eq!(node.temps, vec![slot(0)]);
    }

    #[test]
    fn divergence_needs_every_path_to_leave() {
        let span = Span::default();
        let ret = || Typed::new(TypedKind::Return(None), TypeTable::VOID, span);
        let int = || Typed::new(TypedKind::Literal(LiteralId(0)), TypeTable::INT, span);
        let cond = || Box::new(Typed::new(TypedKind::Literal(LiteralId(1)), TypeTable::BOOL, span));

        let block = Typed::new(
            TypedKind::Block {
                stmts: vec![TypedStmt::Expr(ret())],
                tail: None,
            },
            TypeTable::VOID,
            span,
        );
        assert!(block.diverges());

        let one_arm = Typed::new(
            TypedKind::If {
                cond: cond(),
                then_branch: Box::new(ret()),
                else_branch: Some(Box::new(int())),
            },
            TypeTable::INT,
            span,
        );
        assert!(!one_arm.diverges());

        let both_arms = Typed::new(
            TypedKind::If {
                cond: cond(),
                then_branch: Box::new(ret()),
                else_branch: Some(Box::new(block)),
            },
            TypeTable::VOID,
            span,
        );
        assert!(both_arms.diverges());

        let no_else = Typed::new(
            TypedKind::If {
                cond: cond(),
                then_branch: Box::new(ret()),
                else_branch: None,
            },
            TypeTable::VOID,
            span,
        );
        assert!(!no_else.diverges());
    }

    #[test]
    fn replace_temp_rewrites_components() {
        let mut value = Value::Tuple(vec![Value::Temp(slot(0)), Value::Temp(slot(1))]);
        value.replace_temp(slot(1), slot(4));
        assert_eq!(value.temps(), vec![slot(0), slot(4)]);
    }
}
