//! Operators and declaration attributes.

use std::fmt;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&&`, short-circuit
    LogicalAnd,
    /// `||`, short-circuit
    LogicalOr,
    /// `??`, short-circuit
    Coalesce,
}

impl BinaryOp {
    /// The host method implementing the operator, for non-short-circuit operators.
    pub fn method_name(self) -> Option<&'static str> {
        Some(match self {
            BinaryOp::Add => "op_Addition",
            BinaryOp::Sub => "op_Subtraction",
            BinaryOp::Mul => "op_Multiplication",
            BinaryOp::Div => "op_Division",
            BinaryOp::Rem => "op_Remainder",
            BinaryOp::Equal => "op_Equality",
            BinaryOp::NotEqual => "op_Inequality",
            BinaryOp::Less => "op_LessThan",
            BinaryOp::LessEqual => "op_LessThanOrEqual",
            BinaryOp::Greater => "op_GreaterThan",
            BinaryOp::GreaterEqual => "op_GreaterThanOrEqual",
            BinaryOp::BitAnd => "op_LogicalAnd",
            BinaryOp::BitOr => "op_LogicalOr",
            BinaryOp::BitXor => "op_LogicalXor",
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::Coalesce => return None,
        })
    }

    /// Whether the right operand is evaluated conditionally.
    pub fn is_short_circuit(self) -> bool {
        matches!(
            self,
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::Coalesce
        )
    }

    /// Source spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Coalesce => "??",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

impl UnaryOp {
    /// The host method implementing the operator.
    pub fn method_name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "op_UnaryMinus",
            UnaryOp::Not => "op_UnaryNegation",
        }
    }

    /// Source spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an exported variable is replicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncMode {
    /// Replicated without interpolation.
    None,
    /// Linearly interpolated.
    Linear,
    /// Smoothly interpolated.
    Smooth,
}

impl SyncMode {
    /// Directive spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            SyncMode::None => "none",
            SyncMode::Linear => "linear",
            SyncMode::Smooth => "smooth",
        }
    }

    /// Whether the mode interpolates between values.
    pub fn interpolates(self) -> bool {
        !matches!(self, SyncMode::None)
    }
}

/// Attribute kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    /// `export`: visible to the host.
    Export,
    /// `sync(mode)`: replicated.
    Sync(SyncMode),
}

impl AttrKind {
    /// Attribute name as written.
    pub fn name(self) -> &'static str {
        match self {
            AttrKind::Export => "export",
            AttrKind::Sync(_) => "sync",
        }
    }
}

/// An attribute attached to a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// What the attribute says.
    pub kind: AttrKind,
    /// Source location.
    pub span: tessera_core::Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_circuit_operators_have_no_method() {
        for op in [BinaryOp::LogicalAnd, BinaryOp::LogicalOr, BinaryOp::Coalesce] {
            assert!(op.is_short_circuit());
            assert_eq!(op.method_name(), None);
        }
        assert_eq!(BinaryOp::Add.method_name(), Some("op_Addition"));
    }

    #[test]
    fn sync_mode_interpolation() {
        assert!(!SyncMode::None.interpolates());
        assert!(SyncMode::Linear.interpolates());
        assert_eq!(SyncMode::Smooth.as_str(), "smooth");
    }
}
