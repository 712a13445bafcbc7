//! Instruction and data declaration model.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use tessera_syntax::SyncMode;

/// Target machine operation codes.
///
/// Each opcode is encoded in four bytes; operand-carrying opcodes add a
/// four-byte operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    /// Do nothing.
    Nop = 0,
    /// Push a data cell address.
    Push = 1,
    /// Discard the top of stack.
    Pop = 2,
    /// Pop a condition; jump when false.
    JumpIfFalse = 4,
    /// Jump to a code offset.
    Jump = 5,
    /// Call a host method.
    Extern = 6,
    /// Annotation carrying a string operand.
    Annotation = 7,
    /// Jump to the code offset stored in a data cell.
    JumpIndirect = 8,
    /// Pop destination and source addresses; copy source into destination.
    Copy = 9,
}

impl Opcode {
    /// Encoded size in bytes, operand included.
    pub fn size(self) -> u32 {
        match self {
            Opcode::Nop | Opcode::Pop | Opcode::Copy => 4,
            Opcode::Push
            | Opcode::JumpIfFalse
            | Opcode::Jump
            | Opcode::Extern
            | Opcode::Annotation
            | Opcode::JumpIndirect => 8,
        }
    }

    /// Listing mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::JumpIfFalse => "JUMP_IF_FALSE",
            Opcode::Jump => "JUMP",
            Opcode::Extern => "EXTERN",
            Opcode::Annotation => "ANNOTATION",
            Opcode::JumpIndirect => "JUMP_INDIRECT",
            Opcode::Copy => "COPY",
        }
    }
}

/// A jump destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeTarget {
    /// A symbolic code label, resolved by the linker.
    Label(String),
    /// A fixed code offset.
    Address(u32),
}

/// The code offset that halts the machine.
pub const HALT_ADDRESS: u32 = 0xFFFF_FFFC;

impl CodeTarget {
    /// Jump target that halts the machine.
    pub const HALT: CodeTarget = CodeTarget::Address(HALT_ADDRESS);
}

/// One code-section line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `NOP`
    Nop,
    /// `PUSH, cell`
    Push(String),
    /// `POP`
    Pop,
    /// `JUMP_IF_FALSE, target`
    JumpIfFalse(CodeTarget),
    /// `JUMP, target`
    Jump(CodeTarget),
    /// `EXTERN, "name"`
    Extern(String),
    /// `ANNOTATION, "text"`
    Annotation(String),
    /// `JUMP_INDIRECT, cell`
    JumpIndirect(String),
    /// `COPY`
    Copy,
    /// `label:`
    Label(String),
    /// `.export label`
    Export(String),
    /// `# text`
    Comment(String),
}

impl Instr {
    /// The opcode, for sized instructions.
    pub fn opcode(&self) -> Option<Opcode> {
        Some(match self {
            Instr::Nop => Opcode::Nop,
            Instr::Push(_) => Opcode::Push,
            Instr::Pop => Opcode::Pop,
            Instr::JumpIfFalse(_) => Opcode::JumpIfFalse,
            Instr::Jump(_) => Opcode::Jump,
            Instr::Extern(_) => Opcode::Extern,
            Instr::Annotation(_) => Opcode::Annotation,
            Instr::JumpIndirect(_) => Opcode::JumpIndirect,
            Instr::Copy => Opcode::Copy,
            Instr::Label(_) | Instr::Export(_) | Instr::Comment(_) => return None,
        })
    }

    /// Encoded size; labels, exports and comments take no space.
    pub fn size(&self) -> u32 {
        self.opcode().map_or(0, Opcode::size)
    }

    /// The data cell this instruction addresses.
    pub fn data_operand(&self) -> Option<&str> {
        match self {
            Instr::Push(cell) | Instr::JumpIndirect(cell) => Some(cell),
            _ => None,
        }
    }
}

/// Initial value of a data cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataInit {
    /// No initial value.
    Null,
    /// A literal in listing syntax.
    Literal(String),
    /// The code offset of a label, filled in by the linker.
    Indirect(String),
    /// A resolved code offset.
    Address(u32),
    /// The receiver object.
    This,
}

/// Host-facing attributes of a data cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellAttrs {
    /// Emit `.export`.
    pub export: bool,
    /// Emit `.sync`.
    pub sync: Option<SyncMode>,
}

/// A data-section declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDecl {
    /// Cell name.
    pub name: String,
    /// Backing runtime type.
    pub real: String,
    /// Initial value.
    pub init: DataInit,
    /// Export and sync directives.
    pub attrs: CellAttrs,
    /// Source-level type, for exported cells.
    pub declared: Option<String>,
}

impl DataDecl {
    /// A plain cell with no directives.
    pub fn new(name: impl Into<String>, real: impl Into<String>, init: DataInit) -> Self {
        Self {
            name: name.into(),
            real: real.into(),
            init,
            attrs: CellAttrs::default(),
            declared: None,
        }
    }
}

/// Lowering output: unlinked data and code sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProgram {
    /// Data declarations in order.
    pub data: Vec<DataDecl>,
    /// Code in order.
    pub code: Vec<Instr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_bytes_round_trip() {
        for op in [Opcode::Nop, Opcode::Push, Opcode::JumpIndirect, Opcode::Copy] {
            let byte: u8 = op.into();
            assert_eq!(Opcode::try_from(byte), Ok(op));
        }
        assert!(Opcode::try_from(3u8).is_err());
    }

    #[test]
    fn sizes() {
        assert_eq!(Instr::Push("x".into()).size(), 8);
        assert_eq!(Instr::Copy.size(), 4);
        assert_eq!(Instr::Nop.size(), 4);
        assert_eq!(Instr::Label("l".into()).size(), 0);
        assert_eq!(Instr::Comment("c".into()).size(), 0);
        assert_eq!(Instr::Jump(CodeTarget::HALT).size(), 8);
    }
}
