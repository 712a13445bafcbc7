//! Two-pass layout and patching.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{debug, trace};

use tessera_core::InternalError;

use super::{CodeTarget, DataDecl, DataInit, Instr, RawProgram};

/// Errors raised while linking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// A label was defined twice.
    #[error("duplicate label '{0}'")]
    DuplicateLabel(String),

    /// A jump or indirect cell names a label that was never defined.
    #[error("undefined label '{0}'")]
    UndefinedLabel(String),

    /// An instruction addresses a data cell that was never declared.
    #[error("undefined data cell '{0}'")]
    UndefinedData(String),

    /// A data cell was declared twice.
    #[error("duplicate data cell '{0}'")]
    DuplicateData(String),
}

impl From<LinkError> for InternalError {
    fn from(err: LinkError) -> Self {
        InternalError::Link {
            message: err.to_string(),
        }
    }
}

/// A data cell that survived dead-data elimination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedCell {
    /// The declaration, with indirect addresses patched.
    pub decl: DataDecl,
    /// Storage offset among used cells.
    pub offset: u32,
}

/// A laid-out program ready for writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedProgram {
    /// Used data cells in declaration order.
    pub cells: Vec<LinkedCell>,
    /// Final code, with separating NOPs inserted.
    pub code: Vec<Instr>,
    /// Code offset of every label.
    pub labels: FxHashMap<String, u32>,
    /// Total code size in bytes.
    pub code_size: u32,
}

impl LinkedProgram {
    /// Offset of a code label.
    pub fn label_offset(&self, label: &str) -> Option<u32> {
        self.labels.get(label).copied()
    }

    /// A surviving data cell by name.
    pub fn cell(&self, name: &str) -> Option<&LinkedCell> {
        self.cells.iter().find(|c| c.decl.name == name)
    }
}

/// Lay out, patch and strip a raw program.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn link(program: RawProgram) -> Result<LinkedProgram, LinkError> {
    let (code, labels, code_size) = layout_code(program.code)?;
    check_jumps(&code, &labels)?;
    let data = patch_indirect(program.data, &labels)?;
    let cells = layout_data(data, &code)?;

    debug!(
        code_size,
        labels = labels.len(),
        cells = cells.len(),
        "linked program"
    );
    Ok(LinkedProgram {
        cells,
        code,
        labels,
        code_size,
    })
}

/// Pass 1: assign offsets, recording each label's offset and inserting a NOP
/// after a label that would otherwise share its offset with the next label.
fn layout_code(code: Vec<Instr>) -> Result<(Vec<Instr>, FxHashMap<String, u32>, u32), LinkError> {
    let mut out = Vec::with_capacity(code.len());
    let mut labels = FxHashMap::default();
    let mut offset = 0u32;
    // Position just after the last label not yet followed by a sized instruction.
    let mut open_label: Option<usize> = None;

    for instr in code {
        if let Instr::Label(name) = &instr {
            if let Some(pos) = open_label {
                out.insert(pos, Instr::Nop);
                offset += Instr::Nop.size();
                trace!(label = %name, "separating NOP inserted");
            }
            if labels.insert(name.clone(), offset).is_some() {
                return Err(LinkError::DuplicateLabel(name.clone()));
            }
            out.push(instr);
            open_label = Some(out.len());
            continue;
        }

        let size = instr.size();
        if size > 0 {
            open_label = None;
        }
        offset += size;
        out.push(instr);
    }

    Ok((out, labels, offset))
}

fn check_jumps(code: &[Instr], labels: &FxHashMap<String, u32>) -> Result<(), LinkError> {
    for instr in code {
        if let Instr::Jump(CodeTarget::Label(label)) | Instr::JumpIfFalse(CodeTarget::Label(label)) =
            instr
            && !labels.contains_key(label)
        {
            return Err(LinkError::UndefinedLabel(label.clone()));
        }
    }
    Ok(())
}

/// Fill every indirect cell with its label's code offset.
fn patch_indirect(
    mut data: Vec<DataDecl>,
    labels: &FxHashMap<String, u32>,
) -> Result<Vec<DataDecl>, LinkError> {
    for decl in &mut data {
        if let DataInit::Indirect(label) = &decl.init {
            let address = labels
                .get(label)
                .copied()
                .ok_or_else(|| LinkError::UndefinedLabel(label.clone()))?;
            decl.init = DataInit::Address(address);
        }
    }
    Ok(data)
}

/// Pass 2: keep only cells some instruction addresses, numbering them in
/// declaration order.
fn layout_data(data: Vec<DataDecl>, code: &[Instr]) -> Result<Vec<LinkedCell>, LinkError> {
    let mut declared = FxHashSet::default();
    for decl in &data {
        if !declared.insert(decl.name.as_str()) {
            return Err(LinkError::DuplicateData(decl.name.clone()));
        }
    }

    let mut used = FxHashSet::default();
    for cell in code.iter().filter_map(Instr::data_operand) {
        if !declared.contains(cell) {
            return Err(LinkError::UndefinedData(cell.to_string()));
        }
        used.insert(cell.to_string());
    }

    let mut cells = Vec::with_capacity(used.len());
    for decl in data {
        if used.contains(&decl.name) {
            let offset = cells.len() as u32;
            cells.push(LinkedCell { decl, offset });
        } else {
            trace!(cell = %decl.name, "dropped unused cell");
        }
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str) -> Instr {
        Instr::Label(name.to_string())
    }

    fn push(cell: &str) -> Instr {
        Instr::Push(cell.to_string())
    }

    fn cell(name: &str) -> DataDecl {
        DataDecl::new(name, "SystemInt32", DataInit::Null)
    }

    #[test]
    fn labels_record_offsets() {
        let program = RawProgram {
            data: vec![cell("a")],
            code: vec![
                label("start"),
                push("a"),
                Instr::Pop,
                label("end"),
                Instr::Jump(CodeTarget::Label("start".into())),
            ],
        };
        let linked = link(program).unwrap();
        assert_eq!(linked.label_offset("start"), Some(0));
        assert_eq!(linked.label_offset("end"), Some(12));
        assert_eq!(linked.code_size, 20);
    }

    #[test]
    fn adjacent_labels_are_separated() {
        let program = RawProgram {
            data: vec![],
            code: vec![
                label("a"),
                Instr::Comment("between".into()),
                label("b"),
                Instr::Jump(CodeTarget::HALT),
            ],
        };
        let linked = link(program).unwrap();

        for pair in linked.code.windows(2) {
            assert!(!matches!(pair, [Instr::Label(_), Instr::Label(_)]));
        }
        assert_eq!(linked.code[1], Instr::Nop);
        assert_eq!(linked.label_offset("a"), Some(0));
        assert_eq!(linked.label_offset("b"), Some(4));
    }

    #[test]
    fn indirect_cells_receive_label_offsets() {
        let mut target = DataDecl::new("__fn_0", "SystemUInt32", DataInit::Indirect("f".into()));
        target.attrs.export = false;
        let program = RawProgram {
            data: vec![target],
            code: vec![
                push("__fn_0"),
                Instr::Pop,
                label("f"),
                Instr::JumpIndirect("__fn_0".into()),
            ],
        };
        let linked = link(program).unwrap();
        assert_eq!(linked.cells[0].decl.init, DataInit::Address(12));
    }

    #[test]
    fn unused_cells_are_dropped_and_offsets_compact() {
        let program = RawProgram {
            data: vec![cell("a"), cell("unused"), cell("b")],
            code: vec![push("b"), push("a"), Instr::Copy],
        };
        let linked = link(program).unwrap();
        let names: Vec<_> = linked
            .cells
            .iter()
            .map(|c| (c.decl.name.as_str(), c.offset))
            .collect();
        assert_eq!(names, vec![("a", 0), ("b", 1)]);
        assert!(linked.cell("unused").is_none());
    }

    #[test]
    fn undefined_references_fail() {
        let jump = RawProgram {
            data: vec![],
            code: vec![Instr::Jump(CodeTarget::Label("nowhere".into()))],
        };
        assert_eq!(
            link(jump),
            Err(LinkError::UndefinedLabel("nowhere".into()))
        );

        let data = RawProgram {
            data: vec![],
            code: vec![push("ghost")],
        };
        assert_eq!(link(data), Err(LinkError::UndefinedData("ghost".into())));
    }

    #[test]
    fn duplicate_label_fails() {
        let program = RawProgram {
            data: vec![],
            code: vec![label("x"), Instr::Nop, label("x")],
        };
        assert_eq!(link(program), Err(LinkError::DuplicateLabel("x".into())));
    }

    #[test]
    fn link_error_converts_to_internal() {
        let err: InternalError = LinkError::UndefinedLabel("l".into()).into();
        assert_eq!(
            err,
            InternalError::Link {
                message: "undefined label 'l'".into()
            }
        );
    }
}
