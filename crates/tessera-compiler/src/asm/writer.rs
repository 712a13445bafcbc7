//! Listing text output.

use std::fmt;

use super::{CodeTarget, DataInit, Instr, LinkedProgram};

/// Render a linked program as a two-section listing.
///
/// Directives and labels sit one level inside their section markers, and
/// instructions one level further.
pub fn write_listing(program: &LinkedProgram, indent: usize) -> String {
    ListingText { program, indent }.to_string()
}

/// [`fmt::Display`] view of a linked program.
pub struct ListingText<'a> {
    /// The program to render.
    pub program: &'a LinkedProgram,
    /// Spaces per nesting level.
    pub indent: usize,
}

impl fmt::Display for ListingText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let program = self.program;
        let one = " ".repeat(self.indent);
        let two = " ".repeat(self.indent * 2);

        writeln!(f, ".data_start")?;
        for cell in &program.cells {
            let decl = &cell.decl;
            if decl.attrs.export {
                writeln!(f, "{one}.export {}", decl.name)?;
            }
            if let Some(mode) = decl.attrs.sync {
                writeln!(f, "{one}.sync {}, {}", decl.name, mode.as_str())?;
            }
            writeln!(f, "{one}{}: %{}, {}", decl.name, decl.real, render_init(&decl.init))?;
        }
        writeln!(f, ".data_end")?;

        writeln!(f, ".code_start")?;
        for instr in &program.code {
            match instr {
                Instr::Label(name) => writeln!(f, "{one}{name}:")?,
                Instr::Export(name) => writeln!(f, "{one}.export {name}")?,
                Instr::Comment(text) => writeln!(f, "{two}# {text}")?,
                _ => writeln!(f, "{two}{}", render_instr(instr, program))?,
            }
        }
        writeln!(f, ".code_end")
    }
}

fn render_init(init: &DataInit) -> String {
    match init {
        DataInit::Null => "null".to_string(),
        DataInit::Literal(text) => text.clone(),
        DataInit::Address(address) => hex(*address),
        // Unpatched indirect cells only reach here from hand-built programs.
        DataInit::Indirect(_) => "null".to_string(),
        DataInit::This => "this".to_string(),
    }
}

fn render_instr(instr: &Instr, program: &LinkedProgram) -> String {
    let Some(op) = instr.opcode() else {
        return String::new();
    };
    let name = op.mnemonic();
    match instr {
        Instr::Push(cell) | Instr::JumpIndirect(cell) => format!("{name}, {cell}"),
        Instr::Jump(target) | Instr::JumpIfFalse(target) => {
            format!("{name}, {}", render_target(target, program))
        }
        Instr::Extern(method) => format!("{name}, \"{method}\""),
        Instr::Annotation(text) => format!("{name}, \"{text}\""),
        _ => name.to_string(),
    }
}

fn render_target(target: &CodeTarget, program: &LinkedProgram) -> String {
    match target {
        CodeTarget::Address(address) => hex(*address),
        CodeTarget::Label(label) => program
            .label_offset(label)
            .map(hex)
            .unwrap_or_else(|| label.clone()),
    }
}

fn hex(value: u32) -> String {
    format!("0x{value:08X}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::{DataDecl, RawProgram, link};
    use tessera_syntax::SyncMode;

    #[test]
    fn writes_both_sections() {
        let mut speed = DataDecl::new("speed", "SystemSingle", DataInit::Literal("1.5".into()));
        speed.attrs.export = true;
        speed.attrs.sync = Some(SyncMode::Linear);
        let program = RawProgram {
            data: vec![speed],
            code: vec![
                Instr::Export("_start".into()),
                Instr::Label("_start".into()),
                Instr::Push("speed".into()),
                Instr::Extern("UnityEngineDebug.__Log__SystemObject__SystemVoid".into()),
                Instr::Jump(CodeTarget::HALT),
            ],
        };
        let text = write_listing(&link(program).unwrap(), 4);

        let expected = "\
.data_start
    .export speed
    .sync speed, linear
    speed: %SystemSingle, 1.5
.data_end
.code_start
    .export _start
    _start:
        PUSH, speed
        EXTERN, \"UnityEngineDebug.__Log__SystemObject__SystemVoid\"
        JUMP, 0xFFFFFFFC
.code_end
";
        assert_eq!(text, expected);
    }

    #[test]
    fn jumps_render_as_hex_offsets() {
        let program = RawProgram {
            data: vec![DataDecl::new("c", "SystemBoolean", DataInit::Null)],
            code: vec![
                Instr::Label("top".into()),
                Instr::Push("c".into()),
                Instr::JumpIfFalse(CodeTarget::Label("out".into())),
                Instr::Jump(CodeTarget::Label("top".into())),
                Instr::Label("out".into()),
                Instr::Nop,
            ],
        };
        let text = write_listing(&link(program).unwrap(), 2);
        assert!(text.contains("    JUMP_IF_FALSE, 0x00000018\n"));
        assert!(text.contains("    JUMP, 0x00000000\n"));
        assert!(text.contains("  c: %SystemBoolean, null\n"));
    }

    #[test]
    fn display_view_matches_the_written_text() {
        let program = link(RawProgram {
            data: vec![DataDecl::new("c", "SystemBoolean", DataInit::Null)],
            code: vec![Instr::Label("top".into()), Instr::Push("c".into())],
        })
        .unwrap();
        let view = ListingText {
            program: &program,
            indent: 3,
        };
        assert_eq!(format!("{view}"), write_listing(&program, 3));
    }
}
