use bumpalo::Bump;

use tessera_core::{InternalError, Span};
use tessera_syntax::{AstBuilder, AttrKind, BinaryOp, Module};

use crate::analyzer::TypedModule;
use crate::analyzer::test_support::{analyze_clean, session};
use crate::asm::{CodeTarget, DataInit, HALT_ADDRESS, Instr, LinkedProgram, RawProgram, link};
use crate::session::Session;
use crate::typed::{Typed, TypedStmt};

use super::{LowerOptions, lower};

const ADD: &str = "SystemInt32.__op_Addition__SystemInt32_SystemInt32__SystemInt32";
const LOG: &str = "UnityEngineDebug.__Log__SystemObject__SystemVoid";

fn lowered(module: &Module<'_>, options: &LowerOptions) -> (Session, RawProgram) {
    let (session, typed) = analyze_clean(module);
    let program = lower(&session, &typed, options).expect("module lowers");
    (session, program)
}

fn linked(module: &Module<'_>) -> LinkedProgram {
    let (_, program) = lowered(module, &LowerOptions::default());
    link(program).expect("program links")
}

/// The entry routine between `_start:` and its halting jump.
fn entry(program: &RawProgram) -> &[Instr] {
    let start = program
        .code
        .iter()
        .position(|i| *i == Instr::Label("_start".into()))
        .expect("entry label")
        + 1;
    let end = program
        .code
        .iter()
        .position(|i| *i == Instr::Jump(CodeTarget::HALT))
        .expect("halting jump");
    &program.code[start..end]
}

fn push(cell: &str) -> Instr {
    Instr::Push(cell.to_string())
}

fn copy(src: &str, dst: &str) -> [Instr; 3] {
    [push(src), push(dst), Instr::Copy]
}

fn externs(code: &[Instr]) -> Vec<&str> {
    code.iter()
        .filter_map(|i| match i {
            Instr::Extern(name) => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

fn position(code: &[Instr], instr: &Instr) -> usize {
    code.iter()
        .position(|i| i == instr)
        .unwrap_or_else(|| panic!("{instr:?} not emitted"))
}

#[test]
fn unread_literal_binding_leaves_nothing() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let module = ast.module(&[ast.let_typed("x", ast.ty("int"), ast.int(123))]);

    let (_, program) = lowered(&module, &LowerOptions::default());
    assert!(entry(&program).is_empty());
    let x = program.data.iter().find(|d| d.name == "x").unwrap();
    assert_eq!(x.init, DataInit::Literal("123".into()));

    let linked = link(program).unwrap();
    assert!(linked.cells.is_empty());
    assert_eq!(
        linked.code,
        vec![
            Instr::Export("_start".into()),
            Instr::Label("_start".into()),
            Instr::Jump(CodeTarget::HALT),
        ]
    );
}

#[test]
fn extern_calls_push_inputs_then_call() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let module = ast.module(&[ast.stmt(ast.method(ast.ident("Debug"), "Log", &[ast.int(1)]))]);

    let (_, program) = lowered(&module, &LowerOptions::default());
    assert_eq!(entry(&program), &[push("__lit_0"), Instr::Extern(LOG.into())]);
}

#[test]
fn assignment_copies_the_operator_result() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let sum = ast.binary(ast.ident("a"), BinaryOp::Add, ast.int(2));
    let module = ast.module(&[
        ast.let_mut("a", ast.int(1)),
        ast.stmt(ast.assign(ast.ident("a"), sum)),
    ]);

    let (_, program) = lowered(&module, &LowerOptions::default());
    let temp = "__m0_SystemInt32_0";
    let mut expected = vec![push("a"), push("__lit_1"), push(temp), Instr::Extern(ADD.into())];
    expected.extend(copy(temp, "a"));
    assert_eq!(entry(&program), expected.as_slice());

    let linked = link(program).unwrap();
    let names: Vec<&str> = linked.cells.iter().map(|c| c.decl.name.as_str()).collect();
    assert_eq!(names, vec!["a", temp, "__lit_1"]);
    assert_eq!(linked.cell("a").unwrap().decl.init, DataInit::Literal("1".into()));
}

#[test]
fn if_else_arms_write_the_shared_slot() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let arm = |n: i64| {
        let sum = ast.binary(ast.ident("n"), BinaryOp::Add, ast.int(n));
        ast.block(&[], Some(sum))
    };
    let choice = ast.if_else(ast.boolean(true), arm(1), Some(arm(2)));
    let module = ast.module(&[ast.let_mut("n", ast.int(0)), ast.let_("r", choice)]);

    let (_, program) = lowered(&module, &LowerOptions::default());
    let temp = "__m0_SystemInt32_0";
    let mut expected = vec![
        push("__lit_1"),
        Instr::JumpIfFalse(CodeTarget::Label("__L1".into())),
        push("n"),
        push("__lit_2"),
        push(temp),
        Instr::Extern(ADD.into()),
        Instr::Jump(CodeTarget::Label("__L0".into())),
        Instr::Label("__L1".into()),
        push("n"),
        push("__lit_3"),
        push(temp),
        Instr::Extern(ADD.into()),
        Instr::Label("__L0".into()),
    ];
    expected.extend(copy(temp, "r"));
    assert_eq!(entry(&program), expected.as_slice());
    link(program).unwrap();
}

#[test]
fn while_break_jumps_past_the_loop() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let body = ast.block(&[ast.stmt(ast.brk())], None);
    let module = ast.module(&[ast.stmt(ast.while_loop(ast.boolean(true), body))]);

    let (_, program) = lowered(&module, &LowerOptions::default());
    assert_eq!(
        entry(&program),
        &[
            Instr::Label("__L0".into()),
            push("__lit_0"),
            Instr::JumpIfFalse(CodeTarget::Label("__L1".into())),
            Instr::Jump(CodeTarget::Label("__L1".into())),
            Instr::Jump(CodeTarget::Label("__L0".into())),
            Instr::Label("__L1".into()),
        ]
    );

    // `_start:` and `__L0:` would share an offset, so a NOP separates them.
    let linked = link(program).unwrap();
    assert_eq!(linked.code[2], Instr::Nop);
    assert_eq!(linked.label_offset("_start"), Some(0));
    assert_eq!(linked.label_offset("__L0"), Some(4));
    assert_eq!(linked.label_offset("__L1"), Some(36));
    assert_eq!(linked.code_size, 44);
}

#[test]
fn for_loop_indexes_the_array() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let log = ast.method(ast.ident("Debug"), "Log", &[ast.ident("x")]);
    let body = ast.block(&[ast.stmt(log), ast.stmt(ast.cont())], None);
    let module = ast.module(&[
        ast.let_("xs", ast.array(&[ast.int(1), ast.int(2)])),
        ast.stmt(ast.for_loop("x", ast.ident("xs"), body)),
    ]);

    let (_, program) = lowered(&module, &LowerOptions::default());
    let code = entry(&program);
    assert_eq!(
        externs(code),
        vec![
            "SystemInt32Array.__ctor__SystemInt32__SystemInt32Array",
            "SystemInt32Array.__Set__SystemInt32_SystemInt32__SystemVoid",
            "SystemInt32Array.__Set__SystemInt32_SystemInt32__SystemVoid",
            "SystemInt32Array.__get_Length__SystemInt32",
            "SystemInt32.__op_LessThan__SystemInt32_SystemInt32__SystemBoolean",
            "SystemInt32Array.__Get__SystemInt32__SystemInt32",
            LOG,
            ADD,
        ]
    );

    // `continue` goes to the index step, which precedes the back edge.
    let step = Instr::Label("__L1".into());
    let to_step = Instr::Jump(CodeTarget::Label("__L1".into()));
    assert!(position(code, &to_step) < position(code, &step));
    assert!(
        position(code, &step) < position(code, &Instr::Jump(CodeTarget::Label("__L0".into())))
    );
    link(program).unwrap();
}

#[test]
fn calls_go_through_the_signature_cells() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let x = ast.ident("x");
    let body = ast.block(&[], Some(ast.binary(x, BinaryOp::Add, ast.ident("x"))));
    let twice = ast.func(
        false,
        &[ast.param("x", false, ast.ty("int"))],
        Some(ast.ty("int")),
        body,
    );
    let module = ast.module(&[
        ast.fn_decl(&[], "twice", twice),
        ast.let_("y", ast.call(ast.ident("twice"), &[ast.int(2)])),
    ]);

    let (_, program) = lowered(&module, &LowerOptions::default());
    let result = "__m0_SystemInt32_0";
    let mut expected = Vec::new();
    expected.extend(copy("__lit_0", "__sig0_arg0"));
    expected.extend(copy("__ret_0", "__sig0_ra"));
    expected.push(Instr::JumpIndirect("twice".into()));
    expected.push(Instr::Label("__L0".into()));
    expected.extend(copy("__sig0_ret", result));
    expected.extend(copy(result, "y"));
    assert_eq!(entry(&program), expected.as_slice());

    let body_temp = "__m0_f0_SystemInt32_0";
    let start = position(&program.code, &Instr::Label("__fn_0_entry".into()));
    let mut function = Vec::new();
    function.extend(copy("__sig0_arg0", "__l1_x"));
    function.extend(copy("__sig0_ra", "__fn_0_ra"));
    function.push(Instr::Label("__fn_0_body".into()));
    function.extend([push("__l1_x"), push("__l1_x"), push(body_temp), Instr::Extern(ADD.into())]);
    function.extend(copy(body_temp, "__sig0_ret"));
    function.push(Instr::JumpIndirect("__fn_0_ra".into()));
    assert_eq!(&program.code[start + 1..], function.as_slice());

    let linked = link(program).unwrap();
    let entry_offset = linked.label_offset("__fn_0_entry").unwrap();
    let back = linked.label_offset("__L0").unwrap();
    assert_eq!(linked.cell("twice").unwrap().decl.init, DataInit::Address(entry_offset));
    assert_eq!(linked.cell("__ret_0").unwrap().decl.init, DataInit::Address(back));
}

#[test]
fn exported_functions_get_a_halting_entry() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let log = ast.method(ast.ident("Debug"), "Log", &[ast.string("hi")]);
    let interact = ast.func(false, &[], None, ast.block(&[ast.stmt(log)], None));
    let module = ast.module(&[ast.fn_decl(&[ast.attr(AttrKind::Export)], "Interact", interact)]);

    let (_, program) = lowered(&module, &LowerOptions::default());
    let start = position(&program.code, &Instr::Export("Interact".into()));
    let mut expected = vec![
        Instr::Export("Interact".into()),
        Instr::Label("Interact".into()),
    ];
    expected.extend(copy("__halt", "__fn_0_ra"));
    expected.push(Instr::Jump(CodeTarget::Label("__fn_0_body".into())));
    assert_eq!(&program.code[start..start + expected.len()], expected.as_slice());

    let linked = link(program).unwrap();
    assert_eq!(
        linked.cell("__halt").unwrap().decl.init,
        DataInit::Address(HALT_ADDRESS)
    );
}

#[test]
fn logical_and_skips_the_right_operand() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let both = ast.binary(ast.ident("a"), BinaryOp::LogicalAnd, ast.ident("b"));
    let module = ast.module(&[
        ast.let_("a", ast.boolean(true)),
        ast.let_("b", ast.boolean(false)),
        ast.let_("c", both),
    ]);

    let (_, program) = lowered(&module, &LowerOptions::default());
    let result = "__m0_SystemBoolean_0";
    let mut expected = Vec::new();
    expected.extend(copy("a", result));
    expected.push(push(result));
    expected.push(Instr::JumpIfFalse(CodeTarget::Label("__L0".into())));
    expected.extend(copy("b", result));
    expected.push(Instr::Label("__L0".into()));
    expected.extend(copy(result, "c"));
    assert_eq!(entry(&program), expected.as_slice());
}

#[test]
fn coalesce_tests_the_left_value_for_null() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let either = ast.binary(ast.ident("s"), BinaryOp::Coalesce, ast.string("x"));
    let module = ast.module(&[
        ast.let_typed("s", ast.ty("string"), ast.null()),
        ast.let_("t", either),
    ]);

    let (_, program) = lowered(&module, &LowerOptions::default());
    let code = entry(&program);
    assert_eq!(
        externs(code),
        vec!["SystemObject.__ReferenceEquals__SystemObject_SystemObject__SystemBoolean"]
    );
    let test = position(code, &push("__m0_SystemBoolean_0"));
    let skip = position(code, &Instr::JumpIfFalse(CodeTarget::Label("__L0".into())));
    assert!(test < skip);
    link(program).unwrap();
}

#[test]
fn destructured_tuple_copies_each_component() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let pattern = ast.tuple_pattern(&["a", "b"]);
    let init = ast.tuple(&[ast.int(1), ast.string("s")]);
    let module = ast.module(&[ast.binding(&[], false, pattern, None, init)]);

    let (_, program) = lowered(&module, &LowerOptions::default());
    let mut expected = Vec::new();
    expected.extend(copy("__lit_0", "a"));
    expected.extend(copy("__lit_1", "b"));
    assert_eq!(entry(&program), expected.as_slice());
}

#[test]
fn comments_and_entry_label_follow_the_options() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let module = ast.module(&[ast.let_("y", ast.array(&[ast.int(1)]))]);
    let options = LowerOptions {
        entry_label: "_main".to_string(),
        emit_comments: true,
    };

    let (_, program) = lowered(&module, &options);
    assert_eq!(program.code[0], Instr::Export("_main".into()));
    assert_eq!(program.code[2], Instr::Comment("let y".into()));
}

#[test]
fn invalid_nodes_are_internal_errors() {
    let session = session();
    let module = TypedModule {
        qualifier: tessera_core::QualifierId::ROOT,
        stmts: vec![TypedStmt::Expr(Typed::invalid(Span::point(3, 4)))],
    };

    let err = lower(&session, &module, &LowerOptions::default()).unwrap_err();
    assert!(matches!(err, InternalError::Malformed { .. }));
    assert!(err.to_string().contains("3:4"));
}
