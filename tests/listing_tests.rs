//! Full listing output.

use bumpalo::Bump;

use tessera::registry::StandardCatalog;
use tessera::syntax::{BinaryOp, Module};
use tessera::{AstBuilder, CompileOptions, Compiler};

fn listing(module: &Module<'_>, options: CompileOptions) -> String {
    let result = Compiler::new(options).compile(module, &StandardCatalog);
    assert!(result.is_success(), "unexpected diagnostics: {:?}", result.diagnostics);
    result.listing.expect("listing").text
}

#[test]
fn test_extern_call_listing() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let module = ast.module(&[ast.stmt(ast.method(ast.ident("Debug"), "Log", &[ast.int(1)]))]);

    let expected = "\
.data_start
    __lit_0: %SystemInt32, 1
.data_end
.code_start
    .export _start
    _start:
        PUSH, __lit_0
        EXTERN, \"UnityEngineDebug.__Log__SystemObject__SystemVoid\"
        JUMP, 0xFFFFFFFC
.code_end
";
    assert_eq!(listing(&module, CompileOptions::default()), expected);
}

#[test]
fn test_function_call_listing() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let body = ast.block(&[], Some(ast.binary(ast.ident("x"), BinaryOp::Add, ast.ident("x"))));
    let twice = ast.func(
        false,
        &[ast.param("x", false, ast.ty("int"))],
        Some(ast.ty("int")),
        body,
    );
    let module = ast.module(&[
        ast.fn_decl(&[], "twice", twice),
        ast.let_("y", ast.call(ast.ident("twice"), &[ast.int(2)])),
        ast.stmt(ast.method(ast.ident("Debug"), "Log", &[ast.ident("y")])),
    ]);

    let expected = "\
.data_start
    twice: %SystemUInt32, 0x00000070
    __l1_x: %SystemInt32, null
    y: %SystemInt32, null
    __m0_SystemInt32_0: %SystemInt32, null
    __m0_f0_SystemInt32_0: %SystemInt32, null
    __lit_0: %SystemInt32, 2
    __fn_0_ra: %SystemUInt32, null
    __sig0_arg0: %SystemInt32, null
    __sig0_ret: %SystemInt32, null
    __sig0_ra: %SystemUInt32, null
    __ret_0: %SystemUInt32, 0x00000030
.data_end
.code_start
    .export _start
    _start:
        PUSH, __lit_0
        PUSH, __sig0_arg0
        COPY
        PUSH, __ret_0
        PUSH, __sig0_ra
        COPY
        JUMP_INDIRECT, twice
    __L0:
        PUSH, __sig0_ret
        PUSH, __m0_SystemInt32_0
        COPY
        PUSH, __m0_SystemInt32_0
        PUSH, y
        COPY
        PUSH, y
        EXTERN, \"UnityEngineDebug.__Log__SystemObject__SystemVoid\"
        JUMP, 0xFFFFFFFC
    __fn_0_entry:
        PUSH, __sig0_arg0
        PUSH, __l1_x
        COPY
        PUSH, __sig0_ra
        PUSH, __fn_0_ra
        COPY
    __fn_0_body:
        PUSH, __l1_x
        PUSH, __l1_x
        PUSH, __m0_f0_SystemInt32_0
        EXTERN, \"SystemInt32.__op_Addition__SystemInt32_SystemInt32__SystemInt32\"
        PUSH, __m0_f0_SystemInt32_0
        PUSH, __sig0_ret
        COPY
        JUMP_INDIRECT, __fn_0_ra
.code_end
";
    assert_eq!(listing(&module, CompileOptions::default()), expected);
}

#[test]
fn test_comments_and_indent() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let sum = ast.binary(ast.ident("a"), BinaryOp::Add, ast.int(2));
    let module = ast.module(&[
        ast.let_mut("a", ast.int(1)),
        ast.let_("b", sum),
        ast.stmt(ast.method(ast.ident("Debug"), "Log", &[ast.ident("b")])),
    ]);

    let text = listing(&module, CompileOptions::default().with_comments(true).with_indent(2));
    assert!(text.contains("\n    # let b\n"));
    assert!(text.contains("\n  a: %SystemInt32, 1\n"));
    assert!(text.contains("\n    PUSH, a\n"));
}

#[test]
fn test_while_loop_separates_adjacent_labels() {
    let arena = Bump::new();
    let ast = AstBuilder::new(&arena);
    let body = ast.block(&[ast.stmt(ast.brk())], None);
    let module = ast.module(&[ast.stmt(ast.while_loop(ast.boolean(true), body))]);

    let text = listing(&module, CompileOptions::default());
    let code: Vec<&str> = text
        .lines()
        .skip_while(|l| *l != ".code_start")
        .map(str::trim)
        .collect();
    assert_eq!(
        code,
        vec![
            ".code_start",
            ".export _start",
            "_start:",
            "NOP",
            "__L0:",
            "PUSH, __lit_0",
            "JUMP_IF_FALSE, 0x00000024",
            "JUMP, 0x00000024",
            "JUMP, 0x00000004",
            "__L1:",
            "JUMP, 0xFFFFFFFC",
            ".code_end",
        ]
    );
}
