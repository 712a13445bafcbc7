//! Performance benchmarks for the compilation pipeline.
//!
//! Modules are built with the AST builder, so only analysis, lowering,
//! linking and listing output are measured:
//! - Size-based: straight-line modules of growing statement counts
//! - Feature-specific: loops, branches and function calls

use bumpalo::Bump;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tessera::registry::StandardCatalog;
use tessera::syntax::{BinaryOp, Module, Stmt};
use tessera::{AstBuilder, Compiler};

/// `let mut acc = 0;` followed by `count` accumulating assignments.
fn straight_line<'a>(ast: &AstBuilder<'a>, count: usize) -> Module<'a> {
    let mut items: Vec<Stmt<'a>> = vec![ast.let_mut("acc", ast.int(0))];
    for i in 0..count {
        let sum = ast.binary(ast.ident("acc"), BinaryOp::Add, ast.int(i as i64));
        items.push(ast.stmt(ast.assign(ast.ident("acc"), sum)));
    }
    items.push(ast.stmt(ast.method(ast.ident("Debug"), "Log", &[ast.ident("acc")])));
    ast.module(&items)
}

/// Functions called from loops and branches.
fn control_flow<'a>(ast: &AstBuilder<'a>, count: usize) -> Module<'a> {
    let mut items: Vec<Stmt<'a>> = vec![ast.let_mut("acc", ast.int(0))];
    for i in 0..count {
        let name = format!("step{i}");
        let body = ast.block(&[], Some(ast.binary(ast.ident("v"), BinaryOp::Mul, ast.int(2))));
        let func = ast.func(false, &[ast.param("v", false, ast.ty("int"))], Some(ast.ty("int")), body);
        items.push(ast.fn_decl(&[], &name, func));

        let call = ast.call(ast.ident(&name), &[ast.ident("x")]);
        let add = ast.binary(ast.ident("acc"), BinaryOp::Add, call);
        let positive = ast.binary(ast.ident("x"), BinaryOp::Greater, ast.int(1));
        let branch = ast.if_else(positive, ast.block(&[ast.stmt(ast.assign(ast.ident("acc"), add))], None), None);
        let array = ast.array(&[ast.int(1), ast.int(2), ast.int(3)]);
        items.push(ast.stmt(ast.for_loop("x", array, ast.block(&[ast.stmt(branch)], None))));
    }
    items.push(ast.stmt(ast.method(ast.ident("Debug"), "Log", &[ast.ident("acc")])));
    ast.module(&items)
}

fn size_based_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/statements");
    let compiler = Compiler::default();

    for count in [10usize, 100, 1000] {
        let arena = Bump::new();
        let ast = AstBuilder::new(&arena);
        let module = straight_line(&ast, count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("straight_line_{count}"), |b| {
            b.iter(|| {
                let result = compiler.compile(black_box(&module), &StandardCatalog);
                black_box(result.listing.map(|l| l.text.len()))
            });
        });
    }

    group.finish();
}

fn feature_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/features");
    let compiler = Compiler::default();

    for count in [10usize, 100] {
        let arena = Bump::new();
        let ast = AstBuilder::new(&arena);
        let module = control_flow(&ast, count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("control_flow_{count}"), |b| {
            b.iter(|| {
                let result = compiler.compile(black_box(&module), &StandardCatalog);
                black_box(result.listing.map(|l| l.text.len()))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, size_based_benchmarks, feature_benchmarks);
criterion_main!(benches);
