/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

mod common;

use common::*;
use libjs_generators::ast::FunctionKind;
use libjs_generators::ast_build::*;
use libjs_generators::ir::cfg;
use libjs_generators::ir::function::{SuspensionKind, TryRegionKind};
use libjs_generators::ir::instruction::{Builtin, Instruction};
use libjs_generators::{CompileError, LoweringOptions, compile_function, dump_function};

#[test]
fn every_suspension_resumes_in_its_own_resume_block() {
    let program = compile(vec![generator(
        "g",
        &[],
        vec![expr(yield_(num(1.0))), expr(yield_star(array(vec![]))), expr(yield_(num(2.0)))],
    )]);
    let function = &program.functions[0];
    assert_eq!(function.suspension_points.len(), 3);

    let kinds: Vec<SuspensionKind> =
        function.suspension_points.iter().map(|point| point.kind).collect();
    assert_eq!(
        kinds,
        vec![SuspensionKind::Yield, SuspensionKind::YieldDelegate, SuspensionKind::Yield]
    );
    for point in &function.suspension_points {
        let target = point.resume_target.expect("resolved resume target");
        assert!(function.block(target).is_resume_block());
    }
    // One more for the start suspension.
    assert_eq!(function.resume_blocks().count(), 4);
    assert!(function.start_resume_target.is_some());
    assert!(cfg::verify(function).is_ok());
}

#[test]
fn suspension_points_record_their_try_regions() {
    let program = compile(vec![generator(
        "g",
        &["iterable"],
        vec![try_finally(
            vec![for_of("x", ident("iterable"), expr(yield_(ident("x"))))],
            vec![expr(yield_(num(0.0)))],
        )],
    )]);
    let function = &program.functions[0];
    let regions: Vec<TryRegionKind> = function.suspension_points[0]
        .enclosing_try_regions
        .iter()
        .map(|id| function.try_regions.iter().find(|region| region.id == *id).unwrap().kind)
        .collect();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0], TryRegionKind::Finally);
    assert!(matches!(regions[1], TryRegionKind::IteratorClose(_)));
    assert!(function.suspension_points[1].enclosing_try_regions.is_empty());
}

#[test]
fn live_locals_cover_values_used_after_the_suspension() {
    let program = compile(vec![generator(
        "g",
        &["a"],
        vec![
            let_("unused", num(1.0)),
            let_("kept", num(2.0)),
            expr(yield_(num(0.0))),
            return_(add(ident("kept"), ident("a"))),
        ],
    )]);
    let function = &program.functions[0];
    let live = &function.suspension_points[0].live_locals;
    assert_eq!(live.len(), 2);
    assert!(live.iter().any(|operand| operand.is_argument()));
    assert!(live.iter().all(|operand| operand.is_variable()));
}

#[test]
fn async_functions_become_a_wrapper_and_a_body() {
    let program = compile(vec![async_function("f", &["x"], vec![return_(await_(ident("x")))])]);
    assert_eq!(program.functions.len(), 2);

    let wrapper = program.function_by_name("f").unwrap();
    assert_eq!(wrapper.kind, FunctionKind::Normal);
    assert!(wrapper.blocks.iter().flat_map(|block| block.instructions()).any(|instruction| matches!(
        instruction,
        Instruction::CallBuiltin { builtin: Builtin::AsyncPump, .. }
    )));

    let body = program.functions.iter().find(|function| function.name == "f:body").unwrap();
    assert!(body.is_generator());
    assert!(body.suspension_points.iter().all(|point| point.kind == SuspensionKind::Await));
}

#[test]
fn merges_can_be_switched_off() {
    let function = generator(
        "count",
        &[],
        vec![
            let_("i", num(0.0)),
            while_(
                less_than(ident("i"), num(3.0)),
                block(vec![expr(yield_(ident("i"))), expr(increment(ident("i"), false))]),
            ),
        ],
    );
    let merged = compile_function(&function, &LoweringOptions::default()).unwrap();
    assert_eq!(merged.functions[0].merge_headers.len(), 1);

    let plain =
        compile_function(&function, &LoweringOptions::default().without_merge_phis()).unwrap();
    assert!(plain.functions[0].merge_headers.is_empty());
    let has_phi = plain.functions[0]
        .blocks
        .iter()
        .flat_map(|block| block.instructions())
        .any(|instruction| matches!(instruction, Instruction::Phi { .. }));
    assert!(!has_phi);
}

#[test]
fn unsupported_constructs_are_reported() {
    let options = LoweringOptions::default();

    let mut async_generator = generator("ag", &[], vec![]);
    async_generator.kind = FunctionKind::AsyncGenerator;
    assert!(matches!(
        compile_function(&async_generator, &options),
        Err(CompileError::Unsupported { .. })
    ));

    let stray_yield = function("f", &[], vec![expr(yield_(num(1.0)))]);
    let error = compile_function(&stray_yield, &options).unwrap_err();
    assert_eq!(error.function(), "f");
    assert!(matches!(error, CompileError::Unsupported { .. }));

    let stray_await = generator("g", &[], vec![expr(await_(num(1.0)))]);
    assert!(matches!(
        compile_function(&stray_await, &options),
        Err(CompileError::Unsupported { .. })
    ));
}

#[test]
fn unreachable_suspensions_keep_their_resume_blocks() {
    let program = compile(vec![generator(
        "g",
        &[],
        vec![
            expr(yield_(num(1.0))),
            return_(num(2.0)),
            expr(yield_(num(3.0))),
            expr(yield_star(array(vec![]))),
        ],
    )]);
    let function = &program.functions[0];
    assert!(cfg::verify(function).is_ok());

    let reachable = cfg::reachable_blocks(function);
    let targets: Vec<_> =
        function
            .suspension_points
            .iter()
            .map(|point| point.resume_target.expect("resolved resume target"))
            .collect();
    assert!(reachable.contains(&targets[0]));
    assert!(!reachable.contains(&targets[1]));
    assert!(!reachable.contains(&targets[2]));
}

#[test]
fn unknown_labels_are_rejected() {
    let function = generator("g", &[], vec![while_(boolean(true), break_(Some("nowhere")))]);
    let error = compile_function(&function, &LoweringOptions::default()).unwrap_err();
    assert!(matches!(error, CompileError::UnknownJumpLabel { .. }));
}

#[test]
fn dumps_show_suspensions_and_handlers() {
    let program = compile(vec![generator(
        "g",
        &[],
        vec![try_catch(vec![expr(yield_(num(1.0)))], Some("e"), vec![])],
    )]);
    let dump = dump_function(&program.functions[0]);
    assert!(dump.starts_with("function g (generator"));
    assert!(dump.contains("StartGenerator"));
    assert!(dump.contains("SaveAndYield"));
    assert!(dump.contains("suspension #0 Yield"));
    assert!(dump.contains("(handler @"));
}
