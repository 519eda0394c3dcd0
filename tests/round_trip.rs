/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Generator bodies against plain functions that collect the same values
//! into an array instead of yielding them.

mod common;

use common::*;
use libjs_generators::LoweringOptions;
use libjs_generators::ast::{AssignmentOp, BinaryOp, Expression, FunctionData, Statement};
use libjs_generators::ast_build::*;
use libjs_generators::runtime::{Realm, Value};

/// `out[count++] = value`
fn collect(value: Expression) -> Statement {
    expr(assign(computed_member(ident("out"), increment(ident("count"), false)), value))
}

/// ```js
/// let total = 0;
/// for (let i = 0; i < n; i++) {
///     if (i % 2 === 0) continue;
///     total += i;
///     EMIT(total * 10);
/// }
/// ```
fn odd_running_totals(emit: &dyn Fn(Expression) -> Statement) -> Vec<Statement> {
    vec![
        let_("total", num(0.0)),
        for_(
            Some(let_("i", num(0.0))),
            Some(less_than(ident("i"), ident("n"))),
            Some(increment(ident("i"), false)),
            block(vec![
                if_(
                    strict_equals(binary(BinaryOp::Modulo, ident("i"), num(2.0)), num(0.0)),
                    continue_(None),
                    None,
                ),
                expr(assign_op(AssignmentOp::AdditionAssignment, ident("total"), ident("i"))),
                emit(binary(BinaryOp::Multiplication, ident("total"), num(10.0))),
            ]),
        ),
    ]
}

/// ```js
/// outer: for (const row of rows) {
///     let j = 0;
///     while (true) {
///         try {
///             if (j === row) continue outer;
///             if (row === 3) break outer;
///             EMIT(row * 100 + j);
///         } finally {
///             j++;
///         }
///     }
/// }
/// ```
fn labelled_rows(emit: &dyn Fn(Expression) -> Statement) -> Vec<Statement> {
    vec![labelled(
        "outer",
        for_of(
            "row",
            ident("rows"),
            block(vec![
                let_("j", num(0.0)),
                while_(
                    boolean(true),
                    try_finally(
                        vec![
                            if_(
                                strict_equals(ident("j"), ident("row")),
                                continue_(Some("outer")),
                                None,
                            ),
                            if_(strict_equals(ident("row"), num(3.0)), break_(Some("outer")), None),
                            emit(add(
                                binary(BinaryOp::Multiplication, ident("row"), num(100.0)),
                                ident("j"),
                            )),
                        ],
                        vec![expr(increment(ident("j"), false))],
                    ),
                ),
            ]),
        ),
    )]
}

/// `yielding` emits with `yield`, `collecting` returns the emitted values as an array.
fn generator_and_reference(
    parameter: &str,
    build: impl Fn(&dyn Fn(Expression) -> Statement) -> Vec<Statement>,
) -> Vec<FunctionData> {
    let yielding = build(&|value| expr(yield_(value)));
    let mut collecting = vec![let_("out", array(vec![])), let_("count", num(0.0))];
    collecting.extend(build(&collect));
    collecting.push(return_(ident("out")));
    vec![
        generator("yielding", &[parameter], yielding),
        function("collecting", &[parameter], collecting),
    ]
}

fn compare(realm: &mut Realm, argument: Value) -> Vec<f64> {
    let g = call_global(realm, "yielding", &[argument.clone()]);
    let (yielded, completion) = drain(realm, &g);
    assert!(completion.is_undefined());

    let collected = call_global(realm, "collecting", &[argument]);
    let collected = numbers(&collected.as_object().unwrap().array_elements());
    assert_eq!(numbers(&yielded), collected);
    collected
}

#[test]
fn loops_with_continue_match_their_reference() {
    let mut realm = realm(generator_and_reference("n", odd_running_totals));
    assert!(compare(&mut realm, Value::Number(0.0)).is_empty());
    assert_eq!(compare(&mut realm, Value::Number(6.0)), vec![10.0, 40.0, 90.0]);
    compare(&mut realm, Value::Number(11.0));
}

#[test]
fn merges_do_not_change_the_result() {
    let mut with_merges = Realm::new(compile(generator_and_reference("n", odd_running_totals)));
    let mut without_merges = Realm::new(compile_with(
        generator_and_reference("n", odd_running_totals),
        &LoweringOptions::default().without_merge_phis(),
    ));
    assert_eq!(
        compare(&mut with_merges, Value::Number(9.0)),
        compare(&mut without_merges, Value::Number(9.0))
    );
}

#[test]
fn labelled_jumps_through_finally_match_their_reference() {
    let mut realm = realm(generator_and_reference("rows", labelled_rows));
    let rows = realm.new_array([2.0, 0.0, 1.0, 3.0, 2.0].into_iter().map(Value::Number).collect());
    assert_eq!(compare(&mut realm, rows), vec![200.0, 201.0, 100.0]);
}
