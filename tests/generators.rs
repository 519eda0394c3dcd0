/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

mod common;

use common::*;
use libjs_generators::ast::BinaryOp;
use libjs_generators::ast_build::*;
use libjs_generators::runtime::{GeneratorState, Value, generator};

#[test]
fn yields_and_received_values_flow_in_order() {
    let mut realm = realm(vec![generator(
        "g",
        &["a"],
        vec![
            expr(yield_(ident("a"))),
            const_("b", yield_(add(ident("a"), num(1.0)))),
            expr(yield_(binary(BinaryOp::Multiplication, ident("b"), num(2.0)))),
            return_(string("end")),
        ],
    )]);
    let g = call_global(&mut realm, "g", &[Value::Number(1.0)]);

    assert_eq!(number(&next(&mut realm, &g).0), 1.0);
    assert_eq!(number(&next(&mut realm, &g).0), 2.0);
    assert_eq!(number(&next_with(&mut realm, &g, Value::Number(5.0)).0), 10.0);
    let (value, done) = next(&mut realm, &g);
    assert!(done);
    assert_eq!(text(&value), "end");
}

#[test]
fn return_before_start_skips_the_body() {
    let mut realm = realm(vec![generator(
        "g",
        &[],
        vec![expr(call(ident("effect"), vec![])), expr(yield_(num(1.0)))],
    )]);
    let effects = counting_global(&mut realm, "effect", Value::Undefined);
    let g = call_global(&mut realm, "g", &[]);

    let (value, done) = resume(&mut realm, &g, "return", Value::Number(42.0)).unwrap();
    assert!(done);
    assert_eq!(number(&value), 42.0);
    assert_eq!(effects.get(), 0);

    let (value, done) = next(&mut realm, &g);
    assert!(done);
    assert!(value.is_undefined());
    assert_eq!(effects.get(), 0);
}

#[test]
fn throw_before_start_completes_and_rethrows() {
    let mut realm = realm(vec![generator(
        "g",
        &[],
        vec![try_catch(
            vec![expr(yield_(num(1.0)))],
            Some("e"),
            vec![expr(yield_(string("caught")))],
        )],
    )]);
    let g = call_global(&mut realm, "g", &[]);

    let exception = resume(&mut realm, &g, "throw", Value::string("boom")).unwrap_err();
    assert_eq!(text(&exception), "boom");
    let object = g.as_object().unwrap();
    assert_eq!(generator::generator_state(object), Some(GeneratorState::Completed));
}

#[test]
fn states_follow_the_lifecycle() {
    let mut realm = realm(vec![generator("g", &[], vec![expr(yield_(num(1.0)))])]);
    let g = call_global(&mut realm, "g", &[]);
    let object = g.as_object().unwrap().clone();

    assert_eq!(generator::generator_state(&object), Some(GeneratorState::SuspendedAtStart));
    next(&mut realm, &g);
    assert_eq!(generator::generator_state(&object), Some(GeneratorState::SuspendedAtYield(0)));
    next(&mut realm, &g);
    assert_eq!(generator::generator_state(&object), Some(GeneratorState::Completed));
}

#[test]
fn thrown_values_reach_the_bodys_handlers() {
    let mut realm = realm(vec![generator(
        "g",
        &[],
        vec![try_catch(
            vec![expr(yield_(num(1.0)))],
            Some("e"),
            vec![expr(yield_(add(string("caught:"), ident("e"))))],
        )],
    )]);
    let g = call_global(&mut realm, "g", &[]);
    next(&mut realm, &g);

    let (value, done) = resume(&mut realm, &g, "throw", Value::string("boom")).unwrap();
    assert!(!done);
    assert_eq!(text(&value), "caught:boom");
    assert!(next(&mut realm, &g).1);
}

#[test]
fn return_runs_finally_blocks() {
    let mut realm = realm(vec![generator(
        "g",
        &[],
        vec![try_finally(
            vec![expr(yield_(num(1.0))), expr(yield_(num(2.0)))],
            vec![expr(call(ident("cleanup"), vec![]))],
        )],
    )]);
    let cleanups = counting_global(&mut realm, "cleanup", Value::Undefined);
    let g = call_global(&mut realm, "g", &[]);
    next(&mut realm, &g);

    let (value, done) = resume(&mut realm, &g, "return", Value::Number(7.0)).unwrap();
    assert!(done);
    assert_eq!(number(&value), 7.0);
    assert_eq!(cleanups.get(), 1);
}

#[test]
fn finally_can_yield_during_a_return() {
    let mut realm = realm(vec![generator(
        "g",
        &[],
        vec![try_finally(vec![expr(yield_(num(1.0)))], vec![expr(yield_(string("cleanup")))])],
    )]);
    let g = call_global(&mut realm, "g", &[]);
    next(&mut realm, &g);

    let (value, done) = resume(&mut realm, &g, "return", Value::Number(7.0)).unwrap();
    assert!(!done);
    assert_eq!(text(&value), "cleanup");
    let (value, done) = next(&mut realm, &g);
    assert!(done);
    assert_eq!(number(&value), 7.0);
}

#[test]
fn completed_generators_stay_completed() {
    let mut realm = realm(vec![generator("g", &[], vec![])]);
    let g = call_global(&mut realm, "g", &[]);
    assert!(next(&mut realm, &g).1);

    let (value, done) = next(&mut realm, &g);
    assert!(done && value.is_undefined());
    let (value, done) = resume(&mut realm, &g, "return", Value::Number(3.0)).unwrap();
    assert!(done);
    assert_eq!(number(&value), 3.0);
    let exception = resume(&mut realm, &g, "throw", Value::string("late")).unwrap_err();
    assert_eq!(text(&exception), "late");
}

#[test]
fn reentering_a_running_generator_is_a_type_error() {
    let mut realm =
        realm(vec![generator("g", &[], vec![expr(yield_(call(ident("reenter"), vec![])))])]);
    let reenter = native(&realm, |realm, _, _| {
        let current = realm.get_global("current")?;
        let next = realm.get(&current, &"next".into())?;
        realm.call(&next, &current, &[])
    });
    realm.set_global("reenter", reenter);
    let g = call_global(&mut realm, "g", &[]);
    realm.set_global("current", g.clone());

    let exception = resume(&mut realm, &g, "next", Value::Undefined).unwrap_err();
    assert_eq!(error_message(&exception), "generator is already running");
}

#[test]
fn locals_survive_suspensions_inside_loops() {
    let body = vec![
        let_("i", num(0.0)),
        let_("total", num(0.0)),
        while_(
            less_than(ident("i"), ident("n")),
            block(vec![
                expr(assign(ident("total"), add(ident("total"), yield_(ident("i"))))),
                expr(increment(ident("i"), false)),
            ]),
        ),
        return_(ident("total")),
    ];
    let mut realm = realm(vec![generator("count", &["n"], body)]);
    let g = call_global(&mut realm, "count", &[Value::Number(3.0)]);

    let mut yielded = vec![number(&next(&mut realm, &g).0)];
    for sent in [10.0, 20.0] {
        yielded.push(number(&next_with(&mut realm, &g, Value::Number(sent)).0));
    }
    assert_eq!(yielded, vec![0.0, 1.0, 2.0]);
    let (value, done) = next_with(&mut realm, &g, Value::Number(30.0));
    assert!(done);
    assert_eq!(number(&value), 60.0);
}

#[test]
fn parameter_defaults_run_at_call_time() {
    let mut function = generator("g", &[], vec![expr(yield_(ident("a")))]);
    function.parameters = vec![param_with_default("a", call(ident("effect"), vec![]))];
    let mut realm = realm(vec![function]);
    let effects = counting_global(&mut realm, "effect", Value::Number(9.0));

    let g = call_global(&mut realm, "g", &[]);
    assert_eq!(effects.get(), 1);
    assert_eq!(number(&next(&mut realm, &g).0), 9.0);
    assert_eq!(effects.get(), 1);
}

#[test]
fn generators_are_iterable() {
    let mut realm = realm(vec![
        generator("inner", &[], vec![expr(yield_(num(1.0))), expr(yield_(num(2.0)))]),
        generator(
            "outer",
            &[],
            vec![for_of(
                "x",
                call(ident("inner"), vec![]),
                expr(yield_(add(ident("x"), num(10.0)))),
            )],
        ),
    ]);
    let g = call_global(&mut realm, "outer", &[]);
    let (values, _) = drain(&mut realm, &g);
    assert_eq!(numbers(&values), vec![11.0, 12.0]);
}

#[test]
fn uncaught_exceptions_complete_the_generator() {
    let mut realm =
        realm(vec![generator("g", &[], vec![expr(yield_(num(1.0))), throw(string("bad"))])]);
    let g = call_global(&mut realm, "g", &[]);
    next(&mut realm, &g);

    let exception = resume(&mut realm, &g, "next", Value::Undefined).unwrap_err();
    assert_eq!(text(&exception), "bad");
    assert!(next(&mut realm, &g).1);
}

#[test]
fn suspensions_after_a_jump_are_never_reached() {
    let mut realm = realm(vec![
        generator(
            "after_return",
            &[],
            vec![expr(yield_(num(1.0))), return_(num(2.0)), expr(yield_(num(3.0)))],
        ),
        generator(
            "after_break",
            &[],
            vec![
                while_(
                    boolean(true),
                    block(vec![
                        expr(yield_(num(1.0))),
                        break_(None),
                        expr(yield_star(ident("missing"))),
                    ]),
                ),
                expr(yield_(num(4.0))),
            ],
        ),
    ]);

    let g = call_global(&mut realm, "after_return", &[]);
    let (values, completion) = drain(&mut realm, &g);
    assert_eq!(numbers(&values), vec![1.0]);
    assert_eq!(number(&completion), 2.0);

    let g = call_global(&mut realm, "after_break", &[]);
    let (values, completion) = drain(&mut realm, &g);
    assert_eq!(numbers(&values), vec![1.0, 4.0]);
    assert!(completion.is_undefined());
}
