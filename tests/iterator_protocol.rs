/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

mod common;

use common::*;
use libjs_generators::ast_build::*;
use libjs_generators::ir::function::WellKnownSymbol;
use libjs_generators::runtime::{PropertyKey, Value};

fn values(range: std::ops::Range<u32>) -> Vec<Value> {
    range.map(|n| Value::Number(f64::from(n))).collect()
}

fn yield_each() -> libjs_generators::ast::FunctionData {
    generator("g", &["iterable"], vec![for_of("x", ident("iterable"), expr(yield_(ident("x"))))])
}

#[test]
fn early_return_closes_the_loop_iterator_once() {
    let mut realm = realm(vec![yield_each()]);
    let (iterable, counters) = counting_iterable(&realm, values(1..4), OnReturn::Done);
    let g = call_global(&mut realm, "g", &[iterable]);

    assert_eq!(number(&next(&mut realm, &g).0), 1.0);
    let (value, done) = resume(&mut realm, &g, "return", Value::string("v")).unwrap();
    assert!(done);
    assert_eq!(text(&value), "v");
    assert_eq!(counters.return_calls.get(), 1);
    assert_eq!(counters.next_calls.get(), 1);
}

#[test]
fn the_iterator_is_acquired_once_per_loop() {
    let mut realm = realm(vec![yield_each()]);
    let (iterable, counters) = counting_iterable(&realm, values(0..5), OnReturn::Done);
    let g = call_global(&mut realm, "g", &[iterable]);

    let (yielded, _) = drain(&mut realm, &g);
    assert_eq!(numbers(&yielded), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(counters.acquired.get(), 1);
    assert_eq!(counters.next_calls.get(), 6);
    assert_eq!(counters.return_calls.get(), 0);
}

#[test]
fn break_closes_the_iterator() {
    let mut realm = realm(vec![generator(
        "g",
        &["iterable"],
        vec![
            for_of("x", ident("iterable"), block(vec![expr(yield_(ident("x"))), break_(None)])),
            return_(string("after")),
        ],
    )]);
    let (iterable, counters) = counting_iterable(&realm, values(0..3), OnReturn::Done);
    let g = call_global(&mut realm, "g", &[iterable]);

    next(&mut realm, &g);
    let (value, done) = next(&mut realm, &g);
    assert!(done);
    assert_eq!(text(&value), "after");
    assert_eq!(counters.return_calls.get(), 1);
}

#[test]
fn non_object_next_results_are_type_errors() {
    let mut realm = realm(vec![yield_each()]);
    let iterator = realm.new_object();
    iterator.set("next".into(), native(&realm, |_, _, _| Ok(Value::Number(1.0))));
    let iterable = realm.new_object();
    let iterator = Value::Object(iterator);
    iterable.set(
        PropertyKey::Symbol(WellKnownSymbol::Iterator),
        native(&realm, move |_, _, _| Ok(iterator.clone())),
    );
    let g = call_global(&mut realm, "g", &[Value::Object(iterable)]);

    let exception = resume(&mut realm, &g, "next", Value::Undefined).unwrap_err();
    assert_eq!(error_message(&exception), "iterator.next() did not return an object");
}

#[test]
fn non_iterables_are_rejected() {
    let mut realm = realm(vec![yield_each()]);
    let g = call_global(&mut realm, "g", &[Value::Number(5.0)]);
    let exception = resume(&mut realm, &g, "next", Value::Undefined).unwrap_err();
    assert_eq!(error_message(&exception), "value is not iterable");

    let iterable = realm.new_object();
    iterable.set(
        PropertyKey::Symbol(WellKnownSymbol::Iterator),
        native(&realm, |_, _, _| Ok(Value::Null)),
    );
    let g = call_global(&mut realm, "g", &[Value::Object(iterable)]);
    let exception = resume(&mut realm, &g, "next", Value::Undefined).unwrap_err();
    assert_eq!(error_message(&exception), "iterator is not an object");
}

#[test]
fn a_throwing_body_keeps_its_exception_when_close_fails() {
    let mut realm = realm(vec![generator(
        "g",
        &["iterable"],
        vec![try_catch(
            vec![for_of("x", ident("iterable"), throw(string("body")))],
            Some("e"),
            vec![expr(yield_(ident("e")))],
        )],
    )]);
    let (iterable, counters) = counting_iterable(&realm, values(0..3), OnReturn::Throws("close"));
    let g = call_global(&mut realm, "g", &[iterable]);

    assert_eq!(text(&next(&mut realm, &g).0), "body");
    assert_eq!(counters.return_calls.get(), 1);
}

#[test]
fn a_non_object_return_result_fails_a_normal_close() {
    let mut realm = realm(vec![generator(
        "g",
        &["iterable"],
        vec![
            try_catch(
                vec![for_of("x", ident("iterable"), break_(None))],
                Some("e"),
                vec![expr(yield_(member(ident("e"), "message")))],
            ),
        ],
    )]);
    let (iterable, _) = counting_iterable(&realm, values(0..3), OnReturn::NotAnObject);
    let g = call_global(&mut realm, "g", &[iterable]);

    assert_eq!(text(&next(&mut realm, &g).0), "iterator.return() did not return an object");
}

#[test]
fn destructuring_closes_unless_exhausted() {
    let mut realm = realm(vec![
        function(
            "first",
            &["iterable"],
            vec![
                const_pattern(array_pattern(vec![bind("a")]), ident("iterable")),
                return_(ident("a")),
            ],
        ),
        function(
            "rest",
            &["iterable"],
            vec![
                const_pattern(
                    array_pattern(vec![bind("a"), bind_rest("others")]),
                    ident("iterable"),
                ),
                return_(ident("others")),
            ],
        ),
    ]);

    let (iterable, counters) = counting_iterable(&realm, values(7..10), OnReturn::Done);
    assert_eq!(number(&call_global(&mut realm, "first", &[iterable])), 7.0);
    assert_eq!(counters.return_calls.get(), 1);

    let (iterable, counters) = counting_iterable(&realm, values(7..10), OnReturn::Done);
    let others = call_global(&mut realm, "rest", &[iterable]);
    assert_eq!(numbers(&others.as_object().unwrap().array_elements()), vec![8.0, 9.0]);
    assert_eq!(counters.return_calls.get(), 0);
}

#[test]
fn spread_drains_without_closing() {
    let mut realm = realm(vec![function(
        "spread",
        &["iterable"],
        vec![return_(array(vec![num(0.0), spread(ident("iterable"))]))],
    )]);
    let (iterable, counters) = counting_iterable(&realm, values(1..3), OnReturn::Done);

    let array = call_global(&mut realm, "spread", &[iterable]);
    assert_eq!(numbers(&array.as_object().unwrap().array_elements()), vec![0.0, 1.0, 2.0]);
    assert_eq!(counters.next_calls.get(), 3);
    assert_eq!(counters.return_calls.get(), 0);
}

#[test]
fn arrays_iterate_natively() {
    let mut realm = realm(vec![yield_each()]);
    let array = realm.new_array(values(3..5));
    let g = call_global(&mut realm, "g", &[array]);
    let (yielded, _) = drain(&mut realm, &g);
    assert_eq!(numbers(&yielded), vec![3.0, 4.0]);
}
