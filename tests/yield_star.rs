/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::*;
use libjs_generators::ast_build::*;
use libjs_generators::ir::function::WellKnownSymbol;
use libjs_generators::runtime::{ObjectRef, PropertyKey, Realm, Value};

/// `function* outer() { try { yield* inner(); } catch (e) { yield 'caught:' + e; } }`
fn outer_catching() -> libjs_generators::ast::FunctionData {
    generator(
        "outer",
        &[],
        vec![try_catch(
            vec![expr(yield_star(call(ident("inner"), vec![])))],
            Some("e"),
            vec![expr(yield_(add(string("caught:"), ident("e"))))],
        )],
    )
}

/// An iterable whose iterator is `iterator`.
fn iterable_of(realm: &Realm, iterator: ObjectRef) -> Value {
    let iterable = realm.new_object();
    let iterator = Value::Object(iterator);
    iterable.set(
        PropertyKey::Symbol(WellKnownSymbol::Iterator),
        native(realm, move |_, _, _| Ok(iterator.clone())),
    );
    Value::Object(iterable)
}

fn endless_iterator(realm: &Realm) -> ObjectRef {
    let iterator = realm.new_object();
    iterator.set(
        "next".into(),
        native(realm, |realm, _, _| Ok(realm.iter_result(Value::string("n"), false))),
    );
    iterator
}

#[test]
fn delegates_to_arrays_and_keeps_going() {
    let mut realm = realm(vec![generator(
        "g",
        &[],
        vec![expr(yield_star(array(vec![num(1.0), num(2.0)]))), expr(yield_(num(3.0)))],
    )]);
    let g = call_global(&mut realm, "g", &[]);
    let (values, _) = drain(&mut realm, &g);
    assert_eq!(numbers(&values), vec![1.0, 2.0, 3.0]);
}

#[test]
fn the_delegates_return_value_is_the_expression_value() {
    let mut realm = realm(vec![
        generator("inner", &[], vec![expr(yield_(num(1.0))), return_(string("inner done"))]),
        generator(
            "outer",
            &[],
            vec![const_("r", yield_star(call(ident("inner"), vec![]))), expr(yield_(ident("r")))],
        ),
    ]);
    let g = call_global(&mut realm, "outer", &[]);
    assert_eq!(number(&next(&mut realm, &g).0), 1.0);
    assert_eq!(text(&next(&mut realm, &g).0), "inner done");
}

#[test]
fn sent_values_are_forwarded_to_the_delegate() {
    let mut realm = realm(vec![
        generator(
            "inner",
            &[],
            vec![const_("x", yield_(num(1.0))), expr(yield_(add(ident("x"), num(1.0))))],
        ),
        generator("outer", &[], vec![expr(yield_star(call(ident("inner"), vec![])))]),
    ]);
    let g = call_global(&mut realm, "outer", &[]);
    next(&mut realm, &g);
    assert_eq!(number(&next_with(&mut realm, &g, Value::Number(41.0)).0), 42.0);
}

#[test]
fn throws_are_forwarded_to_a_delegate_that_handles_them() {
    let mut realm = realm(vec![outer_catching()]);
    let iterator = endless_iterator(&realm);
    iterator.set(
        "throw".into(),
        native(&realm, |realm, _, _| Ok(realm.iter_result(Value::string("x"), false))),
    );
    let iterable = iterable_of(&realm, iterator);
    realm.set_global("inner", native(&realm, move |_, _, _| Ok(iterable.clone())));

    let g = call_global(&mut realm, "outer", &[]);
    assert_eq!(text(&next(&mut realm, &g).0), "n");
    let (value, done) = resume(&mut realm, &g, "throw", Value::string("boom")).unwrap();
    assert!(!done);
    assert_eq!(text(&value), "x");
}

#[test]
fn throws_reach_the_outer_handler_through_a_generator_delegate() {
    let mut realm =
        realm(vec![generator("inner", &[], vec![expr(yield_(num(1.0)))]), outer_catching()]);
    let g = call_global(&mut realm, "outer", &[]);
    next(&mut realm, &g);

    let (value, done) = resume(&mut realm, &g, "throw", Value::string("boom")).unwrap();
    assert!(!done);
    assert_eq!(text(&value), "caught:boom");
}

#[test]
fn a_delegate_without_throw_is_closed_and_rejected() {
    let mut realm = realm(vec![generator(
        "outer",
        &[],
        vec![try_catch(
            vec![expr(yield_star(call(ident("inner"), vec![])))],
            Some("e"),
            vec![expr(yield_(member(ident("e"), "message")))],
        )],
    )]);
    let closed = Rc::new(Cell::new(0));
    let iterator = endless_iterator(&realm);
    let counter = closed.clone();
    iterator.set(
        "return".into(),
        native(&realm, move |realm, _, _| {
            counter.set(counter.get() + 1);
            Ok(realm.iter_result(Value::Undefined, true))
        }),
    );
    let iterable = iterable_of(&realm, iterator);
    realm.set_global("inner", native(&realm, move |_, _, _| Ok(iterable.clone())));

    let g = call_global(&mut realm, "outer", &[]);
    next(&mut realm, &g);
    let (value, _) = resume(&mut realm, &g, "throw", Value::string("boom")).unwrap();
    assert_eq!(text(&value), "yield* delegate must have a .throw() method");
    assert_eq!(closed.get(), 1);
}

#[test]
fn returns_are_forwarded_to_the_delegate() {
    let mut realm = realm(vec![generator(
        "outer",
        &[],
        vec![expr(yield_star(ident("iterable"))), return_(string("unreached"))],
    )]);
    let (iterable, counters) =
        counting_iterable(&realm, vec![Value::Number(1.0), Value::Number(2.0)], OnReturn::Done);
    realm.set_global("iterable", iterable);

    let g = call_global(&mut realm, "outer", &[]);
    next(&mut realm, &g);
    let (value, done) = resume(&mut realm, &g, "return", Value::Number(5.0)).unwrap();
    assert!(done);
    assert_eq!(number(&value), 5.0);
    assert_eq!(counters.return_calls.get(), 1);
}

#[test]
fn delegate_results_are_re_yielded_unchanged() {
    let mut realm = realm(vec![generator("outer", &[], vec![expr(yield_star(ident("iterable")))])]);
    let shared = realm.iter_result(Value::Number(1.0), false);
    let iterator = realm.new_object();
    let result = shared.clone();
    iterator.set("next".into(), native(&realm, move |_, _, _| Ok(result.clone())));
    let iterable = iterable_of(&realm, iterator);
    realm.set_global("iterable", iterable);

    let g = call_global(&mut realm, "outer", &[]);
    let next_method = realm.get(&g, &"next".into()).unwrap();
    let first = realm.call(&next_method, &g, &[]).unwrap();
    assert!(first.strictly_equals(&shared));
}

#[test]
fn returns_complete_at_once_when_the_delegate_has_no_return() {
    let mut realm = realm(vec![generator(
        "outer",
        &[],
        vec![
            try_finally(
                vec![expr(yield_star(call(ident("inner"), vec![])))],
                vec![expr(call(ident("cleanup"), vec![]))],
            ),
            expr(yield_(string("unreached"))),
        ],
    )]);
    let iterable = iterable_of(&realm, endless_iterator(&realm));
    realm.set_global("inner", native(&realm, move |_, _, _| Ok(iterable.clone())));
    let cleanups = counting_global(&mut realm, "cleanup", Value::Undefined);

    let g = call_global(&mut realm, "outer", &[]);
    assert_eq!(text(&next(&mut realm, &g).0), "n");
    let (value, done) = resume(&mut realm, &g, "return", Value::Number(9.0)).unwrap();
    assert!(done);
    assert_eq!(number(&value), 9.0);
    assert_eq!(cleanups.get(), 1);
}

#[test]
fn a_delegate_may_decline_to_return() {
    let mut realm =
        realm(vec![generator("outer", &[], vec![expr(yield_star(call(ident("inner"), vec![])))])]);
    let iterator = endless_iterator(&realm);
    iterator.set(
        "return".into(),
        native(&realm, |realm, _, _| Ok(realm.iter_result(Value::string("declined"), false))),
    );
    let iterable = iterable_of(&realm, iterator);
    realm.set_global("inner", native(&realm, move |_, _, _| Ok(iterable.clone())));

    let g = call_global(&mut realm, "outer", &[]);
    next(&mut realm, &g);
    let (value, done) = resume(&mut realm, &g, "return", Value::Number(9.0)).unwrap();
    assert!(!done);
    assert_eq!(text(&value), "declined");

    let (value, done) = next(&mut realm, &g);
    assert!(!done);
    assert_eq!(text(&value), "n");
}

#[test]
fn a_finished_throw_result_ends_the_delegation() {
    let mut realm = realm(vec![generator(
        "outer",
        &[],
        vec![
            const_("r", yield_star(call(ident("inner"), vec![]))),
            expr(yield_(add(string("after:"), ident("r")))),
        ],
    )]);
    let iterator = endless_iterator(&realm);
    iterator.set(
        "throw".into(),
        native(&realm, |realm, _, arguments| {
            let payload = arguments.first().cloned().unwrap_or_default();
            Ok(realm.iter_result(payload, true))
        }),
    );
    let iterable = iterable_of(&realm, iterator);
    realm.set_global("inner", native(&realm, move |_, _, _| Ok(iterable.clone())));

    let g = call_global(&mut realm, "outer", &[]);
    next(&mut realm, &g);
    let (value, done) = resume(&mut realm, &g, "throw", Value::string("boom")).unwrap();
    assert!(!done);
    assert_eq!(text(&value), "after:boom");
}
