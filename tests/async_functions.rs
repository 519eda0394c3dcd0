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
use libjs_generators::ir::operand::FunctionId;
use libjs_generators::lowering::async_fn::inner_function_name;
use libjs_generators::runtime::promise::{self, new_promise, reject_promise, resolve_promise};
use libjs_generators::runtime::{PromiseState, Realm, Value};

/// `async function f(p1, p2) { const a = await p1; const b = await second(p2); return a + b; }`
fn sum_of_awaits() -> libjs_generators::ast::FunctionData {
    async_function(
        "f",
        &["p1", "p2"],
        vec![
            const_("a", await_(ident("p1"))),
            const_("b", await_(call(ident("second"), vec![ident("p2")]))),
            return_(add(ident("a"), ident("b"))),
        ],
    )
}

fn settled_promise(result: &Value) -> PromiseState {
    let promise = result.as_object().expect("async functions return promises");
    promise::promise_state(promise).expect("async functions return promises")
}

fn inner_body(realm: &Realm, name: &str) -> FunctionId {
    let inner = inner_function_name(name);
    let index =
        realm.program().functions.iter().position(|function| function.name == inner).unwrap();
    FunctionId(index as u32)
}

#[test]
fn awaited_values_are_summed_in_order() {
    let mut realm = realm(vec![sum_of_awaits()]);
    let seconds = counting_passthrough(&mut realm);
    let (p1, p2) = (new_promise(&realm), new_promise(&realm));

    let arguments = [Value::Object(p1.clone()), Value::Object(p2.clone())];
    let result = call_global(&mut realm, "f", &arguments);
    realm.run_jobs();
    assert!(matches!(settled_promise(&result), PromiseState::Pending));
    assert_eq!(seconds.get(), 0);

    resolve_promise(&mut realm, &p1, Value::Number(1.0));
    realm.run_jobs();
    assert_eq!(seconds.get(), 1);
    assert!(matches!(settled_promise(&result), PromiseState::Pending));

    resolve_promise(&mut realm, &p2, Value::Number(2.0));
    realm.run_jobs();
    match settled_promise(&result) {
        PromiseState::Fulfilled(value) => assert_eq!(number(&value), 3.0),
        other => panic!("expected fulfillment, got {other:?}"),
    }
}

#[test]
fn a_rejected_await_rejects_without_running_the_rest() {
    let mut realm = realm(vec![sum_of_awaits()]);
    let seconds = counting_passthrough(&mut realm);
    let (p1, p2) = (new_promise(&realm), new_promise(&realm));

    let result = call_global(&mut realm, "f", &[Value::Object(p1.clone()), Value::Object(p2)]);
    reject_promise(&mut realm, &p1, Value::string("nope"));
    realm.run_jobs();

    match settled_promise(&result) {
        PromiseState::Rejected(reason) => assert_eq!(text(&reason), "nope"),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(seconds.get(), 0);
}

#[test]
fn the_inner_body_suspends_once_per_await() {
    let mut realm = realm(vec![sum_of_awaits()]);
    counting_passthrough(&mut realm);
    let (p1, p2) = (new_promise(&realm), new_promise(&realm));

    let body = inner_body(&realm, "f");
    let generator = realm
        .call_compiled(
            body,
            Value::Undefined,
            &[Value::Object(p1.clone()), Value::Object(p2.clone())],
        )
        .unwrap();

    let (first, done) = next(&mut realm, &generator);
    assert!(!done);
    assert!(first.strictly_equals(&Value::Object(p1)));
    let (second, done) = next_with(&mut realm, &generator, Value::Number(1.0));
    assert!(!done);
    assert!(second.strictly_equals(&Value::Object(p2)));

    let (value, done) = next_with(&mut realm, &generator, Value::Number(2.0));
    assert!(done);
    assert_eq!(number(&value), 3.0);
}

#[test]
fn continuations_never_run_inline() {
    let mut realm = realm(vec![async_function(
        "f",
        &[],
        vec![const_("x", await_(num(5.0))), return_(add(ident("x"), num(1.0)))],
    )]);
    let result = call_global(&mut realm, "f", &[]);
    assert!(matches!(settled_promise(&result), PromiseState::Pending));
    assert!(realm.pending_jobs() > 0);

    realm.run_jobs();
    match settled_promise(&result) {
        PromiseState::Fulfilled(value) => assert_eq!(number(&value), 6.0),
        other => panic!("expected fulfillment, got {other:?}"),
    }
}

#[test]
fn rejections_can_be_caught_in_the_body() {
    let mut realm = realm(vec![async_function(
        "f",
        &["p"],
        vec![try_catch(
            vec![expr(await_(ident("p")))],
            Some("e"),
            vec![return_(add(string("caught "), ident("e")))],
        )],
    )]);
    let p = new_promise(&realm);
    let result = call_global(&mut realm, "f", &[Value::Object(p.clone())]);
    reject_promise(&mut realm, &p, Value::string("no"));
    realm.run_jobs();

    match settled_promise(&result) {
        PromiseState::Fulfilled(value) => assert_eq!(text(&value), "caught no"),
        other => panic!("expected fulfillment, got {other:?}"),
    }
}

#[test]
fn synchronous_throws_reject_the_result() {
    let mut realm = realm(vec![async_function("f", &[], vec![throw(string("early"))])]);
    let result = call_global(&mut realm, "f", &[]);
    match settled_promise(&result) {
        PromiseState::Rejected(reason) => assert_eq!(text(&reason), "early"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn returned_promises_are_adopted() {
    let mut realm = realm(vec![async_function("f", &["p"], vec![return_(ident("p"))])]);
    let p = new_promise(&realm);
    let result = call_global(&mut realm, "f", &[Value::Object(p.clone())]);
    realm.run_jobs();
    assert!(matches!(settled_promise(&result), PromiseState::Pending));

    resolve_promise(&mut realm, &p, Value::Number(7.0));
    realm.run_jobs();
    match settled_promise(&result) {
        PromiseState::Fulfilled(value) => assert_eq!(number(&value), 7.0),
        other => panic!("expected fulfillment, got {other:?}"),
    }
}

#[test]
fn receivers_and_arguments_are_forwarded() {
    let mut realm = realm(vec![async_function(
        "f",
        &["x"],
        vec![return_(add(member(this(), "base"), ident("x")))],
    )]);
    let receiver = realm.new_object();
    receiver.set("base".into(), Value::Number(10.0));
    let f = realm.get_global("f").unwrap();

    let result = realm.call(&f, &Value::Object(receiver), &[Value::Number(5.0)]).unwrap();
    realm.run_jobs();
    match settled_promise(&result) {
        PromiseState::Fulfilled(value) => assert_eq!(number(&value), 15.0),
        other => panic!("expected fulfillment, got {other:?}"),
    }
}

/// Global `second(x)` returning `x`, counting its calls.
fn counting_passthrough(realm: &mut Realm) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    let second = native(realm, move |_, _, arguments| {
        counter.set(counter.get() + 1);
        Ok(arguments.first().cloned().unwrap_or_default())
    });
    realm.set_global("second", second);
    count
}
