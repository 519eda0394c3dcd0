/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use libjs_generators::ast::FunctionData;
use libjs_generators::ir::function::WellKnownSymbol;
use libjs_generators::runtime::{JsResult, ObjectRef, PropertyKey, Realm, Value};
use libjs_generators::{LoweringOptions, Program, compile_program};

pub fn compile(functions: Vec<FunctionData>) -> Program {
    compile_with(functions, &LoweringOptions::default())
}

pub fn compile_with(functions: Vec<FunctionData>, options: &LoweringOptions) -> Program {
    match compile_program(&functions, options) {
        Ok(program) => program,
        Err(error) => panic!("compilation failed: {error}"),
    }
}

pub fn realm(functions: Vec<FunctionData>) -> Realm {
    Realm::new(compile(functions))
}

/// Call the global function `name`, panicking on an exception.
pub fn call_global(realm: &mut Realm, name: &str, arguments: &[Value]) -> Value {
    match realm.call_global(name, arguments) {
        Ok(value) => value,
        Err(exception) => panic!("{name} threw {exception:?}"),
    }
}

/// `generator[method](argument)`, split into `(value, done)`.
pub fn resume(
    realm: &mut Realm,
    generator: &Value,
    method: &str,
    argument: Value,
) -> JsResult<(Value, bool)> {
    let function = realm.get(generator, &PropertyKey::from(method))?;
    let result = realm.call(&function, generator, &[argument])?;
    Ok(unpack(&result))
}

pub fn next(realm: &mut Realm, generator: &Value) -> (Value, bool) {
    next_with(realm, generator, Value::Undefined)
}

pub fn next_with(realm: &mut Realm, generator: &Value, sent: Value) -> (Value, bool) {
    match resume(realm, generator, "next", sent) {
        Ok(step) => step,
        Err(exception) => panic!("next() threw {exception:?}"),
    }
}

/// Everything `next()` produces until `done`, plus the completion value.
pub fn drain(realm: &mut Realm, generator: &Value) -> (Vec<Value>, Value) {
    let mut values = Vec::new();
    loop {
        let (value, done) = next(realm, generator);
        if done {
            return (values, value);
        }
        values.push(value);
    }
}

pub fn unpack(result: &Value) -> (Value, bool) {
    let object = result.as_object().expect("iterator result is an object");
    (object.get(&"value".into()), object.get(&"done".into()).to_boolean())
}

pub fn number(value: &Value) -> f64 {
    value.as_number().unwrap_or_else(|| panic!("expected a number, got {value:?}"))
}

pub fn numbers(values: &[Value]) -> Vec<f64> {
    values.iter().map(number).collect()
}

pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        other => panic!("expected a string, got {other:?}"),
    }
}

/// The `message` of a thrown error object.
pub fn error_message(exception: &Value) -> String {
    let object = exception.as_object().expect("exception is an error object");
    text(&object.get(&"message".into()))
}

/// Bind a native function counting its calls as global `name`; it returns
/// `result`.
pub fn counting_global(realm: &mut Realm, name: &str, result: Value) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    let function = realm.native_function(move |_, _, _| {
        counter.set(counter.get() + 1);
        Ok(result.clone())
    });
    realm.set_global(name, function);
    count
}

#[derive(Clone, Default)]
pub struct IteratorCounters {
    pub acquired: Rc<Cell<u32>>,
    pub next_calls: Rc<Cell<u32>>,
    pub return_calls: Rc<Cell<u32>>,
}

/// How the hand-written iterator behaves when closed.
#[derive(Clone)]
pub enum OnReturn {
    Missing,
    Done,
    NotAnObject,
    Throws(&'static str),
}

/// An iterable over `values` that counts protocol calls.
pub fn counting_iterable(
    realm: &Realm,
    values: Vec<Value>,
    on_return: OnReturn) -> (Value,
    IteratorCounters,
) {
    let counters = IteratorCounters::default();
    let iterable = realm.new_object();

    let acquire_counters = counters.clone();
    let make_iterator = realm.native_function(move |realm, _, _| {
        acquire_counters.acquired.set(acquire_counters.acquired.get() + 1);
        Ok(Value::Object(make_counting_iterator(
            realm,
            values.clone(),
            on_return.clone(),
            &acquire_counters,
        )))
    });
    iterable.set(PropertyKey::Symbol(WellKnownSymbol::Iterator), make_iterator);
    (Value::Object(iterable), counters)
}

fn make_counting_iterator(
    realm: &Realm,
    values: Vec<Value>,
    on_return: OnReturn,
    counters: &IteratorCounters,
) -> ObjectRef {
    let iterator = realm.new_object();
    let position = Rc::new(Cell::new(0usize));

    let next_calls = counters.next_calls.clone();
    let next = realm.native_function(move |realm, _, _| {
        next_calls.set(next_calls.get() + 1);
        let index = position.get();
        match values.get(index) {
            Some(value) => {
                position.set(index + 1);
                Ok(realm.iter_result(value.clone(), false))
            }
            None => Ok(realm.iter_result(Value::Undefined, true)),
        }
    });
    iterator.set("next".into(), next);

    if matches!(on_return, OnReturn::Missing) {
        return iterator;
    }
    let return_calls = counters.return_calls.clone();
    let close = realm.native_function(move |realm, _, arguments| {
        return_calls.set(return_calls.get() + 1);
        match &on_return {
            OnReturn::Missing | OnReturn::Done => {
                Ok(realm.iter_result(arguments.first().cloned().unwrap_or_default(), true))
            }
            OnReturn::NotAnObject => Ok(Value::Number(1.0)),
            OnReturn::Throws(message) => Err(Value::string(message)),
        }
    });
    iterator.set("return".into(), close);
    iterator
}

/// A native function object, for passing into compiled code.
pub fn native(
    realm: &Realm,
    f: impl Fn(&mut Realm, &Value, &[Value]) -> JsResult + 'static,
) -> Value {
    realm.native_function(f)
}
