/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! The `AsyncPump` builtin: drives an async function's inner generator.
//!
//! Each `await` suspends with `{ value, done: false }`. The pump resolves the
//! value to a promise and resumes the generator from that promise's
//! reactions, with `Next` on fulfillment and `Throw` on rejection. The
//! generator's return value fulfills the output promise; an uncaught
//! exception rejects it.

use super::generator::{self, ResumeCommand};
use super::object::ObjectRef;
use super::promise::{self, new_promise, promise_then, reject_promise, resolve_promise};
use super::realm::Realm;
use super::value::{JsResult, Value};

/// `AsyncPump(inner, this, arguments)`. Returns the output promise.
pub fn async_pump(realm: &mut Realm, arguments: &[Value]) -> JsResult {
    let argument = |index: usize| arguments.get(index).cloned().unwrap_or_default();
    let (inner, this_value) = (argument(0), argument(1));
    let inner_arguments =
        argument(2).as_object().map(ObjectRef::array_elements).unwrap_or_default();

    let output = new_promise(realm);
    match realm.call(&inner, &this_value, &inner_arguments) {
        Ok(Value::Object(body)) => {
            step(realm, &body, &output, ResumeCommand::next(Value::Undefined))
        }
        Ok(_) => {
            let error = realm.type_error("async function body is not a generator");
            reject_promise(realm, &output, error);
        }
        Err(exception) => reject_promise(realm, &output, exception),
    }
    Ok(Value::Object(output))
}

/// Resume the body once and arrange for the next step.
fn step(realm: &mut Realm, body: &ObjectRef, output: &ObjectRef, command: ResumeCommand) {
    let result = match generator::resume(realm, body, command) {
        Ok(result) => result,
        Err(exception) => {
            log::trace!("async: body threw, rejecting");
            reject_promise(realm, output, exception);
            return;
        }
    };

    let (value, done) = match result.as_object() {
        Some(object) => (object.get(&"value".into()), object.get(&"done".into()).to_boolean()),
        None => (Value::Undefined, true),
    };
    if done {
        resolve_promise(realm, output, value);
        return;
    }

    let awaited = promise::promise_resolve(realm, value);
    let (on_body, on_output) = (body.clone(), output.clone());
    let on_fulfilled = realm.native_function(move |realm, _, arguments| {
        let value = arguments.first().cloned().unwrap_or_default();
        step(realm, &on_body, &on_output, ResumeCommand::next(value));
        Ok(Value::Undefined)
    });
    let (on_body, on_output) = (body.clone(), output.clone());
    let on_rejected = realm.native_function(move |realm, _, arguments| {
        let reason = arguments.first().cloned().unwrap_or_default();
        step(realm, &on_body, &on_output, ResumeCommand::throw(reason));
        Ok(Value::Undefined)
    });
    promise_then(realm, &awaited, on_fulfilled, on_rejected);
}
