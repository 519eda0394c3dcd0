/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Promises and their reaction jobs.
//!
//! Settling a promise never runs a reaction inline: every reaction becomes
//! a job on the realm's queue. Thenables are adopted through a job as well.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::object::{ObjectKind, ObjectRef};
use super::realm::Realm;
use super::value::Value;

#[derive(Clone)]
pub enum PromiseState {
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

impl fmt::Debug for PromiseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromiseState::Pending => write!(f, "pending"),
            PromiseState::Fulfilled(value) => write!(f, "fulfilled({value:?})"),
            PromiseState::Rejected(reason) => write!(f, "rejected({reason:?})"),
        }
    }
}

struct Reaction {
    on_fulfilled: Value,
    on_rejected: Value,
    derived: Option<ObjectRef>,
}

pub struct PromiseData {
    pub state: PromiseState,
    reactions: Vec<Reaction>,
}

pub fn new_promise(realm: &Realm) -> ObjectRef {
    ObjectRef::new(
        ObjectKind::Promise(PromiseData { state: PromiseState::Pending, reactions: Vec::new() }),
        Some(realm.prototypes.promise.clone()),
    )
}

pub fn is_promise(value: &Value) -> bool {
    value.as_object().is_some_and(|object| matches!(object.borrow().kind, ObjectKind::Promise(_)))
}

pub fn promise_state(promise: &ObjectRef) -> Option<PromiseState> {
    match &promise.borrow().kind {
        ObjectKind::Promise(data) => Some(data.state.clone()),
        _ => None,
    }
}

fn is_pending(promise: &ObjectRef) -> bool {
    matches!(promise_state(promise), Some(PromiseState::Pending))
}

/// `PromiseResolve`: promises pass through, anything else is wrapped.
pub fn promise_resolve(realm: &mut Realm, value: Value) -> ObjectRef {
    if let Value::Object(object) = &value
        && is_promise(&value)
    {
        return object.clone();
    }
    let promise = new_promise(realm);
    resolve_promise(realm, &promise, value);
    promise
}

/// Resolve `promise` with `resolution`, adopting the state of thenables.
pub fn resolve_promise(realm: &mut Realm, promise: &ObjectRef, resolution: Value) {
    if !is_pending(promise) {
        return;
    }
    if let Value::Object(object) = &resolution {
        if object.ptr_eq(promise) {
            let error = realm.type_error("promise resolved with itself");
            settle(realm, promise, PromiseState::Rejected(error));
            return;
        }
        let then = object.get(&"then".into());
        if then.as_object().is_some_and(ObjectRef::is_callable) {
            let promise = promise.clone();
            realm.enqueue_job(Box::new(move |realm: &mut Realm| {
                let (resolve, reject) = create_resolving_functions(realm, &promise);
                if let Err(error) = realm.call(&then, &resolution, &[resolve, reject]) {
                    reject_promise(realm, &promise, error);
                }
            }));
            return;
        }
    }
    settle(realm, promise, PromiseState::Fulfilled(resolution));
}

pub fn reject_promise(realm: &mut Realm, promise: &ObjectRef, reason: Value) {
    if is_pending(promise) {
        settle(realm, promise, PromiseState::Rejected(reason));
    }
}

fn settle(realm: &mut Realm, promise: &ObjectRef, state: PromiseState) {
    let reactions = match &mut promise.borrow_mut().kind {
        ObjectKind::Promise(data) => {
            data.state = state.clone();
            std::mem::take(&mut data.reactions)
        }
        _ => return,
    };
    for reaction in reactions {
        enqueue_reaction(realm, reaction, state.clone());
    }
}

fn enqueue_reaction(realm: &mut Realm, reaction: Reaction, state: PromiseState) {
    realm.enqueue_job(Box::new(move |realm: &mut Realm| {
        let (handler, argument, rejected) = match state {
            PromiseState::Fulfilled(value) => (reaction.on_fulfilled, value, false),
            PromiseState::Rejected(reason) => (reaction.on_rejected, reason, true),
            PromiseState::Pending => return,
        };
        let outcome = if handler.as_object().is_some_and(ObjectRef::is_callable) {
            realm.call(&handler, &Value::Undefined, &[argument])
        } else if rejected {
            Err(argument)
        } else {
            Ok(argument)
        };
        if let Some(derived) = &reaction.derived {
            match outcome {
                Ok(value) => resolve_promise(realm, derived, value),
                Err(reason) => reject_promise(realm, derived, reason),
            }
        }
    }));
}

/// `promise.then(on_fulfilled, on_rejected)`; returns the derived promise.
pub fn promise_then(
    realm: &mut Realm,
    promise: &ObjectRef,
    on_fulfilled: Value,
    on_rejected: Value,
) -> ObjectRef {
    let derived = new_promise(realm);
    let reaction = Reaction { on_fulfilled, on_rejected, derived: Some(derived.clone()) };
    let settled = match &mut promise.borrow_mut().kind {
        ObjectKind::Promise(data) => match &data.state {
            PromiseState::Pending => {
                data.reactions.push(reaction);
                return derived;
            }
            state => Some((state.clone(), reaction)),
        },
        _ => None,
    };
    if let Some((state, reaction)) = settled {
        enqueue_reaction(realm, reaction, state);
    }
    derived
}

/// A resolve/reject function pair that settles `promise` at most once.
pub fn create_resolving_functions(realm: &mut Realm, promise: &ObjectRef) -> (Value, Value) {
    let already_resolved = Rc::new(Cell::new(false));

    let (target, flag) = (promise.clone(), already_resolved.clone());
    let resolve = realm.native_function(move |realm, _, arguments| {
        if !flag.replace(true) {
            let value = arguments.first().cloned().unwrap_or_default();
            resolve_promise(realm, &target, value);
        }
        Ok(Value::Undefined)
    });

    let (target, flag) = (promise.clone(), already_resolved);
    let reject = realm.native_function(move |realm, _, arguments| {
        if !flag.replace(true) {
            let reason = arguments.first().cloned().unwrap_or_default();
            reject_promise(realm, &target, reason);
        }
        Ok(Value::Undefined)
    });

    (resolve, reject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::function::Program;

    #[test]
    fn reactions_run_from_the_job_queue() {
        let mut realm = Realm::new(Program::default());
        let promise = new_promise(&realm);
        let seen = Rc::new(Cell::new(0.0));
        let record = seen.clone();
        let on_fulfilled = realm.native_function(move |_, _, arguments| {
            record.set(arguments.first().and_then(Value::as_number).unwrap_or(-1.0));
            Ok(Value::Undefined)
        });
        promise_then(&mut realm, &promise, on_fulfilled, Value::Undefined);
        resolve_promise(&mut realm, &promise, Value::Number(7.0));
        assert_eq!(seen.get(), 0.0);
        realm.run_jobs();
        assert_eq!(seen.get(), 7.0);
    }

    #[test]
    fn promises_adopt_other_promises() {
        let mut realm = Realm::new(Program::default());
        let inner = new_promise(&realm);
        let outer = new_promise(&realm);
        resolve_promise(&mut realm, &outer, Value::Object(inner.clone()));
        reject_promise(&mut realm, &inner, Value::string("no"));
        realm.run_jobs();
        assert!(matches!(
            promise_state(&outer),
            Some(PromiseState::Rejected(Value::String(s))) if &*s == "no"
        ));
    }
}
