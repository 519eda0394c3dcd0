/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! The realm: compiled program, globals, intrinsic prototypes and the job
//! queue. Everything the interpreter reaches outside the current frame goes
//! through here.

use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::async_driver;
use super::generator::{self, ResumeCommand};
use super::interpreter::{Frame, FrameExit, run_frame};
use super::object::{Callable, NativeFunction, ObjectKind, ObjectRef, PropertyKey};
use super::promise;
use super::value::{JsResult, Value};
use super::vm_error::VmError;
use crate::ast::FunctionKind;
use crate::ir::function::{Program, WellKnownSymbol};
use crate::ir::instruction::Builtin;
use crate::ir::operand::FunctionId;

/// A queued reaction or other deferred host work.
pub type Job = Box<dyn FnOnce(&mut Realm)>;

pub struct Prototypes {
    pub object: ObjectRef,
    pub array: ObjectRef,
    pub array_iterator: ObjectRef,
    pub generator: ObjectRef,
    pub promise: ObjectRef,
    pub error: ObjectRef,
}

pub struct Realm {
    program: Rc<Program>,
    pub prototypes: Prototypes,
    globals: FxHashMap<String, Value>,
    jobs: VecDeque<Job>,
}

fn native(f: impl Fn(&mut Realm, &Value, &[Value]) -> JsResult + 'static) -> Value {
    let f: NativeFunction = Rc::new(f);
    Value::Object(ObjectRef::new(ObjectKind::Function(Callable::Native(f)), None))
}

fn argument(arguments: &[Value], index: usize) -> Value {
    arguments.get(index).cloned().unwrap_or_default()
}

fn return_this(_: &mut Realm, this_value: &Value, _: &[Value]) -> JsResult {
    Ok(this_value.clone())
}

impl Prototypes {
    fn new() -> Self {
        let object = ObjectRef::new(ObjectKind::Ordinary, None);
        let prototype = || ObjectRef::new(ObjectKind::Ordinary, Some(object.clone()));
        let iterator_key = PropertyKey::Symbol(WellKnownSymbol::Iterator);

        let array = prototype();
        array.set(
            iterator_key.clone(),
            native(|realm, this_value, _| {
                let Some(array) = this_value.as_object().filter(|object| object.is_array()) else {
                    return Err(
                        realm.type_error("Array.prototype[Symbol.iterator] called on a non-array")
                    );
                };
                let iterator = ObjectRef::new(
                    ObjectKind::ArrayIterator { array: array.clone(), next_index: 0 },
                    Some(realm.prototypes.array_iterator.clone()),
                );
                Ok(Value::Object(iterator))
            }),
        );

        let array_iterator = prototype();
        array_iterator.set("next".into(), native(array_iterator_next));
        array_iterator.set(iterator_key.clone(), native(return_this));

        let generator_prototype = prototype();
        generator_prototype.set(
            "next".into(),
            native(|realm, this_value, arguments| {
                let generator = generator::this_generator(realm, this_value)?;
                generator::resume(realm, &generator, ResumeCommand::next(argument(arguments, 0)))
            }),
        );
        generator_prototype.set(
            "throw".into(),
            native(|realm, this_value, arguments| {
                let generator = generator::this_generator(realm, this_value)?;
                generator::resume(realm, &generator, ResumeCommand::throw(argument(arguments, 0)))
            }),
        );
        generator_prototype.set(
            "return".into(),
            native(|realm, this_value, arguments| {
                let generator = generator::this_generator(realm, this_value)?;
                generator::resume(realm, &generator, ResumeCommand::return_(argument(arguments, 0)))
            }),
        );
        generator_prototype.set(iterator_key, native(return_this));

        let promise_prototype = prototype();
        promise_prototype.set(
            "then".into(),
            native(|realm, this_value, arguments| {
                let Some(target) =
                    this_value.as_object().filter(|_| promise::is_promise(this_value))
                else {
                    return Err(realm.error_value(VmError::NotAPromise));
                };
                let derived = promise::promise_then(
                    realm,
                    target,
                    argument(arguments, 0),
                    argument(arguments, 1),
                );
                Ok(Value::Object(derived))
            }),
        );

        let error = prototype();
        Self {
            array,
            array_iterator,
            generator: generator_prototype,
            promise: promise_prototype,
            error,
            object,
        }
    }
}

fn array_iterator_next(realm: &mut Realm, this_value: &Value, _: &[Value]) -> JsResult {
    let Some(iterator) = this_value.as_object() else {
        return Err(realm.type_error("not an array iterator"));
    };
    let step = match &mut iterator.borrow_mut().kind {
        ObjectKind::ArrayIterator { array, next_index } => {
            let element = array.array_elements().get(*next_index).cloned();
            if element.is_some() {
                *next_index += 1;
            }
            Some(element)
        }
        _ => None,
    };
    match step {
        Some(Some(value)) => Ok(realm.iter_result(value, false)),
        Some(None) => Ok(realm.iter_result(Value::Undefined, true)),
        None => Err(realm.type_error("not an array iterator")),
    }
}

impl Realm {
    /// A realm running `program`, with its top-level functions bound as globals.
    pub fn new(program: Program) -> Self {
        let program = Rc::new(program);
        let mut realm = Self {
            program: program.clone(),
            prototypes: Prototypes::new(),
            globals: FxHashMap::default(),
            jobs: VecDeque::new(),
        };
        for (name, id) in &program.globals {
            let function = realm.function_object(*id);
            realm.globals.insert(name.clone(), function);
        }
        realm
    }

    pub fn program(&self) -> &Rc<Program> {
        &self.program
    }

    // --- Object creation ---

    pub fn native_function(
        &self,
        f: impl Fn(&mut Realm, &Value, &[Value]) -> JsResult + 'static,
    ) -> Value {
        native(f)
    }

    pub fn function_object(&self, id: FunctionId) -> Value {
        Value::Object(ObjectRef::new(ObjectKind::Function(Callable::Compiled(id)), None))
    }

    pub fn new_object(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::Ordinary, Some(self.prototypes.object.clone()))
    }

    pub fn new_array(&self, elements: Vec<Value>) -> Value {
        Value::Object(ObjectRef::new(
            ObjectKind::Array(elements),
            Some(self.prototypes.array.clone()),
        ))
    }

    /// `{ value, done }`.
    pub fn iter_result(&self, value: Value, done: bool) -> Value {
        let result = self.new_object();
        result.set("value".into(), value);
        result.set("done".into(), Value::Boolean(done));
        Value::Object(result)
    }

    pub fn error_object(&self, name: &str, message: &str) -> Value {
        let error = ObjectRef::new(ObjectKind::Error, Some(self.prototypes.error.clone()));
        error.set("name".into(), Value::string(name));
        error.set("message".into(), Value::string(message));
        Value::Object(error)
    }

    pub fn type_error(&self, message: &str) -> Value {
        self.error_object("TypeError", message)
    }

    pub fn error_value(&self, error: VmError) -> Value {
        self.error_object(error.error_name(), &error.to_string())
    }

    // --- Globals ---

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn get_global(&self, name: &str) -> JsResult {
        self.globals
            .get(name)
            .cloned()
            .ok_or_else(|| self.error_value(VmError::UnknownGlobal(name.to_string())))
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }

    /// Assignment to a global. Strict code may not create new ones.
    pub fn assign_global(&mut self, name: &str, value: Value, strict: bool) -> JsResult<()> {
        if strict && !self.globals.contains_key(name) {
            return Err(self.error_value(VmError::UnknownGlobal(name.to_string())));
        }
        self.set_global(name, value);
        Ok(())
    }

    // --- Property access ---

    fn describe_key(key: &PropertyKey) -> String {
        match key {
            PropertyKey::String(name) => name.to_string(),
            PropertyKey::Symbol(symbol) => format!("Symbol({})", symbol.description()),
        }
    }

    pub fn get(&self, base: &Value, key: &PropertyKey) -> JsResult {
        match base {
            Value::Object(object) => Ok(object.get(key)),
            Value::Undefined | Value::Null => Err(self.error_value(VmError::PropertyOfNullish {
                property: Self::describe_key(key),
                base: if base.is_undefined() { "undefined" } else { "null" },
            })),
            Value::String(s) if matches!(key, PropertyKey::String(name) if &**name == "length") => {
                Ok(Value::Number(s.chars().count() as f64))
            }
            _ => Ok(Value::Undefined),
        }
    }

    pub fn put(&self, base: &Value, key: PropertyKey, value: Value) -> JsResult<()> {
        match base {
            Value::Object(object) => {
                object.set(key, value);
                Ok(())
            }
            Value::Undefined | Value::Null => Err(self.error_value(VmError::SetPropertyOfNullish {
                property: Self::describe_key(&key),
                base: if base.is_undefined() { "undefined" } else { "null" },
            })),
            _ => Ok(()),
        }
    }

    /// `GetMethod`: nullish becomes undefined, anything else must be callable.
    pub fn get_method(&self, base: &Value, key: &PropertyKey) -> JsResult {
        let method = self.get(base, key)?;
        match &method {
            Value::Undefined | Value::Null => Ok(Value::Undefined),
            Value::Object(object) if object.is_callable() => Ok(method),
            _ => Err(self.error_value(VmError::NotCallable(Self::describe_key(key)))),
        }
    }

    // --- Calls ---

    pub fn call(&mut self, callee: &Value, this_value: &Value, arguments: &[Value]) -> JsResult {
        let Some(callable) = callee.as_object().and_then(ObjectRef::callable) else {
            let description = match callee {
                Value::Object(_) => "object".to_string(),
                other => other.to_js_string(),
            };
            return Err(self.error_value(VmError::NotCallable(description)));
        };
        match callable {
            Callable::Native(f) => f(self, this_value, arguments),
            Callable::Compiled(id) => self.call_compiled(id, this_value.clone(), arguments),
        }
    }

    /// Call a compiled function. Generator bodies produce a generator object.
    pub fn call_compiled(
        &mut self,
        id: FunctionId,
        this_value: Value,
        arguments: &[Value],
    ) -> JsResult {
        let program = self.program.clone();
        let function = program.function(id);
        let mut frame = Frame::new(function, id, this_value, arguments);
        if function.kind == FunctionKind::Generator {
            return generator::create_generator(self, frame);
        }
        match run_frame(self, &mut frame)? {
            FrameExit::Return(value) => Ok(value),
            FrameExit::Suspend { .. } => {
                Err(self.error_value(VmError::UnexpectedSuspension(function.name.clone())))
            }
        }
    }

    /// Call the global function `name` with an undefined receiver.
    pub fn call_global(&mut self, name: &str, arguments: &[Value]) -> JsResult {
        let callee = self.get_global(name)?;
        self.call(&callee, &Value::Undefined, arguments)
    }

    pub fn call_builtin(&mut self, builtin: Builtin, arguments: &[Value]) -> JsResult {
        match builtin {
            Builtin::AsyncPump => async_driver::async_pump(self, arguments),
        }
    }

    // --- Jobs ---

    pub fn enqueue_job(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Run jobs until the queue is empty, including jobs queued meanwhile.
    pub fn run_jobs(&mut self) {
        while let Some(job) = self.jobs.pop_front() {
            job(self);
        }
    }
}
