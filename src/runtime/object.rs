/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Objects: an ordered property map plus a kind-specific payload.
//!
//! Objects are shared through `ObjectRef` (`Rc<RefCell<Object>>`). No borrow
//! is ever held across a call back into the interpreter; callers clone what
//! they need out of the cell first.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::generator::GeneratorData;
use super::promise::PromiseData;
use super::realm::Realm;
use super::value::{JsResult, Value};
use crate::ir::function::WellKnownSymbol;
use crate::ir::operand::FunctionId;

/// A host function. Receives the realm, `this` and the arguments.
pub type NativeFunction = Rc<dyn Fn(&mut Realm, &Value, &[Value]) -> JsResult>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(Rc<str>),
    Symbol(WellKnownSymbol),
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::String(Rc::from(name))
    }
}

impl PropertyKey {
    /// `ToPropertyKey`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Symbol(symbol) => PropertyKey::Symbol(*symbol),
            Value::String(s) => PropertyKey::String(s.clone()),
            other => PropertyKey::from(other.to_js_string().as_str()),
        }
    }

    fn array_index(&self) -> Option<usize> {
        let PropertyKey::String(name) = self else { return None };
        if name.is_empty() || (name.len() > 1 && name.starts_with('0')) {
            return None;
        }
        name.parse().ok()
    }
}

#[derive(Clone)]
pub enum Callable {
    Compiled(FunctionId),
    Native(NativeFunction),
}

pub enum ObjectKind {
    Ordinary,
    Array(Vec<Value>),
    Function(Callable),
    Generator(GeneratorData),
    Promise(PromiseData),
    ArrayIterator { array: ObjectRef, next_index: usize },
    Error,
}

pub struct Object {
    pub kind: ObjectKind,
    pub prototype: Option<ObjectRef>,
    properties: Vec<(PropertyKey, Value)>,
    property_index: FxHashMap<PropertyKey, usize>,
}

#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    pub fn new(kind: ObjectKind, prototype: Option<ObjectRef>) -> Self {
        Self(Rc::new(RefCell::new(Object {
            kind,
            prototype,
            properties: Vec::new(),
            property_index: FxHashMap::default(),
        })))
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    pub fn is_array(&self) -> bool {
        matches!(self.borrow().kind, ObjectKind::Array(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.borrow().kind, ObjectKind::Function(_))
    }

    pub fn callable(&self) -> Option<Callable> {
        match &self.borrow().kind {
            ObjectKind::Function(callable) => Some(callable.clone()),
            _ => None,
        }
    }

    /// A copy of the elements, or nothing for non-arrays.
    pub fn array_elements(&self) -> Vec<Value> {
        match &self.borrow().kind {
            ObjectKind::Array(elements) => elements.clone(),
            _ => Vec::new(),
        }
    }

    pub fn array_push(&self, value: Value) {
        if let ObjectKind::Array(elements) = &mut self.borrow_mut().kind {
            elements.push(value);
        }
    }

    pub fn get_own(&self, key: &PropertyKey) -> Option<Value> {
        let object = self.borrow();
        if let ObjectKind::Array(elements) = &object.kind {
            if let PropertyKey::String(name) = key
                && &**name == "length"
            {
                return Some(Value::Number(elements.len() as f64));
            }
            if let Some(index) = key.array_index() {
                return elements.get(index).cloned();
            }
        }
        object.property_index.get(key).map(|&slot| object.properties[slot].1.clone())
    }

    /// `[[Get]]` along the prototype chain.
    pub fn get(&self, key: &PropertyKey) -> Value {
        let mut current = Some(self.clone());
        while let Some(object) = current {
            if let Some(value) = object.get_own(key) {
                return value;
            }
            current = object.borrow().prototype.clone();
        }
        Value::Undefined
    }

    pub fn set(&self, key: PropertyKey, value: Value) {
        let mut object = self.borrow_mut();
        if let ObjectKind::Array(elements) = &mut object.kind
            && let Some(index) = key.array_index()
        {
            if index >= elements.len() {
                elements.resize(index + 1, Value::Undefined);
            }
            elements[index] = value;
            return;
        }
        if let Some(&slot) = object.property_index.get(&key) {
            object.properties[slot].1 = value;
            return;
        }
        let slot = object.properties.len();
        object.property_index.insert(key.clone(), slot);
        object.properties.push((key, value));
    }

    pub fn own_keys(&self) -> Vec<PropertyKey> {
        self.borrow().properties.iter().map(|(key, _)| key.clone()).collect()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(object) = self.0.try_borrow() else {
            return write!(f, "[object <busy>]");
        };
        match &object.kind {
            ObjectKind::Ordinary => write!(f, "[object Object]"),
            ObjectKind::Array(elements) => write!(f, "{elements:?}"),
            ObjectKind::Function(Callable::Compiled(id)) => write!(f, "[function #{}]", id.0),
            ObjectKind::Function(Callable::Native(_)) => write!(f, "[native function]"),
            ObjectKind::Generator(generator) => {
                write!(f, "[object Generator {:?}]", generator.state)
            }
            ObjectKind::Promise(promise) => write!(f, "[object Promise {:?}]", promise.state),
            ObjectKind::ArrayIterator { .. } => write!(f, "[object Array Iterator]"),
            ObjectKind::Error => write!(f, "[object Error]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_keep_insertion_order() {
        let object = ObjectRef::new(ObjectKind::Ordinary, None);
        object.set("b".into(), Value::Number(1.0));
        object.set("a".into(), Value::Number(2.0));
        object.set("b".into(), Value::Number(3.0));
        assert_eq!(object.own_keys(), vec![PropertyKey::from("b"), PropertyKey::from("a")]);
        assert_eq!(object.get(&"b".into()).as_number(), Some(3.0));
    }

    #[test]
    fn arrays_expose_indices_and_length() {
        let array = ObjectRef::new(ObjectKind::Array(vec![Value::Number(1.0)]), None);
        array.set("2".into(), Value::Number(3.0));
        assert_eq!(array.get(&"length".into()).as_number(), Some(3.0));
        assert!(array.get(&"1".into()).is_undefined());
        assert!(array.get(&"01".into()).is_undefined());
    }

    #[test]
    fn lookups_follow_the_prototype_chain() {
        let prototype = ObjectRef::new(ObjectKind::Ordinary, None);
        prototype.set("inherited".into(), Value::Boolean(true));
        let object = ObjectRef::new(ObjectKind::Ordinary, Some(prototype));
        assert!(object.get(&"inherited".into()).to_boolean());
        assert!(object.get_own(&"inherited".into()).is_none());
    }
}
