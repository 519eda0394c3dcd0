/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! JavaScript values and the abstract operations on them that the IR needs.

use std::fmt;
use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use super::object::ObjectRef;
use crate::ir::function::{ConstantValue, WellKnownSymbol, parse_bigint};

/// A completion: `Err` carries the thrown value.
pub type JsResult<T = Value> = Result<T, Value>;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    BigInt(Rc<BigInt>),
    Symbol(WellKnownSymbol),
    Object(ObjectRef),
}

impl Value {
    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    pub fn from_constant(constant: &ConstantValue) -> Self {
        match constant {
            ConstantValue::Number(n) => Value::Number(*n),
            ConstantValue::Boolean(b) => Value::Boolean(*b),
            ConstantValue::Null => Value::Null,
            ConstantValue::Undefined => Value::Undefined,
            ConstantValue::String(s) => Value::string(s),
            ConstantValue::BigInt(digits) => {
                parse_bigint(digits).map_or(Value::Undefined, |value| Value::BigInt(Rc::new(value)))
            }
            ConstantValue::Symbol(symbol) => Value::Symbol(*symbol),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::BigInt(b) => !b.is_zero(),
            Value::Symbol(_) | Value::Object(_) => true,
        }
    }

    /// `ToNumber`. `None` for BigInts and symbols, which throw.
    pub fn to_number(&self) -> Option<f64> {
        Some(match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Object(_) => f64::NAN,
            Value::BigInt(_) | Value::Symbol(_) => return None,
        })
    }

    /// `ToString` for primitives; objects render as `[object Object]`.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.to_string(),
            Value::BigInt(b) => b.to_string(),
            Value::Symbol(symbol) => format!("Symbol({})", symbol.description()),
            Value::Object(object) => {
                if object.is_array() {
                    object
                        .array_elements()
                        .iter()
                        .map(Value::to_js_string)
                        .collect::<Vec<_>>()
                        .join(",")
                } else {
                    "[object Object]".to_string()
                }
            }
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::BigInt(_) => "bigint",
            Value::Symbol(_) => "symbol",
            Value::Object(object) if object.is_callable() => "function",
            Value::Object(_) => "object",
        }
    }

    pub fn strictly_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Value::Boolean(b), _) => Value::Number(f64::from(u8::from(*b))).loosely_equals(other),
            (_, Value::Boolean(b)) => self.loosely_equals(&Value::Number(f64::from(u8::from(*b)))),
            (Value::BigInt(a), Value::Number(n)) | (Value::Number(n), Value::BigInt(a)) => {
                a.to_f64().is_some_and(|a| a == *n)
            }
            _ => self.strictly_equals(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::BigInt(b) => write!(f, "{b}n"),
            Value::Object(object) => write!(f, "{object:?}"),
            other => write!(f, "{}", other.to_js_string()),
        }
    }
}

pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}
