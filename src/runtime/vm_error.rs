/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Host-level failures inside the runtime.
//!
//! These become JS error objects (`Realm::error_value`) at the point they
//! are raised, so user code can catch them like any other exception.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("{0} is not defined")]
    UnknownGlobal(String),

    #[error("{0} is not a function")]
    NotCallable(String),

    #[error("cannot read property '{property}' of {base}")]
    PropertyOfNullish { property: String, base: &'static str },

    #[error("cannot set property '{property}' of {base}")]
    SetPropertyOfNullish { property: String, base: &'static str },

    #[error("generator is already running")]
    GeneratorRunning,

    #[error("not a generator object")]
    NotAGenerator,

    #[error("not a promise")]
    NotAPromise,

    #[error("generator body did not reach its start suspension")]
    MissingStartSuspension,

    #[error("function {0} suspended outside of a generator")]
    UnexpectedSuspension(String),

    #[error("invalid resumption kind")]
    InvalidResumeKind,

    #[error("cannot convert a {0} value to a number")]
    NotConvertibleToNumber(&'static str),

    #[error("cannot mix BigInt and other types")]
    MixedBigInt,

    #[error("division by zero")]
    BigIntDivisionByZero,
}

impl VmError {
    /// The constructor name of the JS error this becomes.
    pub fn error_name(&self) -> &'static str {
        match self {
            VmError::UnknownGlobal(_) => "ReferenceError",
            VmError::BigIntDivisionByZero => "RangeError",
            _ => "TypeError",
        }
    }
}
