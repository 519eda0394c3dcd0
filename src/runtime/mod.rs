/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! A small reference runtime for lowered programs.
//!
//! It exists to execute the IR faithfully, not to be fast: values are
//! reference-counted, objects are `RefCell`s, and the interpreter walks
//! blocks directly. Generators park their `Frame` between resumptions;
//! async functions are pumped through promise reactions on the realm's
//! job queue.
//!
//! - `value`, `object`: values, objects and property access
//! - `interpreter`: `Frame` and `run_frame`
//! - `generator`: generator objects and `next`/`throw`/`return`
//! - `promise`, `async_driver`: promises and the `AsyncPump` builtin
//! - `realm`: globals, intrinsics, calls and the job queue
//! - `vm_error`: host failures, surfaced to JS as error objects

pub mod async_driver;
pub mod generator;
pub mod interpreter;
pub mod object;
pub mod promise;
pub mod realm;
pub mod value;
pub mod vm_error;

pub use generator::{GeneratorState, ResumeCommand};
pub use object::{ObjectKind, ObjectRef, PropertyKey};
pub use promise::PromiseState;
pub use realm::Realm;
pub use value::{JsResult, Value};
pub use vm_error::VmError;
