/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Async functions.
//!
//! `async function f(...) { body }` becomes two functions:
//!
//! - `f:body`, a generator whose `await`s are suspension points, and
//! - `f`, a normal function that instantiates `f:body` and hands it, with
//!   the receiver and arguments, to the `AsyncPump` builtin. The promise
//!   the pump returns is `f`'s result.

use super::context::{BodyKind, LoweringContext};
use super::indexer::SuspensionIndex;
use super::lower_function;
use crate::ast::{FunctionData, FunctionKind};
use crate::error::CompileError;
use crate::ir::function::{Function, Program};
use crate::ir::instruction::{Builtin, Instruction};
use crate::ir::operand::FunctionId;
use crate::options::LoweringOptions;
use crate::u32_from_usize;

pub fn inner_function_name(name: &str) -> String {
    format!("{name}:body")
}

/// Compile both halves into `program`; returns the id of the outer function.
pub fn compile_async_function(
    function: &FunctionData,
    options: &LoweringOptions,
    program: &mut Program,
) -> Result<FunctionId, CompileError> {
    let inner = lower_function(
        function,
        BodyKind::AsyncBody,
        inner_function_name(&function.name),
        options,
    )?;
    let inner_id = program.push(inner);
    let outer = emit_wrapper(function, inner_id, options)?;
    log::debug!("async: {} wraps {}", outer.name, program.function(inner_id).name);
    Ok(program.push(outer))
}

fn emit_wrapper(
    function: &FunctionData,
    inner: FunctionId,
    options: &LoweringOptions,
) -> Result<Function, CompileError> {
    let mut ctx = LoweringContext::new(
        function.name.clone(),
        BodyKind::Normal,
        SuspensionIndex::default(),
        Vec::new(),
        u32_from_usize(function.parameters.len()),
        options,
    );
    let entry = ctx.make_block();
    ctx.switch_to_basic_block(entry);

    let body = ctx.allocate_register();
    ctx.emit(Instruction::NewFunction { dst: body.operand(), function: inner });
    let arguments = ctx.allocate_register();
    ctx.emit(Instruction::CreateArguments { dst: arguments.operand() });
    let promise = ctx.allocate_register();
    let this_value = ctx.this_value();
    ctx.emit(Instruction::CallBuiltin {
        dst: promise.operand(),
        builtin: Builtin::AsyncPump,
        arguments: vec![body.operand(), this_value.operand(), arguments.operand()],
    });
    ctx.emit(Instruction::Return { value: promise.operand() });

    ctx.finish(FunctionKind::Async, None)
}
