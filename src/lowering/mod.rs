/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Lowering of function bodies to resumable CFGs.
//!
//! Per function the pipeline is:
//!
//! 1. `scope::resolve_function` assigns slots to identifiers,
//! 2. `indexer` collects suspension points and try regions,
//! 3. `codegen` builds the CFG, checking every suspension and region
//!    against the index as it goes,
//! 4. `merge` adds phis at loop headers that a resume can reach,
//! 5. `cfg::verify` checks the result.

pub mod async_fn;
pub mod codegen;
pub mod context;
pub mod delegate;
pub mod indexer;
pub mod iterator;
pub mod merge;
pub mod suspend;

use context::{BodyKind, LoweringContext};

use crate::ast::{FunctionData, FunctionKind};
use crate::error::CompileError;
use crate::ir::cfg;
use crate::ir::dump::dump_function;
use crate::ir::function::{Function, Program};
use crate::options::LoweringOptions;
use crate::scope;

/// Compile one function (two, for an async function) into a fresh program.
pub fn compile_function(
    function: &FunctionData,
    options: &LoweringOptions,
) -> Result<Program, CompileError> {
    compile_program(std::slice::from_ref(function), options)
}

/// Compile top-level functions, binding each as a global by name.
pub fn compile_program(
    functions: &[FunctionData],
    options: &LoweringOptions,
) -> Result<Program, CompileError> {
    let mut program = Program::default();
    for function in functions {
        let id = match function.kind {
            FunctionKind::Normal => {
                program.push(lower_function(
                    function,
                    BodyKind::Normal,
                    function.name.clone(),
                    options,
                )?)
            }
            FunctionKind::Generator => {
                program.push(lower_function(
                    function,
                    BodyKind::Generator,
                    function.name.clone(),
                    options,
                )?)
            }
            FunctionKind::Async => {
                async_fn::compile_async_function(function, options, &mut program)?
            }
            FunctionKind::AsyncGenerator => {
                return Err(CompileError::Unsupported {
                    function: function.name.clone(),
                    construct: "async generator function",
                });
            }
        };
        program.globals.push((function.name.clone(), id));
    }
    Ok(program)
}

pub(crate) fn lower_function(
    function: &FunctionData,
    body_kind: BodyKind,
    name: String,
    options: &LoweringOptions,
) -> Result<Function, CompileError> {
    let resolution = scope::resolve_function(function);
    let index = indexer::index_function(function, body_kind);

    let mut ctx =
        LoweringContext::new(
            name,
            body_kind,
            index,
            resolution.local_names,
            resolution.parameter_count,
            options,
        );
    ctx.strict = options.strict || function.is_strict_mode;
    let start = codegen::generate_function_body(function, &mut ctx)?;

    let kind = if body_kind.is_resumable() {
        FunctionKind::Generator
    } else {
        FunctionKind::Normal
    };
    let mut lowered = ctx.finish(kind, start)?;
    log::debug!(
        "lowering: {} has {} block(s) and {} suspension point(s)",
        lowered.name,
        lowered.blocks.len(),
        lowered.suspension_points.len()
    );

    if options.insert_merge_phis && body_kind.is_resumable() {
        merge::insert_merge_phis(&mut lowered);
    }
    if options.verify {
        cfg::verify(&lowered)?;
    }
    if log::log_enabled!(log::Level::Trace) {
        log::trace!("{}", dump_function(&lowered));
    }
    Ok(lowered)
}
