/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Suspension and resumption.
//!
//! Every suspension splits the current block: the code before it ends in
//! `SaveAndYield`, and execution continues in a fresh resume block that
//! starts with `ResumeGenerator`. The resume block then dispatches on the
//! resumption kind:
//!
//! - `Next` continues with the sent value as the expression's result,
//! - `Throw` throws the sent value at the suspension site, so the body's
//!   own handlers see it,
//! - `Return` returns the sent value through every enclosing cleanup.

use super::context::{LoweringContext, ScopedOperand};
use crate::error::CompileError;
use crate::ir::function::SuspensionKind;
use crate::ir::instruction::{Instruction, ResumeKind};
use crate::ir::operand::Label;

/// End the prologue with `StartGenerator`. Returns the start resume target;
/// code generation continues in the block where the body begins.
pub fn emit_generator_start(ctx: &mut LoweringContext) -> Label {
    let start = ctx.make_block();
    ctx.emit(Instruction::StartGenerator { resume_target: start });

    ctx.switch_to_basic_block(start);
    let received = ctx.allocate_register();
    let kind = ctx.resume_kind();
    ctx.emit(Instruction::ResumeGenerator {
        kind_dst: kind.operand(),
        value_dst: received.operand(),
    });
    emit_resume_dispatch(ctx, &received);
    start
}

/// Branch on the resumption kind just written by `ResumeGenerator`.
/// Leaves the context in the block that handles `Next`.
pub fn emit_resume_dispatch(ctx: &mut LoweringContext, received: &ScopedOperand) {
    let kind = ctx.resume_kind();
    let next_block = ctx.make_block();
    let not_next = ctx.make_block();
    let throw_block = ctx.make_block();
    let return_block = ctx.make_block();

    ctx.emit_jump_if_equals_i32(&kind, ResumeKind::Next as i32, next_block, not_next);

    ctx.switch_to_basic_block(not_next);
    ctx.emit_jump_if_equals_i32(&kind, ResumeKind::Throw as i32, throw_block, return_block);

    ctx.switch_to_basic_block(throw_block);
    ctx.emit(Instruction::Throw { src: received.operand() });

    ctx.switch_to_basic_block(return_block);
    ctx.generate_return(received);

    ctx.switch_to_basic_block(next_block);
}

/// `yield value`: suspend with `{ value, done: false }`.
pub fn generate_yield(
    ctx: &mut LoweringContext,
    value: &ScopedOperand,
    preferred_dst: Option<&ScopedOperand>,
) -> Result<ScopedOperand, CompileError> {
    generate_suspension(ctx, value, SuspensionKind::Yield, preferred_dst)
}

/// `await value` in an async body. The pump reads the awaited value out of
/// the yielded result and resumes with its settlement.
pub fn generate_await(
    ctx: &mut LoweringContext,
    value: &ScopedOperand,
    preferred_dst: Option<&ScopedOperand>,
) -> Result<ScopedOperand, CompileError> {
    generate_suspension(ctx, value, SuspensionKind::Await, preferred_dst)
}

fn generate_suspension(
    ctx: &mut LoweringContext,
    value: &ScopedOperand,
    kind: SuspensionKind,
    preferred_dst: Option<&ScopedOperand>,
) -> Result<ScopedOperand, CompileError> {
    let index = ctx.begin_suspension(kind)?;

    let result = ctx.allocate_register();
    ctx.emit(Instruction::NewIterResult {
        dst: result.operand(),
        value: value.operand(),
        done: false,
    });

    let resume = ctx.make_block();
    ctx.emit(Instruction::SaveAndYield {
        value: result.operand(),
        resume_target: resume,
        suspension: index,
    });
    ctx.record_resume_target(index, resume)?;

    ctx.switch_to_basic_block(resume);
    // The sent value lands in a scratch register: a throw or return
    // resumption must not clobber the destination first.
    let received = ctx.allocate_register();
    let resume_kind = ctx.resume_kind();
    ctx.emit(Instruction::ResumeGenerator {
        kind_dst: resume_kind.operand(),
        value_dst: received.operand(),
    });
    emit_resume_dispatch(ctx, &received);

    match preferred_dst {
        Some(dst) => {
            ctx.emit_mov(dst, &received);
            Ok(dst.clone())
        }
        None => Ok(received),
    }
}
