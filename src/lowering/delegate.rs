/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! `yield* iterable`.
//!
//! The delegation loop forwards each resumption to the inner iterator by
//! kind and re-yields the inner result object unchanged until it reports
//! `done`:
//!
//! ```text
//!   loop:     switch received_kind
//!     Next:   result = next(received)
//!     Throw:  result = throw(received), or close + TypeError without .throw
//!     Return: result = return(received), or return received without .return
//!   done?     yes -> value of result (Return: return it)
//!             no  -> SaveAndYield result; ResumeGenerator; goto loop
//! ```

use super::context::{LoweringContext, ScopedOperand, choose_dst};
use super::iterator::{
    self, DELEGATE_MISSING_THROW, RETURN_RESULT_NOT_OBJECT, THROW_RESULT_NOT_OBJECT,
};
use crate::error::CompileError;
use crate::ir::function::SuspensionKind;
use crate::ir::instruction::{Instruction, ResumeKind};

pub fn generate_yield_star(
    ctx: &mut LoweringContext,
    iterable: &ScopedOperand,
    preferred_dst: Option<&ScopedOperand>,
) -> Result<ScopedOperand, CompileError> {
    let index = ctx.begin_suspension(SuspensionKind::YieldDelegate)?;
    let handle = iterator::acquire(ctx, iterable);

    let received_kind = ctx.allocate_register();
    let received = ctx.allocate_register();
    let inner_result = ctx.allocate_register();
    let next_kind = ctx.add_constant_i32(ResumeKind::Next as i32);
    let undefined = ctx.add_constant_undefined();
    ctx.emit_mov(&received_kind, &next_kind);
    ctx.emit_mov(&received, &undefined);

    let loop_block = ctx.make_block();
    let next_block = ctx.make_block();
    let not_next = ctx.make_block();
    let throw_block = ctx.make_block();
    let return_block = ctx.make_block();
    let check_done = ctx.make_block();
    let yield_block = ctx.make_block();
    let resume_block = ctx.make_block();
    let done_block = ctx.make_block();
    ctx.emit(Instruction::Jump { target: loop_block });

    ctx.switch_to_basic_block(loop_block);
    ctx.emit_jump_if_equals_i32(&received_kind, ResumeKind::Next as i32, next_block, not_next);
    ctx.switch_to_basic_block(not_next);
    ctx.emit_jump_if_equals_i32(
        &received_kind,
        ResumeKind::Throw as i32,
        throw_block,
        return_block,
    );

    // Next: forward the sent value.
    ctx.switch_to_basic_block(next_block);
    iterator::call_and_validate_into(
        ctx,
        &inner_result,
        &handle.next_method,
        &handle.iterator,
        &[&received],
        iterator::NEXT_RESULT_NOT_OBJECT,
    );
    ctx.emit(Instruction::Jump { target: check_done });

    // Throw: forward to .throw, or give up on the delegate.
    ctx.switch_to_basic_block(throw_block);
    let throw_method = ctx.allocate_register();
    let throw_property = ctx.intern_identifier("throw");
    ctx.emit(Instruction::GetMethod {
        dst: throw_method.operand(),
        object: handle.iterator.operand(),
        property: throw_property,
    });
    let has_throw = ctx.make_block();
    let missing_throw = ctx.make_block();
    ctx.emit(Instruction::JumpUndefined {
        condition: throw_method.operand(),
        true_target: missing_throw,
        false_target: has_throw,
    });

    ctx.switch_to_basic_block(has_throw);
    iterator::call_and_validate_into(
        ctx,
        &inner_result,
        &throw_method,
        &handle.iterator,
        &[&received],
        THROW_RESULT_NOT_OBJECT,
    );
    ctx.emit(Instruction::Jump { target: check_done });

    ctx.switch_to_basic_block(missing_throw);
    iterator::close(ctx, &handle.iterator);
    ctx.emit_throw_type_error(DELEGATE_MISSING_THROW);

    // Return: forward to .return, or complete right away.
    ctx.switch_to_basic_block(return_block);
    let return_method = ctx.allocate_register();
    let return_property = ctx.intern_identifier("return");
    ctx.emit(Instruction::GetMethod {
        dst: return_method.operand(),
        object: handle.iterator.operand(),
        property: return_property,
    });
    let has_return = ctx.make_block();
    let missing_return = ctx.make_block();
    ctx.emit(Instruction::JumpUndefined {
        condition: return_method.operand(),
        true_target: missing_return,
        false_target: has_return,
    });

    ctx.switch_to_basic_block(missing_return);
    ctx.generate_return(&received);

    ctx.switch_to_basic_block(has_return);
    iterator::call_and_validate_into(
        ctx,
        &inner_result,
        &return_method,
        &handle.iterator,
        &[&received],
        RETURN_RESULT_NOT_OBJECT,
    );
    let return_done = ctx.make_block();
    iterator::branch_on_done(ctx, &inner_result, return_done);
    ctx.emit(Instruction::Jump { target: yield_block });

    ctx.switch_to_basic_block(return_done);
    let return_value = ctx.allocate_register();
    let value_property = ctx.intern_identifier("value");
    ctx.emit(Instruction::GetById {
        dst: return_value.operand(),
        base: inner_result.operand(),
        property: value_property,
    });
    ctx.generate_return(&return_value);

    ctx.switch_to_basic_block(check_done);
    iterator::branch_on_done(ctx, &inner_result, done_block);
    ctx.emit(Instruction::Jump { target: yield_block });

    // Not done: hand the inner result to our caller as is.
    ctx.switch_to_basic_block(yield_block);
    ctx.emit(Instruction::SaveAndYield {
        value: inner_result.operand(),
        resume_target: resume_block,
        suspension: index,
    });
    ctx.record_resume_target(index, resume_block)?;

    ctx.switch_to_basic_block(resume_block);
    let resume_kind = ctx.resume_kind();
    ctx.emit(Instruction::ResumeGenerator {
        kind_dst: resume_kind.operand(),
        value_dst: received.operand(),
    });
    ctx.emit_mov(&received_kind, &resume_kind);
    ctx.emit(Instruction::Jump { target: loop_block });

    ctx.switch_to_basic_block(done_block);
    let dst = choose_dst(ctx, preferred_dst);
    ctx.emit(Instruction::GetById {
        dst: dst.operand(),
        base: inner_result.operand(),
        property: value_property,
    });
    Ok(dst)
}
