/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! The iterator protocol as CFG fragments.
//!
//! for-of, array destructuring, spread and `yield*` all drive iterators
//! through these helpers. The constructs differ only in what they do with
//! each stepped value; the call sequences are emitted from one place.

use super::context::{FinallyCleanup, FinallyContext, LoweringContext, ScopedOperand};
use crate::ir::instruction::Instruction;
use crate::ir::operand::Label;

pub const NOT_ITERABLE: &str = "value is not iterable";
pub const ITERATOR_NOT_OBJECT: &str = "iterator is not an object";
pub const NEXT_RESULT_NOT_OBJECT: &str = "iterator.next() did not return an object";
pub const THROW_RESULT_NOT_OBJECT: &str = "iterator.throw() did not return an object";
pub const RETURN_RESULT_NOT_OBJECT: &str = "iterator.return() did not return an object";
pub const DELEGATE_MISSING_THROW: &str = "yield* delegate must have a .throw() method";

/// An acquired iterator and its cached `next` method.
#[derive(Debug, Clone)]
pub struct IteratorHandle {
    pub iterator: ScopedOperand,
    pub next_method: ScopedOperand,
}

/// `iterable[Symbol.iterator]()`, checked to be an object, plus its `next`.
pub fn acquire(ctx: &mut LoweringContext, iterable: &ScopedOperand) -> IteratorHandle {
    let symbol = ctx.add_constant_iterator_symbol();
    let method = ctx.allocate_register();
    ctx.emit(Instruction::GetByValue {
        dst: method.operand(),
        base: iterable.operand(),
        property: symbol.operand(),
    });

    let not_iterable = ctx.make_block();
    let callable = ctx.make_block();
    let null = ctx.add_constant_null();
    ctx.emit(Instruction::JumpLooselyEquals {
        lhs: method.operand(),
        rhs: null.operand(),
        true_target: not_iterable,
        false_target: callable,
    });

    ctx.switch_to_basic_block(not_iterable);
    ctx.emit_throw_type_error(NOT_ITERABLE);

    ctx.switch_to_basic_block(callable);
    let iterator = call_and_validate(ctx, &method, iterable, &[], ITERATOR_NOT_OBJECT);

    let next_method = ctx.allocate_register();
    let next = ctx.intern_identifier("next");
    ctx.emit(Instruction::GetById {
        dst: next_method.operand(),
        base: iterator.operand(),
        property: next,
    });
    IteratorHandle { iterator, next_method }
}

/// `method.call(this_value, ...arguments)`, throwing a TypeError with
/// `message` unless the result is an object.
pub fn call_and_validate(
    ctx: &mut LoweringContext,
    method: &ScopedOperand,
    this_value: &ScopedOperand,
    arguments: &[&ScopedOperand],
    message: &str,
) -> ScopedOperand {
    let result = ctx.allocate_register();
    call_and_validate_into(ctx, &result, method, this_value, arguments, message);
    result
}

pub fn call_and_validate_into(
    ctx: &mut LoweringContext,
    dst: &ScopedOperand,
    method: &ScopedOperand,
    this_value: &ScopedOperand,
    arguments: &[&ScopedOperand],
    message: &str,
) {
    ctx.emit(Instruction::Call {
        dst: dst.operand(),
        callee: method.operand(),
        this_value: this_value.operand(),
        arguments: arguments.iter().map(|argument| argument.operand()).collect(),
    });
    let message = ctx.intern_string(message);
    ctx.emit(Instruction::ThrowIfNotObject { src: dst.operand(), message });
}

/// Call `next` (with `sent`, if any) and return the validated result object.
pub fn step_result(
    ctx: &mut LoweringContext,
    handle: &IteratorHandle,
    sent: Option<&ScopedOperand>,
) -> ScopedOperand {
    let arguments: Vec<&ScopedOperand> = sent.into_iter().collect();
    call_and_validate(
        ctx,
        &handle.next_method,
        &handle.iterator,
        &arguments,
        NEXT_RESULT_NOT_OBJECT,
    )
}

/// Step the iterator. Jumps to `done_target` when it is exhausted; otherwise
/// continues in a fresh block and returns the stepped value.
pub fn step(
    ctx: &mut LoweringContext,
    handle: &IteratorHandle,
    done_target: Label,
) -> ScopedOperand {
    let result = step_result(ctx, handle, None);
    branch_on_done(ctx, &result, done_target);
    let value = ctx.allocate_register();
    let value_property = ctx.intern_identifier("value");
    ctx.emit(Instruction::GetById {
        dst: value.operand(),
        base: result.operand(),
        property: value_property,
    });
    value
}

/// Read `result.done` and jump to `done_target` if it is truthy.
pub fn branch_on_done(ctx: &mut LoweringContext, result: &ScopedOperand, done_target: Label) {
    let done = ctx.allocate_register();
    let done_property = ctx.intern_identifier("done");
    ctx.emit(Instruction::GetById {
        dst: done.operand(),
        base: result.operand(),
        property: done_property,
    });
    let not_done = ctx.make_block();
    ctx.emit_jump_if(&done, done_target, not_done);
    ctx.switch_to_basic_block(not_done);
}

/// Close on a normal, break or return completion: call `return` if there is
/// one. Its exceptions propagate and a non-object result is a TypeError.
pub fn close(ctx: &mut LoweringContext, iterator: &ScopedOperand) {
    let method = ctx.allocate_register();
    let return_property = ctx.intern_identifier("return");
    ctx.emit(Instruction::GetMethod {
        dst: method.operand(),
        object: iterator.operand(),
        property: return_property,
    });

    let call_block = ctx.make_block();
    let after = ctx.make_block();
    ctx.emit(Instruction::JumpUndefined {
        condition: method.operand(),
        true_target: after,
        false_target: call_block,
    });

    ctx.switch_to_basic_block(call_block);
    call_and_validate(ctx, &method, iterator, &[], RETURN_RESULT_NOT_OBJECT);
    ctx.emit(Instruction::Jump { target: after });

    ctx.switch_to_basic_block(after);
}

/// Close on a throw completion, then rethrow `exception`. Anything thrown
/// while looking up or calling `return` is dropped in favour of the
/// original exception, and the result is not checked.
pub fn close_and_rethrow(
    ctx: &mut LoweringContext,
    iterator: &ScopedOperand,
    exception: &ScopedOperand,
) {
    let saved_handler = ctx.current_unwind_handler;
    let rethrow = ctx.make_block();
    let swallow = ctx.make_block();

    ctx.current_unwind_handler = Some(swallow);
    let lookup = ctx.make_block();
    let call_block = ctx.make_block();
    ctx.current_unwind_handler = saved_handler;

    ctx.emit(Instruction::Jump { target: lookup });

    ctx.switch_to_basic_block(lookup);
    let method = ctx.allocate_register();
    let return_property = ctx.intern_identifier("return");
    ctx.emit(Instruction::GetMethod {
        dst: method.operand(),
        object: iterator.operand(),
        property: return_property,
    });
    ctx.emit(Instruction::JumpUndefined {
        condition: method.operand(),
        true_target: rethrow,
        false_target: call_block,
    });

    ctx.switch_to_basic_block(call_block);
    let ignored = ctx.allocate_register();
    ctx.emit(Instruction::Call {
        dst: ignored.operand(),
        callee: method.operand(),
        this_value: iterator.operand(),
        arguments: Vec::new(),
    });
    ctx.emit(Instruction::Jump { target: rethrow });

    ctx.switch_to_basic_block(swallow);
    ctx.emit(Instruction::Catch { dst: ignored.operand() });
    ctx.emit(Instruction::Jump { target: rethrow });

    ctx.switch_to_basic_block(rethrow);
    ctx.emit(Instruction::Throw { src: exception.operand() });
}

/// Step the iterator until it is done, appending every value to `array`.
pub fn drain_into(ctx: &mut LoweringContext, handle: &IteratorHandle, array: &ScopedOperand) {
    let loop_block = ctx.make_block();
    let done = ctx.make_block();
    ctx.emit(Instruction::Jump { target: loop_block });

    ctx.switch_to_basic_block(loop_block);
    let value = step(ctx, handle, done);
    ctx.emit(Instruction::ArrayAppend { dst: array.operand(), src: value.operand() });
    ctx.emit(Instruction::Jump { target: loop_block });

    ctx.switch_to_basic_block(done);
}

/// Emit the cleanup body of an iterator-closing `FinallyContext`:
/// close unless exhausted, then continue with the recorded completion.
/// A throw completion closes and rethrows the pending exception.
pub fn emit_close_body(ctx: &mut LoweringContext, context_index: usize, normal_target: Label) {
    let context = &ctx.finally_contexts[context_index];
    let FinallyCleanup::CloseIterator { iterator, done } = context.cleanup.clone() else {
        return;
    };
    let completion_type = context.completion_type.clone();
    let completion_value = context.completion_value.clone();
    let finally_body = context.finally_body;

    ctx.switch_to_basic_block(finally_body);
    let dispatch = ctx.make_block();
    if let Some(done) = done {
        let not_exhausted = ctx.make_block();
        ctx.emit_jump_if(&done, dispatch, not_exhausted);
        ctx.switch_to_basic_block(not_exhausted);
    }

    let throw_close = ctx.make_block();
    let normal_close = ctx.make_block();
    ctx.emit_jump_if_equals_i32(&completion_type, FinallyContext::THROW, throw_close, normal_close);

    ctx.switch_to_basic_block(throw_close);
    close_and_rethrow(ctx, &iterator, &completion_value);

    ctx.switch_to_basic_block(normal_close);
    close(ctx, &iterator);
    ctx.emit(Instruction::Jump { target: dispatch });

    ctx.switch_to_basic_block(dispatch);
    ctx.emit_completion_dispatch(context_index, normal_target);
}
