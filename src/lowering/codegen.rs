/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! AST to CFG code generation.
//!
//! Walks statements and expressions, emitting instructions through the
//! `LoweringContext`. Children are evaluated in the same order the indexer
//! walks them; suspensions and try regions are claimed from the index as
//! they are reached.

use std::mem;

use super::context::{
    BlockBoundaryType, FinallyCleanup, FinallyContext, LoweringContext, ScopedOperand, choose_dst,
};
use super::{delegate, iterator, suspend};
use crate::ast::*;
use crate::error::CompileError;
use crate::ir::function::{IterationContext, TryRegionKind};
use crate::ir::instruction::Instruction;
use crate::ir::operand::{IdentifierTableIndex, Label};

type CodegenResult<T = ()> = Result<T, CompileError>;

fn unsupported(ctx: &LoweringContext, construct: &'static str) -> CompileError {
    CompileError::Unsupported { function: ctx.name.clone(), construct }
}

// =============================================================================
// Function bodies
// =============================================================================

/// Generate the whole body into `ctx`. For resumable bodies, returns the
/// resume target of the start suspension.
pub fn generate_function_body(
    function: &FunctionData,
    ctx: &mut LoweringContext,
) -> CodegenResult<Option<Label>> {
    let entry = ctx.make_block();
    ctx.switch_to_basic_block(entry);

    generate_parameter_defaults(function, ctx)?;
    let start = if ctx.is_resumable() { Some(suspend::emit_generator_start(ctx)) } else { None };

    for statement in &function.body {
        generate_statement(statement, ctx)?;
    }
    Ok(start)
}

/// Defaults run when the function is called, before the start suspension.
fn generate_parameter_defaults(
    function: &FunctionData,
    ctx: &mut LoweringContext,
) -> CodegenResult {
    for (index, parameter) in function.parameters.iter().enumerate() {
        let Some(default_value) = &parameter.default_value else { continue };
        let argument = ctx.resolve_local(crate::u32_from_usize(index), LocalType::Argument);
        let assign_block = ctx.make_block();
        let after_block = ctx.make_block();
        ctx.emit(Instruction::JumpUndefined {
            condition: argument.operand(),
            true_target: assign_block,
            false_target: after_block,
        });

        ctx.switch_to_basic_block(assign_block);
        let value = generate_expression(default_value, ctx, None)?;
        ctx.emit_mov(&argument, &value);
        ctx.emit(Instruction::Jump { target: after_block });

        ctx.switch_to_basic_block(after_block);
    }
    Ok(())
}

// =============================================================================
// Statements
// =============================================================================

pub fn generate_statement(statement: &Statement, ctx: &mut LoweringContext) -> CodegenResult {
    ctx.set_source_range(statement.range.start.offset, statement.range.end.offset);
    match &statement.inner {
        StatementKind::Empty => Ok(()),
        StatementKind::Expression(expression) => {
            generate_expression(expression, ctx, None).map(drop)
        }
        StatementKind::Block(body) => {
            for child in body {
                generate_statement(child, ctx)?;
            }
            Ok(())
        }
        StatementKind::VariableDeclaration { kind, declarations } => {
            generate_variable_declaration(ctx, *kind, declarations)
        }
        StatementKind::If { test, consequent, alternate } => {
            generate_if_statement(ctx, test, consequent, alternate.as_deref())
        }
        StatementKind::While { test, body } => generate_while_statement(ctx, test, body),
        StatementKind::DoWhile { test, body } => generate_do_while_statement(ctx, test, body),
        StatementKind::For { init, test, update, body } => {
            generate_for_statement(ctx, init.as_ref(), test.as_deref(), update.as_deref(), body)
        }
        StatementKind::ForOf { lhs, rhs, body } => generate_for_of_statement(ctx, lhs, rhs, body),
        StatementKind::Labelled { label, item } => generate_labelled_statement(ctx, label, item),
        StatementKind::Break { target_label } => ctx.generate_break(target_label.as_deref()),
        StatementKind::Continue { target_label } => ctx.generate_continue(target_label.as_deref()),
        StatementKind::Return(value) => generate_return_statement(ctx, value.as_deref()),
        StatementKind::Throw(value) => {
            let value = generate_expression(value, ctx, None)?;
            ctx.emit(Instruction::Throw { src: value.operand() });
            Ok(())
        }
        StatementKind::Try(data) => generate_try_statement(ctx, data),
    }
}

fn generate_variable_declaration(
    ctx: &mut LoweringContext,
    kind: DeclarationKind,
    declarations: &[VariableDeclarator],
) -> CodegenResult {
    for declarator in declarations {
        match (&declarator.target, &declarator.init) {
            (VariableDeclaratorTarget::Identifier(identifier), Some(init)) => {
                let value = generate_expression(init, ctx, None)?;
                emit_set_variable(ctx, identifier, &value);
            }
            (VariableDeclaratorTarget::Identifier(identifier), None) => {
                // `let x;` rebinds to undefined every time it runs, `var x;` does nothing.
                if kind != DeclarationKind::Var {
                    let undefined = ctx.add_constant_undefined();
                    emit_set_variable(ctx, identifier, &undefined);
                }
            }
            (VariableDeclaratorTarget::BindingPattern(pattern), Some(init)) => {
                let value = generate_expression(init, ctx, None)?;
                generate_binding_pattern(ctx, pattern, &value)?;
            }
            (VariableDeclaratorTarget::BindingPattern(_), None) => {
                return Err(unsupported(ctx, "destructuring declaration without an initializer"));
            }
        }
    }
    Ok(())
}

fn generate_if_statement(
    ctx: &mut LoweringContext,
    test: &Expression,
    consequent: &Statement,
    alternate: Option<&Statement>,
) -> CodegenResult {
    let predicate = generate_expression(test, ctx, None)?;

    let true_block = ctx.make_block();
    let false_block = ctx.make_block();
    let end_block = if alternate.is_some() { ctx.make_block() } else { false_block };

    ctx.emit_jump_if(&predicate, true_block, false_block);
    drop(predicate);

    ctx.switch_to_basic_block(true_block);
    generate_statement(consequent, ctx)?;
    ctx.emit(Instruction::Jump { target: end_block });

    if let Some(alternate) = alternate {
        ctx.switch_to_basic_block(false_block);
        generate_statement(alternate, ctx)?;
        ctx.emit(Instruction::Jump { target: end_block });
    }

    ctx.switch_to_basic_block(end_block);
    Ok(())
}

// =============================================================================
// Loops
// =============================================================================

fn generate_while_statement(
    ctx: &mut LoweringContext,
    test: &Expression,
    body: &Statement,
) -> CodegenResult {
    let labels = mem::take(&mut ctx.pending_labels);
    let test_block = ctx.make_block();
    let body_block = ctx.make_block();
    let end_block = ctx.make_block();

    ctx.emit(Instruction::Jump { target: test_block });

    ctx.switch_to_basic_block(test_block);
    let test_value = generate_expression(test, ctx, None)?;
    ctx.emit_jump_if(&test_value, body_block, end_block);
    drop(test_value);

    ctx.switch_to_basic_block(body_block);
    ctx.begin_continuable_scope(test_block, labels.clone());
    ctx.begin_breakable_scope(end_block, labels);
    generate_statement(body, ctx)?;
    ctx.end_breakable_scope();
    ctx.end_continuable_scope();
    ctx.emit(Instruction::Jump { target: test_block });

    ctx.switch_to_basic_block(end_block);
    Ok(())
}

fn generate_do_while_statement(
    ctx: &mut LoweringContext,
    test: &Expression,
    body: &Statement,
) -> CodegenResult {
    let labels = mem::take(&mut ctx.pending_labels);
    let body_block = ctx.make_block();
    let test_block = ctx.make_block();
    let end_block = ctx.make_block();

    ctx.emit(Instruction::Jump { target: body_block });

    ctx.switch_to_basic_block(body_block);
    ctx.begin_continuable_scope(test_block, labels.clone());
    ctx.begin_breakable_scope(end_block, labels);
    generate_statement(body, ctx)?;
    ctx.end_breakable_scope();
    ctx.end_continuable_scope();
    ctx.emit(Instruction::Jump { target: test_block });

    ctx.switch_to_basic_block(test_block);
    let test_value = generate_expression(test, ctx, None)?;
    ctx.emit_jump_if(&test_value, body_block, end_block);
    drop(test_value);

    ctx.switch_to_basic_block(end_block);
    Ok(())
}

fn generate_for_statement(
    ctx: &mut LoweringContext,
    init: Option<&ForInit>,
    test: Option<&Expression>,
    update: Option<&Expression>,
    body: &Statement,
) -> CodegenResult {
    let labels = mem::take(&mut ctx.pending_labels);
    match init {
        Some(ForInit::Declaration(declaration)) => generate_statement(declaration, ctx)?,
        Some(ForInit::Expression(expression)) => drop(generate_expression(expression, ctx, None)?),
        None => {}
    }

    let test_block = ctx.make_block();
    let body_block = ctx.make_block();
    let update_block = ctx.make_block();
    let end_block = ctx.make_block();

    ctx.emit(Instruction::Jump { target: test_block });

    ctx.switch_to_basic_block(test_block);
    match test {
        Some(test) => {
            let test_value = generate_expression(test, ctx, None)?;
            ctx.emit_jump_if(&test_value, body_block, end_block);
        }
        None => ctx.emit(Instruction::Jump { target: body_block }),
    }

    ctx.switch_to_basic_block(body_block);
    ctx.begin_continuable_scope(update_block, labels.clone());
    ctx.begin_breakable_scope(end_block, labels);
    generate_statement(body, ctx)?;
    ctx.end_breakable_scope();
    ctx.end_continuable_scope();
    ctx.emit(Instruction::Jump { target: update_block });

    ctx.switch_to_basic_block(update_block);
    if let Some(update) = update {
        drop(generate_expression(update, ctx, None)?);
    }
    ctx.emit(Instruction::Jump { target: test_block });

    ctx.switch_to_basic_block(end_block);
    Ok(())
}

/// for-of drives the iterator with an iterator-closing `FinallyContext`:
/// break, return (including a `Return` resumption inside the body) and
/// exceptions from the body all run `iterator.return()`; exhaustion and
/// `continue` do not.
fn generate_for_of_statement(
    ctx: &mut LoweringContext,
    lhs: &ForOfLhs,
    rhs: &Expression,
    body: &Statement,
) -> CodegenResult {
    let labels = mem::take(&mut ctx.pending_labels);
    let iterable = generate_expression(rhs, ctx, None)?;
    let handle = iterator::acquire(ctx, &iterable);
    drop(iterable);

    let region = ctx.enter_try_region(TryRegionKind::IteratorClose(IterationContext::ForOf))?;
    let end_block = ctx.make_block();
    let update_block = ctx.make_block();

    let saved_handler = ctx.current_unwind_handler;
    let completion_type = ctx.allocate_register();
    let completion_value = ctx.allocate_register();
    let close_body = ctx.make_block();
    let exception_preamble = ctx.make_block();
    let parent_index = ctx.current_finally_context;
    let context_index = ctx.push_finally_context(FinallyContext {
        completion_type: completion_type.clone(),
        completion_value: completion_value.clone(),
        finally_body: close_body,
        exception_preamble,
        parent_index,
        registered_jumps: Vec::new(),
        next_jump_index: FinallyContext::FIRST_JUMP_INDEX,
        cleanup: FinallyCleanup::CloseIterator { iterator: handle.iterator.clone(), done: None },
    });

    // Break leaves through the cleanup; continue stays inside it.
    ctx.begin_breakable_scope(end_block, labels.clone());
    ctx.start_boundary(BlockBoundaryType::ReturnToFinally);
    ctx.emit(Instruction::Jump { target: update_block });

    // A throwing next() means the iterator is broken: no close.
    ctx.switch_to_basic_block(update_block);
    let value = iterator::step(ctx, &handle, end_block);

    ctx.current_unwind_handler = Some(exception_preamble);
    let body_block = ctx.make_block();
    ctx.emit(Instruction::Jump { target: body_block });
    ctx.switch_to_basic_block(body_block);

    match lhs {
        ForOfLhs::Declaration(declaration) => {
            let StatementKind::VariableDeclaration { declarations, .. } = &declaration.inner else {
                return Err(unsupported(ctx, "for-of declaration"));
            };
            for declarator in declarations {
                match &declarator.target {
                    VariableDeclaratorTarget::Identifier(identifier) => {
                        emit_set_variable(ctx, identifier, &value)
                    }
                    VariableDeclaratorTarget::BindingPattern(pattern) => {
                        generate_binding_pattern(ctx, pattern, &value)?
                    }
                }
            }
        }
        ForOfLhs::Expression(target) => {
            let reference = emit_evaluate_reference(ctx, target)?;
            emit_store_to_reference(ctx, &reference, &value);
        }
        ForOfLhs::Pattern(pattern) => generate_binding_pattern(ctx, pattern, &value)?,
    }
    drop(value);

    ctx.begin_continuable_scope(update_block, labels);
    generate_statement(body, ctx)?;
    ctx.end_continuable_scope();
    ctx.emit(Instruction::Jump { target: update_block });

    ctx.current_unwind_handler = saved_handler;
    ctx.end_boundary(BlockBoundaryType::ReturnToFinally);
    ctx.end_breakable_scope();
    ctx.pop_finally_context();
    ctx.exit_try_region(region);

    ctx.switch_to_basic_block(exception_preamble);
    ctx.emit(Instruction::Catch { dst: completion_value.operand() });
    let throw_tag = ctx.add_constant_i32(FinallyContext::THROW);
    ctx.emit_mov(&completion_type, &throw_tag);
    ctx.emit(Instruction::Jump { target: close_body });

    iterator::emit_close_body(ctx, context_index, end_block);

    ctx.switch_to_basic_block(end_block);
    Ok(())
}

fn generate_labelled_statement(
    ctx: &mut LoweringContext,
    label: &str,
    item: &Statement,
) -> CodegenResult {
    match &item.inner {
        StatementKind::While { .. }
        | StatementKind::DoWhile { .. }
        | StatementKind::For { .. }
        | StatementKind::ForOf { .. }
        | StatementKind::Labelled { .. } => {
            ctx.pending_labels.push(label.to_string());
            generate_statement(item, ctx)
        }
        _ => {
            // Non-iteration: wrap in a breakable scope so `break label;` works.
            let mut labels = mem::take(&mut ctx.pending_labels);
            labels.push(label.to_string());
            let end_block = ctx.make_block();
            ctx.begin_breakable_scope(end_block, labels);
            generate_statement(item, ctx)?;
            ctx.end_breakable_scope();
            ctx.emit(Instruction::Jump { target: end_block });
            ctx.switch_to_basic_block(end_block);
            Ok(())
        }
    }
}

// =============================================================================
// Return, try
// =============================================================================

fn generate_return_statement(
    ctx: &mut LoweringContext,
    value: Option<&Expression>,
) -> CodegenResult {
    let value = match value {
        Some(expression) => generate_expression(expression, ctx, None)?,
        None => ctx.add_constant_undefined(),
    };
    ctx.generate_return(&value);
    Ok(())
}

/// Normal completion of a protected block: through the finalizer if there
/// is one, otherwise straight to the end.
fn emit_normal_completion(
    ctx: &mut LoweringContext,
    finally: Option<(&ScopedOperand, Label)>,
    end_block: Label,
) {
    match finally {
        Some((completion_type, finally_body)) => {
            let normal = ctx.add_constant_i32(FinallyContext::NORMAL);
            ctx.emit_mov(completion_type, &normal);
            ctx.emit(Instruction::Jump { target: finally_body });
        }
        None => ctx.emit(Instruction::Jump { target: end_block }),
    }
}

fn generate_try_statement(ctx: &mut LoweringContext, data: &TryStatementData) -> CodegenResult {
    let saved_handler = ctx.current_unwind_handler;
    let end_block = ctx.make_block();

    // try { } finally { }: the finalizer runs for every completion of the
    // try and catch blocks. Everything thrown in them lands in the preamble.
    let mut finally_state = None;
    if data.finalizer.is_some() {
        let completion_type = ctx.allocate_register();
        let completion_value = ctx.allocate_register();
        let finally_body = ctx.make_block();
        let exception_preamble = ctx.make_block();
        let parent_index = ctx.current_finally_context;
        let context_index = ctx.push_finally_context(FinallyContext {
            completion_type: completion_type.clone(),
            completion_value: completion_value.clone(),
            finally_body,
            exception_preamble,
            parent_index,
            registered_jumps: Vec::new(),
            next_jump_index: FinallyContext::FIRST_JUMP_INDEX,
            cleanup: FinallyCleanup::Finalizer,
        });
        ctx.start_boundary(BlockBoundaryType::ReturnToFinally);
        let region = ctx.enter_try_region(TryRegionKind::Finally)?;
        ctx.current_unwind_handler = Some(exception_preamble);
        finally_state = Some((
            completion_type,
            completion_value,
            finally_body,
            exception_preamble,
            context_index,
            region,
        ));
    }
    let finally_target = finally_state
        .as_ref()
        .map(|(completion_type, _, body, ..)| (completion_type.clone(), *body));
    let finally_ref =
        finally_target.as_ref().map(|(completion_type, body)| (completion_type, *body));

    match &data.handler {
        Some(handler) => {
            let handler_outside_catch = ctx.current_unwind_handler;
            let catch_block = ctx.make_block();
            let region = ctx.enter_try_region(TryRegionKind::Catch)?;
            ctx.current_unwind_handler = Some(catch_block);
            let try_block = ctx.make_block();
            ctx.emit(Instruction::Jump { target: try_block });

            ctx.switch_to_basic_block(try_block);
            generate_statement(&data.block, ctx)?;
            emit_normal_completion(ctx, finally_ref, end_block);

            ctx.current_unwind_handler = handler_outside_catch;
            ctx.exit_try_region(region);

            ctx.switch_to_basic_block(catch_block);
            match &handler.parameter {
                Some(CatchBinding::Identifier(identifier)) if identifier.is_local() => {
                    let local = emit_identifier_operand(ctx, identifier);
                    ctx.emit(Instruction::Catch { dst: local.operand() });
                }
                Some(CatchBinding::Identifier(identifier)) => {
                    let exception = ctx.allocate_register();
                    ctx.emit(Instruction::Catch { dst: exception.operand() });
                    emit_set_variable(ctx, identifier, &exception);
                }
                Some(CatchBinding::BindingPattern(pattern)) => {
                    let exception = ctx.allocate_register();
                    ctx.emit(Instruction::Catch { dst: exception.operand() });
                    generate_binding_pattern(ctx, pattern, &exception)?;
                }
                None => {
                    let exception = ctx.allocate_register();
                    ctx.emit(Instruction::Catch { dst: exception.operand() });
                }
            }
            generate_statement(&handler.body, ctx)?;
            emit_normal_completion(ctx, finally_ref, end_block);
        }
        None => {
            let try_block = ctx.make_block();
            ctx.emit(Instruction::Jump { target: try_block });
            ctx.switch_to_basic_block(try_block);
            generate_statement(&data.block, ctx)?;
            emit_normal_completion(ctx, finally_ref, end_block);
        }
    }

    if let Some((
        completion_type,
        completion_value,
        finally_body,
        exception_preamble,
        context_index,
        region,
    )) = finally_state
        && let Some(finalizer) = &data.finalizer
    {
        ctx.current_unwind_handler = saved_handler;
        ctx.exit_try_region(region);
        ctx.end_boundary(BlockBoundaryType::ReturnToFinally);
        ctx.pop_finally_context();

        ctx.switch_to_basic_block(exception_preamble);
        ctx.emit(Instruction::Catch { dst: completion_value.operand() });
        let throw_tag = ctx.add_constant_i32(FinallyContext::THROW);
        ctx.emit_mov(&completion_type, &throw_tag);
        ctx.emit(Instruction::Jump { target: finally_body });

        ctx.switch_to_basic_block(finally_body);
        generate_statement(finalizer, ctx)?;
        ctx.emit_completion_dispatch(context_index, end_block);
    }

    ctx.current_unwind_handler = saved_handler;
    ctx.switch_to_basic_block(end_block);
    Ok(())
}

// =============================================================================
// Expressions
// =============================================================================

/// Expressions that cannot observe or cause side effects.
fn is_simple(expression: &Expression) -> bool {
    matches!(
        expression.inner,
        ExpressionKind::NumericLiteral(_)
            | ExpressionKind::StringLiteral(_)
            | ExpressionKind::BooleanLiteral(_)
            | ExpressionKind::NullLiteral
            | ExpressionKind::BigIntLiteral(_)
            | ExpressionKind::Identifier(_)
            | ExpressionKind::This
    )
}

/// Evaluate `expressions` left to right. Locals are copied when a later
/// expression could reassign them.
fn generate_operand_list<'a>(
    ctx: &mut LoweringContext,
    expressions: impl Iterator<Item = Option<&'a Expression>>,
) -> CodegenResult<Vec<ScopedOperand>> {
    let all: Vec<Option<&Expression>> = expressions.collect();
    let mut values = Vec::with_capacity(all.len());
    for (i, expression) in all.iter().enumerate() {
        let value = match expression {
            Some(expression) => generate_expression(expression, ctx, None)?,
            None => ctx.add_constant_undefined(),
        };
        let later_has_effects = all[i + 1..].iter().flatten().any(|later| !is_simple(later));
        values.push(if later_has_effects {
            ctx.copy_if_needed_to_preserve_evaluation_order(&value)
        } else {
            value
        });
    }
    Ok(values)
}

pub fn generate_expression(
    expression: &Expression,
    ctx: &mut LoweringContext,
    preferred_dst: Option<&ScopedOperand>,
) -> CodegenResult<ScopedOperand> {
    match &expression.inner {
        ExpressionKind::NumericLiteral(value) => Ok(ctx.add_constant_number(*value)),
        ExpressionKind::StringLiteral(value) => Ok(ctx.add_constant_string(value)),
        ExpressionKind::BooleanLiteral(value) => Ok(ctx.add_constant_boolean(*value)),
        ExpressionKind::NullLiteral => Ok(ctx.add_constant_null()),
        ExpressionKind::BigIntLiteral(digits) => Ok(ctx.add_constant_bigint(digits)),
        ExpressionKind::Identifier(identifier) => {
            Ok(generate_identifier(ctx, identifier, preferred_dst))
        }
        ExpressionKind::This => Ok(ctx.this_value()),

        ExpressionKind::Binary { op, lhs, rhs } => {
            let lhs_value = generate_expression(lhs, ctx, None)?;
            let lhs_value = if is_simple(rhs) {
                lhs_value
            } else {
                ctx.copy_if_needed_to_preserve_evaluation_order(&lhs_value)
            };
            let rhs_value = generate_expression(rhs, ctx, None)?;
            let dst = choose_dst(ctx, preferred_dst);
            emit_binary_op(ctx, *op, &dst, &lhs_value, &rhs_value);
            Ok(dst)
        }
        ExpressionKind::Logical { op, lhs, rhs } => {
            generate_logical(ctx, *op, lhs, rhs, preferred_dst)
        }
        ExpressionKind::Unary { op, operand } => {
            let value = generate_expression(operand, ctx, None)?;
            if *op == UnaryOp::Void {
                return Ok(ctx.add_constant_undefined());
            }
            let dst = choose_dst(ctx, preferred_dst);
            let (dst_operand, src) = (dst.operand(), value.operand());
            ctx.emit(match op {
                UnaryOp::Not => Instruction::Not { dst: dst_operand, src },
                UnaryOp::Minus => Instruction::Negate { dst: dst_operand, src },
                UnaryOp::Plus => Instruction::ToNumber { dst: dst_operand, src },
                UnaryOp::Typeof | UnaryOp::Void => Instruction::Typeof { dst: dst_operand, src },
            });
            Ok(dst)
        }
        ExpressionKind::Update { op, argument, prefixed } => {
            let reference = emit_evaluate_reference(ctx, argument)?;
            let current = emit_load_from_reference(ctx, &reference);
            let old_value = ctx.allocate_register();
            ctx.emit(Instruction::ToNumber { dst: old_value.operand(), src: current.operand() });
            drop(current);
            let one = ctx.add_constant_number(1.0);
            let new_value = ctx.allocate_register();
            let (dst, lhs, rhs) = (new_value.operand(), old_value.operand(), one.operand());
            ctx.emit(match op {
                UpdateOp::Increment => Instruction::Add { dst, lhs, rhs },
                UpdateOp::Decrement => Instruction::Sub { dst, lhs, rhs },
            });
            emit_store_to_reference(ctx, &reference, &new_value);
            Ok(if *prefixed { new_value } else { old_value })
        }
        ExpressionKind::Assignment { op, lhs, rhs } => generate_assignment(ctx, *op, lhs, rhs),
        ExpressionKind::Conditional { test, consequent, alternate } => {
            let predicate = generate_expression(test, ctx, None)?;
            let true_block = ctx.make_block();
            let false_block = ctx.make_block();
            let end_block = ctx.make_block();
            ctx.emit_jump_if(&predicate, true_block, false_block);
            drop(predicate);

            let dst = ctx.allocate_register();
            ctx.switch_to_basic_block(true_block);
            let value = generate_expression(consequent, ctx, Some(&dst))?;
            ctx.emit_mov(&dst, &value);
            ctx.emit(Instruction::Jump { target: end_block });

            ctx.switch_to_basic_block(false_block);
            let value = generate_expression(alternate, ctx, Some(&dst))?;
            ctx.emit_mov(&dst, &value);
            ctx.emit(Instruction::Jump { target: end_block });

            ctx.switch_to_basic_block(end_block);
            Ok(dst)
        }
        ExpressionKind::Sequence(expressions) => {
            let mut last = ctx.add_constant_undefined();
            for expression in expressions {
                last = generate_expression(expression, ctx, None)?;
            }
            Ok(last)
        }

        ExpressionKind::Member { object, property, computed } => {
            let base = generate_expression(object, ctx, None)?;
            let base = if *computed && !is_simple(property) {
                ctx.copy_if_needed_to_preserve_evaluation_order(&base)
            } else {
                base
            };
            let dst = choose_dst(ctx, preferred_dst);
            emit_get_property(ctx, &dst, &base, property, *computed)?;
            Ok(dst)
        }
        ExpressionKind::Call(data) => generate_call_expression(ctx, data, preferred_dst),
        ExpressionKind::Array(elements) => generate_array_expression(ctx, elements, preferred_dst),
        ExpressionKind::Object(properties) => {
            let dst = choose_dst(ctx, preferred_dst);
            ctx.emit(Instruction::NewObject { dst: dst.operand() });
            for property in properties {
                match &property.key {
                    PropertyKey::Static(name) => {
                        let value = generate_expression(&property.value, ctx, None)?;
                        let key = ctx.intern_identifier(name);
                        ctx.emit(Instruction::PutById {
                            base: dst.operand(),
                            property: key,
                            src: value.operand(),
                        });
                    }
                    PropertyKey::Computed(key) => {
                        let key = generate_expression(key, ctx, None)?;
                        let key = ctx.copy_if_needed_to_preserve_evaluation_order(&key);
                        let value = generate_expression(&property.value, ctx, None)?;
                        ctx.emit(Instruction::PutByValue {
                            base: dst.operand(),
                            property: key.operand(),
                            src: value.operand(),
                        });
                    }
                }
            }
            Ok(dst)
        }
        ExpressionKind::Spread(_) => {
            Err(unsupported(ctx, "spread outside of an array literal or call"))
        }

        ExpressionKind::Yield { argument, is_yield_from } => {
            if ctx.body_kind != super::context::BodyKind::Generator {
                return Err(unsupported(ctx, "`yield` outside of a generator"));
            }
            let value = match argument {
                Some(argument) => generate_expression(argument, ctx, None)?,
                None => ctx.add_constant_undefined(),
            };
            if *is_yield_from {
                delegate::generate_yield_star(ctx, &value, preferred_dst)
            } else {
                suspend::generate_yield(ctx, &value, preferred_dst)
            }
        }
        ExpressionKind::Await(argument) => {
            if ctx.body_kind != super::context::BodyKind::AsyncBody {
                return Err(unsupported(ctx, "`await` outside of an async function"));
            }
            let value = generate_expression(argument, ctx, None)?;
            suspend::generate_await(ctx, &value, preferred_dst)
        }
    }
}

fn emit_binary_op(
    ctx: &mut LoweringContext,
    op: BinaryOp,
    dst: &ScopedOperand,
    lhs: &ScopedOperand,
    rhs: &ScopedOperand,
) {
    let (dst, lhs, rhs) = (dst.operand(), lhs.operand(), rhs.operand());
    let instruction = match op {
        BinaryOp::Addition => Instruction::Add { dst, lhs, rhs },
        BinaryOp::Subtraction => Instruction::Sub { dst, lhs, rhs },
        BinaryOp::Multiplication => Instruction::Mul { dst, lhs, rhs },
        BinaryOp::Division => Instruction::Div { dst, lhs, rhs },
        BinaryOp::Modulo => Instruction::Mod { dst, lhs, rhs },
        BinaryOp::StrictlyEquals => Instruction::StrictlyEquals { dst, lhs, rhs },
        BinaryOp::StrictlyInequals => Instruction::StrictlyInequals { dst, lhs, rhs },
        BinaryOp::LooselyEquals => Instruction::LooselyEquals { dst, lhs, rhs },
        BinaryOp::LooselyInequals => Instruction::LooselyInequals { dst, lhs, rhs },
        BinaryOp::GreaterThan => Instruction::GreaterThan { dst, lhs, rhs },
        BinaryOp::GreaterThanEquals => Instruction::GreaterThanEquals { dst, lhs, rhs },
        BinaryOp::LessThan => Instruction::LessThan { dst, lhs, rhs },
        BinaryOp::LessThanEquals => Instruction::LessThanEquals { dst, lhs, rhs },
    };
    ctx.emit(instruction);
}

fn generate_logical(
    ctx: &mut LoweringContext,
    op: LogicalOp,
    lhs: &Expression,
    rhs: &Expression,
    preferred_dst: Option<&ScopedOperand>,
) -> CodegenResult<ScopedOperand> {
    let dst = choose_dst(ctx, preferred_dst);
    let lhs_value = generate_expression(lhs, ctx, None)?;
    ctx.emit_mov(&dst, &lhs_value);
    drop(lhs_value);

    let rhs_block = ctx.make_block();
    let end_block = ctx.make_block();
    match op {
        LogicalOp::And => ctx.emit_jump_if(&dst, rhs_block, end_block),
        LogicalOp::Or => ctx.emit_jump_if(&dst, end_block, rhs_block),
        LogicalOp::NullishCoalescing => {
            let null = ctx.add_constant_null();
            ctx.emit(Instruction::JumpLooselyEquals {
                lhs: dst.operand(),
                rhs: null.operand(),
                true_target: rhs_block,
                false_target: end_block,
            });
        }
    }

    ctx.switch_to_basic_block(rhs_block);
    let rhs_value = generate_expression(rhs, ctx, None)?;
    ctx.emit_mov(&dst, &rhs_value);
    ctx.emit(Instruction::Jump { target: end_block });

    ctx.switch_to_basic_block(end_block);
    Ok(dst)
}

fn generate_identifier(
    ctx: &mut LoweringContext,
    identifier: &Identifier,
    preferred_dst: Option<&ScopedOperand>,
) -> ScopedOperand {
    if identifier.is_local() {
        return emit_identifier_operand(ctx, identifier);
    }
    if identifier.name == "undefined" {
        return ctx.add_constant_undefined();
    }
    let dst = choose_dst(ctx, preferred_dst);
    let name = ctx.intern_identifier(&identifier.name);
    ctx.emit(Instruction::GetGlobal { dst: dst.operand(), identifier: name });
    dst
}

fn emit_identifier_operand(ctx: &mut LoweringContext, identifier: &Identifier) -> ScopedOperand {
    let local_type = identifier.local_type.get().unwrap_or(LocalType::Variable);
    ctx.resolve_local(identifier.local_index.get(), local_type)
}

fn emit_set_variable(ctx: &mut LoweringContext, identifier: &Identifier, value: &ScopedOperand) {
    if identifier.is_local() {
        let local = emit_identifier_operand(ctx, identifier);
        ctx.emit_mov(&local, value);
    } else {
        let name = ctx.intern_identifier(&identifier.name);
        ctx.emit(Instruction::SetGlobal { identifier: name, src: value.operand() });
    }
}

/// The name of a non-computed property (`o.name`).
fn static_property_name<'a>(
    ctx: &LoweringContext,
    property: &'a Expression,
) -> CodegenResult<&'a str> {
    match &property.inner {
        ExpressionKind::StringLiteral(name) => Ok(name.as_str()),
        ExpressionKind::Identifier(identifier) => Ok(identifier.name.as_str()),
        _ => Err(unsupported(ctx, "non-computed member with a non-name property")),
    }
}

fn emit_get_property(
    ctx: &mut LoweringContext,
    dst: &ScopedOperand,
    base: &ScopedOperand,
    property: &Expression,
    computed: bool,
) -> CodegenResult {
    if computed {
        let key = generate_expression(property, ctx, None)?;
        ctx.emit(Instruction::GetByValue {
            dst: dst.operand(),
            base: base.operand(),
            property: key.operand(),
        });
    } else {
        let name = static_property_name(ctx, property)?;
        let key = ctx.intern_identifier(name);
        ctx.emit(Instruction::GetById { dst: dst.operand(), base: base.operand(), property: key });
    }
    Ok(())
}

// =============================================================================
// References
// =============================================================================

/// An assignment target whose base and key have been evaluated.
enum EvaluatedReference {
    Local(ScopedOperand),
    Global(IdentifierTableIndex),
    MemberId { base: ScopedOperand, property: IdentifierTableIndex },
    Member { base: ScopedOperand, property: ScopedOperand },
}

fn emit_evaluate_reference(
    ctx: &mut LoweringContext,
    target: &Expression,
) -> CodegenResult<EvaluatedReference> {
    match &target.inner {
        ExpressionKind::Identifier(identifier) if identifier.is_local() => {
            Ok(EvaluatedReference::Local(emit_identifier_operand(ctx, identifier)))
        }
        ExpressionKind::Identifier(identifier) => {
            Ok(EvaluatedReference::Global(ctx.intern_identifier(&identifier.name)))
        }
        ExpressionKind::Member { object, property, computed } => {
            let base = generate_expression(object, ctx, None)?;
            let base = ctx.copy_if_needed_to_preserve_evaluation_order(&base);
            if *computed {
                let property = generate_expression(property, ctx, None)?;
                let property = ctx.copy_if_needed_to_preserve_evaluation_order(&property);
                Ok(EvaluatedReference::Member { base, property })
            } else {
                let name = static_property_name(ctx, property)?;
                let property = ctx.intern_identifier(name);
                Ok(EvaluatedReference::MemberId { base, property })
            }
        }
        _ => Err(unsupported(ctx, "invalid assignment target")),
    }
}

fn emit_load_from_reference(
    ctx: &mut LoweringContext,
    reference: &EvaluatedReference,
) -> ScopedOperand {
    match reference {
        EvaluatedReference::Local(local) => local.clone(),
        EvaluatedReference::Global(identifier) => {
            let dst = ctx.allocate_register();
            ctx.emit(Instruction::GetGlobal { dst: dst.operand(), identifier: *identifier });
            dst
        }
        EvaluatedReference::MemberId { base, property } => {
            let dst = ctx.allocate_register();
            ctx.emit(Instruction::GetById {
                dst: dst.operand(),
                base: base.operand(),
                property: *property,
            });
            dst
        }
        EvaluatedReference::Member { base, property } => {
            let dst = ctx.allocate_register();
            ctx.emit(Instruction::GetByValue {
                dst: dst.operand(),
                base: base.operand(),
                property: property.operand(),
            });
            dst
        }
    }
}

fn emit_store_to_reference(
    ctx: &mut LoweringContext,
    reference: &EvaluatedReference,
    value: &ScopedOperand,
) {
    match reference {
        EvaluatedReference::Local(local) => ctx.emit_mov(local, value),
        EvaluatedReference::Global(identifier) => {
            ctx.emit(Instruction::SetGlobal { identifier: *identifier, src: value.operand() })
        }
        EvaluatedReference::MemberId { base, property } => {
            ctx.emit(Instruction::PutById {
                base: base.operand(),
                property: *property,
                src: value.operand(),
            })
        }
        EvaluatedReference::Member { base, property } => ctx.emit(Instruction::PutByValue {
            base: base.operand(),
            property: property.operand(),
            src: value.operand(),
        }),
    }
}

fn generate_assignment(
    ctx: &mut LoweringContext,
    op: AssignmentOp,
    lhs: &AssignmentLhs,
    rhs: &Expression,
) -> CodegenResult<ScopedOperand> {
    let target = match lhs {
        AssignmentLhs::Pattern(pattern) => {
            if op != AssignmentOp::Assignment {
                return Err(unsupported(ctx, "compound assignment to a pattern"));
            }
            let value = generate_expression(rhs, ctx, None)?;
            let value = ctx.copy_if_needed_to_preserve_evaluation_order(&value);
            generate_binding_pattern(ctx, pattern, &value)?;
            return Ok(value);
        }
        AssignmentLhs::Expression(target) => target,
    };

    // Identifier targets are resolved after the right-hand side; member
    // targets evaluate their base and key first.
    if let (ExpressionKind::Identifier(identifier), AssignmentOp::Assignment) =
        (&target.inner, op)
    {
        let value = generate_expression(rhs, ctx, None)?;
        let value = ctx.copy_if_needed_to_preserve_evaluation_order(&value);
        emit_set_variable(ctx, identifier, &value);
        return Ok(value);
    }

    let reference = emit_evaluate_reference(ctx, target)?;
    let value = match op {
        AssignmentOp::Assignment => generate_expression(rhs, ctx, None)?,
        AssignmentOp::AdditionAssignment
        | AssignmentOp::SubtractionAssignment
        | AssignmentOp::MultiplicationAssignment => {
            let current = emit_load_from_reference(ctx, &reference);
            let current = ctx.copy_if_needed_to_preserve_evaluation_order(&current);
            let rhs_value = generate_expression(rhs, ctx, None)?;
            let dst = ctx.allocate_register();
            let binary = match op {
                AssignmentOp::AdditionAssignment => BinaryOp::Addition,
                AssignmentOp::SubtractionAssignment => BinaryOp::Subtraction,
                _ => BinaryOp::Multiplication,
            };
            emit_binary_op(ctx, binary, &dst, &current, &rhs_value);
            dst
        }
    };
    let value = ctx.copy_if_needed_to_preserve_evaluation_order(&value);
    emit_store_to_reference(ctx, &reference, &value);
    Ok(value)
}

// =============================================================================
// Calls and array literals
// =============================================================================

fn generate_call_expression(
    ctx: &mut LoweringContext,
    data: &CallExpressionData,
    preferred_dst: Option<&ScopedOperand>,
) -> CodegenResult<ScopedOperand> {
    let (callee, this_value) = match &data.callee.inner {
        ExpressionKind::Member { object, property, computed } => {
            let base = generate_expression(object, ctx, None)?;
            let base = ctx.copy_if_needed_to_preserve_evaluation_order(&base);
            let method = ctx.allocate_register();
            emit_get_property(ctx, &method, &base, property, *computed)?;
            (method, base)
        }
        _ => {
            let callee = generate_expression(&data.callee, ctx, None)?;
            let callee = ctx.copy_if_needed_to_preserve_evaluation_order(&callee);
            (callee, ctx.add_constant_undefined())
        }
    };

    let dst = choose_dst(ctx, preferred_dst);
    if data.arguments.iter().any(|argument| argument.is_spread) {
        let arguments = generate_arguments_array(ctx, &data.arguments)?;
        ctx.emit(Instruction::CallWithArgumentArray {
            dst: dst.operand(),
            callee: callee.operand(),
            this_value: this_value.operand(),
            arguments: arguments.operand(),
        });
    } else {
        let values =
            generate_operand_list(
                ctx,
                data.arguments.iter().map(|argument| Some(&argument.value)),
            )?;
        ctx.emit(Instruction::Call {
            dst: dst.operand(),
            callee: callee.operand(),
            this_value: this_value.operand(),
            arguments: values.iter().map(ScopedOperand::operand).collect(),
        });
    }
    Ok(dst)
}

/// Spread arguments drain their iterables into one argument array.
fn generate_arguments_array(
    ctx: &mut LoweringContext,
    arguments: &[CallArgument],
) -> CodegenResult<ScopedOperand> {
    let array = ctx.allocate_register();
    ctx.emit(Instruction::NewArray { dst: array.operand(), elements: Vec::new() });
    for argument in arguments {
        let value = generate_expression(&argument.value, ctx, None)?;
        if argument.is_spread {
            let handle = iterator::acquire(ctx, &value);
            iterator::drain_into(ctx, &handle, &array);
        } else {
            ctx.emit(Instruction::ArrayAppend { dst: array.operand(), src: value.operand() });
        }
    }
    Ok(array)
}

fn generate_array_expression(
    ctx: &mut LoweringContext,
    elements: &[Option<Expression>],
    preferred_dst: Option<&ScopedOperand>,
) -> CodegenResult<ScopedOperand> {
    let has_spread = elements
        .iter()
        .flatten()
        .any(|element| matches!(element.inner, ExpressionKind::Spread(_)));
    if !has_spread {
        let values = generate_operand_list(ctx, elements.iter().map(Option::as_ref))?;
        let dst = choose_dst(ctx, preferred_dst);
        ctx.emit(Instruction::NewArray {
            dst: dst.operand(),
            elements: values.iter().map(ScopedOperand::operand).collect(),
        });
        return Ok(dst);
    }

    let dst = choose_dst(ctx, preferred_dst);
    ctx.emit(Instruction::NewArray { dst: dst.operand(), elements: Vec::new() });
    for element in elements {
        match element {
            None => {
                let undefined = ctx.add_constant_undefined();
                ctx.emit(Instruction::ArrayAppend { dst: dst.operand(), src: undefined.operand() });
            }
            Some(Node { inner: ExpressionKind::Spread(inner), .. }) => {
                let iterable = generate_expression(inner, ctx, None)?;
                let handle = iterator::acquire(ctx, &iterable);
                iterator::drain_into(ctx, &handle, &dst);
            }
            Some(element) => {
                let value = generate_expression(element, ctx, None)?;
                ctx.emit(Instruction::ArrayAppend { dst: dst.operand(), src: value.operand() });
            }
        }
    }
    Ok(dst)
}

// =============================================================================
// Binding patterns
// =============================================================================

pub fn generate_binding_pattern(
    ctx: &mut LoweringContext,
    pattern: &BindingPattern,
    value: &ScopedOperand,
) -> CodegenResult {
    match pattern.kind {
        BindingPatternKind::Array => generate_array_binding_pattern(ctx, pattern, value),
        BindingPatternKind::Object => generate_object_binding_pattern(ctx, pattern, value),
    }
}

/// A member-expression target inside a pattern is evaluated before the
/// value it receives is produced.
fn emit_evaluate_entry_target(
    ctx: &mut LoweringContext,
    entry: &BindingEntry,
) -> CodegenResult<Option<EvaluatedReference>> {
    match &entry.alias {
        Some(BindingEntryAlias::MemberExpression(target)) => {
            Ok(Some(emit_evaluate_reference(ctx, target)?))
        }
        _ => Ok(None),
    }
}

/// Apply `entry`'s default (if `value` is undefined) and bind the result.
fn emit_bind_entry(
    ctx: &mut LoweringContext,
    entry: &BindingEntry,
    reference: Option<&EvaluatedReference>,
    value: &ScopedOperand,
) -> CodegenResult {
    if let Some(initializer) = &entry.initializer {
        let default_block = ctx.make_block();
        let bind_block = ctx.make_block();
        ctx.emit(Instruction::JumpUndefined {
            condition: value.operand(),
            true_target: default_block,
            false_target: bind_block,
        });
        ctx.switch_to_basic_block(default_block);
        let default_value = generate_expression(initializer, ctx, None)?;
        ctx.emit_mov(value, &default_value);
        ctx.emit(Instruction::Jump { target: bind_block });
        ctx.switch_to_basic_block(bind_block);
    }

    match (&entry.alias, &entry.name) {
        (Some(BindingEntryAlias::Identifier(identifier)), _) => {
            emit_set_variable(ctx, identifier, value)
        }
        (Some(BindingEntryAlias::BindingPattern(nested)), _) => {
            generate_binding_pattern(ctx, nested, value)?
        }
        (Some(BindingEntryAlias::MemberExpression(_)), _) => {
            if let Some(reference) = reference {
                emit_store_to_reference(ctx, reference, value);
            }
        }
        (None, Some(BindingEntryName::Identifier(identifier))) => {
            emit_set_variable(ctx, identifier, value)
        }
        (None, _) => {}
    }
    Ok(())
}

/// Array destructuring. A `done` flag tracks exhaustion: it is set before
/// each `next()` call and cleared once a value was produced, so a throwing
/// `next()` counts as exhausted. The iterator is closed on every exit
/// unless it is exhausted.
fn generate_array_binding_pattern(
    ctx: &mut LoweringContext,
    pattern: &BindingPattern,
    value: &ScopedOperand,
) -> CodegenResult {
    let handle = iterator::acquire(ctx, value);
    let region = ctx.enter_try_region(TryRegionKind::IteratorClose(IterationContext::Destructure))?;

    let done = ctx.allocate_register();
    let false_constant = ctx.add_constant_boolean(false);
    let true_constant = ctx.add_constant_boolean(true);
    let undefined = ctx.add_constant_undefined();
    ctx.emit_mov(&done, &false_constant);

    let saved_handler = ctx.current_unwind_handler;
    let completion_type = ctx.allocate_register();
    let completion_value = ctx.allocate_register();
    let close_body = ctx.make_block();
    let exception_preamble = ctx.make_block();
    let after_block = ctx.make_block();
    let parent_index = ctx.current_finally_context;
    let context_index = ctx.push_finally_context(FinallyContext {
        completion_type: completion_type.clone(),
        completion_value: completion_value.clone(),
        finally_body: close_body,
        exception_preamble,
        parent_index,
        registered_jumps: Vec::new(),
        next_jump_index: FinallyContext::FIRST_JUMP_INDEX,
        cleanup: FinallyCleanup::CloseIterator {
            iterator: handle.iterator.clone(),
            done: Some(done.clone()),
        },
    });
    ctx.start_boundary(BlockBoundaryType::ReturnToFinally);

    ctx.current_unwind_handler = Some(exception_preamble);
    let entries_block = ctx.make_block();
    ctx.emit(Instruction::Jump { target: entries_block });
    ctx.switch_to_basic_block(entries_block);

    for entry in &pattern.entries {
        let reference = emit_evaluate_entry_target(ctx, entry)?;
        let element = ctx.allocate_register();
        let step_block = ctx.make_block();
        let exhausted_block = ctx.make_block();
        let bound_block = ctx.make_block();
        ctx.emit_jump_if(&done, exhausted_block, step_block);

        if entry.is_rest {
            ctx.switch_to_basic_block(step_block);
            ctx.emit(Instruction::NewArray { dst: element.operand(), elements: Vec::new() });
            ctx.emit_mov(&done, &true_constant);
            iterator::drain_into(ctx, &handle, &element);
            ctx.emit(Instruction::Jump { target: bound_block });

            ctx.switch_to_basic_block(exhausted_block);
            ctx.emit(Instruction::NewArray { dst: element.operand(), elements: Vec::new() });
            ctx.emit(Instruction::Jump { target: bound_block });
        } else {
            ctx.switch_to_basic_block(step_block);
            ctx.emit_mov(&done, &true_constant);
            let stepped = iterator::step(ctx, &handle, exhausted_block);
            ctx.emit_mov(&done, &false_constant);
            ctx.emit_mov(&element, &stepped);
            ctx.emit(Instruction::Jump { target: bound_block });

            ctx.switch_to_basic_block(exhausted_block);
            ctx.emit_mov(&element, &undefined);
            ctx.emit(Instruction::Jump { target: bound_block });
        }

        ctx.switch_to_basic_block(bound_block);
        emit_bind_entry(ctx, entry, reference.as_ref(), &element)?;
    }

    let normal = ctx.add_constant_i32(FinallyContext::NORMAL);
    ctx.emit_mov(&completion_type, &normal);
    ctx.emit(Instruction::Jump { target: close_body });

    ctx.current_unwind_handler = saved_handler;
    ctx.end_boundary(BlockBoundaryType::ReturnToFinally);
    ctx.pop_finally_context();
    ctx.exit_try_region(region);

    ctx.switch_to_basic_block(exception_preamble);
    ctx.emit(Instruction::Catch { dst: completion_value.operand() });
    let throw_tag = ctx.add_constant_i32(FinallyContext::THROW);
    ctx.emit_mov(&completion_type, &throw_tag);
    ctx.emit(Instruction::Jump { target: close_body });

    iterator::emit_close_body(ctx, context_index, after_block);

    ctx.switch_to_basic_block(after_block);
    Ok(())
}

fn generate_object_binding_pattern(
    ctx: &mut LoweringContext,
    pattern: &BindingPattern,
    value: &ScopedOperand,
) -> CodegenResult {
    for entry in &pattern.entries {
        if entry.is_rest {
            return Err(unsupported(ctx, "rest element in an object pattern"));
        }
        let key = match &entry.name {
            Some(BindingEntryName::Identifier(identifier)) => {
                Ok(ctx.intern_identifier(&identifier.name))
            }
            Some(BindingEntryName::Expression(key)) => {
                let key = generate_expression(key, ctx, None)?;
                Err(ctx.copy_if_needed_to_preserve_evaluation_order(&key))
            }
            None => return Err(unsupported(ctx, "object pattern entry without a key")),
        };
        let reference = emit_evaluate_entry_target(ctx, entry)?;

        let element = ctx.allocate_register();
        match key {
            Ok(property) => {
                ctx.emit(Instruction::GetById {
                    dst: element.operand(),
                    base: value.operand(),
                    property,
                });
            }
            Err(property) => ctx.emit(Instruction::GetByValue {
                dst: element.operand(),
                base: value.operand(),
                property: property.operand(),
            }),
        }
        emit_bind_entry(ctx, entry, reference.as_ref(), &element)?;
    }
    Ok(())
}
