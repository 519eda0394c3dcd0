/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! A straightforward block-at-a-time interpreter for lowered functions.
//!
//! A `Frame` holds all state of one activation, so a generator can park it
//! between resumptions. `run_frame` executes from `frame.block` until the
//! function returns, throws past its last handler, or suspends.

use std::cmp::Ordering;
use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use super::generator::ResumeCommand;
use super::object::{ObjectRef, PropertyKey};
use super::realm::Realm;
use super::value::{JsResult, Value};
use super::vm_error::VmError;
use crate::ir::basic_block::BasicBlock;
use crate::ir::function::Function;
use crate::ir::instruction::Instruction;
use crate::ir::operand::{FunctionId, Label, Operand, OperandType, Register};

pub struct Frame {
    function: FunctionId,
    registers: Vec<Value>,
    locals: Vec<Value>,
    arguments: Vec<Value>,
    passed_argument_count: usize,
    block: Label,
    previous_block: Option<Label>,
    /// The exception being delivered to a handler block, read by `Catch`.
    exception: Option<Value>,
    /// The command for the next `ResumeGenerator`.
    pub resume: Option<ResumeCommand>,
}

/// Why `run_frame` stopped without throwing.
#[derive(Debug)]
pub enum FrameExit {
    /// `suspension` is `None` for `StartGenerator`.
    Suspend { value: Value, suspension: Option<u32> },
    Return(Value),
}

enum Flow {
    Jump(Label),
    Exit(FrameExit),
}

impl Frame {
    pub fn new(
        function: &Function,
        id: FunctionId,
        this_value: Value,
        arguments: &[Value],
    ) -> Box<Self> {
        let register_count = function.register_count.max(Register::RESERVED_COUNT) as usize;
        let mut registers = vec![Value::Undefined; register_count];
        registers[Register::THIS_VALUE.0 as usize] = this_value;
        let mut argument_values = arguments.to_vec();
        if argument_values.len() < function.parameter_count as usize {
            argument_values.resize(function.parameter_count as usize, Value::Undefined);
        }
        Box::new(Self {
            function: id,
            registers,
            locals: vec![Value::Undefined; function.local_count as usize],
            arguments: argument_values,
            passed_argument_count: arguments.len(),
            block: Label(0),
            previous_block: None,
            exception: None,
            resume: None,
        })
    }

    pub fn function_id(&self) -> FunctionId {
        self.function
    }

    fn read(&self, function: &Function, operand: Operand) -> Value {
        let index = operand.index() as usize;
        let slot = match operand.operand_type() {
            OperandType::Register => self.registers.get(index),
            OperandType::Local => self.locals.get(index),
            OperandType::Argument => self.arguments.get(index),
            OperandType::Constant => {
                return function.constant(operand).map(Value::from_constant).unwrap_or_default()
            }
        };
        slot.cloned().unwrap_or_default()
    }

    fn write(&mut self, operand: Operand, value: Value) {
        let index = operand.index() as usize;
        let slots = match operand.operand_type() {
            OperandType::Register => &mut self.registers,
            OperandType::Local => &mut self.locals,
            OperandType::Argument => &mut self.arguments,
            OperandType::Constant => return,
        };
        if index >= slots.len() {
            slots.resize(index + 1, Value::Undefined);
        }
        slots[index] = value;
    }
}

/// Run `frame` until it returns, suspends or throws an uncaught exception.
pub fn run_frame(realm: &mut Realm, frame: &mut Frame) -> Result<FrameExit, Value> {
    let program = realm.program().clone();
    let function = program.function(frame.function);
    loop {
        let block = function.block(frame.block);
        match execute_block(realm, function, frame, block) {
            Ok(Flow::Jump(target)) => {
                frame.previous_block = Some(frame.block);
                frame.block = target;
            }
            Ok(Flow::Exit(exit)) => return Ok(exit),
            Err(exception) => {
                let Some(handler) = block.handler else {
                    log::trace!("interpreter: {} throws {:?}", function.name, exception);
                    return Err(exception);
                };
                log::trace!(
                    "interpreter: {} @{} unwinds to @{}",
                    function.name,
                    frame.block.0,
                    handler.0
                );
                frame.exception = Some(exception);
                frame.previous_block = Some(frame.block);
                frame.block = handler;
            }
        }
    }
}

fn execute_block(
    realm: &mut Realm,
    function: &Function,
    frame: &mut Frame,
    block: &BasicBlock,
) -> JsResult<Flow> {
    // Phis read their inputs before any of them writes.
    let phis: Vec<(Operand, Value)> = block
        .instructions()
        .map_while(|instruction| match instruction {
            Instruction::Phi { dst, incoming } => Some((*dst, incoming)),
            _ => None,
        })
        .filter_map(|(dst, incoming)| {
            let previous = frame.previous_block?;
            let (_, source) = incoming.iter().find(|(label, _)| *label == previous)?;
            Some((dst, frame.read(function, *source)))
        })
        .collect();
    for (dst, value) in phis {
        frame.write(dst, value);
    }

    for instruction in block.instructions() {
        if let Some(flow) = execute(realm, function, frame, instruction)? {
            return Ok(flow);
        }
    }
    Err(realm.type_error(&format!(
        "fell off the end of block @{} in {}",
        frame.block.0, function.name
    )))
}

fn execute(
    realm: &mut Realm,
    function: &Function,
    frame: &mut Frame,
    instruction: &Instruction,
) -> JsResult<Option<Flow>> {
    let read = |operand: &Operand| frame.read(function, *operand);

    macro_rules! binary {
        ($dst:expr, $lhs:expr, $rhs:expr, $op:expr) => {{
            let (lhs, rhs) = (read($lhs), read($rhs));
            let value = $op(&mut *realm, &lhs, &rhs)?;
            frame.write(*$dst, value);
        }};
    }

    macro_rules! branch {
        ($condition:expr, $true_target:expr, $false_target:expr) => {{
            let target = if $condition { *$true_target } else { *$false_target };
            return Ok(Some(Flow::Jump(target)));
        }};
    }

    match instruction {
        Instruction::Mov { dst, src } => {
            let value = read(src);
            frame.write(*dst, value);
        }

        Instruction::Add { dst, lhs, rhs } => binary!(dst, lhs, rhs, add),
        Instruction::Sub { dst, lhs, rhs } => {
            binary!(dst, lhs, rhs, |realm, a, b| arithmetic(realm, a, b, Arithmetic::Sub))
        }
        Instruction::Mul { dst, lhs, rhs } => {
            binary!(dst, lhs, rhs, |realm, a, b| arithmetic(realm, a, b, Arithmetic::Mul))
        }
        Instruction::Div { dst, lhs, rhs } => {
            binary!(dst, lhs, rhs, |realm, a, b| arithmetic(realm, a, b, Arithmetic::Div))
        }
        Instruction::Mod { dst, lhs, rhs } => {
            binary!(dst, lhs, rhs, |realm, a, b| arithmetic(realm, a, b, Arithmetic::Mod))
        }
        Instruction::LessThan { dst, lhs, rhs } => {
            binary!(dst, lhs, rhs, |realm, a, b| relational(realm, a, b, Ordering::is_lt))
        }
        Instruction::LessThanEquals { dst, lhs, rhs } => {
            binary!(dst, lhs, rhs, |realm, a, b| relational(realm, a, b, Ordering::is_le))
        }
        Instruction::GreaterThan { dst, lhs, rhs } => {
            binary!(dst, lhs, rhs, |realm, a, b| relational(realm, a, b, Ordering::is_gt))
        }
        Instruction::GreaterThanEquals { dst, lhs, rhs } => {
            binary!(dst, lhs, rhs, |realm, a, b| relational(realm, a, b, Ordering::is_ge))
        }
        Instruction::LooselyEquals { dst, lhs, rhs } => {
            let value = Value::Boolean(read(lhs).loosely_equals(&read(rhs)));
            frame.write(*dst, value);
        }
        Instruction::LooselyInequals { dst, lhs, rhs } => {
            let value = Value::Boolean(!read(lhs).loosely_equals(&read(rhs)));
            frame.write(*dst, value);
        }
        Instruction::StrictlyEquals { dst, lhs, rhs } => {
            let value = Value::Boolean(read(lhs).strictly_equals(&read(rhs)));
            frame.write(*dst, value);
        }
        Instruction::StrictlyInequals { dst, lhs, rhs } => {
            let value = Value::Boolean(!read(lhs).strictly_equals(&read(rhs)));
            frame.write(*dst, value);
        }

        Instruction::Not { dst, src } => {
            let value = Value::Boolean(!read(src).to_boolean());
            frame.write(*dst, value);
        }
        Instruction::Negate { dst, src } => {
            let value = match read(src) {
                Value::BigInt(b) => Value::BigInt(Rc::new(-&*b)),
                other => Value::Number(-to_number(realm, &other)?),
            };
            frame.write(*dst, value);
        }
        Instruction::Typeof { dst, src } => {
            let value = Value::string(read(src).type_of());
            frame.write(*dst, value);
        }
        Instruction::ToNumber { dst, src } => {
            let value = match read(src) {
                bigint @ Value::BigInt(_) => bigint,
                other => Value::Number(to_number(realm, &other)?),
            };
            frame.write(*dst, value);
        }

        Instruction::NewObject { dst } => {
            let object = Value::Object(realm.new_object());
            frame.write(*dst, object);
        }
        Instruction::NewArray { dst, elements } => {
            let array = realm.new_array(elements.iter().map(read).collect());
            frame.write(*dst, array);
        }
        Instruction::ArrayAppend { dst, src } => {
            if let Value::Object(array) = read(dst) {
                array.array_push(read(src));
            }
        }
        Instruction::NewIterResult { dst, value, done } => {
            let result = realm.iter_result(read(value), *done);
            frame.write(*dst, result);
        }
        Instruction::GetById { dst, base, property } => {
            let value = realm.get(&read(base), &PropertyKey::from(function.identifier(*property)))?;
            frame.write(*dst, value);
        }
        Instruction::GetByValue { dst, base, property } => {
            let value = realm.get(&read(base), &PropertyKey::from_value(&read(property)))?;
            frame.write(*dst, value);
        }
        Instruction::PutById { base, property, src } => {
            realm.put(&read(base), PropertyKey::from(function.identifier(*property)), read(src))?;
        }
        Instruction::PutByValue { base, property, src } => {
            realm.put(&read(base), PropertyKey::from_value(&read(property)), read(src))?;
        }
        Instruction::GetMethod { dst, object, property } => {
            let key = PropertyKey::from(function.identifier(*property));
            let method = realm.get_method(&read(object), &key)?;
            frame.write(*dst, method);
        }
        Instruction::GetGlobal { dst, identifier } => {
            let value = realm.get_global(function.identifier(*identifier))?;
            frame.write(*dst, value);
        }
        Instruction::SetGlobal { identifier, src } => {
            realm.assign_global(function.identifier(*identifier), read(src), function.is_strict)?;
        }

        Instruction::Call { dst, callee, this_value, arguments } => {
            let arguments: Vec<Value> = arguments.iter().map(read).collect();
            let value = realm.call(&read(callee), &read(this_value), &arguments)?;
            frame.write(*dst, value);
        }
        Instruction::CallWithArgumentArray { dst, callee, this_value, arguments } => {
            let arguments =
                read(arguments).as_object().map(ObjectRef::array_elements).unwrap_or_default();
            let value = realm.call(&read(callee), &read(this_value), &arguments)?;
            frame.write(*dst, value);
        }
        Instruction::CallBuiltin { dst, builtin, arguments } => {
            let arguments: Vec<Value> = arguments.iter().map(read).collect();
            let value = realm.call_builtin(*builtin, &arguments)?;
            frame.write(*dst, value);
        }
        Instruction::NewFunction { dst, function: id } => {
            let value = realm.function_object(*id);
            frame.write(*dst, value);
        }
        Instruction::CreateArguments { dst } => {
            let passed = frame.arguments[..frame.passed_argument_count].to_vec();
            let array = realm.new_array(passed);
            frame.write(*dst, array);
        }

        Instruction::ThrowIfNotObject { src, message } => {
            if read(src).as_object().is_none() {
                return Err(realm.type_error(function.string(*message)));
            }
        }
        Instruction::NewTypeError { dst, error_string } => {
            let error = realm.type_error(function.string(*error_string));
            frame.write(*dst, error);
        }
        Instruction::Catch { dst } => {
            let exception = frame.exception.take().unwrap_or_default();
            frame.write(*dst, exception);
        }

        Instruction::ResumeGenerator { kind_dst, value_dst } => {
            let command =
                frame.resume.take().unwrap_or_else(|| ResumeCommand::next(Value::Undefined));
            log::trace!(
                "interpreter: {} resumes @{} with {:?}",
                function.name,
                frame.block.0,
                command.kind
            );
            frame.write(*kind_dst, Value::Number(command.kind.to_f64()));
            frame.write(*value_dst, command.value);
        }
        // Leading phis were applied on block entry.
        Instruction::Phi { .. } => {}

        Instruction::Jump { target } => return Ok(Some(Flow::Jump(*target))),
        Instruction::JumpIf { condition, true_target, false_target } => {
            branch!(read(condition).to_boolean(), true_target, false_target)
        }
        Instruction::JumpUndefined { condition, true_target, false_target } => {
            branch!(read(condition).is_undefined(), true_target, false_target)
        }
        Instruction::JumpLessThan { lhs, rhs, true_target, false_target } => {
            branch!(
                compare(realm, &read(lhs), &read(rhs))?.is_some_and(Ordering::is_lt),
                true_target,
                false_target
            )
        }
        Instruction::JumpLessThanEquals { lhs, rhs, true_target, false_target } => {
            branch!(
                compare(realm, &read(lhs), &read(rhs))?.is_some_and(Ordering::is_le),
                true_target,
                false_target
            )
        }
        Instruction::JumpGreaterThan { lhs, rhs, true_target, false_target } => {
            branch!(
                compare(realm, &read(lhs), &read(rhs))?.is_some_and(Ordering::is_gt),
                true_target,
                false_target
            )
        }
        Instruction::JumpGreaterThanEquals { lhs, rhs, true_target, false_target } => {
            branch!(
                compare(realm, &read(lhs), &read(rhs))?.is_some_and(Ordering::is_ge),
                true_target,
                false_target
            )
        }
        Instruction::JumpLooselyEquals { lhs, rhs, true_target, false_target } => {
            branch!(read(lhs).loosely_equals(&read(rhs)), true_target, false_target)
        }
        Instruction::JumpLooselyInequals { lhs, rhs, true_target, false_target } => {
            branch!(!read(lhs).loosely_equals(&read(rhs)), true_target, false_target)
        }
        Instruction::JumpStrictlyEquals { lhs, rhs, true_target, false_target } => {
            branch!(read(lhs).strictly_equals(&read(rhs)), true_target, false_target)
        }
        Instruction::JumpStrictlyInequals { lhs, rhs, true_target, false_target } => {
            branch!(!read(lhs).strictly_equals(&read(rhs)), true_target, false_target)
        }
        Instruction::Return { value } => {
            return Ok(Some(Flow::Exit(FrameExit::Return(read(value)))))
        }
        Instruction::Throw { src } => return Err(read(src)),
        Instruction::StartGenerator { resume_target } => {
            frame.previous_block = Some(frame.block);
            frame.block = *resume_target;
            return Ok(Some(Flow::Exit(FrameExit::Suspend {
                value: Value::Undefined,
                suspension: None,
            })));
        }
        Instruction::SaveAndYield { value, resume_target, suspension } => {
            let value = read(value);
            log::trace!("interpreter: {} suspends at #{}", function.name, suspension);
            frame.previous_block = Some(frame.block);
            frame.block = *resume_target;
            return Ok(Some(Flow::Exit(FrameExit::Suspend {
                value,
                suspension: Some(*suspension),
            })));
        }
    }
    Ok(None)
}

fn to_number(realm: &Realm, value: &Value) -> JsResult<f64> {
    value
        .to_number()
        .ok_or_else(|| realm.error_value(VmError::NotConvertibleToNumber(value.type_of())))
}

fn add(realm: &mut Realm, lhs: &Value, rhs: &Value) -> JsResult {
    match (lhs, rhs) {
        (Value::String(_) | Value::Object(_), _) | (_, Value::String(_) | Value::Object(_)) => {
            Ok(Value::string(&format!("{}{}", lhs.to_js_string(), rhs.to_js_string())))
        }
        _ => arithmetic(realm, lhs, rhs, Arithmetic::Add),
    }
}

#[derive(Clone, Copy)]
enum Arithmetic {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

fn arithmetic(realm: &mut Realm, lhs: &Value, rhs: &Value, op: Arithmetic) -> JsResult {
    match (lhs, rhs) {
        (Value::BigInt(a), Value::BigInt(b)) => bigint_arithmetic(realm, a, b, op),
        (Value::BigInt(_), _) | (_, Value::BigInt(_)) => {
            Err(realm.error_value(VmError::MixedBigInt))
        }
        _ => {
            let (a, b) = (to_number(realm, lhs)?, to_number(realm, rhs)?);
            Ok(Value::Number(match op {
                Arithmetic::Add => a + b,
                Arithmetic::Sub => a - b,
                Arithmetic::Mul => a * b,
                Arithmetic::Div => a / b,
                Arithmetic::Mod => a % b,
            }))
        }
    }
}

fn bigint_arithmetic(realm: &Realm, a: &BigInt, b: &BigInt, op: Arithmetic) -> JsResult {
    let result = match op {
        Arithmetic::Add => a + b,
        Arithmetic::Sub => a - b,
        Arithmetic::Mul => a * b,
        Arithmetic::Div | Arithmetic::Mod if b.is_zero() => {
            return Err(realm.error_value(VmError::BigIntDivisionByZero));
        }
        Arithmetic::Div => a / b,
        Arithmetic::Mod => a % b,
    };
    Ok(Value::BigInt(Rc::new(result)))
}

/// Abstract relational comparison. `None` when either side is NaN.
fn compare(realm: &Realm, lhs: &Value, rhs: &Value) -> JsResult<Option<Ordering>> {
    Ok(match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::BigInt(a), Value::BigInt(b)) => Some(a.cmp(b)),
        (Value::BigInt(a), other) => {
            a.to_f64().and_then(|a| a.partial_cmp(&to_number(realm, other).ok()?))
        }
        (other, Value::BigInt(b)) => {
            b.to_f64().and_then(|b| to_number(realm, other).ok()?.partial_cmp(&b))
        }
        _ => to_number(realm, lhs)?.partial_cmp(&to_number(realm, rhs)?),
    })
}

fn relational(realm: &mut Realm, lhs: &Value, rhs: &Value, test: fn(Ordering) -> bool) -> JsResult {
    Ok(Value::Boolean(compare(realm, lhs, rhs)?.is_some_and(test)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::function::Program;

    #[test]
    fn bigints_do_not_mix_with_numbers() {
        let mut realm = Realm::new(Program::default());
        let big = Value::BigInt(Rc::new(BigInt::from(7)));
        let sum = arithmetic(&mut realm, &big, &big, Arithmetic::Mul);
        assert!(matches!(sum, Ok(Value::BigInt(ref b)) if **b == BigInt::from(49)));
        assert!(arithmetic(&mut realm, &big, &Value::Number(1.0), Arithmetic::Add).is_err());
        let zero = Value::BigInt(Rc::new(BigInt::from(0)));
        assert!(arithmetic(&mut realm, &big, &zero, Arithmetic::Div).is_err());
    }

    #[test]
    fn addition_concatenates_strings() {
        let mut realm = Realm::new(Program::default());
        let joined = add(&mut realm, &Value::string("n="), &Value::Number(3.0));
        assert!(matches!(joined, Ok(Value::String(ref s)) if &**s == "n=3"));
    }

    #[test]
    fn comparisons_with_nan_are_unordered() {
        let realm = Realm::new(Program::default());
        assert_eq!(compare(&realm, &Value::Number(f64::NAN), &Value::Number(1.0)).ok(), Some(None));
        assert_eq!(
            compare(&realm, &Value::string("a"), &Value::string("b")).ok(),
            Some(Some(Ordering::Less))
        );
    }
}
