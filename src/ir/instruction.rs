/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! The IR instruction vocabulary.
//!
//! Everything the lowering emits, including the iterator protocol call
//! sequences, is expressed with ordinary instructions. The only
//! generator-specific additions are the suspend/resume pair
//! (`StartGenerator`/`SaveAndYield` and `ResumeGenerator`) and `Phi`.

use std::fmt;

use smallvec::SmallVec;

use super::operand::{FunctionId, IdentifierTableIndex, Label, Operand, StringTableIndex};

/// The kind of a resumption, as materialized into `ResumeGenerator::kind_dst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResumeKind {
    Next = 0,
    Return = 1,
    Throw = 2,
}

impl ResumeKind {
    pub fn to_f64(self) -> f64 {
        self as u8 as f64
    }

    pub fn from_f64(value: f64) -> Option<Self> {
        match value {
            v if v == 0.0 => Some(Self::Next),
            v if v == 1.0 => Some(Self::Return),
            v if v == 2.0 => Some(Self::Throw),
            _ => None,
        }
    }
}

/// Host builtins reachable from compiled code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `AsyncPump(inner, this, arguments)`: drives an async function's inner
    /// generator and returns the output promise.
    AsyncPump,
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Builtin::AsyncPump => write!(f, "AsyncPump"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Mov { dst: Operand, src: Operand },

    Add { dst: Operand, lhs: Operand, rhs: Operand },
    Sub { dst: Operand, lhs: Operand, rhs: Operand },
    Mul { dst: Operand, lhs: Operand, rhs: Operand },
    Div { dst: Operand, lhs: Operand, rhs: Operand },
    Mod { dst: Operand, lhs: Operand, rhs: Operand },
    LessThan { dst: Operand, lhs: Operand, rhs: Operand },
    LessThanEquals { dst: Operand, lhs: Operand, rhs: Operand },
    GreaterThan { dst: Operand, lhs: Operand, rhs: Operand },
    GreaterThanEquals { dst: Operand, lhs: Operand, rhs: Operand },
    LooselyEquals { dst: Operand, lhs: Operand, rhs: Operand },
    LooselyInequals { dst: Operand, lhs: Operand, rhs: Operand },
    StrictlyEquals { dst: Operand, lhs: Operand, rhs: Operand },
    StrictlyInequals { dst: Operand, lhs: Operand, rhs: Operand },

    Not { dst: Operand, src: Operand },
    Negate { dst: Operand, src: Operand },
    Typeof { dst: Operand, src: Operand },
    ToNumber { dst: Operand, src: Operand },

    NewObject { dst: Operand },
    NewArray { dst: Operand, elements: Vec<Operand> },
    ArrayAppend { dst: Operand, src: Operand },
    NewIterResult { dst: Operand, value: Operand, done: bool },
    GetById { dst: Operand, base: Operand, property: IdentifierTableIndex },
    GetByValue { dst: Operand, base: Operand, property: Operand },
    PutById { base: Operand, property: IdentifierTableIndex, src: Operand },
    PutByValue { base: Operand, property: Operand, src: Operand },
    /// Like `GetById`, but yields `undefined` for a nullish property and
    /// throws if the property is present but not callable.
    GetMethod { dst: Operand, object: Operand, property: IdentifierTableIndex },
    GetGlobal { dst: Operand, identifier: IdentifierTableIndex },
    SetGlobal { identifier: IdentifierTableIndex, src: Operand },

    Call { dst: Operand, callee: Operand, this_value: Operand, arguments: Vec<Operand> },
    CallWithArgumentArray {
        dst: Operand,
        callee: Operand,
        this_value: Operand,
        arguments: Operand,
    },
    CallBuiltin { dst: Operand, builtin: Builtin, arguments: Vec<Operand> },
    NewFunction { dst: Operand, function: FunctionId },
    CreateArguments { dst: Operand },

    ThrowIfNotObject { src: Operand, message: StringTableIndex },
    NewTypeError { dst: Operand, error_string: StringTableIndex },
    Catch { dst: Operand },

    /// First instruction of every resume block.
    ResumeGenerator { kind_dst: Operand, value_dst: Operand },
    /// Merge of loop-carried values at a loop header.
    Phi { dst: Operand, incoming: Vec<(Label, Operand)> },

    // Terminators
    Jump { target: Label },
    JumpIf { condition: Operand, true_target: Label, false_target: Label },
    JumpUndefined { condition: Operand, true_target: Label, false_target: Label },
    JumpLessThan { lhs: Operand, rhs: Operand, true_target: Label, false_target: Label },
    JumpLessThanEquals { lhs: Operand, rhs: Operand, true_target: Label, false_target: Label },
    JumpGreaterThan { lhs: Operand, rhs: Operand, true_target: Label, false_target: Label },
    JumpGreaterThanEquals { lhs: Operand, rhs: Operand, true_target: Label, false_target: Label },
    JumpLooselyEquals { lhs: Operand, rhs: Operand, true_target: Label, false_target: Label },
    JumpLooselyInequals { lhs: Operand, rhs: Operand, true_target: Label, false_target: Label },
    JumpStrictlyEquals { lhs: Operand, rhs: Operand, true_target: Label, false_target: Label },
    JumpStrictlyInequals { lhs: Operand, rhs: Operand, true_target: Label, false_target: Label },
    Return { value: Operand },
    Throw { src: Operand },
    /// Suspend before the body runs; the first resumption enters `resume_target`.
    StartGenerator { resume_target: Label },
    SaveAndYield { value: Operand, resume_target: Label, suspension: u32 },
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Jump { .. }
                | Instruction::JumpIf { .. }
                | Instruction::JumpUndefined { .. }
                | Instruction::JumpLessThan { .. }
                | Instruction::JumpLessThanEquals { .. }
                | Instruction::JumpGreaterThan { .. }
                | Instruction::JumpGreaterThanEquals { .. }
                | Instruction::JumpLooselyEquals { .. }
                | Instruction::JumpLooselyInequals { .. }
                | Instruction::JumpStrictlyEquals { .. }
                | Instruction::JumpStrictlyInequals { .. }
                | Instruction::Return { .. }
                | Instruction::Throw { .. }
                | Instruction::StartGenerator { .. }
                | Instruction::SaveAndYield { .. }
        )
    }

    /// Is this a suspension terminator (`StartGenerator` or `SaveAndYield`)?
    pub fn resume_target(&self) -> Option<Label> {
        match self {
            Instruction::StartGenerator { resume_target }
            | Instruction::SaveAndYield { resume_target, .. } => Some(*resume_target),
            _ => None,
        }
    }

    /// Control-flow successors. Resume targets count: the resumed path is a
    /// real edge for every analysis that walks the graph.
    pub fn successors(&self) -> SmallVec<[Label; 2]> {
        let mut successors = SmallVec::new();
        match self {
            Instruction::Jump { target } => successors.push(*target),
            Instruction::JumpIf { true_target, false_target, .. }
            | Instruction::JumpUndefined { true_target, false_target, .. }
            | Instruction::JumpLessThan { true_target, false_target, .. }
            | Instruction::JumpLessThanEquals { true_target, false_target, .. }
            | Instruction::JumpGreaterThan { true_target, false_target, .. }
            | Instruction::JumpGreaterThanEquals { true_target, false_target, .. }
            | Instruction::JumpLooselyEquals { true_target, false_target, .. }
            | Instruction::JumpLooselyInequals { true_target, false_target, .. }
            | Instruction::JumpStrictlyEquals { true_target, false_target, .. }
            | Instruction::JumpStrictlyInequals { true_target, false_target, .. } => {
                successors.push(*true_target);
                if false_target != true_target {
                    successors.push(*false_target);
                }
            }
            Instruction::StartGenerator { resume_target }
            | Instruction::SaveAndYield { resume_target, .. } => successors.push(*resume_target),
            _ => {}
        }
        successors
    }

    /// Call `f` for every operand this instruction writes.
    pub fn for_each_def(&self, mut f: impl FnMut(Operand)) {
        self.visit(&mut f, &mut |_| {});
    }

    /// Call `f` for every operand this instruction reads.
    pub fn for_each_use(&self, mut f: impl FnMut(Operand)) {
        self.visit(&mut |_| {}, &mut f);
    }

    fn visit(&self, def: &mut dyn FnMut(Operand), used: &mut dyn FnMut(Operand)) {
        match self {
            Instruction::Mov { dst, src }
            | Instruction::Not { dst, src }
            | Instruction::Negate { dst, src }
            | Instruction::Typeof { dst, src }
            | Instruction::ToNumber { dst, src } => {
                used(*src);
                def(*dst);
            }
            Instruction::Add { dst, lhs, rhs }
            | Instruction::Sub { dst, lhs, rhs }
            | Instruction::Mul { dst, lhs, rhs }
            | Instruction::Div { dst, lhs, rhs }
            | Instruction::Mod { dst, lhs, rhs }
            | Instruction::LessThan { dst, lhs, rhs }
            | Instruction::LessThanEquals { dst, lhs, rhs }
            | Instruction::GreaterThan { dst, lhs, rhs }
            | Instruction::GreaterThanEquals { dst, lhs, rhs }
            | Instruction::LooselyEquals { dst, lhs, rhs }
            | Instruction::LooselyInequals { dst, lhs, rhs }
            | Instruction::StrictlyEquals { dst, lhs, rhs }
            | Instruction::StrictlyInequals { dst, lhs, rhs } => {
                used(*lhs);
                used(*rhs);
                def(*dst);
            }
            Instruction::NewObject { dst }
            | Instruction::CreateArguments { dst }
            | Instruction::NewFunction { dst, .. }
            | Instruction::NewTypeError { dst, .. }
            | Instruction::GetGlobal { dst, .. }
            | Instruction::Catch { dst } => def(*dst),
            Instruction::NewArray { dst, elements } => {
                elements.iter().for_each(|e| used(*e));
                def(*dst);
            }
            Instruction::ArrayAppend { dst, src } => {
                // Appending mutates the array held in `dst`; the array itself is read.
                used(*dst);
                used(*src);
            }
            Instruction::NewIterResult { dst, value, .. } => {
                used(*value);
                def(*dst);
            }
            Instruction::GetById { dst, base, .. } => {
                used(*base);
                def(*dst);
            }
            Instruction::GetByValue { dst, base, property } => {
                used(*base);
                used(*property);
                def(*dst);
            }
            Instruction::PutById { base, src, .. } => {
                used(*base);
                used(*src);
            }
            Instruction::PutByValue { base, property, src } => {
                used(*base);
                used(*property);
                used(*src);
            }
            Instruction::GetMethod { dst, object, .. } => {
                used(*object);
                def(*dst);
            }
            Instruction::SetGlobal { src, .. } => used(*src),
            Instruction::Call { dst, callee, this_value, arguments } => {
                used(*callee);
                used(*this_value);
                arguments.iter().for_each(|a| used(*a));
                def(*dst);
            }
            Instruction::CallWithArgumentArray { dst, callee, this_value, arguments } => {
                used(*callee);
                used(*this_value);
                used(*arguments);
                def(*dst);
            }
            Instruction::CallBuiltin { dst, arguments, .. } => {
                arguments.iter().for_each(|a| used(*a));
                def(*dst);
            }
            Instruction::ThrowIfNotObject { src, .. } => used(*src),
            Instruction::ResumeGenerator { kind_dst, value_dst } => {
                def(*kind_dst);
                def(*value_dst);
            }
            Instruction::Phi { dst, incoming } => {
                incoming.iter().for_each(|(_, operand)| used(*operand));
                def(*dst);
            }
            Instruction::Jump { .. } | Instruction::StartGenerator { .. } => {}
            Instruction::JumpIf { condition, .. }
            | Instruction::JumpUndefined { condition, .. } => {
                used(*condition)
            }
            Instruction::JumpLessThan { lhs, rhs, .. }
            | Instruction::JumpLessThanEquals { lhs, rhs, .. }
            | Instruction::JumpGreaterThan { lhs, rhs, .. }
            | Instruction::JumpGreaterThanEquals { lhs, rhs, .. }
            | Instruction::JumpLooselyEquals { lhs, rhs, .. }
            | Instruction::JumpLooselyInequals { lhs, rhs, .. }
            | Instruction::JumpStrictlyEquals { lhs, rhs, .. }
            | Instruction::JumpStrictlyInequals { lhs, rhs, .. } => {
                used(*lhs);
                used(*rhs);
            }
            Instruction::Return { value } => used(*value),
            Instruction::Throw { src } => used(*src),
            Instruction::SaveAndYield { value, .. } => used(*value),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Mov { .. } => "Mov",
            Instruction::Add { .. } => "Add",
            Instruction::Sub { .. } => "Sub",
            Instruction::Mul { .. } => "Mul",
            Instruction::Div { .. } => "Div",
            Instruction::Mod { .. } => "Mod",
            Instruction::LessThan { .. } => "LessThan",
            Instruction::LessThanEquals { .. } => "LessThanEquals",
            Instruction::GreaterThan { .. } => "GreaterThan",
            Instruction::GreaterThanEquals { .. } => "GreaterThanEquals",
            Instruction::LooselyEquals { .. } => "LooselyEquals",
            Instruction::LooselyInequals { .. } => "LooselyInequals",
            Instruction::StrictlyEquals { .. } => "StrictlyEquals",
            Instruction::StrictlyInequals { .. } => "StrictlyInequals",
            Instruction::Not { .. } => "Not",
            Instruction::Negate { .. } => "Negate",
            Instruction::Typeof { .. } => "Typeof",
            Instruction::ToNumber { .. } => "ToNumber",
            Instruction::NewObject { .. } => "NewObject",
            Instruction::NewArray { .. } => "NewArray",
            Instruction::ArrayAppend { .. } => "ArrayAppend",
            Instruction::NewIterResult { .. } => "NewIterResult",
            Instruction::GetById { .. } => "GetById",
            Instruction::GetByValue { .. } => "GetByValue",
            Instruction::PutById { .. } => "PutById",
            Instruction::PutByValue { .. } => "PutByValue",
            Instruction::GetMethod { .. } => "GetMethod",
            Instruction::GetGlobal { .. } => "GetGlobal",
            Instruction::SetGlobal { .. } => "SetGlobal",
            Instruction::Call { .. } => "Call",
            Instruction::CallWithArgumentArray { .. } => "CallWithArgumentArray",
            Instruction::CallBuiltin { .. } => "CallBuiltin",
            Instruction::NewFunction { .. } => "NewFunction",
            Instruction::CreateArguments { .. } => "CreateArguments",
            Instruction::ThrowIfNotObject { .. } => "ThrowIfNotObject",
            Instruction::NewTypeError { .. } => "NewTypeError",
            Instruction::Catch { .. } => "Catch",
            Instruction::ResumeGenerator { .. } => "ResumeGenerator",
            Instruction::Phi { .. } => "Phi",
            Instruction::Jump { .. } => "Jump",
            Instruction::JumpIf { .. } => "JumpIf",
            Instruction::JumpUndefined { .. } => "JumpUndefined",
            Instruction::JumpLessThan { .. } => "JumpLessThan",
            Instruction::JumpLessThanEquals { .. } => "JumpLessThanEquals",
            Instruction::JumpGreaterThan { .. } => "JumpGreaterThan",
            Instruction::JumpGreaterThanEquals { .. } => "JumpGreaterThanEquals",
            Instruction::JumpLooselyEquals { .. } => "JumpLooselyEquals",
            Instruction::JumpLooselyInequals { .. } => "JumpLooselyInequals",
            Instruction::JumpStrictlyEquals { .. } => "JumpStrictlyEquals",
            Instruction::JumpStrictlyInequals { .. } => "JumpStrictlyInequals",
            Instruction::Return { .. } => "Return",
            Instruction::Throw { .. } => "Throw",
            Instruction::StartGenerator { .. } => "StartGenerator",
            Instruction::SaveAndYield { .. } => "SaveAndYield",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        match self {
            Instruction::Mov { dst, src }
            | Instruction::Not { dst, src }
            | Instruction::Negate { dst, src }
            | Instruction::Typeof { dst, src }
            | Instruction::ToNumber { dst, src } => write!(f, " {dst}, {src}"),
            Instruction::Add { dst, lhs, rhs }
            | Instruction::Sub { dst, lhs, rhs }
            | Instruction::Mul { dst, lhs, rhs }
            | Instruction::Div { dst, lhs, rhs }
            | Instruction::Mod { dst, lhs, rhs }
            | Instruction::LessThan { dst, lhs, rhs }
            | Instruction::LessThanEquals { dst, lhs, rhs }
            | Instruction::GreaterThan { dst, lhs, rhs }
            | Instruction::GreaterThanEquals { dst, lhs, rhs }
            | Instruction::LooselyEquals { dst, lhs, rhs }
            | Instruction::LooselyInequals { dst, lhs, rhs }
            | Instruction::StrictlyEquals { dst, lhs, rhs }
            | Instruction::StrictlyInequals { dst, lhs, rhs } => write!(f, " {dst}, {lhs}, {rhs}"),
            Instruction::NewObject { dst }
            | Instruction::CreateArguments { dst }
            | Instruction::Catch { dst } => {
                write!(f, " {dst}")
            }
            Instruction::NewArray { dst, elements } => {
                write!(f, " {dst}, [")?;
                write_operand_list(f, elements)?;
                write!(f, "]")
            }
            Instruction::ArrayAppend { dst, src } => write!(f, " {dst}, {src}"),
            Instruction::NewIterResult { dst, value, done } => {
                write!(f, " {dst}, {value}, done:{done}")
            }
            Instruction::GetById { dst, base, property } => {
                write!(f, " {dst}, {base}, #{}", property.0)
            }
            Instruction::GetByValue { dst, base, property } => {
                write!(f, " {dst}, {base}[{property}]")
            }
            Instruction::PutById { base, property, src } => {
                write!(f, " {base}, #{}, {src}", property.0)
            }
            Instruction::PutByValue { base, property, src } => {
                write!(f, " {base}[{property}], {src}")
            }
            Instruction::GetMethod { dst, object, property } => {
                write!(f, " {dst}, {object}, #{}", property.0)
            }
            Instruction::GetGlobal { dst, identifier } => write!(f, " {dst}, #{}", identifier.0),
            Instruction::SetGlobal { identifier, src } => write!(f, " #{}, {src}", identifier.0),
            Instruction::Call { dst, callee, this_value, arguments } => {
                write!(f, " {dst}, {callee}, this:{this_value}, (")?;
                write_operand_list(f, arguments)?;
                write!(f, ")")
            }
            Instruction::CallWithArgumentArray { dst, callee, this_value, arguments } => {
                write!(f, " {dst}, {callee}, this:{this_value}, ...{arguments}")
            }
            Instruction::CallBuiltin { dst, builtin, arguments } => {
                write!(f, " {dst}, {builtin}(")?;
                write_operand_list(f, arguments)?;
                write!(f, ")")
            }
            Instruction::NewFunction { dst, function } => write!(f, " {dst}, fn{}", function.0),
            Instruction::ThrowIfNotObject { src, message } => write!(f, " {src}, str{}", message.0),
            Instruction::NewTypeError { dst, error_string } => {
                write!(f, " {dst}, str{}", error_string.0)
            }
            Instruction::ResumeGenerator { kind_dst, value_dst } => {
                write!(f, " {kind_dst}, {value_dst}")
            }
            Instruction::Phi { dst, incoming } => {
                write!(f, " {dst}")?;
                for (label, operand) in incoming {
                    write!(f, ", [{label}: {operand}]")?;
                }
                Ok(())
            }
            Instruction::Jump { target } => write!(f, " {target}"),
            Instruction::JumpIf { condition, true_target, false_target }
            | Instruction::JumpUndefined { condition, true_target, false_target } => {
                write!(f, " {condition}, {true_target}, {false_target}")
            }
            Instruction::JumpLessThan { lhs, rhs, true_target, false_target }
            | Instruction::JumpLessThanEquals { lhs, rhs, true_target, false_target }
            | Instruction::JumpGreaterThan { lhs, rhs, true_target, false_target }
            | Instruction::JumpGreaterThanEquals { lhs, rhs, true_target, false_target }
            | Instruction::JumpLooselyEquals { lhs, rhs, true_target, false_target }
            | Instruction::JumpLooselyInequals { lhs, rhs, true_target, false_target }
            | Instruction::JumpStrictlyEquals { lhs, rhs, true_target, false_target }
            | Instruction::JumpStrictlyInequals { lhs, rhs, true_target, false_target } => {
                write!(f, " {lhs}, {rhs}, {true_target}, {false_target}")
            }
            Instruction::Return { value } => write!(f, " {value}"),
            Instruction::Throw { src } => write!(f, " {src}"),
            Instruction::StartGenerator { resume_target } => write!(f, " resume:{resume_target}"),
            Instruction::SaveAndYield { value, resume_target, suspension } => {
                write!(f, " #{suspension} {value}, resume:{resume_target}")
            }
        }
    }
}

fn write_operand_list(f: &mut fmt::Formatter<'_>, operands: &[Operand]) -> fmt::Result {
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{operand}")?;
    }
    Ok(())
}
