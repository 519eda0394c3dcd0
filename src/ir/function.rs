/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Compiled functions and the metadata the lowering attaches to them.

use num_bigint::BigInt;

use super::basic_block::BasicBlock;
use super::operand::{FunctionId, Label, Operand};
use crate::ast::FunctionKind;

/// Symbols the engine knows by name. Only `Symbol.iterator` is needed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownSymbol {
    Iterator,
}

impl WellKnownSymbol {
    pub fn description(self) -> &'static str {
        match self {
            WellKnownSymbol::Iterator => "Symbol.iterator",
        }
    }
}

/// A typed constant value stored in the constant pool.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Number(f64),
    Boolean(bool),
    Null,
    Undefined,
    String(String),
    BigInt(String),
    Symbol(WellKnownSymbol),
}

/// Convert a constant value to a boolean, matching JS `ToBoolean`.
pub fn constant_to_boolean(value: &ConstantValue) -> Option<bool> {
    match value {
        ConstantValue::Boolean(b) => Some(*b),
        ConstantValue::Null | ConstantValue::Undefined => Some(false),
        ConstantValue::Number(n) => Some(*n != 0.0 && !n.is_nan()),
        ConstantValue::String(s) => Some(!s.is_empty()),
        ConstantValue::BigInt(s) => parse_bigint(s).map(|bi| bi != BigInt::ZERO),
        ConstantValue::Symbol(_) => Some(true),
    }
}

/// Parse a BigInt literal (without the trailing `n`).
/// Handles decimal, 0b binary, 0o octal, and 0x hex prefixes.
pub fn parse_bigint(s: &str) -> Option<BigInt> {
    if s.len() > 2 {
        let (prefix, rest) = s.split_at(2);
        match prefix {
            "0b" | "0B" => return BigInt::parse_bytes(rest.as_bytes(), 2),
            "0o" | "0O" => return BigInt::parse_bytes(rest.as_bytes(), 8),
            "0x" | "0X" => return BigInt::parse_bytes(rest.as_bytes(), 16),
            _ => {}
        }
    }
    s.parse::<BigInt>().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuspensionKind {
    Yield,
    Await,
    YieldDelegate,
}

/// Which construct is consuming an iterator.
///
/// Only the handling of each stepped value differs between these; the
/// acquire/step/close sequence is the same for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterationContext {
    ForOf,
    Destructure,
    Spread,
    Delegate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TryRegionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRegionKind {
    /// The protected part of `try { } catch { }`. No cleanup on return.
    Catch,
    /// A `finally` block runs before any non-local exit.
    Finally,
    /// The iterator driven by this construct is closed on abrupt exit.
    IteratorClose(IterationContext),
}

impl TryRegionKind {
    pub fn has_cleanup(self) -> bool {
        !matches!(self, TryRegionKind::Catch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryRegion {
    pub id: TryRegionId,
    pub kind: TryRegionKind,
    pub parent: Option<TryRegionId>,
}

/// One `yield`, `await` or `yield*` in a function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspensionPoint {
    pub index: u32,
    pub kind: SuspensionKind,
    /// Active regions at the point, outermost first.
    pub enclosing_try_regions: Vec<TryRegionId>,
    /// Locals and arguments that are visible at the point and referenced
    /// after it (or anywhere in an enclosing loop).
    pub live_locals: Vec<Operand>,
    /// Filled in by the lowering. A point without one is a compiler bug.
    pub resume_target: Option<Label>,
}

/// A function in lowered form.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub kind: FunctionKind,
    /// Strict mode code: assignment to an undeclared global throws.
    pub is_strict: bool,
    pub blocks: Vec<BasicBlock>,
    pub constants: Vec<ConstantValue>,
    pub string_table: Vec<String>,
    pub identifier_table: Vec<String>,
    pub register_count: u32,
    pub local_count: u32,
    pub parameter_count: u32,
    pub local_names: Vec<String>,
    pub suspension_points: Vec<SuspensionPoint>,
    pub try_regions: Vec<TryRegion>,
    /// The resume target of `StartGenerator`, for generator bodies.
    pub start_resume_target: Option<Label>,
    /// Loop headers that received merges for values flowing around a resume.
    pub merge_headers: Vec<Label>,
}

impl Function {
    pub fn is_generator(&self) -> bool {
        self.kind == FunctionKind::Generator
    }

    pub fn block(&self, label: Label) -> &BasicBlock {
        &self.blocks[label.basic_block_index()]
    }

    pub fn constant(&self, operand: Operand) -> Option<&ConstantValue> {
        if operand.is_constant() {
            self.constants.get(operand.index() as usize)
        } else {
            None
        }
    }

    pub fn identifier(&self, index: super::operand::IdentifierTableIndex) -> &str {
        &self.identifier_table[index.0 as usize]
    }

    pub fn string(&self, index: super::operand::StringTableIndex) -> &str {
        &self.string_table[index.0 as usize]
    }

    pub fn suspension_point(&self, index: u32) -> Option<&SuspensionPoint> {
        self.suspension_points.get(index as usize)
    }

    pub fn resume_blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.iter().filter(|block| block.is_resume_block())
    }
}

/// All functions produced for one compilation.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub functions: Vec<Function>,
    /// Top-level function declarations, bound as globals when the program runs.
    pub globals: Vec<(String, FunctionId)>,
}

impl Program {
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.globals
            .iter()
            .find(|(global, _)| global == name)
            .map(|(_, id)| self.function(*id))
    }

    pub(crate) fn push(&mut self, function: Function) -> FunctionId {
        let id = FunctionId(crate::u32_from_usize(self.functions.len()));
        self.functions.push(function);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bigint_constants_fold_to_booleans() {
        assert_eq!(constant_to_boolean(&ConstantValue::BigInt("0".into())), Some(false));
        assert_eq!(constant_to_boolean(&ConstantValue::BigInt("0x10".into())), Some(true));
        assert_eq!(constant_to_boolean(&ConstantValue::String(String::new())), Some(false));
        assert_eq!(
            constant_to_boolean(&ConstantValue::Symbol(WellKnownSymbol::Iterator)),
            Some(true)
        );
        assert_eq!(constant_to_boolean(&ConstantValue::Number(f64::NAN)), Some(false));
    }

    #[test]
    fn only_catch_regions_lack_cleanup() {
        assert!(!TryRegionKind::Catch.has_cleanup());
        assert!(TryRegionKind::Finally.has_cleanup());
        assert!(TryRegionKind::IteratorClose(IterationContext::ForOf).has_cleanup());
    }
}
