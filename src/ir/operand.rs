/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

use std::fmt;

/// An IR register index.
///
/// Reserved registers:
/// - 0: accumulator
/// - 1: exception
/// - 2: this_value
/// - 3: return_value
/// - 4: resume_kind (written by the prologue's `ResumeGenerator`)
/// - 5+: user registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(pub u32);

impl Register {
    pub const ACCUMULATOR: Register = Register(0);
    pub const EXCEPTION: Register = Register(1);
    pub const THIS_VALUE: Register = Register(2);
    pub const RETURN_VALUE: Register = Register(3);
    pub const RESUME_KIND: Register = Register(4);
    pub const RESERVED_COUNT: u32 = 5;
}

/// An IR operand.
///
/// Encoded as a single `u32` with a 3-bit type tag in the top 3 bits
/// and a 29-bit index in the lower 29 bits:
///
///   `raw = (type << 29) | index`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Operand(u32);

impl Operand {
    const TYPE_SHIFT: u32 = 29;
    const INDEX_MASK: u32 = 0x1FFF_FFFF;

    pub fn register(reg: Register) -> Self {
        Self(reg.0)
    }

    pub fn local(index: u32) -> Self {
        Self((1 << Self::TYPE_SHIFT) | index)
    }

    pub fn constant(index: u32) -> Self {
        Self((2 << Self::TYPE_SHIFT) | index)
    }

    pub fn argument(index: u32) -> Self {
        Self((3 << Self::TYPE_SHIFT) | index)
    }

    pub fn is_register(self) -> bool {
        self.operand_type() == OperandType::Register
    }

    pub fn is_local(self) -> bool {
        self.operand_type() == OperandType::Local
    }

    pub fn is_constant(self) -> bool {
        self.operand_type() == OperandType::Constant
    }

    pub fn is_argument(self) -> bool {
        self.operand_type() == OperandType::Argument
    }

    /// Registers, locals and arguments hold values that can change between
    /// instructions. Constants never do.
    pub fn is_variable(self) -> bool {
        !self.is_constant()
    }

    pub fn operand_type(self) -> OperandType {
        match (self.0 >> Self::TYPE_SHIFT) & 0x7 {
            0 => OperandType::Register,
            1 => OperandType::Local,
            2 => OperandType::Constant,
            _ => OperandType::Argument,
        }
    }

    pub fn index(self) -> u32 {
        self.0 & Self::INDEX_MASK
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand_type() {
            OperandType::Register => match Register(self.index()) {
                Register::ACCUMULATOR => write!(f, "acc"),
                Register::EXCEPTION => write!(f, "exception"),
                Register::THIS_VALUE => write!(f, "this"),
                Register::RETURN_VALUE => write!(f, "return_value"),
                Register::RESUME_KIND => write!(f, "resume_kind"),
                _ => write!(f, "r{}", self.index()),
            },
            OperandType::Local => write!(f, "loc{}", self.index()),
            OperandType::Constant => write!(f, "k{}", self.index()),
            OperandType::Argument => write!(f, "arg{}", self.index()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    Register,
    Local,
    Constant,
    Argument,
}

/// An IR label: the index of a basic block within its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl Label {
    pub fn basic_block_index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Index into the string table (diagnostic messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringTableIndex(pub u32);

/// Index into the identifier table (property names and global names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentifierTableIndex(pub u32);

/// Index of a function within a `Program`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

impl FunctionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_tags_do_not_collide() {
        let register = Operand::register(Register(7));
        let local = Operand::local(7);
        let constant = Operand::constant(7);
        let argument = Operand::argument(7);

        assert!(register.is_register());
        assert!(local.is_local());
        assert!(constant.is_constant());
        assert!(argument.is_argument());
        assert_ne!(register, local);
        assert_ne!(local, constant);
        assert_ne!(constant, argument);
        for operand in [register, local, constant, argument] {
            assert_eq!(operand.index(), 7);
        }
    }

    #[test]
    fn reserved_registers_have_names() {
        assert_eq!(Operand::register(Register::ACCUMULATOR).to_string(), "acc");
        assert_eq!(Operand::register(Register::RESUME_KIND).to_string(), "resume_kind");
        assert_eq!(Operand::register(Register(9)).to_string(), "r9");
        assert_eq!(Operand::constant(2).to_string(), "k2");
        assert!(!Operand::constant(0).is_variable());
        assert!(Operand::argument(0).is_variable());
    }
}
