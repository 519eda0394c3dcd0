/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

use super::instruction::Instruction;
use super::operand::Label;

/// A source map entry mapping an instruction to the source range it came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceMapEntry {
    pub source_start: u32,
    pub source_end: u32,
}

/// A basic block in the lowered CFG.
///
/// Instructions are appended until a terminator is emitted; after that the
/// block is closed and further appends are ignored by the lowering context.
/// `handler` is the block that receives any exception thrown from here.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub index: u32,
    pub instructions: Vec<(Instruction, SourceMapEntry)>,
    pub handler: Option<Label>,
    pub terminated: bool,
}

impl BasicBlock {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            instructions: Vec::new(),
            handler: None,
            terminated: false,
        }
    }

    pub fn label(&self) -> Label {
        Label(self.index)
    }

    pub fn append(&mut self, instruction: Instruction, source_map: SourceMapEntry) {
        let is_terminator = instruction.is_terminator();
        self.instructions.push((instruction, source_map));
        if is_terminator {
            self.terminated = true;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions
            .last()
            .map(|(instruction, _)| instruction)
            .filter(|instruction| instruction.is_terminator())
    }

    /// Does this block start with `ResumeGenerator`?
    pub fn is_resume_block(&self) -> bool {
        matches!(
            self.instructions.first(),
            Some((Instruction::ResumeGenerator { .. }, _))
        )
    }

    pub fn instructions(&self) -> impl DoubleEndedIterator<Item = &Instruction> {
        self.instructions.iter().map(|(instruction, _)| instruction)
    }
}
