/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Graph queries and data-flow over a lowered function.
//!
//! Every query here treats the edge from a suspension terminator to its
//! resume target as an ordinary control-flow edge. Liveness additionally
//! runs over blocks that are unreachable from the entry, so a value that is
//! only used on a resumed path is never considered dead.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::function::Function;
use super::instruction::Instruction;
use super::operand::{Label, Operand};
use crate::error::CompileError;
use crate::u32_from_usize;

/// Normal and resume successors of a block (exception edges excluded).
pub fn successors(function: &Function, label: Label) -> SmallVec<[Label; 2]> {
    function
        .block(label)
        .terminator()
        .map(Instruction::successors)
        .unwrap_or_default()
}

/// Predecessor lists for every block, following `successors`.
pub fn predecessors(function: &Function) -> Vec<Vec<Label>> {
    let mut predecessors = vec![Vec::new(); function.blocks.len()];
    for block in &function.blocks {
        for successor in successors(function, block.label()) {
            let list: &mut Vec<Label> = &mut predecessors[successor.basic_block_index()];
            if !list.contains(&block.label()) {
                list.push(block.label());
            }
        }
    }
    predecessors
}

/// Blocks reachable from the entry block through normal, resume and
/// exception edges.
pub fn reachable_blocks(function: &Function) -> FxHashSet<Label> {
    let mut seen = FxHashSet::default();
    if function.blocks.is_empty() {
        return seen;
    }
    let mut worklist = vec![Label(0)];
    while let Some(label) = worklist.pop() {
        if !seen.insert(label) {
            continue;
        }
        let block = function.block(label);
        worklist.extend(successors(function, label));
        if let Some(handler) = block.handler {
            worklist.push(handler);
        }
    }
    seen
}

/// Loop headers: targets of back edges found by a depth-first walk from the entry.
pub fn loop_headers(function: &Function) -> Vec<Label> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; function.blocks.len()];
    let mut headers = Vec::new();
    if function.blocks.is_empty() {
        return headers;
    }

    // Iterative DFS with an explicit successor cursor per frame.
    let mut stack: Vec<(Label, usize)> = vec![(Label(0), 0)];
    marks[0] = Mark::OnStack;
    while let Some((label, cursor)) = stack.last_mut() {
        let next_blocks = successors(function, *label);
        if let Some(&next) = next_blocks.get(*cursor) {
            *cursor += 1;
            match marks[next.basic_block_index()] {
                Mark::Unvisited => {
                    marks[next.basic_block_index()] = Mark::OnStack;
                    stack.push((next, 0));
                }
                Mark::OnStack => {
                    if !headers.contains(&next) {
                        headers.push(next);
                    }
                }
                Mark::Done => {}
            }
        } else {
            marks[label.basic_block_index()] = Mark::Done;
            stack.pop();
        }
    }
    headers.sort();
    headers
}

/// The natural loop of `header`: the header plus every block that can reach
/// one of its back-edge sources without passing through the header.
pub fn natural_loop(
    function: &Function,
    header: Label,
    predecessors: &[Vec<Label>],
) -> FxHashSet<Label> {
    let mut body = FxHashSet::default();
    body.insert(header);
    let reachable_from_header = reachable_from(function, header);
    let mut worklist: Vec<Label> = predecessors[header.basic_block_index()]
        .iter()
        .copied()
        .filter(|pred| reachable_from_header.contains(pred))
        .collect();
    while let Some(label) = worklist.pop() {
        if body.insert(label) {
            worklist.extend(predecessors[label.basic_block_index()].iter().copied());
        }
    }
    body
}

fn reachable_from(function: &Function, start: Label) -> FxHashSet<Label> {
    let mut seen = FxHashSet::default();
    let mut worklist = vec![start];
    while let Some(label) = worklist.pop() {
        if seen.insert(label) {
            worklist.extend(successors(function, label));
        }
    }
    seen
}

/// Backward liveness over registers, locals and arguments.
#[derive(Debug, Clone)]
pub struct Liveness {
    live_in: Vec<FxHashSet<Operand>>,
    live_out: Vec<FxHashSet<Operand>>,
}

impl Liveness {
    pub fn compute(function: &Function) -> Self {
        let block_count = function.blocks.len();
        let mut live_in: Vec<FxHashSet<Operand>> = vec![FxHashSet::default(); block_count];
        let mut live_out: Vec<FxHashSet<Operand>> = vec![FxHashSet::default(); block_count];

        let mut changed = true;
        while changed {
            changed = false;
            for index in (0..block_count).rev() {
                let label = Label(u32_from_usize(index));
                let block = function.block(label);

                let mut out = FxHashSet::default();
                for successor in successors(function, label) {
                    out.extend(live_in[successor.basic_block_index()].iter().copied());
                }
                if let Some(handler) = block.handler {
                    out.extend(live_in[handler.basic_block_index()].iter().copied());
                }

                let mut live = out.clone();
                for instruction in block.instructions().rev() {
                    instruction.for_each_def(|operand| {
                        live.remove(&operand);
                    });
                    instruction.for_each_use(|operand| {
                        if operand.is_variable() {
                            live.insert(operand);
                        }
                    });
                }

                if live != live_in[index] || out != live_out[index] {
                    live_in[index] = live;
                    live_out[index] = out;
                    changed = true;
                }
            }
        }

        Self { live_in, live_out }
    }

    pub fn live_in(&self, label: Label) -> &FxHashSet<Operand> {
        &self.live_in[label.basic_block_index()]
    }

    pub fn live_out(&self, label: Label) -> &FxHashSet<Operand> {
        &self.live_out[label.basic_block_index()]
    }

    /// Values that must survive the given suspension point: everything live
    /// out of the suspending block, which includes whatever the resumed path reads.
    pub fn live_across_suspension(&self, function: &Function, index: u32) -> FxHashSet<Operand> {
        function
            .blocks
            .iter()
            .find(|block| {
                matches!(
                    block.terminator(),
                    Some(Instruction::SaveAndYield { suspension, .. }) if *suspension == index
                )
            })
            .map(|block| self.live_out(block.label()).clone())
            .unwrap_or_default()
    }
}

/// Check the structural invariants of a lowered function.
pub fn verify(function: &Function) -> Result<(), CompileError> {
    let name = || function.name.clone();
    let block_count = function.blocks.len();

    for block in &function.blocks {
        let label = block.label();
        let Some(terminator) = block.terminator() else {
            return Err(CompileError::UnterminatedBlock { function: name(), label });
        };
        let targets = terminator.successors().into_iter().chain(block.handler);
        for target in targets {
            if target.basic_block_index() >= block_count {
                return Err(CompileError::InvalidJumpTarget { function: name(), label, target });
            }
        }
        for (position, instruction) in block.instructions().enumerate() {
            if matches!(instruction, Instruction::ResumeGenerator { .. }) && position != 0 {
                return Err(CompileError::MalformedResumeBlock {
                    function: name(),
                    label,
                    reason: "ResumeGenerator is not the first instruction",
                });
            }
        }
    }

    // Resume blocks: entered exactly once, and only by a suspension terminator.
    let mut resume_entries: FxHashMap<Label, u32> = FxHashMap::default();
    let mut seen_points: FxHashMap<u32, Label> = FxHashMap::default();
    for block in &function.blocks {
        let Some(terminator) = block.terminator() else { continue };
        match terminator {
            Instruction::SaveAndYield { resume_target, suspension, .. } => {
                *resume_entries.entry(*resume_target).or_default() += 1;
                if seen_points.insert(*suspension, *resume_target).is_some() {
                    return Err(CompileError::DuplicateSuspensionPoint {
                        function: name(),
                        index: *suspension,
                    });
                }
            }
            Instruction::StartGenerator { resume_target } => {
                *resume_entries.entry(*resume_target).or_default() += 1;
            }
            other => {
                for successor in other.successors() {
                    if function.block(successor).is_resume_block() {
                        return Err(CompileError::MalformedResumeBlock {
                            function: name(),
                            label: successor,
                            reason: "entered by an ordinary jump",
                        });
                    }
                }
            }
        }
    }
    for (label, count) in &resume_entries {
        if !function.block(*label).is_resume_block() {
            return Err(CompileError::MalformedResumeBlock {
                function: name(),
                label: *label,
                reason: "does not start with ResumeGenerator",
            });
        }
        if *count != 1 {
            return Err(CompileError::MalformedResumeBlock {
                function: name(),
                label: *label,
                reason: "shared by several suspension points",
            });
        }
    }

    for point in &function.suspension_points {
        let recorded = point.resume_target;
        match (recorded, seen_points.get(&point.index)) {
            (Some(recorded), Some(actual)) if recorded == *actual => {}
            _ => {
                return Err(CompileError::MissingResumeTarget {
                    function: name(),
                    index: point.index,
                });
            }
        }
    }

    let predecessors = predecessors(function);
    for block in &function.blocks {
        let mut in_phi_prefix = true;
        for instruction in block.instructions() {
            let Instruction::Phi { incoming, .. } = instruction else {
                in_phi_prefix = false;
                continue;
            };
            let expected: FxHashSet<Label> =
                predecessors[block.index as usize].iter().copied().collect();
            let found: FxHashSet<Label> = incoming.iter().map(|(label, _)| *label).collect();
            if !in_phi_prefix || expected != found || incoming.len() != found.len() {
                return Err(CompileError::PhiMismatch { function: name(), label: block.label() });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FunctionKind;
    use crate::ir::basic_block::{BasicBlock, SourceMapEntry};
    use crate::ir::operand::Register;

    fn function_with(blocks: Vec<Vec<Instruction>>) -> Function {
        let blocks = blocks
            .into_iter()
            .enumerate()
            .map(|(index, instructions)| {
                let mut block = BasicBlock::new(u32_from_usize(index));
                for instruction in instructions {
                    block.append(instruction, SourceMapEntry::default());
                }
                block
            })
            .collect();
        Function {
            name: "test".to_string(),
            kind: FunctionKind::Generator,
            is_strict: false,
            blocks,
            constants: Vec::new(),
            string_table: Vec::new(),
            identifier_table: Vec::new(),
            register_count: Register::RESERVED_COUNT,
            local_count: 1,
            parameter_count: 0,
            local_names: vec!["x".to_string()],
            suspension_points: Vec::new(),
            try_regions: Vec::new(),
            start_resume_target: None,
            merge_headers: Vec::new(),
        }
    }

    fn resume() -> Instruction {
        Instruction::ResumeGenerator {
            kind_dst: Operand::register(Register::RESUME_KIND),
            value_dst: Operand::register(Register(5)),
        }
    }

    #[test]
    fn loops_are_found_through_back_edges() {
        let function = function_with(vec![
            vec![Instruction::Jump { target: Label(1) }],
            vec![Instruction::JumpIf {
                condition: Operand::local(0),
                true_target: Label(2),
                false_target: Label(3),
            }],
            vec![Instruction::Jump { target: Label(1) }],
            vec![Instruction::Return { value: Operand::local(0) }],
        ]);
        assert_eq!(loop_headers(&function), vec![Label(1)]);
        let predecessors = predecessors(&function);
        let body = natural_loop(&function, Label(1), &predecessors);
        assert!(body.contains(&Label(1)) && body.contains(&Label(2)));
        assert!(!body.contains(&Label(0)) && !body.contains(&Label(3)));
    }

    #[test]
    fn values_read_after_a_resume_are_live_across_it() {
        let function = function_with(vec![
            vec![
                Instruction::Mov { dst: Operand::local(0), src: Operand::constant(0) },
                Instruction::SaveAndYield {
                    value: Operand::constant(0),
                    resume_target: Label(1),
                    suspension: 0,
                },
            ],
            vec![resume(), Instruction::Return { value: Operand::local(0) }],
        ]);
        let liveness = Liveness::compute(&function);
        assert!(liveness.live_across_suspension(&function, 0).contains(&Operand::local(0)));
        assert!(!liveness.live_in(Label(0)).contains(&Operand::local(0)));
    }

    #[test]
    fn verify_rejects_jumps_into_resume_blocks() {
        let function = function_with(vec![
            vec![Instruction::Jump { target: Label(1) }],
            vec![resume(), Instruction::Return { value: Operand::constant(0) }],
        ]);
        let error = verify(&function).unwrap_err();
        assert!(matches!(
            error,
            CompileError::MalformedResumeBlock { reason: "entered by an ordinary jump", .. }
        ));
    }

    #[test]
    fn verify_rejects_unterminated_blocks_and_bad_targets() {
        let unterminated = function_with(vec![vec![Instruction::Mov {
            dst: Operand::local(0),
            src: Operand::constant(0),
        }]]);
        assert!(matches!(verify(&unterminated), Err(CompileError::UnterminatedBlock { .. })));

        let dangling = function_with(vec![vec![Instruction::Jump { target: Label(7) }]]);
        assert!(matches!(
            verify(&dangling),
            Err(CompileError::InvalidJumpTarget { target: Label(7), .. })
        ));
    }

    #[test]
    fn verify_checks_phis_against_predecessors() {
        let phi = |incoming: Vec<(Label, Operand)>| Instruction::Phi {
            dst: Operand::local(0),
            incoming,
        };
        let good = function_with(vec![
            vec![Instruction::Jump { target: Label(1) }],
            vec![
                phi(vec![(Label(0), Operand::local(0)), (Label(1), Operand::local(0))]),
                Instruction::Jump { target: Label(1) },
            ],
        ]);
        assert_eq!(verify(&good), Ok(()));

        let bad = function_with(vec![
            vec![Instruction::Jump { target: Label(1) }],
            vec![phi(vec![(Label(0), Operand::local(0))]), Instruction::Jump { target: Label(1) }],
        ]);
        assert!(matches!(verify(&bad), Err(CompileError::PhiMismatch { .. })));
    }
}
