/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Merges at loop headers reachable from resume blocks.
//!
//! A loop whose body contains a suspension is entered both from its
//! ordinary preheader and, around the back edge, from code that runs after
//! a resume. Every value live into such a header gets a `Phi` naming the
//! operand on each incoming edge.
//!
//! Registers and locals keep one slot across the whole function, so each
//! `Phi` is an identity merge: `dst` equals every incoming operand and
//! executing it never changes a value. The phis are markers for later
//! passes, recording that the value is loop-carried through a resume and
//! must not be re-derived on the resumed path.

use crate::ir::basic_block::SourceMapEntry;
use crate::ir::cfg::{self, Liveness};
use crate::ir::function::Function;
use crate::ir::instruction::Instruction;
use crate::ir::operand::{Label, Operand, Register};

/// Insert the merges; returns the headers that received any.
pub fn insert_merge_phis(function: &mut Function) -> Vec<Label> {
    let predecessors = cfg::predecessors(function);
    let liveness = Liveness::compute(function);
    let mut merged = Vec::new();

    for header in cfg::loop_headers(function) {
        let body = cfg::natural_loop(function, header, &predecessors);
        if !body.iter().any(|label| function.block(*label).is_resume_block()) {
            continue;
        }

        let mut carried: Vec<Operand> = liveness
            .live_in(header)
            .iter()
            .copied()
            .filter(|operand| {
                !(operand.is_register() && operand.index() < Register::RESERVED_COUNT)
            })
            .collect();
        carried.sort();

        let mut incoming_blocks = predecessors[header.basic_block_index()].clone();
        incoming_blocks.sort();

        let phis = carried.iter().map(|operand| {
            let incoming = incoming_blocks.iter().map(|label| (*label, *operand)).collect();
            (Instruction::Phi { dst: *operand, incoming }, SourceMapEntry::default())
        });
        let block = &mut function.blocks[header.basic_block_index()];
        block.instructions.splice(0..0, phis);

        log::debug!(
            "merge: {} header {} carries {} value(s)",
            function.name,
            header,
            carried.len()
        );
        merged.push(header);
    }

    function.merge_headers = merged.clone();
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_build::*;
    use crate::lowering::compile_function;
    use crate::options::LoweringOptions;

    #[test]
    fn loops_around_a_yield_get_merges() {
        let function = generator(
            "count",
            &[],
            vec![
                let_("i", num(0.0)),
                while_(
                    less_than(ident("i"), num(3.0)),
                    block(vec![expr(yield_(ident("i"))), expr(increment(ident("i"), false))]),
                ),
            ],
        );
        let program = compile_function(&function, &LoweringOptions::default()).unwrap();
        let lowered = &program.functions[0];
        assert_eq!(lowered.merge_headers.len(), 1);

        let header = lowered.block(lowered.merge_headers[0]);
        let merged: Vec<Operand> = header
            .instructions()
            .filter_map(|instruction| match instruction {
                Instruction::Phi { dst, .. } => Some(*dst),
                _ => None,
            })
            .collect();
        assert!(merged.contains(&Operand::local(0)));
    }

    #[test]
    fn loops_without_suspensions_are_left_alone() {
        let function = generator(
            "g",
            &[],
            vec![
                let_("i", num(0.0)),
                while_(less_than(ident("i"), num(3.0)), expr(increment(ident("i"), false))),
                expr(yield_(ident("i"))),
            ],
        );
        let program = compile_function(&function, &LoweringOptions::default()).unwrap();
        assert!(program.functions[0].merge_headers.is_empty());
        let options = LoweringOptions::default().without_merge_phis();
        let program = compile_function(&function, &options).unwrap();
        assert!(program.functions[0].resume_blocks().count() >= 2);
    }
}
