/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Textual dump of a lowered function.
//!
//! ```text
//! function count (generator, 3 registers, 1 local, 0 arguments)
//!   constants: k0 = 0, k1 = undefined
//!   suspension #0 Yield live [loc0] regions [] -> @4
//! @0:
//!   Mov loc0, k0
//!   StartGenerator @1
//! @1 (handler @3):
//!   ...
//! ```

use std::fmt::Write;

use super::function::{ConstantValue, Function};

fn format_constant(constant: &ConstantValue) -> String {
    match constant {
        ConstantValue::Number(n) => format!("{n}"),
        ConstantValue::Boolean(b) => format!("{b}"),
        ConstantValue::Null => "null".to_string(),
        ConstantValue::Undefined => "undefined".to_string(),
        ConstantValue::String(s) => format!("{s:?}"),
        ConstantValue::BigInt(digits) => format!("{digits}n"),
        ConstantValue::Symbol(symbol) => symbol.description().to_string(),
    }
}

fn plural(count: u32, noun: &str) -> String {
    if count == 1 { format!("1 {noun}") } else { format!("{count} {noun}s") }
}

pub fn dump_function(function: &Function) -> String {
    let mut output = String::new();
    let kind = if function.is_generator() { "generator" } else { "function" };
    let _ = writeln!(
        output,
        "function {} ({kind}, {}, {}, {})",
        function.name,
        plural(function.register_count, "register"),
        plural(function.local_count, "local"),
        plural(function.parameter_count, "argument"),
    );

    if !function.constants.is_empty() {
        let constants: Vec<String> = function
            .constants
            .iter()
            .enumerate()
            .map(|(index, constant)| format!("k{index} = {}", format_constant(constant)))
            .collect();
        let _ = writeln!(output, "  constants: {}", constants.join(", "));
    }

    for point in &function.suspension_points {
        let live: Vec<String> = point.live_locals.iter().map(ToString::to_string).collect();
        let regions: Vec<String> =
            point.enclosing_try_regions.iter().map(|id| format!("#{}", id.0)).collect();
        let target = point
            .resume_target
            .map(|label| label.to_string())
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(
            output,
            "  suspension #{} {:?} live [{}] regions [{}] -> {target}",
            point.index,
            point.kind,
            live.join(", "),
            regions.join(", "),
        );
    }

    for block in &function.blocks {
        let _ = match block.handler {
            Some(handler) => writeln!(output, "{} (handler {handler}):", block.label()),
            None => writeln!(output, "{}:", block.label()),
        };
        for instruction in block.instructions() {
            let _ = writeln!(output, "  {instruction}");
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_build::*;
    use crate::lowering::compile_function;
    use crate::options::LoweringOptions;

    #[test]
    fn dump_lists_blocks_and_suspensions() {
        let function = generator("g", &[], vec![expr(yield_(num(1.0)))]);
        let program = compile_function(&function, &LoweringOptions::default()).unwrap();
        let text = dump_function(&program.functions[0]);
        assert!(text.starts_with("function g (generator"));
        assert!(text.contains("suspension #0 Yield"));
        assert!(text.contains("StartGenerator"));
        assert!(text.contains("SaveAndYield"));
        assert!(text.contains("ResumeGenerator"));
    }
}
