/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

/// Knobs for the lowering pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoweringOptions {
    /// Insert `Phi` merges at loop headers whose body contains a resume block.
    pub insert_merge_phis: bool,
    /// Run `ir::cfg::verify` on every lowered function.
    pub verify: bool,
    /// Compile as strict mode code, regardless of the function's own flag.
    pub strict: bool,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self { insert_merge_phis: true, verify: true, strict: false }
    }
}

impl LoweringOptions {
    pub fn without_merge_phis(self) -> Self {
        Self { insert_merge_phis: false, ..self }
    }
}
