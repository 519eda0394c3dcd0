/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! The lowered form: functions as graphs of basic blocks.
//!
//! - `operand.rs`: Operand encoding, labels and table indices
//! - `instruction.rs`: The instruction set, including suspend/resume
//! - `basic_block.rs`: Basic blocks with source map entries
//! - `function.rs`: Functions, constants, suspension points, try regions
//! - `cfg.rs`: Successors, loops, liveness and structural verification
//! - `dump.rs`: Textual dump for logs and tests

pub mod basic_block;
pub mod cfg;
pub mod dump;
pub mod function;
pub mod instruction;
pub mod operand;
