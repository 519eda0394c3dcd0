/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! # LibJS Generators
//!
//! Lowers generator and async function bodies into resumable control flow
//! graphs, and runs them.
//!
//! ## Architecture
//!
//! ```text
//! FunctionData (AST)
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────┐
//! │  Scope resolution (scope.rs)                        │
//! │  Assigns argument/local slots to every identifier   │
//! └──────────────────────┬──────────────────────────────┘
//!                        │ resolved AST
//!                        ▼
//! ┌─────────────────────────────────────────────────────┐
//! │  Indexer (lowering/indexer.rs)                      │
//! │  Suspension points, try regions, live locals        │
//! └──────────────────────┬──────────────────────────────┘
//!                        │ SuspensionIndex
//!                        ▼
//! ┌─────────────────────────────────────────────────────┐
//! │  Codegen (lowering/codegen.rs + lowering/*.rs)      │
//! │  Emits basic blocks; splits at every suspension     │
//! └──────────────────────┬──────────────────────────────┘
//!                        │ Function
//!                        ▼
//! ┌─────────────────────────────────────────────────────┐
//! │  Merge phis + verifier (lowering/merge.rs, ir/cfg)  │
//! └──────────────────────┬──────────────────────────────┘
//!                        │ Program
//!                        ▼
//! ┌─────────────────────────────────────────────────────┐
//! │  Runtime (runtime/*.rs)                             │
//! │  Interpreter, generator objects, async pump         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module overview
//!
//! - `ast.rs`: AST type definitions
//! - `ast_build.rs`: terse AST constructors
//! - `scope.rs`: slot assignment
//! - `ir/`: operands, instructions, blocks, functions, CFG analysis, dumps
//! - `lowering/`: the lowering pipeline
//! - `runtime/`: the reference runtime
//! - `error.rs`: compile errors
//! - `options.rs`: lowering options

pub mod ast;
pub mod ast_build;
pub mod error;
pub mod ir;
pub mod lowering;
pub mod options;
pub mod runtime;
pub mod scope;

pub use error::CompileError;
pub use ir::dump::dump_function;
pub use ir::function::{Function, Program};
pub use lowering::{compile_function, compile_program};
pub use options::LoweringOptions;

/// Convert a `usize` to `u32`, panicking if the value exceeds `u32::MAX`.
/// Prefer this over `as u32` which silently truncates on 64-bit platforms.
pub(crate) fn u32_from_usize(value: usize) -> u32 {
    u32::try_from(value).expect("value exceeds u32::MAX")
}
