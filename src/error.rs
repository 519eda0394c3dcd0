/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Compile-time diagnostics.
//!
//! Every variant is fatal for the function being compiled. Problems in the
//! user's program that JS reports at runtime (protocol violations, thrown
//! values) never show up here; they are compiled into the IR.

use thiserror::Error;

use crate::ir::function::{SuspensionKind, TryRegionId};
use crate::ir::operand::Label;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("{function}: suspension point #{index} has no resume target")]
    MissingResumeTarget { function: String, index: u32 },

    #[error("{function}: suspension point #{index} is lowered more than once")]
    DuplicateSuspensionPoint { function: String, index: u32 },

    #[error(
        "{function}: suspension point #{index} expected {expected:?} but the body has {found:?}"
    )]
    SuspensionMismatch {
        function: String,
        index: u32,
        expected: Option<SuspensionKind>,
        found: SuspensionKind,
    },

    #[error(
        "{function}: try regions at suspension point #{index} are {found:?}, expected {expected:?}"
    )]
    InconsistentTryRegions {
        function: String,
        index: u32,
        expected: Vec<TryRegionId>,
        found: Vec<TryRegionId>,
    },

    #[error("{function}: block {label} does not end in a terminator")]
    UnterminatedBlock { function: String, label: Label },

    #[error("{function}: block {label} jumps to nonexistent block {target}")]
    InvalidJumpTarget { function: String, label: Label, target: Label },

    #[error("{function}: resume block {label} is malformed: {reason}")]
    MalformedResumeBlock { function: String, label: Label, reason: &'static str },

    #[error("{function}: phi in block {label} does not match the block's predecessors")]
    PhiMismatch { function: String, label: Label },

    #[error("{function}: `{label}` does not name an enclosing statement")]
    UnknownJumpLabel { function: String, label: String },

    #[error("{function}: {construct} is not supported")]
    Unsupported { function: String, construct: &'static str },
}

impl CompileError {
    /// The name of the function whose compilation failed.
    pub fn function(&self) -> &str {
        match self {
            CompileError::MissingResumeTarget { function, .. }
            | CompileError::DuplicateSuspensionPoint { function, .. }
            | CompileError::SuspensionMismatch { function, .. }
            | CompileError::InconsistentTryRegions { function, .. }
            | CompileError::UnterminatedBlock { function, .. }
            | CompileError::InvalidJumpTarget { function, .. }
            | CompileError::MalformedResumeBlock { function, .. }
            | CompileError::PhiMismatch { function, .. }
            | CompileError::UnknownJumpLabel { function, .. }
            | CompileError::Unsupported { function, .. } => function,
        }
    }
}
