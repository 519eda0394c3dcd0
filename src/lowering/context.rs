/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! `LoweringContext`: all state needed while lowering one function body.
//!
//! Nothing here is global. Register pool, constant pool, block list, the
//! break/continue/finally bookkeeping and the suspension/try-region cursors
//! are owned by the context and passed by reference through the pass.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::indexer::SuspensionIndex;
use crate::ast::{FunctionKind, LocalType};
use crate::error::CompileError;
use crate::ir::basic_block::{BasicBlock, SourceMapEntry};
use crate::ir::function::{
    ConstantValue, Function, SuspensionKind, SuspensionPoint, TryRegion, TryRegionId, TryRegionKind,
    WellKnownSymbol, constant_to_boolean,
};
use crate::ir::instruction::Instruction;
use crate::ir::operand::*;
use crate::options::LoweringOptions;
use crate::u32_from_usize;

/// Identifies an operand that auto-frees its register when the last
/// clone is dropped.
///
/// Wraps `Rc<ScopedOperandInner>`. When the last `Rc` clone drops
/// and the operand is a non-reserved register, the `Drop` impl
/// returns it to the context's register pool for reuse.
#[derive(Debug, Clone)]
pub struct ScopedOperand {
    pub(crate) inner: Rc<ScopedOperandInner>,
}

pub(crate) struct ScopedOperandInner {
    operand: Operand,
    free_register_pool: Rc<RefCell<Vec<Register>>>,
}

impl std::fmt::Debug for ScopedOperandInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScopedOperandInner({:?})", self.operand)
    }
}

impl Drop for ScopedOperandInner {
    fn drop(&mut self) {
        if self.operand.is_register() && self.operand.index() >= Register::RESERVED_COUNT {
            self.free_register_pool.borrow_mut().push(Register(self.operand.index()));
        }
    }
}

impl ScopedOperand {
    pub fn operand(&self) -> Operand {
        self.inner.operand
    }
}

impl PartialEq for ScopedOperand {
    fn eq(&self, other: &Self) -> bool {
        self.inner.operand == other.inner.operand
    }
}

/// What kind of body is being lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Normal,
    Generator,
    /// The inner generator of an async function: `await` suspends.
    AsyncBody,
}

impl BodyKind {
    pub fn is_resumable(self) -> bool {
        self != BodyKind::Normal
    }
}

/// Block boundary types for unwind tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockBoundaryType {
    Break,
    Continue,
    ReturnToFinally,
}

/// A break/continue scope with its target label and language labels.
pub struct LabelableScope {
    pub target: Label,
    pub language_label_set: Vec<String>,
}

/// What runs when control leaves a `FinallyContext`.
#[derive(Debug, Clone)]
pub enum FinallyCleanup {
    /// A user `finally` block.
    Finalizer,
    /// Close `iterator` unless `done` (when present) says it is exhausted.
    CloseIterator { iterator: ScopedOperand, done: Option<ScopedOperand> },
}

/// Codegen-time state for a try/finally scope or an iterator-closing scope.
///
/// Stored in `LoweringContext::finally_contexts`, referenced by index.
pub struct FinallyContext {
    pub completion_type: ScopedOperand,
    pub completion_value: ScopedOperand,
    pub finally_body: Label,
    pub exception_preamble: Label,
    pub parent_index: Option<usize>,
    pub registered_jumps: Vec<FinallyJump>,
    pub next_jump_index: i32,
    pub cleanup: FinallyCleanup,
}

impl FinallyContext {
    pub const NORMAL: i32 = 0;
    pub const THROW: i32 = 1;
    pub const RETURN: i32 = 2;
    pub const FIRST_JUMP_INDEX: i32 = 3;
}

/// A break/continue target registered with a FinallyContext.
pub struct FinallyJump {
    pub index: i32,
    pub target: Label,
}

pub struct LoweringContext {
    pub name: String,
    pub body_kind: BodyKind,
    pub strict: bool,
    pub options: LoweringOptions,

    // --- Basic block management ---
    pub basic_blocks: Vec<BasicBlock>,
    current_block_index: Label,
    pub current_unwind_handler: Option<Label>,

    // --- Register allocation ---
    next_register: u32,
    free_register_pool: Rc<RefCell<Vec<Register>>>,
    resume_kind: ScopedOperand,
    this_value: ScopedOperand,

    // --- Constant pool ---
    constants: Vec<ConstantValue>,
    true_constant: Option<ScopedOperand>,
    false_constant: Option<ScopedOperand>,
    null_constant: Option<ScopedOperand>,
    undefined_constant: Option<ScopedOperand>,
    iterator_symbol_constant: Option<ScopedOperand>,
    int32_constants: FxHashMap<i32, ScopedOperand>,
    string_constants: FxHashMap<String, ScopedOperand>,

    // --- Tables ---
    string_table: Vec<String>,
    string_table_index: FxHashMap<String, StringTableIndex>,
    identifier_table: Vec<String>,
    identifier_table_index: FxHashMap<String, IdentifierTableIndex>,

    // --- Unwind bookkeeping ---
    pub boundaries: Vec<BlockBoundaryType>,
    continuable_scopes: Vec<LabelableScope>,
    breakable_scopes: Vec<LabelableScope>,
    pub pending_labels: Vec<String>,
    pub finally_contexts: Vec<FinallyContext>,
    pub current_finally_context: Option<usize>,

    // --- Suspension points and try regions ---
    index: SuspensionIndex,
    next_point: usize,
    next_region: usize,
    region_stack: Vec<TryRegionId>,

    current_source: SourceMapEntry,
    local_count: u32,
    local_names: Vec<String>,
    parameter_count: u32,
}

macro_rules! singleton_constant {
    ($self:expr, $field:ident, $value:expr) => {{
        if let Some(op) = &$self.$field {
            return op.clone();
        }
        let op = $self.append_constant($value);
        $self.$field = Some(op.clone());
        op
    }};
}

macro_rules! define_intern_method {
    ($method_name:ident, $index_type:ident, $table:ident, $cache:ident) => {
        pub fn $method_name(&mut self, s: &str) -> $index_type {
            if let Some(&index) = self.$cache.get(s) {
                return index;
            }
            let index = $index_type(u32_from_usize(self.$table.len()));
            self.$table.push(s.to_string());
            self.$cache.insert(s.to_string(), index);
            index
        }
    };
}

impl LoweringContext {
    pub fn new(
        name: impl Into<String>,
        body_kind: BodyKind,
        index: SuspensionIndex,
        local_names: Vec<String>,
        parameter_count: u32,
        options: &LoweringOptions,
    ) -> Self {
        let free_register_pool = Rc::new(RefCell::new(Vec::new()));
        let fixed = |register: Register| ScopedOperand {
            inner: Rc::new(ScopedOperandInner {
                operand: Operand::register(register),
                free_register_pool: free_register_pool.clone(),
            }),
        };
        let resume_kind = fixed(Register::RESUME_KIND);
        let this_value = fixed(Register::THIS_VALUE);

        Self {
            name: name.into(),
            body_kind,
            strict: options.strict,
            options: *options,
            basic_blocks: Vec::new(),
            current_block_index: Label(0),
            current_unwind_handler: None,
            next_register: Register::RESERVED_COUNT,
            resume_kind,
            this_value,
            free_register_pool,
            constants: Vec::new(),
            true_constant: None,
            false_constant: None,
            null_constant: None,
            undefined_constant: None,
            iterator_symbol_constant: None,
            int32_constants: FxHashMap::default(),
            string_constants: FxHashMap::default(),
            string_table: Vec::new(),
            string_table_index: FxHashMap::default(),
            identifier_table: Vec::new(),
            identifier_table_index: FxHashMap::default(),
            boundaries: Vec::new(),
            continuable_scopes: Vec::new(),
            breakable_scopes: Vec::new(),
            pending_labels: Vec::new(),
            finally_contexts: Vec::new(),
            current_finally_context: None,
            index,
            next_point: 0,
            next_region: 0,
            region_stack: Vec::new(),
            current_source: SourceMapEntry::default(),
            local_count: u32_from_usize(local_names.len()),
            local_names,
            parameter_count,
        }
    }

    // --- Function kind queries ---

    pub fn is_resumable(&self) -> bool {
        self.body_kind.is_resumable()
    }

    // --- Register management ---

    /// Allocate a new register (or reuse a freed one).
    /// Always picks the lowest-numbered free register so allocation does
    /// not depend on operand drop order.
    pub fn allocate_register(&mut self) -> ScopedOperand {
        let reused = {
            let mut pool = self.free_register_pool.borrow_mut();
            let lowest = pool.iter().enumerate().min_by_key(|(_, r)| r.0).map(|(i, _)| i);
            lowest.map(|i| pool.swap_remove(i))
        };
        let register = reused.unwrap_or_else(|| {
            let register = Register(self.next_register);
            self.next_register += 1;
            register
        });
        self.scoped_operand(Operand::register(register))
    }

    pub fn local(&mut self, index: u32) -> ScopedOperand {
        self.scoped_operand(Operand::local(index))
    }

    /// Resolve a local binding (argument or variable) to a ScopedOperand.
    pub fn resolve_local(&mut self, index: u32, local_type: LocalType) -> ScopedOperand {
        match local_type {
            LocalType::Argument => self.scoped_operand(Operand::argument(index)),
            LocalType::Variable => self.local(index),
        }
    }

    pub fn this_value(&self) -> ScopedOperand {
        self.this_value.clone()
    }

    /// The register `ResumeGenerator` writes the resumption kind into.
    pub fn resume_kind(&self) -> ScopedOperand {
        self.resume_kind.clone()
    }

    /// Copy a local into a fresh register so later side effects cannot
    /// change the value. Returns the operand unchanged if it is not a local.
    pub fn copy_if_needed_to_preserve_evaluation_order(
        &mut self,
        operand: &ScopedOperand,
    ) -> ScopedOperand {
        if operand.operand().is_local() || operand.operand().is_argument() {
            let register = self.allocate_register();
            self.emit_mov(&register, operand);
            register
        } else {
            operand.clone()
        }
    }

    pub fn scoped_operand(&mut self, operand: Operand) -> ScopedOperand {
        ScopedOperand {
            inner: Rc::new(ScopedOperandInner {
                operand,
                free_register_pool: self.free_register_pool.clone(),
            }),
        }
    }

    // --- Constant pool ---

    fn append_constant(&mut self, value: ConstantValue) -> ScopedOperand {
        let index = u32_from_usize(self.constants.len());
        self.constants.push(value);
        self.scoped_operand(Operand::constant(index))
    }

    pub fn add_constant_number(&mut self, value: f64) -> ScopedOperand {
        // Deduplicate i32 values (but not -0.0, which is distinct from +0.0)
        if value.fract() == 0.0
            && value >= i32::MIN as f64
            && value <= i32::MAX as f64
            && value.to_bits() != (-0.0_f64).to_bits()
        {
            let as_i32 = value as i32;
            if let Some(op) = self.int32_constants.get(&as_i32) {
                return op.clone();
            }
            let op = self.append_constant(ConstantValue::Number(value));
            self.int32_constants.insert(as_i32, op.clone());
            return op;
        }
        self.append_constant(ConstantValue::Number(value))
    }

    pub fn add_constant_i32(&mut self, value: i32) -> ScopedOperand {
        self.add_constant_number(value as f64)
    }

    pub fn add_constant_boolean(&mut self, value: bool) -> ScopedOperand {
        if value {
            singleton_constant!(self, true_constant, ConstantValue::Boolean(true))
        } else {
            singleton_constant!(self, false_constant, ConstantValue::Boolean(false))
        }
    }

    pub fn add_constant_null(&mut self) -> ScopedOperand {
        singleton_constant!(self, null_constant, ConstantValue::Null)
    }

    pub fn add_constant_undefined(&mut self) -> ScopedOperand {
        singleton_constant!(self, undefined_constant, ConstantValue::Undefined)
    }

    pub fn add_constant_iterator_symbol(&mut self) -> ScopedOperand {
        singleton_constant!(
            self,
            iterator_symbol_constant,
            ConstantValue::Symbol(WellKnownSymbol::Iterator)
        )
    }

    pub fn add_constant_string(&mut self, value: &str) -> ScopedOperand {
        if let Some(op) = self.string_constants.get(value) {
            return op.clone();
        }
        let op = self.append_constant(ConstantValue::String(value.to_string()));
        self.string_constants.insert(value.to_string(), op.clone());
        op
    }

    pub fn add_constant_bigint(&mut self, digits: &str) -> ScopedOperand {
        self.append_constant(ConstantValue::BigInt(digits.to_string()))
    }

    pub fn get_constant(&self, operand: &ScopedOperand) -> Option<&ConstantValue> {
        let operand = operand.operand();
        if operand.is_constant() { self.constants.get(operand.index() as usize) } else { None }
    }

    // --- Tables ---

    define_intern_method!(intern_string, StringTableIndex, string_table, string_table_index);
    define_intern_method!(
        intern_identifier,
        IdentifierTableIndex,
        identifier_table,
        identifier_table_index
    );

    // --- Basic block management ---

    /// Create a new basic block and return its label. The block inherits
    /// the active exception handler.
    pub fn make_block(&mut self) -> Label {
        let index = u32_from_usize(self.basic_blocks.len());
        let mut block = BasicBlock::new(index);
        block.handler = self.current_unwind_handler;
        self.basic_blocks.push(block);
        Label(index)
    }

    pub fn switch_to_basic_block(&mut self, label: Label) {
        self.current_block_index = label;
    }

    pub fn current_block_index(&self) -> Label {
        self.current_block_index
    }

    pub fn is_current_block_terminated(&self) -> bool {
        self.basic_blocks[self.current_block_index.basic_block_index()].terminated
    }

    pub fn set_source_range(&mut self, start: u32, end: u32) {
        self.current_source = SourceMapEntry { source_start: start, source_end: end };
    }

    // --- Instruction emission ---

    /// Emit an instruction to the current basic block. Emitting into a
    /// terminated block is a no-op (the code is unreachable).
    pub fn emit(&mut self, instruction: Instruction) {
        if self.is_current_block_terminated() {
            return;
        }
        let source_map = self.current_source;
        let index = self.current_block_index.basic_block_index();
        self.basic_blocks[index].append(instruction, source_map);
    }

    /// Emit a Mov instruction (skipped if src == dst).
    pub fn emit_mov(&mut self, dst: &ScopedOperand, src: &ScopedOperand) {
        if dst != src {
            self.emit(Instruction::Mov { dst: dst.operand(), src: src.operand() });
        }
    }

    /// Emit a conditional jump, with constant folding and comparison fusion.
    pub fn emit_jump_if(
        &mut self,
        condition: &ScopedOperand,
        true_target: Label,
        false_target: Label,
    ) {
        if let Some(constant) = self.get_constant(condition)
            && let Some(is_truthy) = constant_to_boolean(constant)
        {
            self.emit(Instruction::Jump {
                target: if is_truthy { true_target } else { false_target },
            });
            return;
        }

        // If the condition is a register nobody else holds and the last
        // instruction is the comparison that produced it, fuse the two.
        if condition.operand().is_register()
            && Rc::strong_count(&condition.inner) == 1
            && !self.is_current_block_terminated()
        {
            let block = &mut self.basic_blocks[self.current_block_index.basic_block_index()];
            if let Some((last_instruction, _)) = block.instructions.last() {
                let fused =
                    fuse_comparison(
                        last_instruction,
                        condition.operand(),
                        true_target,
                        false_target,
                    );
                if let Some(fused_instruction) = fused {
                    block.instructions.pop();
                    self.emit(fused_instruction);
                    return;
                }
            }
        }

        self.emit(Instruction::JumpIf {
            condition: condition.operand(),
            true_target,
            false_target,
        });
    }

    /// Emit `JumpStrictlyEquals value, constant` for a small integer tag.
    pub fn emit_jump_if_equals_i32(
        &mut self,
        value: &ScopedOperand,
        tag: i32,
        true_target: Label,
        false_target: Label,
    ) {
        let tag = self.add_constant_i32(tag);
        self.emit(Instruction::JumpStrictlyEquals {
            lhs: value.operand(),
            rhs: tag.operand(),
            true_target,
            false_target,
        });
    }

    /// `throw new TypeError(message)`.
    pub fn emit_throw_type_error(&mut self, message: &str) {
        let error = self.allocate_register();
        let error_string = self.intern_string(message);
        self.emit(Instruction::NewTypeError { dst: error.operand(), error_string });
        self.emit(Instruction::Throw { src: error.operand() });
    }

    // --- Boundary management ---

    pub fn start_boundary(&mut self, ty: BlockBoundaryType) {
        self.boundaries.push(ty);
    }

    pub fn end_boundary(&mut self, ty: BlockBoundaryType) {
        debug_assert_eq!(self.boundaries.last(), Some(&ty));
        self.boundaries.pop();
    }

    // --- Break/continue scope management ---

    pub fn begin_breakable_scope(&mut self, target: Label, label_set: Vec<String>) {
        self.breakable_scopes.push(LabelableScope { target, language_label_set: label_set });
        self.start_boundary(BlockBoundaryType::Break);
    }

    pub fn end_breakable_scope(&mut self) {
        self.end_boundary(BlockBoundaryType::Break);
        self.breakable_scopes.pop();
    }

    pub fn begin_continuable_scope(&mut self, target: Label, label_set: Vec<String>) {
        self.continuable_scopes.push(LabelableScope { target, language_label_set: label_set });
        self.start_boundary(BlockBoundaryType::Continue);
    }

    pub fn end_continuable_scope(&mut self) {
        self.end_boundary(BlockBoundaryType::Continue);
        self.continuable_scopes.pop();
    }

    pub fn find_breakable_scope(&self, label: Option<&str>) -> Option<&LabelableScope> {
        match label {
            Some(label) => self
                .breakable_scopes
                .iter()
                .rev()
                .find(|s| s.language_label_set.iter().any(|l| l == label)),
            None => self.breakable_scopes.last(),
        }
    }

    pub fn find_continuable_scope(&self, label: Option<&str>) -> Option<&LabelableScope> {
        match label {
            Some(label) => {
                self.continuable_scopes
                    .iter()
                    .rev()
                    .find(|s| s.language_label_set.iter().any(|l| l == label))
            }
            None => self.continuable_scopes.last(),
        }
    }

    // --- FinallyContext support ---

    /// Push a new FinallyContext and make it current. Returns its index.
    pub fn push_finally_context(&mut self, context: FinallyContext) -> usize {
        let index = self.finally_contexts.len();
        self.finally_contexts.push(context);
        self.current_finally_context = Some(index);
        index
    }

    /// Make the parent of the current FinallyContext current again.
    pub fn pop_finally_context(&mut self) -> Option<usize> {
        let index = self.current_finally_context?;
        self.current_finally_context = self.finally_contexts[index].parent_index;
        Some(index)
    }

    /// Is there an outer ReturnToFinally boundary between `boundary_index`
    /// and the matching break/continue boundary?
    fn has_outer_finally_before_target(&self, is_break: bool, boundary_index: usize) -> bool {
        for j in (0..boundary_index.saturating_sub(1)).rev() {
            let inner = self.boundaries[j];
            if (is_break && inner == BlockBoundaryType::Break)
                || (!is_break && inner == BlockBoundaryType::Continue)
            {
                return false;
            }
            if inner == BlockBoundaryType::ReturnToFinally {
                return true;
            }
        }
        false
    }

    /// Register a jump target with the current FinallyContext: give it a
    /// completion_type index, set it and jump to the cleanup body.
    pub fn register_jump_in_finally_context(&mut self, target: Label) {
        let Some(index) = self.current_finally_context else {
            self.emit(Instruction::Jump { target });
            return;
        };
        let context = &mut self.finally_contexts[index];
        let jump_index = context.next_jump_index;
        context.next_jump_index += 1;
        context.registered_jumps.push(FinallyJump { index: jump_index, target });
        let completion_type = context.completion_type.clone();
        let finally_body = context.finally_body;
        let index_constant = self.add_constant_i32(jump_index);
        self.emit_mov(&completion_type, &index_constant);
        self.emit(Instruction::Jump { target: finally_body });
    }

    /// For break/continue through nested finally: route through a
    /// trampoline block that the inner cleanup jumps to.
    fn emit_trampoline_through_finally(&mut self) {
        let trampoline_block = self.make_block();
        self.register_jump_in_finally_context(trampoline_block);
        self.switch_to_basic_block(trampoline_block);
        self.pop_finally_context();
    }

    pub fn generate_break(&mut self, label: Option<&str>) -> Result<(), CompileError> {
        self.generate_jump(true, label)
    }

    pub fn generate_continue(&mut self, label: Option<&str>) -> Result<(), CompileError> {
        self.generate_jump(false, label)
    }

    fn generate_jump(&mut self, is_break: bool, label: Option<&str>) -> Result<(), CompileError> {
        let found = if is_break {
            self.find_breakable_scope(label)
        } else {
            self.find_continuable_scope(label)
        };
        if found.is_none() {
            return Err(match label {
                Some(label) => CompileError::UnknownJumpLabel {
                    function: self.name.clone(),
                    label: label.to_string(),
                },
                None => CompileError::Unsupported {
                    function: self.name.clone(),
                    construct: if is_break {
                        "`break` outside of a loop"
                    } else {
                        "`continue` outside of a loop"
                    },
                },
            });
        }
        let saved_context = self.current_finally_context;
        match label {
            Some(label) => self.generate_labelled_jump(is_break, label),
            None => self.generate_scoped_jump(is_break),
        }
        self.current_finally_context = saved_context;
        Ok(())
    }

    fn innermost_jump_target(&self, is_break: bool) -> Option<Label> {
        let scopes = if is_break { &self.breakable_scopes } else { &self.continuable_scopes };
        scopes.last().map(|scope| scope.target)
    }

    /// Walk boundaries for unlabelled break/continue.
    fn generate_scoped_jump(&mut self, is_break: bool) {
        let mut i = self.boundaries.len();
        while i > 0 {
            i -= 1;
            match self.boundaries[i] {
                BlockBoundaryType::Break if is_break => break,
                BlockBoundaryType::Continue if !is_break => break,
                BlockBoundaryType::ReturnToFinally => {
                    if !self.has_outer_finally_before_target(is_break, i + 1) {
                        if let Some(target) = self.innermost_jump_target(is_break) {
                            self.register_jump_in_finally_context(target);
                        }
                        return;
                    }
                    self.emit_trampoline_through_finally();
                }
                _ => {}
            }
        }
        if let Some(target) = self.innermost_jump_target(is_break) {
            self.emit(Instruction::Jump { target });
        }
    }

    /// Walk boundaries for labelled break/continue.
    fn generate_labelled_jump(&mut self, is_break: bool, label: &str) {
        let scopes = if is_break { &self.breakable_scopes } else { &self.continuable_scopes };
        let jumpable_scopes: Vec<(Label, bool)> = scopes
            .iter()
            .rev()
            .map(|s| (s.target, s.language_label_set.iter().any(|l| l == label)))
            .collect();

        let mut current_boundary = self.boundaries.len();
        for (target, matches_label) in jumpable_scopes {
            while current_boundary > 0 {
                current_boundary -= 1;
                match self.boundaries[current_boundary] {
                    BlockBoundaryType::ReturnToFinally => {
                        if matches_label
                            && !self.has_outer_finally_before_target(is_break, current_boundary + 1)
                        {
                            self.register_jump_in_finally_context(target);
                            return;
                        }
                        self.emit_trampoline_through_finally();
                    }
                    BlockBoundaryType::Break if is_break => break,
                    BlockBoundaryType::Continue if !is_break => break,
                    _ => {}
                }
            }
            if matches_label {
                self.emit(Instruction::Jump { target });
                return;
            }
        }
    }

    /// Generate a return, routing through the innermost FinallyContext
    /// (finally blocks and iterator closes run innermost-first).
    pub fn generate_return(&mut self, value: &ScopedOperand) {
        if let Some(index) = self.current_finally_context {
            let context = &self.finally_contexts[index];
            let completion_value = context.completion_value.clone();
            let completion_type = context.completion_type.clone();
            let finally_body = context.finally_body;
            self.emit_mov(&completion_value, value);
            let return_constant = self.add_constant_i32(FinallyContext::RETURN);
            self.emit_mov(&completion_type, &return_constant);
            self.emit(Instruction::Jump { target: finally_body });
        } else {
            self.emit(Instruction::Return { value: value.operand() });
        }
    }

    /// Continue after a cleanup body according to the context's completion
    /// type: fall through to `normal_target`, take a registered break or
    /// continue, return (through the enclosing context, if any) or rethrow.
    /// The context must already be popped.
    pub fn emit_completion_dispatch(&mut self, context_index: usize, normal_target: Label) {
        let context = &self.finally_contexts[context_index];
        let completion_type = context.completion_type.clone();
        let completion_value = context.completion_value.clone();
        let jumps: Vec<(i32, Label)> =
            context.registered_jumps.iter().map(|jump| (jump.index, jump.target)).collect();

        let dispatch = |ctx: &mut Self, tag: i32, target: Label| {
            let next = ctx.make_block();
            ctx.emit_jump_if_equals_i32(&completion_type, tag, target, next);
            ctx.switch_to_basic_block(next);
        };
        dispatch(self, FinallyContext::NORMAL, normal_target);
        for (index, target) in jumps {
            dispatch(self, index, target);
        }

        let return_block = self.make_block();
        let throw_block = self.make_block();
        self.emit_jump_if_equals_i32(
            &completion_type,
            FinallyContext::RETURN,
            return_block,
            throw_block,
        );

        self.switch_to_basic_block(return_block);
        self.generate_return(&completion_value);

        self.switch_to_basic_block(throw_block);
        self.emit(Instruction::Throw { src: completion_value.operand() });
    }

    // --- Try regions and suspension points ---

    /// Enter a try region. Regions are created in the same order the
    /// indexer discovered them; any divergence is a compiler bug.
    pub fn enter_try_region(&mut self, kind: TryRegionKind) -> Result<TryRegionId, CompileError> {
        let id = TryRegionId(u32_from_usize(self.next_region));
        let parent = self.region_stack.last().copied();
        let matches = self
            .index
            .try_regions
            .get(self.next_region)
            .is_some_and(|expected| expected.kind == kind && expected.parent == parent);
        if !matches {
            let mut found = self.region_stack.clone();
            found.push(id);
            return Err(CompileError::InconsistentTryRegions {
                function: self.name.clone(),
                index: u32_from_usize(self.next_point),
                expected: self.index.region_chain(id),
                found,
            });
        }
        self.next_region += 1;
        self.region_stack.push(id);
        Ok(id)
    }

    pub fn exit_try_region(&mut self, id: TryRegionId) {
        debug_assert_eq!(self.region_stack.last(), Some(&id));
        self.region_stack.pop();
    }

    /// Claim the next suspension point, checking it against the index, and
    /// make sure the suspension is emitted into an open block.
    pub fn begin_suspension(&mut self, kind: SuspensionKind) -> Result<u32, CompileError> {
        let index = u32_from_usize(self.next_point);
        let Some(point) = self.index.points.get(self.next_point) else {
            return Err(CompileError::SuspensionMismatch {
                function: self.name.clone(),
                index,
                expected: None,
                found: kind,
            });
        };
        if point.kind != kind {
            return Err(CompileError::SuspensionMismatch {
                function: self.name.clone(),
                index,
                expected: Some(point.kind),
                found: kind,
            });
        }
        if point.enclosing_try_regions != self.region_stack {
            return Err(CompileError::InconsistentTryRegions {
                function: self.name.clone(),
                index,
                expected: point.enclosing_try_regions.clone(),
                found: self.region_stack.clone(),
            });
        }
        self.next_point += 1;
        // Unreachable suspensions still get their suspend/resume pair.
        if self.is_current_block_terminated() {
            let dead_block = self.make_block();
            self.switch_to_basic_block(dead_block);
        }
        Ok(index)
    }

    pub fn record_resume_target(&mut self, index: u32, target: Label) -> Result<(), CompileError> {
        let name = self.name.clone();
        let point = self
            .index
            .points
            .get_mut(index as usize)
            .ok_or(CompileError::MissingResumeTarget { function: name.clone(), index })?;
        if point.resume_target.replace(target).is_some() {
            return Err(CompileError::DuplicateSuspensionPoint { function: name, index });
        }
        Ok(())
    }

    /// Every block gets a terminator; anything left open is unreachable
    /// or falls off the end of the body.
    pub fn terminate_unterminated_blocks(&mut self) {
        for i in 0..self.basic_blocks.len() {
            let label = Label(u32_from_usize(i));
            if self.basic_blocks[i].terminated {
                continue;
            }
            self.switch_to_basic_block(label);
            let undefined = self.add_constant_undefined();
            self.emit(Instruction::Return { value: undefined.operand() });
        }
    }

    /// Package the lowered body as a `Function`.
    pub fn finish(
        mut self,
        kind: FunctionKind,
        start_resume_target: Option<Label>,
    ) -> Result<Function, CompileError> {
        self.terminate_unterminated_blocks();

        if self.next_point < self.index.points.len() {
            return Err(CompileError::MissingResumeTarget {
                function: self.name,
                index: u32_from_usize(self.next_point),
            });
        }
        let points: Vec<SuspensionPoint> = std::mem::take(&mut self.index.points);
        if let Some(point) = points.iter().find(|point| point.resume_target.is_none()) {
            return Err(CompileError::MissingResumeTarget {
                function: self.name,
                index: point.index,
            });
        }
        let try_regions: Vec<TryRegion> = std::mem::take(&mut self.index.try_regions);

        Ok(Function {
            name: self.name,
            kind,
            is_strict: self.strict,
            blocks: self.basic_blocks,
            constants: self.constants,
            string_table: self.string_table,
            identifier_table: self.identifier_table,
            register_count: self.next_register,
            local_count: self.local_count,
            parameter_count: self.parameter_count,
            local_names: self.local_names,
            suspension_points: points,
            try_regions,
            start_resume_target,
            merge_headers: Vec::new(),
        })
    }
}

fn fuse_comparison(
    last: &Instruction,
    condition: Operand,
    true_target: Label,
    false_target: Label,
) -> Option<Instruction> {
    let fused = match *last {
        Instruction::LessThan { dst, lhs, rhs } if dst == condition => {
            Instruction::JumpLessThan { lhs, rhs, true_target, false_target }
        }
        Instruction::LessThanEquals { dst, lhs, rhs } if dst == condition => {
            Instruction::JumpLessThanEquals { lhs, rhs, true_target, false_target }
        }
        Instruction::GreaterThan { dst, lhs, rhs } if dst == condition => {
            Instruction::JumpGreaterThan { lhs, rhs, true_target, false_target }
        }
        Instruction::GreaterThanEquals { dst, lhs, rhs } if dst == condition => {
            Instruction::JumpGreaterThanEquals { lhs, rhs, true_target, false_target }
        }
        Instruction::LooselyEquals { dst, lhs, rhs } if dst == condition => {
            Instruction::JumpLooselyEquals { lhs, rhs, true_target, false_target }
        }
        Instruction::LooselyInequals { dst, lhs, rhs } if dst == condition => {
            Instruction::JumpLooselyInequals { lhs, rhs, true_target, false_target }
        }
        Instruction::StrictlyEquals { dst, lhs, rhs } if dst == condition => {
            Instruction::JumpStrictlyEquals { lhs, rhs, true_target, false_target }
        }
        Instruction::StrictlyInequals { dst, lhs, rhs } if dst == condition => {
            Instruction::JumpStrictlyInequals { lhs, rhs, true_target, false_target }
        }
        _ => return None,
    };
    Some(fused)
}

/// Use `preferred_dst` if available, otherwise allocate a fresh register.
pub fn choose_dst(
    ctx: &mut LoweringContext,
    preferred_dst: Option<&ScopedOperand>,
) -> ScopedOperand {
    match preferred_dst {
        Some(dst) => dst.clone(),
        None => ctx.allocate_register(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> LoweringContext {
        LoweringContext::new(
            "test",
            BodyKind::Generator,
            SuspensionIndex::default(),
            Vec::new(),
            0,
            &LoweringOptions::default(),
        )
    }

    #[test]
    fn registers_are_recycled_lowest_first() {
        let mut ctx = context();
        let a = ctx.allocate_register();
        let b = ctx.allocate_register();
        let c = ctx.allocate_register();
        assert_eq!(a.operand(), Operand::register(Register(Register::RESERVED_COUNT)));
        drop(c);
        drop(a);
        let reused = ctx.allocate_register();
        assert_eq!(reused.operand(), Operand::register(Register(Register::RESERVED_COUNT)));
        assert_ne!(reused.operand(), b.operand());
    }

    #[test]
    fn constants_and_tables_are_deduplicated() {
        let mut ctx = context();
        let one = ctx.add_constant_number(1.0);
        assert_eq!(ctx.add_constant_number(1.0).operand(), one.operand());
        let negative_zero = ctx.add_constant_number(-0.0);
        assert_ne!(negative_zero.operand(), ctx.add_constant_number(0.0).operand());
        assert_eq!(ctx.add_constant_undefined().operand(), ctx.add_constant_undefined().operand());
        assert_eq!(ctx.intern_identifier("next"), ctx.intern_identifier("next"));
        assert_ne!(ctx.intern_identifier("next"), ctx.intern_identifier("done"));
    }

    #[test]
    fn comparisons_fuse_into_conditional_jumps() {
        let mut ctx = context();
        let entry = ctx.make_block();
        let yes = ctx.make_block();
        let no = ctx.make_block();
        ctx.switch_to_basic_block(entry);
        let condition = ctx.allocate_register();
        ctx.emit(Instruction::LessThan {
            dst: condition.operand(),
            lhs: Operand::local(0),
            rhs: Operand::local(1),
        });
        ctx.emit_jump_if(&condition, yes, no);
        let block = &ctx.basic_blocks[0];
        assert_eq!(block.instructions.len(), 1);
        assert!(matches!(block.terminator(), Some(Instruction::JumpLessThan { .. })));
    }

    #[test]
    fn constant_conditions_fold_to_jumps() {
        let mut ctx = context();
        let entry = ctx.make_block();
        let yes = ctx.make_block();
        let no = ctx.make_block();
        ctx.switch_to_basic_block(entry);
        let condition = ctx.add_constant_boolean(false);
        ctx.emit_jump_if(&condition, yes, no);
        assert_eq!(ctx.basic_blocks[0].terminator(), Some(&Instruction::Jump { target: no }));
    }

    #[test]
    fn suspension_without_index_entry_is_a_mismatch() {
        let mut ctx = context();
        let error = ctx.begin_suspension(SuspensionKind::Yield).unwrap_err();
        assert!(matches!(error, CompileError::SuspensionMismatch { expected: None, .. }));
    }
}
