/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! AST types consumed by the lowering.
//!
//! This is the subset of the JavaScript AST that generator and async
//! function bodies are lowered from. Every node carries a `SourceRange`
//! for source maps.
//!
//! ## Design
//!
//! - `ExpressionKind` and `StatementKind` are flat enums; pattern matching
//!   replaces virtual dispatch.
//! - `Node<T>` wraps every AST node with source location info.
//! - `Identifier` uses `Cell` fields for scope resolution results, which
//!   are written after construction (by `scope::resolve_function`) through
//!   shared references.
//! - Operator enums use `#[repr(u8)]` with stable values.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceRange {
    pub start: Position,
    pub end: Position,
}

// =============================================================================
// Node wrapper
// =============================================================================

/// Every AST node wraps its payload with source location.
#[derive(Clone, Debug)]
pub struct Node<T> {
    pub range: SourceRange,
    pub inner: T,
}

pub type Expression = Node<ExpressionKind>;

pub type Statement = Node<StatementKind>;

impl<T> Node<T> {
    pub fn new(range: SourceRange, inner: T) -> Self {
        Self { range, inner }
    }
}

// =============================================================================
// Operator enums
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BinaryOp {
    Addition = 0,
    Subtraction = 1,
    Multiplication = 2,
    Division = 3,
    Modulo = 4,
    StrictlyEquals = 6,
    StrictlyInequals = 7,
    LooselyEquals = 8,
    LooselyInequals = 9,
    GreaterThan = 10,
    GreaterThanEquals = 11,
    LessThan = 12,
    LessThanEquals = 13,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LogicalOp {
    And = 0,
    Or = 1,
    NullishCoalescing = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum UnaryOp {
    Not = 1,
    Plus = 2,
    Minus = 3,
    Typeof = 4,
    Void = 5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum UpdateOp {
    Increment = 0,
    Decrement = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AssignmentOp {
    Assignment = 0,
    AdditionAssignment = 1,
    SubtractionAssignment = 2,
    MultiplicationAssignment = 3,
}

// =============================================================================
// Kind enums
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DeclarationKind {
    Var = 1,
    Let = 2,
    Const = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FunctionKind {
    Normal = 0,
    Generator = 1,
    Async = 2,
    AsyncGenerator = 3,
}

impl FunctionKind {
    pub fn from_async_generator(is_async: bool, is_generator: bool) -> Self {
        match (is_async, is_generator) {
            (true, true) => Self::AsyncGenerator,
            (true, false) => Self::Async,
            (false, true) => Self::Generator,
            (false, false) => Self::Normal,
        }
    }
}

// =============================================================================
// Identifier
// =============================================================================

/// Scope resolution result: how this identifier is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalType {
    Argument,
    Variable,
}

/// An identifier reference or binding name.
#[derive(Clone, Debug)]
pub struct Identifier {
    pub range: SourceRange,
    pub name: String,
    // Scope resolution results, set by `scope::resolve_function`.
    pub local_type: Cell<Option<LocalType>>,
    pub local_index: Cell<u32>,
    pub is_global: Cell<bool>,
    pub declaration_kind: Cell<Option<DeclarationKind>>,
}

impl Identifier {
    pub fn new(range: SourceRange, name: impl Into<String>) -> Self {
        Self {
            range,
            name: name.into(),
            local_type: Cell::new(None),
            local_index: Cell::new(0),
            is_global: Cell::new(false),
            declaration_kind: Cell::new(None),
        }
    }

    pub fn is_local(&self) -> bool {
        self.local_type.get().is_some()
    }
}

// =============================================================================
// Function support types
// =============================================================================

#[derive(Clone, Debug)]
pub struct FunctionParameter {
    pub binding: Rc<Identifier>,
    pub default_value: Option<Expression>,
}

/// A function declaration as handed to the lowering.
#[derive(Debug)]
pub struct FunctionData {
    pub name: String,
    pub range: SourceRange,
    pub parameters: Vec<FunctionParameter>,
    pub body: Vec<Statement>,
    pub kind: FunctionKind,
    pub is_strict_mode: bool,
    /// Names of the local variable slots, filled in by scope resolution.
    pub local_variables: RefCell<Vec<String>>,
}

// =============================================================================
// Binding patterns
// =============================================================================

#[derive(Clone, Debug)]
pub struct BindingPattern {
    pub kind: BindingPatternKind,
    pub entries: Vec<BindingEntry>,
}

impl BindingPattern {
    pub fn contains_expression(&self) -> bool {
        self.entries.iter().any(|entry| {
            matches!(entry.name, Some(BindingEntryName::Expression(_)))
                || entry.initializer.is_some()
                || match &entry.alias {
                    Some(BindingEntryAlias::BindingPattern(nested)) => nested.contains_expression(),
                    _ => false,
                }
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingPatternKind {
    Array,
    Object,
}

#[derive(Clone, Debug)]
pub struct BindingEntry {
    pub name: Option<BindingEntryName>,
    pub alias: Option<BindingEntryAlias>,
    pub initializer: Option<Expression>,
    pub is_rest: bool,
}

/// The "name" part of a binding entry.
/// - `None`: elision in array patterns (`[, , x]`), or an array element
///   whose target is given by `alias`
/// - `Identifier`: simple binding, or object property shorthand (`{ x }`)
/// - `Expression`: computed property key (`{ [expression]: x }`)
#[derive(Clone, Debug)]
pub enum BindingEntryName {
    Identifier(Rc<Identifier>),
    Expression(Box<Expression>),
}

/// The "alias" (target) of a binding entry.
/// - `None`: name is the binding target (`{ x }`, or `[x]`)
/// - `Identifier`: renamed binding (`{ x: y }`)
/// - `BindingPattern`: nested destructuring (`{ x: { a, b } }`, `[[a, b]]`)
/// - `MemberExpression`: assignment target (`[obj.property] = ...`)
#[derive(Clone, Debug)]
pub enum BindingEntryAlias {
    Identifier(Rc<Identifier>),
    BindingPattern(Box<BindingPattern>),
    MemberExpression(Box<Expression>),
}

// =============================================================================
// Variable declaration types
// =============================================================================

#[derive(Clone, Debug)]
pub struct VariableDeclarator {
    pub range: SourceRange,
    pub target: VariableDeclaratorTarget,
    pub init: Option<Expression>,
}

#[derive(Clone, Debug)]
pub enum VariableDeclaratorTarget {
    Identifier(Rc<Identifier>),
    BindingPattern(BindingPattern),
}

// =============================================================================
// Object literal and call types
// =============================================================================

#[derive(Clone, Debug)]
pub enum PropertyKey {
    Static(String),
    Computed(Box<Expression>),
}

#[derive(Clone, Debug)]
pub struct ObjectProperty {
    pub range: SourceRange,
    pub key: PropertyKey,
    pub value: Expression,
}

#[derive(Clone, Debug)]
pub struct CallArgument {
    pub value: Expression,
    pub is_spread: bool,
}

#[derive(Clone, Debug)]
pub struct CallExpressionData {
    pub callee: Box<Expression>,
    pub arguments: Vec<CallArgument>,
}

// =============================================================================
// Statement support types
// =============================================================================

#[derive(Clone, Debug)]
pub struct TryStatementData {
    pub block: Box<Statement>,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Box<Statement>>,
}

#[derive(Clone, Debug)]
pub struct CatchClause {
    pub range: SourceRange,
    pub parameter: Option<CatchBinding>,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub enum CatchBinding {
    Identifier(Rc<Identifier>),
    BindingPattern(BindingPattern),
}

/// Init clause of a for loop: either a declaration or an expression.
#[derive(Clone, Debug)]
pub enum ForInit {
    Declaration(Box<Statement>),
    Expression(Box<Expression>),
}

/// Left-hand side of for-of.
#[derive(Clone, Debug)]
pub enum ForOfLhs {
    /// A variable declaration (`for (const x of ...)`)
    Declaration(Box<Statement>),
    /// An expression (`for (x of ...)`, `for (o.p of ...)`)
    Expression(Box<Expression>),
    /// A binding pattern (`for ([a, b] of ...)`)
    Pattern(BindingPattern),
}

#[derive(Clone, Debug)]
pub enum AssignmentLhs {
    Expression(Box<Expression>),
    Pattern(BindingPattern),
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Clone, Debug)]
pub enum ExpressionKind {
    NumericLiteral(f64),
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,
    BigIntLiteral(String),
    Identifier(Rc<Identifier>),
    This,

    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Update {
        op: UpdateOp,
        argument: Box<Expression>,
        prefixed: bool,
    },
    Assignment {
        op: AssignmentOp,
        lhs: AssignmentLhs,
        rhs: Box<Expression>,
    },
    Conditional {
        test: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
    },
    Sequence(Vec<Expression>),

    Member {
        object: Box<Expression>,
        property: Box<Expression>,
        computed: bool,
    },
    Call(CallExpressionData),
    Array(Vec<Option<Expression>>),
    Object(Vec<ObjectProperty>),
    Spread(Box<Expression>),

    Yield {
        argument: Option<Box<Expression>>,
        is_yield_from: bool,
    },
    Await(Box<Expression>),
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Clone, Debug)]
pub enum StatementKind {
    Empty,
    Expression(Box<Expression>),
    Block(Vec<Statement>),
    VariableDeclaration {
        kind: DeclarationKind,
        declarations: Vec<VariableDeclarator>,
    },
    If {
        test: Box<Expression>,
        consequent: Box<Statement>,
        alternate: Option<Box<Statement>>,
    },
    While {
        test: Box<Expression>,
        body: Box<Statement>,
    },
    DoWhile {
        test: Box<Expression>,
        body: Box<Statement>,
    },
    For {
        init: Option<ForInit>,
        test: Option<Box<Expression>>,
        update: Option<Box<Expression>>,
        body: Box<Statement>,
    },
    ForOf {
        lhs: ForOfLhs,
        rhs: Box<Expression>,
        body: Box<Statement>,
    },
    Labelled {
        label: String,
        item: Box<Statement>,
    },
    Break {
        target_label: Option<String>,
    },
    Continue {
        target_label: Option<String>,
    },
    Return(Option<Box<Expression>>),
    Throw(Box<Expression>),
    Try(TryStatementData),
}
