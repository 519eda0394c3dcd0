/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Terse AST constructors.
//!
//! The lowering receives ASTs from a parser that lives outside this crate;
//! these helpers build the same trees in-process (for embedders and tests).
//! All nodes get an empty source range.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::*;

fn expression(inner: ExpressionKind) -> Expression {
    Node::new(SourceRange::default(), inner)
}

fn statement(inner: StatementKind) -> Statement {
    Node::new(SourceRange::default(), inner)
}

pub fn identifier(name: &str) -> Rc<Identifier> {
    Rc::new(Identifier::new(SourceRange::default(), name))
}

// =============================================================================
// Functions
// =============================================================================

fn function_of_kind(
    kind: FunctionKind,
    name: &str,
    parameters: &[&str],
    body: Vec<Statement>,
) -> FunctionData {
    FunctionData {
        name: name.to_string(),
        range: SourceRange::default(),
        parameters: parameters.iter().map(|p| param(p)).collect(),
        body,
        kind,
        is_strict_mode: false,
        local_variables: RefCell::new(Vec::new()),
    }
}

pub fn function(name: &str, parameters: &[&str], body: Vec<Statement>) -> FunctionData {
    function_of_kind(FunctionKind::Normal, name, parameters, body)
}

pub fn generator(name: &str, parameters: &[&str], body: Vec<Statement>) -> FunctionData {
    function_of_kind(FunctionKind::Generator, name, parameters, body)
}

pub fn async_function(name: &str, parameters: &[&str], body: Vec<Statement>) -> FunctionData {
    function_of_kind(FunctionKind::Async, name, parameters, body)
}

pub fn param(name: &str) -> FunctionParameter {
    FunctionParameter { binding: identifier(name), default_value: None }
}

pub fn param_with_default(name: &str, default_value: Expression) -> FunctionParameter {
    FunctionParameter { binding: identifier(name), default_value: Some(default_value) }
}

// =============================================================================
// Literals and identifiers
// =============================================================================

pub fn num(value: f64) -> Expression {
    expression(ExpressionKind::NumericLiteral(value))
}

pub fn string(value: &str) -> Expression {
    expression(ExpressionKind::StringLiteral(value.to_string()))
}

pub fn boolean(value: bool) -> Expression {
    expression(ExpressionKind::BooleanLiteral(value))
}

pub fn null() -> Expression {
    expression(ExpressionKind::NullLiteral)
}

pub fn bigint(digits: &str) -> Expression {
    expression(ExpressionKind::BigIntLiteral(digits.to_string()))
}

/// `undefined` is an ordinary global identifier; the lowering folds it.
pub fn undefined() -> Expression {
    ident("undefined")
}

pub fn ident(name: &str) -> Expression {
    expression(ExpressionKind::Identifier(identifier(name)))
}

pub fn this() -> Expression {
    expression(ExpressionKind::This)
}

// =============================================================================
// Operators
// =============================================================================

pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
    expression(ExpressionKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
}

pub fn add(lhs: Expression, rhs: Expression) -> Expression {
    binary(BinaryOp::Addition, lhs, rhs)
}

pub fn sub(lhs: Expression, rhs: Expression) -> Expression {
    binary(BinaryOp::Subtraction, lhs, rhs)
}

pub fn less_than(lhs: Expression, rhs: Expression) -> Expression {
    binary(BinaryOp::LessThan, lhs, rhs)
}

pub fn strict_equals(lhs: Expression, rhs: Expression) -> Expression {
    binary(BinaryOp::StrictlyEquals, lhs, rhs)
}

pub fn logical(op: LogicalOp, lhs: Expression, rhs: Expression) -> Expression {
    expression(ExpressionKind::Logical { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
}

pub fn unary(op: UnaryOp, operand: Expression) -> Expression {
    expression(ExpressionKind::Unary { op, operand: Box::new(operand) })
}

pub fn not(operand: Expression) -> Expression {
    unary(UnaryOp::Not, operand)
}

pub fn typeof_(operand: Expression) -> Expression {
    unary(UnaryOp::Typeof, operand)
}

pub fn increment(argument: Expression, prefixed: bool) -> Expression {
    expression(ExpressionKind::Update {
        op: UpdateOp::Increment,
        argument: Box::new(argument),
        prefixed,
    })
}

pub fn decrement(argument: Expression, prefixed: bool) -> Expression {
    expression(ExpressionKind::Update {
        op: UpdateOp::Decrement,
        argument: Box::new(argument),
        prefixed,
    })
}

pub fn assign(target: Expression, value: Expression) -> Expression {
    assign_op(AssignmentOp::Assignment, target, value)
}

pub fn assign_op(op: AssignmentOp, target: Expression, value: Expression) -> Expression {
    expression(ExpressionKind::Assignment {
        op,
        lhs: AssignmentLhs::Expression(Box::new(target)),
        rhs: Box::new(value),
    })
}

pub fn assign_pattern(pattern: BindingPattern, value: Expression) -> Expression {
    expression(ExpressionKind::Assignment {
        op: AssignmentOp::Assignment,
        lhs: AssignmentLhs::Pattern(pattern),
        rhs: Box::new(value),
    })
}

pub fn conditional(test: Expression, consequent: Expression, alternate: Expression) -> Expression {
    expression(ExpressionKind::Conditional {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
    })
}

pub fn sequence(expressions: Vec<Expression>) -> Expression {
    expression(ExpressionKind::Sequence(expressions))
}

// =============================================================================
// Objects, arrays and calls
// =============================================================================

pub fn member(object: Expression, property: &str) -> Expression {
    expression(ExpressionKind::Member {
        object: Box::new(object),
        property: Box::new(string(property)),
        computed: false,
    })
}

pub fn computed_member(object: Expression, property: Expression) -> Expression {
    expression(ExpressionKind::Member {
        object: Box::new(object),
        property: Box::new(property),
        computed: true,
    })
}

pub fn call(callee: Expression, arguments: Vec<Expression>) -> Expression {
    expression(ExpressionKind::Call(CallExpressionData {
        callee: Box::new(callee),
        arguments: arguments.into_iter().map(argument).collect(),
    }))
}

/// Like `call`, but spread elements (`spread(...)`) become spread arguments.
fn argument(value: Expression) -> CallArgument {
    match value.inner {
        ExpressionKind::Spread(inner) => CallArgument { value: *inner, is_spread: true },
        inner => CallArgument { value: Node::new(value.range, inner), is_spread: false },
    }
}

pub fn method_call(object: Expression, method: &str, arguments: Vec<Expression>) -> Expression {
    call(member(object, method), arguments)
}

pub fn spread(value: Expression) -> Expression {
    expression(ExpressionKind::Spread(Box::new(value)))
}

pub fn array(elements: Vec<Expression>) -> Expression {
    expression(ExpressionKind::Array(elements.into_iter().map(Some).collect()))
}

pub fn array_with_holes(elements: Vec<Option<Expression>>) -> Expression {
    expression(ExpressionKind::Array(elements))
}

pub fn object(properties: Vec<(&str, Expression)>) -> Expression {
    expression(ExpressionKind::Object(
        properties
            .into_iter()
            .map(|(key, value)| ObjectProperty {
                range: SourceRange::default(),
                key: PropertyKey::Static(key.to_string()),
                value,
            })
            .collect(),
    ))
}

// =============================================================================
// Suspension
// =============================================================================

pub fn yield_(argument: Expression) -> Expression {
    expression(ExpressionKind::Yield { argument: Some(Box::new(argument)), is_yield_from: false })
}

pub fn yield_nothing() -> Expression {
    expression(ExpressionKind::Yield { argument: None, is_yield_from: false })
}

pub fn yield_star(argument: Expression) -> Expression {
    expression(ExpressionKind::Yield { argument: Some(Box::new(argument)), is_yield_from: true })
}

pub fn await_(argument: Expression) -> Expression {
    expression(ExpressionKind::Await(Box::new(argument)))
}

// =============================================================================
// Patterns
// =============================================================================

pub fn array_pattern(entries: Vec<BindingEntry>) -> BindingPattern {
    BindingPattern { kind: BindingPatternKind::Array, entries }
}

pub fn object_pattern(entries: Vec<BindingEntry>) -> BindingPattern {
    BindingPattern { kind: BindingPatternKind::Object, entries }
}

/// `x` in an array pattern, or `{ x }` in an object pattern.
pub fn bind(name: &str) -> BindingEntry {
    BindingEntry {
        name: Some(BindingEntryName::Identifier(identifier(name))),
        alias: None,
        initializer: None,
        is_rest: false,
    }
}

/// `x = default`.
pub fn bind_with_default(name: &str, default_value: Expression) -> BindingEntry {
    BindingEntry { initializer: Some(default_value), ..bind(name) }
}

/// `{ key: alias }`.
pub fn bind_renamed(key: &str, alias: &str) -> BindingEntry {
    BindingEntry { alias: Some(BindingEntryAlias::Identifier(identifier(alias))), ..bind(key) }
}

/// A nested pattern element in an array pattern (`[[a, b]]`).
pub fn bind_pattern(pattern: BindingPattern) -> BindingEntry {
    BindingEntry {
        name: None,
        alias: Some(BindingEntryAlias::BindingPattern(Box::new(pattern))),
        initializer: None,
        is_rest: false,
    }
}

/// A member-expression target in an assignment pattern (`[o.p] = ...`).
pub fn bind_member(target: Expression) -> BindingEntry {
    BindingEntry {
        name: None,
        alias: Some(BindingEntryAlias::MemberExpression(Box::new(target))),
        initializer: None,
        is_rest: false,
    }
}

/// `...rest`.
pub fn bind_rest(name: &str) -> BindingEntry {
    BindingEntry { is_rest: true, ..bind(name) }
}

/// An elision (`[, x]`).
pub fn hole() -> BindingEntry {
    BindingEntry { name: None, alias: None, initializer: None, is_rest: false }
}

// =============================================================================
// Statements
// =============================================================================

pub fn expr(expression: Expression) -> Statement {
    statement(StatementKind::Expression(Box::new(expression)))
}

pub fn empty() -> Statement {
    statement(StatementKind::Empty)
}

fn declaration(
    kind: DeclarationKind,
    target: VariableDeclaratorTarget,
    init: Option<Expression>,
) -> Statement {
    statement(StatementKind::VariableDeclaration {
        kind,
        declarations: vec![VariableDeclarator { range: SourceRange::default(), target, init }],
    })
}

pub fn var(name: &str, init: Expression) -> Statement {
    declaration(
        DeclarationKind::Var,
        VariableDeclaratorTarget::Identifier(identifier(name)),
        Some(init),
    )
}

pub fn let_(name: &str, init: Expression) -> Statement {
    declaration(
        DeclarationKind::Let,
        VariableDeclaratorTarget::Identifier(identifier(name)),
        Some(init),
    )
}

pub fn let_uninitialized(name: &str) -> Statement {
    declaration(DeclarationKind::Let, VariableDeclaratorTarget::Identifier(identifier(name)), None)
}

pub fn const_(name: &str, init: Expression) -> Statement {
    declaration(
        DeclarationKind::Const,
        VariableDeclaratorTarget::Identifier(identifier(name)),
        Some(init),
    )
}

pub fn const_pattern(pattern: BindingPattern, init: Expression) -> Statement {
    declaration(
        DeclarationKind::Const,
        VariableDeclaratorTarget::BindingPattern(pattern),
        Some(init),
    )
}

pub fn block(body: Vec<Statement>) -> Statement {
    statement(StatementKind::Block(body))
}

pub fn if_(test: Expression, consequent: Statement, alternate: Option<Statement>) -> Statement {
    statement(StatementKind::If {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: alternate.map(Box::new),
    })
}

pub fn while_(test: Expression, body: Statement) -> Statement {
    statement(StatementKind::While { test: Box::new(test), body: Box::new(body) })
}

pub fn do_while(body: Statement, test: Expression) -> Statement {
    statement(StatementKind::DoWhile { test: Box::new(test), body: Box::new(body) })
}

pub fn for_(
    init: Option<Statement>,
    test: Option<Expression>,
    update: Option<Expression>,
    body: Statement,
) -> Statement {
    statement(StatementKind::For {
        init: init.map(|init| match init.inner {
            StatementKind::Expression(expression) => ForInit::Expression(expression),
            _ => ForInit::Declaration(Box::new(init)),
        }),
        test: test.map(Box::new),
        update: update.map(Box::new),
        body: Box::new(body),
    })
}

/// `for (const name of rhs) body`.
pub fn for_of(name: &str, rhs: Expression, body: Statement) -> Statement {
    let declaration = declaration(
        DeclarationKind::Const,
        VariableDeclaratorTarget::Identifier(identifier(name)),
        None,
    );
    statement(StatementKind::ForOf {
        lhs: ForOfLhs::Declaration(Box::new(declaration)),
        rhs: Box::new(rhs),
        body: Box::new(body),
    })
}

/// `for (const [a, b] of rhs) body`.
pub fn for_of_pattern(pattern: BindingPattern, rhs: Expression, body: Statement) -> Statement {
    let declaration = declaration(
        DeclarationKind::Const,
        VariableDeclaratorTarget::BindingPattern(pattern),
        None,
    );
    statement(StatementKind::ForOf {
        lhs: ForOfLhs::Declaration(Box::new(declaration)),
        rhs: Box::new(rhs),
        body: Box::new(body),
    })
}

/// `for (target of rhs) body` with an existing assignment target.
pub fn for_of_target(target: Expression, rhs: Expression, body: Statement) -> Statement {
    statement(StatementKind::ForOf {
        lhs: ForOfLhs::Expression(Box::new(target)),
        rhs: Box::new(rhs),
        body: Box::new(body),
    })
}

pub fn labelled(label: &str, item: Statement) -> Statement {
    statement(StatementKind::Labelled { label: label.to_string(), item: Box::new(item) })
}

pub fn break_(target_label: Option<&str>) -> Statement {
    statement(StatementKind::Break { target_label: target_label.map(str::to_string) })
}

pub fn continue_(target_label: Option<&str>) -> Statement {
    statement(StatementKind::Continue { target_label: target_label.map(str::to_string) })
}

pub fn return_(value: Expression) -> Statement {
    statement(StatementKind::Return(Some(Box::new(value))))
}

pub fn return_nothing() -> Statement {
    statement(StatementKind::Return(None))
}

pub fn throw(value: Expression) -> Statement {
    statement(StatementKind::Throw(Box::new(value)))
}

fn try_statement(
    body: Vec<Statement>,
    handler: Option<CatchClause>,
    finalizer: Option<Vec<Statement>>,
) -> Statement {
    statement(StatementKind::Try(TryStatementData {
        block: Box::new(block(body)),
        handler,
        finalizer: finalizer.map(|f| Box::new(block(f))),
    }))
}

fn catch_clause(parameter: Option<&str>, body: Vec<Statement>) -> CatchClause {
    CatchClause {
        range: SourceRange::default(),
        parameter: parameter.map(|name| CatchBinding::Identifier(identifier(name))),
        body: Box::new(block(body)),
    }
}

pub fn try_catch(
    body: Vec<Statement>,
    parameter: Option<&str>,
    handler: Vec<Statement>,
) -> Statement {
    try_statement(body, Some(catch_clause(parameter, handler)), None)
}

pub fn try_finally(body: Vec<Statement>, finalizer: Vec<Statement>) -> Statement {
    try_statement(body, None, Some(finalizer))
}

pub fn try_catch_finally(
    body: Vec<Statement>,
    parameter: Option<&str>,
    handler: Vec<Statement>,
    finalizer: Vec<Statement>,
) -> Statement {
    try_statement(body, Some(catch_clause(parameter, handler)), Some(finalizer))
}
