/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Suspension point indexing.
//!
//! A read-only pre-order walk over a resolved function body that collects
//! every `yield`, `yield*` and `await` together with the try regions that
//! enclose it and the locals that must survive it. Code generation then
//! consumes this index in the same order, so the walk below visits children
//! in exactly the order `codegen` evaluates them.
//!
//! Live locals are computed conservatively: a local is live at a point if
//! it is visible there and referenced after it, or referenced anywhere in a
//! loop that encloses the point.

use std::rc::Rc;

use super::context::BodyKind;
use crate::ast::*;
use crate::ir::function::{
    IterationContext, SuspensionKind, SuspensionPoint, TryRegion, TryRegionId, TryRegionKind,
};
use crate::ir::operand::Operand;
use crate::scope::{
    collect_pattern_identifiers, collect_var_identifiers, lexically_declared_identifiers,
};
use crate::u32_from_usize;

/// The indexer's output for one function body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuspensionIndex {
    pub points: Vec<SuspensionPoint>,
    pub try_regions: Vec<TryRegion>,
}

impl SuspensionIndex {
    /// `id` and its ancestors, outermost first.
    pub fn region_chain(&self, id: TryRegionId) -> Vec<TryRegionId> {
        let mut chain = Vec::new();
        let mut current = self.try_regions.get(id.0 as usize);
        while let Some(region) = current {
            chain.push(region.id);
            current = region.parent.and_then(|parent| self.try_regions.get(parent.0 as usize));
        }
        chain.reverse();
        chain
    }
}

struct PendingPoint {
    kind: SuspensionKind,
    enclosing_try_regions: Vec<TryRegionId>,
    sequence: u32,
    visible: Vec<Operand>,
    loops: Vec<usize>,
}

struct LoopSpan {
    start: u32,
    end: u32,
}

struct Indexer {
    body_kind: BodyKind,
    points: Vec<PendingPoint>,
    try_regions: Vec<TryRegion>,
    region_stack: Vec<TryRegionId>,
    scopes: Vec<Vec<Operand>>,
    references: Vec<(u32, Operand)>,
    loops: Vec<LoopSpan>,
    loop_stack: Vec<usize>,
    sequence: u32,
}

/// Index the suspension points and try regions of a resolved function body.
pub fn index_function(function: &FunctionData, body_kind: BodyKind) -> SuspensionIndex {
    let mut indexer = Indexer {
        body_kind,
        points: Vec::new(),
        try_regions: Vec::new(),
        region_stack: Vec::new(),
        scopes: Vec::new(),
        references: Vec::new(),
        loops: Vec::new(),
        loop_stack: Vec::new(),
        sequence: 0,
    };

    let mut function_scope: Vec<Operand> = function
        .parameters
        .iter()
        .filter_map(|parameter| identifier_operand(&parameter.binding))
        .collect();
    let mut var_identifiers = Vec::new();
    for statement in &function.body {
        collect_var_identifiers(statement, &mut var_identifiers);
    }
    function_scope
        .extend(var_identifiers.iter().filter_map(|identifier| identifier_operand(identifier)));
    indexer.scopes.push(function_scope);

    indexer.visit_statements(&function.body);
    indexer.scopes.pop();

    let index = indexer.finish();
    log::debug!(
        "indexer: {} has {} suspension point(s) and {} try region(s)",
        function.name,
        index.points.len(),
        index.try_regions.len()
    );
    index
}

fn identifier_operand(identifier: &Identifier) -> Option<Operand> {
    match identifier.local_type.get()? {
        LocalType::Argument => Some(Operand::argument(identifier.local_index.get())),
        LocalType::Variable => Some(Operand::local(identifier.local_index.get())),
    }
}

impl Indexer {
    fn tick(&mut self) -> u32 {
        self.sequence += 1;
        self.sequence
    }

    fn reference(&mut self, identifier: &Identifier) {
        if let Some(operand) = identifier_operand(identifier) {
            let sequence = self.tick();
            self.references.push((sequence, operand));
        }
    }

    fn push_scope(&mut self, identifiers: impl IntoIterator<Item = Rc<Identifier>>) {
        let operands = identifiers
            .into_iter()
            .filter_map(|identifier| identifier_operand(&identifier))
            .collect();
        self.scopes.push(operands);
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn begin_loop(&mut self) {
        let start = self.tick();
        self.loops.push(LoopSpan { start, end: u32::MAX });
        self.loop_stack.push(self.loops.len() - 1);
    }

    fn end_loop(&mut self) {
        let end = self.tick();
        if let Some(index) = self.loop_stack.pop() {
            self.loops[index].end = end;
        }
    }

    fn enter_region(&mut self, kind: TryRegionKind) -> TryRegionId {
        let id = TryRegionId(u32_from_usize(self.try_regions.len()));
        self.try_regions.push(TryRegion { id, kind, parent: self.region_stack.last().copied() });
        self.region_stack.push(id);
        id
    }

    fn exit_region(&mut self) {
        self.region_stack.pop();
    }

    fn suspension(&mut self, kind: SuspensionKind) {
        let sequence = self.tick();
        let mut visible: Vec<Operand> = self.scopes.iter().flatten().copied().collect();
        visible.sort();
        visible.dedup();
        self.points.push(PendingPoint {
            kind,
            enclosing_try_regions: self.region_stack.clone(),
            sequence,
            visible,
            loops: self.loop_stack.clone(),
        });
    }

    fn finish(self) -> SuspensionIndex {
        let points = self
            .points
            .iter()
            .enumerate()
            .map(|(index, point)| {
                let live_locals = point
                    .visible
                    .iter()
                    .copied()
                    .filter(|operand| {
                        self.references.iter().any(|(sequence, referenced)| {
                            referenced == operand
                                && (*sequence > point.sequence
                                    || point.loops.iter().any(|&l| {
                                        let span = &self.loops[l];
                                        span.start <= *sequence && *sequence <= span.end
                                    }))
                        })
                    })
                    .collect();
                SuspensionPoint {
                    index: u32_from_usize(index),
                    kind: point.kind,
                    enclosing_try_regions: point.enclosing_try_regions.clone(),
                    live_locals,
                    resume_target: None,
                }
            })
            .collect();
        SuspensionIndex { points, try_regions: self.try_regions }
    }

    // --- Statements ---

    fn visit_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.visit_statement(statement);
        }
    }

    fn visit_block(&mut self, statements: &[Statement]) {
        let declared = lexically_declared_identifiers(statements);
        self.push_scope(declared.into_iter().map(|(_, identifier)| identifier));
        self.visit_statements(statements);
        self.pop_scope();
    }

    fn visit_statement(&mut self, statement: &Statement) {
        match &statement.inner {
            StatementKind::Empty
            | StatementKind::Break { .. }
            | StatementKind::Continue { .. } => {}
            StatementKind::Expression(expression) | StatementKind::Throw(expression) => {
                self.visit_expression(expression)
            }
            StatementKind::Return(value) => {
                if let Some(value) = value {
                    self.visit_expression(value);
                }
            }
            StatementKind::Block(body) => self.visit_block(body),
            StatementKind::VariableDeclaration { declarations, .. } => {
                for declarator in declarations {
                    if let Some(init) = &declarator.init {
                        self.visit_expression(init);
                    }
                    self.visit_declarator_target(&declarator.target);
                }
            }
            StatementKind::If { test, consequent, alternate } => {
                self.visit_expression(test);
                self.visit_statement(consequent);
                if let Some(alternate) = alternate {
                    self.visit_statement(alternate);
                }
            }
            StatementKind::While { test, body } => {
                self.begin_loop();
                self.visit_expression(test);
                self.visit_statement(body);
                self.end_loop();
            }
            StatementKind::DoWhile { test, body } => {
                self.begin_loop();
                self.visit_statement(body);
                self.visit_expression(test);
                self.end_loop();
            }
            StatementKind::For { init, test, update, body } => {
                match init {
                    Some(ForInit::Declaration(declaration)) => {
                        self.push_scope(
                            lexically_declared_identifiers(std::slice::from_ref(declaration))
                                .into_iter()
                                .map(|(_, identifier)| identifier),
                        );
                        self.visit_statement(declaration);
                    }
                    Some(ForInit::Expression(expression)) => {
                        self.push_scope(Vec::new());
                        self.visit_expression(expression);
                    }
                    None => self.push_scope(Vec::new()),
                }
                self.begin_loop();
                if let Some(test) = test {
                    self.visit_expression(test);
                }
                self.visit_statement(body);
                if let Some(update) = update {
                    self.visit_expression(update);
                }
                self.end_loop();
                self.pop_scope();
            }
            StatementKind::ForOf { lhs, rhs, body } => {
                self.visit_expression(rhs);
                match lhs {
                    ForOfLhs::Declaration(declaration) => self.push_scope(
                        lexically_declared_identifiers(std::slice::from_ref(declaration))
                            .into_iter()
                            .map(|(_, identifier)| identifier),
                    ),
                    _ => self.push_scope(Vec::new()),
                }
                self.begin_loop();
                self.enter_region(TryRegionKind::IteratorClose(IterationContext::ForOf));
                match lhs {
                    ForOfLhs::Declaration(declaration) => {
                        if let StatementKind::VariableDeclaration { declarations, .. } =
                            &declaration.inner
                        {
                            for declarator in declarations {
                                self.visit_declarator_target(&declarator.target);
                            }
                        }
                    }
                    ForOfLhs::Expression(target) => self.visit_assignment_target(target),
                    ForOfLhs::Pattern(pattern) => self.visit_pattern(pattern),
                }
                self.visit_statement(body);
                self.exit_region();
                self.end_loop();
                self.pop_scope();
            }
            StatementKind::Labelled { item, .. } => self.visit_statement(item),
            StatementKind::Try(data) => {
                let has_finally = data.finalizer.is_some();
                if has_finally {
                    self.enter_region(TryRegionKind::Finally);
                }
                if let Some(handler) = &data.handler {
                    self.enter_region(TryRegionKind::Catch);
                    self.visit_statement(&data.block);
                    self.exit_region();

                    let mut parameters = Vec::new();
                    match &handler.parameter {
                        Some(CatchBinding::Identifier(identifier)) => {
                            parameters.push(identifier.clone())
                        }
                        Some(CatchBinding::BindingPattern(pattern)) => {
                            collect_pattern_identifiers(pattern, &mut parameters)
                        }
                        None => {}
                    }
                    self.push_scope(parameters);
                    match &handler.parameter {
                        Some(CatchBinding::Identifier(identifier)) => self.reference(identifier),
                        Some(CatchBinding::BindingPattern(pattern)) => self.visit_pattern(pattern),
                        None => {}
                    }
                    self.visit_statement(&handler.body);
                    self.pop_scope();
                } else {
                    self.visit_statement(&data.block);
                }
                if has_finally {
                    self.exit_region();
                }
                if let Some(finalizer) = &data.finalizer {
                    self.visit_statement(finalizer);
                }
            }
        }
    }

    fn visit_declarator_target(&mut self, target: &VariableDeclaratorTarget) {
        match target {
            VariableDeclaratorTarget::Identifier(identifier) => self.reference(identifier),
            VariableDeclaratorTarget::BindingPattern(pattern) => self.visit_pattern(pattern),
        }
    }

    /// Destructuring a value that has already been evaluated.
    fn visit_pattern(&mut self, pattern: &BindingPattern) {
        let is_array = pattern.kind == BindingPatternKind::Array;
        if is_array {
            self.enter_region(TryRegionKind::IteratorClose(IterationContext::Destructure));
        }
        for entry in &pattern.entries {
            if !is_array && let Some(BindingEntryName::Expression(key)) = &entry.name {
                self.visit_expression(key);
            }
            if let Some(BindingEntryAlias::MemberExpression(target)) = &entry.alias {
                self.visit_member_target(target);
            }
            if let Some(initializer) = &entry.initializer {
                self.visit_expression(initializer);
            }
            match (&entry.alias, &entry.name) {
                (Some(BindingEntryAlias::BindingPattern(nested)), _) => self.visit_pattern(nested),
                (Some(BindingEntryAlias::Identifier(identifier)), _) => self.reference(identifier),
                (None, Some(BindingEntryName::Identifier(identifier))) => {
                    self.reference(identifier)
                }
                _ => {}
            }
        }
        if is_array {
            self.exit_region();
        }
    }

    // --- Expressions ---

    /// The parts of an assignment target evaluated before the assigned value.
    fn visit_member_target(&mut self, target: &Expression) {
        match &target.inner {
            ExpressionKind::Member { object, property, computed } => {
                self.visit_expression(object);
                if *computed {
                    self.visit_expression(property);
                }
            }
            _ => self.visit_expression(target),
        }
    }

    fn visit_assignment_target(&mut self, target: &Expression) {
        match &target.inner {
            ExpressionKind::Identifier(identifier) => self.reference(identifier),
            _ => self.visit_member_target(target),
        }
    }

    fn visit_expression(&mut self, expression: &Expression) {
        match &expression.inner {
            ExpressionKind::NumericLiteral(_)
            | ExpressionKind::StringLiteral(_)
            | ExpressionKind::BooleanLiteral(_)
            | ExpressionKind::NullLiteral
            | ExpressionKind::BigIntLiteral(_)
            | ExpressionKind::This => {}
            ExpressionKind::Identifier(identifier) => self.reference(identifier),
            ExpressionKind::Binary { lhs, rhs, .. } | ExpressionKind::Logical { lhs, rhs, .. } => {
                self.visit_expression(lhs);
                self.visit_expression(rhs);
            }
            ExpressionKind::Unary { operand, .. } => self.visit_expression(operand),
            ExpressionKind::Update { argument, .. } => self.visit_assignment_target(argument),
            ExpressionKind::Assignment { lhs, rhs, .. } => match lhs {
                AssignmentLhs::Expression(target) => match &target.inner {
                    ExpressionKind::Identifier(identifier) => {
                        self.visit_expression(rhs);
                        self.reference(identifier);
                    }
                    _ => {
                        self.visit_member_target(target);
                        self.visit_expression(rhs);
                    }
                },
                AssignmentLhs::Pattern(pattern) => {
                    self.visit_expression(rhs);
                    self.visit_pattern(pattern);
                }
            },
            ExpressionKind::Conditional { test, consequent, alternate } => {
                self.visit_expression(test);
                self.visit_expression(consequent);
                self.visit_expression(alternate);
            }
            ExpressionKind::Sequence(expressions) => {
                for expression in expressions {
                    self.visit_expression(expression);
                }
            }
            ExpressionKind::Member { .. } => self.visit_member_target(expression),
            ExpressionKind::Call(data) => {
                self.visit_member_target(&data.callee);
                for argument in &data.arguments {
                    self.visit_expression(&argument.value);
                }
            }
            ExpressionKind::Array(elements) => {
                for element in elements.iter().flatten() {
                    self.visit_expression(element);
                }
            }
            ExpressionKind::Object(properties) => {
                for property in properties {
                    if let PropertyKey::Computed(key) = &property.key {
                        self.visit_expression(key);
                    }
                    self.visit_expression(&property.value);
                }
            }
            ExpressionKind::Spread(inner) => self.visit_expression(inner),
            ExpressionKind::Yield { argument, is_yield_from } => {
                if let Some(argument) = argument {
                    self.visit_expression(argument);
                }
                if self.body_kind == BodyKind::Generator {
                    let kind = if *is_yield_from {
                        SuspensionKind::YieldDelegate
                    } else {
                        SuspensionKind::Yield
                    };
                    self.suspension(kind);
                }
            }
            ExpressionKind::Await(argument) => {
                self.visit_expression(argument);
                if self.body_kind == BodyKind::AsyncBody {
                    self.suspension(SuspensionKind::Await);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_build::*;
    use crate::scope::resolve_function;

    fn index(function: &FunctionData, body_kind: BodyKind) -> SuspensionIndex {
        resolve_function(function);
        index_function(function, body_kind)
    }

    #[test]
    fn points_record_kind_and_enclosing_regions() {
        let function = generator(
            "g",
            &["xs"],
            vec![
                expr(yield_(num(1.0))),
                try_finally(vec![expr(yield_(num(2.0)))], vec![expr(yield_(num(3.0)))]),
                for_of("x", ident("xs"), block(vec![expr(yield_star(ident("x")))])),
            ],
        );
        let index = index(&function, BodyKind::Generator);

        let kinds: Vec<SuspensionKind> = index.points.iter().map(|point| point.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SuspensionKind::Yield,
                SuspensionKind::Yield,
                SuspensionKind::Yield,
                SuspensionKind::YieldDelegate,
            ]
        );
        assert_eq!(index.try_regions.len(), 2);
        assert_eq!(index.try_regions[0].kind, TryRegionKind::Finally);
        assert_eq!(
            index.try_regions[1].kind,
            TryRegionKind::IteratorClose(IterationContext::ForOf)
        );
        assert!(index.points[0].enclosing_try_regions.is_empty());
        assert_eq!(index.points[1].enclosing_try_regions, vec![TryRegionId(0)]);
        assert!(index.points[2].enclosing_try_regions.is_empty());
        assert_eq!(index.points[3].enclosing_try_regions, vec![TryRegionId(1)]);
        assert!(index.points.iter().all(|point| point.resume_target.is_none()));
    }

    #[test]
    fn catch_regions_nest_inside_finally_regions() {
        let function = generator(
            "g",
            &[],
            vec![try_catch_finally(
                vec![expr(yield_(num(1.0)))],
                Some("e"),
                vec![expr(yield_(ident("e")))],
                vec![],
            )],
        );
        let index = index(&function, BodyKind::Generator);
        assert_eq!(index.try_regions[1].kind, TryRegionKind::Catch);
        assert_eq!(index.try_regions[1].parent, Some(TryRegionId(0)));
        assert_eq!(index.points[0].enclosing_try_regions, vec![TryRegionId(0), TryRegionId(1)]);
        assert_eq!(index.points[1].enclosing_try_regions, vec![TryRegionId(0)]);
        assert_eq!(index.region_chain(TryRegionId(1)), vec![TryRegionId(0), TryRegionId(1)]);
    }

    #[test]
    fn live_locals_are_visible_and_referenced_later() {
        let function = generator(
            "g",
            &["p"],
            vec![
                let_("a", num(1.0)),
                expr(yield_(ident("a"))),
                let_("b", num(2.0)),
                expr(yield_(ident("b"))),
                return_(add(ident("a"), ident("p"))),
            ],
        );
        let index = index(&function, BodyKind::Generator);
        assert_eq!(
            index.points[0].live_locals,
            vec![Operand::local(0), Operand::local(1), Operand::argument(0)]
        );
        assert_eq!(index.points[1].live_locals, vec![Operand::local(0), Operand::argument(0)]);
    }

    #[test]
    fn loop_references_keep_locals_live() {
        let function = generator(
            "g",
            &[],
            vec![
                let_("unused", num(0.0)),
                expr(ident("unused")),
                let_("i", num(0.0)),
                while_(
                    less_than(ident("i"), num(3.0)),
                    block(vec![expr(yield_(num(0.0))), expr(increment(ident("i"), false))]),
                ),
            ],
        );
        let index = index(&function, BodyKind::Generator);
        assert_eq!(index.points[0].live_locals, vec![Operand::local(1)]);
    }

    #[test]
    fn async_bodies_index_awaits_but_not_returns() {
        let function = async_function(
            "f",
            &[],
            vec![expr(await_(num(1.0))), return_(await_(num(2.0))), return_(num(3.0))],
        );
        let index = index(&function, BodyKind::AsyncBody);
        assert_eq!(index.points.len(), 2);
        assert!(index.points.iter().all(|point| point.kind == SuspensionKind::Await));
    }

    #[test]
    fn array_patterns_open_destructuring_regions() {
        let function = generator(
            "g",
            &["xs"],
            vec![const_pattern(
                array_pattern(vec![bind("a"), bind_pattern(array_pattern(vec![bind("b")]))]),
                ident("xs"),
            )],
        );
        let index = index(&function, BodyKind::Generator);
        assert_eq!(index.try_regions.len(), 2);
        assert_eq!(index.try_regions[1].parent, Some(TryRegionId(0)));
        assert!(
            index
                .try_regions
                .iter()
                .all(|region| {
                    region.kind == TryRegionKind::IteratorClose(IterationContext::Destructure)
                })
        );
    }
}
