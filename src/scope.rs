/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Scope resolution for function bodies.
//!
//! Assigns every declared name a storage slot and annotates each
//! `Identifier` with it:
//!
//! - parameters become `LocalType::Argument` slots,
//! - `var` declarations are hoisted to the function scope,
//! - `let`/`const` and catch parameters get a fresh slot per declaring
//!   scope, so shadowing never aliases an outer binding,
//! - anything left unresolved is marked global.
//!
//! Closures are not part of the supported input, so every binding can live
//! in a flat slot array owned by the frame.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::*;
use crate::u32_from_usize;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ScopeType {
    Function,
    Block,
    ForLoop,
    Catch,
}

#[derive(Clone, Copy, Debug)]
struct ScopeVariable {
    local_type: LocalType,
    index: u32,
    declaration_kind: Option<DeclarationKind>,
}

#[derive(Debug)]
struct ScopeRecord {
    scope_type: ScopeType,
    variables: FxHashMap<String, ScopeVariable>,
}

/// What scope resolution learned about a function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeResolution {
    pub local_names: Vec<String>,
    pub parameter_count: u32,
}

struct ScopeResolver {
    records: Vec<ScopeRecord>,
    local_names: Vec<String>,
}

/// Resolve all identifiers in `function` and record the slot names on it.
pub fn resolve_function(function: &FunctionData) -> ScopeResolution {
    let mut resolver = ScopeResolver { records: Vec::new(), local_names: Vec::new() };
    resolver.open_scope(ScopeType::Function);

    for (index, parameter) in function.parameters.iter().enumerate() {
        resolver.declare_in_current(
            &parameter.binding.name,
            LocalType::Argument,
            u32_from_usize(index),
            None,
        );
    }
    // Defaults see earlier parameters.
    for parameter in &function.parameters {
        if let Some(default_value) = &parameter.default_value {
            resolver.visit_expression(default_value);
        }
        resolver.resolve(&parameter.binding);
    }

    let mut var_identifiers = Vec::new();
    for statement in &function.body {
        collect_var_identifiers(statement, &mut var_identifiers);
    }
    for identifier in var_identifiers {
        if resolver.lookup(&identifier.name).is_none() {
            resolver.declare_local(&identifier.name, Some(DeclarationKind::Var));
        }
    }

    resolver.declare_lexical(&function.body);
    for statement in &function.body {
        resolver.visit_statement(statement);
    }
    resolver.close_scope();

    *function.local_variables.borrow_mut() = resolver.local_names.clone();
    log::trace!(
        "scope: {} has {} local slot(s) and {} parameter(s)",
        function.name,
        resolver.local_names.len(),
        function.parameters.len()
    );
    ScopeResolution {
        local_names: resolver.local_names,
        parameter_count: u32_from_usize(function.parameters.len()),
    }
}

impl ScopeResolver {
    fn open_scope(&mut self, scope_type: ScopeType) {
        self.records.push(ScopeRecord { scope_type, variables: FxHashMap::default() });
    }

    fn close_scope(&mut self) {
        self.records.pop();
    }

    fn declare_in_current(
        &mut self,
        name: &str,
        local_type: LocalType,
        index: u32,
        kind: Option<DeclarationKind>,
    ) {
        if let Some(record) = self.records.last_mut() {
            record
                .variables
                .insert(name.to_string(), ScopeVariable {
                    local_type,
                    index,
                    declaration_kind: kind,
                });
        }
    }

    /// Give `name` a fresh local slot in the current scope, or in the
    /// function scope for `var`.
    fn declare_local(&mut self, name: &str, kind: Option<DeclarationKind>) {
        let index = u32_from_usize(self.local_names.len());
        self.local_names.push(name.to_string());
        let variable = ScopeVariable {
            local_type: LocalType::Variable,
            index,
            declaration_kind: kind,
        };
        let record = if kind == Some(DeclarationKind::Var) {
            self.records.iter_mut().rev().find(|r| r.scope_type == ScopeType::Function)
        } else {
            self.records.last_mut()
        };
        if let Some(record) = record {
            record.variables.insert(name.to_string(), variable);
        }
    }

    /// Declare the `let`/`const` bindings made directly by `statements`.
    fn declare_lexical(&mut self, statements: &[Statement]) {
        for (kind, identifier) in lexically_declared_identifiers(statements) {
            self.declare_local(&identifier.name, Some(kind));
        }
    }

    fn lookup(&self, name: &str) -> Option<ScopeVariable> {
        self.records.iter().rev().find_map(|record| record.variables.get(name).copied())
    }

    fn resolve(&self, identifier: &Rc<Identifier>) {
        match self.lookup(&identifier.name) {
            Some(variable) => {
                identifier.local_type.set(Some(variable.local_type));
                identifier.local_index.set(variable.index);
                identifier.declaration_kind.set(variable.declaration_kind);
                identifier.is_global.set(false);
            }
            None => identifier.is_global.set(true),
        }
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
            StatementKind::Block(body) => {
                self.open_scope(ScopeType::Block);
                self.declare_lexical(body);
                for child in body {
                    self.visit_statement(child);
                }
                self.close_scope();
            }
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
            StatementKind::While { test, body } | StatementKind::DoWhile { test, body } => {
                self.visit_expression(test);
                self.visit_statement(body);
            }
            StatementKind::For { init, test, update, body } => {
                self.open_scope(ScopeType::ForLoop);
                match init {
                    Some(ForInit::Declaration(declaration)) => {
                        self.declare_lexical(std::slice::from_ref(declaration));
                        self.visit_statement(declaration);
                    }
                    Some(ForInit::Expression(expression)) => self.visit_expression(expression),
                    None => {}
                }
                if let Some(test) = test {
                    self.visit_expression(test);
                }
                if let Some(update) = update {
                    self.visit_expression(update);
                }
                self.visit_statement(body);
                self.close_scope();
            }
            StatementKind::ForOf { lhs, rhs, body } => {
                self.visit_expression(rhs);
                self.open_scope(ScopeType::ForLoop);
                match lhs {
                    ForOfLhs::Declaration(declaration) => {
                        self.declare_lexical(std::slice::from_ref(declaration));
                        self.visit_statement(declaration);
                    }
                    ForOfLhs::Expression(expression) => self.visit_expression(expression),
                    ForOfLhs::Pattern(pattern) => self.visit_pattern(pattern),
                }
                self.visit_statement(body);
                self.close_scope();
            }
            StatementKind::Labelled { item, .. } => self.visit_statement(item),
            StatementKind::Try(data) => {
                self.visit_statement(&data.block);
                if let Some(handler) = &data.handler {
                    self.open_scope(ScopeType::Catch);
                    match &handler.parameter {
                        Some(CatchBinding::Identifier(identifier)) => {
                            self.declare_local(&identifier.name, Some(DeclarationKind::Let));
                            self.resolve(identifier);
                        }
                        Some(CatchBinding::BindingPattern(pattern)) => {
                            let mut identifiers = Vec::new();
                            collect_pattern_identifiers(pattern, &mut identifiers);
                            for identifier in identifiers {
                                self.declare_local(&identifier.name, Some(DeclarationKind::Let));
                            }
                            self.visit_pattern(pattern);
                        }
                        None => {}
                    }
                    self.visit_statement(&handler.body);
                    self.close_scope();
                }
                if let Some(finalizer) = &data.finalizer {
                    self.visit_statement(finalizer);
                }
            }
        }
    }

    fn visit_declarator_target(&mut self, target: &VariableDeclaratorTarget) {
        match target {
            VariableDeclaratorTarget::Identifier(identifier) => self.resolve(identifier),
            VariableDeclaratorTarget::BindingPattern(pattern) => self.visit_pattern(pattern),
        }
    }

    fn visit_pattern(&mut self, pattern: &BindingPattern) {
        for entry in &pattern.entries {
            match &entry.name {
                Some(BindingEntryName::Identifier(identifier)) => self.resolve(identifier),
                Some(BindingEntryName::Expression(expression)) => self.visit_expression(expression),
                None => {}
            }
            match &entry.alias {
                Some(BindingEntryAlias::Identifier(identifier)) => self.resolve(identifier),
                Some(BindingEntryAlias::BindingPattern(nested)) => self.visit_pattern(nested),
                Some(BindingEntryAlias::MemberExpression(expression)) => {
                    self.visit_expression(expression)
                }
                None => {}
            }
            if let Some(initializer) = &entry.initializer {
                self.visit_expression(initializer);
            }
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
            ExpressionKind::Identifier(identifier) => self.resolve(identifier),
            ExpressionKind::Binary { lhs, rhs, .. } | ExpressionKind::Logical { lhs, rhs, .. } => {
                self.visit_expression(lhs);
                self.visit_expression(rhs);
            }
            ExpressionKind::Unary { operand, .. } => self.visit_expression(operand),
            ExpressionKind::Update { argument, .. } => self.visit_expression(argument),
            ExpressionKind::Assignment { lhs, rhs, .. } => {
                match lhs {
                    AssignmentLhs::Expression(target) => self.visit_expression(target),
                    AssignmentLhs::Pattern(pattern) => self.visit_pattern(pattern),
                }
                self.visit_expression(rhs);
            }
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
            ExpressionKind::Member { object, property, .. } => {
                self.visit_expression(object);
                self.visit_expression(property);
            }
            ExpressionKind::Call(data) => {
                self.visit_expression(&data.callee);
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
            ExpressionKind::Spread(inner) | ExpressionKind::Await(inner) => {
                self.visit_expression(inner)
            }
            ExpressionKind::Yield { argument, .. } => {
                if let Some(argument) = argument {
                    self.visit_expression(argument);
                }
            }
        }
    }
}

/// Identifiers bound by a declarator target, in source order.
pub(crate) fn collect_target_identifiers(
    target: &VariableDeclaratorTarget,
    out: &mut Vec<Rc<Identifier>>,
) {
    match target {
        VariableDeclaratorTarget::Identifier(identifier) => out.push(identifier.clone()),
        VariableDeclaratorTarget::BindingPattern(pattern) => {
            collect_pattern_identifiers(pattern, out)
        }
    }
}

/// For `{ key: alias }` the alias is bound, never the key.
pub(crate) fn collect_pattern_identifiers(pattern: &BindingPattern, out: &mut Vec<Rc<Identifier>>) {
    for entry in &pattern.entries {
        match (&entry.alias, &entry.name) {
            (Some(BindingEntryAlias::Identifier(identifier)), _) => out.push(identifier.clone()),
            (Some(BindingEntryAlias::BindingPattern(nested)), _) => {
                collect_pattern_identifiers(nested, out)
            }
            (Some(BindingEntryAlias::MemberExpression(_)), _) => {}
            (None, Some(BindingEntryName::Identifier(identifier))) => out.push(identifier.clone()),
            (None, _) => {}
        }
    }
}

/// Every identifier declared with `var` anywhere in `statement`.
pub(crate) fn collect_var_identifiers(statement: &Statement, out: &mut Vec<Rc<Identifier>>) {
    match &statement.inner {
        StatementKind::VariableDeclaration { kind: DeclarationKind::Var, declarations } => {
            for declarator in declarations {
                collect_target_identifiers(&declarator.target, out);
            }
        }
        StatementKind::Block(body) => {
            body.iter().for_each(|child| collect_var_identifiers(child, out))
        }
        StatementKind::If { consequent, alternate, .. } => {
            collect_var_identifiers(consequent, out);
            if let Some(alternate) = alternate {
                collect_var_identifiers(alternate, out);
            }
        }
        StatementKind::While { body, .. } | StatementKind::DoWhile { body, .. } => {
            collect_var_identifiers(body, out)
        }
        StatementKind::For { init, body, .. } => {
            if let Some(ForInit::Declaration(declaration)) = init {
                collect_var_identifiers(declaration, out);
            }
            collect_var_identifiers(body, out);
        }
        StatementKind::ForOf { lhs, body, .. } => {
            if let ForOfLhs::Declaration(declaration) = lhs {
                collect_var_identifiers(declaration, out);
            }
            collect_var_identifiers(body, out);
        }
        StatementKind::Labelled { item, .. } => collect_var_identifiers(item, out),
        StatementKind::Try(data) => {
            collect_var_identifiers(&data.block, out);
            if let Some(handler) = &data.handler {
                collect_var_identifiers(&handler.body, out);
            }
            if let Some(finalizer) = &data.finalizer {
                collect_var_identifiers(finalizer, out);
            }
        }
        _ => {}
    }
}

/// `let`/`const` identifiers declared directly by `statements`.
pub(crate) fn lexically_declared_identifiers(
    statements: &[Statement],
) -> Vec<(DeclarationKind, Rc<Identifier>)> {
    let mut out = Vec::new();
    for statement in statements {
        if let StatementKind::VariableDeclaration { kind, declarations } = &statement.inner
            && *kind != DeclarationKind::Var
        {
            let mut identifiers = Vec::new();
            for declarator in declarations {
                collect_target_identifiers(&declarator.target, &mut identifiers);
            }
            out.extend(identifiers.into_iter().map(|identifier| (*kind, identifier)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_build::*;

    fn identifier_in(statement: &Statement) -> Rc<Identifier> {
        match &statement.inner {
            StatementKind::Expression(expression) => match &expression.inner {
                ExpressionKind::Identifier(identifier) => identifier.clone(),
                other => panic!("expected identifier, got {other:?}"),
            },
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn parameters_vars_and_globals() {
        let function = generator(
            "g",
            &["a"],
            vec![var("x", num(1.0)), expr(ident("a")), expr(ident("x")), expr(ident("print"))],
        );
        let resolution = resolve_function(&function);
        assert_eq!(resolution.parameter_count, 1);
        assert_eq!(resolution.local_names, vec!["x".to_string()]);

        let a = identifier_in(&function.body[1]);
        assert_eq!(a.local_type.get(), Some(LocalType::Argument));
        let x = identifier_in(&function.body[2]);
        assert_eq!(x.local_type.get(), Some(LocalType::Variable));
        assert_eq!(x.local_index.get(), 0);
        let print = identifier_in(&function.body[3]);
        assert!(print.is_global.get());
        assert!(!print.is_local());
    }

    #[test]
    fn block_scoped_bindings_get_their_own_slots() {
        let function = generator(
            "g",
            &[],
            vec![
                let_("x", num(1.0)),
                block(vec![let_("x", num(2.0)), expr(ident("x"))]),
                expr(ident("x")),
            ],
        );
        let resolution = resolve_function(&function);
        assert_eq!(resolution.local_names.len(), 2);

        let StatementKind::Block(inner) = &function.body[1].inner else { panic!("expected block") };
        let inner_x = identifier_in(&inner[1]);
        let outer_x = identifier_in(&function.body[2]);
        assert_ne!(inner_x.local_index.get(), outer_x.local_index.get());
        assert_eq!(*function.local_variables.borrow(), resolution.local_names);
    }
}
