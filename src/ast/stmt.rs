//! Statement nodes: everything executed for effect rather than for a value.
//!
//! Every variant bottoms out in three operations — `analyze`, `interpret`,
//! `token_range` — dispatched through [`Stmt`] itself, matching the node
//! contracts from the data model. `Statements` (a sequence) introduces no
//! scope of its own; whatever construct holds one (a function body, a
//! condition's branch, a loop body, the top-level program) is responsible
//! for pushing and popping around it.

use std::{fmt, rc::Rc};

use crate::{
    diagnostics::{Finding, Findings},
    environment::Environment,
    signal::{InterpretResult, Signal},
    source::SourceRange,
    symbol::{RuntimeSymbol, SymbolFlags},
    types::{CompositeTypeData, PlaceholderHandle, Type, new_placeholder},
    value::SymbolValue,
};

use super::{expr::Expr, type_literal::TypeLiteral};

use indexmap::IndexMap;

/// A sequence of statements, executed in order. Carries no scope of its own.
#[derive(Debug, Clone)]
pub struct Statements {
    pub stmts: Vec<Stmt>,
    pub range: SourceRange,
}

impl Statements {
    #[must_use]
    pub fn new(stmts: Vec<Stmt>, range: SourceRange) -> Self {
        Self { stmts, range }
    }

    #[must_use]
    pub fn analyze(&self, env: &mut Environment) -> Findings {
        Findings::merge(self.stmts.iter().map(|stmt| stmt.analyze(env)))
    }

    pub fn interpret(&self, env: &mut Environment) -> InterpretResult {
        for stmt in &self.stmts {
            stmt.interpret(env)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct VariableAssignment {
    pub ident: String,
    pub annotation: Option<TypeLiteral>,
    pub expr: Expr,
    pub range: SourceRange,
}

impl VariableAssignment {
    pub fn analyze(&self, env: &mut Environment) -> Findings {
        let mut findings = env.with_assignment_hint(&self.ident, |env| self.expr.analyze(env));

        match env.analysis.find(&self.ident) {
            None => {
                let mut annotation_type = None;
                if let Some(annotation) = &self.annotation {
                    match annotation.resolve(env, &IndexMap::new()) {
                        Some(ty) => annotation_type = Some(ty),
                        None => findings.push(Finding::error(format!("unknown type `{}`", annotation.name), annotation.range)),
                    }
                }

                if findings.is_erroneous() {
                    return findings;
                }

                if let Some(annotation_type) = &annotation_type {
                    let expr_type = self.expr.resolve_type(env);
                    if !expr_type.compatible_with(annotation_type) {
                        findings.push(Finding::error(
                            "the type of the assigned value is not compatible with the declared type",
                            self.range,
                        ));
                    }
                }

                if !findings.is_erroneous() {
                    let value_type = annotation_type.unwrap_or_else(|| self.expr.resolve_type(env));
                    env.analysis.set_symbol(
                        self.ident.clone(),
                        crate::symbol::StaticSymbol { value_type },
                        SymbolFlags::default(),
                    );
                }
            }
            Some((existing, flags)) => {
                if flags.readonly {
                    findings.push(Finding::error(format!("`{}` is readonly and cannot be reassigned", self.ident), self.range));
                }
                if self.annotation.is_some() {
                    findings.push(Finding::error("a type annotation is only allowed on the first assignment", self.range));
                }

                if !findings.is_erroneous() {
                    let expr_type = self.expr.resolve_type(env);
                    if !expr_type.compatible_with(&existing.value_type) {
                        findings.push(Finding::error(
                            format!("`{}`'s type is set in stone and this value is not compatible with it", self.ident),
                            self.range,
                        ));
                    }
                }

                if !findings.is_erroneous() {
                    env.analysis.set_symbol(self.ident.clone(), existing, flags);
                }
            }
        }

        findings
    }

    pub fn interpret(&self, env: &mut Environment) -> InterpretResult {
        let value = self.expr.evaluate(env)?;
        let value_type = env
            .analysis
            .find(&self.ident)
            .unwrap_or_else(|| panic!("internal error: `{}` missing from the analysis table during interpret", self.ident))
            .0
            .value_type;
        env.runtime
            .set_symbol(self.ident.clone(), RuntimeSymbol { value: value.with_type(value_type) }, SymbolFlags::default());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PropertyWrite {
    pub parent: Expr,
    pub field: String,
    pub value: Expr,
    pub range: SourceRange,
}

impl PropertyWrite {
    pub fn analyze(&self, env: &mut Environment) -> Findings {
        let mut findings = Findings::merge([self.parent.analyze(env), self.value.analyze(env)]);
        if findings.is_erroneous() {
            return findings;
        }

        let parent_type = self.parent.resolve_type(env);
        match parent_type.field_type(&self.field) {
            Some(field_type) => {
                let value_type = self.value.resolve_type(env);
                if !value_type.compatible_with(&field_type) {
                    findings.push(Finding::error(
                        format!("`{value_type}` is not compatible with the type of field `{}`", self.field),
                        self.range,
                    ));
                }
            }
            None if parent_type.is_ignore() => {}
            None => {
                findings.push(Finding::error(format!("`{parent_type}` has no field named `{}`", self.field), self.range));
            }
        }
        findings
    }

    pub fn interpret(&self, env: &mut Environment) -> InterpretResult {
        let parent = self.parent.evaluate(env)?;
        let composite = parent
            .as_composite()
            .unwrap_or_else(|| panic!("internal error: property write target is not a composite"))
            .clone();
        let value = self.value.evaluate(env)?;
        composite.set(&self.field, value);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Condition {
    pub cond: Expr,
    pub true_stmts: Statements,
    pub false_stmts: Option<Statements>,
    pub range: SourceRange,
}

impl Condition {
    pub fn analyze(&self, env: &mut Environment) -> Findings {
        let mut findings = self.cond.analyze(env);
        let cond_ok = !findings.is_erroneous();

        env.analysis.push_scope();
        findings.extend(self.true_stmts.analyze(env));
        env.analysis.pop_scope();

        if let Some(false_stmts) = &self.false_stmts {
            env.analysis.push_scope();
            findings.extend(false_stmts.analyze(env));
            env.analysis.pop_scope();
        }

        if cond_ok {
            let cond_type = self.cond.resolve_type(env);
            if !cond_type.compatible_with(&Type::Boolean) {
                findings.push(Finding::error("needs to evaluate to a boolean", self.cond.token_range()));
            }
        }

        findings
    }

    pub fn interpret(&self, env: &mut Environment) -> InterpretResult {
        let cond = self
            .cond
            .evaluate(env)?
            .as_boolean()
            .unwrap_or_else(|| panic!("internal error: condition did not evaluate to a boolean"));

        env.runtime.push_scope();
        let result = if cond {
            self.true_stmts.interpret(env)
        } else if let Some(false_stmts) = &self.false_stmts {
            false_stmts.interpret(env)
        } else {
            Ok(())
        };
        env.runtime.pop_scope();
        result
    }
}

#[derive(Debug, Clone)]
pub struct Loop {
    pub cond: Expr,
    pub body: Statements,
    pub range: SourceRange,
}

impl Loop {
    pub fn analyze(&self, env: &mut Environment) -> Findings {
        let mut findings = self.cond.analyze(env);
        let cond_ok = !findings.is_erroneous();

        env.analysis.push_scope();
        env.types.push_loop_scope();
        findings.extend(self.body.analyze(env));
        env.types.pop_scope();
        env.analysis.pop_scope();

        if cond_ok {
            let cond_type = self.cond.resolve_type(env);
            if !cond_type.compatible_with(&Type::Boolean) {
                findings.push(Finding::error("needs to evaluate to a boolean", self.cond.token_range()));
            }
        }

        findings
    }

    pub fn interpret(&self, env: &mut Environment) -> InterpretResult {
        env.runtime.push_scope();
        let result = self.run(env);
        env.runtime.pop_scope();
        result
    }

    fn run(&self, env: &mut Environment) -> InterpretResult {
        loop {
            let cond = self
                .cond
                .evaluate(env)?
                .as_boolean()
                .unwrap_or_else(|| panic!("internal error: loop condition did not evaluate to a boolean"));
            if !cond {
                return Ok(());
            }

            env.runtime.push_scope();
            let result = self.body.interpret(env);
            env.runtime.pop_scope();

            match result {
                Ok(()) | Err(Signal::Continue) => {}
                Err(Signal::Break) => return Ok(()),
                Err(other) => return Err(other),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlowKind {
    Continue,
    Break,
}

#[derive(Debug, Clone)]
pub struct ControlFlowModifier {
    pub kind: ControlFlowKind,
    pub range: SourceRange,
}

impl ControlFlowModifier {
    pub fn analyze(&self, env: &mut Environment) -> Findings {
        if env.types.inside_loop() {
            Findings::new()
        } else {
            let message = match self.kind {
                ControlFlowKind::Continue => "`continue` used outside of a loop",
                ControlFlowKind::Break => "`break` used outside of a loop",
            };
            Findings::of_error(Finding::error(message, self.range))
        }
    }

    pub fn interpret(&self, _env: &mut Environment) -> InterpretResult {
        Err(match self.kind {
            ControlFlowKind::Continue => Signal::Continue,
            ControlFlowKind::Break => Signal::Break,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Return {
    pub expr: Option<Expr>,
    pub range: SourceRange,
}

impl Return {
    pub fn analyze(&self, env: &mut Environment) -> Findings {
        let mut findings = Findings::new();
        if let Some(expr) = &self.expr {
            findings.extend(expr.analyze(env));
        }

        let Some(declared) = env.types.enclosing_return_type() else {
            findings.push(Finding::error("internal error: return statement outside of any function", self.range));
            return findings;
        };

        if findings.is_erroneous() {
            return findings;
        }

        match (&declared, &self.expr) {
            (Some(_), None) => findings.push(Finding::error("this function needs to return a value", self.range)),
            (None, Some(_)) => findings.push(Finding::error("this function does not return a value", self.range)),
            (Some(declared_type), Some(expr)) => {
                let expr_type = expr.resolve_type(env);
                if !expr_type.compatible_with(declared_type) {
                    findings.push(Finding::error("the returned value is not compatible with the declared return type", self.range));
                }
            }
            (None, None) => {}
        }

        findings
    }

    pub fn interpret(&self, env: &mut Environment) -> InterpretResult {
        let value = match &self.expr {
            Some(expr) => expr.evaluate(env)?,
            None => SymbolValue::nothing(),
        };
        Err(Signal::Return(value))
    }
}

#[derive(Debug, Clone)]
pub struct TypeDefinition {
    pub id: String,
    pub fields: Vec<(String, TypeLiteral)>,
    pub placeholders: Vec<String>,
    pub range: SourceRange,
}

impl TypeDefinition {
    pub fn analyze(&self, env: &mut Environment) -> Findings {
        let mut findings = Findings::new();
        let placeholders: IndexMap<String, PlaceholderHandle> =
            self.placeholders.iter().map(|name| (name.clone(), new_placeholder(name.clone()))).collect();

        let mut fields = IndexMap::new();
        for (name, literal) in &self.fields {
            match literal.resolve(env, &placeholders) {
                Some(ty) => {
                    fields.insert(name.clone(), ty);
                }
                None => findings.push(Finding::error(format!("unknown type `{}`", literal.name), literal.range)),
            }
        }

        if !findings.is_erroneous() {
            env.types.define_type(
                self.id.clone(),
                Type::Composite(Rc::new(CompositeTypeData {
                    id: self.id.clone(),
                    fields,
                    placeholders,
                })),
            );
        }

        findings
    }
}

/// The synthetic statement a runtime binding's body is made of: calls back
/// into a host closure, then surfaces the closure's result as a `Return`
/// signal so ordinary invocation machinery collects it — unless the closure
/// itself raises a different signal (`runtime_panic` raises `Panic` rather
/// than returning a value). See [`crate::stdlib`].
#[derive(Clone)]
pub struct NativeHook {
    pub hook: Rc<dyn Fn(&mut Environment) -> Result<SymbolValue, Signal>>,
    pub range: SourceRange,
}

impl fmt::Debug for NativeHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHook").finish_non_exhaustive()
    }
}

/// A statement node: one of the constructs above, or a bare expression
/// evaluated for its side effects (an invocation used as a statement), or a
/// nested `Statements` sequence.
#[derive(Debug, Clone)]
pub enum Stmt {
    VariableAssignment(VariableAssignment),
    PropertyWrite(PropertyWrite),
    Expression(Expr),
    Condition(Condition),
    Loop(Loop),
    ControlFlowModifier(ControlFlowModifier),
    Return(Return),
    TypeDefinition(TypeDefinition),
    Statements(Statements),
    NativeHook(NativeHook),
}

impl Stmt {
    pub fn analyze(&self, env: &mut Environment) -> Findings {
        match self {
            Stmt::VariableAssignment(node) => node.analyze(env),
            Stmt::PropertyWrite(node) => node.analyze(env),
            Stmt::Expression(expr) => expr.analyze(env),
            Stmt::Condition(node) => node.analyze(env),
            Stmt::Loop(node) => node.analyze(env),
            Stmt::ControlFlowModifier(node) => node.analyze(env),
            Stmt::Return(node) => node.analyze(env),
            Stmt::TypeDefinition(node) => node.analyze(env),
            Stmt::Statements(node) => node.analyze(env),
            Stmt::NativeHook(_) => Findings::new(),
        }
    }

    pub fn interpret(&self, env: &mut Environment) -> InterpretResult {
        match self {
            Stmt::VariableAssignment(node) => node.interpret(env),
            Stmt::PropertyWrite(node) => node.interpret(env),
            Stmt::Expression(expr) => {
                expr.evaluate(env)?;
                Ok(())
            }
            Stmt::Condition(node) => node.interpret(env),
            Stmt::Loop(node) => node.interpret(env),
            Stmt::ControlFlowModifier(node) => node.interpret(env),
            Stmt::Return(node) => node.interpret(env),
            Stmt::TypeDefinition(_) => Ok(()),
            Stmt::Statements(node) => node.interpret(env),
            Stmt::NativeHook(node) => match (node.hook)(env) {
                Ok(value) => Err(Signal::Return(value)),
                Err(signal) => Err(signal),
            },
        }
    }

    #[must_use]
    pub fn token_range(&self) -> SourceRange {
        match self {
            Stmt::VariableAssignment(node) => node.range,
            Stmt::PropertyWrite(node) => node.range,
            Stmt::Expression(expr) => expr.token_range(),
            Stmt::Condition(node) => node.range,
            Stmt::Loop(node) => node.range,
            Stmt::ControlFlowModifier(node) => node.range,
            Stmt::Return(node) => node.range,
            Stmt::TypeDefinition(node) => node.range,
            Stmt::Statements(node) => node.range,
            Stmt::NativeHook(node) => node.range,
        }
    }
}

/// Walks a function body's control-flow graph — `Condition` is the only
/// branching construct recognized, expanded into its true and false/empty
/// paths; a loop body is walked straight through rather than treated as a
/// branch point, which under-approximates control flow for a loop that
/// always returns. Preserved as-is, not extended.
///
/// Emits exactly one "missing a return statement somewhere" error across all
/// branches, and one "statements never going to be run" warning per branch
/// that has unreachable statements after its first `Return`.
pub(crate) fn analyze_return_placements(body: &Statements, range: SourceRange) -> Findings {
    let mut findings = Findings::new();
    let mut missing_reported = false;

    for branch in branches_for(&body.stmts) {
        let mut seen_return = false;
        let mut warned = false;
        for stmt in &branch {
            if seen_return {
                if !warned {
                    findings.push(Finding::warning("statements never going to be run", stmt.token_range()));
                    warned = true;
                }
            } else if matches!(stmt, Stmt::Return(_)) {
                seen_return = true;
            }
        }
        if !seen_return && !missing_reported {
            findings.push(Finding::error("missing a return statement somewhere", range));
            missing_reported = true;
        }
    }

    findings
}

fn branches_for(stmts: &[Stmt]) -> Vec<Vec<&Stmt>> {
    let Some((head, rest)) = stmts.split_first() else {
        return vec![Vec::new()];
    };

    if let Stmt::Condition(condition) = head {
        let suffix_branches = branches_for(rest);
        let false_slice: &[Stmt] = condition.false_stmts.as_ref().map_or(&[][..], |stmts| &stmts.stmts[..]);
        let mut result = Vec::new();
        for side in [&condition.true_stmts.stmts[..], false_slice] {
            for inner in branches_for(side) {
                for suffix in &suffix_branches {
                    let mut combined = inner.clone();
                    combined.extend(suffix.iter().copied());
                    result.push(combined);
                }
            }
        }
        result
    } else {
        branches_for(rest)
            .into_iter()
            .map(|mut branch| {
                branch.insert(0, head);
                branch
            })
            .collect()
    }
}
