//! Expression nodes: everything evaluated for a value.
//!
//! Every variant implements `analyze`, `resolveType` and `evaluate` through
//! [`Expr`]'s dispatching methods, plus `tokenRange` for diagnostics. A
//! function literal ([`FunctionNode`]) is the one variant with meaningfully
//! more going on: its own analysis scope, a return-type boundary, and a
//! memoized [`crate::types::FunctionTypeData`] — populated once by `analyze`
//! and read back by `resolveType`/`evaluate`, per the lifecycle note that AST
//! nodes mutate only caches, never their own structure.

use std::{cell::RefCell, collections::HashSet, fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{
    diagnostics::{Finding, Findings},
    environment::Environment,
    signal::{EvalResult, Signal},
    source::SourceRange,
    symbol::{RuntimeSymbol, StaticSymbol, SymbolFlags},
    types::{CompositeTypeData, FunctionTypeData, PlaceholderHandle, Type, bind_placeholder, new_placeholder, nothing_type},
    value::{CompositeValue, FunctionValue, SymbolValue},
};

use super::{
    stmt::{Statements, analyze_return_placements},
    type_literal::TypeLiteral,
};

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub type_literal: TypeLiteral,
}

/// A function literal: `function (params) -> ReturnType { body }`, usable
/// anywhere an expression is, most commonly as the right-hand side of a
/// variable assignment (`fib = function (n: Number) -> Number { ... }`).
///
/// Has no name of its own — when assigned to a variable, the analyzer passes
/// that variable's name down as an `assignment_hint` so the body can call
/// itself recursively by that name.
#[derive(Debug, Clone)]
pub struct FunctionNode {
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeLiteral>,
    pub placeholders: Vec<String>,
    pub body: Rc<Statements>,
    pub range: SourceRange,
    resolved_type: RefCell<Option<Rc<FunctionTypeData>>>,
}

impl FunctionNode {
    #[must_use]
    pub fn new(
        parameters: Vec<Parameter>,
        return_type: Option<TypeLiteral>,
        placeholders: Vec<String>,
        body: Rc<Statements>,
        range: SourceRange,
    ) -> Self {
        Self {
            parameters,
            return_type,
            placeholders,
            body,
            range,
            resolved_type: RefCell::new(None),
        }
    }

    /// Resolves parameter/return/placeholder types from the declared
    /// `TypeLiteral`s and caches the resulting `FunctionTypeData`. Safe to
    /// call more than once (a no-op past the first call); any errors found
    /// are pushed into `findings` every time it is called without a cached
    /// value yet, but the type itself never changes once computed.
    fn compute_type(&self, env: &Environment, findings: &mut Findings) -> Rc<FunctionTypeData> {
        if let Some(cached) = self.resolved_type.borrow().clone() {
            return cached;
        }

        let mut seen = HashSet::new();
        for parameter in &self.parameters {
            if !seen.insert(parameter.name.clone()) {
                findings.push(Finding::error(format!("duplicate parameter name `{}`", parameter.name), self.range));
            }
        }

        let placeholders: IndexMap<String, PlaceholderHandle> =
            self.placeholders.iter().map(|name| (name.clone(), new_placeholder(name.clone()))).collect();

        let mut parameter_types = Vec::new();
        for parameter in &self.parameters {
            match parameter.type_literal.resolve(env, &placeholders) {
                Some(ty) => parameter_types.push(ty),
                None => {
                    findings.push(Finding::error(
                        format!("unknown type `{}`", parameter.type_literal.name),
                        parameter.type_literal.range,
                    ));
                    parameter_types.push(Type::Ignore);
                }
            }
        }

        let return_type = match &self.return_type {
            Some(literal) => match literal.resolve(env, &placeholders) {
                Some(ty) => Some(ty),
                None => {
                    findings.push(Finding::error(format!("unknown type `{}`", literal.name), literal.range));
                    None
                }
            },
            None => None,
        };

        let data = Rc::new(FunctionTypeData {
            parameter_types,
            return_type,
            placeholders,
        });
        *self.resolved_type.borrow_mut() = Some(Rc::clone(&data));
        data
    }

    fn cached_type(&self) -> Rc<FunctionTypeData> {
        self.resolved_type
            .borrow()
            .clone()
            .unwrap_or_else(|| panic!("internal error: function type requested before analyze"))
    }
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub callee: Box<Expr>,
    pub placeholder_args: Vec<TypeLiteral>,
    pub arguments: Vec<Expr>,
    pub range: SourceRange,
}

enum CalleeType {
    Function(Rc<FunctionTypeData>),
    Constructor(Rc<CompositeTypeData>),
    Ignore,
}

impl CalleeType {
    fn categorize(ty: &Type) -> Option<Self> {
        match ty.peel() {
            Type::Function(data) => Some(CalleeType::Function(data)),
            Type::Composite(data) => Some(CalleeType::Constructor(data)),
            Type::Ignore => Some(CalleeType::Ignore),
            _ => None,
        }
    }
}

impl Invocation {
    /// Resolves `callee` to either a callable symbol or a type name, per the
    /// "(a) ... or (b) ..." lookup rule. Bare identifiers get special
    /// treatment so a type name (which never lives in the analysis table)
    /// isn't wrongly flagged as undefined; any other callee expression (a
    /// property access yielding a function value, say) is just analyzed and
    /// resolved normally.
    fn classify_for_analysis(&self, env: &mut Environment, findings: &mut Findings) -> Option<CalleeType> {
        let category = if let Expr::Reference(name, range) = self.callee.as_ref() {
            if let Some((symbol, _)) = env.analysis.find(name) {
                CalleeType::categorize(&symbol.value_type)
            } else if let Some(ty) = env.types.find_type(name) {
                CalleeType::categorize(&ty)
            } else {
                findings.push(Finding::error(format!("`{name}` is not defined"), *range));
                return None;
            }
        } else {
            findings.extend(self.callee.analyze(env));
            CalleeType::categorize(&self.callee.resolve_type(env))
        };

        match category {
            Some(category) => Some(category),
            None => {
                findings.push(Finding::error("this is not callable", self.range));
                None
            }
        }
    }

    fn classify(&self, env: &Environment) -> CalleeType {
        let ty = if let Expr::Reference(name, _) = self.callee.as_ref() {
            env.analysis
                .find(name)
                .map(|(symbol, _)| symbol.value_type)
                .or_else(|| env.types.find_type(name))
                .unwrap_or_else(|| panic!("internal error: invocation callee `{name}` not found after analysis"))
        } else {
            self.callee.resolve_type(env)
        };

        CalleeType::categorize(&ty).unwrap_or_else(|| panic!("internal error: invocation callee type `{ty}` is not callable"))
    }

    pub fn analyze(&self, env: &mut Environment) -> Findings {
        let mut findings = Findings::new();
        for argument in &self.arguments {
            findings.extend(argument.analyze(env));
        }

        let Some(category) = self.classify_for_analysis(env, &mut findings) else {
            return findings;
        };

        match category {
            CalleeType::Ignore => {}
            CalleeType::Constructor(data) => {
                if self.placeholder_args.len() != data.placeholders.len() {
                    findings.push(Finding::error(
                        format!("expected {} type argument(s), got {}", data.placeholders.len(), self.placeholder_args.len()),
                        self.range,
                    ));
                }

                let mut resolved_args = Vec::with_capacity(self.placeholder_args.len());
                for literal in &self.placeholder_args {
                    match literal.resolve(env, &IndexMap::new()) {
                        Some(ty) => resolved_args.push(ty),
                        None => findings.push(Finding::error(format!("unknown type `{}`", literal.name), literal.range)),
                    }
                }
                let data = if resolved_args.is_empty() { data } else { data.instantiate(&resolved_args) };

                if self.arguments.len() != data.fields.len() {
                    findings.push(Finding::error(
                        format!("`{}` expects {} field value(s), got {}", data.id, data.fields.len(), self.arguments.len()),
                        self.range,
                    ));
                } else {
                    for (argument, (_, field_type)) in self.arguments.iter().zip(data.fields.iter()) {
                        let argument_type = argument.resolve_type(env);
                        if !argument_type.compatible_with(field_type) {
                            findings.push(Finding::error(
                                format!("argument type `{argument_type}` is not compatible with field type `{field_type}`"),
                                argument.token_range(),
                            ));
                        }
                    }
                }
            }
            CalleeType::Function(data) => {
                let forked = data.fork();

                if forked.placeholders.len() != self.placeholder_args.len() {
                    findings.push(Finding::error(
                        format!("expected {} type argument(s), got {}", forked.placeholders.len(), self.placeholder_args.len()),
                        self.range,
                    ));
                } else {
                    for (literal, handle) in self.placeholder_args.iter().zip(forked.placeholders.values()) {
                        match literal.resolve(env, &IndexMap::new()) {
                            Some(ty) => bind_placeholder(handle, ty),
                            None => findings.push(Finding::error(format!("unknown type `{}`", literal.name), literal.range)),
                        }
                    }
                }

                if self.arguments.len() != forked.parameter_types.len() {
                    findings.push(Finding::error(
                        format!("expected {} argument(s), got {}", forked.parameter_types.len(), self.arguments.len()),
                        self.range,
                    ));
                } else {
                    for (argument, parameter_type) in self.arguments.iter().zip(&forked.parameter_types) {
                        let argument_type = argument.resolve_type(env);
                        if !argument_type.compatible_with(parameter_type) {
                            findings.push(Finding::error(
                                format!("argument type `{argument_type}` is not compatible with parameter type `{parameter_type}`"),
                                argument.token_range(),
                            ));
                        }
                    }
                }
            }
        }

        findings
    }

    pub fn resolve_type(&self, env: &Environment) -> Type {
        match self.classify(env) {
            CalleeType::Ignore => Type::Ignore,
            CalleeType::Constructor(data) => {
                if self.placeholder_args.is_empty() {
                    Type::Composite(data)
                } else {
                    let args: Vec<Type> = self
                        .placeholder_args
                        .iter()
                        .filter_map(|literal| literal.resolve(env, &IndexMap::new()))
                        .collect();
                    Type::Composite(data.instantiate(&args))
                }
            }
            CalleeType::Function(data) => {
                let forked = data.fork();
                for (literal, handle) in self.placeholder_args.iter().zip(forked.placeholders.values()) {
                    if let Some(ty) = literal.resolve(env, &IndexMap::new()) {
                        bind_placeholder(handle, ty);
                    }
                }
                forked.return_type.clone().unwrap_or_else(nothing_type)
            }
        }
    }

    pub fn evaluate(&self, env: &mut Environment) -> EvalResult {
        let mut argument_values = Vec::with_capacity(self.arguments.len());
        for argument in &self.arguments {
            argument_values.push(argument.evaluate(env)?);
        }

        if let Expr::Reference(name, _) = self.callee.as_ref() {
            if env.runtime.find(name).is_none() {
                let base = env
                    .types
                    .find_type(name)
                    .unwrap_or_else(|| panic!("internal error: invocation callee `{name}` resolved to neither a runtime symbol nor a type"));
                return Ok(self.construct(env, base, argument_values));
            }
        }

        let callee_value = self.callee.evaluate(env)?;
        let function = callee_value
            .as_function()
            .unwrap_or_else(|| panic!("internal error: invocation callee did not evaluate to a function"))
            .clone();
        self.call(env, &function, argument_values)
    }

    fn construct(&self, env: &Environment, base: Type, argument_values: Vec<SymbolValue>) -> SymbolValue {
        let Type::Composite(data) = base.peel() else {
            panic!("internal error: invocation callee resolved to a non-composite constructor type");
        };
        let data = if self.placeholder_args.is_empty() {
            data
        } else {
            let args: Vec<Type> = self
                .placeholder_args
                .iter()
                .map(|literal| {
                    literal
                        .resolve(env, &IndexMap::new())
                        .unwrap_or_else(|| panic!("internal error: unknown type `{}`", literal.name))
                })
                .collect();
            data.instantiate(&args)
        };
        let fields: IndexMap<String, SymbolValue> = data.fields.keys().cloned().zip(argument_values).collect();
        SymbolValue::composite(Type::Composite(Rc::clone(&data)), CompositeValue::new(data.id.clone(), fields))
    }

    fn call(&self, env: &mut Environment, function: &Rc<FunctionValue>, argument_values: Vec<SymbolValue>) -> EvalResult {
        env.runtime.push_scope();
        for (name, value) in function.parameters.iter().zip(argument_values) {
            let parameter_type = function.parameter_types.get(name).cloned().unwrap_or(Type::Ignore);
            env.runtime
                .set_symbol(name.clone(), RuntimeSymbol { value: value.with_type(parameter_type) }, SymbolFlags::default());
        }

        let result = if function.is_stdlib {
            env.during_stdlib_invocation(|env| function.body.interpret(env))
        } else {
            function.body.interpret(env)
        };
        env.runtime.pop_scope();

        match result {
            Ok(()) => Ok(SymbolValue::nothing()),
            Err(Signal::Return(value)) => Ok(value),
            Err(other @ Signal::Panic(_)) => Err(other),
            Err(other) => panic!("internal error: unexpected signal `{other}` escaped a function body"),
        }
    }
}

/// An expression node: evaluated for a value rather than for effect.
#[derive(Debug, Clone)]
pub enum Expr {
    BooleanLiteral(bool, SourceRange),
    NumberLiteral(f64, SourceRange),
    StringLiteral(String, SourceRange),
    Reference(String, SourceRange),
    PropertyAccess(Box<Expr>, String, SourceRange),
    Invocation(Invocation),
    Function(Rc<FunctionNode>),
}

impl Expr {
    pub fn analyze(&self, env: &mut Environment) -> Findings {
        match self {
            Expr::BooleanLiteral(..) | Expr::NumberLiteral(..) | Expr::StringLiteral(..) => Findings::new(),
            Expr::Reference(name, range) => {
                if env.analysis.find(name).is_some() {
                    Findings::new()
                } else {
                    Findings::of_error(Finding::error(format!("`{name}` is not defined"), *range))
                }
            }
            Expr::PropertyAccess(parent, field, range) => {
                let mut findings = parent.analyze(env);
                if findings.is_erroneous() {
                    return findings;
                }
                let parent_type = parent.resolve_type(env);
                if !parent_type.is_ignore() && parent_type.field_type(field).is_none() {
                    findings.push(Finding::error(format!("`{parent_type}` has no field named `{field}`"), *range));
                }
                findings
            }
            Expr::Invocation(invocation) => invocation.analyze(env),
            Expr::Function(node) => {
                let mut findings = Findings::new();
                let function_type = node.compute_type(env, &mut findings);

                env.analysis.push_scope();
                if let Some(self_name) = env.assignment_hint.clone() {
                    env.analysis.set_symbol(
                        self_name,
                        StaticSymbol { value_type: Type::Function(Rc::clone(&function_type)) },
                        SymbolFlags::default(),
                    );
                }

                for (parameter, parameter_type) in node.parameters.iter().zip(&function_type.parameter_types) {
                    if env.analysis.find(&parameter.name).is_some() {
                        findings.push(Finding::error(
                            format!("parameter `{}` shadows an existing symbol", parameter.name),
                            parameter.type_literal.range,
                        ));
                    }
                    env.analysis.set_symbol(
                        parameter.name.clone(),
                        StaticSymbol { value_type: parameter_type.clone() },
                        SymbolFlags::default(),
                    );
                }

                env.types.push_function_scope(function_type.return_type.clone());
                findings.extend(node.body.analyze(env));
                env.types.pop_scope();
                env.analysis.pop_scope();

                findings.extend(analyze_return_placements(&node.body, node.range));
                findings
            }
        }
    }

    #[must_use]
    pub fn resolve_type(&self, env: &Environment) -> Type {
        match self {
            Expr::BooleanLiteral(..) => Type::Boolean,
            Expr::NumberLiteral(..) => Type::Number,
            Expr::StringLiteral(..) => Type::String,
            Expr::Reference(name, _) => {
                env.analysis
                    .find(name)
                    .unwrap_or_else(|| panic!("internal error: `{name}` missing from the analysis table"))
                    .0
                    .value_type
            }
            Expr::PropertyAccess(parent, field, _) => {
                let parent_type = parent.resolve_type(env);
                if parent_type.is_ignore() {
                    Type::Ignore
                } else {
                    parent_type
                        .field_type(field)
                        .unwrap_or_else(|| panic!("internal error: `{parent_type}` has no field `{field}`"))
                }
            }
            Expr::Invocation(invocation) => invocation.resolve_type(env),
            Expr::Function(node) => Type::Function(node.cached_type()),
        }
    }

    pub fn evaluate(&self, env: &mut Environment) -> EvalResult {
        match self {
            Expr::BooleanLiteral(value, _) => Ok(SymbolValue::boolean(*value)),
            Expr::NumberLiteral(value, _) => Ok(SymbolValue::number(*value)),
            Expr::StringLiteral(value, _) => Ok(SymbolValue::string(value.clone())),
            Expr::Reference(name, _) => Ok(env
                .runtime
                .find(name)
                .unwrap_or_else(|| panic!("internal error: `{name}` missing from the runtime table"))
                .0
                .value),
            Expr::PropertyAccess(parent, field, _) => {
                let parent_value = parent.evaluate(env)?;
                Ok(parent_value
                    .as_composite()
                    .unwrap_or_else(|| panic!("internal error: property access target is not a composite"))
                    .get(field))
            }
            Expr::Invocation(invocation) => invocation.evaluate(env),
            Expr::Function(node) => {
                let function_type = node.cached_type();
                let parameters: Vec<String> = node.parameters.iter().map(|parameter| parameter.name.clone()).collect();
                let parameter_types: IndexMap<String, Type> = node
                    .parameters
                    .iter()
                    .map(|parameter| parameter.name.clone())
                    .zip(function_type.parameter_types.iter().cloned())
                    .collect();

                let value = Rc::new(FunctionValue {
                    name: env.assignment_hint.clone(),
                    parameters,
                    parameter_types,
                    placeholders: function_type.placeholders.clone(),
                    return_type: function_type.return_type.clone(),
                    body: Rc::clone(&node.body),
                    is_stdlib: false,
                });
                Ok(SymbolValue::function(Type::Function(function_type), value))
            }
        }
    }

    #[must_use]
    pub fn token_range(&self) -> SourceRange {
        match self {
            Expr::BooleanLiteral(_, range)
            | Expr::NumberLiteral(_, range)
            | Expr::StringLiteral(_, range)
            | Expr::Reference(_, range)
            | Expr::PropertyAccess(_, _, range) => *range,
            Expr::Invocation(invocation) => invocation.range,
            Expr::Function(node) => node.range,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::BooleanLiteral(value, _) => write!(f, "{value}"),
            Expr::NumberLiteral(value, _) => write!(f, "{value}"),
            Expr::StringLiteral(value, _) => write!(f, "{value:?}"),
            Expr::Reference(name, _) => write!(f, "{name}"),
            Expr::PropertyAccess(parent, field, _) => write!(f, "{parent}.{field}"),
            Expr::Invocation(invocation) => write!(f, "{}(..)", invocation.callee),
            Expr::Function(_) => write!(f, "<function literal>"),
        }
    }
}
