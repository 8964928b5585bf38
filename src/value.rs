//! Runtime values.
//!
//! Every value carries the static [`Type`] it was given at its last
//! assignment (an annotation can overwrite what `evaluate` would otherwise
//! infer). Composite values use reference semantics — a `CompositeValue` is a
//! shared, mutable field map, so a property write through one reference is
//! visible through every other reference to the same value, same as an
//! object in any mainstream imperative language.

use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{ast::stmt::Statements, types::{nothing_type, PlaceholderHandle, Type}};

/// A `Boolean`, `Number` or `String` value.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Boolean(b) => write!(f, "{b}"),
            PrimitiveValue::Number(n) => write!(f, "{n}"),
            PrimitiveValue::String(s) => write!(f, "{s}"),
        }
    }
}

/// An ordered mapping from field name to value.
///
/// Shared (`Rc<RefCell<_>>`) so that property writes through one reference
/// to a structure are observed through every other reference to it, and so
/// evaluating a `ReferenceExpression` twice yields the identical composite
/// rather than a copy.
#[derive(Debug, Clone)]
pub struct CompositeValue {
    pub id: String,
    fields: Rc<RefCell<IndexMap<String, SymbolValue>>>,
}

impl CompositeValue {
    #[must_use]
    pub fn new(id: impl Into<String>, fields: IndexMap<String, SymbolValue>) -> Self {
        Self {
            id: id.into(),
            fields: Rc::new(RefCell::new(fields)),
        }
    }

    /// The unit value: an empty composite named `Nothing`.
    #[must_use]
    pub fn nothing() -> Self {
        Self::new("Nothing", IndexMap::new())
    }

    #[must_use]
    pub fn is_nothing(&self) -> bool {
        self.id == "Nothing" && self.fields.borrow().is_empty()
    }

    /// Reads a field's value.
    ///
    /// # Panics
    /// Panics if `name` is not a field of this value — analysis is expected
    /// to have rejected any program that could reach this, making a missing
    /// field here an internal error rather than a user-facing one.
    #[must_use]
    pub fn get(&self, name: &str) -> SymbolValue {
        self.fields
            .borrow()
            .get(name)
            .unwrap_or_else(|| panic!("internal error: composite `{}` has no field `{name}`", self.id))
            .clone()
    }

    /// Writes a field's value, overwriting whatever was there before.
    pub fn set(&self, name: &str, value: SymbolValue) {
        self.fields.borrow_mut().insert(name.to_owned(), value);
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.fields.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn shares_storage_with(&self, other: &CompositeValue) -> bool {
        Rc::ptr_eq(&self.fields, &other.fields)
    }
}

/// A function value: its body, parameter contract, and declared return type.
///
/// Produced either by a `Function` AST node (a user-defined function) or by
/// [`crate::stdlib`]'s runtime-binding mechanism (a native function exposed
/// to the language as an ordinary callable).
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub name: Option<String>,
    pub parameters: Vec<String>,
    pub parameter_types: IndexMap<String, Type>,
    pub placeholders: IndexMap<String, PlaceholderHandle>,
    pub return_type: Option<Type>,
    pub body: Rc<Statements>,
    /// Set for stdlib-provided bindings; see `SymbolFlags::stdlib`.
    pub is_stdlib: bool,
}

impl FunctionValue {
    #[must_use]
    pub fn function_type(&self) -> Type {
        Type::Function(Rc::new(crate::types::FunctionTypeData {
            parameter_types: self.parameters.iter().map(|p| self.parameter_types[p].clone()).collect(),
            return_type: self.return_type.clone(),
            placeholders: self.placeholders.clone(),
        }))
    }
}

/// A runtime value together with the static type it currently carries.
#[derive(Debug, Clone)]
pub struct SymbolValue {
    pub value_type: Type,
    pub kind: ValueKind,
}

#[derive(Debug, Clone)]
pub enum ValueKind {
    Primitive(PrimitiveValue),
    Composite(CompositeValue),
    Function(Rc<FunctionValue>),
}

impl SymbolValue {
    #[must_use]
    pub fn boolean(b: bool) -> Self {
        Self {
            value_type: Type::Boolean,
            kind: ValueKind::Primitive(PrimitiveValue::Boolean(b)),
        }
    }

    #[must_use]
    pub fn number(n: f64) -> Self {
        Self {
            value_type: Type::Number,
            kind: ValueKind::Primitive(PrimitiveValue::Number(n)),
        }
    }

    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self {
            value_type: Type::String,
            kind: ValueKind::Primitive(PrimitiveValue::String(s.into())),
        }
    }

    #[must_use]
    pub fn nothing() -> Self {
        Self {
            value_type: nothing_type(),
            kind: ValueKind::Composite(CompositeValue::nothing()),
        }
    }

    #[must_use]
    pub fn composite(value_type: Type, value: CompositeValue) -> Self {
        Self {
            value_type,
            kind: ValueKind::Composite(value),
        }
    }

    #[must_use]
    pub fn function(value_type: Type, value: Rc<FunctionValue>) -> Self {
        Self {
            value_type,
            kind: ValueKind::Function(value),
        }
    }

    /// Overwrites the static type this value is tagged with, leaving the
    /// underlying runtime value untouched. Used when a variable assignment
    /// carries an explicit type annotation.
    #[must_use]
    pub fn with_type(mut self, value_type: Type) -> Self {
        self.value_type = value_type;
        self
    }

    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match &self.kind {
            ValueKind::Primitive(PrimitiveValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_composite(&self) -> Option<&CompositeValue> {
        match &self.kind {
            ValueKind::Composite(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function(&self) -> Option<&Rc<FunctionValue>> {
        match &self.kind {
            ValueKind::Function(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::Primitive(PrimitiveValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for SymbolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Primitive(p) => write!(f, "{p}"),
            ValueKind::Composite(c) if c.is_nothing() => write!(f, "Nothing"),
            ValueKind::Composite(c) => write!(f, "{}(..)", c.id),
            ValueKind::Function(func) => write!(f, "<function{}>", func.name.as_deref().map_or_else(String::new, |n| format!(" {n}"))),
        }
    }
}

impl PartialEq for SymbolValue {
    /// Value equality, used by the round-trip tests: primitives compare by
    /// value; composites and functions compare by reference identity, since
    /// two structurally identical composites are still distinct objects.
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (ValueKind::Primitive(a), ValueKind::Primitive(b)) => a == b,
            (ValueKind::Composite(a), ValueKind::Composite(b)) => a.shares_storage_with(b),
            (ValueKind::Function(a), ValueKind::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
