//! Static types: primitives, nominal composites, function types and the
//! generic-placeholder mechanism that stands in for type parameters.
//!
//! A `Type` is cheap to clone (composites and functions are `Rc`-backed) and
//! is compared structurally via [`Type::compatible_with`] rather than
//! `PartialEq`, since two composite types are only ever "the same type" when
//! their nominal `id`s match — not when their shapes happen to line up.

use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;

/// A generic type parameter of a function or composite type.
///
/// Unbound (`bound = None`) outside of an active invocation or type-literal
/// resolution. [`PlaceholderData::bind`] and the surrounding `peel` calls are
/// always bracketed by a single invocation/resolution; nothing else mutates
/// a placeholder's `bound` field.
#[derive(Debug, Clone)]
pub struct PlaceholderData {
    pub name: String,
    pub bound: Option<Type>,
}

/// Shared handle to a placeholder's mutable binding state.
///
/// Kept as `Rc<RefCell<_>>` rather than by value because the same
/// placeholder is referenced from multiple places at once: the function's
/// `placeholders` map and every parameter/return type that mentions it.
/// Binding through any one of those references must be visible from all the
/// others for the duration of a single invocation.
pub type PlaceholderHandle = Rc<RefCell<PlaceholderData>>;

#[must_use]
pub fn new_placeholder(name: impl Into<String>) -> PlaceholderHandle {
    Rc::new(RefCell::new(PlaceholderData {
        name: name.into(),
        bound: None,
    }))
}

/// A nominal composite (record) type: identity is its declared `id`, never
/// its structure.
#[derive(Debug)]
pub struct CompositeTypeData {
    pub id: String,
    pub fields: IndexMap<String, Type>,
    pub placeholders: IndexMap<String, PlaceholderHandle>,
}

/// A function's static type: parameter types in declaration order, an
/// optional return type, and the function's own placeholders.
#[derive(Debug)]
pub struct FunctionTypeData {
    pub parameter_types: Vec<Type>,
    pub return_type: Option<Type>,
    pub placeholders: IndexMap<String, PlaceholderHandle>,
}

/// The static type of a value or expression.
#[derive(Debug, Clone)]
pub enum Type {
    Boolean,
    Number,
    String,
    Composite(Rc<CompositeTypeData>),
    Function(Rc<FunctionTypeData>),
    Placeholder(PlaceholderHandle),
    /// Sentinel meaning "skip downstream checks" — used for native/opaque
    /// stdlib values whose bodies are not analyzable.
    Ignore,
}

impl Type {
    /// Returns the placeholder's bound type if set, else `self` unchanged.
    ///
    /// Chases a chain of bound placeholders (a placeholder bound to another
    /// placeholder) to a fixed point; a well-formed program never actually
    /// builds such a chain, but peeling defensively avoids surfacing an
    /// unbound `Placeholder` when a concrete type is reachable.
    #[must_use]
    pub fn peel(&self) -> Type {
        let mut current = self.clone();
        loop {
            match &current {
                Type::Placeholder(handle) => match &handle.borrow().bound {
                    Some(bound) => current = bound.clone(),
                    None => return current,
                },
                _ => return current,
            }
        }
    }

    #[must_use]
    pub fn is_ignore(&self) -> bool {
        matches!(self.peel(), Type::Ignore)
    }

    /// The nominal id of a (peeled) composite type, if any.
    #[must_use]
    pub fn composite_id(&self) -> Option<String> {
        match self.peel() {
            Type::Composite(data) => Some(data.id.clone()),
            _ => None,
        }
    }

    /// Looks up a field's type on a (peeled) composite type.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<Type> {
        match self.peel() {
            Type::Composite(data) => data.fields.get(name).cloned(),
            _ => None,
        }
    }

    /// Type compatibility: the relation checked for assignments, parameter
    /// passing and return statements.
    ///
    /// Holds iff, after peeling placeholders on both sides, `self` and
    /// `other` are the same primitive, both composites with equal `id` and
    /// pairwise-compatible fields, both function types with pairwise
    /// compatible parameters and returns, or either side is `Ignore`.
    #[must_use]
    pub fn compatible_with(&self, other: &Type) -> bool {
        let a = self.peel();
        let b = other.peel();

        if matches!(a, Type::Ignore) || matches!(b, Type::Ignore) {
            return true;
        }

        match (&a, &b) {
            (Type::Boolean, Type::Boolean) | (Type::Number, Type::Number) | (Type::String, Type::String) => true,
            (Type::Composite(lhs), Type::Composite(rhs)) => {
                lhs.id == rhs.id
                    && lhs.fields.len() == rhs.fields.len()
                    && lhs.fields.iter().all(|(name, field_type)| {
                        rhs.fields
                            .get(name)
                            .is_some_and(|other_field| field_type.compatible_with(other_field))
                    })
            }
            (Type::Function(lhs), Type::Function(rhs)) => {
                lhs.parameter_types.len() == rhs.parameter_types.len()
                    && lhs
                        .parameter_types
                        .iter()
                        .zip(&rhs.parameter_types)
                        .all(|(l, r)| l.compatible_with(r))
                    && match (&lhs.return_type, &rhs.return_type) {
                        (None, None) => true,
                        (Some(l), Some(r)) => l.compatible_with(r),
                        _ => false,
                    }
            }
            // A still-unbound placeholder is only compatible with an identical one;
            // this only arises while resolving a composite/function's own
            // declaration body, where placeholders stand for "any type".
            (Type::Placeholder(lhs), Type::Placeholder(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Boolean => write!(f, "Boolean"),
            Type::Number => write!(f, "Number"),
            Type::String => write!(f, "String"),
            Type::Composite(data) => write!(f, "{}", data.id),
            Type::Function(data) => {
                write!(f, "(")?;
                for (i, param) in data.parameter_types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> ")?;
                match &data.return_type {
                    Some(ret) => write!(f, "{ret}"),
                    None => write!(f, "Nothing"),
                }
            }
            Type::Placeholder(handle) => write!(f, "{}", handle.borrow().name),
            Type::Ignore => write!(f, "<ignore>"),
        }
    }
}

/// The `Nothing` composite type: the unit type carried by statements and
/// functions that produce no meaningful value.
#[must_use]
pub fn nothing_type() -> Type {
    Type::Composite(Rc::new(CompositeTypeData {
        id: "Nothing".to_owned(),
        fields: IndexMap::new(),
        placeholders: IndexMap::new(),
    }))
}

/// Binds `handle`'s placeholder to `ty` for the scope of a single invocation
/// or type-literal resolution. Callers are responsible for only doing this
/// on a freshly-[`fork`][CompositeTypeData::fork]ed/forked type so the
/// binding cannot leak into a shared declaration.
pub fn bind_placeholder(handle: &PlaceholderHandle, ty: Type) {
    handle.borrow_mut().bound = Some(ty);
}

/// Recursively replaces any `Type::Placeholder` in `ty` that matches one of
/// the `(old, new)` pairs in `mapping` with the corresponding new handle.
/// Leaves everything else untouched; does not allocate a new `Rc` for
/// subtrees that contain no replaced placeholder... except it always must,
/// since `Rc<CompositeTypeData>`/`Rc<FunctionTypeData>` are immutable once
/// built. Nested composite/function types are walked so a placeholder
/// buried in a field or parameter type is substituted too.
fn substitute(ty: &Type, mapping: &[(PlaceholderHandle, PlaceholderHandle)]) -> Type {
    match ty {
        Type::Placeholder(handle) => mapping
            .iter()
            .find(|(old, _)| Rc::ptr_eq(old, handle))
            .map_or_else(|| ty.clone(), |(_, new)| Type::Placeholder(Rc::clone(new))),
        Type::Composite(data) => {
            let fields = data
                .fields
                .iter()
                .map(|(name, field_type)| (name.clone(), substitute(field_type, mapping)))
                .collect();
            Type::Composite(Rc::new(CompositeTypeData {
                id: data.id.clone(),
                fields,
                placeholders: data.placeholders.clone(),
            }))
        }
        Type::Function(data) => {
            let parameter_types = data.parameter_types.iter().map(|p| substitute(p, mapping)).collect();
            let return_type = data.return_type.as_ref().map(|r| substitute(r, mapping));
            Type::Function(Rc::new(FunctionTypeData {
                parameter_types,
                return_type,
                placeholders: data.placeholders.clone(),
            }))
        }
        Type::Boolean | Type::Number | Type::String | Type::Ignore => ty.clone(),
    }
}

impl FunctionTypeData {
    /// Clones this function type with a fresh, independent set of
    /// placeholders so that binding one during an invocation cannot affect
    /// the declaration (or a concurrent analysis of the same declaration).
    #[must_use]
    pub fn fork(&self) -> Rc<FunctionTypeData> {
        let mapping: Vec<(PlaceholderHandle, PlaceholderHandle)> = self
            .placeholders
            .values()
            .map(|old| (Rc::clone(old), new_placeholder(old.borrow().name.clone())))
            .collect();

        let parameter_types = self.parameter_types.iter().map(|p| substitute(p, &mapping)).collect();
        let return_type = self.return_type.as_ref().map(|r| substitute(r, &mapping));
        let placeholders = mapping
            .iter()
            .map(|(old, new)| (old.borrow().name.clone(), Rc::clone(new)))
            .collect();

        Rc::new(FunctionTypeData {
            parameter_types,
            return_type,
            placeholders,
        })
    }
}

impl CompositeTypeData {
    /// Clones this composite type with a fresh set of placeholders bound, in
    /// declaration order, to `args` — the use-site instantiation performed
    /// when resolving a `TypeLiteral` with type arguments (e.g. `Box[Number]`).
    #[must_use]
    pub fn instantiate(&self, args: &[Type]) -> Rc<CompositeTypeData> {
        let mapping: Vec<(PlaceholderHandle, PlaceholderHandle)> = self
            .placeholders
            .values()
            .zip(args)
            .map(|(old, arg)| {
                let new = new_placeholder(old.borrow().name.clone());
                bind_placeholder(&new, arg.clone());
                (Rc::clone(old), new)
            })
            .collect();

        let fields = self
            .fields
            .iter()
            .map(|(name, field_type)| (name.clone(), substitute(field_type, &mapping)))
            .collect();
        let placeholders = mapping
            .iter()
            .map(|(old, new)| (old.borrow().name.clone(), Rc::clone(new)))
            .collect();

        Rc::new(CompositeTypeData {
            id: self.id.clone(),
            fields,
            placeholders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_self_compatible_only() {
        assert!(Type::Number.compatible_with(&Type::Number));
        assert!(!Type::Number.compatible_with(&Type::String));
    }

    #[test]
    fn ignore_is_compatible_with_anything() {
        assert!(Type::Ignore.compatible_with(&Type::Number));
        assert!(Type::String.compatible_with(&Type::Ignore));
    }

    #[test]
    fn composite_equality_is_nominal() {
        let a = Rc::new(CompositeTypeData {
            id: "Point".to_owned(),
            fields: IndexMap::from([("x".to_owned(), Type::Number)]),
            placeholders: IndexMap::new(),
        });
        let b = Rc::new(CompositeTypeData {
            id: "Point".to_owned(),
            fields: IndexMap::from([("x".to_owned(), Type::Number)]),
            placeholders: IndexMap::new(),
        });
        let c = Rc::new(CompositeTypeData {
            id: "Vector".to_owned(),
            fields: IndexMap::from([("x".to_owned(), Type::Number)]),
            placeholders: IndexMap::new(),
        });
        assert!(Type::Composite(a).compatible_with(&Type::Composite(b)));
        assert!(Type::Composite(c.clone()).compatible_with(&Type::Composite(c)));
        let point = Rc::new(CompositeTypeData {
            id: "Point".to_owned(),
            fields: IndexMap::new(),
            placeholders: IndexMap::new(),
        });
        assert!(!Type::Composite(Rc::new(CompositeTypeData {
            id: "Vector".to_owned(),
            fields: IndexMap::new(),
            placeholders: IndexMap::new(),
        }))
        .compatible_with(&Type::Composite(point)));
    }

    #[test]
    fn placeholder_binding_is_scoped_to_the_forked_copy() {
        let placeholder = new_placeholder("T");
        let original = Rc::new(FunctionTypeData {
            parameter_types: vec![Type::Placeholder(Rc::clone(&placeholder))],
            return_type: Some(Type::Placeholder(Rc::clone(&placeholder))),
            placeholders: IndexMap::from([("T".to_owned(), Rc::clone(&placeholder))]),
        });

        let forked = original.fork();
        let forked_placeholder = forked.placeholders["T"].clone();
        bind_placeholder(&forked_placeholder, Type::Number);

        assert!(forked.parameter_types[0].compatible_with(&Type::Number));
        // The original declaration's placeholder is untouched.
        assert!(placeholder.borrow().bound.is_none());
        assert!(!original.parameter_types[0].compatible_with(&Type::Number));
    }
}
