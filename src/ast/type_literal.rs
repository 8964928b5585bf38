//! Named-type references as they appear in source syntax: a bare name
//! (`Number`, `Point`) or a name applied to bracketed type arguments that
//! bind that type's placeholders at the use site (`Box[Number]`).

use indexmap::IndexMap;

use crate::{
    environment::Environment,
    source::SourceRange,
    types::{PlaceholderHandle, Type},
};

#[derive(Debug, Clone)]
pub struct TypeLiteral {
    pub name: String,
    pub arguments: Vec<TypeLiteral>,
    pub range: SourceRange,
}

impl TypeLiteral {
    #[must_use]
    pub fn new(name: impl Into<String>, range: SourceRange) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            range,
        }
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: Vec<TypeLiteral>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Resolves this literal to a concrete [`Type`].
    ///
    /// `placeholders` is consulted first — a function or composite type's own
    /// generic parameters, visible only while resolving pieces of its own
    /// declaration (a parameter type, its return type, a field type). Failing
    /// that, the three primitive names, then named composite types declared
    /// in any scope currently visible in `env`'s type table. `None` means the
    /// name is unknown.
    #[must_use]
    pub fn resolve(&self, env: &Environment, placeholders: &IndexMap<String, PlaceholderHandle>) -> Option<Type> {
        if let Some(handle) = placeholders.get(&self.name) {
            return Some(Type::Placeholder(handle.clone()));
        }

        match self.name.as_str() {
            "Boolean" => return Some(Type::Boolean),
            "Number" => return Some(Type::Number),
            "String" => return Some(Type::String),
            _ => {}
        }

        let base = env.types.find_type(&self.name)?;
        if self.arguments.is_empty() {
            return Some(base);
        }

        match base {
            Type::Composite(data) => {
                let args: Vec<Type> = self
                    .arguments
                    .iter()
                    .map(|argument| argument.resolve(env, placeholders))
                    .collect::<Option<_>>()?;
                Some(Type::Composite(data.instantiate(&args)))
            }
            other => Some(other),
        }
    }
}
