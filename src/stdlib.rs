//! Standard-library runtime bindings: native host behavior exposed to the
//! language as ordinary callable symbols.
//!
//! Grounded on the runtime-bindings mechanism described for `Function`
//! values (see [`crate::value::FunctionValue`]): each binding here is wired
//! in exactly like a user-defined function except its body is a single
//! synthetic [`crate::ast::NativeHook`] statement that calls back into a
//! Rust closure and turns the closure's result into a `Return` signal, so
//! the ordinary invocation machinery in [`crate::ast::expr::Invocation`]
//! collects it without the language needing a dedicated foreign-function
//! interface. `install` is idempotent: calling it more than once on the
//! same `Environment` just rewrites the same four symbols.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    ast::{NativeHook, Statements, Stmt},
    environment::Environment,
    signal::Signal,
    source::{Position, SourceRange},
    symbol::{RuntimeSymbol, StaticSymbol, SymbolFlags},
    types::{FunctionTypeData, Type},
    value::{FunctionValue, SymbolValue},
};

/// Native bindings carry no real source position; every diagnostic that
/// could ever point at one would indicate a bug in this module, not in a
/// user's program, so a single placeholder range is reused throughout.
fn native_range() -> SourceRange {
    SourceRange::point(Position(0))
}

/// Reads a `String`-typed parameter out of the current (innermost) runtime
/// scope, which is exactly where [`crate::ast::expr::Invocation::call`]
/// places a callee's arguments before interpreting its body.
///
/// # Panics
/// Panics if `name` is unbound or not a string — analysis having accepted
/// the call is supposed to make this unreachable, so either case is an
/// internal error rather than a user-facing one.
fn read_string_param(env: &Environment, name: &str) -> String {
    env.runtime
        .find(name)
        .unwrap_or_else(|| panic!("internal error: stdlib binding missing parameter `{name}`"))
        .0
        .value
        .as_string()
        .unwrap_or_else(|| panic!("internal error: stdlib parameter `{name}` is not a string"))
        .to_owned()
}

/// Builds and installs one native binding as both a `StaticSymbol` (flagged
/// `stdlib`, so the analyzer accepts calls to it without inspecting a body)
/// and a matching `RuntimeSymbol` whose value is a `FunctionValue` wrapping
/// `hook`.
fn define(
    env: &mut Environment,
    name: &'static str,
    parameters: &[(&'static str, Type)],
    return_type: Option<Type>,
    hook: Rc<dyn Fn(&mut Environment) -> Result<SymbolValue, Signal>>,
) {
    let parameter_names: Vec<String> = parameters.iter().map(|(name, _)| (*name).to_owned()).collect();
    let parameter_types: IndexMap<String, Type> =
        parameters.iter().map(|(name, ty)| ((*name).to_owned(), ty.clone())).collect();

    let function_type = Rc::new(FunctionTypeData {
        parameter_types: parameter_names.iter().map(|name| parameter_types[name].clone()).collect(),
        return_type: return_type.clone(),
        placeholders: IndexMap::new(),
    });

    let body = Rc::new(Statements::new(
        vec![Stmt::NativeHook(NativeHook { hook, range: native_range() })],
        native_range(),
    ));

    let function_value = Rc::new(FunctionValue {
        name: Some(name.to_owned()),
        parameters: parameter_names,
        parameter_types,
        placeholders: IndexMap::new(),
        return_type,
        body,
        is_stdlib: true,
    });

    env.analysis.set_symbol(
        name,
        StaticSymbol {
            value_type: Type::Function(Rc::clone(&function_type)),
        },
        SymbolFlags::stdlib(),
    );
    env.runtime.set_symbol(
        name,
        RuntimeSymbol {
            value: SymbolValue::function(Type::Function(function_type), function_value),
        },
        SymbolFlags::stdlib(),
    );
}

/// Installs the four core standard-library bindings named in the spec into
/// `env`'s root scope: `runtime_print_newline`, `runtime_print_no_newline`,
/// `runtime_panic`, `runtime_reverse`. Call this before analyzing or
/// interpreting a program — [`crate::analyzer::analyze`] and
/// [`crate::interpreter::interpret`] both do, so callers normally never need
/// to call it directly.
pub fn install(env: &mut Environment) {
    define(
        env,
        "runtime_print_newline",
        &[("message", Type::String)],
        None,
        Rc::new(|env| {
            let message = read_string_param(env, "message");
            if let Some(stream) = env.stdout.as_mut() {
                stream.write_line(&message);
            }
            Ok(SymbolValue::nothing())
        }),
    );

    define(
        env,
        "runtime_print_no_newline",
        &[("message", Type::String)],
        None,
        Rc::new(|env| {
            let message = read_string_param(env, "message");
            if let Some(stream) = env.stdout.as_mut() {
                stream.write_chunk(&message);
            }
            Ok(SymbolValue::nothing())
        }),
    );

    define(
        env,
        "runtime_panic",
        &[("reason", Type::String)],
        None,
        Rc::new(|env| Err(Signal::Panic(read_string_param(env, "reason")))),
    );

    define(
        env,
        "runtime_reverse",
        &[("message", Type::String)],
        Some(Type::String),
        Rc::new(|env| {
            let message = read_string_param(env, "message");
            // Reverses by Unicode scalar value. The spec's "code units" comes
            // from a host language with UTF-16 strings; Rust's `String` is
            // UTF-8, so there is no narrower unit than `char` to reverse by
            // without risking invalid strings out the other end.
            Ok(SymbolValue::string(message.chars().rev().collect::<String>()))
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Invocation};

    fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::Invocation(Invocation {
            callee: Box::new(Expr::Reference(name.to_owned(), native_range())),
            placeholder_args: Vec::new(),
            arguments: args,
            range: native_range(),
        })
    }

    #[test]
    fn reverse_round_trips_ascii() {
        let mut env = Environment::new("");
        install(&mut env);

        let expr = call("runtime_reverse", vec![Expr::StringLiteral("ab".to_owned(), native_range())]);
        assert!(!expr.analyze(&mut env).is_erroneous());
        let result = expr.evaluate(&mut env).expect("reverse does not panic");
        assert_eq!(result.as_string(), Some("ba"));
    }

    #[test]
    fn print_newline_writes_through_stdout() {
        use std::{cell::RefCell, rc::Rc};

        use crate::io::OutputStream;

        #[derive(Debug)]
        struct SharedStream(Rc<RefCell<String>>);
        impl OutputStream for SharedStream {
            fn write_line(&mut self, text: &str) {
                self.0.borrow_mut().push_str(text);
                self.0.borrow_mut().push('\n');
            }
            fn write_chunk(&mut self, text: &str) {
                self.0.borrow_mut().push_str(text);
            }
        }

        let captured = Rc::new(RefCell::new(String::new()));
        let mut env = Environment::new("").with_stdout(Box::new(SharedStream(Rc::clone(&captured))));
        install(&mut env);

        let expr = call("runtime_print_newline", vec![Expr::StringLiteral("ab".to_owned(), native_range())]);
        assert!(!expr.analyze(&mut env).is_erroneous());
        expr.evaluate(&mut env).expect("print does not panic");

        assert_eq!(captured.borrow().as_str(), "ab\n");
    }

    #[test]
    fn panic_raises_a_panic_signal() {
        let mut env = Environment::new("");
        install(&mut env);

        let expr = call("runtime_panic", vec![Expr::StringLiteral("boom".to_owned(), native_range())]);
        assert!(!expr.analyze(&mut env).is_erroneous());

        let result = expr.evaluate(&mut env);
        assert!(matches!(result, Err(Signal::Panic(reason)) if reason == "boom"));
    }

    #[test]
    fn stdlib_symbols_are_readonly() {
        let mut env = Environment::new("");
        install(&mut env);
        let (_, flags) = env.analysis.find("runtime_reverse").unwrap();
        assert!(flags.readonly);
        assert!(flags.stdlib);
    }
}
