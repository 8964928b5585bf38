//! Top-level interpreter driver.
//!
//! Executes an already-analyzed program and catches a user `panic` at this,
//! the outermost, frame — the one place in the crate where a `Signal::Panic`
//! is allowed to stop rather than propagate further, per the contract that
//! panic unwinds "all the way to the top level".

use crate::{ast::Statements, environment::Environment, signal::Signal, stdlib};

/// The outcome of interpreting a whole program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The program ran to completion without raising a user panic.
    Completed,
    /// `runtime_panic` was invoked — directly, or from inside a user-defined
    /// function it unwound out of — carrying the supplied reason.
    Panicked(String),
}

impl Outcome {
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Outcome::Panicked(_))
    }
}

/// Interprets `program` in `env`.
///
/// Installs the standard library first (a no-op if
/// [`crate::analyzer::analyze`] already did, since `install` only ever
/// rewrites the same four symbols) so a program interpreted without a prior
/// analysis pass — a misuse, but not this function's to prevent — still
/// finds `runtime_print_newline` and friends bound.
///
/// # Panics
/// Panics if any signal other than `Return` (caught by
/// [`crate::ast::expr::Invocation::call`]), `Break`/`Continue` (caught by
/// [`crate::ast::stmt::Loop`]) or `Panic` escapes a statement — that would
/// mean a `return`/`break`/`continue` reached the top level, which static
/// analysis is supposed to make impossible.
#[must_use]
pub fn interpret(env: &mut Environment, program: &Statements) -> Outcome {
    let runtime_depth = env.runtime.depth();

    stdlib::install(env);
    let outcome = match program.interpret(env) {
        Ok(()) => Outcome::Completed,
        Err(Signal::Panic(reason)) => Outcome::Panicked(reason),
        Err(other) => panic!("internal error: `{other}` escaped the top-level program"),
    };

    debug_assert_eq!(env.runtime.depth(), runtime_depth, "internal error: interpreter driver left the runtime table unbalanced");

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analyzer,
        ast::{Expr, Stmt, VariableAssignment},
        source::{Position, SourceRange},
    };

    fn range() -> SourceRange {
        SourceRange::new(Position(0), Position(1))
    }

    #[test]
    fn a_clean_program_completes() {
        let mut env = Environment::new("");
        let program = Statements::new(
            vec![
                Stmt::VariableAssignment(VariableAssignment {
                    ident: "x".to_owned(),
                    annotation: None,
                    expr: Expr::NumberLiteral(1.0, range()),
                    range: range(),
                }),
                Stmt::VariableAssignment(VariableAssignment {
                    ident: "y".to_owned(),
                    annotation: None,
                    expr: Expr::Reference("x".to_owned(), range()),
                    range: range(),
                }),
            ],
            range(),
        );

        assert!(!analyzer::analyze(&mut env, &program).is_erroneous());
        assert_eq!(interpret(&mut env, &program), Outcome::Completed);
        assert_eq!(env.runtime.find("y").unwrap().0.value.as_string(), None);
    }

    #[test]
    fn a_top_level_panic_is_caught_here() {
        let mut env = Environment::new("");
        let program = Statements::new(
            vec![Stmt::Expression(Expr::Invocation(crate::ast::Invocation {
                callee: Box::new(Expr::Reference("runtime_panic".to_owned(), range())),
                placeholder_args: Vec::new(),
                arguments: vec![Expr::StringLiteral("boom".to_owned(), range())],
                range: range(),
            }))],
            range(),
        );

        assert!(!analyzer::analyze(&mut env, &program).is_erroneous());
        assert_eq!(interpret(&mut env, &program), Outcome::Panicked("boom".to_owned()));
    }
}
