//! Top-level analyzer driver.
//!
//! `Statements` provides no scope of its own — whatever construct holds one
//! is responsible for pushing and popping around it — and the top-level
//! program is no exception: it runs directly in the root scope frame that
//! [`Environment::new`] creates, so this driver's only real job beyond
//! delegating to [`crate::ast::Statements::analyze`] is installing the
//! standard library first, so references to `runtime_print_newline` and
//! friends resolve, and asserting the scope-balance invariant holds across
//! the whole pass.

use crate::{ast::Statements, diagnostics::Findings, environment::Environment, stdlib};

/// Analyzes a whole program: installs the standard-library bindings, then
/// walks `program` exactly as it would any nested `Statements`.
///
/// Returns the accumulated [`Findings`]. Per the spec, a caller should not
/// proceed to [`crate::interpreter::interpret`] if [`Findings::is_erroneous`]
/// holds — `evaluate`/`interpret` assume analysis already rejected anything
/// that would violate one of their preconditions, and treat a violation as
/// an internal error rather than a user-facing one.
#[must_use]
pub fn analyze(env: &mut Environment, program: &Statements) -> Findings {
    let analysis_depth = env.analysis.depth();
    let type_depth = env.types.depth();

    stdlib::install(env);
    let findings = program.analyze(env);

    debug_assert_eq!(env.analysis.depth(), analysis_depth, "internal error: analyzer driver left the analysis table unbalanced");
    debug_assert_eq!(env.types.depth(), type_depth, "internal error: analyzer driver left the type table unbalanced");

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{Expr, Stmt, VariableAssignment},
        source::{Position, SourceRange},
    };

    fn range() -> SourceRange {
        SourceRange::new(Position(0), Position(1))
    }

    #[test]
    fn stdlib_symbols_are_visible_during_analysis() {
        let mut env = Environment::new("");
        let program = Statements::new(
            vec![Stmt::VariableAssignment(VariableAssignment {
                ident: "x".to_owned(),
                annotation: None,
                expr: Expr::Invocation(crate::ast::Invocation {
                    callee: Box::new(Expr::Reference("runtime_reverse".to_owned(), range())),
                    placeholder_args: Vec::new(),
                    arguments: vec![Expr::StringLiteral("ab".to_owned(), range())],
                    range: range(),
                }),
                range: range(),
            })],
            range(),
        );

        let findings = analyze(&mut env, &program);
        assert!(!findings.is_erroneous(), "{findings}");
    }

    #[test]
    fn leaves_scope_depth_unchanged() {
        let mut env = Environment::new("");
        let program = Statements::new(Vec::new(), range());
        let before = env.analysis.depth();
        analyze(&mut env, &program);
        assert_eq!(env.analysis.depth(), before);
    }
}
