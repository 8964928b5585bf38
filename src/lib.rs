//! The core of a small, statically-typed, tree-walking interpreter for an
//! imperative scripting language.
//!
//! This crate implements three tightly coupled subsystems:
//!
//! - [`analyzer`]: a two-pass static analyzer that resolves identifiers,
//!   checks types, and enforces the language's assignment, return and
//!   loop-only control-flow rules, producing a bag of [`diagnostics`].
//! - [`interpreter`]: a tree-walking interpreter that executes the same AST
//!   after analysis succeeds, using the scoped tables in [`scope`] and the
//!   exception-style [`signal::Signal`] for `return`, `break`, `continue`
//!   and `panic`.
//! - [`symbol`]/[`types`]/[`value`]: the symbol and type model — nominal
//!   composite types, parameterized function types with placeholders, and
//!   the runtime values they describe.
//!
//! The lexer, parser and concrete source grammar are external collaborators.
//! This crate only defines the shape of the AST they are expected to
//! produce (see [`ast`]) and operates on it from there.
//!
//! # Typical use
//!
//! ```
//! use lumen::{analyzer, ast::{Expr, Stmt, Statements, VariableAssignment}, environment::Environment, interpreter, source::{Position, SourceRange}};
//!
//! let range = SourceRange::new(Position(0), Position(1));
//! let program = Statements::new(
//!     vec![Stmt::VariableAssignment(VariableAssignment {
//!         ident: "x".to_owned(),
//!         annotation: None,
//!         expr: Expr::NumberLiteral(1.0, range),
//!         range,
//!     })],
//!     range,
//! );
//!
//! let mut env = Environment::new("x = 1");
//! let findings = analyzer::analyze(&mut env, &program);
//! assert!(!findings.is_erroneous());
//!
//! let outcome = interpreter::interpret(&mut env, &program);
//! assert!(!outcome.is_panic());
//! ```

pub mod analyzer;
pub mod ast;
pub mod diagnostics;
pub mod environment;
pub mod interpreter;
pub mod io;
pub mod scope;
pub mod signal;
pub mod source;
pub mod stdlib;
pub mod symbol;
pub mod types;
pub mod value;

pub use crate::{
    analyzer::analyze,
    diagnostics::{Finding, Findings, Severity},
    environment::Environment,
    interpreter::{Outcome, interpret},
    signal::Signal,
};
