//! The abstract syntax tree.
//!
//! A parser is an external collaborator; this module only defines the node
//! shapes it is expected to produce (see the crate root docs). `Expr` and
//! `Stmt` are single tagged-variant enums rather than a trait-object
//! hierarchy, since parser productions are naturally cyclic (a `Condition`
//! holds `Statements`, which holds more statements, one of which might be a
//! `Loop` holding another `Statements`, and so on) — a tagged enum lets every
//! child be stored uniformly without forward-declared trait objects.

pub mod expr;
pub mod stmt;
pub mod type_literal;

pub use expr::{Expr, FunctionNode, Invocation, Parameter};
pub use stmt::{
    Condition, ControlFlowKind, ControlFlowModifier, Loop, NativeHook, PropertyWrite, Return, Statements, Stmt, TypeDefinition,
    VariableAssignment,
};
pub use type_literal::TypeLiteral;
