//! End-to-end scenarios built directly against the AST contracts, standing
//! in for the (out-of-scope) parser: each test hand-assembles the `Stmt`/
//! `Expr` tree a parser would have produced for the program in its name,
//! then runs it through the same `analyzer`/`interpreter` pipeline a host
//! driver would.

use std::{cell::RefCell, rc::Rc};

use lumen::{
    analyzer,
    ast::{
        Condition, ControlFlowKind, ControlFlowModifier, Expr, FunctionNode, Invocation, Loop, PropertyWrite, Return,
        Statements, Stmt, TypeDefinition, VariableAssignment,
    },
    environment::Environment,
    interpreter,
    io::OutputStream,
    source::{Position, SourceRange},
    types::Type,
};
use pretty_assertions::assert_eq;

fn range() -> SourceRange {
    SourceRange::new(Position(0), Position(1))
}

fn call(name: &str, arguments: Vec<Expr>) -> Expr {
    Expr::Invocation(Invocation {
        callee: Box::new(Expr::Reference(name.to_owned(), range())),
        placeholder_args: Vec::new(),
        arguments,
        range: range(),
    })
}

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

/// `x = 1` then `y = x` -> no findings; at runtime `y` ends up `1`.
#[test]
fn assignment_then_reference() {
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

    let mut env = Environment::new("x = 1\ny = x");
    let findings = analyzer::analyze(&mut env, &program);
    assert!(!findings.is_erroneous(), "{findings}");
    assert!(findings.warnings.is_empty());

    let outcome = interpreter::interpret(&mut env, &program);
    assert_eq!(outcome, interpreter::Outcome::Completed);

    let y = env.runtime.find("y").unwrap().0.value;
    assert_eq!(y.value_type.to_string(), "Number");
}

/// `x: Boolean = 1` -> exactly one error: the annotation and the value
/// disagree.
#[test]
fn incompatible_annotation_is_one_error() {
    let program = Statements::new(
        vec![Stmt::VariableAssignment(VariableAssignment {
            ident: "x".to_owned(),
            annotation: Some(lumen::ast::TypeLiteral::new("Boolean", range())),
            expr: Expr::NumberLiteral(1.0, range()),
            range: range(),
        })],
        range(),
    );

    let mut env = Environment::new("x: Boolean = 1");
    let findings = analyzer::analyze(&mut env, &program);
    assert_eq!(findings.errors.len(), 1);
}

/// `x = 1` then `x = "hi"` -> exactly one error: `x`'s type is set in stone.
#[test]
fn reassignment_with_incompatible_type_is_one_error() {
    let program = Statements::new(
        vec![
            Stmt::VariableAssignment(VariableAssignment {
                ident: "x".to_owned(),
                annotation: None,
                expr: Expr::NumberLiteral(1.0, range()),
                range: range(),
            }),
            Stmt::VariableAssignment(VariableAssignment {
                ident: "x".to_owned(),
                annotation: None,
                expr: Expr::StringLiteral("hi".to_owned(), range()),
                range: range(),
            }),
        ],
        range(),
    );

    let mut env = Environment::new("x = 1\nx = \"hi\"");
    let findings = analyzer::analyze(&mut env, &program);
    assert_eq!(findings.errors.len(), 1);
}

/// `function () -> Number { if (true) { return 1 } }` -> one "missing a
/// return statement somewhere" error, since the implicit empty false branch
/// never returns.
#[test]
fn function_with_a_branch_missing_return_is_one_error() {
    let body = Statements::new(
        vec![Stmt::Condition(Condition {
            cond: Expr::BooleanLiteral(true, range()),
            true_stmts: Statements::new(
                vec![Stmt::Return(Return {
                    expr: Some(Expr::NumberLiteral(1.0, range())),
                    range: range(),
                })],
                range(),
            ),
            false_stmts: None,
            range: range(),
        })],
        range(),
    );

    let function = Expr::Function(Rc::new(FunctionNode::new(
        Vec::new(),
        Some(lumen::ast::TypeLiteral::new("Number", range())),
        Vec::new(),
        Rc::new(body),
        range(),
    )));

    let program = Statements::new(vec![Stmt::Expression(function)], range());

    let mut env = Environment::new("function () -> Number { if (true) { return 1 } }");
    let findings = analyzer::analyze(&mut env, &program);
    assert_eq!(findings.errors.len(), 1);
    assert!(findings.errors[0].headline.contains("missing a return statement"));
}

/// `while (1) { }` -> one error: the condition needs to evaluate to a
/// boolean.
#[test]
fn loop_with_non_boolean_condition_is_one_error() {
    let program = Statements::new(
        vec![Stmt::Loop(Loop {
            cond: Expr::NumberLiteral(1.0, range()),
            body: Statements::new(Vec::new(), range()),
            range: range(),
        })],
        range(),
    );

    let mut env = Environment::new("while (1) { }");
    let findings = analyzer::analyze(&mut env, &program);
    assert_eq!(findings.errors.len(), 1);
    assert!(findings.errors[0].headline.contains("evaluate to a boolean"));
}

/// `runtime_print_newline("ab")` then `result = runtime_reverse("ab")` in a
/// larger program -> stdout contains `"ab\n"`; `result` ends up `"ba"`.
#[test]
fn stdlib_print_and_reverse_compose() {
    let program = Statements::new(
        vec![
            Stmt::Expression(call("runtime_print_newline", vec![Expr::StringLiteral("ab".to_owned(), range())])),
            Stmt::VariableAssignment(VariableAssignment {
                ident: "result".to_owned(),
                annotation: None,
                expr: call("runtime_reverse", vec![Expr::StringLiteral("ab".to_owned(), range())]),
                range: range(),
            }),
        ],
        range(),
    );

    let captured = Rc::new(RefCell::new(String::new()));
    let mut env = Environment::new("runtime_print_newline(\"ab\")\nresult = runtime_reverse(\"ab\")")
        .with_stdout(Box::new(SharedStream(Rc::clone(&captured))));

    let findings = analyzer::analyze(&mut env, &program);
    assert!(!findings.is_erroneous(), "{findings}");

    let outcome = interpreter::interpret(&mut env, &program);
    assert_eq!(outcome, interpreter::Outcome::Completed);

    assert_eq!(captured.borrow().as_str(), "ab\n");
    let result = env.runtime.find("result").unwrap().0.value;
    assert_eq!(result.as_string(), Some("ba"));
}

/// Reassigning a stdlib-provided name is an analysis error: stdlib bindings
/// are always readonly, per §8's boundary behaviors.
#[test]
fn reassigning_a_stdlib_symbol_is_an_error() {
    let program = Statements::new(
        vec![Stmt::VariableAssignment(VariableAssignment {
            ident: "runtime_reverse".to_owned(),
            annotation: None,
            expr: Expr::BooleanLiteral(true, range()),
            range: range(),
        })],
        range(),
    );

    let mut env = Environment::new("runtime_reverse = true");
    let findings = analyzer::analyze(&mut env, &program);
    assert_eq!(findings.errors.len(), 1);
    assert!(findings.errors[0].headline.contains("readonly"));
}

/// `continue`/`break` outside of a loop are both analysis errors.
#[test]
fn control_flow_modifiers_outside_a_loop_are_errors() {
    for kind in [ControlFlowKind::Continue, ControlFlowKind::Break] {
        let program = Statements::new(vec![Stmt::ControlFlowModifier(ControlFlowModifier { kind, range: range() })], range());
        let mut env = Environment::new("continue/break outside a loop");
        let findings = analyzer::analyze(&mut env, &program);
        assert_eq!(findings.errors.len(), 1);
    }
}

/// A property write onto a field the composite doesn't have is an error, but
/// one onto a field it does have both analyzes cleanly and is observed by a
/// later read through a different reference to the same value.
#[test]
fn property_write_mutates_shared_storage() {
    use indexmap::IndexMap;
    use lumen::types::CompositeTypeData;

    let point_type = Type::Composite(Rc::new(CompositeTypeData {
        id: "Point".to_owned(),
        fields: IndexMap::from([("x".to_owned(), Type::Number)]),
        placeholders: IndexMap::new(),
    }));

    let program = Statements::new(
        vec![
            Stmt::TypeDefinition(TypeDefinition {
                id: "Point".to_owned(),
                fields: vec![("x".to_owned(), lumen::ast::TypeLiteral::new("Number", range()))],
                placeholders: Vec::new(),
                range: range(),
            }),
            Stmt::VariableAssignment(VariableAssignment {
                ident: "p".to_owned(),
                annotation: None,
                expr: call("Point", vec![Expr::NumberLiteral(1.0, range())]),
                range: range(),
            }),
            Stmt::VariableAssignment(VariableAssignment {
                ident: "alias".to_owned(),
                annotation: None,
                expr: Expr::Reference("p".to_owned(), range()),
                range: range(),
            }),
            Stmt::PropertyWrite(PropertyWrite {
                parent: Expr::Reference("alias".to_owned(), range()),
                field: "x".to_owned(),
                value: Expr::NumberLiteral(2.0, range()),
                range: range(),
            }),
        ],
        range(),
    );

    let mut env = Environment::new("Point { x: Number }; p = Point(1); alias = p; alias.x = 2");
    let findings = analyzer::analyze(&mut env, &program);
    assert!(!findings.is_erroneous(), "{findings}");
    assert!(matches!(point_type, Type::Composite(_)));

    let outcome = interpreter::interpret(&mut env, &program);
    assert_eq!(outcome, interpreter::Outcome::Completed);

    let p = env.runtime.find("p").unwrap().0.value;
    let field = p.as_composite().unwrap().get("x");
    let lumen::value::ValueKind::Primitive(lumen::value::PrimitiveValue::Number(x)) = field.kind else {
        panic!("expected a number field");
    };
    assert_eq!(x, 2.0);
}

/// `Box[T] { value: T }` then `Box[Number](5)` -> no findings; the `value`
/// field ends up holding the `Number` `5`, not the unbound placeholder `T`
/// the declaration itself uses.
#[test]
fn generic_composite_construction_binds_its_placeholder() {
    let program = Statements::new(
        vec![
            Stmt::TypeDefinition(TypeDefinition {
                id: "Box".to_owned(),
                fields: vec![("value".to_owned(), lumen::ast::TypeLiteral::new("T", range()))],
                placeholders: vec!["T".to_owned()],
                range: range(),
            }),
            Stmt::VariableAssignment(VariableAssignment {
                ident: "boxed".to_owned(),
                annotation: None,
                expr: Expr::Invocation(Invocation {
                    callee: Box::new(Expr::Reference("Box".to_owned(), range())),
                    placeholder_args: vec![lumen::ast::TypeLiteral::new("Number", range())],
                    arguments: vec![Expr::NumberLiteral(5.0, range())],
                    range: range(),
                }),
                range: range(),
            }),
        ],
        range(),
    );

    let mut env = Environment::new("Box[T] { value: T }; boxed = Box[Number](5)");
    let findings = analyzer::analyze(&mut env, &program);
    assert!(!findings.is_erroneous(), "{findings}");

    let outcome = interpreter::interpret(&mut env, &program);
    assert_eq!(outcome, interpreter::Outcome::Completed);

    let boxed = env.runtime.find("boxed").unwrap().0.value;
    let value = boxed.as_composite().unwrap().get("value");
    let lumen::value::ValueKind::Primitive(lumen::value::PrimitiveValue::Number(n)) = value.kind else {
        panic!("expected a number field");
    };
    assert_eq!(n, 5.0);
}

/// `Box[T] { value: T }` called as `Box(5)`, with no explicit type argument
/// for `T`, is a type-argument arity error rather than a silent bypass.
#[test]
fn generic_composite_construction_without_type_arguments_is_an_error() {
    let program = Statements::new(
        vec![
            Stmt::TypeDefinition(TypeDefinition {
                id: "Box".to_owned(),
                fields: vec![("value".to_owned(), lumen::ast::TypeLiteral::new("T", range()))],
                placeholders: vec!["T".to_owned()],
                range: range(),
            }),
            Stmt::Expression(call("Box", vec![Expr::NumberLiteral(5.0, range())])),
        ],
        range(),
    );

    let mut env = Environment::new("Box[T] { value: T }; Box(5)");
    let findings = analyzer::analyze(&mut env, &program);
    assert!(findings.errors.iter().any(|finding| finding.headline.contains("type argument")));
}

/// A user-defined function calling `runtime_panic` several call frames deep
/// unwinds all the way out to `Outcome::Panicked`, not just out of its own
/// invocation — the `Signal::Panic` raised inside `Invocation::call` has to
/// propagate back out through `evaluate`, not only through `interpret`.
#[test]
fn panic_unwinds_through_a_user_function_call() {
    let body = Statements::new(
        vec![
            Stmt::Expression(call("runtime_panic", vec![Expr::StringLiteral("boom".to_owned(), range())])),
            Stmt::Return(Return { expr: None, range: range() }),
        ],
        range(),
    );
    let blow_up = Expr::Function(Rc::new(FunctionNode::new(Vec::new(), None, Vec::new(), Rc::new(body), range())));

    let program = Statements::new(
        vec![
            Stmt::VariableAssignment(VariableAssignment {
                ident: "blow_up".to_owned(),
                annotation: None,
                expr: blow_up,
                range: range(),
            }),
            Stmt::Expression(call("blow_up", Vec::new())),
        ],
        range(),
    );

    let mut env = Environment::new("blow_up = function () { runtime_panic(\"boom\") return }\nblow_up()");
    let findings = analyzer::analyze(&mut env, &program);
    assert!(!findings.is_erroneous(), "{findings}");

    let outcome = interpreter::interpret(&mut env, &program);
    assert_eq!(outcome, interpreter::Outcome::Panicked("boom".to_owned()));
}

/// A recursive function (calling itself by the name it was assigned to, via
/// the analyzer's `assignment_hint`) computes the expected result, and the
/// runtime table is left exactly as deep as it started once the call
/// returns, even though each recursive call pushes and pops its own frame.
#[test]
fn recursive_function_reaches_its_base_case() {
    let body = Statements::new(
        vec![Stmt::Condition(Condition {
            cond: Expr::Reference("n".to_owned(), range()),
            true_stmts: Statements::new(vec![Stmt::Return(Return { expr: Some(Expr::NumberLiteral(1.0, range())), range: range() })], range()),
            false_stmts: Some(Statements::new(
                vec![Stmt::Return(Return { expr: Some(call("recurse", vec![Expr::BooleanLiteral(true, range())])), range: range() })],
                range(),
            )),
            range: range(),
        })],
        range(),
    );

    let recurse = Expr::Function(Rc::new(FunctionNode::new(
        vec![lumen::ast::Parameter { name: "n".to_owned(), type_literal: lumen::ast::TypeLiteral::new("Boolean", range()) }],
        Some(lumen::ast::TypeLiteral::new("Number", range())),
        Vec::new(),
        Rc::new(body),
        range(),
    )));

    let program = Statements::new(
        vec![
            Stmt::VariableAssignment(VariableAssignment {
                ident: "recurse".to_owned(),
                annotation: None,
                expr: recurse,
                range: range(),
            }),
            Stmt::VariableAssignment(VariableAssignment {
                ident: "result".to_owned(),
                annotation: None,
                expr: call("recurse", vec![Expr::BooleanLiteral(false, range())]),
                range: range(),
            }),
        ],
        range(),
    );

    let mut env = Environment::new("recurse = function (n: Boolean) -> Number { if (n) { return 1 } return recurse(true) }\nresult = recurse(false)");
    let findings = analyzer::analyze(&mut env, &program);
    assert!(!findings.is_erroneous(), "{findings}");

    let before = env.runtime.depth();
    let outcome = interpreter::interpret(&mut env, &program);
    assert_eq!(outcome, interpreter::Outcome::Completed);
    assert_eq!(env.runtime.depth(), before);

    let result = env.runtime.find("result").unwrap().0.value;
    let lumen::value::ValueKind::Primitive(lumen::value::PrimitiveValue::Number(n)) = result.kind else {
        panic!("expected a number result");
    };
    assert_eq!(n, 1.0);
}
