//! The execution environment threaded through every `analyze`/`interpret`/
//! `evaluate`/`resolveType` call.
//!
//! Per the design notes, the "global state" feel of a single
//! analysis/runtime/type table triple is deliberate in the language this
//! core implements; what this crate adds on top is threading that state
//! through an explicit `Environment` parameter instead of process-wide
//! singletons, so multiple independent programs can be analyzed or run side
//! by side (e.g. concurrently in different threads, or repeatedly in a
//! test), and so analysis-only callers can omit the runtime table and
//! streams entirely.

use crate::{
    io::{InputStream, OutputStream},
    scope::{AnalysisTable, RuntimeTable, TypeTable},
};

/// Bundles the three scoped tables, the source text they were built from,
/// and the standard streams the `runtime_print_*` bindings write through.
pub struct Environment {
    pub analysis: AnalysisTable,
    pub runtime: RuntimeTable,
    pub types: TypeTable,
    pub source: String,
    pub stdout: Option<Box<dyn OutputStream>>,
    pub stderr: Option<Box<dyn OutputStream>>,
    pub stdin: Option<Box<dyn InputStream>>,

    /// The target name of the variable assignment currently being analyzed,
    /// if any — the `assignmentTarget` hint from the spec. Set by
    /// `Stmt::Assignment::analyze` for the duration of analyzing its RHS
    /// expression, then restored; consulted by `Expr::Function::analyze` so
    /// a function literal assigned to a name can see that name inside its
    /// own body scope, enabling direct recursion in one analysis pass.
    pub(crate) assignment_hint: Option<String>,

    /// Toggled around the execution of a stdlib-flagged symbol's body.
    ///
    /// Not consulted by this crate's own control flow — every stdlib
    /// binding executes identically regardless of its state — but it is
    /// threaded and restored faithfully so tooling built on top of this
    /// core (steppers, tracers) can tell "we are currently inside
    /// interpreter-native code" apart from ordinary user frames.
    pub(crate) ignore_runtime_bindings: bool,
}

impl Environment {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            analysis: AnalysisTable::new(),
            runtime: RuntimeTable::new(),
            types: TypeTable::new(),
            source: source.into(),
            stdout: None,
            stderr: None,
            stdin: None,
            assignment_hint: None,
            ignore_runtime_bindings: true,
        }
    }

    #[must_use]
    pub fn with_stdout(mut self, stream: Box<dyn OutputStream>) -> Self {
        self.stdout = Some(stream);
        self
    }

    #[must_use]
    pub fn with_stderr(mut self, stream: Box<dyn OutputStream>) -> Self {
        self.stderr = Some(stream);
        self
    }

    /// Runs `body` with `assignment_hint` set to `target`, restoring the
    /// previous hint (almost always `None`) afterwards.
    pub(crate) fn with_assignment_hint<T>(&mut self, target: &str, body: impl FnOnce(&mut Self) -> T) -> T {
        let previous = self.assignment_hint.replace(target.to_owned());
        let result = body(self);
        self.assignment_hint = previous;
        result
    }

    /// Runs `body` with runtime-binding visibility flipped to `false` (i.e.
    /// "not ignored"), restoring the previous value afterwards. See
    /// `ignore_runtime_bindings` for why nothing in this crate reads the
    /// flag back.
    pub(crate) fn during_stdlib_invocation<T>(&mut self, body: impl FnOnce(&mut Self) -> T) -> T {
        let previous = self.ignore_runtime_bindings;
        self.ignore_runtime_bindings = false;
        let result = body(self);
        self.ignore_runtime_bindings = previous;
        result
    }
}
