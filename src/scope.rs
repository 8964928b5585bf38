//! Stacked-scope symbol tables.
//!
//! Three tables share one design: a stack of scope frames, each mapping a
//! name to a `(symbol, flags)` pair. Lookup walks the stack top-to-bottom;
//! insertion always targets the top frame. `push_scope`/`pop_scope` bracket
//! a lexical block and must be paired on every exit path — normal
//! completion, an early `return`, a `break`/`continue`, or a propagating
//! panic — which is why every driver in this crate pushes a scope in a
//! `push ... ; result = ...; pop ; result` shape rather than relying on
//! early returns to clean up after themselves.

use ahash::AHashMap;

use crate::{
    symbol::{RuntimeSymbol, SymbolFlags, StaticSymbol},
    types::Type,
};

/// One lexical scope's worth of name -> (symbol, flags) bindings.
#[derive(Debug, Default)]
struct Frame<S> {
    bindings: AHashMap<String, (S, SymbolFlags)>,
}

/// A generic stack of scope frames, parameterized over the kind of symbol
/// it stores (`StaticSymbol` for analysis, `RuntimeSymbol` for execution).
#[derive(Debug)]
pub struct ScopeStack<S> {
    frames: Vec<Frame<S>>,
}

impl<S> Default for ScopeStack<S> {
    fn default() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }
}

impl<S: Clone> ScopeStack<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nesting depth, including the always-present root frame.
    /// Used by tests to assert push/pop is balanced across a call.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_scope(&mut self) {
        self.frames.push(Frame::default());
    }

    /// # Panics
    /// Panics if called without a matching `push_scope` (popping the root
    /// frame is always a caller bug, never a user-facing condition).
    pub fn pop_scope(&mut self) {
        assert!(self.frames.len() > 1, "internal error: popped the root scope");
        self.frames.pop();
    }

    /// Walks the stack top-to-bottom looking for `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<(S, SymbolFlags)> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name).cloned())
    }

    /// Inserts or overwrites `name` in the *current* (top) scope.
    ///
    /// Analysis-table callers only ever call this when they've already
    /// established the written type is compatible with whatever was there
    /// before, which is what keeps `StaticSymbol::value_type` effectively
    /// immutable per the table's invariant despite this being a plain
    /// overwrite.
    pub fn set_symbol(&mut self, name: impl Into<String>, symbol: S, flags: SymbolFlags) {
        self.frames
            .last_mut()
            .expect("internal error: no active scope")
            .bindings
            .insert(name.into(), (symbol, flags));
    }

    /// True if `name` is bound in the current (top) scope specifically,
    /// ignoring outer scopes — used to detect "first assignment in this
    /// scope" versus "shadows an outer binding".
    #[must_use]
    pub fn bound_in_current_scope(&self, name: &str) -> bool {
        self.frames
            .last()
            .expect("internal error: no active scope")
            .bindings
            .contains_key(name)
    }
}

/// Analysis-time symbol table: name -> static type.
pub type AnalysisTable = ScopeStack<StaticSymbol>;

/// Runtime symbol table: name -> live value.
pub type RuntimeTable = ScopeStack<RuntimeSymbol>;

/// One type-table scope frame: named types declared in this block, whether
/// this block is (or is directly inside) a loop body, and — if this frame
/// is a function's own scope — that function's declared return type.
#[derive(Debug, Default)]
struct TypeFrame {
    named_types: AHashMap<String, Type>,
    is_loop: bool,
    /// `Some(declared_return_type)` iff this frame is a function's scope.
    /// The inner `Option` is the function's own declared return type
    /// (`None` for a function declared to return nothing).
    function_boundary: Option<Option<Type>>,
}

/// The type table: named composite/function types visible in each scope,
/// plus the control-flow-relevant bits (`loop`, enclosing function's return
/// type) that `break`/`continue`/`return` analysis needs to find by walking
/// outward from the current scope.
#[derive(Debug, Default)]
pub struct TypeTable {
    frames: Vec<TypeFrame>,
}

impl TypeTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![TypeFrame::default()],
        }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_scope(&mut self) {
        self.frames.push(TypeFrame::default());
    }

    pub fn push_loop_scope(&mut self) {
        self.frames.push(TypeFrame {
            is_loop: true,
            ..TypeFrame::default()
        });
    }

    pub fn push_function_scope(&mut self, declared_return_type: Option<Type>) {
        self.frames.push(TypeFrame {
            function_boundary: Some(declared_return_type),
            ..TypeFrame::default()
        });
    }

    /// # Panics
    /// Panics if called without a matching push (see `ScopeStack::pop_scope`).
    pub fn pop_scope(&mut self) {
        assert!(self.frames.len() > 1, "internal error: popped the root type scope");
        self.frames.pop();
    }

    pub fn define_type(&mut self, name: impl Into<String>, ty: Type) {
        self.frames
            .last_mut()
            .expect("internal error: no active type scope")
            .named_types
            .insert(name.into(), ty);
    }

    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<Type> {
        self.frames.iter().rev().find_map(|frame| frame.named_types.get(name).cloned())
    }

    /// True iff some enclosing scope (walking outward from the current one)
    /// is a loop body. Used by `break`/`continue` analysis.
    #[must_use]
    pub fn inside_loop(&self) -> bool {
        self.frames.iter().rev().any(|frame| frame.is_loop)
    }

    /// The declared return type of the nearest enclosing function, per the
    /// "open question" in the spec: loops are walked straight through and do
    /// not themselves bound this search, only a function scope does.
    ///
    /// Returns `None` if there is no enclosing function scope at all, which
    /// signals a `ReturnStatement` reached outside of any function — an
    /// internal error, since analysis is expected to reject that case before
    /// `resolveType`/`evaluate` ever run.
    #[must_use]
    pub fn enclosing_return_type(&self) -> Option<Option<Type>> {
        self.frames.iter().rev().find_map(|frame| frame.function_boundary.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::StaticSymbol;

    #[test]
    fn lookup_walks_outward_through_scopes() {
        let mut table = AnalysisTable::new();
        table.set_symbol("x", StaticSymbol { value_type: Type::Number }, SymbolFlags::default());
        table.push_scope();
        assert!(table.find("x").is_some());
        table.set_symbol("y", StaticSymbol { value_type: Type::Boolean }, SymbolFlags::default());
        table.pop_scope();
        assert!(table.find("y").is_none());
    }

    #[test]
    fn current_scope_shadowing_is_detectable() {
        let mut table = AnalysisTable::new();
        table.set_symbol("x", StaticSymbol { value_type: Type::Number }, SymbolFlags::default());
        table.push_scope();
        assert!(!table.bound_in_current_scope("x"));
    }

    #[test]
    fn loop_flag_is_visible_through_nested_scopes() {
        let mut types = TypeTable::new();
        assert!(!types.inside_loop());
        types.push_loop_scope();
        types.push_scope();
        assert!(types.inside_loop());
        types.pop_scope();
        types.pop_scope();
        assert!(!types.inside_loop());
    }

    #[test]
    fn return_type_search_stops_at_nearest_function() {
        let mut types = TypeTable::new();
        types.push_function_scope(Some(Type::Number));
        types.push_loop_scope();
        let found = types.enclosing_return_type().flatten();
        assert!(found.is_some_and(|ty| ty.compatible_with(&Type::Number)));
    }
}
