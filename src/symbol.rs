//! Symbol entries stored in the analysis and runtime tables.

use crate::{types::Type, value::SymbolValue};

/// Flags attached to every symbol table entry, analysis- and runtime-side
/// alike, so both tables agree on what a name is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolFlags {
    /// Readonly symbols are never reassigned (stdlib bindings are always
    /// readonly; ordinary variables never are).
    pub readonly: bool,
    /// Marks a symbol as a runtime binding (native host function) rather
    /// than one defined in the analyzed program. Its invocation toggles
    /// `ignore_runtime_bindings` on the environment while it runs.
    pub stdlib: bool,
}

impl SymbolFlags {
    #[must_use]
    pub fn stdlib() -> Self {
        Self {
            readonly: true,
            stdlib: true,
        }
    }
}

/// An analysis-table entry: just the static type a name resolves to.
///
/// Once written via `AnalysisTable::set_symbol`, a symbol's `value_type`
/// never changes within that scope — the analyzer relies on this to avoid
/// re-deriving a variable's type on every reference.
#[derive(Debug, Clone)]
pub struct StaticSymbol {
    pub value_type: Type,
}

/// A runtime-table entry: the live value currently bound to a name.
#[derive(Debug, Clone)]
pub struct RuntimeSymbol {
    pub value: SymbolValue,
}
