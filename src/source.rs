//! Source positions shared by every AST node and diagnostic.
//!
//! The lexer and parser are external collaborators (see the crate root docs);
//! this module only defines the small position contract they are expected to
//! produce so that [`crate::diagnostics::Finding`]s and `tokenRange` queries
//! have something to point at.

use std::fmt;

/// A byte offset into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Position(pub u32);

impl Position {
    #[must_use]
    pub fn offset(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The span of source text a node was parsed from.
///
/// `end` is exclusive and optional: some diagnostics (notably internal
/// errors raised far from any single token) only have a begin position to
/// report, matching `Finding`'s `(beginPos, endPos?)` contract in the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SourceRange {
    pub begin: Position,
    pub end: Option<Position>,
}

impl SourceRange {
    #[must_use]
    pub fn new(begin: Position, end: Position) -> Self {
        Self { begin, end: Some(end) }
    }

    /// A range with only a begin position, used when no sensible end exists.
    #[must_use]
    pub fn point(begin: Position) -> Self {
        Self { begin, end: None }
    }
}
