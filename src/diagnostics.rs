//! Accumulated analysis diagnostics.
//!
//! Mirrors the error-enum-plus-`Display` shape the rest of the crate uses for
//! runtime exceptions (see [`crate::signal`]): diagnostics are plain data,
//! never thrown, and are merged upward as the analyzer walks the tree.

use std::fmt;

use crate::source::SourceRange;

/// Whether a [`Finding`] blocks interpretation or merely warns about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic produced by `analyze`.
///
/// `headline` is the primary message ("variable not defined"); `highlight`
/// is an optional secondary note rendered after the snippet (for example,
/// pointing back at a conflicting declaration). Snippet rendering itself
/// (turning `range` plus source text into the padded, caret-annotated text
/// block described by the spec) is left to the host driver, which has the
/// full source text and presentation preferences; `Finding` only carries the
/// data the driver needs to do that.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub headline: String,
    pub highlight: Option<String>,
    pub range: SourceRange,
}

impl Finding {
    #[must_use]
    pub fn error(headline: impl Into<String>, range: SourceRange) -> Self {
        Self {
            severity: Severity::Error,
            headline: headline.into(),
            highlight: None,
            range,
        }
    }

    #[must_use]
    pub fn warning(headline: impl Into<String>, range: SourceRange) -> Self {
        Self {
            severity: Severity::Warning,
            headline: headline.into(),
            highlight: None,
            range,
        }
    }

    #[must_use]
    pub fn with_highlight(mut self, highlight: impl Into<String>) -> Self {
        self.highlight = Some(highlight.into());
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (at {})", self.severity, self.headline, self.range.begin)?;
        if let Some(highlight) = &self.highlight {
            write!(f, " — {highlight}")?;
        }
        Ok(())
    }
}

/// A bag of errors and warnings accumulated during `analyze`.
///
/// `Findings` never short-circuits on error by itself: every node analyzes
/// its children and merges their findings, leaving the decision of whether
/// to stop (e.g. before `interpret`) to the caller. `merge` is the only way
/// findings from separate subtrees are combined, which keeps ordering
/// predictable (left-to-right, depth-first).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Findings {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl Findings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn of_error(finding: Finding) -> Self {
        let mut findings = Self::new();
        findings.push(finding);
        findings
    }

    pub fn push(&mut self, finding: Finding) {
        match finding.severity {
            Severity::Error => self.errors.push(finding),
            Severity::Warning => self.warnings.push(finding),
        }
    }

    /// Concatenates any number of findings pairwise, preserving order.
    #[must_use]
    pub fn merge(sets: impl IntoIterator<Item = Self>) -> Self {
        let mut combined = Self::new();
        for set in sets {
            combined.errors.extend(set.errors);
            combined.warnings.extend(set.warnings);
        }
        combined
    }

    pub fn extend(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    #[must_use]
    pub fn is_erroneous(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl fmt::Display for Findings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in self.errors.iter().chain(self.warnings.iter()) {
            writeln!(f, "{finding}")?;
        }
        Ok(())
    }
}
