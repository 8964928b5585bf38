//! Output streams used by runtime bindings such as `runtime_print_newline`.
//!
//! Grounded on the host's print-writer abstraction: a small trait the
//! interpreter writes through, with a handful of concrete implementations
//! (real stdout, an in-memory collector for tests, and a sink that discards
//! everything). Keeping this as a trait rather than hard-coding `io::stdout`
//! is what lets analysis-only runs omit streams entirely and lets tests
//! assert on captured output instead of racing real file descriptors.

use std::fmt;

/// A single output stream (stdout or stderr) as seen by the language.
///
/// `write_line` appends a newline after `text`; `write_chunk` writes `text`
/// verbatim. These map directly onto the two stdlib bindings
/// `runtime_print_newline` and `runtime_print_no_newline`.
pub trait OutputStream: fmt::Debug {
    fn write_line(&mut self, text: &str);
    fn write_chunk(&mut self, text: &str);
}

/// Writes to the process's real standard streams.
#[derive(Debug, Default)]
pub struct StdStream {
    target: StdTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum StdTarget {
    #[default]
    Out,
    Err,
}

impl StdStream {
    #[must_use]
    pub fn stdout() -> Self {
        Self { target: StdTarget::Out }
    }

    #[must_use]
    pub fn stderr() -> Self {
        Self { target: StdTarget::Err }
    }
}

impl OutputStream for StdStream {
    fn write_line(&mut self, text: &str) {
        match self.target {
            StdTarget::Out => println!("{text}"),
            StdTarget::Err => eprintln!("{text}"),
        }
    }

    fn write_chunk(&mut self, text: &str) {
        use std::io::Write as _;
        match self.target {
            StdTarget::Out => {
                print!("{text}");
                let _ = std::io::stdout().flush();
            }
            StdTarget::Err => {
                eprint!("{text}");
                let _ = std::io::stderr().flush();
            }
        }
    }
}

/// Collects everything written to it into an in-memory buffer.
///
/// The primary way tests observe what a program printed: run the
/// interpreter against a `CollectingStream`, then inspect `output()`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectingStream(String);

impl CollectingStream {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl OutputStream for CollectingStream {
    fn write_line(&mut self, text: &str) {
        self.0.push_str(text);
        self.0.push('\n');
    }

    fn write_chunk(&mut self, text: &str) {
        self.0.push_str(text);
    }
}

/// Discards everything written to it.
#[derive(Debug, Default)]
pub struct NullStream;

impl OutputStream for NullStream {
    fn write_line(&mut self, _text: &str) {}
    fn write_chunk(&mut self, _text: &str) {}
}

/// A source of input lines for the (currently unbound) language-level stdin.
///
/// No stdlib binding in this core reads from stdin yet; the trait exists so
/// `ExecutionEnvironment` can carry an optional input source without the
/// language and host committing to a concrete I/O backend ahead of need.
pub trait InputStream: fmt::Debug {
    fn read_line(&mut self) -> Option<String>;
}
