use super::location::SourceLocation;
use std::collections::HashMap;

/// Structured metadata keys attached to a [`CompileError`] for richer diagnostics.
#[derive(Debug, Eq, Hash, PartialEq, Clone)]
pub enum ErrorMetaDataKey {
    SymbolName,
    CompilationStage,
    ExpectedType,
    FoundType,
    PrimarySuggestion,
}

/// Error taxonomy in the precedence order diagnostics are reported: I/O errors are fatal to
/// a single file; syntax, name resolution, and type errors are non-fatal and mark the
/// offending node invalid; dependency cycles are reported once per cycle; `Internal` is
/// reserved for implementation bugs and is never produced by valid or invalid user input.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    Io,
    Syntax,
    NameResolution,
    Type,
    DependencyCycle,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Io => "I/O Error",
            ErrorKind::Syntax => "Syntax Error",
            ErrorKind::NameResolution => "Name Resolution Error",
            ErrorKind::Type => "Type Error",
            ErrorKind::DependencyCycle => "Dependency Cycle",
            ErrorKind::Internal => "Internal Compiler Error",
        }
    }
}

/// A titled, multi-line supplementary trace, used for dependency-cycle diagnostics that
/// must name every declaration participating in the cycle.
#[derive(Debug, Clone)]
pub struct DiagnosticTrace {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CompileError {
    pub msg: String,
    pub location: SourceLocation,
    pub kind: ErrorKind,
    pub trace: Option<DiagnosticTrace>,
    pub metadata: HashMap<ErrorMetaDataKey, &'static str>,
}

impl CompileError {
    pub fn new(msg: impl Into<String>, location: SourceLocation, kind: ErrorKind) -> Self {
        Self {
            msg: msg.into(),
            location,
            kind,
            trace: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_trace(mut self, title: impl Into<String>, lines: Vec<String>) -> Self {
        self.trace = Some(DiagnosticTrace {
            title: title.into(),
            lines,
        });
        self
    }

    pub fn with_metadata(mut self, key: ErrorMetaDataKey, value: &'static str) -> Self {
        self.metadata.insert(key, value);
        self
    }

    pub fn io(msg: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(msg, location, ErrorKind::Io)
    }

    pub fn syntax(msg: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(msg, location, ErrorKind::Syntax)
    }

    pub fn name_resolution(msg: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(msg, location, ErrorKind::NameResolution)
    }

    pub fn type_error(msg: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(msg, location, ErrorKind::Type)
    }

    pub fn dependency_cycle(
        msg: impl Into<String>,
        location: SourceLocation,
        title: impl Into<String>,
        lines: Vec<String>,
    ) -> Self {
        Self::new(msg, location, ErrorKind::DependencyCycle).with_trace(title, lines)
    }
}

/// Accumulates diagnostics across every pipeline stage. Each phase owns its own list and
/// merges into the driver's shared list at a join point (see §5 of the specification); no
/// locking is required because the pipeline runs on a single thread.
#[derive(Debug, Default)]
pub struct ErrorList {
    errors: Vec<CompileError>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: ErrorList) {
        self.errors.extend(other.errors);
    }

    pub fn is_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompileError> {
        self.errors.iter()
    }

    /// Stable sort by `(filename, line)`, matching §6's diagnostics ordering contract.
    pub fn sorted(mut self) -> Vec<CompileError> {
        self.errors
            .sort_by(|a, b| (&a.location.file, a.location.start.line).cmp(&(&b.location.file, b.location.start.line)));
        self.errors
    }
}

/// Returns a `CompileError` for a syntax violation from the current function.
#[macro_export]
macro_rules! return_syntax_error {
    ($msg:expr, $loc:expr) => {
        return Err($crate::diagnostics::errors::CompileError::syntax($msg, $loc))
    };
}

/// Returns a `CompileError` for a name-resolution violation from the current function.
#[macro_export]
macro_rules! return_name_error {
    ($msg:expr, $loc:expr) => {
        return Err($crate::diagnostics::errors::CompileError::name_resolution($msg, $loc))
    };
}

/// Returns a `CompileError` for a type-system violation from the current function.
#[macro_export]
macro_rules! return_type_error {
    ($msg:expr, $loc:expr) => {
        return Err($crate::diagnostics::errors::CompileError::type_error($msg, $loc))
    };
}

/// Returns a `CompileError` for an internal invariant violation — implementation bug, never
/// triggered by user input.
#[macro_export]
macro_rules! return_internal_error {
    ($msg:expr, $loc:expr) => {
        return Err($crate::diagnostics::errors::CompileError::new(
            $msg,
            $loc,
            $crate::diagnostics::errors::ErrorKind::Internal,
        ))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_orders_by_file_then_line() {
        let mut list = ErrorList::new();
        list.push(CompileError::syntax(
            "b",
            SourceLocation::new("b.kl".into(), CharPositionStub::ten(), CharPositionStub::ten()),
        ));
        list.push(CompileError::syntax(
            "a",
            SourceLocation::new("a.kl".into(), CharPositionStub::one(), CharPositionStub::one()),
        ));
        let sorted = list.sorted();
        assert_eq!(sorted[0].msg, "a");
        assert_eq!(sorted[1].msg, "b");
    }

    // Small local helper so this test doesn't need to depend on the lexer to build positions.
    struct CharPositionStub;
    impl CharPositionStub {
        fn one() -> crate::token::CharPosition {
            crate::token::CharPosition {
                offset: 0,
                line: 1,
                column: 1,
            }
        }
        fn ten() -> crate::token::CharPosition {
            crate::token::CharPosition {
                offset: 0,
                line: 10,
                column: 1,
            }
        }
    }
}
