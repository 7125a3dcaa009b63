//! Diagnostics and error reporting for command scripts
//!
//! Running a script never stops at the first problem. Each line produces a
//! diagnostic instead: what was applied, what was rejected, what could not be
//! parsed.

/// Byte range in the script source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Zero-based line in the script source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn info(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self {
            severity: DiagnosticSeverity::Info,
            message: message.into(),
            location,
        }
    }

    pub fn warning(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            message: message.into(),
            location,
        }
    }

    pub fn error(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            location,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            DiagnosticSeverity::Info => "ok",
            DiagnosticSeverity::Warning => "rejected",
            DiagnosticSeverity::Error => "error",
        };
        match self.location {
            Some(loc) => write!(f, "[{}] line {}: {}", tag, loc.line + 1, self.message),
            None => write!(f, "[{}] {}", tag, self.message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, severity: DiagnosticSeverity) -> usize {
        self.items.iter().filter(|d| d.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(DiagnosticSeverity::Error) > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.count(DiagnosticSeverity::Warning) > 0
    }
}

impl From<Diagnostics> for Vec<Diagnostic> {
    fn from(diagnostics: Diagnostics) -> Self {
        diagnostics.items
    }
}
