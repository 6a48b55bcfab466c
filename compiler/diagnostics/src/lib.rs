//! The diagnostics system.

pub use code::ErrorCode;
pub use reporter::Reporter;
use reporter::ErasedReportedError;
use span::{SourceMap, Span, Spanning};
use std::{collections::BTreeSet, path::PathBuf};
use utility::Str;

pub mod code;
pub mod error;
mod format;
pub mod reporter;

/// A complex diagnostic message, optionally with source locations.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
#[must_use]
pub struct Diagnostic(Box<UnboxedDiagnostic>);

impl Diagnostic {
    fn new(severity: Severity) -> Self {
        Self(Box::new(UnboxedDiagnostic {
            severity,
            path: None,
            highlights: BTreeSet::new(),
            subdiagnostics: Vec::new(),
            code: None,
            message: None,
        }))
    }

    /// Create a diagnostic for an internal compiler error (ICE).
    pub fn bug() -> Self {
        Self::new(Severity::Bug)
    }

    /// Create a diagnostic for a user error.
    pub fn error() -> Self {
        Self::new(Severity::Error)
    }

    /// Create a diagnostic for a warning.
    pub fn warning() -> Self {
        Self::new(Severity::Warning)
    }

    /// Create a diagnostic for an internal debugging message.
    pub fn debug() -> Self {
        Self::new(Severity::Debug)
    }

    pub fn code(mut self, code: ErrorCode) -> Self {
        self.0.code = Some(code);
        self
    }

    /// Add a text message describing the issue.
    ///
    /// # Strict Guidelines
    ///
    /// * The message should not contain any line breaks (beware when embedding source code snippets!)
    /// * The message should not start with an upper case letter
    /// * The message should not end in a punctuation mark (like a period)
    /// * Surround source code snippets with (directional) single quotation marks,
    ///   i.e. `‘` (U+2018) to the left and `’` (U+2019) to the right
    pub fn message(mut self, message: impl Into<Str>) -> Self {
        self.0.message = Some(message.into());
        self
    }

    fn span(mut self, spanning: impl Spanning, label: Option<Str>, role: Role) -> Self {
        self.0.highlights.insert(Highlight {
            span: spanning.span(),
            label,
            role,
        });
        self
    }

    /// Reference a code snippet as one of the focal points of the diagnostic.
    pub fn primary_span(self, spanning: impl Spanning) -> Self {
        self.span(spanning, None, Role::Primary)
    }

    /// Reference and label a code snippet as one of the focal points of the diagnostic.
    pub fn labeled_primary_span(self, spanning: impl Spanning, label: impl Into<Str>) -> Self {
        self.span(spanning, Some(label.into()), Role::Primary)
    }

    /// Reference a code snippet as auxiliary information for the diagnostic.
    pub fn secondary_span(self, spanning: impl Spanning) -> Self {
        self.span(spanning, None, Role::Secondary)
    }

    /// Reference and label a code snippet as auxiliary information for the diagnostic.
    pub fn labeled_secondary_span(self, spanning: impl Spanning, label: impl Into<Str>) -> Self {
        self.span(spanning, Some(label.into()), Role::Secondary)
    }

    fn subdiagnostic(mut self, severity: Subseverity, message: Str) -> Self {
        self.0.subdiagnostics.push(Subdiagnostic { severity, message });
        self
    }

    /// Add further clarifying information.
    pub fn note(self, message: impl Into<Str>) -> Self {
        self.subdiagnostic(Subseverity::Note, message.into())
    }

    /// Add steps or tips to solve the diagnosed issue.
    pub fn help(self, message: impl Into<Str>) -> Self {
        self.subdiagnostic(Subseverity::Help, message.into())
    }

    pub fn path(mut self, path: PathBuf) -> Self {
        self.0.path = Some(path);
        self
    }

    pub fn with(self, builder: impl FnOnce(Self) -> Self) -> Self {
        builder(self)
    }

    pub fn severity(&self) -> Severity {
        self.0.severity
    }

    pub fn format(&self, map: Option<&SourceMap>) -> String {
        format::format(&self.0, map)
    }

    /// Report the diagnostic.
    pub fn report(self, reporter: &Reporter) -> ErasedReportedError {
        reporter.report(self)
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct UnboxedDiagnostic {
    // Highlights come first since they should have the highest priority when ordering:
    // this places diagnostics in buffered reporters close to source order.
    highlights: BTreeSet<Highlight>,
    path: Option<PathBuf>,
    subdiagnostics: Vec<Subdiagnostic>,
    code: Option<ErrorCode>,
    message: Option<Str>,
    severity: Severity,
}

/// Part of a [complex error message](Diagnostic) providing extra text messages.
#[derive(PartialEq, Eq, Clone, PartialOrd, Ord)]
struct Subdiagnostic {
    severity: Subseverity,
    message: Str,
}

/// Level of severity of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub enum Severity {
    /// An internal compiler error (ICE).
    Bug,
    /// A user error.
    Error,
    Warning,
    Debug,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord)]
enum Subseverity {
    /// An auxiliary note.
    Note,
    /// A message containing steps to solve an issue.
    Help,
}

/// A highlighted code snippet.
#[derive(PartialEq, Eq, Debug, Clone, PartialOrd, Ord)]
struct Highlight {
    span: Span,
    role: Role,
    label: Option<Str>,
}

/// The role of a highlighted code snippet — focal point or auxiliary note.
#[derive(PartialEq, Eq, Debug, Clone, Copy, PartialOrd, Ord)]
enum Role {
    /// A focal point of the diagnostic.
    Primary,
    /// An auxiliary note of the diagnostic.
    Secondary,
}
