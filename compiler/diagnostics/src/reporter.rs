//! The diagnostic reporter.

use super::{Diagnostic, ErrorCode, Severity};
use span::SourceMap;
use std::{
    collections::BTreeSet,
    mem,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, RwLock, RwLockReadGuard,
    },
};
use utility::{pluralize, Conjunction, ListingExt};

/// A diagnostic reporter.
pub struct Reporter {
    kind: ReporterKind,
    map: Option<Arc<RwLock<SourceMap>>>,
}

impl Reporter {
    fn new(kind: ReporterKind) -> Self {
        Self { kind, map: None }
    }

    pub fn silent() -> Self {
        Self::new(ReporterKind::Silent)
    }

    /// Collect diagnostics into the given shared buffer instead of printing them.
    pub fn buffer(diagnostics: Buffer) -> Self {
        Self::new(ReporterKind::Buffer(diagnostics))
    }

    pub fn stderr() -> Self {
        Self::new(ReporterKind::Stderr)
    }

    /// Buffer errors and warnings and print them sorted by source location on drop.
    pub fn buffered_stderr(reported_any_errors: Arc<AtomicBool>) -> Self {
        Self::new(ReporterKind::BufferedStderr(StderrBuffer {
            errors: Mutex::default(),
            warnings: Mutex::default(),
            reported_any_errors,
        }))
    }

    #[must_use]
    pub fn with_map(mut self, map: Arc<RwLock<SourceMap>>) -> Self {
        self.map = Some(map);
        self
    }

    fn map(&self) -> Option<RwLockReadGuard<'_, SourceMap>> {
        self.map.as_ref().map(|map| map.read().unwrap())
    }

    pub(super) fn report(&self, diagnostic: Diagnostic) -> ErasedReportedError {
        match &self.kind {
            ReporterKind::Silent => {}
            ReporterKind::Buffer(diagnostics) => {
                diagnostics.lock().unwrap().insert(diagnostic);
            }
            ReporterKind::Stderr => stderr_print(&diagnostic.format(self.map().as_deref())),
            ReporterKind::BufferedStderr(buffer) => match diagnostic.severity() {
                Severity::Bug | Severity::Error => {
                    buffer.errors.lock().unwrap().insert(diagnostic);
                }
                Severity::Warning => {
                    buffer.warnings.lock().unwrap().insert(diagnostic);
                }
                Severity::Debug => {
                    stderr_print(&diagnostic.format(self.map().as_deref()));
                }
            },
        }

        ErasedReportedError::new()
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if let ReporterKind::BufferedStderr(buffer) = &self.kind {
            buffer.report(self.map().as_deref());
        }
    }
}

enum ReporterKind {
    Silent,
    Buffer(Buffer),
    Stderr,
    BufferedStderr(StderrBuffer),
}

pub type Buffer = Arc<Mutex<BTreeSet<Diagnostic>>>;

struct StderrBuffer {
    errors: Mutex<BTreeSet<Diagnostic>>,
    warnings: Mutex<BTreeSet<Diagnostic>>,
    reported_any_errors: Arc<AtomicBool>,
}

impl StderrBuffer {
    fn report(&self, map: Option<&SourceMap>) {
        let warnings = mem::take(&mut *self.warnings.lock().unwrap());

        for warning in &warnings {
            stderr_print(&warning.format(map));
        }

        if !warnings.is_empty() {
            Self::report_warning_summary(warnings, map);
        }

        let errors = mem::take(&mut *self.errors.lock().unwrap());

        for error in &errors {
            stderr_print(&error.format(map));
        }

        if !errors.is_empty() {
            self.reported_any_errors.store(true, Ordering::SeqCst);
            Self::report_error_summary(errors, map);
        }
    }

    fn report_error_summary(errors: BTreeSet<Diagnostic>, map: Option<&SourceMap>) {
        let explained_codes: BTreeSet<_> = errors
            .iter()
            .filter_map(|error| error.0.code)
            .filter(|code| code.explanation().is_some())
            .collect();

        let summary = Diagnostic::error()
            .message(pluralize!(
                errors.len(),
                "aborting due to previous error",
                format!("aborting due to {} previous errors", errors.len()),
            ))
            .with(|it| {
                if explained_codes.is_empty() {
                    it
                } else {
                    it.note(format!(
                        "the {errors} {codes} {have} a detailed explanation",
                        errors = pluralize!(explained_codes.len(), "error"),
                        codes = explained_codes.iter().list(Conjunction::And),
                        have = pluralize!(explained_codes.len(), "has", "have"),
                    ))
                }
            })
            .format(map);

        stderr_print(&summary);
    }

    fn report_warning_summary(warnings: BTreeSet<Diagnostic>, map: Option<&SourceMap>) {
        let summary = Diagnostic::warning()
            .message(format!(
                "emitted {} {}",
                warnings.len(),
                pluralize!(warnings.len(), "warning")
            ))
            .format(map);

        stderr_print(&summary);
    }
}

fn stderr_print(message: &impl std::fmt::Display) {
    eprintln!("{message}");
    eprintln!();
}

/// A witness to / token for a [reported](Diagnostic::report) error.
///
/// A value of this type is a proof that an error was reported (neglecting buffering).
/// Using this as an error type instead of let's say `()` makes it a bit harder to
/// accidentally / thoughtlessly return an error without reporting anything
/// since such a witness can only be constructed by [`Diagnostic::report`] or by
/// [`Self::new_unchecked`].
///
/// Values of this type are isomorphic to the zero-sized type `()` and thus memory-wise
/// incredibly cheap. The word _erased_ in the name alludes to the fact that a costly
/// error [`Diagnostic`] has been turned into "nothing in size" (simplifying).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErasedReportedError(());

impl ErasedReportedError {
    pub(super) const fn new() -> Self {
        Self(())
    }

    pub const fn new_unchecked() -> Self {
        Self::new()
    }
}
