//! Error handling mechanisms.

use crate::reporter::ErasedReportedError;

pub type Result<T = (), E = ErasedReportedError> = std::result::Result<T, E>;

/// The accumulated error state of a pass that keeps going after reporting.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[must_use]
pub enum Health {
    #[default]
    Untainted,
    Tainted(ErasedReportedError),
}

impl Health {
    pub fn taint(&mut self, error: ErasedReportedError) {
        if *self == Self::Untainted {
            *self = Self::Tainted(error);
        }
    }
}

impl From<Result> for Health {
    fn from(result: Result) -> Self {
        match result {
            Ok(()) => Self::Untainted,
            Err(error) => Self::Tainted(error),
        }
    }
}

impl From<Health> for Result {
    fn from(health: Health) -> Self {
        match health {
            Health::Untainted => Ok(()),
            Health::Tainted(error) => Err(error),
        }
    }
}

/// Fold a fallible step into an accumulated [`Health`], continuing with a stand-in.
pub trait Stain<T> {
    fn stain(self, health: &mut Health) -> T;
}

impl<T: PossiblyErroneous> Stain<T> for Result<T> {
    fn stain(self, health: &mut Health) -> T {
        match self {
            Ok(value) => value,
            Err(error) => {
                health.taint(error);
                T::error(error)
            }
        }
    }
}

impl Stain<()> for Result {
    fn stain(self, health: &mut Health) {
        if let Err(error) = self {
            health.taint(error);
        }
    }
}

/// A type with a dedicated error variant.
pub trait PossiblyErroneous {
    fn error(error: ErasedReportedError) -> Self;
}

impl PossiblyErroneous for ErasedReportedError {
    fn error(error: ErasedReportedError) -> Self {
        error
    }
}
