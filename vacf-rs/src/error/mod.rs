//! Crate-level error type.

use crate::kernel::{ConfigError, ExecInvariantViolation};
use core::{error, fmt};

/// Unified error for callers that do not care which layer rejected a call.
///
/// Kernel entry points return the layer-specific [`ConfigError`] and
/// [`ExecInvariantViolation`] directly; the convenience functions fold both
/// into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A kernel configuration was rejected before any computation began.
    Config(ConfigError),
    /// A run-time input violated an execution precondition.
    Exec(ExecInvariantViolation),
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ExecInvariantViolation> for Error {
    fn from(value: ExecInvariantViolation) -> Self {
        Self::Exec(value)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(err) => write!(f, "{err}"),
            Error::Exec(err) => write!(f, "{err}"),
        }
    }
}

impl error::Error for Error {}
