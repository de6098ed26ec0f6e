//! Exit code constants for the topsub CLI.
//!
//! The submission client has a deliberately narrow exit surface:
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Topology submitted and committed |
//! | 1 | `FAILURE` | Any failure: argument errors, validation rejection, upload or launch failure |
//!
//! A help invocation prints usage and exits 0 without attempting submission.

use crate::error::TopsubError;

/// Type-safe exit code for topsub operations.
///
/// Use the named constants, or [`as_i32()`](Self::as_i32) to get the numeric
/// value for `std::process::exit()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success: the submission attempt ended in the committed state.
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Failure: argument parse error, configuration or plugin resolution
    /// error, validation rejection, upload failure, or launch failure.
    pub const FAILURE: ExitCode = ExitCode(1);

    /// Get the numeric exit code value.
    ///
    /// Use this with `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an `ExitCode` from a raw i32 value.
    ///
    /// Prefer the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl TopsubError {
    /// Map this error to the CLI exit code.
    ///
    /// Every error is a failed submission attempt, so everything maps to
    /// [`ExitCode::FAILURE`].
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::FAILURE
    }
}
