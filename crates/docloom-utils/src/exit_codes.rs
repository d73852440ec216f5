//! Exit code constants for the docloom CLI.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `USAGE` | Invalid arguments, configuration, or transition |
//! | 9 | `BUSY` | A confirm sequence is already in flight |
//! | 70 | `REMOTE_FAILURE` | The generation service reported a failure |

/// Type-safe exit code for CLI termination.
///
/// The numeric values are part of the public contract; scripts may rely on
/// them to distinguish local mistakes from remote failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Operation completed successfully.
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// General/internal failure not covered by a more specific code.
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// Invalid CLI arguments, configuration, or an illegal transition.
    pub const USAGE: ExitCode = ExitCode(2);

    /// A confirm sequence is already running against the same request.
    pub const BUSY: ExitCode = ExitCode(9);

    /// The remote generation service reported a failure.
    pub const REMOTE_FAILURE: ExitCode = ExitCode(70);

    /// Numeric value for `std::process::exit`.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self.0
    }

    /// Construct from a raw value; unknown values are preserved as-is.
    #[must_use]
    pub fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
