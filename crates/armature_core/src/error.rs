//! Error types for the Armature front-end.

use thiserror::Error;

/// All errors that can be produced by the Armature front-end.
///
/// Ordinary parsing never returns these: malformed input is recovered and
/// surfaced as diagnostics on the parse result.  The error enum exists for
/// the strict entry points, which refuse a diagnostics-bearing parse on
/// behalf of callers that cannot use a partial tree.
#[derive(Debug, Error)]
pub enum ArmatureError {
    /// A syntax error was raised by a strict parse.
    #[error("SyntaxError: {0}")]
    SyntaxError(String),

    /// An internal contract violation that should not occur in normal
    /// operation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenient `Result` alias for fallible front-end operations.
pub type ArmatureResult<T> = Result<T, ArmatureError>;
