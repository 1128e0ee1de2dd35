//! Exit codes for the CLI tool.

use ppmrc::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Coded stream is truncated or damaged
pub const BAD_STREAM: i32 = 3;
/// Model file is damaged
pub const BAD_MODEL: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadStream,
    BadModel,
    IoError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadStream => BAD_STREAM,
            Self::BadModel => BAD_MODEL,
            Self::IoError => IO_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a ppmrc error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error {
        Error::Io(_) => ExitCode::IoError,
        Error::EndOfInput { .. } | Error::CorruptStream { .. } => ExitCode::BadStream,
        Error::InvalidModel(_) | Error::Json(_) => ExitCode::BadModel,
        Error::InvalidConfig(_) | Error::PartTooSmall { .. } => ExitCode::BadArgs,
        Error::PartMissing { .. } => ExitCode::IoError,
        Error::WorkerStopped => ExitCode::FatalError,
        // Future error variants - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
