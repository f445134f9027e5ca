//! Error types for proofloom

use thiserror::Error;
use std::io;

/// Library-wide error taxonomy.
///
/// `Domain` errors indicate a violated internal invariant and are never
/// recovered; `User` errors carry a message for the command line;
/// `ResourceExceeded` unwinds to the top-level handler which prints the
/// statistics block before exiting. Minimizer soft failures are not errors:
/// they are handled locally by falling back to the un-minimized interpolant.
#[derive(Error, Debug)]
pub enum ProofloomError {
    #[error("User error: {0}")]
    User(String),

    #[error("Domain invariant violated: {0}")]
    Domain(String),

    #[error("Time limit exceeded")]
    TimeLimit,

    #[error("Memory limit exceeded")]
    MemoryLimit,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("SMT back-end error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ProofloomError>;

impl ProofloomError {
    /// Process exit code for the clausify front-end (0 is success,
    /// 2 and 3 are reserved for signal-terminated runs).
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Whether the top-level handler should emit the spider-fail marker
    /// (programmer bugs, as opposed to bad input or exhausted resources).
    pub fn is_bug(&self) -> bool {
        matches!(self, ProofloomError::Domain(_))
    }
}
