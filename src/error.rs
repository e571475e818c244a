//! Structural failures that cross the library boundary.
//!
//! Per-property numerical problems never become an `AppError`; they are carried
//! as `Estimate::Undefined` inside residual tables. An `AppError` means the call
//! itself could not proceed (bad option, unreadable input, nothing to score).

/// Exit code for rejected options (unknown family, property, or flag value).
pub const EXIT_USAGE: u8 = 2;
/// Exit code for unreadable or invalid input files.
pub const EXIT_INPUT: u8 = 3;
/// Exit code for a search that produced no scorable grid point.
pub const EXIT_SEARCH: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// An option the engine does not support. Never substituted with a default.
    pub fn unsupported(what: &str, value: &str) -> Self {
        Self::new(EXIT_USAGE, format!("Unsupported {what}: '{value}'."))
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
