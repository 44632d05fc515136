//! Application-level error carrying a process exit code.
//!
//! Exit codes used across the crate:
//!
//! - `2`: usage, configuration, or filesystem problems
//! - `3`: performance data unavailable, or the requested date/asset has no data
//! - `4`: internal failures (exports, sample generation)
//!
//! Per-source load problems are *not* `AppError`s: they are reported as
//! [`crate::io::LoadFailure`], logged, and the source is skipped.

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

    /// No source (not even the primary one) produced a usable dataset.
    pub fn data_unavailable() -> Self {
        Self::new(3, "Performance data unavailable: no source could be loaded.")
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::new(3, format!("No performance data found for {what}."))
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
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
