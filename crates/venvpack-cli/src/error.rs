//! Error types for venvpack-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from venvpack-core
    #[error(transparent)]
    Core(#[from] venvpack_core::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
