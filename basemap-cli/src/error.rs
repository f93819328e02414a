//! CLI error type.

use std::fmt;

use basemap::mosaic::output::OutputError;
use basemap::ImportError;

/// Errors surfaced to the operator with a non-zero exit code.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or inconsistent command-line arguments.
    Args(String),
    /// The import pipeline failed.
    Import(ImportError),
    /// Writing output artifacts failed.
    Output(OutputError),
    /// Other I/O failure (manifest write, signal handler).
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Args(msg) => write!(f, "{}", msg),
            CliError::Import(e) => write!(f, "import failed: {}", e),
            CliError::Output(e) => write!(f, "failed to write output: {}", e),
            CliError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Args(_) => None,
            CliError::Import(e) => Some(e),
            CliError::Output(e) => Some(e),
            CliError::Io(e) => Some(e),
        }
    }
}

impl From<ImportError> for CliError {
    fn from(e: ImportError) -> Self {
        CliError::Import(e)
    }
}

impl From<OutputError> for CliError {
    fn from(e: OutputError) -> Self {
        CliError::Output(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
