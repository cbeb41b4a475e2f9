use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediasortError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Filesystem errors
    #[error("Directory walker error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    // Metadata errors
    #[error("exiftool is not installed or not in your PATH. Please install it from https://exiftool.org/")]
    ExiftoolNotFound,

    #[error("Exiftool error: {0}")]
    Exiftool(String),

    #[error("Date parsing error: {0}")]
    InvalidDateFormat(String),

    // User interaction
    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Argument error: {0}")]
    Argument(String),
}

/// Details about files that could not be copied or moved into place.
#[derive(Debug)]
pub struct PlacementFailures {
    pub failures: Vec<PlacementFailure>,
}

#[derive(Debug)]
pub struct PlacementFailure {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub error: std::io::Error,
}

impl std::fmt::Display for PlacementFailures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for failure in &self.failures {
            writeln!(
                f,
                "  {} -> {}: {}",
                failure.source.display(),
                failure.destination.display(),
                failure.error
            )?;
        }
        Ok(())
    }
}

impl PlacementFailures {
    pub fn new() -> Self {
        Self { failures: Vec::new() }
    }

    pub fn add(&mut self, source: PathBuf, destination: PathBuf, error: std::io::Error) {
        self.failures.push(PlacementFailure {
            source,
            destination,
            error,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }
}

impl Default for PlacementFailures {
    fn default() -> Self {
        Self::new()
    }
}

/// Result type for mediasort operations.
pub type Result<T> = std::result::Result<T, MediasortError>;
