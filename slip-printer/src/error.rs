//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Transport could not be opened (unreachable, permission denied, ...)
    #[error("Connection failed: {0}")]
    Connection(String),

    /// IO error outside of an open document
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout waiting for the transport
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A referenced resource (bitmap file) does not exist
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// Write to an open transport failed
    #[error("Transport write failed: {0}")]
    TransportWrite(String),

    /// Job aborted after `written` lines were delivered
    #[error("Print failed after {written} lines: {source}")]
    PrintFailure {
        written: usize,
        #[source]
        source: Box<PrintError>,
    },

    /// Operation called in the wrong document state
    #[error("Invalid document state: {0}")]
    InvalidState(String),

    /// Operation not available in this build or on this printer
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Bitmap could not be decoded
    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Windows-specific printing error
    #[cfg(windows)]
    #[error("Windows printer error: {0}")]
    WindowsPrinter(String),
}

impl PrintError {
    /// Whether the error leaves the rest of the job printable
    pub fn is_recoverable(&self) -> bool {
        match self {
            PrintError::MissingResource(_) | PrintError::Unsupported(_) => true,
            #[cfg(feature = "image")]
            PrintError::Image(_) => true,
            _ => false,
        }
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
