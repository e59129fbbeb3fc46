//! Error types for print dispatch

use thiserror::Error;

/// Print dispatch failures
///
/// All variants are surfaced to the caller; a failed dispatch never falls
/// back to another device on its own.
#[derive(Debug, Error)]
pub enum PrintError {
    /// No enumerated device name contains the configured substring
    #[error("no printer matching \"{0}\" was found")]
    NoMatchingDevice(String),

    /// Device I/O did not complete within the configured bound
    #[error("print timed out: {0}")]
    PrintTimeout(String),

    /// Device accepted the job but the write failed or was incomplete
    #[error("device write failed: {0}")]
    DeviceWriteFailure(String),

    /// IO error outside the device write itself
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid printer configuration
    #[error("invalid print config: {0}")]
    InvalidConfig(String),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
