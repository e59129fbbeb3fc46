//! Error types for license validation

use thiserror::Error;

/// License validation failures
///
/// Every variant maps to a user-facing condition: the caller is expected to
/// show it and block fiscal emission, never to downgrade it to a warning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenseError {
    /// License row exists but was never enabled
    #[error("license is disabled")]
    Disabled,

    /// Validity window has passed
    #[error("license expired on {0}")]
    Expired(String),

    /// Record is bound to a different machine
    #[error("license is bound to a different machine")]
    FingerprintMismatch,

    /// Key does not match the derived key for this record
    #[error("license key is not valid for this record")]
    Invalid,
}

/// Result type for license operations
pub type LicenseResult<T> = Result<T, LicenseError>;
