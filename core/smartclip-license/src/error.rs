//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Input does not have the shape of a license key.
    #[error("invalid license key format: {0}")]
    InvalidFormat(String),

    /// Well-formed key whose checksum does not match its payload.
    #[error("license key checksum mismatch")]
    ChecksumMismatch,

    /// Required configuration (usually the shared secret) is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The payment processor does not know this key.
    #[error("license key not recognized by provider")]
    InvalidKey,

    /// License has expired.
    #[error("license expired: {0}")]
    Expired(String),

    /// License was refunded, charged back, cancelled or disabled.
    #[error("license has been revoked: {0}")]
    Revoked(String),

    /// Activation failed.
    #[error("activation failed: {0}")]
    ActivationFailed(String),

    /// Activation limit reached.
    #[error("activation limit reached (max {0} activations)")]
    ActivationLimitReached(u32),

    /// Network error while talking to a provider.
    #[error("network error: {0}")]
    Network(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Stable snake_case identifier, used in API responses and JSON output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "invalid_format",
            Self::ChecksumMismatch => "checksum_mismatch",
            Self::Configuration(_) => "configuration",
            Self::InvalidKey => "invalid_key",
            Self::Expired(_) => "expired",
            Self::Revoked(_) => "revoked",
            Self::ActivationFailed(_) => "activation_failed",
            Self::ActivationLimitReached(_) => "activation_limit",
            Self::Network(_) => "network",
            Self::Storage(_) => "storage",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
