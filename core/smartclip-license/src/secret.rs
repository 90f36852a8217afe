//! The shared secret that license checksums are derived from.
//!
//! There is exactly one place a secret enters the system: a [`LicenseSecret`]
//! built at startup and handed to [`KeyCodec`](crate::KeyCodec). An empty or
//! missing secret is a configuration error, never a silent default.

use crate::error::{LicenseError, LicenseResult};
use std::env;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Environment variable holding the shared license secret.
pub const SECRET_ENV_VAR: &str = "SMARTCLIP_LICENSE_SECRET";

/// Shared secret for checksum derivation, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LicenseSecret {
    value: String,
}

impl LicenseSecret {
    /// Wraps a secret value.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Configuration`] if the value is empty or only whitespace.
    pub fn new(value: impl Into<String>) -> LicenseResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(LicenseError::Configuration(
                "license secret must not be empty".to_string(),
            ));
        }
        Ok(Self { value })
    }

    /// Reads the secret from [`SECRET_ENV_VAR`].
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Configuration`] if the variable is unset, not
    /// valid unicode, or empty.
    pub fn from_env() -> LicenseResult<Self> {
        Self::from_env_var(SECRET_ENV_VAR)
    }

    /// Reads the secret from an arbitrary environment variable.
    pub fn from_env_var(name: &str) -> LicenseResult<Self> {
        let value = env::var(name)
            .map_err(|e| LicenseError::Configuration(format!("{name}: {e}")))?;
        Self::new(value)
            .map_err(|_| LicenseError::Configuration(format!("{name} is set but empty")))
    }

    /// Returns the secret text.
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for LicenseSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseSecret")
            .field("value", &"[REDACTED]")
            .finish()
    }
}
