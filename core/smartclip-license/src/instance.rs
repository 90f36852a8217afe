//! Instance naming for processor activations.
//!
//! Lemon Squeezy counts activations per named instance. The name must be
//! stable across restarts on the same machine, so re-activating does not burn
//! another seat, and must not leak the hostname.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use std::fmt;

const NAME_PREFIX: &str = "smartclip-";
const DIGEST_CHARS: usize = 12;

/// A stable, anonymous name for this installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceName(String);

impl InstanceName {
    /// Derives the name for the current machine.
    #[must_use]
    pub fn current() -> Self {
        Self::from_parts(&[env::consts::OS, env::consts::ARCH, &get_hostname()])
    }

    /// Derives a name from arbitrary identifying parts.
    #[must_use]
    pub fn from_parts(parts: &[&str]) -> Self {
        let hash = Sha256::digest(parts.join("|").as_bytes());
        let encoded = URL_SAFE_NO_PAD.encode(hash);
        Self(format!("{NAME_PREFIX}{}", &encoded[..DIGEST_CHARS]))
    }

    /// Uses a caller-supplied name verbatim.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Gets the machine hostname.
fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
