//! Activation records and their on-disk store.
//!
//! An activation remembers which key unlocked this installation and how:
//! offline through the checksum, or remotely through a payment processor.
//! Offline activations never expire; remote ones carry the processor's
//! entitlement and are re-evaluated against the clock on every check.

use crate::error::{LicenseError, LicenseResult};
use crate::instance::InstanceName;
use crate::key::KeyCodec;
use crate::normalize::{normalize, KeyShape, NormalizedKey};
use crate::status::{Entitlement, Provider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const STORE_DIR: &str = "smartclip";
const STORE_FILE: &str = "activation.json";

/// How a key was activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationSource {
    /// Checksum verified locally.
    Offline,
    /// Verified by a payment processor.
    Remote(Provider),
}

/// A successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    /// Offline keys in canonical grouped form; processor keys exactly as issued.
    pub key: String,
    pub source: ActivationSource,
    pub instance: InstanceName,
    pub activated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entitlement: Option<Entitlement>,
}

impl Activation {
    /// Records a processor activation.
    ///
    /// Keeps the key as the user entered it so it can be sent back to the
    /// processor for re-validation.
    #[must_use]
    pub fn remote(key: &NormalizedKey, instance: InstanceName, entitlement: Entitlement) -> Self {
        Self {
            key: key.entered().to_string(),
            source: ActivationSource::Remote(entitlement.provider),
            instance,
            activated_at: Utc::now(),
            entitlement: Some(entitlement),
        }
    }

    /// Returns true if this activation still unlocks features at `now`.
    #[must_use]
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.source, &self.entitlement) {
            (ActivationSource::Offline, _) => true,
            (ActivationSource::Remote(_), Some(ent)) => ent.status_at(now).is_usable(),
            (ActivationSource::Remote(_), None) => false,
        }
    }
}

/// Activates a user-entered key without contacting any server.
///
/// # Errors
///
/// - [`LicenseError::InvalidFormat`] if the input is not a compact license key.
/// - [`LicenseError::ChecksumMismatch`] if the checksum is wrong.
pub fn activate_offline(
    codec: &KeyCodec,
    raw_key: &str,
    instance: InstanceName,
) -> LicenseResult<Activation> {
    let normalized = normalize(raw_key)
        .filter(|k| k.shape() == KeyShape::Compact)
        .ok_or_else(|| LicenseError::InvalidFormat("not a SmartClip license key".to_string()))?;
    let key = codec.verify(normalized.as_str())?;

    debug!("Offline activation for {}", key.masked());
    Ok(Activation {
        key: key.grouped(),
        source: ActivationSource::Offline,
        instance,
        activated_at: Utc::now(),
        entitlement: None,
    })
}

/// JSON file holding the current activation.
#[derive(Debug, Clone)]
pub struct ActivationStore {
    path: PathBuf,
}

impl ActivationStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform config directory (`<config>/smartclip/activation.json`).
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] if the platform has no config directory.
    pub fn default_location() -> LicenseResult<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| LicenseError::Storage("no config directory on this platform".into()))?;
        Ok(Self::new(dir.join(STORE_DIR).join(STORE_FILE)))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored activation; `None` if nothing was stored.
    pub fn load(&self) -> LicenseResult<Option<Activation>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LicenseError::Storage(e.to_string())),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Writes `activation`, replacing any previous one.
    pub fn save(&self, activation: &Activation) -> LicenseResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| LicenseError::Storage(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(activation)?;
        fs::write(&self.path, json).map_err(|e| LicenseError::Storage(e.to_string()))
    }

    /// Removes the stored activation. Missing file is not an error.
    pub fn clear(&self) -> LicenseResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LicenseError::Storage(e.to_string())),
        }
    }
}
