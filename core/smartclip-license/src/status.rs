//! License status and the entitlement record returned by payment processors.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment processors that sell SmartClip Pro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Gumroad,
    LemonSqueezy,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gumroad => write!(f, "gumroad"),
            Self::LemonSqueezy => write!(f, "lemon_squeezy"),
        }
    }
}

impl FromStr for Provider {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "gumroad" => Ok(Self::Gumroad),
            "lemon_squeezy" | "lemonsqueezy" => Ok(Self::LemonSqueezy),
            other => Err(LicenseError::Configuration(format!(
                "unknown license provider: {other}"
            ))),
        }
    }
}

/// The current status of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    /// Paid and in good standing.
    Active,
    /// Not yet activated on any instance (Lemon Squeezy).
    Inactive,
    /// Subscription ended or fixed term ran out.
    Expired,
    /// Subscription cancelled or payment failed.
    Cancelled,
    /// Purchase refunded, charged back or disputed.
    Refunded,
    /// Disabled by the seller.
    Disabled,
}

impl LicenseStatus {
    /// Returns true if advanced features may be unlocked.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A payment processor's verdict on a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub provider: Provider,
    pub status: LicenseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Activations or uses consumed so far.
    #[serde(default)]
    pub activation_usage: u32,
    /// Maximum activations, if the seller set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_limit: Option<u32>,
    /// Instance identifier assigned by the processor on activation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl Entitlement {
    /// An active entitlement with no expiry or limits.
    #[must_use]
    pub fn active(provider: Provider) -> Self {
        Self {
            provider,
            status: LicenseStatus::Active,
            expires_at: None,
            activation_usage: 0,
            activation_limit: None,
            instance_id: None,
        }
    }

    /// Status as of `now`; an active license past its expiry reads as expired.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> LicenseStatus {
        match (self.status, self.expires_at) {
            (LicenseStatus::Active, Some(exp)) if exp <= now => LicenseStatus::Expired,
            (status, _) => status,
        }
    }

    /// Fails unless the entitlement is usable at `now`.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::Expired`] for expired licenses.
    /// - [`LicenseError::Revoked`] for cancelled, refunded or disabled licenses.
    /// - [`LicenseError::ActivationFailed`] for licenses never activated.
    pub fn ensure_usable(&self, now: DateTime<Utc>) -> LicenseResult<()> {
        match self.status_at(now) {
            LicenseStatus::Active => Ok(()),
            LicenseStatus::Expired => Err(LicenseError::Expired(
                self.expires_at
                    .map(|exp| exp.to_rfc3339())
                    .unwrap_or_else(|| "subscription ended".to_string()),
            )),
            LicenseStatus::Cancelled => Err(LicenseError::Revoked("subscription cancelled".into())),
            LicenseStatus::Refunded => Err(LicenseError::Revoked("purchase refunded".into())),
            LicenseStatus::Disabled => Err(LicenseError::Revoked("disabled by seller".into())),
            LicenseStatus::Inactive => {
                Err(LicenseError::ActivationFailed("license is not activated".into()))
            }
        }
    }
}
