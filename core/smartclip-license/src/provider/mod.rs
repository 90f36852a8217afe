//! Remote verification against payment processors.
//!
//! Each processor gets a client implementing [`LicenseVerifier`]. Clients
//! report what the processor says (an [`Entitlement`]); whether that unlocks
//! anything is decided by the caller via [`Entitlement::ensure_usable`].
//!
//! Keys are pre-filtered with [`normalize`] so malformed input never costs a
//! network round trip.

mod gumroad;
mod lemon_squeezy;

pub use gumroad::{GumroadClient, GumroadConfig};
pub use lemon_squeezy::{LemonSqueezyClient, LemonSqueezyConfig};

use crate::error::{LicenseError, LicenseResult};
use crate::instance::InstanceName;
use crate::normalize::{normalize, KeyShape, NormalizedKey};
use crate::status::{Entitlement, Provider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::warn;

/// Default request timeout for processor APIs.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// A payment processor that can activate and re-validate keys.
#[async_trait]
pub trait LicenseVerifier: Send + Sync {
    /// Which processor this is.
    fn provider(&self) -> Provider;

    /// Activates `key` for `instance`, consuming a seat where the processor counts them.
    async fn activate(&self, key: &str, instance: &InstanceName) -> LicenseResult<Entitlement>;

    /// Re-checks `key` without consuming a seat.
    async fn validate(&self, key: &str, instance_id: Option<&str>) -> LicenseResult<Entitlement>;
}

/// Rejects anything that is not a processor-shaped (32 hex digit) key.
pub fn processor_key(raw: &str) -> LicenseResult<NormalizedKey> {
    normalize(raw)
        .filter(|k| k.shape() == KeyShape::Uuid)
        .ok_or_else(|| LicenseError::InvalidFormat("expected a 32-digit hex license key".into()))
}

fn http_client(timeout_secs: u64) -> LicenseResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LicenseError::Configuration(format!("failed to build HTTP client: {e}")))
}

fn parse_timestamp(field: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    match DateTime::parse_from_rfc3339(value) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            warn!("Ignoring unparseable {} '{}': {}", field, value, e);
            None
        }
    }
}
