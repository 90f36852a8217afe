//! Gumroad license verification.
//!
//! Uses `POST /v2/licenses/verify`. Gumroad answers unknown keys with
//! `404 {"success": false}`, so the body is parsed for 404 as well.

use super::{http_client, parse_timestamp, processor_key, LicenseVerifier, DEFAULT_TIMEOUT_SECS};
use crate::error::{LicenseError, LicenseResult};
use crate::instance::InstanceName;
use crate::key::mask;
use crate::status::{Entitlement, LicenseStatus, Provider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Gumroad specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GumroadConfig {
    /// Product the keys were sold for.
    pub product_id: String,
    /// Maximum number of activations per key, if enforced.
    pub max_uses: Option<u32>,
    /// Base URL for the Gumroad API (e.g. `https://api.gumroad.com`).
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl Default for GumroadConfig {
    fn default() -> Self {
        Self {
            product_id: String::new(),
            max_uses: None,
            api_base_url: "https://api.gumroad.com".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default)]
    uses: u32,
    message: Option<String>,
    purchase: Option<Purchase>,
}

#[derive(Debug, Default, Deserialize)]
struct Purchase {
    #[serde(default)]
    refunded: bool,
    #[serde(default)]
    chargebacked: bool,
    #[serde(default)]
    disputed: bool,
    subscription_cancelled_at: Option<String>,
    subscription_ended_at: Option<String>,
    subscription_failed_at: Option<String>,
}

/// Client for Gumroad's license API.
pub struct GumroadClient {
    config: GumroadConfig,
    client: Client,
}

impl GumroadClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Configuration`] if `product_id` is empty.
    pub fn new(config: GumroadConfig) -> LicenseResult<Self> {
        if config.product_id.trim().is_empty() {
            return Err(LicenseError::Configuration(
                "Gumroad product_id is required".to_string(),
            ));
        }
        let client = http_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    async fn verify(&self, key: &str, increment_uses_count: bool) -> LicenseResult<Entitlement> {
        processor_key(key)?;
        let url = format!("{}/v2/licenses/verify", self.config.api_base_url);
        debug!("Gumroad verify for {} (increment: {})", mask(key), increment_uses_count);

        let increment = if increment_uses_count { "true" } else { "false" };
        let resp = self
            .client
            .post(&url)
            .form(&[
                ("product_id", self.config.product_id.as_str()),
                ("license_key", key.trim()),
                ("increment_uses_count", increment),
            ])
            .send()
            .await
            .map_err(|e| LicenseError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(LicenseError::Network(format!("Gumroad HTTP {status}")));
        }

        let data: VerifyResponse = resp
            .json()
            .await
            .map_err(|e| LicenseError::Network(e.to_string()))?;

        if !data.success {
            debug!(
                "Gumroad rejected {}: {}",
                mask(key),
                data.message.as_deref().unwrap_or("no message")
            );
            return Err(LicenseError::InvalidKey);
        }

        if let Some(max) = self.config.max_uses {
            if data.uses > max {
                return Err(LicenseError::ActivationLimitReached(max));
            }
        }

        let entitlement = entitlement_from(&data, self.config.max_uses, Utc::now());
        info!("Gumroad verified {} ({:?})", mask(key), entitlement.status);
        Ok(entitlement)
    }
}

fn entitlement_from(data: &VerifyResponse, max_uses: Option<u32>, now: DateTime<Utc>) -> Entitlement {
    let default_purchase = Purchase::default();
    let purchase = data.purchase.as_ref().unwrap_or(&default_purchase);
    let ended_at = parse_timestamp(
        "subscription_ended_at",
        purchase.subscription_ended_at.as_deref(),
    );

    let status = if purchase.refunded || purchase.chargebacked || purchase.disputed {
        LicenseStatus::Refunded
    } else if ended_at.is_some_and(|end| end <= now) {
        LicenseStatus::Expired
    } else if purchase.subscription_failed_at.is_some() {
        LicenseStatus::Cancelled
    } else if purchase.subscription_cancelled_at.is_some() && ended_at.is_none() {
        LicenseStatus::Cancelled
    } else {
        // A cancelled subscription with a future end date stays usable until then.
        LicenseStatus::Active
    };

    Entitlement {
        provider: Provider::Gumroad,
        status,
        expires_at: ended_at,
        activation_usage: data.uses,
        activation_limit: max_uses,
        instance_id: None,
    }
}

#[async_trait]
impl LicenseVerifier for GumroadClient {
    fn provider(&self) -> Provider {
        Provider::Gumroad
    }

    async fn activate(&self, key: &str, _instance: &InstanceName) -> LicenseResult<Entitlement> {
        self.verify(key, true).await
    }

    async fn validate(&self, key: &str, _instance_id: Option<&str>) -> LicenseResult<Entitlement> {
        self.verify(key, false).await
    }
}
