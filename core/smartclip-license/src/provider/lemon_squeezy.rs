//! Lemon Squeezy license activation.
//!
//! Uses the public license API (`/v1/licenses/activate` and
//! `/v1/licenses/validate`), which needs no API token. Failures come back as
//! 4xx with a JSON body, so the body is parsed for client errors too.

use super::{http_client, parse_timestamp, processor_key, LicenseVerifier, DEFAULT_TIMEOUT_SECS};
use crate::error::{LicenseError, LicenseResult};
use crate::instance::InstanceName;
use crate::key::mask;
use crate::status::{Entitlement, LicenseStatus, Provider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Lemon Squeezy specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LemonSqueezyConfig {
    /// Reject keys from other stores, if set.
    pub store_id: Option<u64>,
    /// Reject keys for other products, if set.
    pub product_id: Option<u64>,
    /// Base URL for the Lemon Squeezy API (e.g. `https://api.lemonsqueezy.com`).
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl Default for LemonSqueezyConfig {
    fn default() -> Self {
        Self {
            store_id: None,
            product_id: None,
            api_base_url: "https://api.lemonsqueezy.com".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Body shared by the activate and validate endpoints.
#[derive(Debug, Deserialize)]
struct LicenseResponse {
    #[serde(default, alias = "valid")]
    activated: bool,
    error: Option<String>,
    license_key: Option<LicenseKeyInfo>,
    instance: Option<InstanceInfo>,
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct LicenseKeyInfo {
    status: String,
    activation_limit: Option<u32>,
    #[serde(default)]
    activation_usage: u32,
    expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstanceInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Meta {
    store_id: u64,
    product_id: u64,
}

/// Client for Lemon Squeezy's license API.
pub struct LemonSqueezyClient {
    config: LemonSqueezyConfig,
    client: Client,
}

impl LemonSqueezyClient {
    /// Creates a client.
    pub fn new(config: LemonSqueezyConfig) -> LicenseResult<Self> {
        let client = http_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    async fn call(&self, endpoint: &str, form: &[(&str, &str)]) -> LicenseResult<LicenseResponse> {
        let url = format!("{}/v1/licenses/{}", self.config.api_base_url, endpoint);
        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(|e| LicenseError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_server_error() || status.is_redirection() {
            return Err(LicenseError::Network(format!("Lemon Squeezy HTTP {status}")));
        }

        resp.json()
            .await
            .map_err(|e| LicenseError::Network(e.to_string()))
    }

    fn check_owner(&self, meta: Option<&Meta>) -> LicenseResult<()> {
        let Some(meta) = meta else {
            return Ok(());
        };
        if self.config.store_id.is_some_and(|id| id != meta.store_id)
            || self.config.product_id.is_some_and(|id| id != meta.product_id)
        {
            warn!(
                "Key belongs to store {} product {}, not ours",
                meta.store_id, meta.product_id
            );
            return Err(LicenseError::InvalidKey);
        }
        Ok(())
    }

    fn interpret(&self, key: &str, data: LicenseResponse) -> LicenseResult<Entitlement> {
        let message = data.error.clone().unwrap_or_else(|| "unknown error".to_string());
        let Some(info) = data.license_key else {
            debug!("Lemon Squeezy rejected {}: {}", mask(key), message);
            return Err(LicenseError::InvalidKey);
        };
        self.check_owner(data.meta.as_ref())?;

        let entitlement = Entitlement {
            provider: Provider::LemonSqueezy,
            status: map_status(&info.status),
            expires_at: parse_timestamp("expires_at", info.expires_at.as_deref()),
            activation_usage: info.activation_usage,
            activation_limit: info.activation_limit,
            instance_id: data.instance.map(|i| i.id),
        };

        if !data.activated && entitlement.status.is_usable() {
            if let Some(limit) = info.activation_limit {
                if info.activation_usage >= limit {
                    return Err(LicenseError::ActivationLimitReached(limit));
                }
            }
            return Err(LicenseError::ActivationFailed(message));
        }

        // Expired or disabled keys come back with ok=false; report them as facts.
        Ok(entitlement)
    }
}

fn map_status(status: &str) -> LicenseStatus {
    match status {
        "active" => LicenseStatus::Active,
        "inactive" => LicenseStatus::Inactive,
        "expired" => LicenseStatus::Expired,
        "disabled" => LicenseStatus::Disabled,
        other => {
            warn!("Unknown Lemon Squeezy license status '{}'", other);
            LicenseStatus::Disabled
        }
    }
}

#[async_trait]
impl LicenseVerifier for LemonSqueezyClient {
    fn provider(&self) -> Provider {
        Provider::LemonSqueezy
    }

    async fn activate(&self, key: &str, instance: &InstanceName) -> LicenseResult<Entitlement> {
        processor_key(key)?;
        let data = self
            .call(
                "activate",
                &[("license_key", key.trim()), ("instance_name", instance.as_str())],
            )
            .await?;
        let entitlement = self.interpret(key, data)?;
        info!(
            "Lemon Squeezy activated {} on {} ({}/{:?})",
            mask(key),
            instance,
            entitlement.activation_usage,
            entitlement.activation_limit
        );
        Ok(entitlement)
    }

    async fn validate(&self, key: &str, instance_id: Option<&str>) -> LicenseResult<Entitlement> {
        processor_key(key)?;
        let mut form = vec![("license_key", key.trim())];
        if let Some(id) = instance_id {
            form.push(("instance_id", id));
        }
        let data = self.call("validate", &form).await?;
        self.interpret(key, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(map_status("active"), LicenseStatus::Active);
        assert_eq!(map_status("inactive"), LicenseStatus::Inactive);
        assert_eq!(map_status("expired"), LicenseStatus::Expired);
        assert_eq!(map_status("disabled"), LicenseStatus::Disabled);
        assert_eq!(map_status("weird"), LicenseStatus::Disabled);
    }

    #[test]
    fn validate_body_uses_valid_field() {
        let json = r#"{"valid": true, "error": null, "license_key": {"status": "active", "activation_limit": 3, "activation_usage": 1, "expires_at": null}}"#;
        let data: LicenseResponse = serde_json::from_str(json).unwrap();
        assert!(data.activated);
        assert!(data.instance.is_none());
    }
}
