//! HTTP API for validating and activating SmartClip license keys.
//!
//! - `GET  /api/v1/health`
//! - `POST /api/v1/license/validate`: offline checksum check
//! - `POST /api/v1/license/activate`: offline for SmartClip keys, payment
//!   processor for 32-digit hex keys

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use smartclip_license::provider::LicenseVerifier;
use smartclip_license::{
    activate_offline, mask, normalize, Activation, InstanceName, KeyCodec, KeyShape,
    LicenseError, Provider,
};
use tracing::{info, warn};

/// Instance name used when the extension does not send one.
pub const DEFAULT_INSTANCE_NAME: &str = "smartclip-extension";

/// Shared server state.
pub struct AppState {
    codec: KeyCodec,
    verifiers: HashMap<Provider, Arc<dyn LicenseVerifier>>,
    default_provider: Option<Provider>,
}

impl AppState {
    /// State with offline validation only.
    pub fn new(codec: KeyCodec) -> Self {
        Self {
            codec,
            verifiers: HashMap::new(),
            default_provider: None,
        }
    }

    /// Registers a processor client.
    pub fn with_verifier(mut self, verifier: Arc<dyn LicenseVerifier>) -> Self {
        self.verifiers.insert(verifier.provider(), verifier);
        self
    }

    /// Processor used when a request does not name one.
    pub fn with_default_provider(mut self, provider: Provider) -> Self {
        self.default_provider = Some(provider);
        self
    }

    fn verifier_for(&self, requested: Option<Provider>) -> Option<&Arc<dyn LicenseVerifier>> {
        let provider = requested.or(self.default_provider).or_else(|| {
            // With a single configured processor there is nothing to choose.
            (self.verifiers.len() == 1)
                .then(|| self.verifiers.keys().next().copied())
                .flatten()
        })?;
        self.verifiers.get(&provider)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ValidateRequest {
    pub license_key: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ValidateResponse {
    pub valid: bool,
    pub key: Option<String>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActivateRequest {
    pub license_key: String,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub instance_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActivateResponse {
    pub activated: bool,
    pub activation: Option<Activation>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ActivateResponse {
    fn success(activation: Activation) -> (StatusCode, Json<Self>) {
        let body = Self {
            activated: true,
            activation: Some(activation),
            error: None,
            message: None,
        };
        (StatusCode::OK, Json(body))
    }

    fn failure(err: &LicenseError) -> (StatusCode, Json<Self>) {
        let body = Self {
            activated: false,
            activation: None,
            error: Some(err.code().to_string()),
            message: Some(err.to_string()),
        };
        (status_for(err), Json(body))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

/// HTTP status for a licensing error.
pub fn status_for(err: &LicenseError) -> StatusCode {
    match err {
        LicenseError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
        LicenseError::ChecksumMismatch
        | LicenseError::InvalidKey
        | LicenseError::ActivationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LicenseError::Expired(_) | LicenseError::Revoked(_) => StatusCode::PAYMENT_REQUIRED,
        LicenseError::ActivationLimitReached(_) => StatusCode::CONFLICT,
        LicenseError::Network(_) => StatusCode::BAD_GATEWAY,
        LicenseError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        LicenseError::Storage(_) | LicenseError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn validate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    let result = normalize(&req.license_key)
        .filter(|k| k.shape() == KeyShape::Compact)
        .ok_or_else(|| LicenseError::InvalidFormat("not a SmartClip license key".into()))
        .and_then(|k| state.codec.verify(k.as_str()));

    let body = match result {
        Ok(key) => ValidateResponse {
            valid: true,
            key: Some(key.grouped()),
            error: None,
        },
        Err(e) => {
            info!("Rejected {}: {}", mask(&req.license_key), e);
            ValidateResponse {
                valid: false,
                key: None,
                error: Some(e.code().to_string()),
            }
        }
    };
    Json(body)
}

async fn activate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActivateRequest>,
) -> (StatusCode, Json<ActivateResponse>) {
    let instance = InstanceName::custom(
        req.instance_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_INSTANCE_NAME),
    );

    let Some(normalized) = normalize(&req.license_key) else {
        info!("Malformed key {}", mask(&req.license_key));
        return ActivateResponse::failure(&LicenseError::InvalidFormat(
            "unrecognized license key".into(),
        ));
    };

    if normalized.shape() == KeyShape::Compact {
        return match activate_offline(&state.codec, normalized.as_str(), instance) {
            Ok(activation) => {
                info!("Offline activation for {}", mask(normalized.as_str()));
                ActivateResponse::success(activation)
            }
            Err(e) => {
                info!("Offline activation failed for {}: {}", mask(normalized.as_str()), e);
                ActivateResponse::failure(&e)
            }
        };
    }

    let Some(verifier) = state.verifier_for(req.provider) else {
        warn!("No license provider configured for {:?}", req.provider);
        return ActivateResponse::failure(&LicenseError::Configuration(
            "license provider unavailable".into(),
        ));
    };

    let result = verifier
        .activate(&req.license_key, &instance)
        .await
        .and_then(|ent| ent.ensure_usable(Utc::now()).map(|()| ent));

    match result {
        Ok(ent) => {
            info!("{} activation for {}", ent.provider, mask(normalized.as_str()));
            ActivateResponse::success(Activation::remote(&normalized, instance, ent))
        }
        Err(e) => {
            warn!(
                "{} activation failed for {}: {}",
                verifier.provider(),
                mask(normalized.as_str()),
                e
            );
            ActivateResponse::failure(&e)
        }
    }
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/license/validate", post(validate_handler))
        .route("/api/v1/license/activate", post(activate_handler))
        .with_state(state)
}
