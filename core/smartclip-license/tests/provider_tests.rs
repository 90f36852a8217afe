//! Processor clients against mocked Gumroad / Lemon Squeezy endpoints.

use chrono::Utc;
use serde_json::json;
use smartclip_license::provider::{
    GumroadClient, GumroadConfig, LemonSqueezyClient, LemonSqueezyConfig, LicenseVerifier,
};
use smartclip_license::{normalize, Activation, InstanceName, LicenseError, LicenseStatus, Provider};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GUMROAD_KEY: &str = "85DB562A-C11D4B06-A2335A6B-8C079166";
const LS_KEY: &str = "38b1460a-5104-4067-a91d-77b872934d51";

fn gumroad(server: &MockServer, max_uses: Option<u32>) -> GumroadClient {
    GumroadClient::new(GumroadConfig {
        product_id: "smartclip-pro".into(),
        max_uses,
        api_base_url: server.uri(),
        ..GumroadConfig::default()
    })
    .unwrap()
}

fn lemon(server: &MockServer, config: LemonSqueezyConfig) -> LemonSqueezyClient {
    LemonSqueezyClient::new(LemonSqueezyConfig {
        api_base_url: server.uri(),
        ..config
    })
    .unwrap()
}

fn instance() -> InstanceName {
    InstanceName::custom("smartclip-test")
}

// ── Gumroad ──────────────────────────────────────────────────────

#[test]
fn gumroad_requires_product_id() {
    let result = GumroadClient::new(GumroadConfig::default());
    assert!(matches!(result, Err(LicenseError::Configuration(_))));
}

#[tokio::test]
async fn gumroad_activate_increments_uses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/licenses/verify"))
        .and(body_string_contains("product_id=smartclip-pro"))
        .and(body_string_contains("increment_uses_count=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "uses": 1,
            "purchase": { "refunded": false, "chargebacked": false, "disputed": false }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ent = gumroad(&server, Some(3)).activate(GUMROAD_KEY, &instance()).await.unwrap();
    assert_eq!(ent.provider, Provider::Gumroad);
    assert_eq!(ent.status, LicenseStatus::Active);
    assert_eq!(ent.activation_usage, 1);
    assert_eq!(ent.activation_limit, Some(3));
}

#[tokio::test]
async fn gumroad_validate_does_not_increment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/licenses/verify"))
        .and(body_string_contains("increment_uses_count=false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "uses": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let ent = gumroad(&server, None).validate(GUMROAD_KEY, None).await.unwrap();
    assert_eq!(ent.activation_usage, 2);
}

#[tokio::test]
async fn gumroad_revalidates_stored_activation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/licenses/verify"))
        .and(body_string_contains("license_key=85DB562A-C11D4B06-A2335A6B-8C079166"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "uses": 1})))
        .expect(2)
        .mount(&server)
        .await;
    // Gumroad knows no other spelling of the key.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"success": false})))
        .with_priority(10)
        .mount(&server)
        .await;

    let client = gumroad(&server, None);
    let ent = client.activate(GUMROAD_KEY, &instance()).await.unwrap();
    let activation = Activation::remote(&normalize(GUMROAD_KEY).unwrap(), instance(), ent);
    assert_eq!(activation.key, GUMROAD_KEY);

    let ent = client.validate(&activation.key, None).await.unwrap();
    assert_eq!(ent.status, LicenseStatus::Active);
}

#[tokio::test]
async fn gumroad_unknown_key_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "message": "That license does not exist for the provided product."
        })))
        .mount(&server)
        .await;

    let result = gumroad(&server, None).activate(GUMROAD_KEY, &instance()).await;
    assert!(matches!(result, Err(LicenseError::InvalidKey)));
}

#[tokio::test]
async fn gumroad_refunded_purchase() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "uses": 1,
            "purchase": { "refunded": true }
        })))
        .mount(&server)
        .await;

    let ent = gumroad(&server, None).validate(GUMROAD_KEY, None).await.unwrap();
    assert_eq!(ent.status, LicenseStatus::Refunded);
    assert!(matches!(ent.ensure_usable(Utc::now()), Err(LicenseError::Revoked(_))));
}

#[tokio::test]
async fn gumroad_ended_subscription_is_expired() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "uses": 1,
            "purchase": {
                "subscription_cancelled_at": "2024-05-01T00:00:00Z",
                "subscription_ended_at": "2024-06-01T00:00:00Z"
            }
        })))
        .mount(&server)
        .await;

    let ent = gumroad(&server, None).validate(GUMROAD_KEY, None).await.unwrap();
    assert_eq!(ent.status, LicenseStatus::Expired);
    assert!(ent.expires_at.is_some());
}

#[tokio::test]
async fn gumroad_over_max_uses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "uses": 4})))
        .mount(&server)
        .await;

    let result = gumroad(&server, Some(3)).activate(GUMROAD_KEY, &instance()).await;
    assert!(matches!(result, Err(LicenseError::ActivationLimitReached(3))));
}

#[tokio::test]
async fn gumroad_server_error_is_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = gumroad(&server, None).validate(GUMROAD_KEY, None).await;
    assert!(matches!(result, Err(LicenseError::Network(_))));
}

#[tokio::test]
async fn malformed_key_never_reaches_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = gumroad(&server, None).activate("not-a-key", &instance()).await;
    assert!(matches!(result, Err(LicenseError::InvalidFormat(_))));

    let result = lemon(&server, LemonSqueezyConfig::default())
        .activate("ABCD-EFGH-JKLM-WV4S", &instance())
        .await;
    assert!(matches!(result, Err(LicenseError::InvalidFormat(_))));
}

// ── Lemon Squeezy ────────────────────────────────────────────────

#[tokio::test]
async fn lemon_activate_returns_instance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/licenses/activate"))
        .and(body_string_contains("instance_name=smartclip-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activated": true,
            "error": null,
            "license_key": {
                "status": "active",
                "activation_limit": 3,
                "activation_usage": 1,
                "expires_at": null
            },
            "instance": { "id": "inst_47e1", "name": "smartclip-test" },
            "meta": { "store_id": 100, "product_id": 200 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = lemon(
        &server,
        LemonSqueezyConfig {
            store_id: Some(100),
            product_id: Some(200),
            ..LemonSqueezyConfig::default()
        },
    );
    let ent = client.activate(LS_KEY, &instance()).await.unwrap();
    assert_eq!(client.provider(), Provider::LemonSqueezy);
    assert_eq!(ent.status, LicenseStatus::Active);
    assert_eq!(ent.instance_id.as_deref(), Some("inst_47e1"));
    assert_eq!(ent.activation_limit, Some(3));
}

#[tokio::test]
async fn lemon_wrong_product_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activated": true,
            "license_key": { "status": "active", "activation_usage": 1 },
            "meta": { "store_id": 100, "product_id": 999 }
        })))
        .mount(&server)
        .await;

    let client = lemon(
        &server,
        LemonSqueezyConfig {
            product_id: Some(200),
            ..LemonSqueezyConfig::default()
        },
    );
    let result = client.activate(LS_KEY, &instance()).await;
    assert!(matches!(result, Err(LicenseError::InvalidKey)));
}

#[tokio::test]
async fn lemon_activation_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "activated": false,
            "error": "This license key has reached the activation limit.",
            "license_key": {
                "status": "active",
                "activation_limit": 2,
                "activation_usage": 2
            }
        })))
        .mount(&server)
        .await;

    let result = lemon(&server, LemonSqueezyConfig::default())
        .activate(LS_KEY, &instance())
        .await;
    assert!(matches!(result, Err(LicenseError::ActivationLimitReached(2))));
}

#[tokio::test]
async fn lemon_unknown_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "activated": false,
            "error": "license_key not found."
        })))
        .mount(&server)
        .await;

    let result = lemon(&server, LemonSqueezyConfig::default())
        .activate(LS_KEY, &instance())
        .await;
    assert!(matches!(result, Err(LicenseError::InvalidKey)));
}

#[tokio::test]
async fn lemon_validate_expired_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/licenses/validate"))
        .and(body_string_contains("instance_id=inst_47e1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": false,
            "error": "This license key is expired.",
            "license_key": {
                "status": "expired",
                "activation_limit": 3,
                "activation_usage": 1,
                "expires_at": "2024-01-01T00:00:00.000000Z"
            },
            "instance": { "id": "inst_47e1" }
        })))
        .mount(&server)
        .await;

    let ent = lemon(&server, LemonSqueezyConfig::default())
        .validate(LS_KEY, Some("inst_47e1"))
        .await
        .unwrap();
    assert_eq!(ent.status, LicenseStatus::Expired);
    assert!(ent.expires_at.is_some());
    assert!(matches!(ent.ensure_usable(Utc::now()), Err(LicenseError::Expired(_))));
}

#[tokio::test]
async fn lemon_server_error_is_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = lemon(&server, LemonSqueezyConfig::default())
        .validate(LS_KEY, None)
        .await;
    assert!(matches!(result, Err(LicenseError::Network(_))));
}
