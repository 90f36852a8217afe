//! SmartClip license server.
//!
//! Validates SmartClip keys offline and forwards processor keys to Gumroad or
//! Lemon Squeezy for activation.
//!
//! Usage:
//!   SMARTCLIP_LICENSE_SECRET=... smartclip-license-server --port 8787
//!
//! Processors are enabled by configuring them: `--gumroad-product-id` turns on
//! Gumroad, `--lemon-squeezy` turns on Lemon Squeezy.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use smartclip_license::provider::{
    GumroadClient, GumroadConfig, LemonSqueezyClient, LemonSqueezyConfig,
};
use smartclip_license::{KeyCodec, LicenseSecret, Provider, SECRET_ENV_VAR};
use smartclip_license_server::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "smartclip-license-server")]
#[command(about = "SmartClip license validation and activation API")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// HTTP port
    #[arg(short, long, default_value = "8787")]
    port: u16,

    /// Shared license secret
    #[arg(long, env = SECRET_ENV_VAR, hide_env_values = true)]
    secret: String,

    /// Gumroad product ID; enables Gumroad activation
    #[arg(long, env = "GUMROAD_PRODUCT_ID")]
    gumroad_product_id: Option<String>,

    /// Maximum activations per Gumroad key
    #[arg(long, env = "GUMROAD_MAX_USES")]
    gumroad_max_uses: Option<u32>,

    /// Enable Lemon Squeezy activation
    #[arg(long, env = "LEMON_SQUEEZY_ENABLED")]
    lemon_squeezy: bool,

    /// Only accept Lemon Squeezy keys from this store
    #[arg(long, env = "LEMON_SQUEEZY_STORE_ID")]
    lemon_squeezy_store_id: Option<u64>,

    /// Only accept Lemon Squeezy keys for this product
    #[arg(long, env = "LEMON_SQUEEZY_PRODUCT_ID")]
    lemon_squeezy_product_id: Option<u64>,

    /// Processor for requests that don't name one (gumroad | lemon_squeezy)
    #[arg(long, env = "SMARTCLIP_DEFAULT_PROVIDER")]
    default_provider: Option<Provider>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn build_state(args: &Args) -> Result<AppState> {
    let secret = LicenseSecret::new(args.secret.as_str())
        .context("license secret is required for offline validation")?;
    let mut state = AppState::new(KeyCodec::new(secret));

    if let Some(product_id) = &args.gumroad_product_id {
        let client = GumroadClient::new(GumroadConfig {
            product_id: product_id.clone(),
            max_uses: args.gumroad_max_uses,
            ..GumroadConfig::default()
        })?;
        info!("Gumroad activation enabled for product {}", product_id);
        state = state.with_verifier(Arc::new(client));
    }

    if args.lemon_squeezy {
        let client = LemonSqueezyClient::new(LemonSqueezyConfig {
            store_id: args.lemon_squeezy_store_id,
            product_id: args.lemon_squeezy_product_id,
            ..LemonSqueezyConfig::default()
        })?;
        info!("Lemon Squeezy activation enabled");
        state = state.with_verifier(Arc::new(client));
    }

    if let Some(provider) = args.default_provider {
        state = state.with_default_provider(provider);
    }

    Ok(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("SmartClip license server starting...");
    let state = Arc::new(build_state(&args)?);
    let app = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
