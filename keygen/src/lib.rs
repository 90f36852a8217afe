//! Operator tool for SmartClip license keys.
//!
//! Generates keys for manual issuance and checks keys reported by users.
//! The secret comes from `--secret` or `SMARTCLIP_LICENSE_SECRET`; without
//! one the tool refuses to run.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use smartclip_license::{mask, KeyCodec, LicenseError, LicenseSecret, SECRET_ENV_VAR};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "smartclip-keygen")]
#[command(about = "Generate and verify SmartClip license keys")]
pub struct Args {
    /// Number of keys to generate
    #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Verify a key instead of generating; prints VALID or INVALID
    #[arg(long, value_name = "KEY")]
    pub verify: Option<String>,

    /// Shared license secret
    #[arg(long, env = SECRET_ENV_VAR, hide_env_values = true)]
    pub secret: Option<String>,

    /// Print one JSON object per line
    #[arg(long)]
    pub json: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Serialize)]
struct GeneratedLine<'a> {
    key: &'a str,
}

#[derive(Serialize)]
struct VerifyLine {
    key: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

/// Builds the codec from the configured secret.
pub fn codec_from(args: &Args) -> Result<KeyCodec> {
    let raw = args.secret.as_deref().ok_or_else(|| {
        LicenseError::Configuration(format!("{SECRET_ENV_VAR} is not set (or pass --secret)"))
    })?;
    let secret = LicenseSecret::new(raw).context("invalid license secret")?;
    Ok(KeyCodec::new(secret))
}

/// Runs the tool, writing results to `out`.
pub fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    let codec = codec_from(args)?;

    match args.verify.as_deref() {
        Some(key) => verify(&codec, key.trim(), args.json, out),
        None => generate(&codec, args.count, args.json, out),
    }
}

fn generate(codec: &KeyCodec, count: u32, json: bool, out: &mut impl Write) -> Result<()> {
    info!("Generating {} license key(s)", count);
    for _ in 0..count {
        let key = codec.generate().grouped();
        if json {
            serde_json::to_writer(&mut *out, &GeneratedLine { key: &key })?;
            writeln!(out)?;
        } else {
            writeln!(out, "{key}")?;
        }
    }
    Ok(())
}

fn verify(codec: &KeyCodec, key: &str, json: bool, out: &mut impl Write) -> Result<()> {
    let result = codec.verify(key);
    match &result {
        Ok(_) => debug!("Key {} is valid", mask(key)),
        Err(e) => debug!("Key {} rejected: {}", mask(key), e),
    }

    if json {
        let line = VerifyLine {
            key: mask(key),
            valid: result.is_ok(),
            error: result.as_ref().err().map(LicenseError::code),
        };
        serde_json::to_writer(&mut *out, &line)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", if result.is_ok() { "VALID" } else { "INVALID" })?;
    }
    Ok(())
}
