//! SmartClip license key generator.
//!
//! Usage:
//!   smartclip-keygen --count=5
//!   smartclip-keygen --verify ABCD-EFGH-JKLM-WV4S
//!
//! The secret is read from `SMARTCLIP_LICENSE_SECRET` unless `--secret` is given.

use std::io;

use anyhow::Result;
use clap::Parser;
use smartclip_keygen::{run, Args};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&args, &mut out)
}
