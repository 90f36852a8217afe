//! Shared test helpers for license tests.

#![allow(dead_code)]

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use smartclip_license::{KeyCodec, LicenseSecret};

/// Regression-oracle secret; only ever used by tests.
pub const TEST_SECRET: &str = "SC-PRO-2025-LICENSE";

/// Payload with a known checksum under [`TEST_SECRET`].
pub const ORACLE_PAYLOAD: &str = "ABCDEFGHJKLM";

/// Checksum of [`ORACLE_PAYLOAD`] under [`TEST_SECRET`].
pub const ORACLE_CHECKSUM: &str = "WV4S";

pub fn test_secret() -> LicenseSecret {
    LicenseSecret::new(TEST_SECRET).unwrap()
}

pub fn test_codec() -> KeyCodec {
    KeyCodec::new(test_secret())
}

/// A codec with a different secret, for cross-secret rejection tests.
pub fn other_codec() -> KeyCodec {
    KeyCodec::new(LicenseSecret::new("some-other-secret").unwrap())
}

/// Deterministic CSPRNG for reproducible generation tests.
pub fn seeded_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// The oracle key in grouped form.
pub fn oracle_key() -> String {
    format!("ABCD-EFGH-JKLM-{ORACLE_CHECKSUM}")
}
