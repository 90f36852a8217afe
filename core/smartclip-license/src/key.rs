//! License key generation and checksum validation.
//!
//! Keys are 16 uppercase alphanumeric characters shown in four groups of
//! four: `XXXX-XXXX-XXXX-XXXX`.
//!
//! - The first 12 characters are the payload, drawn at random from
//!   [`ALPHABET`], which leaves out look-alike glyphs (`0/O`, `1/I`).
//! - The last 4 characters are the checksum, a base-36 digest of the payload
//!   and the shared secret.
//!
//! The checksum is a multiplicative hash, not a MAC. It stops casually
//! fabricated keys; the secret is the only thing standing between an attacker
//! and a valid key.

use crate::error::{LicenseError, LicenseResult};
use crate::secret::LicenseSecret;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::fmt;

/// Symbols a payload is drawn from.
pub const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of random payload characters.
pub const PAYLOAD_LEN: usize = 12;

/// Number of checksum characters.
pub const CHECKSUM_LEN: usize = 4;

/// Length of a key without hyphens.
pub const KEY_LEN: usize = PAYLOAD_LEN + CHECKSUM_LEN;

/// Characters per display group.
pub const GROUP_LEN: usize = 4;

/// Length of the grouped form (16 characters plus 3 hyphens).
pub const GROUPED_LEN: usize = KEY_LEN + KEY_LEN / GROUP_LEN - 1;

const HASH_MULTIPLIER: u32 = 131;
const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Computes the 4-character checksum for a payload.
///
/// The seed is `payload + secret`, uppercased. Each UTF-16 code unit of the
/// seed is folded into a wrapping `u32` as `hash * 131 + unit`. The result is
/// the last four base-36 digits of the hash, zero-padded on the left.
#[must_use]
pub fn compute_checksum(payload: &str, secret: &LicenseSecret) -> String {
    let seed = format!("{payload}{}", secret.expose()).to_uppercase();
    let hash = seed.encode_utf16().fold(0u32, |hash, unit| {
        hash.wrapping_mul(HASH_MULTIPLIER)
            .wrapping_add(u32::from(unit))
    });

    let digits = to_base36(hash);
    let tail = &digits[digits.len().saturating_sub(CHECKSUM_LEN)..];
    format!("{tail:0>width$}", width = CHECKSUM_LEN)
}

/// Joins payload and checksum into the grouped display form.
#[must_use]
pub fn format_key(payload: &str, checksum: &str) -> String {
    let compact = format!("{payload}{checksum}");
    let chars: Vec<char> = compact.chars().collect();
    chars
        .chunks(GROUP_LEN)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}

/// Returns true if `key` has the `XXXX-XXXX-XXXX-XXXX` shape (any case).
#[must_use]
pub fn is_grouped_shape(key: &str) -> bool {
    key.len() == GROUPED_LEN
        && key.bytes().enumerate().all(|(i, b)| {
            if i % (GROUP_LEN + 1) == GROUP_LEN {
                b == b'-'
            } else {
                b.is_ascii_alphanumeric()
            }
        })
}

/// Hides everything after the first group, for logs.
#[must_use]
pub fn mask(raw: &str) -> String {
    let visible: String = raw.trim().chars().take(GROUP_LEN).collect();
    format!("{visible}-****")
}

fn to_base36(mut n: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(7);
    while n > 0 {
        digits.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.iter().rev().map(|&b| char::from(b)).collect()
}

/// Picks an index in `0..n` without modulo bias.
fn draw_index<R: RngCore + ?Sized>(rng: &mut R, n: u32) -> usize {
    let span = 1u64 << 32;
    let zone = span - span % u64::from(n);
    loop {
        let value = rng.next_u32();
        if u64::from(value) < zone {
            return (value % n) as usize;
        }
    }
}

/// A license key whose checksum has been verified against a secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LicenseKey {
    compact: String,
}

impl LicenseKey {
    /// The 12-character payload.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.compact[..PAYLOAD_LEN]
    }

    /// The 4-character checksum.
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.compact[PAYLOAD_LEN..]
    }

    /// The 16 characters without hyphens.
    #[must_use]
    pub fn compact(&self) -> &str {
        &self.compact
    }

    /// The `XXXX-XXXX-XXXX-XXXX` display form.
    #[must_use]
    pub fn grouped(&self) -> String {
        format_key(self.payload(), self.checksum())
    }

    /// The grouped form with all but the first group hidden.
    #[must_use]
    pub fn masked(&self) -> String {
        mask(&self.compact)
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.grouped())
    }
}

impl From<LicenseKey> for String {
    fn from(key: LicenseKey) -> Self {
        key.grouped()
    }
}

/// Generates and validates license keys for one shared secret.
#[derive(Debug, Clone)]
pub struct KeyCodec {
    secret: LicenseSecret,
}

impl KeyCodec {
    /// Creates a codec bound to `secret`.
    #[must_use]
    pub fn new(secret: LicenseSecret) -> Self {
        Self { secret }
    }

    /// Creates a codec from the secret in the environment.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Configuration`] if the secret is missing or empty.
    pub fn from_env() -> LicenseResult<Self> {
        Ok(Self::new(LicenseSecret::from_env()?))
    }

    /// Checksum for `payload` under this codec's secret.
    #[must_use]
    pub fn checksum(&self, payload: &str) -> String {
        compute_checksum(payload, &self.secret)
    }

    /// Generates a fresh key using the operating system's CSPRNG.
    #[must_use]
    pub fn generate(&self) -> LicenseKey {
        self.generate_with(&mut OsRng)
    }

    /// Generates a fresh key from the given cryptographic RNG.
    pub fn generate_with<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> LicenseKey {
        let n = ALPHABET.len() as u32;
        let payload: String = (0..PAYLOAD_LEN)
            .map(|_| char::from(ALPHABET[draw_index(&mut *rng, n)]))
            .collect();
        let checksum = self.checksum(&payload);
        LicenseKey {
            compact: format!("{payload}{checksum}"),
        }
    }

    /// Builds the key for a caller-chosen payload.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidFormat`] unless `payload` is exactly
    /// [`PAYLOAD_LEN`] characters from [`ALPHABET`].
    pub fn issue(&self, payload: &str) -> LicenseResult<LicenseKey> {
        let payload = payload.to_ascii_uppercase();
        if payload.len() != PAYLOAD_LEN || !payload.bytes().all(|b| ALPHABET.contains(&b)) {
            return Err(LicenseError::InvalidFormat(format!(
                "payload must be {PAYLOAD_LEN} characters from the key alphabet"
            )));
        }
        let checksum = self.checksum(&payload);
        Ok(LicenseKey {
            compact: format!("{payload}{checksum}"),
        })
    }

    /// Verifies a grouped key, returning the parsed key on success.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::InvalidFormat`] if `key` is not `XXXX-XXXX-XXXX-XXXX`.
    /// - [`LicenseError::ChecksumMismatch`] if the checksum does not match.
    pub fn verify(&self, key: &str) -> LicenseResult<LicenseKey> {
        if !is_grouped_shape(key) {
            return Err(LicenseError::InvalidFormat(
                "expected XXXX-XXXX-XXXX-XXXX".to_string(),
            ));
        }

        let compact: String = key
            .chars()
            .filter(|&c| c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let (payload, checksum) = compact.split_at(PAYLOAD_LEN);

        if self.checksum(payload) != checksum {
            return Err(LicenseError::ChecksumMismatch);
        }

        Ok(LicenseKey { compact })
    }

    /// Returns true if `key` is a grouped key with a matching checksum.
    #[must_use]
    pub fn validate(&self, key: &str) -> bool {
        self.verify(key).is_ok()
    }
}
