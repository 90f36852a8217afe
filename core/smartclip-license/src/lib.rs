//! Licensing and activation for SmartClip.
//!
//! This module handles:
//! - Offline license key generation and checksum validation
//! - Normalization of pasted keys before any remote check
//! - Activation against Gumroad and Lemon Squeezy (feature `online`)
//! - Expiry, refund and cancellation checks on processor verdicts
//! - Persisting the current activation
//!
//! # Design Principles
//!
//! - **Injected secret**: the checksum secret enters once, as a [`LicenseSecret`],
//!   and is carried by a [`KeyCodec`]. A missing secret is a startup error.
//! - **Local pre-filter**: malformed keys are rejected before the network.
//! - **No panics on input**: validation returns `bool`, `Option` or `Result`.
//!
//! # License Key Format
//!
//! Keys are formatted as `XXXX-XXXX-XXXX-XXXX`: a 12-character random payload
//! followed by a 4-character base-36 checksum of payload and secret.

mod activation;
mod error;
mod instance;
mod key;
mod normalize;
mod secret;
mod status;

#[cfg(feature = "online")]
pub mod provider;

pub use activation::{activate_offline, Activation, ActivationSource, ActivationStore};
pub use error::{LicenseError, LicenseResult};
pub use instance::InstanceName;
pub use key::{
    compute_checksum, format_key, is_grouped_shape, mask, KeyCodec, LicenseKey, ALPHABET,
    CHECKSUM_LEN, GROUPED_LEN, KEY_LEN, PAYLOAD_LEN,
};
pub use normalize::{is_uuid_shape, normalize, KeyShape, NormalizedKey, HEX_KEY_LEN};
pub use secret::{LicenseSecret, SECRET_ENV_VAR};
pub use status::{Entitlement, LicenseStatus, Provider};
