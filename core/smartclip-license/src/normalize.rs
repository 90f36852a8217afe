//! Normalization of user-entered keys before validation.
//!
//! Users paste keys with or without hyphens, in any case, with stray
//! whitespace. Two shapes are recognized:
//!
//! - compact keys (16 alphanumerics) issued by [`KeyCodec`](crate::KeyCodec),
//!   regrouped as `XXXX-XXXX-XXXX-XXXX`;
//! - processor keys (32 hex digits), regrouped as `8-4-4-4-12`.
//!
//! Anything else yields `None`. Callers must handle `None`; nothing here panics.

use crate::key::{is_grouped_shape, GROUP_LEN, KEY_LEN};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of hex digits in a processor key.
pub const HEX_KEY_LEN: usize = 32;

const UUID_GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Which family a normalized key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyShape {
    /// `XXXX-XXXX-XXXX-XXXX`, checked offline.
    Compact,
    /// `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX`, checked with a payment processor.
    Uuid,
}

/// A key re-hyphenated into its canonical grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedKey {
    shape: KeyShape,
    key: String,
    entered: String,
}

impl NormalizedKey {
    /// The canonical grouped text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// The input as typed, minus surrounding whitespace.
    ///
    /// Payment processors match keys byte for byte, so this is the text to
    /// send them, not [`as_str`](Self::as_str).
    #[must_use]
    pub fn entered(&self) -> &str {
        &self.entered
    }

    /// The detected shape.
    #[must_use]
    pub fn shape(&self) -> KeyShape {
        self.shape
    }

    /// Consumes the key, returning the grouped text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.key
    }
}

/// Normalizes raw input into a grouped key, or `None` if it is malformed.
#[must_use]
pub fn normalize(raw: &str) -> Option<NormalizedKey> {
    let entered = raw.trim();
    let stripped: String = entered
        .chars()
        .filter(|&c| c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if !stripped.is_ascii() {
        return None;
    }

    match stripped.len() {
        KEY_LEN if stripped.bytes().all(|b| b.is_ascii_alphanumeric()) => {
            let grouped = hyphenate(&stripped, &[GROUP_LEN; KEY_LEN / GROUP_LEN]);
            is_grouped_shape(&grouped).then_some(NormalizedKey {
                shape: KeyShape::Compact,
                key: grouped,
                entered: entered.to_string(),
            })
        }
        HEX_KEY_LEN if stripped.bytes().all(|b| b.is_ascii_hexdigit()) => {
            let uuid = Uuid::parse_str(&stripped).ok()?;
            let grouped = uuid.hyphenated().to_string().to_ascii_uppercase();
            is_uuid_shape(&grouped).then_some(NormalizedKey {
                shape: KeyShape::Uuid,
                key: grouped,
                entered: entered.to_string(),
            })
        }
        _ => None,
    }
}

/// Returns true if `key` is uppercase hex grouped `8-4-4-4-12`.
#[must_use]
pub fn is_uuid_shape(key: &str) -> bool {
    let groups: Vec<&str> = key.split('-').collect();
    groups.len() == UUID_GROUPS.len()
        && groups.iter().zip(UUID_GROUPS).all(|(group, len)| {
            group.len() == len
                && group
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
        })
}

fn hyphenate(text: &str, groups: &[usize]) -> String {
    let mut out = String::with_capacity(text.len() + groups.len());
    let mut rest = text;
    for (i, &len) in groups.iter().enumerate() {
        if i > 0 {
            out.push('-');
        }
        let (head, tail) = rest.split_at(len.min(rest.len()));
        out.push_str(head);
        rest = tail;
    }
    out
}
