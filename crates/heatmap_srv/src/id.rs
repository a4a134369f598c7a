//! Opaque random identifiers for pins and connections.

use rand::RngCore;

/// Random bytes per identifier. 64 bits of entropy.
const ID_BYTES: usize = 8;

/// An opaque identifier: 16 lowercase hex characters.
///
/// No registry of issued ids is kept, uniqueness rests on the
/// collision probability of 64 random bits.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Id(std::sync::Arc<str>);

impl Id {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);

        let mut out = String::with_capacity(ID_BYTES * 2);
        for b in bytes {
            use std::fmt::Write;
            // writing to a String cannot fail
            let _ = write!(out, "{b:02x}");
        }

        Self(out.into())
    }

    /// The string form of this id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
