//! Seed Derivation
//!
//! Turns arbitrary prompt text into the 32-bit [`Seed`] that roots every
//! stream in a cycle. The hash walks UTF-16 code units so a prompt typed into
//! the browser installation and the same prompt typed here agree on the seed.

use serde::{Deserialize, Serialize};

use crate::rng::Stream;

/// Initial hash value (the 32-bit FNV offset basis)
pub const HASH_BASIS: u32 = 2_166_136_261;

/// Rolling-hash multiplier
pub const HASH_MULTIPLIER: u32 = 131;

/// Root of all reproducible randomness in a cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(pub u32);

impl Seed {
    /// Raw seed value
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Fresh stream rooted at this seed
    #[must_use]
    pub const fn stream(self) -> Stream {
        Stream::new(self.0)
    }
}

impl From<u32> for Seed {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive a seed from text
///
/// `h = h * 131 + unit (mod 2^32)` over the UTF-16 code units of `text`,
/// starting from [`HASH_BASIS`]. The empty string yields the basis itself.
#[must_use]
pub fn seed_from_text(text: &str) -> Seed {
    let hash = text.encode_utf16().fold(HASH_BASIS, |acc, unit| {
        acc.wrapping_mul(HASH_MULTIPLIER)
            .wrapping_add(u32::from(unit))
    });
    Seed(hash)
}
