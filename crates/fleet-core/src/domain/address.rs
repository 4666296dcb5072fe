//! Sealer account addresses.
//!
//! A sealer's identity is the 20-byte account behind its keystore file.
//! Addresses travel as bare lowercase hex in the roster, the genesis
//! `alloc` table and the clique signer field; the `0x`-prefixed form only
//! appears on the node binary's command line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::errors::FleetError;

/// 20-byte account identifier of a sealer.
///
/// Ordering is byte-wise, which for the hex form is plain lexicographic
/// order. The clique signer field relies on this: signers are embedded in
/// ascending address order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SealerAddress([u8; 20]);

impl SealerAddress {
    /// Raw byte length of an account address.
    pub const LEN: usize = 20;

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse from hex, with or without a `0x` prefix, any case.
    pub fn from_hex(text: &str) -> Result<Self, FleetError> {
        let bare = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        if bare.len() != Self::LEN * 2 {
            return Err(FleetError::InvalidAddress {
                value: text.to_string(),
                reason: "expected 40 hex characters",
            });
        }
        let raw = hex::decode(bare).map_err(|_| FleetError::InvalidAddress {
            value: text.to_string(),
            reason: "not valid hex",
        })?;
        let mut bytes = [0u8; Self::LEN];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }

    /// Bare lowercase hex, the keystore and genesis convention.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// `0x`-prefixed form for the node binary's `--unlock` flag.
    pub fn prefixed_hex(&self) -> String {
        format!("0x{}", self.to_hex())
    }
}

impl fmt::Display for SealerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for SealerAddress {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for SealerAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SealerAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
