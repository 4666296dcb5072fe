//! Clique signer-field codec.
//!
//! A proof-of-authority genesis carries its authorized signers inside the
//! `extraData` header field: 32 bytes of vanity, the 20-byte address of
//! every signer in ascending order, then 65 bytes reserved for the seal.
//! A devnet genesis zeroes the vanity and seal sections.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::domain::address::SealerAddress;

/// Leading vanity bytes, zeroed here.
pub const VANITY_BYTES: usize = 32;
/// Trailing seal bytes, zeroed in a genesis document.
pub const SEAL_BYTES: usize = 65;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtraDataError {
    #[error("signer field does not start with 0x")]
    MissingPrefix,
    #[error("signer field holds {0} characters, which does not fit vanity + signers + seal")]
    BadLayout(usize),
    #[error("signer segment `{0}` is not a valid address")]
    BadSigner(String),
}

/// Encode the signer set into the `0x`-prefixed field value.
///
/// The set's own ordering supplies the ascending address order the clique
/// layout requires, and it cannot hold one signer twice.
pub fn encode(signers: &BTreeSet<SealerAddress>) -> String {
    let mut field = String::with_capacity(
        2 + (VANITY_BYTES + SEAL_BYTES) * 2 + signers.len() * SealerAddress::LEN * 2,
    );
    field.push_str("0x");
    field.push_str(&"00".repeat(VANITY_BYTES));
    for signer in signers {
        field.push_str(&signer.to_hex());
    }
    field.push_str(&"00".repeat(SEAL_BYTES));
    field
}

/// Decode the signer addresses embedded in a field value.
pub fn decode(field: &str) -> Result<Vec<SealerAddress>, ExtraDataError> {
    let bare = field
        .strip_prefix("0x")
        .ok_or(ExtraDataError::MissingPrefix)?
        .as_bytes();
    let fixed = (VANITY_BYTES + SEAL_BYTES) * 2;
    let segment = SealerAddress::LEN * 2;
    if bare.len() < fixed || (bare.len() - fixed) % segment != 0 {
        return Err(ExtraDataError::BadLayout(bare.len()));
    }
    bare[VANITY_BYTES * 2..bare.len() - SEAL_BYTES * 2]
        .chunks(segment)
        .map(|chunk| {
            let text = std::str::from_utf8(chunk)
                .map_err(|_| ExtraDataError::BadSigner(String::from_utf8_lossy(chunk).into_owned()))?;
            SealerAddress::from_hex(text).map_err(|_| ExtraDataError::BadSigner(text.to_string()))
        })
        .collect()
}
