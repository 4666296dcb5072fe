//! Keystore scanning: recover the account address the node binary minted.
//!
//! `account new` drops a JSON identity file into `<datadir>/keystore/`
//! named `UTC--<timestamp>--<address>`. The file's `address` field is the
//! sealer's account. When several identity files exist the earliest by
//! file name wins; the ISO-8601 timestamp prefix makes lexicographic order
//! chronological, which is a best-effort heuristic, so the choice is
//! logged.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::domain::address::SealerAddress;
use crate::domain::errors::FleetError;

const IDENTITY_PREFIX: &str = "UTC-";

#[derive(Debug, Deserialize)]
struct KeystoreFile {
    address: String,
}

/// Resolve the account address from the identity files under
/// `keystore_dir`.
pub fn resolve_address(keystore_dir: &Path) -> Result<SealerAddress, FleetError> {
    let entries = match fs::read_dir(keystore_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(FleetError::IdentityNotFound {
                dir: keystore_dir.to_path_buf(),
            });
        }
        Err(err) => {
            return Err(FleetError::io(
                format!("scan keystore dir {}", keystore_dir.display()),
                err,
            ));
        }
    };

    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.starts_with(IDENTITY_PREFIX) && path.is_file() {
            candidates.push(path);
        }
    }
    if candidates.is_empty() {
        return Err(FleetError::IdentityNotFound {
            dir: keystore_dir.to_path_buf(),
        });
    }
    candidates.sort();
    if candidates.len() > 1 {
        warn!(
            "[keystore] {} identity files under {}; picking the earliest by name",
            candidates.len(),
            keystore_dir.display()
        );
    }

    let chosen = &candidates[0];
    let text = fs::read_to_string(chosen).map_err(|err| FleetError::CorruptKeystore {
        path: chosen.clone(),
        reason: err.to_string(),
    })?;
    let parsed: KeystoreFile =
        serde_json::from_str(&text).map_err(|err| FleetError::CorruptKeystore {
            path: chosen.clone(),
            reason: err.to_string(),
        })?;
    SealerAddress::from_hex(&parsed.address).map_err(|_| FleetError::CorruptKeystore {
        path: chosen.clone(),
        reason: format!("bad address field `{}`", parsed.address),
    })
}
