//! Load and atomically rewrite the shared genesis document.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use primitive_types::U256;
use tracing::info;

use crate::adapters::atomic::write_atomic;
use crate::domain::address::SealerAddress;
use crate::domain::errors::FleetError;
use crate::domain::genesis::GenesisDocument;

/// File-backed access to `genesis.json`.
///
/// The document is an external artifact this tool mutates but never
/// creates: a missing file is a hard error, and so is an unparseable one.
/// Neither is ever papered over with a fresh blank document.
pub struct GenesisStore {
    path: PathBuf,
}

impl GenesisStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<GenesisDocument, FleetError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(FleetError::GenesisNotFound {
                    path: self.path.clone(),
                });
            }
            Err(err) => {
                return Err(FleetError::io(
                    format!("read genesis {}", self.path.display()),
                    err,
                ));
            }
        };
        GenesisDocument::parse(&text).map_err(|reason| FleetError::CorruptGenesis {
            path: self.path.clone(),
            reason,
        })
    }

    pub fn save(&self, document: &GenesisDocument) -> Result<(), FleetError> {
        let bytes = document.to_pretty_bytes().map_err(|err| {
            FleetError::io(
                "serialize genesis document",
                std::io::Error::new(ErrorKind::InvalidData, err),
            )
        })?;
        write_atomic(&self.path, &bytes).map_err(|err| {
            FleetError::io(format!("write genesis {}", self.path.display()), err)
        })
    }

    /// Fund `address` and rewrite the signer field as the sorted set of
    /// `fleet` plus `address`.
    ///
    /// The signer list is rebuilt from the roster on every call instead of
    /// being appended to the stored field, so the document cannot drift
    /// from the roster. Registering an already-known signer is a no-op
    /// byte-wise.
    pub fn add_signer(
        &self,
        address: &SealerAddress,
        balance: U256,
        fleet: &BTreeSet<SealerAddress>,
    ) -> Result<(), FleetError> {
        let mut document = self.load()?;
        document.set_allocation(address, balance);
        let mut signers = fleet.clone();
        signers.insert(*address);
        document.set_signers(&signers);
        self.save(&document)?;
        info!(
            "[genesis] registered signer {} ({} total)",
            address,
            signers.len()
        );
        Ok(())
    }

    /// Empty the alloc table and blank the signer field, preserving
    /// everything else.
    pub fn reset(&self) -> Result<(), FleetError> {
        let mut document = self.load()?;
        document.clear_fleet_state();
        self.save(&document)?;
        info!("[genesis] cleared allocations and signer field");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extra_data;
    use tempfile::TempDir;

    const FIXTURE: &str = r#"{
        "config": {"chainId": 9999, "clique": {"period": 5, "epoch": 30000}},
        "difficulty": "0x1",
        "gasLimit": "0x59a5380",
        "nonce": "0x0000000000000042",
        "alloc": {},
        "extraData": ""
    }"#;

    fn addr(fill: u8) -> SealerAddress {
        SealerAddress::from_bytes([fill; 20])
    }

    fn store_with_fixture(dir: &TempDir) -> GenesisStore {
        let path = dir.path().join("genesis.json");
        fs::write(&path, FIXTURE).unwrap();
        GenesisStore::new(path)
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = GenesisStore::new(dir.path().join("genesis.json"));
        let err = store.load().unwrap_err();
        assert!(matches!(err, FleetError::GenesisNotFound { .. }));
    }

    #[test]
    fn test_unparseable_file_is_corrupt_not_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("genesis.json");
        fs::write(&path, "{ definitely not json").unwrap();
        let store = GenesisStore::new(&path);

        let err = store.load().unwrap_err();
        assert!(matches!(err, FleetError::CorruptGenesis { .. }));
        // The broken bytes are still there, untouched.
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ definitely not json");
    }

    #[test]
    fn test_add_signer_funds_and_registers() {
        let dir = TempDir::new().unwrap();
        let store = store_with_fixture(&dir);

        store
            .add_signer(&addr(0x2a), U256::from(0x1000u64), &BTreeSet::new())
            .unwrap();

        let document = store.load().unwrap();
        assert_eq!(document.balance_of(&addr(0x2a)), Some("0x1000"));
        let signers = extra_data::decode(document.extra_data().unwrap()).unwrap();
        assert_eq!(signers, vec![addr(0x2a)]);
    }

    #[test]
    fn test_add_signer_sorts_union_of_fleet() {
        let dir = TempDir::new().unwrap();
        let store = store_with_fixture(&dir);

        let fleet: BTreeSet<_> = [addr(0xcc), addr(0x11)].into_iter().collect();
        store
            .add_signer(&addr(0x77), U256::from(1u64), &fleet)
            .unwrap();

        let document = store.load().unwrap();
        let signers = extra_data::decode(document.extra_data().unwrap()).unwrap();
        assert_eq!(signers, vec![addr(0x11), addr(0x77), addr(0xcc)]);
    }

    #[test]
    fn test_add_signer_is_idempotent_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let store = store_with_fixture(&dir);
        let fleet: BTreeSet<_> = [addr(0x11)].into_iter().collect();

        store.add_signer(&addr(0x11), U256::from(7u64), &fleet).unwrap();
        let first = fs::read(store.path()).unwrap();
        store.add_signer(&addr(0x11), U256::from(7u64), &fleet).unwrap();
        let second = fs::read(store.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unmanaged_fields_survive() {
        let dir = TempDir::new().unwrap();
        let store = store_with_fixture(&dir);
        store
            .add_signer(&addr(0x2a), U256::from(1u64), &BTreeSet::new())
            .unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"nonce\": \"0x0000000000000042\""));
        assert!(text.contains("\"chainId\": 9999"));
    }

    #[test]
    fn test_reset_clears_only_fleet_fields() {
        let dir = TempDir::new().unwrap();
        let store = store_with_fixture(&dir);
        store
            .add_signer(&addr(0x2a), U256::from(1u64), &BTreeSet::new())
            .unwrap();

        store.reset().unwrap();

        let document = store.load().unwrap();
        assert!(document.allocated_accounts().is_empty());
        assert_eq!(document.extra_data(), Some(""));
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"gasLimit\": \"0x59a5380\""));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = store_with_fixture(&dir);
        store
            .add_signer(&addr(0x2a), U256::from(1u64), &BTreeSet::new())
            .unwrap();
        assert!(!dir.path().join("genesis.tmp").exists());
    }
}
