//! # Provisioning Scenarios
//!
//! Creating, cloning and registering sealers: deterministic port
//! assignment, ascending signer order inside the genesis, idempotent
//! rewrites and failure containment.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;

    use fleet_core::adapters::GenesisStore;
    use fleet_core::config::SIGNER_BALANCE;
    use fleet_core::domain::extra_data;
    use fleet_core::test_utils::{sample_genesis_json, FakeNodeBinary};
    use fleet_core::{FleetConfig, FleetError, FleetService, SealerAddress};
    use tempfile::TempDir;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Fleet {
        tmp: TempDir,
        config: FleetConfig,
        fake: FakeNodeBinary,
        service: FleetService<FakeNodeBinary>,
    }

    /// A throwaway fleet rooted in a tempdir, genesis fixture in place,
    /// fake binary recording every invocation.
    fn fleet() -> Fleet {
        let tmp = TempDir::new().expect("create tempdir");
        let config = FleetConfig::rooted_at(tmp.path());
        fs::write(&config.genesis_path, sample_genesis_json()).expect("write genesis fixture");
        let fake = FakeNodeBinary::new();
        let service = FleetService::new(config.clone(), fake.clone());
        Fleet {
            tmp,
            config,
            fake,
            service,
        }
    }

    fn addr(fill: u8) -> SealerAddress {
        SealerAddress::from_bytes([fill; 20])
    }

    fn genesis_signers(config: &FleetConfig) -> Vec<SealerAddress> {
        let document = GenesisStore::new(&config.genesis_path)
            .load()
            .expect("load genesis");
        extra_data::decode(document.extra_data().expect("extraData present"))
            .expect("decode signer field")
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[test]
    fn test_three_sealers_sequential_ports_and_ascending_signers() {
        let f = fleet();
        // Minted in descending address order; the genesis must not care.
        f.fake.queue_address(addr(0xc3));
        f.fake.queue_address(addr(0x85));
        f.fake.queue_address(addr(0x17));

        let one = f.service.init_sealer("node1").expect("init node1");
        let two = f.service.init_sealer("node2").expect("init node2");
        let three = f.service.init_sealer("node3").expect("init node3");

        assert_eq!((one.p2p_port, one.rpc_port), (30311, 8501));
        assert_eq!((two.p2p_port, two.rpc_port), (30312, 8502));
        assert_eq!((three.p2p_port, three.rpc_port), (30313, 8503));

        assert_eq!(
            genesis_signers(&f.config),
            vec![addr(0x17), addr(0x85), addr(0xc3)]
        );

        let document = GenesisStore::new(&f.config.genesis_path)
            .load()
            .expect("load genesis");
        let funded = format!("{SIGNER_BALANCE:#x}");
        for created in [&one, &two, &three] {
            assert_eq!(
                document.balance_of(&created.address),
                Some(funded.as_str())
            );
        }
    }

    #[test]
    fn test_failed_identity_generation_leaves_state_untouched() {
        let f = fleet();
        f.service.init_sealer("node1").expect("init node1");
        let genesis_before = fs::read(&f.config.genesis_path).expect("read genesis");
        let roster_before = fs::read(&f.config.roster_path).expect("read roster");

        f.fake.mint_identities(false);
        let err = f.service.init_sealer("node2").expect_err("init must fail");
        assert!(matches!(err, FleetError::IdentityNotFound { .. }));

        assert_eq!(
            fs::read(&f.config.genesis_path).expect("read genesis"),
            genesis_before
        );
        assert_eq!(
            fs::read(&f.config.roster_path).expect("read roster"),
            roster_before
        );
        assert_eq!(genesis_signers(&f.config).len(), 1);
    }

    #[test]
    fn test_clone_shares_address_and_occupies_next_offset() {
        let f = fleet();
        let original = f.service.init_sealer("node1").expect("init node1");
        let genesis_before = fs::read(&f.config.genesis_path).expect("read genesis");

        let mirror = f.service.clone_sealer("node1", "mirror").expect("clone");

        assert_eq!(mirror.address, original.address);
        assert_eq!((mirror.p2p_port, mirror.rpc_port), (30312, 8502));
        assert_eq!(
            fs::read(&f.config.genesis_path).expect("read genesis"),
            genesis_before
        );
        // The copied datadir carries the keystore with it.
        assert!(f.config.keystore_dir("mirror").exists());
    }

    #[test]
    fn test_signer_registration_is_idempotent() {
        let f = fleet();
        let created = f.service.init_sealer("node1").expect("init node1");
        let first = fs::read(&f.config.genesis_path).expect("read genesis");

        let store = GenesisStore::new(&f.config.genesis_path);
        let fleet_addresses: BTreeSet<_> = [created.address].into_iter().collect();
        store
            .add_signer(&created.address, SIGNER_BALANCE, &fleet_addresses)
            .expect("re-register");

        let second = fs::read(&f.config.genesis_path).expect("read genesis");
        assert_eq!(first, second);
    }

    #[test]
    fn test_provisioning_reinitializes_whole_fleet_each_time() {
        let f = fleet();
        for index in 1..=4 {
            f.service
                .init_sealer(&format!("node{index}"))
                .expect("init sealer");
        }
        // Each provisioning re-inits every sealer known so far.
        assert_eq!(f.fake.init_count(), 1 + 2 + 3 + 4);
    }

    #[test]
    fn test_any_create_clone_mix_gets_distinct_port_pairs() {
        let f = fleet();
        f.service.init_sealer("node1").expect("init node1");
        f.service.clone_sealer("node1", "mirror").expect("clone mirror");
        f.service.init_sealer("node2").expect("init node2");
        f.service
            .clone_sealer("node2", "mirror2")
            .expect("clone mirror2");

        let roster = f.service.roster().expect("roster");
        let pairs: BTreeSet<(u16, u16)> = roster
            .iter()
            .map(|(_, record)| (record.p2p_port, record.rpc_port))
            .collect();
        assert_eq!(pairs.len(), 4);

        let rpc_ports: BTreeSet<u16> =
            roster.iter().map(|(_, record)| record.rpc_port).collect();
        assert_eq!(rpc_ports, [8501, 8502, 8503, 8504].into_iter().collect());
    }

    #[test]
    fn test_workspace_holds_only_expected_artifacts() {
        let f = fleet();
        f.service.init_sealer("node1").expect("init node1");

        let mut entries: Vec<String> = fs::read_dir(f.tmp.path())
            .expect("read workspace root")
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        entries.sort();
        // No temp files or stray artifacts next to the managed ones.
        assert_eq!(entries, vec!["devnet", "fleet.json", "genesis.json"]);
    }
}
