//! # Lifecycle Scenarios
//!
//! Starting, stopping and dismantling the fleet: process-group tracking
//! across the roster, signal deduplication, bootnode pidfile handling and
//! full teardown.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;

    use fleet_core::adapters::GenesisStore;
    use fleet_core::ports::outbound::SignalKind;
    use fleet_core::service::{GroupOutcome, StopOutcome};
    use fleet_core::test_utils::{sample_genesis_json, FakeNodeBinary};
    use fleet_core::{FleetConfig, FleetService, Pgid, SealerState};
    use tempfile::TempDir;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Fleet {
        _tmp: TempDir,
        config: FleetConfig,
        fake: FakeNodeBinary,
        service: FleetService<FakeNodeBinary>,
    }

    fn fleet() -> Fleet {
        let tmp = TempDir::new().expect("create tempdir");
        let config = FleetConfig::rooted_at(tmp.path());
        fs::write(&config.genesis_path, sample_genesis_json()).expect("write genesis fixture");
        let fake = FakeNodeBinary::new();
        let service = FleetService::new(config.clone(), fake.clone());
        Fleet {
            _tmp: tmp,
            config,
            fake,
            service,
        }
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[test]
    fn test_start_stop_round_trip_updates_roster() {
        let f = fleet();
        f.service.init_sealer("node1").expect("init node1");
        let record = f.service.roster().expect("roster");
        assert_eq!(record.get("node1").expect("node1").state(), SealerState::Stopped);

        let started = f.service.start_sealer("node1").expect("start node1");
        let roster = f.service.roster().expect("roster");
        assert_eq!(roster.get("node1").expect("node1").state(), SealerState::Running);
        assert_eq!(roster.get("node1").expect("node1").pgid, Some(started.pgid));

        f.service.stop_sealer("node1").expect("stop node1");
        let roster = f.service.roster().expect("roster");
        assert_eq!(roster.get("node1").expect("node1").state(), SealerState::Stopped);
        assert_eq!(roster.get("node1").expect("node1").pgid, None);
    }

    #[test]
    fn test_batch_five_then_teardown_clears_everything() {
        let f = fleet();
        assert!(f.service.batch_init(5).is_clean());
        assert!(f.service.start_all().expect("start fleet").is_clean());

        let tracked: BTreeSet<Pgid> = f.service.roster().expect("roster").distinct_pgids();
        assert_eq!(tracked.len(), 5);

        let teardown = f.service.teardown().expect("teardown");
        assert_eq!(teardown.bootnode, StopOutcome::NotRunning);
        assert_eq!(teardown.group_stops.len(), 5);

        // Every tracked group received exactly one TERM.
        let signalled: BTreeSet<Pgid> = f
            .fake
            .signals()
            .into_iter()
            .map(|(pgid, _)| pgid)
            .collect();
        assert_eq!(signalled, tracked);
        assert_eq!(f.fake.signals().len(), 5);

        assert!(!f.config.roster_path.exists());
        assert!(!f.config.workspace_dir.exists());
        let document = GenesisStore::new(&f.config.genesis_path)
            .load()
            .expect("load genesis");
        assert!(document.allocated_accounts().is_empty());
        assert_eq!(document.extra_data(), Some(""));
    }

    #[test]
    fn test_stop_all_signals_each_group_at_most_once() {
        let f = fleet();
        assert!(f.service.batch_init(3).is_clean());

        let first = f.service.start_sealer("node1").expect("start node1");
        // Second sealer lands in the same process group as the first.
        f.fake.set_next_pgid(first.pgid.as_raw());
        let second = f.service.start_sealer("node2").expect("start node2");
        assert_eq!(second.pgid, first.pgid);
        f.service.start_sealer("node3").expect("start node3");

        let stops = f.service.stop_all();
        assert_eq!(stops.len(), 2);

        let mut seen = BTreeSet::new();
        for (pgid, signal) in f.fake.signals() {
            assert_eq!(signal, SignalKind::Terminate);
            assert!(seen.insert(pgid), "group {pgid} signalled twice");
        }

        assert!(f.service.roster().expect("roster").distinct_pgids().is_empty());
    }

    #[test]
    fn test_teardown_tolerates_already_dead_groups() {
        let f = fleet();
        assert!(f.service.batch_init(2).is_clean());
        assert!(f.service.start_all().expect("start fleet").is_clean());

        let tracked = f.service.roster().expect("roster").distinct_pgids();
        let dead = *tracked.iter().next().expect("a tracked group");
        f.fake.vanish_group(dead);

        let teardown = f.service.teardown().expect("teardown");
        assert_eq!(teardown.group_stops.len(), 2);
        let gone = teardown
            .group_stops
            .iter()
            .filter(|stop| stop.outcome == GroupOutcome::AlreadyGone)
            .count();
        assert_eq!(gone, 1);
        assert!(!f.config.workspace_dir.exists());
    }

    #[test]
    fn test_teardown_stops_bootnode_via_pidfile() {
        let f = fleet();
        fs::write(&f.config.bootnode_key, "aa".repeat(32)).expect("write boot key");
        let boot = f.service.start_bootnode().expect("start bootnode");
        assert!(f.config.bootnode_pidfile.exists());

        let teardown = f.service.teardown().expect("teardown");
        assert_eq!(teardown.bootnode, StopOutcome::Terminated(boot.pgid));
        assert!(!f.config.bootnode_pidfile.exists());
    }

    #[test]
    fn test_restart_after_stop_gets_fresh_group() {
        let f = fleet();
        f.service.init_sealer("node1").expect("init node1");

        let first = f.service.start_sealer("node1").expect("first start");
        f.service.stop_sealer("node1").expect("stop");
        let second = f.service.start_sealer("node1").expect("second start");

        assert_ne!(first.pgid, second.pgid);
        let roster = f.service.roster().expect("roster");
        assert_eq!(roster.get("node1").expect("node1").pgid, Some(second.pgid));
    }
}
