//! Test utilities for fleet orchestration.
//!
//! This module provides a deterministic stand-in for the external node
//! binaries so the full fleet lifecycle can be exercised without geth on
//! the machine.
//!
//! # Example
//!
//! ```rust
//! use fleet_core::ports::outbound::{CommandSpec, ProcessRunner};
//! use fleet_core::test_utils::FakeNodeBinary;
//!
//! let fake = FakeNodeBinary::new();
//! fake.run(&CommandSpec::new("bin/geth").arg("version")).unwrap();
//! assert_eq!(fake.runs().len(), 1);
//! ```

use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::address::SealerAddress;
use crate::domain::entities::Pgid;
use crate::ports::outbound::{
    CommandSpec, LaunchError, ProcessHandle, ProcessRunner, SignalError, SignalKind, SignalOutcome,
};

/// A `ProcessRunner` that emulates the node binary's observable behavior.
///
/// - `account new` mints a keystore identity file under the given datadir
///   (address taken from the injected queue, or derived from a counter);
/// - `init` creates the chain-data directory, like a real re-init;
/// - detached spawns hand out sequential process-group ids;
/// - every run, spawn and signal is recorded for inspection.
///
/// Clones share state, so tests can keep one handle for assertions while
/// the service owns the other.
///
/// # Example
///
/// ```rust
/// use fleet_core::ports::outbound::{CommandSpec, ProcessRunner};
/// use fleet_core::test_utils::FakeNodeBinary;
///
/// let fake = FakeNodeBinary::new();
/// fake.set_next_pgid(500);
/// let handle = fake.spawn_detached(&CommandSpec::new("bin/geth")).unwrap();
/// assert_eq!(handle.pgid().as_raw(), 500);
/// ```
#[derive(Clone, Default)]
pub struct FakeNodeBinary {
    state: Arc<FakeState>,
}

struct FakeState {
    runs: Mutex<Vec<CommandSpec>>,
    spawns: Mutex<Vec<CommandSpec>>,
    signals: Mutex<Vec<(Pgid, SignalKind)>>,
    queued_addresses: Mutex<VecDeque<SealerAddress>>,
    minted: AtomicU64,
    mint_identities: AtomicBool,
    next_pgid: AtomicI32,
    vanished: Mutex<BTreeSet<Pgid>>,
    fail_spawn_names: Mutex<BTreeSet<String>>,
    fail_runs: AtomicBool,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            runs: Mutex::new(Vec::new()),
            spawns: Mutex::new(Vec::new()),
            signals: Mutex::new(Vec::new()),
            queued_addresses: Mutex::new(VecDeque::new()),
            minted: AtomicU64::new(0),
            mint_identities: AtomicBool::new(true),
            next_pgid: AtomicI32::new(41000),
            vanished: Mutex::new(BTreeSet::new()),
            fail_spawn_names: Mutex::new(BTreeSet::new()),
            fail_runs: AtomicBool::new(false),
        }
    }
}

impl FakeNodeBinary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `address` for the next `account new` instead of deriving one.
    pub fn queue_address(&self, address: SealerAddress) {
        self.state
            .queued_addresses
            .lock()
            .expect("lock poisoned")
            .push_back(address);
    }

    /// Toggle identity minting; with `false`, `account new` leaves no
    /// keystore behind (the "binary misbehaved" scenario).
    pub fn mint_identities(&self, enabled: bool) {
        self.state.mint_identities.store(enabled, Ordering::SeqCst);
    }

    /// Make every blocking run fail, as if the binary exited nonzero.
    pub fn fail_runs(&self, enabled: bool) {
        self.state.fail_runs.store(enabled, Ordering::SeqCst);
    }

    /// Group id the next detached spawn receives.
    pub fn set_next_pgid(&self, pgid: i32) {
        self.state.next_pgid.store(pgid, Ordering::SeqCst);
    }

    /// Report `pgid` as already gone when signalled.
    pub fn vanish_group(&self, pgid: Pgid) {
        self.state
            .vanished
            .lock()
            .expect("lock poisoned")
            .insert(pgid);
    }

    /// Fail detached spawns whose datadir basename equals `name`.
    pub fn fail_spawn_for(&self, name: &str) {
        self.state
            .fail_spawn_names
            .lock()
            .expect("lock poisoned")
            .insert(name.to_string());
    }

    /// Every blocking invocation so far, in order.
    pub fn runs(&self) -> Vec<CommandSpec> {
        self.state.runs.lock().expect("lock poisoned").clone()
    }

    /// Every detached spawn so far, in order.
    pub fn spawns(&self) -> Vec<CommandSpec> {
        self.state.spawns.lock().expect("lock poisoned").clone()
    }

    /// Every group signal so far, in order.
    pub fn signals(&self) -> Vec<(Pgid, SignalKind)> {
        self.state.signals.lock().expect("lock poisoned").clone()
    }

    /// How many chain re-inits have been requested.
    pub fn init_count(&self) -> usize {
        self.state
            .runs
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|spec| spec.args().iter().any(|arg| arg == "init"))
            .count()
    }

    fn next_address(&self, seq: u64) -> SealerAddress {
        if let Some(address) = self
            .state
            .queued_addresses
            .lock()
            .expect("lock poisoned")
            .pop_front()
        {
            return address;
        }
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&seq.to_be_bytes());
        SealerAddress::from_bytes(bytes)
    }

    fn mint_identity(&self, datadir: &str) {
        if !self.state.mint_identities.load(Ordering::SeqCst) {
            return;
        }
        let seq = self.state.minted.fetch_add(1, Ordering::SeqCst) + 1;
        let address = self.next_address(seq);
        let keystore = Path::new(datadir).join("keystore");
        fs::create_dir_all(&keystore).expect("create keystore dir");
        let file_name = format!(
            "UTC--2025-01-01T00-00-00.{seq:09}Z--{}",
            address.to_hex()
        );
        let body = serde_json::json!({
            "address": address.to_hex(),
            "id": format!("fake-{seq:08}"),
            "version": 3,
        });
        fs::write(keystore.join(file_name), body.to_string()).expect("write identity file");
    }
}

impl ProcessRunner for FakeNodeBinary {
    fn run(&self, spec: &CommandSpec) -> Result<(), LaunchError> {
        self.state
            .runs
            .lock()
            .expect("lock poisoned")
            .push(spec.clone());
        if self.state.fail_runs.load(Ordering::SeqCst) {
            return Err(LaunchError::new(spec, "exited with exit status: 1"));
        }
        let args = spec.args();
        let wants_account =
            args.iter().any(|arg| arg == "account") && args.iter().any(|arg| arg == "new");
        if let Some(datadir) = spec.value_of("--datadir") {
            if wants_account {
                self.mint_identity(datadir);
            } else if args.iter().any(|arg| arg == "init") {
                fs::create_dir_all(Path::new(datadir).join("geth").join("chaindata"))
                    .expect("create chain data dir");
            }
        }
        Ok(())
    }

    fn spawn_detached(&self, spec: &CommandSpec) -> Result<ProcessHandle, LaunchError> {
        self.state
            .spawns
            .lock()
            .expect("lock poisoned")
            .push(spec.clone());
        if let Some(datadir) = spec.value_of("--datadir") {
            let name = Path::new(datadir)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            if self
                .state
                .fail_spawn_names
                .lock()
                .expect("lock poisoned")
                .contains(name)
            {
                return Err(LaunchError::new(spec, "injected spawn failure"));
            }
        }
        let pgid = self.state.next_pgid.fetch_add(1, Ordering::SeqCst);
        Ok(ProcessHandle::new(Pgid(pgid)))
    }

    fn signal_group(
        &self,
        handle: ProcessHandle,
        signal: SignalKind,
    ) -> Result<SignalOutcome, SignalError> {
        self.state
            .signals
            .lock()
            .expect("lock poisoned")
            .push((handle.pgid(), signal));
        if self
            .state
            .vanished
            .lock()
            .expect("lock poisoned")
            .contains(&handle.pgid())
        {
            return Ok(SignalOutcome::NoSuchGroup);
        }
        Ok(SignalOutcome::Delivered)
    }
}

/// A minimal clique genesis document for test workspaces.
pub fn sample_genesis_json() -> String {
    serde_json::json!({
        "config": {
            "chainId": 9999,
            "homesteadBlock": 0,
            "eip155Block": 0,
            "eip158Block": 0,
            "byzantiumBlock": 0,
            "clique": {"period": 5, "epoch": 30000}
        },
        "nonce": "0x0",
        "timestamp": "0x0",
        "extraData": "",
        "gasLimit": "0x59a5380",
        "difficulty": "0x1",
        "mixHash": "0x0000000000000000000000000000000000000000000000000000000000000000",
        "coinbase": "0x0000000000000000000000000000000000000000",
        "alloc": {}
    })
    .to_string()
}
