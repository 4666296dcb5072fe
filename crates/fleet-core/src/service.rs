//! # Fleet Orchestration Service
//!
//! One method per fleet operation, generic over the process seam. Every
//! operation loads the persisted state it needs at entry, works on that
//! value, and saves it back before returning; nothing ambient is shared
//! between operations.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::adapters::keystore;
use crate::adapters::node_binary::{BootnodeBinary, NodeBinary};
use crate::adapters::{GenesisStore, RosterStore};
use crate::config::FleetConfig;
use crate::domain::address::SealerAddress;
use crate::domain::allocation;
use crate::domain::entities::{validate_sealer_name, FleetRoster, NodeRecord, Pgid};
use crate::domain::errors::FleetError;
use crate::ports::outbound::{ProcessHandle, ProcessRunner, SignalKind, SignalOutcome};

// =============================================================================
// OPERATION REPORTS
// =============================================================================

/// Result of provisioning a sealer (created or cloned).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealerCreated {
    pub name: String,
    pub address: SealerAddress,
    pub p2p_port: u16,
    pub rpc_port: u16,
}

/// Result of launching a sealer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealerStarted {
    pub name: String,
    pub pgid: Pgid,
    pub p2p_port: u16,
    pub rpc_port: u16,
}

/// Group id the bootnode runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootnodeStarted {
    pub pgid: Pgid,
}

/// How stopping one tracked process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The tracked group was signalled.
    Terminated(Pgid),
    /// The tracked group had already exited.
    AlreadyGone(Pgid),
    /// Nothing was tracked as running.
    NotRunning,
    /// The signal could not be sent; recorded by sweeps that keep going.
    Failed(String),
}

/// Per-sealer stop report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    pub name: String,
    pub outcome: StopOutcome,
}

/// How one distinct process group fared during a fleet-wide stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStop {
    pub pgid: Pgid,
    pub outcome: GroupOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    Terminated,
    AlreadyGone,
    Failed(String),
}

/// What teardown stopped before dismantling the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub bootnode: StopOutcome,
    pub group_stops: Vec<GroupStop>,
}

/// Outcome of one sealer inside a batch operation.
#[derive(Debug)]
pub struct NodeOutcome<T> {
    pub name: String,
    pub result: Result<T, FleetError>,
}

/// Per-node outcomes of a batch operation; failures never abort the rest.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub outcomes: Vec<NodeOutcome<T>>,
}

impl<T> BatchReport<T> {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_ok())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// Drives the whole fleet: provisioning, genesis registration, port
/// assignment and process lifecycle.
///
/// Generic over the [`ProcessRunner`] so the external binaries can be
/// faked in tests. All fleet state lives in two files (`genesis.json`,
/// `fleet.json`) plus the per-sealer datadirs; the service holds no
/// in-memory state of its own beyond configuration.
pub struct FleetService<R: ProcessRunner> {
    config: FleetConfig,
    runner: R,
    node_binary: NodeBinary,
    bootnode_binary: BootnodeBinary,
    genesis: GenesisStore,
    roster_store: RosterStore,
}

impl<R: ProcessRunner> FleetService<R> {
    pub fn new(config: FleetConfig, runner: R) -> Self {
        let node_binary = NodeBinary::new(config.node_binary.clone());
        let bootnode_binary = BootnodeBinary::new(config.bootnode_binary.clone());
        let genesis = GenesisStore::new(config.genesis_path.clone());
        let roster_store = RosterStore::new(config.roster_path.clone());
        Self {
            config,
            runner,
            node_binary,
            bootnode_binary,
            genesis,
            roster_store,
        }
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Current roster, for status displays.
    pub fn roster(&self) -> Result<FleetRoster, FleetError> {
        self.roster_store.load()
    }

    // -------------------------------------------------------------------------
    // Provisioning
    // -------------------------------------------------------------------------

    /// Provision a brand-new sealer: mint its identity, register it as a
    /// signer, assign ports, then re-initialize every sealer's chain
    /// database from the rewritten genesis.
    pub fn init_sealer(&self, name: &str) -> Result<SealerCreated, FleetError> {
        validate_sealer_name(name)?;
        let mut roster = self.roster_store.load()?;
        if roster.contains(name) {
            return Err(FleetError::NodeExists {
                name: name.to_string(),
            });
        }
        // Probe the genesis up front: a missing or mangled document must
        // abort before anything is created on disk.
        self.genesis.load()?;

        info!("[service] creating sealer `{name}`");
        let data_dir = self.config.node_data_dir(name);
        fs::create_dir_all(&data_dir)
            .map_err(|err| FleetError::io(format!("create data dir {}", data_dir.display()), err))?;
        let password_file = self.config.password_file(name);
        fs::write(&password_file, format!("{name}\n")).map_err(|err| {
            FleetError::io(format!("write password file {}", password_file.display()), err)
        })?;

        self.runner
            .run(&self.node_binary.create_account(&self.config, name))?;
        let address = keystore::resolve_address(&self.config.keystore_dir(name))?;

        self.genesis
            .add_signer(&address, self.config.signer_balance, &roster.addresses())?;

        let ports = allocation::next_pair(
            self.config.p2p_base_port,
            self.config.rpc_base_port,
            roster.len(),
        );
        roster.insert(name, NodeRecord::new(ports.p2p, ports.rpc, address));
        self.roster_store.save(&roster)?;

        self.resync_all(&roster)?;

        info!(
            "[service] sealer `{name}` ready at {address} (p2p {}, rpc {})",
            ports.p2p, ports.rpc
        );
        Ok(SealerCreated {
            name: name.to_string(),
            address,
            p2p_port: ports.p2p,
            rpc_port: ports.rpc,
        })
    }

    /// Duplicate an existing sealer's datadir (and therefore its account)
    /// under a new name with fresh ports.
    ///
    /// The genesis is untouched: the clone signs with the same address,
    /// which is already registered. No re-initialization either, since the
    /// copied chain database descends from the same genesis.
    pub fn clone_sealer(&self, source: &str, target: &str) -> Result<SealerCreated, FleetError> {
        validate_sealer_name(target)?;
        let mut roster = self.roster_store.load()?;
        let source_record = roster
            .get(source)
            .cloned()
            .ok_or_else(|| FleetError::UnknownNode {
                name: source.to_string(),
            })?;
        if roster.contains(target) {
            return Err(FleetError::NodeExists {
                name: target.to_string(),
            });
        }
        let source_dir = self.config.node_data_dir(source);
        let target_dir = self.config.node_data_dir(target);
        if target_dir.exists() {
            return Err(FleetError::io(
                format!("clone target {} already exists", target_dir.display()),
                std::io::Error::from(ErrorKind::AlreadyExists),
            ));
        }

        info!("[service] cloning sealer `{source}` into `{target}`");
        copy_dir_all(&source_dir, &target_dir).map_err(|err| {
            FleetError::io(
                format!(
                    "copy {} to {}",
                    source_dir.display(),
                    target_dir.display()
                ),
                err,
            )
        })?;

        let address = keystore::resolve_address(&self.config.keystore_dir(target))?;
        if address != source_record.address {
            warn!(
                "[service] clone `{target}` resolves to {address} but `{source}` is {}",
                source_record.address
            );
        }

        let ports = allocation::next_pair(
            self.config.p2p_base_port,
            self.config.rpc_base_port,
            roster.len(),
        );
        roster.insert(target, NodeRecord::new(ports.p2p, ports.rpc, address));
        self.roster_store.save(&roster)?;

        info!(
            "[service] sealer `{target}` cloned at {address} (p2p {}, rpc {})",
            ports.p2p, ports.rpc
        );
        Ok(SealerCreated {
            name: target.to_string(),
            address,
            p2p_port: ports.p2p,
            rpc_port: ports.rpc,
        })
    }

    /// Provision `count` sealers named `node1`..`nodeN`, one at a time.
    /// A failed node is reported and the batch moves on.
    pub fn batch_init(&self, count: u32) -> BatchReport<SealerCreated> {
        let mut outcomes = Vec::with_capacity(count as usize);
        for index in 1..=count {
            let name = format!("node{index}");
            let result = self.init_sealer(&name);
            if let Err(err) = &result {
                error!("[service] batch init `{name}`: {err}");
            }
            outcomes.push(NodeOutcome { name, result });
        }
        BatchReport { outcomes }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Launch a sealer detached and persist its process group id.
    pub fn start_sealer(&self, name: &str) -> Result<SealerStarted, FleetError> {
        let mut roster = self.roster_store.load()?;
        let record = roster
            .get(name)
            .cloned()
            .ok_or_else(|| FleetError::UnknownNode {
                name: name.to_string(),
            })?;
        if let Some(pgid) = record.pgid {
            warn!("[service] `{name}` is already tracked as group {pgid}; starting another instance");
        }
        fs::create_dir_all(&self.config.logs_dir).map_err(|err| {
            FleetError::io(
                format!("create logs dir {}", self.config.logs_dir.display()),
                err,
            )
        })?;

        let spec = self.node_binary.run_sealer(&self.config, name, &record);
        let handle = self.runner.spawn_detached(&spec)?;
        roster.set_pgid(name, Some(handle.pgid()));
        self.roster_store.save(&roster)?;

        info!(
            "[service] started `{name}` as group {} (p2p {}, rpc {})",
            handle.pgid(),
            record.p2p_port,
            record.rpc_port
        );
        Ok(SealerStarted {
            name: name.to_string(),
            pgid: handle.pgid(),
            p2p_port: record.p2p_port,
            rpc_port: record.rpc_port,
        })
    }

    /// Start every roster sealer; per-node launch failures are isolated.
    pub fn start_all(&self) -> Result<BatchReport<SealerStarted>, FleetError> {
        let roster = self.roster_store.load()?;
        let names: Vec<String> = roster.names().map(str::to_string).collect();
        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            let result = self.start_sealer(&name);
            if let Err(err) = &result {
                error!("[service] start `{name}`: {err}");
            }
            outcomes.push(NodeOutcome { name, result });
        }
        Ok(BatchReport { outcomes })
    }

    /// Stop one sealer's process group and clear its tracked pgid.
    pub fn stop_sealer(&self, name: &str) -> Result<StopReport, FleetError> {
        let mut roster = self.roster_store.load()?;
        let record = roster.get(name).ok_or_else(|| FleetError::UnknownNode {
            name: name.to_string(),
        })?;
        let Some(pgid) = record.pgid else {
            info!("[service] `{name}` is not running");
            return Ok(StopReport {
                name: name.to_string(),
                outcome: StopOutcome::NotRunning,
            });
        };

        let outcome = match self
            .runner
            .signal_group(ProcessHandle::new(pgid), SignalKind::Terminate)?
        {
            SignalOutcome::Delivered => StopOutcome::Terminated(pgid),
            SignalOutcome::NoSuchGroup => StopOutcome::AlreadyGone(pgid),
        };
        roster.set_pgid(name, None);
        self.roster_store.save(&roster)?;
        info!("[service] stopped `{name}` (group {pgid})");
        Ok(StopReport {
            name: name.to_string(),
            outcome,
        })
    }

    /// Signal every distinct tracked process group once, clearing the
    /// pgids of groups that were reached or already gone.
    ///
    /// Best-effort by design: an unreadable roster means nothing to stop,
    /// and per-group signal failures do not stop the sweep.
    pub fn stop_all(&self) -> Vec<GroupStop> {
        let mut roster = match self.roster_store.load() {
            Ok(roster) => roster,
            Err(err) => {
                warn!("[service] stop-all: cannot read roster ({err}); nothing to stop");
                return Vec::new();
            }
        };
        let mut stops = Vec::new();
        let mut dirty = false;
        for pgid in roster.distinct_pgids() {
            match self
                .runner
                .signal_group(ProcessHandle::new(pgid), SignalKind::Terminate)
            {
                Ok(SignalOutcome::Delivered) => {
                    roster.clear_pgid(pgid);
                    dirty = true;
                    stops.push(GroupStop {
                        pgid,
                        outcome: GroupOutcome::Terminated,
                    });
                }
                Ok(SignalOutcome::NoSuchGroup) => {
                    roster.clear_pgid(pgid);
                    dirty = true;
                    stops.push(GroupStop {
                        pgid,
                        outcome: GroupOutcome::AlreadyGone,
                    });
                }
                Err(err) => {
                    error!("[service] stop-all: group {pgid}: {err}");
                    stops.push(GroupStop {
                        pgid,
                        outcome: GroupOutcome::Failed(err.to_string()),
                    });
                }
            }
        }
        if dirty {
            if let Err(err) = self.roster_store.save(&roster) {
                warn!("[service] stop-all: could not persist cleared groups: {err}");
            }
        }
        info!("[service] stop-all signalled {} group(s)", stops.len());
        stops
    }

    // -------------------------------------------------------------------------
    // Bootnode
    // -------------------------------------------------------------------------

    /// Launch the discovery bootnode detached and park its group id in
    /// the pidfile.
    pub fn start_bootnode(&self) -> Result<BootnodeStarted, FleetError> {
        if !self.config.bootnode_key.exists() {
            return Err(FleetError::io(
                format!(
                    "bootnode key {} not found",
                    self.config.bootnode_key.display()
                ),
                std::io::Error::from(ErrorKind::NotFound),
            ));
        }
        if let Some(pgid) = self.read_bootnode_pgid() {
            warn!("[service] bootnode pidfile already names group {pgid}; replacing it");
        }
        let handle = self
            .runner
            .spawn_detached(&self.bootnode_binary.run(&self.config))?;
        fs::write(
            &self.config.bootnode_pidfile,
            format!("{}\n", handle.pgid()),
        )
        .map_err(|err| {
            FleetError::io(
                format!(
                    "write bootnode pidfile {}",
                    self.config.bootnode_pidfile.display()
                ),
                err,
            )
        })?;
        info!("[service] bootnode up as group {}", handle.pgid());
        Ok(BootnodeStarted {
            pgid: handle.pgid(),
        })
    }

    /// Stop the bootnode named by the pidfile; no pidfile means nothing
    /// is running, which is not an error.
    pub fn stop_bootnode(&self) -> Result<StopOutcome, FleetError> {
        let Some(pgid) = self.read_bootnode_pgid() else {
            info!("[service] bootnode is not running");
            return Ok(StopOutcome::NotRunning);
        };
        let outcome = match self
            .runner
            .signal_group(ProcessHandle::new(pgid), SignalKind::Terminate)?
        {
            SignalOutcome::Delivered => StopOutcome::Terminated(pgid),
            SignalOutcome::NoSuchGroup => StopOutcome::AlreadyGone(pgid),
        };
        remove_file_if_exists(&self.config.bootnode_pidfile)?;
        info!("[service] bootnode stopped (group {pgid})");
        Ok(outcome)
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Stop everything, reset the genesis, then delete the workspace,
    /// roster, logs and bootnode leftovers.
    ///
    /// The genesis reset happens before any deletion: if the document
    /// cannot be parsed, teardown aborts with the state still on disk.
    pub fn teardown(&self) -> Result<TeardownReport, FleetError> {
        let bootnode = match self.stop_bootnode() {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("[service] teardown: bootnode stop failed ({err}); continuing");
                StopOutcome::Failed(err.to_string())
            }
        };
        let group_stops = self.stop_all();

        self.genesis.reset()?;

        remove_dir_if_exists(&self.config.workspace_dir)?;
        remove_file_if_exists(&self.config.roster_path)?;
        remove_dir_if_exists(&self.config.logs_dir)?;
        remove_file_if_exists(&self.config.bootnode_log)?;
        remove_file_if_exists(&self.config.bootnode_pidfile)?;

        info!("[service] workspace dismantled");
        Ok(TeardownReport {
            bootnode,
            group_stops,
        })
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Wipe and re-init the chain database of every roster sealer so all
    /// of them embed the current genesis. Runs once per sealer per
    /// provisioning, which is quadratic over a whole batch; devnet fleets
    /// are small and correctness beats cleverness here.
    fn resync_all(&self, roster: &FleetRoster) -> Result<(), FleetError> {
        for (name, _) in roster.iter() {
            self.wipe_chain_data(name)?;
            self.runner
                .run(&self.node_binary.init_chain(&self.config, name))?;
            debug!("[service] reinitialized `{name}` from genesis");
        }
        Ok(())
    }

    fn wipe_chain_data(&self, name: &str) -> Result<(), FleetError> {
        remove_dir_if_exists(&self.config.chain_data_dir(name))?;
        remove_file_if_exists(&self.config.ipc_socket(name))
    }

    fn read_bootnode_pgid(&self) -> Option<Pgid> {
        let text = fs::read_to_string(&self.config.bootnode_pidfile).ok()?;
        match text.trim().parse::<i32>() {
            Ok(raw) => Some(Pgid(raw)),
            Err(_) => {
                warn!(
                    "[service] ignoring unparseable bootnode pidfile {}",
                    self.config.bootnode_pidfile.display()
                );
                None
            }
        }
    }
}

// =============================================================================
// FILESYSTEM HELPERS
// =============================================================================

fn remove_file_if_exists(path: &Path) -> Result<(), FleetError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(FleetError::io(format!("remove {}", path.display()), err)),
    }
}

fn remove_dir_if_exists(path: &Path) -> Result<(), FleetError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(FleetError::io(format!("remove {}", path.display()), err)),
    }
}

/// Recursive directory copy. Sockets and other special files (a live
/// sealer's `geth.ipc`, say) are skipped rather than copied.
fn copy_dir_all(source: &Path, target: &Path) -> std::io::Result<()> {
    fs::create_dir_all(target)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let destination = target.join(entry.file_name());
        if file_type.is_dir() {
            copy_dir_all(&entry.path(), &destination)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}
