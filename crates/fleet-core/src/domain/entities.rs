//! Roster entities: the per-sealer record and the fleet roster map.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::address::SealerAddress;
use crate::domain::errors::FleetError;

/// OS process-group id of a running sealer (or the bootnode).
///
/// Launching places the child in a fresh group whose id equals the child's
/// pid, so one signal reaches the node and anything it forked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pgid(pub i32);

impl Pgid {
    pub fn as_raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Pgid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle position of a registered sealer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealerState {
    Stopped,
    Running,
}

/// Everything the fleet tracks about one sealer.
///
/// `pgid` is present exactly while the sealer is believed to be running;
/// stopped records omit it from the persisted roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub p2p_port: u16,
    pub rpc_port: u16,
    pub address: SealerAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgid: Option<Pgid>,
}

impl NodeRecord {
    pub fn new(p2p_port: u16, rpc_port: u16, address: SealerAddress) -> Self {
        Self {
            p2p_port,
            rpc_port,
            address,
            pgid: None,
        }
    }

    pub fn state(&self) -> SealerState {
        if self.pgid.is_some() {
            SealerState::Running
        } else {
            SealerState::Stopped
        }
    }
}

/// Name → record map of every provisioned sealer.
///
/// Backed by a `BTreeMap` so iteration and the persisted JSON keep a
/// stable name order. Records are only ever added; the roster disappears
/// wholesale at teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FleetRoster {
    nodes: BTreeMap<String, NodeRecord>,
}

impl FleetRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&NodeRecord> {
        self.nodes.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, record: NodeRecord) {
        self.nodes.insert(name.into(), record);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeRecord)> {
        self.nodes.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Every registered signer address, deduplicated (clones share one).
    pub fn addresses(&self) -> BTreeSet<SealerAddress> {
        self.nodes.values().map(|record| record.address).collect()
    }

    /// Process groups currently believed to be running, deduplicated.
    pub fn distinct_pgids(&self) -> BTreeSet<Pgid> {
        self.nodes.values().filter_map(|record| record.pgid).collect()
    }

    /// Track (or clear) the process group of `name`.
    ///
    /// Returns false when no such record exists.
    pub fn set_pgid(&mut self, name: &str, pgid: Option<Pgid>) -> bool {
        match self.nodes.get_mut(name) {
            Some(record) => {
                record.pgid = pgid;
                true
            }
            None => false,
        }
    }

    /// Clear `pgid` from every record tracking it; returns how many did.
    pub fn clear_pgid(&mut self, pgid: Pgid) -> usize {
        let mut cleared = 0;
        for record in self.nodes.values_mut() {
            if record.pgid == Some(pgid) {
                record.pgid = None;
                cleared += 1;
            }
        }
        cleared
    }
}

/// Validate a sealer name before it becomes a directory name, a password
/// and a roster key.
///
/// ASCII letters, digits, `-` and `_` only, so names stay path-safe and
/// survive the command line untouched.
pub fn validate_sealer_name(name: &str) -> Result<(), FleetError> {
    if name.is_empty() {
        return Err(FleetError::InvalidName {
            name: name.to_string(),
            reason: "name is empty",
        });
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(FleetError::InvalidName {
            name: name.to_string(),
            reason: "only ASCII letters, digits, `-` and `_` are allowed",
        });
    }
    Ok(())
}
