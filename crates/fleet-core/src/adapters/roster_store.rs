//! Load and atomically rewrite the persisted fleet roster.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::adapters::atomic::write_atomic;
use crate::domain::entities::FleetRoster;
use crate::domain::errors::FleetError;

/// File-backed access to `fleet.json`.
///
/// A missing file is the normal first-run state and loads as an empty
/// roster. A file that exists but does not parse is a loud
/// `CorruptRoster`: treating it as empty would silently orphan running
/// process groups and reassign their ports.
pub struct RosterStore {
    path: PathBuf,
}

impl RosterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<FleetRoster, FleetError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "[roster] {} not present, starting empty",
                    self.path.display()
                );
                return Ok(FleetRoster::new());
            }
            Err(err) => {
                return Err(FleetError::io(
                    format!("read roster {}", self.path.display()),
                    err,
                ));
            }
        };
        serde_json::from_str(&text).map_err(|err| FleetError::CorruptRoster {
            path: self.path.clone(),
            reason: err.to_string(),
        })
    }

    pub fn save(&self, roster: &FleetRoster) -> Result<(), FleetError> {
        let mut bytes = serde_json::to_vec_pretty(roster).map_err(|err| {
            FleetError::io(
                "serialize roster",
                std::io::Error::new(ErrorKind::InvalidData, err),
            )
        })?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes)
            .map_err(|err| FleetError::io(format!("write roster {}", self.path.display()), err))
    }
}
