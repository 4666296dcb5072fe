//! Error taxonomy for fleet operations.
//!
//! Every variant carries the identifying detail an operator needs to act:
//! the sealer name, the offending path, the process group or the program
//! that failed. Port-level launch/signal errors convert in via `From` so
//! adapter results flow through `?` unchanged.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::entities::Pgid;
use crate::ports::outbound::{LaunchError, SignalError};

#[derive(Debug, Error)]
pub enum FleetError {
    /// The keystore scan found no identity file to register.
    #[error("no identity file under {}", dir.display())]
    IdentityNotFound { dir: PathBuf },

    #[error("identity file {} is unusable: {reason}", path.display())]
    CorruptKeystore { path: PathBuf, reason: String },

    #[error("genesis document {} does not exist", path.display())]
    GenesisNotFound { path: PathBuf },

    /// The genesis exists but cannot be worked with; it is never
    /// overwritten in this state.
    #[error("genesis document {} cannot be used: {reason}", path.display())]
    CorruptGenesis { path: PathBuf, reason: String },

    /// The roster exists but cannot be parsed; distinct from the empty
    /// first-run roster, which is not an error.
    #[error("fleet roster {} cannot be used: {reason}", path.display())]
    CorruptRoster { path: PathBuf, reason: String },

    #[error("sealer `{name}` already exists")]
    NodeExists { name: String },

    #[error("sealer `{name}` is not in the roster")]
    UnknownNode { name: String },

    #[error("invalid sealer name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("invalid account address `{value}`: {reason}")]
    InvalidAddress { value: String, reason: &'static str },

    #[error("failed to launch `{program}`: {reason}")]
    ProcessLaunchFailure { program: String, reason: String },

    #[error("failed to signal process group {pgid}: {reason}")]
    ProcessSignalFailure { pgid: Pgid, reason: String },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl FleetError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<LaunchError> for FleetError {
    fn from(err: LaunchError) -> Self {
        Self::ProcessLaunchFailure {
            program: err.program,
            reason: err.reason,
        }
    }
}

impl From<SignalError> for FleetError {
    fn from(err: SignalError) -> Self {
        Self::ProcessSignalFailure {
            pgid: err.pgid,
            reason: err.reason,
        }
    }
}
