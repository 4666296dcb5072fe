//! # fleet-core
//!
//! Engine of a local proof-of-authority devnet. It provisions sealer
//! accounts, keeps the shared genesis document and fleet roster on disk,
//! assigns ports deterministically, and drives the external
//! geth-compatible binaries as detached process groups.
//!
//! ## Architecture
//!
//! Hexagonal, in three rings:
//!
//! - [`domain`]: pure fleet logic, no I/O. Addresses, the clique signer
//!   field codec, roster entities, port assignment and the genesis
//!   document live here.
//! - [`ports`]: the seam to the outside world. [`ports::outbound::ProcessRunner`]
//!   abstracts running and signalling the node binaries.
//! - [`adapters`]: the infrastructure behind the seam. File stores with
//!   atomic rewrites, the keystore scanner, command factories and the OS
//!   process runner.
//!
//! [`service::FleetService`] wires the rings together, one method per
//! fleet operation. [`test_utils`] ships a deterministic fake runner so
//! the whole lifecycle can be exercised without geth installed.
//!
//! ## Example
//!
//! ```no_run
//! use fleet_core::adapters::OsProcessRunner;
//! use fleet_core::config::FleetConfig;
//! use fleet_core::service::FleetService;
//!
//! # fn main() -> Result<(), fleet_core::FleetError> {
//! let service = FleetService::new(FleetConfig::default(), OsProcessRunner);
//! let created = service.init_sealer("node1")?;
//! println!("sealer {} serves RPC on {}", created.name, created.rpc_port);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod test_utils;

pub use config::FleetConfig;
pub use domain::address::SealerAddress;
pub use domain::entities::{FleetRoster, NodeRecord, Pgid, SealerState};
pub use domain::errors::FleetError;
pub use service::FleetService;
