//! # Domain Layer
//!
//! Pure fleet logic: no filesystem access, no processes.
//!
//! ## Modules
//!
//! - `address` - 20-byte sealer account addresses
//! - `allocation` - deterministic port assignment
//! - `entities` - per-sealer records and the roster map
//! - `errors` - the `FleetError` taxonomy
//! - `extra_data` - clique signer-field codec
//! - `genesis` - the genesis document and its fleet-owned fields

pub mod address;
pub mod allocation;
pub mod entities;
pub mod errors;
pub mod extra_data;
pub mod genesis;
