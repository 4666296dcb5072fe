//! # Adapters Layer
//!
//! Infrastructure behind the domain: file stores for the genesis and the
//! roster, the keystore scanner, command factories for the external
//! binaries, and the OS process runner.
//!
//! ## Modules
//!
//! - `atomic`: temp-file-plus-rename writes
//! - `genesis_store`: load/rewrite `genesis.json`
//! - `keystore`: recover minted account addresses
//! - `node_binary`: argument lists for geth and the bootnode
//! - `process`: `ProcessRunner` on real OS processes
//! - `roster_store`: load/rewrite `fleet.json`

pub mod atomic;
pub mod genesis_store;
pub mod keystore;
pub mod node_binary;
pub mod process;
pub mod roster_store;

pub use genesis_store::GenesisStore;
pub use node_binary::{BootnodeBinary, NodeBinary};
pub use process::OsProcessRunner;
pub use roster_store::RosterStore;
