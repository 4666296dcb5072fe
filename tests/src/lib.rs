//! # PoA-Fleet Test Suite
//!
//! Unified test crate exercising the full fleet lifecycle through the
//! public `FleetService` API against throwaway workspaces, with the fake
//! runner from `fleet_core::test_utils` standing in for geth and the
//! bootnode.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── provisioning.rs   # create/clone/register scenarios
//!     └── lifecycle.rs      # start/stop/teardown scenarios
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All scenarios
//! cargo test -p fleet-tests
//!
//! # By category
//! cargo test -p fleet-tests integration::provisioning::
//! cargo test -p fleet-tests integration::lifecycle::
//! ```

pub mod integration;
