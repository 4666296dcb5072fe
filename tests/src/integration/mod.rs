//! End-to-end fleet scenarios.
//!
//! Every test drives the service the way the CLI would, then asserts on
//! the artifacts a real run leaves behind: the genesis document, the
//! roster file, datadirs and the recorded process activity.

pub mod lifecycle;
pub mod provisioning;
