//! # Ports Layer
//!
//! Trait seams between the orchestration service and the outside world.
//!
//! Only driven ports exist here: the service itself is the crate's inbound
//! surface and is called directly by the CLI.
//!
//! - `outbound.rs` - process execution seam (`ProcessRunner` and its value
//!   types)

pub mod outbound;
