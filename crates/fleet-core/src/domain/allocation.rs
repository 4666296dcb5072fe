//! Port assignment for new sealers.

/// One sealer's listening ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPair {
    pub p2p: u16,
    pub rpc: u16,
}

/// Ports for the next sealer: both bases offset by the current fleet size.
///
/// Deterministic given the roster size, and collision-free while records
/// are only ever added. A removal operation would make freed offsets
/// collide with live ones and has to switch this to a used-port set first.
pub fn next_pair(p2p_base: u16, rpc_base: u16, fleet_size: usize) -> PortPair {
    let offset = fleet_size as u16;
    PortPair {
        p2p: p2p_base + offset,
        rpc: rpc_base + offset,
    }
}
