//! Fleet-wide configuration: paths, ports and protocol constants.
//!
//! Everything lives under one root directory (the current directory by
//! default): `genesis.json`, `fleet.json`, `bin/` with the two external
//! binaries, `boot.key`, the per-sealer `devnet/` workspace and `logs/`.

use std::path::{Path, PathBuf};

use primitive_types::U256;

/// Devnet chain id baked into the run flags.
pub const CHAIN_ID: u64 = 9999;
/// First sealer's P2P listening port; later sealers count up from here.
pub const P2P_BASE_PORT: u16 = 30311;
/// First sealer's HTTP-RPC port.
pub const RPC_BASE_PORT: u16 = 8501;
/// Port the discovery bootnode listens on.
pub const BOOTNODE_PORT: u16 = 30310;
/// Public half of the checked-in bootnode key (`boot.key`).
pub const BOOTNODE_ENODE_KEY: &str = "943b4e738dfe07d5614fa540eb885c8eb785060fc196357d5b7ceca99de13295ab3d5980a8d8dabcadbcc836ae1e87f1f11c265e7152e3aec834dcc2af40f114";
/// Starting balance granted to every sealer account: 0x2 followed by 62
/// zeros, effectively infinite stake for a devnet.
pub const SIGNER_BALANCE: U256 = U256([0, 0, 0, 1 << 57]);

/// Paths and constants every fleet operation reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetConfig {
    /// Directory holding one subdirectory per sealer.
    pub workspace_dir: PathBuf,
    /// The geth-compatible node binary.
    pub node_binary: PathBuf,
    /// The discovery bootnode binary.
    pub bootnode_binary: PathBuf,
    pub genesis_path: PathBuf,
    pub roster_path: PathBuf,
    pub logs_dir: PathBuf,
    /// Private key file the bootnode identifies with.
    pub bootnode_key: PathBuf,
    pub bootnode_log: PathBuf,
    /// Where the bootnode's process group id is parked between commands.
    pub bootnode_pidfile: PathBuf,
    pub chain_id: u64,
    pub bootnode_port: u16,
    /// Public key inside the bootnode's enode URL.
    pub bootnode_enode_key: String,
    pub p2p_base_port: u16,
    pub rpc_base_port: u16,
    /// Balance granted to each new sealer account.
    pub signer_balance: U256,
}

impl FleetConfig {
    /// Configuration with every artifact under `root`.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            workspace_dir: root.join("devnet"),
            node_binary: root.join("bin/geth"),
            bootnode_binary: root.join("bin/bootnode"),
            genesis_path: root.join("genesis.json"),
            roster_path: root.join("fleet.json"),
            logs_dir: root.join("logs"),
            bootnode_key: root.join("boot.key"),
            bootnode_log: root.join("bootnode.log"),
            bootnode_pidfile: root.join("bootnode.pid"),
            chain_id: CHAIN_ID,
            bootnode_port: BOOTNODE_PORT,
            bootnode_enode_key: BOOTNODE_ENODE_KEY.to_string(),
            p2p_base_port: P2P_BASE_PORT,
            rpc_base_port: RPC_BASE_PORT,
            signer_balance: SIGNER_BALANCE,
        }
    }

    pub fn node_data_dir(&self, name: &str) -> PathBuf {
        self.workspace_dir.join(name)
    }

    pub fn keystore_dir(&self, name: &str) -> PathBuf {
        self.node_data_dir(name).join("keystore")
    }

    pub fn password_file(&self, name: &str) -> PathBuf {
        self.node_data_dir(name).join("password.txt")
    }

    /// Chain database the node binary maintains; wiped before a re-init.
    pub fn chain_data_dir(&self, name: &str) -> PathBuf {
        self.node_data_dir(name).join("geth")
    }

    pub fn ipc_socket(&self, name: &str) -> PathBuf {
        self.node_data_dir(name).join("geth.ipc")
    }

    pub fn node_log_file(&self, name: &str) -> PathBuf {
        self.logs_dir.join(format!("geth-{name}.log"))
    }

    /// Discovery URL every sealer dials at boot.
    pub fn enode_url(&self) -> String {
        format!(
            "enode://{}@127.0.0.1:{}",
            self.bootnode_enode_key, self.bootnode_port
        )
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self::rooted_at(".")
    }
}
